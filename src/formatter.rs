//! Formatter module: standardized, categorized output for one component.
//!
//! A [`StreamFormatter`] owns five streams (debug, error, info, output, warning),
//! each forwarding to one of its context's standard streams with a prefix of the
//! form `<exec>: <SEVERITY>: <component>::<operation>: `.
//!
//! ```
//! use chatstream::context::AppContext;
//! use chatstream::formatter::StreamFormatter;
//! use chatstream::sink::Sink;
//!
//! let context = AppContext::new();
//! context.configure("demo", 3, false);
//! let (sink, log) = Sink::memory("log");
//! context.stlog().connect_sink(&sink);
//!
//! let mut fmt = StreamFormatter::new(&context, "Widget", "", 2);
//! fmt.set_method("run");
//! fmt.warn().write("low on space").endl();
//! fmt.info_at(4).write("too chatty").endl();
//! assert_eq!(log.contents(), "demo: WARNING: Widget::run: low on space\n");
//! ```

use crate::context::AppContext;
use crate::global;
use crate::stream::{OStream, MAX_CHATTER};

/// Output categories, each with its own prefix and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Shown only in debug mode, to `sterr`.
    Debug,
    /// Always shown, to `sterr`.
    Error,
    /// Chatter-gated, to `stlog`.
    Info,
    /// Always shown, to `stout`.
    Out,
    /// Chatter-gated, to `stlog`.
    Warning,
}

impl Category {
    /// Severity label in prefixes; `None` for plain output.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Category::Debug => Some("DEBUG"),
            Category::Error => Some("ERROR"),
            Category::Info => Some("INFO"),
            Category::Out => None,
            Category::Warning => Some("WARNING"),
        }
    }
}

/// Build the prefix for `category`.
///
/// Empty segments are skipped. Plain output carries only the executable name.
pub fn build_prefix(exec_name: &str, category: Category, component: &str, operation: &str) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(3);
    if !exec_name.is_empty() {
        segments.push(exec_name.to_string());
    }
    if let Some(label) = category.label() {
        segments.push(label.to_string());
        let location = match (component.is_empty(), operation.is_empty()) {
            (false, false) => format!("{component}::{operation}"),
            (false, true) => component.to_string(),
            (true, false) => operation.to_string(),
            (true, true) => String::new(),
        };
        if !location.is_empty() {
            segments.push(location);
        }
    }
    if segments.is_empty() {
        String::new()
    } else {
        format!("{}: ", segments.join(": "))
    }
}

/// Categorized output streams for one component and operation.
///
/// Info and warning output is gated by the context's maximum chatter as read at
/// construction; error and plain output are never gated; debug output appears
/// only while debug mode (local override, else the context's) is on. While it is
/// off, [`StreamFormatter::debug`] hands out a muted stream with no destinations,
/// so nothing written there touches the real debug stream's line or format state.
#[derive(Debug)]
pub struct StreamFormatter<'ctx> {
    context: &'ctx AppContext,
    component: String,
    operation: String,
    default_chatter: u32,
    debug_override: Option<bool>,
    debug: OStream,
    muted: OStream,
    error: OStream,
    info: OStream,
    out: OStream,
    warn: OStream,
}

impl<'ctx> StreamFormatter<'ctx> {
    /// Create a formatter forwarding to `context`'s standard streams.
    pub fn new(context: &'ctx AppContext, component: &str, operation: &str, default_chatter: u32) -> Self {
        let max_chatter = context.max_chatter();
        let formatter = Self {
            context,
            component: component.to_string(),
            operation: operation.to_string(),
            default_chatter,
            debug_override: None,
            debug: OStream::forwarding_to(MAX_CHATTER, context.sterr()),
            muted: OStream::new(0),
            error: OStream::forwarding_to(MAX_CHATTER, context.sterr()),
            info: OStream::forwarding_to(max_chatter, context.stlog()),
            out: OStream::forwarding_to(MAX_CHATTER, context.stout()),
            warn: OStream::forwarding_to(max_chatter, context.stlog()),
        };
        formatter.refresh_prefixes();
        formatter
    }

    fn stream(&self, category: Category) -> &OStream {
        match category {
            Category::Debug => &self.debug,
            Category::Error => &self.error,
            Category::Info => &self.info,
            Category::Out => &self.out,
            Category::Warning => &self.warn,
        }
    }

    fn refresh_prefixes(&self) {
        let exec_name = self.context.exec_name();
        for category in [
            Category::Debug,
            Category::Error,
            Category::Info,
            Category::Out,
            Category::Warning,
        ] {
            let prefix = build_prefix(&exec_name, category, &self.component, &self.operation);
            self.stream(category).set_prefix(prefix);
        }
    }

    /// Change the operation name and recompute every prefix.
    pub fn set_method(&mut self, operation: &str) {
        self.operation = operation.to_string();
        self.refresh_prefixes();
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn default_chatter(&self) -> u32 {
        self.default_chatter
    }

    /// Force debug output on or off for this formatter only.
    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_override = Some(enabled);
    }

    /// Drop the local override and follow the context's debug mode again.
    pub fn inherit_debug_mode(&mut self) {
        self.debug_override = None;
    }

    /// Whether debug output is currently shown.
    pub fn debug_enabled(&self) -> bool {
        self.debug_override.unwrap_or_else(|| self.context.debug_mode())
    }

    /// Debug stream. Chatter has no effect on it; only debug mode does.
    pub fn debug(&self) -> &OStream {
        if self.debug_enabled() {
            self.debug.set_chatter(0)
        } else {
            self.muted.set_chatter(1)
        }
    }

    /// Error stream. Always shown.
    pub fn error(&self) -> &OStream {
        self.error.set_chatter(0)
    }

    /// Same as [`StreamFormatter::error`].
    pub fn err(&self) -> &OStream {
        self.error()
    }

    /// Plain output stream. Always shown.
    pub fn out(&self) -> &OStream {
        self.out.set_chatter(0)
    }

    /// Info stream at the default chatter.
    pub fn info(&self) -> &OStream {
        self.info_at(self.default_chatter)
    }

    /// Info stream at `chatter`. The default chatter is unchanged.
    pub fn info_at(&self, chatter: u32) -> &OStream {
        self.info.set_chatter(chatter)
    }

    /// Warning stream at the default chatter.
    pub fn warn(&self) -> &OStream {
        self.warn_at(self.default_chatter)
    }

    /// Warning stream at `chatter`. The default chatter is unchanged.
    pub fn warn_at(&self, chatter: u32) -> &OStream {
        self.warn.set_chatter(chatter)
    }
}

impl StreamFormatter<'static> {
    /// Formatter on the process-wide context.
    pub fn global(component: &str, operation: &str, default_chatter: u32) -> Self {
        Self::new(global::context(), component, operation, default_chatter)
    }
}
