//! Fan-out output streams with a verbosity gate and per-line prefixes.
//!
//! An [`OStream`] forwards everything written to it to a set of [`Sink`]s and a set
//! of other streams, but only while its message chatter does not exceed its maximum
//! chatter. Lower chatter means higher priority: chatter 0 is always shown.
//!
//! ```
//! use chatstream::sink::Sink;
//! use chatstream::stream::OStream;
//!
//! let (sink, buffer) = Sink::memory("out");
//! let out = OStream::new(3);
//! out.connect_sink(&sink);
//! out.set_prefix("demo: ");
//!
//! out.set_chatter(4).write("hidden").endl();
//! out.set_chatter(2).write("shown ").write(42).endl();
//! assert_eq!(buffer.contents(), "demo: shown 42\n");
//! ```

use crate::error::ChatError;
use crate::format::{FmtFlags, FormatState, Manip, Render};
use crate::graph::{self, StreamId};
use crate::invariant_ppt::{
    assert_invariant, CYCLE_REJECTED, DESTINATIONS_UNIQUE, GATE_SUPPRESSES_OUTPUT,
    LINE_START_AFTER_ENDL, SELF_CONNECTION_IGNORED,
};
use crate::sink::Sink;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Highest possible chatter. A stream with this maximum never suppresses output.
pub const MAX_CHATTER: u32 = u32::MAX;

#[derive(Debug)]
struct StreamCore {
    sinks: Vec<Sink>,
    streams: Vec<OStream>,
    prefix: String,
    max_chatter: u32,
    chatter: u32,
    at_line_start: bool,
    format: FormatState,
}

impl StreamCore {
    fn gate_open(&self) -> bool {
        self.chatter <= self.max_chatter
    }

    /// Line state, format state and destination counts.
    fn snapshot(&self) -> (bool, FormatState, usize, usize) {
        (self.at_line_start, self.format, self.sinks.len(), self.streams.len())
    }

    fn emit(&self, text: &str) {
        let with_prefix = self.at_line_start && !self.prefix.is_empty();
        for sink in &self.sinks {
            if with_prefix {
                report(sink, sink.write_str(&self.prefix));
            }
            report(sink, sink.write_str(text));
        }
        for stream in &self.streams {
            if with_prefix {
                stream.write_str(&self.prefix);
            }
            stream.write_str(text);
        }
    }
}

fn report(sink: &Sink, result: io::Result<()>) {
    if let Err(err) = result {
        log::warn!("write to sink {} failed: {}", sink.label(), err);
    }
}

/// A chatter-gated output stream forwarding to sinks and other streams.
///
/// `OStream` is a handle: clones refer to the same stream and share its identity,
/// destinations, prefix and format state. All methods take `&self`, so a stream can
/// be written to through a shared reference and calls can be chained.
#[derive(Clone)]
pub struct OStream {
    id: StreamId,
    core: Arc<Mutex<StreamCore>>,
}

impl OStream {
    /// Create a stream with the given maximum chatter and no destinations.
    ///
    /// Message chatter starts equal to `max_chatter`, so the gate starts open.
    pub fn new(max_chatter: u32) -> Self {
        Self {
            id: graph::next_stream_id(),
            core: Arc::new(Mutex::new(StreamCore {
                sinks: Vec::new(),
                streams: Vec::new(),
                prefix: String::new(),
                max_chatter,
                chatter: max_chatter,
                at_line_start: true,
                format: FormatState::default(),
            })),
        }
    }

    /// Create a fresh stream already forwarding to `dest`.
    ///
    /// A fresh stream has no incoming edges, so this cannot close a cycle.
    pub(crate) fn forwarding_to(max_chatter: u32, dest: &OStream) -> Self {
        let stream = Self::new(max_chatter);
        stream.lock().streams.push(dest.clone());
        stream
    }

    fn lock(&self) -> MutexGuard<'_, StreamCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// This stream's identity.
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Add a sink to the destinations. Connecting the same sink twice is a no-op.
    pub fn connect_sink(&self, sink: &Sink) {
        let mut core = self.lock();
        if !core.sinks.contains(sink) {
            log::debug!("{}: connect sink {}", self.id, sink.label());
            core.sinks.push(sink.clone());
        }
        assert_invariant(
            DESTINATIONS_UNIQUE,
            core.sinks.iter().filter(|s| *s == sink).count() == 1,
            "sink connected exactly once",
            Some("connect_sink"),
        );
    }

    /// Remove a sink from the destinations. Removing a non-member is a no-op.
    pub fn disconnect_sink(&self, sink: &Sink) {
        let mut core = self.lock();
        let before = core.sinks.len();
        core.sinks.retain(|s| s != sink);
        if core.sinks.len() != before {
            log::debug!("{}: disconnect sink {}", self.id, sink.label());
        }
    }

    /// Forward this stream's output to `dest`.
    ///
    /// Connecting a stream to itself is ignored. Connecting twice is a no-op. A
    /// connection that would close a forwarding cycle is rejected and leaves the
    /// destinations unchanged.
    pub fn connect_stream(&self, dest: &OStream) -> Result<(), ChatError> {
        if dest.id == self.id {
            assert_invariant(
                SELF_CONNECTION_IGNORED,
                !self.lock().streams.iter().any(|s| s.id == self.id),
                "stream never forwards to itself",
                Some("connect_stream"),
            );
            return Ok(());
        }
        if graph::would_create_cycle(self, dest) {
            assert_invariant(
                CYCLE_REJECTED,
                !self.lock().streams.iter().any(|s| s.id == dest.id),
                "rejected destination was never connected",
                Some("connect_stream"),
            );
            log::warn!("{}: rejecting connection to {}: cycle", self.id, dest.id);
            return Err(ChatError::CycleDetected {
                from: self.id,
                to: dest.id,
            });
        }
        let mut core = self.lock();
        if !core.streams.iter().any(|s| s.id == dest.id) {
            log::debug!("{}: connect {}", self.id, dest.id);
            core.streams.push(dest.clone());
        }
        assert_invariant(
            DESTINATIONS_UNIQUE,
            core.streams.iter().filter(|s| s.id == dest.id).count() == 1,
            "stream connected exactly once",
            Some("connect_stream"),
        );
        Ok(())
    }

    /// Stop forwarding to `dest`. Removing a non-member is a no-op.
    pub fn disconnect_stream(&self, dest: &OStream) {
        let mut core = self.lock();
        let before = core.streams.len();
        core.streams.retain(|s| s.id != dest.id);
        if core.streams.len() != before {
            log::debug!("{}: disconnect {}", self.id, dest.id);
        }
    }

    /// Connected sinks, in forwarding order.
    pub fn sinks(&self) -> Vec<Sink> {
        self.lock().sinks.clone()
    }

    /// Connected streams, in forwarding order.
    pub fn streams(&self) -> Vec<OStream> {
        self.lock().streams.clone()
    }

    /// Number of connected sinks.
    pub fn sink_count(&self) -> usize {
        self.lock().sinks.len()
    }

    /// Number of connected streams.
    pub fn stream_count(&self) -> usize {
        self.lock().streams.len()
    }

    /// Render `value` with this stream's format state and forward it.
    ///
    /// Does nothing at all while the gate is closed. The field width is reset to 0
    /// after the value is rendered.
    pub fn write<T: Render>(&self, value: T) -> &Self {
        let mut core = self.lock();
        let before = core.snapshot();
        let open = core.gate_open();
        if open {
            let text = value.render(&core.format);
            core.format.width = 0;
            core.emit(&text);
            core.at_line_start = false;
        }
        assert_invariant(
            GATE_SUPPRESSES_OUTPUT,
            open || core.snapshot() == before,
            "closed gate leaves the stream untouched",
            Some("write"),
        );
        self
    }

    /// Forward already formatted text. The format state is neither applied nor reset.
    pub fn write_str(&self, text: &str) -> &Self {
        let mut core = self.lock();
        let before = core.snapshot();
        let open = core.gate_open();
        if open {
            core.emit(text);
            core.at_line_start = false;
        }
        assert_invariant(
            GATE_SUPPRESSES_OUTPUT,
            open || core.snapshot() == before,
            "closed gate leaves the stream untouched",
            Some("write_str"),
        );
        self
    }

    /// Forward a directive to every destination.
    pub fn manip(&self, manip: Manip) -> &Self {
        let mut core = self.lock();
        if !core.gate_open() {
            return self;
        }
        for sink in &core.sinks {
            if manip == Manip::Endl {
                report(sink, sink.write_str("\n"));
            }
            report(sink, sink.flush());
        }
        for stream in &core.streams {
            stream.manip(manip);
        }
        if manip == Manip::Endl {
            core.at_line_start = true;
            assert_invariant(
                LINE_START_AFTER_ENDL,
                core.streams.iter().all(|s| !s.is_enabled() || s.at_line_start()),
                "every open destination stream starts a new line",
                Some("manip"),
            );
        }
        self
    }

    /// End the current line. Shorthand for `manip(Manip::Endl)`.
    pub fn endl(&self) -> &Self {
        self.manip(Manip::Endl)
    }

    /// Flush every destination. Shorthand for `manip(Manip::Flush)`.
    pub fn flush(&self) -> &Self {
        self.manip(Manip::Flush)
    }

    /// Set the chatter of subsequent messages.
    ///
    /// The level stays in effect until changed again; it is not reset by writes or
    /// line ends. The maximum chatter is unaffected.
    pub fn set_chatter(&self, chatter: u32) -> &Self {
        self.lock().chatter = chatter;
        self
    }

    /// Current message chatter.
    pub fn chatter(&self) -> u32 {
        self.lock().chatter
    }

    /// Maximum chatter fixed at construction.
    pub fn max_chatter(&self) -> u32 {
        self.lock().max_chatter
    }

    /// Whether writes currently reach the destinations.
    pub fn is_enabled(&self) -> bool {
        self.lock().gate_open()
    }

    /// Whether the next write begins a new line (and so gets the prefix).
    pub fn at_line_start(&self) -> bool {
        self.lock().at_line_start
    }

    /// Text written before the first value of every line.
    pub fn prefix(&self) -> String {
        self.lock().prefix.clone()
    }

    /// Replace the line prefix. Not subject to the chatter gate.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.lock().prefix = prefix.into();
    }

    /// Snapshot of the format state.
    pub fn format_state(&self) -> FormatState {
        self.lock().format
    }

    /// Floating-point precision.
    pub fn precision(&self) -> usize {
        self.lock().format.precision
    }

    /// Field width of the next value.
    pub fn width(&self) -> usize {
        self.lock().format.width
    }

    /// Padding character.
    pub fn fill(&self) -> char {
        self.lock().format.fill
    }

    /// Format flags.
    pub fn flags(&self) -> FmtFlags {
        self.lock().format.flags
    }

    /// Apply `update` to this stream and every connected stream, if the gate is
    /// open. Returns `read` of the state before the update.
    fn update_format<R>(
        &self,
        read: impl Fn(&FormatState) -> R,
        update: impl Fn(&OStream),
        apply: impl FnOnce(&mut FormatState),
    ) -> R {
        let mut core = self.lock();
        let prior = read(&core.format);
        if core.gate_open() {
            apply(&mut core.format);
            for stream in &core.streams {
                update(stream);
            }
        }
        prior
    }

    /// Set the precision. Returns the previous precision.
    pub fn set_precision(&self, precision: usize) -> usize {
        self.update_format(
            |f| f.precision,
            |s| {
                s.set_precision(precision);
            },
            |f| f.precision = precision,
        )
    }

    /// Set the field width of the next value. Returns the previous width.
    ///
    /// Unlike the other format settings the width is not passed on to connected
    /// streams: they receive this stream's values already padded.
    pub fn set_width(&self, width: usize) -> usize {
        self.update_format(|f| f.width, |_| (), |f| f.width = width)
    }

    /// Set the padding character. Returns the previous one.
    pub fn set_fill(&self, fill: char) -> char {
        self.update_format(
            |f| f.fill,
            |s| {
                s.set_fill(fill);
            },
            |f| f.fill = fill,
        )
    }

    /// Replace all flags. Returns the previous flags.
    pub fn set_flags(&self, flags: FmtFlags) -> FmtFlags {
        self.update_format(
            |f| f.flags,
            |s| {
                s.set_flags(flags);
            },
            |f| f.flags = flags,
        )
    }

    /// Set `flags` in addition to the current ones. Returns the previous flags.
    pub fn insert_flags(&self, flags: FmtFlags) -> FmtFlags {
        self.update_format(
            |f| f.flags,
            |s| {
                s.insert_flags(flags);
            },
            |f| f.flags |= flags,
        )
    }

    /// Clear the bits of `mask`, then set `flags & mask`. Returns the previous flags.
    ///
    /// ```
    /// use chatstream::format::FmtFlags;
    /// use chatstream::stream::OStream;
    ///
    /// let out = OStream::new(0);
    /// out.insert_flags_masked(FmtFlags::HEX, FmtFlags::BASEFIELD);
    /// assert_eq!(out.flags() & FmtFlags::BASEFIELD, FmtFlags::HEX);
    /// ```
    pub fn insert_flags_masked(&self, flags: FmtFlags, mask: FmtFlags) -> FmtFlags {
        self.update_format(
            |f| f.flags,
            |s| {
                s.insert_flags_masked(flags, mask);
            },
            |f| f.flags = (f.flags & !mask) | (flags & mask),
        )
    }

    /// Clear the bits of `mask`.
    pub fn remove_flags(&self, mask: FmtFlags) {
        self.update_format(
            |_| (),
            |s| s.remove_flags(mask),
            |f| f.flags = f.flags & !mask,
        )
    }
}

impl PartialEq for OStream {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OStream {}

impl fmt::Debug for OStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Collected before locking: the walk locks this stream too.
        let edges: Vec<String> = graph::edges(self).iter().map(ToString::to_string).collect();
        let core = self.lock();
        f.debug_struct("OStream")
            .field("id", &self.id.0)
            .field("prefix", &core.prefix)
            .field("max_chatter", &core.max_chatter)
            .field("chatter", &core.chatter)
            .field("sinks", &core.sinks.len())
            .field("edges", &edges)
            .finish()
    }
}

/// `write!`/`writeln!` support. Each `'\n'` ends the line as [`OStream::endl`] does,
/// so prefixes repeat on every line.
impl fmt::Write for &OStream {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for piece in s.split_inclusive('\n') {
            match piece.strip_suffix('\n') {
                Some(line) => {
                    if !line.is_empty() {
                        OStream::write_str(*self, line);
                    }
                    self.endl();
                }
                None => {
                    OStream::write_str(*self, piece);
                }
            }
        }
        Ok(())
    }
}

/// A chatter level to apply to a stream mid-chain.
///
/// ```
/// use chatstream::stream::{Chat, OStream};
///
/// let out = OStream::new(3);
/// Chat(5).apply(&out).write("suppressed");
/// assert_eq!(out.chatter(), 5);
/// assert_eq!(out.max_chatter(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chat(pub u32);

impl Chat {
    /// Set the stream's message chatter and hand the stream back.
    pub fn apply<'a>(&self, stream: &'a OStream) -> &'a OStream {
        stream.set_chatter(self.0)
    }
}
