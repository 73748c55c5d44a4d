//! Application context: process settings and the three standard streams.
//!
//! A program normally creates one `AppContext` at startup and passes it by
//! reference to every [`StreamFormatter`](crate::formatter::StreamFormatter).
//! [`crate::global`] holds a process-wide instance for code that cannot.

use crate::config::StreamConfig;
use crate::error::ChatError;
use crate::invariant_ppt::{assert_invariant, INIT_FIRST_CALL_WINS};
use crate::sink::Sink;
use crate::stream::{OStream, MAX_CHATTER};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
struct Settings {
    exec_name: String,
    max_chatter: u32,
    debug_mode: bool,
}

/// Executable name, maximum chatter, debug flag, and the `stout`/`sterr`/`stlog`
/// streams.
///
/// The standard streams have the highest possible maximum chatter and no prefix,
/// so anything written directly to them is shown. They start with no destinations.
#[derive(Debug)]
pub struct AppContext {
    settings: RwLock<Settings>,
    initialized: AtomicBool,
    stout: OStream,
    sterr: OStream,
    stlog: OStream,
}

impl AppContext {
    /// Empty exec name, maximum chatter `u32::MAX`, debug off, streams unconnected.
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(Settings {
                exec_name: String::new(),
                max_chatter: MAX_CHATTER,
                debug_mode: false,
            }),
            initialized: AtomicBool::new(false),
            stout: OStream::new(MAX_CHATTER),
            sterr: OStream::new(MAX_CHATTER),
            stlog: OStream::new(MAX_CHATTER),
        }
    }

    /// Build a context from configuration, connecting the sinks it names.
    pub fn from_config(config: &StreamConfig) -> Result<Self, ChatError> {
        let context = Self::new();
        context.configure(&config.exec_name, config.max_chatter, config.debug_mode);
        if config.console {
            context.connect_std_sinks();
        }
        if let Some(path) = &config.tee_file {
            let sink = Sink::create_file(path)?;
            for stream in [&context.stout, &context.sterr, &context.stlog] {
                stream.connect_sink(&sink);
            }
        }
        Ok(context)
    }

    /// Connect the standard streams to the console and store the settings.
    ///
    /// Only the first call on a context (of this or [`AppContext::configure`]) has
    /// any effect; it returns `true`, later calls return `false`.
    pub fn initialize(&self, exec_name: &str, max_chatter: u32, debug_mode: bool) -> bool {
        let first = self.configure(exec_name, max_chatter, debug_mode);
        if first {
            self.connect_std_sinks();
        }
        first
    }

    /// Store the settings without touching any sink. First call wins.
    ///
    /// The settings lock is held while the flag flips, so a reader that sees the
    /// context initialized also sees the new settings.
    pub fn configure(&self, exec_name: &str, max_chatter: u32, debug_mode: bool) -> bool {
        let mut settings = self.write_settings();
        let first = self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !first {
            log::debug!("ignoring repeated initialization as {:?}", exec_name);
            assert_invariant(
                INIT_FIRST_CALL_WINS,
                self.is_initialized(),
                "repeated initialization is ignored",
                Some("configure"),
            );
            return false;
        }
        settings.exec_name = exec_name.to_string();
        settings.max_chatter = max_chatter;
        settings.debug_mode = debug_mode;
        log::debug!(
            "initialized {:?}: max chatter {}, debug {}",
            exec_name,
            max_chatter,
            debug_mode
        );
        true
    }

    /// Connect `stout`, `sterr` and `stlog` to the process stdout, stderr and log
    /// sinks. Calling it again changes nothing.
    pub fn connect_std_sinks(&self) {
        self.stout.connect_sink(&Sink::stdout());
        self.sterr.connect_sink(&Sink::stderr());
        self.stlog.connect_sink(&Sink::stdlog());
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn exec_name(&self) -> String {
        self.read_settings().exec_name.clone()
    }

    pub fn max_chatter(&self) -> u32 {
        self.read_settings().max_chatter
    }

    pub fn debug_mode(&self) -> bool {
        self.read_settings().debug_mode
    }

    pub fn set_exec_name(&self, exec_name: &str) {
        self.write_settings().exec_name = exec_name.to_string();
    }

    /// Affects formatters created afterwards; existing ones keep their maximum.
    pub fn set_max_chatter(&self, max_chatter: u32) {
        self.write_settings().max_chatter = max_chatter;
    }

    pub fn set_debug_mode(&self, debug_mode: bool) {
        self.write_settings().debug_mode = debug_mode;
    }

    /// Standard output stream.
    pub fn stout(&self) -> &OStream {
        &self.stout
    }

    /// Standard error stream.
    pub fn sterr(&self) -> &OStream {
        &self.sterr
    }

    /// Standard log stream.
    pub fn stlog(&self) -> &OStream {
        &self.stlog
    }

    fn read_settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_settings(&self) -> RwLockWriteGuard<'_, Settings> {
        self.settings.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn new_context_is_unconnected() {
        let context = AppContext::new();
        assert!(!context.is_initialized());
        assert_eq!(context.stout().sink_count(), 0);
        assert_eq!(context.max_chatter(), MAX_CHATTER);
        assert_eq!(context.exec_name(), "");
    }

    #[test]
    fn first_configuration_wins() {
        let context = AppContext::new();
        assert!(context.configure("first", 3, true));
        assert!(!context.configure("second", 0, false));
        assert_eq!(context.exec_name(), "first");
        assert_eq!(context.max_chatter(), 3);
        assert!(context.debug_mode());
    }

    #[test]
    fn initialize_connects_console_once() {
        let context = AppContext::new();
        assert!(context.initialize("demo", 2, false));
        assert!(!context.initialize("demo", 2, false));
        context.connect_std_sinks();
        assert_eq!(context.stout().sinks(), vec![Sink::stdout()]);
        assert_eq!(context.sterr().sinks(), vec![Sink::stderr()]);
        assert_eq!(context.stlog().sinks(), vec![Sink::stdlog()]);
    }

    #[test]
    fn initialized_context_never_shows_default_settings() {
        let owned = AppContext::new();
        let context = &owned;
        std::thread::scope(|scope| {
            let readers: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || loop {
                        if context.is_initialized() {
                            assert_eq!(context.exec_name(), "ready");
                            assert_eq!(context.max_chatter(), 2);
                            break;
                        }
                        std::thread::yield_now();
                    })
                })
                .collect();
            assert!(context.configure("ready", 2, false));
            for reader in readers {
                reader.join().unwrap();
            }
        });
    }

    #[test]
    fn setters_override_settings() {
        let context = AppContext::new();
        context.configure("demo", 1, false);
        context.set_exec_name("renamed");
        context.set_max_chatter(7);
        context.set_debug_mode(true);
        assert_eq!(context.exec_name(), "renamed");
        assert_eq!(context.max_chatter(), 7);
        assert!(context.debug_mode());
    }

    #[test]
    fn from_config_tees_into_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tee.log");
        let config = StreamConfig {
            exec_name: "demo".into(),
            max_chatter: 2,
            console: false,
            tee_file: Some(path.clone()),
            ..StreamConfig::default()
        };
        let context = AppContext::from_config(&config).unwrap();
        assert!(context.is_initialized());
        context.stout().write("to out").endl();
        context.stlog().write("to log").endl();
        drop(context);

        let mut text = String::new();
        std::fs::File::open(&path)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "to out\nto log\n");
    }
}
