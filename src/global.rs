//! Process-wide context for code that cannot thread an [`AppContext`] through.
//!
//! Before [`init_std_streams`] is called the global `stout`, `sterr` and `stlog`
//! have no destinations, so anything written to them is dropped.

use crate::context::AppContext;
use crate::stream::OStream;
use lazy_static::lazy_static;

lazy_static! {
    static ref GLOBAL: AppContext = AppContext::new();
}

/// The process-wide context.
pub fn context() -> &'static AppContext {
    &GLOBAL
}

/// Connect the global standard streams to the console and store the settings.
///
/// Only the first call in the process has any effect and returns `true`.
pub fn init_std_streams(exec_name: &str, max_chatter: u32, debug_mode: bool) -> bool {
    GLOBAL.initialize(exec_name, max_chatter, debug_mode)
}

pub fn debug_mode() -> bool {
    GLOBAL.debug_mode()
}

pub fn exec_name() -> String {
    GLOBAL.exec_name()
}

pub fn max_chatter() -> u32 {
    GLOBAL.max_chatter()
}

pub fn set_debug_mode(debug_mode: bool) {
    GLOBAL.set_debug_mode(debug_mode);
}

pub fn set_exec_name(exec_name: &str) {
    GLOBAL.set_exec_name(exec_name);
}

pub fn set_max_chatter(max_chatter: u32) {
    GLOBAL.set_max_chatter(max_chatter);
}

/// Global standard output stream.
pub fn stout() -> &'static OStream {
    GLOBAL.stout()
}

/// Global standard error stream.
pub fn sterr() -> &'static OStream {
    GLOBAL.sterr()
}

/// Global standard log stream.
pub fn stlog() -> &'static OStream {
    GLOBAL.stlog()
}
