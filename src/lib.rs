//! Chatter-filtered fan-out output streams.
//!
//! Write through an [`stream::OStream`] to any number of sinks and other streams;
//! output whose chatter exceeds the stream's maximum is dropped, and every line
//! starts with the stream's prefix. [`formatter::StreamFormatter`] builds
//! standardized debug/error/info/output/warning streams on top of an
//! [`context::AppContext`].

pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod formatter;
pub mod global;
pub mod graph;
#[doc(hidden)]
pub mod invariant_ppt;
pub mod sink;
pub mod stream;

pub use config::StreamConfig;
pub use context::AppContext;
pub use error::ChatError;
pub use format::{FmtFlags, FormatState, Manip, Render, Shown};
pub use formatter::StreamFormatter;
pub use sink::{MemoryBuffer, Sink};
pub use stream::{Chat, OStream, MAX_CHATTER};
