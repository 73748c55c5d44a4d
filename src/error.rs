//! Error types for chatstream.

use crate::graph::StreamId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while wiring streams or loading configuration.
///
/// Writing never fails; only graph construction and I/O set-up do.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Connecting the streams would create a forwarding cycle.
    #[error("connecting {from} to {to} would create a forwarding cycle")]
    CycleDetected {
        /// The stream that would forward.
        from: StreamId,
        /// The stream that would receive.
        to: StreamId,
    },
    /// A file sink could not be opened.
    #[error("cannot open sink {}: {source}", path.display())]
    OpenSink {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A configuration file could not be read.
    #[error("cannot read configuration {}: {source}", path.display())]
    ReadConfig {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A configuration document is not valid TOML for [`crate::config::StreamConfig`].
    #[error("invalid configuration: {0}")]
    ParseConfig(#[from] toml::de::Error),
}
