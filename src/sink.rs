//! Native output sinks: shared, identity-keyed handles to `io::Write` destinations.

use crate::error::ChatError;
use lazy_static::lazy_static;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Unique identifier for a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(pub usize);

static NEXT_SINK_ID: AtomicUsize = AtomicUsize::new(0);

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

lazy_static! {
    static ref STDOUT: Sink = Sink::from_writer("stdout", io::stdout());
    static ref STDERR: Sink = Sink::from_writer("stderr", io::stderr());
    static ref STDLOG: Sink = Sink::from_writer("stdlog", io::stderr());
}

/// A destination an [`OStream`](crate::stream::OStream) can forward to.
///
/// Cloning a `Sink` yields another handle to the same destination; two handles
/// compare equal exactly when they share an id.
#[derive(Clone)]
pub struct Sink {
    id: SinkId,
    label: Arc<str>,
    writer: SharedWriter,
}

impl Sink {
    /// Wrap any writer in a new sink with a fresh identity.
    pub fn from_writer<W>(label: &str, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            id: SinkId(NEXT_SINK_ID.fetch_add(1, Ordering::Relaxed)),
            label: Arc::from(label),
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// The process standard output. Every call returns the same sink.
    pub fn stdout() -> Self {
        STDOUT.clone()
    }

    /// The process standard error. Every call returns the same sink.
    pub fn stderr() -> Self {
        STDERR.clone()
    }

    /// The process log sink. Writes to standard error but has its own identity,
    /// so it can be connected and disconnected independently of [`Sink::stderr`].
    pub fn stdlog() -> Self {
        STDLOG.clone()
    }

    /// Create (or truncate) a file and wrap it in a sink.
    pub fn create_file(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ChatError::OpenSink {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(&path.display().to_string(), file))
    }

    /// A sink backed by a fresh in-memory buffer, together with a handle for reading it.
    pub fn memory(label: &str) -> (Self, MemoryBuffer) {
        let buffer = MemoryBuffer::new();
        (Self::from_writer(label, buffer.clone()), buffer)
    }

    /// This sink's identity.
    pub fn id(&self) -> SinkId {
        self.id
    }

    /// Human-readable name given at construction.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn write_str(&self, text: &str) -> io::Result<()> {
        self.lock().write_all(text.as_bytes())
    }

    pub(crate) fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Sink {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sink {}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("id", &self.id.0)
            .field("label", &self.label)
            .finish()
    }
}

/// Growable byte buffer shared between a [`Sink`] and its reader.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemoryBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discard everything written so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for MemoryBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
