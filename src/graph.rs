//! Graph module: identities and forwarding edges between streams.
//!
//! Streams form a directed graph: an edge `a -> b` means everything written to `a`
//! is forwarded to `b`. The graph is kept acyclic at connect time so forwarding
//! always terminates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use crate::stream::OStream;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Unique identifier for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub usize);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

static NEXT_STREAM_ID: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn next_stream_id() -> StreamId {
    StreamId(NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed))
}

/// A forwarding edge between two streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The forwarding stream.
    pub from: StreamId,
    /// The receiving stream.
    pub to: StreamId,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Whether `target` is `start` or can be reached from it by following edges.
pub fn reaches(start: &OStream, target: StreamId) -> bool {
    let mut visited = HashSet::new();
    let mut pending = vec![start.clone()];
    while let Some(current) = pending.pop() {
        if current.id() == target {
            return true;
        }
        if !visited.insert(current.id()) {
            continue;
        }
        pending.extend(current.streams());
    }
    false
}

/// Whether connecting `from -> to` would close a cycle.
pub fn would_create_cycle(from: &OStream, to: &OStream) -> bool {
    reaches(to, from.id())
}

/// Every edge reachable from `root`, in depth-first destination order.
pub fn edges(root: &OStream) -> Vec<Edge> {
    let mut visited = HashSet::new();
    let mut out = Vec::new();
    collect_edges(root, &mut visited, &mut out);
    out
}

fn collect_edges(current: &OStream, visited: &mut HashSet<StreamId>, out: &mut Vec<Edge>) {
    if !visited.insert(current.id()) {
        return;
    }
    for next in current.streams() {
        out.push(Edge {
            from: current.id(),
            to: next.id(),
        });
        collect_edges(&next, visited, out);
    }
}
