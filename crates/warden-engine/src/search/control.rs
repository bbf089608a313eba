//! Search control: stop flag, clock limits and node cap.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cloneable handle that asks a running search to stop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the search to stop as soon as possible.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clear a pending stop request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub(crate) fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Decides when a search must stop.
///
/// The stop flag is read at every node. The clock is read once every
/// `poll_interval` nodes. When the hard limit or node cap fires, the flag is
/// raised so later checks return immediately.
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    soft_limit: Option<Duration>,
    hard_limit: Option<Duration>,
    node_limit: Option<u64>,
    poll_interval: u64,
}

impl SearchControl {
    /// No clock limits; only the stop flag (and node cap, if set) end the search.
    pub fn new_infinite(stopped: Arc<AtomicBool>) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            soft_limit: None,
            hard_limit: None,
            node_limit: None,
            poll_interval: 2048,
        }
    }

    /// Clock limits; the clock starts now.
    ///
    /// `soft` is checked between iterations, `hard` inside the tree.
    pub fn new_timed(stopped: Arc<AtomicBool>, soft: Option<Duration>, hard: Option<Duration>) -> Self {
        Self {
            soft_limit: soft,
            hard_limit: hard,
            ..Self::new_infinite(stopped)
        }
    }

    /// Stop after this many nodes.
    pub fn with_node_limit(mut self, nodes: Option<u64>) -> Self {
        self.node_limit = nodes;
        self
    }

    /// Read the clock once every `nodes` nodes.
    pub fn with_poll_interval(mut self, nodes: u64) -> Self {
        self.poll_interval = nodes.max(1);
        self
    }

    /// Whether the search must abort now.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }

        if let Some(limit) = self.node_limit
            && nodes >= limit
        {
            self.stopped.store(true, Ordering::Release);
            return true;
        }

        if nodes % self.poll_interval != 0 {
            return false;
        }

        if let Some(hard) = self.hard_limit
            && self.elapsed() >= hard
        {
            self.stopped.store(true, Ordering::Release);
            return true;
        }

        false
    }

    /// Whether the flag is raised, without touching the clock.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Whether a new iteration should be started.
    ///
    /// `true` once the soft limit has passed or the search was stopped.
    pub fn should_stop_iterating(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        self.soft_limit.is_some_and(|soft| self.elapsed() >= soft)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl std::fmt::Debug for SearchControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchControl")
            .field("stopped", &self.is_stopped())
            .field("soft_limit", &self.soft_limit)
            .field("hard_limit", &self.hard_limit)
            .field("node_limit", &self.node_limit)
            .finish()
    }
}
