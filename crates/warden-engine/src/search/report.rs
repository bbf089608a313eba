//! Progress reporting.
//!
//! The driver reports after every completed iteration. While a search runs,
//! a ticker thread also reports on a fixed cadence from [`SharedProgress`],
//! which the search thread updates through atomics and a mutex-guarded PV.
//! The ticker only reads.

use std::sync::atomic::{AtomicI32, AtomicU8, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, PoisonError};
use std::thread::{Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use tracing::info;
use warden_core::Move;

use crate::search::SearchResult;

/// One progress snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Last completed depth; 0 before the first iteration finishes.
    pub depth: u8,
    pub seldepth: u8,
    /// Centipawns from the side to move's point of view.
    pub score: i32,
    pub nodes: u64,
    pub nps: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
}

/// Receives search progress. Called from the search thread and the ticker thread.
pub trait Reporter: Send + Sync {
    fn progress(&self, progress: &Progress);

    /// Called exactly once per search, after the last progress report.
    fn finished(&self, result: &SearchResult);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn progress(&self, _progress: &Progress) {}
    fn finished(&self, _result: &SearchResult) {}
}

/// Logs progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn progress(&self, p: &Progress) {
        info!(
            depth = p.depth,
            seldepth = p.seldepth,
            score = p.score,
            nodes = p.nodes,
            nps = p.nps,
            time_ms = p.elapsed.as_millis() as u64,
            pv = %format_line(&p.pv),
            "search progress"
        );
    }

    fn finished(&self, r: &SearchResult) {
        info!(
            best_move = %r.best_move,
            score = r.score,
            depth = r.depth,
            nodes = r.nodes,
            time_ms = r.elapsed.as_millis() as u64,
            "search finished"
        );
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn progress(&self, progress: &Progress) {
        (**self).progress(progress);
    }

    fn finished(&self, result: &SearchResult) {
        (**self).finished(result);
    }
}

/// Moves as space-separated UCI text.
pub fn format_line(line: &[Move]) -> String {
    line.iter().map(|m| m.to_uci()).collect::<Vec<_>>().join(" ")
}

/// Nodes per second, guarding against a zero elapsed time.
pub fn nodes_per_second(nodes: u64, elapsed: Duration) -> u64 {
    let ms = elapsed.as_millis().max(1);
    (nodes as u128 * 1000 / ms) as u64
}

/// Counters published by the search thread for the ticker.
pub(crate) struct SharedProgress {
    start: Instant,
    nodes: AtomicU64,
    depth: AtomicU8,
    seldepth: AtomicU8,
    score: AtomicI32,
    pv: Mutex<Vec<Move>>,
}

impl SharedProgress {
    pub(crate) fn new() -> Self {
        Self {
            start: Instant::now(),
            nodes: AtomicU64::new(0),
            depth: AtomicU8::new(0),
            seldepth: AtomicU8::new(0),
            score: AtomicI32::new(0),
            pv: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub(crate) fn set_nodes(&self, nodes: u64) {
        self.nodes.store(nodes, Ordering::Relaxed);
    }

    /// Record a completed iteration.
    pub(crate) fn publish(&self, depth: u8, seldepth: u8, score: i32, nodes: u64, pv: &[Move]) {
        *self.pv.lock().unwrap_or_else(PoisonError::into_inner) = pv.to_vec();
        self.score.store(score, Ordering::Relaxed);
        self.seldepth.store(seldepth, Ordering::Relaxed);
        self.nodes.store(nodes, Ordering::Relaxed);
        self.depth.store(depth, Ordering::Release);
    }

    pub(crate) fn snapshot(&self) -> Progress {
        let depth = self.depth.load(Ordering::Acquire);
        let nodes = self.nodes.load(Ordering::Relaxed);
        let elapsed = self.start.elapsed();
        Progress {
            depth,
            seldepth: self.seldepth.load(Ordering::Relaxed),
            score: self.score.load(Ordering::Relaxed),
            nodes,
            nps: nodes_per_second(nodes, elapsed),
            elapsed,
            pv: self.pv.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        }
    }
}

/// Handle to a running ticker. Dropping the sender ends the ticker.
pub(crate) struct Ticker<'scope> {
    done: mpsc::Sender<()>,
    handle: ScopedJoinHandle<'scope, ()>,
}

impl<'scope> Ticker<'scope> {
    /// Start reporting `shared` every `interval` until [`Ticker::finish`].
    pub(crate) fn start<'env>(
        scope: &'scope Scope<'scope, 'env>,
        shared: &'scope SharedProgress,
        reporter: &'scope dyn Reporter,
        interval: Duration,
    ) -> Self {
        let (done, rx) = mpsc::channel::<()>();
        let handle = scope.spawn(move || {
            loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => reporter.progress(&shared.snapshot()),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        Self { done, handle }
    }

    /// Stop the ticker and wait for it.
    pub(crate) fn finish(self) {
        let _ = self.done.send(());
        let _ = self.handle.join();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use warden_core::Square;

    use super::*;

    #[test]
    fn snapshot_reflects_last_publish() {
        let shared = SharedProgress::new();
        let pv = [Move::new(Square::E2, Square::E4)];
        shared.publish(3, 7, 25, 1234, &pv);
        shared.set_nodes(2000);

        let snap = shared.snapshot();
        assert_eq!(snap.depth, 3);
        assert_eq!(snap.seldepth, 7);
        assert_eq!(snap.score, 25);
        assert_eq!(snap.nodes, 2000);
        assert_eq!(snap.pv, pv.to_vec());
    }

    #[test]
    fn nps_handles_zero_elapsed() {
        assert_eq!(nodes_per_second(500, Duration::ZERO), 500_000);
        assert_eq!(nodes_per_second(1000, Duration::from_secs(2)), 500);
    }

    #[test]
    fn format_line_joins_moves() {
        let line = [Move::new(Square::E2, Square::E4), Move::new(Square::D2, Square::D4)];
        assert_eq!(format_line(&line), "e2e4 d2d4");
        assert_eq!(format_line(&[]), "");
    }

    struct Counting(AtomicUsize);

    impl Reporter for Counting {
        fn progress(&self, _p: &Progress) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
        fn finished(&self, _r: &SearchResult) {}
    }

    #[test]
    fn ticker_reports_until_finished() {
        let shared = SharedProgress::new();
        let reporter = Counting(AtomicUsize::new(0));
        std::thread::scope(|s| {
            let ticker = Ticker::start(s, &shared, &reporter, Duration::from_millis(5));
            std::thread::sleep(Duration::from_millis(60));
            ticker.finish();
        });
        let ticks = reporter.0.load(Ordering::Relaxed);
        assert!(ticks >= 1, "ticker should have fired at least once");

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(reporter.0.load(Ordering::Relaxed), ticks, "no ticks after finish");
    }
}
