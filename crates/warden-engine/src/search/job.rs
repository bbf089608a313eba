//! Running a search on a worker thread.

use std::thread::{self, JoinHandle};

use tracing::{debug, error};
use warden_core::Position;

use crate::error::EngineError;
use crate::eval::Evaluator;
use crate::search::control::StopHandle;
use crate::search::report::Reporter;
use crate::search::{SearchLimits, SearchResult, Searcher};

/// What a finished job hands back: the session, ready for the next search,
/// and the outcome of this one.
#[derive(Debug)]
pub struct Finished<P, E> {
    pub searcher: Searcher<P, E>,
    pub result: Result<SearchResult, EngineError>,
}

/// A search running on its own thread.
///
/// The job owns the [`Searcher`] while it runs; [`join`](Self::join) returns it.
pub struct SearchJob<P, E> {
    stop: StopHandle,
    handle: JoinHandle<Finished<P, E>>,
}

impl<P: Position, E: Evaluator + 'static> SearchJob<P, E> {
    /// Start `searcher` on a new thread.
    ///
    /// Any stale stop request is cleared before the thread starts, so a `stop`
    /// issued after this returns always reaches the new search.
    pub fn spawn<R: Reporter + 'static>(mut searcher: Searcher<P, E>, limits: SearchLimits, reporter: R) -> Self {
        let stop = searcher.stop_handle();
        stop.reset();
        let handle = thread::spawn(move || {
            let result = searcher.search(&limits, &reporter);
            Finished { searcher, result }
        });
        debug!("search job spawned");
        Self { stop, handle }
    }

    /// Handle that stops this job's search.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the search to stop and wait for it.
    pub fn stop(self) -> Result<Finished<P, E>, EngineError> {
        self.stop.stop();
        self.join()
    }

    /// Wait for the search to end on its own.
    pub fn join(self) -> Result<Finished<P, E>, EngineError> {
        self.handle.join().map_err(|_| {
            error!("search thread panicked");
            EngineError::SearchPanicked
        })
    }
}
