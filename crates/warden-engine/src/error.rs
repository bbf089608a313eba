//! Engine error type.

use thiserror::Error;
use warden_core::Move;

/// Failures surfaced by the search API.
///
/// Everything that can go wrong inside the tree (cache collisions, terminal
/// positions, cancellation) is recovered locally; only caller mistakes and a
/// crashed worker reach this type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A move in `restrict_to` is not legal in the root position.
    #[error("restricted move {mv} is not legal in the root position")]
    IllegalRestriction { mv: Move },

    /// The background search thread panicked.
    #[error("search worker panicked")]
    SearchPanicked,
}
