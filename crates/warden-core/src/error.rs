//! Errors raised at the position boundary.

/// Malformed or illegal input handed to the core types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The FEN string could not be parsed or describes an impossible position.
    #[error("invalid FEN \"{fen}\": {reason}")]
    InvalidFen {
        /// The rejected FEN string.
        fen: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Text that is not a square in algebraic notation.
    #[error("invalid square: {text}")]
    InvalidSquare {
        /// The rejected text.
        text: String,
    },

    /// Text that is not a UCI move.
    #[error("malformed move: {text}")]
    MalformedMove {
        /// The rejected text.
        text: String,
    },

    /// A well-formed move that is not legal in the given position.
    #[error("illegal move {uci} in this position")]
    IllegalMove {
        /// UCI text of the rejected move.
        uci: String,
    },
}
