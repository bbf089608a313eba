//! Core chess types and the position contract consumed by the search.

mod board;
mod chess_move;
mod color;
mod error;
mod piece;
mod piece_kind;
mod position;
mod square;
mod zobrist;

pub use board::{Board, STARTING_FEN};
pub use chess_move::Move;
pub use color::Color;
pub use error::CoreError;
pub use piece::Piece;
pub use piece_kind::PieceKind;
pub use position::Position;
pub use square::Square;
