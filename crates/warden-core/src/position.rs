//! The position contract consumed by the search.

use crate::chess_move::Move;
use crate::color::Color;
use crate::piece::Piece;
use crate::square::Square;

/// A board position as seen by the search.
///
/// Implementations are value-like: [`apply_move`](Position::apply_move) returns a
/// new position and never mutates `self`. Moves passed to `apply_move` must come
/// from [`legal_moves`](Position::legal_moves) of the same position.
pub trait Position: Clone + Send + 'static {
    /// All legal moves for the side to move.
    fn legal_moves(&self) -> Vec<Move>;

    /// Legal captures only (en passant included).
    fn captures(&self) -> Vec<Move>;

    /// The position after playing `mv`.
    fn apply_move(&self, mv: Move) -> Self;

    /// Whether the side to move is in check.
    fn is_in_check(&self) -> bool;

    /// Primary Zobrist key, used to index caches.
    fn hash(&self) -> u64;

    /// Independent secondary key, used to verify cache hits.
    fn hash2(&self) -> u64;

    /// The side to move.
    fn active_side(&self) -> Color;

    /// The piece standing on `sq`, if any.
    fn piece_on(&self, sq: Square) -> Option<Piece>;

    /// Whether `mv` is legal here.
    fn is_legal(&self, mv: Move) -> bool {
        self.legal_moves().contains(&mv)
    }

    /// Whether `mv` captures something, judged from the destination square
    /// (en passant is detected as a diagonal pawn move onto an empty square).
    fn is_capture(&self, mv: Move) -> bool {
        if self.piece_on(mv.to).is_some() {
            return true;
        }
        matches!(self.piece_on(mv.from), Some(p) if p.kind == crate::PieceKind::Pawn)
            && mv.from.file() != mv.to.file()
    }
}
