//! Game phase from remaining non-pawn material.

use warden_core::{PieceKind, Position, Square};

/// Phase of a full starting complement of pieces.
///
/// Weights: Knight=1, Bishop=1, Rook=2, Queen=4.
pub const MAX_PHASE: i32 = 24;

const fn phase_weight(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Knight | PieceKind::Bishop => 1,
        PieceKind::Rook => 2,
        PieceKind::Queen => 4,
        PieceKind::Pawn | PieceKind::King => 0,
    }
}

/// Phase in `0..=MAX_PHASE`; 0 is a pawn ending, [`MAX_PHASE`] a full middlegame.
///
/// Clamped so promotions cannot push it past the maximum.
pub fn game_phase<P: Position>(pos: &P) -> i32 {
    let phase: i32 = Square::all()
        .filter_map(|sq| pos.piece_on(sq))
        .map(|piece| phase_weight(piece.kind))
        .sum();
    phase.min(MAX_PHASE)
}
