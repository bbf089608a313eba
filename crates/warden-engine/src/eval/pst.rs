//! Material plus piece-square tables.
//!
//! Tables are written from White's point of view in LERF order
//! (index 0 = A1, index 63 = H8). Black pieces read the rank-mirrored square.

use warden_core::{Color, PieceKind, Position, Square};

use crate::analysis::AnalysisResult;
use crate::eval::Evaluator;

#[rustfmt::skip]
const PAWN: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
     5,  10,  10, -20, -20,  10,  10,   5,
     5,  -5, -10,   0,   0, -10,  -5,   5,
     0,   0,   0,  20,  20,   0,   0,   0,
     5,   5,  10,  25,  25,  10,   5,   5,
    10,  10,  20,  30,  30,  20,  10,  10,
    50,  50,  50,  50,  50,  50,  50,  50,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT: [i32; 64] = [
   -50, -40, -30, -30, -30, -30, -40, -50,
   -40, -20,   0,   5,   5,   0, -20, -40,
   -30,   5,  10,  15,  15,  10,   5, -30,
   -30,   0,  15,  20,  20,  15,   0, -30,
   -30,   5,  15,  20,  20,  15,   5, -30,
   -30,   0,  10,  15,  15,  10,   0, -30,
   -40, -20,   0,   0,   0,   0, -20, -40,
   -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP: [i32; 64] = [
   -20, -10, -10, -10, -10, -10, -10, -20,
   -10,   5,   0,   0,   0,   0,   5, -10,
   -10,  10,  10,  10,  10,  10,  10, -10,
   -10,   0,  10,  10,  10,  10,   0, -10,
   -10,   5,   5,  10,  10,   5,   5, -10,
   -10,   0,   5,  10,  10,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK: [i32; 64] = [
     0,   0,   0,   5,   5,   0,   0,   0,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
     5,  10,  10,  10,  10,  10,  10,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN: [i32; 64] = [
   -20, -10, -10,  -5,  -5, -10, -10, -20,
   -10,   0,   5,   0,   0,   0,   0, -10,
   -10,   5,   5,   5,   5,   5,   0, -10,
     0,   0,   5,   5,   5,   5,   0,  -5,
    -5,   0,   5,   5,   5,   5,   0,  -5,
   -10,   0,   5,   5,   5,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING: [i32; 64] = [
    20,  30,  10,   0,   0,  10,  30,  20,
    20,  20,   0,   0,   0,   0,  20,  20,
   -10, -20, -20, -20, -20, -20, -20, -10,
   -20, -30, -30, -40, -40, -30, -30, -20,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
];

const TABLES: [&[i32; 64]; PieceKind::COUNT] = [&PAWN, &KNIGHT, &BISHOP, &ROOK, &QUEEN, &KING];

/// Positional bonus for `kind` of `color` standing on `sq`.
#[inline]
pub fn pst_value(kind: PieceKind, color: Color, sq: Square) -> i32 {
    let sq = match color {
        Color::White => sq,
        Color::Black => sq.flip_rank(),
    };
    TABLES[kind.index()][sq.index()]
}

/// Default evaluator: material plus a single-phase piece-square bonus.
#[derive(Debug, Clone, Copy, Default)]
pub struct PstEvaluator;

impl Evaluator for PstEvaluator {
    fn evaluate<P: Position>(&self, pos: &P) -> AnalysisResult {
        let mut score = 0;
        for sq in Square::all() {
            if let Some(piece) = pos.piece_on(sq) {
                let material = if piece.kind == PieceKind::King {
                    0
                } else {
                    piece.kind.value()
                };
                score += (material + pst_value(piece.kind, piece.color, sq)) * piece.color.sign();
            }
        }
        AnalysisResult::estimate(score, pos.hash2())
    }
}

#[cfg(test)]
mod tests {
    use warden_core::Board;

    use super::*;

    #[test]
    fn starting_position_is_symmetric() {
        let r = PstEvaluator.evaluate(&Board::starting_position());
        assert_eq!(r.score, 0);
    }

    #[test]
    fn mirrored_square_lookup() {
        let e4 = Square::E4;
        let e5 = Square::from_algebraic("e5").unwrap();
        assert_eq!(
            pst_value(PieceKind::Pawn, Color::White, e4),
            pst_value(PieceKind::Pawn, Color::Black, e5)
        );
    }

    #[test]
    fn central_pawn_push_is_rewarded() {
        let start = Board::starting_position();
        let after = start.play_uci("e2e4").unwrap();
        assert!(
            PstEvaluator.evaluate(&after).score > PstEvaluator.evaluate(&start).score,
            "e4 should improve White's placement"
        );
    }

    #[test]
    fn extra_material_never_hurts() {
        let without: Board = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let with: Board = "4k3/8/8/8/8/8/8/N3K3 w - - 0 1".parse().unwrap();
        assert!(PstEvaluator.evaluate(&with).score > PstEvaluator.evaluate(&without).score);
    }
}
