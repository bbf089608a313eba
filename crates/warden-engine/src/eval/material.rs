//! Material counting.

use warden_core::{Color, PieceKind, Position, Square};

use crate::analysis::AnalysisResult;
use crate::eval::Evaluator;

/// Material balance in centipawns, White-relative. Kings are not counted.
pub fn material_balance<P: Position>(pos: &P) -> i32 {
    Square::all()
        .filter_map(|sq| pos.piece_on(sq))
        .filter(|piece| piece.kind != PieceKind::King)
        .map(|piece| piece.kind.value() * piece.color.sign())
        .sum()
}

/// Material of one side, kings excluded.
pub fn side_material<P: Position>(pos: &P, side: Color) -> i32 {
    Square::all()
        .filter_map(|sq| pos.piece_on(sq))
        .filter(|piece| piece.color == side && piece.kind != PieceKind::King)
        .map(|piece| piece.kind.value())
        .sum()
}

/// Scores positions by material alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate<P: Position>(&self, pos: &P) -> AnalysisResult {
        AnalysisResult::estimate(material_balance(pos), pos.hash2())
    }
}
