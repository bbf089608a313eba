//! Move ordering.
//!
//! Score bands, highest searched first:
//! - cache hint: 1,000,000
//! - killer moves: 500,000 (newest killer first)
//! - captures and promotions: 100,000 + 16 * SEE + MVV-LVA tiebreak
//! - quiet moves: ordinal of the moved piece (heavier pieces first)

use warden_core::{Move, PieceKind, Position};

use crate::search::see::see;

const HINT_SCORE: i32 = 1_000_000;
const KILLER_SCORE: i32 = 500_000;
const CAPTURE_BASE: i32 = 100_000;

/// Victim-major, attacker-minor tiebreak among captures with equal SEE.
fn mvv_lva(victim: PieceKind, attacker: PieceKind) -> i32 {
    victim.index() as i32 * 8 - attacker.index() as i32
}

/// Ordering score of `mv` without killer or hint context.
pub fn score_move<P: Position>(pos: &P, mv: Move) -> i32 {
    let attacker = pos.piece_on(mv.from).map_or(PieceKind::Pawn, |p| p.kind);
    if pos.is_capture(mv) {
        let victim = pos.piece_on(mv.to).map_or(PieceKind::Pawn, |p| p.kind);
        CAPTURE_BASE + see(pos, mv) * 16 + mvv_lva(victim, attacker)
    } else if let Some(promo) = mv.promotion {
        CAPTURE_BASE + (promo.value() - PieceKind::Pawn.value()) * 16
    } else {
        attacker.index() as i32
    }
}

/// Incremental move picker using selection sort.
///
/// Yields moves in descending score order; ties keep generation order.
#[derive(Debug, Clone)]
pub struct MovePicker {
    moves: Vec<Move>,
    scores: Vec<i32>,
    cursor: usize,
}

impl MovePicker {
    /// Order a full move list for an interior node.
    ///
    /// `hint` and `killers` only affect moves present in `moves`, so a stale
    /// killer or a hint for another position is ignored.
    pub fn new<P: Position>(
        pos: &P,
        moves: Vec<Move>,
        hint: Option<Move>,
        killers: impl IntoIterator<Item = Move>,
    ) -> Self {
        let killers: Vec<Move> = killers.into_iter().collect();
        let scores = moves
            .iter()
            .map(|&mv| {
                if Some(mv) == hint {
                    HINT_SCORE
                } else if let Some(slot) = killers.iter().position(|&k| k == mv) {
                    KILLER_SCORE - slot as i32
                } else {
                    score_move(pos, mv)
                }
            })
            .collect();
        Self {
            moves,
            scores,
            cursor: 0,
        }
    }

    /// Order captures for quiescence search.
    pub fn captures<P: Position>(pos: &P, captures: Vec<Move>) -> Self {
        let scores = captures.iter().map(|&mv| score_move(pos, mv)).collect();
        Self {
            moves: captures,
            scores,
            cursor: 0,
        }
    }

    /// Yield moves exactly in the given order.
    pub fn in_order(moves: Vec<Move>) -> Self {
        let n = moves.len() as i32;
        let scores = (0..n).map(|i| n - i).collect();
        Self {
            moves,
            scores,
            cursor: 0,
        }
    }

    /// Number of moves not yet yielded.
    pub fn remaining(&self) -> usize {
        self.moves.len() - self.cursor
    }
}

impl Iterator for MovePicker {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        if self.cursor >= self.moves.len() {
            return None;
        }

        let mut best_idx = self.cursor;
        let mut best_score = self.scores[self.cursor];
        for i in (self.cursor + 1)..self.moves.len() {
            if self.scores[i] > best_score {
                best_score = self.scores[i];
                best_idx = i;
            }
        }

        self.moves.swap(self.cursor, best_idx);
        self.scores.swap(self.cursor, best_idx);

        let mv = self.moves[self.cursor];
        self.cursor += 1;
        Some(mv)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}
