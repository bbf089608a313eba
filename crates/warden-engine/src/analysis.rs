//! Analysis results: the value attached to every searched or evaluated node.

use warden_core::Color;

/// Score representing an unreachable upper/lower bound.
pub const INF: i32 = 30_000;

/// Base score for checkmate (reduced by the ply at which mate is delivered).
pub const MATE_SCORE: i32 = 29_000;

/// Scores beyond this magnitude indicate a forced mate.
pub const MATE_THRESHOLD: i32 = 28_000;

/// How a score relates to the true minimax value.
///
/// Like the score it qualifies, a bound inside [`AnalysisResult`] is
/// White-relative: `LowerBound` means White's true value is at least the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The score is the true value.
    Exact,
    /// The true value is at least the score.
    LowerBound,
    /// The true value is at most the score.
    UpperBound,
}

impl Bound {
    /// The same bound seen from the other side (a lower bound becomes an upper one).
    #[inline]
    pub const fn flipped(self) -> Bound {
        match self {
            Bound::Exact => Bound::Exact,
            Bound::LowerBound => Bound::UpperBound,
            Bound::UpperBound => Bound::LowerBound,
        }
    }

    /// Convert between the White-relative and `side`-relative views.
    ///
    /// The conversion is its own inverse.
    #[inline]
    pub const fn relative_to(self, side: Color) -> Bound {
        match side {
            Color::White => self,
            Color::Black => self.flipped(),
        }
    }
}

/// Outcome of evaluating or searching one position.
///
/// `score` is always White-relative: positive favours White no matter who is
/// to move. Use [`relative_to`](AnalysisResult::relative_to) for the
/// side-to-move view used inside negamax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Centipawns, White-relative.
    pub score: i32,
    /// The line leads to a stalemate.
    pub is_stalemate: bool,
    /// `false` for terminal results (mate or stalemate), which no deeper
    /// search can change.
    pub needs_deeper: bool,
    /// How `score` relates to the true value, White-relative like the score:
    /// `LowerBound` means White gets at least `score`, `UpperBound` at most.
    pub bound: Bound,
    /// Nominal search depth that produced this result.
    pub plies_to_eval0: u8,
    /// Selective depth below this node (quiescence included).
    pub plies_to_seldepth: u8,
    /// Secondary hash of the position this result belongs to.
    pub verification_hash: u64,
}

impl AnalysisResult {
    /// A static estimate (evaluator output).
    pub const fn estimate(score: i32, verification_hash: u64) -> AnalysisResult {
        AnalysisResult {
            score,
            is_stalemate: false,
            needs_deeper: true,
            bound: Bound::Exact,
            plies_to_eval0: 0,
            plies_to_seldepth: 0,
            verification_hash,
        }
    }

    /// The side to move at `ply` is checkmated.
    pub const fn checkmated(side: Color, ply: usize, verification_hash: u64) -> AnalysisResult {
        let mated = -(MATE_SCORE - ply as i32);
        AnalysisResult {
            score: mated * side.sign(),
            is_stalemate: false,
            needs_deeper: false,
            bound: Bound::Exact,
            plies_to_eval0: 0,
            plies_to_seldepth: 0,
            verification_hash,
        }
    }

    /// The side to move has no legal move and is not in check.
    pub const fn stalemate(verification_hash: u64) -> AnalysisResult {
        AnalysisResult {
            score: 0,
            is_stalemate: true,
            needs_deeper: false,
            bound: Bound::Exact,
            plies_to_eval0: 0,
            plies_to_seldepth: 0,
            verification_hash,
        }
    }

    /// Score from `side`'s point of view.
    #[inline]
    pub const fn relative_to(&self, side: Color) -> i32 {
        self.score * side.sign()
    }

    /// Whether the score announces a forced mate for either side.
    #[inline]
    pub const fn is_mate(&self) -> bool {
        is_mate_score(self.score)
    }
}

/// Whether `score` lies in the mate band.
#[inline]
pub const fn is_mate_score(score: i32) -> bool {
    score.abs() > MATE_THRESHOLD
}

/// Moves until mate, signed like `score` (positive: the side the score favours
/// mates). `None` for ordinary scores.
pub fn mate_in(score: i32) -> Option<i32> {
    if !is_mate_score(score) {
        return None;
    }
    let plies = MATE_SCORE - score.abs();
    let moves = (plies + 1) / 2;
    Some(if score > 0 { moves } else { -moves })
}

/// Convert a root-relative score to node-relative form for caching.
///
/// Mate scores encode distance from the root; stored entries must encode
/// distance from the node so transpositions at other plies read them correctly.
pub const fn score_to_cache(score: i32, ply: usize) -> i32 {
    if score > MATE_THRESHOLD {
        score + ply as i32
    } else if score < -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

/// Reverse [`score_to_cache`].
pub const fn score_from_cache(score: i32, ply: usize) -> i32 {
    if score > MATE_THRESHOLD {
        score - ply as i32
    } else if score < -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_score_flips_for_black() {
        let r = AnalysisResult::estimate(120, 0);
        assert_eq!(r.relative_to(Color::White), 120);
        assert_eq!(r.relative_to(Color::Black), -120);
    }

    #[test]
    fn checkmated_side_gets_negative_relative_score() {
        let black_mated = AnalysisResult::checkmated(Color::Black, 3, 0);
        assert!(black_mated.score > MATE_THRESHOLD, "White-relative score favours White");
        assert!(black_mated.relative_to(Color::Black) < -MATE_THRESHOLD);
        assert!(!black_mated.needs_deeper);

        let white_mated = AnalysisResult::checkmated(Color::White, 2, 0);
        assert!(white_mated.score < -MATE_THRESHOLD);
    }

    #[test]
    fn bound_flips_for_black_only() {
        assert_eq!(Bound::LowerBound.relative_to(Color::White), Bound::LowerBound);
        assert_eq!(Bound::LowerBound.relative_to(Color::Black), Bound::UpperBound);
        assert_eq!(Bound::Exact.relative_to(Color::Black), Bound::Exact);
        assert_eq!(Bound::UpperBound.flipped().flipped(), Bound::UpperBound);
    }

    #[test]
    fn stalemate_is_zero_and_terminal() {
        let r = AnalysisResult::stalemate(7);
        assert_eq!(r.score, 0);
        assert!(r.is_stalemate);
        assert!(!r.needs_deeper);
        assert_eq!(r.verification_hash, 7);
    }

    #[test]
    fn mate_distance_survives_cache_roundtrip() {
        let mate = MATE_SCORE - 5;
        assert_eq!(score_from_cache(score_to_cache(mate, 4), 4), mate);
        assert_eq!(score_from_cache(score_to_cache(-mate, 4), 4), -mate);
        assert_eq!(score_to_cache(150, 9), 150);
    }

    #[test]
    fn cached_mate_is_reread_relative_to_new_ply() {
        // Mate delivered 2 plies below a node first seen at ply 3 (root ply 5).
        let stored = score_to_cache(MATE_SCORE - 5, 3);
        // The same node reached at ply 1 is mate at root ply 3.
        assert_eq!(score_from_cache(stored, 1), MATE_SCORE - 3);
    }

    #[test]
    fn mate_in_counts_moves() {
        assert_eq!(mate_in(MATE_SCORE - 1), Some(1));
        assert_eq!(mate_in(MATE_SCORE - 3), Some(2));
        assert_eq!(mate_in(-(MATE_SCORE - 2)), Some(-1));
        assert_eq!(mate_in(35), None);
    }
}
