//! Quiescence search: captures only, below the nominal horizon.

use warden_core::{Move, Position};

use crate::analysis::{AnalysisResult, INF};
use crate::eval::Evaluator;
use crate::search::negamax::{MAX_PLY, Probe, SearchContext, classify, probe_cache, terminal_result};
use crate::search::ordering::MovePicker;

/// Resolve pending captures before trusting the static evaluation.
///
/// The side to move may always stand pat on the evaluator's score. Captures
/// are tried best exchange first; each level adds one ply of selective depth
/// to the result it returns. Results are cached with depth 0.
pub(super) fn quiescence<P: Position, E: Evaluator>(
    pos: &P,
    mut alpha: i32,
    beta: i32,
    ply: usize,
    ctx: &mut SearchContext<'_, E>,
) -> AnalysisResult {
    if ctx.enter(ply) {
        return AnalysisResult::estimate(0, pos.hash2());
    }

    if let Probe::Resolved(result) = probe_cache(pos, 0, alpha, beta, ply, ctx) {
        return result;
    }

    let legal = pos.legal_moves();
    if legal.is_empty() {
        let result = terminal_result(pos, ply);
        ctx.store(pos, result, None, ply);
        return result;
    }

    let stand_pat = ctx.evaluator.evaluate(pos);
    if ply >= MAX_PLY - 1 {
        return stand_pat;
    }

    let side = pos.active_side();
    let original_alpha = alpha;
    let stand_score = stand_pat.relative_to(side);

    if stand_score >= beta {
        let result = AnalysisResult {
            bound: classify(stand_score, original_alpha, beta).relative_to(side),
            ..stand_pat
        };
        ctx.store(pos, result, None, ply);
        return result;
    }
    alpha = alpha.max(stand_score);

    let mut best_score = stand_score;
    let mut best = stand_pat;
    let mut best_move: Option<Move> = None;

    for mv in MovePicker::captures(pos, pos.captures()) {
        if ctx.interrupted() {
            break;
        }
        let child = pos.apply_move(mv);
        let result = quiescence(&child, -beta, -alpha, ply + 1, ctx);
        if ctx.aborted {
            break;
        }

        let score = result.relative_to(side);
        if score > best_score {
            best_score = score;
            best = AnalysisResult {
                plies_to_seldepth: result.plies_to_seldepth.saturating_add(1),
                ..result
            };
            best_move = Some(mv);
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    break;
                }
            }
        }
    }

    if ctx.aborted {
        return best;
    }

    debug_assert!(best_score > -INF);
    let result = AnalysisResult {
        bound: classify(best_score, original_alpha, beta).relative_to(side),
        needs_deeper: true,
        plies_to_eval0: 0,
        verification_hash: pos.hash2(),
        ..best
    };
    ctx.store(pos, result, best_move, ply);
    result
}
