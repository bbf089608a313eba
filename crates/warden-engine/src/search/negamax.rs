//! Negamax alpha-beta search with result caching, and the aspiration loop
//! that drives it at the root.
//!
//! Scores handed between plies are White-relative [`AnalysisResult`]s;
//! alpha and beta are always from the side to move's point of view.

use tracing::debug;
use warden_core::{Move, Position};

use crate::analysis::{AnalysisResult, Bound, INF};
use crate::eval::Evaluator;
use crate::search::control::SearchControl;
use crate::search::heuristics::KillerTable;
use crate::search::ordering::MovePicker;
use crate::search::quiescence::quiescence;
use crate::search::report::SharedProgress;
use crate::search::tt::ResultCache;

/// Maximum search ply (array bound for killers and the PV table).
pub const MAX_PLY: usize = 128;

/// Node-count interval at which the ticker's node counter is refreshed.
const PROGRESS_NODES: u64 = 1024;

/// Triangular principal variation table.
///
/// Row `ply` holds the best line found from the node at `ply`.
pub struct PvTable {
    lines: Box<[[Move; MAX_PLY]; MAX_PLY]>,
    len: [usize; MAX_PLY],
}

impl PvTable {
    pub fn new() -> Self {
        Self {
            lines: Box::new([[Move::NULL; MAX_PLY]; MAX_PLY]),
            len: [0; MAX_PLY],
        }
    }

    /// Forget the line at `ply` (called on entering a node).
    pub fn clear_ply(&mut self, ply: usize) {
        if let Some(len) = self.len.get_mut(ply) {
            *len = 0;
        }
    }

    /// Set the line at `ply` to `mv` followed by the line at `ply + 1`.
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        let child_len = if ply + 1 < MAX_PLY {
            self.len[ply + 1].min(MAX_PLY - 1)
        } else {
            0
        };
        let (head, tail) = self.lines.split_at_mut(ply + 1);
        head[ply][0] = mv;
        if child_len > 0 {
            head[ply][1..=child_len].copy_from_slice(&tail[0][..child_len]);
        }
        self.len[ply] = child_len + 1;
    }

    /// The principal variation from the root.
    pub fn root_pv(&self) -> &[Move] {
        &self.lines[0][..self.len[0]]
    }
}

impl Default for PvTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Search state threaded through negamax and quiescence calls.
pub(super) struct SearchContext<'a, E> {
    pub nodes: u64,
    /// Deepest ply reached in the current iteration.
    pub seldepth: usize,
    pub cache: &'a mut ResultCache,
    pub killers: &'a mut KillerTable,
    pub evaluator: &'a E,
    pub control: &'a SearchControl,
    pub progress: &'a SharedProgress,
    pub pv: PvTable,
    /// Root moves in the order to search them (already restricted).
    pub root_moves: Vec<Move>,
    /// Results of root moves fully searched in the current pass.
    pub root_results: Vec<(Move, AnalysisResult)>,
    /// Best root move of the current pass so far.
    pub root_best: Option<(Move, AnalysisResult)>,
    /// Whether the root result may be cached (not when moves are restricted).
    pub store_root: bool,
    /// Set once the search was told to stop; everything after is discarded.
    pub aborted: bool,
}

impl<'a, E: Evaluator> SearchContext<'a, E> {
    /// Count a node at `ply` and check for abort. Returns `true` if aborted.
    pub fn enter(&mut self, ply: usize) -> bool {
        self.nodes += 1;
        if self.nodes % PROGRESS_NODES == 0 {
            self.progress.set_nodes(self.nodes);
        }
        self.seldepth = self.seldepth.max(ply);
        self.pv.clear_ply(ply);
        if self.control.should_stop(self.nodes) {
            self.aborted = true;
        }
        self.aborted
    }

    /// Cheap stop check before expanding a child.
    pub fn interrupted(&mut self) -> bool {
        if self.control.is_stopped() {
            self.aborted = true;
        }
        self.aborted
    }

    fn begin_pass(&mut self) {
        self.root_results.clear();
        self.root_best = None;
    }

    /// Cache a result unless it belongs to a restricted root.
    pub fn store<P: Position>(&mut self, pos: &P, result: AnalysisResult, best_move: Option<Move>, ply: usize) {
        if ply > 0 || self.store_root {
            self.cache.store(pos.hash(), result, best_move, ply);
        }
    }
}

/// Outcome of consulting the cache at a node.
pub(super) enum Probe {
    /// The cached entry settles the node.
    Resolved(AnalysisResult),
    /// Search is needed; the entry's best move, if any, is an ordering hint.
    Continue(Option<Move>),
}

/// Consult the cache for `pos` searched to `depth` within `(alpha, beta)`.
///
/// An entry qualifies if it is terminal or was searched at least as deep.
/// An exact entry resolves the node. A lower bound raises alpha and an upper
/// bound lowers beta; if the window closes, the bound alone resolves the node.
/// A tightened window is never passed on to the search itself. A resolved
/// node reports zero selective depth since no work was done for it.
///
/// The root is never resolved from the cache.
pub(super) fn probe_cache<P: Position, E: Evaluator>(
    pos: &P,
    depth: u8,
    alpha: i32,
    beta: i32,
    ply: usize,
    ctx: &mut SearchContext<'_, E>,
) -> Probe {
    let Some(entry) = ctx.cache.probe(pos.hash(), pos.hash2(), ply) else {
        return Probe::Continue(None);
    };
    let cached = entry.result;
    if ply == 0 || (cached.needs_deeper && cached.plies_to_eval0 < depth) {
        return Probe::Continue(entry.best_move);
    }

    let side = pos.active_side();
    let score = cached.relative_to(side);
    let (mut lo, mut hi) = (alpha, beta);
    match cached.bound.relative_to(side) {
        Bound::Exact => return Probe::Resolved(free_lookup(cached)),
        Bound::LowerBound => lo = lo.max(score),
        Bound::UpperBound => hi = hi.min(score),
    }
    if lo >= hi {
        Probe::Resolved(free_lookup(cached))
    } else {
        Probe::Continue(entry.best_move)
    }
}

/// A resolved cache entry cost no search here, so it adds no depth.
fn free_lookup(mut result: AnalysisResult) -> AnalysisResult {
    result.plies_to_eval0 = 0;
    result.plies_to_seldepth = 0;
    result
}

/// Result for a position with no legal moves.
pub(super) fn terminal_result<P: Position>(pos: &P, ply: usize) -> AnalysisResult {
    if pos.is_in_check() {
        AnalysisResult::checkmated(pos.active_side(), ply, pos.hash2())
    } else {
        AnalysisResult::stalemate(pos.hash2())
    }
}

/// Classify a fail-soft score against the window it was searched with.
pub(super) fn classify(best: i32, original_alpha: i32, beta: i32) -> Bound {
    if best <= original_alpha {
        Bound::UpperBound
    } else if best >= beta {
        Bound::LowerBound
    } else {
        Bound::Exact
    }
}

/// Negamax alpha-beta search to `depth` plies.
///
/// The principal variation is collected into `ctx.pv`. If the search is
/// aborted, the returned value is meaningless and nothing is cached.
pub(super) fn negamax<P: Position, E: Evaluator>(
    pos: &P,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    ply: usize,
    ctx: &mut SearchContext<'_, E>,
) -> AnalysisResult {
    if depth == 0 {
        return quiescence(pos, alpha, beta, ply, ctx);
    }
    if ctx.enter(ply) {
        return AnalysisResult::estimate(0, pos.hash2());
    }

    let hint = match probe_cache(pos, depth, alpha, beta, ply, ctx) {
        Probe::Resolved(result) => return result,
        Probe::Continue(hint) => hint,
    };

    let legal = pos.legal_moves();
    if legal.is_empty() {
        let result = terminal_result(pos, ply);
        ctx.store(pos, result, None, ply);
        return result;
    }

    if ply >= MAX_PLY - 1 {
        return ctx.evaluator.evaluate(pos);
    }

    let picker = if ply == 0 {
        MovePicker::in_order(ctx.root_moves.clone())
    } else {
        MovePicker::new(pos, legal, hint, ctx.killers.killers(ply))
    };

    let side = pos.active_side();
    let original_alpha = alpha;
    let mut best_score = -INF;
    let mut best: Option<(Move, AnalysisResult)> = None;

    for mv in picker {
        if ctx.interrupted() {
            break;
        }
        let child = pos.apply_move(mv);
        let result = negamax(&child, depth - 1, -beta, -alpha, ply + 1, ctx);
        if ctx.aborted {
            break;
        }

        let score = result.relative_to(side);
        if ply == 0 {
            ctx.root_results.push((mv, result));
        }
        if score > best_score {
            best_score = score;
            best = Some((mv, result));
            if ply == 0 {
                ctx.root_best = Some((mv, result));
            }
            if score > alpha {
                alpha = score;
                ctx.pv.update(ply, mv);
                if alpha >= beta {
                    if !pos.is_capture(mv) && mv.promotion.is_none() {
                        ctx.killers.store(ply, mv);
                    }
                    break;
                }
            }
        }
    }

    let Some((best_move, best_child)) = best else {
        return AnalysisResult::estimate(0, pos.hash2());
    };
    if ctx.aborted {
        return best_child;
    }

    let result = AnalysisResult {
        score: best_child.score,
        is_stalemate: best_child.is_stalemate,
        needs_deeper: true,
        bound: classify(best_score, original_alpha, beta).relative_to(side),
        plies_to_eval0: depth,
        plies_to_seldepth: best_child.plies_to_seldepth.saturating_add(1),
        verification_hash: pos.hash2(),
    };
    ctx.store(pos, result, Some(best_move), ply);
    result
}

/// Search the root to `depth` inside an aspiration window.
///
/// Depth 1 (no `previous` score) uses the full window. Otherwise the window
/// is `previous ± window`; a result on or outside an edge widens that edge by
/// `factor` and the same depth is searched again until the score lands
/// strictly inside. Returns `None` if the search was aborted.
pub(super) fn aspiration_search<P: Position, E: Evaluator>(
    pos: &P,
    depth: u8,
    previous: Option<i32>,
    window: i32,
    factor: i32,
    ctx: &mut SearchContext<'_, E>,
) -> Option<AnalysisResult> {
    let side = pos.active_side();
    let factor = factor.max(2);
    let window = window.max(1);

    let (center, mut alpha, mut beta) = match previous {
        Some(prev) => (prev, (prev - window).max(-INF), (prev + window).min(INF)),
        None => (0, -INF, INF),
    };
    let (mut below, mut above) = (window, window);

    loop {
        ctx.begin_pass();
        let result = negamax(pos, depth, alpha, beta, 0, ctx);
        if ctx.aborted {
            return None;
        }

        let score = result.relative_to(side);
        if score <= alpha && alpha > -INF {
            below = below.saturating_mul(factor);
            alpha = center.saturating_sub(below).max(-INF);
            debug!(depth, score, alpha, beta, "aspiration fail low, widening");
        } else if score >= beta && beta < INF {
            above = above.saturating_mul(factor);
            beta = center.saturating_add(above).min(INF);
            debug!(depth, score, alpha, beta, "aspiration fail high, widening");
        } else {
            return Some(result);
        }
    }
}

#[cfg(test)]
pub(super) mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use warden_core::{Board, Color, Square};

    use super::*;
    use crate::analysis::{MATE_THRESHOLD, is_mate_score};
    use crate::eval::{MaterialEvaluator, PstEvaluator};

    /// Owns everything a [`SearchContext`] borrows.
    pub(in crate::search) struct Harness {
        pub cache: ResultCache,
        pub killers: KillerTable,
        pub control: SearchControl,
        pub progress: SharedProgress,
    }

    impl Harness {
        pub fn new(cache_capacity: usize) -> Self {
            Self {
                cache: ResultCache::new(cache_capacity),
                killers: KillerTable::new(),
                control: SearchControl::new_infinite(Arc::new(AtomicBool::new(false))),
                progress: SharedProgress::new(),
            }
        }

        pub fn context<'a, E: Evaluator>(&'a mut self, evaluator: &'a E, root: &Board) -> SearchContext<'a, E> {
            SearchContext {
                nodes: 0,
                seldepth: 0,
                cache: &mut self.cache,
                killers: &mut self.killers,
                evaluator,
                control: &self.control,
                progress: &self.progress,
                pv: PvTable::new(),
                root_moves: root.legal_moves(),
                root_results: Vec::new(),
                root_best: None,
                store_root: true,
                aborted: false,
            }
        }
    }

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    fn full_window(pos: &Board, depth: u8, cache: usize) -> AnalysisResult {
        let mut h = Harness::new(cache);
        let mut ctx = h.context(&PstEvaluator, pos);
        negamax(pos, depth, -INF, INF, 0, &mut ctx)
    }

    #[test]
    fn pv_table_copies_child_line() {
        let mut pv = PvTable::new();
        let a = Move::new(Square::E2, Square::E4);
        let b = Move::new(Square::from_algebraic("e7").unwrap(), Square::from_algebraic("e5").unwrap());
        pv.update(1, b);
        pv.update(0, a);
        assert_eq!(pv.root_pv(), &[a, b]);
        pv.clear_ply(0);
        assert!(pv.root_pv().is_empty());
    }

    #[test]
    fn finds_free_queen() {
        let pos = board("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1");
        let mut h = Harness::new(1024);
        let mut ctx = h.context(&MaterialEvaluator, &pos);
        let r = negamax(&pos, 2, -INF, INF, 0, &mut ctx);
        assert_eq!(ctx.pv.root_pv()[0].to_uci(), "d1d5");
        assert_eq!(r.score, 500, "rook vs nothing after winning the queen");
        assert_eq!(r.bound, Bound::Exact);
    }

    #[test]
    fn mate_in_one_scores_as_mate() {
        let pos = board("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
        let r = full_window(&pos, 2, 1024);
        assert!(r.score > MATE_THRESHOLD, "score {} should be mate for White", r.score);
    }

    #[test]
    fn black_mated_is_positive_for_white() {
        let pos = board("7k/6Q1/5K2/8/8/8/8/8 b - - 0 1");
        let r = full_window(&pos, 1, 16);
        assert!(r.score > MATE_THRESHOLD);
        assert!(!r.needs_deeper);
    }

    #[test]
    fn stalemate_is_terminal_zero() {
        let pos = board("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");
        let r = full_window(&pos, 3, 16);
        assert_eq!(r.score, 0);
        assert!(r.is_stalemate);
    }

    /// Windowed results must agree with a full-window re-search.
    fn assert_bound_sound(pos: &Board, depth: u8, alpha: i32, beta: i32) {
        let mut h = Harness::new(0);
        let mut ctx = h.context(&PstEvaluator, pos);
        let windowed = negamax(pos, depth, alpha, beta, 0, &mut ctx);
        assert_within_truth(pos, windowed, full_window(pos, depth, 0));
    }

    fn assert_within_truth(pos: &Board, windowed: AnalysisResult, truth: AnalysisResult) {
        let side = pos.active_side();
        let truth = truth.relative_to(side);
        let got = windowed.relative_to(side);
        match windowed.bound.relative_to(side) {
            Bound::Exact => assert_eq!(got, truth, "exact score must match"),
            Bound::LowerBound => assert!(truth >= got, "lower bound {got} above truth {truth}"),
            Bound::UpperBound => assert!(truth <= got, "upper bound {got} below truth {truth}"),
        }
    }

    #[test]
    fn bounds_are_sound() {
        let positions = [
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 2 3",
            "3r3k/8/8/3p4/4P3/8/3Q4/K7 w - - 0 1",
        ];
        for fen in positions {
            let pos = board(fen);
            for (alpha, beta) in [(-50, 50), (100, 300), (-400, -200), (0, 1)] {
                assert_bound_sound(&pos, 2, alpha, beta);
            }
        }
    }

    #[test]
    fn bounds_stay_sound_with_warm_cache() {
        let positions = [
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
            "3r3k/8/8/3p4/4P3/8/3Q4/K7 w - - 0 1",
            "r3k3/8/8/3N4/8/8/8/4K3 w - - 0 1",
        ];
        let windows = [(-50, 50), (100, 300), (-400, -200), (0, 1), (-1, 0), (-INF, INF)];
        for fen in positions {
            let pos = board(fen);
            for depth in 1..=3 {
                let truth = full_window(&pos, depth, 0);
                // One cache for every window, so later searches resolve from earlier bounds.
                let mut h = Harness::new(4096);
                let mut ctx = h.context(&PstEvaluator, &pos);
                for (alpha, beta) in windows {
                    let windowed = negamax(&pos, depth, alpha, beta, 0, &mut ctx);
                    assert_within_truth(&pos, windowed, truth);
                }
            }
        }
    }

    #[test]
    fn black_fail_high_is_a_white_upper_bound() {
        // Rxd3 wins the queen, far above Black's window.
        let pos = board("3rk3/8/8/8/8/3Q4/8/4K3 b - - 0 1");
        let mut h = Harness::new(0);
        let mut ctx = h.context(&MaterialEvaluator, &pos);
        let r = negamax(&pos, 2, 0, 1, 0, &mut ctx);
        assert_eq!(r.bound.relative_to(Color::Black), Bound::LowerBound);
        assert_eq!(r.bound, Bound::UpperBound, "stored White-relative");
        assert!(r.score <= -1, "White is at most {}", r.score);
    }

    #[test]
    fn cache_hits_add_no_depth() {
        let pos = board("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let mut h = Harness::new(4096);
        let mut ctx = h.context(&PstEvaluator, &pos);
        let searched = negamax(&pos, 2, -INF, INF, 0, &mut ctx);
        assert_eq!(searched.plies_to_eval0, 2);

        // Same position met again below the root: resolved straight from the cache.
        let Probe::Resolved(hit) = probe_cache(&pos, 1, -INF, INF, 1, &mut ctx) else {
            panic!("exact entry of sufficient depth should resolve");
        };
        assert_eq!(hit.score, searched.score);
        assert_eq!(hit.plies_to_eval0, 0);
        assert_eq!(hit.plies_to_seldepth, 0);
    }

    #[test]
    fn aspiration_matches_full_window() {
        let pos = board("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let side = pos.active_side();
        let depth = 3;

        let mut h = Harness::new(0);
        let mut ctx = h.context(&PstEvaluator, &pos);
        let mut previous = None;
        let mut last = None;
        for d in 1..=depth {
            // A deliberately poor guess forces re-searches.
            let guess = previous.map(|s: i32| s + 400);
            let r = aspiration_search(&pos, d, guess, 20, 2, &mut ctx).unwrap();
            previous = Some(r.relative_to(side));
            last = Some(r);
        }

        let full = full_window(&pos, depth, 0);
        assert_eq!(last.unwrap().score, full.score);
    }

    #[test]
    fn cached_bounds_keep_best_move() {
        let pos = board("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1");
        let mut h = Harness::new(4096);
        let mut ctx = h.context(&MaterialEvaluator, &pos);
        // Prime the cache with narrow-window bounds, then search full-window.
        let _ = negamax(&pos, 3, 0, 1, 0, &mut ctx);
        let _ = negamax(&pos, 3, 600, 601, 0, &mut ctx);
        let warm = negamax(&pos, 3, -INF, INF, 0, &mut ctx);
        assert_eq!(warm.bound, Bound::Exact);
        assert_eq!(ctx.pv.root_pv()[0].to_uci(), "d1d5");
        assert!(warm.score > 0, "White keeps the extra rook");
    }

    #[test]
    fn aborted_search_stores_nothing() {
        let pos = Board::starting_position();
        let mut h = Harness::new(4096);
        h.control = SearchControl::new_infinite(Arc::new(AtomicBool::new(true)));
        let mut ctx = h.context(&PstEvaluator, &pos);
        let _ = negamax(&pos, 3, -INF, INF, 0, &mut ctx);
        assert!(ctx.aborted);
        drop(ctx);
        assert!(h.cache.is_empty());
    }

    #[test]
    fn seldepth_counts_quiescence_plies() {
        let pos = board("3r3k/8/8/3p4/4P3/8/3Q4/K7 w - - 0 1");
        let mut h = Harness::new(0);
        let mut ctx = h.context(&MaterialEvaluator, &pos);
        let r = negamax(&pos, 1, -INF, INF, 0, &mut ctx);
        assert!(ctx.seldepth >= 2, "captures extend past the nominal depth");
        assert!(r.plies_to_seldepth >= 1);
        assert!(!is_mate_score(r.score));
    }
}
