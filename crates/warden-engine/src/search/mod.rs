//! Search session: iterative deepening over the result cache and position tree.

pub mod control;
pub mod heuristics;
pub mod job;
pub mod negamax;
pub mod ordering;
pub mod position_cache;
pub mod quiescence;
pub mod report;
pub mod see;
pub mod tree;
pub mod tt;

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};
use warden_core::{Color, Move, Position};

use crate::analysis::{AnalysisResult, Bound, mate_in};
use crate::config::SearchConfig;
use crate::error::EngineError;
use crate::eval::{Evaluator, PstEvaluator};

use control::{SearchControl, StopHandle};
use heuristics::KillerTable;
use negamax::{MAX_PLY, PvTable, SearchContext, aspiration_search, terminal_result};
use ordering::MovePicker;
use report::{Reporter, SharedProgress, Ticker, format_line};
use tree::{NodeId, PositionTree, Variation};
use tt::{CacheStats, ResultCache};

/// How far below the current root [`Searcher::set_position`] looks for the
/// new position before starting a fresh tree.
const REBASE_HORIZON: usize = 8;

/// What to search and when to stop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Soft limit: no new iteration starts after this much time.
    pub time_budget: Option<Duration>,
    /// Hard limit: the search is aborted inside the tree after this much time.
    pub max_time: Option<Duration>,
    /// Deepest iteration; the configured maximum when `None`.
    pub max_depth: Option<u8>,
    /// Ignore both time limits and run until stopped.
    pub infinite: bool,
    /// Only consider these root moves. `None` or empty means all legal moves.
    pub restrict_to: Option<Vec<Move>>,
    /// Stop after this many nodes.
    pub nodes: Option<u64>,
}

impl SearchLimits {
    /// Search exactly to `depth` with no clock.
    pub fn depth(depth: u8) -> Self {
        Self {
            max_depth: Some(depth),
            ..Self::default()
        }
    }

    /// Spend `time` on the move, soft and hard.
    pub fn movetime(time: Duration) -> Self {
        Self {
            time_budget: Some(time),
            max_time: Some(time),
            ..Self::default()
        }
    }

    /// Run until stopped.
    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Self::default()
        }
    }
}

/// Result of a search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best root move; [`Move::NULL`] when the root has no legal move.
    pub best_move: Move,
    /// Expected reply.
    pub ponder_move: Option<Move>,
    pub pv: Vec<Move>,
    /// Centipawns from the side to move's point of view.
    pub score: i32,
    /// Root result, White-relative.
    pub analysis: AnalysisResult,
    pub nodes: u64,
    /// Last fully completed depth.
    pub depth: u8,
    pub seldepth: u8,
    pub elapsed: Duration,
    /// Explored root continuations, best first.
    pub variation: Variation,
}

impl SearchResult {
    /// Signed moves to mate from the side to move's view, if the score is a mate.
    pub fn mate_in(&self) -> Option<i32> {
        mate_in(self.score)
    }
}

/// A fully searched iteration.
struct Completed {
    best_move: Move,
    pv: Vec<Move>,
    analysis: AnalysisResult,
    depth: u8,
}

/// A search session for one game.
///
/// Owns the result cache, the retained position tree and the killer table, so
/// consecutive searches along a game reuse what earlier ones learned.
pub struct Searcher<P, E = PstEvaluator> {
    config: SearchConfig,
    evaluator: E,
    cache: ResultCache,
    tree: PositionTree<P>,
    killers: KillerTable,
    stop: StopHandle,
}

impl<P: Position> Searcher<P> {
    /// A session rooted at `root` with the default evaluator and configuration.
    pub fn new(root: P) -> Self {
        Self::with_evaluator(root, PstEvaluator, SearchConfig::default())
    }
}

impl<P: Position, E: Evaluator> Searcher<P, E> {
    pub fn with_evaluator(root: P, evaluator: E, config: SearchConfig) -> Self {
        Self {
            cache: ResultCache::new(config.cache_capacity),
            tree: PositionTree::new(root, config.position_cache_capacity),
            killers: KillerTable::new(),
            stop: StopHandle::new(),
            evaluator,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The position the next search starts from.
    pub fn position(&self) -> &P {
        self.tree.root_position()
    }

    pub fn tree(&self) -> &PositionTree<P> {
        &self.tree
    }

    /// Move the session to `pos`.
    ///
    /// If `pos` is already in the retained tree the tree is rebased onto it
    /// and the killers are shifted by the plies advanced; otherwise a fresh
    /// tree is started. The result cache is kept either way.
    pub fn set_position(&mut self, pos: P) {
        let current = self.tree.root_position();
        if current.hash() == pos.hash() && current.hash2() == pos.hash2() {
            return;
        }
        match self.tree.find(pos.hash(), pos.hash2(), REBASE_HORIZON) {
            Some(node) => {
                let plies = self.tree.depth_of(node);
                self.tree.rebase(node);
                self.killers.shift(plies);
                debug!(plies, retained = self.tree.len(), "rebased search tree");
            }
            None => {
                self.tree = PositionTree::new(pos, self.config.position_cache_capacity);
                self.killers.clear();
                debug!("started fresh search tree");
            }
        }
    }

    /// Handle that stops a running search from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Forget everything learned: cache, killers and the tree below the root.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.killers.clear();
        let root = self.tree.root_position().clone();
        self.tree = PositionTree::new(root, self.config.position_cache_capacity);
    }

    /// Change the result cache capacity in entries.
    pub fn resize_cache(&mut self, entries: usize) {
        self.config.cache_capacity = entries;
        self.cache.resize(entries);
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Search the current position.
    ///
    /// Always yields a move when one exists, even if stopped before the first
    /// iteration completes. `reporter` receives progress after every
    /// iteration and on the configured cadence, then `finished` once.
    pub fn search(&mut self, limits: &SearchLimits, reporter: &dyn Reporter) -> Result<SearchResult, EngineError> {
        let root = self.tree.root_position().clone();
        let (root_moves, restricted) = restrict_root_moves(&root, limits.restrict_to.as_deref())?;

        let control = self.control_for(limits);
        let max_depth = limits
            .max_depth
            .unwrap_or(self.config.max_depth)
            .clamp(1, (MAX_PLY - 1) as u8);
        let interval = self.config.report_interval;
        let shared = SharedProgress::new();
        debug!(max_depth, restricted, ?limits, "search started");

        let result = std::thread::scope(|s| {
            let ticker = Ticker::start(s, &shared, reporter, interval);
            let result = self.iterate(&root, root_moves, restricted, max_depth, &control, &shared, reporter);
            ticker.finish();
            result
        });

        let stats = self.cache.stats();
        debug!(
            hits = stats.hits,
            misses = stats.misses,
            collisions = stats.collisions,
            entries = self.cache.len(),
            hit_permille = stats.hit_permille(),
            "result cache"
        );
        reporter.finished(&result);
        // After `finished`, so a stop sent while reporting cannot leak into the next search.
        self.stop.reset();
        Ok(result)
    }

    fn control_for(&self, limits: &SearchLimits) -> SearchControl {
        let control = if limits.infinite {
            SearchControl::new_infinite(self.stop.flag())
        } else {
            SearchControl::new_timed(self.stop.flag(), limits.time_budget, limits.max_time)
        };
        control
            .with_node_limit(limits.nodes)
            .with_poll_interval(self.config.clock_poll_nodes)
    }

    #[allow(clippy::too_many_arguments)]
    fn iterate(
        &mut self,
        root: &P,
        root_moves: Vec<Move>,
        restricted: bool,
        max_depth: u8,
        control: &SearchControl,
        shared: &SharedProgress,
        reporter: &dyn Reporter,
    ) -> SearchResult {
        let side = root.active_side();
        let root_id = self.tree.root();

        if root_moves.is_empty() {
            let analysis = terminal_result(root, 0);
            return SearchResult {
                best_move: Move::NULL,
                ponder_move: None,
                pv: Vec::new(),
                score: analysis.relative_to(side),
                analysis,
                nodes: 0,
                depth: 0,
                seldepth: 0,
                elapsed: control.elapsed(),
                variation: self.tree.variation(root_id),
            };
        }

        let ordered = initial_root_order(root, root_moves, &self.tree, &self.cache, &self.killers);
        let mut ctx = SearchContext {
            nodes: 0,
            seldepth: 0,
            cache: &mut self.cache,
            killers: &mut self.killers,
            evaluator: &self.evaluator,
            control,
            progress: shared,
            pv: PvTable::new(),
            root_moves: ordered,
            root_results: Vec::new(),
            root_best: None,
            store_root: !restricted,
            aborted: false,
        };

        let mut completed: Option<Completed> = None;
        let mut previous: Option<i32> = None;
        let mut max_seldepth = 0usize;

        for depth in 1..=max_depth {
            if completed.is_some() && control.should_stop_iterating() {
                break;
            }
            ctx.seldepth = 0;
            let Some(analysis) = aspiration_search(
                root,
                depth,
                previous,
                self.config.aspiration_window,
                self.config.aspiration_factor,
                &mut ctx,
            ) else {
                break;
            };
            max_seldepth = max_seldepth.max(ctx.seldepth);

            let score = analysis.relative_to(side);
            previous = Some(score);

            let mut pv = ctx.pv.root_pv().to_vec();
            if pv.is_empty()
                && let Some((mv, _)) = ctx.root_best
            {
                pv.push(mv);
            }
            extend_from_cache(root, &mut pv, ctx.cache, depth as usize);
            let best_move = pv.first().copied().unwrap_or(ctx.root_moves[0]);

            record_iteration(&mut self.tree, ctx.cache, &ctx.root_results, analysis, &pv);
            ctx.root_moves = reorder_root(&ctx.root_moves, &self.tree, side, best_move);

            let seldepth = max_seldepth.min(u8::MAX as usize) as u8;
            shared.publish(depth, seldepth, score, ctx.nodes, &pv);
            reporter.progress(&shared.snapshot());
            debug!(depth, score, nodes = ctx.nodes, seldepth, pv = %format_line(&pv), "iteration complete");

            completed = Some(Completed {
                best_move,
                pv,
                analysis,
                depth,
            });

            if analysis.is_mate() || !analysis.needs_deeper {
                debug!(depth, score, "forced result found, stopping early");
                break;
            }
        }

        let nodes = ctx.nodes;
        shared.set_nodes(nodes);
        let partial = if ctx.aborted { interrupted_best(ctx.root_best, side) } else { None };
        let first_ordered = ctx.root_moves[0];
        drop(ctx);

        let (best_move, pv, analysis, depth) = match (partial, completed) {
            (Some((mv, child)), Some(c)) if mv != c.best_move => {
                debug!(%mv, previous = %c.best_move, "using best move of the interrupted iteration");
                (mv, vec![mv], rooted(child, root), c.depth)
            }
            (_, Some(c)) => (c.best_move, c.pv, c.analysis, c.depth),
            (Some((mv, child)), None) => (mv, vec![mv], rooted(child, root), 0),
            (None, None) => {
                warn!("search stopped before any root move was searched");
                (first_ordered, vec![first_ordered], self.evaluator.evaluate(root), 0)
            }
        };

        SearchResult {
            best_move,
            ponder_move: pv.get(1).copied(),
            score: analysis.relative_to(side),
            pv,
            analysis,
            nodes,
            depth,
            seldepth: max_seldepth.min(u8::MAX as usize) as u8,
            elapsed: control.elapsed(),
            variation: self.tree.variation(root_id),
        }
    }
}

/// The interrupted pass's best root move, unless it only failed low.
///
/// An upper bound says the move is no better than its score, so it cannot
/// beat the move of the last completed iteration.
fn interrupted_best(best: Option<(Move, AnalysisResult)>, side: Color) -> Option<(Move, AnalysisResult)> {
    best.filter(|(_, child)| child.bound.relative_to(side) != Bound::UpperBound)
}

/// A child's result re-labelled as belonging to the root.
fn rooted<P: Position>(child: AnalysisResult, root: &P) -> AnalysisResult {
    AnalysisResult {
        verification_hash: root.hash2(),
        plies_to_seldepth: child.plies_to_seldepth.saturating_add(1),
        ..child
    }
}

/// Root moves to search, checking a restriction against the legal moves.
fn restrict_root_moves<P: Position>(root: &P, restrict_to: Option<&[Move]>) -> Result<(Vec<Move>, bool), EngineError> {
    let legal = root.legal_moves();
    let Some(list) = restrict_to.filter(|l| !l.is_empty()) else {
        return Ok((legal, false));
    };
    let mut moves = Vec::with_capacity(list.len());
    for &mv in list {
        if !legal.contains(&mv) {
            warn!(%mv, "restricted move is not legal at the root");
            return Err(EngineError::IllegalRestriction { mv });
        }
        if !moves.contains(&mv) {
            moves.push(mv);
        }
    }
    Ok((moves, true))
}

/// Root order before the first iteration: recorded child results if the tree
/// has them, static ordering otherwise.
fn initial_root_order<P: Position>(
    root: &P,
    moves: Vec<Move>,
    tree: &PositionTree<P>,
    cache: &ResultCache,
    killers: &KillerTable,
) -> Vec<Move> {
    let hint = cache.peek(root.hash(), root.hash2(), 0).and_then(|e| e.best_move);
    let ordered: Vec<Move> = MovePicker::new(root, moves, hint, killers.killers(0)).collect();
    match ordered.first() {
        Some(&first) => reorder_root(&ordered, tree, root.active_side(), first),
        None => ordered,
    }
}

/// `best` first, then moves with a recorded result by score, then the rest
/// in their current order.
fn reorder_root<P: Position>(moves: &[Move], tree: &PositionTree<P>, side: Color, best: Move) -> Vec<Move> {
    let root = tree.root();
    let score_of = |mv: Move| -> Option<i32> {
        tree.children(root)
            .iter()
            .find(|&&c| tree.move_to(c) == Some(mv))
            .and_then(|&c| tree.result(c))
            .map(|r| r.relative_to(side))
    };
    let mut keyed: Vec<(usize, Move)> = moves.iter().copied().enumerate().collect();
    keyed.sort_by_key(|&(index, mv)| {
        let rank = if mv == best {
            0
        } else if score_of(mv).is_some() {
            1
        } else {
            2
        };
        (rank, std::cmp::Reverse(score_of(mv).unwrap_or(i32::MIN)), index)
    });
    keyed.into_iter().map(|(_, mv)| mv).collect()
}

/// Lengthen `pv` up to `max_len` with the cached best moves that follow it.
fn extend_from_cache<P: Position>(root: &P, pv: &mut Vec<Move>, cache: &ResultCache, max_len: usize) {
    let mut pos = root.clone();
    for &mv in pv.iter() {
        if !pos.is_legal(mv) {
            return;
        }
        pos = pos.apply_move(mv);
    }
    while pv.len() < max_len {
        let Some(mv) = cache.peek(pos.hash(), pos.hash2(), pv.len()).and_then(|e| e.best_move) else {
            break;
        };
        if !pos.is_legal(mv) {
            break;
        }
        pos = pos.apply_move(mv);
        pv.push(mv);
    }
}

/// Write this iteration's root children and principal line into the tree.
fn record_iteration<P: Position>(
    tree: &mut PositionTree<P>,
    cache: &ResultCache,
    root_results: &[(Move, AnalysisResult)],
    analysis: AnalysisResult,
    pv: &[Move],
) {
    let root = tree.root();
    tree.record(root, analysis);
    for &(mv, result) in root_results {
        let child = tree.child(root, mv);
        tree.record(child, result);
    }

    // PV nodes below the first move take their cached results, deepest first.
    let mut node: NodeId = tree.extend_line(root, pv);
    let mut ply = pv.len();
    while ply > 1 {
        let pos = tree.position(node);
        if let Some(entry) = cache.peek(pos.hash(), pos.hash2(), ply) {
            tree.record(node, entry.result);
        }
        let Some(parent) = tree.parent(node) else {
            break;
        };
        node = parent;
        ply -= 1;
    }
}

impl<P, E> fmt::Debug for Searcher<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Searcher")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("tree", &self.tree)
            .field("killers", &self.killers)
            .finish()
    }
}
