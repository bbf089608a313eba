//! Event-driven UCI engine.
//!
//! The main thread owns all engine state and processes one event at a time:
//! parsed commands from the stdin reader thread, and completion notices from
//! the search thread. The search itself runs as a [`SearchJob`] that owns
//! the [`Searcher`] until it is joined.

use std::io::{self, BufRead};
use std::sync::mpsc;

use tracing::{debug, info, warn};

use warden_core::{Board, Position};
use warden_engine::analysis::mate_in;
use warden_engine::search::report::format_line;
use warden_engine::{
    Clock, PstEvaluator, Progress, Reporter, SearchConfig, SearchJob, SearchLimits, SearchResult, Searcher,
    StopHandle, limits_from_clock,
};

use crate::command::{Command, GoParams, MAX_HASH_MB, UciOption, parse_command};
use crate::error::UciError;

/// Default `Hash` in megabytes.
const DEFAULT_HASH_MB: usize = 16;

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone,
    InputClosed,
    InputFailed(UciError),
}

/// A search in flight.
struct ActiveSearch {
    job: SearchJob<Board, PstEvaluator>,
    stop: StopHandle,
    /// `go infinite`: hold the best move until `stop` even if the search ends.
    infinite: bool,
    stop_requested: bool,
}

/// Prints UCI `info` lines and wakes the main loop when the search ends.
struct UciReporter {
    done: mpsc::Sender<EngineEvent>,
}

impl Reporter for UciReporter {
    fn progress(&self, progress: &Progress) {
        println!("{}", format_info(progress));
    }

    fn finished(&self, _result: &SearchResult) {
        let _ = self.done.send(EngineEvent::SearchDone);
    }
}

/// The UCI engine: current position, the idle searcher or the running job.
pub struct UciEngine {
    position: Board,
    searcher: Option<Searcher<Board>>,
    active: Option<ActiveSearch>,
    /// Result of an infinite search that ended before `stop`.
    parked: Option<SearchResult>,
    hash_mb: usize,
    pending_clear: bool,
    pending_hash: Option<usize>,
}

impl UciEngine {
    /// Create an engine at the starting position.
    pub fn new() -> Self {
        let config = SearchConfig {
            cache_capacity: SearchConfig::cache_entries_for_mb(DEFAULT_HASH_MB),
            ..SearchConfig::default()
        };
        let position = Board::starting_position();
        Self {
            searcher: Some(Searcher::with_evaluator(position.clone(), PstEvaluator, config)),
            position,
            active: None,
            parked: None,
            hash_mb: DEFAULT_HASH_MB,
            pending_clear: false,
            pending_hash: None,
        }
    }

    /// Run the UCI loop, reading stdin until `quit` or end of input.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || read_commands(io::stdin().lock(), &stdin_tx));

        let mut outcome = Ok(());
        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => println!("readyok"),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position(board) => self.position = board,
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::SetOption(option) => self.handle_setoption(option),
                    Command::Stop => self.handle_stop(),
                    Command::Quit => break,
                    Command::Unknown(cmd) => debug!(%cmd, "ignoring unknown command"),
                },
                EngineEvent::UciCommand(Err(e)) => warn!(error = %e, "UCI parse error"),
                EngineEvent::SearchDone => self.handle_search_done(),
                EngineEvent::InputClosed => break,
                EngineEvent::InputFailed(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if let Some(active) = self.active.take() {
            let _ = active.job.stop();
        }
        info!("warden shutting down");
        outcome
    }

    fn handle_uci(&self) {
        println!("id name warden {}", env!("CARGO_PKG_VERSION"));
        println!("id author the warden developers");
        println!("option name Hash type spin default {DEFAULT_HASH_MB} min 1 max {MAX_HASH_MB}");
        println!("option name Clear Hash type button");
        println!("uciok");
    }

    fn handle_ucinewgame(&mut self) {
        self.position = Board::starting_position();
        match self.searcher.as_mut() {
            Some(searcher) => {
                searcher.clear();
                searcher.set_position(self.position.clone());
            }
            None => self.pending_clear = true,
        }
    }

    fn handle_setoption(&mut self, option: UciOption) {
        match option {
            UciOption::Hash(mb) => {
                self.hash_mb = mb;
                match self.searcher.as_mut() {
                    Some(searcher) => searcher.resize_cache(SearchConfig::cache_entries_for_mb(mb)),
                    None => self.pending_hash = Some(mb),
                }
                info!(mb, "hash resized");
            }
            UciOption::ClearHash => match self.searcher.as_mut() {
                Some(searcher) => searcher.clear(),
                None => self.pending_clear = true,
            },
        }
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if self.active.is_some() {
            warn!("go received while searching, ignoring");
            return;
        }
        if let Some(result) = self.parked.take() {
            warn!("go received before stop, answering the previous search first");
            print_bestmove(&result);
        }
        let Some(mut searcher) = self.searcher.take() else {
            warn!("no searcher available");
            return;
        };

        searcher.set_position(self.position.clone());
        let limits = self.limits_for(&params);
        let infinite = limits.infinite;
        let job = SearchJob::spawn(searcher, limits, UciReporter { done: tx.clone() });
        self.active = Some(ActiveSearch {
            stop: job.stop_handle(),
            job,
            infinite,
            stop_requested: false,
        });
    }

    fn limits_for(&self, params: &GoParams) -> SearchLimits {
        let clock = Clock {
            wtime: params.wtime,
            btime: params.btime,
            winc: params.winc,
            binc: params.binc,
            movestogo: params.movestogo,
            movetime: params.movetime,
        };
        let (time_budget, max_time) = limits_from_clock(&clock, &self.position);

        let legal = self.position.legal_moves();
        let restrict: Vec<_> = params
            .searchmoves
            .iter()
            .copied()
            .filter(|mv| {
                let ok = legal.contains(mv);
                if !ok {
                    warn!(%mv, "ignoring illegal searchmoves entry");
                }
                ok
            })
            .collect();

        SearchLimits {
            time_budget,
            max_time,
            max_depth: params.depth,
            infinite: params.infinite,
            restrict_to: (!restrict.is_empty()).then_some(restrict),
            nodes: params.nodes,
        }
    }

    fn handle_stop(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.stop_requested = true;
            active.stop.stop();
        } else if let Some(result) = self.parked.take() {
            print_bestmove(&result);
        }
    }

    /// The search thread finished: take the searcher back and answer.
    fn handle_search_done(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let finished = match active.job.join() {
            Ok(finished) => finished,
            Err(e) => {
                warn!(error = %e, "search failed, starting a fresh session");
                self.searcher = Some(self.fresh_searcher());
                println!("bestmove 0000");
                return;
            }
        };

        let mut searcher = finished.searcher;
        if let Some(mb) = self.pending_hash.take() {
            searcher.resize_cache(SearchConfig::cache_entries_for_mb(mb));
        }
        if std::mem::take(&mut self.pending_clear) {
            searcher.clear();
        }
        self.searcher = Some(searcher);

        let result = match finished.result {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "search rejected");
                println!("bestmove 0000");
                return;
            }
        };

        if active.infinite && !active.stop_requested {
            debug!("infinite search ended early, holding best move until stop");
            self.parked = Some(result);
            return;
        }
        print_bestmove(&result);
    }

    fn fresh_searcher(&self) -> Searcher<Board> {
        let config = SearchConfig {
            cache_capacity: SearchConfig::cache_entries_for_mb(self.hash_mb),
            ..SearchConfig::default()
        };
        Searcher::with_evaluator(self.position.clone(), PstEvaluator, config)
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn print_bestmove(result: &SearchResult) {
    println!("{}", format_bestmove(result));
}

/// `bestmove` line for a finished search.
pub fn format_bestmove(result: &SearchResult) -> String {
    if result.best_move.is_null() {
        return "bestmove 0000".to_string();
    }
    match result.ponder_move {
        Some(ponder) if !ponder.is_null() => format!("bestmove {} ponder {}", result.best_move, ponder),
        _ => format!("bestmove {}", result.best_move),
    }
}

/// `info` line for a progress report. Reports before the first completed
/// iteration carry only the counters.
pub fn format_info(p: &Progress) -> String {
    let time = p.elapsed.as_millis();
    if p.depth == 0 {
        return format!("info nodes {} nps {} time {}", p.nodes, p.nps, time);
    }
    let score = match mate_in(p.score) {
        Some(moves) => format!("mate {moves}"),
        None => format!("cp {}", p.score),
    };
    let mut line = format!(
        "info depth {} seldepth {} score {} nodes {} nps {} time {}",
        p.depth, p.seldepth, score, p.nodes, p.nps, time
    );
    if !p.pv.is_empty() {
        line.push_str(" pv ");
        line.push_str(&format_line(&p.pv));
    }
    line
}

/// Forward parsed lines from `input` until it ends, fails or the engine hangs up.
fn read_commands<R: BufRead>(input: R, tx: &mpsc::Sender<EngineEvent>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                let _ = tx.send(EngineEvent::InputFailed(UciError::from(e)));
                return;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(cmd = %line, "received UCI command");
        if tx.send(EngineEvent::UciCommand(parse_command(line))).is_err() {
            return;
        }
    }
    let _ = tx.send(EngineEvent::InputClosed);
}
