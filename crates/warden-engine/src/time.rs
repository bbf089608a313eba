//! Clock management: turn a game clock into soft and hard search limits.

use std::time::Duration;

use warden_core::{Color, Position};

use crate::eval::{MAX_PHASE, game_phase};

/// Time kept back for communication latency.
const OVERHEAD_MS: f64 = 10.0;

/// Below this much remaining time every limit collapses to one millisecond.
const PANIC_MS: f64 = 10.0;

/// Clock state from the controller, already resolved to durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
    /// Exact time for this move; overrides the clock.
    pub movetime: Option<Duration>,
}

impl Clock {
    /// Remaining time and increment for `side`.
    fn for_side(&self, side: Color) -> (Option<Duration>, Duration) {
        let (remaining, inc) = match side {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        (remaining, inc.unwrap_or(Duration::ZERO))
    }
}

/// Split the remaining time into a soft budget and a hard cap.
///
/// Without `moves_to_go` the number of moves left is estimated from `phase`
/// (0 bare kings, [`MAX_PHASE`] full material), so the opening spends less
/// per move than the endgame.
///
/// | Parameter            | No increment | Increment            |
/// |----------------------|--------------|----------------------|
/// | Moves left estimate  | 18 to 40     | 15 to 35             |
/// | Soft budget          | `base`       | `base + 3/4 inc`     |
/// | Hard cap of usable   | 12%          | 25%                  |
/// | Hard cap of soft     | 2.5x         | 3x                   |
pub fn compute_limits(remaining: Duration, increment: Duration, moves_to_go: Option<u32>, phase: i32) -> (Duration, Duration) {
    let remaining_ms = remaining.as_millis() as f64;
    if remaining_ms < PANIC_MS {
        let one = Duration::from_millis(1);
        return (one, one);
    }

    let usable = (remaining_ms - OVERHEAD_MS).max(1.0);
    let inc_ms = increment.as_millis() as f64;
    let with_inc = inc_ms > 0.0;

    let moves_left = match moves_to_go {
        Some(n) => n.max(1) as f64,
        None => {
            let (floor, span) = if with_inc { (15, 20) } else { (18, 22) };
            (floor + span * phase.clamp(0, MAX_PHASE) / MAX_PHASE) as f64
        }
    };

    let base = usable / moves_left;
    let soft = if with_inc { base + inc_ms * 0.75 } else { base };
    let (usable_share, soft_ratio) = if with_inc { (0.25, 3.0) } else { (0.12, 2.5) };
    let hard = (usable * usable_share).min(soft * soft_ratio);

    let clamp = |ms: f64| Duration::from_millis(ms.min(usable).max(1.0) as u64);
    (clamp(soft), clamp(hard))
}

/// Soft and hard limits for the side to move in `pos`.
///
/// `movetime` gives both limits the same value. With no clock for the side to
/// move both are `None` and the search runs until stopped or its depth cap.
pub fn limits_from_clock<P: Position>(clock: &Clock, pos: &P) -> (Option<Duration>, Option<Duration>) {
    if let Some(mt) = clock.movetime {
        return (Some(mt), Some(mt));
    }
    match clock.for_side(pos.active_side()) {
        (Some(remaining), inc) => {
            let (soft, hard) = compute_limits(remaining, inc, clock.movestogo, game_phase(pos));
            (Some(soft), Some(hard))
        }
        (None, _) => (None, None),
    }
}
