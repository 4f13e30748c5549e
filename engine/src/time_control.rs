//! Time management for a single search.
//!
//! Converts the caller's time control (a fixed move time, a clock, or
//! neither) plus a cheap read of the position's complexity into a time
//! budget and a depth cap for the iterative deepener. The resulting
//! [`TimeController`] is then the only thing the search consults while it's
//! running: a deadline it polls cooperatively, never a callback or a signal
//! that can interrupt it mid-node.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chess::board::Board;
use uci::time_control::TimeControl;

/// Used when the caller gives us nothing to go on (no clock, no movetime).
const DEFAULT_BUDGET_SECS: f64 = 1.0;

/// How often (in nodes) the search checks the deadline once it's deep in
/// the tree. This bounds the number of `Instant::now()` calls per search
/// without meaningfully delaying a timeout; quiescence, which does far less
/// work per node, checks on every call instead.
const CHECKUP_INTERVAL: u32 = 2048;

/// Allocate a time budget (in seconds) and a depth cap for this search, given
/// the position and the caller's requested time control.
///
/// This is the "object-oriented" time manager variant: it estimates how many
/// moves remain in the game from the full-move counter and the remaining
/// piece count, scores the position's complexity, and spends a
/// complexity-weighted share of the usable clock.
pub fn allocate(tc: TimeControl, board: &Board, depth_cap: usize) -> (f64, usize) {
    match tc {
        TimeControl::FixedTime(movetime) => {
            let secs = movetime.as_secs_f64();
            let cap = movetime_depth_cap(secs, depth_cap);
            (secs, cap)
        }

        TimeControl::Depth(_) | TimeControl::Nodes(_) | TimeControl::Infinite => {
            (DEFAULT_BUDGET_SECS, depth_cap)
        }

        TimeControl::Clock { wtime, btime, winc, binc, .. } => {
            let us = board.current;
            let (remaining, inc) = if us.is_white() {
                (wtime.as_secs_f64(), winc.unwrap_or_default().as_secs_f64())
            } else {
                (btime.as_secs_f64(), binc.unwrap_or_default().as_secs_f64())
            };

            allocate_from_clock(remaining, inc, board, depth_cap)
        }
    }
}

fn movetime_depth_cap(secs: f64, cap: usize) -> usize {
    if secs < 0.5 {
        cap.saturating_sub(5).max(2)
    } else if secs < 2.0 {
        cap.saturating_sub(3).max(3)
    } else {
        cap
    }
}

fn moves_remaining(board: &Board) -> f64 {
    let by_fullmove = if board.full_moves < 10 {
        35
    } else if board.full_moves < 20 {
        30
    } else if board.full_moves < 30 {
        25
    } else {
        (50u32.saturating_sub(board.full_moves as u32)).max(15)
    };

    let pieces = board.all_occupied().count();
    let by_material = if pieces <= 6 {
        15
    } else if pieces <= 10 {
        20
    } else if pieces <= 16 {
        25
    } else {
        u32::MAX
    };

    by_fullmove.min(by_material).max(10) as f64
}

fn complexity(board: &Board) -> f64 {
    let legal_moves = board.legal_moves::<true>();
    let num_moves = legal_moves.len();
    let num_captures = legal_moves.iter().filter(|mv| mv.is_capture()).count();
    let pieces = board.all_occupied().count();
    let us = board.current;

    let mut c = 1.0;

    if num_moves > 35 {
        c += 0.4;
    } else if num_moves > 25 {
        c += 0.2;
    } else if num_moves < 10 {
        c -= 0.2;
    }

    if board.in_check() {
        c += 0.3;
    }

    if pieces > 20 {
        c += 0.2;
    } else if pieces < 10 {
        c -= 0.1;
    }

    if num_captures > 5 {
        c += 0.2;
    }

    if board.pawns(us).count() >= 4 {
        c += 0.1;
    }

    c.clamp(0.5, 2.0)
}

fn allocate_from_clock(remaining: f64, inc: f64, board: &Board, depth_cap: usize) -> (f64, usize) {
    if remaining <= 0.0 {
        return (DEFAULT_BUDGET_SECS, depth_cap);
    }

    let moves_left = moves_remaining(board);
    let complexity = complexity(board);

    let reserve = (remaining * 0.1).min(2.0);
    let usable = (remaining - reserve).max(0.0);
    let base = usable / moves_left + 0.5 * inc;

    let mut allocation = base * complexity;

    if remaining < 10.0 {
        allocation = allocation.min(remaining * 0.15);
    } else if remaining < 30.0 {
        allocation = allocation.min(remaining * 0.25);
    }

    if board.full_moves <= 6 && complexity < 1.2 {
        allocation *= 0.6;
    }

    if board.in_check() || complexity > 1.5 {
        allocation *= 1.3;
    }

    allocation = allocation.clamp(0.1, (remaining - 0.5).max(0.1));

    let mut cap = if allocation < 0.5 {
        (depth_cap as f64 * 0.5) as usize
    } else if allocation < 1.0 {
        (depth_cap as f64 * 0.7) as usize
    } else if allocation < 3.0 {
        (depth_cap as f64 * 0.85) as usize
    } else {
        depth_cap
    };

    cap = match () {
        _ if allocation < 0.5 => cap.max(3),
        _ if allocation < 1.0 => cap.max(5),
        _ if allocation < 3.0 => cap.max(7),
        _ => cap,
    };

    if complexity > 1.5 && allocation > 2.0 {
        cap = depth_cap;
    }

    (allocation, cap.min(depth_cap))
}

/// Polls a cooperative deadline during the search. Every recursive entry
/// point checks in with this controller; none of them are ever interrupted
/// from the outside mid-node.
#[derive(Clone)]
pub struct TimeController {
    start: Instant,
    deadline: Duration,
    stop: Arc<AtomicBool>,
    next_checkup: u32,
    /// Set when the root position has a single legal move, or when the
    /// iterative deepener decides further depth isn't worth starting.
    stop_early: bool,
    /// Hard node cap from the `Nodes` UCI option, if one was set.
    max_nodes: Option<u32>,
}

impl TimeController {
    /// Build a controller from an already-computed budget (seconds),
    /// applying the safety margin from §4.6: `max(0.05, budget -
    /// min(0.1, 0.05 * max(1, budget)))`.
    pub fn new(budget_secs: f64) -> (Self, TimeControlHandle) {
        let safety_margin = (0.05 * budget_secs.max(1.0)).min(0.1);
        let usable = (budget_secs - safety_margin).max(0.05);

        let stop = Arc::new(AtomicBool::new(false));
        let handle = TimeControlHandle { stop: stop.clone() };

        let controller = TimeController {
            start: Instant::now(),
            deadline: Duration::from_secs_f64(usable),
            stop,
            next_checkup: CHECKUP_INTERVAL,
            stop_early: false,
            max_nodes: None,
        };

        (controller, handle)
    }

    pub fn set_max_nodes(&mut self, max_nodes: Option<u32>) {
        self.max_nodes = max_nodes;
    }

    pub fn node_cap_reached(&self, nodes: u32) -> bool {
        self.max_nodes.is_some_and(|cap| nodes >= cap)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Seconds left before the deadline, floored at zero. Used to gate the
    /// evaluator's mobility term under time pressure.
    pub fn remaining_secs(&self) -> f64 {
        (self.deadline.as_secs_f64() - self.elapsed().as_secs_f64()).max(0.0)
    }

    /// Unconditional deadline check. Used by quiescence, which polls after
    /// every capture rather than on a node-count mask.
    pub fn deadline_reached(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.elapsed() >= self.deadline
    }

    /// Node-count-masked deadline check, used at PVS node entry to avoid
    /// paying for a clock syscall on every single node.
    pub fn should_continue(&mut self, nodes: u32) -> bool {
        if nodes < self.next_checkup {
            return true;
        }

        self.next_checkup = nodes + CHECKUP_INTERVAL;
        !self.deadline_reached()
    }

    /// Whether the iterative deepener should start another depth iteration.
    pub fn should_start_iteration(&self, depth: usize) -> bool {
        if depth <= 1 {
            return true;
        }

        !self.stop_early && !self.deadline_reached()
    }

    pub fn stop_early(&mut self) {
        self.stop_early = true;
    }
}

/// A handle that lets a caller cancel an in-progress search by advancing its
/// deadline to "now", from another thread if needed.
#[derive(Clone)]
pub struct TimeControlHandle {
    stop: Arc<AtomicBool>,
}

impl TimeControlHandle {
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movetime_allocates_exactly_the_requested_time() {
        let board = Board::default();
        let (secs, _) = allocate(TimeControl::FixedTime(Duration::from_millis(300)), &board, 20);
        assert_eq!(secs, 0.3);
    }

    #[test]
    fn short_movetime_caps_depth_below_the_limit() {
        let board = Board::default();
        let (_, cap) = allocate(TimeControl::FixedTime(Duration::from_millis(100)), &board, 20);
        assert!(cap < 20);
    }

    #[test]
    fn no_clock_falls_back_to_a_default_budget() {
        let board = Board::default();
        let (secs, cap) = allocate(TimeControl::Infinite, &board, 12);
        assert_eq!(secs, DEFAULT_BUDGET_SECS);
        assert_eq!(cap, 12);
    }

    #[test]
    fn clock_mode_spends_a_sane_fraction_of_remaining_time() {
        let board = Board::default();
        let (secs, _) = allocate(
            TimeControl::Clock {
                wtime: Duration::from_secs(60),
                btime: Duration::from_secs(60),
                winc: None,
                binc: None,
                movestogo: None,
            },
            &board,
            20,
        );

        assert!(secs > 0.1 && secs < 10.0);
    }

    #[test]
    fn controller_has_not_timed_out_immediately() {
        let (tc, _handle) = TimeController::new(1.0);
        assert!(!tc.deadline_reached());
    }

    #[test]
    fn handle_cancel_triggers_deadline() {
        let (tc, handle) = TimeController::new(10.0);
        handle.cancel();
        assert!(tc.deadline_reached());
    }

    #[test]
    fn single_move_budget_is_never_negative() {
        let board = Board::default();
        let (secs, _) = allocate(
            TimeControl::Clock {
                wtime: Duration::from_millis(50),
                btime: Duration::from_millis(50),
                winc: None,
                binc: None,
                movestogo: None,
            },
            &board,
            20,
        );

        assert!(secs >= 0.0);
    }
}
