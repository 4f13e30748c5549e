//! The search: iterative deepening over [`pvs`](negamax), seeded by an
//! aspiration window at every depth past the first.
//!
//! Each iteration searches the whole tree again from scratch, but the
//! transposition table, killer/history/counter-move tables, and the
//! aspiration window all carry over from one depth to the next, so later
//! iterations are much cheaper than their nominal size suggests.
use std::time::Duration;

use chess::movegen::moves::Move;
use rand::seq::SliceRandom;

use crate::evaluate::{Score, ScoreExt, INF};
use crate::history_tables::pv::PVTable;
use crate::history_tables::History;
use crate::position::Position;
use crate::search::params::MAX_DEPTH;
use crate::time_control::TimeController;
use crate::transpositions::TTable;

pub mod params;
mod aspiration;
mod negamax;
mod quiescence;

/// A single search: owns the tables a search needs exclusive access to for
/// its duration (history/killers/counter-moves are reused across calls; the
/// PV table and node counters are reset per call).
pub struct Search<'a> {
    pub tt: &'a TTable,
    pub history: Box<History>,
    pub pv: PVTable,
    pub nodes: u32,
    pub seldepth: usize,
    pub tc: TimeController,
    pub aborted: bool,
}

impl<'a> Search<'a> {
    pub fn new(tt: &'a TTable, history: Box<History>, tc: TimeController) -> Self {
        Self {
            tt,
            history,
            pv: PVTable::new(),
            nodes: 0,
            seldepth: 0,
            tc,
            aborted: false,
        }
    }

    /// Unconditional deadline check, used by quiescence which polls after
    /// every capture rather than on a node-count mask.
    pub fn out_of_time(&mut self) -> bool {
        if self.aborted {
            return true;
        }

        if self.tc.deadline_reached() || self.tc.node_cap_reached(self.nodes) {
            self.aborted = true;
        }

        self.aborted
    }

    /// Node-count-masked deadline check, used at PVS node entry.
    fn time_up(&mut self) -> bool {
        if self.aborted {
            return true;
        }

        if self.tc.node_cap_reached(self.nodes) || !self.tc.should_continue(self.nodes) {
            self.aborted = true;
        }

        self.aborted
    }

    pub fn time_budget_secs(&self) -> f32 {
        self.tc.remaining_secs() as f32
    }

    /// Run iterative deepening from `pos` up to `depth_cap`, optionally
    /// restricted to `allowed_root_moves`. The caller is responsible for
    /// bumping `History`'s age before the first call of a new root search.
    pub fn iterative_deepening(
        &mut self,
        pos: &Position,
        depth_cap: usize,
        allowed_root_moves: Option<&[Move]>,
    ) -> SearchReport {
        let depth_cap = depth_cap.min(MAX_DEPTH);
        let mut report = SearchReport::default();

        if depth_cap == 0 {
            return report;
        }

        let (seed_score, seed_move) = self.pvs(pos, 1, -INF, INF, 0, true, None, allowed_root_moves);

        if !self.aborted {
            report = self.report(pos, 1, seed_score, seed_move);
        }

        let mut depth = 2;
        while depth <= depth_cap && self.tc.should_start_iteration(depth) {
            self.pv.clear();

            let (score, best_move) = self.aspiration_search(pos, depth as i32, report.score, allowed_root_moves);

            if self.aborted || best_move.is_none() {
                break;
            }

            report = self.report(pos, depth, score, best_move);

            if score.is_mate() {
                break;
            }

            depth += 1;
        }

        if report.best_move.is_none() {
            report.best_move = fallback_move(pos, allowed_root_moves);
        }

        report
    }

    fn report(&self, pos: &Position, depth: usize, score: Score, best_move: Option<Move>) -> SearchReport {
        SearchReport {
            score,
            depth: depth.min(u8::MAX as usize) as u8,
            seldepth: self.seldepth.min(u8::MAX as usize) as u8,
            nodes: self.nodes,
            duration: self.tc.elapsed(),
            best_move,
            pv: self.pv.extract(pos),
            hashfull: (1000.0 * self.tt.occupancy()) as u32,
        }
    }
}

/// A uniform-random legal move, used only when every probe timed out before
/// depth 1 finished.
fn fallback_move(pos: &Position, allowed_root_moves: Option<&[Move]>) -> Option<Move> {
    let moves = pos.board.legal_moves::<true>();
    let candidates: Vec<Move> = match allowed_root_moves {
        Some(allowed) => moves.into_iter().filter(|mv| allowed.contains(mv)).collect(),
        None => moves,
    };

    candidates.choose(&mut rand::thread_rng()).copied()
}

////////////////////////////////////////////////////////////////////////////////
//
// Search report
//
////////////////////////////////////////////////////////////////////////////////

/// The result of one `iterative_deepening` call: everything the caller
/// needs to report an `info` line and play the chosen move.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub depth: u8,
    pub seldepth: u8,
    pub nodes: u32,
    pub duration: Duration,
    pub score: Score,
    pub best_move: Option<Move>,
    pub pv: Vec<Move>,
    pub hashfull: u32,
}

impl SearchReport {
    pub fn nps(&self) -> u64 {
        (1_000_000 * self.nodes as u64)
            .checked_div(self.duration.as_micros().max(1) as u64)
            .unwrap_or_default()
    }
}

impl Default for SearchReport {
    fn default() -> Self {
        Self {
            depth: 0,
            seldepth: 0,
            nodes: 0,
            duration: Duration::ZERO,
            score: 0,
            best_move: None,
            pv: Vec::new(),
            hashfull: 0,
        }
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
    use crate::transpositions::TTable;
    use chess::board::Board;

    fn search<'a>(tt: &'a TTable, budget_secs: f64) -> Search<'a> {
        let (tc, _handle) = TimeController::new(budget_secs);
        Search::new(tt, History::boxed(), tc)
    }

    #[test]
    fn finds_a_move_from_the_start_position() {
        let tt = TTable::with_capacity(1);
        let mut search = search(&tt, 2.0);
        let pos = Position::new(Board::default());

        let report = search.iterative_deepening(&pos, 6, None);

        assert!(report.best_move.is_some());
        assert!(report.depth >= 1);
    }

    #[test]
    fn respects_the_depth_cap_under_a_generous_budget() {
        let tt = TTable::with_capacity(1);
        let mut search = search(&tt, 5.0);
        let pos = Position::new(Board::default());

        let report = search.iterative_deepening(&pos, 3, None);

        assert!(report.depth <= 3);
    }

    #[test]
    fn falls_back_to_a_legal_move_under_an_immediate_timeout() {
        let tt = TTable::with_capacity(1);
        let mut search = search(&tt, 0.0);
        search.aborted = false;
        let pos = Position::new(Board::default());

        let report = search.iterative_deepening(&pos, 10, None);

        assert!(report.best_move.is_some());
        assert!(pos.board.legal_moves::<true>().contains(&report.best_move.unwrap()));
    }

    #[test]
    fn honors_the_root_move_filter() {
        let tt = TTable::with_capacity(1);
        let mut search = search(&tt, 1.0);
        let pos = Position::new(Board::default());
        let allowed = [pos.board.find_move("d2d4".parse().unwrap()).unwrap()];

        let report = search.iterative_deepening(&pos, 4, Some(&allowed));

        assert_eq!(report.best_move, Some(allowed[0]));
    }
}
