//! The search core: given a position and a time budget, finds the move the
//! engine believes maximizes the side-to-move's outcome.
//!
//! Everything outside this crate (network I/O, CLI/UCI plumbing, opening
//! books, tablebase probing, logging) is a collaborator with a named
//! interface; this crate only ever sees a [`Position`] and a time control and
//! only ever returns data, never raising errors to the caller -- a timed-out
//! search silently falls back to the previous iteration's result.
use chess::movegen::moves::Move;
use uci::time_control::TimeControl;

pub mod evaluate;
pub mod history_tables;
pub mod move_picker;
pub mod position;
pub mod search;
pub mod tests;
pub mod time_control;
pub mod transpositions;
pub mod zobrist;

use history_tables::History;
use position::Position;
use search::params;
use search::{Search, SearchReport};
use time_control::TimeController;
use transpositions::TTable;

/// Identifies a result as having come from the search itself, as opposed to
/// one of the collaborators (opening book, CSV openings, tablebase) that
/// short-circuit the search before it runs. Callers that probe those
/// collaborators first only reach for this once they've all returned none.
pub const INFO_SOURCE: &str = "lichess-bot-source:Engine";

/// One long-lived engine instance: owns the transposition table and the
/// heuristic tables that persist across searches within the same game.
pub struct Engine {
    tt: TTable,
    history: Box<History>,
    last_root: Option<Position>,
    last_pv: Vec<Move>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_hash_size_mb(params::DEFAULT_TT_SIZE)
    }

    pub fn with_hash_size_mb(mb: usize) -> Self {
        Self {
            tt: TTable::with_capacity(mb),
            history: History::boxed(),
            last_root: None,
            last_pv: Vec::new(),
        }
    }

    /// Resize the transposition table, discarding its contents.
    pub fn resize_hash_mb(&mut self, mb: usize) {
        self.tt.resize(mb);
    }

    /// Reset all state that shouldn't carry over into a new game: the
    /// transposition table, heuristic tables, and PV-continuation memory.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.history = History::boxed();
        self.last_root = None;
        self.last_pv.clear();
    }

    /// Search `pos` under `time_limit`, returning the best move found along
    /// with reporting metadata. `depth_cap` and `node_cap` mirror the
    /// `Depth`/`Nodes` UCI options; `allowed_root_moves`, when set, restricts
    /// the search to a subset of the root's legal moves (used by `searchmoves`
    /// and by the random-fallback error path). `on_start` is handed the
    /// search's cancellation handle as soon as it exists, so a caller running
    /// this on a worker thread can stash it somewhere a `stop` command on the
    /// main thread can reach.
    pub fn search(
        &mut self,
        pos: &Position,
        time_limit: TimeControl,
        depth_cap: Option<usize>,
        node_cap: Option<u32>,
        allowed_root_moves: Option<&[Move]>,
        on_start: impl FnOnce(time_control::TimeControlHandle),
    ) -> SearchReport {
        let requested_cap = depth_cap.unwrap_or(params::DEFAULT_DEPTH_CAP).min(params::MAX_DEPTH);
        let (budget_secs, time_capped_depth) = time_control::allocate(time_limit, &pos.board, requested_cap);

        let boost = self.pv_continuation_boost(pos);
        let effective_cap = (time_capped_depth + boost).min(params::MAX_DEPTH);

        let (mut controller, handle) = TimeController::new(budget_secs);
        on_start(handle);
        controller.set_max_nodes(node_cap);

        if pos.board.legal_moves::<true>().len() <= 1 {
            controller.stop_early();
        }

        self.tt.increment_age();
        self.history.increment_age();

        let history = std::mem::replace(&mut self.history, History::boxed());
        let mut search = Search::new(&self.tt, history, controller);

        let report = search.iterative_deepening(pos, effective_cap, allowed_root_moves);

        self.history = search.history;
        self.last_pv = report.pv.clone();
        self.last_root = Some(pos.clone());

        report
    }

    /// Depth to add on top of the time-derived cap when the opponent played
    /// into a line this engine already searched: if the current position is
    /// `last_root` after playing the first two moves of `last_pv`, most of
    /// that work is still fresh in the transposition table.
    fn pv_continuation_boost(&self, pos: &Position) -> usize {
        let Some(root) = &self.last_root else {
            return 0;
        };

        if self.last_pv.len() < 2 {
            return 0;
        }

        let predicted = root.play_move(self.last_pv[0]).play_move(self.last_pv[1]);

        if predicted.hash == pos.hash {
            (self.last_pv.len() - 2).min(params::PV_CONTINUATION_MAX_BOOST)
        } else {
            0
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
