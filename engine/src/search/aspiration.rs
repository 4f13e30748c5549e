//! Aspiration windows: search each iteration through a narrow window
//! centered on the previous iteration's score, on the bet that the score
//! won't move much from one depth to the next. When the bet is wrong, widen
//! to the corresponding infinite bound and try again.
use chess::movegen::moves::Move;

use crate::evaluate::{Score, INF};
use crate::position::Position;
use crate::search::params::ASPIRATION_WINDOW;
use crate::search::Search;

impl Search<'_> {
    /// Search `depth` starting from a window around `prev_score`, widening
    /// and re-searching on either side that fails until the result lands
    /// inside the window it was searched with.
    pub fn aspiration_search(
        &mut self,
        pos: &Position,
        depth: i32,
        prev_score: Score,
        allowed_root_moves: Option<&[Move]>,
    ) -> (Score, Option<Move>) {
        let mut alpha = prev_score - ASPIRATION_WINDOW;
        let mut beta = prev_score + ASPIRATION_WINDOW;

        loop {
            let (score, mv) = self.pvs(pos, depth, alpha, beta, 0, true, None, allowed_root_moves);

            if self.aborted {
                return (score, mv);
            }

            if score <= alpha {
                alpha = -INF;
            } else if score >= beta {
                beta = INF;
            } else {
                return (score, mv);
            }
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
    use crate::history_tables::History;
    use crate::time_control::TimeController;
    use crate::transpositions::TTable;
    use chess::board::Board;

    #[test]
    fn widens_and_recovers_from_a_fail_low() {
        let tt = TTable::with_capacity(1);
        let (tc, _handle) = TimeController::new(5.0);
        let mut search = Search::new(&tt, History::boxed(), tc);
        let pos = Position::new(Board::default());

        // An absurdly high previous score forces alpha above the true
        // value, guaranteeing a fail-low on the first pass.
        let (score, mv) = search.aspiration_search(&pos, 3, 10_000, None);

        assert!(mv.is_some());
        assert!(score < 10_000);
    }
}
