//! Principal-variation search: negamax with alpha-beta pruning plus the
//! usual battery of pruning and reduction heuristics (null-move, internal
//! iterative deepening, futility pruning, late-move reductions) and the
//! scout/re-search dance that gives PVS its name.
use chess::movegen::moves::Move;

use crate::evaluate::{evaluate, Score, ScoreExt, INF, MATE};
use crate::move_picker::MovePicker;
use crate::position::Position;
use crate::search::params::{
    FUTILITY_MARGINS, FUTILITY_MAX_DEPTH, IID_MIN_DEPTH, IID_REDUCTION, LMR_DEEP_DEPTH,
    LMR_DEEP_MOVE_COUNT, LMR_MIN_DEPTH, LMR_MIN_MOVE_COUNT, NMP_MIN_DEPTH,
};
use crate::search::params::nmp_reduction;
use crate::search::Search;
use crate::transpositions::{NodeType, TTEntry};

impl Search<'_> {
    /// Search `pos` to `depth`, returning a score from the side-to-move's
    /// perspective and, when the move loop ran, the move that produced it.
    ///
    /// `prev_move` is the move that led to `pos`, threaded through purely so
    /// the counter-move table can be consulted and updated; it plays no part
    /// in the spec's signature otherwise. `allowed_root_moves`, when set, is
    /// only honored at the root (`ply == 0`).
    pub fn pvs(
        &mut self,
        pos: &Position,
        mut depth: i32,
        mut alpha: Score,
        mut beta: Score,
        ply: usize,
        is_pv: bool,
        prev_move: Option<Move>,
        allowed_root_moves: Option<&[Move]>,
    ) -> (Score, Option<Move>) {
        self.seldepth = self.seldepth.max(ply);

        if self.time_up() {
            return (0, None);
        }

        self.nodes += 1;

        if pos.board.is_checkmate() {
            return (-MATE + ply as Score, None);
        }

        if pos.board.is_stalemate()
            || pos.board.insufficient_material()
            || pos.can_claim_threefold()
            || pos.can_claim_fifty()
        {
            return (0, None);
        }

        alpha = alpha.max(-MATE + ply as Score);
        beta = beta.min(MATE - ply as Score - 1);
        if alpha >= beta {
            return (alpha, None);
        }

        let tt_entry = self.tt.probe(pos.hash);
        let mut tt_move = tt_entry.and_then(|e| e.get_move());

        if let Some(entry) = tt_entry {
            if entry.get_depth() as i32 >= depth && !is_pv {
                if let Some(score) = entry.try_score(depth.max(0) as usize, alpha, beta, ply) {
                    return (score, tt_move);
                }
            }
        }

        if depth <= 0 {
            return (self.quiescence(pos, alpha, beta, ply), None);
        }

        let is_check = pos.board.in_check();

        if !is_pv && !is_check && depth >= NMP_MIN_DEPTH as i32 && pos.board.zugzwang_unlikely() {
            let r = nmp_reduction(depth as usize) as i32;
            let null_pos = pos.play_null_move();
            let (child_score, _) =
                self.pvs(&null_pos, depth - 1 - r, -beta, -beta + 1, ply + 1, false, None, None);

            if self.aborted {
                return (0, None);
            }

            if -child_score >= beta {
                return (beta, None);
            }
        }

        if is_pv && tt_move.is_none() && depth >= IID_MIN_DEPTH as i32 {
            let (_, found) = self.pvs(pos, depth - IID_REDUCTION as i32, alpha, beta, ply, true, prev_move, None);

            if self.aborted {
                return (0, None);
            }

            tt_move = found;
        }

        if depth <= FUTILITY_MAX_DEPTH as i32 && !is_pv && !is_check && alpha.abs() < MATE - 100 {
            let margin = FUTILITY_MARGINS[depth as usize];
            let eval = evaluate(&pos.board, self.time_budget_secs());
            if eval + margin <= alpha {
                return (alpha, None);
            }
        }

        let picker = MovePicker::new(pos, &self.history, ply, tt_move, prev_move);
        let moves: Vec<Move> = match allowed_root_moves {
            Some(allowed) if ply == 0 => picker.filter(|mv| allowed.contains(mv)).collect(),
            _ => picker.collect(),
        };

        if moves.is_empty() {
            return (0, None);
        }

        if is_check {
            depth += 1;
        }

        let orig_alpha = alpha;
        let mut best_score = -INF;
        let mut best_move = None;
        let mut moves_searched = 0usize;

        for mv in moves {
            let next = pos.play_move(mv);
            let gives_check_after = next.board.in_check();

            let reduction = if !is_pv
                && moves_searched >= LMR_MIN_MOVE_COUNT
                && depth >= LMR_MIN_DEPTH as i32
                && !is_check
                && !gives_check_after
                && !mv.is_capture()
                && mv.get_promo_type().is_none()
            {
                let mut r = 1;
                if moves_searched >= LMR_DEEP_MOVE_COUNT {
                    r = 2;
                }
                if depth > LMR_DEEP_DEPTH as i32 {
                    r += 1;
                }
                r
            } else {
                0
            };

            let score = if moves_searched == 0 {
                let (s, _) = self.pvs(&next, depth - 1, -beta, -alpha, ply + 1, is_pv, Some(mv), None);
                -s
            } else {
                let (s, _) = self.pvs(&next, depth - 1 - reduction, -alpha - 1, -alpha, ply + 1, false, Some(mv), None);
                let mut score = -s;

                if reduction > 0 && score > alpha && !self.aborted {
                    let (s2, _) = self.pvs(&next, depth - 1, -alpha - 1, -alpha, ply + 1, false, Some(mv), None);
                    score = -s2;
                }

                if score > alpha && score < beta && !self.aborted {
                    let (s3, _) = self.pvs(&next, depth - 1, -beta, -alpha, ply + 1, true, Some(mv), None);
                    score = -s3;
                }

                score
            };

            if self.aborted {
                return (0, None);
            }

            moves_searched += 1;

            if score > best_score {
                best_score = score;
                best_move = Some(mv);

                if score > alpha {
                    alpha = score;
                    self.pv.insert(pos.hash, mv);

                    if alpha >= beta {
                        if !mv.is_capture() {
                            self.history.record_cutoff(pos.board.current, mv, depth as usize, ply, prev_move);
                        }
                        break;
                    }
                }
            }
        }

        let node_type = if best_score <= orig_alpha {
            NodeType::Upper
        } else if best_score >= beta {
            NodeType::Lower
        } else {
            NodeType::Exact
        };

        if let Some(mv) = best_move {
            self.tt.insert(TTEntry::new(
                pos.hash,
                mv,
                best_score,
                evaluate(&pos.board, self.time_budget_secs()),
                depth.max(0) as usize,
                node_type,
                self.tt.get_age(),
                ply,
            ));
        }

        (best_score, best_move)
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

    fn search<'a>(tt: &'a TTable) -> Search<'a> {
        let (tc, _handle) = TimeController::new(5.0);
        Search::new(tt, History::boxed(), tc)
    }

    #[test]
    fn finds_mate_in_one() {
        let tt = TTable::with_capacity(1);
        let mut search = search(&tt);
        let board: Board = "6k1/5ppp/8/8/8/8/8/R3K2R w KQ - 0 1".parse().unwrap();
        let pos = Position::new(board);

        let (score, mv) = search.pvs(&pos, 4, -INF, INF, 0, true, None, None);

        assert!(score.is_mate());
        assert!(mv.is_some());
    }

    #[test]
    fn stalemate_scores_zero() {
        let tt = TTable::with_capacity(1);
        let mut search = search(&tt);
        let board: Board = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let pos = Position::new(board);

        let (score, mv) = search.pvs(&pos, 3, -INF, INF, 0, true, None, None);

        assert_eq!(score, 0);
        assert_eq!(mv, None);
    }

    #[test]
    fn root_move_filter_is_honored() {
        let tt = TTable::with_capacity(1);
        let mut search = search(&tt);
        let pos = Position::new(Board::default());
        let allowed = [pos.board.find_move("d2d4".parse().unwrap()).unwrap()];

        let (_, mv) = search.pvs(&pos, 3, -INF, INF, 0, true, None, Some(&allowed));

        assert_eq!(mv, Some(allowed[0]));
    }
}
