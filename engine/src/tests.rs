//! End-to-end scenarios exercising the whole [`Engine`](crate::Engine)
//! rather than an individual component: given a position and a time budget,
//! does the right move come back out.
#[cfg(test)]
mod end_to_end {
    use std::time::Duration;

    use chess::board::Board;
    use uci::time_control::TimeControl;

    use crate::evaluate::ScoreExt;
    use crate::position::Position;
    use crate::Engine;

    fn search(fen: &str, budget: Duration) -> (Position, crate::search::SearchReport) {
        let board: Board = fen.parse().unwrap();
        let pos = Position::new(board);
        let mut engine = Engine::new();
        let report = engine.search(&pos, TimeControl::FixedTime(budget), None, None, None, |_| {});
        (pos, report)
    }

    #[test]
    fn starting_position_returns_a_legal_developing_move() {
        let (pos, report) = search(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            Duration::from_millis(300),
        );

        let mv = report.best_move.expect("a move was found");
        assert!(pos.board.legal_moves::<true>().contains(&mv));
        assert!(report.depth >= 1);
    }

    #[test]
    fn finds_a_back_rank_mate_in_one() {
        // White to move: Ra8 is mate, the king boxed in by its own pawns.
        let (_, report) = search("6k1/5ppp/8/8/8/8/8/R3K2R w KQ - 0 1", Duration::from_millis(500));

        let score = report.score;
        assert!(score.is_mate());
        assert!(score > 0);
    }

    #[test]
    fn takes_a_hanging_queen_instead_of_a_quieter_move() {
        let (_, report) = search("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1", Duration::from_millis(300));

        let mv = report.best_move.expect("a move was found");
        assert!(mv.is_capture());
    }

    #[test]
    fn king_and_pawn_endgame_returns_a_legal_move() {
        let (pos, report) = search("8/8/8/8/4k3/8/4P3/4K3 w - - 0 1", Duration::from_millis(300));

        let mv = report.best_move.expect("a move was found");
        assert!(pos.board.legal_moves::<true>().contains(&mv));
    }

    #[test]
    fn avoids_the_stalemate_trap_in_favor_of_mate() {
        // White to move: Ra1 throws the win away by stalemating black;
        // Ra8 is mate. The search must not pick the former.
        let (pos, report) = search("7k/5K2/8/8/8/8/R7/8 w - - 0 1", Duration::from_millis(500));

        let mv = report.best_move.expect("a move was found");
        let after = pos.play_move(mv);
        assert!(!after.board.is_stalemate());
        assert!(report.score.is_mate());
    }

    #[test]
    fn survives_a_near_zero_time_budget() {
        let (pos, report) = search(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            Duration::from_millis(20),
        );

        let mv = report.best_move.expect("a fallback move was found");
        assert!(pos.board.legal_moves::<true>().contains(&mv));
    }

    #[test]
    fn insufficient_material_scores_zero_at_the_root() {
        let (_, report) = search("4k3/8/8/8/8/8/8/4K3 w - - 0 1", Duration::from_millis(100));

        assert_eq!(report.score, 0);
    }

    #[test]
    fn new_game_clears_persistent_state() {
        let board: Board = Board::default();
        let pos = Position::new(board);
        let mut engine = Engine::new();

        engine.search(&pos, TimeControl::FixedTime(Duration::from_millis(100)), None, None, None, |_| {});
        engine.new_game();

        let report = engine.search(&pos, TimeControl::FixedTime(Duration::from_millis(100)), None, None, None, |_| {});
        assert!(report.best_move.is_some());
    }
}
