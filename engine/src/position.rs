//! A `Position` wraps a `Board` with the extra state the search needs that
//! doesn't belong on the board itself: an incrementally maintained Zobrist
//! key, and a history of keys played so far, used to detect repetitions.
use arrayvec::ArrayVec;
use chess::board::Board;
use chess::movegen::castling::CastleType;
use chess::movegen::moves::Move;
use chess::piece::Color;
use chess::square::Square;

use crate::zobrist::{ZHash, ZobristHash};

/// How many past positions we're willing to remember for repetition
/// detection. 100 half-moves covers the fifty-move rule with room to spare.
const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone)]
pub struct Position {
    pub board: Board,
    pub hash: ZHash,
    history: ArrayVec<ZHash, MAX_HISTORY>,
}

impl Position {
    pub fn new(board: Board) -> Self {
        Self {
            hash: board.hash(),
            board,
            history: ArrayVec::new(),
        }
    }

    /// Play a move, returning the position that results from it.
    ///
    /// The hash is updated incrementally rather than recomputed, mirroring
    /// what `play_move` does for the board itself.
    pub fn play_move(&self, mv: Move) -> Position {
        let mut hash = self.hash;
        let us = self.board.current;

        hash.toggle_side();

        let new_board = self.board.play_move(mv);

        if mv != Move::NULL {
            let src = mv.src();
            let tgt = mv.tgt();
            let piece = self.board.get_at(src).expect("moving piece exists");

            hash.toggle_piece(piece, src);

            if let Some(captured) = self.board.get_at(tgt) {
                hash.toggle_piece(captured, tgt);
            }

            if mv.is_en_passant() {
                let capture_sq = mv.get_capture_sq();
                let captured = self.board.get_at(capture_sq).expect("en passant victim exists");
                hash.toggle_piece(captured, capture_sq);
            }

            let placed = mv.get_promo_type().map_or(piece, |ptype| {
                chess::piece::Piece::new(ptype, us)
            });
            hash.toggle_piece(placed, tgt);

            if mv.is_castle() {
                let ctype = CastleType::from_move(mv).expect("castle move has a castle type");
                let rook_move = ctype.rook_move();
                let rook = self.board.get_at(rook_move.src()).expect("rook is on its home square");
                hash.toggle_piece(rook, rook_move.src());
                hash.toggle_piece(rook, rook_move.tgt());
            }

            for ctype in CastleType::ALL {
                let lost = self.board.castling_rights.is_available(ctype)
                    && !new_board.castling_rights.is_available(ctype);
                if lost {
                    hash.toggle_castle(ctype);
                }
            }

            if let Some(ep) = self.board.en_passant {
                hash.toggle_ep(ep);
            }
        }

        if let Some(ep) = new_board.en_passant {
            hash.toggle_ep(ep);
        }

        let mut history = self.history.clone();
        // A zeroed half-move counter means the new position can never repeat
        // anything before it, so there's no point keeping older entries.
        if new_board.half_moves == 0 {
            history.clear();
        } else if history.is_full() {
            history.remove(0);
        }
        history.push(self.hash);

        Position {
            board: new_board,
            hash,
            history,
        }
    }

    pub fn play_null_move(&self) -> Position {
        self.play_move(Move::NULL)
    }

    /// Play a bare move (as sent over UCI), resolving it against the current
    /// legal moves first. Panics if it doesn't correspond to one -- a GUI
    /// sending an illegal move in a `position ... moves ...` command is a
    /// protocol violation, not something the engine can recover from.
    pub fn play_bare_move(&self, bare: chess::movegen::moves::BareMove) -> Position {
        let mv = self.board.find_move(bare).expect("not a legal move");
        self.play_move(mv)
    }

    /// Whether this position has occurred at least twice before in the game
    /// (i.e. this occurrence would be the third, making a draw claimable).
    pub fn is_repetition(&self) -> bool {
        self.history
            .iter()
            .rev()
            .step_by(2)
            .skip(1)
            .any(|&key| key == self.hash)
    }

    pub fn can_claim_threefold(&self) -> bool {
        self.is_repetition()
    }

    pub fn can_claim_fifty(&self) -> bool {
        self.board.half_moves >= 100
    }

    pub fn ply(&self) -> usize {
        self.history.len()
    }

    pub fn king_sq(&self, side: Color) -> Square {
        self.board.kings(side).first()
    }
}

impl From<Board> for Position {
    fn from(board: Board) -> Self {
        Position::new(board)
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
    fn incremental_hash_matches_from_scratch() {
        let pos = Position::new(Board::default());
        let mv = pos.board.find_move("e2e4".parse().unwrap()).unwrap();
        let next = pos.play_move(mv);

        assert_eq!(next.hash, next.board.hash());
    }

    #[test]
    fn incremental_hash_matches_through_several_plies() {
        let mut pos = Position::new(Board::default());

        for mv_str in ["e2e4", "e7e5", "g1f3", "b8c6"] {
            let mv = pos.board.find_move(mv_str.parse().unwrap()).unwrap();
            pos = pos.play_move(mv);
            assert_eq!(pos.hash, pos.board.hash());
        }
    }

    #[test]
    fn castling_updates_hash_correctly() {
        let board: Board = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let pos = Position::new(board);
        let mv = pos.board.find_move("e1g1".parse().unwrap()).unwrap();
        let next = pos.play_move(mv);

        assert_eq!(next.hash, next.board.hash());
    }

    #[test]
    fn repetition_is_detected() {
        let mut pos = Position::new(Board::default());
        let start_hash = pos.hash;

        for mv_str in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = pos.board.find_move(mv_str.parse().unwrap()).unwrap();
            pos = pos.play_move(mv);
        }

        assert_eq!(pos.hash, start_hash);
        assert!(pos.is_repetition());
    }

    #[test]
    fn fresh_position_is_not_a_repetition() {
        let pos = Position::new(Board::default());
        assert!(!pos.is_repetition());
    }
}
