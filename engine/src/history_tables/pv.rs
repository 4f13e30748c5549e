//! Principal-variation table: position key -> best move, written whenever a
//! PVS node raises alpha and cleared at the start of every iterative
//! deepening depth. Extracting the PV is then a matter of walking the
//! table from the root, playing each stored move.
use std::collections::HashMap;

use chess::movegen::moves::Move;

use crate::position::Position;
use crate::zobrist::ZHash;

/// Longest PV the extractor will walk, regardless of how far the table
/// could chain moves together.
const MAX_PV_LENGTH: usize = 20;

#[derive(Debug, Default, Clone)]
pub struct PVTable {
    moves: HashMap<ZHash, Move>,
}

impl PVTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    pub fn insert(&mut self, key: ZHash, mv: Move) {
        self.moves.insert(key, mv);
    }

    /// Walk the table from `root`, playing back each stored move. Stops at
    /// whichever comes first: `MAX_PV_LENGTH` moves, a position with no
    /// entry, a position repeated earlier in the line, or a stored move
    /// that's no longer legal (a transposition key collision) -- the core
    /// never plays back an illegal move, it just truncates the PV there.
    pub fn extract(&self, root: &Position) -> Vec<Move> {
        let mut line = Vec::new();
        let mut pos = root.clone();
        let mut seen = vec![pos.hash];

        while line.len() < MAX_PV_LENGTH {
            let Some(&mv) = self.moves.get(&pos.hash) else {
                break;
            };

            if !pos.board.legal_moves::<true>().contains(&mv) {
                break;
            }

            pos = pos.play_move(mv);
            line.push(mv);

            if seen.contains(&pos.hash) {
                break;
            }
            seen.push(pos.hash);
        }

        line
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
    use chess::board::Board;

    #[test]
    fn extracts_a_chained_line() {
        let root = Position::new(Board::default());
        let e4 = root.board.find_move("e2e4".parse().unwrap()).unwrap();
        let after_e4 = root.play_move(e4);
        let e5 = after_e4.board.find_move("e7e5".parse().unwrap()).unwrap();

        let mut pv = PVTable::new();
        pv.insert(root.hash, e4);
        pv.insert(after_e4.hash, e5);

        assert_eq!(pv.extract(&root), vec![e4, e5]);
    }

    #[test]
    fn stops_at_a_missing_entry() {
        let root = Position::new(Board::default());
        let e4 = root.board.find_move("e2e4".parse().unwrap()).unwrap();

        let mut pv = PVTable::new();
        pv.insert(root.hash, e4);

        assert_eq!(pv.extract(&root), vec![e4]);
    }

    #[test]
    fn truncates_at_an_illegal_stored_move() {
        let root = Position::new(Board::default());
        let e4 = root.board.find_move("e2e4".parse().unwrap()).unwrap();
        let after_e4 = root.play_move(e4);

        let mut pv = PVTable::new();
        pv.insert(root.hash, e4);
        // Stale/colliding entry: this move isn't legal from `after_e4`.
        pv.insert(after_e4.hash, e4);

        assert_eq!(pv.extract(&root), vec![e4]);
    }

    #[test]
    fn clearing_empties_the_table() {
        let root = Position::new(Board::default());
        let e4 = root.board.find_move("e2e4".parse().unwrap()).unwrap();

        let mut pv = PVTable::new();
        pv.insert(root.hash, e4);
        pv.clear();

        assert!(pv.extract(&root).is_empty());
    }
}
