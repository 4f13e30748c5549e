//! Counter-move table: for a given opponent move (from, to), the move that
//! most recently refuted it by causing a beta-cutoff in reply.
use chess::movegen::moves::Move;
use chess::square::Square;

#[derive(Debug, Clone)]
pub struct CounterMoveTable {
    moves: Box<[[Move; Square::COUNT]; Square::COUNT]>,
}

impl CounterMoveTable {
    pub fn new() -> Self {
        Self {
            moves: Box::new([[Move::NULL; Square::COUNT]; Square::COUNT]),
        }
    }

    pub fn get(&self, prev: Move) -> Option<Move> {
        let mv = self.moves[prev.src() as usize][prev.tgt() as usize];
        (mv != Move::NULL).then_some(mv)
    }

    pub fn set(&mut self, prev: Move, reply: Move) {
        self.moves[prev.src() as usize][prev.tgt() as usize] = reply;
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for CounterMoveTable {
    fn default() -> Self {
        Self::new()
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
    use chess::movegen::moves::MoveType;
    use chess::square::Square::{A2, A3, B2, B3};

    #[test]
    fn set_and_get_roundtrip() {
        let mut table = CounterMoveTable::new();
        let prev = Move::new(A2, A3, MoveType::Quiet);
        let reply = Move::new(B2, B3, MoveType::Quiet);

        table.set(prev, reply);

        assert_eq!(table.get(prev), Some(reply));
    }

    #[test]
    fn unset_entry_is_none() {
        let table = CounterMoveTable::new();
        let prev = Move::new(A2, A3, MoveType::Quiet);

        assert_eq!(table.get(prev), None);
    }
}
