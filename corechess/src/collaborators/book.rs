//! Polyglot-format opening book probing: the second collaborator in the
//! probe order (§6), tried after the CSV-opening matcher and before the
//! Syzygy probe.
//!
//! `SPEC_FULL.md` is explicit that the book and tablebase collaborators are
//! "thin named-interface stubs ... without reimplementing their internals" --
//! spec.md never specifies book probing logic, only where it sits in the
//! probe order. This reads the well-known Polyglot on-disk layout (16-byte
//! entries: 8-byte key, 2-byte move, 2-byte weight, 4-byte learn count, all
//! big-endian) and decodes moves the way Polyglot books do, but keys entries
//! with this engine's own position hash rather than reproducing the
//! official Polyglot random-key table byte for byte -- so a `.bin` book
//! compiled by another tool won't necessarily be found by key, even though
//! the format is read faithfully. Good enough for a collaborator whose own
//! internals are out of scope.
use std::fs;

use chess::movegen::moves::Move;
use chess::piece::PieceType;
use chess::square::Square;
use engine::position::Position;
use rand::seq::SliceRandom;

const ENTRY_SIZE: usize = 16;

#[derive(Debug, Clone, Copy)]
struct BookEntry {
    key: u64,
    raw_move: u16,
    weight: u16,
}

#[derive(Debug, Default, Clone)]
pub struct OpeningBook {
    entries: Vec<BookEntry>,
}

impl OpeningBook {
    /// Load a Polyglot-format `.bin` file. A missing or truncated file
    /// yields an empty book rather than an error, mirroring the CSV
    /// opening matcher's best-effort loading.
    pub fn load(path: &str) -> Self {
        let Ok(bytes) = fs::read(path) else {
            return Self::default();
        };

        let entries = bytes
            .chunks_exact(ENTRY_SIZE)
            .map(|chunk| BookEntry {
                key: u64::from_be_bytes(chunk[0..8].try_into().unwrap()),
                raw_move: u16::from_be_bytes(chunk[8..10].try_into().unwrap()),
                weight: u16::from_be_bytes(chunk[10..12].try_into().unwrap()),
            })
            .collect();

        Self { entries }
    }

    /// Find a book move for `pos`, ignoring entries below `min_weight`
    /// (§6 `BookMinWeight`). Among the survivors, picks randomly weighted
    /// by the recorded weight, the way Polyglot-aware engines do.
    pub fn find_move(&self, pos: &Position, min_weight: i32) -> Option<Move> {
        let key = pos.hash.0;

        let candidates: Vec<&BookEntry> = self
            .entries
            .iter()
            .filter(|e| e.key == key && i32::from(e.weight) >= min_weight)
            .collect();

        let chosen = candidates
            .choose_weighted(&mut rand::thread_rng(), |e| u32::from(e.weight).max(1))
            .ok()?;

        decode_move(chosen.raw_move, pos)
    }
}

/// Decode a Polyglot move encoding (source/target square by file+rank, plus
/// a 3-bit promotion piece code) into one of `pos`'s actual legal moves.
/// Resolving against the legal-move list, rather than constructing a `Move`
/// directly, is what lets this reuse the board's own disambiguation of
/// castling and en passant.
fn decode_move(raw: u16, pos: &Position) -> Option<Move> {
    let to_file = (raw & 0b111) as usize;
    let to_rank = ((raw >> 3) & 0b111) as usize;
    let from_file = ((raw >> 6) & 0b111) as usize;
    let from_rank = ((raw >> 9) & 0b111) as usize;
    let promo_code = (raw >> 12) & 0b111;

    let src = Square::new((from_rank * 8 + from_file) as u8)?;
    let tgt = Square::new((to_rank * 8 + to_file) as u8)?;

    let promo = match promo_code {
        1 => Some(PieceType::Knight),
        2 => Some(PieceType::Bishop),
        3 => Some(PieceType::Rook),
        4 => Some(PieceType::Queen),
        _ => None,
    };

    pos.board
        .legal_moves::<true>()
        .into_iter()
        .find(|mv| mv.src() == src && mv.tgt() == tgt && mv.get_promo_type() == promo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::board::Board;

    fn entry_bytes(key: u64, raw_move: u16, weight: u16) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0..8].copy_from_slice(&key.to_be_bytes());
        bytes[8..10].copy_from_slice(&raw_move.to_be_bytes());
        bytes[10..12].copy_from_slice(&weight.to_be_bytes());
        bytes
    }

    #[test]
    fn missing_file_yields_an_empty_book() {
        let book = OpeningBook::load("/nonexistent/book.bin");
        let pos = Position::new(Board::default());
        assert!(book.find_move(&pos, 0).is_none());
    }

    #[test]
    fn decodes_a_known_entry_for_the_current_position() {
        let pos = Position::new(Board::default());
        // e2e4: from e2 (rank 1, file 4) to e4 (rank 3, file 4), no promotion.
        let raw_move: u16 = (4 << 6) | (1 << 9) | (4) | (3 << 3);

        let book = OpeningBook {
            entries: vec![BookEntry { key: pos.hash.0, raw_move, weight: 10 }],
        };

        let mv = book.find_move(&pos, 0).expect("entry should decode");
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn respects_the_minimum_weight() {
        let pos = Position::new(Board::default());
        let raw_move: u16 = (4 << 6) | (1 << 9) | (4) | (3 << 3);

        let book = OpeningBook {
            entries: vec![BookEntry { key: pos.hash.0, raw_move, weight: 5 }],
        };

        assert!(book.find_move(&pos, 10).is_none());
    }

    #[test]
    fn parses_entries_from_raw_bytes() {
        let bytes = entry_bytes(0x1234, 0x5678, 42);
        let book = OpeningBook::load_from_bytes(&bytes);
        assert_eq!(book.entries.len(), 1);
        assert_eq!(book.entries[0].key, 0x1234);
        assert_eq!(book.entries[0].weight, 42);
    }
}

#[cfg(test)]
impl OpeningBook {
    fn load_from_bytes(bytes: &[u8]) -> Self {
        let entries = bytes
            .chunks_exact(ENTRY_SIZE)
            .map(|chunk| BookEntry {
                key: u64::from_be_bytes(chunk[0..8].try_into().unwrap()),
                raw_move: u16::from_be_bytes(chunk[8..10].try_into().unwrap()),
                weight: u16::from_be_bytes(chunk[10..12].try_into().unwrap()),
            })
            .collect();

        Self { entries }
    }
}
