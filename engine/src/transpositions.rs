//! The transposition table is one of the most important data structures in
//! the engine.
//!
//! As we're searching through the game tree, we're bound to come across
//! duplicate board positions. It would be great if we could re-use some of
//! the work we've already done in other branches of the tree. Enter the
//! transposition table.
//!
//! We store some key information about the node (the score we found, how
//! deep we searched the node for, whether the score is an upper/lower bound,
//! etc...) and use the position's Zobrist hash as a key to index into it.
//!
//! A couple of concerns:
//! 1. There's more possible board positions than Zobrist hashes (2^64). That
//! means we'll inevitably have hash collisions (so-called Type-1
//! collisions). These should be pretty rare, though.
//!
//! 2. We don't want a lookup table with 2^64 entries, that would be absurd.
//! Instead, we truncate the Zobrist hash to however many bits we need to
//! accommodate the requested table size. Reducing the key size means we'll
//! get _many_ more collisions (called Type-2 collisions). Because these are
//! much more frequent, we store the full hash along with the rest of the
//! values, so that when we read the entry from the table, we can check our
//! board's position against the full hash, to make sure we (probably) didn't
//! get a false positive.

use crate::evaluate::{Score, ScoreExt};
use crate::zobrist::ZHash;
use chess::movegen::moves::{Move, MoveType};
use chess::square::Square;
use std::mem::size_of;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

/// Reconstruct a `MoveType` from its packed 4-bit representation. The two
/// unused bit patterns (`0b0110`, `0b0111`) never get written by `store`, so
/// they fall back to `Quiet` rather than panicking on a corrupted read.
fn decode_move_type(bits: u8) -> MoveType {
    use MoveType::*;
    match bits {
        0b0000 => Quiet,
        0b0001 => DoublePush,
        0b0010 => KingCastle,
        0b0011 => QueenCastle,
        0b0100 => Capture,
        0b0101 => EnPassant,
        0b1000 => KnightPromo,
        0b1001 => BishopPromo,
        0b1010 => RookPromo,
        0b1011 => QueenPromo,
        0b1100 => KnightPromoCapture,
        0b1101 => BishopPromoCapture,
        0b1110 => RookPromoCapture,
        0b1111 => QueenPromoCapture,
        _ => Quiet,
    }
}

/// A flag that stores whether the entry corresponds to a PV, fail-high or
/// fail-low node. Or, equivalently, whether the score saved in the entry is
/// exact, an upper bound, or a lower bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Exact = 0b00,
    Upper = 0b01,
    Lower = 0b10,
}

////////////////////////////////////////////////////////////////////////////////
//
// TT Entry
//
////////////////////////////////////////////////////////////////////////////////

/// A single TT entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TTEntry {
    /// The hash of the board the entry is for, used to test for hash
    /// collisions.
    hash: ZHash,

    /// The depth we searched to from this node.
    depth: u8,

    /// The best move we found in the previous search.
    best_move: Move,

    /// The associated score we found. Mate scores are normalized to be
    /// relative to the node where the entry was stored, per I3. Stored at
    /// full width: `MATE - ply` can reach close to `MATE = 1_000_000`, which
    /// doesn't fit in 16 bits.
    score: i32,

    /// The static eval for the board position.
    eval: i16,

    /// The type of node this entry represents.
    node_type: NodeType,

    /// The age of the table when this entry was written, used to tell
    /// stale entries from fresh ones.
    age: u8,
}

impl TTEntry {
    const NULL: TTEntry = TTEntry {
        hash: ZHash::EMPTY,
        best_move: Move::NULL,
        score: 0,
        eval: 0,
        depth: 0,
        node_type: NodeType::Exact,
        age: 0,
    };

    /// Create a new TT entry.
    pub fn new(
        hash: ZHash,
        best_move: Move,
        score: Score,
        eval: Score,
        depth: usize,
        node_type: NodeType,
        age: u8,
        ply: usize,
    ) -> TTEntry {
        TTEntry {
            hash,
            best_move,
            score: score.relative(ply),
            eval: eval as i16,
            depth: depth as u8,
            node_type,
            age,
        }
    }

    pub fn get_hash(&self) -> ZHash {
        self.hash
    }

    pub fn get_move(&self) -> Option<Move> {
        match self.best_move {
            Move::NULL => None,
            mv => Some(mv),
        }
    }

    /// Return the score for the entry. This is still relative to the node
    /// the entry was stored at; use `try_score` to get an absolute score.
    pub fn get_score(&self) -> Score {
        self.score as Score
    }

    pub fn get_eval(&self) -> Score {
        self.eval as Score
    }

    pub fn get_depth(&self) -> usize {
        self.depth as usize
    }

    pub fn get_type(&self) -> NodeType {
        self.node_type
    }

    pub fn get_age(&self) -> u8 {
        self.age
    }

    pub fn is_empty(&self) -> bool {
        self.hash == ZHash::EMPTY
    }

    /// Check whether we can use the entry's score outright, and if so,
    /// return it, normalized back to the current node (I3).
    ///
    /// We don't want to use results that didn't search as deep as we're
    /// meant to search. Additionally, a score stored as an upper/lower bound
    /// can only be trusted if it already falls outside our current window.
    pub fn try_score(&self, depth: usize, alpha: Score, beta: Score, ply: usize) -> Option<Score> {
        if self.get_depth() < depth {
            return None;
        }

        let absolute_score = self.get_score().absolute(ply);

        match self.get_type() {
            NodeType::Exact => Some(absolute_score),
            NodeType::Upper if absolute_score <= alpha => Some(absolute_score),
            NodeType::Lower if absolute_score >= beta => Some(absolute_score),
            _ => None,
        }
    }
}

impl Default for TTEntry {
    fn default() -> Self {
        TTEntry::NULL
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Packed TT Entry
//
////////////////////////////////////////////////////////////////////////////////

/// Lock-free storage for a `TTEntry`, split across two atomics so a probe
/// never has to take a lock. Racing writers can tear an entry, but the hash
/// check on read rejects a torn read almost always; the rare one that
/// slips through just looks like a cache miss.
///
/// `data` packs the move (16 bits), the full 32-bit score, the depth and the
/// node type; `meta` packs the 16-bit static eval alongside the age. The
/// score gets the full 32 bits because mate scores (`MATE - ply`, up to
/// just under 1_000_000) don't fit in anything narrower.
#[derive(Default)]
struct PackedTTEntry {
    hash: AtomicU64,
    data: AtomicU64,
    meta: AtomicU32,
}

impl PackedTTEntry {
    fn store(&self, entry: &TTEntry) {
        let move_bits = (entry.best_move.src() as u64)
            | ((entry.best_move.tgt() as u64) << 6)
            | ((entry.best_move.get_type() as u64) << 12);

        let data = move_bits
            | ((entry.score as u32 as u64) << 16)
            | ((entry.depth as u64) << 48)
            | ((entry.node_type as u64) << 56);

        let meta = (entry.eval as u16 as u32) | ((entry.age as u32) << 16);

        self.hash.store(entry.hash.0, Ordering::Relaxed);
        self.data.store(data, Ordering::Relaxed);
        self.meta.store(meta, Ordering::Relaxed);
    }

    fn load(&self) -> TTEntry {
        let hash = self.hash.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        let meta = self.meta.load(Ordering::Relaxed);

        let src = Square::from((data & 0x3F) as usize);
        let tgt = Square::from(((data >> 6) & 0x3F) as usize);
        let mtype = decode_move_type(((data >> 12) & 0xF) as u8);
        let best_move = Move::new(src, tgt, mtype);

        let score = ((data >> 16) & 0xFFFF_FFFF) as u32 as i32;
        let depth = ((data >> 48) & 0xFF) as u8;
        let node_type = match (data >> 56) & 0b11 {
            0b00 => NodeType::Exact,
            0b01 => NodeType::Upper,
            _ => NodeType::Lower,
        };

        let eval = (meta & 0xFFFF) as u16 as i16;
        let age = (meta >> 16) as u8;

        TTEntry {
            hash: ZHash(hash),
            best_move,
            score,
            eval,
            depth,
            node_type,
            age,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Transposition table
//
////////////////////////////////////////////////////////////////////////////////

/// How far behind the table's current age an entry has to fall before it's
/// considered stale and eligible for the probabilistic purge below.
const STALE_AGE: u8 = 8;

/// A transposition table is a bounded, open-addressed array: every key maps
/// to exactly one slot (no probe sequence), and a new write simply
/// overwrites whatever was there according to the replacement rules in
/// `insert`.
pub struct TTable {
    table: Vec<PackedTTEntry>,
    size: usize,
    age: AtomicU8,
    /// A free-running counter used to draw the ~5% stale-entry purge below
    /// without needing a real RNG.
    purge_counter: AtomicU64,
}

impl TTable {
    /// Resize the table to the requested size, in megabytes.
    pub fn resize(&mut self, mb_size: usize) {
        let size = ((mb_size << 20) / size_of::<PackedTTEntry>()).max(1);
        self.size = size;
        self.table = Vec::new();
        self.table.resize_with(size, PackedTTEntry::default);
    }

    /// Create a new table with the requested capacity, in megabytes.
    pub fn with_capacity(mb_size: usize) -> TTable {
        let mut table = TTable {
            table: Vec::new(),
            size: 0,
            age: AtomicU8::new(0),
            purge_counter: AtomicU64::new(0),
        };

        table.resize(mb_size);
        table
    }

    /// Clear every entry in the table and reset its age, without changing
    /// its size.
    pub fn clear(&self) {
        // `table` isn't behind interior mutability for its Vec, so clearing
        // means storing the NULL entry into every slot instead.
        for entry in &self.table {
            entry.store(&TTEntry::NULL);
        }
        self.age.store(0, Ordering::Relaxed);
    }

    /// Insert an entry into the transposition table.
    ///
    /// The existing entry at the slot is replaced if it's empty, belongs to
    /// an older search, was searched shallower than the new entry, or if the
    /// new entry is an exact score superseding a bound. Additionally, an
    /// entry that is considerably stale (more than `STALE_AGE` generations
    /// old) has roughly a 1-in-20 chance of being replaced regardless, which
    /// keeps long-running searches from filling up with positions that will
    /// never be probed again.
    pub fn insert(&self, entry: TTEntry) {
        let key = ZKey::from_hash(entry.hash, self.size);
        let slot = &self.table[key.0];
        let existing = slot.load();

        let current_age = self.get_age();
        let is_stale = existing.get_age() != current_age
            && current_age.wrapping_sub(existing.get_age()) >= STALE_AGE;

        let should_replace = existing.is_empty()
            || existing.get_age() != current_age
            || existing.get_depth() <= entry.get_depth()
            || (entry.get_type() == NodeType::Exact && existing.get_type() != NodeType::Exact)
            || (is_stale && self.draw_purge());

        if should_replace {
            slot.store(&entry);
        }
    }

    /// Draws a pseudo-random "purge this entry" decision with roughly 5%
    /// probability, using a free-running counter rather than a real RNG.
    fn draw_purge(&self) -> bool {
        let n = self.purge_counter.fetch_add(1, Ordering::Relaxed);
        n % 20 == 0
    }

    /// Check whether the hash appears in the transposition table, and
    /// return it if so.
    pub fn probe(&self, hash: ZHash) -> Option<TTEntry> {
        let key = ZKey::from_hash(hash, self.size);

        self.table
            .get(key.0)
            .map(PackedTTEntry::load)
            .filter(|entry| entry.hash == hash)
    }

    /// Instruct the CPU to read the requested TT entry into cache ahead of
    /// time.
    pub fn prefetch(&self, hash: ZHash) {
        let key = ZKey::from_hash(hash, self.size);
        let entry = &self.table[key.0];

        #[cfg(target_arch = "x86_64")]
        unsafe {
            use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
            _mm_prefetch((entry as *const PackedTTEntry).cast::<i8>(), _MM_HINT_T0);
        }
    }

    /// Return the occupancy as a fractional number (0-1), sampled from the
    /// first thousand slots.
    pub fn occupancy(&self) -> f32 {
        let sample_size = self.table.len().min(1000);

        let occupied = self.table[..sample_size]
            .iter()
            .filter(|packed| packed.hash.load(Ordering::Relaxed) != ZHash::EMPTY.0)
            .count();

        occupied as f32 / sample_size as f32
    }

    pub fn get_age(&self) -> u8 {
        self.age.load(Ordering::Relaxed)
    }

    /// Increment the age of the table, marking a new search generation.
    pub fn increment_age(&self) {
        self.age.fetch_add(1, Ordering::Relaxed);
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Zobrist keys
//
////////////////////////////////////////////////////////////////////////////////

/// A `ZKey` is a lookup key derived from a Zobrist hash, truncated to fit
/// inside a table of the requested size.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ZKey(pub usize);

impl ZKey {
    pub fn from_hash(hash: ZHash, size: usize) -> Self {
        ZKey(((hash.0 as u128 * size as u128) >> 64) as usize)
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
    fn insert_and_probe_roundtrip() {
        let table = TTable::with_capacity(1);
        let mv: Move = "e2e4".parse().unwrap();
        let entry = TTEntry::new(ZHash(12345), mv, 250, 10, 6, NodeType::Exact, 0, 0);

        table.insert(entry);
        let found = table.probe(ZHash(12345)).unwrap();

        assert_eq!(found.get_move(), Some(mv));
        assert_eq!(found.get_score(), 250);
        assert_eq!(found.get_depth(), 6);
    }

    #[test]
    fn probe_misses_on_collision() {
        let table = TTable::with_capacity(1);
        assert!(table.probe(ZHash(999)).is_none());
    }

    #[test]
    fn shallower_entry_does_not_replace_deeper_one() {
        let table = TTable::with_capacity(1);
        let mv: Move = "e2e4".parse().unwrap();
        let deep = TTEntry::new(ZHash(1), mv, 100, 100, 10, NodeType::Exact, 0, 0);
        let shallow = TTEntry::new(ZHash(1), mv, 50, 50, 2, NodeType::Exact, 0, 0);

        table.insert(deep);
        table.insert(shallow);

        let found = table.probe(ZHash(1)).unwrap();
        assert_eq!(found.get_depth(), 10);
    }

    #[test]
    fn try_score_rejects_shallow_entries() {
        let mv: Move = "e2e4".parse().unwrap();
        let entry = TTEntry::new(ZHash(1), mv, 100, 100, 3, NodeType::Exact, 0, 0);
        assert!(entry.try_score(10, -1000, 1000, 0).is_none());
        assert_eq!(entry.try_score(3, -1000, 1000, 0), Some(100));
    }

    #[test]
    fn mate_scores_survive_the_packed_roundtrip() {
        use crate::evaluate::MATE;

        let table = TTable::with_capacity(1);
        let mv: Move = "e2e4".parse().unwrap();
        let entry = TTEntry::new(ZHash(7), mv, MATE - 1, 0, 5, NodeType::Exact, 0, 0);

        table.insert(entry);
        let found = table.probe(ZHash(7)).unwrap();

        assert_eq!(found.get_score(), MATE - 1);
    }
}
