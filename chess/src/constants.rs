use crate::bitboard::Bitboard;

pub const LIGHT_SQUARES: Bitboard = Bitboard(6172840429334713770);
pub const DARK_SQUARES: Bitboard = Bitboard(12273903644374837845);

/// Bitboard masks for each of the 8 files, indexed a-file-first.
pub const FILES: [Bitboard; 8] = {
    const FILE_A: u64 = 0x0101_0101_0101_0101;
    let mut files = [Bitboard::EMPTY; 8];
    let mut i = 0;
    while i < 8 {
        files[i] = Bitboard(FILE_A << i);
        i += 1;
    }
    files
};

/// Bitboard masks for each of the 8 ranks, indexed rank-1-first.
pub const RANKS: [Bitboard; 8] = {
    const RANK_1: u64 = 0xFF;
    let mut ranks = [Bitboard::EMPTY; 8];
    let mut i = 0;
    while i < 8 {
        ranks[i] = Bitboard(RANK_1 << (8 * i));
        i += 1;
    }
    ranks
};

/// `RANKS_ABOVE[r]` is the union of every rank strictly above rank `r`
/// (rank-1-first, so `RANKS_ABOVE[7]` is empty).
pub const RANKS_ABOVE: [Bitboard; 8] = {
    let mut masks = [Bitboard::EMPTY; 8];
    let mut r = 0;
    while r < 8 {
        let mut above = Bitboard::EMPTY;
        let mut other = r + 1;
        while other < 8 {
            above = Bitboard(above.0 | RANKS[other].0);
            other += 1;
        }
        masks[r] = above;
        r += 1;
    }
    masks
};

/// `RANKS_BELOW[r]` is the union of every rank strictly below rank `r`
/// (rank-1-first, so `RANKS_BELOW[0]` is empty).
pub const RANKS_BELOW: [Bitboard; 8] = {
    let mut masks = [Bitboard::EMPTY; 8];
    let mut r = 0;
    while r < 8 {
        let mut below = Bitboard::EMPTY;
        let mut other = 0;
        while other < r {
            below = Bitboard(below.0 | RANKS[other].0);
            other += 1;
        }
        masks[r] = below;
        r += 1;
    }
    masks
};
