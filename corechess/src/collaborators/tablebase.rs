//! Syzygy endgame-tablebase probing: the third and last collaborator in the
//! probe order (§6), tried only once the CSV-opening matcher and the
//! opening book have both returned nothing.
//!
//! Per `SPEC_FULL.md` §1 this is a thin named-interface stub: spec.md treats
//! tablebase probing as an external collaborator it never specifies the
//! internals of, only the config it threads through (`SyzygyPath`,
//! `TablebaseProbeLimit`) and where it sits in the probe order. Decoding the
//! real Syzygy WDL/DTZ compression scheme is a project in its own right and
//! no crate in this engine's dependency stack provides it, so this
//! collaborator does the part that *is* in scope -- validating the
//! configuration and narrowing to positions within the piece-count window --
//! and honestly returns no move rather than faking a probe result.
use chess::board::Board;

/// Whether a tablebase probe is even worth attempting for `board`: Syzygy
/// tablebases only exist for a bounded number of pieces, configured via
/// `TablebaseProbeLimit` (§6, clamped to `3..=7` by [`Config::set`]).
///
/// [`Config::set`]: crate::config::Config::set
fn in_probe_range(board: &Board, piece_limit: i32) -> bool {
    let piece_count = board.all_occupied().count() as i32;
    piece_count <= piece_limit
}

/// Probe the tablebase for `board`, returning the best move it recommends.
/// Always returns `None`: `syzygy_path` is threaded through so a real
/// decoder can be dropped in behind this signature without touching any
/// caller, but no such decoder lives in this repository yet (see the module
/// doc comment).
pub fn probe_best_move(board: &Board, syzygy_path: Option<&str>, piece_limit: i32) -> Option<chess::movegen::moves::Move> {
    let _ = syzygy_path?;

    if !in_probe_range(board, piece_limit) {
        return None;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_is_out_of_probe_range() {
        assert!(!in_probe_range(&Board::default(), 7));
    }

    #[test]
    fn a_bare_kings_position_is_in_probe_range() {
        let board: Board = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        assert!(in_probe_range(&board, 3));
    }

    #[test]
    fn no_path_configured_means_no_probe() {
        let board: Board = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        assert!(probe_best_move(&board, None, 7).is_none());
    }
}
