//! The external collaborators probed before every search (§6): a CSV-opening
//! matcher, a Polyglot-format opening book, and a Syzygy tablebase probe, in
//! that exact order. The first one that returns a move short-circuits the
//! search entirely -- the caller reports it with an `info_string` naming the
//! source and depth 0, and never calls into `engine::Engine::search` at all.
pub mod book;
pub mod csv_openings;
pub mod tablebase;

use chess::board::Board;
use chess::movegen::moves::Move;

use crate::config::Config;
use book::OpeningBook;
use csv_openings::CsvOpeningBook;

/// Bundles the two collaborators that need file loading (the CSV matcher
/// and the Polyglot book), reloading each only when its configured path
/// actually changes.
#[derive(Default)]
pub struct Collaborators {
    csv_path: Option<String>,
    csv_book: CsvOpeningBook,
    book_path: Option<String>,
    book: OpeningBook,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload whichever of the CSV book / Polyglot book has a path that
    /// doesn't match what's currently loaded.
    fn refresh(&mut self, config: &Config) {
        if config.use_csv_openings && self.csv_path.as_deref() != Some(config.csv_openings_path.as_str()) {
            self.csv_book = CsvOpeningBook::load(&config.csv_openings_path);
            self.csv_path = Some(config.csv_openings_path.clone());
        }

        if let Some(path) = &config.book_path {
            if config.use_book && self.book_path.as_deref() != Some(path.as_str()) {
                self.book = OpeningBook::load(path);
                self.book_path = Some(path.clone());
            }
        }
    }

    /// Probe all three collaborators in order, returning the first move
    /// found along with the `info_string` identifying where it came from.
    /// `played` is the move list from the game's starting position, used by
    /// the CSV matcher; it's only meaningful when `root` actually is the
    /// standard starting position, which the caller is responsible for
    /// checking before passing a non-empty slice.
    pub fn probe(&mut self, config: &Config, root: &Board, played: &[Move]) -> Option<(Move, String)> {
        self.refresh(config);

        if config.use_csv_openings {
            if let Some((mv, name)) = self.csv_book.find_move(played) {
                return Some((mv, format!("lichess-bot-source:CSV Opening - {name}")));
            }
        }

        if config.use_book {
            let pos = engine::position::Position::new(root.clone());
            if let Some(mv) = self.book.find_move(&pos, config.book_min_weight) {
                return Some((mv, "lichess-bot-source:Polyglot Opening Book".to_string()));
            }
        }

        if let Some(mv) = tablebase::probe_best_move(root, config.syzygy_path.as_deref(), config.tb_probe_limit) {
            return Some((mv, "lichess-bot-source:Syzygy EGTB".to_string()));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_collaborators_configured_returns_none() {
        let mut collaborators = Collaborators::new();
        let mut config = Config::default();
        config.use_csv_openings = false;

        let result = collaborators.probe(&config, &Board::default(), &[]);
        assert!(result.is_none());
    }
}
