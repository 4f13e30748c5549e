//! CSV-opening matcher: the first collaborator probed before every search
//! (§6). Reads a CSV of named openings (ECO code, name, move list in SAN)
//! and, given a position, returns a move whose opening shares the exact
//! move-prefix played so far.
//!
//! Grounded in `original_source/engines/opening.py`'s `ensure_csv_openings`
//! / `find_csv_opening_move`: same column fallbacks (`ECO Code`/`ECO`/`eco`,
//! `Name`/`name`, `Opening Moves`/`moves`/`Moves`), same "skip anything that
//! doesn't parse" tolerance, same "replay from the start, compare move
//! lists" matching strategy.
use std::fs;
use std::path::Path;

use chess::board::Board;
use chess::movegen::moves::Move;
use chess::san::ToSan;
use rand::seq::SliceRandom;

#[derive(Debug, Clone)]
struct Opening {
    name: String,
    moves: Vec<Move>,
}

#[derive(Debug, Default, Clone)]
pub struct CsvOpeningBook {
    openings: Vec<Opening>,
}

impl CsvOpeningBook {
    /// Load and parse a CSV file, skipping rows that don't contain a usable
    /// move list. Returns an empty book (rather than an error) if the file
    /// doesn't exist, mirroring the Python original's best-effort loading.
    pub fn load(path: &str) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            if Path::new(path).exists() {
                eprintln!("Could not read CSV openings file: {path}");
            }
            return Self::default();
        };

        let mut lines = contents.lines();
        let Some(header) = lines.next() else {
            return Self::default();
        };

        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let eco_idx = find_column(&columns, &["ECO Code", "ECO", "eco"]);
        let name_idx = find_column(&columns, &["Name", "name"]);
        let moves_idx = find_column(&columns, &["Opening Moves", "moves", "Moves"]);

        let Some(moves_idx) = moves_idx else {
            return Self::default();
        };

        let mut openings = Vec::new();

        for line in lines {
            let fields = split_csv_row(line);

            let moves_str = match fields.get(moves_idx) {
                Some(s) if !s.trim().is_empty() => s.trim(),
                _ => continue,
            };

            let name = name_idx
                .and_then(|i| fields.get(i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());

            let eco = eco_idx
                .and_then(|i| fields.get(i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());

            let display_name = name.or(eco).unwrap_or_else(|| "Opening".to_string());

            if let Some(moves) = parse_move_list(moves_str) {
                if !moves.is_empty() {
                    openings.push(Opening { name: display_name, moves });
                }
            }
        }

        Self { openings }
    }

    /// Given the moves played so far (from the start position), find an
    /// opening whose move list shares that exact prefix and return the next
    /// move it recommends along with the opening's name. Picks uniformly at
    /// random among ties, as the original does.
    pub fn find_move(&self, played: &[Move]) -> Option<(Move, String)> {
        let ply = played.len();

        let candidates: Vec<(Move, String)> = self
            .openings
            .iter()
            .filter(|opening| opening.moves.len() > ply)
            .filter(|opening| opening.moves[..ply] == played[..])
            .map(|opening| (opening.moves[ply], opening.name.clone()))
            .collect();

        candidates.choose(&mut rand::thread_rng()).cloned()
    }
}

fn find_column(columns: &[&str], names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| columns.iter().position(|col| col == name))
}

/// A minimal CSV row splitter: no quoted-field support, which is all
/// `opening.py`'s `csv.DictReader` ever needed for this file shape either.
fn split_csv_row(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

/// Parse a SAN move list such as "1. e4 e5 2. Nf3 Nc6", replaying it against
/// a fresh board to recover `Move`s. Tokens that are move numbers (with or
/// without a trailing dot) are skipped; a token that fails to match any
/// legal move aborts parsing for that row, same as the Python original's
/// `try/except: continue` (which drops the *opening*, not just the token --
/// mirrored here by returning `None` for the whole row once a match fails).
fn parse_move_list(moves_str: &str) -> Option<Vec<Move>> {
    let mut board = Board::default();
    let mut moves = Vec::new();

    for token in moves_str.replace('.', " ").split_whitespace() {
        if token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let san = token.trim_end_matches(['+', '#']);
        let legal = board.legal_moves::<true>();
        let mv = legal
            .into_iter()
            .find(|mv| mv.to_san(&board).trim_end_matches(['+', '#']) == san)?;

        board = board.play_move(mv);
        moves.push(mv);
    }

    Some(moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_move_list() {
        let moves = parse_move_list("1. e4 e5 2. Nf3 Nc6").unwrap();
        assert_eq!(moves.len(), 4);
    }

    #[test]
    fn matches_the_played_prefix() {
        let book = CsvOpeningBook {
            openings: vec![Opening {
                name: "Italian Game".to_string(),
                moves: parse_move_list("1. e4 e5 2. Nf3 Nc6 3. Bc4").unwrap(),
            }],
        };

        let played = parse_move_list("1. e4 e5 2. Nf3 Nc6").unwrap();
        let (mv, name) = book.find_move(&played).unwrap();

        assert_eq!(name, "Italian Game");
        assert_eq!(mv, parse_move_list("1. e4 e5 2. Nf3 Nc6 3. Bc4").unwrap()[4]);
    }

    #[test]
    fn no_match_past_the_end_of_the_opening() {
        let book = CsvOpeningBook {
            openings: vec![Opening {
                name: "Italian Game".to_string(),
                moves: parse_move_list("1. e4 e5").unwrap(),
            }],
        };

        let played = parse_move_list("1. e4 e5").unwrap();
        assert!(book.find_move(&played).is_none());
    }

    #[test]
    fn missing_file_yields_an_empty_book() {
        let book = CsvOpeningBook::load("/nonexistent/openings.csv");
        assert!(book.find_move(&[]).is_none());
    }
}
