//! The UCI read/print loop: wires stdin/stdout up to a dedicated search
//! thread, the way `SearchController`/`SearchThread` do in the teacher
//! repo's `simbelmyne::uci`. The thread owns the one long-lived [`Engine`]
//! instance; the main thread only ever talks to it over a channel, so a
//! `stop` command typed while a search is running doesn't have to wait for
//! that search to finish before being acted on.
use std::io::{stdout, IsTerminal, Write};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use chess::board::Board;
use chess::movegen::moves::Move;
use colored::Colorize;
use engine::evaluate::{Score, ScoreExt};
use engine::position::Position;
use engine::time_control::TimeControlHandle;
use engine::Engine;
use uci::client::UciClientMessage;
use uci::engine::{IdType, UciEngineMessage};
use uci::search_info::{Score as UciScore, SearchInfo};
use uci::time_control::TimeControl;
use uci::wdl::WdlModel;

use crate::collaborators::Collaborators;
use crate::config::{Config, UCI_OPTIONS};

const NAME: &str = "corechess";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHOR: &str = "corechess contributors";

/// Tuned the same way the teacher's engine binary tunes its WDL-rescaling
/// model: a degree-3 polynomial in the remaining material, fit against game
/// outcomes.
const WDL_MODEL: WdlModel = WdlModel {
    a: [-1687.03839457, 4936.97013397, -4865.11135831, 1907.15036483],
    b: [-62.39623703, 287.82241928, -379.70952976, 345.03030228],
};

pub fn run() -> anyhow::Result<()> {
    let stdin = std::io::stdin().lock();

    eprintln!("{} {}", NAME.blue().bold(), VERSION.blue());
    eprintln!("{}: {AUTHOR}", "Author".blue());

    let mut position = Position::new(Board::default());
    let mut root_is_startpos = true;
    let mut game_moves: Vec<Move> = Vec::new();
    let mut config = Config::default();
    let mut collaborators = Collaborators::new();
    let search_thread = SearchThread::new();
    let mut debug = false;

    for input in stdin.lines() {
        let input = input?;

        match input.trim().parse::<UciClientMessage>() {
            Ok(command) => match command {
                UciClientMessage::Uci => {
                    println!("{}", UciEngineMessage::Id(IdType::Name(format!("{NAME} {VERSION}"))));
                    println!("{}", UciEngineMessage::Id(IdType::Author(AUTHOR.to_string())));

                    for option in &UCI_OPTIONS {
                        println!("{}", UciEngineMessage::UciOption(option.clone()));
                    }

                    println!("{}", UciEngineMessage::UciOk);
                }

                UciClientMessage::IsReady => println!("{}", UciEngineMessage::ReadyOk),

                UciClientMessage::Debug(flag) => debug = flag,

                UciClientMessage::UciNewGame => {
                    position = Position::new(Board::default());
                    root_is_startpos = true;
                    game_moves.clear();
                    search_thread.new_game();
                }

                UciClientMessage::Position(board, moves) => {
                    root_is_startpos = board == Board::default();
                    let mut pos = Position::new(board);
                    let mut played = Vec::with_capacity(moves.len());

                    for bare in moves {
                        let mv = pos.board.find_move(bare).expect("not a legal move");
                        played.push(mv);
                        pos = pos.play_move(mv);
                    }

                    position = pos;
                    game_moves = played;
                }

                UciClientMessage::Go(tc) => {
                    let played = if root_is_startpos { game_moves.as_slice() } else { &[] };

                    if let Some((mv, source)) = collaborators.probe(&config, &position.board, played) {
                        let info = SearchInfo {
                            depth: Some(0),
                            string: Some(source),
                            ..Default::default()
                        };

                        println!("{}", UciEngineMessage::Info(info));
                        println!("{}", UciEngineMessage::BestMove(mv));
                    } else {
                        search_thread.search(position.clone(), tc, config.depth, config.nodes, debug);
                    }
                }

                UciClientMessage::Stop => search_thread.stop(),

                UciClientMessage::SetOption(name, value) => {
                    config.set(&name, &value)?;

                    if name == "Hash" {
                        search_thread.resize_hash(config.hash_mb);
                    }
                }

                UciClientMessage::Quit => break,
            },

            Err(err) => println!("{err}: {input}"),
        };

        stdout().flush()?;
    }

    Ok(())
}

/// A handle to the thread that owns the [`Engine`] and runs every search.
struct SearchThread {
    tx: mpsc::Sender<SearchCommand>,
    handle_slot: Arc<std::sync::Mutex<Option<TimeControlHandle>>>,
}

enum SearchCommand {
    Search {
        position: Position,
        time_limit: TimeControl,
        depth_cap: Option<usize>,
        node_cap: Option<u32>,
        debug: bool,
    },
    NewGame,
    ResizeHash(usize),
}

impl SearchThread {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel::<SearchCommand>();
        let handle_slot = Arc::new(std::sync::Mutex::new(None));
        let handle_slot_thread = Arc::clone(&handle_slot);

        thread::spawn(move || {
            let mut engine = Engine::new();

            for msg in rx {
                match msg {
                    SearchCommand::Search { position, time_limit, depth_cap, node_cap, debug } => {
                        let handle_slot = Arc::clone(&handle_slot_thread);

                        let report = engine.search(&position, time_limit, depth_cap, node_cap, None, |handle| {
                            *handle_slot.lock().unwrap() = Some(handle);
                        });

                        if debug {
                            let wdl_params = WDL_MODEL.params(&position.board);
                            let info = SearchInfo::from(&report);

                            if std::io::stdout().is_terminal() {
                                println!("{}", info.to_pretty(&position.board, wdl_params));
                            } else {
                                println!("info {}", info.to_uci(wdl_params));
                            }
                        }

                        if let Some(mv) = report.best_move {
                            println!("{}", UciEngineMessage::BestMove(mv));
                        }

                        let _ = stdout().flush();
                    }

                    SearchCommand::NewGame => engine.new_game(),

                    SearchCommand::ResizeHash(mb) => engine.resize_hash_mb(mb),
                }
            }
        });

        Self { tx, handle_slot }
    }

    fn search(&self, position: Position, time_limit: TimeControl, depth_cap: Option<usize>, node_cap: Option<u32>, debug: bool) {
        let _ = self.tx.send(SearchCommand::Search { position, time_limit, depth_cap, node_cap, debug });
    }

    fn stop(&self) {
        if let Some(handle) = self.handle_slot.lock().unwrap().take() {
            handle.cancel();
        }
    }

    fn new_game(&self) {
        let _ = self.tx.send(SearchCommand::NewGame);
    }

    fn resize_hash(&self, mb: usize) {
        let _ = self.tx.send(SearchCommand::ResizeHash(mb));
    }
}

/// Mirrors the teacher's `SearchReport -> SearchInfo` conversion: attach the
/// timing/node/pv bookkeeping a UCI `info` line reports.
impl From<&engine::search::SearchReport> for SearchInfo {
    fn from(report: &engine::search::SearchReport) -> Self {
        Self {
            depth: Some(report.depth),
            seldepth: Some(report.seldepth),
            time: Some(report.duration.as_millis() as u64),
            nodes: Some(report.nodes),
            score: Some(report.score.to_uci()),
            pv: report.pv.clone(),
            hashfull: Some(report.hashfull),
            nps: Some(report.nps()),
            currmove: None,
            currmovenumber: None,
            string: Some(engine::INFO_SOURCE.to_string()),
        }
    }
}

/// Converts a raw engine [`Score`] to the UCI-facing `cp`/`mate` distinction,
/// the way the teacher's `ScoreUciExt` does.
trait ScoreUciExt {
    fn to_uci(self) -> UciScore;
}

impl ScoreUciExt for Score {
    fn to_uci(self) -> UciScore {
        if self.is_mate() {
            UciScore::Mate(self.signum() * (self.mate_distance() + 1) / 2)
        } else {
            UciScore::Cp(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_scores_convert_to_uci_mate_distance() {
        use engine::evaluate::MATE;
        assert_eq!((MATE - 1).to_uci(), UciScore::Mate(1));
        assert_eq!((-(MATE - 3)).to_uci(), UciScore::Mate(-2));
    }

    #[test]
    fn centipawn_scores_pass_through_unchanged() {
        let score: Score = 37;
        assert_eq!(score.to_uci(), UciScore::Cp(37));
    }
}
