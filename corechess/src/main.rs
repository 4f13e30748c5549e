mod collaborators;
mod config;
mod uci_loop;

use std::time::{Duration, Instant};

use chess::board::Board;
use clap::{Parser, Subcommand};
use colored::Colorize;
use engine::position::Position;
use engine::Engine;
use uci::time_control::TimeControl;

#[derive(Parser)]
#[command(author, version, about = "A UCI-compliant chess engine.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the UCI read/print loop (the default when no subcommand is given).
    Uci,

    /// Run perft (move-generation node counts) from a position.
    Perft {
        #[arg(default_value = "4")]
        depth: usize,

        #[arg(default_value = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")]
        fen: String,
    },

    /// Search a small suite of positions at a fixed move time, for a quick
    /// throughput and sanity check.
    Bench {
        #[arg(short, long, value_name = "MOVETIME_MS", default_value = "1000")]
        movetime: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Uci) {
        Command::Uci => uci_loop::run(),

        Command::Perft { depth, fen } => {
            let board: Board = fen.parse()?;
            let result = board.perft_divide(depth);
            let total: u64 = result.iter().map(|(_, nodes)| nodes).sum();

            for (mv, nodes) in result.iter() {
                println!("{mv}: {nodes}");
            }

            println!("\n{total}");
            Ok(())
        }

        Command::Bench { movetime } => run_bench(movetime),
    }
}

const BENCH_POSITIONS: [&str; 5] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "4rrk1/pp1n3p/3q2pQ/2p1pb2/2PP4/2P3N1/P2B2PP/4RRK1 b - - 7 31",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
];

fn run_bench(movetime_ms: u64) -> anyhow::Result<()> {
    let mut engine = Engine::new();
    let mut total_nodes = 0u64;
    let start = Instant::now();

    for fen in BENCH_POSITIONS {
        let board: Board = fen.parse()?;
        let pos = Position::new(board);

        let report = engine.search(&pos, TimeControl::FixedTime(Duration::from_millis(movetime_ms)), None, None, None, |_| {});

        total_nodes += report.nodes as u64;

        let best_move = report
            .best_move
            .map(|mv| mv.to_string())
            .unwrap_or_else(|| "none".to_string());

        println!(
            "{:>10} nodes, depth {:>2}, bestmove {:<6} {}",
            report.nodes.to_string().green(),
            report.depth,
            best_move.blue(),
            fen.italic(),
        );
    }

    let elapsed = start.elapsed();
    let nps = (total_nodes as f64 / elapsed.as_secs_f64().max(0.001)) as u64;

    println!("\n{total_nodes} nodes in {:.2}s ({nps} nps)", elapsed.as_secs_f64());

    Ok(())
}
