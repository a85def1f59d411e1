//! Computer vs computer game from the command line

use chess_master_core::{select_move, Color, Difficulty, Game};
use rand::rngs::StdRng;
use rand::SeedableRng;

const MAX_PLIES: usize = 400;

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: selfplay <white-difficulty> <black-difficulty> [seed]");
        eprintln!("  difficulties: easy, medium, hard");
        std::process::exit(1);
    }

    let parse = |text: &str| {
        text.parse::<Difficulty>().unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        })
    };
    let white = parse(&args[1]);
    let black = parse(&args[2]);
    let seed = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0u64);

    println!("White ({}) vs Black ({}), seed {}", white.as_str(), black.as_str(), seed);
    println!();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new();

    while !game.is_over() && game.history().len() < MAX_PLIES {
        let difficulty = if game.turn() == Color::White { white } else { black };
        let legal = game.legal_moves();
        let Some(mv) = select_move(game.position(), &legal, difficulty, &mut rng) else {
            break;
        };
        if let Err(e) = game.apply(&mv) {
            eprintln!("Engine produced a bad move: {}", e);
            std::process::exit(1);
        }
    }

    println!("{}", game.history().movetext());
    println!();

    let status = game.status();
    match status.winner() {
        Some(winner) => println!("{} wins: {}", chess_master_core::rules::color_name(winner), status.reason()),
        None if status.is_terminal() => println!("Draw: {}", status.reason()),
        None => println!("Stopped after {} plies", MAX_PLIES),
    }
    println!("Final position: {}", game.fen());
}
