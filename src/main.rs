use clap::Parser;
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use coup_engine::{Game, GameConfig};

/// Plays a game of random moves and narrates it.
#[derive(Debug, Parser, Clone)]
#[command(name = "coup-engine")]
struct Args {
    /// Number of seats
    #[arg(short = 'p', long, default_value_t = 4)]
    players: usize,

    /// Seed for both the table and the random players
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Rule variants (reformation, incorporation, inquisitor, twoplayer)
    #[arg(short = 'v', long = "variant")]
    variants: Vec<String>,

    /// Give up after this many moves
    #[arg(long, default_value_t = 1000)]
    max_steps: usize,
}

const NAMES: [&str; 6] = ["ada", "bo", "cy", "di", "ed", "flo"];

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut game: Game<String> = Game::new(GameConfig::seeded(args.seed));
    let mut rng = Pcg64::seed_from_u64(args.seed);

    for name in NAMES.iter().take(args.players) {
        if let Err(err) = game.join(name.to_string()) {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }

    match game.start(args.variants.as_slice()) {
        Ok(events) => events.iter().for_each(|event| println!("{event}")),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }

    for _ in 0..args.max_steps {
        let mut commands = game.legal_commands();
        if commands.is_empty() {
            break;
        }

        let command = commands.remove(rng.gen_range(0..commands.len()));
        match game.apply(command.clone()) {
            Ok(events) => events.iter().for_each(|event| println!("{event}")),
            Err(err) => warn!("{command} was rejected: {err}"),
        }

        if game.winner().is_some() {
            break;
        }
    }

    info!("final table:\n{game}");
    match game.winner() {
        Some(winner) => println!("{winner} wins after {} turns", game.turn_number()),
        None => println!("no winner after {} moves", args.max_steps),
    }
}
