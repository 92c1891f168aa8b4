use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wheel_shared::constants::{MAX_SIMULATION_STEPS, SIMULATION_DT};
use wheel_shared::prize::default_prizes;
use wheel_shared::selector::select;
use wheel_shared::validation::parse_prize_list;
use wheel_shared::{compute_distribution, Prize, SpinEvent, WheelGame, WeightingMode};

#[path = "../logging.rs"]
mod logging;

/// Draws many spins and compares how often each prize came up with the
/// probability the weight model gives it.
#[derive(Parser, Debug)]
#[command(name = "simulate", version, about, long_about = None)]
struct Args {
    /// Number of spins to draw
    #[arg(short = 'n', long, default_value_t = 1000)]
    spins: usize,

    /// JSON array of prizes (names or objects); the built-in list otherwise
    #[arg(short = 'p', long)]
    prizes_file: Option<PathBuf>,

    /// Also plan and animate every spin and check where the wheel stops
    #[arg(long)]
    physics: bool,

    /// Weight by remaining quantity instead of the default multipliers
    #[arg(long)]
    by_quantity: bool,

    /// Seed for a reproducible run
    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Print the relay's log output as well
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn load_prizes(path: Option<&PathBuf>) -> Result<Vec<Prize>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(parse_prize_list(&std::fs::read_to_string(path)?)?),
        None => Ok(default_prizes()),
    }
}

/// Runs one spin to completion at a steady 60 fps. Returns the planned and
/// the landed index.
fn animate_spin(game: &mut WheelGame) -> Result<(usize, Option<usize>), Box<dyn std::error::Error>> {
    let plan = game.start_spin()?;
    for _ in 0..MAX_SIMULATION_STEPS {
        match game.advance(SIMULATION_DT) {
            SpinEvent::Stopped(winner) => return Ok((plan.target_index, Some(winner.index))),
            SpinEvent::Idle => return Ok((plan.target_index, None)),
            SpinEvent::Moving { .. } => {}
        }
    }
    game.cancel();
    Ok((plan.target_index, None))
}

fn print_table(prizes: &[Prize], theoretical: &[f64], counts: &[usize], spins: usize) {
    let width = prizes.iter().map(|p| p.name.chars().count()).max().unwrap_or(5).max(5);
    println!(
        "{:<width$}  {:>11}  {:>8}  {:>7}  {:>7}",
        "prize", "theoretical", "observed", "count", "delta",
        width = width
    );
    for (index, prize) in prizes.iter().enumerate() {
        let expected = theoretical[index] * 100.0;
        let observed = if spins == 0 {
            0.0
        } else {
            counts[index] as f64 / spins as f64 * 100.0
        };
        println!(
            "{:<width$}  {:>10.2}%  {:>7.2}%  {:>7}  {:>+6.2}%",
            prize.name,
            expected,
            observed,
            counts[index],
            observed - expected,
            width = width
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if args.verbose {
        logging::setup();
    }

    let prizes = load_prizes(args.prizes_file.as_ref())?;
    let weighting = if args.by_quantity {
        WeightingMode::RemainingQuantity
    } else {
        WeightingMode::default()
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let distribution = compute_distribution(&prizes, &weighting, |_| false);
    let theoretical: Vec<f64> = (0..prizes.len()).map(|i| distribution.probability_of(i)).collect();
    if distribution.is_fallback() {
        println!("No prize has a positive weight; drawing uniformly.");
    }

    let mut counts = vec![0usize; prizes.len()];
    for _ in 0..args.spins {
        if let Some(index) = select(&distribution, &mut rng) {
            counts[index] += 1;
        }
    }

    println!("{} draws over {} prizes\n", args.spins, prizes.len());
    print_table(&prizes, &theoretical, &counts, args.spins);

    if args.physics {
        let mut game = WheelGame::with_rng(prizes.clone(), StdRng::from_rng(&mut rng)?).with_weighting(weighting);
        let mut landed = vec![0usize; prizes.len()];
        let mut on_target = 0;
        let mut unfinished = 0;

        for _ in 0..args.spins {
            match animate_spin(&mut game)? {
                (target, Some(index)) => {
                    landed[index] += 1;
                    if index == target {
                        on_target += 1;
                    }
                }
                (_, None) => unfinished += 1,
            }
        }

        println!("\nAnimated {} spins\n", args.spins);
        print_table(&prizes, &theoretical, &landed, args.spins);
        println!("\nLanded on the selected prize: {}/{}", on_target, args.spins);
        if unfinished > 0 {
            println!("Spins that never settled: {}", unfinished);
        }
    }

    Ok(())
}
