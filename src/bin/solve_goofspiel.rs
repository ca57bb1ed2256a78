//! Goofspiel MCCFR solver binary.
//!
//! Usage:
//!   cargo run --release --bin solve_goofspiel -- [OPTIONS]
//!
//! Options:
//!   --deck <N>            Cards per player (default: 5)
//!   --iterations <N>      Training iterations (default: 10000)
//!   --estimator <NAME>    outcome | averaged (default: outcome)
//!   --config <FILE>       Configuration JSON file (optional)
//!   --threads <N>         Threads for resampling trials (default: auto)
//!   --seed <N>            Random seed (optional)
//!   --reduction <N>       Averaged trial reduction factor (default: 4)
//!   --max-trials <N>      Cap on averaged trials per round (optional)
//!   --games <N>           Evaluation games vs a uniform opponent (default: 10000, 0 to skip)
//!   --output <FILE>       Output file (default: goofspiel_solution.json)

use std::env;
use std::process;
use std::str::FromStr;

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use goofspiel_cfr::cfr::{evaluate_against_uniform, EstimatorKind, SolverConfig};
use goofspiel_cfr::games::goofspiel::{self, output::GoofspielReport, Goofspiel};
use goofspiel_cfr::SolverResult;

/// Command-line options layered over the configuration file.
struct Options {
    config_file: Option<String>,
    deck: Option<usize>,
    estimator: Option<EstimatorKind>,
    threads: Option<usize>,
    seed: Option<u64>,
    reduction: Option<u64>,
    max_trials: Option<u64>,
    iterations: u64,
    games: u64,
    output_file: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let Some(options) = parse_args(&args) else {
        return;
    };

    if let Err(e) = solve(options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Option<Options> {
    let mut options = Options {
        config_file: None,
        deck: None,
        estimator: None,
        threads: None,
        seed: None,
        reduction: None,
        max_trials: None,
        iterations: 10_000,
        games: 10_000,
        output_file: "goofspiel_solution.json".to_string(),
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--config" | "-c" => options.config_file = value.cloned(),
            "--deck" | "-n" => options.deck = parse_value(&args[i], value),
            "--iterations" | "-i" => {
                options.iterations = parse_value(&args[i], value).unwrap_or(options.iterations)
            }
            "--estimator" | "-e" => {
                options.estimator = value.and_then(|v| EstimatorKind::from_name(v));
                if options.estimator.is_none() {
                    eprintln!("Unknown estimator: {}", value.map(String::as_str).unwrap_or(""));
                    print_help();
                    return None;
                }
            }
            "--threads" | "-t" => options.threads = parse_value(&args[i], value),
            "--seed" | "-s" => options.seed = parse_value(&args[i], value),
            "--reduction" => options.reduction = parse_value(&args[i], value),
            "--max-trials" => options.max_trials = parse_value(&args[i], value),
            "--games" | "-g" => options.games = parse_value(&args[i], value).unwrap_or(options.games),
            "--output" | "-o" => {
                if let Some(path) = value {
                    options.output_file = path.clone();
                }
            }
            "--help" | "-h" => {
                print_help();
                return None;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                return None;
            }
        }
        i += 2;
    }

    Some(options)
}

/// Parse a flag's value, warning when it is missing or malformed.
fn parse_value<T: FromStr>(flag: &str, value: Option<&String>) -> Option<T> {
    match value {
        Some(v) => {
            let parsed = v.parse().ok();
            if parsed.is_none() {
                log::warn!("ignoring invalid value {:?} for {}, using the default", v, flag);
            }
            parsed
        }
        None => {
            log::warn!("{} expects a value, using the default", flag);
            None
        }
    }
}

fn solve(options: Options) -> SolverResult<()> {
    println!("=================================================");
    println!("  Goofspiel MCCFR Solver");
    println!("=================================================");
    println!();

    let mut config = match &options.config_file {
        Some(path) => {
            println!("Loading configuration from: {}", path);
            SolverConfig::from_json_file(path)?
        }
        None => SolverConfig::default(),
    };
    if let Some(n) = options.deck {
        config = config.with_deck_size(n);
    }
    if let Some(kind) = options.estimator {
        config = config.with_estimator(kind);
    }
    if let Some(threads) = options.threads {
        config = config.with_threads(threads);
    }
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    if let Some(factor) = options.reduction {
        config = config.with_reduction_factor(factor);
    }
    if let Some(cap) = options.max_trials {
        config = config.with_max_trials(cap);
    }
    config.validate()?;

    println!("Deck size: {}", config.deck_size);
    println!("Estimator: {}", config.estimator);
    if config.estimator == EstimatorKind::AveragedOutcome {
        println!("Reduction factor: {}", config.reduction_factor);
        if let Some(cap) = config.max_trials {
            println!("Trial cap: {}", cap);
        }
    }
    println!("Iterations: {}", options.iterations);
    println!(
        "Threads: {}",
        config.num_threads.map_or("auto".to_string(), |t| t.to_string())
    );
    if let Some(s) = config.seed {
        println!("Seed: {}", s);
    }
    println!("Output: {}", options.output_file);
    println!();

    let pb = ProgressBar::new(options.iterations);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let interval = (options.iterations / 100).max(1);
    let solution = goofspiel::run_with_callback(&config, options.iterations, interval, |stats| {
        pb.set_position(stats.iterations);
        pb.set_message(format!("{:.0} it/s", stats.iterations_per_second));
    })?;
    pb.finish_and_clear();

    let mut report = GoofspielReport::new(&config, &solution);

    if options.games > 0 {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let game = Goofspiel::new(config.deck_size);
        let record = evaluate_against_uniform(&game, &solution.average_strategy, options.games, &mut rng)?;
        report = report.with_evaluation(record);
    }

    report.print_summary();

    report.save_json(&options.output_file)?;
    println!("\nSolution saved to: {}", options.output_file);

    Ok(())
}

fn print_help() {
    println!("Goofspiel MCCFR Solver");
    println!();
    println!("Usage: solve_goofspiel [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --deck, -n <N>          Cards per player, 1-16 (default: 5)");
    println!("  --iterations, -i <N>    Training iterations (default: 10000)");
    println!("  --estimator, -e <NAME>  outcome | averaged (default: outcome)");
    println!("  --config, -c <FILE>     Configuration JSON file");
    println!("  --threads, -t <N>       Threads for resampling trials (default: auto)");
    println!("  --seed, -s <N>          Random seed for reproducibility");
    println!("  --reduction <N>         Averaged trial reduction factor (default: 4)");
    println!("  --max-trials <N>        Cap on averaged trials per round");
    println!("  --games, -g <N>         Evaluation games vs uniform opponent (default: 10000, 0 skips)");
    println!("  --output, -o <FILE>     Output file (default: goofspiel_solution.json)");
    println!("  --help, -h              Show this help message");
    println!();
    println!("Examples:");
    println!("  solve_goofspiel --deck 4 --iterations 100000 --seed 42");
    println!("  solve_goofspiel --deck 5 --estimator averaged --threads 8");
    println!("  RUST_LOG=debug solve_goofspiel --deck 3 --iterations 1000");
}
