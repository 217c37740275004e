//! stimgen-synth: Synthesize one point set and print it as JSON on stdout.

use clap::Parser;
use serde_json::json;

use stimgen::constants::DEFAULT_SEED;
use stimgen::env_config::init_logging;
use stimgen::seeding::global_rng;
use stimgen::synthesis::{synthesize, SynthesisConfig};

#[derive(Parser, Debug)]
#[command(name = "stimgen-synth", version, about)]
struct Args {
    /// Target Pearson correlation (clamped to [-0.99, 0.99])
    #[arg(long, allow_hyphen_values = true)]
    target: f64,

    /// Synthesizer preset (accurate | coarse)
    #[arg(long, default_value = "accurate")]
    preset: String,

    #[arg(long)]
    points: Option<usize>,

    #[arg(long)]
    min_distance: Option<f64>,

    #[arg(long)]
    attempts: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

fn main() {
    let args = Args::parse();
    init_logging();

    let mut config = SynthesisConfig::preset(&args.preset).unwrap_or_else(|| {
        eprintln!("Unknown preset '{}'. Available: accurate, coarse", args.preset);
        std::process::exit(1);
    });
    if let Some(n) = args.points {
        config = config.with_n_points(n);
    }
    if let Some(d) = args.min_distance {
        config = config.with_min_distance(d);
    }
    if let Some(k) = args.attempts {
        config = config.with_max_attempts(k);
    }

    let mut rng = global_rng(args.seed);
    let result = synthesize(args.target, &config, &mut rng).unwrap_or_else(|e| {
        eprintln!("Synthesis failed: {}", e);
        std::process::exit(1);
    });

    let out = json!({
        "target": result.target,
        "correlation": result.achieved,
        "attempts": result.attempts,
        "within_tolerance": result.within_tolerance,
        "min_pairwise_distance": result.spacing.min_distance,
        "spacing_violations": result.spacing.final_violations(),
        "coordinates": result.points,
    });
    match serde_json::to_string_pretty(&out) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Failed to serialize result: {}", e);
            std::process::exit(1);
        }
    }
}
