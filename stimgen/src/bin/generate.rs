//! stimgen-generate: Build every stimulus of a study plan and merge the
//! components and sequence into the study config document.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use stimgen::constants::REPORT_BINS;
use stimgen::design::{assemble, StudyPlan};
use stimgen::document::StudyDocument;
use stimgen::env_config::{init_base_path, init_logging, init_rayon_threads_lenient};
use stimgen::statistics::{save_summary, CorrelationSummary};

#[derive(Parser, Debug)]
#[command(name = "stimgen-generate", version, about)]
struct Args {
    /// Study plan JSON
    #[arg(long, default_value = "stimgen/plans/scatterplot.json")]
    plan: PathBuf,

    /// Study config document to update in place
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Override the plan seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the synthesis preset (accurate | coarse)
    #[arg(long)]
    preset: Option<String>,

    /// Override the attempt budget per stimulus
    #[arg(long)]
    attempts: Option<usize>,

    /// Write the correlation summary as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Histogram bins for the printed summary
    #[arg(long, default_value_t = REPORT_BINS)]
    bins: usize,

    /// Assemble and report without touching the config document
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() {
    let args = Args::parse();
    init_logging();
    init_base_path();
    let threads = init_rayon_threads_lenient();

    let mut plan = StudyPlan::load(&args.plan).unwrap_or_else(|e| {
        eprintln!("Failed to load plan {}: {}", args.plan.display(), e);
        std::process::exit(1);
    });
    if let Some(seed) = args.seed {
        plan.seed = seed;
    }
    if let Some(preset) = args.preset {
        plan.synthesis.preset = preset;
    }
    if let Some(attempts) = args.attempts {
        plan.synthesis.max_attempts = Some(attempts);
    }

    println!("=== stimgen-generate ===");
    println!(
        "Plan: {} topics, {} levels, {} variants, seed={}, preset={}, threads={}",
        plan.topics.len(),
        plan.levels.len(),
        plan.variants,
        plan.seed,
        plan.synthesis.preset,
        threads
    );

    let t0 = Instant::now();
    let design = assemble(&plan).unwrap_or_else(|e| {
        eprintln!("Assembly failed: {}", e);
        std::process::exit(1);
    });
    println!(
        "Assembled {} components, {} schemes in {:.2}s",
        design.components.len(),
        design.schemes.len(),
        t0.elapsed().as_secs_f64()
    );
    let first_ids: Vec<&str> = design.components.ids().take(10).collect();
    println!("Components: {:?}...", first_ids);
    println!(
        "Sequence: {} top-level items",
        design.sequence.components.len()
    );

    match CorrelationSummary::from_table(&design.components, &design.tally, args.bins) {
        Some(summary) => {
            println!("\n{}", "=".repeat(60));
            println!("Correlation Values Histogram");
            println!("{}", "=".repeat(60));
            print!("{}", summary.render_text());
            println!("{}", "=".repeat(60));
            if let Some(path) = &args.report {
                if let Err(e) = save_summary(&summary, path) {
                    eprintln!("Failed to write report: {}", e);
                    std::process::exit(1);
                }
                println!("Report written to {}", path.display());
            }
        }
        None => println!("\nNo correlation values found in components."),
    }

    if args.dry_run {
        println!("Dry run: {} left unchanged.", args.config.display());
        return;
    }

    let result = StudyDocument::load(&args.config).and_then(|mut doc| {
        doc.apply(&design)?;
        doc.save(&args.config)
    });
    if let Err(e) = result {
        eprintln!("Failed to update {}: {}", args.config.display(), e);
        std::process::exit(1);
    }
    println!("Config file {} updated.", args.config.display());
}
