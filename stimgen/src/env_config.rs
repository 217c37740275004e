//! Shared environment configuration for the stimgen binaries.
//!
//! Consolidates `STIMGEN_BASE_PATH`, `RAYON_NUM_THREADS` and `RUST_LOG` reads.

use std::path::PathBuf;

use tracing_subscriber::{fmt, EnvFilter};

/// Read `STIMGEN_BASE_PATH` (default `"."`), chdir, print path. Exits on failure.
pub fn init_base_path() -> PathBuf {
    let base_path = std::env::var("STIMGEN_BASE_PATH").unwrap_or_else(|_| ".".to_string());
    eprintln!("STIMGEN_BASE_PATH={}", base_path);
    let path = PathBuf::from(&base_path);
    if std::env::set_current_dir(&base_path).is_err() {
        eprintln!("Failed to change directory to {}", base_path);
        std::process::exit(1);
    }
    path
}

/// Thread count from `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`, default 8).
pub fn thread_count() -> usize {
    std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(8)
}

/// Build the rayon global pool, tolerating one that is already initialized.
/// Returns thread count.
pub fn init_rayon_threads_lenient() -> usize {
    let num_threads = thread_count();
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .ok(); // May fail if already initialized
    num_threads
}

/// Install the tracing subscriber. Events go to stderr so stdout stays free
/// for JSON output.
///
/// `RUST_LOG` overrides the default filter (`info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stimgen=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
