//! # stimgen
//!
//! Correlation-targeted scatterplot stimuli and study sequences.
//!
//! Generates point clouds whose Pearson correlation hits a requested target,
//! and arranges them into a counterbalanced presentation sequence for a
//! correlation-judgment study.
//!
//! ## Pipeline
//!
//! | Step | Rust module | Description |
//! |------|-------------|-------------|
//! | 1 | [`design::plan`] | Load and validate the study plan (topics, levels, delays, synthesis preset) |
//! | 2 | [`synthesis`] | One point set per condition cell: Cholesky draw, scaling, spacing jitter, best-of-N |
//! | 3 | [`design::cells`] | Plain, example, labelled and belief components; labelled cells reused across delays |
//! | 4 | [`design::latin`] | `#levels × #variants` schemes by cyclic level rotation and alternating variants |
//! | 5 | [`design::sequence`] | Slot expansion of the sequence template into the final group tree |
//! | 6 | [`document`] | Merge into the study config document |
//! | - | [`sweep`] | Empirical hit rate and error per target over many seeds |
//!
//! ## Random sources
//!
//! Two policies coexist and never share state:
//!
//! - **Global stream** ([`seeding::global_rng`]): plain stimuli, then example
//!   stimuli, drawn sequentially from one ChaCha8 stream seeded by the plan.
//! - **Per-cell seeds** ([`seeding::CellKey`]): each labelled (level, topic,
//!   variant) cell gets its own stream derived from the key, so its point set
//!   does not depend on what else is generated or in which order. This is what
//!   lets labelled cells run in parallel.
//!
//! ## Failure model
//!
//! Synthesis never fails for statistical reasons: a tolerance miss returns the
//! closest attempt and is counted in [`design::SynthesisTally`]. Malformed plans
//! (uneven topic groups, mismatched lists, unknown slots) fail before anything
//! is generated.

pub mod constants;
pub mod design;
pub mod document;
pub mod env_config;
pub mod error;
pub mod seeding;
pub mod statistics;
pub mod sweep;
pub mod synthesis;
pub mod types;

pub use error::{Result, StimgenError};
