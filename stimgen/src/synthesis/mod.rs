//! Correlation-targeted point-cloud synthesis.
//!
//! Each attempt runs the same pipeline:
//!
//! 1. Perturb the target according to [`AttemptBanding`] (diversity across
//!    repeated requests for the same target).
//! 2. Draw correlated normal pairs through a Cholesky map
//!    ([`sampler::CorrelationMap`]), falling back to linear mixing when the
//!    covariance is degenerate.
//! 3. Map into the unit square ([`Scaling`]).
//! 4. Jitter crowded points toward the minimum separation ([`spacing`]).
//! 5. Score the Pearson correlation against the unperturbed target and keep
//!    the best attempt, stopping early once inside the acceptance band.

pub mod config;
pub mod engine;
pub mod sampler;
pub mod spacing;
pub mod stats;

pub use config::{Acceptance, AttemptBanding, Scaling, SynthesisConfig};
pub use engine::{synthesize, Synthesis};
pub use spacing::{enforce_min_distance, DistanceMatrix, SpacingReport};
pub use stats::pearson;
