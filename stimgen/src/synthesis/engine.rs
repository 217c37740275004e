//! The attempt loop: draw, scale, space, measure, keep the best.

use rand::Rng;
use tracing::{debug, warn};

use crate::constants::clamp_target;
use crate::error::{Result, StimgenError};
use crate::types::{Point, PointSet};

use super::config::SynthesisConfig;
use super::sampler::{draw_correlated, to_unit_square};
use super::spacing::{enforce_min_distance, SpacingReport};
use super::stats::pearson;

/// A synthesized point set and how it was obtained.
#[derive(Clone, Debug, PartialEq)]
pub struct Synthesis {
    pub points: PointSet,
    /// Pearson correlation of `points`.
    pub achieved: f64,
    /// Clamped target the attempts were scored against.
    pub target: f64,
    /// Attempts consumed (1-based count).
    pub attempts: usize,
    /// Whether `achieved` landed inside the acceptance band.
    pub within_tolerance: bool,
    pub spacing: SpacingReport,
}

impl Synthesis {
    pub fn error(&self) -> f64 {
        (self.achieved - self.target).abs()
    }
}

/// Synthesize a point set whose Pearson correlation approximates `target`.
///
/// Never fails for statistical reasons: if no attempt meets the acceptance
/// band, the lowest-error attempt is returned with `within_tolerance = false`.
/// Errors only on an invalid configuration.
pub fn synthesize<R: Rng>(target: f64, config: &SynthesisConfig, rng: &mut R) -> Result<Synthesis> {
    config.validate()?;
    let target = clamp_target(target);

    let mut best: Option<Synthesis> = None;
    for attempt in 0..config.max_attempts {
        let attempt_target = match config.banding.jitter_width(attempt, config.max_attempts) {
            Some(w) if w > 0.0 => clamp_target(target + rng.random_range(-w..=w)),
            _ => target,
        };

        let mut points: Vec<Point> = draw_correlated(rng, attempt_target, config.n_points);
        to_unit_square(&mut points, config.scaling);
        let spacing = enforce_min_distance(
            &mut points,
            config.min_distance,
            config.jitter_rounds,
            config.jitter_fraction,
            rng,
        );

        let achieved = pearson(&points);
        let error = (achieved - target).abs();
        let improves = best.as_ref().map_or(true, |b| error < b.error());
        if improves {
            let within_tolerance = config.acceptance.accepts(error);
            best = Some(Synthesis {
                points,
                achieved,
                target,
                attempts: attempt + 1,
                within_tolerance,
                spacing,
            });
            if within_tolerance {
                break;
            }
        }
    }

    let mut result =
        best.ok_or_else(|| StimgenError::invalid("max_attempts", config.max_attempts))?;
    if result.within_tolerance {
        debug!(
            target = result.target,
            achieved = result.achieved,
            attempts = result.attempts,
            "synthesis accepted"
        );
    } else {
        result.attempts = config.max_attempts;
        warn!(
            target = result.target,
            achieved = result.achieved,
            error = result.error(),
            tolerance = config.tolerance(),
            "synthesis tolerance miss; returning closest attempt"
        );
    }
    if !result.spacing.resolved() {
        debug!(
            violations = result.spacing.final_violations(),
            min_distance = result.spacing.min_distance,
            "spacing not fully resolved"
        );
    }
    Ok(result)
}
