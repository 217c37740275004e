//! Synthesis and design constants.
//!
//! Numeric defaults shared by the synthesizer presets and the study plan:
//! - correlation targets are clamped to [`MIN_TARGET`]..=[`MAX_TARGET`]
//! - a level `k` maps to target `k * `[`LEVEL_STEP`] (2 → 0.2, 8 → 0.8)
//! - point sets live in the unit square and default to [`DEFAULT_N_POINTS`] points

/// Lower clamp for any correlation target.
pub const MIN_TARGET: f64 = -0.99;

/// Upper clamp for any correlation target.
pub const MAX_TARGET: f64 = 0.99;

/// Correlation per discrete level step.
pub const LEVEL_STEP: f64 = 0.1;

/// Smallest magnitude an evenly spread target may take (keeps the sign stable).
pub const MIN_SPREAD_MAGNITUDE: f64 = 0.01;

/// Default number of points per stimulus.
pub const DEFAULT_N_POINTS: usize = 50;

/// Default minimum pairwise separation, as a fraction of the unit square side.
pub const DEFAULT_MIN_DISTANCE: f64 = 0.04;

/// Accurate preset: absolute error band around the target.
pub const ACCURATE_TOLERANCE: f64 = 0.02;

/// Accurate preset: attempt budget.
pub const ACCURATE_MAX_ATTEMPTS: usize = 200;

/// Coarse preset: absolute error band around the target.
pub const COARSE_TOLERANCE: f64 = 0.1;

/// Coarse preset: attempt budget.
pub const COARSE_MAX_ATTEMPTS: usize = 50;

/// Width of the σ window used to map standardized samples into [0, 1].
pub const SIGMA_WINDOW: f64 = 3.0;

/// Below this span on either axis the σ window is replaced by min–max scaling.
pub const MIN_AXIS_SPAN: f64 = 0.5;

/// Floor for `1 - r²` in the linear-mixing fallback.
pub const MIN_RESIDUAL_VARIANCE: f64 = 0.01;

/// Default seed for the global stream (plain and example stimuli).
pub const DEFAULT_SEED: u64 = 42;

/// Number of histogram bins in the correlation report.
pub const REPORT_BINS: usize = 100;

/// Slot markers recognised in a sequence template.
pub const SLOT_BELIEFS: &str = "@beliefs";
pub const SLOT_PLAIN: &str = "@plain";
pub const SLOT_EXAMPLES: &str = "@examples";
pub const SLOT_SCHEMES: &str = "@schemes";

/// Clamp a correlation target to the numerically safe range.
#[inline]
pub fn clamp_target(r: f64) -> f64 {
    if r.is_nan() {
        return 0.0;
    }
    r.clamp(MIN_TARGET, MAX_TARGET)
}
