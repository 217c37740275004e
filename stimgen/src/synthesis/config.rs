//! Synthesizer configuration and named presets.
//!
//! | Preset | Tolerance | Banding | Scaling | Jitter | Attempts |
//! |--------|-----------|---------|---------|--------|----------|
//! | [`SynthesisConfig::accurate`] | ±0.02 | exact / ±0.01 / ±0.02 | 3σ window, min–max fallback | 3 rounds × 0.3·d | 200 |
//! | [`SynthesisConfig::coarse`] | ±0.1 | ±0.05 then full ±0.1 band | min–max | 5 rounds × 0.5·d | 50 |

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Result, StimgenError};

/// How the per-attempt target is perturbed around the requested one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AttemptBanding {
    /// First quarter of attempts uses the target exactly, second quarter
    /// jitters by ±0.01, the rest by ±0.02.
    Graduated,
    /// First half jitters by ±spread/2, second half draws uniformly from the
    /// full ±spread band.
    Coarse { spread: f64 },
}

impl AttemptBanding {
    /// Half-width of the uniform perturbation for `attempt` out of `max_attempts`.
    /// `None` means the target is used unperturbed.
    pub fn jitter_width(&self, attempt: usize, max_attempts: usize) -> Option<f64> {
        match *self {
            AttemptBanding::Graduated => {
                if attempt < max_attempts / 4 {
                    None
                } else if attempt < max_attempts / 2 {
                    Some(0.01)
                } else {
                    Some(0.02)
                }
            }
            AttemptBanding::Coarse { spread } => {
                if attempt < max_attempts / 2 {
                    Some(spread * 0.5)
                } else {
                    Some(spread)
                }
            }
        }
    }
}

/// How standardized samples are mapped into the unit square.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Scaling {
    /// `z / sigmas + 0.5`, clipped; falls back to min–max when either axis
    /// spans less than `min_span`.
    SigmaWindow { sigmas: f64, min_span: f64 },
    /// Per-axis min–max rescaling.
    MinMax,
}

/// When an attempt is good enough to stop early.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Acceptance {
    /// Absolute error to the requested target.
    Tolerance(f64),
}

impl Acceptance {
    pub fn accepts(&self, error: f64) -> bool {
        match *self {
            Acceptance::Tolerance(tol) => error <= tol,
        }
    }

    pub fn tolerance(&self) -> f64 {
        match *self {
            Acceptance::Tolerance(tol) => tol,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    pub n_points: usize,
    pub min_distance: f64,
    pub max_attempts: usize,
    pub acceptance: Acceptance,
    pub banding: AttemptBanding,
    pub scaling: Scaling,
    /// Upper bound on spacing refinement rounds per attempt.
    pub jitter_rounds: usize,
    /// Jitter standard deviation as a fraction of `min_distance`.
    pub jitter_fraction: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self::accurate()
    }
}

impl SynthesisConfig {
    /// ±0.02 preset used for every study stimulus.
    pub fn accurate() -> Self {
        Self {
            n_points: DEFAULT_N_POINTS,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_attempts: ACCURATE_MAX_ATTEMPTS,
            acceptance: Acceptance::Tolerance(ACCURATE_TOLERANCE),
            banding: AttemptBanding::Graduated,
            scaling: Scaling::SigmaWindow {
                sigmas: SIGMA_WINDOW,
                min_span: MIN_AXIS_SPAN,
            },
            jitter_rounds: 3,
            jitter_fraction: 0.3,
        }
    }

    /// ±0.1 preset: cheaper, more varied stimuli around a level.
    pub fn coarse() -> Self {
        Self {
            n_points: DEFAULT_N_POINTS,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_attempts: COARSE_MAX_ATTEMPTS,
            acceptance: Acceptance::Tolerance(COARSE_TOLERANCE),
            banding: AttemptBanding::Coarse {
                spread: COARSE_TOLERANCE,
            },
            scaling: Scaling::MinMax,
            jitter_rounds: 5,
            jitter_fraction: 0.5,
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "accurate" => Some(Self::accurate()),
            "coarse" => Some(Self::coarse()),
            _ => None,
        }
    }

    pub fn with_n_points(mut self, n_points: usize) -> Self {
        self.n_points = n_points;
        self
    }

    pub fn with_min_distance(mut self, min_distance: f64) -> Self {
        self.min_distance = min_distance;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.acceptance = Acceptance::Tolerance(tolerance);
        self
    }

    pub fn with_banding(mut self, banding: AttemptBanding) -> Self {
        self.banding = banding;
        self
    }

    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_jitter(mut self, rounds: usize, fraction: f64) -> Self {
        self.jitter_rounds = rounds;
        self.jitter_fraction = fraction;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.acceptance.tolerance()
    }

    /// Reject shapes the synthesizer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.n_points == 0 {
            return Err(StimgenError::invalid("n_points", self.n_points));
        }
        if !(self.min_distance.is_finite() && self.min_distance > 0.0) {
            return Err(StimgenError::invalid("min_distance", self.min_distance));
        }
        if self.max_attempts == 0 {
            return Err(StimgenError::invalid("max_attempts", self.max_attempts));
        }
        let tol = self.tolerance();
        if !(tol.is_finite() && tol >= 0.0) {
            return Err(StimgenError::invalid("tolerance", tol));
        }
        if !(self.jitter_fraction.is_finite() && self.jitter_fraction >= 0.0) {
            return Err(StimgenError::invalid("jitter_fraction", self.jitter_fraction));
        }
        if let Scaling::SigmaWindow { sigmas, min_span } = self.scaling {
            if !(sigmas.is_finite() && sigmas > 0.0) {
                return Err(StimgenError::invalid("sigmas", sigmas));
            }
            if !(0.0..=1.0).contains(&min_span) {
                return Err(StimgenError::invalid("min_span", min_span));
            }
        }
        if let AttemptBanding::Coarse { spread } = self.banding {
            if !(spread.is_finite() && spread >= 0.0) {
                return Err(StimgenError::invalid("spread", spread));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graduated_bands() {
        let b = AttemptBanding::Graduated;
        assert_eq!(b.jitter_width(0, 200), None);
        assert_eq!(b.jitter_width(49, 200), None);
        assert_eq!(b.jitter_width(50, 200), Some(0.01));
        assert_eq!(b.jitter_width(99, 200), Some(0.01));
        assert_eq!(b.jitter_width(100, 200), Some(0.02));
        assert_eq!(b.jitter_width(199, 200), Some(0.02));
    }

    #[test]
    fn test_coarse_bands() {
        let b = AttemptBanding::Coarse { spread: 0.1 };
        assert_eq!(b.jitter_width(0, 50), Some(0.05));
        assert_eq!(b.jitter_width(25, 50), Some(0.1));
    }

    #[test]
    fn test_presets_validate() {
        assert!(SynthesisConfig::accurate().validate().is_ok());
        assert!(SynthesisConfig::coarse().validate().is_ok());
        assert_eq!(SynthesisConfig::preset("coarse"), Some(SynthesisConfig::coarse()));
        assert!(SynthesisConfig::preset("exact").is_none());
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let base = SynthesisConfig::accurate();
        assert!(base.with_n_points(0).validate().is_err());
        assert!(base.with_min_distance(0.0).validate().is_err());
        assert!(base.with_min_distance(f64::NAN).validate().is_err());
        assert!(base.with_max_attempts(0).validate().is_err());
        assert!(base.with_tolerance(-0.1).validate().is_err());
    }

    #[test]
    fn test_config_json_shape() {
        let json = serde_json::to_value(SynthesisConfig::coarse()).unwrap();
        assert_eq!(json["banding"]["kind"], "coarse");
        assert_eq!(json["scaling"]["kind"], "min_max");
        assert_eq!(json["acceptance"]["kind"], "tolerance");
    }
}
