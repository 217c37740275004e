//! Study plan: the externally supplied description of what to generate.
//!
//! Loaded from JSON. Every numeric knob has a default matching the
//! scatterplot study, so a minimal plan only lists its topics.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_SEED;
use crate::error::{Result, StimgenError};
use crate::synthesis::SynthesisConfig;
use crate::types::{Direction, Topic};

use super::sequence::Group;

/// Synthesizer preset plus per-field overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthesisSettings {
    #[serde(default = "SynthesisSettings::default_preset")]
    pub preset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_points: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

impl SynthesisSettings {
    fn default_preset() -> String {
        "accurate".to_string()
    }

    /// Resolve the preset and apply overrides.
    pub fn resolve(&self) -> Result<SynthesisConfig> {
        let mut config = SynthesisConfig::preset(&self.preset)
            .ok_or_else(|| StimgenError::invalid("synthesis.preset", &self.preset))?;
        if let Some(n) = self.n_points {
            config = config.with_n_points(n);
        }
        if let Some(d) = self.min_distance {
            config = config.with_min_distance(d);
        }
        if let Some(k) = self.max_attempts {
            config = config.with_max_attempts(k);
        }
        if let Some(t) = self.tolerance {
            config = config.with_tolerance(t);
        }
        config.validate()?;
        Ok(config)
    }
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            preset: Self::default_preset(),
            n_points: None,
            min_distance: None,
            max_attempts: None,
            tolerance: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    /// Seed of the global stream and salt of per-cell seeds.
    #[serde(default = "StudyPlan::default_seed")]
    pub seed: u64,
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub example_topics: Vec<Topic>,
    #[serde(default = "StudyPlan::default_levels")]
    pub levels: Vec<u32>,
    #[serde(default)]
    pub direction: Direction,
    /// Plain stimuli per level.
    #[serde(default = "StudyPlan::default_plain_per_level")]
    pub plain_per_level: usize,
    /// Independent labelled stimuli per (level, topic).
    #[serde(default = "StudyPlan::default_variants")]
    pub variants: usize,
    /// Half-width of the band targets are spread over around each level.
    #[serde(default = "StudyPlan::default_target_band")]
    pub target_band: f64,
    /// Label delay of the unrevealed trial (label shown as the stimulus ends).
    #[serde(default = "StudyPlan::default_unrevealed_delay")]
    pub unrevealed_delay: f64,
    #[serde(default = "StudyPlan::default_reveal_delays")]
    pub reveal_delays: Vec<f64>,
    #[serde(default = "StudyPlan::default_example_level")]
    pub example_level: u32,
    #[serde(default)]
    pub example_delays: Vec<f64>,
    #[serde(default = "StudyPlan::default_stimulus_seconds")]
    pub stimulus_seconds: f64,
    #[serde(default)]
    pub synthesis: SynthesisSettings,
    /// Reusable templates, copied to `baseComponents` verbatim.
    #[serde(default)]
    pub base_components: IndexMap<String, Value>,
    /// Fixed pages and questionnaires, copied to `components` verbatim.
    #[serde(default)]
    pub static_components: IndexMap<String, Value>,
    /// Sequence template with slot markers; see [`super::sequence::expand_template`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_url: Option<String>,
}

impl StudyPlan {
    fn default_seed() -> u64 {
        DEFAULT_SEED
    }
    fn default_levels() -> Vec<u32> {
        vec![2, 4, 6, 8]
    }
    fn default_plain_per_level() -> usize {
        3
    }
    fn default_variants() -> usize {
        2
    }
    fn default_target_band() -> f64 {
        0.04
    }
    fn default_unrevealed_delay() -> f64 {
        5.0
    }
    fn default_reveal_delays() -> Vec<f64> {
        vec![0.0, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]
    }
    fn default_example_level() -> u32 {
        5
    }
    fn default_stimulus_seconds() -> f64 {
        5.0
    }

    /// Plan with default settings for the given topics.
    pub fn with_topics(topics: Vec<Topic>) -> Self {
        Self {
            seed: Self::default_seed(),
            topics,
            example_topics: Vec::new(),
            levels: Self::default_levels(),
            direction: Direction::Positive,
            plain_per_level: Self::default_plain_per_level(),
            variants: Self::default_variants(),
            target_band: Self::default_target_band(),
            unrevealed_delay: Self::default_unrevealed_delay(),
            reveal_delays: Self::default_reveal_delays(),
            example_level: Self::default_example_level(),
            example_delays: Vec::new(),
            stimulus_seconds: Self::default_stimulus_seconds(),
            synthesis: SynthesisSettings::default(),
            base_components: IndexMap::new(),
            static_components: IndexMap::new(),
            sequence: None,
            completion_url: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| StimgenError::io(path, e))?;
        let plan: StudyPlan = serde_json::from_str(&text)?;
        Ok(plan)
    }

    /// Topics sharing one correlation level within a scheme.
    pub fn topics_per_level(&self) -> usize {
        self.topics.len() / self.levels.len().max(1)
    }

    /// Reject unbalanced or malformed designs before anything is generated.
    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(StimgenError::EmptyLevels);
        }
        let mut seen = HashSet::new();
        for &level in &self.levels {
            if !seen.insert(level) {
                return Err(StimgenError::invalid("levels", format!("duplicate level {level}")));
            }
        }
        if self.topics.is_empty() {
            return Err(StimgenError::invalid("topics", "no topics"));
        }
        if self.topics.len() % self.levels.len() != 0 {
            return Err(StimgenError::UnevenTopicGroups {
                topics: self.topics.len(),
                levels: self.levels.len(),
            });
        }
        if self.variants == 0 {
            return Err(StimgenError::NoVariants);
        }
        if self.reveal_delays.is_empty() {
            return Err(StimgenError::EmptyRevealDelays);
        }
        if self.example_delays.len() != self.example_topics.len() {
            return Err(StimgenError::MismatchedLengths {
                what: "example_topics / example_delays",
                left: self.example_topics.len(),
                right: self.example_delays.len(),
            });
        }
        if !(self.target_band.is_finite() && self.target_band >= 0.0) {
            return Err(StimgenError::invalid("target_band", self.target_band));
        }
        let all_delays = self
            .reveal_delays
            .iter()
            .chain(self.example_delays.iter())
            .chain(std::iter::once(&self.unrevealed_delay));
        for &d in all_delays {
            if !(d.is_finite() && d >= 0.0) {
                return Err(StimgenError::invalid("delay", d));
            }
        }
        let mut delays = HashSet::new();
        for &d in self.reveal_delays.iter().chain(std::iter::once(&self.unrevealed_delay)) {
            if !delays.insert(d.to_bits()) {
                return Err(StimgenError::invalid("reveal_delays", format!("repeated delay {d}")));
            }
        }
        self.synthesis.resolve()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(n: usize) -> Vec<Topic> {
        (0..n)
            .map(|i| Topic::new(format!("Topic {i}"), format!("X{i}"), format!("Y{i}")))
            .collect()
    }

    #[test]
    fn test_minimal_plan_defaults() {
        let json = r#"{ "topics": [
            { "label": "a", "x": "b", "y": "c" },
            { "label": "d", "x": "e", "y": "f" },
            { "label": "g", "x": "h", "y": "i" },
            { "label": "j", "x": "k", "y": "l" }
        ] }"#;
        let plan: StudyPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.seed, 42);
        assert_eq!(plan.levels, vec![2, 4, 6, 8]);
        assert_eq!(plan.variants, 2);
        assert_eq!(plan.reveal_delays.len(), 8);
        assert_eq!(plan.unrevealed_delay, 5.0);
        assert_eq!(plan.direction, Direction::Positive);
        assert_eq!(plan.synthesis.resolve().unwrap(), SynthesisConfig::accurate());
        assert!(plan.example_topics.is_empty());
        assert!(plan.example_delays.is_empty());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_minimal_plan_matches_with_topics() {
        let json = r#"{ "topics": [ { "label": "a", "x": "b", "y": "c" } ] }"#;
        let parsed: StudyPlan = serde_json::from_str(json).unwrap();
        let built = StudyPlan::with_topics(vec![Topic::new("a", "b", "c")]);
        assert_eq!(parsed.example_delays, built.example_delays);
        assert_eq!(parsed.example_topics.len(), built.example_topics.len());
    }

    #[test]
    fn test_validate_balanced() {
        assert!(StudyPlan::with_topics(topics(12)).validate().is_ok());
    }

    #[test]
    fn test_validate_uneven_topics() {
        let err = StudyPlan::with_topics(topics(10)).validate().unwrap_err();
        assert!(matches!(
            err,
            StimgenError::UnevenTopicGroups { topics: 10, levels: 4 }
        ));
    }

    #[test]
    fn test_validate_mismatched_examples() {
        let mut plan = StudyPlan::with_topics(topics(4));
        plan.example_topics = topics(2);
        plan.example_delays = vec![2.5];
        assert!(matches!(
            plan.validate().unwrap_err(),
            StimgenError::MismatchedLengths { left: 2, right: 1, .. }
        ));
    }

    #[test]
    fn test_validate_rejects_shapes() {
        let mut plan = StudyPlan::with_topics(topics(4));
        plan.levels.clear();
        assert!(matches!(plan.validate().unwrap_err(), StimgenError::EmptyLevels));

        let mut plan = StudyPlan::with_topics(topics(4));
        plan.variants = 0;
        assert!(matches!(plan.validate().unwrap_err(), StimgenError::NoVariants));

        let mut plan = StudyPlan::with_topics(topics(4));
        plan.reveal_delays.clear();
        assert!(matches!(plan.validate().unwrap_err(), StimgenError::EmptyRevealDelays));

        let mut plan = StudyPlan::with_topics(topics(4));
        plan.reveal_delays.push(5.0);
        assert!(plan.validate().is_err());

        let mut plan = StudyPlan::with_topics(topics(4));
        plan.levels = vec![2, 2, 4, 6];
        assert!(plan.validate().is_err());

        let mut plan = StudyPlan::with_topics(topics(4));
        plan.synthesis.preset = "exact".into();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_synthesis_overrides() {
        let settings = SynthesisSettings {
            preset: "coarse".into(),
            n_points: Some(30),
            max_attempts: Some(10),
            ..SynthesisSettings::default()
        };
        let cfg = settings.resolve().unwrap();
        assert_eq!(cfg.n_points, 30);
        assert_eq!(cfg.max_attempts, 10);
        assert_eq!(cfg.tolerance(), 0.1);
    }
}
