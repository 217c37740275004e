//! Condition-cell enumeration and stimulus generation.
//!
//! | Family | Random source | Id |
//! |--------|---------------|----|
//! | plain | global stream | `phase1_{level}_{i}_{dir}` |
//! | labelled | per-cell seed `(level, topic, variant)` | `phase2_{topic}_{level}_{variant}_{delay}` |
//! | example | global stream, after plain | `phase2_example_{k}` |
//! | belief | none | `phase3_{topic}` |
//!
//! A labelled stimulus is synthesized once per (level, topic, variant) and the
//! same point set and correlation are attached to every delay condition.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::seeding::{CellKey, StimRng};
use crate::synthesis::{synthesize, Synthesis, SynthesisConfig};
use crate::types::spread_targets;

use super::components::{
    BeliefParameters, Component, ComponentTable, LabeledParameters, PlainParameters,
};
use super::plan::StudyPlan;

/// Render a reveal delay for use inside an id: shortest form (`0`, `1`, `1.5`).
pub fn format_delay(delay: f64) -> String {
    format!("{}", delay)
}

pub fn plain_id(level: u32, index: usize, plan: &StudyPlan) -> String {
    format!("phase1_{}_{}_{}", level, index, plan.direction.as_str())
}

pub fn labeled_id(topic: usize, level: u32, variant: usize, delay: f64) -> String {
    format!("phase2_{}_{}_{}_{}", topic, level, variant, format_delay(delay))
}

/// Id of the unrevealed trial. The delay always carries a decimal point
/// (`5.0`), keeping ids stable against configs that were already deployed.
pub fn unrevealed_id(topic: usize, level: u32, variant: usize, delay: f64) -> String {
    format!("phase2_{}_{}_{}_{:?}", topic, level, variant, delay)
}

pub fn example_id(k: usize) -> String {
    format!("phase2_example_{}", k + 1)
}

pub fn belief_id(topic: usize) -> String {
    format!("phase3_{}", topic)
}

/// One synthesized stimulus with the cell metadata it was generated for.
#[derive(Clone, Debug)]
pub struct GeneratedStimulus {
    pub level: u32,
    /// Topic index (labelled) or replicate index (plain, example).
    pub index: usize,
    pub variant: usize,
    pub target: f64,
    pub synthesis: Synthesis,
}

/// One labelled trial: a stimulus shown with a particular label delay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConditionCell {
    pub key: CellKey,
    pub delay: f64,
    pub revealed: bool,
}

impl ConditionCell {
    pub fn id(&self) -> String {
        let CellKey { level, topic, variant } = self.key;
        if self.revealed {
            labeled_id(topic, level, variant, self.delay)
        } else {
            unrevealed_id(topic, level, variant, self.delay)
        }
    }
}

/// Every labelled cell key, in (level, topic, variant) order.
pub fn labeled_keys(plan: &StudyPlan) -> Vec<CellKey> {
    let mut keys = Vec::with_capacity(plan.levels.len() * plan.topics.len() * plan.variants);
    for &level in &plan.levels {
        for topic in 0..plan.topics.len() {
            for variant in 0..plan.variants {
                keys.push(CellKey::new(level, topic, variant));
            }
        }
    }
    keys
}

/// Delays a labelled stimulus is shown at, flagged revealed or not:
/// unrevealed first, then reveal delays.
pub fn delays(plan: &StudyPlan) -> Vec<(f64, bool)> {
    std::iter::once((plan.unrevealed_delay, false))
        .chain(plan.reveal_delays.iter().map(|&d| (d, true)))
        .collect()
}

/// Plain stimuli, drawn sequentially from the global stream.
pub fn generate_plain(
    plan: &StudyPlan,
    config: &SynthesisConfig,
    rng: &mut StimRng,
) -> Result<Vec<GeneratedStimulus>> {
    let mut out = Vec::with_capacity(plan.levels.len() * plan.plain_per_level);
    for &level in &plan.levels {
        let targets = spread_targets(level, plan.direction, plan.target_band, plan.plain_per_level);
        for (index, &target) in targets.iter().enumerate() {
            let synthesis = synthesize(target, config, rng)?;
            out.push(GeneratedStimulus {
                level,
                index,
                variant: 0,
                target,
                synthesis,
            });
        }
    }
    debug!(count = out.len(), "plain stimuli generated");
    Ok(out)
}

/// Example stimuli, drawn from the global stream.
pub fn generate_examples(
    plan: &StudyPlan,
    config: &SynthesisConfig,
    rng: &mut StimRng,
) -> Result<Vec<GeneratedStimulus>> {
    let targets = spread_targets(
        plan.example_level,
        plan.direction,
        plan.target_band,
        plan.example_topics.len(),
    );
    let mut out = Vec::with_capacity(targets.len());
    for (index, &target) in targets.iter().enumerate() {
        let synthesis = synthesize(target, config, rng)?;
        out.push(GeneratedStimulus {
            level: plan.example_level,
            index,
            variant: 0,
            target,
            synthesis,
        });
    }
    debug!(count = out.len(), "example stimuli generated");
    Ok(out)
}

/// Target for a labelled cell: targets are spread over the level band across
/// all (topic, variant) pairs of that level.
pub fn labeled_target(plan: &StudyPlan, key: &CellKey) -> f64 {
    let count = plan.topics.len() * plan.variants;
    let targets = spread_targets(key.level, plan.direction, plan.target_band, count);
    targets[key.topic * plan.variants + key.variant]
}

/// Synthesize the stimulus of one labelled cell from its own seed.
pub fn generate_labeled_one(
    plan: &StudyPlan,
    config: &SynthesisConfig,
    key: CellKey,
) -> Result<GeneratedStimulus> {
    let target = labeled_target(plan, &key);
    let mut rng = key.rng(plan.seed);
    let synthesis = synthesize(target, config, &mut rng)?;
    Ok(GeneratedStimulus {
        level: key.level,
        index: key.topic,
        variant: key.variant,
        target,
        synthesis,
    })
}

/// Labelled stimuli, one per (level, topic, variant). Cells are independent,
/// so they are generated in parallel; output order follows [`labeled_keys`].
pub fn generate_labeled(plan: &StudyPlan, config: &SynthesisConfig) -> Result<Vec<GeneratedStimulus>> {
    let start = Instant::now();
    let keys = labeled_keys(plan);
    let out: Vec<GeneratedStimulus> = keys
        .into_par_iter()
        .map(|key| generate_labeled_one(plan, config, key))
        .collect::<Result<Vec<_>>>()?;
    info!(
        count = out.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "labelled stimuli generated"
    );
    Ok(out)
}

// ── Component construction ──

pub fn insert_plain(
    table: &mut ComponentTable,
    plan: &StudyPlan,
    stimuli: &[GeneratedStimulus],
) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(stimuli.len());
    for s in stimuli {
        let id = plain_id(s.level, s.index, plan);
        table.insert_stimulus(
            id.clone(),
            Component::plain(PlainParameters {
                coordinates: s.synthesis.points.clone(),
                example: false,
                correlation: s.synthesis.achieved,
                seconds: plan.stimulus_seconds,
            }),
        )?;
        ids.push(id);
    }
    Ok(ids)
}

pub fn insert_examples(
    table: &mut ComponentTable,
    plan: &StudyPlan,
    stimuli: &[GeneratedStimulus],
) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(stimuli.len());
    for (k, s) in stimuli.iter().enumerate() {
        let topic = &plan.example_topics[k];
        let id = example_id(k);
        table.insert_stimulus(
            id.clone(),
            Component::labeled(LabeledParameters {
                coordinates: s.synthesis.points.clone(),
                example: true,
                correlation: s.synthesis.achieved,
                label: topic.label.clone(),
                x: topic.x.clone(),
                y: topic.y.clone(),
                corr: plan.example_level,
                exp: 0,
                label_idx: None,
                direction: plan.direction,
                seconds: plan.stimulus_seconds,
                label_seconds: plan.example_delays[k],
            }),
        )?;
        ids.push(id);
    }
    Ok(ids)
}

pub fn insert_beliefs(table: &mut ComponentTable, plan: &StudyPlan) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(plan.topics.len());
    for (topic_idx, topic) in plan.topics.iter().enumerate() {
        let id = belief_id(topic_idx);
        table.insert_stimulus(
            id.clone(),
            Component::belief(BeliefParameters {
                label: topic.label.clone(),
                x: topic.x.clone(),
                y: topic.y.clone(),
            }),
        )?;
        ids.push(id);
    }
    Ok(ids)
}

/// Expand each labelled stimulus over every delay. All delay conditions of a
/// cell share its coordinates and correlation.
pub fn insert_labeled(
    table: &mut ComponentTable,
    plan: &StudyPlan,
    stimuli: &[GeneratedStimulus],
) -> Result<Vec<ConditionCell>> {
    let delays = delays(plan);
    let mut cells = Vec::with_capacity(stimuli.len() * delays.len());
    for s in stimuli {
        let topic = &plan.topics[s.index];
        let key = CellKey::new(s.level, s.index, s.variant);
        for &(delay, revealed) in &delays {
            let cell = ConditionCell { key, delay, revealed };
            table.insert_stimulus(
                cell.id(),
                Component::labeled(LabeledParameters {
                    coordinates: s.synthesis.points.clone(),
                    example: false,
                    correlation: s.synthesis.achieved,
                    label: topic.label.clone(),
                    x: topic.x.clone(),
                    y: topic.y.clone(),
                    corr: s.level,
                    exp: s.variant,
                    label_idx: Some(s.index),
                    direction: plan.direction,
                    seconds: plan.stimulus_seconds,
                    label_seconds: delay,
                }),
            )?;
            cells.push(cell);
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeding::global_rng;
    use crate::types::Topic;

    fn plan(n_topics: usize) -> StudyPlan {
        let topics = (0..n_topics)
            .map(|i| Topic::new(format!("T{i}"), format!("X{i}"), format!("Y{i}")))
            .collect();
        let mut plan = StudyPlan::with_topics(topics);
        plan.synthesis.max_attempts = Some(40);
        plan
    }

    #[test]
    fn test_ids() {
        let p = plan(4);
        assert_eq!(plain_id(6, 2, &p), "phase1_6_2_pos");
        assert_eq!(unrevealed_id(3, 4, 1, 5.0), "phase2_3_4_1_5.0");
        assert_eq!(unrevealed_id(3, 4, 1, 4.5), "phase2_3_4_1_4.5");
        assert_eq!(labeled_id(3, 4, 1, 1.0), "phase2_3_4_1_1");
        assert_eq!(labeled_id(3, 4, 1, 1.5), "phase2_3_4_1_1.5");
        assert_eq!(labeled_id(0, 2, 0, 0.0), "phase2_0_2_0_0");
        assert_eq!(example_id(0), "phase2_example_1");
        assert_eq!(belief_id(11), "phase3_11");
    }

    #[test]
    fn test_labeled_keys_order() {
        let p = plan(4);
        let keys = labeled_keys(&p);
        assert_eq!(keys.len(), 4 * 4 * 2);
        assert_eq!(keys[0], CellKey::new(2, 0, 0));
        assert_eq!(keys[1], CellKey::new(2, 0, 1));
        assert_eq!(keys[2], CellKey::new(2, 1, 0));
        assert_eq!(keys[8], CellKey::new(4, 0, 0));
    }

    #[test]
    fn test_labeled_targets_spread_over_band() {
        let p = plan(4);
        let first = labeled_target(&p, &CellKey::new(6, 0, 0));
        let last = labeled_target(&p, &CellKey::new(6, 3, 1));
        assert!((first - 0.56).abs() < 1e-12);
        assert!((last - 0.64).abs() < 1e-12);
    }

    #[test]
    fn test_labeled_cell_is_order_independent() {
        let p = plan(4);
        let cfg = p.synthesis.resolve().unwrap();
        let key = CellKey::new(4, 2, 1);
        let direct = generate_labeled_one(&p, &cfg, key).unwrap();
        let all = generate_labeled(&p, &cfg).unwrap();
        let pos = labeled_keys(&p).iter().position(|k| *k == key).unwrap();
        assert_eq!(all[pos].synthesis, direct.synthesis);
    }

    #[test]
    fn test_plain_stream_is_sequential() {
        let p = plan(4);
        let cfg = p.synthesis.resolve().unwrap();
        let a = generate_plain(&p, &cfg, &mut global_rng(p.seed)).unwrap();
        let b = generate_plain(&p, &cfg, &mut global_rng(p.seed)).unwrap();
        assert_eq!(a.len(), 12);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.synthesis, y.synthesis);
        }
        assert_ne!(a[0].synthesis.points, a[1].synthesis.points);
    }

    #[test]
    fn test_insert_labeled_reuses_stimulus_across_delays() {
        let p = plan(4);
        let cfg = p.synthesis.resolve().unwrap();
        let stim = vec![generate_labeled_one(&p, &cfg, CellKey::new(8, 1, 0)).unwrap()];
        let mut table = ComponentTable::new();
        let cells = insert_labeled(&mut table, &p, &stim).unwrap();
        assert_eq!(cells.len(), 9);
        assert!(!cells[0].revealed);
        assert_eq!(cells[0].id(), "phase2_1_8_0_5.0");
        assert_eq!(cells[1].id(), "phase2_1_8_0_0");
        assert!(cells[1..].iter().all(|c| c.revealed));
        let reference = table.stimulus(&cells[0].id()).unwrap();
        for cell in &cells {
            let c = table.stimulus(&cell.id()).unwrap();
            assert_eq!(c.coordinates(), reference.coordinates());
            assert_eq!(c.correlation(), reference.correlation());
            assert_eq!(c.as_labeled().unwrap().label_seconds, cell.delay);
        }
    }
}
