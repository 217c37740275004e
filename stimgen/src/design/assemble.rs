//! Full study assembly: plan → component table + sequence tree.

use std::time::Instant;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::info;

use crate::error::{Result, StimgenError};
use crate::seeding::global_rng;

use super::cells::{
    generate_examples, generate_labeled, generate_plain, insert_beliefs, insert_examples,
    insert_labeled, insert_plain, GeneratedStimulus,
};
use super::components::{ComponentEntry, ComponentTable};
use super::latin::{build_schemes, Scheme};
use super::plan::StudyPlan;
use super::sequence::{default_template, expand_template, Group, Node, Slots};

/// Synthesis bookkeeping for one assembly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SynthesisTally {
    pub stimuli: usize,
    pub tolerance_misses: usize,
    pub unresolved_spacing: usize,
}

impl SynthesisTally {
    fn add(&mut self, stimuli: &[GeneratedStimulus]) {
        for s in stimuli {
            self.stimuli += 1;
            if !s.synthesis.within_tolerance {
                self.tolerance_misses += 1;
            }
            if !s.synthesis.spacing.resolved() {
                self.unresolved_spacing += 1;
            }
        }
    }
}

/// Everything the assembler produces for one plan.
#[derive(Clone, Debug)]
pub struct StudyDesign {
    pub components: ComponentTable,
    pub sequence: Group,
    pub base_components: IndexMap<String, Value>,
    pub schemes: Vec<Scheme>,
    pub tally: SynthesisTally,
    pub completion_url: Option<String>,
}

/// Generate every stimulus for `plan` and arrange them into the sequence.
pub fn assemble(plan: &StudyPlan) -> Result<StudyDesign> {
    let start = Instant::now();
    plan.validate()?;
    let config = plan.synthesis.resolve()?;

    let mut table = ComponentTable::new();
    for (id, value) in &plan.static_components {
        table.insert(id.clone(), ComponentEntry::Static(value.clone()))?;
    }

    // Global stream: plain stimuli first, then examples. Labelled cells use
    // their own seeds and never advance this stream.
    let mut rng = global_rng(plan.seed);
    let plain = generate_plain(plan, &config, &mut rng)?;
    let examples = generate_examples(plan, &config, &mut rng)?;
    let labeled = generate_labeled(plan, &config)?;

    let mut tally = SynthesisTally::default();
    tally.add(&plain);
    tally.add(&examples);
    tally.add(&labeled);

    let plain_ids = insert_plain(&mut table, plan, &plain)?;
    let example_ids = insert_examples(&mut table, plan, &examples)?;
    let belief_ids = insert_beliefs(&mut table, plan)?;
    insert_labeled(&mut table, plan, &labeled)?;

    let schemes = build_schemes(&plan.levels, plan.topics.len(), plan.variants)?;
    let mut scheme_groups: Vec<Node> = Vec::with_capacity(schemes.len());
    for scheme in &schemes {
        let group = scheme.to_group(plan.unrevealed_delay, &plan.reveal_delays);
        verify_scheme_matching(&group, &table)?;
        scheme_groups.push(group.into());
    }

    let slots = Slots {
        beliefs: Group::random(belief_ids.into_iter().map(Node::from).collect()).with_id("phase3"),
        plain: Group::random(plain_ids.into_iter().map(Node::from).collect()).with_id("phase1"),
        examples: example_ids.into_iter().map(Node::from).collect(),
        schemes: Group::latin_square(scheme_groups)
            .with_id("phase2")
            .with_num_samples(1),
    };
    let template = plan.sequence.clone().unwrap_or_else(default_template);
    let sequence = expand_template(&template, &slots)?;
    verify_references(&sequence, &table)?;

    info!(
        components = table.len(),
        schemes = schemes.len(),
        stimuli = tally.stimuli,
        tolerance_misses = tally.tolerance_misses,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "study assembled"
    );

    Ok(StudyDesign {
        components: table,
        sequence,
        base_components: plan.base_components.clone(),
        schemes,
        tally,
        completion_url: plan.completion_url.clone(),
    })
}

/// Every leaf of the sequence must name a component in the table.
pub fn verify_references(sequence: &Group, table: &ComponentTable) -> Result<()> {
    for id in sequence.leaves() {
        if !table.contains(id) {
            return Err(StimgenError::UnknownComponent(id.to_string()));
        }
    }
    Ok(())
}

/// Within a scheme, every trial of a topic (unrevealed or any revealed delay)
/// must carry the same (level, variant) and show the same point set.
pub fn verify_scheme_matching(scheme: &Group, table: &ComponentTable) -> Result<()> {
    let scheme_id = scheme.id.clone().unwrap_or_default();
    let mut seen: IndexMap<usize, (u32, usize, f64)> = IndexMap::new();
    for id in scheme.leaves() {
        let params = table
            .stimulus(id)
            .and_then(|c| c.as_labeled())
            .ok_or_else(|| StimgenError::UnknownComponent(id.to_string()))?;
        let topic = params.label_idx.unwrap_or(usize::MAX);
        let cell = (params.corr, params.exp, params.correlation);
        match seen.get(&topic) {
            Some(prev) if *prev != cell => {
                return Err(StimgenError::UnmatchedScheme {
                    scheme: scheme_id,
                    topic,
                });
            }
            Some(_) => {}
            None => {
                seen.insert(topic, cell);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::components::{Component, LabeledParameters};
    use crate::types::{Direction, Point, Topic};

    fn labeled(topic: usize, corr: u32, exp: usize, correlation: f64) -> Component {
        Component::labeled(LabeledParameters {
            coordinates: vec![Point::new(0.5, 0.5)],
            example: false,
            correlation,
            label: format!("T{topic}"),
            x: "x".into(),
            y: "y".into(),
            corr,
            exp,
            label_idx: Some(topic),
            direction: Direction::Positive,
            seconds: 5.0,
            label_seconds: 0.0,
        })
    }

    #[test]
    fn test_verify_matching_detects_mismatch() {
        let mut table = ComponentTable::new();
        table.insert_stimulus("u", labeled(0, 4, 0, 0.4)).unwrap();
        table.insert_stimulus("r_ok", labeled(0, 4, 0, 0.4)).unwrap();
        table.insert_stimulus("r_bad", labeled(0, 6, 0, 0.6)).unwrap();

        let ok = Group::random(vec!["u".into(), Group::random(vec!["r_ok".into()]).into()])
            .with_id("scheme_0_0");
        assert!(verify_scheme_matching(&ok, &table).is_ok());

        let bad = Group::random(vec!["u".into(), Group::random(vec!["r_bad".into()]).into()])
            .with_id("scheme_0_1");
        assert!(matches!(
            verify_scheme_matching(&bad, &table),
            Err(StimgenError::UnmatchedScheme { topic: 0, .. })
        ));
    }

    #[test]
    fn test_verify_references() {
        let mut table = ComponentTable::new();
        table.insert_stimulus("u", labeled(0, 4, 0, 0.4)).unwrap();
        let seq = Group::fixed(vec!["u".into(), "missing".into()]);
        assert!(matches!(
            verify_references(&seq, &table),
            Err(StimgenError::UnknownComponent(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_assemble_small_plan() {
        let topics: Vec<Topic> = (0..4)
            .map(|i| Topic::new(format!("T{i}"), "x", "y"))
            .collect();
        let mut plan = StudyPlan::with_topics(topics);
        plan.levels = vec![2, 8];
        plan.plain_per_level = 1;
        plan.reveal_delays = vec![0.0, 2.0];
        plan.synthesis.max_attempts = Some(30);

        let design = assemble(&plan).unwrap();
        // 2 plain + 4 beliefs + (2 levels × 4 topics × 2 variants × 3 delays)
        assert_eq!(design.components.len(), 2 + 4 + 48);
        assert_eq!(design.schemes.len(), 4);
        assert_eq!(design.tally.stimuli, 2 + 16);
        let phase2 = design.sequence.find("phase2").unwrap();
        assert_eq!(phase2.components.len(), 4);
        assert_eq!(phase2.num_samples, Some(1));
    }
}
