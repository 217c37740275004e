//! Latin-square counterbalancing of (correlation level × variant) across topics.
//!
//! Topics are split into `#levels` consecutive groups. Scheme `(rotation,
//! pattern)` gives group `g` the level `levels[(g + rotation) % #levels]` and
//! topic `t` the variant `(t + pattern) % #variants`, so with two variants even
//! and odd topics swap variants between the two patterns. This yields
//! `#levels × #variants` schemes, and across them every topic meets every
//! (level, variant) pair exactly once.
//!
//! Within a scheme each topic contributes one unrevealed trial and one
//! revealed group (one delay sampled by the engine). Both are built from the
//! same [`TopicAssignment`], which is what keeps them matched.

use serde::Serialize;

use crate::error::{Result, StimgenError};

use super::cells::{labeled_id, unrevealed_id};
use super::sequence::{Group, Node};

/// (level, variant) given to one topic in one scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TopicAssignment {
    pub topic: usize,
    pub level: u32,
    pub variant: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scheme {
    pub rotation: usize,
    pub pattern: usize,
    pub assignments: Vec<TopicAssignment>,
}

impl Scheme {
    pub fn id(&self) -> String {
        format!("scheme_{}_{}", self.rotation, self.pattern)
    }

    /// The scheme as a random-order group: per topic, the unrevealed trial and
    /// a one-sample random group over the reveal delays, all shuffled together.
    pub fn to_group(&self, unrevealed_delay: f64, reveal_delays: &[f64]) -> Group {
        let mut trials: Vec<Node> = Vec::with_capacity(self.assignments.len() * 2);
        for a in &self.assignments {
            trials.push(unrevealed_id(a.topic, a.level, a.variant, unrevealed_delay).into());
            let revealed: Vec<Node> = reveal_delays
                .iter()
                .map(|&d| labeled_id(a.topic, a.level, a.variant, d).into())
                .collect();
            trials.push(
                Group::random(revealed)
                    .with_id(format!("label_{}", a.topic))
                    .with_num_samples(1)
                    .into(),
            );
        }
        Group::random(trials).with_id(self.id())
    }
}

/// `levels` rotated left by `k`.
pub fn rotate(levels: &[u32], k: usize) -> Vec<u32> {
    if levels.is_empty() {
        return Vec::new();
    }
    let k = k % levels.len();
    levels[k..].iter().chain(levels[..k].iter()).copied().collect()
}

/// Build every scheme for `n_topics` topics.
///
/// Errors if the topics cannot be split into equal groups per level.
pub fn build_schemes(levels: &[u32], n_topics: usize, variants: usize) -> Result<Vec<Scheme>> {
    if levels.is_empty() {
        return Err(StimgenError::EmptyLevels);
    }
    if variants == 0 {
        return Err(StimgenError::NoVariants);
    }
    if n_topics % levels.len() != 0 {
        return Err(StimgenError::UnevenTopicGroups {
            topics: n_topics,
            levels: levels.len(),
        });
    }
    let per_group = n_topics / levels.len();

    let mut schemes = Vec::with_capacity(levels.len() * variants);
    for rotation in 0..levels.len() {
        let rotated = rotate(levels, rotation);
        for pattern in 0..variants {
            let assignments = (0..n_topics)
                .map(|topic| TopicAssignment {
                    topic,
                    level: rotated[topic / per_group],
                    variant: (topic + pattern) % variants,
                })
                .collect();
            schemes.push(Scheme {
                rotation,
                pattern,
                assignments,
            });
        }
    }
    Ok(schemes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rotate() {
        assert_eq!(rotate(&[2, 4, 6, 8], 0), vec![2, 4, 6, 8]);
        assert_eq!(rotate(&[2, 4, 6, 8], 1), vec![4, 6, 8, 2]);
        assert_eq!(rotate(&[2, 4, 6, 8], 5), vec![4, 6, 8, 2]);
        assert!(rotate(&[], 3).is_empty());
    }

    #[test]
    fn test_scheme_count_and_shape() {
        let schemes = build_schemes(&[2, 4, 6, 8], 12, 2).unwrap();
        assert_eq!(schemes.len(), 8);
        for s in &schemes {
            assert_eq!(s.assignments.len(), 12);
            let g = s.to_group(5.0, &[0.0, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]);
            assert_eq!(g.components.len(), 24);
            assert_eq!(g.child_groups().count(), 12);
        }
    }

    #[test]
    fn test_variant_patterns_alternate() {
        let schemes = build_schemes(&[2, 4, 6, 8], 12, 2).unwrap();
        let p0 = &schemes[0];
        let p1 = &schemes[1];
        assert_eq!((p0.rotation, p0.pattern), (0, 0));
        assert_eq!((p1.rotation, p1.pattern), (0, 1));
        for t in 0..12 {
            assert_eq!(p0.assignments[t].variant, t % 2);
            assert_eq!(p1.assignments[t].variant, 1 - t % 2);
            assert_eq!(p0.assignments[t].level, p1.assignments[t].level);
        }
    }

    #[test]
    fn test_rotation_groups() {
        let schemes = build_schemes(&[2, 4, 6, 8], 12, 2).unwrap();
        // Rotation 1: topics 0..3 → 4, 3..6 → 6, 6..9 → 8, 9..12 → 2.
        let s = schemes.iter().find(|s| s.rotation == 1 && s.pattern == 0).unwrap();
        let levels: Vec<u32> = s.assignments.iter().map(|a| a.level).collect();
        assert_eq!(levels, vec![4, 4, 4, 6, 6, 6, 8, 8, 8, 2, 2, 2]);
    }

    #[test]
    fn test_each_topic_sees_every_cell_once() {
        let levels = [2, 4, 6, 8];
        let schemes = build_schemes(&levels, 12, 2).unwrap();
        for topic in 0..12 {
            let cells: HashSet<(u32, usize)> = schemes
                .iter()
                .map(|s| (s.assignments[topic].level, s.assignments[topic].variant))
                .collect();
            assert_eq!(cells.len(), levels.len() * 2, "topic {topic}");
        }
    }

    #[test]
    fn test_unrevealed_and_revealed_share_cell() {
        let schemes = build_schemes(&[2, 4], 4, 2).unwrap();
        let g = schemes[3].to_group(5.0, &[0.0, 2.5]);
        let a = &schemes[3].assignments[2];
        let expected_prefix = format!("phase2_2_{}_{}_", a.level, a.variant);
        match (&g.components[4], &g.components[5]) {
            (Node::Leaf(unrevealed), Node::Group(revealed)) => {
                assert_eq!(unrevealed, &format!("{expected_prefix}5.0"));
                assert!(revealed.leaves().contains(&format!("{expected_prefix}0").as_str()));
                assert_eq!(revealed.id.as_deref(), Some("label_2"));
                assert_eq!(revealed.num_samples, Some(1));
                assert!(revealed.leaves().iter().all(|id| id.starts_with(&expected_prefix)));
            }
            other => panic!("unexpected trial layout: {other:?}"),
        }
    }

    #[test]
    fn test_uneven_topics_rejected() {
        assert!(matches!(
            build_schemes(&[2, 4, 6, 8], 10, 2),
            Err(StimgenError::UnevenTopicGroups { topics: 10, levels: 4 })
        ));
        assert!(build_schemes(&[], 4, 2).is_err());
        assert!(build_schemes(&[2], 4, 0).is_err());
    }
}
