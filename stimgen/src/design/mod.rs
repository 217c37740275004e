//! Study design: condition cells, Latin-square schemes, and the sequence tree.
//!
//! [`assemble`] drives the whole pass: it validates a [`StudyPlan`], generates
//! every stimulus family, fills the [`ComponentTable`] and expands the plan's
//! sequence template into the final [`Group`] tree.

pub mod assemble;
pub mod cells;
pub mod components;
pub mod latin;
pub mod plan;
pub mod sequence;

pub use assemble::{assemble, verify_references, verify_scheme_matching, StudyDesign, SynthesisTally};
pub use cells::{labeled_id, unrevealed_id, ConditionCell, GeneratedStimulus};
pub use components::{Component, ComponentEntry, ComponentTable, Parameters};
pub use latin::{build_schemes, Scheme, TopicAssignment};
pub use plan::{StudyPlan, SynthesisSettings};
pub use sequence::{default_template, expand_template, Group, Node, Order, Slots};
