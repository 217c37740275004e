//! Component table: stimulus id → component object.
//!
//! Generated stimuli reference one of three base templates by name; static
//! pages supplied by the plan are stored as opaque JSON.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StimgenError};
use crate::types::{Direction, PointSet};

/// Base template for plain (unlabelled) scatterplots.
pub const BASE_PLAIN: &str = "phase1";
/// Base template for labelled scatterplots.
pub const BASE_LABELED: &str = "phase2";
/// Base template for text-only belief items.
pub const BASE_BELIEF: &str = "phase3";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlainParameters {
    pub coordinates: PointSet,
    pub example: bool,
    pub correlation: f64,
    pub seconds: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledParameters {
    pub coordinates: PointSet,
    pub example: bool,
    pub correlation: f64,
    pub label: String,
    #[serde(rename = "X")]
    pub x: String,
    #[serde(rename = "Y")]
    pub y: String,
    /// Correlation level.
    pub corr: u32,
    /// Variant index.
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_idx: Option<usize>,
    pub direction: Direction,
    pub seconds: f64,
    pub label_seconds: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeliefParameters {
    pub label: String,
    #[serde(rename = "X")]
    pub x: String,
    #[serde(rename = "Y")]
    pub y: String,
}

/// Tried in declaration order when reading back, most specific first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameters {
    Labeled(LabeledParameters),
    Plain(PlainParameters),
    Belief(BeliefParameters),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "baseComponent")]
    pub base_component: String,
    pub parameters: Parameters,
}

impl Component {
    pub fn plain(parameters: PlainParameters) -> Self {
        Self {
            base_component: BASE_PLAIN.to_string(),
            parameters: Parameters::Plain(parameters),
        }
    }

    pub fn labeled(parameters: LabeledParameters) -> Self {
        Self {
            base_component: BASE_LABELED.to_string(),
            parameters: Parameters::Labeled(parameters),
        }
    }

    pub fn belief(parameters: BeliefParameters) -> Self {
        Self {
            base_component: BASE_BELIEF.to_string(),
            parameters: Parameters::Belief(parameters),
        }
    }

    /// Achieved correlation, for synthesized stimuli.
    pub fn correlation(&self) -> Option<f64> {
        match &self.parameters {
            Parameters::Labeled(p) => Some(p.correlation),
            Parameters::Plain(p) => Some(p.correlation),
            Parameters::Belief(_) => None,
        }
    }

    pub fn coordinates(&self) -> Option<&PointSet> {
        match &self.parameters {
            Parameters::Labeled(p) => Some(&p.coordinates),
            Parameters::Plain(p) => Some(&p.coordinates),
            Parameters::Belief(_) => None,
        }
    }

    pub fn as_labeled(&self) -> Option<&LabeledParameters> {
        match &self.parameters {
            Parameters::Labeled(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentEntry {
    Stimulus(Component),
    Static(Value),
}

impl ComponentEntry {
    pub fn as_stimulus(&self) -> Option<&Component> {
        match self {
            ComponentEntry::Stimulus(c) => Some(c),
            ComponentEntry::Static(_) => None,
        }
    }
}

/// Insertion-ordered component table with unique ids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentTable {
    entries: IndexMap<String, ComponentEntry>,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, entry: ComponentEntry) -> Result<()> {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return Err(StimgenError::DuplicateComponent(id));
        }
        self.entries.insert(id, entry);
        Ok(())
    }

    pub fn insert_stimulus(&mut self, id: impl Into<String>, component: Component) -> Result<()> {
        self.insert(id, ComponentEntry::Stimulus(component))
    }

    pub fn get(&self, id: &str) -> Option<&ComponentEntry> {
        self.entries.get(id)
    }

    pub fn stimulus(&self, id: &str) -> Option<&Component> {
        self.get(id).and_then(ComponentEntry::as_stimulus)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComponentEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Achieved correlations of every synthesized stimulus, in table order.
    pub fn correlations(&self) -> Vec<f64> {
        self.entries
            .values()
            .filter_map(ComponentEntry::as_stimulus)
            .filter_map(Component::correlation)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;
    use serde_json::json;

    fn labeled() -> LabeledParameters {
        LabeledParameters {
            coordinates: vec![Point::new(0.1, 0.2)],
            example: false,
            correlation: 0.41,
            label: "More sleep, more happiness.".into(),
            x: "Sleep".into(),
            y: "Happiness".into(),
            corr: 4,
            exp: 1,
            label_idx: Some(6),
            direction: Direction::Positive,
            seconds: 5.0,
            label_seconds: 2.5,
        }
    }

    #[test]
    fn test_labeled_json_keys() {
        let v = serde_json::to_value(Component::labeled(labeled())).unwrap();
        assert_eq!(v["baseComponent"], "phase2");
        let p = &v["parameters"];
        assert_eq!(p["coordinates"], json!([[0.1, 0.2]]));
        assert_eq!(p["X"], "Sleep");
        assert_eq!(p["Y"], "Happiness");
        assert_eq!(p["corr"], 4);
        assert_eq!(p["exp"], 1);
        assert_eq!(p["label_idx"], 6);
        assert_eq!(p["direction"], "pos");
        assert_eq!(p["label_seconds"], 2.5);
    }

    #[test]
    fn test_example_omits_label_idx() {
        let mut p = labeled();
        p.label_idx = None;
        p.example = true;
        let v = serde_json::to_value(Component::labeled(p)).unwrap();
        assert!(v["parameters"].get("label_idx").is_none());
    }

    #[test]
    fn test_untagged_read_back() {
        let plain = Component::plain(PlainParameters {
            coordinates: vec![Point::new(0.5, 0.5)],
            example: false,
            correlation: 0.2,
            seconds: 5.0,
        });
        let belief = Component::belief(BeliefParameters {
            label: "l".into(),
            x: "x".into(),
            y: "y".into(),
        });
        for c in [Component::labeled(labeled()), plain, belief] {
            let v = serde_json::to_value(&c).unwrap();
            let back: Component = serde_json::from_value(v).unwrap();
            assert_eq!(back, c);
        }
    }

    #[test]
    fn test_table_rejects_duplicates() {
        let mut t = ComponentTable::new();
        t.insert("consent", ComponentEntry::Static(json!({"type": "markdown"})))
            .unwrap();
        assert!(matches!(
            t.insert("consent", ComponentEntry::Static(json!({}))),
            Err(StimgenError::DuplicateComponent(id)) if id == "consent"
        ));
        assert_eq!(t.len(), 1);
        assert!(t.stimulus("consent").is_none());
    }

    #[test]
    fn test_table_preserves_order_and_collects_correlations() {
        let mut t = ComponentTable::new();
        t.insert("z_static", ComponentEntry::Static(json!({}))).unwrap();
        t.insert_stimulus("a_labeled", Component::labeled(labeled())).unwrap();
        let ids: Vec<&str> = t.ids().collect();
        assert_eq!(ids, vec!["z_static", "a_labeled"]);
        assert_eq!(t.correlations(), vec![0.41]);
    }
}
