//! Presentation-sequence tree consumed by the study engine.
//!
//! Leaves are component ids; groups carry an ordering policy and children.
//! Keys this crate does not model (e.g. `skip` rules on a group) are kept in
//! [`Group::extra`] and written back unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{SLOT_BELIEFS, SLOT_EXAMPLES, SLOT_PLAIN, SLOT_SCHEMES};
use crate::error::{Result, StimgenError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Order {
    Fixed,
    Random,
    LatinSquare,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Leaf(String),
    Group(Group),
}

impl From<&str> for Node {
    fn from(id: &str) -> Self {
        Node::Leaf(id.to_string())
    }
}

impl From<String> for Node {
    fn from(id: String) -> Self {
        Node::Leaf(id)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub order: Order,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_samples: Option<usize>,
    pub components: Vec<Node>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Group {
    pub fn new(order: Order, components: Vec<Node>) -> Self {
        Self {
            id: None,
            order,
            num_samples: None,
            components,
            extra: IndexMap::new(),
        }
    }

    pub fn fixed(components: Vec<Node>) -> Self {
        Self::new(Order::Fixed, components)
    }

    pub fn random(components: Vec<Node>) -> Self {
        Self::new(Order::Random, components)
    }

    pub fn latin_square(components: Vec<Node>) -> Self {
        Self::new(Order::LatinSquare, components)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_num_samples(mut self, n: usize) -> Self {
        self.num_samples = Some(n);
        self
    }

    /// All leaf ids, depth-first in document order.
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_leaves(&self.components, &mut out);
        out
    }

    /// Direct child groups.
    pub fn child_groups(&self) -> impl Iterator<Item = &Group> {
        self.components.iter().filter_map(|n| match n {
            Node::Group(g) => Some(g),
            Node::Leaf(_) => None,
        })
    }

    /// Depth-first search for a group by id.
    pub fn find(&self, id: &str) -> Option<&Group> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.child_groups().find_map(|g| g.find(id))
    }
}

fn collect_leaves<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Leaf(id) => out.push(id),
            Node::Group(g) => collect_leaves(&g.components, out),
        }
    }
}

/// Generated content substituted for slot markers in a template.
#[derive(Clone, Debug)]
pub struct Slots {
    pub beliefs: Group,
    pub plain: Group,
    pub examples: Vec<Node>,
    pub schemes: Group,
}

/// Template used when the plan supplies none: every generated block in study order.
pub fn default_template() -> Group {
    Group::fixed(vec![
        SLOT_BELIEFS.into(),
        SLOT_PLAIN.into(),
        SLOT_EXAMPLES.into(),
        SLOT_SCHEMES.into(),
    ])
}

/// Replace slot markers (`@beliefs`, `@plain`, `@examples`, `@schemes`) with
/// generated nodes. `@examples` splices its leaves inline.
pub fn expand_template(template: &Group, slots: &Slots) -> Result<Group> {
    let mut components = Vec::with_capacity(template.components.len());
    for node in &template.components {
        match node {
            Node::Leaf(id) if id.starts_with('@') => match id.as_str() {
                SLOT_BELIEFS => components.push(Node::Group(slots.beliefs.clone())),
                SLOT_PLAIN => components.push(Node::Group(slots.plain.clone())),
                SLOT_EXAMPLES => components.extend(slots.examples.iter().cloned()),
                SLOT_SCHEMES => components.push(Node::Group(slots.schemes.clone())),
                other => return Err(StimgenError::UnknownSlot(other.to_string())),
            },
            Node::Leaf(id) => components.push(Node::Leaf(id.clone())),
            Node::Group(g) => components.push(Node::Group(expand_template(g, slots)?)),
        }
    }
    Ok(Group {
        components,
        ..template.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slots() -> Slots {
        Slots {
            beliefs: Group::random(vec!["phase3_0".into()]).with_id("phase3"),
            plain: Group::random(vec!["phase1_2_0_pos".into()]).with_id("phase1"),
            examples: vec!["phase2_example_1".into(), "phase2_example_2".into()],
            schemes: Group::latin_square(vec![]).with_id("phase2").with_num_samples(1),
        }
    }

    #[test]
    fn test_group_json_shape() {
        let g = Group::random(vec!["a".into(), Group::fixed(vec!["b".into()]).into()])
            .with_id("g")
            .with_num_samples(1);
        let v = serde_json::to_value(&g).unwrap();
        assert_eq!(
            v,
            json!({
                "id": "g",
                "order": "random",
                "numSamples": 1,
                "components": ["a", { "order": "fixed", "components": ["b"] }]
            })
        );
    }

    #[test]
    fn test_extra_keys_round_trip() {
        let v = json!({
            "id": "attentionCheck1",
            "order": "fixed",
            "components": ["attentionCheck1", "attentionCheckFailed"],
            "skip": [{ "name": "attentionCheck1", "to": "phase3_intro" }]
        });
        let g: Group = serde_json::from_value(v.clone()).unwrap();
        assert_eq!(g.order, Order::Fixed);
        assert!(g.extra.contains_key("skip"));
        assert_eq!(serde_json::to_value(&g).unwrap(), v);
    }

    #[test]
    fn test_latin_square_order_name() {
        assert_eq!(serde_json::to_value(Order::LatinSquare).unwrap(), json!("latinSquare"));
    }

    #[test]
    fn test_expand_template() {
        let template: Group = serde_json::from_value(json!({
            "order": "fixed",
            "components": [
                "consent",
                { "id": "wrap", "order": "fixed", "components": ["@beliefs"] },
                "@plain",
                "@examples",
                "@schemes",
                "demographics"
            ]
        }))
        .unwrap();
        let out = expand_template(&template, &slots()).unwrap();
        assert_eq!(out.components.len(), 7);
        assert_eq!(
            out.leaves(),
            vec![
                "consent",
                "phase3_0",
                "phase1_2_0_pos",
                "phase2_example_1",
                "phase2_example_2",
                "demographics"
            ]
        );
        assert!(out.find("phase2").is_some());
        assert_eq!(out.find("wrap").unwrap().child_groups().count(), 1);
    }

    #[test]
    fn test_unknown_slot() {
        let template = Group::fixed(vec!["@nope".into()]);
        assert!(matches!(
            expand_template(&template, &slots()),
            Err(StimgenError::UnknownSlot(s)) if s == "@nope"
        ));
    }

    #[test]
    fn test_default_template_expands_all_slots() {
        let out = expand_template(&default_template(), &slots()).unwrap();
        assert_eq!(out.order, Order::Fixed);
        assert_eq!(out.components.len(), 5);
    }
}
