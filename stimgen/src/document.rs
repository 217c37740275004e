//! Merge of an assembled design into an externally owned study document.
//!
//! Only `components`, `sequence`, `baseComponents` and (optionally)
//! `uiConfig.studyEndMsg` are touched. Every other key is written back as read.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::design::StudyDesign;
use crate::error::{Result, StimgenError};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudyDocument {
    root: Map<String, Value>,
}

impl StudyDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed document. The root must be a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(StimgenError::DocumentShape(format!(
                "root must be an object, found {}",
                kind(&other)
            ))),
        }
    }

    /// Read `path`. A missing file starts an empty document.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_value(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "study document not found, starting empty");
                Ok(Self::new())
            }
            Err(e) => Err(StimgenError::io(path, e)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Replace the generated sections with `design`.
    pub fn apply(&mut self, design: &StudyDesign) -> Result<()> {
        self.root
            .insert("components".into(), serde_json::to_value(&design.components)?);
        self.root
            .insert("sequence".into(), serde_json::to_value(&design.sequence)?);
        self.root.insert(
            "baseComponents".into(),
            serde_json::to_value(&design.base_components)?,
        );
        if let Some(url) = &design.completion_url {
            self.set_study_end_message(url)?;
        }
        Ok(())
    }

    fn set_study_end_message(&mut self, url: &str) -> Result<()> {
        let ui = self
            .root
            .entry("uiConfig")
            .or_insert_with(|| Value::Object(Map::new()));
        let ui = ui.as_object_mut().ok_or_else(|| {
            StimgenError::DocumentShape("uiConfig must be an object".to_string())
        })?;
        ui.insert("studyEndMsg".into(), Value::String(study_end_message(url)));
        Ok(())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Pretty JSON with 4-space indentation.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.root.serialize(&mut ser)?;
        // serde_json only ever writes valid UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_pretty_string()?;
        std::fs::write(path, text).map_err(|e| StimgenError::io(path, e))?;
        info!(path = %path.display(), keys = self.root.len(), "study document written");
        Ok(())
    }
}

pub fn study_end_message(url: &str) -> String {
    format!(
        "**Thank you for completing the study. You may click this link and return to Prolific**: [{url}]({url})"
    )
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
