//! Flow documents
//!
//! A flow document is the serialised form of a project scope: requirement
//! records plus the connections between them. Records may carry explicit
//! steps or a Gherkin scenario that is parsed on load.

use crate::error::{FlowError, Result};
use crate::gherkin;
use crate::types::{Connection, NodeId, RequirementNode, Step};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Requirement as stored in a flow document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementRecord {
    /// Requirement identifier
    pub id: NodeId,
    /// Title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Scenario text, used when `steps` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gherkin_scenario: Option<String>,
    /// Explicit steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
}

impl RequirementRecord {
    /// Resolve the record into a node
    ///
    /// # Errors
    /// - `FlowError::Gherkin` if only a scenario is given and it has no steps
    pub fn to_node(&self) -> Result<RequirementNode> {
        let steps = match (&self.steps[..], &self.gherkin_scenario) {
            ([], Some(scenario)) => {
                gherkin::validate(scenario).map_err(|source| FlowError::Gherkin {
                    requirement: self.id.to_string(),
                    source,
                })?
            }
            (steps, _) => steps.to_vec(),
        };
        Ok(RequirementNode {
            id: self.id.clone(),
            title: self.title.clone(),
            steps,
        })
    }
}

/// Requirements and connections of one project scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDocument {
    /// Requirement records in display order
    #[serde(default)]
    pub requirements: Vec<RequirementRecord>,
    /// Connections in creation order
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl FlowDocument {
    /// Parse a JSON document
    ///
    /// # Errors
    /// - `FlowError::Json` if the text is not a valid document
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a YAML document
    ///
    /// # Errors
    /// - `FlowError::Yaml` if the text is not a valid document
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a document, choosing the format from the file extension
    ///
    /// # Errors
    /// - `FlowError::UnsupportedFormat` for extensions other than json/yaml/yml
    /// - `FlowError::Io` if the file cannot be read
    /// - `FlowError::Json` / `FlowError::Yaml` for malformed content
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let parse: fn(&str) -> Result<Self> = match extension.as_str() {
            "json" => Self::from_json_str,
            "yaml" | "yml" => Self::from_yaml_str,
            _ => return Err(FlowError::UnsupportedFormat(path.display().to_string())),
        };

        let text = std::fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;
        let document = parse(&text)?;
        tracing::debug!(
            path = %path.display(),
            requirements = document.requirements.len(),
            connections = document.connections.len(),
            "Loaded flow document"
        );
        Ok(document)
    }

    /// Resolve every record into a node, in document order
    ///
    /// # Errors
    /// - `FlowError::Gherkin` for the first record whose scenario has no steps
    pub fn nodes(&self) -> Result<Vec<RequirementNode>> {
        self.requirements.iter().map(RequirementRecord::to_node).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepKind;

    const DOC: &str = r#"{
        "requirements": [
            {"id": "r1", "title": "Login", "gherkinScenario": "Given a\nWhen b"},
            {"id": "r2", "steps": [{"stepType": "then", "stepText": "c"}]}
        ],
        "connections": [
            {"id": "c1", "sourceRequirementId": "r1", "targetRequirementId": "r2"}
        ]
    }"#;

    #[test]
    fn json_document_resolves_scenarios_and_steps() {
        let doc = FlowDocument::from_json_str(DOC).unwrap();
        let nodes = doc.nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].title.as_deref(), Some("Login"));
        assert_eq!(nodes[0].steps[1], Step::new(StepKind::When, "b"));
        assert_eq!(nodes[1].steps, vec![Step::new(StepKind::Then, "c")]);
        assert_eq!(doc.connections[0].target, NodeId::from("r2"));
    }

    #[test]
    fn explicit_steps_win_over_scenario() {
        let record = RequirementRecord {
            id: NodeId::from("r"),
            title: None,
            gherkin_scenario: Some("Given ignored".to_string()),
            steps: vec![Step::new(StepKind::But, "kept")],
        };
        assert_eq!(record.to_node().unwrap().steps[0].text, "kept");
    }

    #[test]
    fn scenario_without_steps_is_an_error() {
        let doc = FlowDocument::from_yaml_str(
            "requirements:\n  - id: bad\n    gherkinScenario: \"Feature: nothing\"\n",
        )
        .unwrap();
        let err = doc.nodes().unwrap_err();
        assert!(matches!(err, FlowError::Gherkin { ref requirement, .. } if requirement == "bad"));
    }

    #[test]
    fn record_without_steps_or_scenario_is_an_empty_node() {
        let doc = FlowDocument::from_yaml_str("requirements:\n  - id: empty\n").unwrap();
        assert!(doc.nodes().unwrap()[0].steps.is_empty());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = FlowDocument::load("flow.csv").unwrap_err();
        assert!(matches!(err, FlowError::UnsupportedFormat(_)));
    }
}
