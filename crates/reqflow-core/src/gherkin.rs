//! Gherkin scenario parsing
//!
//! Scenario text is read line by line. Lines starting with a step keyword
//! (case-insensitive, followed by whitespace or the end of the line) become
//! steps; everything else is ignored.

use crate::error::GherkinError;
use crate::types::{NodeId, RequirementNode, Step, StepKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static DOMAIN_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9_]+)\.([A-Za-z0-9_]+)\}").expect("static regex is valid")
});

/// `${Domain.attribute}` placeholder found in step text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainReference {
    /// Domain name
    pub domain: String,
    /// Attribute name
    pub attribute: String,
}

impl fmt::Display for DomainReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.attribute)
    }
}

/// Parse scenario text into ordered steps
#[must_use]
pub fn parse(text: &str) -> Vec<Step> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<Step> {
    StepKind::ALL.into_iter().find_map(|kind| {
        let keyword = kind.keyword();
        let head = line.get(..keyword.len())?;
        let rest = &line[keyword.len()..];
        // "Butter" is prose, not `But ter`
        let bounded = rest.is_empty() || rest.starts_with(char::is_whitespace);
        (bounded && head.eq_ignore_ascii_case(keyword)).then(|| Step::new(kind, rest.trim()))
    })
}

/// Parse scenario text, rejecting text without any step
///
/// # Errors
/// - `GherkinError::NoSteps` if no line starts with a step keyword
pub fn validate(text: &str) -> Result<Vec<Step>, GherkinError> {
    let steps = parse(text);
    if steps.is_empty() {
        return Err(GherkinError::NoSteps);
    }
    Ok(steps)
}

/// Extract `${Domain.attribute}` references in order of appearance
#[must_use]
pub fn domain_references(text: &str) -> Vec<DomainReference> {
    DOMAIN_REFERENCE
        .captures_iter(text)
        .map(|cap| DomainReference {
            domain: cap[1].to_string(),
            attribute: cap[2].to_string(),
        })
        .collect()
}

/// Render steps back to scenario text
#[must_use]
pub fn format(steps: &[Step]) -> String {
    steps
        .iter()
        .map(|step| format!("{} {}", step.kind.keyword(), step.text))
        .collect::<Vec<_>>()
        .join("\n")
}

impl RequirementNode {
    /// Build a node from scenario text
    ///
    /// # Errors
    /// - `GherkinError::NoSteps` if the scenario has no step lines
    pub fn from_gherkin(id: impl Into<NodeId>, scenario: &str) -> Result<Self, GherkinError> {
        Ok(Self::new(id, validate(scenario)?))
    }
}
