//! Generated artifacts
//!
//! One artifact type per generation phase. These are opaque payloads as far
//! as the orchestrator is concerned; the only property it relies on is
//! non-emptiness at completion time.

use crate::node::Phase;
use serde::{Deserialize, Serialize};

/// One generated validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRule {
    /// Rule identifier, e.g. `min_length` or `matches`
    pub rule: String,
    /// Optional rule argument (length bound, pattern, option list, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<serde_json::Value>,
    /// Message shown when the rule rejects an answer
    pub error_message: String,
}

/// Validation rules generated for one node (constraints phase)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// Rules applied in order
    pub rules: Vec<ConstraintRule>,
}

impl ConstraintSet {
    /// True when no rules were generated
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Extraction contract generated for one node (parser phase)
///
/// Names the variable the agent binds and the expression used to pull the
/// value out of a free-text answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionContract {
    /// Generated variable name
    pub variable: String,
    /// Extraction expression understood by the host runtime
    pub expression: String,
}

impl ExtractionContract {
    /// True when the contract carries no usable content
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variable.is_empty() && self.expression.is_empty()
    }
}

/// Dialogue messages generated for one node (messages phase)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageSet {
    /// Initial question asked for this node
    pub prompt: String,
    /// Follow-up when the first answer could not be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<String>,
    /// Read-back confirmation of the captured value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<String>,
}

impl MessageSet {
    /// Message set with only the initial prompt
    #[must_use]
    pub fn prompt_only(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reprompt: None,
            confirmation: None,
        }
    }

    /// True when not even a prompt was generated
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompt.is_empty()
    }
}

/// A phase-tagged artifact, as produced by one fan-out task
///
/// Carrying the phase in the payload makes a phase/artifact mismatch
/// unrepresentable at the tree boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhaseArtifact {
    /// Constraints-phase output
    Constraints(ConstraintSet),
    /// Parser-phase output
    Parser(ExtractionContract),
    /// Messages-phase output
    Messages(MessageSet),
}

impl PhaseArtifact {
    /// The phase this artifact belongs to
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Constraints(_) => Phase::Constraints,
            Self::Parser(_) => Phase::Parser,
            Self::Messages(_) => Phase::Messages,
        }
    }

    /// True when the artifact carries no content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Constraints(a) => a.is_empty(),
            Self::Parser(a) => a.is_empty(),
            Self::Messages(a) => a.is_empty(),
        }
    }
}
