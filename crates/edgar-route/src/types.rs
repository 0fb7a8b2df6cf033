//! Value objects produced by the router and its handlers.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Handler output
// =============================================================================

/// One normalized answer produced by a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerReply {
    pub text: String,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f32,
    pub source: String,
}

impl HandlerReply {
    pub fn new(text: impl Into<String>, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source: source.into(),
        }
    }
}

// =============================================================================
// Routing decision
// =============================================================================

/// Why the router let an input through to the QA matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassThroughReason {
    /// Routing is switched off in config.
    Disabled,
    /// No routing groups are configured.
    NoGroups,
    /// No group reached the routing threshold.
    BelowThreshold,
    /// The winning group is mapped to the "none" handler.
    NoHandler { group: String },
}

impl fmt::Display for PassThroughReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassThroughReason::Disabled => write!(f, "disabled"),
            PassThroughReason::NoGroups => write!(f, "no_groups"),
            PassThroughReason::BelowThreshold => write!(f, "below_threshold"),
            PassThroughReason::NoHandler { group } => write!(f, "no_handler({})", group),
        }
    }
}

/// Outcome of evaluating one input against the routing groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    Dispatch {
        group: String,
        handler: String,
        confidence: f32,
    },
    PassThrough {
        reason: PassThroughReason,
    },
}

impl RouteDecision {
    pub fn is_dispatch(&self) -> bool {
        matches!(self, RouteDecision::Dispatch { .. })
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Summary of the loaded routing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingStats {
    pub total_groups: usize,
    pub total_questions: usize,
    /// Distinct handler names, excluding the "none" sentinel, sorted.
    pub handlers: Vec<String>,
}

impl RoutingStats {
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}
