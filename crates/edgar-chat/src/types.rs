//! Per-turn records, match classification and engine counters.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Match classification
// =============================================================================

/// Confidence bucket of a successful QA match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    High,
    Medium,
    Low,
    Semantic,
}

/// How a turn was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    HighConfidence,
    MediumConfidence,
    LowConfidence,
    Semantic,
    TreeBranch,
    Navigation,
    ConfidenceRejection,
    Routed,
    Unknown,
}

impl From<MatchTier> for MatchType {
    fn from(tier: MatchTier) -> Self {
        match tier {
            MatchTier::Exact => MatchType::Exact,
            MatchTier::High => MatchType::HighConfidence,
            MatchTier::Medium => MatchType::MediumConfidence,
            MatchTier::Low => MatchType::LowConfidence,
            MatchTier::Semantic => MatchType::Semantic,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            MatchType::Exact => "exact",
            MatchType::HighConfidence => "high_confidence",
            MatchType::MediumConfidence => "medium_confidence",
            MatchType::LowConfidence => "low_confidence",
            MatchType::Semantic => "semantic",
            MatchType::TreeBranch => "tree_branch",
            MatchType::Navigation => "navigation",
            MatchType::ConfidenceRejection => "confidence_rejection",
            MatchType::Routed => "routed",
            MatchType::Unknown => "unknown",
        };
        write!(f, "{}", tag)
    }
}

// =============================================================================
// Turn output
// =============================================================================

/// One answered question. A single input may produce several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub original_question: String,
    pub answer: String,
    pub confidence: f32,
    /// Auto-correction candidates as `(question, score 0-100)`.
    pub corrections: Vec<(String, u8)>,
    pub matched_group: Option<String>,
    pub match_type: MatchType,
    /// Set while a follow-up tree is active after this turn.
    pub tree_position: Option<String>,
    pub available_branches: Option<String>,
    /// Handler that produced a routed answer.
    pub source: Option<String>,
}

impl TurnRecord {
    pub fn new(question: &str, answer: impl Into<String>, confidence: f32, match_type: MatchType) -> Self {
        Self {
            original_question: question.to_string(),
            answer: answer.into(),
            confidence: confidence.clamp(0.0, 1.0),
            corrections: Vec::new(),
            matched_group: None,
            match_type,
            tree_position: None,
            available_branches: None,
            source: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.matched_group = Some(group.into());
        self
    }

    pub fn with_corrections(mut self, corrections: Vec<(String, u8)>) -> Self {
        self.corrections = corrections;
        self
    }
}

// =============================================================================
// Counters
// =============================================================================

/// Running counters for one engine instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub total_questions: u64,
    pub successful_matches: u64,
    pub failed_matches: u64,
    /// Turns handled while a follow-up tree was active.
    pub follow_up_requests: u64,
    pub tree_entries: u64,
    pub tree_navigations: u64,
    pub tree_exits: u64,
    pub confidence_rejections: u64,
}

impl EngineStats {
    /// Successful matches as a percentage of all questions.
    pub fn success_rate(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            self.successful_matches as f64 * 100.0 / self.total_questions as f64
        }
    }
}

/// Snapshot of the engine's effective settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfiguration {
    pub model: Option<String>,
    pub groups: usize,
    pub confidence_requirement: f32,
    pub routing_enabled: bool,
    pub routing_threshold: f32,
    pub routing_groups: usize,
    pub handlers: Vec<String>,
    pub wpm: u32,
    pub letter_mode: bool,
    pub speed_limit: bool,
}
