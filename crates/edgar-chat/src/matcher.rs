//! QA matching with tiered confidence.

use edgar_core::config::MatchingConfig;
use edgar_core::similarity::score;
use edgar_core::types::QuestionGroup;

use crate::types::MatchTier;

/// Outcome of matching one input against the loaded groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    Matched {
        group: usize,
        confidence: f32,
        tier: MatchTier,
    },
    /// A best match exists but falls below the confidence requirement.
    Rejected { group: usize, confidence: f32 },
    NoMatch,
}

/// Fixed tier cutoffs plus the acceptance floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierThresholds {
    pub exact: f32,
    pub high: f32,
    pub medium: f32,
    pub low: f32,
    pub min_acceptable: f32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

impl TierThresholds {
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            exact: config.exact_match,
            high: config.high_confidence,
            medium: config.medium_confidence,
            low: config.low_confidence,
            min_acceptable: config.min_acceptable,
        }
    }

    /// Bucket a score. Each cutoff is inclusive.
    pub fn tier(&self, score: f32) -> MatchTier {
        if score >= self.exact {
            MatchTier::Exact
        } else if score >= self.high {
            MatchTier::High
        } else if score >= self.medium {
            MatchTier::Medium
        } else if score >= self.low {
            MatchTier::Low
        } else {
            MatchTier::Semantic
        }
    }
}

/// Best-of-candidates matcher over question groups.
#[derive(Debug, Clone, Default)]
pub struct QaMatcher {
    thresholds: TierThresholds,
    /// 0.0 disables the gate.
    confidence_requirement: f32,
}

impl QaMatcher {
    pub fn new(thresholds: TierThresholds, confidence_requirement: f32) -> Self {
        Self {
            thresholds,
            confidence_requirement: confidence_requirement.clamp(0.0, 1.0),
        }
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    pub fn confidence_requirement(&self) -> f32 {
        self.confidence_requirement
    }

    pub fn set_confidence_requirement(&mut self, requirement: f32) {
        self.confidence_requirement = requirement;
    }

    /// Whether `confidence` fails an active confidence requirement.
    pub fn rejects(&self, confidence: f32) -> bool {
        self.confidence_requirement > 0.0 && confidence < self.confidence_requirement
    }

    /// Score `input` against every phrasing of every group.
    ///
    /// Only a strictly higher score replaces the running best, so ties keep
    /// the earliest group.
    pub fn find_best_match(&self, groups: &[QuestionGroup], input: &str) -> MatchOutcome {
        let mut best: Option<(usize, f32)> = None;

        for (index, group) in groups.iter().enumerate() {
            for question in &group.questions {
                let s = score(input, question);
                if s < self.thresholds.min_acceptable {
                    continue;
                }
                if best.is_none_or(|(_, top)| s > top) {
                    best = Some((index, s));
                }
            }
        }

        let Some((group, confidence)) = best else {
            return MatchOutcome::NoMatch;
        };

        if self.rejects(confidence) {
            tracing::debug!(
                group = %groups[group].name,
                confidence,
                requirement = self.confidence_requirement,
                "Match below confidence requirement"
            );
            return MatchOutcome::Rejected { group, confidence };
        }

        MatchOutcome::Matched {
            group,
            confidence,
            tier: self.thresholds.tier(confidence),
        }
    }
}
