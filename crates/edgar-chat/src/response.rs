//! Response composition for matched and unmatched turns.
//!
//! Answers within a group are interchangeable paraphrases, so selection is
//! uniform-random. Unmatched input gets a canned fallback, optionally
//! mentioning the extracted subject or steering toward the current topic.

use rand::seq::IndexedRandom;
use rand::Rng;

/// Returned when a matched group or branch carries no answers.
pub const NO_ANSWER: &str = "I don't have an answer for that.";

/// Fallback lines used for every unmatched turn.
pub const BASE_FALLBACKS: &[&str] = &[
    "I'm not sure about that yet. Could you ask something else?",
    "I don't have information about that currently.",
    "That's beyond my knowledge at the moment.",
];

/// Topics that add a guidance line to the fallback pool.
const TOPIC_GUIDANCE: &[(&str, &str)] = &[
    ("programming", "I can help with programming topics like Python!"),
    (
        "ai",
        "I know about AI, machine learning, and related technologies!",
    ),
    (
        "gaming",
        "I can tell you about game development and engines like Godot!",
    ),
];

// =============================================================================
// ResponseComposer
// =============================================================================

/// Picks answer and fallback text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseComposer;

impl ResponseComposer {
    pub fn new() -> Self {
        Self
    }

    /// Choose one of `answers` uniformly, or [`NO_ANSWER`] when empty.
    pub fn choose_answer<R: Rng + ?Sized>(&self, answers: &[String], rng: &mut R) -> String {
        answers
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| NO_ANSWER.to_string())
    }

    /// Candidate fallback lines for an unmatched turn.
    ///
    /// Subject lines come first, then the base lines, then a guidance line
    /// when `topic` has one.
    pub fn fallback_pool(&self, subject: Option<&str>, topic: Option<&str>) -> Vec<String> {
        let mut pool = Vec::with_capacity(BASE_FALLBACKS.len() + 3);

        if let Some(subject) = subject.filter(|s| !s.is_empty()) {
            pool.push(format!("I don't know about {} specifically.", subject));
            pool.push(format!("I'm not familiar with {}.", subject));
        }

        pool.extend(BASE_FALLBACKS.iter().map(|s| s.to_string()));

        if let Some((_, guidance)) = topic.and_then(|t| TOPIC_GUIDANCE.iter().find(|(k, _)| *k == t)) {
            pool.push(guidance.to_string());
        }

        pool
    }

    /// Choose a fallback line from [`fallback_pool`](Self::fallback_pool).
    pub fn fallback<R: Rng + ?Sized>(
        &self,
        subject: Option<&str>,
        topic: Option<&str>,
        rng: &mut R,
    ) -> String {
        let pool = self.fallback_pool(subject, topic);
        pool.choose(rng)
            .cloned()
            .unwrap_or_else(|| BASE_FALLBACKS[0].to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
