//! Auto-correction of noisy input against the known question corpus.

use std::collections::HashSet;

use edgar_core::config::MatchingConfig;
use edgar_core::similarity::{normalize, partial_ratio};

/// Inputs this short (in characters, after trimming) are never corrected.
const MIN_CORRECTABLE_LEN: usize = 3;

/// How many ranked candidates are considered.
const CANDIDATE_LIMIT: usize = 5;

/// Function words ignored by the semantic guard.
const FUNCTION_WORDS: &[&str] = &[
    "what", "is", "are", "how", "why", "when", "where", "who", "tell", "me", "about",
];

/// Result of a correction attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// Text to match with: the replacement if applied, else the input.
    pub text: String,
    /// Viable candidates as `(question, partial ratio)`, best first.
    pub candidates: Vec<(String, u8)>,
    pub applied: bool,
}

impl Correction {
    fn unchanged(input: &str) -> Self {
        Self {
            text: input.to_string(),
            candidates: Vec::new(),
            applied: false,
        }
    }
}

/// Rewrites garbled input into a known question when the match is strong.
#[derive(Debug, Clone)]
pub struct Corrector {
    min_confidence: u8,
    apply_threshold: u8,
    semantic_check: bool,
}

impl Default for Corrector {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

impl Corrector {
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            min_confidence: config.correction_min_confidence,
            apply_threshold: config.correction_apply_threshold,
            semantic_check: config.correction_semantic_check,
        }
    }

    /// Try to correct `input` against `known` questions.
    pub fn correct<S: AsRef<str>>(&self, input: &str, known: &[S]) -> Correction {
        let trimmed = input.trim();
        if trimmed.chars().count() <= MIN_CORRECTABLE_LEN {
            return Correction::unchanged(input);
        }

        let lower = trimmed.to_lowercase();
        if known
            .iter()
            .any(|q| q.as_ref().trim().to_lowercase() == lower)
        {
            return Correction::unchanged(input);
        }

        let mut ranked: Vec<(&str, u8)> = known
            .iter()
            .map(|q| (q.as_ref(), partial_ratio(input, q.as_ref())))
            .collect();
        // Stable: equal scores keep corpus order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(CANDIDATE_LIMIT);

        let candidates: Vec<(String, u8)> = ranked
            .into_iter()
            .filter(|(_, score)| *score >= self.min_confidence)
            .filter(|(q, _)| !self.semantic_check || shares_content_word(input, q))
            .map(|(q, score)| (q.to_string(), score))
            .collect();

        match candidates.first() {
            Some((best, score)) if *score >= self.apply_threshold => {
                tracing::debug!(input = %input, corrected = %best, score, "Input auto-corrected");
                Correction {
                    text: best.clone(),
                    candidates,
                    applied: true,
                }
            }
            _ => Correction {
                text: input.to_string(),
                candidates,
                applied: false,
            },
        }
    }
}

fn content_words(text: &str) -> HashSet<String> {
    normalize(text)
        .split(' ')
        .filter(|w| !w.is_empty() && !FUNCTION_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Whether the two texts share at least one non-function word.
fn shares_content_word(a: &str, b: &str) -> bool {
    let a = content_words(a);
    content_words(b).iter().any(|w| a.contains(w))
}
