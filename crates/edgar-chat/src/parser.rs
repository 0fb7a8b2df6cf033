//! Input parsing helpers.
//!
//! Splits compound input into questions, extracts subjects and entities,
//! detects coarse topics, and classifies tree navigation phrases.

use regex::Regex;
use std::sync::LazyLock;

// =============================================================================
// Compiled regex sets (compiled once, reused across calls)
// =============================================================================

static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("Invalid sentence regex"));

static CONJUNCTION_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+and\s+|\s+then\s+|\s+also\s+").expect("Invalid conjunction regex")
});

static SUBJECT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"what is (.+?)\??$",
        r"what are (.+?)\??$",
        r"who is (.+?)\??$",
        r"where is (.+?)\??$",
        r"when is (.+?)\??$",
        r"why is (.+?)\??$",
        r"how does (.+?)\??$",
        r"tell me about (.+?)\??$",
        r"explain (.+?)\??$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid subject regex"))
    .collect()
});

static LEADING_ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(the|a|an)\s+").expect("Invalid article regex"));

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("Invalid word regex"));

struct NavigationPatterns {
    back: Vec<Regex>,
    options: Vec<Regex>,
    exit: Vec<Regex>,
}

static NAVIGATION_PATTERNS: LazyLock<NavigationPatterns> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid navigation regex"))
            .collect()
    };

    NavigationPatterns {
        back: mk(&[
            r"go back",
            r"^back$",
            r"previous",
            r"return to",
            r"never mind",
            r"not that",
            r"take me back",
        ]),
        options: mk(&[
            r"what are my options",
            r"what can i ask",
            r"what else",
            r"other options",
            r"show options",
            r"what are the choices",
        ]),
        exit: mk(&[
            r"^exit$",
            r"^quit$",
            r"stop",
            r"new topic",
            r"start over",
            r"main menu",
        ]),
    }
});

// Words never tracked as entities
static STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "am", "be", "been", "being",
    "have", "has", "had", "do", "does", "did", "will", "would", "shall", "should",
    "may", "might", "must", "can", "could", "i", "me", "my", "we", "our", "you",
    "your", "he", "she", "it", "they", "them", "his", "her", "its", "their",
    "what", "which", "who", "whom", "this", "that", "these", "those", "of", "in",
    "to", "for", "with", "on", "at", "from", "by", "about", "as", "into", "through",
    "during", "before", "after", "above", "below", "between", "and", "but", "or",
    "not", "no", "so", "if", "then", "than", "too", "very", "just", "also", "up",
    "out", "all", "any", "some", "how", "when", "where", "why", "tell", "more",
    "explain", "thank", "thanks", "hello", "hi", "there", "here", "please",
    "want", "know", "doing", "over", "under", "again", "each", "both",
];

/// Keyword table for topic detection: `(topic, keywords, weight)`.
static TOPIC_TABLE: &[(&str, &[&str], f32)] = &[
    ("greeting", &["hello", "hi", "hey", "greetings"], 2.0),
    ("thanks", &["thank", "thanks", "appreciate", "grateful"], 2.0),
    ("programming", &["python", "programming", "code", "developer"], 1.2),
    (
        "ai",
        &["machine learning", "artificial intelligence", "ai", "neural network"],
        1.2,
    ),
    ("gaming", &["godot", "game", "gaming", "engine", "blender"], 1.2),
    ("creative", &["blender", "3d", "animation", "modeling"], 1.2),
];

/// Minimum weighted keyword score for a topic to be adopted.
const TOPIC_MIN_SCORE: f32 = 1.0;

// =============================================================================
// Question splitting
// =============================================================================

/// Split compound input into individual questions.
///
/// Sentences end at `.`, `!` or `?`. A sentence joined with "and", "then" or
/// "also" is split further and fragments of two characters or fewer are
/// dropped. If nothing survives, the whole input is returned.
pub fn split_questions(text: &str) -> Vec<String> {
    let mut questions = Vec::new();

    for sentence in SENTENCE_SPLIT_RE.split(text) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        let lower = sentence.to_lowercase();
        if [" and ", " then ", " also "].iter().any(|sep| lower.contains(sep)) {
            questions.extend(
                CONJUNCTION_SPLIT_RE
                    .split(sentence)
                    .map(str::trim)
                    .filter(|part| part.chars().count() > 2)
                    .map(str::to_string),
            );
        } else {
            questions.push(sentence.to_string());
        }
    }

    if questions.is_empty() {
        vec![text.to_string()]
    } else {
        questions
    }
}

// =============================================================================
// Subject, entity and topic extraction
// =============================================================================

/// Extract the subject of a "what is X" style question.
pub fn extract_subject(text: &str) -> Option<String> {
    let lower = text.trim().to_lowercase();
    let caps = SUBJECT_PATTERNS.iter().find_map(|re| re.captures(&lower))?;
    let subject = caps.get(1)?.as_str().trim();
    let subject = LEADING_ARTICLE_RE.replace(subject, "").trim().to_string();
    (subject.chars().count() >= 2).then_some(subject)
}

/// Content words worth remembering: alphabetic, at least four letters and not
/// a stop word. Order of first appearance is kept.
pub fn extract_entities(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut entities: Vec<String> = Vec::new();
    for m in WORD_RE.find_iter(&lower) {
        let word = m.as_str();
        if word.chars().count() >= 4
            && word.chars().all(char::is_alphabetic)
            && !STOP_WORDS.contains(&word)
            && !entities.iter().any(|e| e == word)
        {
            entities.push(word.to_string());
        }
    }
    entities
}

/// Whether `phrase` occurs in `text` on word boundaries.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = text[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Detect a coarse topic from weighted keyword hits.
///
/// Returns `None` when no topic scores at least 1.0; ties go to the topic
/// listed first.
pub fn detect_topic(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let mut best: Option<(&'static str, f32)> = None;

    for &(topic, keywords, weight) in TOPIC_TABLE {
        let hits = keywords.iter().filter(|k| contains_phrase(&lower, k)).count();
        if hits == 0 {
            continue;
        }
        let score = hits as f32 * weight;
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((topic, score));
        }
    }

    best.filter(|(_, score)| *score >= TOPIC_MIN_SCORE)
        .map(|(topic, _)| topic)
}

// =============================================================================
// Navigation phrases
// =============================================================================

/// A tree navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Back,
    Options,
}

/// Classify `text` as a navigation command. Back phrases win over options.
pub fn classify_navigation(text: &str) -> Option<NavCommand> {
    let lower = text.trim().to_lowercase();
    let pats = &*NAVIGATION_PATTERNS;
    if pats.back.iter().any(|re| re.is_match(&lower)) {
        Some(NavCommand::Back)
    } else if pats.options.iter().any(|re| re.is_match(&lower)) {
        Some(NavCommand::Options)
    } else {
        None
    }
}

/// Whether `text` asks to leave the current follow-up tree.
pub fn is_exit_command(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    NAVIGATION_PATTERNS.exit.iter().any(|re| re.is_match(&lower))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- split_questions ----

    #[test]
    fn test_split_single_question() {
        assert_eq!(split_questions("what is python?"), vec!["what is python"]);
    }

    #[test]
    fn test_split_on_punctuation() {
        assert_eq!(
            split_questions("Hello! What is python? Tell me about godot."),
            vec!["Hello", "What is python", "Tell me about godot"]
        );
    }

    #[test]
    fn test_split_on_conjunctions() {
        assert_eq!(
            split_questions("what is python and what is godot then who are you"),
            vec!["what is python", "what is godot", "who are you"]
        );
    }

    #[test]
    fn test_split_conjunction_case_insensitive_match() {
        assert_eq!(
            split_questions("what is rust AND what is go"),
            vec!["what is rust", "what is go"]
        );
        assert_eq!(
            split_questions("what is rust and What Is Go"),
            vec!["what is rust", "What Is Go"]
        );
    }

    #[test]
    fn test_split_drops_short_fragments() {
        assert_eq!(split_questions("hi and what is python"), vec!["what is python"]);
    }

    #[test]
    fn test_split_keeps_short_plain_sentence() {
        assert_eq!(split_questions("ok"), vec!["ok"]);
    }

    #[test]
    fn test_split_only_punctuation_returns_input() {
        assert_eq!(split_questions("?!"), vec!["?!"]);
        assert_eq!(split_questions(""), vec![""]);
    }

    // ---- extract_subject ----

    #[test]
    fn test_subject_what_is() {
        assert_eq!(extract_subject("What is Python?"), Some("python".to_string()));
    }

    #[test]
    fn test_subject_strips_article() {
        assert_eq!(
            extract_subject("tell me about the godot engine"),
            Some("godot engine".to_string())
        );
        assert_eq!(extract_subject("what is an api"), Some("api".to_string()));
    }

    #[test]
    fn test_subject_too_short() {
        assert_eq!(extract_subject("what is x"), None);
    }

    #[test]
    fn test_subject_none_for_statements() {
        assert_eq!(extract_subject("hello there"), None);
    }

    // ---- extract_entities ----

    #[test]
    fn test_entities_filter_short_and_stop_words() {
        assert_eq!(
            extract_entities("Tell me about Python programming in 2024"),
            vec!["python", "programming"]
        );
    }

    #[test]
    fn test_entities_deduplicated() {
        assert_eq!(extract_entities("godot godot Godot"), vec!["godot"]);
    }

    // ---- detect_topic ----

    #[test]
    fn test_topic_greeting() {
        assert_eq!(detect_topic("Hello there"), Some("greeting"));
    }

    #[test]
    fn test_topic_programming() {
        assert_eq!(detect_topic("what is python"), Some("programming"));
    }

    #[test]
    fn test_topic_multi_word_keyword() {
        assert_eq!(detect_topic("explain machine learning"), Some("ai"));
    }

    #[test]
    fn test_topic_requires_word_boundary() {
        // "hi" inside "this", "ai" inside "explain"
        assert_eq!(detect_topic("explain this"), None);
    }

    #[test]
    fn test_topic_weight_breaks_ties() {
        // greeting (2.0) beats programming (1.2)
        assert_eq!(detect_topic("hey, python"), Some("greeting"));
        // two gaming hits (2.4) beat one creative hit (1.2); blender counts for both
        assert_eq!(detect_topic("blender game"), Some("gaming"));
    }

    #[test]
    fn test_topic_none() {
        assert_eq!(detect_topic("what's the weather like"), None);
    }

    // ---- navigation ----

    #[test]
    fn test_back_phrases() {
        for phrase in ["go back", "back", "Previous one", "never mind", "not that", "take me back"] {
            assert_eq!(classify_navigation(phrase), Some(NavCommand::Back), "{}", phrase);
        }
        assert_eq!(classify_navigation("backpack"), None);
    }

    #[test]
    fn test_options_phrases() {
        for phrase in ["What are my options?", "what else", "show options", "what can I ask"] {
            assert_eq!(classify_navigation(phrase), Some(NavCommand::Options), "{}", phrase);
        }
    }

    #[test]
    fn test_exit_phrases() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command(" Quit "));
        assert!(is_exit_command("let's start over"));
        assert!(is_exit_command("main menu please"));
        assert!(is_exit_command("how do I stop a loop"));
        assert!(!is_exit_command("exit the loop"));
        assert!(!is_exit_command("tell me about syntax"));
    }
}
