//! Conversation context management.
//!
//! Tracks topic, mentioned entities, recent subjects and a rolling history
//! window in fixed-capacity rings, and keeps the engine's running counters.

use std::collections::VecDeque;

use chrono::Local;
use edgar_core::config::ContextConfig;
use edgar_core::types::QuestionGroup;
use serde::{Deserialize, Serialize};

use crate::parser;
use crate::types::EngineStats;

/// Weight kept from the previous consistency score on each update.
const CONSISTENCY_DECAY: f32 = 0.7;

/// History entries inspected for topic consistency.
const CONSISTENCY_WINDOW: usize = 3;

// =============================================================================
// RingBuffer
// =============================================================================

/// Fixed-capacity FIFO that evicts its oldest item on overflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a ring holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `item`, returning the evicted item if the ring was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// The newest `n` items, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        self.items.iter().skip(self.items.len().saturating_sub(n))
    }
}

impl<T: PartialEq> RingBuffer<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }
}

// =============================================================================
// ConversationContext
// =============================================================================

/// One exchange in the rolling history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub input: String,
    pub output: String,
    pub confidence: f32,
    /// Authored topic of the matched group, if any.
    pub topic: Option<String>,
    pub timestamp: i64,
}

/// Bounded conversational memory for one engine instance.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub current_topic: Option<String>,
    pub previous_topics: RingBuffer<String>,
    pub mentioned_entities: RingBuffer<String>,
    pub recent_subjects: RingBuffer<String>,
    pub history: RingBuffer<HistoryEntry>,
    /// Index into the engine's loaded groups.
    pub last_successful_match: Option<usize>,
    pub topic_consistency_score: f32,
    config: ContextConfig,
    medium_confidence: f32,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(&ContextConfig::default(), 0.60)
    }
}

impl ConversationContext {
    /// `medium_confidence` is the score a match needs to be remembered as
    /// the last successful one.
    pub fn new(config: &ContextConfig, medium_confidence: f32) -> Self {
        Self {
            current_topic: None,
            previous_topics: RingBuffer::new(config.previous_topics_size),
            mentioned_entities: RingBuffer::new(config.entities_size),
            recent_subjects: RingBuffer::new(config.subjects_size),
            history: RingBuffer::new(config.history_size),
            last_successful_match: None,
            topic_consistency_score: 1.0,
            config: config.clone(),
            medium_confidence,
        }
    }

    /// Reinitialize every field and ring.
    pub fn reset(&mut self) {
        *self = Self::new(&self.config, self.medium_confidence);
    }

    /// Record one exchange and update topic, entities and counters.
    ///
    /// `matched` is the answering group with its index, if any.
    pub fn update(
        &mut self,
        input: &str,
        output: &str,
        matched: Option<(usize, &QuestionGroup)>,
        confidence: f32,
        stats: &mut EngineStats,
    ) {
        let confidence = confidence.clamp(0.0, 1.0);
        let group_topic = matched
            .map(|(_, g)| g.topic.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        self.history.push(HistoryEntry {
            input: input.to_string(),
            output: output.to_string(),
            confidence,
            topic: group_topic,
            timestamp: Local::now().timestamp(),
        });

        for entity in parser::extract_entities(input) {
            if !self.mentioned_entities.contains(&entity) {
                self.mentioned_entities.push(entity);
            }
        }

        if let Some(subject) = parser::extract_subject(input) {
            if !self.recent_subjects.contains(&subject) {
                self.recent_subjects.push(subject);
            }
        }

        let topic = self.update_topic(input);
        self.update_topic_consistency(&topic);

        match matched {
            Some((index, _)) if confidence >= self.medium_confidence => {
                self.last_successful_match = Some(index);
                stats.successful_matches += 1;
            }
            Some(_) => stats.successful_matches += 1,
            None if confidence > 0.0 => stats.successful_matches += 1,
            None => stats.failed_matches += 1,
        }
        stats.total_questions += 1;
    }

    /// Adopt a detected topic, archiving the previous one. Returns the
    /// effective topic (the current one, or "general").
    fn update_topic(&mut self, input: &str) -> String {
        if let Some(detected) = parser::detect_topic(input) {
            if self.current_topic.as_deref() != Some(detected) {
                if let Some(previous) = self.current_topic.take() {
                    self.previous_topics.push(previous);
                }
                tracing::debug!(topic = detected, "Topic changed");
                self.current_topic = Some(detected.to_string());
            }
        }
        self.current_topic
            .clone()
            .unwrap_or_else(|| "general".to_string())
    }

    fn update_topic_consistency(&mut self, topic: &str) {
        let recent: Vec<&str> = self
            .history
            .recent(CONSISTENCY_WINDOW)
            .filter_map(|entry| entry.topic.as_deref())
            .collect();
        if recent.is_empty() {
            return;
        }
        let same = recent.iter().filter(|t| **t == topic).count();
        let consistency = same as f32 / recent.len() as f32;
        self.topic_consistency_score = (self.topic_consistency_score * CONSISTENCY_DECAY
            + consistency * (1.0 - CONSISTENCY_DECAY))
            .clamp(0.0, 1.0);
    }

    /// Most recently extracted subject.
    pub fn last_subject(&self) -> Option<&str> {
        self.recent_subjects.last().map(String::as_str)
    }

    /// One-line summary: topic with consistency, recent entities, and the
    /// tree position when one is given.
    pub fn summary(&self, tree_position: Option<&str>) -> String {
        let mut parts = Vec::new();

        if let Some(topic) = &self.current_topic {
            parts.push(format!("Topic: {} ({:.1})", topic, self.topic_consistency_score));
        }

        if !self.mentioned_entities.is_empty() {
            let recent: Vec<&str> = self
                .mentioned_entities
                .recent(3)
                .map(String::as_str)
                .collect();
            parts.push(format!("Recent: {}", recent.join(", ")));
        }

        if let Some(position) = tree_position {
            parts.push(format!("Tree: {}", position));
        }

        if parts.is_empty() {
            "Minimal context".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> (ConversationContext, EngineStats) {
        (ConversationContext::default(), EngineStats::default())
    }

    fn python() -> QuestionGroup {
        QuestionGroup {
            topic: "programming".to_string(),
            ..QuestionGroup::new("Python", &["what is python"], &["A language."])
        }
    }

    // ---- RingBuffer ----

    #[test]
    fn test_ring_evicts_oldest() {
        let mut ring = RingBuffer::new(3);
        for i in 0..3 {
            assert_eq!(ring.push(i), None);
        }
        assert_eq!(ring.push(3), Some(0));
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.last(), Some(&3));
    }

    #[test]
    fn test_ring_never_exceeds_capacity() {
        let mut ring = RingBuffer::new(5);
        for i in 0..100 {
            ring.push(i);
            assert!(ring.len() <= ring.capacity());
        }
        assert!(ring.contains(&99));
        assert!(!ring.contains(&94));
    }

    #[test]
    fn test_ring_zero_capacity_holds_one() {
        let mut ring = RingBuffer::new(0);
        ring.push("a");
        ring.push("b");
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![&"b"]);
    }

    #[test]
    fn test_ring_recent() {
        let mut ring = RingBuffer::new(6);
        for i in 0..5 {
            ring.push(i);
        }
        assert_eq!(ring.recent(3).copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(ring.recent(10).count(), 5);
        ring.clear();
        assert!(ring.is_empty());
    }

    // ---- update ----

    #[test]
    fn test_update_records_history_and_counters() {
        let (mut c, mut stats) = ctx();
        let g = python();
        c.update("what is python", "A language.", Some((0, &g)), 1.0, &mut stats);

        assert_eq!(c.history.len(), 1);
        let entry = c.history.last().unwrap();
        assert_eq!(entry.topic.as_deref(), Some("programming"));
        assert!(entry.timestamp > 0);
        assert_eq!(c.last_successful_match, Some(0));
        assert_eq!(stats.successful_matches, 1);
        assert_eq!(stats.total_questions, 1);
        assert_eq!(stats.failed_matches, 0);
    }

    #[test]
    fn test_low_confidence_match_not_remembered() {
        let (mut c, mut stats) = ctx();
        let g = python();
        c.update("pythonish", "A language.", Some((0, &g)), 0.5, &mut stats);
        assert_eq!(c.last_successful_match, None);
        assert_eq!(stats.successful_matches, 1);
    }

    #[test]
    fn test_unmatched_turn_counts_failure() {
        let (mut c, mut stats) = ctx();
        c.update("blorp", "I don't know.", None, 0.0, &mut stats);
        assert_eq!(stats.failed_matches, 1);
        assert_eq!(stats.total_questions, 1);

        c.update("go back", "Okay.", None, 0.9, &mut stats);
        assert_eq!(stats.successful_matches, 1);
        assert_eq!(stats.failed_matches, 1);
    }

    #[test]
    fn test_entities_and_subjects_deduplicated() {
        let (mut c, mut stats) = ctx();
        c.update("what is python", "x", None, 0.0, &mut stats);
        c.update("tell me about python", "x", None, 0.0, &mut stats);
        assert_eq!(c.mentioned_entities.iter().collect::<Vec<_>>(), vec!["python"]);
        assert_eq!(c.recent_subjects.len(), 1);
        assert_eq!(c.last_subject(), Some("python"));
    }

    #[test]
    fn test_history_capacity() {
        let (mut c, mut stats) = ctx();
        for i in 0..10 {
            c.update(&format!("question {}", i), "x", None, 0.0, &mut stats);
        }
        assert_eq!(c.history.len(), 6);
        assert_eq!(c.history.iter().next().unwrap().input, "question 4");
    }

    #[test]
    fn test_topic_change_archives_previous() {
        let (mut c, mut stats) = ctx();
        c.update("hello", "Hi!", None, 0.9, &mut stats);
        assert_eq!(c.current_topic.as_deref(), Some("greeting"));
        c.update("what is python", "x", None, 0.9, &mut stats);
        assert_eq!(c.current_topic.as_deref(), Some("programming"));
        assert_eq!(c.previous_topics.iter().collect::<Vec<_>>(), vec!["greeting"]);
        // No detectable topic keeps the current one
        c.update("and then?", "x", None, 0.9, &mut stats);
        assert_eq!(c.current_topic.as_deref(), Some("programming"));
        assert_eq!(c.previous_topics.len(), 1);
    }

    #[test]
    fn test_topic_consistency_decays_on_mismatch() {
        let (mut c, mut stats) = ctx();
        let g = python();
        c.update("what is python", "x", Some((0, &g)), 1.0, &mut stats);
        assert!((c.topic_consistency_score - 1.0).abs() < 1e-6);

        c.update("hello", "x", Some((0, &g)), 1.0, &mut stats);
        // "greeting" matches neither of the two recent "programming" turns
        assert!((c.topic_consistency_score - 0.7).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&c.topic_consistency_score));
    }

    #[test]
    fn test_topic_consistency_untouched_without_matched_topics() {
        let (mut c, mut stats) = ctx();
        c.update("hello", "x", None, 0.0, &mut stats);
        assert_eq!(c.topic_consistency_score, 1.0);
    }

    // ---- summary & reset ----

    #[test]
    fn test_summary_minimal() {
        let (c, _) = ctx();
        assert_eq!(c.summary(None), "Minimal context");
    }

    #[test]
    fn test_summary_full() {
        let (mut c, mut stats) = ctx();
        c.update("tell me about python programming", "x", None, 0.9, &mut stats);
        assert_eq!(
            c.summary(Some("Root")),
            "Topic: programming (1.0) | Recent: python, programming | Tree: Root"
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut c, mut stats) = ctx();
        let g = python();
        c.update("what is python", "x", Some((0, &g)), 1.0, &mut stats);
        c.reset();
        assert!(c.history.is_empty());
        assert!(c.mentioned_entities.is_empty());
        assert!(c.recent_subjects.is_empty());
        assert_eq!(c.current_topic, None);
        assert_eq!(c.last_successful_match, None);
        assert_eq!(c.topic_consistency_score, 1.0);
        assert_eq!(c.history.capacity(), 6);
        // Counters live outside the context
        assert_eq!(stats.total_questions, 1);
    }
}
