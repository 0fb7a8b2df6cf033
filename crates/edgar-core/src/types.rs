use serde::{Deserialize, Serialize};

/// Handler name that marks a routing group as "do not redirect".
pub const NO_HANDLER: &str = "none";

// =============================================================================
// Enums
// =============================================================================

/// Authoring priority of a question group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

// =============================================================================
// Model file
// =============================================================================

/// A node in an authored follow-up tree.
///
/// `question` is the phrase that selects this node from its parent level;
/// `children` become the next set of selectable branches once it is entered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowUpNode {
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub children: Vec<FollowUpNode>,
}

impl FollowUpNode {
    /// Create a leaf node.
    pub fn leaf(branch_name: &str, question: &str, answer: &str) -> Self {
        Self {
            branch_name: branch_name.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(FollowUpNode::subtree_len).sum::<usize>()
    }
}

/// An authored unit of alternate phrasings and interchangeable answers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionGroup {
    #[serde(rename = "group_name", default)]
    pub name: String,
    #[serde(rename = "group_description", default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub follow_ups: Vec<FollowUpNode>,
}

impl QuestionGroup {
    /// Create a group with a single phrasing and answer list.
    pub fn new(name: &str, questions: &[&str], answers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            questions: questions.iter().map(|q| q.to_string()).collect(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Whether matching this group should enter a follow-up tree.
    pub fn has_follow_ups(&self) -> bool {
        !self.follow_ups.is_empty()
    }
}

/// On-disk model document: `{ "qa_groups": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub qa_groups: Vec<QuestionGroup>,
}

// =============================================================================
// Routing file
// =============================================================================

fn default_group_threshold() -> f32 {
    0.75
}

fn default_max_words() -> usize {
    10
}

fn default_penalty_per_word() -> f32 {
    0.02
}

/// A group of phrases that redirect input to a named handler.
///
/// `confidence_threshold` is carried for authoring tools; dispatch decisions
/// use the engine-wide routing threshold instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingGroup {
    #[serde(rename = "group_name", default)]
    pub name: String,
    #[serde(rename = "engine", default)]
    pub handler_name: String,
    #[serde(default = "default_group_threshold")]
    pub confidence_threshold: f32,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub word_limit_enabled: bool,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    #[serde(default = "default_penalty_per_word")]
    pub penalty_per_word: f32,
}

impl Default for RoutingGroup {
    fn default() -> Self {
        Self {
            name: String::new(),
            handler_name: NO_HANDLER.to_string(),
            confidence_threshold: default_group_threshold(),
            questions: Vec::new(),
            word_limit_enabled: false,
            max_words: default_max_words(),
            penalty_per_word: default_penalty_per_word(),
        }
    }
}

impl RoutingGroup {
    /// Whether this group's handler is the "do not redirect" sentinel.
    pub fn is_passthrough(&self) -> bool {
        self.handler_name.trim().is_empty() || self.handler_name.eq_ignore_ascii_case(NO_HANDLER)
    }
}

/// On-disk routing document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingFile {
    #[serde(default)]
    pub routing_groups: Vec<RoutingGroup>,
    #[serde(default)]
    pub available_engines: Vec<String>,
    #[serde(default = "default_routing_version")]
    pub version: String,
}

fn default_routing_version() -> String {
    "1.0".to_string()
}

impl Default for RoutingFile {
    fn default() -> Self {
        Self {
            routing_groups: Vec::new(),
            available_engines: Vec::new(),
            version: default_routing_version(),
        }
    }
}
