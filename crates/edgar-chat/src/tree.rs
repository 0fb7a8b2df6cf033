//! Follow-up tree navigation.
//!
//! A matched group's follow-up forest is flattened into an arena on entry.
//! Navigation state refers to nodes by [`NodeId`]; the authored
//! [`FollowUpNode`]s are never borrowed past entry.

use chrono::Local;
use edgar_core::similarity::score;
use edgar_core::types::{FollowUpNode, QuestionGroup};
use tracing::info;

use crate::parser::{self, NavCommand};

pub const ALREADY_AT_START: &str = "We're already at the beginning of this conversation.";
pub const NO_MORE_OPTIONS: &str = "There are no more options at this level.";

/// Index of a node in a [`FollowUpTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A flattened follow-up node.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub branch_name: String,
    pub question: String,
    pub answer: String,
    pub children: Vec<NodeId>,
}

/// Arena holding one group's follow-up forest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowUpTree {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
}

impl FollowUpTree {
    pub fn from_forest(forest: &[FollowUpNode]) -> Self {
        let mut tree = Self::default();
        tree.roots = forest.iter().map(|node| tree.insert(node)).collect();
        tree
    }

    fn insert(&mut self, node: &FollowUpNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            branch_name: node.branch_name.clone(),
            question: node.question.clone(),
            answer: node.answer.clone(),
            children: Vec::new(),
        });
        let children: Vec<NodeId> = node.children.iter().map(|c| self.insert(c)).collect();
        self.nodes[id.0].children = children;
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn name(&self, id: NodeId) -> &str {
        self.node(id).map_or("Unknown", |n| n.branch_name.as_str())
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).map(|n| n.children.clone()).unwrap_or_default()
    }
}

/// State of an entered tree.
#[derive(Debug, Clone)]
struct ActiveTree {
    group: usize,
    group_name: String,
    tree: FollowUpTree,
    current: Option<NodeId>,
    path: Vec<NodeId>,
    available: Vec<NodeId>,
    messages: u32,
    started_at: i64,
}

/// Result of a handled navigation command.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationReply {
    pub command: NavCommand,
    pub text: String,
}

/// Follow-up tree state machine: Idle when no tree is active.
#[derive(Debug, Clone, Default)]
pub struct TreeNavigator {
    active: Option<ActiveTree>,
}

impl TreeNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Index of the group whose tree is active.
    pub fn active_group(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.group)
    }

    pub fn active_group_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.group_name.as_str())
    }

    pub fn current_branch(&self) -> Option<&TreeNode> {
        let active = self.active.as_ref()?;
        active.tree.node(active.current?)
    }

    pub fn branch_path(&self) -> &[NodeId] {
        self.active.as_ref().map_or(&[], |a| a.path.as_slice())
    }

    pub fn available(&self) -> &[NodeId] {
        self.active.as_ref().map_or(&[], |a| a.available.as_slice())
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.active.as_ref()?.tree.node(id)
    }

    /// Messages handled inside the current tree.
    pub fn messages(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.messages)
    }

    /// Unix timestamp of entry into the current tree.
    pub fn started_at(&self) -> Option<i64> {
        self.active.as_ref().map(|a| a.started_at)
    }

    /// Enter `group`'s tree. No-op returning `false` when the group has no
    /// follow-ups or a tree is already active.
    pub fn enter(&mut self, index: usize, group: &QuestionGroup) -> bool {
        if self.is_active() || !group.has_follow_ups() {
            return false;
        }
        let tree = FollowUpTree::from_forest(&group.follow_ups);
        let available = tree.roots().to_vec();
        info!(group = %group.name, nodes = tree.len(), "Entered follow-up tree");
        self.active = Some(ActiveTree {
            group: index,
            group_name: group.name.clone(),
            tree,
            current: None,
            path: Vec::new(),
            available,
            messages: 0,
            started_at: Local::now().timestamp(),
        });
        true
    }

    /// Leave the active tree. Returns `false` when already Idle.
    pub fn exit(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                info!(
                    group = %active.group_name,
                    messages = active.messages,
                    "Exited follow-up tree"
                );
                true
            }
            None => false,
        }
    }

    /// Move to `id`, pushing the previous current node (if any) on the path.
    /// Returns the node's answer.
    pub fn navigate_to(&mut self, id: NodeId) -> Option<String> {
        let active = self.active.as_mut()?;
        let node = active.tree.node(id)?;
        let answer = node.answer.clone();
        let children = node.children.clone();
        if let Some(previous) = active.current.replace(id) {
            active.path.push(previous);
        }
        active.available = children;
        active.messages += 1;
        Some(answer)
    }

    /// Pop the branch path into the current node.
    ///
    /// The popped node becomes current. Available branches become its
    /// children while the path is still non-empty, otherwise the tree roots.
    /// Returns `false` (no state change) when the path is empty.
    pub fn navigate_back(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let Some(previous) = active.path.pop() else {
            return false;
        };
        active.current = Some(previous);
        active.available = if active.path.is_empty() {
            active.tree.roots().to_vec()
        } else {
            active.tree.children(previous)
        };
        active.messages += 1;
        true
    }

    /// "Root" or the visited branch names joined by " → ". `None` when Idle.
    pub fn position(&self) -> Option<String> {
        let active = self.active.as_ref()?;
        let names: Vec<&str> = active
            .path
            .iter()
            .chain(active.current.iter())
            .map(|id| active.tree.name(*id))
            .collect();
        Some(if names.is_empty() {
            "Root".to_string()
        } else {
            names.join(" → ")
        })
    }

    /// Human-readable list of the available branch names.
    pub fn available_text(&self) -> String {
        let Some(active) = self.active.as_ref() else {
            return NO_MORE_OPTIONS.to_string();
        };
        if active.available.is_empty() {
            return NO_MORE_OPTIONS.to_string();
        }
        let names: Vec<&str> = active
            .available
            .iter()
            .map(|id| active.tree.name(*id))
            .collect();
        format!("Available options: {}", names.join(", "))
    }

    /// Handle a back or options command. `None` when Idle or when `input`
    /// is not a navigation phrase.
    pub fn handle_command(&mut self, input: &str) -> Option<NavigationReply> {
        if !self.is_active() {
            return None;
        }
        let command = parser::classify_navigation(input)?;
        let text = match command {
            NavCommand::Back => {
                if self.navigate_back() {
                    format!(
                        "Okay, going back to {}.",
                        self.position().unwrap_or_else(|| "Root".to_string())
                    )
                } else {
                    ALREADY_AT_START.to_string()
                }
            }
            NavCommand::Options => self.available_text(),
        };
        Some(NavigationReply { command, text })
    }

    /// Best available branch for `input`: strict maximum at or above `floor`.
    pub fn find_branch(&self, input: &str, floor: f32) -> Option<(NodeId, f32)> {
        let active = self.active.as_ref()?;
        let mut best: Option<(NodeId, f32)> = None;
        for &id in &active.available {
            let Some(node) = active.tree.node(id) else {
                continue;
            };
            if node.question.trim().is_empty() {
                continue;
            }
            let s = score(input, &node.question);
            if s >= floor && best.is_none_or(|(_, top)| s > top) {
                best = Some((id, s));
            }
        }
        best
    }

    /// Whether `input` should end the active tree.
    ///
    /// Explicit exit phrases always do. Without a branch match, input that
    /// resembles another group's question above `threshold` is treated as a
    /// change of topic.
    pub fn should_exit(
        &self,
        input: &str,
        branch_matched: bool,
        groups: &[QuestionGroup],
        threshold: f32,
    ) -> bool {
        let Some(active) = self.active.as_ref() else {
            return false;
        };
        if parser::is_exit_command(input) {
            return true;
        }
        if branch_matched {
            return false;
        }
        groups
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != active.group)
            .flat_map(|(_, g)| g.questions.iter())
            .any(|q| score(input, q) > threshold)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn python_group() -> QuestionGroup {
        let mut group = QuestionGroup::new(
            "Python",
            &["what is python"],
            &["Python is a programming language."],
        );
        group.follow_ups = vec![
            FollowUpNode {
                branch_name: "Syntax".into(),
                question: "tell me about syntax".into(),
                answer: "Indentation matters.".into(),
                children: vec![
                    FollowUpNode {
                        branch_name: "Loops".into(),
                        question: "how do loops work".into(),
                        answer: "Use for and while.".into(),
                        children: vec![FollowUpNode::leaf(
                            "Comprehensions",
                            "what about comprehensions",
                            "They build lists inline.",
                        )],
                    },
                    FollowUpNode::leaf("Indentation", "why indentation", "Blocks."),
                ],
            },
            FollowUpNode::leaf("Libraries", "which libraries exist", "Plenty."),
        ];
        group
    }

    fn entered() -> TreeNavigator {
        let mut nav = TreeNavigator::new();
        assert!(nav.enter(0, &python_group()));
        nav
    }

    fn go(nav: &mut TreeNavigator, input: &str) -> String {
        let (id, _) = nav.find_branch(input, 0.35).expect("branch match");
        nav.navigate_to(id).unwrap()
    }

    // ---- arena ----

    #[test]
    fn test_arena_flattening() {
        let tree = FollowUpTree::from_forest(&python_group().follow_ups);
        assert_eq!(tree.len(), python_group().follow_ups.iter().map(|n| n.subtree_len()).sum::<usize>());
        assert_eq!(tree.roots().len(), 2);
        let syntax = tree.node(tree.roots()[0]).unwrap();
        assert_eq!(syntax.branch_name, "Syntax");
        assert_eq!(syntax.children.len(), 2);
        let loops = tree.node(syntax.children[0]).unwrap();
        assert_eq!(loops.children.len(), 1);
    }

    // ---- entry / exit ----

    #[test]
    fn test_enter_requires_follow_ups() {
        let mut nav = TreeNavigator::new();
        let plain = QuestionGroup::new("Hello", &["hello"], &["Hi"]);
        assert!(!nav.enter(1, &plain));
        assert!(!nav.is_active());
        assert_eq!(nav.position(), None);
    }

    #[test]
    fn test_enter_initial_state() {
        let nav = entered();
        assert!(nav.is_active());
        assert_eq!(nav.active_group(), Some(0));
        assert_eq!(nav.active_group_name(), Some("Python"));
        assert!(nav.current_branch().is_none());
        assert!(nav.branch_path().is_empty());
        assert_eq!(nav.available().len(), 2);
        assert_eq!(nav.position().as_deref(), Some("Root"));
        assert!(nav.started_at().is_some());
    }

    #[test]
    fn test_enter_while_active_is_noop() {
        let mut nav = entered();
        go(&mut nav, "tell me about syntax");
        assert!(!nav.enter(3, &python_group()));
        assert_eq!(nav.active_group(), Some(0));
        assert_eq!(nav.position().as_deref(), Some("Syntax"));
    }

    #[test]
    fn test_exit_clears_state() {
        let mut nav = entered();
        go(&mut nav, "tell me about syntax");
        assert!(nav.exit());
        assert!(!nav.is_active());
        assert!(nav.branch_path().is_empty());
        assert!(nav.available().is_empty());
        assert!(!nav.exit());
    }

    // ---- navigation ----

    #[test]
    fn test_root_level_match_leaves_path_empty() {
        let mut nav = entered();
        assert_eq!(go(&mut nav, "tell me about syntax"), "Indentation matters.");
        assert!(nav.branch_path().is_empty());
        assert_eq!(nav.current_branch().unwrap().branch_name, "Syntax");
        assert_eq!(nav.available_text(), "Available options: Loops, Indentation");
        assert_eq!(nav.messages(), 1);
    }

    #[test]
    fn test_descend_pushes_previous() {
        let mut nav = entered();
        go(&mut nav, "tell me about syntax");
        go(&mut nav, "how do loops work");
        assert_eq!(nav.branch_path().len(), 1);
        assert_eq!(nav.position().as_deref(), Some("Syntax → Loops"));
        go(&mut nav, "what about comprehensions");
        assert_eq!(nav.position().as_deref(), Some("Syntax → Loops → Comprehensions"));
        assert_eq!(nav.available_text(), NO_MORE_OPTIONS);
    }

    #[test]
    fn test_back_on_empty_path_is_noop() {
        let mut nav = entered();
        assert!(!nav.navigate_back());
        go(&mut nav, "tell me about syntax");
        let reply = nav.handle_command("go back").unwrap();
        assert_eq!(reply.command, NavCommand::Back);
        assert_eq!(reply.text, ALREADY_AT_START);
        assert!(nav.is_active());
        assert_eq!(nav.position().as_deref(), Some("Syntax"));
    }

    #[test]
    fn test_back_pops_into_previous_node() {
        let mut nav = entered();
        go(&mut nav, "tell me about syntax");
        go(&mut nav, "how do loops work");
        go(&mut nav, "what about comprehensions");

        // path [Syntax, Loops], current Comprehensions
        let reply = nav.handle_command("take me back").unwrap();
        assert_eq!(reply.text, "Okay, going back to Syntax → Loops.");
        // path still non-empty: available are Loops' own children
        assert_eq!(nav.available_text(), "Available options: Comprehensions");

        let reply = nav.handle_command("back").unwrap();
        assert_eq!(reply.text, "Okay, going back to Syntax.");
        // path now empty: available reset to the roots
        assert_eq!(nav.available_text(), "Available options: Syntax, Libraries");
        assert!(nav.branch_path().is_empty());

        assert_eq!(nav.handle_command("go back").unwrap().text, ALREADY_AT_START);
    }

    #[test]
    fn test_options_command() {
        let mut nav = entered();
        let reply = nav.handle_command("what are my options?").unwrap();
        assert_eq!(reply.command, NavCommand::Options);
        assert_eq!(reply.text, "Available options: Syntax, Libraries");
    }

    #[test]
    fn test_commands_ignored_when_idle_or_unrecognised() {
        let mut nav = TreeNavigator::new();
        assert!(nav.handle_command("go back").is_none());
        let mut nav = entered();
        assert!(nav.handle_command("tell me about syntax").is_none());
    }

    #[test]
    fn test_find_branch_only_available_level() {
        let nav = entered();
        assert!(nav.find_branch("how do loops work", 0.95).is_none());
        let (id, s) = nav.find_branch("tell me about syntax", 0.35).unwrap();
        assert_eq!(nav.node(id).unwrap().branch_name, "Syntax");
        assert_eq!(s, 1.0);
    }

    // ---- exit decisions ----

    #[test]
    fn test_should_exit_explicit() {
        let nav = entered();
        let groups = vec![python_group()];
        assert!(nav.should_exit("start over", true, &groups, 0.7));
        assert!(nav.should_exit("exit", false, &groups, 0.7));
    }

    #[test]
    fn test_should_exit_on_other_topic() {
        let nav = entered();
        let groups = vec![
            python_group(),
            QuestionGroup::new("Godot", &["what is godot"], &["An engine."]),
        ];
        assert!(nav.should_exit("what is godot", false, &groups, 0.7));
        assert!(!nav.should_exit("what is godot", true, &groups, 0.7));
        // Own group does not count as a topic change
        assert!(!nav.should_exit("what is python", false, &groups, 0.7));
        assert!(!nav.should_exit("blorp", false, &groups, 0.7));
    }

    #[test]
    fn test_should_exit_idle() {
        let nav = TreeNavigator::new();
        assert!(!nav.should_exit("exit", false, &[], 0.7));
    }
}
