//! Chat engine: central coordinator wiring router, tree, matcher and context.
//!
//! One engine holds one conversation. `process` borrows the engine
//! exclusively, so turns are serialized by the caller.

use std::path::Path;

use edgar_core::config::EdgarConfig;
use edgar_core::error::EdgarError;
use edgar_core::model::ModelStore;
use edgar_core::types::QuestionGroup;
use edgar_route::{HandlerRegistry, RouteDecision, Router};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::ConversationContext;
use crate::corrector::Corrector;
use crate::error::ChatError;
use crate::matcher::{MatchOutcome, QaMatcher, TierThresholds};
use crate::parser;
use crate::response::{ResponseComposer, NO_ANSWER};
use crate::stream::TextStreamer;
use crate::tree::TreeNavigator;
use crate::types::{EngineConfiguration, EngineStats, MatchType, TurnRecord};

/// Maximum message length in characters. Longer input is truncated.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Confidence reported for navigation replies.
const NAVIGATION_CONFIDENCE: f32 = 0.9;

/// Group label reported for navigation replies.
pub const TREE_NAVIGATION: &str = "Tree Navigation";

// =============================================================================
// EngineState
// =============================================================================

/// Mutable per-conversation state.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub context: ConversationContext,
    pub tree: TreeNavigator,
    pub stats: EngineStats,
}

impl EngineState {
    pub fn new(config: &EdgarConfig) -> Self {
        Self {
            context: ConversationContext::new(&config.context, config.matching.medium_confidence),
            tree: TreeNavigator::new(),
            stats: EngineStats::default(),
        }
    }

    /// Clear context and tree. Counters are retained.
    pub fn reset(&mut self) {
        self.context.reset();
        self.tree.exit();
    }
}

// =============================================================================
// ChatEngine
// =============================================================================

/// Rule-based conversational engine over one loaded model.
#[derive(Debug)]
pub struct ChatEngine {
    config: EdgarConfig,
    store: ModelStore,
    model: Option<String>,
    groups: Vec<QuestionGroup>,
    matcher: QaMatcher,
    corrector: Corrector,
    composer: ResponseComposer,
    router: Router,
    state: EngineState,
    rng: StdRng,
    session_id: Uuid,
}

impl ChatEngine {
    /// Build an engine from configuration, loading the configured model and
    /// routing file. A missing or broken configured model falls back to the
    /// first available model; with none loadable the engine has no groups.
    pub fn from_config(config: EdgarConfig) -> Self {
        let router = if config.routing.enabled {
            Router::load(
                Path::new(&config.routing.routing_file),
                &config.routing,
                HandlerRegistry::with_defaults(),
            )
        } else {
            Router::disabled()
        };

        let mut engine = Self::with_groups(config, Vec::new()).with_router(router);
        let configured = engine.config.general.model.clone();
        let loaded = !configured.is_empty() && engine.load_model(&configured);
        if !loaded {
            if let Some(first) = engine
                .available_models()
                .into_iter()
                .find(|m| *m != configured)
            {
                info!(configured = %configured, model = %first, "Falling back to first available model");
                engine.load_model(&first);
            }
        }
        engine
    }

    /// Build an engine over in-memory groups with routing disabled.
    pub fn with_groups(config: EdgarConfig, groups: Vec<QuestionGroup>) -> Self {
        let matcher = QaMatcher::new(
            TierThresholds::from_config(&config.matching),
            config.matching.confidence_requirement,
        );
        let session_id = Uuid::new_v4();
        info!(session = %session_id, groups = groups.len(), "Chat engine created");

        Self {
            store: ModelStore::new(&config.general.models_dir),
            model: None,
            groups,
            matcher,
            corrector: Corrector::from_config(&config.matching),
            composer: ResponseComposer::new(),
            router: Router::disabled(),
            state: EngineState::new(&config),
            rng: StdRng::from_os_rng(),
            session_id,
            config,
        }
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Use a deterministic answer and fallback selection.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // -------------------------------------------------------------------------
    // Turn processing
    // -------------------------------------------------------------------------

    /// Process one user input. Compound input yields one record per question;
    /// a routed input yields one record per handler reply.
    pub async fn process(&mut self, input: &str) -> Vec<TurnRecord> {
        let input = match prepare_input(input) {
            Ok(input) => input,
            Err(e) => {
                debug!(error = %e, "Input ignored");
                return Vec::new();
            }
        };

        if !self.state.tree.is_active() {
            if let Some(records) = self.route(&input).await {
                return records;
            }
        }

        parser::split_questions(&input)
            .iter()
            .filter(|q| !q.trim().is_empty())
            .map(|q| self.process_question(q))
            .collect()
    }

    async fn route(&mut self, input: &str) -> Option<Vec<TurnRecord>> {
        let (decision, replies) = self.router.route(input).await?;
        let RouteDecision::Dispatch { group, handler, .. } = decision else {
            return None;
        };
        info!(group = %group, handler = %handler, replies = replies.len(), "Input routed");

        let records: Vec<TurnRecord> = replies
            .into_iter()
            .map(|reply| {
                let mut record =
                    TurnRecord::new(input, reply.text, reply.confidence, MatchType::Routed)
                        .with_group(group.clone());
                record.source = Some(reply.source);
                record
            })
            .collect();

        let answer = records
            .iter()
            .map(|r| r.answer.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let confidence = records.iter().map(|r| r.confidence).fold(0.0, f32::max);
        self.state
            .context
            .update(input, &answer, None, confidence, &mut self.state.stats);
        Some(records)
    }

    fn process_question(&mut self, question: &str) -> TurnRecord {
        if self.state.tree.is_active() {
            self.state.stats.follow_up_requests += 1;
            if let Some(record) = self.tree_turn(question) {
                return record;
            }
        }
        self.qa_turn(question)
    }

    /// Navigation commands, then branch matching, then the exit check.
    /// `None` means the question continues on the QA path.
    fn tree_turn(&mut self, question: &str) -> Option<TurnRecord> {
        if let Some(nav) = self.state.tree.handle_command(question) {
            debug!(command = ?nav.command, "Tree navigation");
            self.state.context.update(
                question,
                &nav.text,
                None,
                NAVIGATION_CONFIDENCE,
                &mut self.state.stats,
            );
            let record = TurnRecord::new(question, nav.text, NAVIGATION_CONFIDENCE, MatchType::Navigation)
                .with_group(TREE_NAVIGATION);
            return Some(self.with_tree_metadata(record));
        }

        let threshold = self.config.matching.topic_change_threshold;
        let floor = self.matcher.thresholds().min_acceptable;

        let Some((branch, confidence)) = self.state.tree.find_branch(question, floor) else {
            if self
                .state
                .tree
                .should_exit(question, false, &self.groups, threshold)
            {
                self.exit_tree();
            }
            return None;
        };

        let record = if self.matcher.rejects(confidence) {
            self.state.stats.confidence_rejections += 1;
            let text = self.fallback_text(question);
            self.state
                .context
                .update(question, &text, None, 0.0, &mut self.state.stats);
            TurnRecord::new(question, text, 0.0, MatchType::ConfidenceRejection)
        } else {
            let answer = self
                .state
                .tree
                .navigate_to(branch)
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| NO_ANSWER.to_string());
            self.state.stats.tree_navigations += 1;

            let index = self.state.tree.active_group();
            let group = index.and_then(|i| self.groups.get(i).map(|g| (i, g)));
            let name = group.map_or_else(|| "Unknown".to_string(), |(_, g)| g.name.clone());
            self.state
                .context
                .update(question, &answer, group, confidence, &mut self.state.stats);
            TurnRecord::new(question, answer, confidence, MatchType::TreeBranch).with_group(name)
        };

        if self
            .state
            .tree
            .should_exit(question, true, &self.groups, threshold)
        {
            self.exit_tree();
        }
        Some(self.with_tree_metadata(record))
    }

    /// Auto-correct, match, then answer or fall back.
    fn qa_turn(&mut self, question: &str) -> TurnRecord {
        let known: Vec<&str> = self
            .groups
            .iter()
            .flat_map(|g| g.questions.iter().map(String::as_str))
            .collect();
        let correction = self.corrector.correct(question, &known);

        match self.matcher.find_best_match(&self.groups, &correction.text) {
            MatchOutcome::Matched {
                group: index,
                confidence,
                tier,
            } => {
                let group = &self.groups[index];
                let answer = self.composer.choose_answer(&group.answers, &mut self.rng);
                debug!(group = %group.name, confidence, tier = ?tier, "QA match");
                self.state.context.update(
                    question,
                    &answer,
                    Some((index, group)),
                    confidence,
                    &mut self.state.stats,
                );

                if group.has_follow_ups()
                    && !self.state.tree.is_active()
                    && self.state.tree.enter(index, group)
                {
                    self.state.stats.tree_entries += 1;
                }

                let record = TurnRecord::new(question, answer, confidence, tier.into())
                    .with_group(group.name.clone())
                    .with_corrections(correction.candidates);
                self.with_tree_metadata(record)
            }
            MatchOutcome::Rejected { group, confidence } => {
                debug!(group = %self.groups[group].name, confidence, "Match rejected");
                self.state.stats.confidence_rejections += 1;
                let text = self.fallback_text(question);
                self.state
                    .context
                    .update(question, &text, None, 0.0, &mut self.state.stats);
                let record = TurnRecord::new(question, text, 0.0, MatchType::ConfidenceRejection)
                    .with_corrections(correction.candidates);
                self.with_tree_metadata(record)
            }
            MatchOutcome::NoMatch => {
                let text = self.fallback_text(question);
                self.state
                    .context
                    .update(question, &text, None, 0.0, &mut self.state.stats);
                let record = TurnRecord::new(question, text, 0.0, MatchType::Unknown)
                    .with_corrections(correction.candidates);
                self.with_tree_metadata(record)
            }
        }
    }

    fn fallback_text(&mut self, question: &str) -> String {
        let subject = parser::extract_subject(question);
        self.composer.fallback(
            subject.as_deref(),
            self.state.context.current_topic.as_deref(),
            &mut self.rng,
        )
    }

    fn with_tree_metadata(&self, mut record: TurnRecord) -> TurnRecord {
        if self.state.tree.is_active() {
            record.tree_position = self.state.tree.position();
            record.available_branches = Some(self.state.tree.available_text());
        }
        record
    }

    fn exit_tree(&mut self) {
        if self.state.tree.exit() {
            self.state.stats.tree_exits += 1;
        }
    }

    // -------------------------------------------------------------------------
    // Models
    // -------------------------------------------------------------------------

    /// Load model `name`. On failure the engine continues with no model and
    /// no groups. Any active tree is exited.
    pub fn load_model(&mut self, name: &str) -> bool {
        self.exit_tree();
        match self.store.load(name) {
            Ok(groups) => {
                self.model = Some(name.to_string());
                self.groups = groups;
                true
            }
            Err(e) => {
                warn!(model = name, error = %e, "Model load failed, continuing with no answers");
                self.model = None;
                self.groups = Vec::new();
                false
            }
        }
    }

    /// Switch to model `name`. Re-selecting the loaded model is a no-op.
    pub fn switch_model(&mut self, name: &str) -> bool {
        if self.model.as_deref() == Some(name) && !self.groups.is_empty() {
            return true;
        }
        let previous = self.model.clone().unwrap_or_default();
        let loaded = self.load_model(name);
        if loaded {
            info!(from = %previous, to = name, groups = self.groups.len(), "Model switched");
        }
        loaded
    }

    pub fn available_models(&self) -> Vec<String> {
        self.store.available_models()
    }

    pub fn current_model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn groups(&self) -> &[QuestionGroup] {
        &self.groups
    }

    // -------------------------------------------------------------------------
    // Settings and introspection
    // -------------------------------------------------------------------------

    /// Set the minimum answer confidence. 0.0 disables the gate.
    pub fn set_confidence_requirement(&mut self, requirement: f32) -> edgar_core::Result<()> {
        if !(0.0..=1.0).contains(&requirement) {
            return Err(EdgarError::InvalidConfidence(requirement));
        }
        self.matcher.set_confidence_requirement(requirement);
        self.config.matching.confidence_requirement = requirement;
        info!(requirement, "Confidence requirement updated");
        Ok(())
    }

    pub fn confidence_requirement(&self) -> f32 {
        self.matcher.confidence_requirement()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.state.stats
    }

    pub fn context(&self) -> &ConversationContext {
        &self.state.context
    }

    pub fn tree(&self) -> &TreeNavigator {
        &self.state.tree
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn config(&self) -> &EdgarConfig {
        &self.config
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn context_summary(&self) -> String {
        self.state
            .context
            .summary(self.state.tree.position().as_deref())
    }

    /// Clear conversation context and any active tree. Counters are kept.
    pub fn reset(&mut self) {
        self.state.reset();
        info!(session = %self.session_id, "Conversation reset");
    }

    /// Registered handlers with their descriptions.
    pub fn modules(&self) -> Vec<(String, String)> {
        self.router.registry().descriptions()
    }

    /// Streamer configured for answer text.
    pub fn streamer(&self) -> TextStreamer {
        TextStreamer::from_config(&self.config.streaming)
    }

    /// Streamer for match info and other supplementary lines.
    pub fn info_streamer(&self) -> TextStreamer {
        self.streamer()
            .with_wpm(self.config.streaming.additional_info_wpm)
    }

    pub fn configuration(&self) -> EngineConfiguration {
        EngineConfiguration {
            model: self.model.clone(),
            groups: self.groups.len(),
            confidence_requirement: self.matcher.confidence_requirement(),
            routing_enabled: self.router.is_enabled(),
            routing_threshold: self.router.threshold(),
            routing_groups: self.router.groups().len(),
            handlers: self.router.registry().names(),
            wpm: self.config.streaming.wpm,
            letter_mode: self.config.streaming.letter_mode,
            speed_limit: self.config.streaming.speed_limit,
        }
    }
}

/// Trim `input`, rejecting empty input and truncating overlong input.
fn prepare_input(input: &str) -> Result<String, ChatError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    let length = trimmed.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        warn!(length, max = MAX_MESSAGE_LENGTH, "Input truncated");
        return Ok(trimmed.chars().take(MAX_MESSAGE_LENGTH).collect());
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// Tests
// =============================================================================
