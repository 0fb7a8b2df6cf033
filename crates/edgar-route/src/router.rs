//! Routing evaluation and dispatch.
//!
//! Each routing group gets a binary containment confidence: 1.0 when any of
//! its phrases is contained in the input (best of partial and token-set
//! ratio at or above the containment score), else 0.0. Over-long inputs are
//! penalised per extra word. One global threshold decides dispatch; the
//! per-group `confidence_threshold` is not consulted.

use std::path::Path;

use edgar_core::config::RoutingConfig;
use edgar_core::similarity::{partial_ratio, token_set_ratio, word_count};
use edgar_core::types::{RoutingFile, RoutingGroup};
use tracing::{debug, info, warn};

use crate::error::RouteError;
use crate::handler::HandlerRegistry;
use crate::types::{HandlerReply, PassThroughReason, RouteDecision, RoutingStats};

/// Source label carried by synthetic replies produced on dispatch failure.
pub const ROUTER_SOURCE: &str = "router";

/// Routes input to registered handlers based on phrase containment.
#[derive(Debug)]
pub struct Router {
    groups: Vec<RoutingGroup>,
    registry: HandlerRegistry,
    enabled: bool,
    threshold: f32,
    containment_score: u8,
}

impl Router {
    pub fn new(file: RoutingFile, config: &RoutingConfig, registry: HandlerRegistry) -> Self {
        let router = Self {
            groups: file.routing_groups,
            registry,
            enabled: config.enabled,
            threshold: config.threshold.clamp(0.0, 1.0),
            containment_score: config.containment_score,
        };
        for missing in router.validate() {
            warn!(handler = %missing, "Routing group references an unregistered handler");
        }
        router
    }

    /// Load the routing document at `path`. A missing or corrupt file yields
    /// a router with no groups.
    pub fn load(path: &Path, config: &RoutingConfig, registry: HandlerRegistry) -> Self {
        Self::new(RoutingFile::load_or_default(path), config, registry)
    }

    /// A router that never dispatches.
    pub fn disabled() -> Self {
        let config = RoutingConfig {
            enabled: false,
            ..RoutingConfig::default()
        };
        Self::new(RoutingFile::default(), &config, HandlerRegistry::new())
    }

    pub fn groups(&self) -> &[RoutingGroup] {
        &self.groups
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Containment confidence of `input` for one group, in `[0.0, 1.0]`.
    pub fn group_confidence(&self, input: &str, group: &RoutingGroup) -> f32 {
        let contained = group.questions.iter().any(|q| {
            partial_ratio(input, q).max(token_set_ratio(input, q)) >= self.containment_score
        });
        if !contained {
            return 0.0;
        }

        let words = word_count(input);
        if group.word_limit_enabled && words > group.max_words {
            let extra = (words - group.max_words) as f32;
            (1.0 - group.penalty_per_word * extra).max(0.0)
        } else {
            1.0
        }
    }

    /// Decide whether `input` should be dispatched.
    pub fn evaluate(&self, input: &str) -> RouteDecision {
        if !self.enabled {
            return RouteDecision::PassThrough {
                reason: PassThroughReason::Disabled,
            };
        }
        if self.groups.is_empty() {
            return RouteDecision::PassThrough {
                reason: PassThroughReason::NoGroups,
            };
        }

        let mut best: Option<(&RoutingGroup, f32)> = None;
        for group in &self.groups {
            let confidence = self.group_confidence(input, group);
            debug!(group = %group.name, confidence, "Routing group scored");
            if confidence <= 0.0 || confidence < self.threshold {
                continue;
            }
            if best.is_none_or(|(_, top)| confidence > top) {
                best = Some((group, confidence));
            }
        }

        match best {
            None => RouteDecision::PassThrough {
                reason: PassThroughReason::BelowThreshold,
            },
            Some((group, _)) if group.is_passthrough() => RouteDecision::PassThrough {
                reason: PassThroughReason::NoHandler {
                    group: group.name.clone(),
                },
            },
            Some((group, confidence)) => RouteDecision::Dispatch {
                group: group.name.clone(),
                handler: group.handler_name.clone(),
                confidence,
            },
        }
    }

    /// Invoke `handler` with `input`, surfacing lookup and handler errors.
    pub async fn invoke(
        &self,
        handler: &str,
        input: &str,
    ) -> Result<Vec<HandlerReply>, RouteError> {
        let implementation = self
            .registry
            .get(handler)
            .ok_or_else(|| RouteError::UnregisteredHandler(handler.to_string()))?;
        implementation.invoke(input).await
    }

    /// Invoke `handler` with `input`. Failures become a single synthetic
    /// reply instead of an error.
    pub async fn dispatch(&self, handler: &str, input: &str) -> Vec<HandlerReply> {
        let text = match self.invoke(handler, input).await {
            Ok(replies) if !replies.is_empty() => {
                info!(handler = %handler, replies = replies.len(), "Input routed");
                return replies;
            }
            Ok(_) => {
                warn!(handler = %handler, "Handler returned no replies");
                format!("The '{}' module had nothing to say.", handler)
            }
            Err(RouteError::UnregisteredHandler(name)) => {
                warn!(handler = %name, "Dispatch to unregistered handler");
                format!("The '{}' module is not available right now.", name)
            }
            Err(e) => {
                warn!(handler = %handler, error = %e, "Handler failed");
                format!("Sorry, the '{}' module ran into a problem: {}", handler, e)
            }
        };
        vec![HandlerReply::new(text, 0.0, ROUTER_SOURCE)]
    }

    /// Evaluate and, if routed, dispatch. `None` means the QA matcher
    /// should handle the input.
    pub async fn route(&self, input: &str) -> Option<(RouteDecision, Vec<HandlerReply>)> {
        let decision = self.evaluate(input);
        let RouteDecision::Dispatch { handler, .. } = &decision else {
            return None;
        };
        let replies = self.dispatch(handler, input).await;
        Some((decision, replies))
    }

    pub fn routing_stats(&self) -> RoutingStats {
        let mut handlers: Vec<String> = self
            .groups
            .iter()
            .filter(|g| !g.is_passthrough())
            .map(|g| g.handler_name.clone())
            .collect();
        handlers.sort();
        handlers.dedup();

        RoutingStats {
            total_groups: self.groups.len(),
            total_questions: self.groups.iter().map(|g| g.questions.len()).sum(),
            handlers,
        }
    }

    /// Handler names referenced by routing groups that have no registered
    /// implementation.
    pub fn validate(&self) -> Vec<String> {
        self.routing_stats()
            .handlers
            .into_iter()
            .filter(|name| !self.registry.contains(name))
            .collect()
    }
}
