//! Route handler registry and trait definition.
//!
//! Defines the `RouteHandler` async trait and provides the registry that
//! maps configured handler names to their implementations.

pub mod calculator;
pub mod time;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RouteError;
use crate::types::HandlerReply;

pub use calculator::CalculatorHandler;
pub use time::TimeHandler;

/// A named capability that answers routed input.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Name used by routing groups (`engine` in the routing file).
    fn name(&self) -> &str;

    /// One-line description shown by the `modules` command.
    fn describe(&self) -> &str {
        ""
    }

    async fn invoke(&self, input: &str) -> Result<Vec<HandlerReply>, RouteError>;
}

/// Name-keyed collection of handlers.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn RouteHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Register a handler under its own name, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn RouteHandler>) {
        let name = handler.name().to_string();
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::debug!(handler = %name, "Replaced registered handler");
        }
    }

    pub fn register_defaults(&mut self) {
        self.register(Arc::new(TimeHandler));
        self.register(Arc::new(CalculatorHandler));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RouteHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Sorted handler names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// `(name, description)` pairs, sorted by name.
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.names()
            .into_iter()
            .filter_map(|name| {
                let desc = self.handlers.get(&name)?.describe().to_string();
                Some((name, desc))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl RouteHandler for EchoHandler {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(&self, input: &str) -> Result<Vec<HandlerReply>, RouteError> {
            Ok(vec![HandlerReply::new(input, 1.0, "echo")])
        }
    }

    #[test]
    fn test_defaults_registered() {
        let registry = HandlerRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["calculator", "time"]);
        assert!(registry.contains("time"));
        assert!(registry.get("magic_module").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(EchoHandler));
        registry.register(Arc::new(EchoHandler));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_descriptions_sorted() {
        let mut registry = HandlerRegistry::with_defaults();
        registry.register(Arc::new(EchoHandler));
        let descs = registry.descriptions();
        assert_eq!(descs[0].0, "calculator");
        assert_eq!(descs[1], ("echo".to_string(), String::new()));
        assert!(!descs[2].1.is_empty());
    }

    #[tokio::test]
    async fn test_invoke_through_registry() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(EchoHandler));
        let handler = registry.get("echo").unwrap();
        let replies = handler.invoke("hello there").await.unwrap();
        assert_eq!(replies, vec![HandlerReply::new("hello there", 1.0, "echo")]);
    }
}
