//! Routing pre-pass for Edgar.
//!
//! Scores input against configured phrase groups and, when a group clears
//! the routing threshold, dispatches the input to a named handler instead
//! of the QA matcher.

pub mod error;
pub mod handler;
pub mod router;
pub mod types;

pub use error::RouteError;
pub use handler::{HandlerRegistry, RouteHandler};
pub use router::Router;
pub use types::{HandlerReply, PassThroughReason, RouteDecision, RoutingStats};
