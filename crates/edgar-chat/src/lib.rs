//! Conversational engine for Edgar.
//!
//! Matches free-text input against authored question groups, tracks
//! multi-turn context, walks follow-up trees, and paces output.

pub mod context;
pub mod corrector;
pub mod error;
pub mod matcher;
pub mod orchestrator;
pub mod parser;
pub mod response;
pub mod stream;
pub mod tree;
pub mod types;

pub use context::{ConversationContext, HistoryEntry, RingBuffer};
pub use corrector::{Correction, Corrector};
pub use error::ChatError;
pub use matcher::{MatchOutcome, QaMatcher, TierThresholds};
pub use orchestrator::{ChatEngine, EngineState, MAX_MESSAGE_LENGTH};
pub use parser::NavCommand;
pub use response::ResponseComposer;
pub use stream::{Chunk, TextStreamer};
pub use tree::{FollowUpTree, NodeId, TreeNavigator};
pub use types::{EngineConfiguration, EngineStats, MatchTier, MatchType, TurnRecord};
