pub mod config;
pub mod error;
pub mod model;
pub mod similarity;
pub mod types;

pub use config::EdgarConfig;
pub use error::{EdgarError, Result};
pub use model::ModelStore;
pub use types::*;
