pub mod baseline;
pub mod bias;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod random;
pub mod rating;
pub mod selection;
pub mod session;
pub mod store;
pub mod types;
pub mod window;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use session::PlayerSession;
pub use types::{Difficulty, Question, RandomizedQuestion};
