pub mod analytics;
pub mod pool;
pub mod randomizer;

pub use analytics::{PositionAnalytics, RandomizationEvent, ANALYTICS_KEY};
pub use pool::{PoolState, QuestionPool};
pub use randomizer::QuestionRandomizer;

use crate::error::EngineResult;
use crate::types::{Difficulty, RandomizedQuestion};

/// Draws the next question, at `difficulty` when given, and prepares it for display.
pub fn next_question(
    pool: &mut QuestionPool,
    randomizer: &mut QuestionRandomizer,
    difficulty: Option<Difficulty>,
) -> EngineResult<RandomizedQuestion> {
    let question = match difficulty {
        Some(level) => pool.next_at(level, randomizer.rng_mut()),
        None => pool.next(randomizer.rng_mut()),
    };
    randomizer.prepare(&question)
}
