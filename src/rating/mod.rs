pub mod elo;
pub mod rank;

pub use elo::{
    baseline_rating, expected_score, GameOutcome, GameResult, RatingChange, RatingEngine,
    RatingHistoryEntry, RatingProfile, DEFAULT_RATING,
};
pub use rank::{rank_display, rank_for_rating, Division, Rank, RankDisplay, Tier, RANK_TABLE};
