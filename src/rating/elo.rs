use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineResult;
use crate::config::RatingParams;
use crate::error::{EngineError, EngineResult};
use crate::rating::rank::{rank_display, RankDisplay};
use crate::types::Difficulty;

pub const DEFAULT_RATING: f64 = 1200.0;
const MIN_BASELINE_RATING: f64 = 800.0;
const MAX_BASELINE_RATING: f64 = 1600.0;

/// Seed rating for one category from a baseline accuracy percentage.
pub fn baseline_rating(accuracy_percent: f64) -> f64 {
    if !accuracy_percent.is_finite() {
        return DEFAULT_RATING;
    }
    (DEFAULT_RATING + ((accuracy_percent - 50.0) / 10.0) * 100.0)
        .clamp(MIN_BASELINE_RATING, MAX_BASELINE_RATING)
}

pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / 400.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
    Baseline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingHistoryEntry {
    pub rating: f64,
    pub change: f64,
    pub result: GameOutcome,
    pub category: String,
    pub difficulty: Difficulty,
    pub timestamp: i64,
    /// Fraction of questions answered correctly, `[0,1]`.
    pub performance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingProfile {
    pub current_rating: f64,
    pub peak_rating: f64,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_streak: u32,
    pub best_win_streak: u32,
    #[serde(default)]
    pub rating_history: Vec<RatingHistoryEntry>,
    #[serde(default)]
    pub category_ratings: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BaselineResult>,
}

impl Default for RatingProfile {
    fn default() -> Self {
        Self {
            current_rating: DEFAULT_RATING,
            peak_rating: DEFAULT_RATING,
            games_played: 0,
            wins: 0,
            losses: 0,
            win_streak: 0,
            best_win_streak: 0,
            rating_history: Vec::new(),
            category_ratings: BTreeMap::new(),
            baseline: None,
        }
    }
}

impl RatingProfile {
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins as f64 / self.games_played as f64
    }

    pub fn category_rating(&self, category: &str) -> f64 {
        self.category_ratings
            .get(category)
            .copied()
            .filter(|r| r.is_finite())
            .unwrap_or(DEFAULT_RATING)
    }

    pub fn rank_display(&self) -> RankDisplay {
        let last_change = self.rating_history.last().map(|e| e.change).unwrap_or(0.0);
        rank_display(self.current_rating, last_change)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub category: String,
    pub difficulty: Difficulty,
    pub correct: u32,
    pub total: u32,
}

impl GameResult {
    pub fn performance(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingChange {
    pub previous_rating: f64,
    pub new_rating: f64,
    pub change: f64,
    pub outcome: GameOutcome,
    pub display: RankDisplay,
}

pub struct RatingEngine {
    params: RatingParams,
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self::new(RatingParams::default())
    }
}

impl RatingEngine {
    pub fn new(params: RatingParams) -> Self {
        Self { params }
    }

    pub fn k_factor(&self, games_played: u32) -> f64 {
        if games_played < self.params.provisional_games {
            self.params.provisional_k
        } else {
            self.params.base_k
        }
    }

    /// Grades one finished game. Counters, streaks, peak and the history
    /// entry are all written before returning.
    pub fn record_game(
        &self,
        profile: &mut RatingProfile,
        result: &GameResult,
        timestamp: i64,
    ) -> EngineResult<RatingChange> {
        if result.total == 0 {
            return Err(EngineError::InvalidInput(
                "game result has no graded questions".to_string(),
            ));
        }
        if result.correct > result.total {
            return Err(EngineError::InvalidInput(format!(
                "game result reports {} correct out of {}",
                result.correct, result.total
            )));
        }

        let performance = result.performance();
        let previous_rating = profile.current_rating;
        let expected = expected_score(previous_rating, result.difficulty.opponent_rating());
        let k = self.k_factor(profile.games_played);
        let change = (k * (performance - expected)).round();
        let new_rating = (previous_rating + change).max(0.0);
        let applied = new_rating - previous_rating;

        let outcome = if performance >= self.params.win_threshold {
            GameOutcome::Win
        } else {
            GameOutcome::Loss
        };

        let category_rating = profile.category_rating(&result.category);
        profile
            .category_ratings
            .insert(result.category.clone(), (category_rating + applied).max(0.0));

        profile.current_rating = new_rating;
        profile.peak_rating = profile.peak_rating.max(new_rating);
        profile.games_played += 1;
        match outcome {
            GameOutcome::Win => {
                profile.wins += 1;
                profile.win_streak += 1;
                profile.best_win_streak = profile.best_win_streak.max(profile.win_streak);
            }
            _ => {
                profile.losses += 1;
                profile.win_streak = 0;
            }
        }
        profile.rating_history.push(RatingHistoryEntry {
            rating: new_rating,
            change: applied,
            result: outcome,
            category: result.category.clone(),
            difficulty: result.difficulty,
            timestamp,
            performance,
        });

        Ok(RatingChange {
            previous_rating,
            new_rating,
            change: applied,
            outcome,
            display: rank_display(new_rating, applied),
        })
    }

    /// Seeds category ratings from a baseline and moves the overall rating
    /// to their mean. Recorded in history as a single baseline entry.
    pub fn apply_baseline(
        &self,
        profile: &mut RatingProfile,
        baseline: &BaselineResult,
        timestamp: i64,
    ) -> RatingChange {
        for (category, rating) in &baseline.recommended_ratings {
            profile.category_ratings.insert(category.clone(), *rating);
        }

        let seeded: Vec<f64> = baseline.recommended_ratings.values().copied().collect();
        let new_rating = if seeded.is_empty() {
            self.params.default_rating
        } else {
            (seeded.iter().sum::<f64>() / seeded.len() as f64).round()
        };

        let previous_rating = profile.current_rating;
        let change = new_rating - previous_rating;
        profile.current_rating = new_rating;
        profile.peak_rating = profile.peak_rating.max(new_rating);
        profile.rating_history.push(RatingHistoryEntry {
            rating: new_rating,
            change,
            result: GameOutcome::Baseline,
            category: "baseline".to_string(),
            difficulty: baseline.recommended_difficulty,
            timestamp,
            performance: baseline.overall_accuracy / 100.0,
        });
        profile.baseline = Some(baseline.clone());

        RatingChange {
            previous_rating,
            new_rating,
            change,
            outcome: GameOutcome::Baseline,
            display: rank_display(new_rating, change),
        }
    }
}
