use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum SelectionStrategy {
    #[default]
    Shuffle,
    Weighted,
    Adaptive,
}

impl SelectionStrategy {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "weighted" => Self::Weighted,
            "adaptive" => Self::Adaptive,
            _ => Self::Shuffle,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizationConfig {
    pub randomize_answers: bool,
    pub randomize_questions: bool,
    pub prevent_length_bias: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    pub strategy: SelectionStrategy,
    pub track_analytics: bool,
}

impl Default for RandomizationConfig {
    fn default() -> Self {
        Self {
            randomize_answers: true,
            randomize_questions: true,
            prevent_length_bias: true,
            seed: None,
            strategy: SelectionStrategy::Shuffle,
            track_analytics: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[derive(Default)]
pub enum PaddingStrategy {
    #[default]
    Space,
    WordFiller,
    Ellipsis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[derive(Default)]
pub enum TruncationStrategy {
    #[default]
    End,
    Middle,
    WordBoundary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthNormalizationConfig {
    /// `None` targets the rounded mean of the question's option lengths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_length: Option<usize>,
    pub tolerance: usize,
    pub padding_strategy: PaddingStrategy,
    pub truncation_strategy: TruncationStrategy,
    pub preserve_meaning: bool,
}

impl Default for LengthNormalizationConfig {
    fn default() -> Self {
        Self {
            target_length: None,
            tolerance: 5,
            padding_strategy: PaddingStrategy::WordFiller,
            truncation_strategy: TruncationStrategy::WordBoundary,
            preserve_meaning: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyParams {
    pub window_size: usize,
    pub flow_min: f64,
    pub flow_max: f64,
    pub step: f64,
    pub confidence_threshold: f64,
    pub trend_threshold: f64,
    pub skill_smoothing: f64,
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self {
            window_size: 10,
            flow_min: 0.4,
            flow_max: 0.8,
            step: 0.1,
            confidence_threshold: 0.7,
            trend_threshold: 0.1,
            skill_smoothing: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingParams {
    pub default_rating: f64,
    pub base_k: f64,
    pub provisional_k: f64,
    pub provisional_games: u32,
    pub win_threshold: f64,
}

impl Default for RatingParams {
    fn default() -> Self {
        Self {
            default_rating: 1200.0,
            base_k: 32.0,
            provisional_k: 48.0,
            provisional_games: 30,
            win_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub randomization: RandomizationConfig,
    pub normalization: LengthNormalizationConfig,
    pub difficulty: DifficultyParams,
    pub rating: RatingParams,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TRIVIA_RANDOM_SEED") {
            config.randomization.seed = val.parse().ok();
        }
        if let Ok(val) = std::env::var("TRIVIA_STRATEGY") {
            config.randomization.strategy = SelectionStrategy::parse(&val);
        }
        if let Ok(val) = std::env::var("TRIVIA_PREVENT_LENGTH_BIAS") {
            config.randomization.prevent_length_bias = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("TRIVIA_TRACK_ANALYTICS") {
            config.randomization.track_analytics = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("TRIVIA_LENGTH_TOLERANCE") {
            if let Ok(tolerance) = val.parse() {
                config.normalization.tolerance = tolerance;
            }
        }

        config
    }
}
