use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// ELO of the implied opponent when grading a game played at this level.
    pub fn opponent_rating(&self) -> f64 {
        match self {
            Self::Easy => 1000.0,
            Self::Medium => 1200.0,
            Self::Hard => 1400.0,
        }
    }

    /// Starting challenge level used when seeding a difficulty profile.
    pub fn challenge_level(&self) -> f64 {
        match self {
            Self::Easy => 0.3,
            Self::Medium => 0.5,
            Self::Hard => 0.7,
        }
    }

    pub fn from_challenge(challenge: f64) -> Self {
        if challenge < 1.0 / 3.0 {
            Self::Easy
        } else if challenge < 2.0 / 3.0 {
            Self::Medium
        } else {
            Self::Hard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub buzzword: String,
    pub definition: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl Question {
    pub fn validate(&self) -> EngineResult<()> {
        if self.options.len() != OPTION_COUNT {
            return Err(EngineError::InvalidQuestion {
                id: self.id.clone(),
                reason: format!(
                    "expected {} options, found {}",
                    OPTION_COUNT,
                    self.options.len()
                ),
            });
        }
        if self.correct_answer >= self.options.len() {
            return Err(EngineError::InvalidQuestion {
                id: self.id.clone(),
                reason: format!("correct answer index {} out of range", self.correct_answer),
            });
        }
        Ok(())
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_answer]
    }

    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_answer
    }
}

/// Transient view of a question after option shuffling and length correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizedQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub original_correct_answer: usize,
    pub was_randomized: bool,
    pub randomized_at: i64,
    /// `permutation[new_slot] = original_slot`
    pub permutation: Vec<usize>,
    #[serde(default)]
    pub length_adjusted: bool,
}

impl RandomizedQuestion {
    pub fn passthrough(question: Question) -> Self {
        let permutation = (0..question.options.len()).collect();
        Self {
            original_correct_answer: question.correct_answer,
            question,
            was_randomized: false,
            randomized_at: chrono::Utc::now().timestamp_millis(),
            permutation,
            length_adjusted: false,
        }
    }

    pub fn correct_answer(&self) -> usize {
        self.question.correct_answer
    }

    /// Maps a slot the player picked back to the canonical option index.
    pub fn original_index(&self, slot: usize) -> Option<usize> {
        self.permutation.get(slot).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question {
            id: "q1".to_string(),
            category: "tech".to_string(),
            difficulty: Difficulty::Medium,
            buzzword: "Synergy".to_string(),
            definition: "Combined effort".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 2,
        }
    }

    #[test]
    fn test_validate_rejects_wrong_option_count() {
        let mut q = sample();
        q.options.pop();
        assert!(matches!(
            q.validate(),
            Err(EngineError::InvalidQuestion { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_answer() {
        let mut q = sample();
        q.correct_answer = 4;
        assert!(q.validate().is_err());
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_difficulty_from_challenge() {
        assert_eq!(Difficulty::from_challenge(0.1), Difficulty::Easy);
        assert_eq!(Difficulty::from_challenge(0.5), Difficulty::Medium);
        assert_eq!(Difficulty::from_challenge(0.9), Difficulty::Hard);
    }

    #[test]
    fn test_question_json_uses_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["correctAnswer"], 2);
        assert_eq!(json["difficulty"], "medium");
    }
}
