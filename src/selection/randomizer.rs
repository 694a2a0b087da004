use crate::bias::fix_length_bias;
use crate::config::{LengthNormalizationConfig, RandomizationConfig, SelectionStrategy};
use crate::error::EngineResult;
use crate::random::RandomSource;
use crate::selection::analytics::{PositionAnalytics, RandomizationEvent};
use crate::types::{Question, RandomizedQuestion};

/// Shuffles option and question order and applies length-bias correction.
///
/// The correct answer is tracked through an index permutation rather than by
/// matching option text, so duplicate option strings cannot misplace it.
pub struct QuestionRandomizer {
    config: RandomizationConfig,
    normalization: LengthNormalizationConfig,
    rng: RandomSource,
    analytics: PositionAnalytics,
}

impl QuestionRandomizer {
    pub fn new(config: RandomizationConfig, normalization: LengthNormalizationConfig) -> Self {
        let rng = RandomSource::from_seed(config.seed);
        Self {
            config,
            normalization,
            rng,
            analytics: PositionAnalytics::default(),
        }
    }

    pub fn with_analytics(mut self, analytics: PositionAnalytics) -> Self {
        self.analytics = analytics.sanitized();
        self
    }

    pub fn reset_analytics(&mut self) {
        self.analytics.reset();
    }

    pub fn config(&self) -> &RandomizationConfig {
        &self.config
    }

    pub fn analytics(&self) -> &PositionAnalytics {
        &self.analytics
    }

    pub fn rng_mut(&mut self) -> &mut RandomSource {
        &mut self.rng
    }

    pub fn validate_randomization(&self) -> bool {
        self.analytics.validate()
    }

    fn effective_strategy(&self) -> SelectionStrategy {
        match self.config.strategy {
            SelectionStrategy::Adaptive if self.analytics.is_biased() => SelectionStrategy::Weighted,
            SelectionStrategy::Adaptive => SelectionStrategy::Shuffle,
            other => other,
        }
    }

    /// `permutation[new_slot] = original_slot`.
    fn permutation_for(&mut self, question: &Question) -> Vec<usize> {
        let n = question.options.len();
        let mut permutation: Vec<usize> = (0..n).collect();

        match self.effective_strategy() {
            SelectionStrategy::Weighted => {
                let weights: Vec<f64> = self
                    .analytics
                    .buckets
                    .iter()
                    .take(n)
                    .map(|count| 1.0 / (1.0 + *count as f64))
                    .collect();
                let target = self
                    .rng
                    .weighted_index(&weights)
                    .unwrap_or_else(|| self.rng.below(n));

                let mut others: Vec<usize> =
                    (0..n).filter(|i| *i != question.correct_answer).collect();
                self.rng.shuffle(&mut others);
                let mut others = others.into_iter();
                for (slot, entry) in permutation.iter_mut().enumerate() {
                    *entry = if slot == target {
                        question.correct_answer
                    } else {
                        others.next().unwrap_or(question.correct_answer)
                    };
                }
            }
            _ => self.rng.shuffle(&mut permutation),
        }
        permutation
    }

    pub fn randomize_answer_positions(
        &mut self,
        question: &Question,
    ) -> EngineResult<RandomizedQuestion> {
        question.validate()?;

        let permutation = self.permutation_for(question);
        let options = permutation
            .iter()
            .map(|&original| question.options[original].clone())
            .collect();
        let correct_answer = permutation
            .iter()
            .position(|&original| original == question.correct_answer)
            .unwrap_or(question.correct_answer);
        let randomized_at = chrono::Utc::now().timestamp_millis();

        if self.config.track_analytics {
            self.analytics.record(RandomizationEvent {
                question_id: question.id.clone(),
                original_position: question.correct_answer,
                new_position: correct_answer,
                timestamp: randomized_at,
            });
        }

        Ok(RandomizedQuestion {
            question: Question {
                options,
                correct_answer,
                ..question.clone()
            },
            original_correct_answer: question.correct_answer,
            was_randomized: true,
            randomized_at,
            permutation,
            length_adjusted: false,
        })
    }

    pub fn randomize_question_order(&mut self, questions: &[Question]) -> Vec<Question> {
        let mut ordered = questions.to_vec();
        self.rng.shuffle(&mut ordered);
        ordered
    }

    /// Length correction (when enabled) followed by position shuffling.
    pub fn prepare(&mut self, question: &Question) -> EngineResult<RandomizedQuestion> {
        question.validate()?;

        let mut length_adjusted = false;
        let canonical = if self.config.prevent_length_bias {
            let fix = fix_length_bias(question, &self.normalization, &mut self.rng)?;
            if fix.adjusted {
                tracing::debug!(
                    question_id = %question.id,
                    before = fix.before.bias_score,
                    after = fix.after.bias_score,
                    "length bias corrected"
                );
            }
            length_adjusted = fix.adjusted;
            fix.question
        } else {
            question.clone()
        };

        let mut randomized = if self.config.randomize_answers {
            self.randomize_answer_positions(&canonical)?
        } else {
            RandomizedQuestion::passthrough(canonical)
        };
        randomized.length_adjusted = length_adjusted;
        Ok(randomized)
    }

    /// Order is shuffled first; each question's options are then shuffled
    /// independently.
    pub fn randomize_batch(&mut self, questions: &[Question]) -> EngineResult<Vec<RandomizedQuestion>> {
        let ordered = if self.config.randomize_questions {
            self.randomize_question_order(questions)
        } else {
            questions.to_vec()
        };
        ordered.iter().map(|q| self.prepare(q)).collect()
    }
}
