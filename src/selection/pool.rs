use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::random::RandomSource;
use crate::types::{Difficulty, Question};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub used_question_ids: Vec<String>,
}

/// Rotates through a fixed bank without repeats until every question was drawn.
pub struct QuestionPool {
    bank: Vec<Question>,
    used: HashSet<String>,
}

impl QuestionPool {
    pub fn new(bank: Vec<Question>) -> EngineResult<Self> {
        if bank.is_empty() {
            return Err(EngineError::EmptyQuestionBank);
        }
        let mut ids = HashSet::with_capacity(bank.len());
        for question in &bank {
            question.validate()?;
            if !ids.insert(question.id.as_str()) {
                return Err(EngineError::InvalidInput(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }
        }
        Ok(Self {
            bank,
            used: HashSet::new(),
        })
    }

    pub fn bank(&self) -> &[Question] {
        &self.bank
    }

    pub fn len(&self) -> usize {
        self.bank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bank.is_empty()
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    pub fn remaining(&self) -> usize {
        self.bank.len() - self.used.len()
    }

    pub fn reset(&mut self) {
        self.used.clear();
    }

    pub fn next(&mut self, rng: &mut RandomSource) -> Question {
        let mut candidates = self.unused(|_| true);
        if candidates.is_empty() {
            tracing::debug!(bank_size = self.bank.len(), "question pool exhausted, resetting");
            self.used.clear();
            candidates = self.unused(|_| true);
        }
        if candidates.is_empty() {
            candidates = (0..self.bank.len()).collect();
        }
        self.take(&candidates, rng)
    }

    /// Prefers unused questions at `difficulty`, then any unused question.
    pub fn next_at(&mut self, difficulty: Difficulty, rng: &mut RandomSource) -> Question {
        let candidates = self.unused(|q| q.difficulty == difficulty);
        if candidates.is_empty() {
            return self.next(rng);
        }
        self.take(&candidates, rng)
    }

    fn unused(&self, filter: impl Fn(&Question) -> bool) -> Vec<usize> {
        self.bank
            .iter()
            .enumerate()
            .filter(|(_, q)| !self.used.contains(&q.id) && filter(q))
            .map(|(i, _)| i)
            .collect()
    }

    fn take(&mut self, candidates: &[usize], rng: &mut RandomSource) -> Question {
        let index = candidates[rng.below(candidates.len())];
        let question = self.bank[index].clone();
        self.used.insert(question.id.clone());
        question
    }

    pub fn export_state(&self) -> PoolState {
        let mut used_question_ids: Vec<String> = self.used.iter().cloned().collect();
        used_question_ids.sort();
        PoolState { used_question_ids }
    }

    /// Unknown IDs are dropped; a fully used restore starts a fresh rotation.
    pub fn restore_state(&mut self, state: &PoolState) {
        let known: HashSet<&str> = self.bank.iter().map(|q| q.id.as_str()).collect();
        self.used = state
            .used_question_ids
            .iter()
            .filter(|id| known.contains(id.as_str()))
            .cloned()
            .collect();
        if self.used.len() >= self.bank.len() {
            self.used.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: format!("q{}", i),
                category: "general".to_string(),
                difficulty: if i % 2 == 0 {
                    Difficulty::Easy
                } else {
                    Difficulty::Hard
                },
                buzzword: format!("Term {}", i),
                definition: format!("Definition {}", i),
                options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
                correct_answer: i % 4,
            })
            .collect()
    }

    #[test]
    fn test_empty_bank_rejected() {
        assert!(matches!(
            QuestionPool::new(Vec::new()),
            Err(EngineError::EmptyQuestionBank)
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut questions = bank(2);
        questions[1].id = "q0".to_string();
        assert!(QuestionPool::new(questions).is_err());
    }

    #[test]
    fn test_no_repeats_until_exhausted() {
        let mut pool = QuestionPool::new(bank(5)).unwrap();
        let mut rng = RandomSource::seeded(9);
        let mut seen = HashSet::new();
        for _ in 0..5 {
            assert!(seen.insert(pool.next(&mut rng).id));
        }
        assert_eq!(pool.remaining(), 0);

        pool.next(&mut rng);
        assert_eq!(pool.used_count(), 1);
    }

    #[test]
    fn test_next_at_prefers_difficulty() {
        let mut pool = QuestionPool::new(bank(6)).unwrap();
        let mut rng = RandomSource::seeded(2);
        for _ in 0..3 {
            assert_eq!(pool.next_at(Difficulty::Hard, &mut rng).difficulty, Difficulty::Hard);
        }
        // hard questions used up, falls back to remaining easy ones
        assert_eq!(pool.next_at(Difficulty::Hard, &mut rng).difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_state_export_and_restore() {
        let mut pool = QuestionPool::new(bank(4)).unwrap();
        let mut rng = RandomSource::seeded(4);
        pool.next(&mut rng);
        pool.next(&mut rng);
        let state = pool.export_state();
        assert_eq!(state.used_question_ids.len(), 2);

        let mut restored = QuestionPool::new(bank(4)).unwrap();
        let mut with_unknown = state.clone();
        with_unknown.used_question_ids.push("missing".to_string());
        restored.restore_state(&with_unknown);
        assert_eq!(restored.used_count(), 2);
    }
}
