use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::random::RandomSource;
use crate::rating::{baseline_rating, DEFAULT_RATING};
use crate::types::{Difficulty, Question};

const DEFAULT_ACCURACY_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    pub correct: u32,
    pub total: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineResult {
    pub category_results: BTreeMap<String, CategoryResult>,
    pub overall_accuracy: f64,
    pub recommended_ratings: BTreeMap<String, f64>,
    pub recommended_difficulty: Difficulty,
    #[serde(default)]
    pub skipped: bool,
    pub completed_at: i64,
}

pub fn recommended_difficulty(accuracy_percent: f64) -> Difficulty {
    if accuracy_percent >= 80.0 {
        Difficulty::Hard
    } else if accuracy_percent >= 60.0 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

fn percent(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return DEFAULT_ACCURACY_PERCENT;
    }
    (correct as f64 * 100.0 / total as f64).round()
}

fn unique_interests(interests: &[String]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    interests
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(*s))
        .collect()
}

/// Up to `per_category` medium questions from each interest, interleaved by a
/// final shuffle.
pub fn generate_baseline_test(
    bank: &[Question],
    interests: &[String],
    per_category: usize,
    rng: &mut RandomSource,
) -> EngineResult<Vec<Question>> {
    let interests = unique_interests(interests);
    if interests.is_empty() {
        return Err(EngineError::InvalidInput(
            "baseline test needs at least one interest category".to_string(),
        ));
    }
    if per_category == 0 {
        return Err(EngineError::InvalidInput(
            "baseline test needs at least one question per category".to_string(),
        ));
    }

    let mut selected = Vec::new();
    for category in interests {
        let mut candidates: Vec<&Question> = bank
            .iter()
            .filter(|q| q.category == category && q.difficulty == Difficulty::Medium)
            .collect();
        if candidates.is_empty() {
            tracing::warn!(category, "no medium questions available for baseline");
            continue;
        }
        rng.shuffle(&mut candidates);
        for question in candidates.into_iter().take(per_category) {
            question.validate()?;
            selected.push(question.clone());
        }
    }

    rng.shuffle(&mut selected);
    Ok(selected)
}

/// Grades a baseline. `answers[i]` is the option picked for `questions[i]`;
/// `None` counts as wrong.
pub fn calculate_baseline_results(
    questions: &[Question],
    answers: &[Option<usize>],
    completed_at: i64,
) -> EngineResult<BaselineResult> {
    if questions.len() != answers.len() {
        return Err(EngineError::InvalidInput(format!(
            "{} answers for {} baseline questions",
            answers.len(),
            questions.len()
        )));
    }

    let mut tallies: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    let mut correct_total = 0u32;
    for (question, answer) in questions.iter().zip(answers) {
        question.validate()?;
        let is_correct = answer.is_some_and(|a| question.is_correct(a));
        let entry = tallies.entry(question.category.clone()).or_insert((0, 0));
        entry.1 += 1;
        if is_correct {
            entry.0 += 1;
            correct_total += 1;
        }
    }

    let mut category_results = BTreeMap::new();
    let mut recommended_ratings = BTreeMap::new();
    for (category, (correct, total)) in tallies {
        let accuracy = percent(correct, total);
        recommended_ratings.insert(category.clone(), baseline_rating(accuracy));
        category_results.insert(
            category,
            CategoryResult {
                correct,
                total,
                accuracy,
            },
        );
    }

    let overall_accuracy = percent(correct_total, questions.len() as u32);
    let difficulty = if questions.is_empty() {
        Difficulty::Medium
    } else {
        recommended_difficulty(overall_accuracy)
    };
    Ok(BaselineResult {
        category_results,
        overall_accuracy,
        recommended_ratings,
        recommended_difficulty: difficulty,
        skipped: false,
        completed_at,
    })
}

/// Flat default rating for every interest when the assessment is skipped.
pub fn skipped_baseline(interests: &[String], completed_at: i64) -> BaselineResult {
    let recommended_ratings = unique_interests(interests)
        .into_iter()
        .map(|category| (category.to_string(), DEFAULT_RATING))
        .collect();
    BaselineResult {
        category_results: BTreeMap::new(),
        overall_accuracy: DEFAULT_ACCURACY_PERCENT,
        recommended_ratings,
        recommended_difficulty: Difficulty::Medium,
        skipped: true,
        completed_at,
    }
}
