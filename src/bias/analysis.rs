use serde::Serialize;

use crate::error::EngineResult;
use crate::types::Question;

/// Score at or above which a question needs length correction.
pub const BIAS_THRESHOLD: u32 = 50;
/// Score above which a question counts as severely biased.
pub const SEVERE_BIAS_THRESHOLD: u32 = 70;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthBiasAnalysis {
    pub lengths: Vec<usize>,
    pub correct_length: usize,
    pub max_length: usize,
    pub min_length: usize,
    /// Rank of the correct option when lengths are sorted longest first.
    pub correct_position: usize,
    pub bias_score: u32,
}

impl LengthBiasAnalysis {
    pub fn is_biased(&self) -> bool {
        self.bias_score >= BIAS_THRESHOLD
    }

    pub fn is_severe(&self) -> bool {
        self.bias_score > SEVERE_BIAS_THRESHOLD
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn analyze_length_bias(question: &Question) -> EngineResult<LengthBiasAnalysis> {
    question.validate()?;

    let lengths: Vec<usize> = question.options.iter().map(|o| char_len(o)).collect();
    let correct_length = lengths[question.correct_answer];
    let max_length = lengths.iter().copied().max().unwrap_or(0);
    let min_length = lengths.iter().copied().min().unwrap_or(0);

    let mut sorted = lengths.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let correct_position = sorted
        .iter()
        .position(|&len| len == correct_length)
        .unwrap_or(0);

    let bias_score = if max_length == min_length {
        20
    } else if correct_length == max_length {
        100
    } else if correct_length == min_length {
        80
    } else {
        match correct_position {
            1 => 60,
            2 => 40,
            _ => 20,
        }
    };

    Ok(LengthBiasAnalysis {
        lengths,
        correct_length,
        max_length,
        min_length,
        correct_position,
        bias_score,
    })
}

pub fn bias_score(question: &Question) -> EngineResult<u32> {
    analyze_length_bias(question).map(|a| a.bias_score)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasStatistics {
    pub total_questions: usize,
    pub correct_is_longest: f64,
    pub correct_is_shortest: f64,
    pub average_bias_score: f64,
    pub severe_count: usize,
}

pub fn bias_statistics(questions: &[Question]) -> EngineResult<BiasStatistics> {
    if questions.is_empty() {
        return Ok(BiasStatistics::default());
    }

    let mut longest = 0usize;
    let mut shortest = 0usize;
    let mut score_sum = 0u64;
    let mut severe_count = 0usize;

    for question in questions {
        let analysis = analyze_length_bias(question)?;
        let distinct = analysis.max_length != analysis.min_length;
        if distinct && analysis.correct_length == analysis.max_length {
            longest += 1;
        }
        if distinct && analysis.correct_length == analysis.min_length {
            shortest += 1;
        }
        if analysis.is_severe() {
            severe_count += 1;
        }
        score_sum += analysis.bias_score as u64;
    }

    let n = questions.len() as f64;
    Ok(BiasStatistics {
        total_questions: questions.len(),
        correct_is_longest: longest as f64 / n,
        correct_is_shortest: shortest as f64 / n,
        average_bias_score: score_sum as f64 / n,
        severe_count,
    })
}
