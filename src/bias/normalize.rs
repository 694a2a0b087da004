use serde::Serialize;

use crate::bias::analysis::{analyze_length_bias, char_len, LengthBiasAnalysis};
use crate::config::{LengthNormalizationConfig, PaddingStrategy, TruncationStrategy};
use crate::error::EngineResult;
use crate::random::RandomSource;
use crate::types::Question;

pub const ELLIPSIS: &str = "...";
pub const MIN_OPTION_LENGTH: usize = 5;
const LENGTH_JITTER: i64 = 2;
const RANDOMIZE_ATTEMPTS: usize = 3;
const FILLER_WORDS: &[&str] = &["so", "also", "really", "overall", "generally"];

fn take_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Pads `text` up to `target` characters. Never shortens.
pub fn pad_text(text: &str, target: usize, strategy: PaddingStrategy) -> String {
    let len = char_len(text);
    if len >= target {
        return text.to_string();
    }

    let mut out = text.to_string();
    let mut current = len;
    match strategy {
        PaddingStrategy::Space => {}
        PaddingStrategy::Ellipsis => {
            out.push_str(&".".repeat(target - current));
            current = target;
        }
        PaddingStrategy::WordFiller => {
            for word in FILLER_WORDS {
                let added = 1 + char_len(word);
                if current + added > target {
                    continue;
                }
                out.push(' ');
                out.push_str(word);
                current += added;
            }
        }
    }
    if current < target {
        out.push_str(&" ".repeat(target - current));
    }
    out
}

/// Truncates `text` to at most `limit` characters, ellipsis included.
pub fn truncate_text(
    text: &str,
    limit: usize,
    strategy: TruncationStrategy,
    preserve_meaning: bool,
) -> String {
    let len = char_len(text);
    if len <= limit {
        return text.to_string();
    }
    let marker = char_len(ELLIPSIS);
    if limit <= marker {
        return take_chars(ELLIPSIS, limit);
    }
    let budget = limit - marker;

    let strategy = if preserve_meaning {
        TruncationStrategy::WordBoundary
    } else {
        strategy
    };

    match strategy {
        TruncationStrategy::End => {
            format!("{}{}", take_chars(text, budget).trim_end(), ELLIPSIS)
        }
        TruncationStrategy::Middle => {
            let head_len = (budget + 1) / 2;
            let tail_len = budget - head_len;
            let head = take_chars(text, head_len);
            let tail: String = text.chars().skip(len - tail_len).collect();
            format!("{}{}{}", head.trim_end(), ELLIPSIS, tail.trim_start())
        }
        TruncationStrategy::WordBoundary => {
            let head = take_chars(text, budget);
            let cut_on_space = text
                .chars()
                .nth(budget)
                .map(char::is_whitespace)
                .unwrap_or(true);
            let kept = if cut_on_space {
                head.as_str()
            } else {
                match head.rfind(char::is_whitespace) {
                    Some(idx) if idx > 0 => &head[..idx],
                    _ => head.as_str(),
                }
            };
            format!("{}{}", kept.trim_end(), ELLIPSIS)
        }
    }
}

pub fn target_length(question: &Question, config: &LengthNormalizationConfig) -> usize {
    let target = config.target_length.unwrap_or_else(|| {
        let total: usize = question.options.iter().map(|o| char_len(o)).sum();
        (total as f64 / question.options.len().max(1) as f64).round() as usize
    });
    target.max(MIN_OPTION_LENGTH)
}

/// Pulls every option outside `target ± tolerance` back to the target.
pub fn normalize_answer_lengths(
    question: &Question,
    config: &LengthNormalizationConfig,
) -> EngineResult<Question> {
    question.validate()?;

    let target = target_length(question, config);
    let low = target.saturating_sub(config.tolerance);
    let high = target + config.tolerance;

    let options = question
        .options
        .iter()
        .map(|option| {
            let len = char_len(option);
            if len < low {
                pad_text(option, target, config.padding_strategy)
            } else if len > high {
                truncate_text(
                    option,
                    target,
                    config.truncation_strategy,
                    config.preserve_meaning,
                )
            } else {
                option.clone()
            }
        })
        .collect();

    Ok(Question {
        options,
        ..question.clone()
    })
}

/// Jitters every option by up to two characters, keeping at least five.
pub fn randomize_answer_lengths(
    question: &Question,
    rng: &mut RandomSource,
) -> EngineResult<Question> {
    question.validate()?;

    let options = question
        .options
        .iter()
        .map(|option| {
            let len = char_len(option) as i64;
            let delta = rng.range_inclusive(-LENGTH_JITTER, LENGTH_JITTER);
            let new_len = (len + delta).max(MIN_OPTION_LENGTH as i64) as usize;
            if new_len as i64 > len {
                pad_text(option, new_len, PaddingStrategy::Space)
            } else if (new_len as i64) < len {
                truncate_text(option, new_len, TruncationStrategy::End, false)
            } else {
                option.clone()
            }
        })
        .collect();

    Ok(Question {
        options,
        ..question.clone()
    })
}

/// Space-pads every option to the longest one.
pub fn equalize_lengths(question: &Question) -> Question {
    let longest = question
        .options
        .iter()
        .map(|o| char_len(o))
        .max()
        .unwrap_or(0);
    Question {
        options: question
            .options
            .iter()
            .map(|o| pad_text(o, longest, PaddingStrategy::Space))
            .collect(),
        ..question.clone()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasFix {
    pub question: Question,
    pub before: LengthBiasAnalysis,
    pub after: LengthBiasAnalysis,
    pub adjusted: bool,
    pub fixed: bool,
}

/// Severe bias gets full normalization, moderate bias gets length jitter.
/// Whatever is still biased afterwards is equalized.
pub fn fix_length_bias(
    question: &Question,
    config: &LengthNormalizationConfig,
    rng: &mut RandomSource,
) -> EngineResult<BiasFix> {
    let before = analyze_length_bias(question)?;
    if !before.is_biased() {
        return Ok(BiasFix {
            question: question.clone(),
            after: before.clone(),
            before,
            adjusted: false,
            fixed: true,
        });
    }

    let mut candidate = if before.is_severe() {
        normalize_answer_lengths(question, config)?
    } else {
        let mut best = question.clone();
        let mut best_score = before.bias_score;
        for _ in 0..RANDOMIZE_ATTEMPTS {
            let attempt = randomize_answer_lengths(question, rng)?;
            let score = analyze_length_bias(&attempt)?.bias_score;
            if score < best_score {
                best = attempt;
                best_score = score;
            }
        }
        best
    };

    let mut after = analyze_length_bias(&candidate)?;
    if after.is_biased() {
        candidate = equalize_lengths(&candidate);
        after = analyze_length_bias(&candidate)?;
    }

    let fixed = !after.is_biased();
    if !fixed {
        tracing::warn!(
            question_id = %question.id,
            score = after.bias_score,
            "length bias persists after correction"
        );
    }

    Ok(BiasFix {
        question: candidate,
        before,
        after,
        adjusted: true,
        fixed,
    })
}
