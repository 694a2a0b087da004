pub mod analysis;
pub mod normalize;

pub use analysis::{
    analyze_length_bias, bias_score, bias_statistics, BiasStatistics, LengthBiasAnalysis,
    BIAS_THRESHOLD, SEVERE_BIAS_THRESHOLD,
};
pub use normalize::{
    equalize_lengths, fix_length_bias, normalize_answer_lengths, randomize_answer_lengths,
    BiasFix,
};
