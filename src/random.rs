use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;
const LCG_MODULUS: f64 = 4_294_967_296.0;

/// Linear congruential generator for reproducible runs.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state as f64 / LCG_MODULUS
    }
}

pub enum RandomSource {
    Seeded(Lcg),
    Entropy(StdRng),
}

impl RandomSource {
    pub fn seeded(seed: u32) -> Self {
        Self::Seeded(Lcg::new(seed))
    }

    pub fn entropy() -> Self {
        Self::Entropy(StdRng::from_os_rng())
    }

    pub fn from_seed(seed: Option<u32>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::entropy(),
        }
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        match self {
            Self::Seeded(lcg) => lcg.next_f64(),
            Self::Entropy(rng) => rng.random::<f64>(),
        }
    }

    /// Uniform in `0..upper`; `upper` must be non-zero.
    pub fn below(&mut self, upper: usize) -> usize {
        debug_assert!(upper > 0);
        match self {
            Self::Seeded(lcg) => ((lcg.next_f64() * upper as f64) as usize).min(upper - 1),
            Self::Entropy(rng) => rng.random_range(0..upper),
        }
    }

    pub fn range_inclusive(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        low + self.below((high - low + 1) as usize) as i64
    }

    /// Fisher-Yates: walk from the back, swapping each slot with a uniformly
    /// drawn slot at or before it.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }

    /// Index drawn proportionally to `weights`; `None` when no weight is positive.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        let mut target = self.next_f64() * total;
        let mut last_positive = None;
        for (i, &w) in weights.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            last_positive = Some(i);
            if target < w {
                return Some(i);
            }
            target -= w;
        }
        last_positive
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::entropy()
    }
}
