use serde::{Deserialize, Serialize};

use crate::baseline::BaselineResult;
use crate::config::DifficultyParams;
use crate::difficulty::flow::{flow_state, FlowState};
use crate::error::{EngineError, EngineResult};
use crate::types::Difficulty;
use crate::window::RollingWindow;

const DEFAULT_ACCURACY: f64 = 0.5;
const DEFAULT_CHALLENGE: f64 = 0.5;
const TREND_SPAN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowZone {
    pub min: f64,
    pub max: f64,
}

impl FlowZone {
    pub fn from_params(params: &DifficultyParams) -> Self {
        Self {
            min: params.flow_min,
            max: params.flow_max,
        }
    }

    pub fn contains(&self, accuracy: f64) -> bool {
        accuracy >= self.min && accuracy <= self.max
    }
}

impl Default for FlowZone {
    fn default() -> Self {
        Self::from_params(&DifficultyParams::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentReason {
    Increase,
    Decrease,
    Maintain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum PerformanceTrend {
    Improving,
    #[default]
    Stable,
    Declining,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyProfile {
    pub user_skill_level: f64,
    pub current_challenge: f64,
    pub performance_history: RollingWindow<f64>,
    /// Always taken from the controller's parameters, never from storage.
    #[serde(skip_deserializing)]
    pub optimal_flow_zone: FlowZone,
    pub confidence: f64,
    pub adjustment_count: u32,
    pub last_adjustment: i64,
}

impl DifficultyProfile {
    pub fn new(window_size: usize, skill: f64) -> Self {
        let skill = skill.clamp(0.0, 1.0);
        Self {
            user_skill_level: skill,
            current_challenge: skill,
            performance_history: RollingWindow::new(window_size),
            optimal_flow_zone: FlowZone::default(),
            confidence: 0.0,
            adjustment_count: 0,
            last_adjustment: 0,
        }
    }

    pub fn recent_accuracy(&self) -> f64 {
        self.performance_history.mean().unwrap_or(DEFAULT_ACCURACY)
    }

    fn is_consistent(&self, params: &DifficultyParams) -> bool {
        self.performance_history.capacity() == params.window_size.max(1)
            && self.performance_history.iter().all(|s| in_unit(*s))
            && in_unit(self.user_skill_level)
            && in_unit(self.current_challenge)
            && in_unit(self.confidence)
    }

    /// Rebuilds a stored profile under `params`: window at the configured size
    /// holding the newest valid samples, levels clamped to `[0, 1]`, flow zone
    /// reset to the configured band.
    pub fn sanitized(self, params: &DifficultyParams) -> Self {
        let mut performance_history = RollingWindow::new(params.window_size);
        for sample in self.performance_history.iter().filter(|s| s.is_finite()) {
            performance_history.push(sample.clamp(0.0, 1.0));
        }
        Self {
            user_skill_level: unit_or(self.user_skill_level, DEFAULT_CHALLENGE),
            current_challenge: unit_or(self.current_challenge, DEFAULT_CHALLENGE),
            performance_history,
            optimal_flow_zone: FlowZone::from_params(params),
            confidence: unit_or(self.confidence, 0.0),
            adjustment_count: self.adjustment_count,
            last_adjustment: self.last_adjustment,
        }
    }
}

fn in_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn unit_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self::new(DifficultyParams::default().window_size, DEFAULT_CHALLENGE)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyAdjustment {
    pub previous_challenge: f64,
    pub new_challenge: f64,
    pub reason: AdjustmentReason,
    pub recent_accuracy: f64,
    pub confidence: f64,
    pub trend: PerformanceTrend,
}

pub struct DifficultyController {
    params: DifficultyParams,
    profile: DifficultyProfile,
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new(DifficultyParams::default())
    }
}

impl DifficultyController {
    pub fn new(params: DifficultyParams) -> Self {
        let profile = fresh_profile(&params, DEFAULT_CHALLENGE);
        Self { params, profile }
    }

    /// Adopts a previously saved profile, repairing anything outside its invariants.
    pub fn from_profile(params: DifficultyParams, profile: DifficultyProfile) -> Self {
        if !profile.is_consistent(&params) {
            tracing::warn!(
                stored_window = profile.performance_history.capacity(),
                window = params.window_size,
                challenge = profile.current_challenge,
                "stored difficulty profile out of range, repairing"
            );
        }
        let profile = profile.sanitized(&params);
        Self { params, profile }
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn current_challenge(&self) -> f64 {
        self.profile.current_challenge
    }

    pub fn recommended_difficulty(&self) -> Difficulty {
        Difficulty::from_challenge(self.profile.current_challenge)
    }

    pub fn update_performance(&mut self, sample: f64) -> EngineResult<DifficultyAdjustment> {
        self.update_performance_at(sample, chrono::Utc::now().timestamp_millis())
    }

    pub fn update_performance_at(
        &mut self,
        sample: f64,
        timestamp: i64,
    ) -> EngineResult<DifficultyAdjustment> {
        if !sample.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "performance sample must be finite, got {}",
                sample
            )));
        }
        let sample = sample.clamp(0.0, 1.0);
        self.profile.performance_history.push(sample);

        let alpha = self.params.skill_smoothing;
        self.profile.user_skill_level =
            (alpha * sample + (1.0 - alpha) * self.profile.user_skill_level).clamp(0.0, 1.0);

        let recent_accuracy = self.profile.recent_accuracy();
        let confidence = self.compute_confidence();
        self.profile.confidence = confidence;

        let previous_challenge = self.profile.current_challenge;
        let confident = confidence > self.params.confidence_threshold;
        let zone = self.profile.optimal_flow_zone;
        let reason = if recent_accuracy > zone.max && confident {
            self.profile.current_challenge = (previous_challenge + self.params.step).min(1.0);
            AdjustmentReason::Increase
        } else if recent_accuracy < zone.min && confident {
            self.profile.current_challenge = (previous_challenge - self.params.step).max(0.0);
            AdjustmentReason::Decrease
        } else {
            AdjustmentReason::Maintain
        };

        if reason != AdjustmentReason::Maintain {
            self.profile.adjustment_count += 1;
            self.profile.last_adjustment = timestamp;
            tracing::debug!(
                previous = previous_challenge,
                current = self.profile.current_challenge,
                recent_accuracy,
                confidence,
                ?reason,
                "challenge level adjusted"
            );
        }

        Ok(DifficultyAdjustment {
            previous_challenge,
            new_challenge: self.profile.current_challenge,
            reason,
            recent_accuracy,
            confidence,
            trend: self.trend(),
        })
    }

    fn compute_confidence(&self) -> f64 {
        let window = &self.profile.performance_history;
        let consistency = (1.0 - window.variance()).max(0.0);
        let sample_ratio = (window.len() as f64 / window.capacity() as f64).min(1.0);
        (0.7 * consistency + 0.3 * sample_ratio).clamp(0.0, 1.0)
    }

    pub fn trend(&self) -> PerformanceTrend {
        let window = &self.profile.performance_history;
        let (Some(recent), Some(previous)) = (
            window.tail_mean(0, TREND_SPAN),
            window.tail_mean(TREND_SPAN, TREND_SPAN),
        ) else {
            return PerformanceTrend::Stable;
        };

        let delta = recent - previous;
        if delta > self.params.trend_threshold {
            PerformanceTrend::Improving
        } else if delta < -self.params.trend_threshold {
            PerformanceTrend::Declining
        } else {
            PerformanceTrend::Stable
        }
    }

    pub fn flow_state(&self) -> FlowState {
        flow_state(
            self.profile.recent_accuracy(),
            self.profile.optimal_flow_zone,
        )
    }

    pub fn reset(&mut self, skill: Option<f64>) {
        let skill = skill
            .filter(|s| s.is_finite())
            .unwrap_or(DEFAULT_CHALLENGE);
        self.profile = fresh_profile(&self.params, skill);
        tracing::info!(challenge = self.profile.current_challenge, "difficulty profile reset");
    }

    /// Starts the profile from an onboarding assessment.
    pub fn seed_from_baseline(&mut self, baseline: &BaselineResult) {
        let mut profile =
            fresh_profile(&self.params, baseline.recommended_difficulty.challenge_level());
        profile.user_skill_level = (baseline.overall_accuracy / 100.0).clamp(0.0, 1.0);
        self.profile = profile;
    }
}

fn fresh_profile(params: &DifficultyParams, skill: f64) -> DifficultyProfile {
    let mut profile = DifficultyProfile::new(params.window_size, skill);
    profile.optimal_flow_zone = FlowZone::from_params(params);
    profile
}
