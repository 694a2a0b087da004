use serde::{Deserialize, Serialize};

use crate::types::OPTION_COUNT;
use crate::window::RollingWindow;

/// Store key for the persisted position tallies.
pub const ANALYTICS_KEY: &str = "randomization_analytics";
pub const MAX_POSITION_SHARE: f64 = 0.4;
pub const MIN_VALIDATION_SAMPLES: u64 = 20;
const RECENT_EVENT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizationEvent {
    pub question_id: String,
    pub original_position: usize,
    pub new_position: usize,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionAnalytics {
    pub buckets: [u64; OPTION_COUNT],
    pub total: u64,
    #[serde(default = "recent_events")]
    pub recent: RollingWindow<RandomizationEvent>,
}

fn recent_events() -> RollingWindow<RandomizationEvent> {
    RollingWindow::new(RECENT_EVENT_CAPACITY)
}

impl Default for PositionAnalytics {
    fn default() -> Self {
        Self {
            buckets: [0; OPTION_COUNT],
            total: 0,
            recent: recent_events(),
        }
    }
}

impl PositionAnalytics {
    pub fn record(&mut self, event: RandomizationEvent) {
        if let Some(bucket) = self.buckets.get_mut(event.new_position) {
            *bucket += 1;
            self.total += 1;
        }
        self.recent.push(event);
    }

    pub fn distribution(&self) -> [f64; OPTION_COUNT] {
        let mut shares = [0.0; OPTION_COUNT];
        if self.total == 0 {
            return shares;
        }
        for (share, count) in shares.iter_mut().zip(self.buckets.iter()) {
            *share = *count as f64 / self.total as f64;
        }
        shares
    }

    pub fn is_biased(&self) -> bool {
        self.total > 0
            && self
                .distribution()
                .iter()
                .any(|share| *share > MAX_POSITION_SHARE)
    }

    /// True once enough samples exist and no bucket exceeds its share cap.
    pub fn validate(&self) -> bool {
        self.total >= MIN_VALIDATION_SAMPLES && !self.is_biased()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Restores the event cap and recomputes the total from the buckets.
    pub fn sanitized(self) -> Self {
        Self {
            total: self.buckets.iter().sum(),
            buckets: self.buckets,
            recent: self.recent.resized(RECENT_EVENT_CAPACITY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(position: usize) -> RandomizationEvent {
        RandomizationEvent {
            question_id: "q".to_string(),
            original_position: 0,
            new_position: position,
            timestamp: 0,
        }
    }

    #[test]
    fn test_empty_analytics() {
        let analytics = PositionAnalytics::default();
        assert!(!analytics.is_biased());
        assert!(!analytics.validate());
        assert_eq!(analytics.distribution(), [0.0; 4]);
    }

    #[test]
    fn test_validation_needs_samples() {
        let mut analytics = PositionAnalytics::default();
        for i in 0..16 {
            analytics.record(event(i % 4));
        }
        assert!(!analytics.is_biased());
        assert!(!analytics.validate());
        for i in 0..4 {
            analytics.record(event(i));
        }
        assert!(analytics.validate());
    }

    #[test]
    fn test_skewed_bucket_flags_bias() {
        let mut analytics = PositionAnalytics::default();
        for _ in 0..10 {
            analytics.record(event(0));
        }
        for i in 1..4 {
            for _ in 0..4 {
                analytics.record(event(i));
            }
        }
        assert_eq!(analytics.total, 22);
        assert!(analytics.is_biased());
        assert!(!analytics.validate());
    }

    #[test]
    fn test_recent_events_capped() {
        let mut analytics = PositionAnalytics::default();
        for i in 0..120 {
            analytics.record(event(i % 4));
        }
        assert_eq!(analytics.recent.len(), 50);
        assert_eq!(analytics.total, 120);
    }

    #[test]
    fn test_out_of_range_position_not_tallied() {
        let mut analytics = PositionAnalytics::default();
        analytics.record(event(7));
        assert_eq!(analytics.total, 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut analytics = PositionAnalytics::default();
        for i in 0..30 {
            analytics.record(event(i % 4));
        }
        assert!(analytics.validate());
        analytics.reset();
        assert_eq!(analytics.total, 0);
        assert_eq!(analytics.buckets, [0; 4]);
        assert!(analytics.recent.is_empty());
        assert!(!analytics.validate());
    }

    #[test]
    fn test_sanitized_restores_cap_and_total() {
        let events: Vec<RandomizationEvent> = (0..5).map(event).collect();
        let json = serde_json::json!({
            "buckets": [3, 1, 0, 2],
            "total": 999,
            "recent": { "capacity": 1u64 << 60, "items": serde_json::to_value(&events).unwrap() }
        });
        let stored: PositionAnalytics = serde_json::from_value(json).unwrap();
        let analytics = stored.sanitized();
        assert_eq!(analytics.total, 6);
        assert_eq!(analytics.recent.capacity(), 50);
        assert_eq!(analytics.recent.len(), 5);
    }

    #[test]
    fn test_json_roundtrip_keeps_tallies() {
        let mut analytics = PositionAnalytics::default();
        analytics.record(event(2));
        let json = serde_json::to_value(&analytics).unwrap();
        let restored: PositionAnalytics = serde_json::from_value(json).unwrap();
        assert_eq!(restored.buckets, [0, 0, 1, 0]);
        assert_eq!(restored.recent.capacity(), 50);
    }
}
