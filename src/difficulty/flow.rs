use serde::Serialize;

use crate::difficulty::controller::FlowZone;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowState {
    pub flow_score: u32,
    pub is_in_flow: bool,
    pub recent_accuracy: f64,
    pub recommendations: Vec<String>,
}

pub fn flow_score(recent_accuracy: f64, zone: FlowZone) -> u32 {
    let center = (zone.min + zone.max) / 2.0;
    let width = (zone.max - zone.min).max(f64::EPSILON);
    let distance = ((recent_accuracy - center).abs() / width).min(1.0);
    ((1.0 - distance) * 100.0).round() as u32
}

pub fn flow_state(recent_accuracy: f64, zone: FlowZone) -> FlowState {
    let is_in_flow = zone.contains(recent_accuracy);

    let recommendations = if is_in_flow {
        vec![
            "You're in the zone. Keep the current pace.".to_string(),
            "Challenge is well matched to your skill.".to_string(),
        ]
    } else if recent_accuracy > zone.max {
        vec![
            "Questions are getting easy for you. Harder ones are on the way.".to_string(),
            "Try a tougher category to stretch yourself.".to_string(),
        ]
    } else {
        vec![
            "These questions are tough right now. Difficulty will ease off.".to_string(),
            "Review definitions in your strongest category to rebuild momentum.".to_string(),
        ]
    };

    FlowState {
        flow_score: flow_score(recent_accuracy, zone),
        is_in_flow,
        recent_accuracy,
        recommendations,
    }
}
