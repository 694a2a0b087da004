pub mod controller;
pub mod flow;

pub use controller::{
    AdjustmentReason, DifficultyAdjustment, DifficultyController, DifficultyProfile, FlowZone,
    PerformanceTrend,
};
pub use flow::{flow_score, flow_state, FlowState};
