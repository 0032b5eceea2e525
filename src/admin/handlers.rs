use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LimiterStatus {
    /// Keys held by the limiter; grows with every new client.
    pub tracked_keys: usize,
    pub max_events: usize,
    pub time_window_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub stages: Vec<String>,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
    })
}

pub async fn get_limiter(State(state): State<AdminState>) -> Json<LimiterStatus> {
    let limiter = &state.gateway.limiter;
    Json(LimiterStatus {
        tracked_keys: limiter.tracked_keys(),
        max_events: limiter.max_events(),
        time_window_secs: limiter.time_window().as_secs(),
    })
}

pub async fn get_pipeline(State(state): State<AdminState>) -> Json<PipelineStatus> {
    Json(PipelineStatus {
        stages: state
            .gateway
            .pipeline
            .stage_names()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}
