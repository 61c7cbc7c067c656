use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::ml::Predictor;

/// Shared application state for API handlers.
///
/// Built once at startup from the loaded artifacts; nothing in it is
/// mutated while serving.
#[derive(Clone)]
pub struct AppState {
    /// Model bundle wrapped in the prediction pipeline
    pub predictor: Arc<Predictor>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
            start_time: Utc::now(),
        }
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
