use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Wall-clock duration of one calibration stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Aggregated timing trace of a session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.total_ms += elapsed_ms;
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    /// Record the time elapsed since `start` under `label`.
    pub fn record_since(&mut self, label: impl Into<String>, start: Instant) {
        self.push(label, start.elapsed().as_secs_f64() * 1000.0);
    }

    /// Append another breakdown's stages.
    pub fn extend(&mut self, other: &TimingBreakdown) {
        for stage in &other.stages {
            self.push(stage.label.clone(), stage.elapsed_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_accumulates_stages() {
        let mut t = TimingBreakdown::default();
        t.push("features", 2.0);
        t.push("optimize", 3.5);
        let mut all = TimingBreakdown::default();
        all.extend(&t);
        assert_eq!(all.stages.len(), 2);
        assert!((all.total_ms - 5.5).abs() < 1e-12);
    }
}
