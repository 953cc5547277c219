//! Notification hook fired once per top-level scaling call.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::parameters::{DistributionMode, ScalingType};

/// What a scaling call was asked to do and what it delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingReport {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_mode: Option<DistributionMode>,
    pub scaling_type: ScalingType,
    pub asked: f64,
    pub done: f64,
}

/// Receiver of scaling reports. Reporting never affects the scaling result.
pub trait ScalingReporter {
    fn report(&mut self, report: ScalingReport);
}

/// Collects reports in memory.
impl ScalingReporter for Vec<ScalingReport> {
    fn report(&mut self, report: ScalingReport) {
        self.push(report);
    }
}

/// Logs each report at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ScalingReporter for TracingReporter {
    fn report(&mut self, report: ScalingReport) {
        match report.distribution_mode {
            Some(mode) => info!(
                label = %report.label,
                mode = %mode,
                scaling_type = ?report.scaling_type,
                asked = report.asked,
                done = report.done,
                "scaling report"
            ),
            None => info!(
                label = %report.label,
                scaling_type = ?report.scaling_type,
                asked = report.asked,
                done = report.done,
                "scaling report"
            ),
        }
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ScalingReporter for NoopReporter {
    fn report(&mut self, _report: ScalingReport) {}
}
