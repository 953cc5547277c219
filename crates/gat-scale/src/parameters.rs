use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::convention::ScalingConvention;

/// How a proportional node reacts when children cannot absorb their share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Single pass; unabsorbed shares are lost.
    #[default]
    OneShot,
    /// Redistribute unabsorbed shares among unsaturated children until the
    /// volume is delivered or every child saturates.
    RespectVolumeAsked,
    /// Shrink the whole request so every child keeps its exact share.
    RespectDistribution,
}

/// Whether `asked` is a variation or an absolute target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingType {
    #[default]
    Delta,
    Target,
}

/// Weighting used when a proportional node is built from injections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    ProportionalToP0,
    ProportionalToTargetP,
    ProportionalToPMax,
    ProportionalToDiffPMaxTargetP,
    ProportionalToDiffTargetPMin,
    #[default]
    Uniform,
    /// Fill injections in the given order instead of distributing.
    StackingUp,
}

impl DistributionMode {
    /// Modes that fall back to uniform weights when every weight is zero.
    pub fn falls_back_to_uniform(self) -> bool {
        matches!(
            self,
            DistributionMode::ProportionalToP0
                | DistributionMode::ProportionalToTargetP
                | DistributionMode::ProportionalToDiffPMaxTargetP
                | DistributionMode::ProportionalToDiffTargetPMin
        )
    }
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistributionMode::ProportionalToP0 => "proportional_to_p0",
            DistributionMode::ProportionalToTargetP => "proportional_to_target_p",
            DistributionMode::ProportionalToPMax => "proportional_to_p_max",
            DistributionMode::ProportionalToDiffPMaxTargetP => "proportional_to_diff_p_max_target_p",
            DistributionMode::ProportionalToDiffTargetPMin => "proportional_to_diff_target_p_min",
            DistributionMode::Uniform => "uniform",
            DistributionMode::StackingUp => "stacking_up",
        };
        f.write_str(name)
    }
}

/// Configuration of one scaling run.
///
/// Every field has a default, so a parameters file only needs the fields it
/// changes:
///
/// ```yaml
/// scaling_convention: load
/// priority: respect_volume_asked
/// constant_power_factor: true
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingParameters {
    pub scaling_convention: ScalingConvention,
    pub priority: Priority,
    pub scaling_type: ScalingType,
    /// Connect disconnected equipment before scaling it
    pub reconnect: bool,
    /// Let generators outside their active power range be scaled
    pub allow_out_of_limits: bool,
    /// Keep Q/P constant on load-like equipment
    pub constant_power_factor: bool,
    /// Injections that never take part in scaling
    pub ignored_injection_ids: BTreeSet<String>,
    /// Used by `scale_on_generators` / `scale_on_loads`
    pub distribution_mode: DistributionMode,
    /// Used by `scale_on_generators` / `scale_on_loads`
    pub scaling_value: f64,
}

impl ScalingParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scaling_convention(mut self, convention: ScalingConvention) -> Self {
        self.scaling_convention = convention;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_scaling_type(mut self, scaling_type: ScalingType) -> Self {
        self.scaling_type = scaling_type;
        self
    }

    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_allow_out_of_limits(mut self, allow: bool) -> Self {
        self.allow_out_of_limits = allow;
        self
    }

    pub fn with_constant_power_factor(mut self, constant: bool) -> Self {
        self.constant_power_factor = constant;
        self
    }

    pub fn with_ignored_injections<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_injection_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_distribution_mode(mut self, mode: DistributionMode) -> Self {
        self.distribution_mode = mode;
        self
    }

    pub fn with_scaling_value(mut self, value: f64) -> Self {
        self.scaling_value = value;
        self
    }

    /// Variation to apply given the current value of the scaled element.
    pub fn variation_asked(&self, asked: f64, current: f64) -> f64 {
        match self.scaling_type {
            ScalingType::Delta => asked,
            ScalingType::Target => asked - current,
        }
    }

    pub fn is_ignored(&self, id: &str) -> bool {
        self.ignored_injection_ids.contains(id)
    }

    /// Copy of these parameters with a `Delta` scaling type, handed to the
    /// children of a composite once the target has been resolved.
    pub(crate) fn as_delta(&self) -> ScalingParameters {
        let mut delta = self.clone();
        delta.scaling_type = ScalingType::Delta;
        delta
    }
}
