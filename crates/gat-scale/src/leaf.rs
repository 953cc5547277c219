use gat_core::{InjectionKind, InjectionRef, Megavars, Megawatts, Network};
use tracing::{debug, info, warn};

use crate::convention::ScalingConvention;
use crate::error::{ScalingError, ScalingResult};
use crate::parameters::ScalingParameters;
use crate::scalable::{ScaleRun, Scope};

/// Diagnostic categories for equipment that contributed nothing.
pub mod skip {
    pub const IGNORED: &str = "ignored";
    pub const INACTIVE: &str = "inactive";
    pub const NOT_FOUND: &str = "not-found";
    pub const DISCONNECTED: &str = "disconnected";
    pub const OUTSIDE_MAIN_COMPONENT: &str = "outside-main-component";
    pub const OUT_OF_LIMITS: &str = "out-of-limits";
}

/// Scalable over a single generator, load or dangling line.
///
/// Bounds are kept in the injection's natural convention. Without an explicit
/// range, generators and dangling lines are unbounded and loads are limited
/// to `[0, MAX]`; generators are further restricted by their `[pmin, pmax]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionScalable {
    kind: InjectionKind,
    id: String,
    min: f64,
    max: f64,
}

impl InjectionScalable {
    pub fn new(kind: InjectionKind, id: impl Into<String>) -> ScalingResult<Self> {
        let (min, max) = match kind {
            InjectionKind::Load => (0.0, f64::MAX),
            InjectionKind::Generator | InjectionKind::DanglingLine => (-f64::MAX, f64::MAX),
        };
        Self::build(kind, id.into(), min, max)
    }

    /// Leaf restricted to `[min, max]` (natural convention); requires `min < max`.
    pub fn with_limits(
        kind: InjectionKind,
        id: impl Into<String>,
        min: f64,
        max: f64,
    ) -> ScalingResult<Self> {
        let id = id.into();
        if !(min < max) {
            return Err(ScalingError::InvalidRange { id, min, max });
        }
        Self::build(kind, id, min, max)
    }

    fn build(kind: InjectionKind, id: String, min: f64, max: f64) -> ScalingResult<Self> {
        if id.trim().is_empty() {
            return Err(ScalingError::MissingIdentifier);
        }
        Ok(Self { kind, id, min, max })
    }

    pub fn kind(&self) -> InjectionKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn natural_convention(&self) -> ScalingConvention {
        ScalingConvention::natural(self.kind)
    }

    fn lookup<'n>(&self, network: &'n Network) -> Option<InjectionRef<'n>> {
        network.injection(self.kind, &self.id)
    }

    /// Admissible range in natural convention: the configured range
    /// intersected with the equipment's own limits. A configured range
    /// disjoint from those limits collapses to the nearest equipment limit.
    fn natural_bounds(&self, injection: &InjectionRef<'_>) -> (f64, f64) {
        let (native_min, native_max) = injection.native_limits();
        let (native_min, native_max) = (native_min.value(), native_max.value());
        let min = self.min.max(native_min);
        let max = self.max.min(native_max);
        if min <= max {
            (min, max)
        } else if self.max < native_min {
            (native_min, native_min)
        } else {
            (native_max, native_max)
        }
    }

    /// Setpoint in natural convention, 0 when the equipment is missing.
    pub fn initial_value(&self, network: &Network) -> f64 {
        self.lookup(network)
            .map(|injection| injection.active_power().value())
            .unwrap_or(0.0)
    }

    pub(crate) fn current_value(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> f64 {
        if scope.is_inactive(&self.id) {
            return 0.0;
        }
        convention.convert(self.initial_value(network), self.natural_convention())
    }

    pub(crate) fn bounds(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> (f64, f64) {
        if scope.is_inactive(&self.id) {
            return (0.0, 0.0);
        }
        match self.lookup(network) {
            Some(injection) => {
                let (min, max) = self.natural_bounds(&injection);
                convention.convert_bounds(min, max, self.natural_convention())
            }
            None => (0.0, 0.0),
        }
    }

    pub(crate) fn scale(
        &self,
        network: &mut Network,
        asked: f64,
        params: &ScalingParameters,
        scope: &Scope<'_>,
        run: &mut ScaleRun,
    ) -> f64 {
        if !asked.is_finite() {
            warn!(kind = %self.kind, id = %self.id, asked, "non-finite variation asked, skipped");
            return 0.0;
        }
        if params.is_ignored(&self.id) {
            run.diagnostics
                .add_warning_with_entity(skip::IGNORED, "injection is ignored", &self.id);
            return 0.0;
        }
        if scope.is_inactive(&self.id) {
            run.diagnostics
                .add_warning_with_entity(skip::INACTIVE, "injection is deactivated", &self.id);
            return 0.0;
        }

        let (connected, bus, old_p, old_q, (mut min, mut max)) = match self.lookup(network) {
            Some(injection) => (
                injection.is_connected(),
                injection.bus(),
                injection.active_power().value(),
                injection.reactive_power().value(),
                self.natural_bounds(&injection),
            ),
            None => {
                warn!(kind = %self.kind, id = %self.id, "injection not found");
                run.diagnostics.add_warning_with_entity(
                    skip::NOT_FOUND,
                    &format!("{} not found in network", self.kind),
                    &self.id,
                );
                return 0.0;
            }
        };

        if !connected {
            if !params.reconnect {
                run.diagnostics.add_warning_with_entity(
                    skip::DISCONNECTED,
                    "terminal is disconnected",
                    &self.id,
                );
                return 0.0;
            }
            if let Some(mut injection) = network.injection_mut(self.kind, &self.id) {
                injection.connect();
            }
            info!(kind = %self.kind, id = %self.id, "reconnected injection before scaling");
        }

        if !run.in_main_component(network, bus) {
            run.diagnostics.add_warning_with_entity(
                skip::OUTSIDE_MAIN_COMPONENT,
                "bus is outside the main connected component",
                &self.id,
            );
            return 0.0;
        }

        let natural = self.natural_convention();
        let convention = params.scaling_convention;
        if old_p < min || old_p > max {
            if self.kind == InjectionKind::Generator && params.allow_out_of_limits {
                min = min.min(old_p);
                max = max.max(old_p);
            } else {
                warn!(
                    kind = %self.kind,
                    id = %self.id,
                    value = old_p,
                    min,
                    max,
                    "injection outside its active power range, skipped"
                );
                run.diagnostics.add_warning_with_entity(
                    skip::OUT_OF_LIMITS,
                    &format!("active power {old_p} outside [{min}, {max}]"),
                    &self.id,
                );
                return 0.0;
            }
        }

        let current = convention.convert(old_p, natural);
        let (lo, hi) = convention.convert_bounds(min, max, natural);
        let variation = params.variation_asked(asked, current);
        let target = (current + variation).clamp(lo, hi);
        let done = target - current;
        let new_p = natural.convert(target, convention);

        if let Some(mut injection) = network.injection_mut(self.kind, &self.id) {
            injection.set_active_power(Megawatts(new_p));
            if params.constant_power_factor && natural == ScalingConvention::Load && old_p != 0.0
            {
                injection.set_reactive_power(Megavars(old_q * new_p / old_p));
            }
        }
        debug!(kind = %self.kind, id = %self.id, from = old_p, to = new_p, done, "scaled injection");
        done
    }

    /// Active power available toward the bound in the direction of `asked`,
    /// relative to the leaf's `percentage` share of it. `None` when the leaf
    /// does not constrain the request.
    pub(crate) fn available_ratio(
        &self,
        network: &Network,
        asked: f64,
        percentage: f64,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> Option<f64> {
        let share = (asked * percentage / 100.0).abs();
        if share == 0.0 || scope.is_inactive(&self.id) {
            return None;
        }
        let injection = self.lookup(network)?;
        let natural = self.natural_convention();
        let (min, max) = self.natural_bounds(&injection);
        let current = convention.convert(injection.active_power().value(), natural);
        let (lo, hi) = convention.convert_bounds(min, max, natural);
        let available = if asked > 0.0 { hi - current } else { current - lo };
        Some(available.max(0.0) / share)
    }

    /// Set the setpoint to zero.
    pub fn reset(&self, network: &mut Network) {
        if let Some(mut injection) = network.injection_mut(self.kind, &self.id) {
            injection.set_active_power(Megawatts(0.0));
        }
    }
}
