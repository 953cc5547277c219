use gat_core::{InjectionKind, Network};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::convention::ScalingConvention;
use crate::error::{ScalingError, ScalingResult};
use crate::leaf::InjectionScalable;
use crate::parameters::ScalingParameters;
use crate::scalable::{Scalable, ScaleRun, Scope};

/// Operating point of one injection when the baseline was recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
struct InjectionBaseline {
    /// Measured terminal flow, natural convention
    measured: f64,
    /// Setpoint, natural convention
    setpoint: f64,
}

/// Routes increases to `up` and decreases to `down`.
///
/// The two sub-trees are shared between shallow copies; the set of
/// deactivated injections and the recorded baseline belong to each instance.
#[derive(Debug, Clone)]
pub struct UpDownScalable {
    up: Arc<Scalable>,
    down: Arc<Scalable>,
    deactivated: HashSet<String>,
    baseline: Option<HashMap<(InjectionKind, String), InjectionBaseline>>,
}

impl UpDownScalable {
    pub fn new(up: Scalable, down: Scalable) -> Self {
        Self {
            up: Arc::new(up),
            down: Arc::new(down),
            deactivated: HashSet::new(),
            baseline: None,
        }
    }

    pub fn up(&self) -> &Scalable {
        &self.up
    }

    pub fn down(&self) -> &Scalable {
        &self.down
    }

    pub fn deactivated(&self) -> &HashSet<String> {
        &self.deactivated
    }

    /// Exclude injections from later queries and scaling.
    pub fn deactivate_scalables<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deactivated.extend(ids.into_iter().map(Into::into));
    }

    /// Node sharing both sub-trees, with every injection active again.
    pub fn shallow_copy(&self) -> Self {
        Self {
            up: Arc::clone(&self.up),
            down: Arc::clone(&self.down),
            deactivated: HashSet::new(),
            baseline: self.baseline.clone(),
        }
    }

    /// Record the network operating point used by the injection queries.
    ///
    /// Each injection contributes its measured terminal flow, or its setpoint
    /// when the network carries no measurement.
    pub fn set_initial_injection_to_network_value(&mut self, network: &Network) {
        let mut baseline = HashMap::new();
        for leaf in self.all_leaves() {
            if let Some(injection) = network.injection(leaf.kind(), leaf.id()) {
                let setpoint = injection.active_power().value();
                let measured = injection.terminal_p().map_or(setpoint, |p| p.value());
                baseline.insert(
                    (leaf.kind(), leaf.id().to_string()),
                    InjectionBaseline { measured, setpoint },
                );
            }
        }
        info!(injections = baseline.len(), "recorded up/down baseline");
        self.baseline = Some(baseline);
    }

    /// Baseline flow of the active injections, moved by the setpoint changes
    /// applied since it was recorded.
    pub fn current_injection(
        &self,
        network: &Network,
        convention: ScalingConvention,
    ) -> ScalingResult<f64> {
        let baseline = self
            .baseline
            .as_ref()
            .ok_or(ScalingError::BaselineNotRecorded)?;
        let root = Scope::root();
        let scope = root.nested(&self.deactivated);
        let mut leaves = Vec::new();
        self.up.collect_leaves(&scope, &mut leaves);
        self.down.collect_leaves(&scope, &mut leaves);

        let total: f64 = leaves
            .into_iter()
            .filter_map(|leaf| {
                let recorded = baseline.get(&(leaf.kind(), leaf.id().to_string()))?;
                let setpoint = network
                    .injection(leaf.kind(), leaf.id())
                    .map_or(recorded.setpoint, |i| i.active_power().value());
                let natural = recorded.measured + (setpoint - recorded.setpoint);
                Some(convention.convert(natural, leaf.natural_convention()))
            })
            .sum();
        Ok(total)
    }

    pub fn minimum_injection(
        &self,
        network: &Network,
        convention: ScalingConvention,
    ) -> ScalingResult<f64> {
        self.require_baseline()?;
        Ok(self.minimum_in(network, convention, &Scope::root()))
    }

    pub fn maximum_injection(
        &self,
        network: &Network,
        convention: ScalingConvention,
    ) -> ScalingResult<f64> {
        self.require_baseline()?;
        Ok(self.maximum_in(network, convention, &Scope::root()))
    }

    fn require_baseline(&self) -> ScalingResult<()> {
        match self.baseline {
            Some(_) => Ok(()),
            None => Err(ScalingError::BaselineNotRecorded),
        }
    }

    fn all_leaves(&self) -> Vec<&InjectionScalable> {
        let root = Scope::root();
        let mut leaves = Vec::new();
        self.up.collect_leaves(&root, &mut leaves);
        self.down.collect_leaves(&root, &mut leaves);
        leaves
    }

    pub(crate) fn minimum_in(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> f64 {
        let scope = scope.nested(&self.deactivated);
        self.up.minimum_in(network, convention, &scope)
            + self.down.minimum_in(network, convention, &scope)
    }

    pub(crate) fn maximum_in(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> f64 {
        let scope = scope.nested(&self.deactivated);
        self.up.maximum_in(network, convention, &scope)
            + self.down.maximum_in(network, convention, &scope)
    }

    /// A `Target` request is turned into a variation first; its sign then
    /// picks the side. The other side is left untouched.
    pub(crate) fn scale_in(
        &self,
        network: &mut Network,
        asked: f64,
        params: &ScalingParameters,
        scope: &Scope<'_>,
        run: &mut ScaleRun,
    ) -> ScalingResult<f64> {
        let scope = scope.nested(&self.deactivated);
        let convention = params.scaling_convention;
        let current = self.up.current_in(network, convention, &scope)
            + self.down.current_in(network, convention, &scope);
        let variation = params.variation_asked(asked, current);
        let child_params = params.as_delta();
        let (side, target) = if variation >= 0.0 {
            ("up", &self.up)
        } else {
            ("down", &self.down)
        };
        let done = target.scale_in(network, variation, &child_params, &scope, run)?;
        debug!(side, variation, done, "up/down scaled");
        Ok(done)
    }
}
