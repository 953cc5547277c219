use gat_core::Network;
use tracing::debug;

use crate::convention::ScalingConvention;
use crate::error::ScalingResult;
use crate::parameters::ScalingParameters;
use crate::scalable::{bounded_variation, compound_bounds, Scalable, ScaleRun, Scope};

/// Remaining variations below this are considered delivered.
const REMAINING_EPSILON: f64 = 1e-9;

/// Sequential fill: each child absorbs as much as it can before the next one
/// is asked. Child order is the only tie-break.
#[derive(Debug, Clone)]
pub struct StackScalable {
    children: Vec<Scalable>,
    min: f64,
    max: f64,
}

impl StackScalable {
    pub fn new(children: Vec<Scalable>) -> Self {
        Self::with_limits(children, -f64::MAX, f64::MAX)
    }

    /// `[min, max]` bounds the sum of the children, in generator convention.
    pub fn with_limits(children: Vec<Scalable>, min: f64, max: f64) -> Self {
        Self { children, min, max }
    }

    pub fn children(&self) -> &[Scalable] {
        &self.children
    }

    pub(crate) fn minimum_in(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> f64 {
        let sum: f64 = self
            .children
            .iter()
            .map(|c| c.minimum_in(network, convention, scope))
            .sum();
        compound_bounds(sum, f64::MAX, self.min, self.max, convention).0
    }

    pub(crate) fn maximum_in(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> f64 {
        let sum: f64 = self
            .children
            .iter()
            .map(|c| c.maximum_in(network, convention, scope))
            .sum();
        compound_bounds(-f64::MAX, sum, self.min, self.max, convention).1
    }

    pub(crate) fn scale_in(
        &self,
        network: &mut Network,
        asked: f64,
        params: &ScalingParameters,
        scope: &Scope<'_>,
        run: &mut ScaleRun,
    ) -> ScalingResult<f64> {
        let convention = params.scaling_convention;
        let current: f64 = self
            .children
            .iter()
            .map(|c| c.current_in(network, convention, scope))
            .sum();
        let variation = params.variation_asked(asked, current);
        let bounded = bounded_variation(variation, current, self.min, self.max, convention);
        let child_params = params.as_delta();

        let mut done = 0.0;
        let mut remaining = bounded;
        for child in &self.children {
            if remaining.abs() <= REMAINING_EPSILON {
                break;
            }
            let delivered = child.scale_in(network, remaining, &child_params, scope, run)?;
            done += delivered;
            remaining -= delivered;
        }
        debug!(asked, variation = bounded, done, "stack scaled");
        Ok(done)
    }
}
