use gat_core::{find_islands, BusId, Diagnostics, InjectionKind, InjectionRef, IslandAnalysis, Network};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::convention::ScalingConvention;
use crate::error::ScalingResult;
use crate::leaf::InjectionScalable;
use crate::parameters::{DistributionMode, ScalingParameters};
use crate::proportional::ProportionalScalable;
use crate::report::{ScalingReport, ScalingReporter};
use crate::stack::StackScalable;
use crate::up_down::UpDownScalable;

/// A node of a scaling tree.
///
/// Leaves act on one injection; composites combine children and nest freely.
/// Only [`UpDownScalable`] carries mutable state.
#[derive(Debug, Clone)]
pub enum Scalable {
    Injection(InjectionScalable),
    Stack(StackScalable),
    Proportional(ProportionalScalable),
    UpDown(UpDownScalable),
}

/// Injections of a tree split by whether the network has them.
#[derive(Debug, Default)]
pub struct InjectionFilter<'n> {
    pub found: Vec<InjectionRef<'n>>,
    pub not_found: Vec<String>,
}

/// Result of [`Scalable::scale_with_diagnostics`].
#[derive(Debug, Clone, Serialize)]
pub struct ScalingOutcome {
    pub done: f64,
    pub diagnostics: Diagnostics,
}

/// Chain of deactivated-id sets from enclosing up/down nodes.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Scope<'a> {
    deactivated: Option<&'a HashSet<String>>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub(crate) fn root() -> Scope<'static> {
        Scope {
            deactivated: None,
            parent: None,
        }
    }

    pub(crate) fn nested<'b>(&'b self, deactivated: &'b HashSet<String>) -> Scope<'b>
    where
        'a: 'b,
    {
        Scope {
            deactivated: Some(deactivated),
            parent: Some(self),
        }
    }

    pub(crate) fn is_inactive(&self, id: &str) -> bool {
        self.deactivated.is_some_and(|ids| ids.contains(id))
            || self.parent.is_some_and(|parent| parent.is_inactive(id))
    }
}

/// State shared by every node during one top-level scaling call.
///
/// Scaling only moves setpoints and connection flags of injections, never
/// buses or branches, so islands are labelled once per call.
#[derive(Debug, Default)]
pub(crate) struct ScaleRun {
    pub(crate) diagnostics: Diagnostics,
    islands: Option<IslandAnalysis>,
}

impl ScaleRun {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_main_component(&mut self, network: &Network, bus: BusId) -> bool {
        self.islands
            .get_or_insert_with(|| find_islands(network))
            .is_in_main(bus)
    }
}

impl Scalable {
    /// Leaf on any injection kind, with the kind's default range.
    pub fn on_injection(kind: InjectionKind, id: impl Into<String>) -> ScalingResult<Self> {
        InjectionScalable::new(kind, id).map(Scalable::Injection)
    }

    pub fn on_generator(id: impl Into<String>) -> ScalingResult<Self> {
        InjectionScalable::new(InjectionKind::Generator, id).map(Scalable::Injection)
    }

    /// Generator restricted to `[min, max]` on top of its own `[pmin, pmax]`.
    pub fn on_generator_with_limits(id: impl Into<String>, min: f64, max: f64) -> ScalingResult<Self> {
        InjectionScalable::with_limits(InjectionKind::Generator, id, min, max).map(Scalable::Injection)
    }

    pub fn on_load(id: impl Into<String>) -> ScalingResult<Self> {
        InjectionScalable::new(InjectionKind::Load, id).map(Scalable::Injection)
    }

    pub fn on_load_with_limits(id: impl Into<String>, min: f64, max: f64) -> ScalingResult<Self> {
        InjectionScalable::with_limits(InjectionKind::Load, id, min, max).map(Scalable::Injection)
    }

    pub fn on_dangling_line(id: impl Into<String>) -> ScalingResult<Self> {
        InjectionScalable::new(InjectionKind::DanglingLine, id).map(Scalable::Injection)
    }

    pub fn on_dangling_line_with_limits(
        id: impl Into<String>,
        min: f64,
        max: f64,
    ) -> ScalingResult<Self> {
        InjectionScalable::with_limits(InjectionKind::DanglingLine, id, min, max)
            .map(Scalable::Injection)
    }

    pub fn stack(children: Vec<Scalable>) -> Self {
        Scalable::Stack(StackScalable::new(children))
    }

    /// Stack whose total is kept within `[min, max]` (generator convention).
    pub fn stack_with_limits(children: Vec<Scalable>, min: f64, max: f64) -> Self {
        Scalable::Stack(StackScalable::with_limits(children, min, max))
    }

    pub fn proportional(percentages: Vec<f64>, children: Vec<Scalable>) -> ScalingResult<Self> {
        ProportionalScalable::new(percentages, children).map(Scalable::Proportional)
    }

    pub fn proportional_with_limits(
        percentages: Vec<f64>,
        children: Vec<Scalable>,
        min: f64,
        max: f64,
    ) -> ScalingResult<Self> {
        ProportionalScalable::with_limits(percentages, children, min, max)
            .map(Scalable::Proportional)
    }

    /// Proportional node over network injections, weighted by `mode`.
    pub fn proportional_from_injections(
        network: &Network,
        injections: &[(InjectionKind, &str)],
        mode: DistributionMode,
    ) -> ScalingResult<Self> {
        ProportionalScalable::from_injections(network, injections, mode, -f64::MAX, f64::MAX)
            .map(Scalable::Proportional)
    }

    pub fn up_down(up: Scalable, down: Scalable) -> Self {
        Scalable::UpDown(UpDownScalable::new(up, down))
    }

    /// Sum of natural-convention setpoints of the tree's injections.
    pub fn initial_value(&self, network: &Network) -> f64 {
        match self {
            Scalable::Injection(leaf) => leaf.initial_value(network),
            _ => self.children().map(|c| c.initial_value(network)).sum(),
        }
    }

    /// Current active power of the tree under `convention`.
    pub fn current_value(&self, network: &Network, convention: ScalingConvention) -> f64 {
        self.current_in(network, convention, &Scope::root())
    }

    pub fn minimum_value(&self, network: &Network, convention: ScalingConvention) -> f64 {
        self.minimum_in(network, convention, &Scope::root())
    }

    pub fn maximum_value(&self, network: &Network, convention: ScalingConvention) -> f64 {
        self.maximum_in(network, convention, &Scope::root())
    }

    /// Apply `asked` to the tree and return what was actually delivered,
    /// under the parameters' convention.
    pub fn scale(
        &self,
        network: &mut Network,
        asked: f64,
        params: &ScalingParameters,
    ) -> ScalingResult<f64> {
        self.scale_in(network, asked, params, &Scope::root(), &mut ScaleRun::new())
    }

    /// Like [`Scalable::scale`], also returning one diagnostic per injection
    /// that contributed nothing.
    pub fn scale_with_diagnostics(
        &self,
        network: &mut Network,
        asked: f64,
        params: &ScalingParameters,
    ) -> ScalingResult<ScalingOutcome> {
        let mut run = ScaleRun::new();
        let done = self.scale_in(network, asked, params, &Scope::root(), &mut run)?;
        Ok(ScalingOutcome {
            done,
            diagnostics: run.diagnostics,
        })
    }

    /// Scale and send one report to `reporter`.
    pub fn scale_reported(
        &self,
        network: &mut Network,
        asked: f64,
        params: &ScalingParameters,
        label: &str,
        reporter: &mut dyn ScalingReporter,
    ) -> ScalingResult<f64> {
        let done = self.scale(network, asked, params)?;
        info!(label, asked, done, "scaling done");
        reporter.report(ScalingReport {
            label: label.to_string(),
            distribution_mode: None,
            scaling_type: params.scaling_type,
            asked,
            done,
        });
        Ok(done)
    }

    /// Set every injection of the tree to zero.
    pub fn reset(&self, network: &mut Network) {
        match self {
            Scalable::Injection(leaf) => leaf.reset(network),
            _ => self.children().for_each(|c| c.reset(network)),
        }
    }

    /// Injections of the tree, in tree order, without de-duplication.
    pub fn filter_injections<'n>(&self, network: &'n Network) -> InjectionFilter<'n> {
        let mut filter = InjectionFilter::default();
        self.collect_injections(network, &mut filter);
        filter
    }

    fn collect_injections<'n>(&self, network: &'n Network, filter: &mut InjectionFilter<'n>) {
        match self {
            Scalable::Injection(leaf) => match network.injection(leaf.kind(), leaf.id()) {
                Some(injection) => filter.found.push(injection),
                None => filter.not_found.push(leaf.id().to_string()),
            },
            _ => self
                .children()
                .for_each(|c| c.collect_injections(network, filter)),
        }
    }

    /// Direct children; empty for a leaf.
    pub fn children(&self) -> Box<dyn Iterator<Item = &Scalable> + '_> {
        match self {
            Scalable::Injection(_) => Box::new(std::iter::empty()),
            Scalable::Stack(stack) => Box::new(stack.children().iter()),
            Scalable::Proportional(prop) => Box::new(prop.children()),
            Scalable::UpDown(up_down) => {
                Box::new([up_down.up(), up_down.down()].into_iter())
            }
        }
    }

    pub(crate) fn current_in(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> f64 {
        match self {
            Scalable::Injection(leaf) => leaf.current_value(network, convention, scope),
            Scalable::UpDown(up_down) => {
                let nested = scope.nested(up_down.deactivated());
                up_down.up().current_in(network, convention, &nested)
                    + up_down.down().current_in(network, convention, &nested)
            }
            _ => self
                .children()
                .map(|c| c.current_in(network, convention, scope))
                .sum(),
        }
    }

    pub(crate) fn minimum_in(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> f64 {
        match self {
            Scalable::Injection(leaf) => leaf.bounds(network, convention, scope).0,
            Scalable::Stack(stack) => stack.minimum_in(network, convention, scope),
            Scalable::Proportional(prop) => prop.minimum_in(network, convention, scope),
            Scalable::UpDown(up_down) => up_down.minimum_in(network, convention, scope),
        }
    }

    pub(crate) fn maximum_in(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> f64 {
        match self {
            Scalable::Injection(leaf) => leaf.bounds(network, convention, scope).1,
            Scalable::Stack(stack) => stack.maximum_in(network, convention, scope),
            Scalable::Proportional(prop) => prop.maximum_in(network, convention, scope),
            Scalable::UpDown(up_down) => up_down.maximum_in(network, convention, scope),
        }
    }

    pub(crate) fn scale_in(
        &self,
        network: &mut Network,
        asked: f64,
        params: &ScalingParameters,
        scope: &Scope<'_>,
        run: &mut ScaleRun,
    ) -> ScalingResult<f64> {
        if !asked.is_finite() {
            warn!(asked, "non-finite variation asked, nothing scaled");
            return Ok(0.0);
        }
        match self {
            Scalable::Injection(leaf) => Ok(leaf.scale(network, asked, params, scope, run)),
            Scalable::Stack(stack) => stack.scale_in(network, asked, params, scope, run),
            Scalable::Proportional(prop) => prop.scale_in(network, asked, params, scope, run),
            Scalable::UpDown(up_down) => up_down.scale_in(network, asked, params, scope, run),
        }
    }

    /// Leaves still active under `scope`, in tree order.
    pub(crate) fn collect_leaves<'s>(&'s self, scope: &Scope<'_>, out: &mut Vec<&'s InjectionScalable>) {
        match self {
            Scalable::Injection(leaf) => {
                if !scope.is_inactive(leaf.id()) {
                    out.push(leaf);
                }
            }
            Scalable::UpDown(up_down) => {
                let nested = scope.nested(up_down.deactivated());
                up_down.up().collect_leaves(&nested, out);
                up_down.down().collect_leaves(&nested, out);
            }
            _ => self.children().for_each(|c| c.collect_leaves(scope, out)),
        }
    }
}

impl From<InjectionScalable> for Scalable {
    fn from(leaf: InjectionScalable) -> Self {
        Scalable::Injection(leaf)
    }
}

impl From<StackScalable> for Scalable {
    fn from(stack: StackScalable) -> Self {
        Scalable::Stack(stack)
    }
}

impl From<ProportionalScalable> for Scalable {
    fn from(prop: ProportionalScalable) -> Self {
        Scalable::Proportional(prop)
    }
}

impl From<UpDownScalable> for Scalable {
    fn from(up_down: UpDownScalable) -> Self {
        Scalable::UpDown(up_down)
    }
}

/// Clamp a composite's summed bounds by its own `[min, max]`, given in
/// generator convention.
pub(crate) fn compound_bounds(
    sum_min: f64,
    sum_max: f64,
    min: f64,
    max: f64,
    convention: ScalingConvention,
) -> (f64, f64) {
    let (lo, hi) = convention.convert_bounds(min, max, ScalingConvention::Generator);
    (lo.max(sum_min), hi.min(sum_max))
}

/// Restrict a composite's variation so its total stays within `[min, max]`
/// (generator convention).
pub(crate) fn bounded_variation(
    variation: f64,
    current: f64,
    min: f64,
    max: f64,
    convention: ScalingConvention,
) -> f64 {
    let (lo, hi) = convention.convert_bounds(min, max, ScalingConvention::Generator);
    variation.max(lo - current).min(hi - current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_chain() {
        let outer: HashSet<String> = ["g1".to_string()].into();
        let inner: HashSet<String> = ["l1".to_string()].into();
        let root = Scope::root();
        let first = root.nested(&outer);
        let second = first.nested(&inner);
        assert!(!root.is_inactive("g1"));
        assert!(first.is_inactive("g1"));
        assert!(!first.is_inactive("l1"));
        assert!(second.is_inactive("g1"));
        assert!(second.is_inactive("l1"));
    }

    #[test]
    fn compound_bounds_per_convention() {
        assert_eq!(
            compound_bounds(0.0, 280.0, -f64::MAX, 200.0, ScalingConvention::Generator),
            (0.0, 200.0)
        );
        assert_eq!(
            compound_bounds(-280.0, 0.0, -f64::MAX, 200.0, ScalingConvention::Load),
            (-200.0, 0.0)
        );
    }

    #[test]
    fn bounded_variation_limits_total() {
        assert_eq!(
            bounded_variation(100.0, 150.0, 0.0, 200.0, ScalingConvention::Generator),
            50.0
        );
        assert_eq!(
            bounded_variation(-100.0, 150.0, 0.0, 200.0, ScalingConvention::Generator),
            -100.0
        );
        assert_eq!(
            bounded_variation(-100.0, -150.0, 0.0, 200.0, ScalingConvention::Load),
            -50.0
        );
    }
}
