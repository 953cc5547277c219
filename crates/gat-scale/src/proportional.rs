use gat_core::{InjectionKind, InjectionRef, Network};
use tracing::debug;

use crate::convention::ScalingConvention;
use crate::error::{ScalingError, ScalingResult};
use crate::leaf::InjectionScalable;
use crate::parameters::{DistributionMode, Priority, ScalingParameters};
use crate::scalable::{bounded_variation, compound_bounds, Scalable, ScaleRun, Scope};

/// Tolerance on percentage sums and on the volume still to deliver.
const EPSILON: f64 = 1e-2;
/// A child this close to its bound counts as saturated.
const SATURATION_EPSILON: f64 = EPSILON / 100.0;

#[derive(Debug, Clone)]
struct WeightedScalable {
    scalable: Scalable,
    percentage: f64,
}

/// Weighted distribution over children whose percentages sum to 100.
#[derive(Debug, Clone)]
pub struct ProportionalScalable {
    children: Vec<WeightedScalable>,
    min: f64,
    max: f64,
}

impl ProportionalScalable {
    pub fn new(percentages: Vec<f64>, children: Vec<Scalable>) -> ScalingResult<Self> {
        Self::with_limits(percentages, children, -f64::MAX, f64::MAX)
    }

    /// `[min, max]` bounds the sum of the children, in generator convention.
    pub fn with_limits(
        percentages: Vec<f64>,
        children: Vec<Scalable>,
        min: f64,
        max: f64,
    ) -> ScalingResult<Self> {
        check_percentages(&percentages, children.len())?;
        let children = children
            .into_iter()
            .zip(percentages)
            .map(|(scalable, percentage)| WeightedScalable {
                scalable,
                percentage,
            })
            .collect();
        Ok(Self { children, min, max })
    }

    /// One leaf per injection, weighted by `mode`.
    ///
    /// Modes based on a setpoint or headroom fall back to uniform weights
    /// when all weights are zero.
    pub fn from_injections(
        network: &Network,
        injections: &[(InjectionKind, &str)],
        mode: DistributionMode,
        min: f64,
        max: f64,
    ) -> ScalingResult<Self> {
        let mut leaves = Vec::with_capacity(injections.len());
        let mut weights = Vec::with_capacity(injections.len());
        for (kind, id) in injections {
            let injection = resolve_injection(network, *kind, id)?;
            weights.push(individual_distribution(&injection, mode)?);
            leaves.push(Scalable::Injection(InjectionScalable::new(*kind, *id)?));
        }

        let mut total: f64 = weights.iter().sum();
        if total == 0.0 && mode.falls_back_to_uniform() {
            debug!(%mode, "all weights are zero, distributing uniformly");
            weights.iter_mut().for_each(|w| *w = 1.0);
            total = weights.len() as f64;
        }
        let percentages = weights.iter().map(|w| w * 100.0 / total).collect();
        Self::with_limits(percentages, leaves, min, max)
    }

    pub fn children(&self) -> impl Iterator<Item = &Scalable> {
        self.children.iter().map(|c| &c.scalable)
    }

    pub fn percentages(&self) -> impl Iterator<Item = f64> + '_ {
        self.children.iter().map(|c| c.percentage)
    }

    pub(crate) fn minimum_in(
        &self,
        network: &Network,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> f64 {
        let sum: f64 = self
            .children()
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
            .children()
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
            .children()
            .map(|c| c.current_in(network, convention, scope))
            .sum();
        let variation = params.variation_asked(asked, current);
        let mut bounded = bounded_variation(variation, current, self.min, self.max, convention);

        if params.priority == Priority::RespectDistribution {
            bounded = self.resize_for_fixed_distribution(network, bounded, convention, scope)?;
        }

        let child_params = params.as_delta();
        let mut iteration: Vec<f64> = self.percentages().collect();
        let done = match params.priority {
            Priority::RespectVolumeAsked => {
                self.iterative_scale(network, bounded, &child_params, &mut iteration, scope, run)?
            }
            Priority::OneShot | Priority::RespectDistribution => {
                self.scale_iteration(network, bounded, &child_params, &mut iteration, scope, run)?
            }
        };
        debug!(asked, variation = bounded, done, priority = ?params.priority, "proportional scaled");
        Ok(done)
    }

    /// Water-filling: redistribute what saturated children could not take
    /// among the others until the volume is delivered or all saturate.
    fn iterative_scale(
        &self,
        network: &mut Network,
        asked: f64,
        params: &ScalingParameters,
        iteration: &mut [f64],
        scope: &Scope<'_>,
        run: &mut ScaleRun,
    ) -> ScalingResult<f64> {
        let mut done = 0.0;
        let mut rounds = 0;
        while (asked - done).abs() > EPSILON
            && iteration.iter().any(|p| *p != 0.0)
            && rounds <= self.children.len()
        {
            done += self.scale_iteration(network, asked - done, params, iteration, scope, run)?;
            renormalize(iteration);
            rounds += 1;
        }
        Ok(done)
    }

    /// One pass over the children; saturated children get a zero share.
    fn scale_iteration(
        &self,
        network: &mut Network,
        asked: f64,
        params: &ScalingParameters,
        iteration: &mut [f64],
        scope: &Scope<'_>,
        run: &mut ScaleRun,
    ) -> ScalingResult<f64> {
        let convention = params.scaling_convention;
        let mut done = 0.0;
        for (child, percentage) in self.children().zip(iteration.iter_mut()) {
            if *percentage == 0.0 {
                continue;
            }
            let asked_on_child = *percentage / 100.0 * asked;
            let done_on_child = child.scale_in(network, asked_on_child, params, scope, run)?;

            let value = child.current_in(network, convention, scope);
            let saturated = if asked > 0.0 {
                (child.maximum_in(network, convention, scope) - value).abs() < SATURATION_EPSILON
            } else {
                (child.minimum_in(network, convention, scope) - value).abs() < SATURATION_EPSILON
            };
            // A child that did not move this round will not move in the next.
            if done_on_child == 0.0 || saturated {
                *percentage = 0.0;
            }
            done += done_on_child;
        }
        Ok(done)
    }

    /// Shrink `asked` so that no generator exceeds its bound while every
    /// child keeps its exact share.
    fn resize_for_fixed_distribution(
        &self,
        network: &Network,
        asked: f64,
        convention: ScalingConvention,
        scope: &Scope<'_>,
    ) -> ScalingResult<f64> {
        let mut ratio: f64 = 1.0;
        for child in &self.children {
            match &child.scalable {
                Scalable::Injection(leaf) if leaf.kind() == InjectionKind::Generator => {
                    if let Some(available) =
                        leaf.available_ratio(network, asked, child.percentage, convention, scope)
                    {
                        ratio = ratio.min(available);
                    }
                }
                other => {
                    return Err(ScalingError::UnsupportedPriority(format!(
                        "respect_distribution can only be used on generators, not {}",
                        describe(other)
                    )));
                }
            }
        }
        Ok(asked * ratio.max(0.0))
    }
}

fn describe(scalable: &Scalable) -> String {
    match scalable {
        Scalable::Injection(leaf) => format!("{} '{}'", leaf.kind(), leaf.id()),
        Scalable::Stack(_) => "a stack".to_string(),
        Scalable::Proportional(_) => "a proportional node".to_string(),
        Scalable::UpDown(_) => "an up/down node".to_string(),
    }
}

fn check_percentages(percentages: &[f64], scalables: usize) -> ScalingResult<()> {
    if percentages.len() != scalables {
        return Err(ScalingError::PercentageCountMismatch {
            percentages: percentages.len(),
            scalables,
        });
    }
    if percentages.is_empty() {
        return Ok(());
    }
    if percentages.iter().any(|p| p.is_nan()) {
        return Err(ScalingError::InvalidPercentages(
            "there is at least one undefined percentage".into(),
        ));
    }
    let sum: f64 = percentages.iter().sum();
    if (100.0 - sum).abs() > EPSILON {
        return Err(ScalingError::InvalidPercentages(format!(
            "sum of percentages must be equal to 100 ({sum:.2})"
        )));
    }
    Ok(())
}

/// Rescale the non-zero shares so they sum to 100 again.
fn renormalize(iteration: &mut [f64]) {
    let active: f64 = iteration.iter().filter(|p| **p != 0.0).sum();
    if active == 0.0 {
        return;
    }
    for percentage in iteration.iter_mut().filter(|p| **p != 0.0) {
        *percentage = *percentage / active * 100.0;
    }
}

fn resolve_injection<'n>(
    network: &'n Network,
    kind: InjectionKind,
    id: &str,
) -> ScalingResult<InjectionRef<'n>> {
    if let Some(injection) = network.injection(kind, id) {
        return Ok(injection);
    }
    match network.find_node(id) {
        Some(_) => Err(ScalingError::UnsupportedEquipment(id.to_string())),
        None => Err(ScalingError::EquipmentNotFound {
            kind,
            id: id.to_string(),
        }),
    }
}

fn individual_distribution(
    injection: &InjectionRef<'_>,
    mode: DistributionMode,
) -> ScalingResult<f64> {
    let inconsistent = || ScalingError::InconsistentDistribution {
        mode,
        kind: injection.kind(),
        id: injection.id().to_string(),
    };
    let generator = match injection {
        InjectionRef::Generator(g) => Some(*g),
        _ => None,
    };
    match mode {
        DistributionMode::Uniform => Ok(1.0),
        DistributionMode::ProportionalToP0 => match injection {
            InjectionRef::Load(_) | InjectionRef::DanglingLine(_) => {
                Ok(injection.active_power().value())
            }
            InjectionRef::Generator(_) => Err(inconsistent()),
        },
        DistributionMode::ProportionalToTargetP => generator
            .map(|g| g.active_power.value())
            .ok_or_else(inconsistent),
        DistributionMode::ProportionalToPMax => {
            generator.map(|g| g.pmax.value()).ok_or_else(inconsistent)
        }
        DistributionMode::ProportionalToDiffPMaxTargetP => generator
            .map(|g| (g.pmax - g.active_power).value())
            .ok_or_else(inconsistent),
        DistributionMode::ProportionalToDiffTargetPMin => generator
            .map(|g| (g.active_power - g.pmin).value())
            .ok_or_else(inconsistent),
        DistributionMode::StackingUp => Err(inconsistent()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_checks() {
        let g = || Scalable::on_generator("g1").unwrap();
        assert!(ProportionalScalable::new(vec![], vec![]).is_ok());
        assert_eq!(
            ProportionalScalable::new(vec![100.0], vec![]).unwrap_err(),
            ScalingError::PercentageCountMismatch {
                percentages: 1,
                scalables: 0
            }
        );
        assert!(matches!(
            ProportionalScalable::new(vec![70.0, 20.0], vec![g(), g()]),
            Err(ScalingError::InvalidPercentages(_))
        ));
        assert!(matches!(
            ProportionalScalable::new(vec![f64::NAN, 100.0], vec![g(), g()]),
            Err(ScalingError::InvalidPercentages(_))
        ));
        assert!(ProportionalScalable::new(vec![33.333, 33.333, 33.333], vec![g(), g(), g()]).is_ok());
    }

    #[test]
    fn renormalize_skips_saturated() {
        let mut shares = vec![0.0, 20.0, 10.0];
        renormalize(&mut shares);
        assert_eq!(shares[0], 0.0);
        assert!((shares[1] - 200.0 / 3.0).abs() < 1e-9);
        assert!((shares[2] - 100.0 / 3.0).abs() < 1e-9);

        let mut none = vec![0.0, 0.0];
        renormalize(&mut none);
        assert_eq!(none, vec![0.0, 0.0]);
    }
}
