use gat_core::{InjectionKind, Network};
use tracing::info;

use crate::convention::ScalingConvention;
use crate::error::{ScalingError, ScalingResult};
use crate::parameters::{DistributionMode, ScalingParameters};
use crate::proportional::ProportionalScalable;
use crate::report::{ScalingReport, ScalingReporter};
use crate::scalable::Scalable;

/// Scale `parameters.scaling_value` over a list of generators.
///
/// The generators are combined according to `parameters.distribution_mode`:
/// `StackingUp` fills them in the given order, every other mode builds a
/// proportional node weighted from the network. The parameters must use the
/// generator convention. One report is sent to `reporter`.
///
/// ```
/// use gat_core::{Bus, BusId, Gen, Network};
/// use gat_scale::{scale_on_generators, DistributionMode, ScalingParameters, ScalingReport};
///
/// let mut network = Network::new();
/// network.add_bus(Bus::new(BusId::new(1), "b1".into())).unwrap();
/// network
///     .add_generator(Gen::new("g1", BusId::new(1)).with_p_limits(0.0, 100.0).with_target_p(50.0))
///     .unwrap();
///
/// let params = ScalingParameters::new()
///     .with_distribution_mode(DistributionMode::ProportionalToTargetP)
///     .with_scaling_value(20.0);
/// let mut reports: Vec<ScalingReport> = Vec::new();
/// let done = scale_on_generators(&mut network, &mut reports, &params, &["g1"]).unwrap();
/// assert_eq!(done, 20.0);
/// assert_eq!(reports.len(), 1);
/// ```
pub fn scale_on_generators(
    network: &mut Network,
    reporter: &mut dyn ScalingReporter,
    parameters: &ScalingParameters,
    generator_ids: &[&str],
) -> ScalingResult<f64> {
    if parameters.scaling_convention == ScalingConvention::Load {
        return Err(ScalingError::ConventionMismatch {
            convention: ScalingConvention::Load,
            target: "generators",
        });
    }
    if parameters.distribution_mode == DistributionMode::ProportionalToP0 {
        return Err(ScalingError::UnsupportedDistribution {
            mode: parameters.distribution_mode,
            target: "generators",
        });
    }
    scale_on_injections(
        network,
        reporter,
        parameters,
        InjectionKind::Generator,
        generator_ids,
        "generators",
    )
}

/// Scale `parameters.scaling_value` over a list of loads.
///
/// Loads accept `ProportionalToP0`, `Uniform` and `StackingUp`, and the
/// parameters must use the load convention.
pub fn scale_on_loads(
    network: &mut Network,
    reporter: &mut dyn ScalingReporter,
    parameters: &ScalingParameters,
    load_ids: &[&str],
) -> ScalingResult<f64> {
    if parameters.scaling_convention == ScalingConvention::Generator {
        return Err(ScalingError::ConventionMismatch {
            convention: ScalingConvention::Generator,
            target: "loads",
        });
    }
    match parameters.distribution_mode {
        DistributionMode::ProportionalToP0
        | DistributionMode::Uniform
        | DistributionMode::StackingUp => {}
        mode => {
            return Err(ScalingError::UnsupportedDistribution {
                mode,
                target: "loads",
            })
        }
    }
    scale_on_injections(
        network,
        reporter,
        parameters,
        InjectionKind::Load,
        load_ids,
        "loads",
    )
}

fn scale_on_injections(
    network: &mut Network,
    reporter: &mut dyn ScalingReporter,
    parameters: &ScalingParameters,
    kind: InjectionKind,
    ids: &[&str],
    label: &str,
) -> ScalingResult<f64> {
    let mode = parameters.distribution_mode;
    let scalable = if mode == DistributionMode::StackingUp {
        let children = ids
            .iter()
            .map(|id| {
                if network.find_injection(kind, id).is_none() {
                    return Err(ScalingError::EquipmentNotFound {
                        kind,
                        id: id.to_string(),
                    });
                }
                Scalable::on_injection(kind, *id)
            })
            .collect::<ScalingResult<Vec<_>>>()?;
        Scalable::stack(children)
    } else {
        let injections: Vec<(InjectionKind, &str)> = ids.iter().map(|id| (kind, *id)).collect();
        Scalable::Proportional(ProportionalScalable::from_injections(
            network,
            &injections,
            mode,
            -f64::MAX,
            f64::MAX,
        )?)
    };

    let asked = parameters.scaling_value;
    let done = scalable.scale(network, asked, parameters)?;
    info!(label, %mode, asked, done, count = ids.len(), "scaled injection list");
    reporter.report(ScalingReport {
        label: label.to_string(),
        distribution_mode: Some(mode),
        scaling_type: parameters.scaling_type,
        asked,
        done,
    });
    Ok(done)
}
