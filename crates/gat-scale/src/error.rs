//! Errors raised while building scalables or starting a scaling run.
//!
//! Running out of capacity is not an error: `scale` reports what it could
//! deliver. These variants cover malformed trees and parameter combinations
//! that cannot be honored at all.

use gat_core::InjectionKind;
use thiserror::Error;

use crate::convention::ScalingConvention;
use crate::parameters::DistributionMode;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScalingError {
    #[error("injection identifier cannot be empty")]
    MissingIdentifier,

    #[error("invalid range for '{id}': min {min} must be below max {max}")]
    InvalidRange { id: String, min: f64, max: f64 },

    #[error("percentage and scalable lists must have the same size ({percentages} vs {scalables})")]
    PercentageCountMismatch { percentages: usize, scalables: usize },

    /// Undefined percentages, or a sum away from 100
    #[error("invalid percentages: {0}")]
    InvalidPercentages(String),

    /// A distribution mode reads a quantity the injection does not have
    #[error("{mode} is inconsistent with {kind} '{id}'")]
    InconsistentDistribution {
        mode: DistributionMode,
        kind: InjectionKind,
        id: String,
    },

    #[error("Variation mode cannot be {mode} for {target}")]
    UnsupportedDistribution {
        mode: DistributionMode,
        target: &'static str,
    },

    /// The identifier names a network element that cannot be scaled
    #[error("unable to create a scalable from '{0}'")]
    UnsupportedEquipment(String),

    #[error("{kind} '{id}' not found in network")]
    EquipmentNotFound { kind: InjectionKind, id: String },

    #[error("{0}")]
    UnsupportedPriority(String),

    #[error("Scaling convention in the parameters cannot be {convention} for {target}")]
    ConventionMismatch {
        convention: ScalingConvention,
        target: &'static str,
    },

    #[error("initial injections have not been recorded from the network")]
    BaselineNotRecorded,
}

pub type ScalingResult<T> = Result<T, ScalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = ScalingError::UnsupportedDistribution {
            mode: DistributionMode::ProportionalToPMax,
            target: "loads",
        };
        assert_eq!(
            err.to_string(),
            "Variation mode cannot be proportional_to_p_max for loads"
        );

        let err = ScalingError::ConventionMismatch {
            convention: ScalingConvention::Load,
            target: "generators",
        };
        assert_eq!(
            err.to_string(),
            "Scaling convention in the parameters cannot be load for generators"
        );

        let err = ScalingError::EquipmentNotFound {
            kind: InjectionKind::DanglingLine,
            id: "dl9".into(),
        };
        assert_eq!(err.to_string(), "dangling line 'dl9' not found in network");
    }
}
