//! Sign conventions for active power.
//!
//! Every injection has a *natural* convention: generators are
//! generator-natural (positive when producing), loads and dangling lines are
//! load-natural (positive when consuming). A value read under the other
//! convention is negated, and a `[min, max]` interval is negated and swapped.

use gat_core::InjectionKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sign convention a scaling request is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingConvention {
    /// Positive values inject power into the network
    #[default]
    Generator,
    /// Positive values withdraw power from the network
    Load,
}

impl ScalingConvention {
    pub fn opposite(self) -> Self {
        match self {
            ScalingConvention::Generator => ScalingConvention::Load,
            ScalingConvention::Load => ScalingConvention::Generator,
        }
    }

    /// Natural convention of an injection kind.
    pub fn natural(kind: InjectionKind) -> Self {
        match kind {
            InjectionKind::Generator => ScalingConvention::Generator,
            InjectionKind::Load | InjectionKind::DanglingLine => ScalingConvention::Load,
        }
    }

    /// Express `value`, given in `from`, under `self`.
    #[inline]
    pub fn convert(self, value: f64, from: ScalingConvention) -> f64 {
        if self == from {
            value
        } else {
            -value
        }
    }

    /// Express the interval `[min, max]`, given in `from`, under `self`.
    #[inline]
    pub fn convert_bounds(self, min: f64, max: f64, from: ScalingConvention) -> (f64, f64) {
        if self == from {
            (min, max)
        } else {
            (-max, -min)
        }
    }
}

impl fmt::Display for ScalingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalingConvention::Generator => f.write_str("generator"),
            ScalingConvention::Load => f.write_str("load"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_conventions() {
        assert_eq!(
            ScalingConvention::natural(InjectionKind::Generator),
            ScalingConvention::Generator
        );
        assert_eq!(
            ScalingConvention::natural(InjectionKind::Load),
            ScalingConvention::Load
        );
        assert_eq!(
            ScalingConvention::natural(InjectionKind::DanglingLine),
            ScalingConvention::Load
        );
    }

    #[test]
    fn convert_negates_across_conventions() {
        let gen = ScalingConvention::Generator;
        assert_eq!(gen.convert(42.0, ScalingConvention::Generator), 42.0);
        assert_eq!(gen.convert(42.0, ScalingConvention::Load), -42.0);
        assert_eq!(gen.opposite().opposite(), gen);
    }

    #[test]
    fn convert_bounds_swaps() {
        let load = ScalingConvention::Load;
        assert_eq!(
            load.convert_bounds(0.0, 100.0, ScalingConvention::Generator),
            (-100.0, 0.0)
        );
        assert_eq!(
            load.convert_bounds(-f64::MAX, 20.0, ScalingConvention::Generator),
            (-20.0, f64::MAX)
        );
        assert_eq!(load.convert_bounds(1.0, 2.0, ScalingConvention::Load), (1.0, 2.0));
    }
}
