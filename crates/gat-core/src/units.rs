//! Power quantities carried by network injections.
//!
//! Setpoints and limits are [`Megawatts`] (active) or [`Megavars`]
//! (reactive); the two cannot be added together.
//!
//! ```
//! use gat_core::units::{Megavars, Megawatts};
//!
//! let headroom = Megawatts(150.0) - Megawatts(80.0);
//! assert_eq!(headroom.value(), 70.0);
//! assert!(Megawatts::MAX.is_unbounded());
//!
//! // let wrong = Megawatts(1.0) + Megavars(1.0);  // does not compile
//! assert_eq!((Megavars(10.0) * 0.5).value(), 5.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};

/// Declares an `f64` newtype with the arithmetic a setpoint needs.
macro_rules! power_quantity {
    ($(#[$meta:meta])* $name:ident, $symbol:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// Stand-in for "no upper limit".
            pub const MAX: Self = Self(f64::MAX);
            /// Stand-in for "no lower limit".
            pub const MIN: Self = Self(-f64::MAX);

            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// True for the `MIN`/`MAX` sentinels.
            pub fn is_unbounded(self) -> bool {
                self.0.abs() == f64::MAX
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $name {
            type Output = Self;
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = Self;
            fn mul(self, factor: f64) -> Self {
                Self(self.0 * factor)
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|q| q.0).sum())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.2} {}", self.0, $symbol)
            }
        }
    };
}

power_quantity!(
    /// Active power (MW)
    Megawatts,
    "MW"
);

power_quantity!(
    /// Reactive power (Mvar)
    Megavars,
    "Mvar"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_arithmetic() {
        let pmax = Megawatts(150.0);
        let target = Megawatts(80.0);
        assert_eq!((pmax - target).value(), 70.0);
        assert_eq!((-target).value(), -80.0);
        assert_eq!((target + target * 0.5).value(), 120.0);
    }

    #[test]
    fn sentinels() {
        assert!(Megawatts::MAX.is_unbounded());
        assert!(Megawatts::MIN.is_unbounded());
        assert!(!Megawatts(1e9).is_unbounded());
        assert_eq!(-Megawatts::MAX, Megawatts::MIN);
    }

    #[test]
    fn totals_and_display() {
        let total: Megawatts = [10.0, 20.0, 30.5].into_iter().map(Megawatts).sum();
        assert_eq!(total.to_string(), "60.50 MW");
        assert_eq!(Megavars(-5.0).to_string(), "-5.00 Mvar");
    }
}
