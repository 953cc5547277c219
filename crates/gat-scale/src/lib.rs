//! # gat-scale: Active Power Scaling
//!
//! Turns one requested active power variation (or target) into setpoint
//! changes on many injections of a [`gat_core::Network`], honoring each
//! injection's limits, a sign convention and a distribution policy.
//!
//! ## Building blocks
//!
//! - [`Scalable::on_generator`], [`Scalable::on_load`],
//!   [`Scalable::on_dangling_line`] - leaves acting on one injection
//! - [`Scalable::stack`] - fill children one after the other
//! - [`Scalable::proportional`] - split by percentages, optionally
//!   redistributing what saturated children could not absorb
//! - [`Scalable::up_down`] - send increases and decreases to different trees
//!
//! Capacity shortfalls are not errors: `scale` returns what was delivered.
//!
//! ## Example
//!
//! ```
//! use gat_core::{Bus, BusId, Gen, Network};
//! use gat_scale::{Priority, Scalable, ScalingParameters};
//!
//! let mut network = Network::new();
//! network.add_bus(Bus::new(BusId::new(1), "b1".into())).unwrap();
//! for id in ["g1", "g2"] {
//!     network
//!         .add_generator(Gen::new(id, BusId::new(1)).with_p_limits(0.0, 100.0))
//!         .unwrap();
//! }
//!
//! let scalable = Scalable::proportional(
//!     vec![80.0, 20.0],
//!     vec![Scalable::on_generator("g1").unwrap(), Scalable::on_generator("g2").unwrap()],
//! )
//! .unwrap();
//!
//! let params = ScalingParameters::new().with_priority(Priority::RespectVolumeAsked);
//! let done = scalable.scale(&mut network, 150.0, &params).unwrap();
//! assert!((done - 150.0).abs() < 1e-6);
//! assert!((network.generator("g1").unwrap().active_power.value() - 100.0).abs() < 1e-6);
//! ```

pub mod apply;
pub mod convention;
pub mod error;
pub mod leaf;
pub mod parameters;
pub mod plan;
pub mod proportional;
pub mod report;
pub mod scalable;
pub mod stack;
pub mod up_down;

pub use apply::{scale_on_generators, scale_on_loads};
pub use convention::ScalingConvention;
pub use error::{ScalingError, ScalingResult};
pub use leaf::InjectionScalable;
pub use parameters::{DistributionMode, Priority, ScalingParameters, ScalingType};
pub use plan::{load_parameters_from_path, load_plan_from_path, LimitsSpec, ScalableSpec, ScalingPlan};
pub use proportional::ProportionalScalable;
pub use report::{NoopReporter, ScalingReport, ScalingReporter, TracingReporter};
pub use scalable::{InjectionFilter, Scalable, ScalingOutcome};
pub use stack::StackScalable;
pub use up_down::UpDownScalable;
