//! Up/down routing, deactivation and baseline tests

mod common;

use common::*;
use gat_core::{Bus, BusId, Gen, Load, Network};
use gat_scale::leaf::skip;
use gat_scale::{
    Scalable, ScalingConvention, ScalingError, ScalingParameters, ScalingType, UpDownScalable,
};

const GEN: ScalingConvention = ScalingConvention::Generator;

/// Two generators and a load, `g1` and `l1` carrying measured terminal flows
/// that differ from their setpoints.
fn measured_network() -> Network {
    let mut network = Network::new();
    network.add_bus(Bus::new(BusId::new(1), "b1".into())).unwrap();
    network
        .add_generator(
            Gen::new("g1", BusId::new(1))
                .with_p_limits(0.0, 100.0)
                .with_target_p(40.0)
                .with_terminal_p(38.0),
        )
        .unwrap();
    network
        .add_generator(
            Gen::new("g2", BusId::new(1))
                .with_p_limits(0.0, 100.0)
                .with_target_p(10.0),
        )
        .unwrap();
    network
        .add_load(
            Load::new("l1", BusId::new(1))
                .with_p0(20.0)
                .with_terminal_p(21.0),
        )
        .unwrap();
    network
}

fn generation_up_load_down() -> UpDownScalable {
    UpDownScalable::new(
        Scalable::stack(vec![
            Scalable::on_generator("g1").unwrap(),
            Scalable::on_generator("g2").unwrap(),
        ]),
        Scalable::stack(vec![Scalable::on_load("l1").unwrap()]),
    )
}

#[test]
fn sign_of_the_request_picks_the_side() {
    let mut network = measured_network();
    let node = Scalable::UpDown(generation_up_load_down());
    let params = ScalingParameters::new();

    assert_close(node.scale(&mut network, 20.0, &params).unwrap(), 20.0);
    assert_close(target_p(&network, "g1"), 60.0);
    assert_close(p0(&network, "l1"), 20.0);

    assert_close(node.scale(&mut network, -15.0, &params).unwrap(), -15.0);
    assert_close(target_p(&network, "g1"), 60.0);
    assert_close(p0(&network, "l1"), 35.0);
}

#[test]
fn target_request_becomes_a_variation() {
    let mut network = measured_network();
    let node = Scalable::UpDown(generation_up_load_down());
    let params = ScalingParameters::new().with_scaling_type(ScalingType::Target);

    assert_close(node.current_value(&network, GEN), 30.0);
    assert_close(node.scale(&mut network, 10.0, &params).unwrap(), -20.0);
    assert_close(p0(&network, "l1"), 40.0);
    assert_close(target_p(&network, "g1"), 40.0);
}

#[test]
fn injection_queries_need_a_baseline() {
    let network = measured_network();
    let node = generation_up_load_down();
    assert_eq!(
        node.current_injection(&network, GEN),
        Err(ScalingError::BaselineNotRecorded)
    );
    assert_eq!(
        node.minimum_injection(&network, GEN),
        Err(ScalingError::BaselineNotRecorded)
    );
}

#[test]
fn current_injection_starts_from_measured_flows() {
    let mut network = measured_network();
    let mut node = generation_up_load_down();
    node.set_initial_injection_to_network_value(&network);

    assert_close(node.current_injection(&network, GEN).unwrap(), 38.0 + 10.0 - 21.0);
    assert_close(
        node.current_injection(&network, ScalingConvention::Load).unwrap(),
        -27.0,
    );

    let scalable = Scalable::UpDown(node.clone());
    scalable.scale(&mut network, 20.0, &ScalingParameters::new()).unwrap();
    assert_close(node.current_injection(&network, GEN).unwrap(), 47.0);
    assert_close(scalable.current_value(&network, GEN), 50.0);

    assert_eq!(node.maximum_injection(&network, GEN).unwrap(), 200.0);
    assert_eq!(node.minimum_injection(&network, GEN).unwrap(), -f64::MAX);
}

#[test]
fn deactivated_injections_are_left_out() {
    let mut network = measured_network();
    let mut node = generation_up_load_down();
    node.set_initial_injection_to_network_value(&network);
    node.deactivate_scalables(["g1"]);

    assert_eq!(node.maximum_injection(&network, GEN).unwrap(), 100.0);
    assert_close(node.current_injection(&network, GEN).unwrap(), 10.0 - 21.0);

    let outcome = Scalable::UpDown(node.clone())
        .scale_with_diagnostics(&mut network, 20.0, &ScalingParameters::new())
        .unwrap();
    assert_close(outcome.done, 20.0);
    assert_close(target_p(&network, "g1"), 40.0);
    assert_close(target_p(&network, "g2"), 30.0);
    assert_eq!(outcome.diagnostics.entities_in_category(skip::INACTIVE), vec!["g1"]);
    assert_close(node.current_injection(&network, GEN).unwrap(), 30.0 - 21.0);
}

#[test]
fn shallow_copies_reactivate_everything() {
    let network = measured_network();
    let mut node = generation_up_load_down();
    node.set_initial_injection_to_network_value(&network);
    let before = node.shallow_copy();
    node.deactivate_scalables(["g1", "g2"]);
    let after = node.shallow_copy();

    assert_eq!(node.maximum_injection(&network, GEN).unwrap(), 0.0);
    assert_eq!(before.maximum_injection(&network, GEN).unwrap(), 200.0);
    assert_eq!(after.maximum_injection(&network, GEN).unwrap(), 200.0);
    assert_close(after.current_injection(&network, GEN).unwrap(), 27.0);
}

#[test]
fn deactivation_holds_inside_enclosing_trees() {
    let mut network = measured_network();
    let mut node = generation_up_load_down();
    node.deactivate_scalables(["g1"]);
    let stack = Scalable::stack(vec![
        Scalable::UpDown(node),
        Scalable::on_generator("g1").unwrap(),
    ]);

    assert_eq!(stack.maximum_value(&network, GEN), 200.0);
    assert_close(stack.scale(&mut network, 100.0, &ScalingParameters::new()).unwrap(), 100.0);
    assert_close(target_p(&network, "g2"), 100.0);
    assert_close(target_p(&network, "g1"), 50.0);
}
