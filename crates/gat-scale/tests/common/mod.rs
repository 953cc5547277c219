//! Shared networks for the scaling integration tests.
#![allow(dead_code)]

use gat_core::{
    Branch, BranchId, Bus, BusId, DanglingLine, Gen, InjectionKind, Load, Megavars, Megawatts,
    Network,
};

pub const TOL: f64 = 1e-6;

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOL,
        "expected {expected}, got {actual}"
    );
}

/// Three [0, 100] MW generators, a load and a dangling line at rest on a
/// two-bus system, plus a generator on an islanded bus.
///
/// Bus 2 is named `s` so that identifier resolves to a bus, not an injection.
pub fn unit_network() -> Network {
    let mut network = Network::new();
    network.add_bus(Bus::new(BusId::new(1), "b1".into())).unwrap();
    network.add_bus(Bus::new(BusId::new(2), "s".into())).unwrap();
    network.add_bus(Bus::new(BusId::new(3), "island".into())).unwrap();
    network
        .add_branch(Branch::new(
            BranchId::new(1),
            "b1-s".into(),
            BusId::new(1),
            BusId::new(2),
        ))
        .unwrap();

    for id in ["g1", "g2", "g3"] {
        network
            .add_generator(Gen::new(id, BusId::new(1)).with_p_limits(0.0, 100.0))
            .unwrap();
    }
    network.add_load(Load::new("l1", BusId::new(2))).unwrap();
    network
        .add_dangling_line(DanglingLine::new("dl1", BusId::new(2)))
        .unwrap();
    network
        .add_generator(Gen::new("g_island", BusId::new(3)).with_p_limits(0.0, 100.0))
        .unwrap();
    network
}

/// Generators `g1` [0, 150] at 80, `g2` [10, 100] at 50, `g3` [20, 80] at 30
/// and loads `l1`/`l2`/`l3` at 100/80/50 MW, all on one bus.
pub fn dispatch_network() -> Network {
    let mut network = Network::new();
    network.add_bus(Bus::new(BusId::new(1), "bus1".into())).unwrap();
    network.add_bus(Bus::new(BusId::new(2), "bus2".into())).unwrap();
    network
        .add_branch(Branch::new(
            BranchId::new(1),
            "l12".into(),
            BusId::new(1),
            BusId::new(2),
        ))
        .unwrap();

    for (id, pmin, pmax, target) in [
        ("g1", 0.0, 150.0, 80.0),
        ("g2", 10.0, 100.0, 50.0),
        ("g3", 20.0, 80.0, 30.0),
    ] {
        network
            .add_generator(
                Gen::new(id, BusId::new(1))
                    .with_p_limits(pmin, pmax)
                    .with_target_p(target),
            )
            .unwrap();
    }
    for (id, p0) in [("l1", 100.0), ("l2", 80.0), ("l3", 50.0)] {
        network
            .add_load(Load::new(id, BusId::new(1)).with_p0(p0))
            .unwrap();
    }
    network
}

pub fn target_p(network: &Network, id: &str) -> f64 {
    network.generator(id).unwrap().active_power.value()
}

pub fn p0(network: &Network, id: &str) -> f64 {
    network.load(id).unwrap().active_power.value()
}

pub fn q0(network: &Network, id: &str) -> f64 {
    network.load(id).unwrap().reactive_power.value()
}

pub fn set_active_power(network: &mut Network, kind: InjectionKind, id: &str, p: f64) {
    network
        .injection_mut(kind, id)
        .unwrap()
        .set_active_power(Megawatts(p));
}

pub fn set_reactive_power(network: &mut Network, kind: InjectionKind, id: &str, q: f64) {
    network
        .injection_mut(kind, id)
        .unwrap()
        .set_reactive_power(Megavars(q));
}
