//! # gat-core: Power Grid Modeling Core
//!
//! Provides the network model that the gat scaling engine reads and mutates.
//!
//! ## Design Philosophy
//!
//! Networks are modeled as **undirected multigraphs** where:
//! - **Nodes**: Buses, and the injections attached to them: generators,
//!   loads and dangling (boundary) lines
//! - **Edges**: Branches between buses
//!
//! Injections are addressed by string identifiers and expose their active
//! setpoint in their *natural* sign convention: a generator's `targetP` is
//! positive when producing, a load's `P0` is positive when consuming.
//!
//! ## Quick Start
//!
//! ```rust
//! use gat_core::*;
//!
//! let mut network = Network::new();
//! network.add_bus(Bus::new(BusId::new(1), "Bus 1".to_string())).unwrap();
//! network.add_bus(Bus::new(BusId::new(2), "Bus 2".to_string())).unwrap();
//! network
//!     .add_branch(Branch::new(BranchId::new(1), "Line 1-2".into(), BusId::new(1), BusId::new(2)))
//!     .unwrap();
//!
//! network
//!     .add_generator(Gen::new("G1", BusId::new(1)).with_p_limits(0.0, 100.0).with_target_p(40.0))
//!     .unwrap();
//! network.add_load(Load::new("L1", BusId::new(2)).with_p0(50.0)).unwrap();
//!
//! let gen = network.injection(InjectionKind::Generator, "G1").unwrap();
//! assert_eq!(gen.active_power().value(), 40.0);
//! assert!(network.is_in_main_component(BusId::new(2)));
//! ```
//!
//! ## Modules
//!
//! - [`diagnostics`] - Issue collection for degraded operations
//! - [`graph_utils`] - Island detection and main connected component
//! - [`units`] - Unit-safe power quantities

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics};
pub use error::{GatError, GatResult};
pub use graph_utils::{find_islands, IslandAnalysis, IslandSummary};
pub use petgraph::graph::NodeIndex;
pub use units::{Megavars, Megawatts};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(usize);

impl BusId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BusId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl BranchId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BranchId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
}

impl Default for BusId {
    fn default() -> Self {
        BusId(0)
    }
}

impl Bus {
    pub fn new(id: BusId, name: String) -> Self {
        Self { id, name }
    }
}

#[derive(Debug, Clone)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    /// Operational status flag; open branches do not connect islands
    pub status: bool,
}

impl Branch {
    pub fn new(id: BranchId, name: String, from_bus: BusId, to_bus: BusId) -> Self {
        Self {
            id,
            name,
            from_bus,
            to_bus,
            status: true,
        }
    }

    /// Mark the branch as out of service.
    pub fn opened(mut self) -> Self {
        self.status = false;
        self
    }
}

/// Generator injection (generator-natural: positive when producing).
#[derive(Debug, Clone)]
pub struct Gen {
    pub id: String,
    pub bus: BusId,
    /// Active power setpoint, targetP (MW)
    pub active_power: Megawatts,
    /// Reactive power setpoint, targetQ (Mvar)
    pub reactive_power: Megavars,
    /// Minimum active power output
    pub pmin: Megawatts,
    /// Maximum active power output
    pub pmax: Megawatts,
    /// Terminal connection state
    pub connected: bool,
    /// Measured active flow at the terminal, natural convention (MW)
    pub terminal_p: Option<Megawatts>,
}

impl Gen {
    /// Create a connected generator with no active power limits.
    pub fn new(id: impl Into<String>, bus: BusId) -> Self {
        Self {
            id: id.into(),
            bus,
            active_power: Megawatts(0.0),
            reactive_power: Megavars(0.0),
            pmin: Megawatts::MIN,
            pmax: Megawatts::MAX,
            connected: true,
            terminal_p: None,
        }
    }

    /// Set active power limits (in MW)
    pub fn with_p_limits(mut self, pmin: f64, pmax: f64) -> Self {
        self.pmin = Megawatts(pmin);
        self.pmax = Megawatts(pmax);
        self
    }

    /// Set the active power setpoint (in MW)
    pub fn with_target_p(mut self, target_p: f64) -> Self {
        self.active_power = Megawatts(target_p);
        self
    }

    /// Set the measured terminal flow (in MW)
    pub fn with_terminal_p(mut self, p: f64) -> Self {
        self.terminal_p = Some(Megawatts(p));
        self
    }

    /// Detach the generator's terminal
    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }
}

/// Load injection (load-natural: positive when consuming).
#[derive(Debug, Clone)]
pub struct Load {
    pub id: String,
    pub bus: BusId,
    /// Active power demand, P0 (MW)
    pub active_power: Megawatts,
    /// Reactive power demand, Q0 (Mvar)
    pub reactive_power: Megavars,
    pub connected: bool,
    pub terminal_p: Option<Megawatts>,
}

impl Load {
    pub fn new(id: impl Into<String>, bus: BusId) -> Self {
        Self {
            id: id.into(),
            bus,
            active_power: Megawatts(0.0),
            reactive_power: Megavars(0.0),
            connected: true,
            terminal_p: None,
        }
    }

    pub fn with_p0(mut self, p0: f64) -> Self {
        self.active_power = Megawatts(p0);
        self
    }

    pub fn with_q0(mut self, q0: f64) -> Self {
        self.reactive_power = Megavars(q0);
        self
    }

    pub fn with_terminal_p(mut self, p: f64) -> Self {
        self.terminal_p = Some(Megawatts(p));
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }
}

/// Boundary line towards an external network, modeled as a load-natural
/// injection at its network side.
#[derive(Debug, Clone)]
pub struct DanglingLine {
    pub id: String,
    pub bus: BusId,
    /// Active power exchanged at the boundary, P0 (MW)
    pub active_power: Megawatts,
    /// Reactive power exchanged at the boundary, Q0 (Mvar)
    pub reactive_power: Megavars,
    pub connected: bool,
    pub terminal_p: Option<Megawatts>,
}

impl DanglingLine {
    pub fn new(id: impl Into<String>, bus: BusId) -> Self {
        Self {
            id: id.into(),
            bus,
            active_power: Megawatts(0.0),
            reactive_power: Megavars(0.0),
            connected: true,
            terminal_p: None,
        }
    }

    pub fn with_p0(mut self, p0: f64) -> Self {
        self.active_power = Megawatts(p0);
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }
}

// Enum to represent different types of nodes in the graph
#[derive(Debug, Clone)]
pub enum Node {
    Bus(Bus),
    Gen(Gen),
    Load(Load),
    DanglingLine(DanglingLine),
}

// Enum to represent different types of edges in the graph
#[derive(Debug, Clone)]
pub enum Edge {
    Branch(Branch),
}

/// Kind of injection a scalable can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionKind {
    Generator,
    Load,
    DanglingLine,
}

impl std::fmt::Display for InjectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InjectionKind::Generator => "generator",
            InjectionKind::Load => "load",
            InjectionKind::DanglingLine => "dangling line",
        };
        f.write_str(name)
    }
}

/// Read-only view over an injection node.
#[derive(Debug, Clone, Copy)]
pub enum InjectionRef<'a> {
    Generator(&'a Gen),
    Load(&'a Load),
    DanglingLine(&'a DanglingLine),
}

impl<'a> InjectionRef<'a> {
    pub fn kind(&self) -> InjectionKind {
        match self {
            InjectionRef::Generator(_) => InjectionKind::Generator,
            InjectionRef::Load(_) => InjectionKind::Load,
            InjectionRef::DanglingLine(_) => InjectionKind::DanglingLine,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            InjectionRef::Generator(g) => &g.id,
            InjectionRef::Load(l) => &l.id,
            InjectionRef::DanglingLine(d) => &d.id,
        }
    }

    pub fn bus(&self) -> BusId {
        match self {
            InjectionRef::Generator(g) => g.bus,
            InjectionRef::Load(l) => l.bus,
            InjectionRef::DanglingLine(d) => d.bus,
        }
    }

    /// Active setpoint in the injection's natural convention.
    pub fn active_power(&self) -> Megawatts {
        match self {
            InjectionRef::Generator(g) => g.active_power,
            InjectionRef::Load(l) => l.active_power,
            InjectionRef::DanglingLine(d) => d.active_power,
        }
    }

    pub fn reactive_power(&self) -> Megavars {
        match self {
            InjectionRef::Generator(g) => g.reactive_power,
            InjectionRef::Load(l) => l.reactive_power,
            InjectionRef::DanglingLine(d) => d.reactive_power,
        }
    }

    /// Physical active power limits in natural convention. Loads and
    /// dangling lines have none.
    pub fn native_limits(&self) -> (Megawatts, Megawatts) {
        match self {
            InjectionRef::Generator(g) => (g.pmin, g.pmax),
            InjectionRef::Load(_) | InjectionRef::DanglingLine(_) => {
                (Megawatts::MIN, Megawatts::MAX)
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        match self {
            InjectionRef::Generator(g) => g.connected,
            InjectionRef::Load(l) => l.connected,
            InjectionRef::DanglingLine(d) => d.connected,
        }
    }

    /// Measured terminal flow in natural convention, if known.
    pub fn terminal_p(&self) -> Option<Megawatts> {
        match self {
            InjectionRef::Generator(g) => g.terminal_p,
            InjectionRef::Load(l) => l.terminal_p,
            InjectionRef::DanglingLine(d) => d.terminal_p,
        }
    }
}

/// Mutable view over an injection node.
#[derive(Debug)]
pub enum InjectionMut<'a> {
    Generator(&'a mut Gen),
    Load(&'a mut Load),
    DanglingLine(&'a mut DanglingLine),
}

impl InjectionMut<'_> {
    /// Write the active setpoint, natural convention.
    pub fn set_active_power(&mut self, p: Megawatts) {
        match self {
            InjectionMut::Generator(g) => g.active_power = p,
            InjectionMut::Load(l) => l.active_power = p,
            InjectionMut::DanglingLine(d) => d.active_power = p,
        }
    }

    pub fn set_reactive_power(&mut self, q: Megavars) {
        match self {
            InjectionMut::Generator(g) => g.reactive_power = q,
            InjectionMut::Load(l) => l.reactive_power = q,
            InjectionMut::DanglingLine(d) => d.reactive_power = q,
        }
    }

    pub fn connect(&mut self) {
        match self {
            InjectionMut::Generator(g) => g.connected = true,
            InjectionMut::Load(l) => l.connected = true,
            InjectionMut::DanglingLine(d) => d.connected = true,
        }
    }
}

/// The core power network graph
#[derive(Debug, Default)]
pub struct Network {
    pub graph: Graph<Node, Edge, Undirected>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
        }
    }

    /// Add a bus; bus ids must be unique.
    pub fn add_bus(&mut self, bus: Bus) -> GatResult<NodeIndex> {
        if self.bus_node(bus.id).is_some() {
            return Err(GatError::Network(format!(
                "bus {} already exists",
                bus.id.value()
            )));
        }
        Ok(self.graph.add_node(Node::Bus(bus)))
    }

    /// Connect two existing buses with a branch.
    pub fn add_branch(&mut self, branch: Branch) -> GatResult<EdgeIndex> {
        let from = self.require_bus(branch.from_bus)?;
        let to = self.require_bus(branch.to_bus)?;
        Ok(self.graph.add_edge(from, to, Edge::Branch(branch)))
    }

    pub fn add_generator(&mut self, gen: Gen) -> GatResult<NodeIndex> {
        if gen.pmin > gen.pmax {
            return Err(GatError::Validation(format!(
                "generator '{}' has pmin {} above pmax {}",
                gen.id, gen.pmin, gen.pmax
            )));
        }
        self.check_injection(InjectionKind::Generator, &gen.id, gen.bus)?;
        Ok(self.graph.add_node(Node::Gen(gen)))
    }

    pub fn add_load(&mut self, load: Load) -> GatResult<NodeIndex> {
        self.check_injection(InjectionKind::Load, &load.id, load.bus)?;
        Ok(self.graph.add_node(Node::Load(load)))
    }

    pub fn add_dangling_line(&mut self, line: DanglingLine) -> GatResult<NodeIndex> {
        self.check_injection(InjectionKind::DanglingLine, &line.id, line.bus)?;
        Ok(self.graph.add_node(Node::DanglingLine(line)))
    }

    fn check_injection(&self, kind: InjectionKind, id: &str, bus: BusId) -> GatResult<()> {
        if id.trim().is_empty() {
            return Err(GatError::Validation(format!("{kind} id cannot be empty")));
        }
        if self.find_injection(kind, id).is_some() {
            return Err(GatError::Network(format!("{kind} '{id}' already exists")));
        }
        self.require_bus(bus).map(|_| ())
    }

    fn require_bus(&self, bus: BusId) -> GatResult<NodeIndex> {
        self.bus_node(bus)
            .ok_or_else(|| GatError::Network(format!("bus {} does not exist", bus.value())))
    }

    /// Graph node holding the bus with the given id.
    pub fn bus_node(&self, bus: BusId) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|idx| matches!(&self.graph[*idx], Node::Bus(b) if b.id == bus))
    }

    /// Locate an injection of the given kind by id.
    pub fn find_injection(&self, kind: InjectionKind, id: &str) -> Option<NodeIndex> {
        self.graph.node_indices().find(|idx| {
            match (&self.graph[*idx], kind) {
                (Node::Gen(g), InjectionKind::Generator) => g.id == id,
                (Node::Load(l), InjectionKind::Load) => l.id == id,
                (Node::DanglingLine(d), InjectionKind::DanglingLine) => d.id == id,
                _ => false,
            }
        })
    }

    /// Locate any node by identifier: injections by id, buses by name.
    pub fn find_node(&self, id: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|idx| self.graph[*idx].label() == id)
    }

    /// Read view over the node, if it is an injection.
    pub fn injection_at(&self, idx: NodeIndex) -> Option<InjectionRef<'_>> {
        match self.graph.node_weight(idx)? {
            Node::Gen(g) => Some(InjectionRef::Generator(g)),
            Node::Load(l) => Some(InjectionRef::Load(l)),
            Node::DanglingLine(d) => Some(InjectionRef::DanglingLine(d)),
            Node::Bus(_) => None,
        }
    }

    pub fn injection(&self, kind: InjectionKind, id: &str) -> Option<InjectionRef<'_>> {
        self.find_injection(kind, id)
            .and_then(|idx| self.injection_at(idx))
    }

    pub fn injection_mut(&mut self, kind: InjectionKind, id: &str) -> Option<InjectionMut<'_>> {
        let idx = self.find_injection(kind, id)?;
        match self.graph.node_weight_mut(idx)? {
            Node::Gen(g) => Some(InjectionMut::Generator(g)),
            Node::Load(l) => Some(InjectionMut::Load(l)),
            Node::DanglingLine(d) => Some(InjectionMut::DanglingLine(d)),
            Node::Bus(_) => None,
        }
    }

    /// Whether the bus belongs to the network's main connected component.
    ///
    /// Labels every island on each call; use [`find_islands`] directly when
    /// checking many buses against an unchanged topology.
    pub fn is_in_main_component(&self, bus: BusId) -> bool {
        find_islands(self).is_in_main(bus)
    }

    pub fn generator(&self, id: &str) -> Option<&Gen> {
        match self.injection(InjectionKind::Generator, id)? {
            InjectionRef::Generator(g) => Some(g),
            _ => None,
        }
    }

    pub fn load(&self, id: &str) -> Option<&Load> {
        match self.injection(InjectionKind::Load, id)? {
            InjectionRef::Load(l) => Some(l),
            _ => None,
        }
    }

    pub fn dangling_line(&self, id: &str) -> Option<&DanglingLine> {
        match self.injection(InjectionKind::DanglingLine, id)? {
            InjectionRef::DanglingLine(d) => Some(d),
            _ => None,
        }
    }

    /// Get all generators as a vector
    pub fn generators(&self) -> Vec<&Gen> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Gen(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    /// Get all loads as a vector
    pub fn loads(&self) -> Vec<&Load> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Load(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    /// Get total active power generation of connected units (MW)
    pub fn total_generation_mw(&self) -> f64 {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Gen(g) if g.connected => Some(g.active_power.value()),
                _ => None,
            })
            .sum()
    }

    /// Get total active power load of connected loads (MW)
    pub fn total_load_mw(&self) -> f64 {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Load(l) if l.connected => Some(l.active_power.value()),
                _ => None,
            })
            .sum()
    }
}

impl Node {
    /// Identifier used for lookups: bus name or injection id.
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(bus) => &bus.name,
            Node::Gen(gen) => &gen.id,
            Node::Load(load) => &load.id,
            Node::DanglingLine(line) => &line.id,
        }
    }
}

impl Edge {
    /// Returns a human-readable label for the edge.
    pub fn label(&self) -> &str {
        match self {
            Edge::Branch(branch) => &branch.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bus_network() -> Network {
        let mut network = Network::new();
        network.add_bus(Bus::new(BusId::new(1), "Bus 1".into())).unwrap();
        network.add_bus(Bus::new(BusId::new(2), "Bus 2".into())).unwrap();
        network
            .add_branch(Branch::new(
                BranchId::new(1),
                "Line 1-2".into(),
                BusId::new(1),
                BusId::new(2),
            ))
            .unwrap();
        network
    }

    #[test]
    fn test_network_creation() {
        let network = two_bus_network();
        assert_eq!(network.graph.node_count(), 2);
        assert_eq!(network.graph.edge_count(), 1);
        assert_eq!(network.graph.edge_weights().next().unwrap().label(), "Line 1-2");
    }

    #[test]
    fn test_duplicate_bus_rejected() {
        let mut network = two_bus_network();
        let err = network
            .add_bus(Bus::new(BusId::new(1), "again".into()))
            .unwrap_err();
        assert!(matches!(err, GatError::Network(_)));
    }

    #[test]
    fn test_injection_validation() {
        let mut network = two_bus_network();
        assert!(matches!(
            network.add_generator(Gen::new("", BusId::new(1))),
            Err(GatError::Validation(_))
        ));
        assert!(matches!(
            network.add_load(Load::new("L1", BusId::new(9))),
            Err(GatError::Network(_))
        ));
        assert!(matches!(
            network.add_generator(Gen::new("G1", BusId::new(1)).with_p_limits(10.0, 5.0)),
            Err(GatError::Validation(_))
        ));
        network.add_generator(Gen::new("G1", BusId::new(1))).unwrap();
        assert!(network.add_generator(Gen::new("G1", BusId::new(2))).is_err());
        // Same id, different kind, is a different equipment.
        network.add_load(Load::new("G1", BusId::new(2))).unwrap();
    }

    #[test]
    fn test_injection_views() {
        let mut network = two_bus_network();
        network
            .add_generator(
                Gen::new("G1", BusId::new(1))
                    .with_p_limits(0.0, 150.0)
                    .with_target_p(80.0),
            )
            .unwrap();
        network
            .add_load(Load::new("L1", BusId::new(2)).with_p0(100.0).with_q0(10.0))
            .unwrap();

        let gen = network.injection(InjectionKind::Generator, "G1").unwrap();
        assert_eq!(gen.kind(), InjectionKind::Generator);
        assert_eq!(gen.native_limits(), (Megawatts(0.0), Megawatts(150.0)));

        let load = network.injection(InjectionKind::Load, "L1").unwrap();
        assert_eq!(load.native_limits(), (Megawatts::MIN, Megawatts::MAX));
        assert!(network.injection(InjectionKind::Generator, "L1").is_none());

        let mut load = network.injection_mut(InjectionKind::Load, "L1").unwrap();
        load.set_active_power(Megawatts(60.0));
        load.set_reactive_power(Megavars(6.0));
        assert_eq!(network.load("L1").unwrap().active_power.value(), 60.0);
        assert_eq!(network.load("L1").unwrap().reactive_power.value(), 6.0);
    }

    #[test]
    fn test_connect_and_totals() {
        let mut network = two_bus_network();
        network
            .add_generator(Gen::new("G1", BusId::new(1)).with_target_p(50.0).disconnected())
            .unwrap();
        network
            .add_generator(Gen::new("G2", BusId::new(1)).with_target_p(30.0))
            .unwrap();
        assert!((network.total_generation_mw() - 30.0).abs() < 1e-9);

        network
            .injection_mut(InjectionKind::Generator, "G1")
            .unwrap()
            .connect();
        assert!(network.generator("G1").unwrap().connected);
        assert!((network.total_generation_mw() - 80.0).abs() < 1e-9);
        assert_eq!(network.generators().len(), 2);
    }

    #[test]
    fn test_find_node_matches_buses_and_injections() {
        let mut network = two_bus_network();
        network
            .add_dangling_line(DanglingLine::new("DL1", BusId::new(2)).with_p0(20.0))
            .unwrap();
        let bus = network.find_node("Bus 1").unwrap();
        assert!(network.injection_at(bus).is_none());
        let line = network.find_node("DL1").unwrap();
        assert_eq!(
            network.injection_at(line).unwrap().kind(),
            InjectionKind::DanglingLine
        );
        assert_eq!(network.dangling_line("DL1").unwrap().active_power.value(), 20.0);
        assert!(network.find_node("nope").is_none());
    }

    #[test]
    fn test_main_component_membership() {
        let mut network = two_bus_network();
        network.add_bus(Bus::new(BusId::new(3), "Island".into())).unwrap();
        assert!(network.is_in_main_component(BusId::new(1)));
        assert!(!network.is_in_main_component(BusId::new(3)));
    }
}
