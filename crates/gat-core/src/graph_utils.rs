use crate::{BusId, Edge, Network, Node};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

/// Island summary (standard components approach, see doi:10.1016/S0378-3758(96)00112-0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandSummary {
    pub island_id: usize,
    pub bus_count: usize,
    /// Lowest bus node index in the island, used to break size ties.
    pub first_node: usize,
}

/// Aggregated island analysis result.
///
/// Islands are numbered in discovery order. The main island is the one with
/// the most buses; ties go to the island holding the lowest bus node index.
#[derive(Debug, Clone, Default)]
pub struct IslandAnalysis {
    pub islands: Vec<IslandSummary>,
    pub bus_islands: HashMap<BusId, usize>,
    pub main_island: Option<usize>,
}

impl IslandAnalysis {
    /// Island the bus belongs to, if the bus exists.
    pub fn island_of(&self, bus: BusId) -> Option<usize> {
        self.bus_islands.get(&bus).copied()
    }

    /// Whether the bus lies in the main connected component.
    pub fn is_in_main(&self, bus: BusId) -> bool {
        match (self.island_of(bus), self.main_island) {
            (Some(island), Some(main)) => island == main,
            _ => false,
        }
    }
}

/// Labels connected components of the bus/branch topology (breadth-first search).
///
/// Only bus nodes are visited and only in-service branches are traversed, so
/// injection nodes and open branches never merge two islands.
pub fn find_islands(network: &Network) -> IslandAnalysis {
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut analysis = IslandAnalysis::default();
    let mut island_id = 0;

    for start in network.graph.node_indices() {
        if visited.contains(&start) || !matches!(network.graph[start], Node::Bus(_)) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(node);
            for edge in network.graph.edges(node) {
                let in_service = matches!(edge.weight(), Edge::Branch(branch) if branch.status);
                if !in_service {
                    continue;
                }
                let neighbor = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                if !visited.contains(&neighbor) && matches!(network.graph[neighbor], Node::Bus(_))
                {
                    queue.push_back(neighbor);
                }
            }
        }
        let first_node = members.iter().map(|n| n.index()).min().unwrap_or(start.index());
        for node in &members {
            if let Node::Bus(bus) = &network.graph[*node] {
                analysis.bus_islands.insert(bus.id, island_id);
            }
        }
        analysis.islands.push(IslandSummary {
            island_id,
            bus_count: members.len(),
            first_node,
        });
        island_id += 1;
    }

    analysis.main_island = analysis
        .islands
        .iter()
        .max_by(|a, b| {
            a.bus_count
                .cmp(&b.bus_count)
                .then_with(|| b.first_node.cmp(&a.first_node))
        })
        .map(|island| island.island_id);
    analysis
}
