use crate::genomics::{ActivationFunction, Connection, Node, NodeType};
use crate::Innovation;

use ahash::RandomState;

use std::collections::HashMap;

/// The compiled, activation-ready form of a genome.
///
/// Nodes are indexed by their position in the activation
/// order (their "phenotype index"). Weights and gates of
/// enabled connections are stored in dense `n ⨯ n` matrices,
/// `W[from][to]`, with a weight of 0 meaning "no connection".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Phenotype {
    activation_order: Vec<Innovation>,
    indices: HashMap<Innovation, usize, RandomState>,
    weights: Vec<f64>,
    gates: Vec<Option<usize>>,
    biases: Vec<f64>,
    activation_functions: Vec<ActivationFunction>,
    input_mask: Vec<bool>,
    output_mask: Vec<bool>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
}

impl Phenotype {
    /// Compiles the phenotype of the given nodes and connections.
    ///
    /// # Panics
    /// Panics if a connection refers to a node that is
    /// not in `nodes`.
    pub(crate) fn compile(nodes: &[Node], connections: &[Connection]) -> Phenotype {
        let activation_order = activation_order(nodes, connections);
        let indices: HashMap<Innovation, usize, RandomState> = activation_order
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();
        let by_id: HashMap<Innovation, &Node, RandomState> =
            nodes.iter().map(|n| (n.id(), n)).collect();

        let n = nodes.len();
        let mut weights = vec![0.0; n * n];
        let mut gates = vec![None; n * n];
        let resolve = |connection: &Connection, node: Innovation| -> usize {
            *indices.get(&node).unwrap_or_else(|| {
                panic!(
                    "connection {} refers to nonexistent node {}",
                    connection.id(),
                    node
                )
            })
        };
        for connection in connections.iter().filter(|c| c.enabled()) {
            let from = resolve(connection, connection.input());
            let to = resolve(connection, connection.output());
            weights[from * n + to] = connection.weight();
            gates[from * n + to] = connection.gater().map(|g| resolve(connection, g));
        }

        let ordered: Vec<&Node> = activation_order.iter().map(|id| by_id[id]).collect();
        let input_mask: Vec<bool> = ordered.iter().map(|n| n.is_input()).collect();
        let output_mask: Vec<bool> = ordered
            .iter()
            .map(|n| n.node_type() == NodeType::Output)
            .collect();

        // Inputs and outputs are read in node insertion order.
        let inputs = nodes
            .iter()
            .filter(|n| n.is_input())
            .map(|n| indices[&n.id()])
            .collect();
        let outputs = nodes
            .iter()
            .filter(|n| n.node_type() == NodeType::Output)
            .map(|n| indices[&n.id()])
            .collect();

        Phenotype {
            biases: ordered.iter().map(|n| n.bias()).collect(),
            activation_functions: ordered.iter().map(|n| n.activation_function()).collect(),
            activation_order,
            indices,
            weights,
            gates,
            input_mask,
            output_mask,
            inputs,
            outputs,
        }
    }

    /// Returns the node innovation numbers in activation order.
    pub fn activation_order(&self) -> &[Innovation] {
        &self.activation_order
    }

    /// Returns the phenotype index of a node.
    pub fn index_of(&self, node: Innovation) -> Option<usize> {
        self.indices.get(&node).copied()
    }

    /// Returns the number of compiled nodes.
    pub fn len(&self) -> usize {
        self.activation_order.len()
    }

    /// Returns `true` if the phenotype has no nodes.
    pub fn is_empty(&self) -> bool {
        self.activation_order.is_empty()
    }

    /// Returns the number of input nodes.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Returns the number of output nodes.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Returns `W[from][to]` for phenotype indices.
    pub fn weight(&self, from: usize, to: usize) -> f64 {
        self.weights[from * self.len() + to]
    }

    /// Returns the phenotype index gating the
    /// `from -> to` connection, if any.
    pub fn gate(&self, from: usize, to: usize) -> Option<usize> {
        self.gates[from * self.len() + to]
    }

    /// Returns whether the phenotype index belongs to an input node.
    pub fn is_input(&self, index: usize) -> bool {
        self.input_mask[index]
    }

    /// Returns whether the phenotype index belongs to an output node.
    pub fn is_output(&self, index: usize) -> bool {
        self.output_mask[index]
    }

    /// Writes the input values into the state vector.
    pub(crate) fn inject(&self, activations: &mut [f64], input_values: &[f64]) {
        for (&index, &value) in self.inputs.iter().zip(input_values) {
            activations[index] = value;
        }
    }

    /// Performs a single update sweep over every node in
    /// activation order. Nodes updated earlier in the sweep
    /// are seen with their new values by later nodes.
    pub(crate) fn sweep(&self, activations: &mut [f64]) {
        let n = self.len();
        for to in 0..n {
            let mut incoming = 0.0;
            for from in 0..n {
                let weight = self.weights[from * n + to];
                if weight == 0.0 {
                    continue;
                }
                let signal = weight * activations[from];
                incoming += match self.gates[from * n + to] {
                    Some(gater) => signal * activations[gater],
                    None => signal,
                };
            }
            let pre_activation = activations[to] + incoming + self.biases[to];
            activations[to] = self.activation_functions[to].apply(pre_activation);
        }
    }

    /// Reads the output values in output node insertion order.
    pub(crate) fn read_outputs(&self, activations: &[f64]) -> Vec<f64> {
        self.outputs.iter().map(|&index| activations[index]).collect()
    }
}

/// Computes a deterministic linear order covering every node
/// exactly once, following the enabled, non-self-loop
/// connections wherever the graph allows it.
///
/// Input nodes come first, topologically sorted among
/// themselves (in ID order if they form a cycle). The rest
/// are appended as soon as all their predecessors are placed.
/// When no node can be placed, the one with the fewest unmet
/// predecessors is forced in, preferring input nodes and the
/// earliest inserted node on ties.
pub(crate) fn activation_order(nodes: &[Node], connections: &[Connection]) -> Vec<Innovation> {
    let positions: HashMap<Innovation, usize, RandomState> = nodes
        .iter()
        .enumerate()
        .map(|(position, node)| (node.id(), position))
        .collect();

    let mut predecessors = vec![Vec::new(); nodes.len()];
    for connection in connections
        .iter()
        .filter(|c| c.enabled() && !c.is_self_loop())
    {
        if let (Some(&from), Some(&to)) = (
            positions.get(&connection.input()),
            positions.get(&connection.output()),
        ) {
            if !predecessors[to].contains(&from) {
                predecessors[to].push(from);
            }
        }
    }

    let mut placed = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    for position in input_order(nodes, &predecessors) {
        placed[position] = true;
        order.push(position);
    }

    let mut remaining: Vec<usize> = (0..nodes.len()).filter(|&p| !placed[p]).collect();
    while !remaining.is_empty() {
        let before = remaining.len();
        remaining.retain(|&position| {
            if predecessors[position].iter().all(|&p| placed[p]) {
                placed[position] = true;
                order.push(position);
                false
            } else {
                true
            }
        });

        // A pass that places nothing would repeat forever.
        if remaining.len() == before {
            let unmet = |position: &usize| {
                predecessors[*position]
                    .iter()
                    .filter(|&&p| !placed[p])
                    .count()
            };
            let forced = remaining
                .iter()
                .filter(|&&p| nodes[p].is_input())
                .min_by_key(|p| unmet(*p))
                .or_else(|| remaining.iter().min_by_key(|p| unmet(*p)))
                .copied();
            if let Some(position) = forced {
                log::debug!(
                    "activation order impasse, forcing node {} with {} unmet predecessors",
                    nodes[position].id(),
                    unmet(&position)
                );
                placed[position] = true;
                order.push(position);
                remaining.retain(|&p| p != position);
            }
        }
    }

    order.into_iter().map(|position| nodes[position].id()).collect()
}

/// Input node positions sorted topologically over
/// input-to-input edges, or by ID if those contain a cycle.
fn input_order(nodes: &[Node], predecessors: &[Vec<usize>]) -> Vec<usize> {
    let inputs: Vec<usize> = (0..nodes.len()).filter(|&p| nodes[p].is_input()).collect();
    let mut done = vec![false; nodes.len()];
    let mut pending = inputs.clone();
    let mut order = Vec::with_capacity(inputs.len());
    while !pending.is_empty() {
        let ready = pending.iter().position(|&position| {
            predecessors[position]
                .iter()
                .all(|&p| !nodes[p].is_input() || done[p])
        });
        match ready {
            Some(k) => {
                let position = pending.remove(k);
                done[position] = true;
                order.push(position);
            }
            None => {
                let mut by_id = inputs;
                by_id.sort_by_key(|&p| nodes[p].id());
                return by_id;
            }
        }
    }
    order
}
