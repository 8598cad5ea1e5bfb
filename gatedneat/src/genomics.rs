//! Genomes, their compiled phenotypes and the
//! innovation registry shared by a run.
mod config;
mod connections;
mod errors;
mod history;
mod mutations;
mod nodes;
mod phenotype;
mod record;

pub use config::GeneticConfig;
pub use connections::Connection;
pub use errors::{ActivationError, GenomeError, MutationError};
pub use history::InnovationRegistry;
pub use nodes::{ActivationFunction, Node, NodeType, ACTIVATION_CLAMP, LEAKY_RELU_SLOPE};
pub use phenotype::Phenotype;
pub use record::{ConnectionRecord, GenomeRecord, NodeRecord};

use crate::Innovation;

use ahash::RandomState;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::fmt;

/// Number of update sweeps used by callers
/// that have no reason to pick another.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Genomes are the focus of evolution. They hold an
/// insertion-ordered list of [`Node`]s and [`Connection`]s,
/// the compiled [`Phenotype`] derived from them, and the
/// recurrent state (one activation value per node).
///
/// Connections refer to nodes by innovation number, and
/// every referenced node must be present in the genome.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "GenomeRecord", try_from = "GenomeRecord")]
pub struct Genome {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    node_indices: HashMap<Innovation, usize, RandomState>,
    connection_indices: HashMap<Innovation, usize, RandomState>,
    phenotype: Phenotype,
    activations: Vec<f64>,
}

impl Genome {
    /// Creates a new genome with one input node per configured input
    /// (identity activation, zero bias) and one output node per
    /// configured output, with every input connected to every output.
    ///
    /// Input nodes have innovation numbers `0..input_count`, and outputs
    /// follow. Weights and output biases are drawn uniformly from
    /// `[-1, 1]` and bounded per the configuration.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut registry = InnovationRegistry::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    ///
    /// let genome = Genome::new(&config, &mut registry, &mut rng);
    /// assert_eq!(genome.nodes().len(), 5);
    /// assert_eq!(genome.connections().len(), 6);
    /// ```
    pub fn new<R: Rng>(
        config: &GeneticConfig,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Genome {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        let mut genome = Genome::empty();

        for id in 0..input_count {
            genome.insert_node(Node::new(id, NodeType::Input, ActivationFunction::Identity, 0.0));
        }
        for id in input_count..input_count + output_count {
            let bias = config.bound_value(rng.gen_range(-1.0..=1.0));
            genome.insert_node(Node::new(id, NodeType::Output, config.output_activation, bias));
        }
        for input in 0..input_count {
            for output in input_count..input_count + output_count {
                let id = registry.assign_connection_id((input, output));
                let weight = config.bound_value(rng.gen_range(-1.0..=1.0));
                genome.insert_connection(Connection::new(id, input, output, weight));
            }
        }

        genome.create_phenotype();
        genome
    }

    /// Creates a genome with no nodes or connections.
    pub fn empty() -> Genome {
        Genome {
            nodes: vec![],
            connections: vec![],
            node_indices: HashMap::default(),
            connection_indices: HashMap::default(),
            phenotype: Phenotype::default(),
            activations: vec![],
        }
    }

    /// Adds a node to the genome and recompiles its phenotype.
    ///
    /// # Errors
    /// Returns an error if a node with the same
    /// innovation number is already present.
    pub fn add_node(&mut self, node: Node) -> Result<(), GenomeError> {
        self.check_node(&node)?;
        self.insert_node(node);
        self.create_phenotype();
        Ok(())
    }

    /// Adds a connection to the genome and recompiles its phenotype.
    ///
    /// # Errors
    /// Returns an error if the connection's innovation number
    /// or endpoints are already present, or if its endpoints
    /// or gater are not nodes of the genome.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{ActivationFunction, Connection, Genome, Node, NodeType};
    ///
    /// let mut genome = Genome::empty();
    /// genome.add_node(Node::new(0, NodeType::Input, ActivationFunction::Identity, 0.0)).unwrap();
    /// genome.add_node(Node::new(1, NodeType::Output, ActivationFunction::Identity, 0.0)).unwrap();
    ///
    /// assert!(genome.add_connection(Connection::new(0, 0, 1, 0.5)).is_ok());
    /// assert!(genome.add_connection(Connection::new(0, 1, 0, 0.5)).is_err());
    /// assert!(genome.add_connection(Connection::new(1, 0, 9, 0.5)).is_err());
    /// ```
    pub fn add_connection(&mut self, connection: Connection) -> Result<(), GenomeError> {
        self.check_connection(&connection)?;
        self.insert_connection(connection);
        self.create_phenotype();
        Ok(())
    }

    /// Recompiles the genome's phenotype from its current nodes
    /// and connections, and resets its state.
    ///
    /// # Panics
    /// Panics if a connection refers to a node absent
    /// from the genome.
    pub fn create_phenotype(&mut self) {
        self.phenotype = Phenotype::compile(&self.nodes, &self.connections);
        self.activations = vec![0.0; self.nodes.len()];
    }

    /// Activates the network with the given input values,
    /// performing exactly `max_iterations` update sweeps, and
    /// returns the values of the output nodes in insertion order.
    ///
    /// Each sweep updates every node in activation order to
    /// `f(previous + incoming + bias)`, where incoming signals
    /// of gated connections are multiplied by the gater's value.
    /// The state persists between calls unless `simulate_only`
    /// is set, in which case it is restored before returning.
    ///
    /// # Errors
    /// Returns [`ActivationError::ShapeMismatch`] if the number of
    /// input values differs from the number of input nodes, and
    /// [`ActivationError::InvalidOutput`] if any output is NaN.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{ActivationFunction, Connection, Genome, Node, NodeType};
    ///
    /// let mut genome = Genome::empty();
    /// genome.add_node(Node::new(0, NodeType::Input, ActivationFunction::Identity, 0.0)).unwrap();
    /// genome.add_node(Node::new(1, NodeType::Input, ActivationFunction::Identity, 0.0)).unwrap();
    /// genome.add_node(Node::new(2, NodeType::Output, ActivationFunction::Identity, 0.0)).unwrap();
    /// genome.add_connection(Connection::new(0, 0, 2, 1.0)).unwrap();
    /// genome.add_connection(Connection::new(1, 1, 2, 1.0)).unwrap();
    ///
    /// assert_eq!(genome.activate(&[1.0, 0.0], 1, false).unwrap(), vec![1.0]);
    /// // The output accumulates its previous value.
    /// assert_eq!(genome.activate(&[1.0, 0.0], 1, true).unwrap(), vec![2.0]);
    /// assert_eq!(genome.activations()[2], 1.0);
    /// ```
    pub fn activate(
        &mut self,
        input_values: &[f64],
        max_iterations: usize,
        simulate_only: bool,
    ) -> Result<Vec<f64>, ActivationError> {
        let expected = self.phenotype.input_count();
        if input_values.len() != expected {
            return Err(ActivationError::ShapeMismatch {
                expected,
                actual: input_values.len(),
            });
        }

        let previous = if simulate_only {
            Some(self.activations.clone())
        } else {
            None
        };

        self.phenotype.inject(&mut self.activations, input_values);
        for _ in 0..max_iterations {
            self.phenotype.sweep(&mut self.activations);
        }
        let outputs = self.phenotype.read_outputs(&self.activations);

        if let Some(previous) = previous {
            self.activations = previous;
        }
        match outputs.iter().position(|v| v.is_nan()) {
            Some(index) => Err(ActivationError::InvalidOutput { index }),
            None => Ok(outputs),
        }
    }

    /// Zeroes the genome's recurrent state.
    pub fn reset_state(&mut self) {
        self.activations = vec![0.0; self.nodes.len()];
    }

    /// Returns the recurrent state, indexed by phenotype index.
    pub fn activations(&self) -> &[f64] {
        &self.activations
    }

    /// Overwrites the recurrent state with a previously
    /// saved one.
    ///
    /// # Errors
    /// Returns [`ActivationError::ShapeMismatch`] if the state
    /// length differs from the genome's node count.
    pub fn set_activations(&mut self, state: &[f64]) -> Result<(), ActivationError> {
        if state.len() != self.activations.len() {
            return Err(ActivationError::ShapeMismatch {
                expected: self.activations.len(),
                actual: state.len(),
            });
        }
        self.activations.copy_from_slice(state);
        Ok(())
    }

    /// Returns the genome's compiled phenotype.
    pub fn phenotype(&self) -> &Phenotype {
        &self.phenotype
    }

    /// Returns the genome's nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the genome's connections in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Returns the node with the given innovation number.
    pub fn node(&self, id: Innovation) -> Option<&Node> {
        self.node_indices.get(&id).map(|&i| &self.nodes[i])
    }

    /// Returns the connection with the given innovation number.
    pub fn connection(&self, id: Innovation) -> Option<&Connection> {
        self.connection_indices.get(&id).map(|&i| &self.connections[i])
    }

    /// Returns the connection going from `input` to `output`, if any.
    pub fn connection_between(&self, input: Innovation, output: Innovation) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.endpoints() == (input, output))
    }

    /// Returns `true` if the nodes are directly connected
    /// in either direction.
    pub fn are_connected(&self, a: Innovation, b: Innovation) -> bool {
        self.connections
            .iter()
            .any(|c| c.endpoints() == (a, b) || c.endpoints() == (b, a))
    }

    /// Returns the number of input nodes.
    pub fn input_count(&self) -> usize {
        self.phenotype.input_count()
    }

    /// Returns the number of output nodes.
    pub fn output_count(&self) -> usize {
        self.phenotype.output_count()
    }

    /// Returns the number of hidden nodes.
    pub fn hidden_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.node_type() == NodeType::Hidden)
            .count()
    }

    /// Returns the highest connection innovation number
    /// in the genome.
    pub fn max_connection_id(&self) -> Option<Innovation> {
        self.connections.iter().map(|c| c.id()).max()
    }

    /// Returns the genetic difference between two genomes.
    ///
    /// Connections are aligned by innovation number. Non-matching
    /// connections at or below the smaller of the two genomes'
    /// highest innovation numbers are disjoint, the rest are
    /// excess. The distance is
    ///
    /// `c_e·E/N + c_d·D/N + c_w·(W̄ + B̄)/2 + c_g·G`
    ///
    /// where `W̄` is the mean absolute weight difference of matching
    /// connections, `B̄` the mean absolute bias difference of nodes
    /// present in both genomes, `G` the fraction of matching
    /// connections gated in either genome whose gaters differ, and
    /// `N` the larger connection count (1 if both are empty).
    ///
    /// Matching values are summed in innovation order, so the
    /// result is symmetric.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut registry = InnovationRegistry::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(3);
    ///
    /// let a = Genome::new(&config, &mut registry, &mut rng);
    /// let b = Genome::new(&config, &mut registry, &mut rng);
    ///
    /// assert_eq!(a.genetic_difference(&a, &config), 0.0);
    /// assert_eq!(a.genetic_difference(&b, &config), b.genetic_difference(&a, &config));
    /// ```
    pub fn genetic_difference(&self, other: &Genome, config: &GeneticConfig) -> f64 {
        let max_shared = match (self.max_connection_id(), other.max_connection_id()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            _ => None,
        };
        let (mut disjoint, mut excess) = (0usize, 0usize);
        let mut count_unmatched = |id: Innovation| match max_shared {
            Some(max) if id <= max => disjoint += 1,
            _ => excess += 1,
        };

        let mut matching = vec![];
        for connection in &self.connections {
            match other.connection(connection.id()) {
                Some(counterpart) => matching.push((connection, counterpart)),
                None => count_unmatched(connection.id()),
            }
        }
        for connection in &other.connections {
            if self.connection(connection.id()).is_none() {
                count_unmatched(connection.id());
            }
        }
        matching.sort_by_key(|(c, _)| c.id());

        let weight_difference = mean(
            matching
                .iter()
                .map(|(a, b)| (a.weight() - b.weight()).abs()),
        );

        let gated = matching
            .iter()
            .filter(|(a, b)| a.gater().is_some() || b.gater().is_some());
        let (gated_count, mismatched_gates) =
            gated.fold((0usize, 0usize), |(count, mismatched), (a, b)| {
                (count + 1, mismatched + usize::from(a.gater() != b.gater()))
            });
        let gate_mismatch = if gated_count == 0 {
            0.0
        } else {
            mismatched_gates as f64 / gated_count as f64
        };

        let mut shared_nodes: Vec<(&Node, &Node)> = self
            .nodes
            .iter()
            .filter_map(|n| other.node(n.id()).map(|m| (n, m)))
            .collect();
        shared_nodes.sort_by_key(|(n, _)| n.id());
        let bias_difference = mean(shared_nodes.iter().map(|(a, b)| (a.bias() - b.bias()).abs()));

        let n = self.connections.len().max(other.connections.len()).max(1) as f64;
        config.excess_coeff * excess as f64 / n
            + config.disjoint_coeff * disjoint as f64 / n
            + config.weight_coeff * (weight_difference + bias_difference) / 2.0
            + config.gates_coeff * gate_mismatch
    }

    pub(crate) fn node_mut(&mut self, id: Innovation) -> Option<&mut Node> {
        let index = *self.node_indices.get(&id)?;
        Some(&mut self.nodes[index])
    }

    pub(crate) fn connection_mut(&mut self, id: Innovation) -> Option<&mut Connection> {
        let index = *self.connection_indices.get(&id)?;
        Some(&mut self.connections[index])
    }

    /// Checks that a node could be inserted.
    pub(crate) fn check_node(&self, node: &Node) -> Result<(), GenomeError> {
        if self.node_indices.contains_key(&node.id()) {
            Err(GenomeError::DuplicateNode(node.id()))
        } else {
            Ok(())
        }
    }

    /// Checks that a connection could be inserted.
    pub(crate) fn check_connection(&self, connection: &Connection) -> Result<(), GenomeError> {
        if self.connection_indices.contains_key(&connection.id()) {
            return Err(GenomeError::DuplicateConnection(connection.id()));
        }
        let referenced = [Some(connection.input()), Some(connection.output()), connection.gater()];
        for node in referenced.into_iter().flatten() {
            if !self.node_indices.contains_key(&node) {
                return Err(GenomeError::DanglingReference {
                    connection: connection.id(),
                    node,
                });
            }
        }
        if let Some(existing) = self.connection_between(connection.input(), connection.output()) {
            return Err(GenomeError::DuplicateEndpoints {
                connection: connection.id(),
                existing: existing.id(),
                input: connection.input(),
                output: connection.output(),
            });
        }
        Ok(())
    }

    /// Appends a node without validation or recompilation.
    pub(crate) fn insert_node(&mut self, node: Node) {
        self.node_indices.insert(node.id(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Appends a connection without validation or recompilation.
    pub(crate) fn insert_connection(&mut self, connection: Connection) {
        self.connection_indices
            .insert(connection.id(), self.connections.len());
        self.connections.push(connection);
    }

    /// Removes every connection matching the predicate,
    /// without recompilation.
    pub(crate) fn remove_connections_where<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&Connection) -> bool,
    {
        self.connections.retain(|c| !predicate(c));
        self.rebuild_indices();
    }

    /// Removes a node without recompilation. Connections
    /// touching it must have been removed beforehand.
    pub(crate) fn remove_node(&mut self, id: Innovation) {
        self.nodes.retain(|n| n.id() != id);
        self.rebuild_indices();
    }

    fn rebuild_indices(&mut self) {
        self.node_indices = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id(), i))
            .collect();
        self.connection_indices = self
            .connections
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id(), i))
            .collect();
    }
}

impl Default for Genome {
    fn default() -> Genome {
        Genome::empty()
    }
}

/// Genomes are equal if their nodes and connections
/// are, in the same order. State is not compared.
impl PartialEq for Genome {
    fn eq(&self, other: &Genome) -> bool {
        self.nodes == other.nodes && self.connections == other.connections
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Genome [")?;
        for node in &self.nodes {
            writeln!(
                f,
                "    node {} ({:?}, {:?}, bias {})",
                node.id(),
                node.node_type(),
                node.activation_function(),
                node.bias()
            )?;
        }
        for c in &self.connections {
            write!(f, "    connection {}: {} -> {} ({})", c.id(), c.input(), c.output(), c.weight())?;
            if let Some(gater) = c.gater() {
                write!(f, " gated by {}", gater)?;
            }
            if !c.enabled() {
                write!(f, " disabled")?;
            }
            writeln!(f)?;
        }
        write!(f, "]")
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
