use crate::genomics::{GeneticConfig, Genome};
use crate::{Innovation, OrganismId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};
use std::collections::HashSet;

/// An `InnovationRegistry` keeps track of node and connection
/// innovations in an evolutionary run, in order to make sure
/// identical mutations are assigned the same innovation numbers.
///
/// For connection innovations the input and output nodes are used
/// to identify identical mutations. For node innovations the split
/// connection is used.
///
/// Memoised mutations are only remembered until the next call
/// to [`clear`], which is meant to happen once per generation.
/// Counters are never reset, so an innovation number is never
/// handed out for two different structures.
///
/// Genomes built elsewhere, such as hand-made structures loaded
/// from disk, must be [`adopt`]ed before they are mutated.
///
/// [`adopt`]: InnovationRegistry::adopt
/// [`clear`]: InnovationRegistry::clear
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationRegistry {
    input_count: usize,
    output_count: usize,
    next_node_id: Innovation,
    next_connection_id: Innovation,
    next_organism_id: OrganismId,
    node_ids: HashMap<Innovation, Innovation, RandomState>,
    connection_ids: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    #[serde(default)]
    adopted: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    #[serde(default)]
    adopted_ids: HashSet<Innovation, RandomState>,
}

impl InnovationRegistry {
    /// Creates a new registry for genomes generated with
    /// the specified configuration.
    ///
    /// Input nodes have innovation numbers `0..input_count`
    /// and output nodes follow them. A connection between
    /// input `i` and the output with index `o` always has the
    /// innovation number `o + i ⨯ output_count`, so the first
    /// number handed out for new connections is
    /// `input_count ⨯ output_count`.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, InnovationRegistry};
    ///
    /// let registry = InnovationRegistry::new(&GeneticConfig::default());
    /// assert_eq!(registry.max_node_id(), Some(4));
    /// assert_eq!(registry.max_connection_id(), Some(5));
    /// ```
    pub fn new(config: &GeneticConfig) -> InnovationRegistry {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        InnovationRegistry {
            input_count,
            output_count,
            next_node_id: input_count + output_count,
            next_connection_id: input_count * output_count,
            next_organism_id: 0,
            node_ids: HashMap::default(),
            connection_ids: HashMap::default(),
            adopted: HashMap::default(),
            adopted_ids: HashSet::default(),
        }
    }

    /// Records the innovations of a genome that was not built
    /// through this registry.
    ///
    /// Counters move past the genome's highest node and connection
    /// innovation numbers. Its connections are remembered permanently
    /// unless they match the initial numbering. An initial number the
    /// genome uses for another node pair is never handed out for its
    /// input-output pair, which gets a permanent replacement instead.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    ///
    /// let json = r#"{
    ///     "nodes": [
    ///         {"node_id": 0, "node_type": "input", "activation_function": "identity", "bias": 0.0},
    ///         {"node_id": 1, "node_type": "output", "activation_function": "tanh", "bias": 0.0},
    ///         {"node_id": 7, "node_type": "hidden", "activation_function": "relu", "bias": 0.1}
    ///     ],
    ///     "connections": [
    ///         {"connection_id": 0, "weight": 0.5, "input_node": 0, "gater_node": null,
    ///          "output_node": 7, "is_enabled": true},
    ///         {"connection_id": 9, "weight": 0.5, "input_node": 7, "gater_node": null,
    ///          "output_node": 1, "is_enabled": true}
    ///     ]
    /// }"#;
    /// let genome: Genome = serde_json::from_str(json).unwrap();
    ///
    /// let mut registry = InnovationRegistry::new(&GeneticConfig::zero());
    /// registry.adopt(&genome);
    /// assert_eq!(registry.assign_connection_id((0, 7)), 0);
    /// // 0 is taken, so the input-output pair gets a fresh number.
    /// assert_eq!(registry.assign_connection_id((0, 1)), 10);
    /// assert_eq!(registry.assign_node_id(None), 8);
    /// ```
    pub fn adopt(&mut self, genome: &Genome) {
        for node in genome.nodes() {
            self.next_node_id = self.next_node_id.max(node.id() + 1);
        }
        for connection in genome.connections() {
            let id = connection.id();
            self.next_connection_id = self.next_connection_id.max(id + 1);
            if self.initial_connection_id(connection.endpoints()) != Some(id) {
                self.adopted.entry(connection.endpoints()).or_insert(id);
                self.adopted_ids.insert(id);
            }
        }
    }

    /// Returns a new organism ID. Organism IDs are never reused.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, InnovationRegistry};
    ///
    /// let mut registry = InnovationRegistry::new(&GeneticConfig::zero());
    /// assert_eq!(registry.next_organism_id(), 0);
    /// assert_eq!(registry.next_organism_id(), 1);
    /// ```
    pub fn next_organism_id(&mut self) -> OrganismId {
        let id = self.next_organism_id;
        self.next_organism_id += 1;
        id
    }

    /// Returns the node innovation number for a split of the
    /// `source` connection. The same split within the current
    /// window yields the same number. `None` always allocates
    /// a fresh number.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, InnovationRegistry};
    ///
    /// let mut registry = InnovationRegistry::new(&GeneticConfig::zero());
    /// let split = registry.assign_node_id(Some(0));
    /// assert_eq!(registry.assign_node_id(Some(0)), split);
    /// assert_ne!(registry.assign_node_id(None), split);
    ///
    /// registry.clear();
    /// assert_ne!(registry.assign_node_id(Some(0)), split);
    /// ```
    pub fn assign_node_id(&mut self, source: Option<Innovation>) -> Innovation {
        match source {
            None => self.allocate_node_id(),
            Some(connection) => {
                if let Some(&id) = self.node_ids.get(&connection) {
                    id
                } else {
                    let id = self.allocate_node_id();
                    self.node_ids.insert(connection, id);
                    id
                }
            }
        }
    }

    /// Returns the connection innovation number for the
    /// `(input, output)` node pair. The same pair within the
    /// current window yields the same number. Pairs between an
    /// input and an output node yield their permanent initial
    /// number, and pairs from adopted genomes their adopted one.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, InnovationRegistry};
    ///
    /// let mut registry = InnovationRegistry::new(&GeneticConfig::default());
    /// // Input 1 to the first output (node 2).
    /// assert_eq!(registry.assign_connection_id((1, 2)), 3);
    ///
    /// let new = registry.assign_connection_id((2, 3));
    /// assert_eq!(new, 6);
    /// assert_eq!(registry.assign_connection_id((2, 3)), new);
    /// assert_ne!(registry.assign_connection_id((3, 2)), new);
    /// ```
    pub fn assign_connection_id(&mut self, connection: (Innovation, Innovation)) -> Innovation {
        if let Some(&id) = self.adopted.get(&connection) {
            return id;
        }
        if let Some(id) = self.initial_connection_id(connection) {
            if !self.adopted_ids.contains(&id) {
                return id;
            }
            // Displaced initial numbers are replaced permanently.
            let id = self.next_connection_id;
            self.next_connection_id += 1;
            self.adopted.insert(connection, id);
            self.adopted_ids.insert(id);
            return id;
        }
        match self.connection_ids.entry(connection) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = self.next_connection_id;
                self.next_connection_id += 1;
                *entry.insert(id)
            }
        }
    }

    /// Returns the permanent innovation number of an
    /// input-to-output connection, or `None` if the pair
    /// is not one.
    pub fn initial_connection_id(&self, (input, output): (Innovation, Innovation)) -> Option<Innovation> {
        let outputs = self.input_count..self.input_count + self.output_count;
        if input < self.input_count && outputs.contains(&output) {
            Some(output - self.input_count + input * self.output_count)
        } else {
            None
        }
    }

    /// Clears the registry's memoised mutations, but keeps
    /// its innovation number counts.
    pub fn clear(&mut self) {
        self.node_ids.clear();
        self.connection_ids.clear();
    }

    /// Returns the highest node innovation number generated.
    pub fn max_node_id(&self) -> Option<Innovation> {
        self.next_node_id.checked_sub(1)
    }

    /// Returns the highest connection innovation number generated.
    pub fn max_connection_id(&self) -> Option<Innovation> {
        self.next_connection_id.checked_sub(1)
    }

    /// Returns the number of mutations remembered
    /// in the current window, as `(nodes, connections)`.
    pub fn window_len(&self) -> (usize, usize) {
        (self.node_ids.len(), self.connection_ids.len())
    }

    fn allocate_node_id(&mut self) -> Innovation {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }
}
