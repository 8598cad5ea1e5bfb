use crate::genomics::{
    ActivationFunction, Connection, GeneticConfig, Genome, InnovationRegistry, MutationError, Node,
    NodeType,
};
use crate::Innovation;

use ahash::RandomState;
use rand::seq::SliceRandom;
use rand::Rng;

use std::collections::HashMap;

impl Genome {
    /// Applies a round of mutations to the genome.
    ///
    /// With probability `add_node_prob` only a node addition is
    /// attempted; otherwise, with probability `add_connection_prob`,
    /// only a connection addition. If neither happens, every other
    /// mutation is rolled independently against its own probability,
    /// in a fixed order.
    ///
    /// Mutations that cannot be carried out are skipped.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     add_node_prob: 1.0,
    ///     max_mutation_attempts: 10,
    ///     ..GeneticConfig::default()
    /// };
    /// let mut registry = InnovationRegistry::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let mut genome = Genome::new(&config, &mut registry, &mut rng);
    ///
    /// genome.mutate(&mut registry, &config, &mut rng);
    /// assert_eq!(genome.hidden_count(), 1);
    /// ```
    pub fn mutate<R: Rng>(
        &mut self,
        registry: &mut InnovationRegistry,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        if rng.gen::<f64>() < config.add_node_prob {
            log_failure("node addition", self.mutate_add_node(registry, config, rng));
        } else if rng.gen::<f64>() < config.add_connection_prob {
            log_failure(
                "connection addition",
                self.mutate_add_connection(registry, config, rng),
            );
        } else {
            if rng.gen::<f64>() < config.mutate_weights_prob {
                self.mutate_weights(config, 1.0, rng);
            }
            if rng.gen::<f64>() < config.mutate_biases_prob {
                self.mutate_biases(config, rng);
            }
            if rng.gen::<f64>() < config.mutate_toggle_enable_prob {
                log_failure("toggle", self.mutate_toggle_enable(rng));
            }
            if rng.gen::<f64>() < config.mutate_reenable_prob {
                log_failure("re-enable", self.mutate_reenable(rng));
            }
            if rng.gen::<f64>() < config.mutate_remove_connection_prob {
                log_failure("connection removal", self.mutate_remove_connection(rng));
            }
            if rng.gen::<f64>() < config.mutate_remove_node_prob {
                log_failure(
                    "node removal",
                    self.mutate_remove_node(registry, config, rng),
                );
            }
            if rng.gen::<f64>() < config.mutate_add_gate_prob {
                log_failure("gate addition", self.mutate_add_gate(rng));
            }
            if rng.gen::<f64>() < config.mutate_activation_function_prob {
                log_failure(
                    "activation function",
                    self.mutate_activation_function(rng),
                );
            }
        }
    }

    /// Perturbs every connection's weight with probability
    /// `weight_perturb_chance`, by a uniform amount in
    /// `±weight_perturb_value ⨯ modifier`.
    pub fn mutate_weights<R: Rng>(&mut self, config: &GeneticConfig, modifier: f64, rng: &mut R) {
        for connection in self.connections_mut() {
            if rng.gen::<f64>() < config.weight_perturb_chance {
                let perturbation =
                    rng.gen_range(-1.0..=1.0) * config.weight_perturb_value * modifier;
                connection.set_weight(config.bound_value(connection.weight() + perturbation));
            }
        }
        self.create_phenotype();
    }

    /// Perturbs every non-input node's bias with probability
    /// `bias_perturb_chance`, by a uniform amount in
    /// `±bias_perturb_value`.
    pub fn mutate_biases<R: Rng>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for node in self.nodes_mut().filter(|n| !n.is_input()) {
            if rng.gen::<f64>() < config.bias_perturb_chance {
                let perturbation = rng.gen_range(-1.0..=1.0) * config.bias_perturb_value;
                node.set_bias(config.bound_value(node.bias() + perturbation));
            }
        }
        self.create_phenotype();
    }

    /// Connects two distinct, randomly chosen nodes that are
    /// not yet connected in either direction, with a random weight.
    /// Returns the new connection's innovation number.
    ///
    /// # Errors
    /// Returns an error if no such pair is found in
    /// `max_mutation_attempts` attempts.
    pub fn mutate_add_connection<R: Rng>(
        &mut self,
        registry: &mut InnovationRegistry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Innovation, MutationError> {
        let ids: Vec<Innovation> = self.nodes().iter().map(|n| n.id()).collect();
        for _ in 0..config.max_mutation_attempts {
            let (input, output) = match (ids.choose(rng), ids.choose(rng)) {
                (Some(&a), Some(&b)) => (a, b),
                _ => break,
            };
            if input == output || self.are_connected(input, output) {
                continue;
            }

            let weight = config.bound_value(rng.gen_range(-1.0..=1.0));
            let id = registry.assign_connection_id((input, output));
            self.insert_connection(Connection::new(id, input, output, weight));
            self.create_phenotype();
            log::trace!("added connection {}: {} -> {}", id, input, output);
            return Ok(id);
        }
        Err(MutationError::NoNodePairFound {
            attempts: config.max_mutation_attempts,
        })
    }

    /// Splits a random enabled connection that flows forward in the
    /// current activation order. The connection is disabled and a
    /// new hidden node is placed between its endpoints, connected
    /// from the input with weight 1 and to the output with the old
    /// weight. Returns the new node's innovation number.
    ///
    /// The new node's innovation number is derived from the split
    /// connection, so genomes splitting the same connection in the
    /// same generation obtain the same node and connections.
    ///
    /// # Errors
    /// Returns an error if the genome has no connections, or no
    /// eligible connection is found in `max_mutation_attempts` attempts.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig {
    ///     max_mutation_attempts: 10,
    ///     ..GeneticConfig::default()
    /// };
    /// let mut registry = InnovationRegistry::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(4);
    /// let mut genome = Genome::new(&config, &mut registry, &mut rng);
    ///
    /// let node = genome.mutate_add_node(&mut registry, &config, &mut rng).unwrap();
    /// let incoming = genome.connections().iter().find(|c| c.output() == node).unwrap();
    /// assert_eq!(incoming.weight(), 1.0);
    /// let split = genome.connection_between(incoming.input(), genome.connections()
    ///     .iter().find(|c| c.input() == node).unwrap().output()).unwrap();
    /// assert!(!split.enabled());
    /// ```
    pub fn mutate_add_node<R: Rng>(
        &mut self,
        registry: &mut InnovationRegistry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Innovation, MutationError> {
        if self.connections().is_empty() {
            return Err(MutationError::NoEligibleConnection);
        }
        for _ in 0..config.max_mutation_attempts {
            let index = rng.gen_range(0..self.connections().len());
            let split = self.connections()[index].clone();
            if !split.enabled() || !self.flows_forward(&split) {
                continue;
            }

            if let Some(connection) = self.connection_mut(split.id()) {
                connection.set_enabled(false);
            }

            let bias = config.bound_value(rng.gen_range(-1.0..=1.0));
            let activation_function = ActivationFunction::random(rng);
            let mut node_id = registry.assign_node_id(Some(split.id()));
            if self.node(node_id).is_some() {
                // The same connection was split before in this genome.
                node_id = registry.assign_node_id(None);
            }
            self.insert_node(Node::new(node_id, NodeType::Hidden, activation_function, bias));

            let input_id = registry.assign_connection_id((split.input(), node_id));
            self.insert_connection(Connection::new(input_id, split.input(), node_id, 1.0));
            let output_id = registry.assign_connection_id((node_id, split.output()));
            self.insert_connection(Connection::new(
                output_id,
                node_id,
                split.output(),
                split.weight(),
            ));

            self.create_phenotype();
            log::trace!("split connection {} with node {}", split.id(), node_id);
            return Ok(node_id);
        }
        Err(MutationError::NoSplittableConnection {
            attempts: config.max_mutation_attempts,
        })
    }

    /// Removes a random hidden node, rewiring every node that fed it
    /// directly to every node it fed. Existing direct connections are
    /// re-enabled and reused, missing ones are created with random
    /// weights. Gaters of the removed connections are handed to
    /// random rewired connections, one each, never to a connection
    /// the gater is an endpoint of. Connections gated by the removed
    /// node lose their gate. Returns the removed node's innovation
    /// number.
    ///
    /// # Errors
    /// Returns an error if the genome has no hidden nodes.
    pub fn mutate_remove_node<R: Rng>(
        &mut self,
        registry: &mut InnovationRegistry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Innovation, MutationError> {
        let hidden: Vec<Innovation> = self
            .nodes()
            .iter()
            .filter(|n| n.node_type() == NodeType::Hidden)
            .map(|n| n.id())
            .collect();
        let removed = *hidden.choose(rng).ok_or(MutationError::NoEligibleNode)?;

        let mut gaters = vec![];
        let mut sources = vec![];
        let mut targets = vec![];
        for connection in self.connections() {
            if connection.output() == removed && connection.input() != removed {
                sources.push(connection.input());
                gaters.extend(connection.gater());
            }
        }
        for connection in self.connections() {
            if connection.input() == removed && connection.output() != removed {
                targets.push(connection.output());
                gaters.extend(connection.gater());
            }
        }

        let mut rewired = vec![];
        for &source in &sources {
            for &target in &targets {
                match self.connection_between(source, target).map(|c| c.id()) {
                    Some(existing) => {
                        if let Some(connection) = self.connection_mut(existing) {
                            connection.set_enabled(true);
                        }
                        rewired.push(existing);
                    }
                    None => {
                        let weight = config.bound_value(rng.gen_range(-1.0..=1.0));
                        let id = registry.assign_connection_id((source, target));
                        self.insert_connection(Connection::new(id, source, target, weight));
                        rewired.push(id);
                    }
                }
            }
        }

        for gater in gaters {
            if gater == removed {
                continue;
            }
            let eligible: Vec<usize> = (0..rewired.len())
                .filter(|&i| self.connection(rewired[i]).map_or(false, |c| !c.touches(gater)))
                .collect();
            let index = match eligible.choose(rng) {
                Some(&index) => index,
                None => continue,
            };
            let id = rewired.remove(index);
            if let Some(connection) = self.connection_mut(id) {
                connection.set_gater(Some(gater));
            }
        }

        for connection in self.connections_mut() {
            if connection.gater() == Some(removed) {
                connection.set_gater(None);
            }
        }
        self.remove_connections_where(|c| c.touches(removed));
        self.remove_node(removed);
        self.create_phenotype();
        log::trace!("removed node {}", removed);
        Ok(removed)
    }

    /// Removes a random connection whose removal leaves both its
    /// endpoints with other connections (see [`removable_connections`]).
    /// Returns the removed connection's innovation number.
    ///
    /// # Errors
    /// Returns an error if no connection is removable.
    ///
    /// [`removable_connections`]: Genome::removable_connections
    pub fn mutate_remove_connection<R: Rng>(
        &mut self,
        rng: &mut R,
    ) -> Result<Innovation, MutationError> {
        let removed = *self
            .removable_connections()
            .choose(rng)
            .ok_or(MutationError::NoEligibleConnection)?;
        self.remove_connections_where(|c| c.id() == removed);
        self.create_phenotype();
        Ok(removed)
    }

    /// Flips the enabled status of a random connection that is
    /// either removable or currently disabled. Returns the
    /// toggled connection's innovation number.
    ///
    /// # Errors
    /// Returns an error if no connection is eligible.
    pub fn mutate_toggle_enable<R: Rng>(&mut self, rng: &mut R) -> Result<Innovation, MutationError> {
        let mut eligible = self.removable_connections();
        for connection in self.connections() {
            if !connection.enabled() && !eligible.contains(&connection.id()) {
                eligible.push(connection.id());
            }
        }
        let toggled = *eligible
            .choose(rng)
            .ok_or(MutationError::NoEligibleConnection)?;
        if let Some(connection) = self.connection_mut(toggled) {
            connection.toggle_enabled();
        }
        self.create_phenotype();
        Ok(toggled)
    }

    /// Re-enables a random disabled connection. Returns
    /// its innovation number.
    ///
    /// # Errors
    /// Returns an error if no connection is disabled.
    pub fn mutate_reenable<R: Rng>(&mut self, rng: &mut R) -> Result<Innovation, MutationError> {
        let disabled: Vec<Innovation> = self
            .connections()
            .iter()
            .filter(|c| !c.enabled())
            .map(|c| c.id())
            .collect();
        let enabled = *disabled
            .choose(rng)
            .ok_or(MutationError::NoEligibleConnection)?;
        if let Some(connection) = self.connection_mut(enabled) {
            connection.set_enabled(true);
        }
        self.create_phenotype();
        Ok(enabled)
    }

    /// Gates a random connection with a random node that is
    /// not one of its endpoints. Returns the gated connection's
    /// innovation number.
    ///
    /// # Errors
    /// Returns an error if the genome has no connections,
    /// or the chosen connection has no candidate gater.
    pub fn mutate_add_gate<R: Rng>(&mut self, rng: &mut R) -> Result<Innovation, MutationError> {
        let target = self
            .connections()
            .choose(rng)
            .map(|c| (c.id(), c.input(), c.output()))
            .ok_or(MutationError::NoEligibleConnection)?;
        let (id, input, output) = target;
        let candidates: Vec<Innovation> = self
            .nodes()
            .iter()
            .map(|n| n.id())
            .filter(|&n| n != input && n != output)
            .collect();
        let gater = *candidates.choose(rng).ok_or(MutationError::NoEligibleNode)?;
        if let Some(connection) = self.connection_mut(id) {
            connection.set_gater(Some(gater));
        }
        self.create_phenotype();
        Ok(id)
    }

    /// Assigns a random non-input node a different, uniformly
    /// chosen activation function. Returns the node's
    /// innovation number.
    ///
    /// # Errors
    /// Returns an error if the genome has no non-input nodes.
    pub fn mutate_activation_function<R: Rng>(
        &mut self,
        rng: &mut R,
    ) -> Result<Innovation, MutationError> {
        let candidates: Vec<Innovation> = self
            .nodes()
            .iter()
            .filter(|n| !n.is_input())
            .map(|n| n.id())
            .collect();
        let id = *candidates.choose(rng).ok_or(MutationError::NoEligibleNode)?;
        if let Some(node) = self.node_mut(id) {
            let replacement = node.activation_function().random_other(rng);
            node.set_activation_function(replacement);
        }
        self.create_phenotype();
        Ok(id)
    }

    /// Returns the connections that can be disturbed without
    /// stranding a node: those whose input node has more than one
    /// outgoing connection, and whose output node has more than one
    /// incoming connection or is an input node. Only enabled,
    /// non-self-loop connections are counted.
    pub fn removable_connections(&self) -> Vec<Innovation> {
        let mut outgoing: HashMap<Innovation, usize, RandomState> = HashMap::default();
        let mut incoming: HashMap<Innovation, usize, RandomState> = HashMap::default();
        for connection in self
            .connections()
            .iter()
            .filter(|c| c.enabled() && !c.is_self_loop())
        {
            *outgoing.entry(connection.input()).or_default() += 1;
            *incoming.entry(connection.output()).or_default() += 1;
        }
        let count = |map: &HashMap<Innovation, usize, RandomState>, node: Innovation| {
            map.get(&node).copied().unwrap_or(0)
        };
        self.connections()
            .iter()
            .filter(|c| {
                count(&outgoing, c.input()) > 1
                    && (count(&incoming, c.output()) > 1
                        || self.node(c.output()).map_or(false, |n| n.is_input()))
            })
            .map(|c| c.id())
            .collect()
    }

    /// A connection flows forward if its input node precedes its
    /// output node in the current activation order.
    fn flows_forward(&self, connection: &Connection) -> bool {
        match (
            self.phenotype().index_of(connection.input()),
            self.phenotype().index_of(connection.output()),
        ) {
            (Some(from), Some(to)) => from < to,
            _ => false,
        }
    }

    fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    fn connections_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.iter_mut()
    }
}

fn log_failure<T>(mutation: &str, result: Result<T, MutationError>) {
    if let Err(e) = result {
        log::trace!("{} mutation skipped: {}", mutation, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            max_mutation_attempts: 1000,
            min_val: -10.0,
            max_val: 10.0,
            ..GeneticConfig::zero()
        }
    }

    fn setup(seed: u64) -> (GeneticConfig, InnovationRegistry, ChaCha8Rng, Genome) {
        let config = config();
        let mut registry = InnovationRegistry::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let genome = Genome::new(&config, &mut registry, &mut rng);
        (config, registry, rng, genome)
    }

    fn assert_consistent(genome: &Genome) {
        for c in genome.connections() {
            assert!(genome.node(c.input()).is_some());
            assert!(genome.node(c.output()).is_some());
            if let Some(g) = c.gater() {
                assert!(genome.node(g).is_some());
            }
        }
        assert_eq!(genome.phenotype().len(), genome.nodes().len());
        assert_eq!(genome.activations().len(), genome.nodes().len());
    }

    #[test]
    fn mutate_is_deterministic() {
        let config = GeneticConfig {
            max_mutation_attempts: 100,
            mutate_remove_node_prob: 0.3,
            mutate_add_gate_prob: 0.3,
            ..GeneticConfig::default()
        };
        let run = || {
            let mut registry = InnovationRegistry::new(&config);
            let mut rng = ChaCha8Rng::seed_from_u64(99);
            let mut genome = Genome::new(&config, &mut registry, &mut rng);
            for _ in 0..200 {
                genome.mutate(&mut registry, &config, &mut rng);
            }
            genome
        };
        let (a, b) = (run(), run());
        assert_eq!(a, b);
        assert_eq!(a.phenotype(), b.phenotype());
        assert_consistent(&a);
    }

    #[test]
    fn mutate_weights_reset_stays_bounded() {
        let (mut config, _, mut rng, mut genome) = setup(1);
        config.weight_perturb_chance = 1.0;
        config.weight_perturb_value = 100.0;
        for _ in 0..20 {
            genome.mutate_weights(&config, 1.0, &mut rng);
            for c in genome.connections() {
                assert!(c.weight() >= config.min_val && c.weight() <= config.max_val);
                assert_eq!(c.weight(), config.bound_value(c.weight()));
            }
        }
    }

    #[test]
    fn mutate_biases_skips_inputs() {
        let (mut config, _, mut rng, mut genome) = setup(2);
        config.bias_perturb_chance = 1.0;
        config.bias_perturb_value = 1.0;
        let before = genome.clone();
        genome.mutate_biases(&config, &mut rng);
        for (old, new) in before.nodes().iter().zip(genome.nodes()) {
            if old.is_input() {
                assert_eq!(old.bias(), new.bias());
            }
        }
        assert_ne!(before, genome);
    }

    #[test]
    fn add_connection_connects_unconnected_pair() {
        let (config, mut registry, mut rng, mut genome) = setup(3);
        let id = genome
            .mutate_add_connection(&mut registry, &config, &mut rng)
            .unwrap();
        let connection = genome.connection(id).unwrap();
        assert_ne!(connection.input(), connection.output());
        assert_eq!(genome.connections().len(), 3);
        assert_consistent(&genome);
    }

    #[test]
    fn add_connection_fails_on_fully_connected_genome() {
        let (config, mut registry, mut rng, mut genome) = setup(4);
        // Inputs 0 and 1 are the only unconnected pair.
        genome
            .add_connection(Connection::new(registry.assign_connection_id((0, 1)), 0, 1, 1.0))
            .unwrap();
        assert_eq!(
            genome.mutate_add_connection(&mut registry, &config, &mut rng),
            Err(MutationError::NoNodePairFound { attempts: 1000 })
        );
    }

    #[test]
    fn add_node_splits_connection() {
        let (config, mut registry, mut rng, mut genome) = setup(5);
        let weights: Vec<(Innovation, f64)> =
            genome.connections().iter().map(|c| (c.id(), c.weight())).collect();
        let node = genome
            .mutate_add_node(&mut registry, &config, &mut rng)
            .unwrap();

        let split = genome.connections().iter().find(|c| !c.enabled()).unwrap();
        let old_weight = weights.iter().find(|(id, _)| *id == split.id()).unwrap().1;
        let incoming = genome.connection_between(split.input(), node).unwrap();
        let outgoing = genome.connection_between(node, split.output()).unwrap();
        assert_eq!(incoming.weight(), 1.0);
        assert_eq!(outgoing.weight(), old_weight);
        assert!(incoming.enabled() && outgoing.enabled());

        let hidden = genome.node(node).unwrap();
        assert_eq!(hidden.node_type(), NodeType::Hidden);
        assert!(hidden.bias().abs() <= 1.0);
        assert_consistent(&genome);
    }

    #[test]
    fn same_split_yields_same_innovations() {
        let (config, mut registry, _, genome) = setup(6);
        let mut first = genome.clone();
        let mut second = genome;

        // Same random stream, so both genomes pick the same connection.
        let a = first
            .mutate_add_node(&mut registry, &config, &mut ChaCha8Rng::seed_from_u64(10))
            .unwrap();
        let b = second
            .mutate_add_node(&mut registry, &config, &mut ChaCha8Rng::seed_from_u64(10))
            .unwrap();
        assert_eq!(a, b);
        let ids = |g: &Genome| g.connections().iter().map(|c| c.id()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));

        // After the generation boundary the split is new again.
        registry.clear();
        let mut third = Genome::new(&config, &mut registry, &mut ChaCha8Rng::seed_from_u64(6));
        let c = third
            .mutate_add_node(&mut registry, &config, &mut ChaCha8Rng::seed_from_u64(10))
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn repeated_split_in_same_genome_gets_fresh_node() {
        let (config, mut registry, mut rng, mut genome) = setup(7);
        // Only connection 0 can be split.
        genome.connection_mut(1).unwrap().set_enabled(false);
        genome.create_phenotype();
        let first = genome
            .mutate_add_node(&mut registry, &config, &mut rng)
            .unwrap();

        // Undo the split but keep the node, then split again.
        genome.remove_connections_where(|c| c.touches(first));
        genome.remove_node(first);
        genome.connection_mut(0).unwrap().set_enabled(true);
        genome.insert_node(Node::new(first, NodeType::Hidden, ActivationFunction::Relu, 0.0));
        genome.create_phenotype();
        let second = genome
            .mutate_add_node(&mut registry, &config, &mut rng)
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(genome.hidden_count(), 2);
        assert!(genome.connection_between(0, second).is_some());
        assert_consistent(&genome);
    }

    #[test]
    fn add_node_ignores_disabled_and_backward_connections() {
        let (config, mut registry, mut rng, mut genome) = setup(8);
        for id in 0..2 {
            genome.connection_mut(id).unwrap().set_enabled(false);
        }
        genome.create_phenotype();
        assert_eq!(
            genome.mutate_add_node(&mut registry, &config, &mut rng),
            Err(MutationError::NoSplittableConnection { attempts: 1000 })
        );
        assert_eq!(
            Genome::empty().mutate_add_node(&mut registry, &config, &mut rng),
            Err(MutationError::NoEligibleConnection)
        );
    }

    #[test]
    fn remove_node_rewires_and_redistributes_gaters() {
        let (config, mut registry, mut rng, _) = setup(9);
        let mut genome = Genome::empty();
        for (id, node_type) in [
            (0, NodeType::Input),
            (1, NodeType::Input),
            (2, NodeType::Output),
            (5, NodeType::Hidden),
        ] {
            genome.insert_node(Node::new(id, node_type, ActivationFunction::Identity, 0.0));
        }
        // 0 -> 5 (gated by 1), 1 -> 5, 5 -> 2, 2 -> 0 gated by 5,
        // and an existing, disabled 0 -> 2.
        genome.insert_connection(Connection::new(10, 0, 5, 1.0).with_gater(Some(1)));
        genome.insert_connection(Connection::new(11, 1, 5, 1.0));
        genome.insert_connection(Connection::new(12, 5, 2, 1.0));
        genome.insert_connection(Connection::new(13, 2, 0, 1.0).with_gater(Some(5)));
        genome.insert_connection(Connection::new(0, 0, 2, 0.25).with_enabled(false));
        genome.create_phenotype();

        assert_eq!(
            genome.mutate_remove_node(&mut registry, &config, &mut rng),
            Ok(5)
        );
        assert!(genome.node(5).is_none());
        assert!(genome.connections().iter().all(|c| !c.touches(5)));

        let reused = genome.connection(0).unwrap();
        assert!(reused.enabled());
        assert_eq!(reused.weight(), 0.25);
        let created = genome.connection_between(1, 2).unwrap();
        assert!(created.enabled());

        // One gater, two rewired connections, but 1 -> 2 starts at the gater.
        let gated: Vec<_> = genome
            .connections()
            .iter()
            .filter(|c| c.gater() == Some(1))
            .map(|c| c.id())
            .collect();
        assert_eq!(gated, vec![0]);
        assert_eq!(genome.connection(13).unwrap().gater(), None);
        assert_consistent(&genome);
    }

    #[test]
    fn remove_node_never_gates_with_an_endpoint() {
        for seed in 0..20 {
            let (config, mut registry, mut rng, _) = setup(seed);
            let mut genome = Genome::empty();
            for (id, node_type) in [
                (0, NodeType::Input),
                (1, NodeType::Input),
                (2, NodeType::Output),
                (5, NodeType::Hidden),
            ] {
                genome.insert_node(Node::new(id, node_type, ActivationFunction::Identity, 0.0));
            }
            // Both gaters end up as endpoints of the only rewired connection 0 -> 2.
            genome.insert_connection(Connection::new(10, 0, 5, 1.0).with_gater(Some(2)));
            genome.insert_connection(Connection::new(11, 5, 2, 1.0).with_gater(Some(0)));
            genome.insert_connection(Connection::new(12, 1, 2, 1.0));
            genome.create_phenotype();

            assert_eq!(
                genome.mutate_remove_node(&mut registry, &config, &mut rng),
                Ok(5)
            );
            let rewired = genome.connection_between(0, 2).unwrap();
            assert_eq!(rewired.gater(), None);
            for c in genome.connections() {
                if let Some(gater) = c.gater() {
                    assert!(!c.touches(gater));
                }
            }
            assert_consistent(&genome);
        }
    }

    #[test]
    fn remove_node_requires_hidden_nodes() {
        let (config, mut registry, mut rng, mut genome) = setup(10);
        assert_eq!(
            genome.mutate_remove_node(&mut registry, &config, &mut rng),
            Err(MutationError::NoEligibleNode)
        );
    }

    #[test]
    fn removable_connections_never_strand_nodes() {
        let (_, _, mut rng, mut genome) = setup(11);
        // Two inputs feeding a single output: each input has a
        // single outgoing connection, so nothing is removable.
        assert!(genome.removable_connections().is_empty());
        assert_eq!(
            genome.mutate_remove_connection(&mut rng),
            Err(MutationError::NoEligibleConnection)
        );

        genome.insert_node(Node::new(3, NodeType::Output, ActivationFunction::Identity, 0.0));
        genome.insert_connection(Connection::new(20, 0, 3, 1.0));
        genome.insert_connection(Connection::new(21, 1, 3, 1.0));
        genome.create_phenotype();
        let mut removable = genome.removable_connections();
        removable.sort_unstable();
        assert_eq!(removable, vec![0, 1, 20, 21]);

        let removed = genome.mutate_remove_connection(&mut rng).unwrap();
        assert!(genome.connection(removed).is_none());
        assert!(genome.removable_connections().len() < 4);
    }

    #[test]
    fn toggle_includes_disabled_connections() {
        let (_, _, mut rng, mut genome) = setup(12);
        genome.connection_mut(0).unwrap().set_enabled(false);
        genome.create_phenotype();
        assert_eq!(genome.mutate_toggle_enable(&mut rng), Ok(0));
        assert!(genome.connection(0).unwrap().enabled());
    }

    #[test]
    fn reenable_requires_disabled_connection() {
        let (_, _, mut rng, mut genome) = setup(13);
        assert_eq!(
            genome.mutate_reenable(&mut rng),
            Err(MutationError::NoEligibleConnection)
        );
        genome.connection_mut(1).unwrap().set_enabled(false);
        assert_eq!(genome.mutate_reenable(&mut rng), Ok(1));
        assert!(genome.connections().iter().all(|c| c.enabled()));
    }

    #[test]
    fn gate_is_never_an_endpoint() {
        let (_, _, mut rng, mut genome) = setup(14);
        for _ in 0..20 {
            let id = genome.mutate_add_gate(&mut rng).unwrap();
            let c = genome.connection(id).unwrap();
            let gater = c.gater().unwrap();
            assert!(!c.touches(gater));
        }
        let mut pair = Genome::empty();
        pair.insert_node(Node::new(0, NodeType::Input, ActivationFunction::Identity, 0.0));
        pair.insert_node(Node::new(1, NodeType::Output, ActivationFunction::Identity, 0.0));
        pair.insert_connection(Connection::new(0, 0, 1, 1.0));
        pair.create_phenotype();
        assert_eq!(pair.mutate_add_gate(&mut rng), Err(MutationError::NoEligibleNode));
    }

    #[test]
    fn activation_function_changes_on_non_input_node() {
        let (_, _, mut rng, mut genome) = setup(15);
        let before = genome.node(2).unwrap().activation_function();
        assert_eq!(genome.mutate_activation_function(&mut rng), Ok(2));
        assert_ne!(genome.node(2).unwrap().activation_function(), before);
    }

    #[test]
    fn exclusive_structural_mutations() {
        let (mut config, mut registry, mut rng, mut genome) = setup(16);
        config.add_node_prob = 1.0;
        config.mutate_weights_prob = 1.0;
        config.weight_perturb_chance = 1.0;
        config.weight_perturb_value = 1.0;
        let weights: Vec<f64> = genome.connections().iter().map(|c| c.weight()).collect();
        genome.mutate(&mut registry, &config, &mut rng);
        assert_eq!(genome.hidden_count(), 1);
        // Weights of the original connections are untouched.
        for (c, w) in genome.connections().iter().zip(weights) {
            assert_eq!(c.weight(), w);
        }
    }
}
