//! Organisms wrap a genome with the bookkeeping
//! evolution needs: identity, fitness and species.
use crate::genomics::{Connection, GeneticConfig, Genome, InnovationRegistry, Node};
use crate::populations::SpeciesID;
use crate::{Innovation, OrganismId};

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::fmt;

/// An individual of a population.
///
/// Cloning an organism keeps its ID, so clones
/// refer to the same individual; offspring
/// are always given a fresh ID.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Organism {
    id: OrganismId,
    genome: Genome,
    fitness: f64,
    species: Option<SpeciesID>,
}

/// How the values of matching genes are combined
/// during crossover. Chosen once per mating.
#[derive(Clone, Copy, Debug)]
enum GeneSelection {
    /// Average both values, rounded to three decimals.
    Average,
    /// Pick either value with equal probability.
    Pick,
}

impl GeneSelection {
    fn select<R: Rng>(self, a: f64, b: f64, rng: &mut R) -> f64 {
        match self {
            GeneSelection::Average => ((a + b) / 2.0 * 1000.0).round() / 1000.0,
            GeneSelection::Pick => {
                if rng.gen::<f64>() < 0.5 {
                    a
                } else {
                    b
                }
            }
        }
    }
}

impl Organism {
    /// Creates a new organism with a fresh ID drawn from
    /// the registry, zero fitness and no species.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use gatedneat::Organism;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut registry = InnovationRegistry::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    ///
    /// let a = Organism::new(Genome::new(&config, &mut registry, &mut rng), &mut registry);
    /// let b = Organism::new(Genome::new(&config, &mut registry, &mut rng), &mut registry);
    /// assert_ne!(a.id(), b.id());
    /// assert_eq!(a.species(), None);
    /// ```
    pub fn new(genome: Genome, registry: &mut InnovationRegistry) -> Organism {
        Organism::with_id(registry.next_organism_id(), genome)
    }

    /// Creates an organism with a known ID, e.g. one
    /// loaded from storage.
    pub fn with_id(id: OrganismId, genome: Genome) -> Organism {
        Organism {
            id,
            genome,
            fitness: 0.0,
            species: None,
        }
    }

    /// Returns the organism's ID.
    pub fn id(&self) -> OrganismId {
        self.id
    }

    /// Returns the organism's genome.
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Returns the organism's genome mutably, for activation.
    pub fn genome_mut(&mut self) -> &mut Genome {
        &mut self.genome
    }

    /// Returns the organism's fitness.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Sets the organism's fitness.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Returns the species the organism was last assigned to.
    pub fn species(&self) -> Option<SpeciesID> {
        self.species
    }

    pub(crate) fn set_species(&mut self, species: Option<SpeciesID>) {
        self.species = species;
    }

    /// Generates an offspring.
    ///
    /// Without a co-parent, the offspring is a mutated clone of
    /// this organism. Otherwise the offspring is the multipoint
    /// crossover of both parents, and is not mutated. In both
    /// cases the offspring receives a fresh ID and inherits the
    /// fitness of its fitter parent as a placeholder.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use gatedneat::Organism;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut registry = InnovationRegistry::new(&config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(1);
    ///
    /// let mut parent = Organism::new(Genome::new(&config, &mut registry, &mut rng), &mut registry);
    /// parent.set_fitness(3.0);
    /// let mut co_parent = Organism::new(Genome::new(&config, &mut registry, &mut rng), &mut registry);
    /// co_parent.set_fitness(7.0);
    ///
    /// let child = parent.reproduce(Some(&co_parent), &mut registry, &config, &mut rng);
    /// assert_eq!(child.fitness(), 7.0);
    /// assert_ne!(child.id(), parent.id());
    /// ```
    pub fn reproduce<R: Rng>(
        &self,
        co_parent: Option<&Organism>,
        registry: &mut InnovationRegistry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Organism {
        match co_parent {
            None => {
                let mut genome = self.genome.clone();
                genome.mutate(registry, config, rng);
                let mut offspring = Organism::new(genome, registry);
                offspring.fitness = self.fitness;
                offspring
            }
            Some(co_parent) => {
                let selection = if rng.gen::<f64>() < config.mate_avg_genes_prob {
                    GeneSelection::Average
                } else {
                    GeneSelection::Pick
                };
                let self_is_fitter = self.is_fitter_than(co_parent, rng);
                let genome = self.mate_multipoint(co_parent, self_is_fitter, selection, config, rng);
                let mut offspring = Organism::new(genome, registry);
                offspring.fitness = if self_is_fitter {
                    self.fitness
                } else {
                    co_parent.fitness
                };
                offspring
            }
        }
    }

    /// Exact ties, and incomparable fitnesses, are
    /// broken at random.
    fn is_fitter_than<R: Rng>(&self, other: &Organism, rng: &mut R) -> bool {
        match self.fitness.partial_cmp(&other.fitness) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Less) => false,
            _ => rng.gen(),
        }
    }

    /// Multipoint crossover. Nodes and unmatched connections are
    /// inherited from the fitter parent only. Matching genes combine
    /// both parents' values per `selection`.
    fn mate_multipoint<R: Rng>(
        &self,
        co_parent: &Organism,
        self_is_fitter: bool,
        selection: GeneSelection,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Genome {
        let (fitter, other) = if self_is_fitter {
            (&self.genome, &co_parent.genome)
        } else {
            (&co_parent.genome, &self.genome)
        };
        let mut offspring = Genome::empty();

        for node in fitter.nodes() {
            let bias = match other.node(node.id()) {
                Some(counterpart) => selection.select(node.bias(), counterpart.bias(), rng),
                None => node.bias(),
            };
            offspring.insert_node(Node::new(
                node.id(),
                node.node_type(),
                node.activation_function(),
                bias,
            ));
        }

        let mut matching = vec![];
        for connection in self.genome.connections() {
            let counterpart = match co_parent.genome.connection(connection.id()) {
                Some(c) => c,
                None => continue,
            };
            matching.push(connection.id());

            let weight = selection.select(connection.weight(), counterpart.weight(), rng);
            let mut enabled = connection.enabled() || counterpart.enabled();
            if !enabled && rng.gen::<f64>() >= config.inherit_disable_chance {
                enabled = true;
            }
            let gater = inherit_gater(&offspring, connection.gater(), counterpart.gater(), rng);

            offspring.insert_connection(
                Connection::new(connection.id(), connection.input(), connection.output(), weight)
                    .with_gater(gater)
                    .with_enabled(enabled),
            );
        }

        for connection in fitter.connections() {
            if !matching.contains(&connection.id()) {
                offspring.insert_connection(connection.clone());
            }
        }

        offspring.create_phenotype();
        offspring
    }
}

/// Picks the gater of a matching connection. A gater
/// is only inherited if its node made it into the offspring.
fn inherit_gater<R: Rng>(
    offspring: &Genome,
    a: Option<Innovation>,
    b: Option<Innovation>,
    rng: &mut R,
) -> Option<Innovation> {
    let present = |gater: Option<Innovation>| gater.filter(|&g| offspring.node(g).is_some());
    match (present(a), present(b)) {
        (Some(a), Some(b)) => Some(if rng.gen::<bool>() { a } else { b }),
        (Some(g), None) | (None, Some(g)) => Some(g),
        (None, None) => None,
    }
}

impl fmt::Display for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Organism #{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationFunction, NodeType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn node(id: Innovation, node_type: NodeType, bias: f64) -> Node {
        Node::new(id, node_type, ActivationFunction::Identity, bias)
    }

    fn config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            ..GeneticConfig::zero()
        }
    }

    /// Parents sharing inputs 0, 1 and output 2, plus
    /// a hidden node of their own.
    fn parents() -> (Organism, Organism) {
        let mut a = Genome::empty();
        a.insert_node(node(0, NodeType::Input, 0.0));
        a.insert_node(node(1, NodeType::Input, 0.0));
        a.insert_node(node(2, NodeType::Output, 0.2));
        a.insert_node(node(3, NodeType::Hidden, 0.5));
        a.insert_connection(Connection::new(0, 0, 2, 1.0));
        a.insert_connection(Connection::new(1, 1, 2, 1.0).with_gater(Some(3)));
        a.insert_connection(Connection::new(5, 0, 3, 0.5));
        a.create_phenotype();

        let mut b = Genome::empty();
        b.insert_node(node(0, NodeType::Input, 0.0));
        b.insert_node(node(1, NodeType::Input, 0.0));
        b.insert_node(node(2, NodeType::Output, 0.4));
        b.insert_node(node(4, NodeType::Hidden, -0.5));
        b.insert_connection(Connection::new(0, 0, 2, 2.0).with_enabled(false));
        b.insert_connection(Connection::new(1, 1, 2, 3.0).with_gater(Some(4)));
        b.insert_connection(Connection::new(6, 4, 2, 0.5));
        b.insert_connection(Connection::new(7, 1, 4, 0.5));
        b.create_phenotype();

        (Organism::with_id(1, a), Organism::with_id(2, b))
    }

    #[test]
    fn asexual_offspring_is_mutated_clone() {
        let config = GeneticConfig {
            add_node_prob: 1.0,
            max_mutation_attempts: 10,
            ..config()
        };
        let mut registry = InnovationRegistry::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut parent = Organism::new(Genome::new(&config, &mut registry, &mut rng), &mut registry);
        parent.set_fitness(4.5);
        parent.set_species(Some(SpeciesID(3)));

        let child = parent.reproduce(None, &mut registry, &config, &mut rng);
        assert_ne!(child.id(), parent.id());
        assert_eq!(child.fitness(), 4.5);
        assert_eq!(child.species(), None);
        assert_eq!(child.genome().hidden_count(), 1);
        assert_eq!(parent.genome().hidden_count(), 0);
    }

    #[test]
    fn clone_keeps_identity() {
        let (a, _) = parents();
        let clone = a.clone();
        assert_eq!(clone.id(), a.id());
        assert_eq!(clone.genome(), a.genome());
    }

    #[test]
    fn crossover_takes_structure_from_fitter_parent() {
        let (mut a, mut b) = parents();
        a.set_fitness(1.0);
        b.set_fitness(2.0);
        let config = config();
        let mut registry = InnovationRegistry::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let child = a.reproduce(Some(&b), &mut registry, &config, &mut rng);
        let ids: Vec<Innovation> = child.genome().nodes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 4]);
        // Matching connections in the caller's order, then the fitter's excess.
        let ids: Vec<Innovation> = child.genome().connections().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![0, 1, 6, 7]);
        // Gater 3 did not make it into the offspring.
        assert_eq!(child.genome().connection(1).unwrap().gater(), Some(4));
        assert_eq!(child.fitness(), 2.0);
    }

    #[test]
    fn averaged_genes() {
        let (mut a, b) = parents();
        a.set_fitness(10.0);
        let config = GeneticConfig {
            mate_avg_genes_prob: 1.0,
            ..config()
        };
        let mut registry = InnovationRegistry::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        let child = a.reproduce(Some(&b), &mut registry, &config, &mut rng);
        let genome = child.genome();
        assert_eq!(genome.connection(0).unwrap().weight(), 1.5);
        assert_eq!(genome.connection(1).unwrap().weight(), 2.0);
        assert!((genome.node(2).unwrap().bias() - 0.3).abs() < 1e-12);
        // Enabled in one parent.
        assert!(genome.connection(0).unwrap().enabled());
        // Both gaters may be inherited, only 3 is present.
        assert_eq!(genome.connection(1).unwrap().gater(), Some(3));
        assert_eq!(genome.connection(5).unwrap().weight(), 0.5);
        assert!(genome.node(4).is_none());
    }

    #[test]
    fn picked_genes_come_from_either_parent() {
        let (mut a, b) = parents();
        a.set_fitness(10.0);
        let config = config();
        let mut registry = InnovationRegistry::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let child = a.reproduce(Some(&b), &mut registry, &config, &mut rng);
            let weight = child.genome().connection(1).unwrap().weight();
            assert!(weight == 1.0 || weight == 3.0);
        }
    }

    #[test]
    fn disabled_in_both_parents_mostly_stays_disabled() {
        let (mut a, mut b) = parents();
        a.genome_mut().connection_mut(0).unwrap().set_enabled(false);
        a.genome_mut().create_phenotype();
        a.set_fitness(1.0);
        b.set_fitness(0.0);

        let mut registry = InnovationRegistry::new(&config());
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let always_disable = GeneticConfig {
            inherit_disable_chance: 1.0,
            ..config()
        };
        let child = a.reproduce(Some(&b), &mut registry, &always_disable, &mut rng);
        assert!(!child.genome().connection(0).unwrap().enabled());

        let never_disable = GeneticConfig {
            inherit_disable_chance: 0.0,
            ..config()
        };
        let child = a.reproduce(Some(&b), &mut registry, &never_disable, &mut rng);
        assert!(child.genome().connection(0).unwrap().enabled());
    }

    #[test]
    fn offspring_stays_consistent_after_evolution() {
        let config = GeneticConfig {
            add_node_prob: 0.3,
            add_connection_prob: 0.3,
            mutate_add_gate_prob: 0.5,
            mutate_remove_node_prob: 0.2,
            mutate_weights_prob: 0.5,
            weight_perturb_chance: 0.5,
            weight_perturb_value: 1.0,
            mate_avg_genes_prob: 0.5,
            max_mutation_attempts: 50,
            ..config()
        };
        let mut registry = InnovationRegistry::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut pool: Vec<Organism> = (0..6)
            .map(|_| Organism::new(Genome::new(&config, &mut registry, &mut rng), &mut registry))
            .collect();

        for round in 0..30 {
            let (i, j) = (round % pool.len(), (round * 7 + 3) % pool.len());
            let child = if i == j {
                pool[i].reproduce(None, &mut registry, &config, &mut rng)
            } else {
                pool[i].reproduce(Some(&pool[j]), &mut registry, &config, &mut rng)
            };
            let mut child = child.reproduce(None, &mut registry, &config, &mut rng);
            child.set_fitness(rng.gen());
            for c in child.genome().connections() {
                assert!(child.genome().node(c.input()).is_some());
                assert!(child.genome().node(c.output()).is_some());
                if let Some(g) = c.gater() {
                    assert!(child.genome().node(g).is_some());
                }
            }
            assert_eq!(child.genome_mut().activate(&[0.5, 0.5], 3, true).map(|o| o.len()).unwrap_or(1), 1);
            pool[i] = child;
            if round % 10 == 9 {
                registry.clear();
            }
        }
    }
}
