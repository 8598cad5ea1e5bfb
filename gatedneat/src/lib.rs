//! Recurrent, gated NeuroEvolution of Augmenting Topologies,
//! built for competitive (host/parasite) co-evolution.
//!
//! Genomes are NEAT-style lists of nodes and connections, where
//! any connection may be _gated_ by a third node whose activation
//! scales the signal it carries. Networks are allowed arbitrary
//! cycles and are activated by a fixed number of sweeps over
//! a precomputed node order, each node integrating its previous
//! value with its incoming signals.
//!
//! All structural innovations are numbered through an explicitly
//! passed [`InnovationRegistry`], and all randomness is drawn from
//! a caller-supplied [`rand::Rng`], so evolutionary runs are
//! reproducible from a seed.
//!
//! # Example usage: a population evolving towards a constant output
//! ```
//! use gatedneat::genomics::{GeneticConfig, InnovationRegistry};
//! use gatedneat::{Population, PopulationConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::num::NonZeroUsize;
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     initial_mutations: 2,
//!     ..GeneticConfig::default()
//! };
//! let population_config = PopulationConfig {
//!     population_size: NonZeroUsize::new(30).unwrap(),
//!     ..PopulationConfig::default()
//! };
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut registry = InnovationRegistry::new(&genetic_config);
//! let mut population =
//!     Population::new(population_config, genetic_config, &mut registry, &mut rng);
//!
//! for _ in 0..3 {
//!     for organism in population.organisms_mut() {
//!         let output = organism
//!             .genome_mut()
//!             .activate(&[1.0, 0.0], 3, true)
//!             .map(|o| o[0])
//!             .unwrap_or(f64::NAN);
//!         let fitness = if output.is_nan() { 0.0 } else { 1.0 / (1.0 + (output - 0.5).abs()) };
//!         organism.set_fitness(fitness);
//!     }
//!     population.select_and_reproduce(&[], &mut registry, &mut rng).unwrap();
//!     population.speciate();
//! }
//!
//! assert_eq!(population.organisms().len(), 30);
//! assert_eq!(population.generation(), 3);
//! ```
pub mod genomics;
pub mod organisms;
pub mod populations;

pub use genomics::{Genome, InnovationRegistry};
pub use organisms::Organism;
pub use populations::logging;
pub use populations::{Population, PopulationConfig, PopulationError, SpeciesID};

/// Innovation numbers identify nodes and connections
/// across every genome in an evolutionary run.
pub type Innovation = usize;

/// Identifier of an organism, unique within a run.
pub type OrganismId = usize;
