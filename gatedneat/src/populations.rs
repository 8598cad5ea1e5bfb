//! A Population is a collection of organisms.
//! These are grouped into species by genetic
//! difference, and evolved generation by generation
//! from externally assigned fitness scores.
mod config;
mod errors;
pub mod logging;
mod offspring_factory;
mod species;

pub use config::PopulationConfig;
pub use errors::PopulationError;
pub use species::{Species, SpeciesID};

use crate::genomics::{GeneticConfig, Genome, InnovationRegistry};
use crate::Organism;
use logging::Stats;
use offspring_factory::OffspringFactory;

use ahash::RandomState;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// A population of organisms.
///
/// Species are tracked through _representatives_: one
/// member of each species, picked at random among its
/// survivors every generation, against which organisms
/// are compared during speciation. The compatibility
/// threshold is adjusted every generation to steer the
/// number of species towards a target count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population {
    organisms: Vec<Organism>,
    species_reps: Vec<Organism>,
    species_ids: Vec<SpeciesID>,
    next_species_id: usize,
    species_compat_thresh: f64,
    generation: usize,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a new population of `population_size` organisms,
    /// each with a fresh genome mutated `initial_mutations`
    /// times, and speciates it.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, InnovationRegistry};
    /// use gatedneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let genetic_config = GeneticConfig::default();
    /// let mut registry = InnovationRegistry::new(&genetic_config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    ///
    /// let population = Population::new(
    ///     PopulationConfig {
    ///         population_size: NonZeroUsize::new(25).unwrap(),
    ///         ..PopulationConfig::default()
    ///     },
    ///     genetic_config,
    ///     &mut registry,
    ///     &mut rng,
    /// );
    /// assert_eq!(population.organisms().len(), 25);
    /// assert!(population.organisms().iter().all(|o| o.species().is_some()));
    /// ```
    pub fn new<R: Rng>(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Population {
        let organisms = (0..population_config.population_size.get())
            .map(|_| {
                let mut genome = Genome::new(&genetic_config, registry, rng);
                for _ in 0..genetic_config.initial_mutations {
                    genome.mutate(registry, &genetic_config, rng);
                }
                Organism::new(genome, registry)
            })
            .collect();
        Population::with_organisms(organisms, population_config, genetic_config)
    }

    /// Creates a population from existing genomes, such as
    /// hand-built structures loaded from disk, and speciates it.
    ///
    /// Every genome is [adopted] by the registry first. The
    /// genomes fill the population in order, cycling through
    /// them if there are fewer than `population_size`, and
    /// repeated copies are mutated `initial_mutations` times.
    /// Genomes beyond `population_size` are dropped.
    ///
    /// # Errors
    /// Returns [`PopulationError::Empty`] if `genomes` is empty and
    /// [`PopulationError::GenomeShape`] if a genome's input or output
    /// count differs from the configured one.
    ///
    /// [adopted]: InnovationRegistry::adopt
    pub fn from_genomes<R: Rng>(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        mut genomes: Vec<Genome>,
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Result<Population, PopulationError> {
        if genomes.is_empty() {
            return Err(PopulationError::Empty);
        }
        let (expected_inputs, expected_outputs) = (
            genetic_config.input_count.get(),
            genetic_config.output_count.get(),
        );
        for (index, genome) in genomes.iter().enumerate() {
            if genome.input_count() != expected_inputs || genome.output_count() != expected_outputs {
                return Err(PopulationError::GenomeShape {
                    index,
                    inputs: genome.input_count(),
                    outputs: genome.output_count(),
                    expected_inputs,
                    expected_outputs,
                });
            }
        }

        let size = population_config.population_size.get();
        if genomes.len() > size {
            log::warn!(
                "Dropping {} of {} genomes to fit a population of {}",
                genomes.len() - size,
                genomes.len(),
                size
            );
            genomes.truncate(size);
        }
        for genome in &genomes {
            registry.adopt(genome);
        }

        let organisms = (0..size)
            .map(|i| {
                let mut genome = genomes[i % genomes.len()].clone();
                if i >= genomes.len() {
                    for _ in 0..genetic_config.initial_mutations {
                        genome.mutate(registry, &genetic_config, rng);
                    }
                }
                Organism::new(genome, registry)
            })
            .collect();
        Ok(Population::with_organisms(
            organisms,
            population_config,
            genetic_config,
        ))
    }

    fn with_organisms(
        organisms: Vec<Organism>,
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
    ) -> Population {
        let mut population = Population {
            organisms,
            species_reps: vec![],
            species_ids: vec![],
            next_species_id: 0,
            species_compat_thresh: population_config.species_compat_thresh_initial,
            generation: 0,
            population_config,
            genetic_config,
        };
        population.speciate();
        population
    }

    /// Assigns every organism to the first species whose
    /// representative is within the compatibility threshold,
    /// founding a new species (with the organism as its
    /// representative) if there is none.
    ///
    /// Afterwards, species without members are forgotten and
    /// the threshold is moved one step towards the target
    /// species count, never going below the step itself.
    pub fn speciate(&mut self) {
        let config = &self.genetic_config;
        let threshold = self.species_compat_thresh;
        for organism in &mut self.organisms {
            let compatible = self
                .species_reps
                .iter()
                .find(|rep| organism.genome().genetic_difference(rep.genome(), config) <= threshold)
                .and_then(|rep| rep.species());
            match compatible {
                Some(species) => organism.set_species(Some(species)),
                None => {
                    let species = SpeciesID(self.next_species_id);
                    self.next_species_id += 1;
                    organism.set_species(Some(species));
                    self.species_reps.push(organism.clone());
                }
            }
        }

        self.species_ids.clear();
        for organism in &self.organisms {
            if let Some(species) = organism.species() {
                if !self.species_ids.contains(&species) {
                    self.species_ids.push(species);
                }
            }
        }
        let live = &self.species_ids;
        self.species_reps
            .retain(|rep| rep.species().map_or(false, |s| live.contains(&s)));

        let step = self.population_config.species_compat_modifier;
        let target = self.population_config.species_count_target;
        let count = self.species_ids.len();
        if count < target {
            self.species_compat_thresh -= step;
        } else if count > target {
            self.species_compat_thresh += step;
        }
        self.species_compat_thresh = self.species_compat_thresh.max(step);
        log::debug!(
            "{} species, compatibility threshold now {:.2}",
            count,
            self.species_compat_thresh
        );
    }

    /// Replaces the population with the next generation.
    ///
    /// Every species is culled to its top performers, which
    /// become the parents of the new generation and from
    /// which the next representatives are picked. The new
    /// generation consists of fresh organisms, mutated asexual
    /// copies (not exact clones) of the population's best
    /// organism, an unmodified clone of every species champion,
    /// and offspring of each species in proportion to its average
    /// fitness. Mates may be drawn from other species' champions
    /// or from `seeds`, which are usually another population's
    /// champions.
    ///
    /// `seeds` must have been created through the same `registry`
    /// as this population, so that equal innovation numbers
    /// denote equal structures.
    ///
    /// Organisms not yet assigned to a species are speciated
    /// first. The new generation has exactly `population_size`
    /// members, is not speciated, and the registry's memoised
    /// innovations are cleared.
    ///
    /// # Errors
    /// Returns an error if the population is empty.
    pub fn select_and_reproduce<R: Rng>(
        &mut self,
        seeds: &[Organism],
        registry: &mut InnovationRegistry,
        rng: &mut R,
    ) -> Result<(), PopulationError> {
        let superchamp = self.get_superchamp().cloned().ok_or(PopulationError::Empty)?;
        if self.organisms.iter().any(|o| o.species().is_none()) {
            self.speciate();
        }
        let fitness = Stats::from(self.organisms.iter().map(|o| o.fitness()));

        let species = self.cull_species();
        self.species_reps = species
            .iter()
            .filter_map(|s| s.members().choose(rng).cloned())
            .collect();

        let offspring = OffspringFactory::new(
            &species,
            seeds,
            registry,
            &self.genetic_config,
            &self.population_config,
        )
        .generate_offspring(&superchamp, &fitness, rng);

        self.organisms = offspring;
        self.generation += 1;
        registry.clear();
        log::debug!(
            "generation {}: {} organisms from {} species",
            self.generation,
            self.organisms.len(),
            species.len()
        );
        Ok(())
    }

    /// Splits the population into its species,
    /// culled down to their survivors.
    fn cull_species(&mut self) -> Vec<Species> {
        let mut members: HashMap<SpeciesID, Vec<Organism>, RandomState> = HashMap::default();
        for organism in self.organisms.drain(..) {
            if let Some(species) = organism.species() {
                members.entry(species).or_default().push(organism);
            }
        }
        let elite_percentage = self.population_config.species_elite_percentage;
        self.species_ids
            .iter()
            .filter_map(|&id| {
                members
                    .remove(&id)
                    .and_then(|m| Species::cull(id, m, elite_percentage))
            })
            .collect()
    }

    /// Picks the challengers other organisms are evaluated
    /// against: the best species champions, random members
    /// of the hall of fame, and random distinct organisms
    /// if those do not add up to the configured counts.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, InnovationRegistry};
    /// use gatedneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let genetic_config = GeneticConfig::default();
    /// let mut registry = InnovationRegistry::new(&genetic_config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let population = Population::new(
    ///     PopulationConfig {
    ///         population_size: NonZeroUsize::new(30).unwrap(),
    ///         ..PopulationConfig::default()
    ///     },
    ///     genetic_config,
    ///     &mut registry,
    ///     &mut rng,
    /// );
    ///
    /// // 4 champion and 8 hall of fame challengers by default.
    /// let challengers = population.select_challengers(&[], &mut rng);
    /// assert_eq!(challengers.len(), 12);
    /// ```
    pub fn select_challengers<R: Rng>(&self, hall_of_fame: &[Organism], rng: &mut R) -> Vec<Organism> {
        let config = &self.population_config;
        let mut challengers: Vec<Organism> = self
            .get_n_diff_species_champs(config.num_champion_parasites)
            .into_iter()
            .cloned()
            .collect();

        for _ in 0..config.num_hall_of_fame_parasites.min(hall_of_fame.len()) {
            if let Some(member) = hall_of_fame.choose(rng) {
                challengers.push(member.clone());
            }
        }

        let wanted = config.num_champion_parasites + config.num_hall_of_fame_parasites;
        if challengers.len() < wanted {
            let mut candidates: Vec<&Organism> = self
                .organisms
                .iter()
                .filter(|o| challengers.iter().all(|c| c.id() != o.id()))
                .collect();
            candidates.shuffle(rng);
            let missing = wanted - challengers.len();
            challengers.extend(candidates.into_iter().take(missing).cloned());
        }
        challengers
    }

    /// Returns the best organism of the population. The
    /// first one found wins ties.
    pub fn get_superchamp(&self) -> Option<&Organism> {
        self.organisms
            .iter()
            .reduce(|best, o| if o.fitness() > best.fitness() { o } else { best })
    }

    /// Returns the `n` best members of a species,
    /// fittest first.
    pub fn get_species_top_n(&self, species: SpeciesID, n: usize) -> Vec<&Organism> {
        let mut members: Vec<&Organism> = self.species_members(species).collect();
        members.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        members.truncate(n);
        members
    }

    /// Returns the champions of the `n` best species,
    /// fittest first.
    pub fn get_n_diff_species_champs(&self, n: usize) -> Vec<&Organism> {
        let mut champions: Vec<&Organism> = self
            .species_ids
            .iter()
            .filter_map(|&id| self.get_species_top_n(id, 1).pop())
            .collect();
        champions.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        champions.truncate(n);
        champions
    }

    /// Returns an iterator over the members of a species.
    pub fn species_members(&self, species: SpeciesID) -> impl Iterator<Item = &Organism> {
        self.organisms
            .iter()
            .filter(move |o| o.species() == Some(species))
    }

    /// Returns the current organisms.
    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    /// Returns the current organisms mutably,
    /// for evaluation and fitness assignment.
    pub fn organisms_mut(&mut self) -> &mut [Organism] {
        &mut self.organisms
    }

    /// Returns the IDs of the species found
    /// by the last speciation.
    pub fn species_ids(&self) -> &[SpeciesID] {
        &self.species_ids
    }

    /// Returns the current species representatives.
    pub fn species_reps(&self) -> &[Organism] {
        &self.species_reps
    }

    /// Returns the current compatibility threshold.
    pub fn species_compat_thresh(&self) -> f64 {
        self.species_compat_thresh
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    /// Returns the configuration of the population's genomes.
    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GenomeRecord;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn genetic_config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            max_mutation_attempts: 50,
            initial_mutations: 5,
            ..GeneticConfig::default()
        }
    }

    fn population_config(size: usize) -> PopulationConfig {
        PopulationConfig {
            population_size: NonZeroUsize::new(size).unwrap(),
            ..PopulationConfig::default()
        }
    }

    fn setup(size: usize, seed: u64) -> (Population, InnovationRegistry, ChaCha8Rng) {
        let genetic_config = genetic_config();
        let mut registry = InnovationRegistry::new(&genetic_config);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let population = Population::new(
            population_config(size),
            genetic_config,
            &mut registry,
            &mut rng,
        );
        (population, registry, rng)
    }

    fn assign_random_fitness(population: &mut Population, rng: &mut ChaCha8Rng) {
        for organism in population.organisms_mut() {
            organism.set_fitness(rng.gen_range(-5.0..10.0));
        }
    }

    fn assert_speciation_coverage(population: &Population) {
        for organism in population.organisms() {
            let species = organism.species().unwrap();
            assert!(population.species_ids().contains(&species));
        }
        for &id in population.species_ids() {
            assert!(population.species_members(id).count() >= 1);
            assert_eq!(
                population.species_ids().iter().filter(|&&s| s == id).count(),
                1
            );
        }
        for rep in population.species_reps() {
            assert!(population.species_ids().contains(&rep.species().unwrap()));
        }
    }

    #[test]
    fn new_population_is_speciated() {
        let (population, ..) = setup(40, 0);
        assert_eq!(population.organisms().len(), 40);
        assert_eq!(population.generation(), 0);
        assert_speciation_coverage(&population);
    }

    #[test]
    fn population_size_is_exact_every_generation() {
        for size in [1, 3, 17, 60] {
            let (mut population, mut registry, mut rng) = setup(size, size as u64);
            for _ in 0..5 {
                assign_random_fitness(&mut population, &mut rng);
                population
                    .select_and_reproduce(&[], &mut registry, &mut rng)
                    .unwrap();
                assert_eq!(population.organisms().len(), size);
                population.speciate();
                assert_speciation_coverage(&population);
            }
            assert_eq!(population.generation(), 5);
        }
    }

    #[test]
    fn evolution_is_deterministic() {
        let run = || {
            let (mut population, mut registry, mut rng) = setup(30, 7);
            for _ in 0..3 {
                assign_random_fitness(&mut population, &mut rng);
                population
                    .select_and_reproduce(&[], &mut registry, &mut rng)
                    .unwrap();
                population.speciate();
            }
            population
        };
        let (a, b) = (run(), run());
        let summary = |p: &Population| -> Vec<_> {
            p.organisms()
                .iter()
                .map(|o| (o.id(), o.species(), o.genome().clone()))
                .collect()
        };
        assert_eq!(summary(&a), summary(&b));
        assert_eq!(a.species_compat_thresh(), b.species_compat_thresh());
    }

    #[test]
    fn threshold_moves_towards_target_and_is_floored() {
        let (mut population, ..) = setup(10, 1);
        population.population_config.species_count_target = 1000;
        population.population_config.species_compat_modifier = 0.5;
        for _ in 0..50 {
            population.speciate();
        }
        assert_eq!(population.species_compat_thresh(), 0.5);

        population.population_config.species_count_target = 0;
        let before = population.species_compat_thresh();
        population.speciate();
        assert_eq!(population.species_compat_thresh(), before + 0.5);
    }

    #[test]
    fn empty_population_cannot_reproduce() {
        let (mut population, mut registry, mut rng) = setup(5, 2);
        population.organisms.clear();
        assert_eq!(
            population.select_and_reproduce(&[], &mut registry, &mut rng),
            Err(PopulationError::Empty)
        );
    }

    #[test]
    fn superchamp_far_ahead_takes_over() {
        let (mut population, mut registry, mut rng) = setup(40, 3);
        population.population_config.fresh_organisms = 0;
        population.population_config.superchamp_takeover_fraction = 0.5;
        for organism in population.organisms_mut() {
            organism.set_fitness(1.0);
        }
        population.organisms_mut()[7].set_fitness(1000.0);
        let champion = population.organisms()[7].id();
        assert_eq!(population.get_superchamp().unwrap().id(), champion);

        population
            .select_and_reproduce(&[], &mut registry, &mut rng)
            .unwrap();
        let lineage = population
            .organisms()
            .iter()
            .filter(|o| o.fitness() == 1000.0)
            .count();
        assert!(lineage >= 20);
        assert!(population.organisms().iter().any(|o| o.id() == champion));
    }

    #[test]
    fn queries_are_sorted_by_fitness() {
        let (mut population, _, mut rng) = setup(30, 4);
        assign_random_fitness(&mut population, &mut rng);
        let best = population.get_superchamp().unwrap().fitness();
        assert!(population.organisms().iter().all(|o| o.fitness() <= best));

        for &id in population.species_ids() {
            let top = population.get_species_top_n(id, 3);
            assert!(!top.is_empty() && top.len() <= 3);
            assert!(top.windows(2).all(|w| w[0].fitness() >= w[1].fitness()));
            assert!(top.iter().all(|o| o.species() == Some(id)));
        }

        let champs = population.get_n_diff_species_champs(2);
        assert_eq!(champs.len(), population.species_ids().len().min(2));
        assert_eq!(champs[0].fitness(), best);
    }

    #[test]
    fn challengers_are_bounded_and_distinct() {
        let (population, _, mut rng) = setup(5, 5);
        let challengers = population.select_challengers(&[], &mut rng);
        assert_eq!(challengers.len(), 5);
        let mut ids: Vec<_> = challengers.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);

        let (other, _, _) = setup(10, 6);
        let hall_of_fame: Vec<Organism> = other.organisms()[..3].to_vec();
        let challengers = population.select_challengers(&hall_of_fame, &mut rng);
        let champions = population.get_n_diff_species_champs(4);
        assert!(challengers.len() >= champions.len() + 3);
        assert!(challengers.len() <= 12);
        for (challenger, champion) in challengers.iter().zip(&champions) {
            assert_eq!(challenger.id(), champion.id());
        }
    }

    fn seed_genome(hidden_bias: f64) -> Genome {
        let record: GenomeRecord = serde_json::from_str(&format!(
            r#"{{
                "nodes": [
                    {{"node_id": 0, "node_type": "input", "activation_function": "identity", "bias": 0.0}},
                    {{"node_id": 1, "node_type": "input", "activation_function": "identity", "bias": 0.0}},
                    {{"node_id": 2, "node_type": "input", "activation_function": "identity", "bias": 0.0}},
                    {{"node_id": 3, "node_type": "output", "activation_function": "tanh", "bias": 0.0}},
                    {{"node_id": 4, "node_type": "output", "activation_function": "tanh", "bias": 0.0}},
                    {{"node_id": 40, "node_type": "hidden", "activation_function": "relu", "bias": {}}}
                ],
                "connections": [
                    {{"connection_id": 0, "weight": 1.0, "input_node": 0, "gater_node": null, "output_node": 40, "is_enabled": true}},
                    {{"connection_id": 1, "weight": 1.0, "input_node": 1, "gater_node": 0, "output_node": 40, "is_enabled": true}},
                    {{"connection_id": 30, "weight": 1.0, "input_node": 40, "gater_node": null, "output_node": 3, "is_enabled": true}},
                    {{"connection_id": 31, "weight": 1.0, "input_node": 2, "gater_node": null, "output_node": 4, "is_enabled": true}}
                ]
            }}"#,
            hidden_bias
        ))
        .unwrap();
        Genome::try_from(record).unwrap()
    }

    #[test]
    fn population_from_genomes() {
        let genetic_config = genetic_config();
        let mut registry = InnovationRegistry::new(&genetic_config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let genomes = vec![seed_genome(0.1), seed_genome(-0.3), seed_genome(0.7)];

        let mut population = Population::from_genomes(
            population_config(11),
            genetic_config,
            genomes.clone(),
            &mut registry,
            &mut rng,
        )
        .unwrap();
        assert_eq!(population.organisms().len(), 11);
        for (organism, genome) in population.organisms().iter().zip(&genomes) {
            assert_eq!(organism.genome(), genome);
        }
        assert!(population.organisms()[3..]
            .iter()
            .any(|o| genomes.iter().all(|g| o.genome() != g)));
        assert!(registry.max_node_id().unwrap() >= 40);
        assert!(registry.max_connection_id().unwrap() >= 31);
        assert_speciation_coverage(&population);

        for _ in 0..5 {
            assign_random_fitness(&mut population, &mut rng);
            population
                .select_and_reproduce(&[], &mut registry, &mut rng)
                .unwrap();
            assert_eq!(population.organisms().len(), 11);
            assert_speciation_coverage(&population);
        }
        // Adopted numbers keep meaning the adopted structure.
        for organism in population.organisms() {
            for connection in organism.genome().connections() {
                match connection.id() {
                    0 => assert_eq!(connection.endpoints(), (0, 40)),
                    1 => assert_eq!(connection.endpoints(), (1, 40)),
                    30 => assert_eq!(connection.endpoints(), (40, 3)),
                    31 => assert_eq!(connection.endpoints(), (2, 4)),
                    _ => {}
                }
            }
            let record = GenomeRecord::from(organism.genome());
            assert_eq!(Genome::try_from(record).as_ref(), Ok(organism.genome()));
        }
    }

    #[test]
    fn population_from_genomes_errors() {
        let genetic_config = genetic_config();
        let mut registry = InnovationRegistry::new(&genetic_config);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            Population::from_genomes(
                population_config(5),
                genetic_config.clone(),
                vec![],
                &mut registry,
                &mut rng,
            )
            .err(),
            Some(PopulationError::Empty)
        );

        let narrow = GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            ..genetic_config.clone()
        };
        let genomes = vec![
            seed_genome(0.0),
            Genome::new(&narrow, &mut InnovationRegistry::new(&narrow), &mut rng),
        ];
        assert_eq!(
            Population::from_genomes(
                population_config(5),
                genetic_config,
                genomes,
                &mut registry,
                &mut rng,
            )
            .err(),
            Some(PopulationError::GenomeShape {
                index: 1,
                inputs: 2,
                outputs: 2,
                expected_inputs: 3,
                expected_outputs: 2,
            })
        );
    }

    #[test]
    fn mating_with_seeds() {
        let genetic_config = genetic_config();
        let mut registry = InnovationRegistry::new(&genetic_config);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut population = Population::new(
            PopulationConfig {
                mutate_only_prob: 0.0,
                mate_only_prob: 1.0,
                cross_species_mating_prob: 0.0,
                cross_population_mating_prob: 1.0,
                ..population_config(20)
            },
            genetic_config.clone(),
            &mut registry,
            &mut rng,
        );
        let host_max = registry.max_connection_id().unwrap();
        let other = Population::new(
            population_config(10),
            genetic_config.clone(),
            &mut registry,
            &mut rng,
        );

        // Seeds carry connections the hosts have never seen,
        // and always win crossover.
        registry.clear();
        let mut seeds: Vec<Organism> = other.get_n_diff_species_champs(3).into_iter().cloned().collect();
        for seed in &mut seeds {
            seed.genome_mut()
                .mutate_add_node(&mut registry, &genetic_config, &mut rng)
                .unwrap();
            seed.set_fitness(1000.0);
        }
        let seed_max = registry.max_connection_id().unwrap();
        let seed_only = |id: usize| id > host_max && id <= seed_max;
        assert!(seeds
            .iter()
            .all(|s| s.genome().connections().iter().any(|c| seed_only(c.id()))));
        registry.clear();

        assign_random_fitness(&mut population, &mut rng);
        population
            .select_and_reproduce(&seeds, &mut registry, &mut rng)
            .unwrap();
        assert_eq!(population.organisms().len(), 20);

        assert!(population
            .organisms()
            .iter()
            .any(|o| o.genome().connections().iter().any(|c| seed_only(c.id()))));
        for organism in population.organisms() {
            let record = GenomeRecord::from(organism.genome());
            assert_eq!(Genome::try_from(record).as_ref(), Ok(organism.genome()));
        }
    }
}
