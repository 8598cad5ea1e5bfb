use super::logging::Stats;
use super::*;

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating the next
/// generation from a population's culled species,
/// according to the specified configs.
pub(super) struct OffspringFactory<'a> {
    species: &'a [Species],
    seeds: &'a [Organism],
    registry: &'a mut InnovationRegistry,
    genetic_config: &'a GeneticConfig,
    population_config: &'a PopulationConfig,
}

impl<'a> OffspringFactory<'a> {
    pub(super) fn new(
        species: &'a [Species],
        seeds: &'a [Organism],
        registry: &'a mut InnovationRegistry,
        genetic_config: &'a GeneticConfig,
        population_config: &'a PopulationConfig,
    ) -> OffspringFactory<'a> {
        OffspringFactory {
            species,
            seeds,
            registry,
            genetic_config,
            population_config,
        }
    }

    /// Generates exactly `population_size` organisms: fresh
    /// organisms, the super-champion's lineage, a clone of every
    /// species champion, and the offspring allotted to each species.
    pub(super) fn generate_offspring<R: Rng>(
        &mut self,
        superchamp: &Organism,
        population_fitness: &Stats,
        rng: &mut R,
    ) -> Vec<Organism> {
        let size = self.population_config.population_size.get();
        let mut offspring = Vec::with_capacity(size);

        self.add_fresh_organisms(&mut offspring, rng);
        self.add_superchamp_lineage(&mut offspring, superchamp, population_fitness, rng);
        offspring.extend(self.species.iter().map(|s| s.champion().clone()));

        let remaining = size.saturating_sub(offspring.len());
        let allotted_offspring = allot_offspring(self.species, remaining);
        for (species_index, &allotted) in allotted_offspring.iter().enumerate() {
            for _ in 0..allotted {
                let child = self.species_offspring(species_index, rng);
                offspring.push(child);
            }
        }

        self.fill_shortfall(&mut offspring, size, rng);
        offspring.truncate(size);
        offspring
    }

    /// Adds brand new organisms, each mutated
    /// a random number of times.
    fn add_fresh_organisms<R: Rng>(&mut self, offspring: &mut Vec<Organism>, rng: &mut R) {
        let min = self.population_config.fresh_min_mutations;
        let max = self.population_config.fresh_max_mutations.max(min);
        for _ in 0..self.population_config.fresh_organisms {
            let mut genome = Genome::new(self.genetic_config, self.registry, rng);
            for _ in 0..rng.gen_range(min..=max) {
                genome.mutate(self.registry, self.genetic_config, rng);
            }
            offspring.push(Organism::new(genome, self.registry));
        }
    }

    /// Adds the asexual offspring of the population's best organism:
    /// copies of its genome that are each mutated once, not exact
    /// clones. A best organism far ahead of the rest of the
    /// population is given a much larger share of them.
    fn add_superchamp_lineage<R: Rng>(
        &mut self,
        offspring: &mut Vec<Organism>,
        superchamp: &Organism,
        population_fitness: &Stats,
        rng: &mut R,
    ) {
        let config = self.population_config;
        let mut count = config.superchamp_offspring;
        if population_fitness.std_dev > 0.0 {
            let zscore = (superchamp.fitness() - population_fitness.mean) / population_fitness.std_dev;
            if zscore > config.superchamp_zscore_threshold {
                let takeover = (config.population_size.get() as f64
                    * config.superchamp_takeover_fraction)
                    .ceil() as usize;
                count = count.max(takeover);
                log::info!(
                    "{} is {:.2} standard deviations ahead, granting {} offspring",
                    superchamp,
                    zscore,
                    count
                );
            }
        }
        for _ in 0..count {
            offspring.push(superchamp.reproduce(None, self.registry, self.genetic_config, rng));
        }
    }

    /// Produces a single offspring from a random survivor
    /// of the species.
    fn species_offspring<R: Rng>(&mut self, species_index: usize, rng: &mut R) -> Organism {
        let species = self.species;
        let members = species[species_index].members();
        let parent = &members[rng.gen_range(0..members.len())];

        if rng.gen::<f64>() < self.population_config.mutate_only_prob {
            return parent.reproduce(None, self.registry, self.genetic_config, rng);
        }

        let co_parent = self.pick_co_parent(species_index, rng);
        let mut child = parent.reproduce(Some(co_parent), self.registry, self.genetic_config, rng);
        if rng.gen::<f64>() >= self.population_config.mate_only_prob {
            child
                .genome_mut()
                .mutate(self.registry, self.genetic_config, rng);
        }
        child
    }

    /// Picks a mate from another species' champions, the
    /// other population's seeds, or the same species.
    fn pick_co_parent<R: Rng>(&self, species_index: usize, rng: &mut R) -> &'a Organism {
        let species = self.species;
        let config = self.population_config;

        if species.len() > 1 && rng.gen::<f64>() < config.cross_species_mating_prob {
            let mut other = rng.gen_range(0..species.len() - 1);
            if other >= species_index {
                other += 1;
            }
            return species[other].champion();
        }
        let seeds = self.seeds;
        if !seeds.is_empty() && rng.gen::<f64>() < config.cross_population_mating_prob {
            return &seeds[rng.gen_range(0..seeds.len())];
        }
        let members = species[species_index].members();
        &members[rng.gen_range(0..members.len())]
    }

    /// Tops the generation up with asexual offspring of the
    /// fittest survivors, in order of decreasing fitness.
    fn fill_shortfall<R: Rng>(&mut self, offspring: &mut Vec<Organism>, size: usize, rng: &mut R) {
        if offspring.len() >= size {
            return;
        }
        let species = self.species;
        let mut survivors: Vec<&Organism> = species.iter().flat_map(|s| s.members()).collect();
        survivors.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        for parent in survivors.iter().cycle().take(size - offspring.len()) {
            offspring.push(parent.reproduce(None, self.registry, self.genetic_config, rng));
        }
    }
}

/// Distributes `count` offspring across species proportionally
/// to their average fitness, with at least one per species.
/// Fitnesses are shifted to be non-negative, and species share
/// equally if they all have the same fitness.
///
/// The result may exceed `count` when there are more
/// species than offspring.
pub(super) fn allot_offspring(species: &[Species], count: usize) -> Vec<usize> {
    if species.is_empty() {
        return vec![];
    }
    let fitnesses: Vec<f64> = species.iter().map(|s| s.average_fitness()).collect();
    let lowest = fitnesses.iter().copied().fold(f64::INFINITY, f64::min);
    let shifted: Vec<f64> = fitnesses.iter().map(|f| f - lowest.min(0.0)).collect();
    let total: f64 = shifted.iter().sum();

    let shares: Vec<f64> = if total > 0.0 && total.is_finite() {
        shifted.iter().map(|f| f / total * count as f64).collect()
    } else {
        vec![count as f64 / species.len() as f64; species.len()]
    };
    round_retain_sum(&shares)
        .into_iter()
        .map(|n| n.max(1))
        .collect()
}

/// Rounds all values to positive whole numbers
/// while preserving their order and sum, assuming it is also whole.
/// Rounding is done in the manner that minimizes
/// the average error to the original set of values.
pub(super) fn round_retain_sum(values: &[f64]) -> Vec<usize> {
    let total_sum = values.iter().sum::<f64>().round() as usize;
    let mut truncated: Vec<(usize, usize, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.floor();
            let e = f - u;
            (i, u as usize, e)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder = total_sum.saturating_sub(truncated_sum).min(truncated.len());
    // Sort in decreasing order of error
    truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (_, u, _) in &mut truncated[..remainder] {
        *u += 1;
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}
