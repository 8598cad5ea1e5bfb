use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation,
/// speciation and reproduction.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub population_size: NonZeroUsize,
    /// Initial genetic difference threshold, beyond which
    /// organisms are considered as belonging to
    /// different species.
    pub species_compat_thresh_initial: f64,
    /// Amount by which the threshold is adjusted each
    /// generation. Also the threshold's lower bound.
    pub species_compat_modifier: f64,
    /// Number of species the threshold adjustment steers towards.
    pub species_count_target: usize,
    /// Top % of each species which survives to reproduce.
    /// Species with two or more members always keep two.
    pub species_elite_percentage: f64,
    /// Number of offspring of the population's best organism.
    pub superchamp_offspring: usize,
    /// Fitness z-score above which the best organism is
    /// considered to be far ahead of the rest of the population.
    pub superchamp_zscore_threshold: f64,
    /// Fraction of the population given to the offspring of
    /// a best organism above the z-score threshold.
    pub superchamp_takeover_fraction: f64,
    /// Number of brand new organisms added every generation.
    pub fresh_organisms: usize,
    /// Minimum number of mutations applied to new organisms.
    pub fresh_min_mutations: usize,
    /// Maximum number of mutations applied to new organisms.
    pub fresh_max_mutations: usize,
    /// Chance of an offspring being produced asexually.
    pub mutate_only_prob: f64,
    /// Chance of a sexually produced offspring not
    /// being mutated afterwards.
    pub mate_only_prob: f64,
    /// Chance of mating with another species' champion.
    pub cross_species_mating_prob: f64,
    /// Chance of mating with another population's seed organism.
    pub cross_population_mating_prob: f64,
    /// Number of hall of fame members picked as challengers.
    pub num_hall_of_fame_parasites: usize,
    /// Number of species champions picked as challengers.
    pub num_champion_parasites: usize,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     // Specify some values here...
    ///     mutate_only_prob: 0.5,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            population_size: NonZeroUsize::MIN,
            species_compat_thresh_initial: 0.0,
            species_compat_modifier: 0.0,
            species_count_target: 0,
            species_elite_percentage: 0.0,
            superchamp_offspring: 0,
            superchamp_zscore_threshold: 0.0,
            superchamp_takeover_fraction: 0.0,
            fresh_organisms: 0,
            fresh_min_mutations: 0,
            fresh_max_mutations: 0,
            mutate_only_prob: 0.0,
            mate_only_prob: 0.0,
            cross_species_mating_prob: 0.0,
            cross_population_mating_prob: 0.0,
            num_hall_of_fame_parasites: 0,
            num_champion_parasites: 0,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> PopulationConfig {
        PopulationConfig {
            population_size: NonZeroUsize::new(200).unwrap_or(NonZeroUsize::MIN),
            species_compat_thresh_initial: 4.5,
            species_compat_modifier: 0.3,
            species_count_target: 10,
            species_elite_percentage: 0.2,
            superchamp_offspring: 3,
            superchamp_zscore_threshold: 3.0,
            superchamp_takeover_fraction: 0.25,
            fresh_organisms: 2,
            fresh_min_mutations: 2,
            fresh_max_mutations: 20,
            mutate_only_prob: 0.25,
            mate_only_prob: 0.2,
            cross_species_mating_prob: 0.05,
            cross_population_mating_prob: 0.001,
            num_hall_of_fame_parasites: 8,
            num_champion_parasites: 4,
        }
    }
}
