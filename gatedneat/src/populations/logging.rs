use super::{Population, SpeciesID};

use crate::{Organism, OrganismId};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllOrganisms,
    /// Clones species champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no organisms.
    NoOrganisms,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct GenerationLog {
    pub generation: usize,
    pub species_count: usize,
    pub species_compat_thresh: f64,
    pub fitness: Stats,
    pub champion: Option<OrganismId>,
    pub champion_nodes: usize,
    pub champion_connections: usize,
    pub sample: GenerationMemberRecord,
}

impl fmt::Display for GenerationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: {} species (threshold {:.2}), fitness max {:.4} mean {:.4} median {:.4} min {:.4}",
            self.generation,
            self.species_count,
            self.species_compat_thresh,
            self.fitness.maximum,
            self.fitness.mean,
            self.fitness.median,
            self.fitness.minimum,
        )?;
        if let Some(champion) = self.champion {
            write!(
                f,
                ", champion #{} ({} nodes, {} connections)",
                champion, self.champion_nodes, self.champion_connections
            )?;
        }
        Ok(())
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// All statistics of an empty sequence are NaN.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// assert!((stats.std_dev - 1.7f64.sqrt()).abs() < 1e-12);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: f64::NAN,
                minimum: f64::NAN,
                mean: f64::NAN,
                median: f64::NAN,
                std_dev: f64::NAN,
            };
        }
        data.sort_by(f64::total_cmp);
        let len = data.len() as f64;
        let mean = data.iter().sum::<f64>() / len;
        let variance = data.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / len;
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean,
            median,
            std_dev: variance.sqrt(),
        }
    }
}

/// A reporting-level dependant store
/// of organisms from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Every organism, with its species.
    Organisms(Vec<(Option<SpeciesID>, Organism)>),
    /// Only species IDs and species champions.
    SpeciesChampions(Vec<(SpeciesID, Organism)>),
    /// Only population champion.
    PopulationChampion(Organism),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<GenerationLog>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoOrganisms);
    /// assert_eq!(logger.iter().count(), 0);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Stores a snapshot of a population, emits its
    /// summary at info level, and returns it.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{GeneticConfig, InnovationRegistry};
    /// use gatedneat::logging::{EvolutionLogger, GenerationMemberRecord, ReportingLevel};
    /// use gatedneat::{Population, PopulationConfig};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let genetic_config = GeneticConfig::default();
    /// let mut registry = InnovationRegistry::new(&genetic_config);
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    /// let population_config = PopulationConfig {
    ///     population_size: std::num::NonZeroUsize::new(20).unwrap(),
    ///     ..PopulationConfig::default()
    /// };
    /// let population = Population::new(
    ///     population_config,
    ///     genetic_config,
    ///     &mut registry,
    ///     &mut rng,
    /// );
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    /// let log = logger.log(&population);
    /// assert_eq!(log.generation, 0);
    /// assert!(matches!(log.sample, GenerationMemberRecord::PopulationChampion(_)));
    /// ```
    pub fn log(&mut self, population: &Population) -> &GenerationLog {
        let champion = population.get_superchamp();
        let entry = GenerationLog {
            generation: population.generation(),
            species_count: population.species_ids().len(),
            species_compat_thresh: population.species_compat_thresh(),
            fitness: Stats::from(population.organisms().iter().map(|o| o.fitness())),
            champion: champion.map(|c| c.id()),
            champion_nodes: champion.map_or(0, |c| c.genome().nodes().len()),
            champion_connections: champion.map_or(0, |c| c.genome().connections().len()),
            sample: match (self.reporting_level, champion) {
                (ReportingLevel::AllOrganisms, _) => GenerationMemberRecord::Organisms(
                    population
                        .organisms()
                        .iter()
                        .map(|o| (o.species(), o.clone()))
                        .collect(),
                ),
                (ReportingLevel::SpeciesChampions, _) => GenerationMemberRecord::SpeciesChampions(
                    population
                        .species_ids()
                        .iter()
                        .filter_map(|&id| {
                            population
                                .get_species_top_n(id, 1)
                                .pop()
                                .map(|o| (id, o.clone()))
                        })
                        .collect(),
                ),
                (ReportingLevel::PopulationChampion, Some(champion)) => {
                    GenerationMemberRecord::PopulationChampion(champion.clone())
                }
                _ => GenerationMemberRecord::None,
            },
        };
        log::info!("{}", entry);
        self.logs.push(entry);
        &self.logs[self.logs.len() - 1]
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &GenerationLog> {
        self.logs.iter()
    }
}
