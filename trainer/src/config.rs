use crate::encoding::TOTAL_ENCODING_LENGTH;

use gatedneat::genomics::{ActivationFunction, GeneticConfig};
use gatedneat::logging::ReportingLevel;
use gatedneat::PopulationConfig;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Update sweeps per network activation, unless configured otherwise.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// An error produced while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(String),
    #[error("{game:?} needs genomes with {inputs} inputs and 1 output, got {actual_inputs} and {actual_outputs}")]
    Shape {
        game: GameKind,
        inputs: usize,
        actual_inputs: usize,
        actual_outputs: usize,
    },
    #[error("chess puzzles need a puzzle file")]
    MissingPuzzles,
}

/// The game hosts and parasites are evaluated on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum GameKind {
    /// Lowest loss over the XOR truth table wins.
    Xor,
    /// Highest chess puzzle score wins.
    ChessPuzzles,
}

impl GameKind {
    /// Number of network inputs the game feeds.
    pub fn input_count(self) -> usize {
        match self {
            GameKind::Xor => 3,
            GameKind::ChessPuzzles => TOTAL_ENCODING_LENGTH,
        }
    }
}

/// Rewards of game results and penalties on network size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitnessConfig {
    pub reward_win: f64,
    pub reward_draw: f64,
    pub reward_loss: f64,
    /// Whether fitness is penalized by network size.
    pub penalize_size: bool,
    /// Share of the size penalty due to the node count.
    pub node_count_penalty_factor: f64,
    /// Share of the size penalty due to the connection density.
    pub connection_count_penalty_factor: f64,
    /// Scale of the size penalty.
    pub penalty_factor: f64,
}

impl FitnessConfig {
    /// Returns the reward of a game result.
    pub fn reward(&self, result: i8) -> f64 {
        match result.signum() {
            1 => self.reward_win,
            0 => self.reward_draw,
            _ => self.reward_loss,
        }
    }
}

impl Default for FitnessConfig {
    fn default() -> FitnessConfig {
        FitnessConfig {
            reward_win: 2.0,
            reward_draw: -1.0,
            reward_loss: 0.0,
            penalize_size: true,
            node_count_penalty_factor: 0.3,
            connection_count_penalty_factor: 0.7,
            penalty_factor: 0.005,
        }
    }
}

/// Run parameters of a host/parasite co-evolution.
/// Missing fields take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Seed of the run's random number generator.
    pub seed: u64,
    pub generations: usize,
    pub game: GameKind,
    /// Update sweeps per network activation.
    pub max_iterations: usize,
    /// JSON file of puzzle records.
    pub puzzles_path: Option<PathBuf>,
    /// Puzzles played by every organism each generation.
    pub puzzles_per_game: usize,
    pub fitness: FitnessConfig,
    pub reporting_level: ReportingLevel,
    /// Where the final champions are written to.
    pub output_dir: PathBuf,
    /// Directory with `host` and `parasite` subdirectories of
    /// genome JSON files to start from, instead of minimal genomes.
    pub initial_genomes: Option<PathBuf>,
    pub genetic: GeneticConfig,
    pub population: PopulationConfig,
}

impl Default for TrainerConfig {
    fn default() -> TrainerConfig {
        TrainerConfig {
            seed: 0,
            generations: 100,
            game: GameKind::Xor,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            puzzles_path: None,
            puzzles_per_game: 10,
            fitness: FitnessConfig::default(),
            reporting_level: ReportingLevel::PopulationChampion,
            output_dir: PathBuf::from("champions"),
            initial_genomes: None,
            genetic: GeneticConfig {
                input_count: NonZeroUsize::new(GameKind::Xor.input_count())
                    .unwrap_or(NonZeroUsize::MIN),
                output_count: NonZeroUsize::MIN,
                output_activation: ActivationFunction::Sigmoid,
                ..GeneticConfig::default()
            },
            population: PopulationConfig::default(),
        }
    }
}

impl TrainerConfig {
    /// Loads a configuration from a RON file, falling
    /// back to the defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<TrainerConfig, ConfigError> {
        if !path.exists() {
            log::warn!("{} not found, using the default configuration", path.display());
            return Ok(TrainerConfig::default());
        }
        let text = fs::read_to_string(path)?;
        ron::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks that genomes fit the chosen game.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let inputs = self.game.input_count();
        let actual_inputs = self.genetic.input_count.get();
        let actual_outputs = self.genetic.output_count.get();
        if actual_inputs != inputs || actual_outputs != 1 {
            return Err(ConfigError::Shape {
                game: self.game,
                inputs,
                actual_inputs,
                actual_outputs,
            });
        }
        if self.game == GameKind::ChessPuzzles && self.puzzles_path.is_none() {
            return Err(ConfigError::MissingPuzzles);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrainerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.genetic.input_count.get(), 3);
        assert_eq!(config.population.population_size.get(), 200);
    }

    #[test]
    fn partial_ron() {
        let config: TrainerConfig = ron::from_str("(seed: 7, generations: 2, game: Xor)").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.generations, 2);
        assert_eq!(config.fitness, FitnessConfig::default());

        let text = ron::to_string(&config).unwrap();
        assert_eq!(ron::from_str::<TrainerConfig>(&text).unwrap(), config);
    }

    #[test]
    fn shape_validation() {
        let config = TrainerConfig {
            game: GameKind::ChessPuzzles,
            ..TrainerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Shape {
                inputs: TOTAL_ENCODING_LENGTH,
                actual_inputs: 3,
                ..
            })
        ));

        let mut config = config;
        config.genetic.input_count = NonZeroUsize::new(TOTAL_ENCODING_LENGTH).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingPuzzles)));
        config.puzzles_path = Some("puzzles.json".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rewards() {
        let fitness = FitnessConfig::default();
        assert_eq!(fitness.reward(1), 2.0);
        assert_eq!(fitness.reward(0), -1.0);
        assert_eq!(fitness.reward(-1), 0.0);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = TrainerConfig::load(Path::new("does/not/exist.ron")).unwrap();
        assert_eq!(config, TrainerConfig::default());
    }
}
