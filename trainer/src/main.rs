//! Co-evolves a host and a parasite population of gated
//! recurrent networks, each population being evaluated
//! against challengers drawn from the other, and plays
//! evolved genomes over UCI.

mod config;
mod datasets;
mod encoding;
mod fitness;
mod games;
mod genomes;
mod uci;

use config::{GameKind, TrainerConfig};
use datasets::Puzzle;
use fitness::GameResults;
use games::Contest;
use uci::UciBot;

use gatedneat::genomics::InnovationRegistry;
use gatedneat::logging::EvolutionLogger;
use gatedneat::{Organism, Population};

use clap::{Args, Parser, Subcommand};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

/// Number of species champions offered to the other
/// population as mates each generation.
const SEED_SPECIES: usize = 3;

#[derive(Parser, Debug)]
#[command(version, about = "Host/parasite co-evolution of gated recurrent networks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Co-evolves hosts and parasites.
    Train(TrainArgs),
    /// Plays a genome as a UCI engine on standard input and output.
    Play {
        /// Genome JSON file.
        #[arg(short, long)]
        genome: PathBuf,
        /// Update sweeps per network activation.
        #[arg(short, long, default_value_t = config::DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
    },
    /// Writes hand-built chess genomes to start a run from.
    Seed {
        /// RON configuration whose genetic settings bound the values.
        #[arg(short, long, default_value = "trainer.ron")]
        config: PathBuf,
        /// Directory receiving the `host` and `parasite` genomes.
        #[arg(short, long, default_value = "seed_genomes")]
        output: PathBuf,
        /// Genomes written per population.
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,
        #[arg(short, long, default_value_t = 1)]
        seed: u64,
    },
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// RON configuration file. Defaults are used if it does not exist.
    #[arg(short, long, default_value = "trainer.ron")]
    config: PathBuf,
    /// Overrides the configured random seed.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Overrides the configured number of generations.
    #[arg(short, long)]
    generations: Option<usize>,
    /// Overrides the configured game.
    #[arg(long, value_enum)]
    game: Option<GameKind>,
    /// Overrides the configured puzzle file.
    #[arg(long)]
    puzzles: Option<PathBuf>,
    /// Overrides the configured output directory.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Overrides the configured directory of initial genomes.
    #[arg(long)]
    initial_genomes: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let result = match Cli::parse().command {
        Command::Train(args) => train(args),
        Command::Play {
            genome,
            max_iterations,
        } => play(&genome, max_iterations),
        Command::Seed {
            config,
            output,
            count,
            seed,
        } => write_seed_genomes(&config, &output, count, seed),
    };
    if let Err(e) = result {
        log::error!("{}", e);
        process::exit(1);
    }
}

fn train(args: TrainArgs) -> Result<(), Box<dyn Error>> {
    let mut config = TrainerConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(generations) = args.generations {
        config.generations = generations;
    }
    if let Some(game) = args.game {
        config.game = game;
    }
    if args.puzzles.is_some() {
        config.puzzles_path = args.puzzles;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if args.initial_genomes.is_some() {
        config.initial_genomes = args.initial_genomes;
    }
    config.validate()?;

    let puzzles = match (&config.game, &config.puzzles_path) {
        (GameKind::ChessPuzzles, Some(path)) => datasets::load_puzzles(path)?,
        _ => vec![],
    };

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    // Shared by both populations so that organism IDs and
    // innovation numbers never collide across them.
    let mut registry = InnovationRegistry::new(&config.genetic);
    let genome_dir = |name: &str| config.initial_genomes.as_ref().map(|dir| dir.join(name));
    let mut hosts = initial_population(&config, genome_dir("host").as_deref(), &mut registry, &mut rng)?;
    let mut parasites =
        initial_population(&config, genome_dir("parasite").as_deref(), &mut registry, &mut rng)?;
    let mut hall_of_fame: Vec<Organism> = vec![];
    let mut host_logger = EvolutionLogger::new(config.reporting_level);
    let mut parasite_logger = EvolutionLogger::new(config.reporting_level);

    for generation in 0..config.generations {
        let contest = generation_contest(&config, &puzzles, &mut rng);
        let challengers_for_hosts = parasites.select_challengers(&hall_of_fame, &mut rng);
        let challengers_for_parasites = hosts.select_challengers(&hall_of_fame, &mut rng);

        let (host_results, parasite_precalc_results) = fitness::evaluate_fitness(
            hosts.organisms(),
            &challengers_for_hosts,
            &challengers_for_parasites,
            &GameResults::new(),
            &contest,
            config.max_iterations,
        );
        let (parasite_results, _) = fitness::evaluate_fitness(
            parasites.organisms(),
            &challengers_for_parasites,
            &challengers_for_hosts,
            &parasite_precalc_results,
            &contest,
            config.max_iterations,
        );
        fitness::assign_fitnesses(&mut hosts, &host_results, &config.fitness);
        fitness::assign_fitnesses(&mut parasites, &parasite_results, &config.fitness);

        if let Some(champion) =
            overall_champion(&hosts, &parasites, &contest, config.max_iterations)
        {
            log::info!("Generation {}: {} joins the hall of fame", generation, champion);
            hall_of_fame.push(champion);
        }
        host_logger.log(&hosts);
        parasite_logger.log(&parasites);

        let host_seeds = seeds(&parasites);
        let parasite_seeds = seeds(&hosts);
        hosts.select_and_reproduce(&host_seeds, &mut registry, &mut rng)?;
        parasites.select_and_reproduce(&parasite_seeds, &mut registry, &mut rng)?;
        hosts.speciate();
        parasites.speciate();
    }

    for (name, logger) in [("host", &host_logger), ("parasite", &parasite_logger)] {
        if let Some(best) = logger
            .iter()
            .max_by(|a, b| a.fitness.maximum.total_cmp(&b.fitness.maximum))
        {
            log::info!(
                "Best {} generation: {} (fitness {:.4})",
                name,
                best.generation,
                best.fitness.maximum
            );
        }
    }
    write_results(&config.output_dir, &hosts, &parasites, &hall_of_fame)
}

/// Creates a population from the genome files in `dir`,
/// or from minimal genomes without one.
fn initial_population<R: Rng>(
    config: &TrainerConfig,
    dir: Option<&Path>,
    registry: &mut InnovationRegistry,
    rng: &mut R,
) -> Result<Population, Box<dyn Error>> {
    let population = match dir {
        Some(dir) => Population::from_genomes(
            config.population.clone(),
            config.genetic.clone(),
            genomes::load_genome_dir(dir)?,
            registry,
            rng,
        )?,
        None => Population::new(
            config.population.clone(),
            config.genetic.clone(),
            registry,
            rng,
        ),
    };
    Ok(population)
}

/// Loads a genome and answers UCI commands with it until `quit`.
fn play(path: &Path, max_iterations: usize) -> Result<(), Box<dyn Error>> {
    let genome = genomes::load_genome(path)?;
    let name = path
        .file_stem()
        .map_or_else(|| "gatedneat".to_owned(), |s| s.to_string_lossy().into_owned());
    let mut bot = UciBot::new(genome, name, max_iterations)?;
    uci::run(&mut bot, io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}

/// Writes `count` hand-built genomes for each population
/// into the `host` and `parasite` subdirectories of `output`.
fn write_seed_genomes(config: &Path, output: &Path, count: usize, seed: u64) -> Result<(), Box<dyn Error>> {
    let config = TrainerConfig::load(config)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for name in ["host", "parasite"] {
        let population = (0..count)
            .map(|_| genomes::nonminimal_genome(&config.genetic, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;
        genomes::write_genome_dir(&output.join(name), &population)?;
    }
    Ok(())
}

/// Returns the game played this generation. Chess puzzle
/// games use a fresh random selection of puzzles.
fn generation_contest<R: Rng>(config: &TrainerConfig, puzzles: &[Puzzle], rng: &mut R) -> Contest {
    match config.game {
        GameKind::Xor => Contest::Supervised(datasets::xor_dataset()),
        GameKind::ChessPuzzles => Contest::ChessPuzzles(
            puzzles
                .choose_multiple(rng, config.puzzles_per_game)
                .cloned()
                .collect(),
        ),
    }
}

/// Returns the better scoring of the two populations' champions.
fn overall_champion(
    hosts: &Population,
    parasites: &Population,
    contest: &Contest,
    max_iterations: usize,
) -> Option<Organism> {
    let score = |organism: &Organism| {
        let mut genome = organism.genome().clone();
        contest.score(&mut genome, max_iterations)
    };
    match (hosts.get_superchamp(), parasites.get_superchamp()) {
        (Some(host), Some(parasite)) => {
            if score(parasite) > score(host) {
                Some(parasite.clone())
            } else {
                Some(host.clone())
            }
        }
        (champion, None) | (None, champion) => champion.cloned(),
    }
}

fn seeds(population: &Population) -> Vec<Organism> {
    population
        .get_n_diff_species_champs(SEED_SPECIES)
        .into_iter()
        .cloned()
        .collect()
}

/// Writes both populations' champions as genome JSON,
/// the hall of fame, and checkpoints of both populations.
fn write_results(
    dir: &Path,
    hosts: &Population,
    parasites: &Population,
    hall_of_fame: &[Organism],
) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    for (name, population) in [("host", hosts), ("parasite", parasites)] {
        if let Some(champion) = population.get_superchamp() {
            let path = dir.join(format!("{}_champion.json", name));
            fs::write(&path, serde_json::to_string_pretty(champion.genome())?)?;
            log::info!("Wrote {} to {}", champion, path.display());
        }
        fs::write(
            dir.join(format!("{}s.ron", name)),
            ron::to_string(population)?,
        )?;
    }
    fs::write(
        dir.join("hall_of_fame.json"),
        serde_json::to_string(hall_of_fame)?,
    )?;
    Ok(())
}
