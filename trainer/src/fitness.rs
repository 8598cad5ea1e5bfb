//! Competitive fitness evaluation of a population
//! against a set of challengers.

use crate::config::FitnessConfig;
use crate::games::Contest;

use gatedneat::{Organism, OrganismId, Population, SpeciesID};

use rayon::prelude::*;

use std::collections::{BTreeMap, BTreeSet};

/// Identifies a game: host, challenger, and whether
/// the host played white.
pub type GameKey = (OrganismId, OrganismId, bool);

/// Game results from the host's perspective.
pub type GameResults = BTreeMap<GameKey, i8>;

/// Plays every organism against every challenger twice,
/// once with each color, in parallel. Games found in
/// `precalc_results` are not replayed.
///
/// Also returns the results of games played by members of
/// `challengers_for_other`, seen from the other side, for
/// reuse when evaluating the other population.
pub fn evaluate_fitness(
    organisms: &[Organism],
    challengers: &[Organism],
    challengers_for_other: &[Organism],
    precalc_results: &GameResults,
    contest: &Contest,
    max_iterations: usize,
) -> (GameResults, GameResults) {
    let results: GameResults = organisms
        .par_iter()
        .flat_map_iter(|host| {
            challengers.iter().flat_map(move |challenger| {
                [true, false]
                    .into_iter()
                    .map(move |host_is_white| (host, challenger, host_is_white))
            })
        })
        .map(|(host, challenger, host_is_white)| {
            let key = (host.id(), challenger.id(), host_is_white);
            let result = match precalc_results.get(&key) {
                Some(&result) => result,
                None => contest.play(
                    &mut host.genome().clone(),
                    &mut challenger.genome().clone(),
                    host_is_white,
                    max_iterations,
                ),
            };
            (key, result)
        })
        .collect();

    let reusable: BTreeSet<OrganismId> = challengers_for_other.iter().map(|o| o.id()).collect();
    let reversed = results
        .iter()
        .filter(|((host, ..), _)| reusable.contains(host))
        .map(|(&(host, challenger, host_is_white), &result)| {
            ((challenger, host, !host_is_white), -result)
        })
        .collect();

    log::debug!(
        "Played {} games, {} from previous results",
        results.len(),
        results.keys().filter(|k| precalc_results.contains_key(*k)).count()
    );
    (results, reversed)
}

/// Assigns every organism its competitive fitness.
///
/// Each game's reward is scaled by how rarely its challenger
/// was beaten: by `1 / n` if `n` distinct organisms beat it,
/// or by 2 if none did. The reward sum is shared among the
/// organism's species, and a size penalty is subtracted.
pub fn assign_fitnesses(population: &mut Population, results: &GameResults, config: &FitnessConfig) {
    let mut defeated_by: BTreeMap<OrganismId, BTreeSet<OrganismId>> = BTreeMap::new();
    for (&(host, challenger, _), &result) in results {
        if result > 0 {
            defeated_by.entry(challenger).or_default().insert(host);
        }
    }

    let mut rewards: BTreeMap<OrganismId, f64> = BTreeMap::new();
    for (&(host, challenger, _), &result) in results {
        let modifier = match defeated_by.get(&challenger) {
            Some(hosts) => 1.0 / hosts.len() as f64,
            None => 2.0,
        };
        *rewards.entry(host).or_default() += modifier * config.reward(result);
    }

    let mut species_sizes: BTreeMap<Option<SpeciesID>, usize> = BTreeMap::new();
    for organism in population.organisms() {
        *species_sizes.entry(organism.species()).or_default() += 1;
    }

    let penalties = size_penalties(population.organisms(), config);
    for (organism, penalty) in population.organisms_mut().iter_mut().zip(penalties) {
        let reward = rewards.get(&organism.id()).copied().unwrap_or(0.0);
        let species_size = species_sizes[&organism.species()] as f64;
        organism.set_fitness(reward / species_size - penalty);
    }
}

/// Penalizes networks relative to the largest node count and
/// the densest connectivity (connections per squared node count)
/// in the population.
fn size_penalties(organisms: &[Organism], config: &FitnessConfig) -> Vec<f64> {
    if !config.penalize_size {
        return vec![0.0; organisms.len()];
    }
    let density = |o: &Organism| {
        let nodes = o.genome().nodes().len().max(1) as f64;
        o.genome().connections().len() as f64 / (nodes * nodes)
    };
    let max_nodes = organisms
        .iter()
        .map(|o| o.genome().nodes().len())
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let max_density = organisms.iter().map(density).fold(0.0, f64::max);

    organisms
        .iter()
        .map(|o| {
            let nodes_ratio = o.genome().nodes().len() as f64 / max_nodes;
            let density_ratio = if max_density > 0.0 {
                density(o) / max_density
            } else {
                0.0
            };
            (config.node_count_penalty_factor * nodes_ratio
                + config.connection_count_penalty_factor * density_ratio)
                * config.penalty_factor
        })
        .collect()
}
