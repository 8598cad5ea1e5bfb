//! Games played between two genomes, scored from
//! the first player's perspective.

use crate::datasets::{LabeledSample, Puzzle};

use gatedneat::genomics::{ActivationError, Genome};

/// Scores closer than this are a draw.
pub const SCORE_TOLERANCE: f64 = 1e-4;

/// Converts two scores into a game result for the first
/// player: `1` for a win, `0` for a draw and `-1` for a loss.
/// The bigger score wins if `first_wins_if_bigger` is set,
/// the smaller one otherwise.
pub fn scores_to_int(first: f64, second: f64, first_wins_if_bigger: bool) -> i8 {
    if first == second || (first - second).abs() < SCORE_TOLERANCE {
        return 0;
    }
    if (first > second) == first_wins_if_bigger {
        1
    } else {
        -1
    }
}

/// Returns the sum of the absolute differences between the
/// player's outputs and the labels over the whole dataset.
/// The player's state is reset before every sample.
pub fn play_labeled_dataset_single_player(
    player: &mut Genome,
    dataset: &[LabeledSample],
    max_iterations: usize,
) -> Result<f64, ActivationError> {
    let mut loss = 0.0;
    for sample in dataset {
        player.reset_state();
        let outputs = player.activate(&sample.inputs, max_iterations, false)?;
        loss += outputs
            .iter()
            .zip(&sample.labels)
            .map(|(output, label)| (label - output).abs())
            .sum::<f64>();
    }
    Ok(loss)
}

/// Activates the player with every candidate input in turn,
/// always from the same starting state, and returns the index
/// of the candidate producing the largest first output along
/// with the state it left the player in.
///
/// The player's state is left unchanged. Returns `Ok(None)`
/// if there are no candidates.
pub fn get_player_best_move(
    player: &mut Genome,
    candidates: &[Vec<f64>],
    max_iterations: usize,
) -> Result<Option<(usize, Vec<f64>)>, ActivationError> {
    let initial_state = player.activations().to_vec();
    let mut best: Option<(usize, f64, Vec<f64>)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let output = player.activate(candidate, max_iterations, false)?[0];
        if best.as_ref().map_or(true, |(_, value, _)| output > *value) {
            best = Some((i, output, player.activations().to_vec()));
        }
        player.set_activations(&initial_state)?;
    }
    Ok(best.map(|(i, _, state)| (i, state)))
}

/// Plays through every puzzle, and returns the sum over
/// puzzles of the fraction of moves found before the first
/// mistake, weighted by the puzzle's difficulty.
///
/// The player sees the puzzle's initial position first, and
/// keeps the state of each correct move it plays.
pub fn play_chess_puzzles_single_player(
    player: &mut Genome,
    puzzles: &[Puzzle],
    max_iterations: usize,
) -> Result<f64, ActivationError> {
    player.reset_state();
    let mut total_score = 0.0;
    for puzzle in puzzles {
        player.activate(&puzzle.initial_input, max_iterations, false)?;
        let mut correct_moves = 0;
        for step in &puzzle.steps {
            match get_player_best_move(player, &step.candidates, max_iterations)? {
                Some((best, state)) if best == step.correct => {
                    correct_moves += 1;
                    player.set_activations(&state)?;
                }
                _ => break,
            }
        }
        player.reset_state();
        if !puzzle.steps.is_empty() {
            total_score += correct_moves as f64 / puzzle.steps.len() as f64 * puzzle.difficulty;
        }
    }
    Ok(total_score)
}

/// A game between a host and a challenger.
#[derive(Clone, Debug)]
pub enum Contest {
    /// Both players are scored against a labeled dataset,
    /// the lowest loss winning.
    Supervised(Vec<LabeledSample>),
    /// Both players solve the same puzzles, the
    /// highest score winning.
    ChessPuzzles(Vec<Puzzle>),
}

impl Contest {
    /// Returns a score for a single player, higher being better.
    /// Players whose activation fails score negative infinity.
    pub fn score(&self, player: &mut Genome, max_iterations: usize) -> f64 {
        let score = match self {
            Contest::Supervised(dataset) => {
                play_labeled_dataset_single_player(player, dataset, max_iterations).map(|loss| -loss)
            }
            Contest::ChessPuzzles(puzzles) => {
                play_chess_puzzles_single_player(player, puzzles, max_iterations)
            }
        };
        score.unwrap_or_else(|e| {
            log::debug!("Non-viable player: {}", e);
            f64::NEG_INFINITY
        })
    }

    /// Plays a game and returns its result for the host.
    /// Both contests are single-player, so colors are ignored.
    pub fn play(
        &self,
        host: &mut Genome,
        challenger: &mut Genome,
        _host_is_white: bool,
        max_iterations: usize,
    ) -> i8 {
        let host_score = self.score(host, max_iterations);
        let challenger_score = self.score(challenger, max_iterations);
        scores_to_int(host_score, challenger_score, true)
    }
}
