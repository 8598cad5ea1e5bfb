use crate::encoding;

use chess::Board;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fs;
use std::path::Path;
use std::str::FromStr;

/// An error produced while loading or preparing a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid FEN '{0}'")]
    InvalidFen(String),
    #[error("move {uci} is not legal in {fen}")]
    IllegalMove { uci: String, fen: String },
}

/// An input vector and the outputs expected for it.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledSample {
    pub inputs: Vec<f64>,
    pub labels: Vec<f64>,
}

/// The XOR truth table, with a constant bias input
/// as third input.
pub fn xor_dataset() -> Vec<LabeledSample> {
    [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ]
    .iter()
    .map(|([a, b], label)| LabeledSample {
        inputs: vec![*a, *b, 1.0],
        labels: vec![*label],
    })
    .collect()
}

/// A chess puzzle as stored on disk.
///
/// `fen` is the position before the opponent's opening move,
/// and `moves` the whole line in UCI notation, alternating
/// between the opponent and the puzzle player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub fen: String,
    pub moves: String,
    /// Scales the puzzle's score.
    pub difficulty: f64,
}

/// A puzzle with all of its positions encoded as network inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct Puzzle {
    pub initial_input: Vec<f64>,
    pub steps: Vec<PuzzleDecision>,
    pub difficulty: f64,
}

/// The encoded legal moves of a position where the
/// puzzle player is to move.
#[derive(Clone, Debug, PartialEq)]
pub struct PuzzleDecision {
    pub candidates: Vec<Vec<f64>>,
    pub correct: usize,
}

impl TryFrom<&PuzzleRecord> for Puzzle {
    type Error = DatasetError;

    fn try_from(record: &PuzzleRecord) -> Result<Puzzle, DatasetError> {
        let mut board =
            Board::from_str(&record.fen).map_err(|_| DatasetError::InvalidFen(record.fen.clone()))?;
        let initial_input = encoding::puzzle_initial_input(&board);

        let mut steps = vec![];
        for (i, uci) in record.moves.split_whitespace().enumerate() {
            let mut candidates = encoding::candidate_inputs(&board);
            let played = candidates
                .iter()
                .position(|(m, _)| m.to_string() == uci)
                .ok_or_else(|| DatasetError::IllegalMove {
                    uci: uci.to_owned(),
                    fen: board.to_string(),
                })?;
            board = board.make_move_new(candidates[played].0);
            // The opponent moves first.
            if i % 2 == 1 {
                steps.push(PuzzleDecision {
                    candidates: candidates.drain(..).map(|(_, input)| input).collect(),
                    correct: played,
                });
            }
        }
        Ok(Puzzle {
            initial_input,
            steps,
            difficulty: record.difficulty,
        })
    }
}

/// Loads and encodes a JSON array of puzzle records.
pub fn load_puzzles(path: &Path) -> Result<Vec<Puzzle>, DatasetError> {
    let records: Vec<PuzzleRecord> = serde_json::from_str(&fs::read_to_string(path)?)?;
    let puzzles = records
        .iter()
        .map(Puzzle::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Loaded {} puzzles from {}", puzzles.len(), path.display());
    Ok(puzzles)
}
