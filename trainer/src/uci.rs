//! Plays a genome against a chess GUI over the UCI protocol.

use crate::encoding::{self, MoveView, TOTAL_ENCODING_LENGTH};
use crate::games;

use gatedneat::genomics::{ActivationError, Genome};

use chess::{Board, ChessMove};
use thiserror::Error;

use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// An error produced while handling a UCI command.
#[derive(Debug, Error)]
pub enum UciError {
    #[error(transparent)]
    Activation(#[from] ActivationError),
    #[error("invalid FEN '{0}'")]
    InvalidFen(String),
    #[error("move {uci} is not legal in {fen}")]
    IllegalMove { uci: String, fen: String },
    #[error("chess players need {expected} inputs and 1 output, got {inputs} and {outputs}")]
    Shape {
        expected: usize,
        inputs: usize,
        outputs: usize,
    },
}

/// A UCI engine choosing its moves with a genome.
///
/// The engine plays the side to move when `go` arrives. Every
/// `position` command replays the game from a fresh state,
/// showing the genome each earlier move of that side the way
/// it was shown while choosing it, so a replayed game leaves
/// the genome in the state live play would have.
#[derive(Clone, Debug)]
pub struct UciBot {
    player: Genome,
    name: String,
    board: Board,
    max_iterations: usize,
}

impl UciBot {
    /// Creates an engine at the starting position.
    ///
    /// # Errors
    /// Returns [`UciError::Shape`] if `player` does not take
    /// a decision encoding to a single output.
    pub fn new(player: Genome, name: impl Into<String>, max_iterations: usize) -> Result<UciBot, UciError> {
        if player.input_count() != TOTAL_ENCODING_LENGTH || player.output_count() != 1 {
            return Err(UciError::Shape {
                expected: TOTAL_ENCODING_LENGTH,
                inputs: player.input_count(),
                outputs: player.output_count(),
            });
        }
        let mut bot = UciBot {
            player,
            name: name.into(),
            board: Board::default(),
            max_iterations,
        };
        bot.player.reset_state();
        Ok(bot)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self) -> &Genome {
        &self.player
    }

    /// Handles one command line, returning the lines to answer with.
    /// Unknown commands are ignored.
    pub fn handle(&mut self, line: &str) -> Result<Vec<String>, UciError> {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("uci") => Ok(vec![
                format!("id name {}", self.name),
                "id author gatedneat".to_owned(),
                "uciok".to_owned(),
            ]),
            Some("isready") => Ok(vec!["readyok".to_owned()]),
            Some("ucinewgame") => {
                self.board = Board::default();
                self.player.reset_state();
                Ok(vec![])
            }
            Some("position") => {
                self.set_position(&words.collect::<Vec<_>>())?;
                Ok(vec![])
            }
            Some("go") => {
                let best = match self.best_move()? {
                    Some(mv) => mv.to_string(),
                    None => "0000".to_owned(),
                };
                Ok(vec![format!("bestmove {}", best)])
            }
            Some(command) => {
                log::debug!("Ignoring UCI command '{}'", command);
                Ok(vec![])
            }
            None => Ok(vec![]),
        }
    }

    /// Sets up `startpos` or `fen <fields>`, followed by optional
    /// `moves <uci>...`, and replays the moves.
    fn set_position(&mut self, args: &[&str]) -> Result<(), UciError> {
        let moves_at = args.iter().position(|&a| a == "moves").unwrap_or(args.len());
        let board = match args.first() {
            Some(&"fen") => {
                let fen = args[1..moves_at].join(" ");
                Board::from_str(&fen).map_err(|_| UciError::InvalidFen(fen))?
            }
            _ => Board::default(),
        };

        let mut moves = vec![];
        let mut end = board;
        for &uci in args.iter().skip(moves_at + 1) {
            let mv = encoding::legal_moves(&end)
                .into_iter()
                .find(|m| m.to_string() == uci)
                .ok_or_else(|| UciError::IllegalMove {
                    uci: uci.to_owned(),
                    fen: end.to_string(),
                })?;
            moves.push(mv);
            end = end.make_move_new(mv);
        }

        let player_color = end.side_to_move();
        self.board = board;
        self.player.reset_state();
        for mv in moves {
            if self.board.side_to_move() == player_color {
                self.show_position_if_fresh()?;
                if let Some(view) = MoveView::of(&self.board, mv) {
                    let input = encoding::encode_decision(&self.board, &view);
                    self.player.activate(&input, self.max_iterations, false)?;
                }
            }
            self.board = self.board.make_move_new(mv);
        }
        Ok(())
    }

    /// Shows the current board with a null move to a player
    /// that has not seen anything yet.
    fn show_position_if_fresh(&mut self) -> Result<(), ActivationError> {
        if self.player.activations().iter().all(|a| *a == 0.0) {
            let input = encoding::null_move_input(&self.board);
            self.player.activate(&input, self.max_iterations, false)?;
        }
        Ok(())
    }

    /// Picks the move the player prefers and keeps the state
    /// it leaves the player in.
    fn best_move(&mut self) -> Result<Option<ChessMove>, UciError> {
        self.show_position_if_fresh()?;
        let (moves, inputs): (Vec<ChessMove>, Vec<Vec<f64>>) =
            encoding::candidate_inputs(&self.board).into_iter().unzip();
        match games::get_player_best_move(&mut self.player, &inputs, self.max_iterations)? {
            Some((best, state)) => {
                self.player.set_activations(&state)?;
                Ok(Some(moves[best]))
            }
            None => Ok(None),
        }
    }
}

/// Answers commands read from `input` until `quit` or
/// the end of input. Failed commands are logged and skipped.
pub fn run<R: BufRead, W: Write>(bot: &mut UciBot, input: R, mut output: W) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let command = line.trim();
        if command == "quit" {
            break;
        }
        match bot.handle(command) {
            Ok(replies) => {
                for reply in replies {
                    writeln!(output, "{}", reply)?;
                }
            }
            Err(e) => log::warn!("Ignoring '{}': {}", command, e),
        }
        output.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use gatedneat::genomics::{GeneticConfig, InnovationRegistry};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use std::io::Cursor;
    use std::num::NonZeroUsize;

    fn bot(seed: u64) -> UciBot {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(TOTAL_ENCODING_LENGTH).unwrap(),
            output_count: NonZeroUsize::MIN,
            ..GeneticConfig::default()
        };
        let mut registry = InnovationRegistry::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        UciBot::new(Genome::new(&config, &mut registry, &mut rng), "tester", 3).unwrap()
    }

    fn is_legal(board: &Board, uci: &str) -> bool {
        encoding::legal_moves(board).iter().any(|m| m.to_string() == uci)
    }

    #[test]
    fn command_exchange() {
        let mut bot = bot(0);
        let input = Cursor::new("uci\nisready\nposition startpos moves e2e4\ngo\nquit\ngo\n");
        let mut output = vec![];
        run(&mut bot, input, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "id name tester");
        assert!(lines[1].starts_with("id author"));
        assert_eq!(lines[2], "uciok");
        assert_eq!(lines[3], "readyok");

        let after_e4 = Board::default().make_move_new(ChessMove::new(
            chess::Square::E2,
            chess::Square::E4,
            None,
        ));
        assert_eq!(*bot.board(), after_e4);
        let best = lines[4].strip_prefix("bestmove ").unwrap();
        assert!(is_legal(&after_e4, best));
    }

    #[test]
    fn repeated_positions_are_answered_alike() {
        let mut bot = bot(1);
        let mut answers = vec![];
        for _ in 0..3 {
            bot.handle("position startpos moves d2d4 g8f6").unwrap();
            answers.push(bot.handle("go").unwrap());
        }
        assert!(answers.iter().all(|a| *a == answers[0]));
    }

    #[test]
    fn replay_rebuilds_the_live_state() {
        let mut live = bot(2);
        live.handle("position startpos").unwrap();
        let reply = live.handle("go").unwrap();
        let first = reply[0].strip_prefix("bestmove ").unwrap().to_owned();
        let state = live.player().activations().to_vec();

        let after_first = Board::default().make_move_new(
            encoding::legal_moves(&Board::default())
                .into_iter()
                .find(|m| m.to_string() == first)
                .unwrap(),
        );
        let answer = encoding::legal_moves(&after_first)[0];

        let mut replayed = bot(2);
        replayed
            .handle(&format!("position startpos moves {} {}", first, answer))
            .unwrap();
        assert_eq!(replayed.player().activations(), &state[..]);
    }

    #[test]
    fn mated_side_has_no_move() {
        let mut bot = bot(3);
        bot.handle("position fen R6k/5ppp/8/8/8/8/5PPP/6K1 b - - 1 2")
            .unwrap();
        assert_eq!(bot.handle("go").unwrap(), vec!["bestmove 0000"]);
    }

    #[test]
    fn invalid_positions() {
        let mut bot = bot(4);
        assert!(matches!(
            bot.handle("position startpos moves e2e5"),
            Err(UciError::IllegalMove { .. })
        ));
        assert!(matches!(
            bot.handle("position fen not a position moves e2e4"),
            Err(UciError::InvalidFen(_))
        ));
        assert!(bot.handle("debug on").unwrap().is_empty());

        let config = GeneticConfig::default();
        let mut registry = InnovationRegistry::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            UciBot::new(Genome::new(&config, &mut registry, &mut rng), "small", 3),
            Err(UciError::Shape {
                expected: TOTAL_ENCODING_LENGTH,
                ..
            })
        ));
    }
}
