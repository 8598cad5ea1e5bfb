//! Genome JSON files, and hand-built chess genomes to
//! start a run from.

use crate::encoding::{BOARD_ENCODING_LENGTH, MOVE_ENCODING_LENGTH, TOTAL_ENCODING_LENGTH};

use gatedneat::genomics::{
    ActivationFunction, ConnectionRecord, GeneticConfig, Genome, GenomeError, GenomeRecord,
    NodeRecord, NodeType,
};
use gatedneat::Innovation;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use std::fs;
use std::path::{Path, PathBuf};

/// Bits of the move encoding describing the origin and
/// destination squares and the move's flags.
const MOVE_GROUPS_LENGTH: usize = 20;

/// An error produced while reading, writing or building genomes.
#[derive(Debug, Error)]
pub enum GenomeFileError {
    #[error("could not access genome file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse genome: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid genome: {0}")]
    Genome(#[from] GenomeError),
    #[error("no genome files in {0}")]
    EmptyDir(PathBuf),
}

/// Loads a genome from a JSON [`GenomeRecord`] file.
pub fn load_genome(path: &Path) -> Result<Genome, GenomeFileError> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Loads every `.json` genome of a directory, in file name order.
pub fn load_genome_dir(dir: &Path) -> Result<Vec<Genome>, GenomeFileError> {
    let mut paths = vec![];
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |e| e == "json") {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(GenomeFileError::EmptyDir(dir.to_owned()));
    }
    paths.sort();
    let genomes = paths
        .iter()
        .map(|p| load_genome(p))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Loaded {} genomes from {}", genomes.len(), dir.display());
    Ok(genomes)
}

/// Writes genomes to `dir` as numbered JSON files, padded
/// so that file name order is the order of `genomes`.
pub fn write_genome_dir(dir: &Path, genomes: &[Genome]) -> Result<(), GenomeFileError> {
    fs::create_dir_all(dir)?;
    let width = genomes.len().saturating_sub(1).to_string().len();
    for (i, genome) in genomes.iter().enumerate() {
        fs::write(
            dir.join(format!("{:0width$}.json", i, width = width)),
            serde_json::to_string_pretty(genome)?,
        )?;
    }
    log::info!("Wrote {} genomes to {}", genomes.len(), dir.display());
    Ok(())
}

struct StructureBuilder<'a, R> {
    record: GenomeRecord,
    next_node_id: Innovation,
    next_connection_id: Innovation,
    config: &'a GeneticConfig,
    rng: &'a mut R,
}

impl<'a, R: Rng> StructureBuilder<'a, R> {
    fn random_value(&mut self) -> f64 {
        self.config.bound_value(self.rng.gen_range(-1.0..=1.0))
    }

    fn node(&mut self, id: Innovation, node_type: NodeType, activation_function: ActivationFunction) {
        let bias = match node_type {
            NodeType::Input => 0.0,
            _ => self.random_value(),
        };
        self.record.nodes.push(NodeRecord {
            node_id: id,
            node_type,
            activation_function,
            bias,
        });
    }

    fn hidden(&mut self) -> Innovation {
        let id = self.next_node_id;
        self.next_node_id += 1;
        let activation = ActivationFunction::ALL
            .choose(&mut *self.rng)
            .copied()
            .unwrap_or(ActivationFunction::Identity);
        self.node(id, NodeType::Hidden, activation);
        id
    }

    fn connect(&mut self, input_node: Innovation, output_node: Innovation, gater_node: Option<Innovation>) {
        let weight = self.random_value();
        self.record.connections.push(ConnectionRecord {
            connection_id: self.next_connection_id,
            weight,
            input_node,
            gater_node,
            output_node,
            is_enabled: true,
        });
        self.next_connection_id += 1;
    }
}

/// Builds a chess genome with a hand-made hidden structure,
/// meant as a richer starting point than a minimal genome.
///
/// Every square's 4 bits feed their own hidden node, the
/// color bit being gated by a node fed from input 0, and the
/// square nodes are summed up by one aggregator. Groups of 4
/// bits of the move encoding get a hidden node each, the
/// outer bits of the two piece groups being gated too.
/// Activation functions, biases and weights are random.
///
/// Connection innovation numbers start past the initial
/// input-to-output numbering.
pub fn nonminimal_genome<R: Rng>(config: &GeneticConfig, rng: &mut R) -> Result<Genome, GenomeError> {
    let output = TOTAL_ENCODING_LENGTH;
    let mut builder = StructureBuilder {
        record: GenomeRecord {
            nodes: vec![],
            connections: vec![],
        },
        next_node_id: output + 1,
        next_connection_id: TOTAL_ENCODING_LENGTH,
        config,
        rng,
    };
    for id in 0..TOTAL_ENCODING_LENGTH {
        builder.node(id, NodeType::Input, ActivationFunction::Identity);
    }
    builder.node(output, NodeType::Output, config.output_activation);

    let gate = builder.hidden();
    builder.connect(0, gate, None);
    builder.connect(gate, output, None);

    let squares: Vec<Innovation> = (0..BOARD_ENCODING_LENGTH)
        .step_by(4)
        .map(|start| {
            let square = builder.hidden();
            for bit in start..start + 4 {
                builder.connect(bit, square, (bit == start).then(|| gate));
            }
            square
        })
        .collect();
    let aggregator = builder.hidden();
    for square in squares {
        builder.connect(square, aggregator, None);
    }
    builder.connect(aggregator, output, None);

    let moves_end = BOARD_ENCODING_LENGTH + MOVE_GROUPS_LENGTH;
    for start in (BOARD_ENCODING_LENGTH..moves_end).step_by(4) {
        let group = builder.hidden();
        for bit in start..start + 4 {
            builder.connect(bit, group, None);
        }
        builder.connect(group, output, None);
    }

    // Color bit and lowest kind bit of the captured and promoted pieces.
    for start in (moves_end..BOARD_ENCODING_LENGTH + MOVE_ENCODING_LENGTH).step_by(4) {
        let group = builder.hidden();
        for bit in start..start + 4 {
            let gated = bit == start || bit == start + 3;
            builder.connect(bit, group, gated.then(|| gate));
        }
        builder.connect(group, output, None);
    }

    Genome::try_from(builder.record)
}
