use crate::Innovation;

use thiserror::Error;

/// An error type indicating a failed network activation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActivationError {
    /// The number of input values does not match
    /// the genome's number of input nodes.
    #[error("expected {expected} input values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    /// An output value was NaN.
    #[error("output {index} is NaN")]
    InvalidOutput { index: usize },
}

/// An error type indicating the node or connection
/// being added to a genome is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenomeError {
    /// The node's ID is a duplicate.
    #[error("duplicate node insertion with id {0}")]
    DuplicateNode(Innovation),
    /// The connection's ID is a duplicate.
    #[error("duplicate connection insertion with id {0}")]
    DuplicateConnection(Innovation),
    /// The connection refers to a node absent in the genome.
    #[error("connection {connection} refers to nonexistent node {node}")]
    DanglingReference {
        connection: Innovation,
        node: Innovation,
    },
    /// The connection has the same endpoints as another one.
    #[error("connection {connection} shadows connection {existing} between {input} -> {output}")]
    DuplicateEndpoints {
        connection: Innovation,
        existing: Innovation,
        input: Innovation,
        output: Innovation,
    },
}

/// An error type indicating a mutation could not be
/// carried out. Mutations are best-effort, so callers
/// usually just proceed without it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// No connection satisfied the mutation's requirements.
    #[error("no eligible connection for mutation")]
    NoEligibleConnection,
    /// No node satisfied the mutation's requirements.
    #[error("no eligible node for mutation")]
    NoEligibleNode,
    /// No unconnected node pair was found before
    /// running out of attempts.
    #[error("no viable node pair found after {attempts} attempts")]
    NoNodePairFound { attempts: usize },
    /// No connection was eligible for splitting before
    /// running out of attempts.
    #[error("no splittable connection found after {attempts} attempts")]
    NoSplittableConnection { attempts: usize },
}
