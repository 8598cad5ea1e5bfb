use thiserror::Error;

/// An error type indicating a population
/// could not be evolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulationError {
    /// The population has no organisms to reproduce from.
    #[error("attempted reproduction of an empty population")]
    Empty,
    /// A seed genome does not fit the configured inputs and outputs.
    #[error("genome {index} has {inputs} inputs and {outputs} outputs, expected {expected_inputs} and {expected_outputs}")]
    GenomeShape {
        index: usize,
        inputs: usize,
        outputs: usize,
        expected_inputs: usize,
        expected_outputs: usize,
    },
}
