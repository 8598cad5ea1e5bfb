use crate::genomics::ActivationFunction;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation,
/// mutation and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Activation function of freshly generated output nodes.
    pub output_activation: ActivationFunction,
    /// Lower bound of weights and biases.
    pub min_val: f64,
    /// Upper bound of weights and biases.
    pub max_val: f64,
    /// Number of decimal places weights and biases
    /// are rounded to after perturbation.
    pub value_precision: i32,
    /// Chance of each connection's weight being perturbed
    /// during a weight mutation.
    pub weight_perturb_chance: f64,
    /// Magnitude of the uniform weight perturbation.
    pub weight_perturb_value: f64,
    /// Chance of each non-input node's bias being perturbed
    /// during a bias mutation.
    pub bias_perturb_chance: f64,
    /// Magnitude of the uniform bias perturbation.
    pub bias_perturb_value: f64,
    /// Chance of a node addition mutation. Exclusive with
    /// every other mutation.
    pub add_node_prob: f64,
    /// Chance of a connection addition mutation, if no node
    /// was added. Exclusive with every other mutation.
    pub add_connection_prob: f64,
    /// Chance of weight perturbation.
    pub mutate_weights_prob: f64,
    /// Chance of bias perturbation.
    pub mutate_biases_prob: f64,
    /// Chance of toggling a connection's enabled status.
    pub mutate_toggle_enable_prob: f64,
    /// Chance of re-enabling a disabled connection.
    pub mutate_reenable_prob: f64,
    /// Chance of removing a connection.
    pub mutate_remove_connection_prob: f64,
    /// Chance of removing a hidden node.
    pub mutate_remove_node_prob: f64,
    /// Chance of gating a connection.
    pub mutate_add_gate_prob: f64,
    /// Chance of changing a node's activation function.
    pub mutate_activation_function_prob: f64,
    /// Maximum number of attempts made by node and connection
    /// addition mutations before returning with failure.
    pub max_mutation_attempts: usize,
    /// Weight of excess connections in genetic distance.
    pub excess_coeff: f64,
    /// Weight of disjoint connections in genetic distance.
    pub disjoint_coeff: f64,
    /// Weight of the average weight and bias difference
    /// in genetic distance.
    pub weight_coeff: f64,
    /// Weight of the gater mismatch fraction in genetic distance.
    pub gates_coeff: f64,
    /// Chance that matching values are averaged during mating,
    /// instead of copied from a randomly chosen parent.
    /// Decided once per mating.
    pub mate_avg_genes_prob: f64,
    /// Chance that a connection disabled in both parents
    /// stays disabled in the offspring.
    pub inherit_disable_chance: f64,
    /// Number of mutations applied to freshly generated genomes.
    pub initial_mutations: usize,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of `NonZeroUsize`s, 1.
    /// Value bounds are ±1 and output nodes use identity.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::GeneticConfig;
    ///
    /// let cfg = GeneticConfig {
    ///     // Specify some values here...
    ///     add_node_prob: 1.0,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            output_activation: ActivationFunction::Identity,
            min_val: -1.0,
            max_val: 1.0,
            value_precision: 3,
            weight_perturb_chance: 0.0,
            weight_perturb_value: 0.0,
            bias_perturb_chance: 0.0,
            bias_perturb_value: 0.0,
            add_node_prob: 0.0,
            add_connection_prob: 0.0,
            mutate_weights_prob: 0.0,
            mutate_biases_prob: 0.0,
            mutate_toggle_enable_prob: 0.0,
            mutate_reenable_prob: 0.0,
            mutate_remove_connection_prob: 0.0,
            mutate_remove_node_prob: 0.0,
            mutate_add_gate_prob: 0.0,
            mutate_activation_function_prob: 0.0,
            max_mutation_attempts: 0,
            excess_coeff: 0.0,
            disjoint_coeff: 0.0,
            weight_coeff: 0.0,
            gates_coeff: 0.0,
            mate_avg_genes_prob: 0.0,
            inherit_disable_chance: 0.0,
            initial_mutations: 0,
        }
    }

    /// Clamps `value` into `[min_val, max_val]` and rounds
    /// it to `value_precision` decimal places.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::GeneticConfig;
    ///
    /// let cfg = GeneticConfig::default();
    /// assert_eq!(cfg.bound_value(1.23456), 1.235);
    /// assert_eq!(cfg.bound_value(1000.0), 99.999);
    /// ```
    pub fn bound_value(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.value_precision);
        (value.clamp(self.min_val, self.max_val) * scale).round() / scale
    }
}

impl Default for GeneticConfig {
    /// Reference configuration for two-input,
    /// three-output genomes.
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap_or(NonZeroUsize::MIN),
            output_count: NonZeroUsize::new(3).unwrap_or(NonZeroUsize::MIN),
            output_activation: ActivationFunction::Sigmoid,
            min_val: -99.999,
            max_val: 99.999,
            value_precision: 3,
            weight_perturb_chance: 0.6,
            weight_perturb_value: 2.5,
            bias_perturb_chance: 0.6,
            bias_perturb_value: 2.5,
            add_node_prob: 0.2,
            add_connection_prob: 0.3,
            mutate_weights_prob: 0.6,
            mutate_biases_prob: 0.6,
            mutate_toggle_enable_prob: 0.1,
            mutate_reenable_prob: 0.05,
            mutate_remove_connection_prob: 0.1,
            mutate_remove_node_prob: 0.05,
            mutate_add_gate_prob: 0.05,
            mutate_activation_function_prob: 0.1,
            max_mutation_attempts: 1000,
            excess_coeff: 2.0,
            disjoint_coeff: 2.0,
            weight_coeff: 1.0,
            gates_coeff: 1.0,
            mate_avg_genes_prob: 0.4,
            inherit_disable_chance: 0.75,
            initial_mutations: 10,
        }
    }
}
