use crate::Innovation;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Pre-activation sums are clamped to `[-ACTIVATION_CLAMP, ACTIVATION_CLAMP]`
/// before the activation function is applied.
pub const ACTIVATION_CLAMP: f64 = 1.0e6;

/// Slope of [`ActivationFunction::LeakyRelu`] for negative inputs.
pub const LEAKY_RELU_SLOPE: f64 = 0.01;

/// The activation function a node applies to its
/// accumulated pre-activation value.
///
/// Only the tag is ever persisted; the function itself
/// is dispatched through [`ActivationFunction::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    // x
    Identity,
    // 1 / (1 + exp(-x))
    Sigmoid,
    // max(0, x)
    Relu,
    // x if x > 0, 0.01x otherwise
    LeakyRelu,
    // tanh(x)
    Tanh,
}

impl ActivationFunction {
    /// Every available activation function.
    pub const ALL: [ActivationFunction; 5] = [
        ActivationFunction::Identity,
        ActivationFunction::Sigmoid,
        ActivationFunction::Relu,
        ActivationFunction::LeakyRelu,
        ActivationFunction::Tanh,
    ];

    /// Applies the function to `x`. The input is clamped
    /// to [`ACTIVATION_CLAMP`] first.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::ActivationFunction;
    ///
    /// assert_eq!(ActivationFunction::Identity.apply(2.5), 2.5);
    /// assert_eq!(ActivationFunction::Relu.apply(-3.0), 0.0);
    /// assert!((ActivationFunction::Sigmoid.apply(0.0) - 0.5).abs() < f64::EPSILON);
    /// assert_eq!(ActivationFunction::Identity.apply(f64::INFINITY), 1.0e6);
    /// ```
    pub fn apply(self, x: f64) -> f64 {
        let x = x.clamp(-ACTIVATION_CLAMP, ACTIVATION_CLAMP);
        match self {
            ActivationFunction::Identity => x,
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::Relu => {
                if x < 0.0 {
                    0.0
                } else {
                    x
                }
            }
            ActivationFunction::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_RELU_SLOPE * x
                }
            }
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Returns a uniformly chosen activation function.
    pub fn random<R: Rng>(rng: &mut R) -> ActivationFunction {
        *Self::ALL
            .choose(rng)
            .unwrap_or(&ActivationFunction::Identity)
    }

    /// Returns a uniformly chosen activation function
    /// different from `self`.
    pub fn random_other<R: Rng>(self, rng: &mut R) -> ActivationFunction {
        let others: Vec<ActivationFunction> =
            Self::ALL.iter().copied().filter(|f| *f != self).collect();
        *others.choose(rng).unwrap_or(&self)
    }
}

/// A NodeType indicates the function of
/// the node within the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Input nodes. Their value is injected on activation.
    Input,
    /// Output nodes.
    Output,
    /// Hidden nodes, created by node addition mutations.
    Hidden,
}

/// Nodes are the structural elements of genomes
/// between which connections are created.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: Innovation,
    node_type: NodeType,
    activation_function: ActivationFunction,
    bias: f64,
}

impl Node {
    /// Generate a new node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::{ActivationFunction, Node, NodeType};
    ///
    /// let node = Node::new(5, NodeType::Hidden, ActivationFunction::Tanh, 0.25);
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.bias(), 0.25);
    /// ```
    pub fn new(
        id: Innovation,
        node_type: NodeType,
        activation_function: ActivationFunction,
        bias: f64,
    ) -> Node {
        Node {
            id,
            node_type,
            activation_function,
            bias,
        }
    }

    /// Returns the node's innovation number.
    pub fn id(&self) -> Innovation {
        self.id
    }

    /// Returns the node's type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the node's activation function.
    pub fn activation_function(&self) -> ActivationFunction {
        self.activation_function
    }

    /// Returns the node's bias.
    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub(crate) fn set_activation_function(&mut self, activation_function: ActivationFunction) {
        self.activation_function = activation_function;
    }

    pub(crate) fn set_bias(&mut self, bias: f64) {
        self.bias = bias;
    }

    /// Returns `true` if the node is an input node.
    pub fn is_input(&self) -> bool {
        self.node_type == NodeType::Input
    }
}
