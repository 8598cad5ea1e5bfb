use crate::genomics::{ActivationFunction, Connection, Genome, GenomeError, Node, NodeType};
use crate::Innovation;

use serde::{Deserialize, Serialize};

/// The persisted form of a [`Genome`].
///
/// Serializes as
/// `{"nodes": [...], "connections": [...]}`, with nodes and
/// connections in insertion order. Loading a record validates
/// every reference and recompiles the phenotype.
///
/// # Examples
/// ```
/// use gatedneat::genomics::{Genome, GenomeRecord};
///
/// let json = r#"{
///     "nodes": [
///         {"node_id": 0, "node_type": "input", "activation_function": "identity", "bias": 0.0},
///         {"node_id": 1, "node_type": "output", "activation_function": "sigmoid", "bias": 0.5}
///     ],
///     "connections": [
///         {"connection_id": 0, "weight": 1.25, "input_node": 0, "gater_node": null,
///          "output_node": 1, "is_enabled": true}
///     ]
/// }"#;
/// let record: GenomeRecord = serde_json::from_str(json).unwrap();
/// let genome = Genome::try_from(record.clone()).unwrap();
///
/// assert_eq!(genome.connections()[0].weight(), 1.25);
/// assert_eq!(GenomeRecord::from(&genome), record);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomeRecord {
    pub nodes: Vec<NodeRecord>,
    pub connections: Vec<ConnectionRecord>,
}

/// The persisted form of a [`Node`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: Innovation,
    pub node_type: NodeType,
    pub activation_function: ActivationFunction,
    pub bias: f64,
}

/// The persisted form of a [`Connection`].
/// `gater_node` is `null` for ungated connections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub connection_id: Innovation,
    pub weight: f64,
    pub input_node: Innovation,
    pub gater_node: Option<Innovation>,
    pub output_node: Innovation,
    pub is_enabled: bool,
}

impl From<&Genome> for GenomeRecord {
    fn from(genome: &Genome) -> GenomeRecord {
        GenomeRecord {
            nodes: genome
                .nodes()
                .iter()
                .map(|n| NodeRecord {
                    node_id: n.id(),
                    node_type: n.node_type(),
                    activation_function: n.activation_function(),
                    bias: n.bias(),
                })
                .collect(),
            connections: genome
                .connections()
                .iter()
                .map(|c| ConnectionRecord {
                    connection_id: c.id(),
                    weight: c.weight(),
                    input_node: c.input(),
                    gater_node: c.gater(),
                    output_node: c.output(),
                    is_enabled: c.enabled(),
                })
                .collect(),
        }
    }
}

impl From<Genome> for GenomeRecord {
    fn from(genome: Genome) -> GenomeRecord {
        GenomeRecord::from(&genome)
    }
}

impl TryFrom<GenomeRecord> for Genome {
    type Error = GenomeError;

    fn try_from(record: GenomeRecord) -> Result<Genome, GenomeError> {
        let mut genome = Genome::empty();
        for n in record.nodes {
            let node = Node::new(n.node_id, n.node_type, n.activation_function, n.bias);
            genome.check_node(&node)?;
            genome.insert_node(node);
        }
        for c in record.connections {
            let connection = Connection::new(c.connection_id, c.input_node, c.output_node, c.weight)
                .with_gater(c.gater_node)
                .with_enabled(c.is_enabled);
            genome.check_connection(&connection)?;
            genome.insert_connection(connection);
        }
        genome.create_phenotype();
        Ok(genome)
    }
}
