use crate::Innovation;

/// Connections are the weighted, directed links between
/// a genome's nodes.
///
/// A connection refers to its endpoints (and its optional
/// gater) by node innovation number; the nodes themselves
/// are owned by the genome.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    id: Innovation,
    input: Innovation,
    output: Innovation,
    weight: f64,
    gater: Option<Innovation>,
    enabled: bool,
}

impl Connection {
    /// Creates a new, enabled and ungated connection.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::Connection;
    ///
    /// let connection = Connection::new(42, 0, 3, 1.5);
    /// assert_eq!(connection.endpoints(), (0, 3));
    /// assert!(connection.enabled());
    /// assert_eq!(connection.gater(), None);
    /// ```
    pub fn new(id: Innovation, input: Innovation, output: Innovation, weight: f64) -> Connection {
        Connection {
            id,
            input,
            output,
            weight,
            gater: None,
            enabled: true,
        }
    }

    /// Returns the connection with the given gater.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::Connection;
    ///
    /// let connection = Connection::new(0, 1, 2, 1.0).with_gater(Some(3)).with_enabled(false);
    /// assert_eq!(connection.gater(), Some(3));
    /// assert!(!connection.enabled());
    /// ```
    pub fn with_gater(mut self, gater: Option<Innovation>) -> Connection {
        self.gater = gater;
        self
    }

    /// Returns the connection with the given enabled status.
    pub fn with_enabled(mut self, enabled: bool) -> Connection {
        self.enabled = enabled;
        self
    }

    /// Returns the connection's innovation number.
    pub fn id(&self) -> Innovation {
        self.id
    }

    /// Returns the innovation number of the input node.
    pub fn input(&self) -> Innovation {
        self.input
    }

    /// Returns the innovation number of the output node.
    pub fn output(&self) -> Innovation {
        self.output
    }

    /// Returns `(input, output)`.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.input, self.output)
    }

    /// Returns the connection's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns the node gating this connection, if any.
    pub fn gater(&self) -> Option<Innovation> {
        self.gater
    }

    /// Returns whether the connection is expressed
    /// in the genome's phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` if both endpoints are the same node.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::Connection;
    ///
    /// assert!(Connection::new(0, 4, 4, 1.0).is_self_loop());
    /// assert!(!Connection::new(1, 4, 5, 1.0).is_self_loop());
    /// ```
    pub fn is_self_loop(&self) -> bool {
        self.input == self.output
    }

    /// Returns `true` if `node` is either endpoint.
    pub fn touches(&self, node: Innovation) -> bool {
        self.input == node || self.output == node
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub(crate) fn set_gater(&mut self, gater: Option<Innovation>) {
        self.gater = gater;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn toggle_enabled(&mut self) {
        self.enabled = !self.enabled;
    }
}
