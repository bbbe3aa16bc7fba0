use alloc::string::String;

/// Failures when querying the topology tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("property `{property}` not present on node `{node}`")]
    PropertyNotFound { node: String, property: String },
    #[error("property `{property}` has {cells} cells, cell {index} requested")]
    CellIndexOutOfRange {
        property: String,
        index: usize,
        cells: usize,
    },
    #[error("property `{property}` is {len} bytes, not a whole number of cells")]
    PropertyLength { property: String, len: usize },
    #[error("no node with phandle {0:#x}")]
    DanglingPhandle(u32),
    #[error("no node at `{0}`")]
    NodeNotFound(String),
    #[error("invalid flattened device tree: {0}")]
    Blob(String),
}

impl TopologyError {
    /// Whether the error means "the requested value does not exist"
    /// (absent property, short property, unresolved reference).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PropertyNotFound { .. }
                | Self::CellIndexOutOfRange { .. }
                | Self::DanglingPhandle(_)
                | Self::NodeNotFound(_)
        )
    }
}
