use crate::tree::NodeData;
use crate::{COMPATIBLE, CellPairDecoder, DeviceTree, NodeId, Property, TopologyError};
use alloc::string::{String, ToString};
use core::fmt;

/// Borrowed view of one node in a [`DeviceTree`].
#[derive(Copy, Clone)]
pub struct Node<'t> {
    tree: &'t DeviceTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub(crate) const fn new(tree: &'t DeviceTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    fn data(&self) -> &'t NodeData {
        self.tree.data(self.id)
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn tree(&self) -> &'t DeviceTree {
        self.tree
    }

    /// Node name including the unit address; empty for the root.
    #[must_use]
    pub fn name(&self) -> &'t str {
        &self.data().name
    }

    /// Absolute path of this node.
    #[must_use]
    pub fn path(&self) -> String {
        let Some(parent) = self.parent() else {
            return "/".to_string();
        };
        let mut path = parent.path();
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(self.name());
        path
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.data().parent.map(|p| Self::new(self.tree, p))
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |id| Node::new(tree, *id))
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&'t Property> {
        self.data().properties.iter().find(|p| p.name() == name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &'t Property> + use<'t> {
        self.data().properties.iter()
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Like [`property`](Self::property) but with a descriptive error.
    ///
    /// # Errors
    /// [`TopologyError::PropertyNotFound`] if the node lacks `name`.
    pub fn require(&self, name: &str) -> Result<&'t Property, TopologyError> {
        self.property(name)
            .ok_or_else(|| TopologyError::PropertyNotFound {
                node: self.path(),
                property: name.to_string(),
            })
    }

    /// The 32-bit cell at raw offset `index` of property `name`.
    ///
    /// # Errors
    /// The property is absent or too short.
    pub fn read_u32_index(&self, name: &str, index: usize) -> Result<u32, TopologyError> {
        self.require(name)?.cell_at(index)
    }

    /// The 64-bit value at logical index `index`; see [`CellPairDecoder`].
    ///
    /// # Errors
    /// The property is absent or too short.
    pub fn read_u64_index(&self, name: &str, index: usize) -> Result<u64, TopologyError> {
        CellPairDecoder::read_u64(self, name, index)
    }

    /// Follow the `index`-th phandle of property `name` to its target node.
    ///
    /// # Errors
    /// - [`TopologyError::PropertyNotFound`] / [`TopologyError::CellIndexOutOfRange`]
    ///   if the reference itself is missing.
    /// - [`TopologyError::DanglingPhandle`] if no node carries that phandle.
    pub fn parse_phandle(&self, name: &str, index: usize) -> Result<Node<'t>, TopologyError> {
        let phandle = self.read_u32_index(name, index)?;
        self.tree
            .find_by_phandle(phandle)
            .ok_or(TopologyError::DanglingPhandle(phandle))
    }

    /// Whether `compatible` appears in this node's compatible list.
    #[must_use]
    pub fn is_compatible(&self, compatible: &str) -> bool {
        self.property(COMPATIBLE)
            .is_some_and(|p| p.strings().any(|s| s == compatible))
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path())
            .field("properties", &self.data().properties.len())
            .finish()
    }
}
