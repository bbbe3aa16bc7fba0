use crate::{COMPATIBLE, LINUX_PHANDLE, Node, PHANDLE, Property};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Index of a node inside its [`DeviceTree`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) properties: Vec<Property>,
}

/// An owned topology tree. Nodes are stored in an arena and referenced by
/// [`NodeId`]; [`Node`] is a borrowed view used for all queries.
#[derive(Debug, Clone)]
pub struct DeviceTree {
    nodes: Vec<NodeData>,
}

impl Default for DeviceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceTree {
    /// A tree holding only the root node `/`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: alloc::vec![NodeData {
                name: String::new(),
                parent: None,
                children: Vec::new(),
                properties: Vec::new(),
            }],
        }
    }

    #[must_use]
    pub const fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.node(self.root_id())
    }

    /// View of the node `id`.
    ///
    /// # Panics
    /// If `id` was not handed out by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Node<'_> {
        assert!(id.0 < self.nodes.len(), "node id from a different tree");
        Node::new(self, id)
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    /// Number of nodes including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Append a child named `name` (unit address included, e.g. `bank0@0`).
    pub fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            properties: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Set (or replace) a property from raw big-endian bytes.
    pub fn set_property(&mut self, node: NodeId, name: &str, value: Vec<u8>) {
        let props = &mut self.nodes[node.0].properties;
        if let Some(existing) = props.iter_mut().find(|p| p.name() == name) {
            *existing = Property::new(name, value);
        } else {
            props.push(Property::new(name, value));
        }
    }

    /// Set a property to a list of 32-bit cells.
    pub fn set_cells(&mut self, node: NodeId, name: &str, cells: &[u32]) {
        let value = cells.iter().flat_map(|c| c.to_be_bytes()).collect();
        self.set_property(node, name, value);
    }

    /// Set a property to a list of NUL-terminated strings.
    pub fn set_strings(&mut self, node: NodeId, name: &str, strings: &[&str]) {
        let mut value = Vec::new();
        for s in strings {
            value.extend_from_slice(s.as_bytes());
            value.push(0);
        }
        self.set_property(node, name, value);
    }

    /// Set an empty (boolean) property such as `no-map`.
    pub fn set_flag(&mut self, node: NodeId, name: &str) {
        self.set_property(node, name, Vec::new());
    }

    /// Give `node` a phandle so other nodes can reference it.
    pub fn set_phandle(&mut self, node: NodeId, phandle: u32) {
        self.set_cells(node, PHANDLE, &[phandle]);
    }

    /// Every node, depth-first from the root.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        let mut stack = alloc::vec![self.root_id()];
        core::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.data(id).children.iter().rev().copied());
            Some(self.node(id))
        })
    }

    /// Look up a node by absolute path, e.g. `/reserved-memory/bank0@0`.
    ///
    /// A path component without a unit address also matches a node that has
    /// one (`/reserved-memory/bank0` finds `bank0@0`).
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<Node<'_>> {
        let mut current = self.root();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = current.children().find(|child| {
                let name = child.name();
                name == component || name.split('@').next() == Some(component)
            })?;
        }
        Some(current)
    }

    /// The node carrying `phandle` (or `linux,phandle`) equal to `phandle`.
    #[must_use]
    pub fn find_by_phandle(&self, phandle: u32) -> Option<Node<'_>> {
        self.nodes().find(|n| {
            [PHANDLE, LINUX_PHANDLE]
                .iter()
                .any(|p| n.property(p).and_then(|v| v.cell(0)) == Some(phandle))
        })
    }

    /// All nodes whose `compatible` list contains `compatible`.
    pub fn find_compatible<'a>(&'a self, compatible: &'a str) -> impl Iterator<Item = Node<'a>> {
        self.nodes().filter(move |n| {
            n.property(COMPATIBLE)
                .is_some_and(|p| p.strings().any(|s| s == compatible))
        })
    }
}
