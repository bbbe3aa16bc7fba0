//! Import from a flattened device tree blob (DTB).

use crate::{DeviceTree, NodeId, TopologyError};
use alloc::string::ToString;
use fdt::Fdt;
use fdt::node::FdtNode;
use log::debug;

impl DeviceTree {
    /// Build a tree from a DTB blob, copying every node and property.
    ///
    /// # Errors
    /// [`TopologyError::Blob`] if the blob header or structure is invalid.
    pub fn from_fdt(blob: &[u8]) -> Result<Self, TopologyError> {
        let fdt = Fdt::new(blob).map_err(|e| TopologyError::Blob(e.to_string()))?;
        let root = fdt
            .find_node("/")
            .ok_or_else(|| TopologyError::NodeNotFound("/".to_string()))?;

        let mut tree = Self::new();
        let root_id = tree.root_id();
        copy_node(&mut tree, root_id, root);
        debug!("imported {} topology nodes from {} byte blob", tree.len(), blob.len());
        Ok(tree)
    }
}

fn copy_node(tree: &mut DeviceTree, id: NodeId, node: FdtNode<'_, '_>) {
    for prop in node.properties() {
        tree.set_property(id, prop.name, prop.value.to_vec());
    }
    for child in node.children() {
        let child_id = tree.add_child(id, child.name);
        copy_node(tree, child_id, child);
    }
}
