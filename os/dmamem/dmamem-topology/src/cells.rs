use crate::{Node, TopologyError};

/// Decodes 64-bit quantities stored as `{hi, lo}` cell pairs.
///
/// The decoder knows nothing about the layout of the property beyond the
/// requested index; callers pick the index that holds the field they want
/// (for `reg = <addr size>` pairs, index 0 is the address and index 1 the
/// size).
pub struct CellPairDecoder;

impl CellPairDecoder {
    /// Raw cell offsets `(hi, lo)` of the 64-bit value at `index`.
    #[inline]
    #[must_use]
    pub const fn offsets(index: usize) -> (usize, usize) {
        (2 * index, 2 * index + 1)
    }

    /// Read the 64-bit value at logical `index` of `property` on `node`.
    ///
    /// Both cells must be present; nothing is returned for a half pair.
    ///
    /// # Errors
    /// - [`TopologyError::PropertyNotFound`] if `node` has no `property`.
    /// - [`TopologyError::CellIndexOutOfRange`] if either cell is beyond the
    ///   end of the value.
    pub fn read_u64(node: &Node<'_>, property: &str, index: usize) -> Result<u64, TopologyError> {
        let prop = node.require(property)?;
        let (hi, lo) = Self::offsets(index);
        let hi = prop.cell_at(hi)?;
        let lo = prop.cell_at(lo)?;
        Ok((u64::from(hi) << 32) | u64::from(lo))
    }
}
