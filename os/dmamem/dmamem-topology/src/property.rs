use crate::TopologyError;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Size of one cell in bytes.
const CELL: usize = 4;

/// A named property holding the raw big-endian value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    value: Vec<u8>,
}

impl Property {
    pub(crate) fn new(name: &str, value: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.value
    }

    /// Empty properties are boolean flags (`no-map;`).
    #[must_use]
    pub fn is_flag(&self) -> bool {
        self.value.is_empty()
    }

    /// Number of whole cells in the value.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.value.len() / CELL
    }

    /// The cell at raw offset `index`, if the value is long enough.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<u32> {
        let start = index.checked_mul(CELL)?;
        let bytes = self.value.get(start..start.checked_add(CELL)?)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Like [`cell`](Self::cell) but with a descriptive error.
    ///
    /// # Errors
    /// [`TopologyError::CellIndexOutOfRange`] if the value is too short.
    pub fn cell_at(&self, index: usize) -> Result<u32, TopologyError> {
        self.cell(index)
            .ok_or_else(|| TopologyError::CellIndexOutOfRange {
                property: self.name.clone(),
                index,
                cells: self.cell_count(),
            })
    }

    /// All cells, in order.
    ///
    /// # Errors
    /// [`TopologyError::PropertyLength`] if the value is not cell-sized.
    pub fn cells(&self) -> Result<Vec<u32>, TopologyError> {
        if self.value.len() % CELL != 0 {
            return Err(TopologyError::PropertyLength {
                property: self.name.clone(),
                len: self.value.len(),
            });
        }
        Ok(self
            .value
            .chunks_exact(CELL)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// NUL-separated string list (`compatible = "a", "b";`).
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.value
            .split(|b| *b == 0)
            .filter(|s| !s.is_empty())
            .filter_map(|s| core::str::from_utf8(s).ok())
    }
}
