//! # Physical Memory Backing
//!
//! [`PhysicalMemory`] abstracts byte access to physical addresses. On the
//! host, [`SimulatedRam`] stands in for the memory bus: a sparse set of
//! 4 KiB frames that start out zeroed and are materialized on first write,
//! so a 512 MiB reserved pool costs nothing until it is touched.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use dmamem_addresses::{PageSize, PhysicalAddress, Size4K};
use dmamem_sync::SpinLock;

const FRAME: usize = Size4K::SIZE as usize;

/// Byte-granular access to physical memory.
pub trait PhysicalMemory {
    /// Fill `buf` from `pa..pa + buf.len()`.
    fn read(&self, pa: PhysicalAddress, buf: &mut [u8]);

    /// Store `bytes` at `pa..pa + bytes.len()`.
    fn write(&self, pa: PhysicalAddress, bytes: &[u8]);
}

/// Sparse, zero-initialized simulated RAM shared by all address spaces.
pub struct SimulatedRam {
    frames: SpinLock<BTreeMap<u64, Box<[u8; FRAME]>>>,
}

impl Default for SimulatedRam {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRam {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames: SpinLock::new(BTreeMap::new()),
        }
    }

    /// Number of frames that have been written to.
    #[must_use]
    pub fn resident_frames(&self) -> usize {
        self.frames.with_lock(|f| f.len())
    }
}

/// Split `pa..pa + len` into `(frame number, offset in frame, chunk len)`.
fn chunks(pa: PhysicalAddress, len: usize) -> impl Iterator<Item = (u64, usize, usize)> {
    let mut addr = pa.as_u64();
    let mut left = len;
    core::iter::from_fn(move || {
        if left == 0 {
            return None;
        }
        let pfn = addr >> Size4K::SHIFT;
        #[allow(clippy::cast_possible_truncation)]
        let off = (addr & (Size4K::SIZE - 1)) as usize;
        let n = left.min(FRAME - off);
        addr += n as u64;
        left -= n;
        Some((pfn, off, n))
    })
}

impl PhysicalMemory for SimulatedRam {
    fn read(&self, pa: PhysicalAddress, buf: &mut [u8]) {
        let frames = self.frames.lock();
        let mut done = 0;
        for (pfn, off, n) in chunks(pa, buf.len()) {
            let dst = &mut buf[done..done + n];
            match frames.get(&pfn) {
                Some(frame) => dst.copy_from_slice(&frame[off..off + n]),
                None => dst.fill(0),
            }
            done += n;
        }
    }

    fn write(&self, pa: PhysicalAddress, bytes: &[u8]) {
        let mut frames = self.frames.lock();
        let mut done = 0;
        for (pfn, off, n) in chunks(pa, bytes.len()) {
            let frame = frames
                .entry(pfn)
                .or_insert_with(|| Box::new([0u8; FRAME]));
            frame[off..off + n].copy_from_slice(&bytes[done..done + n]);
            done += n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_memory_reads_zero() {
        let ram = SimulatedRam::new();
        let mut buf = [0xAAu8; 16];
        ram.read(PhysicalAddress::new(0x8000_0000), &mut buf);
        assert_eq!(buf, [0u8; 16]);
        assert_eq!(ram.resident_frames(), 0);
    }

    #[test]
    fn writes_spanning_frames_read_back() {
        let ram = SimulatedRam::new();
        let pa = PhysicalAddress::new(0x8000_0FFE);
        ram.write(pa, &[1, 2, 3, 4]);
        assert_eq!(ram.resident_frames(), 2);

        let mut buf = [0u8; 4];
        ram.read(pa, &mut buf);
        assert_eq!(buf, [1, 2, 3, 4]);

        let mut tail = [0u8; 2];
        ram.read(PhysicalAddress::new(0x8000_1000), &mut tail);
        assert_eq!(tail, [3, 4]);
    }
}
