use core::fmt;
use dmamem_addresses::PhysicalAddress;

/// The physical addressing capability of a device.
///
/// A buffer is usable by the device only if its last byte lies at or below
/// [`DmaMask::limit`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct DmaMask(u64);

impl DmaMask {
    /// Mask for a device that drives `bits` address lines. Saturates at 64.
    #[must_use]
    pub const fn bits(bits: u32) -> Self {
        if bits >= 64 {
            Self(u64::MAX)
        } else {
            Self((1u64 << bits) - 1)
        }
    }

    /// Highest addressable byte.
    #[must_use]
    pub const fn limit(self) -> u64 {
        self.0
    }

    /// Whether `size` bytes at `base` are fully addressable.
    #[must_use]
    pub const fn allows(self, base: PhysicalAddress, size: u64) -> bool {
        if size == 0 {
            return base.as_u64() <= self.0;
        }
        match base.as_u64().checked_add(size - 1) {
            Some(last) => last <= self.0,
            None => false,
        }
    }
}

impl Default for DmaMask {
    /// The 32-bit mask devices get unless they ask for more.
    fn default() -> Self {
        Self::bits(32)
    }
}

impl fmt::Debug for DmaMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DmaMask({:#X})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_two_bit_mask() {
        let m = DmaMask::bits(32);
        assert_eq!(m.limit(), 0xFFFF_FFFF);
        assert!(m.allows(PhysicalAddress::new(0x8000_0000), 0x8000_0000));
        assert!(!m.allows(PhysicalAddress::new(0x8000_0000), 0x8000_0001));
        assert!(!m.allows(PhysicalAddress::new(u64::MAX), 2));
    }

    #[test]
    fn wide_masks_saturate() {
        assert_eq!(DmaMask::bits(64).limit(), u64::MAX);
        assert_eq!(DmaMask::bits(80).limit(), u64::MAX);
        assert_eq!(DmaMask::default(), DmaMask::bits(32));
    }
}
