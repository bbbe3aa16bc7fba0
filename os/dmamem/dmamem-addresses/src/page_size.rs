use core::fmt;
use core::hash::Hash;

mod sealed {
    pub trait Sealed {}
}

/// A translation granule, expressed at the type level.
///
/// Sealed; [`Size4K`] is the only granule user mappings and pools use.
pub trait PageSize:
    sealed::Sealed + Copy + Ord + Hash + fmt::Debug + Default + 'static
{
    /// Granule size in bytes; always a power of two.
    const SIZE: u64;
    /// Number of low address bits covered by one granule.
    const SHIFT: u32 = Self::SIZE.trailing_zeros();
    /// Short human-readable label, e.g. `"4K"`.
    const LABEL: &'static str;
}

macro_rules! granule {
    ($(#[$doc:meta])* $name:ident, $bytes:expr, $label:literal) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name;

        impl sealed::Sealed for $name {}

        impl PageSize for $name {
            const SIZE: u64 = $bytes;
            const LABEL: &'static str = $label;
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(<Self as PageSize>::LABEL)
            }
        }
    };
}

granule!(
    /// 4 KiB; user mappings are installed at this granule.
    Size4K,
    0x1000,
    "4K"
);
