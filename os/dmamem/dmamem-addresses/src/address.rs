/// Generates the arithmetic shared by [`PhysicalAddress`](crate::PhysicalAddress)
/// and [`VirtualAddress`](crate::VirtualAddress). Each type keeps its own
/// conversion into frames or pages.
macro_rules! address_newtype {
    ($name:ident, $debug_tag:literal) => {
        impl $name {
            #[inline]
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            #[inline]
            #[must_use]
            pub const fn zero() -> Self {
                Self(0)
            }

            #[inline]
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0
            }

            /// Byte offset within the enclosing `S`-sized granule.
            #[inline]
            #[must_use]
            pub const fn offset<S: $crate::PageSize>(self) -> u64 {
                self.0 % S::SIZE
            }

            #[inline]
            #[must_use]
            pub const fn is_aligned<S: $crate::PageSize>(self) -> bool {
                self.0 % S::SIZE == 0
            }

            /// `None` if `self + bytes` wraps the 64-bit space.
            #[inline]
            #[must_use]
            pub const fn checked_add(self, bytes: u64) -> Option<Self> {
                if let Some(raw) = self.0.checked_add(bytes) {
                    Some(Self(raw))
                } else {
                    None
                }
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str($debug_tag)?;
                f.write_str("(")?;
                ::core::fmt::Display::fmt(self, f)?;
                f.write_str(")")
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{:#018X}", self.0)
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            #[inline]
            fn from(addr: $name) -> Self {
                addr.0
            }
        }

        impl ::core::ops::Add<u64> for $name {
            type Output = Self;

            #[inline]
            fn add(self, bytes: u64) -> Self {
                Self(self.0 + bytes)
            }
        }
    };
}

pub(crate) use address_newtype;
