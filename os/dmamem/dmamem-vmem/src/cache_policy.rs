use core::fmt;
use core::str::FromStr;

/// Memory-access attribute applied to a user mapping of the region.
///
/// | Policy | x86 PAT slot (Linux layout) | Use |
/// |--------|-----------------------------|-----|
/// | [`WriteCombining`](Self::WriteCombining) | 1 (`PWT`) | Streaming/bulk device buffers; writes are merged, not strictly ordered. |
/// | [`Uncached`](Self::Uncached) | 3 (`PCD` + `PWT`) | Strictly ordered, uncached access. |
/// | [`Cached`](Self::Cached) | 0 | Ordinary write-back RAM. |
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CachePolicy {
    #[default]
    WriteCombining,
    Uncached,
    Cached,
}

impl CachePolicy {
    pub const ALL: [Self; 3] = [Self::WriteCombining, Self::Uncached, Self::Cached];

    /// The configuration name of this policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WriteCombining => "write_combining",
            Self::Uncached => "uncached",
            Self::Cached => "cached",
        }
    }

    /// `(PWT, PCD)` bits selecting this policy's PAT slot.
    #[must_use]
    pub const fn pat_bits(self) -> (bool, bool) {
        match self {
            Self::WriteCombining => (true, false),
            Self::Uncached => (true, true),
            Self::Cached => (false, false),
        }
    }

    /// Inverse of [`pat_bits`](Self::pat_bits); slots we never program
    /// (UC-, slot 2) yield `None`.
    #[must_use]
    pub const fn from_pat_bits(write_through: bool, cache_disabled: bool) -> Option<Self> {
        match (write_through, cache_disabled) {
            (true, false) => Some(Self::WriteCombining),
            (true, true) => Some(Self::Uncached),
            (false, false) => Some(Self::Cached),
            (false, true) => None,
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("unknown cache policy (expected write_combining, uncached or cached)")]
pub struct ParseCachePolicyError;

impl FromStr for CachePolicy {
    type Err = ParseCachePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(ParseCachePolicyError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_names_only() {
        assert_eq!("write_combining".parse::<CachePolicy>(), Ok(CachePolicy::WriteCombining));
        assert_eq!("uncached".parse::<CachePolicy>(), Ok(CachePolicy::Uncached));
        assert_eq!("cached".parse::<CachePolicy>(), Ok(CachePolicy::Cached));
        assert_eq!("wc".parse::<CachePolicy>(), Err(ParseCachePolicyError));
        assert_eq!("".parse::<CachePolicy>(), Err(ParseCachePolicyError));
    }

    #[test]
    fn defaults_to_write_combining() {
        assert_eq!(CachePolicy::default(), CachePolicy::WriteCombining);
    }

    #[test]
    fn pat_bits_round_trip() {
        for p in CachePolicy::ALL {
            let (wt, cd) = p.pat_bits();
            assert_eq!(CachePolicy::from_pat_bits(wt, cd), Some(p));
            assert_eq!(p.to_string().parse::<CachePolicy>(), Ok(p));
        }
        assert_eq!(CachePolicy::from_pat_bits(false, true), None);
    }
}
