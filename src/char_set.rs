//! Module with the code unit set type used by single-unit readers.

use crate::{Result, StreamlexError, StreamlexErrorKind};

/// A set of code units (bytes).
///
/// Readers built from a `CharSet` consume exactly one code unit if it is a member of the set.
/// Since matching operates on raw code units, a multi-byte UTF-8 character can not be a member
/// as a whole; only its individual bytes can.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
    bits: [u64; 4],
}

impl CharSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set containing all code units in the inclusive range `lo..=hi`.
    pub fn range(lo: u8, hi: u8) -> Result<Self> {
        if lo > hi {
            return Err(StreamlexError::new(StreamlexErrorKind::InvalidRange(lo, hi)));
        }
        let mut set = Self::new();
        set.insert_range(lo, hi);
        Ok(set)
    }

    /// Creates a set from the given code units.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut set = Self::new();
        for b in bytes {
            set.insert(*b);
        }
        set
    }

    /// Adds a single code unit.
    #[inline]
    pub fn insert(&mut self, b: u8) {
        self.bits[(b >> 6) as usize] |= 1u64 << (b & 63);
    }

    /// Adds all code units in `lo..=hi`.
    pub fn insert_range(&mut self, lo: u8, hi: u8) {
        for b in lo..=hi {
            self.insert(b);
        }
    }

    /// Checks if the code unit is a member of the set.
    #[inline]
    pub fn contains(&self, b: u8) -> bool {
        self.bits[(b >> 6) as usize] & (1u64 << (b & 63)) != 0
    }

    /// Returns the complement of the set.
    pub fn negate(&self) -> Self {
        Self {
            bits: [!self.bits[0], !self.bits[1], !self.bits[2], !self.bits[3]],
        }
    }

    /// Returns the union of both sets.
    pub fn union(&self, other: &Self) -> Self {
        let mut bits = self.bits;
        for (l, r) in bits.iter_mut().zip(other.bits.iter()) {
            *l |= r;
        }
        Self { bits }
    }

    /// Checks if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|b| *b == 0)
    }

    /// Returns the number of code units in the set.
    pub fn len(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Returns the set as a sorted list of maximal inclusive ranges.
    pub fn ranges(&self) -> Vec<(u8, u8)> {
        let mut ranges = Vec::new();
        let mut start: Option<u8> = None;
        for b in 0..=255u8 {
            match (self.contains(b), start) {
                (true, None) => start = Some(b),
                (false, Some(s)) => {
                    ranges.push((s, b - 1));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            ranges.push((s, 255));
        }
        ranges
    }

    /// Renders the set as a Rust pattern over `u8`, e.g. `b'0'..=b'9' | b'_'`.
    pub(crate) fn to_pattern(&self) -> String {
        let ranges = self.ranges();
        // Empty sets are normalized to a never matching reader before code is generated.
        debug_assert!(!ranges.is_empty());
        ranges
            .iter()
            .map(|(lo, hi)| {
                if lo == hi {
                    byte_literal(*lo)
                } else {
                    format!("{}..={}", byte_literal(*lo), byte_literal(*hi))
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Renders a byte as a Rust byte literal.
pub(crate) fn byte_literal(b: u8) -> String {
    format!("b'{}'", std::ascii::escape_default(b))
}

impl std::fmt::Debug for CharSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CharSet[")?;
        for (i, (lo, hi)) in self.ranges().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if lo == hi {
                write!(f, "{}", std::ascii::escape_default(*lo))?;
            } else {
                write!(
                    f,
                    "{}-{}",
                    std::ascii::escape_default(*lo),
                    std::ascii::escape_default(*hi)
                )?;
            }
        }
        write!(f, "]")
    }
}
