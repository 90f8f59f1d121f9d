//! Alignment record flags.

/// The flag word of an alignment record.
///
/// The bit layout follows the SAM specification, so the raw flag of a SAM or
/// BAM record can be passed straight through with [`Flags::from`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Flags(u16);

impl Flags {
    /// The template has multiple segments (the read is paired).
    pub const PAIRED: Flags = Flags(0x1);

    /// Each segment is properly aligned (a concordant pair).
    pub const PROPER_PAIR: Flags = Flags(0x2);

    /// The segment is unmapped.
    pub const UNMAPPED: Flags = Flags(0x4);

    /// The mate is unmapped.
    pub const MATE_UNMAPPED: Flags = Flags(0x8);

    /// The segment is reverse complemented.
    pub const REVERSE_COMPLEMENTED: Flags = Flags(0x10);

    /// The mate is reverse complemented.
    pub const MATE_REVERSE_COMPLEMENTED: Flags = Flags(0x20);

    /// The first segment of the template.
    pub const FIRST_OF_PAIR: Flags = Flags(0x40);

    /// The last segment of the template.
    pub const SECOND_OF_PAIR: Flags = Flags(0x80);

    /// A secondary alignment.
    pub const SECONDARY: Flags = Flags(0x100);

    /// The read failed quality checks.
    pub const QC_FAIL: Flags = Flags(0x200);

    /// A PCR or optical duplicate.
    pub const DUPLICATE: Flags = Flags(0x400);

    /// A supplementary alignment.
    pub const SUPPLEMENTARY: Flags = Flags(0x800);

    /// Creates an empty set of flags.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Gets the raw flag word.
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Returns whether every bit in `other` is also set in `self`.
    pub const fn contains(&self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns whether the read is paired.
    pub const fn is_paired(&self) -> bool {
        self.contains(Self::PAIRED)
    }

    /// Returns whether the read is part of a proper (concordant) pair.
    pub const fn is_proper_pair(&self) -> bool {
        self.contains(Self::PROPER_PAIR)
    }

    /// Returns whether the read is unmapped.
    pub const fn is_unmapped(&self) -> bool {
        self.contains(Self::UNMAPPED)
    }

    /// Returns whether the read is the first of its pair.
    pub const fn is_first_of_pair(&self) -> bool {
        self.contains(Self::FIRST_OF_PAIR)
    }

    /// Returns whether the read is the second of its pair.
    pub const fn is_second_of_pair(&self) -> bool {
        self.contains(Self::SECOND_OF_PAIR)
    }
}

impl From<u16> for Flags {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Flags> for u16 {
    fn from(value: Flags) -> Self {
        value.0
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Self) -> Self::Output {
        Flags(self.0 | rhs.0)
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}
