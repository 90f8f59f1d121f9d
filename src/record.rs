//! Alignment records, as yielded by an alignment input.
//!
//! This crate does not parse alignment containers. Anything that can produce
//! [`Record`]s (see [`Input`](crate::alignment::Input)) can feed the coverage
//! computation.

use omics::coordinate::position::Number;

use crate::Interval;
use crate::interval;

pub mod flags;

pub use flags::Flags;

/// A single aligned read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The reference sequence (contig) the read is aligned to.
    contig: String,

    /// The read name.
    name: String,

    /// The flags.
    flags: Flags,

    /// The aligned span on the reference (1-based, closed).
    span: Interval,

    /// The alignment start of the mate, if any.
    mate_start: Option<Number>,
}

impl Record {
    /// Attempts to create a new [`Record`].
    ///
    /// `start` and `end` are the 1-based, inclusive alignment start and end.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::record::Flags;
    /// use fragcov::Record;
    ///
    /// let flags = Flags::PAIRED | Flags::PROPER_PAIR | Flags::FIRST_OF_PAIR;
    /// let record = Record::try_new("chr1", "read0", flags, 3, 4, Some(6))?;
    ///
    /// assert_eq!(record.contig(), "chr1");
    /// assert_eq!(record.span().len(), 2);
    /// assert_eq!(record.mate_start(), Some(6));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(
        contig: impl Into<String>,
        name: impl Into<String>,
        flags: Flags,
        start: Number,
        end: Number,
        mate_start: Option<Number>,
    ) -> Result<Self, interval::Error> {
        Ok(Self {
            contig: contig.into(),
            name: name.into(),
            flags,
            span: Interval::try_new(start, end)?,
            mate_start,
        })
    }

    /// Gets the contig the read is aligned to.
    pub fn contig(&self) -> &str {
        &self.contig
    }

    /// Gets the read name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the flags.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Gets the aligned span.
    pub fn span(&self) -> Interval {
        self.span
    }

    /// Gets the alignment start of the mate.
    pub fn mate_start(&self) -> Option<Number> {
        self.mate_start
    }
}
