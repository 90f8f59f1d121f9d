//! Closed, 1-based intervals on a chromosome.
//!
//! Every interval handled by this crate (fragments reconstructed from read
//! pairs, single reads, and fragment lookups) uses the convention of the
//! alignment input: positions start at one and both ends are included. A
//! coverage array index `i` therefore corresponds to position `i + 1`.

use omics::coordinate::position::Number;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to an [`Interval`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// The start position was zero.
    ZeroStart,

    /// The end position came before the start position.
    EndBeforeStart(Number, Number),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ZeroStart => write!(f, "positions are 1-based: start cannot be zero"),
            Error::EndBeforeStart(start, end) => {
                write!(f, "end position ({end}) comes before start position ({start})")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Interval
////////////////////////////////////////////////////////////////////////////////////////

/// A closed, 1-based interval.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Interval {
    /// The first position covered.
    start: Number,

    /// The last position covered.
    end: Number,
}

impl Interval {
    /// Attempts to create a new [`Interval`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::Interval;
    ///
    /// let interval = Interval::try_new(3, 7)?;
    /// assert_eq!(interval.start(), 3);
    /// assert_eq!(interval.end(), 7);
    /// assert_eq!(interval.len(), 5);
    ///
    /// assert!(Interval::try_new(0, 7).is_err());
    /// assert!(Interval::try_new(7, 3).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(start: Number, end: Number) -> Result<Self> {
        if start == 0 {
            return Err(Error::ZeroStart);
        }

        if end < start {
            return Err(Error::EndBeforeStart(start, end));
        }

        Ok(Self { start, end })
    }

    /// Gets the first position covered by the interval.
    pub fn start(&self) -> Number {
        self.start
    }

    /// Gets the last position covered by the interval.
    pub fn end(&self) -> Number {
        self.end
    }

    /// Gets the number of positions covered by the interval.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> Number {
        self.end - self.start + 1
    }

    /// Returns the smallest interval spanning both `self` and `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::Interval;
    ///
    /// let a = Interval::try_new(3, 4)?;
    /// let b = Interval::try_new(6, 7)?;
    /// assert_eq!(a.span(&b), Interval::try_new(3, 7)?);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn span(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns whether the two intervals share at least one position.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a_single_position_interval_has_length_one() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let interval = Interval::try_new(5, 5)?;
        assert_eq!(interval.len(), 1);
        assert_eq!(interval.to_string(), "5-5");
        Ok(())
    }

    #[test]
    fn test_invalid_intervals_are_rejected() {
        let err = Interval::try_new(0, 1).unwrap_err();
        assert_eq!(err.to_string(), "positions are 1-based: start cannot be zero");

        let err = Interval::try_new(9, 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "end position (2) comes before start position (9)"
        );
    }

    #[test]
    fn test_span_covers_the_gap_between_intervals() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let a = Interval::try_new(10, 20)?;
        let b = Interval::try_new(1, 12)?;

        assert_eq!(a.span(&b), Interval::try_new(1, 20)?);
        assert_eq!(b.span(&a), Interval::try_new(1, 20)?);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&Interval::try_new(21, 30)?));

        Ok(())
    }
}
