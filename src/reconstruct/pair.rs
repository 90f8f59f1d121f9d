//! Read pairs under reconstruction.

use omics::coordinate::position::Number;

use crate::Interval;

/// One half of a [`ReadPair`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Mate {
    /// The aligned span of this half.
    span: Interval,

    /// Where this half says its mate starts.
    mate_start: Option<Number>,
}

impl Mate {
    /// Creates a new [`Mate`].
    pub fn new(span: Interval, mate_start: Option<Number>) -> Self {
        Self { span, mate_start }
    }

    /// Gets the aligned span.
    pub fn span(&self) -> Interval {
        self.span
    }

    /// Gets the alignment start reported for the other half.
    pub fn mate_start(&self) -> Option<Number> {
        self.mate_start
    }
}

/// Which half of a pair a record designates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Half {
    /// The first of the pair.
    First,

    /// The second of the pair.
    Second,
}

impl std::fmt::Display for Half {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Half::First => write!(f, "first"),
            Half::Second => write!(f, "second"),
        }
    }
}

/// A read pair keyed by read name, filled in as its halves are encountered.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReadPair {
    /// The first of the pair.
    first: Option<Mate>,

    /// The second of the pair.
    second: Option<Mate>,
}

impl ReadPair {
    /// Sets one half of the pair, returning the half it replaced (if any).
    pub fn set(&mut self, half: Half, mate: Mate) -> Option<Mate> {
        match half {
            Half::First => self.first.replace(mate),
            Half::Second => self.second.replace(mate),
        }
    }

    /// Gets the first half, if it has been seen.
    pub fn first(&self) -> Option<&Mate> {
        self.first.as_ref()
    }

    /// Gets the second half, if it has been seen.
    pub fn second(&self) -> Option<&Mate> {
        self.second.as_ref()
    }

    /// Returns whether both halves have been seen.
    pub fn is_complete(&self) -> bool {
        self.first.is_some() && self.second.is_some()
    }

    /// Gets the half that is present when the pair is incomplete.
    pub fn lone_half(&self) -> Option<(Half, &Mate)> {
        match (&self.first, &self.second) {
            (Some(first), None) => Some((Half::First, first)),
            (None, Some(second)) => Some((Half::Second, second)),
            _ => None,
        }
    }

    /// Gets the fragment spanned by the pair.
    ///
    /// The fragment runs from the lesser of the two starts to the greater of
    /// the two ends, including any gap between the mates. [`None`] is returned
    /// while the pair is incomplete.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::reconstruct::pair::Half;
    /// use fragcov::reconstruct::pair::Mate;
    /// use fragcov::reconstruct::pair::ReadPair;
    /// use fragcov::Interval;
    ///
    /// let mut pair = ReadPair::default();
    /// pair.set(Half::Second, Mate::new(Interval::try_new(6, 7)?, Some(3)));
    /// assert_eq!(pair.fragment(), None);
    ///
    /// pair.set(Half::First, Mate::new(Interval::try_new(3, 4)?, Some(6)));
    /// assert_eq!(pair.fragment(), Some(Interval::try_new(3, 7)?));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn fragment(&self) -> Option<Interval> {
        match (&self.first, &self.second) {
            (Some(first), Some(second)) => Some(first.span.span(&second.span)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_mates_span_their_union() -> Result<(), Box<dyn std::error::Error>> {
        let mut pair = ReadPair::default();
        pair.set(Half::First, Mate::new(Interval::try_new(100, 250)?, Some(50)));
        pair.set(Half::Second, Mate::new(Interval::try_new(50, 199)?, Some(100)));

        let fragment = pair.fragment().unwrap();
        assert_eq!(fragment.start(), 50);
        assert_eq!(fragment.end(), 250);
        assert_eq!(fragment.len(), 201);

        Ok(())
    }

    #[test]
    fn test_setting_a_half_twice_returns_the_replaced_half() -> Result<(), Box<dyn std::error::Error>> {
        let mut pair = ReadPair::default();
        let original = Mate::new(Interval::try_new(1, 5)?, None);

        assert_eq!(pair.set(Half::First, original), None);
        assert_eq!(
            pair.set(Half::First, Mate::new(Interval::try_new(2, 6)?, None)),
            Some(original)
        );
        assert!(!pair.is_complete());
        assert_eq!(pair.lone_half().map(|(half, _)| half), Some(Half::First));

        Ok(())
    }
}
