//! Fragment sets with overlap queries.

use rust_lapper as lapper;

use crate::Interval;

/// The fragments of one chromosome.
///
/// Fragments are kept sorted by start and then end. Overlap queries are
/// answered by an interval index built once, when the set is created.
#[derive(Debug)]
pub struct Fragments {
    /// The fragments, sorted.
    fragments: Vec<Interval>,

    /// An index over the fragments, holding each fragment's position in
    /// `fragments`. Its intervals are half-open, so each stops one past the
    /// fragment's end.
    index: lapper::Lapper<u64, usize>,
}

impl Fragments {
    /// Creates a new [`Fragments`].
    pub fn new(mut fragments: Vec<Interval>) -> Self {
        fragments.sort_unstable();

        let index = lapper::Lapper::new(
            fragments
                .iter()
                .enumerate()
                .map(|(i, fragment)| lapper::Interval {
                    start: fragment.start(),
                    stop: fragment.end().saturating_add(1),
                    val: i,
                })
                .collect(),
        );

        Self { fragments, index }
    }

    /// Gets the number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns whether there are no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Gets the fragments in sorted order.
    pub fn as_slice(&self) -> &[Interval] {
        &self.fragments
    }

    /// Iterates over the fragments in sorted order.
    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.fragments.iter()
    }

    /// Gets every fragment sharing at least one position with `interval`, in
    /// sorted order.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::fragments::Fragments;
    /// use fragcov::Interval;
    ///
    /// let fragments = Fragments::new(vec![
    ///     Interval::try_new(10, 20)?,
    ///     Interval::try_new(1, 5)?,
    ///     Interval::try_new(21, 30)?,
    /// ]);
    ///
    /// let hits = fragments.overlapping(Interval::try_new(5, 10)?);
    /// assert_eq!(hits, vec![Interval::try_new(1, 5)?, Interval::try_new(10, 20)?]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn overlapping(&self, interval: Interval) -> Vec<Interval> {
        let mut hits = self
            .index
            .find(interval.start(), interval.end().saturating_add(1))
            .map(|hit| self.fragments[hit.val])
            .collect::<Vec<_>>();

        hits.sort_unstable();
        hits
    }

    /// Gets the length of every fragment, in sorted fragment order.
    pub fn lengths(&self) -> Vec<u64> {
        self.fragments.iter().map(|fragment| fragment.len()).collect()
    }

    /// Flattens the fragments into `[start0, end0, start1, end1, ...]`.
    pub fn to_flat(&self) -> Vec<u64> {
        flatten(&self.fragments)
    }
}

/// Flattens intervals into `[start0, end0, start1, end1, ...]`, the form in
/// which fragments are cached.
pub fn flatten(intervals: &[Interval]) -> Vec<u64> {
    intervals
        .iter()
        .flat_map(|interval| [interval.start(), interval.end()])
        .collect()
}

impl<'a> IntoIterator for &'a Fragments {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An error turning a flat array back into intervals.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FlatError {
    /// The array has an odd number of elements.
    OddLength(usize),

    /// A pair of elements is not a valid interval.
    Interval(usize, crate::interval::Error),

    /// A fragment ends at the largest representable position, which no
    /// chromosome can reach.
    EndOutOfRange(usize),
}

impl std::fmt::Display for FlatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlatError::OddLength(len) => {
                write!(f, "a flat fragment array must have even length: found {len}")
            }
            FlatError::Interval(index, err) => write!(f, "fragment {index}: {err}"),
            FlatError::EndOutOfRange(index) => {
                write!(f, "fragment {index}: end is out of range")
            }
        }
    }
}

impl std::error::Error for FlatError {}

impl TryFrom<Vec<u64>> for Fragments {
    type Error = FlatError;

    fn try_from(flat: Vec<u64>) -> Result<Self, Self::Error> {
        if flat.len() % 2 != 0 {
            return Err(FlatError::OddLength(flat.len()));
        }

        let fragments = flat
            .chunks_exact(2)
            .enumerate()
            .map(|(i, pair)| {
                if pair[1] == u64::MAX {
                    return Err(FlatError::EndOutOfRange(i));
                }

                Interval::try_new(pair[0], pair[1]).map_err(|err| FlatError::Interval(i, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_inclusive_at_both_ends() -> Result<(), Box<dyn std::error::Error>> {
        let fragments = Fragments::new(vec![Interval::try_new(3, 7)?]);

        assert_eq!(fragments.overlapping(Interval::try_new(7, 9)?).len(), 1);
        assert_eq!(fragments.overlapping(Interval::try_new(1, 3)?).len(), 1);
        assert!(fragments.overlapping(Interval::try_new(8, 9)?).is_empty());
        assert!(fragments.overlapping(Interval::try_new(1, 2)?).is_empty());

        Ok(())
    }

    #[test]
    fn test_flat_form_is_start_end_pairs() -> Result<(), Box<dyn std::error::Error>> {
        let fragments = Fragments::new(vec![Interval::try_new(5, 9)?, Interval::try_new(1, 3)?]);

        assert_eq!(fragments.to_flat(), vec![1, 3, 5, 9]);
        assert_eq!(fragments.lengths(), vec![3, 5]);

        let back = Fragments::try_from(fragments.to_flat())?;
        assert_eq!(back.as_slice(), fragments.as_slice());

        Ok(())
    }

    #[test]
    fn test_malformed_flat_arrays_are_rejected() {
        assert_eq!(
            Fragments::try_from(vec![1, 2, 3]).unwrap_err().to_string(),
            "a flat fragment array must have even length: found 3"
        );
        assert!(matches!(
            Fragments::try_from(vec![1, 2, 9, 4]).unwrap_err(),
            FlatError::Interval(1, _)
        ));
    }

    #[test]
    fn test_flat_ends_at_the_largest_position_are_rejected() {
        assert_eq!(
            Fragments::try_from(vec![1, 4, 1, u64::MAX]).unwrap_err(),
            FlatError::EndOutOfRange(1)
        );
        assert_eq!(
            Fragments::try_from(vec![1, u64::MAX]).unwrap_err().to_string(),
            "fragment 0: end is out of range"
        );
    }

    #[test]
    fn test_queries_reaching_the_largest_position() -> Result<(), Box<dyn std::error::Error>> {
        let fragments = Fragments::new(vec![
            Interval::try_new(3, 7)?,
            Interval::try_new(10, u64::MAX)?,
        ]);

        assert_eq!(
            fragments.overlapping(Interval::try_new(1, u64::MAX)?),
            vec![Interval::try_new(3, 7)?, Interval::try_new(10, u64::MAX)?]
        );
        assert_eq!(
            fragments.overlapping(Interval::try_new(20, u64::MAX)?),
            vec![Interval::try_new(10, u64::MAX)?]
        );
        assert!(fragments.overlapping(Interval::try_new(8, 9)?).is_empty());

        Ok(())
    }

    #[test]
    fn test_an_empty_set_has_no_overlaps() -> Result<(), Box<dyn std::error::Error>> {
        let fragments = Fragments::new(Vec::new());
        assert!(fragments.is_empty());
        assert!(fragments.overlapping(Interval::try_new(1, 100)?).is_empty());
        Ok(())
    }
}
