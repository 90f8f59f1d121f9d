//! Per-base coverage accumulation.
//!
//! Coverage is accumulated with a difference array held in the coverage array
//! itself: each interval touches two cells, and a single prefix sum over the
//! chromosome yields the per-base counts. The result is identical to
//! incrementing every covered base one at a time, and deriving both profiles of
//! a chromosome needs no memory beyond the two arrays returned.

use crate::Interval;

/// An error related to coverage accumulation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// An interval reaches past the end of the chromosome.
    OutOfBounds {
        /// The offending interval.
        interval: Interval,

        /// The length of the chromosome.
        length: usize,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::OutOfBounds { interval, length } => write!(
                f,
                "interval {interval} reaches past the end of a chromosome of length {length}"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// The two coverage arrays derived for one chromosome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Profile {
    /// Coverage from fragments alone.
    fragments_only: Vec<u32>,

    /// Coverage from fragments and single reads.
    all_reads: Vec<u32>,
}

impl Profile {
    /// Gets the fragments-only coverage.
    pub fn fragments_only(&self) -> &[u32] {
        &self.fragments_only
    }

    /// Gets the coverage from fragments and single reads.
    pub fn all_reads(&self) -> &[u32] {
        &self.all_reads
    }

    /// Consumes `self` and returns the (fragments-only, all-reads) arrays.
    pub fn into_parts(self) -> (Vec<u32>, Vec<u32>) {
        (self.fragments_only, self.all_reads)
    }
}

/// Computes the coverage array of a chromosome of `length` bases from a set of
/// intervals.
///
/// # Examples
///
/// ```
/// use fragcov::coverage;
/// use fragcov::Interval;
///
/// let coverage = coverage::accumulate(5, &[Interval::try_new(2, 3)?, Interval::try_new(3, 5)?])?;
/// assert_eq!(coverage, vec![0, 1, 2, 1, 1]);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn accumulate(length: usize, intervals: &[Interval]) -> Result<Vec<u32>> {
    let mut coverage = vec![0u32; length];
    add(&mut coverage, intervals)?;
    Ok(coverage)
}

/// Adds a set of intervals onto an existing coverage array.
///
/// The array is turned into its own difference array, the intervals are
/// applied, and a prefix sum restores the counts, so no per-base buffer beyond
/// `coverage` is allocated. The array is left untouched if any interval is
/// out of bounds.
pub fn add(coverage: &mut [u32], intervals: &[Interval]) -> Result<()> {
    let length = coverage.len();

    if intervals.is_empty() {
        return Ok(());
    }

    // (1) Checks every interval before the array is modified.
    let mut bounds = Vec::with_capacity(intervals.len());

    for interval in intervals {
        let end = usize::try_from(interval.end())
            .ok()
            .filter(|end| *end <= length)
            .ok_or(Error::OutOfBounds {
                interval: *interval,
                length,
            })?;

        // The start is at least one and no greater than the end.
        bounds.push((interval.start() as usize - 1, end));
    }

    // (2) Differences between neighbouring bases. Arithmetic wraps, and the
    // prefix sum in (4) undoes it exactly.
    for i in (1..length).rev() {
        coverage[i] = coverage[i].wrapping_sub(coverage[i - 1]);
    }

    // (3) Positions are 1-based and closed, so interval `[s, e]` covers
    // indices `s - 1..e`.
    for (start, end) in bounds {
        coverage[start] = coverage[start].wrapping_add(1);

        if end < length {
            coverage[end] = coverage[end].wrapping_sub(1);
        }
    }

    // (4) A running sum turns the differences back into per-base counts.
    for i in 1..length {
        coverage[i] = coverage[i].wrapping_add(coverage[i - 1]);
    }

    Ok(())
}

/// Computes both coverage arrays for a chromosome.
///
/// Fragments are accumulated first, and that array is kept as the
/// fragments-only profile. Single reads are then added onto a copy of it to
/// produce the all-reads profile, which is therefore never lower than the
/// fragments-only profile at any base.
///
/// # Examples
///
/// ```
/// use fragcov::coverage;
/// use fragcov::Interval;
///
/// let fragments = [Interval::try_new(3, 7)?];
/// let singles = [Interval::try_new(1, 2)?];
///
/// let profile = coverage::profile(10, &fragments, &singles)?;
/// assert_eq!(profile.fragments_only(), &[0, 0, 1, 1, 1, 1, 1, 0, 0, 0]);
/// assert_eq!(profile.all_reads(), &[1, 1, 1, 1, 1, 1, 1, 0, 0, 0]);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn profile(length: usize, fragments: &[Interval], singles: &[Interval]) -> Result<Profile> {
    let fragments_only = accumulate(length, fragments)?;

    let mut all_reads = fragments_only.clone();
    add(&mut all_reads, singles)?;

    Ok(Profile {
        fragments_only,
        all_reads,
    })
}
