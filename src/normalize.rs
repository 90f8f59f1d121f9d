//! Normalization of coverage to the genome-wide average.
//!
//! Normalized coverage divides each base's coverage by the average coverage
//! across the *whole genome*, never by a per-chromosome average, so that
//! enrichment on one chromosome stays comparable with every other.

use omics::coordinate::position::Number;
use tracing::warn;

/// Which reads a coverage array is built from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Basis {
    /// Fragments from concordant pairs only.
    FragmentsOnly,

    /// Fragments plus every other mapped read.
    AllReads,
}

impl std::fmt::Display for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Basis::FragmentsOnly => write!(f, "fragments only"),
            Basis::AllReads => write!(f, "all reads"),
        }
    }
}

/// Genome-wide sums for one alignment source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Totals {
    /// The summed length of all chromosomes.
    genome_length: Number,

    /// The summed length of all fragments.
    fragment_bases: u64,

    /// The summed length of all single reads.
    single_bases: u64,
}

impl Totals {
    /// Creates a new [`Totals`].
    pub fn new(genome_length: Number, fragment_bases: u64, single_bases: u64) -> Self {
        Self {
            genome_length,
            fragment_bases,
            single_bases,
        }
    }

    /// Gets the number of mapped bases on the given basis.
    pub fn mapped_bases(&self, basis: Basis) -> u64 {
        match basis {
            Basis::FragmentsOnly => self.fragment_bases,
            Basis::AllReads => self.fragment_bases + self.single_bases,
        }
    }

    /// Gets the genome-wide average coverage on the given basis.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::normalize::Basis;
    /// use fragcov::normalize::Totals;
    ///
    /// let totals = Totals::new(10, 5, 2);
    /// assert_eq!(totals.average(Basis::FragmentsOnly), 0.5);
    /// assert_eq!(totals.average(Basis::AllReads), 0.7);
    /// ```
    pub fn average(&self, basis: Basis) -> f64 {
        if self.genome_length == 0 {
            return 0.0;
        }

        self.mapped_bases(basis) as f64 / self.genome_length as f64
    }
}

/// Rescales coverage arrays by a genome-wide average.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalizer {
    /// The average coverage divided by.
    average: f64,
}

impl Normalizer {
    /// Creates a [`Normalizer`] for one alignment source and basis.
    ///
    /// An average of zero (nothing mapped) is not an error: a warning is
    /// emitted and every normalized value will be `0.0`.
    pub fn new(alignment: &str, totals: &Totals, basis: Basis) -> Self {
        let average = totals.average(basis);

        if average == 0.0 {
            warn!(
                alignment,
                basis = %basis,
                "no mapped bases: normalized coverage will be all zeros"
            );
        }

        Self { average }
    }

    /// Gets the average coverage divided by.
    pub fn average(&self) -> f64 {
        self.average
    }

    /// Normalizes a coverage array.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::normalize::Basis;
    /// use fragcov::normalize::Normalizer;
    /// use fragcov::normalize::Totals;
    ///
    /// let normalizer = Normalizer::new("sample", &Totals::new(4, 2, 0), Basis::FragmentsOnly);
    /// assert_eq!(normalizer.apply(&[0, 1, 1, 0]), vec![0.0, 2.0, 2.0, 0.0]);
    /// ```
    pub fn apply(&self, coverage: &[u32]) -> Vec<f32> {
        if self.average == 0.0 {
            return vec![0.0; coverage.len()];
        }

        coverage
            .iter()
            .map(|value| (f64::from(*value) / self.average) as f32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Interval;
    use crate::coverage;

    #[test]
    fn test_zero_average_yields_zeros() {
        let (normalizer, logs) = crate::log_capture::warnings(|| {
            Normalizer::new("a", &Totals::new(10, 0, 0), Basis::AllReads)
        });

        assert_eq!(normalizer.average(), 0.0);
        assert_eq!(normalizer.apply(&[0; 10]), vec![0.0; 10]);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("no mapped bases: normalized coverage will be all zeros"));
    }

    #[test]
    fn test_genome_wide_weighted_average_is_one() -> Result<(), Box<dyn std::error::Error>> {
        // Two chromosomes with lengths 10 and 30.
        let fragments = [
            vec![Interval::try_new(1, 6)?, Interval::try_new(4, 10)?],
            vec![Interval::try_new(2, 9)?, Interval::try_new(20, 30)?],
        ];
        let lengths = [10usize, 30];

        let fragment_bases: u64 = fragments.iter().flatten().map(|f| f.len()).sum();
        let totals = Totals::new(40, fragment_bases, 0);
        let normalizer = Normalizer::new("a", &totals, Basis::FragmentsOnly);

        let mut weighted = 0.0f64;
        for (length, fragments) in lengths.iter().zip(&fragments) {
            let normalized = normalizer.apply(&coverage::accumulate(*length, fragments)?);
            weighted += normalized.iter().map(|v| f64::from(*v)).sum::<f64>();
        }

        assert!((weighted / 40.0 - 1.0).abs() < 1e-6);

        Ok(())
    }

    #[test]
    fn test_the_average_is_genome_relative() {
        let totals = Totals::new(100, 50, 150);

        assert_eq!(totals.mapped_bases(Basis::FragmentsOnly), 50);
        assert_eq!(totals.mapped_bases(Basis::AllReads), 200);
        assert_eq!(totals.average(Basis::FragmentsOnly), 0.5);
        assert_eq!(totals.average(Basis::AllReads), 2.0);
    }
}
