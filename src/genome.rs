//! The genome catalog: chromosome names and lengths.
//!
//! A [`Genome`] is immutable once built and is shared read-only (generally
//! behind an [`Arc`](std::sync::Arc)) by every alignment computed against it.
//! Chromosomes keep the order in which they were added, and that order is the
//! index used for the per-chromosome tables built while reading alignments.

use std::collections::HashMap;

use nonempty::NonEmpty;
use omics::coordinate::position::Number;

pub mod builder;

pub use builder::Builder;

/// A chromosome within a [`Genome`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Chromosome {
    /// The name.
    name: String,

    /// The length in bases.
    length: Number,
}

impl Chromosome {
    /// Gets the name of the chromosome.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the length of the chromosome.
    pub fn length(&self) -> Number {
        self.length
    }

    /// Gets the length of the chromosome as an array size.
    ///
    /// The [`Builder`] only accepts lengths that fit within a [`usize`], so
    /// this conversion is lossless.
    pub(crate) fn size(&self) -> usize {
        self.length as usize
    }
}

/// A set of chromosomes with their lengths.
#[derive(Clone, Debug)]
pub struct Genome {
    /// The chromosomes in insertion order.
    chromosomes: NonEmpty<Chromosome>,

    /// A lookup from chromosome name to index within `chromosomes`.
    index: HashMap<String, usize>,
}

impl Genome {
    /// Gets a [`Builder`] for a [`Genome`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Gets the chromosome names in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::Genome;
    ///
    /// let genome = Genome::builder()
    ///     .push("chr1", 100)?
    ///     .push("chr2", 50)?
    ///     .try_build()?;
    ///
    /// assert_eq!(genome.names().collect::<Vec<_>>(), vec!["chr1", "chr2"]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.chromosomes.iter().map(|chromosome| chromosome.name())
    }

    /// Gets the chromosomes in order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &Chromosome> + '_ {
        self.chromosomes.iter()
    }

    /// Gets the length of a chromosome by name.
    pub fn length(&self, name: &str) -> Option<Number> {
        self.get(name).map(|chromosome| chromosome.length())
    }

    /// Returns whether the genome contains a chromosome with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Gets a chromosome by name.
    pub fn get(&self, name: &str) -> Option<&Chromosome> {
        self.index
            .get(name)
            .and_then(|index| self.chromosomes.get(*index))
    }

    /// Gets the position of a chromosome within the genome's ordering.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Gets the number of chromosomes.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    /// Gets the sum of all chromosome lengths.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::Genome;
    ///
    /// let genome = Genome::builder()
    ///     .push("chr1", 100)?
    ///     .push("chr2", 50)?
    ///     .try_build()?;
    ///
    /// assert_eq!(genome.total_length(), 150);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn total_length(&self) -> Number {
        self.chromosomes.iter().map(|chromosome| chromosome.length).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups_by_name() -> Result<(), Box<dyn std::error::Error>> {
        let genome = Genome::builder()
            .push("chr1", 10)?
            .push("chrM", 3)?
            .try_build()?;

        assert!(genome.contains("chr1"));
        assert!(!genome.contains("chr2"));
        assert_eq!(genome.length("chrM"), Some(3));
        assert_eq!(genome.length("chr2"), None);
        assert_eq!(genome.index_of("chrM"), Some(1));
        assert_eq!(genome.len(), 2);
        assert_eq!(genome.get("chr1").map(|c| c.size()), Some(10));

        Ok(())
    }
}
