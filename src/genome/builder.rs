//! A builder for a [`Genome`].

use std::collections::HashMap;

use nonempty::NonEmpty;
use omics::coordinate::position::Number;

use crate::genome::Chromosome;
use crate::genome::Genome;

/// An error related to a [`Builder`].
#[derive(Debug)]
pub enum Error {
    /// A chromosome name was provided more than once.
    DuplicateChromosome(String),

    /// A chromosome name was empty.
    EmptyName,

    /// No chromosomes were provided.
    Empty,

    /// A chromosome was declared with a length of zero.
    ZeroLength(String),

    /// A chromosome is too long to be held in memory as a coverage array.
    TooLong(String, Number),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DuplicateChromosome(name) => write!(f, "duplicate chromosome: {name}"),
            Error::EmptyName => write!(f, "chromosome names cannot be empty"),
            Error::Empty => write!(f, "a genome must have at least one chromosome"),
            Error::ZeroLength(name) => write!(f, "chromosome `{name}` has a length of zero"),
            Error::TooLong(name, length) => {
                write!(f, "chromosome `{name}` is too long to address ({length})")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A builder for a [`Genome`].
#[derive(Debug, Default)]
pub struct Builder {
    /// The chromosomes pushed so far.
    chromosomes: Vec<Chromosome>,

    /// A lookup from chromosome name to index within `chromosomes`.
    index: HashMap<String, usize>,
}

impl Builder {
    /// Pushes a chromosome into the [`Builder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::genome::Builder;
    ///
    /// let builder = Builder::default().push("chr1", 248_956_422)?;
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn push(mut self, name: impl Into<String>, length: Number) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        if length == 0 {
            return Err(Error::ZeroLength(name));
        }

        if usize::try_from(length).is_err() {
            return Err(Error::TooLong(name, length));
        }

        if self.index.contains_key(&name) {
            return Err(Error::DuplicateChromosome(name));
        }

        self.index.insert(name.clone(), self.chromosomes.len());
        self.chromosomes.push(Chromosome { name, length });

        Ok(self)
    }

    /// Consumes `self` to attempt to build a [`Genome`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::genome::Builder;
    ///
    /// let genome = Builder::default()
    ///     .push("chr1", 10)?
    ///     .push("chr2", 20)?
    ///     .try_build()?;
    ///
    /// assert_eq!(genome.len(), 2);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build(self) -> Result<Genome> {
        let chromosomes = NonEmpty::from_vec(self.chromosomes).ok_or(Error::Empty)?;

        Ok(Genome {
            chromosomes,
            index: self.index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_it_fails_to_build_an_empty_genome() {
        let err = Builder::default().try_build().unwrap_err();
        assert_eq!(err.to_string(), "a genome must have at least one chromosome");
    }

    #[test]
    fn test_it_fails_when_a_chromosome_is_pushed_twice() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let err = Builder::default()
            .push("chr1", 10)?
            .push("chr1", 10)
            .unwrap_err();

        assert_eq!(err.to_string(), "duplicate chromosome: chr1");

        Ok(())
    }

    #[test]
    fn test_it_fails_on_zero_length_or_empty_names() {
        let err = Builder::default().push("chr1", 0).unwrap_err();
        assert_eq!(err.to_string(), "chromosome `chr1` has a length of zero");

        let err = Builder::default().push("", 10).unwrap_err();
        assert_eq!(err.to_string(), "chromosome names cannot be empty");
    }
}
