//! A builder for a [`Source`].

use std::path::PathBuf;

use crate::Individual;
use crate::alignment::Source;

/// An error related to a [`Builder`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// A required field was never set.
    Missing(&'static str),

    /// The alignment ID was empty.
    EmptyId,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Missing(field) => write!(f, "missing required field: {field}"),
            Error::EmptyId => write!(f, "alignment IDs cannot be empty"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A builder for a [`Source`].
#[derive(Debug, Default)]
pub struct Builder {
    /// The alignment ID.
    id: Option<String>,

    /// The individual the alignment belongs to.
    individual: Option<Individual>,

    /// The path of the raw alignment input.
    input: Option<PathBuf>,

    /// The time label.
    time: Option<String>,

    /// The condition label.
    condition: Option<String>,
}

impl Builder {
    /// Sets the alignment ID.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the individual.
    pub fn individual(mut self, individual: Individual) -> Self {
        self.individual = Some(individual);
        self
    }

    /// Sets the path of the raw alignment input.
    pub fn input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Sets the time label.
    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Sets the condition label.
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Consumes `self` to attempt to build a [`Source`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::alignment::Source;
    /// use fragcov::Individual;
    ///
    /// let source = Source::builder()
    ///     .id("S1")
    ///     .individual(Individual::new("P01", "healthy"))
    ///     .input("S1.bam")
    ///     .time("day0")
    ///     .try_build()?;
    ///
    /// assert_eq!(source.id(), "S1");
    /// assert_eq!(source.time(), Some("day0"));
    /// assert_eq!(source.condition(), None);
    ///
    /// let err = Source::builder().id("S1").try_build().unwrap_err();
    /// assert_eq!(err.to_string(), "missing required field: individual");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build(self) -> Result<Source> {
        let id = self.id.ok_or(Error::Missing("id"))?;

        if id.is_empty() {
            return Err(Error::EmptyId);
        }

        let individual = self.individual.ok_or(Error::Missing("individual"))?;
        let input = self.input.ok_or(Error::Missing("input"))?;

        Ok(Source {
            id,
            individual,
            input,
            time: self.time,
            condition: self.condition,
        })
    }
}
