//! Cache keys and their on-disk layout.

use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::Individual;
use crate::normalize::Basis;

/// A valid path segment: anything without path separators or NUL.
static SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    // The pattern is a constant that is known to compile.
    Regex::new(r"^[^/\\\x00]+$").unwrap()
});

/// An error related to a [`Key`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// A component of the key cannot be used as a path segment.
    InvalidSegment {
        /// Which component of the key.
        component: &'static str,

        /// The offending value.
        value: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidSegment { component, value } => {
                write!(f, "invalid {component} for a cache path: `{value}`")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Checks that a value can be used as a single path segment.
fn segment(component: &'static str, value: &str) -> Result<()> {
    if value == "." || value == ".." || !SEGMENT.is_match(value) {
        return Err(Error::InvalidSegment {
            component,
            value: value.to_owned(),
        });
    }

    Ok(())
}

/// The kind of array stored under a key.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Variant {
    /// Absolute (integer) coverage.
    Absolute(Basis),

    /// Normalized (floating) coverage.
    Normalized(Basis),

    /// Fragment intervals.
    Fragments,
}

impl Variant {
    /// Every variant stored for each chromosome.
    pub const ALL: [Variant; 5] = [
        Variant::Absolute(Basis::AllReads),
        Variant::Absolute(Basis::FragmentsOnly),
        Variant::Normalized(Basis::AllReads),
        Variant::Normalized(Basis::FragmentsOnly),
        Variant::Fragments,
    ];

    /// Gets the file extension of the variant.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::cache::Variant;
    /// use fragcov::normalize::Basis;
    ///
    /// assert_eq!(Variant::Absolute(Basis::AllReads).extension(), "covA");
    /// assert_eq!(Variant::Normalized(Basis::FragmentsOnly).extension(), "covNfo");
    /// assert_eq!(Variant::Fragments.extension(), "frags");
    /// ```
    pub fn extension(&self) -> &'static str {
        match self {
            Variant::Absolute(Basis::AllReads) => "covA",
            Variant::Absolute(Basis::FragmentsOnly) => "covAfo",
            Variant::Normalized(Basis::AllReads) => "covN",
            Variant::Normalized(Basis::FragmentsOnly) => "covNfo",
            Variant::Fragments => "frags",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Identifies one cached array: an individual's alignment, a chromosome, and a
/// [`Variant`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Key {
    /// The individual's group label.
    label: String,

    /// The individual's identifier.
    individual: String,

    /// The alignment identifier.
    alignment: String,

    /// The chromosome name.
    chromosome: String,

    /// The variant.
    variant: Variant,
}

impl Key {
    /// Attempts to create a new [`Key`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use fragcov::cache::Key;
    /// use fragcov::cache::Variant;
    /// use fragcov::Individual;
    ///
    /// let individual = Individual::new("P01", "healthy");
    /// let key = Key::try_new(&individual, "S1", "chr1", Variant::Fragments)?;
    ///
    /// assert_eq!(
    ///     key.relative_path(),
    ///     Path::new("healthy/P01/S1/chr1/chr1.frags")
    /// );
    ///
    /// assert!(Key::try_new(&individual, "../S1", "chr1", Variant::Fragments).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(
        individual: &Individual,
        alignment: &str,
        chromosome: &str,
        variant: Variant,
    ) -> Result<Self> {
        segment("individual label", individual.label())?;
        segment("individual id", individual.id())?;
        segment("alignment id", alignment)?;
        segment("chromosome", chromosome)?;

        Ok(Self {
            label: individual.label().to_owned(),
            individual: individual.id().to_owned(),
            alignment: alignment.to_owned(),
            chromosome: chromosome.to_owned(),
            variant,
        })
    }

    /// Gets the alignment identifier.
    pub fn alignment(&self) -> &str {
        &self.alignment
    }

    /// Gets the chromosome name.
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// Gets the variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Gets the directory holding every key of the same alignment, relative
    /// to the cache root.
    pub fn alignment_dir(&self) -> PathBuf {
        [&self.label, &self.individual, &self.alignment]
            .iter()
            .collect()
    }

    /// Gets the path of the key relative to the cache root:
    /// `<label>/<individual>/<alignment>/<chromosome>/<chromosome>.<ext>`.
    pub fn relative_path(&self) -> PathBuf {
        self.alignment_dir()
            .join(&self.chromosome)
            .join(format!("{}.{}", self.chromosome, self.variant.extension()))
    }

    /// Gets the path of the key under a cache root.
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}:{} ({})",
            self.label, self.individual, self.alignment, self.chromosome, self.variant
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_a_distinct_extension() {
        let mut extensions = Variant::ALL
            .iter()
            .map(|variant| variant.extension())
            .collect::<Vec<_>>();
        extensions.sort_unstable();
        extensions.dedup();

        assert_eq!(extensions.len(), Variant::ALL.len());
    }

    #[test]
    fn test_segments_that_would_escape_the_root_are_rejected() {
        let individual = Individual::new("P01", "healthy");

        for alignment in ["", ".", "..", "a/b", "a\\b", "a\0b"] {
            let err = Key::try_new(&individual, alignment, "chr1", Variant::Fragments).unwrap_err();
            assert!(matches!(err, Error::InvalidSegment { component: "alignment id", .. }));
        }

        let err = Key::try_new(
            &Individual::new("P01", "a/b"),
            "S1",
            "chr1",
            Variant::Fragments,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid individual label for a cache path: `a/b`");
    }

    #[test]
    fn test_unusual_but_legal_chromosome_names() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let individual = Individual::new("P01", "healthy");
        let key = Key::try_new(
            &individual,
            "S1",
            "HLA-A*01:01:01:01",
            Variant::Absolute(Basis::AllReads),
        )?;

        assert_eq!(
            key.relative_path(),
            Path::new("healthy/P01/S1/HLA-A*01:01:01:01/HLA-A*01:01:01:01.covA")
        );
        assert_eq!(key.alignment(), "S1");
        assert_eq!(key.chromosome(), "HLA-A*01:01:01:01");
        assert_eq!(key.variant(), Variant::Absolute(Basis::AllReads));

        Ok(())
    }
}
