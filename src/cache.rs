//! A compressed, on-disk cache of coverage arrays.
//!
//! Every array lives in its own file at a path derived from its [`Key`]:
//!
//! ```text
//! <individual label>/<individual id>/<alignment id>/<chromosome>/<chromosome>.<ext>
//! ```
//!
//! where `<ext>` is one of `covA`, `covAfo`, `covN`, `covNfo`, or `frags` (see
//! [`Variant`]). The presence of that file is the only signal that an entry is
//! cached: nothing is checksummed, and deleting a file is how an operator
//! forces recomputation. Entries are never overwritten in place. Each write
//! goes to a temporary file in the destination directory that is renamed into
//! place once complete, so an interrupted or failed write never leaves a file
//! that a later run would mistake for a cache hit.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tracing::debug;

pub mod codec;
pub mod key;

pub use codec::Element;
pub use key::Key;
pub use key::Variant;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to the [`Store`].
#[derive(Debug)]
pub enum Error {
    /// An invalid key.
    Key(key::Error),

    /// An I/O error at a path.
    Io {
        /// The path.
        path: PathBuf,

        /// The underlying error.
        source: io::Error,
    },

    /// A blob that could not be decoded or encoded.
    Codec {
        /// The path.
        path: PathBuf,

        /// The underlying error.
        source: codec::Error,
    },

    /// A cached array does not have the length it is declared to have.
    LengthMismatch {
        /// The path.
        path: PathBuf,

        /// The expected number of elements.
        expected: usize,

        /// The number of elements found.
        found: usize,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Key(err) => write!(f, "key error: {err}"),
            Error::Io { path, source } => write!(f, "i/o error at {}: {source}", path.display()),
            Error::Codec { path, source } => {
                write!(f, "codec error at {}: {source}", path.display())
            }
            Error::LengthMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "length mismatch at {}: expected {expected} elements, found {found}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for Error {}

impl From<key::Error> for Error {
    fn from(err: key::Error) -> Self {
        Error::Key(err)
    }
}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Creates a closure mapping an [`io::Error`] to an [`Error::Io`] at `path`.
fn io_at(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Store
////////////////////////////////////////////////////////////////////////////////////////

/// A cache of compressed arrays rooted at a directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Store {
    /// The root directory.
    root: PathBuf,
}

impl Store {
    /// Creates a new [`Store`] rooted at `root`.
    ///
    /// Nothing is created on disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Gets the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Gets the full path of a key.
    pub fn path(&self, key: &Key) -> PathBuf {
        key.path_in(&self.root)
    }

    /// Returns whether an entry exists for the key.
    pub fn contains(&self, key: &Key) -> bool {
        self.path(key).is_file()
    }

    /// Writes an array under a key.
    ///
    /// Missing directories are created. An existing entry for the key is
    /// replaced atomically.
    pub fn write<T: Element>(&self, key: &Key, values: &[T]) -> Result<()> {
        let path = self.path(key);

        let parent = match path.parent() {
            Some(parent) => parent,
            // A key path always ends in `<chromosome>/<file>`.
            None => unreachable!("a key path always has a parent directory"),
        };

        fs::create_dir_all(parent).map_err(io_at(parent))?;

        let file = NamedTempFile::new_in(parent).map_err(io_at(parent))?;
        let writer = codec::encode(values, BufWriter::new(file)).map_err(|source| Error::Codec {
            path: path.clone(),
            source,
        })?;

        let file = writer
            .into_inner()
            .map_err(|err| io_at(&path)(err.into_error()))?;
        file.as_file().sync_all().map_err(io_at(&path))?;
        file.persist(&path).map_err(|err| io_at(&path)(err.error))?;

        debug!(
            alignment = key.alignment(),
            chromosome = key.chromosome(),
            variant = %key.variant(),
            path = %path.display(),
            elements = values.len(),
            "wrote cache entry"
        );

        Ok(())
    }

    /// Reads the array stored under a key.
    pub fn read<T: Element>(&self, key: &Key) -> Result<Vec<T>> {
        let path = self.path(key);
        let file = File::open(&path).map_err(io_at(&path))?;

        codec::decode(BufReader::new(file)).map_err(|source| Error::Codec { path, source })
    }

    /// Reads the array stored under a key and checks that it has exactly
    /// `expected` elements.
    pub fn read_exact<T: Element>(&self, key: &Key, expected: usize) -> Result<Vec<T>> {
        let values = self.read(key)?;

        if values.len() != expected {
            return Err(Error::LengthMismatch {
                path: self.path(key),
                expected,
                found: values.len(),
            });
        }

        Ok(values)
    }

    /// Loads the array under a key, or computes and stores it if it is absent.
    ///
    /// `compute` is only called on a cache miss. When `expected` is given, a
    /// cached array must have exactly that many elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::cache::Key;
    /// use fragcov::cache::Store;
    /// use fragcov::cache::Variant;
    /// use fragcov::normalize::Basis;
    /// use fragcov::Individual;
    ///
    /// let dir = tempfile::tempdir()?;
    /// let store = Store::new(dir.path());
    ///
    /// let individual = Individual::new("P01", "healthy");
    /// let key = Key::try_new(&individual, "S1", "chr1", Variant::Absolute(Basis::AllReads))?;
    ///
    /// let first = store.compute_or_load(&key, Some(3), || {
    ///     Ok::<_, fragcov::cache::Error>(vec![1u32, 2, 3])
    /// })?;
    /// let second = store.compute_or_load(&key, Some(3), || -> Result<Vec<u32>, fragcov::cache::Error> {
    ///     unreachable!("the entry is cached")
    /// })?;
    ///
    /// assert_eq!(first, second);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn compute_or_load<T, E, F>(
        &self,
        key: &Key,
        expected: Option<usize>,
        compute: F,
    ) -> std::result::Result<Vec<T>, E>
    where
        T: Element,
        E: From<Error>,
        F: FnOnce() -> std::result::Result<Vec<T>, E>,
    {
        if self.contains(key) {
            return match expected {
                Some(expected) => self.read_exact(key, expected),
                None => self.read(key),
            }
            .map_err(E::from);
        }

        let values = compute()?;
        self.write(key, &values)?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::Individual;
    use crate::normalize::Basis;

    fn key(chromosome: &str, variant: Variant) -> Key {
        Key::try_new(&Individual::new("P01", "healthy"), "S1", chromosome, variant).unwrap()
    }

    #[test]
    fn test_written_entries_read_back() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());

        let absolute = key("chr1", Variant::Absolute(Basis::FragmentsOnly));
        let normalized = key("chr1", Variant::Normalized(Basis::FragmentsOnly));

        assert!(!store.contains(&absolute));

        store.write(&absolute, &[0u32, 1, 1, 0])?;
        store.write(&normalized, &[0.0f32, 2.0, 2.0, 0.0])?;

        assert!(store.contains(&absolute));
        assert!(dir.path().join("healthy/P01/S1/chr1/chr1.covAfo").is_file());
        assert!(dir.path().join("healthy/P01/S1/chr1/chr1.covNfo").is_file());
        assert_eq!(store.read_exact::<u32>(&absolute, 4)?, vec![0, 1, 1, 0]);
        assert_eq!(store.read::<f32>(&normalized)?, vec![0.0, 2.0, 2.0, 0.0]);

        Ok(())
    }

    #[test]
    fn test_a_length_mismatch_is_an_error() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let key = key("chr1", Variant::Absolute(Basis::AllReads));

        store.write(&key, &[1u32, 2, 3])?;
        let err = store.read_exact::<u32>(&key, 10).unwrap_err();

        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 10,
                found: 3,
                ..
            }
        ));

        Ok(())
    }

    #[test]
    fn test_compute_runs_once_per_key() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let key = key("chr2", Variant::Fragments);
        let calls = Cell::new(0);

        for _ in 0..3 {
            let values = store.compute_or_load::<u64, Error, _>(&key, None, || {
                calls.set(calls.get() + 1);
                Ok(vec![3, 7])
            })?;
            assert_eq!(values, vec![3, 7]);
        }

        assert_eq!(calls.get(), 1);

        Ok(())
    }

    #[test]
    fn test_a_failed_write_leaves_no_entry_behind() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let key = key("chr1", Variant::Fragments);

        // A directory squatting on the entry's path makes the final rename fail.
        let path = store.path(&key);
        fs::create_dir_all(&path)?;

        assert!(store.write(&key, &[1u64, 2]).is_err());
        assert!(!store.contains(&key));

        let leftovers = fs::read_dir(path.parent().unwrap())?.count();
        assert_eq!(leftovers, 1);

        Ok(())
    }

    #[test]
    fn test_corrupt_entries_report_their_path() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let key = key("chr1", Variant::Absolute(Basis::AllReads));

        let path = store.path(&key);
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, b"definitely not a blob")?;

        let err = store.read::<u32>(&key).unwrap_err();
        assert!(err.to_string().contains("chr1.covA"));
        assert!(matches!(err, Error::Codec { .. }));

        Ok(())
    }
}
