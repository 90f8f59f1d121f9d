//! Engine configuration.

use std::num::NonZeroUsize;

use serde::Deserialize;

/// The configuration passed to every [`Alignment`](crate::Alignment) and
/// [`Batch`](crate::batch::Batch).
///
/// When read from a dataset file, both keys are optional:
///
/// ```toml
/// [config]
/// threads = 8
/// fragments_only = false
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The number of alignment sources processed in parallel.
    threads: NonZeroUsize,

    /// Whether coverage is restricted to fragments.
    ///
    /// When set, every coverage accessor serves the fragments-only arrays
    /// regardless of whether the caller asked to include single reads.
    fragments_only: bool,
}

impl Config {
    /// Creates a new [`Config`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use fragcov::Config;
    ///
    /// let config = Config::new(NonZeroUsize::new(4).unwrap(), true);
    /// assert_eq!(config.threads().get(), 4);
    /// assert!(config.fragments_only());
    /// ```
    pub fn new(threads: NonZeroUsize, fragments_only: bool) -> Self {
        Self {
            threads,
            fragments_only,
        }
    }

    /// Gets the number of worker threads.
    pub fn threads(&self) -> NonZeroUsize {
        self.threads
    }

    /// Gets whether coverage is restricted to fragments.
    pub fn fragments_only(&self) -> bool {
        self.fragments_only
    }

    /// Sets the number of worker threads.
    pub fn with_threads(mut self, threads: NonZeroUsize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets whether coverage is restricted to fragments.
    pub fn with_fragments_only(mut self, fragments_only: bool) -> Self {
        self.fragments_only = fragments_only;
        self
    }

    /// Resolves whether single reads are included in a coverage request.
    pub(crate) fn include_single_reads(&self, requested: bool) -> bool {
        requested && !self.fragments_only
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            fragments_only: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_the_override_wins_over_the_request() {
        let config = Config::default();
        assert!(!config.fragments_only());
        assert!(config.include_single_reads(true));
        assert!(!config.include_single_reads(false));

        let config = config.with_fragments_only(true);
        assert!(!config.include_single_reads(true));
        assert!(!config.include_single_reads(false));
    }

    #[test]
    fn test_missing_keys_take_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let config: Config = toml::from_str("fragments_only = true")?;

        assert!(config.fragments_only());
        assert_eq!(config.threads(), Config::default().threads());

        Ok(())
    }

    #[test]
    fn test_zero_threads_are_rejected() {
        assert!(toml::from_str::<Config>("threads = 0").is_err());
        assert!(toml::from_str::<Config>("thread = 2").is_err());
    }
}
