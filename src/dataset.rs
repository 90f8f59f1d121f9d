//! Dataset description files.
//!
//! A dataset file declares everything needed to compute coverage for a set
//! of alignments: where the cache lives, the engine configuration, the
//! genome, and the alignments themselves.
//!
//! ```toml
//! cache = "cache"
//!
//! [config]
//! threads = 4
//! fragments_only = false
//!
//! [[chromosomes]]
//! name = "chr1"
//! length = 248956422
//!
//! [[alignments]]
//! id = "S1"
//! individual = "P01"
//! label = "healthy"
//! input = "bams/S1.bam"
//! time = "day0"
//! condition = "control"
//! ```
//!
//! Relative paths are resolved against the directory holding the dataset
//! file.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use omics::coordinate::position::Number;
use serde::Deserialize;
use tracing::debug;

use crate::Config;
use crate::Genome;
use crate::Individual;
use crate::alignment;
use crate::alignment::Source;
use crate::genome;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to a [`Dataset`].
#[derive(Debug)]
pub enum Error {
    /// The dataset file could not be read.
    Io {
        /// The path.
        path: PathBuf,

        /// The underlying error.
        source: std::io::Error,
    },

    /// The dataset file is not valid TOML or does not have the expected shape.
    Parse(toml::de::Error),

    /// The chromosomes do not form a valid genome.
    Genome(genome::builder::Error),

    /// An alignment entry is invalid.
    Alignment {
        /// The position of the entry in the file.
        index: usize,

        /// The underlying error.
        source: alignment::builder::Error,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io { path, source } => {
                write!(f, "unable to read dataset {}: {source}", path.display())
            }
            Error::Parse(err) => write!(f, "parse error: {err}"),
            Error::Genome(err) => write!(f, "invalid genome: {err}"),
            Error::Alignment { index, source } => {
                write!(f, "invalid alignment entry {index}: {source}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// File format
////////////////////////////////////////////////////////////////////////////////////////

/// The dataset file as written.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct File {
    /// The cache directory.
    cache: PathBuf,

    /// The configuration.
    #[serde(default)]
    config: Config,

    /// The chromosomes.
    chromosomes: Vec<ChromosomeEntry>,

    /// The alignments.
    #[serde(default)]
    alignments: Vec<AlignmentEntry>,
}

/// A chromosome as written.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChromosomeEntry {
    /// The name.
    name: String,

    /// The length.
    length: Number,
}

/// An alignment as written.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AlignmentEntry {
    /// The alignment ID.
    id: String,

    /// The individual's ID.
    individual: String,

    /// The individual's group label.
    label: String,

    /// The raw input.
    input: PathBuf,

    /// The time label.
    time: Option<String>,

    /// The condition label.
    condition: Option<String>,
}

////////////////////////////////////////////////////////////////////////////////////////
// Dataset
////////////////////////////////////////////////////////////////////////////////////////

/// A parsed dataset.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// The cache directory.
    cache_dir: PathBuf,

    /// The configuration.
    config: Config,

    /// The genome.
    genome: Arc<Genome>,

    /// The alignment sources, in file order.
    sources: Vec<Source>,
}

impl Dataset {
    /// Reads a dataset from a file.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let dataset = Self::parse(&contents, base)?;

        debug!(
            path = %path.display(),
            chromosomes = dataset.genome.len(),
            alignments = dataset.sources.len(),
            "read dataset"
        );

        Ok(dataset)
    }

    /// Parses a dataset, resolving relative paths against `base`.
    fn parse(contents: &str, base: &Path) -> Result<Self> {
        let file: File = toml::from_str(contents).map_err(Error::Parse)?;

        let genome = file
            .chromosomes
            .into_iter()
            .try_fold(Genome::builder(), |builder, chromosome| {
                builder.push(chromosome.name, chromosome.length)
            })
            .and_then(|builder| builder.try_build())
            .map_err(Error::Genome)?;

        let sources = file
            .alignments
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let mut builder = Source::builder()
                    .id(entry.id)
                    .individual(Individual::new(entry.individual, entry.label))
                    .input(base.join(entry.input));

                if let Some(time) = entry.time {
                    builder = builder.time(time);
                }

                if let Some(condition) = entry.condition {
                    builder = builder.condition(condition);
                }

                builder
                    .try_build()
                    .map_err(|source| Error::Alignment { index, source })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            cache_dir: base.join(file.cache),
            config: file.config,
            genome: Arc::new(genome),
            sources,
        })
    }

    /// Gets the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Gets the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets the genome.
    pub fn genome(&self) -> &Arc<Genome> {
        &self.genome
    }

    /// Gets every alignment source.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Gets the sources of every individual with a group label.
    pub fn sources_with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Source> {
        self.sources
            .iter()
            .filter(move |source| source.individual().label() == label)
    }

    /// Gets the sources of one individual.
    pub fn sources_for_individual<'a>(
        &'a self,
        individual: &'a str,
    ) -> impl Iterator<Item = &'a Source> {
        self.sources
            .iter()
            .filter(move |source| source.individual().id() == individual)
    }
}

impl std::str::FromStr for Dataset {
    type Err = Error;

    /// Parses a dataset with relative paths left as they are.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::dataset::Dataset;
    ///
    /// let dataset = r#"
    /// cache = "cache"
    ///
    /// [[chromosomes]]
    /// name = "chr1"
    /// length = 100
    ///
    /// [[alignments]]
    /// id = "S1"
    /// individual = "P01"
    /// label = "healthy"
    /// input = "S1.bam"
    /// "#
    /// .parse::<Dataset>()?;
    ///
    /// assert_eq!(dataset.genome().total_length(), 100);
    /// assert_eq!(dataset.sources()[0].id(), "S1");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, Path::new(""))
    }
}
