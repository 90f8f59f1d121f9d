//! Coverage of one alignment source, served from the cache.
//!
//! An [`Alignment`] is opened from a [`Source`] (which individual, which raw
//! input) against a shared [`Genome`]. Opening checks that every cache entry
//! of the source exists: five per chromosome (see [`Variant::ALL`]). If even
//! one is missing, the raw input is read once, from start to finish, and every
//! entry of every chromosome is rebuilt from that single pass. Once open, all
//! accessors read straight from the cache.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::Config;
use crate::Genome;
use crate::Individual;
use crate::Interval;
use crate::Record;
use crate::cache;
use crate::cache::Element;
use crate::cache::Key;
use crate::cache::Store;
use crate::cache::Variant;
use crate::coverage;
use crate::fragments;
use crate::fragments::Fragments;
use crate::genome::Chromosome;
use crate::normalize::Basis;
use crate::normalize::Normalizer;
use crate::normalize::Totals;
use crate::reconstruct;
use crate::reconstruct::Reconstructor;
use crate::reconstruct::Statistics;

pub mod builder;

pub use builder::Builder;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to an [`Alignment`].
///
/// Every variant names the alignment it concerns, so an error can be reported
/// on its own when many sources are processed together.
#[derive(Debug)]
pub enum Error {
    /// The raw input does not exist.
    InputMissing {
        /// The alignment ID.
        alignment: String,

        /// The input path.
        path: PathBuf,
    },

    /// The raw input could not be read.
    Input {
        /// The alignment ID.
        alignment: String,

        /// The input path.
        path: PathBuf,

        /// The underlying error.
        source: io::Error,
    },

    /// The records could not be reconstructed into fragments.
    Reconstruct {
        /// The alignment ID.
        alignment: String,

        /// The underlying error.
        source: reconstruct::Error,
    },

    /// The coverage of a chromosome could not be accumulated.
    Coverage {
        /// The alignment ID.
        alignment: String,

        /// The chromosome.
        chromosome: String,

        /// The underlying error.
        source: coverage::Error,
    },

    /// A cached fragment array is malformed.
    Fragments {
        /// The alignment ID.
        alignment: String,

        /// The chromosome.
        chromosome: String,

        /// The underlying error.
        source: fragments::FlatError,
    },

    /// The cache could not be read or written.
    Cache {
        /// The alignment ID.
        alignment: String,

        /// The underlying error.
        source: cache::Error,
    },

    /// A chromosome that is not part of the genome was requested.
    UnknownChromosome {
        /// The alignment ID.
        alignment: String,

        /// The chromosome.
        chromosome: String,
    },

    /// The same alignment of the same individual was submitted more than once.
    DuplicateSource {
        /// The alignment ID.
        alignment: String,

        /// The individual.
        individual: Individual,
    },
}

impl Error {
    /// Gets the ID of the alignment the error concerns.
    pub fn alignment(&self) -> &str {
        match self {
            Error::InputMissing { alignment, .. }
            | Error::Input { alignment, .. }
            | Error::Reconstruct { alignment, .. }
            | Error::Coverage { alignment, .. }
            | Error::Fragments { alignment, .. }
            | Error::Cache { alignment, .. }
            | Error::UnknownChromosome { alignment, .. }
            | Error::DuplicateSource { alignment, .. } => alignment.as_str(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InputMissing { alignment, path } => write!(
                f,
                "alignment `{alignment}`: input not found at {}",
                path.display()
            ),
            Error::Input {
                alignment,
                path,
                source,
            } => write!(
                f,
                "alignment `{alignment}`: i/o error reading {}: {source}",
                path.display()
            ),
            Error::Reconstruct { alignment, source } => {
                write!(f, "alignment `{alignment}`: {source}")
            }
            Error::Coverage {
                alignment,
                chromosome,
                source,
            } => write!(
                f,
                "alignment `{alignment}`, chromosome `{chromosome}`: {source}"
            ),
            Error::Fragments {
                alignment,
                chromosome,
                source,
            } => write!(
                f,
                "alignment `{alignment}`, chromosome `{chromosome}`: invalid cached fragments: \
                 {source}"
            ),
            Error::Cache { alignment, source } => {
                write!(f, "alignment `{alignment}`: cache error: {source}")
            }
            Error::UnknownChromosome {
                alignment,
                chromosome,
            } => write!(
                f,
                "alignment `{alignment}`: chromosome `{chromosome}` is not part of the genome"
            ),
            Error::DuplicateSource {
                alignment,
                individual,
            } => write!(
                f,
                "alignment `{alignment}` of individual {individual} was submitted more than once"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Input
////////////////////////////////////////////////////////////////////////////////////////

/// A source of alignment [`Record`]s.
///
/// This is the seam between the coverage engine and whatever parses the raw
/// alignment container. [`open()`](Input::open) is called at most once per
/// [`Alignment::open()`], and only when the cache is incomplete.
pub trait Input {
    /// The stream of records yielded for one input.
    type Records: Iterator<Item = io::Result<Record>>;

    /// Opens the input at `path`.
    ///
    /// An error of kind [`io::ErrorKind::NotFound`] is reported as
    /// [`Error::InputMissing`].
    fn open(&self, path: &Path) -> io::Result<Self::Records>;
}

/// Records held in memory, keyed by the path they stand in for.
impl Input for HashMap<PathBuf, Vec<Record>> {
    type Records = std::iter::Map<std::vec::IntoIter<Record>, fn(Record) -> io::Result<Record>>;

    fn open(&self, path: &Path) -> io::Result<Self::Records> {
        let records = self.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no records for {}", path.display()),
            )
        })?;

        let ok: fn(Record) -> io::Result<Record> = Ok;
        Ok(records.clone().into_iter().map(ok))
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Sources
////////////////////////////////////////////////////////////////////////////////////////

/// Describes one sequencing run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Source {
    /// The alignment ID.
    id: String,

    /// The individual the run belongs to.
    individual: Individual,

    /// The path of the raw alignment input.
    input: PathBuf,

    /// The time label.
    time: Option<String>,

    /// The condition label.
    condition: Option<String>,
}

impl Source {
    /// Gets a [`Builder`] for a [`Source`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Gets the alignment ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets the individual.
    pub fn individual(&self) -> &Individual {
        &self.individual
    }

    /// Gets the path of the raw alignment input.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Gets the time label.
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    /// Gets the condition label.
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Alignment
////////////////////////////////////////////////////////////////////////////////////////

/// The cached coverage of one alignment source.
#[derive(Clone, Debug)]
pub struct Alignment {
    /// The source.
    source: Source,

    /// The genome.
    genome: Arc<Genome>,

    /// The cache.
    store: Store,

    /// The configuration.
    config: Config,

    /// Statistics from the input pass, if one was needed.
    statistics: Option<Statistics>,
}

impl Alignment {
    /// Opens an [`Alignment`], computing and caching its coverage if any cache
    /// entry is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use std::path::PathBuf;
    /// use std::sync::Arc;
    ///
    /// use fragcov::alignment::Source;
    /// use fragcov::cache::Store;
    /// use fragcov::record::Flags;
    /// use fragcov::Alignment;
    /// use fragcov::Config;
    /// use fragcov::Genome;
    /// use fragcov::Individual;
    /// use fragcov::Record;
    ///
    /// let genome = Arc::new(Genome::builder().push("chr1", 10)?.try_build()?);
    /// let dir = tempfile::tempdir()?;
    ///
    /// let pair = Flags::PAIRED | Flags::PROPER_PAIR;
    /// let mut input = HashMap::new();
    /// input.insert(
    ///     PathBuf::from("S1.bam"),
    ///     vec![
    ///         Record::try_new("chr1", "r0", pair | Flags::FIRST_OF_PAIR, 3, 4, Some(6))?,
    ///         Record::try_new("chr1", "r0", pair | Flags::SECOND_OF_PAIR, 6, 7, Some(3))?,
    ///         Record::try_new("chr1", "r1", Flags::empty(), 1, 2, None)?,
    ///     ],
    /// );
    ///
    /// let source = Source::builder()
    ///     .id("S1")
    ///     .individual(Individual::new("P01", "healthy"))
    ///     .input("S1.bam")
    ///     .try_build()?;
    ///
    /// let alignment = Alignment::open(
    ///     source,
    ///     genome,
    ///     Store::new(dir.path()),
    ///     &Config::default(),
    ///     &input,
    /// )?;
    ///
    /// assert_eq!(alignment.coverage("chr1", false)?, vec![0, 0, 1, 1, 1, 1, 1, 0, 0, 0]);
    /// assert_eq!(alignment.coverage("chr1", true)?, vec![1, 1, 1, 1, 1, 1, 1, 0, 0, 0]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open<I>(
        source: Source,
        genome: Arc<Genome>,
        store: Store,
        config: &Config,
        input: &I,
    ) -> Result<Self>
    where
        I: Input + ?Sized,
    {
        let mut alignment = Self {
            source,
            genome,
            store,
            config: *config,
            statistics: None,
        };

        let missing = alignment.missing()?;

        if missing == 0 {
            debug!(alignment = alignment.id(), "every cache entry is present");
            return Ok(alignment);
        }

        info!(
            alignment = alignment.id(),
            missing, "cache incomplete: computing coverage from the input"
        );

        alignment.statistics = Some(alignment.compute(input)?);
        Ok(alignment)
    }

    /// Gets the alignment ID.
    pub fn id(&self) -> &str {
        self.source.id()
    }

    /// Gets the source.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Gets the genome.
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Gets the statistics of the input pass.
    ///
    /// This is [`None`] when every entry was already cached and the input was
    /// never read.
    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    /// Returns whether every cache entry of the alignment exists.
    pub fn is_cached(&self) -> Result<bool> {
        Ok(self.missing()? == 0)
    }

    /// Gets the absolute coverage of a chromosome.
    ///
    /// Single reads are included only if requested *and* the configuration is
    /// not restricted to fragments.
    pub fn coverage(&self, chromosome: &str, include_single_reads: bool) -> Result<Vec<u32>> {
        let basis = self.basis(include_single_reads);
        self.read_exact(chromosome, Variant::Absolute(basis))
    }

    /// Gets the normalized coverage of a chromosome.
    ///
    /// Single reads are included under the same rule as
    /// [`coverage()`](Self::coverage).
    pub fn normalized_coverage(
        &self,
        chromosome: &str,
        include_single_reads: bool,
    ) -> Result<Vec<f32>> {
        let basis = self.basis(include_single_reads);
        self.read_exact(chromosome, Variant::Normalized(basis))
    }

    /// Gets the fragments of a chromosome.
    pub fn fragments(&self, chromosome: &str) -> Result<Fragments> {
        let name = self.chromosome(chromosome)?.name();
        let key = self.key(name, Variant::Fragments)?;
        let flat = self
            .store
            .read::<u64>(&key)
            .map_err(|source| self.cache_error(source))?;

        Fragments::try_from(flat).map_err(|source| Error::Fragments {
            alignment: self.id().to_owned(),
            chromosome: name.to_owned(),
            source,
        })
    }

    /// Gets the fragments of a chromosome that overlap an interval.
    pub fn fragments_overlapping(
        &self,
        chromosome: &str,
        interval: Interval,
    ) -> Result<Vec<Interval>> {
        Ok(self.fragments(chromosome)?.overlapping(interval))
    }

    /// Gets the mean absolute coverage across the whole genome.
    pub fn mean_coverage(&self, include_single_reads: bool) -> Result<f64> {
        let mut covered = 0u64;

        for chromosome in self.genome.chromosomes() {
            covered += self
                .coverage(chromosome.name(), include_single_reads)?
                .iter()
                .map(|value| u64::from(*value))
                .sum::<u64>();
        }

        Ok(covered as f64 / self.genome.total_length() as f64)
    }

    /// Resolves the basis served for a request.
    fn basis(&self, include_single_reads: bool) -> Basis {
        match self.config.include_single_reads(include_single_reads) {
            true => Basis::AllReads,
            false => Basis::FragmentsOnly,
        }
    }

    /// Looks up a chromosome of the genome.
    fn chromosome(&self, name: &str) -> Result<&Chromosome> {
        self.genome
            .get(name)
            .ok_or_else(|| Error::UnknownChromosome {
                alignment: self.id().to_owned(),
                chromosome: name.to_owned(),
            })
    }

    /// Builds the cache key of one entry.
    fn key(&self, chromosome: &str, variant: Variant) -> Result<Key> {
        Key::try_new(self.source.individual(), self.id(), chromosome, variant)
            .map_err(|err| self.cache_error(cache::Error::Key(err)))
    }

    /// Wraps a cache error.
    fn cache_error(&self, source: cache::Error) -> Error {
        Error::Cache {
            alignment: self.id().to_owned(),
            source,
        }
    }

    /// Counts the cache entries that do not exist yet.
    fn missing(&self) -> Result<usize> {
        let mut missing = 0;

        for chromosome in self.genome.names() {
            for variant in Variant::ALL {
                if !self.store.contains(&self.key(chromosome, variant)?) {
                    missing += 1;
                }
            }
        }

        Ok(missing)
    }

    /// Reads a coverage array whose length must match its chromosome.
    fn read_exact<T: Element>(&self, chromosome: &str, variant: Variant) -> Result<Vec<T>> {
        let chromosome = self.chromosome(chromosome)?;
        let key = self.key(chromosome.name(), variant)?;

        self.store
            .read_exact(&key, chromosome.size())
            .map_err(|source| self.cache_error(source))
    }

    /// Writes one cache entry.
    fn write<T: Element>(&self, chromosome: &str, variant: Variant, values: &[T]) -> Result<()> {
        let key = self.key(chromosome, variant)?;

        self.store
            .write(&key, values)
            .map_err(|source| self.cache_error(source))
    }

    /// Reads the input once and rewrites every cache entry.
    fn compute<I>(&self, input: &I) -> Result<Statistics>
    where
        I: Input + ?Sized,
    {
        let alignment = self.id();
        let path = self.source.input();

        let records = input.open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::InputMissing {
                alignment: alignment.to_owned(),
                path: path.to_path_buf(),
            },
            _ => Error::Input {
                alignment: alignment.to_owned(),
                path: path.to_path_buf(),
                source,
            },
        })?;

        // (1) Reconstructs fragments and single reads in a single pass.
        let mut reconstructor = Reconstructor::new(&self.genome, alignment);

        for record in records {
            let record = record.map_err(|source| Error::Input {
                alignment: alignment.to_owned(),
                path: path.to_path_buf(),
                source,
            })?;

            reconstructor.push(&record);
        }

        let reconstruction = reconstructor
            .finish()
            .map_err(|source| Error::Reconstruct {
                alignment: alignment.to_owned(),
                source,
            })?;

        // (2) Derives the genome-wide averages once for the whole source.
        let totals = Totals::new(
            self.genome.total_length(),
            reconstruction.fragment_bases(),
            reconstruction.single_bases(),
        );
        let fragments_only = Normalizer::new(alignment, &totals, Basis::FragmentsOnly);
        let all_reads = Normalizer::new(alignment, &totals, Basis::AllReads);

        // (3) Accumulates, normalizes, and caches each chromosome.
        for (index, chromosome) in self.genome.chromosomes().enumerate() {
            let name = chromosome.name();
            let reads = match reconstruction.reads(index) {
                Some(reads) => reads,
                // A reconstruction holds one entry per chromosome of
                // the genome it was built against.
                None => unreachable!("reconstruction is missing chromosome `{name}`"),
            };

            let profile = coverage::profile(chromosome.size(), reads.fragments(), reads.singles())
                .map_err(|source| Error::Coverage {
                    alignment: alignment.to_owned(),
                    chromosome: name.to_owned(),
                    source,
                })?;

            self.write(
                name,
                Variant::Normalized(Basis::FragmentsOnly),
                &fragments_only.apply(profile.fragments_only()),
            )?;
            self.write(
                name,
                Variant::Normalized(Basis::AllReads),
                &all_reads.apply(profile.all_reads()),
            )?;

            let (absolute_fragments_only, absolute_all_reads) = profile.into_parts();
            self.write(
                name,
                Variant::Absolute(Basis::FragmentsOnly),
                &absolute_fragments_only,
            )?;
            self.write(name, Variant::Absolute(Basis::AllReads), &absolute_all_reads)?;
            self.write(
                name,
                Variant::Fragments,
                &fragments::flatten(reads.fragments()),
            )?;

            debug!(
                alignment,
                chromosome = name,
                fragments = reads.fragments().len(),
                singles = reads.singles().len(),
                "cached chromosome"
            );
        }

        let statistics = reconstruction.statistics().clone();

        info!(
            alignment,
            records = statistics.records,
            fragments = statistics.fragments,
            single_reads = statistics.single_reads,
            off_genome = statistics.off_genome,
            unmapped = statistics.unmapped,
            missing_designation = statistics.missing_designation,
            replaced_halves = statistics.replaced_halves,
            "computed coverage"
        );

        Ok(statistics)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::record::Flags;

    /// An in-memory input that counts how often it is opened.
    #[derive(Debug, Default)]
    struct Counting {
        records: HashMap<PathBuf, Vec<Record>>,
        opens: AtomicUsize,
    }

    impl Input for Counting {
        type Records = <HashMap<PathBuf, Vec<Record>> as Input>::Records;

        fn open(&self, path: &Path) -> io::Result<Self::Records> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.records.open(path)
        }
    }

    fn pair(name: &str, first: (u64, u64), second: (u64, u64)) -> Vec<Record> {
        let flags = Flags::PAIRED | Flags::PROPER_PAIR;

        vec![
            Record::try_new(
                "chr1",
                name,
                flags | Flags::FIRST_OF_PAIR,
                first.0,
                first.1,
                Some(second.0),
            )
            .unwrap(),
            Record::try_new(
                "chr1",
                name,
                flags | Flags::SECOND_OF_PAIR,
                second.0,
                second.1,
                Some(first.0),
            )
            .unwrap(),
        ]
    }

    fn genome() -> Arc<Genome> {
        Arc::new(
            Genome::builder()
                .push("chr1", 10)
                .and_then(|b| b.push("chr2", 10))
                .and_then(|b| b.try_build())
                .unwrap(),
        )
    }

    fn source() -> Source {
        Source::builder()
            .id("S1")
            .individual(Individual::new("P01", "healthy"))
            .input("S1.bam")
            .try_build()
            .unwrap()
    }

    fn input(records: Vec<Record>) -> Counting {
        let mut input = Counting::default();
        input.records.insert(PathBuf::from("S1.bam"), records);
        input
    }

    fn scenario() -> Counting {
        let mut records = pair("r0", (3, 4), (6, 7));
        records.push(Record::try_new("chr1", "r1", Flags::empty(), 1, 2, None).unwrap());
        input(records)
    }

    #[test]
    fn test_one_pair_and_one_single_read() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let alignment = Alignment::open(
            source(),
            genome(),
            Store::new(dir.path()),
            &Config::default(),
            &scenario(),
        )?;

        assert_eq!(
            alignment.coverage("chr1", false)?,
            vec![0, 0, 1, 1, 1, 1, 1, 0, 0, 0]
        );
        assert_eq!(
            alignment.coverage("chr1", true)?,
            vec![1, 1, 1, 1, 1, 1, 1, 0, 0, 0]
        );
        assert_eq!(
            alignment.fragments("chr1")?.as_slice(),
            &[Interval::try_new(3, 7)?]
        );

        // Five fragment bases over a twenty base genome.
        let normalized = alignment.normalized_coverage("chr1", false)?;
        assert_eq!(normalized, vec![0.0, 0.0, 4.0, 4.0, 4.0, 4.0, 4.0, 0.0, 0.0, 0.0]);

        // Seven mapped bases over a twenty base genome.
        let normalized = alignment.normalized_coverage("chr1", true)?;
        assert!((normalized[0] - 20.0 / 7.0).abs() < 1e-5);

        let statistics = alignment.statistics().unwrap();
        assert_eq!(statistics.fragments, 1);
        assert_eq!(statistics.single_reads, 1);

        assert_eq!(alignment.mean_coverage(false)?, 0.25);
        assert_eq!(alignment.mean_coverage(true)?, 0.35);

        Ok(())
    }

    #[test]
    fn test_a_chromosome_without_reads_is_all_zeros() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let alignment = Alignment::open(
            source(),
            genome(),
            Store::new(dir.path()),
            &Config::default(),
            &scenario(),
        )?;

        assert_eq!(alignment.coverage("chr2", true)?, vec![0; 10]);
        assert_eq!(alignment.normalized_coverage("chr2", true)?, vec![0.0; 10]);
        assert!(alignment.fragments("chr2")?.is_empty());

        Ok(())
    }

    #[test]
    fn test_nothing_mapped_normalizes_to_zeros() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let undesignated = Record::try_new(
            "chr1",
            "r0",
            Flags::PAIRED | Flags::PROPER_PAIR,
            3,
            7,
            Some(5),
        )?;

        let alignment = Alignment::open(
            source(),
            genome(),
            Store::new(dir.path()),
            &Config::default(),
            &input(vec![undesignated]),
        )?;

        assert_eq!(alignment.coverage("chr1", true)?, vec![0; 10]);
        assert_eq!(alignment.normalized_coverage("chr1", false)?, vec![0.0; 10]);
        assert_eq!(alignment.statistics().unwrap().missing_designation, 1);

        Ok(())
    }

    #[test]
    fn test_the_input_is_read_only_once() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = scenario();

        let first = Alignment::open(
            source(),
            genome(),
            Store::new(dir.path()),
            &Config::default(),
            &input,
        )?;
        let second = Alignment::open(
            source(),
            genome(),
            Store::new(dir.path()),
            &Config::default(),
            &input,
        )?;

        assert_eq!(input.opens.load(Ordering::SeqCst), 1);
        assert!(second.statistics().is_none());
        assert!(second.is_cached()?);

        for chromosome in ["chr1", "chr2"] {
            for include_single_reads in [false, true] {
                assert_eq!(
                    first.coverage(chromosome, include_single_reads)?,
                    second.coverage(chromosome, include_single_reads)?
                );

                let a = first.normalized_coverage(chromosome, include_single_reads)?;
                let b = second.normalized_coverage(chromosome, include_single_reads)?;
                assert!(a.iter().zip(&b).all(|(a, b)| a.to_bits() == b.to_bits()));
            }
        }

        Ok(())
    }

    #[test]
    fn test_a_missing_entry_rebuilds_the_whole_source() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let input = scenario();

        Alignment::open(source(), genome(), store.clone(), &Config::default(), &input)?;

        let key = Key::try_new(
            &Individual::new("P01", "healthy"),
            "S1",
            "chr2",
            Variant::Normalized(Basis::AllReads),
        )?;
        std::fs::remove_file(store.path(&key))?;

        let alignment = Alignment::open(source(), genome(), store.clone(), &Config::default(), &input)?;

        assert_eq!(input.opens.load(Ordering::SeqCst), 2);
        assert!(store.contains(&key));
        assert!(alignment.is_cached()?);

        Ok(())
    }

    #[test]
    fn test_fragments_only_overrides_the_request() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let config = Config::default().with_fragments_only(true);
        let alignment = Alignment::open(
            source(),
            genome(),
            Store::new(dir.path()),
            &config,
            &scenario(),
        )?;

        assert_eq!(
            alignment.coverage("chr1", true)?,
            alignment.coverage("chr1", false)?
        );
        assert_eq!(
            alignment.normalized_coverage("chr1", true)?,
            alignment.normalized_coverage("chr1", false)?
        );

        Ok(())
    }

    #[test]
    fn test_an_incomplete_pair_caches_nothing() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let mut records = pair("r0", (3, 4), (6, 7));
        records.pop();

        let err = Alignment::open(
            source(),
            genome(),
            store.clone(),
            &Config::default(),
            &input(records),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Reconstruct { .. }));
        assert_eq!(err.alignment(), "S1");
        assert!(!dir.path().join("healthy").exists());

        Ok(())
    }

    #[test]
    fn test_a_missing_input_is_reported() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let err = Alignment::open(
            source(),
            genome(),
            Store::new(dir.path()),
            &Config::default(),
            &Counting::default(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "alignment `S1`: input not found at S1.bam");

        Ok(())
    }

    #[test]
    fn test_out_of_bounds_reads_are_fatal() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let records = vec![Record::try_new("chr1", "r0", Flags::empty(), 8, 12, None)?];

        let err = Alignment::open(
            source(),
            genome(),
            Store::new(dir.path()),
            &Config::default(),
            &input(records),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Coverage { ref chromosome, .. } if chromosome == "chr1"));

        Ok(())
    }

    #[test]
    fn test_accessor_errors() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let alignment = Alignment::open(
            source(),
            genome(),
            store.clone(),
            &Config::default(),
            &scenario(),
        )?;

        let err = alignment.coverage("chrX", true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "alignment `S1`: chromosome `chrX` is not part of the genome"
        );

        // An entry of the wrong length is an integrity violation.
        let key = Key::try_new(
            &Individual::new("P01", "healthy"),
            "S1",
            "chr1",
            Variant::Absolute(Basis::AllReads),
        )?;
        store.write(&key, &[1u32, 2, 3])?;

        let err = alignment.coverage("chr1", true).unwrap_err();
        assert!(matches!(
            err,
            Error::Cache {
                source: cache::Error::LengthMismatch { expected: 10, found: 3, .. },
                ..
            }
        ));

        // So is a fragment ending where no chromosome can reach.
        let key = Key::try_new(
            &Individual::new("P01", "healthy"),
            "S1",
            "chr1",
            Variant::Fragments,
        )?;
        store.write(&key, &[3u64, u64::MAX])?;

        let err = alignment.fragments("chr1").unwrap_err();
        assert!(matches!(
            err,
            Error::Fragments {
                source: crate::fragments::FlatError::EndOutOfRange(0),
                ..
            }
        ));

        Ok(())
    }

    #[test]
    fn test_overlapping_fragments() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut records = pair("r0", (1, 2), (3, 4));
        records.extend(pair("r1", (6, 7), (9, 10)));

        let alignment = Alignment::open(
            source(),
            genome(),
            Store::new(dir.path()),
            &Config::default(),
            &input(records),
        )?;

        assert_eq!(
            alignment.fragments_overlapping("chr1", Interval::try_new(4, 5)?)?,
            vec![Interval::try_new(1, 4)?]
        );
        assert_eq!(alignment.fragments("chr1")?.lengths(), vec![4, 5]);

        Ok(())
    }
}
