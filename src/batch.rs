//! Processing many alignment sources on a bounded worker pool.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::error;
use tracing::info;

use crate::Alignment;
use crate::Config;
use crate::Genome;
use crate::alignment;
use crate::alignment::Input;
use crate::alignment::Source;
use crate::cache::Store;

/// An error related to a [`Batch`].
#[derive(Debug)]
pub enum Error {
    /// The worker pool could not be created.
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ThreadPool(err) => write!(f, "unable to create the worker pool: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// Opens alignments in parallel against one genome, cache, and input.
///
/// Each source is handled start to finish by a single worker. A failure is
/// confined to its own source: it is logged, returned in that source's slot,
/// and never stops the others.
#[derive(Debug)]
pub struct Batch<'a, I: ?Sized> {
    /// The genome.
    genome: Arc<Genome>,

    /// The cache.
    store: Store,

    /// The configuration.
    config: Config,

    /// The record input.
    input: &'a I,
}

impl<'a, I> Batch<'a, I>
where
    I: Input + Sync + ?Sized,
{
    /// Creates a new [`Batch`].
    pub fn new(genome: Arc<Genome>, store: Store, config: &Config, input: &'a I) -> Self {
        Self {
            genome,
            store,
            config: *config,
            input,
        }
    }

    /// Opens every source on a pool of [`Config::threads()`] workers.
    ///
    /// One result is returned per source, in the order the sources were
    /// given. Two sources that share an individual and an alignment ID would
    /// write the same cache entries, so every repeat after the first is
    /// rejected with [`alignment::Error::DuplicateSource`] without being
    /// processed.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use std::path::PathBuf;
    /// use std::sync::Arc;
    ///
    /// use fragcov::alignment::Source;
    /// use fragcov::batch::Batch;
    /// use fragcov::cache::Store;
    /// use fragcov::record::Flags;
    /// use fragcov::Config;
    /// use fragcov::Genome;
    /// use fragcov::Individual;
    /// use fragcov::Record;
    ///
    /// let genome = Arc::new(Genome::builder().push("chr1", 10)?.try_build()?);
    /// let dir = tempfile::tempdir()?;
    ///
    /// let mut input = HashMap::new();
    /// input.insert(
    ///     PathBuf::from("a.bam"),
    ///     vec![Record::try_new("chr1", "r0", Flags::empty(), 1, 5, None)?],
    /// );
    ///
    /// let sources = ["a.bam", "b.bam"]
    ///     .into_iter()
    ///     .map(|path| {
    ///         Source::builder()
    ///             .id(path.trim_end_matches(".bam"))
    ///             .individual(Individual::new("P01", "healthy"))
    ///             .input(path)
    ///             .try_build()
    ///     })
    ///     .collect::<Result<Vec<_>, _>>()?;
    ///
    /// let batch = Batch::new(genome, Store::new(dir.path()), &Config::default(), &input);
    /// let results = batch.run(sources)?;
    ///
    /// assert!(results[0].is_ok());
    /// assert!(results[1].is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn run(
        &self,
        sources: Vec<Source>,
    ) -> Result<Vec<std::result::Result<Alignment, alignment::Error>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads().get())
            .build()
            .map_err(Error::ThreadPool)?;

        let total = sources.len();
        let mut seen = HashSet::new();
        let jobs = sources
            .into_iter()
            .map(|source| {
                let prefix = (
                    source.individual().label().to_owned(),
                    source.individual().id().to_owned(),
                    source.id().to_owned(),
                );

                match seen.insert(prefix) {
                    true => Ok(source),
                    false => Err(alignment::Error::DuplicateSource {
                        alignment: source.id().to_owned(),
                        individual: source.individual().clone(),
                    }),
                }
            })
            .collect::<Vec<_>>();

        info!(
            sources = total,
            threads = self.config.threads().get(),
            "processing alignments"
        );

        let results = pool.install(|| {
            jobs.into_par_iter()
                .map(|job| {
                    let result = job.and_then(|source| {
                        Alignment::open(
                            source,
                            Arc::clone(&self.genome),
                            self.store.clone(),
                            &self.config,
                            self.input,
                        )
                    });

                    if let Err(err) = &result {
                        error!(alignment = err.alignment(), "{err}");
                    }

                    result
                })
                .collect::<Vec<_>>()
        });

        let failed = results.iter().filter(|result| result.is_err()).count();
        info!(sources = total, failed, "finished processing alignments");

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::num::NonZeroUsize;
    use std::path::PathBuf;

    use super::*;
    use crate::Individual;
    use crate::Record;
    use crate::record::Flags;

    fn source(id: &str, individual: &str, input: &str) -> Source {
        Source::builder()
            .id(id)
            .individual(Individual::new(individual, "healthy"))
            .input(input)
            .try_build()
            .unwrap()
    }

    fn single(start: u64, end: u64) -> Vec<Record> {
        vec![Record::try_new("chr1", "r0", Flags::empty(), start, end, None).unwrap()]
    }

    #[test]
    fn test_results_keep_input_order_and_failures_stay_local(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let genome = Arc::new(Genome::builder().push("chr1", 10)?.try_build()?);

        let mut input = HashMap::new();
        input.insert(PathBuf::from("1.bam"), single(1, 1));
        input.insert(PathBuf::from("2.bam"), single(1, 2));
        input.insert(PathBuf::from("4.bam"), single(1, 4));

        let sources = vec![
            source("S1", "P01", "1.bam"),
            source("S2", "P01", "2.bam"),
            source("S3", "P01", "missing.bam"),
            source("S4", "P02", "4.bam"),
        ];

        let config = Config::default().with_threads(NonZeroUsize::new(2).unwrap());
        let batch = Batch::new(genome, Store::new(dir.path()), &config, &input);
        let results = batch.run(sources)?;

        assert_eq!(results.len(), 4);

        for (result, covered) in [(&results[0], 1), (&results[1], 2), (&results[3], 4)] {
            let alignment = result.as_ref().unwrap();
            let coverage = alignment.coverage("chr1", true)?;
            assert_eq!(coverage.iter().sum::<u32>(), covered);
        }

        assert!(matches!(
            results[2],
            Err(alignment::Error::InputMissing { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_repeated_sources_are_rejected() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let genome = Arc::new(Genome::builder().push("chr1", 10)?.try_build()?);

        let mut input = HashMap::new();
        input.insert(PathBuf::from("1.bam"), single(1, 3));

        let sources = vec![
            source("S1", "P01", "1.bam"),
            source("S1", "P01", "1.bam"),
            source("S1", "P02", "1.bam"),
        ];

        let batch = Batch::new(genome, Store::new(dir.path()), &Config::default(), &input);
        let results = batch.run(sources)?;

        assert!(results[0].is_ok());
        assert!(results[2].is_ok());

        let err = results[1].as_ref().unwrap_err();
        assert_eq!(
            err.to_string(),
            "alignment `S1` of individual healthy/P01 was submitted more than once"
        );

        Ok(())
    }
}
