//! Reconstruction of sequenced fragments from paired reads.
//!
//! A [`Reconstructor`] consumes the alignment records of one alignment source
//! in a single pass. Records on chromosomes outside the [`Genome`] are
//! discarded. Records that are both paired and properly paired are grouped by
//! chromosome and read name into [`ReadPair`]s; every other mapped record is
//! kept as a single-read interval. Once the stream is exhausted,
//! [`Reconstructor::finish()`] turns every read pair into a fragment and fails
//! if any pair is still missing a half.

use std::collections::HashMap;

use omics::coordinate::position::Number;
use tracing::debug;
use tracing::warn;

use crate::Interval;
use crate::Record;
use crate::genome::Genome;

pub mod pair;

pub use pair::Half;
pub use pair::Mate;
pub use pair::ReadPair;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to reconstruction.
#[derive(Debug)]
pub enum Error {
    /// A read pair was still missing a half after the whole stream was read.
    IncompletePair {
        /// The chromosome the pair was aligned to.
        chromosome: String,

        /// The read name.
        read_name: String,

        /// The half that was seen.
        seen: Half,

        /// Where the seen half says its mate starts.
        mate_start: Option<Number>,

        /// The number of incomplete pairs on the chromosome.
        incomplete: usize,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IncompletePair {
                chromosome,
                read_name,
                seen,
                mate_start,
                incomplete,
            } => {
                write!(
                    f,
                    "incomplete read pair `{read_name}` on chromosome `{chromosome}`: only the \
                     {seen} of pair was found"
                )?;

                if let Some(position) = mate_start {
                    write!(f, " (mate expected at {position})")?;
                }

                write!(f, "; {incomplete} incomplete pair(s) on this chromosome")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Statistics
////////////////////////////////////////////////////////////////////////////////////////

/// Counts gathered while reading the records of one alignment source.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    /// Records read from the input.
    pub records: u64,

    /// Records on a contig that is not part of the genome.
    pub off_genome: u64,

    /// Unmapped records.
    pub unmapped: u64,

    /// Paired records with neither the first nor the second of pair flag.
    pub missing_designation: u64,

    /// Pair halves that were replaced by a later record with the same read
    /// name and designation.
    pub replaced_halves: u64,

    /// Fragments reconstructed.
    pub fragments: u64,

    /// Single-read intervals kept.
    pub single_reads: u64,
}

////////////////////////////////////////////////////////////////////////////////////////
// Reconstruction
////////////////////////////////////////////////////////////////////////////////////////

/// The fragments and single reads of one chromosome.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reads {
    /// Fragments from concordant pairs, sorted by start and then end.
    fragments: Vec<Interval>,

    /// Intervals of every other mapped read, in input order.
    singles: Vec<Interval>,
}

impl Reads {
    /// Gets the fragments.
    pub fn fragments(&self) -> &[Interval] {
        &self.fragments
    }

    /// Gets the single-read intervals.
    pub fn singles(&self) -> &[Interval] {
        &self.singles
    }
}

/// The result of a completed reconstruction.
#[derive(Clone, Debug)]
pub struct Reconstruction {
    /// Reads per chromosome, indexed like the genome.
    reads: Vec<Reads>,

    /// The summed length of all fragments across the genome.
    fragment_bases: u64,

    /// The summed length of all single-read intervals across the genome.
    single_bases: u64,

    /// Counts gathered along the way.
    statistics: Statistics,
}

impl Reconstruction {
    /// Gets the reads of a chromosome by its index in the genome.
    pub fn reads(&self, index: usize) -> Option<&Reads> {
        self.reads.get(index)
    }

    /// Gets the summed length of all fragments across the genome.
    pub fn fragment_bases(&self) -> u64 {
        self.fragment_bases
    }

    /// Gets the summed length of all single-read intervals across the genome.
    pub fn single_bases(&self) -> u64 {
        self.single_bases
    }

    /// Gets the statistics.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Reconstructor
////////////////////////////////////////////////////////////////////////////////////////

/// Groups the records of one alignment source into fragments and single reads.
#[derive(Debug)]
pub struct Reconstructor<'a> {
    /// The genome.
    genome: &'a Genome,

    /// The alignment ID, used for diagnostics.
    alignment: &'a str,

    /// Read pairs per chromosome, keyed by read name.
    pairs: Vec<HashMap<String, ReadPair>>,

    /// Single-read intervals per chromosome.
    singles: Vec<Vec<Interval>>,

    /// Counts gathered so far.
    statistics: Statistics,
}

/// The number of read pairs each chromosome's table is sized for up front.
pub const DEFAULT_PAIR_CAPACITY: usize = 100_000;

/// The number of single reads each chromosome's list is sized for up front.
pub const DEFAULT_SINGLE_CAPACITY: usize = 300_000;

impl<'a> Reconstructor<'a> {
    /// Creates a new [`Reconstructor`] with per-chromosome tables sized for
    /// [`DEFAULT_PAIR_CAPACITY`] pairs and [`DEFAULT_SINGLE_CAPACITY`] single
    /// reads.
    pub fn new(genome: &'a Genome, alignment: &'a str) -> Self {
        Self::with_capacity(
            genome,
            alignment,
            DEFAULT_PAIR_CAPACITY,
            DEFAULT_SINGLE_CAPACITY,
        )
    }

    /// Creates a new [`Reconstructor`] with per-chromosome tables pre-sized to
    /// hold `pairs` read pairs and `singles` single reads.
    pub fn with_capacity(
        genome: &'a Genome,
        alignment: &'a str,
        pairs: usize,
        singles: usize,
    ) -> Self {
        Self {
            genome,
            alignment,
            pairs: (0..genome.len())
                .map(|_| HashMap::with_capacity(pairs))
                .collect(),
            singles: (0..genome.len())
                .map(|_| Vec::with_capacity(singles))
                .collect(),
            statistics: Statistics::default(),
        }
    }

    /// Gets the statistics gathered so far.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Adds a record.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragcov::reconstruct::Reconstructor;
    /// use fragcov::record::Flags;
    /// use fragcov::Genome;
    /// use fragcov::Record;
    ///
    /// let genome = Genome::builder().push("chr1", 10)?.try_build()?;
    /// let mut reconstructor = Reconstructor::new(&genome, "sample");
    ///
    /// let pair = Flags::PAIRED | Flags::PROPER_PAIR;
    /// reconstructor.push(&Record::try_new("chr1", "r0", pair | Flags::FIRST_OF_PAIR, 3, 4, Some(6))?);
    /// reconstructor.push(&Record::try_new("chr1", "r0", pair | Flags::SECOND_OF_PAIR, 6, 7, Some(3))?);
    /// reconstructor.push(&Record::try_new("chr1", "r1", Flags::empty(), 1, 2, None)?);
    ///
    /// let reconstruction = reconstructor.finish()?;
    /// let reads = reconstruction.reads(0).unwrap();
    ///
    /// assert_eq!(reads.fragments().len(), 1);
    /// assert_eq!(reads.singles().len(), 1);
    /// assert_eq!(reconstruction.fragment_bases(), 5);
    /// assert_eq!(reconstruction.single_bases(), 2);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn push(&mut self, record: &Record) {
        self.statistics.records += 1;

        let index = match self.genome.index_of(record.contig()) {
            Some(index) => index,
            None => {
                self.statistics.off_genome += 1;
                return;
            }
        };

        let flags = record.flags();

        if flags.is_unmapped() {
            self.statistics.unmapped += 1;
            return;
        }

        if !(flags.is_paired() && flags.is_proper_pair()) {
            self.singles[index].push(record.span());
            return;
        }

        let half = if flags.is_first_of_pair() {
            Half::First
        } else if flags.is_second_of_pair() {
            Half::Second
        } else {
            warn!(
                alignment = self.alignment,
                read = record.name(),
                flags = %flags,
                "paired record has neither the first nor the second of pair flag set; skipping"
            );
            self.statistics.missing_designation += 1;
            return;
        };

        let mate = Mate::new(record.span(), record.mate_start());
        let pairs = &mut self.pairs[index];

        let replaced = match pairs.get_mut(record.name()) {
            Some(pair) => pair.set(half, mate),
            None => {
                let mut pair = ReadPair::default();
                pair.set(half, mate);
                pairs.insert(record.name().to_owned(), pair);
                None
            }
        };

        if replaced.is_some() {
            debug!(
                alignment = self.alignment,
                read = record.name(),
                "{half} of pair seen more than once; keeping the latest record"
            );
            self.statistics.replaced_halves += 1;
        }
    }

    /// Consumes `self` and turns every read pair into a fragment.
    ///
    /// Every read pair must be complete at this point: a pair missing a half
    /// means the input was truncated or corrupt, and an [`Error`] is returned
    /// rather than a silently skewed coverage profile.
    pub fn finish(self) -> Result<Reconstruction> {
        let Self {
            genome,
            pairs,
            singles,
            mut statistics,
            ..
        } = self;

        let mut reads = Vec::with_capacity(genome.len());
        let mut fragment_bases = 0u64;
        let mut single_bases = 0u64;

        for ((chromosome, pairs), singles) in genome.chromosomes().zip(pairs).zip(singles) {
            let mut fragments = Vec::with_capacity(pairs.len());

            for (read_name, pair) in &pairs {
                match pair.fragment() {
                    Some(fragment) => fragments.push(fragment),
                    None => {
                        let (seen, mate) = match pair.lone_half() {
                            Some(lone) => lone,
                            // Pairs are only ever created with one half
                            // set, so an incomplete pair always has a lone half.
                            None => unreachable!("a stored pair always has at least one half"),
                        };

                        return Err(Error::IncompletePair {
                            chromosome: chromosome.name().to_owned(),
                            read_name: read_name.clone(),
                            seen,
                            mate_start: mate.mate_start(),
                            incomplete: pairs.values().filter(|p| !p.is_complete()).count(),
                        });
                    }
                }
            }

            fragments.sort_unstable();

            fragment_bases += fragments.iter().map(|f| f.len()).sum::<Number>();
            single_bases += singles.iter().map(|s| s.len()).sum::<Number>();

            statistics.fragments += fragments.len() as u64;
            statistics.single_reads += singles.len() as u64;

            reads.push(Reads { fragments, singles });
        }

        Ok(Reconstruction {
            reads,
            fragment_bases,
            single_bases,
            statistics,
        })
    }
}
