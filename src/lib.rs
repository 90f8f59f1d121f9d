//! `fragcov` is a crate for deriving per-base coverage from paired-end
//! alignments and caching it on disk.
//!
//! Coverage is derived in four steps:
//!
//! - **Reconstruction.** Alignment [`Record`]s are grouped into read pairs by
//!   chromosome and read name. Every concordant pair becomes one fragment
//!   spanning both mates, gap included; every other mapped read is kept as a
//!   single-read interval (see [`reconstruct`]).
//! - **Accumulation.** Fragments and single reads are counted per base,
//!   producing a fragments-only and an all-reads coverage array for each
//!   chromosome (see [`coverage`]).
//! - **Normalization.** Each array is divided by the average coverage across
//!   the whole genome (see [`normalize`]).
//! - **Caching.** Every array is compressed and written to a
//!   [`Store`](cache::Store) under a path derived from the individual, the
//!   alignment, and the chromosome (see [`cache`]).
//!
//! Most users will only deal with [`Alignment`], which runs those steps the
//! first time an alignment is opened and serves every later request straight
//! from the cache. When many alignments need to be processed, a
//! [`Batch`](batch::Batch) opens them in parallel on a bounded worker pool.
//!
//! All positions are 1-based and closed, as in the alignment input. Index `i`
//! of a coverage array holds the coverage of position `i + 1`.
//!
//! ```
//! use std::collections::HashMap;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use fragcov::alignment::Source;
//! use fragcov::cache::Store;
//! use fragcov::record::Flags;
//! use fragcov::Alignment;
//! use fragcov::Config;
//! use fragcov::Genome;
//! use fragcov::Individual;
//! use fragcov::Interval;
//! use fragcov::Record;
//!
//! let genome = Genome::builder().push("chr1", 10)?.try_build()?;
//!
//! // Any type implementing `Input` can feed records: here, a map from paths
//! // to records held in memory.
//! let pair = Flags::PAIRED | Flags::PROPER_PAIR;
//! let mut input = HashMap::new();
//! input.insert(
//!     PathBuf::from("S1.bam"),
//!     vec![
//!         Record::try_new("chr1", "r0", pair | Flags::FIRST_OF_PAIR, 3, 4, Some(6))?,
//!         Record::try_new("chr1", "r0", pair | Flags::SECOND_OF_PAIR, 6, 7, Some(3))?,
//!     ],
//! );
//!
//! let source = Source::builder()
//!     .id("S1")
//!     .individual(Individual::new("P01", "healthy"))
//!     .input("S1.bam")
//!     .try_build()?;
//!
//! let cache = tempfile::tempdir()?;
//! let alignment = Alignment::open(
//!     source,
//!     Arc::new(genome),
//!     Store::new(cache.path()),
//!     &Config::default(),
//!     &input,
//! )?;
//!
//! assert_eq!(alignment.fragments("chr1")?.as_slice(), &[Interval::try_new(3, 7)?]);
//! assert_eq!(alignment.coverage("chr1", false)?, vec![0, 0, 1, 1, 1, 1, 1, 0, 0, 0]);
//! assert_eq!(alignment.normalized_coverage("chr1", false)?[2], 2.0);
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod alignment;
pub mod batch;
pub mod cache;
pub mod config;
pub mod coverage;
pub mod dataset;
pub mod fragments;
pub mod genome;
pub mod individual;
pub mod interval;
pub mod normalize;
pub mod reconstruct;
pub mod record;

#[cfg(test)]
mod log_capture;

pub use alignment::Alignment;
pub use config::Config;
pub use genome::Genome;
pub use individual::Individual;
pub use interval::Interval;
pub use record::Record;
