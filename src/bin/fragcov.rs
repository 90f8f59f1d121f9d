//! Computes and caches the coverage of every alignment in a dataset.
//!
//! ```shell
//! cargo run --release --bin=fragcov --features=binaries -- dataset.toml
//! ```
//!
//! Alignments whose cache entries are all present are not read again. A
//! summary table is printed once every alignment has been processed, and the
//! process exits with a non-zero status if any alignment failed.

use std::io;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use fragcov::Record;
use fragcov::alignment::Input;
use fragcov::alignment::Source;
use fragcov::batch::Batch;
use fragcov::cache::Store;
use fragcov::dataset::Dataset;
use fragcov::record::Flags;
use noodles::bam;
use noodles::sam;
use tabled::builder::Builder;
use tabled::settings::Alignment;
use tabled::settings::Style;
use tabled::settings::object::Rows;
use tracing::warn;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

////////////////////////////////////////////////////////////////////////////////////////
// BAM input
////////////////////////////////////////////////////////////////////////////////////////

/// Reads alignment records from BAM files.
#[derive(Debug)]
struct Bam;

impl Input for Bam {
    type Records = Box<dyn Iterator<Item = io::Result<Record>>>;

    fn open(&self, path: &Path) -> io::Result<Self::Records> {
        let mut reader = bam::io::reader::Builder::default().build_from_path(path)?;
        let header = reader.read_header()?;

        Ok(Box::new(BamRecords {
            reader,
            header,
            record: bam::Record::default(),
        }))
    }
}

/// The records of an open BAM file.
struct BamRecords<R> {
    /// The reader.
    reader: bam::io::Reader<R>,

    /// The header, for reference sequence names.
    header: sam::Header,

    /// A reusable record buffer.
    record: bam::Record,
}

impl<R: io::Read> BamRecords<R> {
    /// Converts the buffered record.
    ///
    /// Records without a reference sequence or an alignment start cannot
    /// contribute coverage and are passed over with [`None`].
    fn convert(&self) -> io::Result<Option<Record>> {
        let record = &self.record;

        let id = match record.reference_sequence_id().transpose()? {
            Some(id) => id,
            None => return Ok(None),
        };

        let start = match record.alignment_start().transpose()? {
            Some(start) => start.get() as u64,
            None => return Ok(None),
        };

        let end = sam::alignment::Record::alignment_end(record)
            .transpose()?
            .map(|end| end.get() as u64)
            .unwrap_or(start);

        let mate_start = record
            .mate_alignment_start()
            .transpose()?
            .map(|position| position.get() as u64);

        let contig = match self.header.reference_sequences().get_index(id) {
            Some((name, _)) => name.to_string(),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("reference sequence {id} is not declared in the header"),
                ))
            }
        };

        let name = record
            .name()
            .map(|name| name.to_string())
            .unwrap_or_default();

        Record::try_new(
            contig,
            name,
            Flags::from(record.flags().bits()),
            start,
            end,
            mate_start,
        )
        .map(Some)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

impl<R: io::Read> Iterator for BamRecords<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err)),
            }

            match self.convert() {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

/// Computes and caches the coverage of every alignment in a dataset.
#[derive(Parser)]
struct Args {
    /// The dataset file.
    dataset: PathBuf,

    /// Only processes the alignments of individuals with this group label.
    #[arg(short, long)]
    label: Option<String>,

    /// Only processes the alignments of this individual.
    #[arg(short, long)]
    individual: Option<String>,

    /// Restricts every coverage array served to fragments, whatever the
    /// dataset configures.
    #[arg(long, default_value_t = false)]
    fragments_only: bool,

    /// The number of alignments processed in parallel (overrides the
    /// dataset).
    #[arg(short, long)]
    threads: Option<NonZeroUsize>,

    #[command(flatten)]
    verbose: Verbosity,
}

/// Formats an optional label for the summary table.
fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Processes the selected alignments and prints a summary.
///
/// Returns whether every alignment succeeded.
fn run(args: &Args) -> Result<bool> {
    let dataset = Dataset::from_path(&args.dataset)
        .with_context(|| format!("reading dataset from {}", args.dataset.display()))?;

    let mut config = *dataset.config();

    if args.fragments_only {
        config = config.with_fragments_only(true);
    }

    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }

    let sources: Vec<Source> = match (args.label.as_deref(), args.individual.as_deref()) {
        (None, None) => dataset.sources().to_vec(),
        (Some(label), None) => dataset.sources_with_label(label).cloned().collect(),
        (None, Some(individual)) => dataset.sources_for_individual(individual).cloned().collect(),
        (Some(label), Some(individual)) => dataset
            .sources_for_individual(individual)
            .filter(|source| source.individual().label() == label)
            .cloned()
            .collect(),
    };

    if sources.is_empty() {
        warn!("no alignments matched the selection");
    }

    let batch = Batch::new(
        Arc::clone(dataset.genome()),
        Store::new(dataset.cache_dir()),
        &config,
        &Bam,
    );
    let results = batch
        .run(sources.clone())
        .context("processing alignments")?;

    let mut builder = Builder::default();
    builder.push_record([
        "Alignment",
        "Individual",
        "Label",
        "Time",
        "Condition",
        "Status",
        "Mean coverage",
    ]);

    let mut succeeded = true;

    for (source, result) in sources.iter().zip(&results) {
        let (status, mean) = match result {
            Ok(alignment) => {
                let status = match alignment.statistics() {
                    Some(_) => "computed",
                    None => "cached",
                };

                match alignment.mean_coverage(true) {
                    Ok(mean) => (String::from(status), format!("{mean:.4}")),
                    Err(err) => {
                        succeeded = false;
                        (format!("failed: {err}"), String::from("-"))
                    }
                }
            }
            Err(err) => {
                succeeded = false;
                (format!("failed: {err}"), String::from("-"))
            }
        };

        builder.push_record([
            source.id(),
            source.individual().id(),
            source.individual().label(),
            or_dash(source.time()),
            or_dash(source.condition()),
            status.as_str(),
            mean.as_str(),
        ]);
    }

    let table = builder
        .build()
        .with(Style::rounded())
        .modify(Rows::new(1..), Alignment::left())
        .to_string();

    println!("{}", table);

    Ok(succeeded)
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    if !run(&args)? {
        std::process::exit(1);
    }

    Ok(())
}
