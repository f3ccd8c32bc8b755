use anyhow::Result;
use clap::Parser;
use crawldex::config::{AppConfig, Outputs, RunArgs, RunConfig};
use crawldex::crawl::{Crawler, HttpFetcher};
use crawldex::index::{ConcurrentIndex, InvertedIndex, ThreadedBuilder, build_index};
use crawldex::output::{nonzero_counts, print_results, write_json_file};
use crawldex::query::{QueryBatch, QueryBatchRunner, QueryResults};
use crawldex::runner::TaskRunner;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crawldex")]
#[command(about = "Build a word index from text files or a web crawl and run ranked queries")]
struct Cli {
    /// Text file or directory of text files to index
    #[arg(long)]
    path: Option<PathBuf>,

    /// Seed URL to crawl from (implies --threads)
    #[arg(long)]
    url: Option<String>,

    /// Maximum number of distinct URLs to crawl
    #[arg(long, default_value_t = 1)]
    max: usize,

    /// Use worker threads; without a value uses the configured default
    #[arg(long, num_args = 0..=1)]
    threads: Option<Option<usize>>,

    /// Write the index as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "index.json")]
    index: Option<PathBuf>,

    /// Write per-location word counts as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "counts.json")]
    counts: Option<PathBuf>,

    /// Query file, one query per line
    #[arg(long)]
    queries: Option<PathBuf>,

    /// Match query words exactly instead of by prefix
    #[arg(long)]
    exact: bool,

    /// Write query results as JSON (printed to the terminal otherwise)
    #[arg(long, num_args = 0..=1, default_missing_value = "results.json")]
    results: Option<PathBuf>,

    /// Hide progress bars
    #[arg(short, long)]
    quiet: bool,

    /// Disable coloured terminal output
    #[arg(long)]
    no_color: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_args(&self) -> RunArgs {
        RunArgs {
            input: self.path.clone(),
            seed: self.url.clone(),
            max_urls: self.max,
            threads: self.threads,
            queries: self.queries.clone(),
            exact: self.exact,
            outputs: Outputs {
                index: self.index.clone(),
                counts: self.counts.clone(),
                results: self.results.clone(),
            },
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "crawldex=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let app = AppConfig::load()?;
    let config = RunConfig::resolve(cli.run_args(), app)?;

    if config.is_threaded() {
        run_threaded(&config, cli.quiet, !cli.no_color)
    } else {
        run_sequential(&config, cli.quiet, !cli.no_color)
    }
}

/// Single-threaded pipeline: plain index, queries answered in order
fn run_sequential(config: &RunConfig, quiet: bool, color: bool) -> Result<()> {
    let mut index = InvertedIndex::new();

    if let Some(input) = &config.input {
        let summary = build_index(input, &mut index, quiet)?;
        tracing::info!(files = summary.files, failed = summary.failed, "index built");
    }

    write_index_outputs(config, &index, index.word_count())?;

    let results = match &config.queries {
        Some(queries) => {
            let mut batch = QueryBatch::new(&index, config.mode);
            batch.search_file(queries)?;
            Some(batch.into_results())
        }
        None => None,
    };

    emit_results(config, results.as_ref(), color)
}

/// Worker-pool pipeline: crawl and/or build into a shared index, then query it
fn run_threaded(config: &RunConfig, quiet: bool, color: bool) -> Result<()> {
    let workers = config.threads.unwrap_or(config.app.default_threads);
    let runner = TaskRunner::new(workers)?;
    let index = Arc::new(ConcurrentIndex::new());

    if let Some(seed) = &config.seed {
        let fetcher = Arc::new(HttpFetcher::from_config(&config.app)?);
        Crawler::new(Arc::clone(&index), runner.clone(), fetcher, config.max_urls)
            .silent(quiet)
            .crawl(seed.clone());
    }

    if let Some(input) = &config.input {
        let summary = ThreadedBuilder::new(Arc::clone(&index), runner.clone())
            .silent(quiet)
            .build(input)?;
        tracing::info!(files = summary.files, failed = summary.failed, "index built");
    }

    write_index_outputs(config, &*index, &index.word_count())?;

    let results = match &config.queries {
        Some(queries) => {
            let batch = QueryBatchRunner::new(Arc::clone(&index), runner.clone(), config.mode);
            batch.search_file(queries)?;
            Some(batch.results())
        }
        None => None,
    };

    runner.shutdown();
    emit_results(config, results.as_ref(), color)
}

fn write_index_outputs<I: serde::Serialize + ?Sized>(
    config: &RunConfig,
    index: &I,
    counts: &BTreeMap<String, usize>,
) -> Result<()> {
    if let Some(path) = &config.outputs.index {
        write_json_file(path, index)?;
    }
    if let Some(path) = &config.outputs.counts {
        write_json_file(path, &nonzero_counts(counts))?;
    }
    Ok(())
}

/// Write results when an output path was given, even if no queries ran;
/// otherwise print whatever was answered
fn emit_results(config: &RunConfig, results: Option<&QueryResults>, color: bool) -> Result<()> {
    match (&config.outputs.results, results) {
        (Some(path), Some(results)) => write_json_file(path, results),
        (Some(path), None) => write_json_file(path, &QueryResults::new()),
        (None, Some(results)) => Ok(print_results(results, color)?),
        (None, None) => Ok(()),
    }
}
