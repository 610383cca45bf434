use clap::{Parser as ClapParser, Subcommand};
use scour::search::DEFAULT_TOP_K;
use std::path::PathBuf;

#[derive(ClapParser, Debug)]
#[command(author, version, about = "Fully local full-text search engine for crawled HTML corpora", long_about = None)]
pub struct Args {
    /// Path to a JSON config file (defaults to scour.json in the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the inverted index from a corpus of crawled HTML documents
    Index {
        /// Directory containing the crawled corpus (overrides CORPUS_PATH)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Directory where index artifacts are written (overrides INDEX_STORAGE)
        #[arg(long)]
        storage: Option<PathBuf>,

        /// In-memory index size that triggers a spill to disk, in megabytes
        #[arg(long = "spill-threshold-mb")]
        spill_threshold_mb: Option<usize>,
    },

    /// Query a previously built index
    Search {
        /// Free-text query
        #[arg(value_name = "QUERY")]
        query: String,

        /// Number of results to return
        #[arg(short = 'k', long = "top", default_value_t = DEFAULT_TOP_K)]
        top: usize,

        /// Directory containing the index artifacts (overrides INDEX_STORAGE)
        #[arg(long)]
        storage: Option<PathBuf>,
    },
}
