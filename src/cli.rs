//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use classyfire::batch::parse_separator;
use classyfire::classify::{DEFAULT_BASE_URL, DEFAULT_CACHE_DIR};
use classyfire::{ClientConfig, EmptyClassificationPolicy};

/// Classify chemical compounds with the ClassyFire service.
///
/// Accepts an InChIKey, a SMILES string, or a CSV/TSV/SSV file whose cells
/// hold InChIKeys or SMILES, and prints the classification as JSON.
#[derive(Parser, Debug)]
#[command(name = "classyfire")]
#[command(author, version, about)]
pub struct Args {
    /// InChIKey, SMILES, or path to a CSV (or TSV/SSV) file
    #[arg(value_name = "INCHIKEY_OR_SMILES_OR_PATH")]
    pub input: String,

    /// Timeout for each HTTP request, in seconds (1-600)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout: u64,

    /// Minimum time between requests, in seconds (0 to disable)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub sleep: u64,

    /// Write JSON to this file instead of stdout (gzip-compressed for .gz; .bz2/.xz are refused)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Column separator for table files (.tsv and .ssv imply tab and space)
    #[arg(long, default_value = ",", value_parser = parse_separator)]
    pub separator: u8,

    /// The table file has no header row
    #[arg(long)]
    pub no_header: bool,

    /// Increase output verbosity (-v for debug and progress bars, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print a one-line taxonomy summary instead of full JSON
    #[arg(long)]
    pub short: bool,

    /// What to do when the service returns an empty classification
    #[arg(long, value_enum, default_value_t = EmptyClassificationPolicy::RetryLast)]
    pub policy: EmptyClassificationPolicy,

    /// Deferred retries per item for empty classifications (1-100)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub attempts: u32,

    /// Wait before each retry round, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub retry_delay: u64,

    /// Directory for cached classifications
    #[arg(long, default_value = DEFAULT_CACHE_DIR, value_name = "DIR")]
    pub cache_dir: PathBuf,

    /// Do not read or write the classification cache
    #[arg(long)]
    pub no_cache: bool,

    /// ClassyFire service root
    #[arg(long, default_value = DEFAULT_BASE_URL, hide = true)]
    pub base_url: String,

    /// PubChem service root used for SMILES conversion
    #[arg(long, hide = true)]
    pub converter_url: Option<String>,
}

impl Args {
    /// Client settings implied by the arguments.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::default()
            .with_base_url(self.base_url.as_str())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_sleep(Duration::from_secs(self.sleep))
            .with_max_attempts(self.attempts)
            .with_retry_delay(Duration::from_secs(self.retry_delay))
            .with_policy(self.policy)
            .with_verbose(self.verbose > 0 && !self.quiet);

        if self.no_cache {
            config.without_cache()
        } else {
            config.with_cache_dir(self.cache_dir.clone())
        }
    }
}
