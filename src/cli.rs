// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Three subcommands:
// - crawl: collect every article link of one language edition into a zip
// - download: fetch the wikitext of every article a crawl collected
// - languages: show which language editions we know how to crawl
//
// The network knobs can also come from environment variables
// (WIKI_ALLPAGES_TIMEOUT_SECS, ...), which is handy in scheduled jobs.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::fetch::{default_user_agent, FetchConfig};

#[derive(Parser, Debug)]
#[command(
    name = "wiki-allpages",
    version,
    about = "Collect every article link of a Wikipedia language edition",
    long_about = "wiki-allpages walks a wiki's Special:AllPages index page by page, \
                  writes the article links of each page to <lang>_<n>.links and packs \
                  all of them into <lang>.zip."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the AllPages index of one language edition
    ///
    /// Example: wiki-allpages crawl --lang hi --output-dir ./links
    Crawl(CrawlArgs),

    /// Download the wikitext of every article in a crawl's output
    ///
    /// Example: wiki-allpages download --input ./links/hi.zip -o ./articles
    Download(DownloadArgs),

    /// List the language editions that can be crawled
    Languages {
        /// Output the table as JSON
        #[arg(long)]
        json: bool,

        /// Use this language table instead of the built-in one
        #[arg(long, value_name = "PATH")]
        languages_file: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
pub struct CrawlArgs {
    /// Language edition to crawl (see the `languages` subcommand)
    #[arg(long)]
    pub lang: String,

    /// Directory for the batch files and the archive
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Stop after this many listing pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Keep the <lang>_<n>.links files instead of zipping them
    #[arg(long)]
    pub no_archive: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Use this language table instead of the built-in one
    #[arg(long, value_name = "PATH")]
    pub languages_file: Option<PathBuf>,

    #[command(flatten)]
    pub network: NetworkArgs,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    /// A <lang>_<n>.links file, a directory of them, or a <lang>.zip
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Directory for the <title>.wiki files
    #[arg(short, long, default_value = "articles")]
    pub output_dir: PathBuf,

    /// Stop after this many articles
    #[arg(long)]
    pub limit: Option<usize>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub network: NetworkArgs,
}

/// Network knobs shared by `crawl` and `download`
#[derive(clap::Args, Debug)]
pub struct NetworkArgs {
    /// Per-request timeout in seconds
    #[arg(long, env = "WIKI_ALLPAGES_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Extra attempts for timeouts, connection errors and 5xx/429 responses
    #[arg(long, env = "WIKI_ALLPAGES_RETRIES", default_value_t = 2)]
    pub retries: u32,

    /// Wait before the first retry in milliseconds (grows with each attempt)
    #[arg(long, env = "WIKI_ALLPAGES_RETRY_BACKOFF_MS", default_value_t = 500)]
    pub retry_backoff_ms: u64,

    /// Pause between two requests in milliseconds
    #[arg(long, env = "WIKI_ALLPAGES_DELAY_MS", default_value_t = 100)]
    pub delay_ms: u64,

    /// User-Agent header sent with every request
    #[arg(long, env = "WIKI_ALLPAGES_USER_AGENT")]
    pub user_agent: Option<String>,
}

impl NetworkArgs {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            user_agent: self.user_agent.clone().unwrap_or_else(default_user_agent),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
