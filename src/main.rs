// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, filtered with RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = unknown language, 2 = error)
// =============================================================================

mod archive;
mod batch;
mod cli;
mod crawl;
mod download;
mod error;
mod extract;
mod fetch;
mod languages;

#[cfg(test)]
mod testing;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CrawlArgs, DownloadArgs};
use crawl::{CrawlConfig, CrawlSummary, Crawler};
use download::{read_links, DownloadConfig, DownloadSummary, Downloader};
use error::CrawlError;
use fetch::{parse_page_url, HttpFetcher};
use languages::LanguageTable;

const EXIT_OK: i32 = 0;
const EXIT_UNKNOWN_LANGUAGE: i32 = 1;
const EXIT_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    };

    std::process::exit(exit_code);
}

// An unknown language gets its own exit code; everything else is 2
fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<CrawlError>() {
        Some(CrawlError::InvalidSelector(_)) => EXIT_UNKNOWN_LANGUAGE,
        _ => EXIT_ERROR,
    }
}

// Logs go to stderr so `--json` output on stdout stays machine-readable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
        Commands::Download(args) => handle_download(args).await,
        Commands::Languages {
            json,
            languages_file,
        } => handle_languages(languages_file.as_deref(), json),
    }
}

fn load_table(path: Option<&Path>) -> Result<LanguageTable> {
    let table = match path {
        Some(path) => LanguageTable::from_file(path)?,
        None => LanguageTable::builtin()?,
    };
    Ok(table)
}

// Handles the 'crawl' subcommand
async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let table = load_table(args.languages_file.as_deref())?;

    // Unknown codes stop here, before anything touches the disk or network
    let language = table
        .get(&args.lang)
        .map_err(CrawlError::InvalidSelector)?;
    let start_url = parse_page_url(&language.start_url)
        .with_context(|| format!("start URL of '{}'", language.code))?;

    let fetcher = HttpFetcher::new(args.network.fetch_config())
        .context("could not build the HTTP client")?;

    let crawl_config = CrawlConfig {
        lang: language.code.clone(),
        start_url,
        output_dir: args.output_dir.clone(),
        delay: args.network.delay(),
        max_pages: args.max_pages,
        archive: !args.no_archive,
    };

    if !args.json {
        println!("💭 Links will be saved to {}", args.output_dir.display());
        println!("⚡ Scraping {} ({}) links...", language.name, language.code);
    }

    let summary = Crawler::new(fetcher, crawl_config).run().await?;

    print_summary(&summary, args.json)?;
    Ok(EXIT_OK)
}

// Handles the 'download' subcommand
async fn handle_download(args: DownloadArgs) -> Result<i32> {
    let links = read_links(&args.input)?;
    let fetcher = HttpFetcher::new(args.network.fetch_config())
        .context("could not build the HTTP client")?;

    let config = DownloadConfig {
        output_dir: args.output_dir.clone(),
        delay: args.network.delay(),
        limit: args.limit,
    };

    if !args.json {
        println!(
            "📥 Downloading {} article(s) from {}",
            args.limit.map_or(links.len(), |limit| limit.min(links.len())),
            args.input.display()
        );
    }

    let summary = Downloader::new(fetcher, config).run(&links).await?;

    print_download_summary(&summary, args.json)?;
    Ok(EXIT_OK)
}

// Handles the 'languages' subcommand
fn handle_languages(path: Option<&Path>, json: bool) -> Result<i32> {
    let table = load_table(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table.languages)?);
    } else {
        println!("{:<6} {:<12} {}", "CODE", "NAME", "START URL");
        println!("{}", "=".repeat(80));
        for language in &table.languages {
            println!(
                "{:<6} {:<12} {}",
                language.code, language.name, language.start_url
            );
        }
    }

    Ok(EXIT_OK)
}

// Prints the crawl summary either as a few lines of text or as JSON
fn print_summary(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("✅ All links saved.");
    if let Some(archive) = &summary.archive {
        println!("🗃️  Archive: {}", archive.display());
    } else {
        println!("🗃️  Kept {} batch file(s) unzipped", summary.batch_files.len());
    }
    println!("📊 Total batches done: {}", summary.batches);
    println!("🔗 Total links saved: {}", summary.links_extracted);
    println!("   ✍️  Lines written: {}", summary.links_written);
    println!("   📄 Pages fetched: {}", summary.pages_fetched);

    Ok(())
}

fn print_download_summary(summary: &DownloadSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("✅ Articles saved to {}", summary.output_dir.display());
    println!("📄 Saved: {}", summary.saved);
    println!("⚠️  Skipped: {}", summary.failed);

    Ok(())
}
