// src/crawl/mod.rs
// =============================================================================
// This module walks a wiki's Special:AllPages index.
//
// Features:
// - Follows "next page" links one page at a time
// - Writes one batch file per listing page
// - Packs all batches into a zip when done
//
// Submodules:
// - runner: the crawl loop itself
// - state: what the loop carries between pages, and the final summary
// =============================================================================

mod runner;
mod state;

// Re-export what main.rs needs
pub use runner::{CrawlConfig, Crawler};
pub use state::CrawlSummary;
