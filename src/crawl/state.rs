// src/crawl/state.rs
// =============================================================================
// The state a crawl carries from one listing page to the next.
//
// Everything the loop needs to remember lives here and is passed around
// explicitly: where we are (host), where we go next, what we've written
// so far and which pages we've already seen.
// =============================================================================

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use url::Url;

use crate::batch::WrittenBatch;

#[derive(Debug)]
pub struct CrawlState {
    /// Host of the page being processed, used to resolve relative links
    pub host: String,
    /// Absolute URL of the next listing page, None once we're done
    pub next: Option<String>,
    /// Batches written so far, in index order
    pub batches: Vec<WrittenBatch>,
    /// Links found on all pages (before the batch output rules)
    pub links_extracted: usize,
    /// Links that made it into batch files
    pub links_written: usize,
    pub pages_fetched: usize,
    // Listing pages already requested, so a navigation loop can't trap us
    visited: HashSet<String>,
}

impl CrawlState {
    pub fn new(start_url: &Url) -> Self {
        Self {
            host: host_of(start_url),
            next: None,
            batches: Vec::new(),
            links_extracted: 0,
            links_written: 0,
            pages_fetched: 0,
            visited: HashSet::new(),
        }
    }

    /// Index the next batch will get (batches are numbered from 1)
    pub fn next_batch_index(&self) -> usize {
        self.batches.len() + 1
    }

    /// Marks a page as requested; false if it was requested before
    pub fn visit(&mut self, url: &Url) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Moves to a freshly fetched page
    pub fn enter_page(&mut self, url: &Url) {
        self.pages_fetched += 1;
        self.host = host_of(url);
    }

    pub fn record_batch(&mut self, batch: WrittenBatch) {
        self.links_extracted += batch.extracted;
        self.links_written += batch.written;
        self.batches.push(batch);
    }
}

// http(s) URLs always have a host; parse_page_url rejects everything else
fn host_of(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_string()
}

/// Why the crawl stopped following "next page" links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The last page had no "next page" link
    LastPage,
    /// A later page could not be downloaded
    FetchFailed,
    /// A later page didn't look like a listing page
    ExtractFailed,
    /// The "next page" link wasn't a usable URL
    BadNextLink,
    /// The "next page" link pointed back to a page we already crawled
    Revisited,
    /// --max-pages was reached
    PageLimit,
}

/// What a finished crawl reports
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub language: String,
    pub batches: usize,
    /// Total links found; this is the number shown as "links saved"
    pub links_extracted: usize,
    pub links_written: usize,
    pub pages_fetched: usize,
    /// Where the zip went (None with --no-archive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
    /// Batch files left on disk (only with --no-archive)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub batch_files: Vec<PathBuf>,
    pub stop_reason: StopReason,
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is `visited` private?
//    - Callers should only go through visit(), which records and checks in
//      one step
//
// 2. What does #[serde(rename_all = "snake_case")] do?
//    - StopReason::LastPage is written as "last_page" in JSON
//
// 3. Why skip_serializing_if?
//    - Fields that don't apply to this run (no archive, no leftover files)
//      are left out of the JSON instead of showing up as null / []
// -----------------------------------------------------------------------------
