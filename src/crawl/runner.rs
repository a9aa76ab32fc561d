// src/crawl/runner.rs
// =============================================================================
// The crawl loop: walk Special:AllPages from the first listing page to the
// last, one page at a time.
//
// How it works:
// 1. Fetch the start page (if this fails, the whole run fails)
// 2. Extract its links, write them as batch 1, remember the "next page" link
// 3. While there is a next page: wait a moment, fetch it, extract, write the
//    next batch
// 4. Pack all batches into <lang>.zip
//
// After the first page we're lenient: a page that can't be fetched or
// doesn't look like a listing simply ends the crawl, and everything written
// up to that point is still archived.
//
// Requests are strictly sequential. One page is fully written before the
// next request goes out.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use super::state::{CrawlState, CrawlSummary, StopReason};
use crate::archive::archive_batches;
use crate::batch::write_batch;
use crate::error::CrawlError;
use crate::extract::{extract_listing, ListingPage};
use crate::fetch::{parse_page_url, PageSource};

/// Everything a single crawl run needs to know
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Language code, used for file names
    pub lang: String,
    /// First listing page
    pub start_url: Url,
    /// Where batch files and the archive are written
    pub output_dir: PathBuf,
    /// Pause between two consecutive page requests
    pub delay: Duration,
    /// Stop after this many pages (None = until the last page)
    pub max_pages: Option<usize>,
    /// Pack batches into <lang>.zip at the end
    pub archive: bool,
}

pub struct Crawler<S> {
    source: S,
    config: CrawlConfig,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(source: S, config: CrawlConfig) -> Self {
        Self { source, config }
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    // Runs the crawl to completion
    //
    // Returns: a summary of what was written, or an error if the first page
    // couldn't be used or a file couldn't be written
    pub async fn run(&self) -> Result<CrawlSummary, CrawlError> {
        let config = &self.config;
        std::fs::create_dir_all(&config.output_dir)
            .map_err(|e| CrawlError::io(&config.output_dir, e))?;

        info!(lang = %config.lang, url = %config.start_url, "starting crawl");

        // Start: the first page has to work
        let start = config.start_url.clone();
        let mut state = CrawlState::new(&start);
        state.visit(&start);

        let html = self
            .source
            .fetch(&start)
            .await
            .map_err(CrawlError::FirstFetch)?;
        state.enter_page(&start);

        let page = extract_listing(&html, &state.host).map_err(CrawlError::FirstExtract)?;
        self.store_page(&mut state, page)?;

        // HasPage: follow "next page" links until something says stop
        let stop_reason = loop {
            let url = match self.next_url(&mut state) {
                Ok(url) => url,
                Err(reason) => break reason,
            };

            tokio::time::sleep(config.delay).await;

            let html = match self.source.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(%url, error = %e, "could not fetch listing page, ending crawl");
                    break StopReason::FetchFailed;
                }
            };
            state.enter_page(&url);

            let page = match extract_listing(&html, &state.host) {
                Ok(page) => page,
                Err(e) => {
                    warn!(%url, error = %e, "could not read listing page, ending crawl");
                    break StopReason::ExtractFailed;
                }
            };
            self.store_page(&mut state, page)?;
        };

        info!(
            batches = state.batches.len(),
            links = state.links_extracted,
            reason = ?stop_reason,
            "all links saved"
        );

        // Done: pack everything up
        let (archive, batch_files) = if config.archive {
            info!(batches = state.batches.len(), "zipping up all the links");
            let path = archive_batches(&config.output_dir, &config.lang, &state.batches)?;
            (Some(path), Vec::new())
        } else {
            let files = state.batches.iter().map(|b| b.path.clone()).collect();
            (None, files)
        };

        Ok(CrawlSummary {
            language: config.lang.clone(),
            batches: state.batches.len(),
            links_extracted: state.links_extracted,
            links_written: state.links_written,
            pages_fetched: state.pages_fetched,
            archive,
            batch_files,
            stop_reason,
        })
    }

    // Writes one page's links as the next batch and remembers its next link
    fn store_page(&self, state: &mut CrawlState, page: ListingPage) -> Result<(), CrawlError> {
        let index = state.next_batch_index();
        info!(batch = index, "starting batch");

        let batch = write_batch(&self.config.output_dir, &self.config.lang, index, &page.links)?;
        info!(
            batch = index,
            links = batch.extracted,
            written = batch.written,
            total = state.links_extracted + batch.extracted,
            "accumulated links"
        );

        state.record_batch(batch);
        state.next = page.next;
        Ok(())
    }

    // Decides whether (and where) to go next
    fn next_url(&self, state: &mut CrawlState) -> Result<Url, StopReason> {
        let Some(next) = state.next.take() else {
            return Err(StopReason::LastPage);
        };

        if let Some(max) = self.config.max_pages {
            if state.batches.len() >= max {
                info!(max_pages = max, "page limit reached");
                return Err(StopReason::PageLimit);
            }
        }

        let url = parse_page_url(&next).map_err(|e| {
            warn!(next = %next, error = %e, "unusable next page link, ending crawl");
            StopReason::BadNextLink
        })?;

        if !state.visit(&url) {
            warn!(%url, "next page link points to a page already crawled, ending crawl");
            return Err(StopReason::Revisited);
        }

        Ok(url)
    }
}
