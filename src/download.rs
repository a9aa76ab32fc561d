// src/download.rs
// =============================================================================
// Downloads the wikitext of every article a crawl collected.
//
// Input is whatever the crawl left behind:
// - a single <lang>_<n>.links file
// - a directory of them (e.g. after `crawl --no-archive`)
// - the <lang>.zip archive
//
// For each link https://<host>/wiki/<title> we ask the wiki's action API for
// the latest revision's main slot:
//
//   https://<host>/w/api.php?action=query&format=json&prop=revisions
//       &titles=<title>&formatversion=2&rvprop=content&rvslots=*
//
// and write the content to <output_dir>/<title>.wiki.
//
// A single article that can't be fetched or parsed is logged and skipped;
// only local I/O problems end the run.
// =============================================================================

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::DownloadError;
use crate::fetch::{parse_page_url, PageSource};

/// Settings for one download run
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub output_dir: PathBuf,
    /// Pause between two API requests
    pub delay: Duration,
    /// Stop after this many links
    pub limit: Option<usize>,
}

/// What a finished download run reports
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadSummary {
    /// Links read from the input
    pub links: usize,
    pub saved: usize,
    pub failed: usize,
    pub output_dir: PathBuf,
}

/// An article link split into the parts the API needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef {
    pub host: String,
    /// Title as it appears in the link (still percent-encoded)
    pub title: String,
}

impl ArticleRef {
    pub fn parse(link: &str) -> Result<Self, DownloadError> {
        let not_an_article = || DownloadError::NotAnArticle(link.to_string());

        let url = parse_page_url(link).map_err(|_| not_an_article())?;
        let host = url.host_str().ok_or_else(not_an_article)?.to_string();
        let title = url
            .path()
            .strip_prefix("/wiki/")
            .filter(|title| !title.is_empty())
            .ok_or_else(not_an_article)?
            .to_string();

        Ok(Self { host, title })
    }

    /// The action API request returning this article's latest wikitext
    pub fn api_url(&self) -> Result<Url, DownloadError> {
        let raw = format!(
            "https://{}/w/api.php?action=query&format=json&prop=revisions&titles={}\
             &formatversion=2&rvprop=content&rvslots=*",
            self.host, self.title
        );
        Ok(parse_page_url(&raw)?)
    }

    /// File name for the saved wikitext: the decoded title, made path-safe
    pub fn file_name(&self) -> String {
        let decoded = urlencoding::decode(&self.title)
            .map(|title| title.into_owned())
            .unwrap_or_else(|_| self.title.clone());
        let safe = decoded.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        format!("{}.wiki", safe)
    }
}

// Just the parts of a formatversion=2 query response we read
#[derive(Debug, Deserialize)]
struct ApiResponse {
    query: Option<ApiQuery>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    revisions: Vec<ApiRevision>,
}

#[derive(Debug, Deserialize)]
struct ApiRevision {
    slots: ApiSlots,
}

#[derive(Debug, Deserialize)]
struct ApiSlots {
    main: ApiSlot,
}

#[derive(Debug, Deserialize)]
struct ApiSlot {
    content: Option<String>,
}

/// Pulls the main-slot content of the first page out of an API response
pub fn parse_content(body: &str, api_url: &Url, title: &str) -> Result<String, DownloadError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|source| DownloadError::Api {
            url: api_url.to_string(),
            source,
        })?;

    response
        .query
        .and_then(|query| query.pages.into_iter().next())
        .and_then(|page| page.revisions.into_iter().next())
        .and_then(|revision| revision.slots.main.content)
        .ok_or_else(|| DownloadError::MissingContent(title.to_string()))
}

/// Reads article links from a .links file, a directory of them or a zip
///
/// Batches are read in batch-index order; blank lines are skipped.
pub fn read_links(input: &Path) -> Result<Vec<String>, DownloadError> {
    let mut batches = if input.is_dir() {
        read_dir_batches(input)?
    } else if input.extension().is_some_and(|ext| ext == "zip") {
        read_zip_batches(input)?
    } else {
        let contents = std::fs::read_to_string(input).map_err(|e| DownloadError::io(input, e))?;
        vec![(input.to_string_lossy().into_owned(), contents)]
    };

    batches.sort_by_key(|(name, _)| batch_sort_key(name));

    Ok(batches
        .iter()
        .flat_map(|(_, contents)| contents.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn read_dir_batches(dir: &Path) -> Result<Vec<(String, String)>, DownloadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DownloadError::io(dir, e))?;

    let mut batches = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DownloadError::io(dir, e))?.path();
        if path.extension().is_some_and(|ext| ext == "links") {
            let contents =
                std::fs::read_to_string(&path).map_err(|e| DownloadError::io(&path, e))?;
            batches.push((path.to_string_lossy().into_owned(), contents));
        }
    }
    Ok(batches)
}

fn read_zip_batches(path: &Path) -> Result<Vec<(String, String)>, DownloadError> {
    let zip_error = |source| DownloadError::Archive {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| DownloadError::io(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(zip_error)?;

    let names: Vec<String> = archive
        .file_names()
        .filter(|name| name.ends_with(".links"))
        .map(str::to_string)
        .collect();

    let mut batches = Vec::new();
    for name in names {
        let mut contents = String::new();
        archive
            .by_name(&name)
            .map_err(zip_error)?
            .read_to_string(&mut contents)
            .map_err(|e| DownloadError::io(path, e))?;
        batches.push((name, contents));
    }
    Ok(batches)
}

// "dir/hi_10.links" sorts after "dir/hi_2.links"
fn batch_sort_key(name: &str) -> (String, usize) {
    let stem = name.strip_suffix(".links").unwrap_or(name);
    match stem.rsplit_once('_') {
        Some((prefix, index)) => (
            prefix.to_string(),
            index.parse().unwrap_or(usize::MAX),
        ),
        None => (stem.to_string(), usize::MAX),
    }
}

/// Fetches and saves articles one at a time
pub struct Downloader<S> {
    source: S,
    config: DownloadConfig,
}

impl<S: PageSource> Downloader<S> {
    pub fn new(source: S, config: DownloadConfig) -> Self {
        Self { source, config }
    }

    pub async fn run(&self, links: &[String]) -> Result<DownloadSummary, DownloadError> {
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir).map_err(|e| DownloadError::io(dir, e))?;

        let limit = self.config.limit.unwrap_or(usize::MAX);
        let mut summary = DownloadSummary {
            output_dir: dir.clone(),
            ..DownloadSummary::default()
        };

        for (i, link) in links.iter().take(limit).enumerate() {
            if i > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
            summary.links += 1;

            match self.download_one(link).await {
                Ok(path) => {
                    summary.saved += 1;
                    debug!(%link, path = %path.display(), "saved article");
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    summary.failed += 1;
                    warn!(%link, error = %e, "skipping article");
                }
            }

            if summary.links % 100 == 0 {
                info!(done = summary.links, saved = summary.saved, "download progress");
            }
        }

        info!(
            saved = summary.saved,
            failed = summary.failed,
            "download finished"
        );
        Ok(summary)
    }

    async fn download_one(&self, link: &str) -> Result<PathBuf, DownloadError> {
        let article = ArticleRef::parse(link)?;
        let api_url = article.api_url()?;

        let body = self.source.fetch(&api_url).await?;
        let content = parse_content(&body, &api_url, &article.title)?;

        let path = self.config.output_dir.join(article.file_name());
        std::fs::write(&path, content).map_err(|e| DownloadError::io(&path, e))?;
        Ok(path)
    }
}
