// src/error.rs
// =============================================================================
// Error types for every stage of a crawl.
//
// Each component gets its own enum so callers can tell a network problem
// apart from a page that doesn't look like an AllPages listing:
// - FetchError: the HTTP side (timeouts, bad status codes, bad URLs)
// - ExtractError: the HTML side (missing chunk lists)
// - LanguageError: the language table (unknown code, unreadable file)
// - CrawlError: everything the crawl loop can give back to main.rs
// - DownloadError: reading link batches and saving article text
//
// We use `thiserror` to derive Display/Error; main.rs wraps these in
// anyhow::Result like the rest of the binary.
// =============================================================================

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed at all
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Only http:// and https:// pages can be fetched
    #[error("unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    /// The server answered, but not with a 2xx
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Connection failures, timeouts, body decoding errors
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Whether retrying the same request has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Request { source, .. } => source.is_timeout() || source.is_connect(),
            FetchError::InvalidUrl { .. } | FetchError::UnsupportedScheme { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    /// No `ul.mw-allpages-chunk` list anywhere on the page
    #[error("page has no AllPages chunk list (ul.mw-allpages-chunk)")]
    MissingChunks,
}

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("unknown language '{code}' (known: {known})")]
    Unknown { code: String, known: String },

    #[error("could not read language table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed language table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("language '{code}' has an invalid start URL '{url}'")]
    BadStartUrl { code: String, url: String },
}

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The --lang value isn't in the language table
    #[error(transparent)]
    InvalidSelector(LanguageError),

    /// The very first listing page could not be fetched
    #[error("could not fetch the first listing page: {0}")]
    FirstFetch(#[source] FetchError),

    /// The very first listing page isn't an AllPages listing
    #[error("could not read the first listing page: {0}")]
    FirstExtract(#[source] ExtractError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl CrawlError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CrawlError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The link isn't of the form https://<host>/wiki/<title>
    #[error("not an article link: {0}")]
    NotAnArticle(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The API answered with something that isn't a query result
    #[error("unexpected API response from {url}: {source}")]
    Api {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The page is missing or has no revision with main-slot content
    #[error("no content for article '{0}'")]
    MissingContent(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl DownloadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this stops the whole run rather than just one article
    pub fn is_fatal(&self) -> bool {
        matches!(self, DownloadError::Io { .. } | DownloadError::Archive { .. })
    }
}
