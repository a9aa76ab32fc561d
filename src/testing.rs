// src/testing.rs
// Shared test helpers: a listing page builder and an in-memory page source.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;
use crate::fetch::PageSource;

/// Builds Special:AllPages markup shaped like the real thing
#[derive(Default)]
pub struct ListingFixture {
    chunks: Vec<Vec<(String, bool)>>,
    next: Option<String>,
}

impl ListingFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chunk of normal article entries
    pub fn chunk(mut self, titles: &[&str]) -> Self {
        self.chunks
            .push(titles.iter().map(|t| (t.to_string(), false)).collect());
        self
    }

    /// Adds redirect entries to the last chunk
    pub fn redirects(mut self, titles: &[&str]) -> Self {
        if self.chunks.is_empty() {
            self.chunks.push(Vec::new());
        }
        if let Some(chunk) = self.chunks.last_mut() {
            chunk.extend(titles.iter().map(|t| (t.to_string(), true)));
        }
        self
    }

    /// Sets the "next page" href of both navigation controls
    pub fn next(mut self, href: &str) -> Self {
        self.next = Some(href.to_string());
        self
    }

    pub fn render(&self) -> String {
        let mut nav = String::from(
            r#"<div class="mw-allpages-nav"><a href="/w/index.php?title=Special:AllPages&amp;until=Prev" title="Special:AllPages">Previous page</a>"#,
        );
        if let Some(next) = &self.next {
            nav.push_str(&format!(
                r#" | <a href="{}" title="Special:AllPages">Next page</a>"#,
                next.replace('&', "&amp;")
            ));
        }
        nav.push_str("</div>");

        let mut body = String::from(r#"<div class="mw-allpages-body">"#);
        for chunk in &self.chunks {
            body.push_str(r#"<ul class="mw-allpages-chunk">"#);
            for (title, redirect) in chunk {
                let class = if *redirect {
                    r#" class="allpagesredirect""#
                } else {
                    ""
                };
                body.push_str(&format!(
                    r#"<li{class}><a href="/wiki/{title}" title="{title}">{title}</a></li>"#
                ));
            }
            body.push_str("</ul>");
        }
        body.push_str("</div>");

        format!(
            "<!DOCTYPE html><html><head><title>All pages</title></head><body>\
             <form class=\"mw-allpages-form\"></form>{nav}{body}{nav}</body></html>"
        )
    }
}

/// Serves pages from a map and remembers every URL it was asked for
#[derive(Default)]
pub struct MemorySource {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MemorySource {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }
}
