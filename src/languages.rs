// src/languages.rs
// =============================================================================
// The language table: which Wikipedia edition starts where.
//
// Every supported edition maps a short code ("hi", "bn", ...) to the URL of
// its first Special:AllPages listing page. The table is plain data in
// languages.json, compiled into the binary with include_str!, so adding a
// language means adding one JSON entry.
//
// A different table with the same shape can be loaded from disk with
// --languages-file.
// =============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::LanguageError;

const BUILTIN_TABLE: &str = include_str!("languages.json");

/// One Wikipedia language edition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language {
    /// Code used on the command line and in output file names
    pub code: String,
    /// Human-readable name, only used for `languages`
    pub name: String,
    /// First AllPages listing page to crawl
    pub start_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageTable {
    pub languages: Vec<Language>,
}

impl LanguageTable {
    /// The table compiled into the binary
    pub fn builtin() -> Result<Self, LanguageError> {
        Self::from_json(BUILTIN_TABLE)
    }

    /// Reads a table from a JSON file on disk
    pub fn from_file(path: &Path) -> Result<Self, LanguageError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LanguageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parses a table and checks every start URL is an absolute http(s) URL
    pub fn from_json(json: &str) -> Result<Self, LanguageError> {
        let table: LanguageTable = serde_json::from_str(json)?;

        for language in &table.languages {
            let valid = Url::parse(&language.start_url)
                .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
                .unwrap_or(false);
            if !valid {
                return Err(LanguageError::BadStartUrl {
                    code: language.code.clone(),
                    url: language.start_url.clone(),
                });
            }
        }

        Ok(table)
    }

    /// Looks a language up by its code
    pub fn get(&self, code: &str) -> Result<&Language, LanguageError> {
        self.languages
            .iter()
            .find(|language| language.code == code)
            .ok_or_else(|| LanguageError::Unknown {
                code: code.to_string(),
                known: self.codes().join(", "),
            })
    }

    pub fn codes(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.code.as_str()).collect()
    }
}
