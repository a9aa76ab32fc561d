// src/batch.rs
// =============================================================================
// Writing one listing page's links to a `<lang>_<n>.links` file.
//
// The file layout follows what earlier versions of this tool produced, so
// existing consumers of the archives keep working:
//
//   0 links   -> empty file
//   1 link    -> the link, no trailing newline
//   2 links   -> empty file
//   3+ links  -> every link but the last, one per line
//
// Yes, the last link of a big page and both links of a two-link page are
// left out. See "Open questions" in DESIGN.md before changing this.
// =============================================================================

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::CrawlError;

/// A batch file that has been written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenBatch {
    /// 1-based, contiguous across a crawl
    pub index: usize,
    pub path: PathBuf,
    /// Links found on the page (before the output rules above)
    pub extracted: usize,
    /// Links that actually ended up in the file
    pub written: usize,
}

/// File name for batch `index` of language `lang`
pub fn batch_file_name(lang: &str, index: usize) -> String {
    format!("{}_{}.links", lang, index)
}

/// Picks the links that go into a batch file
pub fn select_written(links: &[String]) -> &[String] {
    match links.len() {
        1 => links,
        n if n > 2 => &links[..n - 1],
        _ => &[],
    }
}

/// Renders the exact file contents for a page's links
pub fn render_batch(links: &[String]) -> String {
    match links {
        [only] => only.clone(),
        _ => select_written(links)
            .iter()
            .map(|link| format!("{}\n", link))
            .collect(),
    }
}

// Writes batch `index` into `dir`
//
// Creates a fresh file every time; batch files are never appended to.
pub fn write_batch(
    dir: &Path,
    lang: &str,
    index: usize,
    links: &[String],
) -> Result<WrittenBatch, CrawlError> {
    let path = dir.join(batch_file_name(lang, index));
    let contents = render_batch(links);

    let file = File::create(&path).map_err(|e| CrawlError::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| CrawlError::io(&path, e))?;

    Ok(WrittenBatch {
        index,
        path,
        extracted: links.len(),
        written: select_written(links).len(),
    })
}
