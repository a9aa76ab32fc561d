// src/archive.rs
// =============================================================================
// Packs the batch files of a finished crawl into `<lang>.zip`.
//
// Each batch becomes one Deflate-compressed entry named after its file
// (hi_1.links, hi_2.links, ...). The batch files are removed only after the
// archive has been finished, so a failed run leaves every batch on disk.
//
// Only the files this run wrote are archived; stray .links files from other
// runs in the same directory are left alone.
// =============================================================================

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::batch::WrittenBatch;
use crate::error::CrawlError;

/// Archive file name for a language
pub fn archive_file_name(lang: &str) -> String {
    format!("{}.zip", lang)
}

pub fn archive_batches(
    dir: &Path,
    lang: &str,
    batches: &[WrittenBatch],
) -> Result<PathBuf, CrawlError> {
    let archive_path = dir.join(archive_file_name(lang));
    let zip_error = |source| CrawlError::Archive {
        path: archive_path.clone(),
        source,
    };

    let file = File::create(&archive_path).map_err(|e| CrawlError::io(&archive_path, e))?;
    let mut zip = ZipWriter::new(file);

    for batch in batches {
        let entry_name = batch
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| crate::batch::batch_file_name(lang, batch.index));

        let contents = std::fs::read(&batch.path).map_err(|e| CrawlError::io(&batch.path, e))?;

        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(entry_name.as_str(), options)
            .map_err(zip_error)?;
        zip.write_all(&contents)
            .map_err(|e| CrawlError::io(&archive_path, e))?;

        debug!(entry = %entry_name, bytes = contents.len(), "archived batch");
    }

    zip.finish().map_err(zip_error)?;

    for batch in batches {
        std::fs::remove_file(&batch.path).map_err(|e| CrawlError::io(&batch.path, e))?;
    }
    Ok(archive_path)
}
