//! ZIP archiver for one run's successfully downloaded images.
//!
//! The archive is written after every download has resolved, strictly in
//! input order, and closed exactly once. An existing archive for the same
//! date is overwritten.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive file name for a run on the given date.
pub fn archive_name(date: NaiveDate) -> String {
    format!("bing_images_{date}.zip")
}

/// Summary of a written archive.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub entry_count: usize,
}

/// Write every saved download into one ZIP, in input order.
///
/// Results may arrive in any order; they are sorted by position here so
/// archive contents never depend on download completion order. Failed and
/// skipped items are absent from the archive.
pub fn write_archive(
    results: &[crate::downloader::DownloadResult],
    output_dir: &Path,
    date: NaiveDate,
) -> Result<ArchiveSummary> {
    let path = output_dir.join(archive_name(date));
    let file = File::create(&path)
        .with_context(|| format!("failed to create archive {}", path.display()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut ordered: Vec<_> = results.iter().filter(|r| r.is_saved()).collect();
    ordered.sort_by_key(|r| r.image_ref.position);

    let mut entry_count = 0usize;
    for result in ordered {
        let Some(file_path) = result.file_path.as_deref() else {
            continue;
        };
        let entry = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .context("saved file has no valid name")?;
        let body = std::fs::read(file_path)
            .with_context(|| format!("failed to read {}", file_path.display()))?;
        writer
            .start_file(entry, options)
            .with_context(|| format!("failed to start archive entry {entry}"))?;
        writer
            .write_all(&body)
            .with_context(|| format!("failed to write archive entry {entry}"))?;
        entry_count += 1;
    }

    writer.finish().context("failed to close archive")?;
    info!(path = %path.display(), entry_count, "archive written");
    Ok(ArchiveSummary { path, entry_count })
}

/// Remove the loose image files once they are archived. Best-effort; a
/// failed removal is logged and skipped.
pub fn remove_loose_files(results: &[crate::downloader::DownloadResult]) {
    for result in results.iter().filter(|r| r.is_saved()) {
        let Some(path) = result.file_path.as_deref() else {
            continue;
        };
        if let Err(err) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %err, "failed to remove loose file");
        }
    }
}
