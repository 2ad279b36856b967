// Copyright 2026 Bingrab Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded concurrent image downloader.
//!
//! All downloads run as cooperative tasks over one shared reqwest client,
//! with at most `K` requests in flight at a time. Completion order is
//! unconstrained; results are re-ordered by input position before the
//! archiver sees them, so archive contents stay reproducible across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::extractor::ImageRef;
use crate::progress::{Progress, ProgressKind};

/// Fallback base name when a page carried no usable alt text.
const ALT_PLACEHOLDER: &str = "image";

/// Outcome of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    /// Body persisted to `file_path`.
    Saved,
    /// Server answered with a non-200 status; nothing persisted.
    HttpFailed(u16),
    /// Network or IO failure; the text is surfaced for diagnosis.
    Failed(String),
    /// The ref had no source URL (null-content page); never hit the network.
    SkippedNoSource,
}

/// Result of one download attempt, consumed once by the archiver.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub image_ref: ImageRef,
    pub file_path: Option<PathBuf>,
    pub status: DownloadStatus,
}

impl DownloadResult {
    /// Whether this item belongs in the archive.
    pub fn is_saved(&self) -> bool {
        matches!(self.status, DownloadStatus::Saved)
    }
}

/// Deterministic file name for an image: sanitized alt text plus the input
/// position. Position keeps names unique when alt text collides or is
/// absent.
pub fn entry_filename(alt_text: Option<&str>, position: usize) -> String {
    let base = alt_text
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ALT_PLACEHOLDER);
    let sanitized: String = base
        .chars()
        .take(100)
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{sanitized}_{position}.jpg")
}

/// Downloads every `ImageRef` with bounded concurrency.
pub struct Downloader {
    client: reqwest::Client,
    concurrency: usize,
    output_dir: PathBuf,
}

impl Downloader {
    /// Build a downloader sharing one HTTP client / connection pool.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("bingrab/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            concurrency: config.concurrency.max(1),
            output_dir: config.output_dir.clone(),
        })
    }

    /// Download all refs with at most `K` requests in flight, then return
    /// the results sorted back into input order.
    ///
    /// Per-item failures never abort the run; the archiver later selects
    /// the saved subset.
    pub async fn download_all(
        &self,
        refs: Vec<ImageRef>,
        progress: &Progress,
    ) -> Vec<DownloadResult> {
        let mut results: Vec<DownloadResult> = stream::iter(refs)
            .map(|image_ref| async move {
                let result = self.download_one(image_ref).await;
                progress.emit(ProgressKind::DownloadFinished {
                    url: result
                        .image_ref
                        .source_url
                        .clone()
                        .unwrap_or_default(),
                    position: result.image_ref.position,
                    saved: result.is_saved(),
                    detail: match &result.status {
                        DownloadStatus::Saved => format!(
                            "saved {}",
                            result
                                .file_path
                                .as_deref()
                                .unwrap_or_else(|| Path::new(""))
                                .display()
                        ),
                        DownloadStatus::HttpFailed(status) => format!("http {status}"),
                        DownloadStatus::Failed(err) => err.clone(),
                        DownloadStatus::SkippedNoSource => "no image on page".to_string(),
                    },
                });
                result
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        // Completion order must never leak into the archive.
        results.sort_by_key(|r| r.image_ref.position);
        results
    }

    async fn download_one(&self, image_ref: ImageRef) -> DownloadResult {
        let Some(src) = image_ref.source_url.clone() else {
            debug!(position = image_ref.position, "no source URL, skipping download");
            return DownloadResult {
                image_ref,
                file_path: None,
                status: DownloadStatus::SkippedNoSource,
            };
        };

        match self.client.get(&src).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if status != 200 {
                    warn!(url = %src, status, "download failed, skipping");
                    return DownloadResult {
                        image_ref,
                        file_path: None,
                        status: DownloadStatus::HttpFailed(status),
                    };
                }
                match self.persist(&src, response, &image_ref).await {
                    Ok(path) => DownloadResult {
                        image_ref,
                        file_path: Some(path),
                        status: DownloadStatus::Saved,
                    },
                    Err(err) => {
                        warn!(url = %src, error = %err, "failed to save image, skipping");
                        DownloadResult {
                            image_ref,
                            file_path: None,
                            status: DownloadStatus::Failed(format!("{err:#}")),
                        }
                    }
                }
            }
            Err(err) => {
                warn!(url = %src, error = %err, "download error, skipping");
                DownloadResult {
                    image_ref,
                    file_path: None,
                    status: DownloadStatus::Failed(err.to_string()),
                }
            }
        }
    }

    async fn persist(
        &self,
        src: &str,
        response: reqwest::Response,
        image_ref: &ImageRef,
    ) -> Result<PathBuf> {
        let body = response.bytes().await.context("failed to read body")?;
        let path = self
            .output_dir
            .join(entry_filename(image_ref.alt_text.as_deref(), image_ref.position));
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(url = %src, path = %path.display(), bytes = body.len(), "image saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_uses_alt_and_position() {
        assert_eq!(entry_filename(Some("cat"), 0), "cat_0.jpg");
    }

    #[test]
    fn test_filename_placeholder_for_missing_alt() {
        assert_eq!(entry_filename(None, 3), "image_3.jpg");
        assert_eq!(entry_filename(Some(""), 3), "image_3.jpg");
        assert_eq!(entry_filename(Some("   "), 3), "image_3.jpg");
    }

    #[test]
    fn test_filename_unique_under_duplicate_alt() {
        let a = entry_filename(Some("cat"), 0);
        let b = entry_filename(Some("cat"), 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_filename_sanitizes_path_characters() {
        let name = entry_filename(Some("a/b\\c:d"), 2);
        assert_eq!(name, "a_b_c_d_2.jpg");
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_filename_truncates_long_alt() {
        let long = "x".repeat(500);
        let name = entry_filename(Some(&long), 9);
        assert!(name.len() <= 100 + "_9.jpg".len());
        assert!(name.ends_with("_9.jpg"));
    }

    #[tokio::test]
    async fn test_null_ref_never_hits_the_network() {
        let downloader = Downloader::new(&Config::default()).unwrap();
        let result = downloader.download_one(ImageRef::missing(5)).await;
        assert_eq!(result.status, DownloadStatus::SkippedNoSource);
        assert!(result.file_path.is_none());
        assert_eq!(result.image_ref.position, 5);
    }
}
