//! Run configuration, built once from CLI arguments and passed to
//! components at construction. No process-wide mutable settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the clipboard export listing result-page URLs.
    pub input_path: PathBuf,
    /// Directory that receives the downloaded images and the archive.
    pub output_dir: PathBuf,
    /// Maximum number of simultaneous in-flight downloads.
    pub concurrency: usize,
    /// How long to wait for the image element to appear on a result page.
    pub wait_timeout: Duration,
    /// Per-request timeout for image downloads.
    pub download_timeout: Duration,
    /// Retry budget for transient page-extraction failures.
    pub retry: RetryPolicy,
    /// Remove the loose image files once the archive is closed.
    pub clean_after_archive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("images_clipboard.txt"),
            output_dir: PathBuf::from("."),
            concurrency: 4,
            wait_timeout: Duration::from_secs(20),
            download_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            clean_after_archive: false,
        }
    }
}
