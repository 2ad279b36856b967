//! Page extractor abstraction for resolving a result page to its image.
//!
//! Defines the `PageExtractor` trait that abstracts over the browser
//! engine (currently Chromium via chromiumoxide).

pub mod chromium;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CSS selector for the image element inside its container on a result page.
pub const IMAGE_SELECTOR: &str = "div.imgContainer > img";

/// A resolved image reference: source URL, alt text, and the zero-based
/// position of its page in the input order. Position breaks naming ties
/// when alt text is duplicated or missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Resolved image source URL; `None` when the page had no usable image.
    pub source_url: Option<String>,
    /// Alt text of the image element, if any.
    pub alt_text: Option<String>,
    /// Zero-based index of the page URL in the input order.
    pub position: usize,
}

impl ImageRef {
    /// A null-content ref for a page that yielded no image.
    pub fn missing(position: usize) -> Self {
        Self {
            source_url: None,
            alt_text: None,
            position,
        }
    }
}

/// What the extractor reads off a result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Value of the image element's `src` attribute.
    pub src: String,
    /// Value of the image element's `alt` attribute, if present.
    pub alt: Option<String>,
}

/// Extraction failures, distinguishable so the sequencer can apply its
/// retry policy per kind.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The image element is present but unusable, or demonstrably absent.
    /// Terminal for this URL.
    #[error("no usable image element on the page")]
    ElementNotFound,
    /// The element did not appear within the wait budget. Transient.
    #[error("timed out after {0:?} waiting for the image element")]
    WaitTimeout(Duration),
    /// Navigation or browser session failure. Transient.
    #[error("browser driver error: {0}")]
    Driver(String),
}

impl ExtractError {
    /// Whether the sequencer may retry this failure.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::ElementNotFound)
    }

    pub(crate) fn driver(err: impl std::fmt::Display) -> Self {
        Self::Driver(err.to_string())
    }
}

/// A browser-backed extractor that resolves one result page at a time.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// Open `url`, wait for the image element, and read its `src`/`alt`.
    async fn extract(&self, url: &str) -> Result<ExtractedImage, ExtractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(!ExtractError::ElementNotFound.is_transient());
        assert!(ExtractError::WaitTimeout(Duration::from_secs(20)).is_transient());
        assert!(ExtractError::driver("session lost").is_transient());
    }

    #[test]
    fn test_missing_ref_has_no_content() {
        let r = ImageRef::missing(7);
        assert_eq!(r.position, 7);
        assert!(r.source_url.is_none());
        assert!(r.alt_text.is_none());
    }
}
