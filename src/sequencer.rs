//! Fetch sequencer — resolve every result page strictly in input order.
//!
//! Sequential by design: output order must equal input order because the
//! position index later names archive entries. Transient extraction
//! failures are retried under the configured `RetryPolicy`; a terminal
//! miss yields a null-content ref and the run continues.

use tracing::{info, warn};

use crate::extractor::{ImageRef, PageExtractor};
use crate::progress::{Progress, ProgressKind};
use crate::retry::{RetryDecision, RetryPolicy};

/// Resolve each URL to an `ImageRef`, one at a time, in input order.
///
/// Always returns exactly one ref per input URL.
pub async fn fetch_refs(
    extractor: &dyn PageExtractor,
    urls: &[String],
    policy: &RetryPolicy,
    progress: &Progress,
) -> Vec<ImageRef> {
    let mut refs = Vec::with_capacity(urls.len());
    for (position, url) in urls.iter().enumerate() {
        let (image_ref, attempts) = fetch_one(extractor, url, position, policy, progress).await;
        info!(
            url = %url,
            position,
            found = image_ref.source_url.is_some(),
            "resolved result page"
        );
        progress.emit(ProgressKind::PageResolved {
            url: url.clone(),
            position,
            found: image_ref.source_url.is_some(),
            attempts,
        });
        refs.push(image_ref);
    }
    refs
}

async fn fetch_one(
    extractor: &dyn PageExtractor,
    url: &str,
    position: usize,
    policy: &RetryPolicy,
    progress: &Progress,
) -> (ImageRef, u32) {
    let mut attempt = 1u32;
    loop {
        match extractor.extract(url).await {
            Ok(image) => {
                return (
                    ImageRef {
                        source_url: Some(image.src),
                        alt_text: image.alt,
                        position,
                    },
                    attempt,
                );
            }
            Err(err) if !err.is_transient() => {
                warn!(url, error = %err, "skipping page");
                return (ImageRef::missing(position), attempt);
            }
            Err(err) => match policy.decide(attempt) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(url, attempt, error = %err, "extraction failed, retrying");
                    progress.emit(ProgressKind::PageRetrying {
                        url: url.to_string(),
                        attempt,
                        delay_ms: delay.as_millis() as u64,
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::NoRetry => {
                    warn!(url, attempt, error = %err, "retry budget exhausted, skipping page");
                    return (ImageRef::missing(position), attempt);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{ExtractError, ExtractedImage};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted extractor: per-URL queue of outcomes, replayed in order.
    /// The last outcome repeats once the queue is drained.
    struct StubExtractor {
        scripts: Mutex<HashMap<String, Vec<Result<ExtractedImage, ExtractError>>>>,
        calls: AtomicU32,
    }

    impl StubExtractor {
        fn new() -> Self {
            Self {
                scripts: Mutex::new(HashMap::new()),
                calls: AtomicU32::new(0),
            }
        }

        fn script(self, url: &str, outcomes: Vec<Result<ExtractedImage, ExtractError>>) -> Self {
            self.scripts.lock().unwrap().insert(url.to_string(), outcomes);
            self
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageExtractor for StubExtractor {
        async fn extract(&self, url: &str) -> Result<ExtractedImage, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut scripts = self.scripts.lock().unwrap();
            let outcomes = scripts.get_mut(url).expect("unscripted URL");
            let outcome = if outcomes.len() > 1 {
                outcomes.remove(0)
            } else {
                outcomes[0].as_ref().map(Clone::clone).map_err(|e| match e {
                    ExtractError::ElementNotFound => ExtractError::ElementNotFound,
                    ExtractError::WaitTimeout(d) => ExtractError::WaitTimeout(*d),
                    ExtractError::Driver(s) => ExtractError::Driver(s.clone()),
                })
            };
            outcome
        }
    }

    fn found(src: &str, alt: Option<&str>) -> Result<ExtractedImage, ExtractError> {
        Ok(ExtractedImage {
            src: src.to_string(),
            alt: alt.map(str::to_string),
        })
    }

    fn timeout() -> Result<ExtractedImage, ExtractError> {
        Err(ExtractError::WaitTimeout(Duration::from_millis(1)))
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_one_ref_per_url_in_input_order() {
        let stub = StubExtractor::new()
            .script("http://a/1", vec![found("http://img/1.jpg", Some("one"))])
            .script("http://a/2", vec![found("http://img/2.jpg", None)])
            .script("http://a/3", vec![found("http://img/3.jpg", Some("three"))]);
        let input = urls(&["http://a/1", "http://a/2", "http://a/3"]);

        let refs = fetch_refs(&stub, &input, &fast_policy(3), &Progress::disabled()).await;

        assert_eq!(refs.len(), 3);
        for (i, r) in refs.iter().enumerate() {
            assert_eq!(r.position, i);
        }
        assert_eq!(refs[0].source_url.as_deref(), Some("http://img/1.jpg"));
        assert_eq!(refs[1].alt_text, None);
        assert_eq!(refs[2].alt_text.as_deref(), Some("three"));
    }

    #[tokio::test]
    async fn test_element_not_found_is_a_terminal_miss() {
        let stub = StubExtractor::new()
            .script("http://a/1", vec![Err(ExtractError::ElementNotFound)])
            .script("http://a/2", vec![found("http://img/2.jpg", Some("two"))]);
        let input = urls(&["http://a/1", "http://a/2"]);

        let refs = fetch_refs(&stub, &input, &fast_policy(3), &Progress::disabled()).await;

        assert_eq!(refs.len(), 2);
        assert!(refs[0].source_url.is_none());
        assert!(refs[1].source_url.is_some());
        // No retry for a terminal miss: one call per URL.
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_retried_until_success() {
        let stub = StubExtractor::new().script(
            "http://a/1",
            vec![timeout(), found("http://img/1.jpg", Some("one"))],
        );
        let input = urls(&["http://a/1"]);

        let refs = fetch_refs(&stub, &input, &fast_policy(3), &Progress::disabled()).await;

        assert_eq!(refs[0].source_url.as_deref(), Some("http://img/1.jpg"));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_degrades_to_miss() {
        let stub = StubExtractor::new().script("http://a/1", vec![timeout()]);
        let input = urls(&["http://a/1"]);

        let refs = fetch_refs(&stub, &input, &fast_policy(2), &Progress::disabled()).await;

        assert!(refs[0].source_url.is_none());
        // Exactly max_attempts calls, never unbounded.
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_progress_events_follow_input_order() {
        let stub = StubExtractor::new()
            .script("http://a/1", vec![found("http://img/1.jpg", None)])
            .script("http://a/2", vec![Err(ExtractError::ElementNotFound)]);
        let input = urls(&["http://a/1", "http://a/2"]);
        let (progress, mut rx) = Progress::channel();

        let _refs = fetch_refs(&stub, &input, &fast_policy(2), &progress).await;

        let mut resolved = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ProgressKind::PageResolved { position, found, .. } = event.kind {
                resolved.push((position, found));
            }
        }
        assert_eq!(resolved, vec![(0, true), (1, false)]);
    }
}
