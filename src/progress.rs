// Copyright 2026 Bingrab Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for run telemetry.
//!
//! Pipeline stages emit `ProgressEvent`s through a `tokio::sync::broadcast`
//! channel; the CLI subscribes to print per-URL lines. When no subscriber
//! exists, events are silently dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A progress event emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Monotonically increasing sequence number within the run.
    pub seq: u64,
    /// The kind of progress event.
    pub kind: ProgressKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressKind {
    /// The run started with this many result-page URLs.
    RunStarted { url_count: usize },
    /// A result page was resolved (or gave up after its retry budget).
    PageResolved {
        url: String,
        position: usize,
        found: bool,
        attempts: u32,
    },
    /// A transient extraction failure; the page will be retried.
    PageRetrying {
        url: String,
        attempt: u32,
        delay_ms: u64,
    },
    /// One download finished, successfully or not.
    DownloadFinished {
        url: String,
        position: usize,
        saved: bool,
        detail: String,
    },
    /// The archive was written and closed.
    ArchiveWritten { path: String, entry_count: usize },
    /// The run completed.
    RunFinished {
        url_count: usize,
        saved: usize,
        elapsed_ms: u64,
    },
    /// A non-fatal warning occurred.
    Warning { message: String },
}

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = broadcast::Receiver<ProgressEvent>;

/// Sender handle for emitting progress events.
///
/// Cloned into every stage; sequence numbers stay monotonic across
/// concurrent emitters. A disabled handle makes `emit` a no-op.
#[derive(Clone)]
pub struct Progress {
    tx: Option<broadcast::Sender<ProgressEvent>>,
    seq: Arc<AtomicU64>,
}

impl Progress {
    /// Create a progress channel with a bounded buffer.
    ///
    /// 256 events cover a typical run (one per URL for extraction plus one
    /// per download, plus bookkeeping).
    pub fn channel() -> (Self, ProgressReceiver) {
        let (tx, rx) = broadcast::channel(256);
        (
            Self {
                tx: Some(tx),
                seq: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// A handle that drops every event.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event, silently ignoring send errors (which occur when no
    /// receivers are listening).
    pub fn emit(&self, kind: ProgressKind) {
        if let Some(ref tx) = self.tx {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
            let _ = tx.send(ProgressEvent { seq, kind });
        }
    }
}
