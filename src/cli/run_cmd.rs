//! `bingrab run` — the full pipeline: load URLs, resolve pages, download,
//! archive.

use std::time::Instant;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use crate::archive;
use crate::clipboard;
use crate::config::Config;
use crate::downloader::Downloader;
use crate::extractor::chromium::ChromiumExtractor;
use crate::progress::{Progress, ProgressKind, ProgressReceiver};
use crate::sequencer;

/// Run the pipeline end to end.
pub async fn run(config: Config, quiet: bool) -> Result<()> {
    let started = Instant::now();

    let urls = clipboard::load_url_list(&config.input_path)?;
    info!(count = urls.len(), "preparing URLs for download");

    let (progress, rx) = Progress::channel();
    let printer = (!quiet).then(|| tokio::spawn(print_events(rx)));
    progress.emit(ProgressKind::RunStarted {
        url_count: urls.len(),
    });

    let extractor = ChromiumExtractor::launch(&config).await?;
    let refs = sequencer::fetch_refs(&extractor, &urls, &config.retry, &progress).await;

    let downloader = Downloader::new(&config)?;
    let results = downloader.download_all(refs, &progress).await;

    let date = chrono::Local::now().date_naive();
    let summary = archive::write_archive(&results, &config.output_dir, date)?;
    progress.emit(ProgressKind::ArchiveWritten {
        path: summary.path.display().to_string(),
        entry_count: summary.entry_count,
    });

    if config.clean_after_archive {
        archive::remove_loose_files(&results);
    }

    let saved = results.iter().filter(|r| r.is_saved()).count();
    let elapsed = started.elapsed();
    progress.emit(ProgressKind::RunFinished {
        url_count: urls.len(),
        saved,
        elapsed_ms: elapsed.as_millis() as u64,
    });

    // Close the channel so the printer drains and exits.
    drop(progress);
    if let Some(handle) = printer {
        let _ = handle.await;
    }

    info!(
        saved,
        total = urls.len(),
        elapsed_secs = format!("{:.2}", elapsed.as_secs_f64()),
        "finished downloading images"
    );
    Ok(())
}

async fn print_events(mut rx: ProgressReceiver) {
    loop {
        match rx.recv().await {
            Ok(event) => match event.kind {
                ProgressKind::RunStarted { url_count } => {
                    println!("Preparing {url_count} URLs for download...");
                }
                ProgressKind::PageResolved {
                    url,
                    position,
                    found,
                    ..
                } => {
                    if found {
                        println!("[{position}] resolved {url}");
                    } else {
                        println!("[{position}] no image found for {url}");
                    }
                }
                ProgressKind::PageRetrying {
                    url,
                    attempt,
                    delay_ms,
                } => {
                    println!("    retrying {url} (attempt {attempt}, waiting {delay_ms}ms)");
                }
                ProgressKind::DownloadFinished {
                    position,
                    saved,
                    detail,
                    ..
                } => {
                    if saved {
                        println!("[{position}] {detail}");
                    } else {
                        println!("[{position}] skipped: {detail}");
                    }
                }
                ProgressKind::ArchiveWritten { path, entry_count } => {
                    println!("Archive written: {path} ({entry_count} entries)");
                }
                ProgressKind::RunFinished {
                    url_count,
                    saved,
                    elapsed_ms,
                } => {
                    println!(
                        "Finished downloading {saved}/{url_count} images in {:.2} seconds.",
                        elapsed_ms as f64 / 1000.0
                    );
                }
                ProgressKind::Warning { message } => {
                    println!("warning: {message}");
                }
            },
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}
