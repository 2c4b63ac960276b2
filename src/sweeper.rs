//! Retention sweep over the artifact directory
//!
//! One background task for the lifetime of the process: scan the upload
//! directory, delete files whose modification time is older than the
//! retention threshold, sleep for the interval, repeat. Per-file errors are
//! logged and never abort a scan. The task stops when its cancellation
//! token fires, which happens on graceful shutdown.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

/// Outcome counters for a single scan pass
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepStats {
    pub scanned: usize,
    pub deleted: usize,
    pub errors: usize,
}

/// Perpetual sweep loop. The first scan runs immediately; after that the
/// loop waits for the interval or for cancellation, whichever comes first.
pub async fn run(
    dir: PathBuf,
    retention: Duration,
    interval: Duration,
    exempt: Option<String>,
    cancel: CancellationToken,
) {
    tracing::info!(
        dir = %dir.display(),
        retention_secs = retention.as_secs(),
        interval_secs = interval.as_secs(),
        "Retention sweeper started"
    );

    loop {
        let stats = sweep_once(&dir, retention, exempt.as_deref());
        tracing::debug!(
            scanned = stats.scanned,
            deleted = stats.deleted,
            errors = stats.errors,
            "Retention sweep finished"
        );

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!("Retention sweeper stopped");
}

/// Scan the directory once, deleting every regular file older than the
/// retention threshold except the exempted filename.
pub fn sweep_once(dir: &Path, retention: Duration, exempt: Option<&str>) -> SweepStats {
    let mut stats = SweepStats::default();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "Failed to read upload directory");
            stats.errors += 1;
            return stats;
        }
    };

    let now = SystemTime::now();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read directory entry");
                stats.errors += 1;
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && exempt == Some(name)
        {
            continue;
        }
        stats.scanned += 1;

        let age = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());

        match age {
            Some(age) if age > retention => match std::fs::remove_file(&path) {
                Ok(()) => {
                    stats.deleted += 1;
                    tracing::info!(path = %path.display(), age_secs = age.as_secs(), "Deleted old file");
                }
                Err(err) => {
                    stats.errors += 1;
                    tracing::warn!(path = %path.display(), error = %err, "Error deleting file");
                }
            },
            Some(_) => {}
            None => {
                stats.errors += 1;
                tracing::warn!(path = %path.display(), "Could not determine file age");
            }
        }
    }

    stats
}
