//! Miscellaneous helper utilities.

use crate::errors::{AppError, Result};
use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Unix timestamp `secs_from_now` seconds in the future.
pub fn unix_deadline(secs_from_now: u64) -> Result<u64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Other(format!("system clock before unix epoch: {e}")))?;
    Ok(now.as_secs() + secs_from_now)
}

/// Resolves on Ctrl+C. If the handler cannot be installed it never resolves.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "[STOP] cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Drive `work` until it finishes or `interrupt` fires, whichever is first.
/// `None` means `work` was dropped at its current await point.
pub async fn until_interrupted<T, W, I>(work: W, interrupt: I) -> Option<T>
where
    W: Future<Output = T>,
    I: Future<Output = ()>,
{
    tokio::select! {
        out = work => Some(out),
        _ = interrupt => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[test]
    fn deadline_is_offset_from_now() {
        let now = unix_deadline(0).unwrap();
        let later = unix_deadline(300).unwrap();
        assert!(later >= now + 300 && later <= now + 301);
    }

    #[tokio::test]
    async fn finished_work_returns_its_output() {
        let out = until_interrupted(async { 7 }, std::future::pending()).await;
        assert_eq!(out, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_during_setup_drops_the_work() {
        let reached_run = AtomicBool::new(false);
        let work = async {
            // a slow connect or approval wait
            sleep(Duration::from_secs(10)).await;
            reached_run.store(true, Ordering::SeqCst);
        };
        let out = until_interrupted(work, sleep(Duration::from_secs(1))).await;
        assert_eq!(out, None);
        assert!(!reached_run.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn interrupt_wins_over_pending_work() {
        let out: Option<()> = until_interrupted(std::future::pending(), async {}).await;
        assert!(out.is_none());
    }
}
