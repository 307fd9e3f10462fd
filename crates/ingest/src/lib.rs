//! Batch source seam for the rollover monitor.
//!
//! How bytes arrive is out of core scope; anything that can yield raw
//! telemetry lines implements [`BatchSource`] and pushes them through a
//! channel to the single consumer that owns the detector.

use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    Msg(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type BatchTx = crossbeam_channel::Sender<String>;
pub type BatchRx = crossbeam_channel::Receiver<String>;

pub fn channel() -> (BatchTx, BatchRx) {
    crossbeam_channel::unbounded()
}

/// Trait for any source of raw telemetry batches.
#[async_trait::async_trait]
pub trait BatchSource: Send + Sync {
    async fn run(&self, tx: BatchTx) -> Result<(), IngestError>;
}

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Recorded stream, one wire-format sample per line.
    pub path: PathBuf,
    /// Fixed delay between replayed samples.
    pub interval: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: "stream.csv".into(),
            interval: Duration::from_secs(1),
        }
    }
}

/// Replays a recorded stream file, one line per batch.
pub struct ReplaySource {
    cfg: ReplayConfig,
}

impl ReplaySource {
    pub fn new(cfg: ReplayConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait::async_trait]
impl BatchSource for ReplaySource {
    async fn run(&self, tx: BatchTx) -> Result<(), IngestError> {
        let data = std::fs::read_to_string(&self.cfg.path)
            .with_context(|| format!("read replay stream {}", self.cfg.path.display()))?;

        for line in data.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if tx.send(line.to_string()).is_err() {
                // consumer gone, nothing left to feed
                break;
            }
            tokio::time::sleep(self.cfg.interval).await;
        }
        tracing::info!(path = %self.cfg.path.display(), "replay stream drained");
        Ok(())
    }
}
