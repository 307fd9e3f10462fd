mod config;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::MonitorConfig;
use rollwatch_ingest::{ReplayConfig, ReplaySource};
use rollwatch_io::{LogNotifier, RiskLog};
use session::{run_source, MonitorSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("rollwatch.json"));
    let cfg = if cfg_path.exists() {
        MonitorConfig::load(&cfg_path)?
    } else {
        tracing::info!(path = %cfg_path.display(), "config not found, using defaults");
        MonitorConfig::default()
    };

    tracing::info!(
        stream = %cfg.stream_path.display(),
        risk_log = %cfg.risk_log_path.display(),
        interval_ms = cfg.replay_interval_ms,
        "starting rollover monitor"
    );

    let session = Arc::new(MonitorSession::new(
        &cfg.vehicle,
        RiskLog::new(&cfg.risk_log_path),
        Box::new(LogNotifier),
        cfg.alert_recipients.clone(),
    ));

    let source = ReplaySource::new(ReplayConfig {
        path: cfg.stream_path.clone(),
        interval: cfg.replay_interval(),
    });
    let pump = run_source(source, session);

    // The pump thread exits once the source hangs up.
    tokio::task::spawn_blocking(move || {
        let _ = pump.join();
    })
    .await?;
    Ok(())
}
