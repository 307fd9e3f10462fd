use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use detect::{SharpTurnDetector, SHARP_TURN_SIGNAL};
use model::VehicleProfile;
use rollwatch_ingest::BatchSource;
use rollwatch_io::{alert_body, Notifier, RiskLog};

/// Owns the detector and its sinks. The mutex is the single mutation point
/// for the window state; batches are applied one at a time.
pub struct MonitorSession {
    detector: Mutex<SharpTurnDetector>,
    risk_log: RiskLog,
    notifier: Box<dyn Notifier>,
    recipients: Vec<String>,
}

impl MonitorSession {
    pub fn new(
        profile: &VehicleProfile,
        risk_log: RiskLog,
        notifier: Box<dyn Notifier>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            detector: Mutex::new(SharpTurnDetector::new(profile)),
            risk_log,
            notifier,
            recipients,
        }
    }

    /// Run-to-completion handling of one raw batch: evaluate, then fire the
    /// persist/notify effects. Sink failures are logged and never affect the
    /// decision, which is already made by the time they run. Evaluation
    /// errors are surfaced here and the loop moves on to the next batch.
    pub fn process_batch(&self, raw: &str) {
        let outcome = self.detector.lock().evaluate(raw);
        match outcome {
            Ok(Some(record)) => {
                tracing::warn!(
                    timestamp = %record.timestamp,
                    speed_mph = record.speed_mph,
                    heading_change_deg = record.heading_change_deg,
                    "{SHARP_TURN_SIGNAL}"
                );
                if let Err(e) = self.risk_log.append(&record) {
                    tracing::error!(error = %e, "failed to persist risk record");
                }
                if let Err(e) = self
                    .notifier
                    .notify(&self.recipients, &alert_body(&record))
                {
                    tracing::error!(error = %e, "failed to send sharp-turn alert");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "batch evaluation failed"),
        }
    }
}

/// Spawn `src` on the runtime and pump its batches into the session from a
/// dedicated consumer thread, one batch at a time.
pub fn run_source<S: BatchSource + 'static>(
    src: S,
    sess: Arc<MonitorSession>,
) -> thread::JoinHandle<()> {
    let (tx, rx) = rollwatch_ingest::channel();
    tokio::spawn(async move {
        if let Err(e) = src.run(tx).await {
            tracing::error!(error = %e, "batch source stopped");
        }
    });
    thread::spawn(move || {
        while let Ok(batch) = rx.recv() {
            sess.process_batch(&batch);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct MemoryNotifier {
        sent: Arc<Mutex<Vec<(Vec<String>, String)>>>,
    }

    impl Notifier for MemoryNotifier {
        fn notify(&self, recipients: &[String], body: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .push((recipients.to_vec(), body.to_string()));
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _recipients: &[String], _body: &str) -> anyhow::Result<()> {
            anyhow::bail!("relay unreachable")
        }
    }

    fn session_with(notifier: Box<dyn Notifier>) -> (MonitorSession, tempfile::NamedTempFile) {
        let log_file = tempfile::NamedTempFile::new().unwrap();
        let session = MonitorSession::new(
            &VehicleProfile::default(),
            RiskLog::new(log_file.path()),
            notifier,
            vec!["dispatch@example.com".into(), "safety@example.com".into()],
        );
        (session, log_file)
    }

    #[test]
    fn sharp_turn_batch_persists_and_notifies() {
        let notifier = MemoryNotifier::default();
        let log_file = tempfile::NamedTempFile::new().unwrap();
        let session = MonitorSession::new(
            &VehicleProfile::default(),
            RiskLog::new(log_file.path()),
            Box::new(notifier.clone()),
            vec!["dispatch@example.com".into()],
        );

        session.process_batch("t0,0,0,10,moving,5,0");
        session.process_batch("t1,0,0,100,moving,60,0");

        let log = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(log.starts_with("Timestamp,"));
        assert!(log.contains("t1,10.0,100.0,-90.0,60.0,True"));

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, vec!["dispatch@example.com".to_string()]);
        assert!(sent[0].1.contains("Sharp Turn detected"));
    }

    #[test]
    fn quiet_batches_touch_no_sinks() {
        let (session, log_file) = session_with(Box::new(MemoryNotifier::default()));
        session.process_batch("t0,0,0,10,moving,5,0");
        session.process_batch("t1,0,0,12,moving,5,0");

        let log = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn notifier_failure_does_not_stop_the_loop() {
        let (session, log_file) = session_with(Box::new(FailingNotifier));
        session.process_batch("t0,0,0,10,moving,5,0");
        session.process_batch("t1,0,0,100,moving,60,0");
        // record persisted even though notification failed
        let log = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(log.contains("t1,"));

        // and the session keeps evaluating subsequent batches
        session.process_batch("t2,0,0,190,moving,60,0");
        let log = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(log.contains("t2,"));
    }

    #[test]
    fn malformed_batch_is_logged_and_skipped() {
        let (session, log_file) = session_with(Box::new(MemoryNotifier::default()));
        session.process_batch("garbage");
        session.process_batch("t0,0,0,10,moving,5,0");
        session.process_batch("t1,0,0,100,moving,60,0");

        let log = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(log.contains("t1,"));
    }
}
