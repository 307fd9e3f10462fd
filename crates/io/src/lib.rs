use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use model::RiskRecord;

/// Subject line for transports that carry one.
pub const ALERT_SUBJECT: &str = "Sharp Turn Detected!";

const RISK_LOG_HEADER: [&str; 6] = [
    "Timestamp",
    "Previous Heading",
    "Current Heading",
    "Change in Heading (C)",
    "Speed",
    "SharpTurn",
];

#[derive(Serialize)]
struct LogRow<'a> {
    timestamp: &'a str,
    previous_heading: f64,
    current_heading: f64,
    heading_change: f64,
    speed: f64,
    sharp_turn: &'a str,
}

/// Append-only CSV store of detected sharp-turn events. Never read back.
pub struct RiskLog {
    path: PathBuf,
}

impl RiskLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header row first iff the sink is empty.
    pub fn append(&self, record: &RiskRecord) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open risk log {}", self.path.display()))?;
        let empty = file
            .metadata()
            .with_context(|| format!("stat risk log {}", self.path.display()))?
            .len()
            == 0;

        let mut w = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if empty {
            w.write_record(RISK_LOG_HEADER)?;
        }
        w.serialize(LogRow {
            timestamp: &record.timestamp,
            previous_heading: record.previous_heading_deg,
            current_heading: record.current_heading_deg,
            heading_change: record.heading_change_deg,
            speed: record.speed_mph,
            sharp_turn: if record.sharp_turn { "True" } else { "False" },
        })?;
        w.flush()?;
        Ok(())
    }
}

/// Delivery seam for sharp-turn alerts. The core only formats the body;
/// the transport (mail relay etc.) lives behind this trait.
pub trait Notifier: Send + Sync {
    fn notify(&self, recipients: &[String], body: &str) -> Result<()>;
}

/// Default delivery: surfaces the alert through the log stream.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipients: &[String], body: &str) -> Result<()> {
        tracing::warn!(recipients = %recipients.join(", "), body, "sharp turn alert");
        Ok(())
    }
}

/// Deterministic plain-text alert body for a risk record.
pub fn alert_body(record: &RiskRecord) -> String {
    format!(
        "Sharp Turn detected with the following details :)\n\n \
         Timestamp: {}\n Previous Heading: {}\n Current Heading: {}\n \
         Change in Heading (C): {:.1}\n Speed: {}\n SharpTurn: True\n\n\
         Regards,\nRollwatch Monitor",
        record.timestamp,
        record.previous_heading_deg,
        record.current_heading_deg,
        record.heading_change_deg,
        record.speed_mph,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(timestamp: &str) -> RiskRecord {
        RiskRecord {
            id: Uuid::new_v4(),
            timestamp: timestamp.into(),
            previous_heading_deg: 10.0,
            current_heading_deg: 100.0,
            heading_change_deg: -90.0,
            speed_mph: 60.0,
            sharp_turn: true,
        }
    }

    #[test]
    fn header_is_written_exactly_once() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let log = RiskLog::new(file.path());

        log.append(&record("t1")).unwrap();
        log.append(&record("t2")).unwrap();

        let body = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Timestamp,Previous Heading,Current Heading,Change in Heading (C),Speed,SharpTurn"
        );
        assert!(lines[1].starts_with("t1,"));
        assert!(lines[2].starts_with("t2,"));
        assert_eq!(body.matches("Timestamp").count(), 1);
    }

    #[test]
    fn appended_row_carries_record_fields() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let log = RiskLog::new(file.path());
        log.append(&record("2024-01-01 12:00:00")).unwrap();

        let body = std::fs::read_to_string(file.path()).unwrap();
        assert!(body.contains("2024-01-01 12:00:00,10.0,100.0,-90.0,60.0,True"));
    }

    #[test]
    fn alert_body_is_deterministic() {
        let mut a = record("t1");
        let mut b = record("t1");
        // ids differ but do not leak into the body
        a.id = Uuid::new_v4();
        b.id = Uuid::new_v4();
        assert_eq!(alert_body(&a), alert_body(&b));
        assert!(alert_body(&a).starts_with("Sharp Turn detected"));
        assert!(alert_body(&a).contains("Change in Heading (C): -90.0"));
    }

    #[test]
    fn log_notifier_always_delivers() {
        let n = LogNotifier;
        let recipients = vec!["dispatch@example.com".to_string()];
        assert!(n.notify(&recipients, "body").is_ok());
    }
}
