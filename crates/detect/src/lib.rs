//! Sharp-turn rollover detection over a rolling telemetry window.
//!
//! Raw batches flow one way: comma-separated sample lines are parsed into
//! [`model::GpsSample`] rows by the [`SampleWindow`], pure kinematics are
//! derived per row, and the [`SharpTurnDetector`] turns the last row's risk
//! flag into an optional [`model::RiskRecord`]. Persisting and notifying are
//! the caller's job, so the decision itself stays free of I/O.

use model::{GpsSample, RiskRecord, VehicleProfile};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Signal logged alongside an emitted risk record.
pub const SHARP_TURN_SIGNAL: &str = "Sharp turn detected!!!";

const FIELDS_PER_SAMPLE: usize = 7;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("malformed telemetry batch: {0}")]
    Parse(String),
    #[error(transparent)]
    Kinematics(#[from] kinematics::KinematicsError),
}

/// Wire row: 7 comma-separated fields, no header, fixed order.
#[derive(Debug, Deserialize)]
struct RawRow {
    timestamp: String,
    latitude: f64,
    longitude: f64,
    direction: f64,
    vehicle_motion_status: String,
    speed_mph: f64,
    acceleration_from_gps_speed: f64,
}

/// Rolling telemetry history plus the stream-global index counter.
///
/// Only one row of history is retained between batches: after each ingest
/// the window is the last row of the previous window followed by the new
/// batch. Single-writer only; ingestion is deliberately non-idempotent
/// because the index always advances.
#[derive(Debug, Default)]
pub struct SampleWindow {
    rows: Vec<GpsSample>,
    next_index: u64,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a batch of raw sample lines and merge it into the window.
    ///
    /// The whole batch is validated before any state changes, so a parse
    /// failure leaves the window and the index counter untouched.
    pub fn ingest(&mut self, raw: &str) -> Result<(), DetectError> {
        let batch = parse_batch(raw, self.next_index)?;
        self.next_index += batch.len() as u64;

        if self.rows.is_empty() {
            self.rows = batch;
        } else {
            let mut merged = Vec::with_capacity(batch.len() + 1);
            if let Some(last) = self.rows.last() {
                merged.push(last.clone());
            }
            merged.extend(batch);
            self.rows = merged;
        }
        Ok(())
    }

    pub fn rows(&self) -> &[GpsSample] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_batch(raw: &str, start_index: u64) -> Result<Vec<GpsSample>, DetectError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| DetectError::Parse(e.to_string()))?;
        if rec.len() != FIELDS_PER_SAMPLE {
            return Err(DetectError::Parse(format!(
                "expected {FIELDS_PER_SAMPLE} fields, got {}",
                rec.len()
            )));
        }
        let row: RawRow = rec
            .deserialize(None)
            .map_err(|e| DetectError::Parse(e.to_string()))?;
        out.push(GpsSample {
            index: start_index + out.len() as u64,
            timestamp: row.timestamp,
            latitude: row.latitude,
            longitude: row.longitude,
            direction_deg: row.direction,
            motion_status: row.vehicle_motion_status,
            speed_mph: row.speed_mph,
            accel_mps2: row.acceleration_from_gps_speed,
        });
    }

    if out.is_empty() {
        return Err(DetectError::Parse("empty batch".into()));
    }
    Ok(out)
}

/// Per-row derived kinematics. The first row of a window has no previous
/// heading, so its derivatives are `None` and its risk flag is false.
/// `speed_mps` is carried for parity with the recorded stream; the decision
/// compares mph against mph.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub index: u64,
    pub previous_heading_deg: Option<f64>,
    pub angular_distance_rad: Option<f64>,
    pub speed_mps: f64,
    pub radius_m: Option<f64>,
    pub critical_speed_mph: Option<f64>,
    pub risk: bool,
}

/// Stateful evaluator: owns the window and the vehicle geometry derived
/// once from the profile.
pub struct SharpTurnDetector {
    wheelbase_m: f64,
    cg_height_m: f64,
    semi_trackwidth_m: f64,
    window: SampleWindow,
}

impl SharpTurnDetector {
    pub fn new(profile: &VehicleProfile) -> Self {
        let cg_height_m = kinematics::center_of_gravity_height(
            profile.mass_tractor_kg,
            profile.mass_trailer_kg,
            profile.cg_height_tractor_m,
            profile.cg_height_trailer_m,
        );
        Self {
            wheelbase_m: profile.wheelbase_m,
            cg_height_m,
            semi_trackwidth_m: profile.semi_trackwidth_m,
            window: SampleWindow::new(),
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn cg_height_m(&self) -> f64 {
        self.cg_height_m
    }

    /// Ingest one raw batch and decide whether its latest sample is a
    /// sharp-turn rollover risk.
    ///
    /// A window with fewer than 2 rows is insufficient history and yields
    /// `Ok(None)` without a decision. Otherwise every row is assessed and
    /// the last row's risk flag decides.
    pub fn evaluate(&mut self, raw: &str) -> Result<Option<RiskRecord>, DetectError> {
        self.window.ingest(raw)?;

        let rows = self.window.rows();
        if rows.len() < 2 {
            tracing::debug!(rows = rows.len(), "not enough rows for a sharp-turn decision");
            return Ok(None);
        }

        let assessments = self.assess(rows)?;
        for a in &assessments {
            tracing::debug!(
                index = a.index,
                previous_heading_deg = a.previous_heading_deg,
                angular_distance_rad = a.angular_distance_rad,
                speed_mps = a.speed_mps,
                radius_m = a.radius_m,
                critical_speed_mph = a.critical_speed_mph,
                risk = a.risk,
                "assessed sample"
            );
        }

        let (Some(last), Some(cur)) = (assessments.last(), rows.last()) else {
            return Ok(None);
        };
        if !last.risk {
            return Ok(None);
        }

        let heading_change_deg =
            round1(last.angular_distance_rad.unwrap_or(0.0).to_degrees());
        Ok(Some(RiskRecord {
            id: Uuid::new_v4(),
            timestamp: cur.timestamp.clone(),
            previous_heading_deg: last.previous_heading_deg.unwrap_or(cur.direction_deg),
            current_heading_deg: cur.direction_deg,
            heading_change_deg,
            speed_mph: cur.speed_mph,
            sharp_turn: true,
        }))
    }

    /// Derive kinematics for every row of the window.
    pub fn assess(&self, rows: &[GpsSample]) -> Result<Vec<Assessment>, DetectError> {
        let mut out = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let prev = i.checked_sub(1).map(|j| rows[j].direction_deg);
            let (dist, radius, critical) = match prev {
                Some(p) => {
                    let dist = kinematics::angular_distance(p, row.direction_deg);
                    let radius = kinematics::curve_radius(dist, self.wheelbase_m)?;
                    let critical = kinematics::critical_speed_mph(
                        radius,
                        self.cg_height_m,
                        self.semi_trackwidth_m,
                    );
                    (Some(dist), Some(radius), Some(critical))
                }
                None => (None, None, None),
            };
            let risk = critical.map(|c| c <= row.speed_mph).unwrap_or(false);
            out.push(Assessment {
                index: row.index,
                previous_heading_deg: prev,
                angular_distance_rad: dist,
                speed_mps: row.speed_mph * kinematics::MPH_TO_MPS,
                radius_m: radius,
                critical_speed_mph: critical,
                risk,
            });
        }
        Ok(out)
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
