use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One GPS/motion reading off the wire, plus the stream-global index
/// assigned at ingestion time. Immutable once ingested.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GpsSample {
    pub index: u64,
    pub timestamp: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Compass heading in degrees, [0, 360).
    pub direction_deg: f64,
    pub motion_status: String,
    pub speed_mph: f64,
    /// Acceleration derived from GPS speed, m/s².
    pub accel_mps2: f64,
}

/// Static tractor/trailer geometry, loaded once before the first evaluation.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct VehicleProfile {
    pub wheelbase_m: f64,
    pub mass_tractor_kg: f64,
    pub mass_trailer_kg: f64,
    pub cg_height_tractor_m: f64,
    pub cg_height_trailer_m: f64,
    /// Half the lateral distance between the wheels.
    pub semi_trackwidth_m: f64,
}

impl Default for VehicleProfile {
    fn default() -> Self {
        // Loaded 5-axle tractor + reefer trailer.
        Self {
            wheelbase_m: 6.2,
            mass_tractor_kg: 8_800.0,
            mass_trailer_kg: 13_600.0,
            cg_height_tractor_m: 1.1,
            cg_height_trailer_m: 2.4,
            semi_trackwidth_m: 0.93,
        }
    }
}

/// Emitted when a sharp turn is detected. Append-only, one per event.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RiskRecord {
    #[serde(with = "uuid::serde::simple")]
    pub id: Uuid,
    pub timestamp: String,
    pub previous_heading_deg: f64,
    pub current_heading_deg: f64,
    /// Signed heading change in degrees, rounded to one decimal.
    pub heading_change_deg: f64,
    pub speed_mph: f64,
    pub sharp_turn: bool,
}
