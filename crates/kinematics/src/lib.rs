//! Pure rollover kinematics: heading deltas, turn radii, critical speed.

use std::f64::consts::PI;
use thiserror::Error;

pub const G_MPS2: f64 = 9.81;
pub const MPS_TO_MPH: f64 = 2.23694;
pub const MPH_TO_MPS: f64 = 0.44704;

/// Angles within this tolerance of 0 or π count as straight-line motion.
const STRAIGHT_TOL: f64 = 1e-9;
/// Keeps the radius denominator away from tan's poles.
const TAN_GUARD: f64 = 1e-5;

#[derive(Debug, Error)]
pub enum KinematicsError {
    #[error("wheelbase must be positive, got {0}")]
    InvalidWheelbase(f64),
}

/// Angular distance between two compass headings, in signed radians.
///
/// Both headings are normalized into [0, 360) and the difference is wrapped
/// the short way around the circle, so the magnitude is always in [0, π].
/// The sign is positive when the normalized previous heading is larger than
/// the current one; it encodes turn direction only, and downstream radius
/// math uses the magnitude.
pub fn angular_distance(prev_heading_deg: f64, cur_heading_deg: f64) -> f64 {
    let prev = prev_heading_deg.rem_euclid(360.0);
    let cur = cur_heading_deg.rem_euclid(360.0);

    let mut dist = (prev - cur).abs();
    dist = dist.min(360.0 - dist);

    if prev > cur {
        dist.to_radians()
    } else {
        -dist.to_radians()
    }
}

/// Radius of the arc implied by a heading change over one wheelbase, meters.
///
/// Returns +∞ when the angle is within tolerance of 0 or π (no meaningful
/// curve). Reported as a non-negative magnitude.
pub fn curve_radius(angle_rad: f64, wheelbase_m: f64) -> Result<f64, KinematicsError> {
    if !(wheelbase_m > 0.0) {
        return Err(KinematicsError::InvalidWheelbase(wheelbase_m));
    }
    if angle_rad.abs() <= STRAIGHT_TOL || (angle_rad - PI).abs() <= STRAIGHT_TOL {
        return Ok(f64::INFINITY);
    }
    Ok((wheelbase_m / (angle_rad.tan() + TAN_GUARD)).abs())
}

/// Mass-weighted height of the combined tractor + trailer center of gravity.
pub fn center_of_gravity_height(
    mass_tractor_kg: f64,
    mass_trailer_kg: f64,
    cg_height_tractor_m: f64,
    cg_height_trailer_m: f64,
) -> f64 {
    (mass_tractor_kg * cg_height_tractor_m + mass_trailer_kg * cg_height_trailer_m)
        / (mass_tractor_kg + mass_trailer_kg)
}

/// Rollover threshold speed for a turn of `radius_m`, in mph.
///
/// Undefined (NaN) for negative CG height; callers guarantee positive
/// geometry inputs.
pub fn critical_speed_mph(radius_m: f64, cg_height_m: f64, semi_trackwidth_m: f64) -> f64 {
    ((G_MPS2 * semi_trackwidth_m) / (2.0 * cg_height_m) * radius_m).sqrt() * MPS_TO_MPH
}
