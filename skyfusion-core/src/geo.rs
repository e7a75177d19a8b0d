//! Great-circle geometry and closest-point-of-approach primitives.
//!
//! Pure functions, no allocation beyond the occasional tuple; every other
//! component builds on top of this one.

use crate::types::{Result, SkyError};

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

fn validate_latlon(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(SkyError::Policy(format!("latitude out of range: {lat}")));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(SkyError::Policy(format!("longitude out of range: {lon}")));
    }
    Ok(())
}

/// Haversine great-circle distance in nautical miles.
pub fn distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64> {
    validate_latlon(lat1, lon1)?;
    validate_latlon(lat2, lon2)?;

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    Ok(EARTH_RADIUS_NM * c)
}

/// Initial great-circle bearing from (lat1,lon1) to (lat2,lon2), in degrees
/// [0,360).
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64> {
    validate_latlon(lat1, lon1)?;
    validate_latlon(lat2, lon2)?;

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    let theta = y.atan2(x).to_degrees();
    Ok((theta + 360.0) % 360.0)
}

/// Forward solution: point `distance_nm` away from (lat,lon) along
/// `bearing_deg`.
pub fn destination(lat: f64, lon: f64, bearing_deg: f64, distance_nm: f64) -> Result<(f64, f64)> {
    validate_latlon(lat, lon)?;
    if distance_nm < 0.0 {
        return Err(SkyError::Policy(format!(
            "negative distance: {distance_nm}"
        )));
    }

    let delta = distance_nm / EARTH_RADIUS_NM;
    let theta = bearing_deg.to_radians();
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let lat2 = phi2.to_degrees();
    let lon2 = ((lambda2.to_degrees() + 540.0) % 360.0) - 180.0;
    Ok((lat2, lon2))
}

/// Shortest-path angular lerp on [0,360) between two headings.
pub fn interpolate_angle(a1: f64, a2: f64, t: f64) -> f64 {
    let mut diff = (a2 - a1) % 360.0;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    let result = a1 + diff * t;
    ((result % 360.0) + 360.0) % 360.0
}

/// Great-circle point interpolation between p1 and p2 at t ∈ [0,1], falling
/// back to linear interpolation when the angular distance is below
/// 0.0001 rad (points are too close for slerp to be numerically stable).
pub fn spherical_interpolate(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    t: f64,
) -> Result<(f64, f64)> {
    validate_latlon(lat1, lon1)?;
    validate_latlon(lat2, lon2)?;

    let phi1 = lat1.to_radians();
    let lambda1 = lon1.to_radians();
    let phi2 = lat2.to_radians();
    let lambda2 = lon2.to_radians();

    let (x1, y1, z1) = (phi1.cos() * lambda1.cos(), phi1.cos() * lambda1.sin(), phi1.sin());
    let (x2, y2, z2) = (phi2.cos() * lambda2.cos(), phi2.cos() * lambda2.sin(), phi2.sin());

    let dot = (x1 * x2 + y1 * y2 + z1 * z2).clamp(-1.0, 1.0);
    let angular_dist = dot.acos();

    if angular_dist < 0.0001 {
        let lat = lat1 + (lat2 - lat1) * t;
        let lon = lon1 + (lon2 - lon1) * t;
        return Ok((lat, lon));
    }

    let sin_d = angular_dist.sin();
    let a = ((1.0 - t) * angular_dist).sin() / sin_d;
    let b = (t * angular_dist).sin() / sin_d;

    let x = a * x1 + b * x2;
    let y = a * y1 + b * y2;
    let z = a * z1 + b * z2;

    let lat = z.atan2((x * x + y * y).sqrt()).to_degrees();
    let lon = y.atan2(x).to_degrees();
    Ok((lat, lon))
}

/// A kinematic sample for CPA analysis: position, track (degrees), and
/// ground speed (knots).
#[derive(Debug, Clone, Copy)]
pub struct Kinematics {
    pub lat: f64,
    pub lon: f64,
    pub track_deg: f64,
    pub speed_kts: f64,
}

/// Local tangent-plane projection: 60 nm per degree latitude, longitude
/// scaled by cos(avg_lat). Returns (x_nm, y_nm) relative to an origin.
fn tangent_plane(origin_lat: f64, origin_lon: f64, lat: f64, lon: f64) -> (f64, f64) {
    let avg_lat = ((origin_lat + lat) / 2.0).to_radians();
    let x = (lon - origin_lon) * 60.0 * avg_lat.cos();
    let y = (lat - origin_lat) * 60.0;
    (x, y)
}

/// Computes (time_to_cpa_hours, cpa_distance_nm) between two kinematic
/// samples using a local tangent-plane projection centered on `a`.
/// A negative time-to-CPA means the pair is diverging; callers treat that
/// as "no future conflict, use current distance".
pub fn cpa(a: Kinematics, b: Kinematics) -> Result<(f64, f64)> {
    validate_latlon(a.lat, a.lon)?;
    validate_latlon(b.lat, b.lon)?;

    let (bx, by) = tangent_plane(a.lat, a.lon, b.lat, b.lon);
    let rel_pos = (bx, by);

    let (vax, vay) = (
        a.speed_kts * a.track_deg.to_radians().sin(),
        a.speed_kts * a.track_deg.to_radians().cos(),
    );
    let (vbx, vby) = (
        b.speed_kts * b.track_deg.to_radians().sin(),
        b.speed_kts * b.track_deg.to_radians().cos(),
    );
    let rel_vel = (vbx - vax, vby - vay);

    let vel_sq = rel_vel.0 * rel_vel.0 + rel_vel.1 * rel_vel.1;
    if vel_sq < 1e-9 {
        let dist = (rel_pos.0 * rel_pos.0 + rel_pos.1 * rel_pos.1).sqrt();
        return Ok((0.0, dist));
    }

    let t_cpa = -(rel_pos.0 * rel_vel.0 + rel_pos.1 * rel_vel.1) / vel_sq;

    if t_cpa < 0.0 {
        let dist = (rel_pos.0 * rel_pos.0 + rel_pos.1 * rel_pos.1).sqrt();
        return Ok((t_cpa, dist));
    }

    let cx = rel_pos.0 + rel_vel.0 * t_cpa;
    let cy = rel_pos.1 + rel_vel.1 * t_cpa;
    let cpa_dist = (cx * cx + cy * cy).sqrt();
    Ok((t_cpa, cpa_dist))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_nm_known_points() {
        // London to Paris, ~186 nm.
        let d = distance_nm(51.5074, -0.1278, 48.8566, 2.3522).unwrap();
        assert!((d - 186.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn test_distance_rejects_invalid_lat() {
        assert!(distance_nm(91.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_bearing_due_east() {
        let b = bearing(0.0, 0.0, 0.0, 1.0).unwrap();
        assert!((b - 90.0).abs() < 1.0, "got {b}");
    }

    #[test]
    fn test_destination_roundtrip() {
        let (lat2, lon2) = destination(40.0, -73.0, 45.0, 100.0).unwrap();
        let d = distance_nm(40.0, -73.0, lat2, lon2).unwrap();
        assert!((d - 100.0).abs() < 0.5, "got {d}");
    }

    #[test]
    fn test_interpolate_angle_wraps() {
        // 350 -> 10 should go through 0, shortest path, not through 180.
        let mid = interpolate_angle(350.0, 10.0, 0.5);
        assert!((mid - 0.0).abs() < 1.0 || (mid - 360.0).abs() < 1.0, "got {mid}");
    }

    #[test]
    fn test_spherical_interpolate_endpoints() {
        let (lat, lon) = spherical_interpolate(10.0, 10.0, 20.0, 20.0, 0.0).unwrap();
        assert!((lat - 10.0).abs() < 1e-6 && (lon - 10.0).abs() < 1e-6);
        let (lat, lon) = spherical_interpolate(10.0, 10.0, 20.0, 20.0, 1.0).unwrap();
        assert!((lat - 20.0).abs() < 1e-6 && (lon - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_spherical_interpolate_falls_back_to_linear_when_close() {
        let (lat, lon) = spherical_interpolate(10.0, 10.0, 10.00001, 10.00001, 0.5).unwrap();
        assert!((lat - 10.000005).abs() < 1e-5);
        assert!((lon - 10.000005).abs() < 1e-5);
    }

    #[test]
    fn test_cpa_head_on() {
        // A at (32.0, 34.0), track 090, 500kts; B at (32.0, 34.5), track 270, 500kts.
        let a = Kinematics {
            lat: 32.0,
            lon: 34.0,
            track_deg: 90.0,
            speed_kts: 500.0,
        };
        let b = Kinematics {
            lat: 32.0,
            lon: 34.5,
            track_deg: 270.0,
            speed_kts: 500.0,
        };
        let (t_cpa, dist) = cpa(a, b).unwrap();
        let minutes = t_cpa * 60.0;
        assert!((minutes - 1.6).abs() < 0.3, "got {minutes} min");
        assert!(dist < 1.0, "got {dist} nm");
    }

    #[test]
    fn test_cpa_diverging_pair_returns_negative_time() {
        let a = Kinematics {
            lat: 0.0,
            lon: 0.0,
            track_deg: 0.0,
            speed_kts: 300.0,
        };
        let b = Kinematics {
            lat: 0.0,
            lon: 1.0,
            track_deg: 0.0,
            speed_kts: 300.0,
        };
        let (t_cpa, _dist) = cpa(a, b).unwrap();
        assert!(t_cpa < 0.0 || t_cpa.abs() < 1e-6);
    }
}
