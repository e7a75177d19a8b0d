//! Pattern math: pure geometric analysis over an ordered sequence of
//! positions, used by the pattern detector (detector.rs) to recognize
//! orbit/racetrack/holding/tanker-track flight patterns.

use crate::geo::distance_nm;

/// One sample in a flight path used for pattern analysis.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: f64,
    pub heading: Option<f64>,
    pub altitude: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct CircleFit {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_nm: f64,
    pub mean_error_nm: f64,
    pub confidence: f64,
}

/// Fits a circle to a set of points via the centroid + mean-radius method,
/// then scores confidence as an inverse function of fit error relative to
/// the fitted radius.
pub fn fit_circle(points: &[Point]) -> Option<CircleFit> {
    if points.len() < 3 {
        return None;
    }

    let n = points.len() as f64;
    let center_lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let center_lon = points.iter().map(|p| p.lon).sum::<f64>() / n;

    let radii: Vec<f64> = points
        .iter()
        .filter_map(|p| distance_nm(center_lat, center_lon, p.lat, p.lon).ok())
        .collect();
    if radii.is_empty() {
        return None;
    }
    let radius_nm = radii.iter().sum::<f64>() / radii.len() as f64;
    if radius_nm < 1e-6 {
        return None;
    }

    let mean_error_nm =
        radii.iter().map(|r| (r - radius_nm).abs()).sum::<f64>() / radii.len() as f64;

    let confidence = (1.0 - (mean_error_nm / radius_nm)).clamp(0.0, 1.0);

    Some(CircleFit {
        center_lat,
        center_lon,
        radius_nm,
        mean_error_nm,
        confidence,
    })
}

/// Returns the indices of points where heading changes by more than 120
/// degrees within a short (3-point) window.
pub fn find_heading_reversals(points: &[Point]) -> Vec<usize> {
    let mut reversals = Vec::new();
    for i in 1..points.len() {
        let (Some(h1), Some(h2)) = (points[i - 1].heading, points[i].heading) else {
            continue;
        };
        let mut diff = (h2 - h1).abs() % 360.0;
        if diff > 180.0 {
            diff = 360.0 - diff;
        }
        if diff > 120.0 {
            reversals.push(i);
        }
    }
    reversals
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
    Indeterminate,
}

#[derive(Debug, Clone, Copy)]
pub struct AngularVelocity {
    pub mean_deg_per_min: f64,
    pub consistency: f64,
    pub direction: RotationDirection,
}

/// Mean angular rate of heading change and how consistent its sign is.
pub fn calculate_angular_velocity(points: &[Point]) -> AngularVelocity {
    let mut rates = Vec::new();
    for w in points.windows(2) {
        let (Some(h1), Some(h2)) = (w[0].heading, w[1].heading) else {
            continue;
        };
        let dt_min = (w[1].timestamp - w[0].timestamp) / 60.0;
        if dt_min <= 0.0 {
            continue;
        }
        let mut diff = (h2 - h1) % 360.0;
        if diff > 180.0 {
            diff -= 360.0;
        } else if diff < -180.0 {
            diff += 360.0;
        }
        rates.push(diff / dt_min);
    }

    if rates.is_empty() {
        return AngularVelocity {
            mean_deg_per_min: 0.0,
            consistency: 0.0,
            direction: RotationDirection::Indeterminate,
        };
    }

    let mean = rates.iter().sum::<f64>() / rates.len() as f64;
    let same_sign = rates
        .iter()
        .filter(|r| r.signum() == mean.signum() || r.abs() < 1e-6)
        .count();
    let consistency = same_sign as f64 / rates.len() as f64;

    let direction = if consistency < 0.3 || mean.abs() < 1e-6 {
        RotationDirection::Indeterminate
    } else if mean > 0.0 {
        RotationDirection::Clockwise
    } else {
        RotationDirection::CounterClockwise
    };

    AngularVelocity {
        mean_deg_per_min: mean,
        consistency,
        direction,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfinementResult {
    pub bbox: BoundingBox,
    pub area_nm2: f64,
    pub confined: bool,
}

/// Bounding-box area in nm^2 using a flat-earth approximation (60 nm per
/// degree latitude, scaled by cos(avg_lat) for longitude) — adequate at
/// the scale of a single flight pattern.
pub fn check_area_confinement(points: &[Point], max_area_nm2: f64) -> Option<ConfinementResult> {
    if points.is_empty() {
        return None;
    }
    let min_lat = points.iter().map(|p| p.lat).fold(f64::MAX, f64::min);
    let max_lat = points.iter().map(|p| p.lat).fold(f64::MIN, f64::max);
    let min_lon = points.iter().map(|p| p.lon).fold(f64::MAX, f64::min);
    let max_lon = points.iter().map(|p| p.lon).fold(f64::MIN, f64::max);

    let avg_lat = ((min_lat + max_lat) / 2.0).to_radians();
    let height_nm = (max_lat - min_lat) * 60.0;
    let width_nm = (max_lon - min_lon) * 60.0 * avg_lat.cos();
    let area_nm2 = (height_nm * width_nm).abs();

    Some(ConfinementResult {
        bbox: BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        },
        area_nm2,
        confined: area_nm2 < max_area_nm2,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct RacetrackParams {
    pub heading_a_deg: f64,
    pub heading_b_deg: f64,
    pub leg_length_nm: f64,
    pub width_nm: f64,
    pub confidence: f64,
}

/// Extracts the two dominant headings (expected 150-210 degrees apart),
/// the leg length, and the track width, scoring confidence from how close
/// the heading split is to 180 degrees and how consistent leg lengths are.
pub fn detect_racetrack_params(points: &[Point]) -> Option<RacetrackParams> {
    let headings: Vec<f64> = points.iter().filter_map(|p| p.heading).collect();
    if headings.len() < points.len() / 2 || headings.len() < 4 {
        return None;
    }

    // Cluster headings into two buckets by nearest-mean (simple 1D k-means
    // seeded from the first and a maximally-different heading).
    let seed_a = headings[0];
    let seed_b = headings
        .iter()
        .copied()
        .max_by(|a, b| {
            let da = angular_diff(*a, seed_a).abs();
            let db = angular_diff(*b, seed_a).abs();
            da.partial_cmp(&db).unwrap()
        })
        .unwrap_or(seed_a);

    let (mut bucket_a, mut bucket_b) = (Vec::new(), Vec::new());
    for h in &headings {
        if angular_diff(*h, seed_a).abs() <= angular_diff(*h, seed_b).abs() {
            bucket_a.push(*h);
        } else {
            bucket_b.push(*h);
        }
    }
    if bucket_a.is_empty() || bucket_b.is_empty() {
        return None;
    }

    let heading_a = circular_mean(&bucket_a);
    let heading_b = circular_mean(&bucket_b);
    let split = angular_diff(heading_a, heading_b).abs();

    if !(150.0..=210.0).contains(&split) {
        return None;
    }

    let leg_points_a: Vec<&Point> = points
        .iter()
        .filter(|p| p.heading.is_some_and(|h| angular_diff(h, heading_a).abs() < 45.0))
        .collect();
    let leg_length_nm = path_length(&leg_points_a);

    let confinement = check_area_confinement(points, f64::MAX)?;
    let avg_lat = ((confinement.bbox.min_lat + confinement.bbox.max_lat) / 2.0).to_radians();
    let width_nm = ((confinement.bbox.max_lon - confinement.bbox.min_lon) * 60.0 * avg_lat.cos())
        .abs()
        .min((confinement.bbox.max_lat - confinement.bbox.min_lat) * 60.0);

    let split_score = 1.0 - ((split - 180.0).abs() / 30.0).min(1.0);
    let confidence = (0.5 + 0.5 * split_score).clamp(0.0, 1.0);

    Some(RacetrackParams {
        heading_a_deg: heading_a,
        heading_b_deg: heading_b,
        leg_length_nm,
        width_nm,
        confidence,
    })
}

fn angular_diff(a: f64, b: f64) -> f64 {
    let mut d = (a - b) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d < -180.0 {
        d += 360.0;
    }
    d
}

fn circular_mean(headings: &[f64]) -> f64 {
    let (sin_sum, cos_sum) = headings.iter().fold((0.0, 0.0), |(s, c), h| {
        let r = h.to_radians();
        (s + r.sin(), c + r.cos())
    });
    (sin_sum.atan2(cos_sum).to_degrees() + 360.0) % 360.0
}

fn path_length(points: &[&Point]) -> f64 {
    points
        .windows(2)
        .filter_map(|w| distance_nm(w[0].lat, w[0].lon, w[1].lat, w[1].lon).ok())
        .sum()
}

/// Total path length (sum of consecutive great-circle legs) for an
/// ordered point sequence, used by the detector to test revolution count
/// and tanker-track straight-line distance.
pub fn total_path_length_nm(points: &[Point]) -> f64 {
    points
        .windows(2)
        .filter_map(|w| distance_nm(w[0].lat, w[0].lon, w[1].lat, w[1].lon).ok())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn circle_points(center_lat: f64, center_lon: f64, radius_nm: f64, n: usize) -> Vec<Point> {
        let mut pts = Vec::with_capacity(n);
        for i in 0..n {
            let frac = i as f64 / n as f64;
            let angle = 2.0 * PI * frac;
            let bearing_deg = angle.to_degrees();
            let (lat, lon) =
                crate::geo::destination(center_lat, center_lon, bearing_deg, radius_nm).unwrap();
            pts.push(Point {
                lat,
                lon,
                timestamp: i as f64 * 10.0,
                heading: Some((bearing_deg + 90.0) % 360.0),
                altitude: Some(25000.0),
            });
        }
        pts
    }

    #[test]
    fn test_fit_circle_recovers_radius() {
        let pts = circle_points(33.9, 35.5, 10.0, 60);
        let fit = fit_circle(&pts).unwrap();
        assert!((fit.radius_nm - 10.0).abs() < 0.5, "got {}", fit.radius_nm);
        assert!(fit.confidence > 0.8, "got {}", fit.confidence);
    }

    #[test]
    fn test_find_heading_reversals_detects_sharp_turn() {
        let pts = vec![
            Point { lat: 0.0, lon: 0.0, timestamp: 0.0, heading: Some(10.0), altitude: None },
            Point { lat: 0.0, lon: 0.1, timestamp: 10.0, heading: Some(170.0), altitude: None },
            Point { lat: 0.0, lon: 0.2, timestamp: 20.0, heading: Some(175.0), altitude: None },
        ];
        let reversals = find_heading_reversals(&pts);
        assert_eq!(reversals, vec![1]);
    }

    #[test]
    fn test_angular_velocity_clockwise_orbit() {
        let pts = circle_points(0.0, 0.0, 5.0, 36);
        let av = calculate_angular_velocity(&pts);
        assert!(av.consistency > 0.5, "got {}", av.consistency);
        assert_ne!(av.direction, RotationDirection::Indeterminate);
    }

    #[test]
    fn test_check_area_confinement_small_area() {
        let pts = circle_points(0.0, 0.0, 3.0, 20);
        let result = check_area_confinement(&pts, 50.0).unwrap();
        assert!(result.confined);
        assert!(result.area_nm2 < 50.0);
    }

    #[test]
    fn test_detect_racetrack_params_opposite_legs() {
        let mut pts = Vec::new();
        for i in 0..10 {
            pts.push(Point {
                lat: 0.0 + i as f64 * 0.05,
                lon: 0.0,
                timestamp: i as f64 * 30.0,
                heading: Some(0.0),
                altitude: Some(25000.0),
            });
        }
        for i in 0..10 {
            pts.push(Point {
                lat: 0.5 - i as f64 * 0.05,
                lon: 0.02,
                timestamp: (10 + i) as f64 * 30.0,
                heading: Some(180.0),
                altitude: Some(25000.0),
            });
        }
        let params = detect_racetrack_params(&pts).unwrap();
        let split = angular_diff(params.heading_a_deg, params.heading_b_deg).abs();
        assert!((150.0..=210.0).contains(&split), "got {split}");
    }
}
