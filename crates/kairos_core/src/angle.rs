//! Wraparound-aware angle arithmetic.
//!
//! Every angular comparison in the engine goes through these helpers so that
//! the 0°/360° seam never produces a spurious root or a spurious gap.

/// Normalize an angle to [0, 360).
pub fn normalize_deg(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs.
    if d >= 360.0 { 0.0 } else { d }
}

/// Signed shortest arc travelled going from `from` to `to`, in [-180, 180).
///
/// `shortest_diff(359.0, 1.0) == 2.0` and `shortest_diff(1.0, 359.0) == -2.0`.
pub fn shortest_diff(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Check if a sign change between two wrapped samples is a genuine zero
/// crossing rather than a jump across the ±180° seam.
///
/// A genuine crossing has both values relatively small in magnitude.
pub fn is_genuine_crossing(f_a: f64, f_b: f64) -> bool {
    f_a * f_b < 0.0 && (f_a - f_b).abs() < 270.0
}

/// Great-circle separation between two (lon, lat) points in degrees.
pub fn angular_separation_deg(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (l1, b1, l2, b2) = (
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    );
    // Haversine form stays accurate for the small separations eclipses care about.
    let dl = l2 - l1;
    let db = b2 - b1;
    let h = (db / 2.0).sin().powi(2) + b1.cos() * b2.cos() * (dl / 2.0).sin().powi(2);
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortest_diff_across_seam() {
        assert!((shortest_diff(359.0, 1.0) - 2.0).abs() < 1e-12);
        assert!((shortest_diff(1.0, 359.0) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn shortest_diff_plain() {
        assert!((shortest_diff(85.0, 90.0) - 5.0).abs() < 1e-12);
        assert!((shortest_diff(95.0, 90.0) + 5.0).abs() < 1e-12);
        assert!((shortest_diff(0.0, 180.0) + 180.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_deg_range() {
        assert!((normalize_deg(-30.0) - 330.0).abs() < 1e-10);
        assert!((normalize_deg(725.0) - 5.0).abs() < 1e-10);
        let tiny = normalize_deg(-1e-18);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn wraparound_rejected() {
        assert!(is_genuine_crossing(5.0, -3.0));
        assert!(!is_genuine_crossing(170.0, -170.0));
        assert!(!is_genuine_crossing(-170.0, 170.0));
    }

    #[test]
    fn separation_simple() {
        assert!((angular_separation_deg(10.0, 0.0, 12.0, 0.0) - 2.0).abs() < 1e-9);
        assert!((angular_separation_deg(359.0, 0.0, 1.0, 0.0) - 2.0).abs() < 1e-9);
        assert!((angular_separation_deg(0.0, 0.0, 0.0, 0.5) - 0.5).abs() < 1e-9);
    }
}
