//! Curved attack-arc paths.
//!
//! A single quadratic Bezier per line: control point at the chord midpoint,
//! pushed perpendicular to the chord by a third of its length. Curvature
//! scales with distance, so short hops bow gently and long hauls arc high,
//! always on the same side regardless of direction.

/// Curvature factor: perpendicular offset = chord length / 3.
const CURVE_RATIO: f64 = 3.0;

/// Sample a quadratic Bezier between two projected points. A zero-length
/// chord degrades to a single point rather than dividing by zero.
pub fn arc_points(src: (f64, f64), dst: (f64, f64), segments: usize) -> Vec<(f64, f64)> {
    let dx = dst.0 - src.0;
    let dy = dst.1 - src.1;
    let len = (dx * dx + dy * dy).sqrt();
    if !len.is_finite() || len < f64::EPSILON {
        return vec![src];
    }

    let mid = ((src.0 + dst.0) / 2.0, (src.1 + dst.1) / 2.0);
    // Unit perpendicular, offset proportional to chord length.
    let ctrl = (
        mid.0 + (-dy / len) * (len / CURVE_RATIO),
        mid.1 + (dx / len) * (len / CURVE_RATIO),
    );

    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let u = 1.0 - t;
            (
                u * u * src.0 + 2.0 * u * t * ctrl.0 + t * t * dst.0,
                u * u * src.1 + 2.0 * u * t * ctrl.1 + t * t * dst.1,
            )
        })
        .collect()
}
