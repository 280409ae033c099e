/// Linear interpolation between two values.
#[inline]
pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    (end - start).mul_add(t, start)
}

/// Cubic ease-out: fast start, rate of change strictly decreasing towards t = 1.
#[inline]
pub fn ease_out(t: f64) -> f64 {
    let t1 = t.clamp(0.0, 1.0) - 1.0;
    (t1 * t1).mul_add(t1, 1.0)
}
