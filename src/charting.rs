//! Reproducible chart bounds, independent of the rendering layer.

/// Round a raw axis maximum up to a visually "round" bound.
///
/// Single-digit maxima pass through unchanged; anything larger is ceiled at
/// its second significant digit, never finer than tens: 45 -> 50,
/// 1234 -> 1300. Tick bounds derived here are stable across screens and
/// test runs.
pub fn nice_axis_max(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return raw;
    }

    let digits = match (raw.floor() as u64).checked_ilog10() {
        Some(log) => log + 1,
        None => 1,
    };
    if digits <= 1 {
        return raw;
    }

    let step = 10f64.powi((digits - 2).max(1) as i32);
    (raw / step).ceil() * step
}

/// X and Y bounds for a results chart: nice maxima over the point set, with
/// a floor of 1.0 so an empty or degenerate set still yields drawable axes.
pub fn chart_bounds(points: &[(f64, f64)]) -> (f64, f64) {
    let mut max_x = 0.0f64;
    let mut max_y = 0.0f64;
    for &(x, y) in points {
        if x > max_x {
            max_x = x;
        }
        if y > max_y {
            max_y = y;
        }
    }

    (nice_axis_max(max_x).max(1.0), nice_axis_max(max_y).max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
