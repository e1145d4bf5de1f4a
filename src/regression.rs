//! Ordinary-least-squares line fitting for difficulty/time point sets.

/// A fitted line `y = intercept + slope * x` with its correlation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub r: f64,
    pub slope: f64,
    pub intercept: f64,
}

impl Fit {
    pub fn r_squared(&self) -> f64 {
        self.r * self.r
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least squares over `points`.
///
/// Uses only sums, means and variances, so the result does not depend on
/// input order. Returns `None` for degenerate input: fewer than two points,
/// or zero x-variance (all x equal). Callers therefore never see NaN or
/// infinity from this function.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<Fit> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut c = 0.0;
    let mut sq_x = 0.0;
    let mut sq_y = 0.0;
    for &(x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        c += dx * dy;
        sq_x += dx * dx;
        sq_y += dy * dy;
    }

    let stdv_x = sq_x.sqrt();
    let stdv_y = sq_y.sqrt();

    if stdv_x == 0.0 {
        return None;
    }
    if stdv_y == 0.0 {
        // flat data: a horizontal line fits exactly, correlation carries no sign
        return Some(Fit {
            r: 0.0,
            slope: 0.0,
            intercept: mean_y,
        });
    }

    let r = c / (stdv_x * stdv_y);
    let slope = r * (stdv_y / stdv_x);
    let intercept = mean_y - slope * mean_x;

    Some(Fit {
        r,
        slope,
        intercept,
    })
}
