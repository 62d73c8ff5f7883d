//! One-dimensional interpolation of sample values over sample indices.
//!
//! This module defines the [`Interpolator`] trait for pluggable fitting
//! schemes and the [`InterpolatorKind`] enum for runtime selection.
//! Both schemes produce a [`PiecewiseCubic`]: a chain of cubic
//! polynomials, one per knot interval, that passes exactly through every
//! knot and extends its first and last pieces for extrapolation.
//!
//! The cubic scheme is a not-a-knot spline. Its third derivative is
//! continuous across the second and second-to-last knots, so with
//! exactly four knots it is the single cubic through them. With fewer
//! knots it degrades to the lower-order fit the scheme admits: three
//! knots give the parabola through them and two give a straight line.

use serde::{Deserialize, Serialize};

/// Minimum number of knots required to fit any interpolant.
pub const MIN_KNOTS: usize = 2;

/// Selects which interpolation scheme to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolatorKind {
    /// Not-a-knot cubic spline, C2-continuous across knots.
    #[default]
    Cubic,

    /// Straight segments between consecutive knots.
    ///
    /// Extrapolates along the first and last segments.
    Linear,
}

impl std::fmt::Display for InterpolatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cubic => f.write_str("cubic"),
            Self::Linear => f.write_str("linear"),
        }
    }
}

/// Trait for interpolation schemes.
///
/// Input: strictly increasing knot positions and their values.
/// Output: an interpolant that can be evaluated anywhere on the real line.
pub trait Interpolator {
    /// Fit an interpolant through the knots.
    ///
    /// Returns `None` if fewer than [`MIN_KNOTS`] knots are given, if the
    /// slices differ in length, or if `xs` is not strictly increasing.
    fn fit(&self, xs: &[f64], ys: &[f64]) -> Option<PiecewiseCubic>;
}

impl Interpolator for InterpolatorKind {
    fn fit(&self, xs: &[f64], ys: &[f64]) -> Option<PiecewiseCubic> {
        if !valid_knots(xs, ys) {
            return None;
        }
        let second_derivatives = match *self {
            Self::Cubic => not_a_knot_second_derivatives(xs, ys),
            Self::Linear => vec![0.0; xs.len()],
        };
        Some(PiecewiseCubic {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            second_derivatives,
        })
    }
}

fn valid_knots(xs: &[f64], ys: &[f64]) -> bool {
    xs.len() >= MIN_KNOTS && xs.len() == ys.len() && xs.windows(2).all(|w| w[0] < w[1])
}

/// A fitted piecewise-cubic interpolant.
///
/// Stored as knots plus the second derivative at each knot, which fully
/// determines each cubic piece. All-zero second derivatives describe a
/// piecewise-linear interpolant.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseCubic {
    xs: Vec<f64>,
    ys: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl PiecewiseCubic {
    /// Knot positions.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.xs
    }

    /// Evaluate the interpolant at `x`.
    ///
    /// Positions before the first knot use the first piece and positions
    /// after the last knot use the last piece.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let last_piece = self.xs.len() - 2;
        // Number of knots at or below x, minus one, clamped to a valid piece.
        let piece = self
            .xs
            .partition_point(|&k| k <= x)
            .saturating_sub(1)
            .min(last_piece);

        let x0 = self.xs[piece];
        let h = self.xs[piece + 1] - x0;
        let y0 = self.ys[piece];
        let y1 = self.ys[piece + 1];
        let m0 = self.second_derivatives[piece];
        let m1 = self.second_derivatives[piece + 1];

        let t = x - x0;
        let slope = (y1 - y0) / h - h * 2.0f64.mul_add(m0, m1) / 6.0;
        let curvature = m0 / 2.0;
        let jerk = (m1 - m0) / (6.0 * h);

        // Horner form of y0 + slope*t + curvature*t^2 + jerk*t^3.
        jerk.mul_add(t, curvature).mul_add(t, slope).mul_add(t, y0)
    }
}

/// Second derivatives at each knot for the not-a-knot cubic spline.
///
/// Callers guarantee at least two strictly increasing knots.
fn not_a_knot_second_derivatives(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    match n {
        0..=2 => vec![0.0; n],
        3 => {
            // Both not-a-knot conditions collapse onto the middle knot,
            // leaving the parabola through all three points.
            let h0 = xs[1] - xs[0];
            let h1 = xs[2] - xs[1];
            let divided = ((ys[2] - ys[1]) / h1 - (ys[1] - ys[0]) / h0) / (h0 + h1);
            vec![2.0 * divided; 3]
        }
        _ => solve_not_a_knot(xs, ys),
    }
}

/// Solve for knot second derivatives with four or more knots.
///
/// The interior continuity equations for `M[1..n-1]` are
///
/// ```text
/// h[i-1] M[i-1] + 2 (h[i-1] + h[i]) M[i] + h[i] M[i+1] = r[i]
/// ```
///
/// The not-a-knot conditions express `M[0]` in terms of `M[1], M[2]`
/// and `M[n-1]` in terms of `M[n-3], M[n-2]`; substituting them into
/// the first and last interior rows keeps the system tridiagonal, so it
/// is solved with the Thomas algorithm.
fn solve_not_a_knot(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let slopes: Vec<f64> = ys
        .windows(2)
        .zip(&h)
        .map(|(w, &hi)| (w[1] - w[0]) / hi)
        .collect();

    // Unknowns M[1..=n-2], stored at offset 0..m.
    let m = n - 2;
    let mut sub = vec![0.0; m];
    let mut diag = vec![0.0; m];
    let mut sup = vec![0.0; m];
    let mut rhs = vec![0.0; m];

    for row in 0..m {
        let i = row + 1;
        sub[row] = h[i - 1];
        diag[row] = 2.0 * (h[i - 1] + h[i]);
        sup[row] = h[i];
        rhs[row] = 6.0 * (slopes[i] - slopes[i - 1]);
    }

    // M[0] = ((h0 + h1) M[1] - h0 M[2]) / h1
    let (h0, h1) = (h[0], h[1]);
    diag[0] += h0 * (h0 + h1) / h1;
    sup[0] -= h0 * h0 / h1;
    sub[0] = 0.0;

    // M[n-1] = ((ha + hb) M[n-2] - hb M[n-3]) / ha, ha = h[n-3], hb = h[n-2]
    let (ha, hb) = (h[n - 3], h[n - 2]);
    diag[m - 1] += hb * (ha + hb) / ha;
    sub[m - 1] -= hb * hb / ha;
    sup[m - 1] = 0.0;

    let interior = thomas(&sub, &diag, &sup, &rhs);

    // m >= 2 here, so interior[1] and interior[m - 2] exist.
    let mut second = Vec::with_capacity(n);
    second.push((h0 + h1).mul_add(interior[0], -h0 * interior[1]) / h1);
    second.extend_from_slice(&interior);
    second.push((ha + hb).mul_add(interior[m - 1], -hb * interior[m - 2]) / ha);
    second
}

/// Solve a tridiagonal system.
///
/// `sub[0]` and `sup[len - 1]` are ignored.
fn thomas(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let len = diag.len();
    let mut c = vec![0.0; len];
    let mut d = vec![0.0; len];

    c[0] = sup[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..len {
        let denom = sub[i].mul_add(-c[i - 1], diag[i]);
        c[i] = sup[i] / denom;
        d[i] = sub[i].mul_add(-d[i - 1], rhs[i]) / denom;
    }

    let mut x = vec![0.0; len];
    x[len - 1] = d[len - 1];
    for i in (0..len - 1).rev() {
        x[i] = c[i].mul_add(-x[i + 1], d[i]);
    }
    x
}
