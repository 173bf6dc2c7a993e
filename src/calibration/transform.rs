//! Physical-to-virtual coordinate transform.
//!
//! The touched surface is (approximately) a plane in sensor space, so the
//! mapping from physical x/y to projected-screen pixels is a planar
//! projective homography. It is fit from the calibration pairs with a
//! normalized DLT and applied per frame to every contact point.

use nalgebra::{DMatrix, Matrix3, Vector3};

use super::points::{CalibrationError, CalibrationPointSet};
use crate::geometry::{Coord2D, Coord3D};

/// Fewest correspondences that determine a homography.
const MIN_POINTS: usize = 4;

/// Homography mapping physical sensor x/y onto virtual screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    h: Matrix3<f64>,
}

impl Transform {
    /// Fit a transform from a fully populated calibration point set.
    ///
    /// Fails when the table is not fully populated, has fewer than four
    /// targets, or the physical samples are coincident/collinear (the user
    /// tapped the same spot for several targets, or the sensor saw a
    /// degenerate plane edge-on).
    pub fn fit(points: &CalibrationPointSet) -> Result<Self, CalibrationError> {
        let expected = points.len().max(MIN_POINTS);
        if points.len() < MIN_POINTS || !points.is_complete() {
            return Err(CalibrationError::InsufficientPoints {
                expected,
                actual: points.filled(),
            });
        }

        let physical: Vec<(f64, f64)> = points
            .physical()
            .iter()
            .map(|p| (p.x as f64, p.y as f64))
            .collect();
        let virtual_: Vec<(f64, f64)> = points
            .virtual_points()
            .iter()
            .map(|v| (v.x as f64, v.y as f64))
            .collect();

        if is_degenerate(&physical) {
            return Err(CalibrationError::DegeneratePoints);
        }

        let (src, t_src) = normalize(&physical);
        let (dst, t_dst) = normalize(&virtual_);

        // DLT system: two rows per correspondence, Ah = 0.
        let n = src.len();
        let mut a = DMatrix::<f64>::zeros(2 * n, 9);
        for k in 0..n {
            let (x, y) = src[k];
            let (u, v) = dst[k];

            a[(2 * k, 0)] = -x;
            a[(2 * k, 1)] = -y;
            a[(2 * k, 2)] = -1.0;
            a[(2 * k, 6)] = u * x;
            a[(2 * k, 7)] = u * y;
            a[(2 * k, 8)] = u;

            a[(2 * k + 1, 3)] = -x;
            a[(2 * k + 1, 4)] = -y;
            a[(2 * k + 1, 5)] = -1.0;
            a[(2 * k + 1, 6)] = v * x;
            a[(2 * k + 1, 7)] = v * y;
            a[(2 * k + 1, 8)] = v;
        }

        // h spans the null direction of A: the eigenvector of A^T A with
        // the smallest eigenvalue. Exact for minimal 4-point systems and
        // least-squares for overdetermined ones.
        let ata = a.transpose() * &a;
        let eigen = ata.symmetric_eigen();
        let mut min_idx = 0;
        for i in 1..eigen.eigenvalues.len() {
            if eigen.eigenvalues[i] < eigen.eigenvalues[min_idx] {
                min_idx = i;
            }
        }
        let h = eigen.eigenvectors.column(min_idx).clone_owned();
        let hn =
            Matrix3::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);

        // Undo the normalization: H = T_dst^-1 * Hn * T_src.
        let t_dst_inv = t_dst
            .try_inverse()
            .ok_or(CalibrationError::DegeneratePoints)?;
        let h = t_dst_inv * hn * t_src;

        let scale = h[(2, 2)];
        if scale.abs() < 1e-12 {
            return Err(CalibrationError::DegeneratePoints);
        }

        Ok(Self { h: h / scale })
    }

    /// Map a physical contact point to virtual screen coordinates.
    ///
    /// Pure and total: points outside the calibrated region extrapolate
    /// along the same homography, and a vanishing homogeneous coordinate is
    /// guarded rather than divided through. Callers clamp to screen bounds.
    pub fn apply(&self, physical: Coord3D) -> Coord2D {
        let v = self.h * Vector3::new(physical.x as f64, physical.y as f64, 1.0);
        let mut w = v[2];
        if w.abs() < 1e-9 {
            w = if w.is_sign_negative() { -1e-9 } else { 1e-9 };
        }
        Coord2D::new((v[0] / w).round() as i32, (v[1] / w).round() as i32)
    }
}

/// Hartley normalization: translate to the centroid and scale so the mean
/// distance from it is sqrt(2).
fn normalize(points: &[(f64, f64)]) -> (Vec<(f64, f64)>, Matrix3<f64>) {
    let n = points.len() as f64;
    let (mut cx, mut cy) = (0.0, 0.0);
    for (x, y) in points {
        cx += x;
        cy += y;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0;
    for (x, y) in points {
        let (dx, dy) = (x - cx, y - cy);
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    let s = if mean_dist > 1e-12 {
        2.0_f64.sqrt() / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let normalized = points
        .iter()
        .map(|&(x, y)| (s * (x - cx), s * (y - cy)))
        .collect();
    (normalized, t)
}

/// Coincident or collinear physical samples cannot pin down a homography.
/// Checked via the smaller eigenvalue of the x/y covariance matrix.
fn is_degenerate(points: &[(f64, f64)]) -> bool {
    let n = points.len() as f64;
    let (mut cx, mut cy) = (0.0, 0.0);
    for (x, y) in points {
        cx += x;
        cy += y;
    }
    cx /= n;
    cy /= n;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        let (dx, dy) = (x - cx, y - cy);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    // Smaller eigenvalue of [[sxx, sxy], [sxy, syy]].
    let trace = sxx + syy;
    let det = sxx * syy - sxy * sxy;
    let lambda_min = trace / 2.0 - ((trace / 2.0).powi(2) - det).max(0.0).sqrt();

    lambda_min < 1e-6 * n
}
