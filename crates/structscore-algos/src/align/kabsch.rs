//! Kabsch algorithm for optimal rigid-body superposition
//!
//! Given two sets of corresponding 3D points, finds the rotation and
//! translation that minimizes the sum of squared distances after rotating
//! the second set onto the first.
//!
//! Conventions: H = P₁ᵀ·P₂ = U·diag(w)·Vᵀ, R = U·Vᵀ, and a point `q` of the
//! second set maps to `R · (q − offset_second)`, to be compared with
//! `p − offset_first`.

use lin_alg::f64::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ScoreError, ScoreResult};
use crate::linalg::{det3, rotate_point, svd3, translate_point, Mat3, IDENTITY3};

/// Centroids closer to the origin than this are treated as already centered
const CENTERED_EPS: f64 = 1e-16;

/// Rotation part of a superposition
#[derive(Debug, Clone, Copy)]
pub struct RotationFit {
    /// Proper rotation (det = +1), row-major
    pub rotation: Mat3,
    /// Singular values of the cross-covariance matrix, descending
    pub singular_values: [f64; 3],
    /// −1 when the unconstrained optimum was a reflection and got corrected
    pub sign: f64,
}

/// Full rigid-body superposition of the second point set onto the first
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Transform {
    /// Proper rotation (det = +1), row-major
    pub rotation: Mat3,
    /// Singular values of the cross-covariance matrix, descending
    pub singular_values: [f64; 3],
    /// −1 when a reflection was corrected, +1 otherwise
    pub sign: f64,
    /// Centroid of the fitted first point set
    #[serde(with = "crate::serde_helpers::vec3_serde")]
    pub offset_first: Vec3,
    /// Centroid of the fitted second point set
    #[serde(with = "crate::serde_helpers::vec3_serde")]
    pub offset_second: Vec3,
}

impl Transform {
    /// No rotation, no translation
    pub fn identity() -> Self {
        Self {
            rotation: IDENTITY3,
            singular_values: [0.0; 3],
            sign: 1.0,
            offset_first: Vec3::new(0.0, 0.0, 0.0),
            offset_second: Vec3::new(0.0, 0.0, 0.0),
        }
    }

    /// Move a first-chain point into the superposition frame
    pub fn apply_first(&self, p: [f64; 3]) -> [f64; 3] {
        translate_point(p, self.offset_first)
    }

    /// Move a second-chain point into the superposition frame
    pub fn apply_second(&self, p: [f64; 3]) -> [f64; 3] {
        rotate_point(&self.rotation, translate_point(p, self.offset_second))
    }

    /// Determinant of the rotation
    pub fn determinant(&self) -> f64 {
        det3(&self.rotation)
    }
}

/// Mean of a point set
pub fn centroid(points: &[[f64; 3]]) -> Vec3 {
    let n = points.len().max(1) as f64;
    let mut c = [0.0f64; 3];
    for p in points {
        for k in 0..3 {
            c[k] += p[k];
        }
    }
    Vec3::new(c[0] / n, c[1] / n, c[2] / n)
}

/// Optimal rotation between two matched point sets.
///
/// When `center` is set, each set is moved to its centroid unless the
/// centroid is already at the origin. The inputs are never modified; any
/// centering happens on owned copies.
pub fn kabsch_rotation(
    first: &[[f64; 3]],
    second: &[[f64; 3]],
    center: bool,
) -> ScoreResult<RotationFit> {
    let n = first.len();
    if n != second.len() {
        return Err(ScoreError::LengthMismatch(n, second.len()));
    }
    if n < 3 {
        return Err(ScoreError::TooFewPoints(n));
    }

    let mut p1 = first.to_vec();
    let mut p2 = second.to_vec();
    if center {
        center_in_place(&mut p1);
        center_in_place(&mut p2);
    }

    // Cross-covariance H = P₁ᵀ·P₂, column-major: h[col][row] = Σ p1[row]·p2[col]
    let mut h = [[0.0f64; 3]; 3];
    for (a, b) in p1.iter().zip(p2.iter()) {
        for col in 0..3 {
            for row in 0..3 {
                h[col][row] += a[row] * b[col];
            }
        }
    }

    let svd = svd3(&h);

    let mut rotation = compose_rotation(&svd.u, &svd.vt, 1.0);
    let sign = if det3(&rotation) < 0.0 { -1.0 } else { 1.0 };
    if sign < 0.0 {
        // Best proper rotation: flip the direction of the smallest singular value
        rotation = compose_rotation(&svd.u, &svd.vt, -1.0);
    }

    Ok(RotationFit {
        rotation,
        singular_values: svd.s,
        sign,
    })
}

/// Superpose `second` onto `first`, returning rotation and both centroids.
pub fn kabsch(first: &[[f64; 3]], second: &[[f64; 3]]) -> ScoreResult<Transform> {
    if first.len() != second.len() {
        return Err(ScoreError::LengthMismatch(first.len(), second.len()));
    }
    let offset_first = centroid(first);
    let offset_second = centroid(second);
    let p1: Vec<[f64; 3]> = first.iter().map(|&p| translate_point(p, offset_first)).collect();
    let p2: Vec<[f64; 3]> = second.iter().map(|&p| translate_point(p, offset_second)).collect();

    let fit = kabsch_rotation(&p1, &p2, false)?;

    Ok(Transform {
        rotation: fit.rotation,
        singular_values: fit.singular_values,
        sign: fit.sign,
        offset_first,
        offset_second,
    })
}

fn center_in_place(points: &mut [[f64; 3]]) {
    let c = centroid(points);
    if c.x.abs() > CENTERED_EPS || c.y.abs() > CENTERED_EPS || c.z.abs() > CENTERED_EPS {
        for p in points.iter_mut() {
            *p = translate_point(*p, c);
        }
    }
}

/// R = U · diag(1, 1, last) · Vᵀ from column-major SVD factors, row-major out
fn compose_rotation(u: &[[f64; 3]; 3], vt: &[[f64; 3]; 3], last: f64) -> Mat3 {
    let diag = [1.0, 1.0, last];
    let mut rot = [[0.0f64; 3]; 3];
    for (i, rot_row) in rot.iter_mut().enumerate() {
        for (j, value) in rot_row.iter_mut().enumerate() {
            // U_ik = u[k][i], (Vᵀ)_kj = vt[j][k]
            *value = (0..3).map(|k| u[k][i] * diag[k] * vt[j][k]).sum();
        }
    }
    rot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{distance_squared, is_orthonormal};

    fn tetrahedron() -> Vec<[f64; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ]
    }

    fn fitted_rmsd(first: &[[f64; 3]], second: &[[f64; 3]], t: &Transform) -> f64 {
        let sum: f64 = first
            .iter()
            .zip(second.iter())
            .map(|(&a, &b)| distance_squared(&t.apply_first(a), &t.apply_second(b)))
            .sum();
        (sum / first.len() as f64).sqrt()
    }

    fn rotate_about_axis(points: &[[f64; 3]], axis: [f64; 3], angle: f64) -> Vec<[f64; 3]> {
        let norm = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        let [x, y, z] = [axis[0] / norm, axis[1] / norm, axis[2] / norm];
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let r = [
            [t * x * x + c, t * x * y - s * z, t * x * z + s * y],
            [t * x * y + s * z, t * y * y + c, t * y * z - s * x],
            [t * x * z - s * y, t * y * z + s * x, t * z * z + c],
        ];
        points.iter().map(|&p| rotate_point(&r, p)).collect()
    }

    #[test]
    fn test_identity_case() {
        let points = tetrahedron();
        let t = kabsch(&points, &points).unwrap();
        assert!(fitted_rmsd(&points, &points, &t) < 1e-9);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (t.rotation[i][j] - expected).abs() < 1e-9,
                    "R[{}][{}] = {}",
                    i, j, t.rotation[i][j]
                );
            }
        }
        assert_eq!(t.sign, 1.0);
    }

    #[test]
    fn test_pure_translation() {
        let first = tetrahedron();
        let second: Vec<[f64; 3]> = first.iter().map(|p| [p[0] + 5.0, p[1] + 3.0, p[2] + 1.0]).collect();
        let t = kabsch(&first, &second).unwrap();
        assert!(fitted_rmsd(&first, &second, &t) < 1e-9);
        let shift = [
            t.offset_second.x - t.offset_first.x,
            t.offset_second.y - t.offset_first.y,
            t.offset_second.z - t.offset_first.z,
        ];
        assert!((shift[0] - 5.0).abs() < 1e-12);
        assert!((shift[1] - 3.0).abs() < 1e-12);
        assert!((shift[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_rotation_recovered() {
        let first = tetrahedron();
        let second = rotate_about_axis(&first, [1.0, 2.0, -0.5], 1.1);
        let t = kabsch(&first, &second).unwrap();
        assert!(fitted_rmsd(&first, &second, &t) < 1e-9, "rmsd should vanish");
        assert!(is_orthonormal(&t.rotation, 1e-9));
        assert!((t.determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflection_is_corrected() {
        // Mirror through the XY plane: the unconstrained optimum is improper
        let first = tetrahedron();
        let second: Vec<[f64; 3]> = first.iter().map(|p| [p[0], p[1], -p[2]]).collect();
        let t = kabsch(&first, &second).unwrap();

        assert_eq!(t.sign, -1.0, "reflection should have been detected");
        assert!((t.determinant() - 1.0).abs() < 1e-9, "det(R) = {}", t.determinant());
        assert!(is_orthonormal(&t.rotation, 1e-9));

        // No worse than another proper rotation (identity after centering)
        let identity = Transform {
            rotation: IDENTITY3,
            ..t
        };
        let best = fitted_rmsd(&first, &second, &t);
        let naive = fitted_rmsd(&first, &second, &identity);
        assert!(best <= naive + 1e-12, "corrected {} vs identity {}", best, naive);
    }

    #[test]
    fn test_already_centered_input_is_left_alone() {
        let raw = tetrahedron();
        let c = centroid(&raw);
        let centered: Vec<[f64; 3]> = raw.iter().map(|&p| translate_point(p, c)).collect();
        let rotated = rotate_about_axis(&centered, [0.0, 0.0, 1.0], 0.4);

        let with_centering = kabsch_rotation(&centered, &rotated, true).unwrap();
        let without = kabsch_rotation(&centered, &rotated, false).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert!((with_centering.rotation[i][j] - without.rotation[i][j]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_inputs_not_modified() {
        let first = tetrahedron();
        let second: Vec<[f64; 3]> = first.iter().map(|p| [p[0] + 2.0, p[1], p[2]]).collect();
        let before = second.clone();
        kabsch_rotation(&first, &second, true).unwrap();
        assert_eq!(second, before);
    }

    #[test]
    fn test_length_mismatch() {
        let a = vec![[0.0; 3]; 5];
        let b = vec![[0.0; 3]; 4];
        assert_eq!(kabsch(&a, &b).unwrap_err(), ScoreError::LengthMismatch(5, 4));
    }

    #[test]
    fn test_too_few_points() {
        let a = vec![[0.0; 3]; 2];
        assert_eq!(kabsch(&a, &a).unwrap_err(), ScoreError::TooFewPoints(2));
    }
}
