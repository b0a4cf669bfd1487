//! 3×3 row-major matrix utilities
//!
//! Rotations returned by the superposition engine are plain `[[f64; 3]; 3]`
//! arrays indexed `m[row][col]`, applied to column vectors (`R · p`).

use lin_alg::f64::Vec3;

/// Row-major 3×3 matrix: `m[row][col]`
pub type Mat3 = [[f64; 3]; 3];

/// The 3×3 identity matrix
pub const IDENTITY3: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Determinant by cofactor expansion along the first row
pub fn det3(m: &Mat3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

pub fn transpose3(m: &Mat3) -> Mat3 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Matrix product `a · b`
pub fn mul3(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0f64; 3]; 3];
    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, value) in out_row.iter_mut().enumerate() {
            *value = a[row][0] * b[0][col] + a[row][1] * b[1][col] + a[row][2] * b[2][col];
        }
    }
    out
}

/// Rotate a point: `m · p`
pub fn rotate_point(m: &Mat3, p: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * p[0] + m[0][1] * p[1] + m[0][2] * p[2],
        m[1][0] * p[0] + m[1][1] * p[1] + m[1][2] * p[2],
        m[2][0] * p[0] + m[2][1] * p[1] + m[2][2] * p[2],
    ]
}

/// Subtract an offset vector from a point
pub fn translate_point(p: [f64; 3], offset: Vec3) -> [f64; 3] {
    [p[0] - offset.x, p[1] - offset.y, p[2] - offset.z]
}

/// Squared Euclidean distance between two points
pub fn distance_squared(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Check that `mᵀ·m` is the identity within `tol`
pub fn is_orthonormal(m: &Mat3, tol: f64) -> bool {
    let prod = mul3(&transpose3(m), m);
    prod.iter().enumerate().all(|(i, row)| {
        row.iter()
            .enumerate()
            .all(|(j, &v)| (v - if i == j { 1.0 } else { 0.0 }).abs() < tol)
    })
}
