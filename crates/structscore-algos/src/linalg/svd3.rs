//! Analytical 3×3 SVD decomposition
//!
//! Computes A = U · diag(S) · Vᵀ for a 3×3 matrix using the Jacobi
//! eigenvalue algorithm on AᵀA (symmetric positive semi-definite).
//!
//! All matrices use column-major layout: `m[col][row]`.
//!
//! Unlike a "signed" SVD, U is never flipped to be right-handed when A has
//! full rank: det(U·Vᵀ) carries the sign of det(A), which is what the Kabsch
//! reflection check relies on.

/// Result of 3×3 SVD decomposition: A = U · diag(S) · Vᵀ
#[derive(Debug, Clone, Copy)]
pub struct Svd3 {
    /// Left singular vectors (3×3 orthogonal matrix, column-major: u[col][row])
    pub u: [[f64; 3]; 3],
    /// Singular values (sorted descending, non-negative)
    pub s: [f64; 3],
    /// Right singular vectors transposed (3×3 matrix, column-major: vt[col][row])
    pub vt: [[f64; 3]; 3],
}

/// Relative threshold below which a singular value is treated as zero
const RANK_EPS: f64 = 1e-10;

/// Compute SVD of a 3×3 matrix (column-major: matrix[col][row])
pub fn svd3(a: &[[f64; 3]; 3]) -> Svd3 {
    // 1. AᵀA (symmetric positive semi-definite)
    let ata = mat_mul_ata(a);

    // 2. Jacobi eigendecomposition of AᵀA → eigenvalues and eigenvectors
    let (eigenvalues, eigvec_cols) = jacobi_eigen_3x3(&ata);

    // 3. Sort by descending eigenvalue, compute singular values
    let mut order = [0usize, 1, 2];
    if eigenvalues[order[0]] < eigenvalues[order[1]] { order.swap(0, 1); }
    if eigenvalues[order[0]] < eigenvalues[order[2]] { order.swap(0, 2); }
    if eigenvalues[order[1]] < eigenvalues[order[2]] { order.swap(1, 2); }

    let sigma = [
        eigenvalues[order[0]].max(0.0).sqrt(),
        eigenvalues[order[1]].max(0.0).sqrt(),
        eigenvalues[order[2]].max(0.0).sqrt(),
    ];
    let mut v_cols = [eigvec_cols[order[0]], eigvec_cols[order[1]], eigvec_cols[order[2]]];

    // V right-handed; U follows from A·v_i so the overall sign is preserved
    if triple_product(&v_cols[0], &v_cols[1], &v_cols[2]) < 0.0 {
        v_cols[2] = scale(&v_cols[2], -1.0);
    }

    let eps = (sigma[0] * RANK_EPS).max(1e-300);

    // 4. U columns: u_i = A · v_i / sigma_i, completed for rank-deficient input
    let mut u_cols = [[0.0f64; 3]; 3];
    if sigma[0] <= eps {
        u_cols = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    } else {
        u_cols[0] = scale(&mat_vec_mul(a, &v_cols[0]), 1.0 / sigma[0]);
        normalize(&mut u_cols[0]);

        if sigma[1] > eps {
            let mut u1 = scale(&mat_vec_mul(a, &v_cols[1]), 1.0 / sigma[1]);
            // Gram-Schmidt against u0 to absorb round-off
            let proj = dot(&u1, &u_cols[0]);
            u1 = sub(&u1, &scale(&u_cols[0], proj));
            normalize(&mut u1);
            u_cols[1] = u1;
        } else {
            u_cols[1] = arbitrary_perpendicular(&u_cols[0]);
        }

        // Third column from the cross product, oriented along A·v_2 when that
        // direction is resolvable
        let mut u2 = cross(&u_cols[0], &u_cols[1]);
        normalize(&mut u2);
        if sigma[2] > eps {
            let av = mat_vec_mul(a, &v_cols[2]);
            if dot(&av, &u2) < 0.0 {
                u2 = scale(&u2, -1.0);
            }
        }
        u_cols[2] = u2;
    }

    // 5. Column-major output
    // U: u_out[col][row] = u_cols[col][row]
    // Vᵀ: vt[col][row] = (Vᵀ)_{row,col} = V_{col,row} = v_cols[row][col]
    let vt = [
        [v_cols[0][0], v_cols[1][0], v_cols[2][0]],
        [v_cols[0][1], v_cols[1][1], v_cols[2][1]],
        [v_cols[0][2], v_cols[1][2], v_cols[2][2]],
    ];

    Svd3 { u: u_cols, s: sigma, vt }
}

// ============================================================================
// Internal helpers
// ============================================================================

/// Compute AᵀA where A is column-major. Result is column-major symmetric.
fn mat_mul_ata(a: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    // (AᵀA)_{ij} = dot(col_i, col_j)
    let mut result = [[0.0f64; 3]; 3];
    for col in 0..3 {
        for row in 0..3 {
            result[col][row] = dot(&a[row], &a[col]);
        }
    }
    result
}

/// Multiply column-major matrix A by vector v: result = A · v
fn mat_vec_mul(a: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [
        a[0][0] * v[0] + a[1][0] * v[1] + a[2][0] * v[2],
        a[0][1] * v[0] + a[1][1] * v[1] + a[2][1] * v[2],
        a[0][2] * v[0] + a[1][2] * v[1] + a[2][2] * v[2],
    ]
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn scale(a: &[f64; 3], k: f64) -> [f64; 3] {
    [a[0] * k, a[1] * k, a[2] * k]
}

fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn triple_product(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> f64 {
    dot(a, &cross(b, c))
}

fn normalize(v: &mut [f64; 3]) {
    let len = dot(v, v).sqrt();
    if len > 1e-300 {
        v[0] /= len;
        v[1] /= len;
        v[2] /= len;
    }
}

fn arbitrary_perpendicular(v: &[f64; 3]) -> [f64; 3] {
    let candidate = if v[0].abs() < v[1].abs() && v[0].abs() < v[2].abs() {
        [1.0, 0.0, 0.0]
    } else if v[1].abs() < v[2].abs() {
        [0.0, 1.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };
    let mut perp = cross(v, &candidate);
    normalize(&mut perp);
    perp
}

/// Jacobi eigenvalue algorithm for 3×3 symmetric matrices.
///
/// Returns (eigenvalues, eigenvector_columns).
fn jacobi_eigen_3x3(m: &[[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    // Row-major working copy for the rotations
    let mut a = [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ];

    let mut v = [
        [1.0f64, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];

    let diag_scale = a[0][0].abs() + a[1][1].abs() + a[2][2].abs();
    let threshold = (diag_scale * 1e-17).powi(2).max(1e-300);

    for _ in 0..64 {
        let off = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
        if off <= threshold {
            break;
        }

        for &(p, q) in &[(0usize, 1usize), (0, 2), (1, 2)] {
            if a[p][q] == 0.0 {
                continue;
            }
            jacobi_rotate(&mut a, &mut v, p, q);
        }
    }

    let eigenvalues = [a[0][0], a[1][1], a[2][2]];

    // v is row-major: column j = [v[0][j], v[1][j], v[2][j]]
    let eigvec_cols = [
        [v[0][0], v[1][0], v[2][0]],
        [v[0][1], v[1][1], v[2][1]],
        [v[0][2], v[1][2], v[2][2]],
    ];

    (eigenvalues, eigvec_cols)
}

/// Apply a single Jacobi rotation to eliminate a[p][q].
fn jacobi_rotate(a: &mut [[f64; 3]; 3], v: &mut [[f64; 3]; 3], p: usize, q: usize) {
    let app = a[p][p];
    let aqq = a[q][q];
    let apq = a[p][q];

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };
    let c = 1.0 / (1.0 + t * t).sqrt();
    let s = t * c;

    // A' = GᵀAG with G the Givens rotation in the (p,q) plane
    a[p][p] = app - t * apq;
    a[q][q] = aqq + t * apq;
    a[p][q] = 0.0;
    a[q][p] = 0.0;

    let r = 3 - p - q;
    let arp = a[r][p];
    let arq = a[r][q];
    a[r][p] = c * arp - s * arq;
    a[p][r] = a[r][p];
    a[r][q] = s * arp + c * arq;
    a[q][r] = a[r][q];

    // V' = V · G
    for row in v.iter_mut() {
        let vip = row[p];
        let viq = row[q];
        row[p] = c * vip - s * viq;
        row[q] = s * vip + c * viq;
    }
}
