//! Linear algebra utilities
//!
//! - [`svd3`]: Analytical 3×3 SVD decomposition (Jacobi eigenvalue method)
//! - [`mat3`]: 3×3 row-major matrix operations (determinant, multiply, rotate)

pub mod mat3;
pub mod svd3;

pub use mat3::{
    det3, distance_squared, is_orthonormal, mul3, rotate_point, translate_point, transpose3,
    Mat3, IDENTITY3,
};
pub use svd3::{svd3, Svd3};
