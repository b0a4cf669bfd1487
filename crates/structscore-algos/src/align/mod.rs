//! Rigid-body superposition
//!
//! - Kabsch algorithm with proper-rotation correction
//! - Template superposition: fit on a subset, apply to full point sets

pub mod kabsch;
mod superpose;

pub use kabsch::{centroid, kabsch, kabsch_rotation, RotationFit, Transform};
pub use superpose::{
    fit_on_subset, full_rmsd, squared_deviations, subset_rmsd, template_alignment,
    TemplateAlignment,
};
