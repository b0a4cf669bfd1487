//! Structure superposition and alignment scoring
//!
//! This crate scores a residue correspondence between two Cα chains:
//! - Analytical 3×3 SVD and the Kabsch algorithm with proper-rotation correction
//! - Seed-and-extend MaxSub / TM-score search for the best sub-alignment
//! - Standard quality metrics (TM-score, PSI and run-filtered variants,
//!   RMSDs, sequence identities) for a chosen superposition

pub mod align;
pub mod linalg;
pub mod maxsub;
pub mod metrics;

mod correspondence;
mod error;
mod serde_helpers;

pub use align::{kabsch, template_alignment, TemplateAlignment, Transform};
pub use correspondence::Correspondence;
pub use error::{ScoreError, ScoreResult};
pub use maxsub::{refine, tm_d0, tm_score, Advisory, RefineParams, Refinement, ScoredCandidate};
pub use metrics::{
    long_run_positions, metrics_for_candidate, run_length_psi, standard_metrics, MetricsParams,
    MetricsRecord, NO_LABELS,
};
