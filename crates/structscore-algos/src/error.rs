//! Error types for superposition and alignment scoring

use thiserror::Error;

/// Errors from superposition, refinement and metric computation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// Coordinate or index arrays that must pair up have different lengths
    #[error("Arrays have different lengths: {0} vs {1}")]
    LengthMismatch(usize, usize),

    /// Superposition needs at least three point pairs
    #[error("Not enough points for superposition (need at least 3, got {0})")]
    TooFewPoints(usize),

    /// The shorter chain is too short for the TM-score distance scale
    #[error("Shorter chain has {l_min} residues, need more than 9")]
    ChainTooShort { l_min: usize },

    /// A correspondence entry points past the end of its chain
    #[error("Correspondence position {position} maps to residue {index} of chain {chain}, which has {len} residues")]
    PairOutOfBounds {
        position: usize,
        chain: usize,
        index: usize,
        len: usize,
    },

    /// A subset index points past the end of the correspondence
    #[error("Subset index {index} is out of bounds for a correspondence of length {len}")]
    SubsetOutOfBounds { index: usize, len: usize },

    /// Per-residue labels don't cover their chain
    #[error("Chain {chain} has {expected} residues but {actual} labels")]
    LabelLengthMismatch {
        chain: usize,
        expected: usize,
        actual: usize,
    },

    /// Parameter set rejected by validation
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Correspondence too short to place a single seed fragment
    #[error("Correspondence of length {pairs} leaves no seed window for fragment size {fragment_size}")]
    NoSeedWindows { pairs: usize, fragment_size: usize },

    /// Every seed fragment exceeded the RMSD tolerance
    #[error("No seed fragment fits within the RMSD tolerance of {tolerance}")]
    NoAcceptedSeed { tolerance: f64 },

    /// Re-fitting the winning subset does not reproduce the tracked TM-score
    #[error("Tracked TM-score {tracked} disagrees with re-fitted TM-score {recomputed}")]
    InconsistentScore { tracked: f64, recomputed: f64 },
}

/// Result type for scoring operations
pub type ScoreResult<T> = Result<T, ScoreError>;
