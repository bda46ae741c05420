/// Failures surfaced by the treemap solver and its configuration.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreemapError {
    /// The diagram builder returned fewer cells than sites: at least one site
    /// collapsed to an empty cell.
    #[error("degenerate diagram at iteration {iteration}: {cells} cells for {sites} sites")]
    DegenerateDiagram {
        sites: usize,
        cells: usize,
        iteration: usize,
    },
    #[error("convergence ratio must be finite and non-negative, got {0}")]
    InvalidConvergenceRatio(f64),
    #[error("minimum weight ratio must be within [0, 1], got {0}")]
    InvalidMinWeightRatio(f64),
    #[error("epsilon must be finite and positive, got {0}")]
    InvalidEpsilon(f64),
    #[error("flickering history capacity must be positive, got {0}")]
    InvalidCapacity(usize),
    #[error("total area must be finite and positive, got {0}")]
    InvalidTotalArea(f64),
    /// The clip input has no convex hull with a positive area.
    #[error("clip polygon is degenerate: {reason}")]
    InvalidClip { reason: String },
    #[error("no point inside the clip polygon found after {attempts} attempts")]
    NoInteriorPoint { attempts: usize },
    #[error("cannot compute a treemap without sites")]
    NoSites,
    #[error("invalid weight for item {index}: {weight}")]
    InvalidWeights { index: usize, weight: f64 },
}

pub type Result<T> = std::result::Result<T, TreemapError>;
