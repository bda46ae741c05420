pub mod flicker;
pub mod hierarchy;
pub mod overweight;
pub mod relax;
pub mod solver;

use crate::geometry::power::PowerSite;
use crate::geometry::Point;

pub use flicker::FlickeringTracker;
pub use hierarchy::VoronoiTreemap;
pub use overweight::OverweightStrategy;
pub use relax::{Adaptation, PlacementAdaptation, WeightAdaptation};
pub use solver::{Solution, SolverConfig, TreemapSolver, Weighted};

/// A weighted point driving one cell of the treemap.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    /// Position of the originating item in the solver's input.
    pub index: usize,
    pub position: Point,
    /// Power-diagram weight, always at least the solver's epsilon after the
    /// first weight adaptation.
    pub weight: f64,
    /// Area the site's cell converges to: `total_area * w / sum(w)`.
    pub target_area: f64,
}

impl PowerSite for Site {
    fn position(&self) -> Point {
        self.position
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}
