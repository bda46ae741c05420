// Public library interface for voronoi-treemap
// The CLI and the debug-layout tool both build on these modules

pub mod error;
pub mod geometry;
pub mod layout;
pub mod tree;

pub use error::{Result, TreemapError};
pub use geometry::power::{Cell, DiagramBuilder, PowerDiagram};
pub use geometry::{ClipPolygon, Point, Polygon};
pub use layout::hierarchy::LayoutSummary;
pub use layout::{Solution, SolverConfig, TreemapSolver, VoronoiTreemap, Weighted};
pub use tree::arena::{NodeId, WeightNode, WeightTree};
