use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::solver::{SolverConfig, TreemapSolver};
use crate::error::Result;
use crate::geometry::{ClipPolygon, Polygon};
use crate::tree::arena::{NodeId, WeightNode, WeightTree};

/// Totals over every solve of one hierarchical layout.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutSummary {
    /// Number of nodes whose children were solved.
    pub solves: usize,
    pub iterations: usize,
    pub unconverged: usize,
    /// Worst `normalized_error` among all solves.
    pub max_normalized_error: f64,
}

impl LayoutSummary {
    fn merge(&mut self, other: LayoutSummary) {
        self.solves += other.solves;
        self.iterations += other.iterations;
        self.unconverged += other.unconverged;
        self.max_normalized_error = self.max_normalized_error.max(other.max_normalized_error);
    }
}

/// Polygons computed for one subtree, applied to the tree once all succeeded.
struct Subtree {
    placements: Vec<(NodeId, Polygon)>,
    summary: LayoutSummary,
}

/// Hierarchical Voronoi treemap driver.
///
/// Lays out a [`WeightTree`] in place: every node reachable from the root gets
/// its `polygon` field overwritten. The root receives the configured clip and
/// each node's children partition that node's polygon.
///
/// Every node's solve draws from its own `StdRng`, seeded from its parent's
/// stream, so the sequential and parallel layouts produce identical polygons
/// for the same caller rng.
#[derive(Debug, Clone, Default)]
pub struct VoronoiTreemap {
    config: SolverConfig,
}

impl VoronoiTreemap {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SolverConfig {
        &mut self.config
    }

    /// Lay out with each child weighted by its `value`.
    pub fn layout<R: Rng + ?Sized>(&self, tree: &mut WeightTree, rng: &mut R) -> Result<LayoutSummary> {
        self.layout_by(tree, |node| node.value, rng)
    }

    pub fn layout_by<F, R>(&self, tree: &mut WeightTree, weight: F, rng: &mut R) -> Result<LayoutSummary>
    where
        F: Fn(&WeightNode) -> f64 + Sync,
        R: Rng + ?Sized,
    {
        self.run(tree, &weight, rng, false)
    }

    /// Same result as [`layout`](Self::layout), solving sibling subtrees on
    /// the rayon thread pool.
    pub fn layout_par<R: Rng + ?Sized>(&self, tree: &mut WeightTree, rng: &mut R) -> Result<LayoutSummary> {
        self.layout_par_by(tree, |node| node.value, rng)
    }

    pub fn layout_par_by<F, R>(&self, tree: &mut WeightTree, weight: F, rng: &mut R) -> Result<LayoutSummary>
    where
        F: Fn(&WeightNode) -> f64 + Sync,
        R: Rng + ?Sized,
    {
        self.run(tree, &weight, rng, true)
    }

    fn run<F, R>(&self, tree: &mut WeightTree, weight: &F, rng: &mut R, parallel: bool) -> Result<LayoutSummary>
    where
        F: Fn(&WeightNode) -> f64 + Sync,
        R: Rng + ?Sized,
    {
        tracing::info!(
            "Laying out {} nodes in a clip of area {:.2} (parallel={})",
            tree.len(),
            self.config.clip().area(),
            parallel
        );

        let root_polygon = self.config.clip().vertices().to_vec();
        let subtree = self.solve_subtree(tree, tree.root, root_polygon, rng.random(), weight, parallel)?;

        for (id, polygon) in subtree.placements {
            tree.get_mut(id).polygon = Some(polygon);
        }

        let summary = subtree.summary;
        tracing::info!(
            "Layout finished: {} solves, {} iterations, {} unconverged, worst error {:.4}",
            summary.solves,
            summary.iterations,
            summary.unconverged,
            summary.max_normalized_error
        );
        Ok(summary)
    }

    fn solve_subtree<F>(
        &self,
        tree: &WeightTree,
        node: NodeId,
        polygon: Polygon,
        seed: u64,
        weight: &F,
        parallel: bool,
    ) -> Result<Subtree>
    where
        F: Fn(&WeightNode) -> f64 + Sync,
    {
        let mut subtree = Subtree {
            placements: Vec::new(),
            summary: LayoutSummary::default(),
        };
        if !tree.has_children(node) {
            subtree.placements.push((node, polygon));
            return Ok(subtree);
        }

        let clip = ClipPolygon::new(&polygon)?;
        subtree.placements.push((node, polygon));

        let children: Vec<NodeId> = tree.children(node).collect();
        let mut config = self.config.clone();
        config.set_clip_polygon(clip);
        let solver = TreemapSolver::new(config);

        let mut rng = StdRng::seed_from_u64(seed);
        let solution = solver.solve_by(&children, |&id| weight(tree.get(id)), &mut rng)?;
        tracing::debug!(
            "Node '{}' (depth {}): {} children, {} iterations, error {:.4}",
            tree.get(node).name,
            tree.get(node).depth,
            children.len(),
            solution.iteration_count,
            solution.normalized_error
        );

        subtree.summary = LayoutSummary {
            solves: 1,
            iterations: solution.iteration_count,
            unconverged: usize::from(!solution.converged),
            max_normalized_error: solution.normalized_error,
        };

        let jobs: Vec<(NodeId, Polygon, u64)> = solution
            .cells
            .into_iter()
            .map(|cell| (children[cell.site], cell.polygon, rng.random()))
            .collect();
        let solve_child = |(child, polygon, seed): (NodeId, Polygon, u64)| {
            self.solve_subtree(tree, child, polygon, seed, weight, parallel)
        };
        let results: Vec<Subtree> = if parallel {
            jobs.into_par_iter().map(solve_child).collect::<Result<_>>()?
        } else {
            jobs.into_iter().map(solve_child).collect::<Result<_>>()?
        };

        for child in results {
            subtree.placements.extend(child.placements);
            subtree.summary.merge(child.summary);
        }
        Ok(subtree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_root_receives_the_clip() {
        let mut tree = WeightTree::new("root", 1.0);
        let driver = VoronoiTreemap::default();
        let summary = driver.layout(&mut tree, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(summary.solves, 0);
        assert_eq!(
            tree.get(tree.root).polygon.as_deref(),
            Some(driver.config().clip().vertices())
        );
    }

    #[test]
    fn failed_layout_leaves_the_tree_untouched() {
        let mut tree = WeightTree::new("root", 1.0);
        let a = tree.add_child(tree.root, WeightNode::new("a", -1.0));
        tree.add_child(tree.root, WeightNode::new("b", 1.0));
        let driver = VoronoiTreemap::default();
        assert!(driver.layout(&mut tree, &mut StdRng::seed_from_u64(0)).is_err());
        assert!(tree.get(tree.root).polygon.is_none());
        assert!(tree.get(a).polygon.is_none());
    }

    #[test]
    fn custom_accessor_drives_the_weights() {
        let mut tree = WeightTree::new("root", 0.0);
        let a = tree.add_child(tree.root, WeightNode::new("a", 1.0));
        let b = tree.add_child(tree.root, WeightNode::new("b", 1.0));
        let mut config = SolverConfig::default();
        config.set_size([400.0, 400.0]).unwrap();
        config.set_max_iteration_count(0);
        let driver = VoronoiTreemap::new(config);
        driver
            .layout_by(&mut tree, |n| if n.name.as_str() == "a" { 3.0 } else { 1.0 }, &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert!(tree.get(a).polygon.is_some());
        assert!(tree.get(b).polygon.is_some());
    }
}
