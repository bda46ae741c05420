use super::overweight::OverweightStrategy;
use super::Site;
use crate::error::{Result, TreemapError};
use crate::geometry::power::{Cell, DiagramBuilder};
use crate::geometry::{centroid, ClipPolygon};

/// Share of the centroid step given up at maximum flicker.
const PLACEMENT_FLICKER_INFLUENCE: f64 = 0.5;
/// Half-width of the weight adaptation band at zero flicker.
const WEIGHT_FLICKER_INFLUENCE: f64 = 0.1;

/// How sites move toward their cell's centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementAdaptation {
    /// Full step at zero flicker, half step at maximum flicker.
    #[default]
    DampedCentroid,
    /// Plain Lloyd step, flicker ignored.
    Centroid,
}

impl PlacementAdaptation {
    pub fn step_factor(self, flicker_ratio: f64) -> f64 {
        match self {
            Self::DampedCentroid => 1.0 - PLACEMENT_FLICKER_INFLUENCE * flicker_ratio,
            Self::Centroid => 1.0,
        }
    }
}

/// How site weights scale toward their target area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightAdaptation {
    /// `target / current` clamped to a band that narrows with flicker.
    #[default]
    DampedRatio,
    /// `target / current` clamped to the widest band, flicker ignored.
    Ratio,
}

impl WeightAdaptation {
    /// `[min, max]` allowed for the per-iteration weight multiplier.
    pub fn ratio_bounds(self, flicker_ratio: f64) -> (f64, f64) {
        let mitigation = match self {
            Self::DampedRatio => WEIGHT_FLICKER_INFLUENCE * flicker_ratio,
            Self::Ratio => 0.0,
        };
        (
            1.0 - WEIGHT_FLICKER_INFLUENCE + mitigation,
            1.0 + WEIGHT_FLICKER_INFLUENCE - mitigation,
        )
    }

    pub fn adapt_ratio(self, target_area: f64, current_area: f64, flicker_ratio: f64) -> f64 {
        let (lo, hi) = self.ratio_bounds(flicker_ratio);
        (target_area / current_area).max(lo).min(hi)
    }
}

/// The heuristics used by one relaxation step, fixed when the solver is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Adaptation {
    pub placement: PlacementAdaptation,
    pub weighting: WeightAdaptation,
    pub overweight: OverweightStrategy,
}

/// Per-solve values shared by every step of one solve.
#[derive(Debug)]
pub struct SolveContext<'a, B> {
    pub clip: &'a ClipPolygon,
    pub builder: &'a B,
    pub site_count: usize,
    pub total_area: f64,
    pub area_error_threshold: f64,
    pub epsilon: f64,
}

impl<B: DiagramBuilder> SolveContext<'_, B> {
    /// Rebuild the diagram, failing if any site lost its cell.
    pub fn build(&self, sites: &[Site], iteration: usize) -> Result<Vec<Cell>> {
        let cells = self.builder.build(sites, self.clip);
        if cells.len() < self.site_count {
            tracing::warn!(
                "At least one site has no area: {} cells for {} sites at iteration {}",
                cells.len(),
                self.site_count,
                iteration
            );
            return Err(TreemapError::DegenerateDiagram {
                sites: self.site_count,
                cells: cells.len(),
                iteration,
            });
        }
        Ok(cells)
    }

    /// Sum of `|target - current|` over all cells.
    pub fn area_error(&self, sites: &[Site], cells: &[Cell]) -> f64 {
        cells
            .iter()
            .map(|cell| (sites[cell.site].target_area - cell.area()).abs())
            .sum()
    }
}

impl Adaptation {
    /// One relaxation iteration: move sites, rebuild, rescale weights, rebuild.
    ///
    /// `cells` must be the diagram of `sites` as they are on entry. Both
    /// sub-steps see the same `flicker_ratio`.
    pub fn relax<B: DiagramBuilder>(
        &self,
        ctx: &SolveContext<'_, B>,
        sites: &mut [Site],
        cells: &[Cell],
        flicker_ratio: f64,
        iteration: usize,
    ) -> Result<Vec<Cell>> {
        self.adapt_placements(ctx, sites, cells, flicker_ratio);
        let cells = ctx.build(sites, iteration)?;

        self.adapt_weights(ctx, sites, &cells, flicker_ratio);
        ctx.build(sites, iteration)
    }

    fn adapt_placements<B>(
        &self,
        ctx: &SolveContext<'_, B>,
        sites: &mut [Site],
        cells: &[Cell],
        flicker_ratio: f64,
    ) {
        let factor = self.placement.step_factor(flicker_ratio);
        for cell in cells {
            let site = &mut sites[cell.site];
            let c = centroid(&cell.polygon);
            site.position.x += (c.x - site.position.x) * factor;
            site.position.y += (c.y - site.position.y) * factor;
        }
        self.overweight.resolve(sites, ctx.epsilon);
    }

    fn adapt_weights<B>(
        &self,
        ctx: &SolveContext<'_, B>,
        sites: &mut [Site],
        cells: &[Cell],
        flicker_ratio: f64,
    ) {
        for cell in cells {
            let site = &mut sites[cell.site];
            let ratio = self
                .weighting
                .adapt_ratio(site.target_area, cell.area(), flicker_ratio);
            site.weight = (site.weight * ratio).max(ctx.epsilon);
        }
        self.overweight.resolve(sites, ctx.epsilon);
    }
}
