use std::ops::ControlFlow;

use rand::Rng;

use super::flicker::{FlickeringTracker, DEFAULT_CAPACITY};
use super::relax::{Adaptation, SolveContext};
use super::Site;
use crate::error::{Result, TreemapError};
use crate::geometry::power::{Cell, DiagramBuilder, PowerDiagram};
use crate::geometry::{ClipPolygon, Point};

pub const DEFAULT_CONVERGENCE_RATIO: f64 = 0.01;
pub const DEFAULT_MAX_ITERATION_COUNT: usize = 50;
pub const DEFAULT_MIN_WEIGHT_RATIO: f64 = 0.01;
/// Weight floor and overweight margin, in area units.
pub const DEFAULT_EPSILON: f64 = 1.0;

/// Rejection-sampling budget for one initial site position.
const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// Items the solver can read a weight from without a custom accessor.
pub trait Weighted {
    fn weight(&self) -> f64;
}

impl Weighted for f64 {
    fn weight(&self) -> f64 {
        *self
    }
}

/// Solver parameters. Setters reject invalid values and keep the prior one.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    convergence_ratio: f64,
    max_iteration_count: usize,
    min_weight_ratio: f64,
    epsilon: f64,
    flicker_capacity: usize,
    clip: ClipPolygon,
    adaptation: Adaptation,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            convergence_ratio: DEFAULT_CONVERGENCE_RATIO,
            max_iteration_count: DEFAULT_MAX_ITERATION_COUNT,
            min_weight_ratio: DEFAULT_MIN_WEIGHT_RATIO,
            epsilon: DEFAULT_EPSILON,
            flicker_capacity: DEFAULT_CAPACITY,
            clip: ClipPolygon::unit_square(),
            adaptation: Adaptation::default(),
        }
    }
}

impl SolverConfig {
    pub fn convergence_ratio(&self) -> f64 {
        self.convergence_ratio
    }

    /// Stop once the summed area error drops below `ratio * clip area`.
    pub fn set_convergence_ratio(&mut self, ratio: f64) -> Result<&mut Self> {
        if !ratio.is_finite() || ratio < 0.0 {
            tracing::warn!(
                "Convergence ratio must be finite and non-negative; keeping {}",
                self.convergence_ratio
            );
            return Err(TreemapError::InvalidConvergenceRatio(ratio));
        }
        self.convergence_ratio = ratio;
        Ok(self)
    }

    pub fn max_iteration_count(&self) -> usize {
        self.max_iteration_count
    }

    pub fn set_max_iteration_count(&mut self, count: usize) -> &mut Self {
        self.max_iteration_count = count;
        self
    }

    pub fn min_weight_ratio(&self) -> f64 {
        self.min_weight_ratio
    }

    /// Input weights below `ratio * max weight` are raised to that floor.
    pub fn set_min_weight_ratio(&mut self, ratio: f64) -> Result<&mut Self> {
        if !(0.0..=1.0).contains(&ratio) {
            tracing::warn!(
                "Minimum weight ratio must be within [0, 1]; keeping {}",
                self.min_weight_ratio
            );
            return Err(TreemapError::InvalidMinWeightRatio(ratio));
        }
        self.min_weight_ratio = ratio;
        Ok(self)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<&mut Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            tracing::warn!("Epsilon must be finite and positive; keeping {}", self.epsilon);
            return Err(TreemapError::InvalidEpsilon(epsilon));
        }
        self.epsilon = epsilon;
        Ok(self)
    }

    pub fn flicker_capacity(&self) -> usize {
        self.flicker_capacity
    }

    pub fn set_flicker_capacity(&mut self, capacity: usize) -> Result<&mut Self> {
        if capacity == 0 {
            tracing::warn!(
                "Flickering history capacity must be positive; keeping {}",
                self.flicker_capacity
            );
            return Err(TreemapError::InvalidCapacity(capacity));
        }
        self.flicker_capacity = capacity;
        Ok(self)
    }

    pub fn clip(&self) -> &ClipPolygon {
        &self.clip
    }

    /// Any point set whose convex hull has a positive area.
    pub fn set_clip(&mut self, points: &[Point]) -> Result<&mut Self> {
        match ClipPolygon::new(points) {
            Ok(clip) => Ok(self.set_clip_polygon(clip)),
            Err(e) => {
                tracing::warn!("Rejected clip polygon ({}); keeping the previous one", e);
                Err(e)
            }
        }
    }

    pub fn set_clip_polygon(&mut self, clip: ClipPolygon) -> &mut Self {
        self.clip = clip;
        self
    }

    pub fn extent(&self) -> [[f64; 2]; 2] {
        self.clip.extent()
    }

    pub fn set_extent(&mut self, extent: [[f64; 2]; 2]) -> Result<&mut Self> {
        match ClipPolygon::from_extent(extent) {
            Ok(clip) => Ok(self.set_clip_polygon(clip)),
            Err(e) => {
                tracing::warn!("Rejected extent {:?} ({}); keeping the previous clip", extent, e);
                Err(e)
            }
        }
    }

    pub fn size(&self) -> [f64; 2] {
        self.clip.size()
    }

    pub fn set_size(&mut self, size: [f64; 2]) -> Result<&mut Self> {
        match ClipPolygon::from_size(size) {
            Ok(clip) => Ok(self.set_clip_polygon(clip)),
            Err(e) => {
                tracing::warn!("Rejected size {:?} ({}); keeping the previous clip", size, e);
                Err(e)
            }
        }
    }

    pub fn adaptation(&self) -> Adaptation {
        self.adaptation
    }

    pub fn set_adaptation(&mut self, adaptation: Adaptation) -> &mut Self {
        self.adaptation = adaptation;
        self
    }
}

/// Outcome of one solve.
#[derive(Debug, Clone)]
pub struct Solution {
    /// One cell per site, in site order.
    pub cells: Vec<Cell>,
    pub sites: Vec<Site>,
    pub iteration_count: usize,
    /// Summed area error divided by the clip area.
    pub normalized_error: f64,
    pub converged: bool,
}

/// Computes a one-level weighted Voronoi map by iterative relaxation.
#[derive(Debug, Clone, Default)]
pub struct TreemapSolver<B = PowerDiagram> {
    config: SolverConfig,
    builder: B,
}

impl TreemapSolver<PowerDiagram> {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            builder: PowerDiagram,
        }
    }
}

impl<B: DiagramBuilder> TreemapSolver<B> {
    pub fn with_builder(config: SolverConfig, builder: B) -> Self {
        Self { config, builder }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SolverConfig {
        &mut self.config
    }

    pub fn solve<T, R>(&self, items: &[T], rng: &mut R) -> Result<Solution>
    where
        T: Weighted,
        R: Rng + ?Sized,
    {
        self.solve_by(items, T::weight, rng)
    }

    pub fn solve_with_system_rng<T: Weighted>(&self, items: &[T]) -> Result<Solution> {
        self.solve(items, &mut rand::rng())
    }

    pub fn solve_by<T, F, R>(&self, items: &[T], weight: F, rng: &mut R) -> Result<Solution>
    where
        F: Fn(&T) -> f64,
        R: Rng + ?Sized,
    {
        self.solve_observed(items, weight, rng, |_, _| ControlFlow::Continue(()))
    }

    /// Like [`solve_by`](Self::solve_by), calling `observer(cells, iteration)`
    /// after initialization (iteration 0) and after every iteration. Breaking
    /// stops the solve after the step just completed.
    pub fn solve_observed<T, F, R, O>(
        &self,
        items: &[T],
        weight: F,
        rng: &mut R,
        mut observer: O,
    ) -> Result<Solution>
    where
        F: Fn(&T) -> f64,
        R: Rng + ?Sized,
        O: FnMut(&[Cell], usize) -> ControlFlow<()>,
    {
        let weights: Vec<f64> = items.iter().map(weight).collect();
        let clip = &self.config.clip;
        let total_area = clip.area();
        let ctx = SolveContext {
            clip,
            builder: &self.builder,
            site_count: weights.len(),
            total_area,
            area_error_threshold: self.config.convergence_ratio * total_area,
            epsilon: self.config.epsilon,
        };

        let mut flickering = FlickeringTracker::new();
        flickering
            .set_capacity(self.config.flicker_capacity)?
            .set_total_area(total_area)?
            .clear();

        let mut sites = self.initial_sites(&ctx, &weights, rng)?;
        let mut cells = ctx.build(&sites, 0)?;
        let mut area_error = ctx.area_error(&sites, &cells);
        let mut iteration_count = 0;
        let mut stopped = observer(&cells, 0).is_break();
        let converged = loop {
            if area_error < ctx.area_error_threshold {
                break true;
            }
            if stopped || iteration_count >= self.config.max_iteration_count {
                break false;
            }

            let flicker_ratio = flickering.ratio();
            cells = self.config.adaptation.relax(
                &ctx,
                &mut sites,
                &cells,
                flicker_ratio,
                iteration_count + 1,
            )?;
            iteration_count += 1;
            area_error = ctx.area_error(&sites, &cells);
            flickering.record(area_error);
            tracing::debug!(
                "Iteration {}: area error {:.3}%",
                iteration_count,
                area_error * 100.0 / total_area
            );
            stopped = observer(&cells, iteration_count).is_break();
        };

        let normalized_error = area_error / total_area;
        tracing::debug!(
            "Solved {} sites in {} iterations (error {:.4}, converged={})",
            ctx.site_count,
            iteration_count,
            normalized_error,
            converged
        );

        Ok(Solution {
            cells,
            sites,
            iteration_count,
            normalized_error,
            converged,
        })
    }

    fn initial_sites<R: Rng + ?Sized>(
        &self,
        ctx: &SolveContext<'_, B>,
        weights: &[f64],
        rng: &mut R,
    ) -> Result<Vec<Site>> {
        if weights.is_empty() {
            return Err(TreemapError::NoSites);
        }
        if let Some((index, &weight)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(TreemapError::InvalidWeights { index, weight });
        }
        let max_weight = weights.iter().copied().fold(0.0, f64::max);
        if max_weight <= 0.0 {
            return Err(TreemapError::InvalidWeights {
                index: 0,
                weight: max_weight,
            });
        }

        let min_allowed = max_weight * self.config.min_weight_ratio;
        let floored: Vec<f64> = weights.iter().map(|w| w.max(min_allowed)).collect();
        let total_weight: f64 = floored.iter().sum();
        let initial_weight = ctx.total_area / ctx.site_count as f64 / 2.0;

        floored
            .iter()
            .enumerate()
            .map(|(index, &w)| -> Result<Site> {
                Ok(Site {
                    index,
                    position: random_interior_point(ctx.clip, rng)?,
                    weight: initial_weight,
                    target_area: ctx.total_area * w / total_weight,
                })
            })
            .collect()
    }
}

/// Uniform candidate in the clip's extent, retried until it lands inside.
fn random_interior_point<R: Rng + ?Sized>(clip: &ClipPolygon, rng: &mut R) -> Result<Point> {
    let [[x0, y0], _] = clip.extent();
    let [dx, dy] = clip.size();
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let p = Point::new(x0 + dx * rng.random::<f64>(), y0 + dy * rng.random::<f64>());
        if clip.contains(p) {
            return Ok(p);
        }
    }
    Err(TreemapError::NoInteriorPoint {
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}
