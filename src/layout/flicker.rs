use std::collections::VecDeque;

use crate::error::{Result, TreemapError};

pub const DEFAULT_CAPACITY: usize = 10;

const INITIAL_WEIGHT: u32 = 3;
const WEIGHT_DECREMENT: u32 = 1;
const MIN_WEIGHT: u32 = 1;

/// Area errors above this share of the total area are real progress, not flicker.
const LARGE_ERROR_RATIO: f64 = 0.1;

/// Detects oscillation of the aggregate area error across iterations.
///
/// Keeps the last `capacity` area errors (most recent first). Consecutive
/// pairs give a growth direction; a reversal between consecutive directions
/// counts as one flicker, weighted so recent reversals matter more. A full
/// history of `n` errors has `n - 2` reversal slots.
#[derive(Debug, Clone)]
pub struct FlickeringTracker {
    capacity: usize,
    total_area: Option<f64>,
    history: VecDeque<f64>,
    reversal_weights: Vec<u32>,
    reversal_weights_sum: u32,
}

impl FlickeringTracker {
    pub fn new() -> Self {
        let reversal_weights = reversal_weights(DEFAULT_CAPACITY);
        Self {
            capacity: DEFAULT_CAPACITY,
            total_area: None,
            history: VecDeque::with_capacity(DEFAULT_CAPACITY + 1),
            reversal_weights_sum: reversal_weights.iter().sum(),
            reversal_weights,
        }
    }

    /// Empty the history. Capacity and total area are kept.
    pub fn clear(&mut self) -> &mut Self {
        self.history.clear();
        self
    }

    /// Back to a freshly constructed tracker.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::new();
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) -> Result<&mut Self> {
        if capacity == 0 {
            tracing::warn!("Flickering history capacity must be positive; keeping {}", self.capacity);
            return Err(TreemapError::InvalidCapacity(capacity));
        }
        self.capacity = capacity;
        self.reversal_weights = reversal_weights(capacity);
        self.reversal_weights_sum = self.reversal_weights.iter().sum();
        while self.history.len() > capacity {
            self.history.pop_back();
        }
        Ok(self)
    }

    pub fn total_area(&self) -> Option<f64> {
        self.total_area
    }

    pub fn set_total_area(&mut self, total_area: f64) -> Result<&mut Self> {
        if !total_area.is_finite() || total_area <= 0.0 {
            tracing::warn!(
                "Flickering total area must be finite and positive; ignoring {}",
                total_area
            );
            return Err(TreemapError::InvalidTotalArea(total_area));
        }
        self.total_area = Some(total_area);
        Ok(self)
    }

    /// Most recent first.
    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn record(&mut self, area_error: f64) -> &mut Self {
        self.history.push_front(area_error);
        if self.history.len() > self.capacity {
            self.history.pop_back();
        }
        self
    }

    /// Damping signal in `[0, 1]`; higher means more oscillation.
    pub fn ratio(&self) -> f64 {
        if self.history.len() < self.capacity || self.reversal_weights_sum == 0 {
            return 0.0;
        }
        if let (Some(&latest), Some(total)) = (self.history.front(), self.total_area) {
            if latest > total * LARGE_ERROR_RATIO {
                return 0.0;
            }
        }

        let directions: Vec<bool> = self
            .history
            .iter()
            .zip(self.history.iter().skip(1))
            .map(|(recent, older)| recent >= older)
            .collect();

        let weighted_reversals: u32 = directions
            .windows(2)
            .zip(&self.reversal_weights)
            .filter(|(pair, _)| pair[0] != pair[1])
            .map(|(_, &w)| w)
            .sum();

        let ratio = f64::from(weighted_reversals) / f64::from(self.reversal_weights_sum);
        if ratio > 0.0 {
            tracing::debug!("Flickering mitigation ratio: {:.3}", ratio);
        }
        ratio
    }
}

impl Default for FlickeringTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// 3, 2, 1, 1, ... for each reversal slot of a full history.
fn reversal_weights(capacity: usize) -> Vec<u32> {
    let slots = capacity.saturating_sub(2);
    let mut weight = INITIAL_WEIGHT;
    let mut weights = Vec::with_capacity(slots);
    for _ in 0..slots {
        weights.push(weight);
        weight = weight.saturating_sub(WEIGHT_DECREMENT).max(MIN_WEIGHT);
    }
    weights
}
