//! Grinder calculations.

use std::sync::Arc;

use log::debug;

use crate::config::{GrinderConfig, InteractionType, level_index};
use crate::error::{Outcome, Rejection};
use crate::items::{GrindSize, GroundCoffee};
use crate::quality::{QualityEvaluator, QualityResult};

#[derive(Debug, Clone)]
pub struct GrinderLogic {
    config: Arc<GrinderConfig>,
    evaluator: QualityEvaluator,
}

impl GrinderLogic {
    pub fn new(config: Arc<GrinderConfig>) -> Self {
        let evaluator =
            QualityEvaluator::new(config.ideal_grams, config.tolerance_g, config.quality_bands);
        Self { config, evaluator }
    }

    pub fn config(&self) -> &GrinderConfig {
        &self.config
    }

    // ── Bean hopper ──────────────────────────────────────────────

    pub fn can_add_beans(&self, current: u32, fills: u32) -> bool {
        fills > 0 && current < self.config.bean_capacity
    }

    pub fn addable_fills(&self, current: u32, fills: u32) -> u32 {
        fills.min(self.config.bean_capacity.saturating_sub(current))
    }

    pub fn validate_add_beans(&self, current: u32, fills: u32) -> Outcome<u32> {
        if fills == 0 {
            return Err(Rejection::NonPositiveAmount);
        }
        if !self.can_add_beans(current, fills) {
            return Err(Rejection::AtCapacity);
        }
        Ok(self.addable_fills(current, fills))
    }

    // ── Grinding ─────────────────────────────────────────────────

    /// Size after one more grind action on `current`.
    pub fn next_size(&self, current: Option<GrindSize>) -> Outcome<GrindSize> {
        match current {
            None => Ok(GrindSize::Small),
            Some(size) => size.next().ok_or(Rejection::MaxGrindSize),
        }
    }

    /// Check that a grind action may start.  Returns the size it yields.
    pub fn validate_grind(&self, beans: u32, current: Option<GrindSize>) -> Outcome<GrindSize> {
        if current.is_some_and(GrindSize::is_max) {
            return Err(Rejection::MaxGrindSize);
        }
        if beans == 0 {
            return Err(Rejection::InsufficientStock {
                requested: 1.0,
                available: 0.0,
            });
        }
        self.next_size(current)
    }

    /// Grams of ground coffee at `size`.
    pub fn grams_for(&self, size: GrindSize) -> f32 {
        size.steps() as f32 * self.config.grams_per_step
    }

    /// Output of one grind action on `current`.
    pub fn grind(&self, current: Option<GrindSize>) -> Outcome<GroundCoffee> {
        let size = self.next_size(current)?;
        let grams = self.grams_for(size);
        Ok(GroundCoffee {
            size,
            grams,
            quality: self.evaluate_quality(grams).score,
        })
    }

    pub fn should_auto_grind(&self, level: u8, beans: u32, current: Option<GrindSize>) -> bool {
        let below_target = match current {
            None => true,
            Some(size) => !size.is_max() && self.grams_for(size) < self.config.ideal_grams,
        };
        let decision =
            self.interaction(level) == InteractionType::Automatic && beans > 0 && below_target;
        if decision {
            debug!("Grinder: auto-grind triggered ({beans} fills, output {current:?})");
        }
        decision
    }

    // ── Level lookups ────────────────────────────────────────────

    pub fn interaction(&self, level: u8) -> InteractionType {
        self.config.levels[level_index(level)].interaction
    }

    pub fn process_duration(&self, level: u8) -> f32 {
        self.config.base_process_secs * self.config.levels[level_index(level)].time_multiplier
    }

    pub fn evaluate_quality(&self, grams: f32) -> QualityResult {
        self.evaluator.assess(grams)
    }
}
