//! Doser calculations.
//!
//! Stateless: every method takes the current quantities explicitly and
//! returns a decision or an amount.  Nothing here touches a station.

use std::sync::Arc;

use log::debug;

use crate::config::{DosingConfig, InteractionType, level_index};
use crate::error::{Outcome, Rejection};
use crate::quality::{QualityEvaluator, QualityResult};

/// Below this the portafilter counts as holding the ideal dose.
pub const DOSE_EPSILON_G: f32 = 0.001;

/// Result of seeking the ideal dose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoDose {
    /// Grams to move from storage into the portafilter.
    pub to_dispense: f32,
    /// Portafilter content afterwards.
    pub resulting: f32,
    pub reaches_ideal: bool,
}

/// Doser rules over one config section.
#[derive(Debug, Clone)]
pub struct DosingLogic {
    config: Arc<DosingConfig>,
    evaluator: QualityEvaluator,
}

impl DosingLogic {
    pub fn new(config: Arc<DosingConfig>) -> Self {
        let evaluator =
            QualityEvaluator::new(config.ideal_dose_g, config.tolerance_g, config.quality_bands);
        Self { config, evaluator }
    }

    pub fn config(&self) -> &DosingConfig {
        &self.config
    }

    // ── Storage ──────────────────────────────────────────────────

    pub fn can_add(&self, current: f32, to_add: f32) -> bool {
        !non_positive(to_add) && current < self.config.capacity_g
    }

    /// `min(to_add, capacity - current)`, never negative.
    pub fn addable_amount(&self, current: f32, to_add: f32) -> f32 {
        if non_positive(to_add) {
            return 0.0;
        }
        to_add.min(self.config.capacity_g - current).max(0.0)
    }

    pub fn validate_add(&self, current: f32, to_add: f32) -> Outcome<f32> {
        if non_positive(to_add) {
            return Err(Rejection::NonPositiveAmount);
        }
        if !self.can_add(current, to_add) {
            return Err(Rejection::AtCapacity);
        }
        Ok(self.addable_amount(current, to_add))
    }

    // ── Dispensing ───────────────────────────────────────────────

    /// Dispense rate at `level` (g/s).
    pub fn dispense_rate(&self, level: u8) -> f32 {
        self.config.dispense_rate_g_per_s * self.config.rate_multipliers[level_index(level)]
    }

    /// Grams dispensed over `elapsed_secs` at `level`.
    pub fn dispense_for(&self, level: u8, elapsed_secs: f32) -> f32 {
        (self.dispense_rate(level) * elapsed_secs).max(0.0)
    }

    /// Room left in the portafilter basket.
    pub fn portafilter_room(&self, output: f32) -> f32 {
        (self.config.portafilter_capacity_g - output).max(0.0)
    }

    /// Check a direct transfer of `amount` from storage to the portafilter.
    /// Returns the grams that will actually move.
    pub fn validate_transfer(&self, stock: f32, output: f32, amount: f32) -> Outcome<f32> {
        if non_positive(amount) {
            return Err(Rejection::NonPositiveAmount);
        }
        if amount > stock {
            return Err(Rejection::InsufficientStock {
                requested: amount,
                available: stock,
            });
        }
        let room = self.portafilter_room(output);
        if room <= 0.0 {
            return Err(Rejection::AtCapacity);
        }
        Ok(amount.min(room))
    }

    // ── Auto-dose ────────────────────────────────────────────────

    /// Whether an automatic cycle should begin now.  False once the ideal
    /// is reached or an input is missing, so it can be polled every tick.
    pub fn should_auto_dose(
        &self,
        level: u8,
        portafilter_present: bool,
        stock: f32,
        output: f32,
    ) -> bool {
        let decision = self.interaction(level) == InteractionType::Automatic
            && portafilter_present
            && stock > 0.0
            && self.config.ideal_dose_g - output > DOSE_EPSILON_G;
        if decision {
            debug!("Doser: auto-dose triggered (stock {stock:.1} g, portafilter {output:.1} g)");
        }
        decision
    }

    /// Seek the ideal dose without overshooting it or the stock.
    pub fn calculate_auto_dose(&self, current: f32, available: f32) -> AutoDose {
        let needed = (self.config.ideal_dose_g - current).max(0.0);
        let to_dispense = needed.min(available.max(0.0));
        AutoDose {
            to_dispense,
            resulting: current + to_dispense,
            reaches_ideal: needed - to_dispense <= DOSE_EPSILON_G,
        }
    }

    // ── Level lookups ────────────────────────────────────────────

    pub fn interaction(&self, level: u8) -> InteractionType {
        self.config.levels[level_index(level)].interaction
    }

    /// Cycle time at `level` (s).
    pub fn process_duration(&self, level: u8) -> f32 {
        self.config.base_process_secs * self.config.levels[level_index(level)].time_multiplier
    }

    /// Grams one cycle started now will move.
    ///
    /// A manual lever pull dispenses `rate × duration`; button and
    /// automatic cycles seek the ideal dose.  Both are capped by the stock
    /// and the basket.
    pub fn plan_cycle(&self, level: u8, stock: f32, output: f32) -> Outcome<f32> {
        if stock <= 0.0 {
            return Err(Rejection::InsufficientStock {
                requested: self.config.ideal_dose_g,
                available: 0.0,
            });
        }
        let room = self.portafilter_room(output);
        let wanted = match self.interaction(level) {
            InteractionType::ManualLever => {
                self.dispense_for(level, self.process_duration(level))
            }
            InteractionType::ButtonPress | InteractionType::Automatic => {
                self.calculate_auto_dose(output, stock).to_dispense
            }
        };
        let amount = wanted.min(stock).min(room);
        debug!("Doser: cycle at level {level} plans {amount:.2} g");
        if amount <= DOSE_EPSILON_G {
            return Err(Rejection::AtCapacity);
        }
        Ok(amount)
    }

    // ── Quality ──────────────────────────────────────────────────

    pub fn evaluate_quality(&self, amount: f32) -> QualityResult {
        self.evaluator.assess(amount)
    }

    /// Quality of a portafilter holding `amount`, or none when empty.
    pub fn quality_of(&self, amount: f32) -> Option<QualityResult> {
        (amount > 0.0).then(|| self.evaluate_quality(amount))
    }
}

/// NaN counts as non-positive.
fn non_positive(amount: f32) -> bool {
    amount.is_nan() || amount <= 0.0
}
