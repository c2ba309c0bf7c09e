//! Espresso machine calculations.
//!
//! Slot availability, brew timing and shot quality.  The top level always
//! pulls a shot of at least [`GUARANTEED_QUALITY`], whatever the dose.

use std::sync::Arc;

use heapless::Vec as HVec;
use log::{debug, warn};

use crate::config::{
    EspressoConfig, InteractionType, MAX_BREW_SLOTS, MAX_UPGRADE_LEVEL, level_index,
};
use crate::error::{Outcome, Rejection};
use crate::fsm::MachineState;
use crate::quality::{QualityLevel, QualityResult, clamp01};

/// Minimum shot quality at the top upgrade level.
pub const GUARANTEED_QUALITY: f32 = 0.7;

/// Slot indices, at most one per physical slot.
pub type SlotList = HVec<usize, MAX_BREW_SLOTS>;

/// What the validator needs to know about one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStatus {
    pub index: usize,
    pub state: MachineState,
    pub occupied: bool,
}

/// Per-tick report across every slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrewValidation {
    /// Slots that may start a shot now.
    pub ready: SlotList,
    /// Slots currently brewing.
    pub active: SlotList,
    /// Occupied slots beyond the count available at this level.
    pub invalid: SlotList,
}

impl BrewValidation {
    pub fn has_errors(&self) -> bool {
        !self.invalid.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EspressoLogic {
    config: Arc<EspressoConfig>,
}

impl EspressoLogic {
    pub fn new(config: Arc<EspressoConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EspressoConfig {
        &self.config
    }

    pub fn available_slot_count(&self, level: u8) -> usize {
        self.config.slot_counts[level_index(level)] as usize
    }

    pub fn validate_slot(&self, level: u8, index: usize) -> Outcome<()> {
        let available = self.available_slot_count(level);
        if index < available {
            Ok(())
        } else {
            Err(Rejection::InvalidSlot { index, available })
        }
    }

    pub fn interaction(&self, level: u8) -> InteractionType {
        self.config.levels[level_index(level)].interaction
    }

    pub fn brew_duration(&self, level: u8) -> f32 {
        self.config.base_brew_secs * self.config.levels[level_index(level)].time_multiplier
    }

    /// `clamp01(input × weight + bonus)`, floored at the top level.
    pub fn final_quality(&self, level: u8, input_quality: f32) -> f32 {
        let idx = level_index(level);
        let score = clamp01(input_quality * self.config.coffee_weight + self.config.quality_bonus[idx]);
        if idx == MAX_UPGRADE_LEVEL as usize {
            score.max(GUARANTEED_QUALITY)
        } else {
            score
        }
    }

    pub fn classify(&self, score: f32) -> QualityLevel {
        self.config.quality_bands.classify(score)
    }

    /// Quality of a finished shot brewed from `coffee_g` of dose.
    pub fn shot_quality(&self, level: u8, input_quality: f32, coffee_g: f32) -> QualityResult {
        let score = self.final_quality(level, input_quality);
        QualityResult {
            score,
            level: self.classify(score),
            amount: coffee_g.max(0.0),
        }
    }

    pub fn should_auto_brew(&self, level: u8, slot_ready: bool) -> bool {
        self.interaction(level) == InteractionType::Automatic && slot_ready
    }

    /// Sort every slot into ready, active or invalid for `level`.
    pub fn validate_brewing(
        &self,
        level: u8,
        slots: impl IntoIterator<Item = SlotStatus>,
    ) -> BrewValidation {
        let available = self.available_slot_count(level);
        let mut report = BrewValidation::default();
        for slot in slots {
            let list = if slot.index >= available {
                if !slot.occupied {
                    continue;
                }
                &mut report.invalid
            } else {
                match slot.state {
                    MachineState::Ready => &mut report.ready,
                    MachineState::Processing => &mut report.active,
                    MachineState::Idle | MachineState::Complete => continue,
                }
            };
            if list.push(slot.index).is_err() {
                warn!("Espresso: slot list full, dropping slot {}", slot.index);
            }
        }
        if report.has_errors() {
            debug!(
                "Espresso: slots {:?} unavailable at level {level}",
                report.invalid.as_slice()
            );
        }
        report
    }

    /// Processing if any slot brews, else Ready if any is ready, else Idle.
    pub fn aggregate_state(&self, states: impl IntoIterator<Item = MachineState>) -> MachineState {
        let mut any_ready = false;
        for state in states {
            match state {
                MachineState::Processing => return MachineState::Processing,
                MachineState::Ready => any_ready = true,
                MachineState::Idle | MachineState::Complete => {}
            }
        }
        if any_ready {
            MachineState::Ready
        } else {
            MachineState::Idle
        }
    }
}
