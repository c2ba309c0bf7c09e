//! One brewing position of the espresso machine.

use crate::fsm::MachineState;
use crate::items::{Cup, Portafilter};
use crate::quality::QualityResult;

/// Data of one slot.  Mutated through [`EspressoState`](super::EspressoState).
#[derive(Debug, Clone, PartialEq)]
pub struct BrewingSlot {
    pub(super) index: usize,
    pub(super) portafilter: Option<Portafilter>,
    pub(super) cup: Option<Cup>,
    pub(super) state: MachineState,
    pub(super) active: bool,
    pub(super) elapsed_secs: f32,
    /// Dose quality locked in when the shot started.
    pub(super) input_quality: f32,
    pub(super) result: Option<QualityResult>,
}

impl BrewingSlot {
    pub(super) fn new(index: usize) -> Self {
        Self {
            index,
            portafilter: None,
            cup: None,
            state: MachineState::Idle,
            active: false,
            elapsed_secs: 0.0,
            input_quality: 0.0,
            result: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn portafilter(&self) -> Option<&Portafilter> {
        self.portafilter.as_ref()
    }

    pub fn cup(&self) -> Option<&Cup> {
        self.cup.as_ref()
    }

    pub fn filter_present(&self) -> bool {
        self.portafilter.is_some()
    }

    pub fn vessel_present(&self) -> bool {
        self.cup.is_some()
    }

    /// The portafilter holds an unbrewed dose.
    pub fn coffee_present(&self) -> bool {
        self.portafilter.is_some_and(|p| p.has_coffee())
    }

    pub fn machine_state(&self) -> MachineState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn input_quality(&self) -> f32 {
        self.input_quality
    }

    pub fn result(&self) -> Option<QualityResult> {
        self.result
    }

    /// Dosed portafilter and an empty cup.
    pub fn is_ready_to_brew(&self) -> bool {
        self.coffee_present() && self.cup.is_some_and(|c| c.is_empty())
    }

    pub fn is_occupied(&self) -> bool {
        self.portafilter.is_some() || self.cup.is_some()
    }
}
