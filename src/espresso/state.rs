//! Espresso machine state: machine-level fields plus every slot.

use crate::config::MAX_BREW_SLOTS;
use crate::events::{EventQueue, StateChange, StationEvent};
use crate::fsm::MachineState;
use crate::items::{Cup, ItemKind, Portafilter};
use crate::quality::QualityResult;

use super::slot::BrewingSlot;

#[derive(Debug)]
pub struct EspressoState {
    slots: [BrewingSlot; MAX_BREW_SLOTS],
    machine_state: MachineState,
    level: u8,
    is_processing: bool,
    events: EventQueue,
}

impl Default for EspressoState {
    fn default() -> Self {
        Self::new()
    }
}

impl EspressoState {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(BrewingSlot::new),
            machine_state: MachineState::Idle,
            level: 0,
            is_processing: false,
            events: EventQueue::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────

    pub fn slots(&self) -> &[BrewingSlot; MAX_BREW_SLOTS] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&BrewingSlot> {
        self.slots.get(index)
    }

    /// Aggregate over all slots.
    pub fn machine_state(&self) -> MachineState {
        self.machine_state
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Any slot inside `available` ready to brew.
    pub fn should_be_ready(&self, available: usize) -> bool {
        self.slots
            .iter()
            .take(available)
            .any(BrewingSlot::is_ready_to_brew)
    }

    pub fn can_start_processing(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .is_some_and(|s| s.state == MachineState::Ready && !s.active)
    }

    // ── Slot setters ─────────────────────────────────────────────
    //
    // Callers pass indices already checked against MAX_BREW_SLOTS.

    /// Removing the portafilter drops the input quality and shot result.
    pub fn set_portafilter(&mut self, index: usize, portafilter: Option<Portafilter>) {
        let slot = &mut self.slots[index];
        let was_present = slot.portafilter.is_some();
        let had_coffee = slot.coffee_present();
        slot.portafilter = portafilter;
        let has_coffee = slot.coffee_present();
        if was_present != portafilter.is_some() {
            self.events.push(StateChange::Presence {
                item: ItemKind::Portafilter,
                present: portafilter.is_some(),
                slot: Some(index),
            });
        }
        if had_coffee != has_coffee {
            self.events.push(StateChange::Presence {
                item: ItemKind::GroundCoffee,
                present: has_coffee,
                slot: Some(index),
            });
        }
        if portafilter.is_none() {
            self.slots[index].input_quality = 0.0;
            self.set_result(index, None);
        }
    }

    /// Removing the cup takes the shot with it.
    pub fn set_cup(&mut self, index: usize, cup: Option<Cup>) {
        let slot = &mut self.slots[index];
        let was_present = slot.cup.is_some();
        slot.cup = cup;
        if was_present != cup.is_some() {
            self.events.push(StateChange::Presence {
                item: ItemKind::Cup,
                present: cup.is_some(),
                slot: Some(index),
            });
        }
        if cup.is_none() {
            self.set_result(index, None);
        }
    }

    /// Also derives the slot's active flag.
    pub fn set_slot_state(&mut self, index: usize, state: MachineState) {
        let slot = &mut self.slots[index];
        if state != slot.state {
            let from = slot.state;
            slot.state = state;
            self.events.push(StateChange::Machine {
                from,
                to: state,
                slot: Some(index),
            });
        }
        let slot = &mut self.slots[index];
        let active = state == MachineState::Processing;
        if active != slot.active {
            slot.active = active;
            self.events.push(StateChange::Processing {
                active,
                slot: Some(index),
            });
        }
    }

    pub fn set_elapsed(&mut self, index: usize, secs: f32) {
        self.slots[index].elapsed_secs = secs.max(0.0);
    }

    pub fn set_input_quality(&mut self, index: usize, quality: f32) {
        self.slots[index].input_quality = quality;
    }

    pub fn set_result(&mut self, index: usize, result: Option<QualityResult>) {
        let slot = &mut self.slots[index];
        if result != slot.result {
            slot.result = result;
            self.events.push(StateChange::Quality {
                slot: Some(index),
                result,
            });
        }
    }

    // ── Machine setters ──────────────────────────────────────────

    pub fn set_machine_state(&mut self, state: MachineState) {
        if state != self.machine_state {
            let from = self.machine_state;
            self.machine_state = state;
            self.events.push(StateChange::Machine {
                from,
                to: state,
                slot: None,
            });
        }
        let processing = state == MachineState::Processing;
        if processing != self.is_processing {
            self.is_processing = processing;
            self.events.push(StateChange::Processing {
                active: processing,
                slot: None,
            });
        }
    }

    pub fn set_level(&mut self, level: u8) {
        if level != self.level {
            self.level = level;
            self.events.push(StateChange::Level(level));
        }
    }

    pub fn reset(&mut self) {
        for index in 0..MAX_BREW_SLOTS {
            self.set_portafilter(index, None);
            self.set_cup(index, None);
            self.set_slot_state(index, MachineState::Idle);
            self.set_elapsed(index, 0.0);
        }
        self.set_machine_state(MachineState::Idle);
        self.set_level(0);
    }

    pub fn push_event(&mut self, event: impl Into<StationEvent>) {
        self.events.push(event);
    }

    pub fn notice(&mut self, text: impl Into<String>) {
        self.events.notice(text);
    }

    pub fn drain_events(&mut self) -> Vec<StationEvent> {
        self.events.drain()
    }
}
