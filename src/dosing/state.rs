//! Doser state holder.
//!
//! Fields change only through the setters below, and every setter
//! records a [`StateChange`] only when the value really changed.

use crate::events::{EventQueue, StateChange, StationEvent};
use crate::fsm::MachineState;
use crate::items::ItemKind;
use crate::quality::QualityResult;

#[derive(Debug)]
pub struct DosingState {
    capacity_g: f32,
    stock_g: f32,
    output_g: f32,
    portafilter_present: bool,
    machine_state: MachineState,
    level: u8,
    is_processing: bool,
    quality: Option<QualityResult>,
    events: EventQueue,
}

impl DosingState {
    pub fn new(capacity_g: f32) -> Self {
        Self {
            capacity_g,
            stock_g: 0.0,
            output_g: 0.0,
            portafilter_present: false,
            machine_state: MachineState::Idle,
            level: 0,
            is_processing: false,
            quality: None,
            events: EventQueue::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────

    pub fn stock(&self) -> f32 {
        self.stock_g
    }

    pub fn output(&self) -> f32 {
        self.output_g
    }

    pub fn portafilter_present(&self) -> bool {
        self.portafilter_present
    }

    pub fn machine_state(&self) -> MachineState {
        self.machine_state
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn quality(&self) -> Option<QualityResult> {
        self.quality
    }

    /// Portafilter in place and coffee in storage.
    pub fn should_be_ready(&self) -> bool {
        self.portafilter_present && self.stock_g > 0.0
    }

    pub fn can_start_processing(&self) -> bool {
        self.machine_state == MachineState::Ready && !self.is_processing
    }

    // ── Setters ──────────────────────────────────────────────────

    /// Clamped into `[0, capacity]`.
    pub fn set_stock(&mut self, grams: f32) {
        let grams = grams.clamp(0.0, self.capacity_g);
        if grams != self.stock_g {
            self.stock_g = grams;
            self.events.push(StateChange::Stock(grams));
        }
    }

    /// Clamped at zero.
    pub fn set_output(&mut self, grams: f32) {
        let grams = grams.max(0.0);
        if grams != self.output_g {
            self.output_g = grams;
            self.events.push(StateChange::Output(grams));
        }
    }

    /// Removing the portafilter drops the dose and its quality with it.
    pub fn set_portafilter_present(&mut self, present: bool) {
        if present == self.portafilter_present {
            return;
        }
        self.portafilter_present = present;
        self.events.push(StateChange::Presence {
            item: ItemKind::Portafilter,
            present,
            slot: None,
        });
        if !present {
            self.set_output(0.0);
            self.set_quality(None);
        }
    }

    /// Also derives the processing flag.
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

    pub fn set_quality(&mut self, quality: Option<QualityResult>) {
        if quality != self.quality {
            self.quality = quality;
            self.events.push(StateChange::Quality {
                slot: None,
                result: quality,
            });
        }
    }

    /// Every field back to its default, recording what changed.
    pub fn reset(&mut self) {
        self.set_portafilter_present(false);
        self.set_stock(0.0);
        self.set_output(0.0);
        self.set_quality(None);
        self.set_machine_state(MachineState::Idle);
        self.set_level(0);
    }

    // ── Events ───────────────────────────────────────────────────

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
