//! Grinder state holder.

use crate::events::{EventQueue, StateChange, StationEvent};
use crate::fsm::MachineState;
use crate::items::{GrindSize, ItemKind};
use crate::quality::QualityResult;

#[derive(Debug)]
pub struct GrinderState {
    bean_capacity: u32,
    bean_fills: u32,
    output_size: Option<GrindSize>,
    output_g: f32,
    machine_state: MachineState,
    level: u8,
    is_processing: bool,
    quality: Option<QualityResult>,
    events: EventQueue,
}

impl GrinderState {
    pub fn new(bean_capacity: u32) -> Self {
        Self {
            bean_capacity,
            bean_fills: 0,
            output_size: None,
            output_g: 0.0,
            machine_state: MachineState::Idle,
            level: 0,
            is_processing: false,
            quality: None,
            events: EventQueue::new(),
        }
    }

    pub fn bean_fills(&self) -> u32 {
        self.bean_fills
    }

    pub fn output_size(&self) -> Option<GrindSize> {
        self.output_size
    }

    pub fn output(&self) -> f32 {
        self.output_g
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

    /// Output at Large: it has to be taken before grinding again.
    pub fn output_full(&self) -> bool {
        self.output_size.is_some_and(GrindSize::is_max)
    }

    pub fn should_be_ready(&self) -> bool {
        self.bean_fills > 0 && !self.output_full()
    }

    pub fn can_start_processing(&self) -> bool {
        self.machine_state == MachineState::Ready && !self.is_processing
    }

    /// Clamped to the hopper capacity.
    pub fn set_bean_fills(&mut self, fills: u32) {
        let fills = fills.min(self.bean_capacity);
        if fills != self.bean_fills {
            self.bean_fills = fills;
            self.events.push(StateChange::BeanFills(fills));
        }
    }

    /// Set or clear the ground output.  Clearing it drops its quality.
    pub fn set_output(&mut self, output: Option<(GrindSize, f32)>) {
        let size = output.map(|(s, _)| s);
        let grams = output.map_or(0.0, |(_, g)| g.max(0.0));

        let was_present = self.output_size.is_some();
        if size != self.output_size {
            self.output_size = size;
            self.events.push(StateChange::GrindSize(size));
        }
        if grams != self.output_g {
            self.output_g = grams;
            self.events.push(StateChange::Output(grams));
        }
        if was_present != size.is_some() {
            self.events.push(StateChange::Presence {
                item: ItemKind::GroundCoffee,
                present: size.is_some(),
                slot: None,
            });
        }
        if size.is_none() {
            self.set_quality(None);
        }
    }

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

    pub fn reset(&mut self) {
        self.set_bean_fills(0);
        self.set_output(None);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_clamp_and_record_once() {
        let mut s = GrinderState::new(10);
        s.set_bean_fills(12);
        assert_eq!(s.bean_fills(), 10);
        s.set_bean_fills(10);
        assert_eq!(s.drain_events(), vec![StationEvent::Field(StateChange::BeanFills(10))]);
    }

    #[test]
    fn clearing_output_drops_quality() {
        let mut s = GrinderState::new(10);
        s.set_output(Some((GrindSize::Small, 6.0)));
        s.set_quality(Some(crate::quality::QualityResult {
            score: 0.4,
            level: crate::quality::QualityLevel::Poor,
            amount: 6.0,
        }));
        s.set_output(None);
        assert!(s.quality().is_none());
        assert_eq!(s.output(), 0.0);
    }

    #[test]
    fn full_output_blocks_readiness() {
        let mut s = GrinderState::new(10);
        s.set_bean_fills(3);
        assert!(s.should_be_ready());
        s.set_output(Some((GrindSize::Large, 18.0)));
        assert!(s.output_full());
        assert!(!s.should_be_ready());
    }
}
