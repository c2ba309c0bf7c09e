//! Mock adapters for integration tests.
//!
//! `RecordingSink` keeps every emitted event so tests can assert on the
//! full history; `MockConfig` serves a canned load result and counts saves.

use std::cell::{Cell, RefCell};

use barista::app::events::AppEvent;
use barista::app::ports::{ConfigError, ConfigPort, EventSink};
use barista::config::MachineConfig;
use barista::events::{StateChange, StationEvent};
use barista::{CafeService, MachineState, StationKind};

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Station events of one station, in order.
    pub fn station(&self, kind: StationKind) -> Vec<&StationEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Station { station, event } if *station == kind => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Machine-level (slot `None`) state sequence of one station.
    pub fn transitions(&self, kind: StationKind) -> Vec<MachineState> {
        self.station(kind)
            .into_iter()
            .filter_map(|e| match e {
                StationEvent::Field(StateChange::Machine { to, slot: None, .. }) => Some(*to),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Station {
                    event: StationEvent::Notice(text),
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn rejections(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Rejected { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockConfig ────────────────────────────────────────────────

pub struct MockConfig {
    pub stored: RefCell<Result<MachineConfig, ConfigError>>,
    pub saves: Cell<u32>,
}

#[allow(dead_code)]
impl MockConfig {
    pub fn empty() -> Self {
        Self::with(Err(ConfigError::NotFound))
    }

    pub fn with(stored: Result<MachineConfig, ConfigError>) -> Self {
        Self {
            stored: RefCell::new(stored),
            saves: Cell::new(0),
        }
    }
}

impl ConfigPort for MockConfig {
    fn load(&self) -> Result<MachineConfig, ConfigError> {
        self.stored.borrow().clone()
    }

    fn save(&self, config: &MachineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.stored.borrow_mut() = Ok(config.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────

pub const DT: f32 = 0.1;

/// Tick long enough for `secs` to elapse despite f32 accumulation.
#[allow(dead_code)]
pub fn run(svc: &mut CafeService, sink: &mut RecordingSink, secs: f32) {
    let steps = (secs / DT).round() as u32 + 1;
    for _ in 0..steps {
        svc.tick(DT, sink);
    }
}
