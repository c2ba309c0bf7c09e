//! Station change notifications.
//!
//! Every station state records one [`StateChange`] per logical field whose
//! value actually changed; no-op sets record nothing.  The station adds
//! progress, completion, upgrade and notice events on top, and the owner
//! drains the whole queue after each command or tick.
//!
//! ```text
//! ┌────────────┐  setters   ┌─────────────┐  drain_events  ┌─────────────┐
//! │  Station   │──────────▶│ EventQueue  │───────────────▶│ CafeService │──▶ EventSink
//! │  (tick,    │  progress  │  (FIFO)     │                │             │
//! │  commands) │──────────▶│             │                │             │
//! └────────────┘            └─────────────┘                └─────────────┘
//! ```

use crate::config::InteractionType;
use crate::fsm::MachineState;
use crate::items::{GrindSize, ItemKind};
use crate::quality::QualityResult;

/// A single field of a station state that changed value.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Stored source material (g for the doser, unused elsewhere).
    Stock(f32),
    /// Amount held by the output vessel (g).
    Output(f32),
    /// A required input was placed or removed.  `slot` is set on
    /// multi-slot stations.
    Presence {
        item: ItemKind,
        present: bool,
        slot: Option<usize>,
    },
    Level(u8),
    Machine {
        from: MachineState,
        to: MachineState,
        slot: Option<usize>,
    },
    Processing {
        active: bool,
        slot: Option<usize>,
    },
    /// Last computed quality; `None` once the quantity it scored is gone.
    Quality {
        slot: Option<usize>,
        result: Option<QualityResult>,
    },
    GrindSize(Option<GrindSize>),
    BeanFills(u32),
}

/// Everything a station reports to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum StationEvent {
    Field(StateChange),
    Progress {
        progress: f32,
        slot: Option<usize>,
    },
    Completed {
        slot: Option<usize>,
        quality: Option<QualityResult>,
    },
    Upgraded {
        level: u8,
        interaction: InteractionType,
    },
    /// User-facing notification text.
    Notice(String),
}

impl From<StateChange> for StationEvent {
    fn from(change: StateChange) -> Self {
        Self::Field(change)
    }
}

/// FIFO of pending station events.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<StationEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: impl Into<StationEvent>) {
        self.events.push(event.into());
    }

    pub fn notice(&mut self, text: impl Into<String>) {
        self.events.push(StationEvent::Notice(text.into()));
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<StationEvent> {
        core::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending events without consuming them.
    pub fn peek(&self) -> &[StationEvent] {
        &self.events
    }
}
