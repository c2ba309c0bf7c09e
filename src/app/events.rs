//! Outbound application events.
//!
//! The [`CafeService`](super::service::CafeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: animate a progress bar, play a
//! sound, show a toast, write a log line.

use crate::error::Rejection;
use crate::events::StationEvent;

use super::commands::StationKind;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.
    Started,

    /// Something changed inside a station.
    Station {
        station: StationKind,
        event: StationEvent,
    },

    /// A command was refused; `reason` displays as the player notice.
    Rejected {
        station: Option<StationKind>,
        reason: Rejection,
    },
}
