//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every application event as one
//! structured line through the `log` facade.  A UI binding would implement
//! the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::events::{StateChange, StationEvent};

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | bar open"),
            AppEvent::Rejected { station, reason } => match station {
                Some(s) => info!("REJECT | {} | {}", s, reason),
                None => info!("REJECT | {}", reason),
            },
            AppEvent::Station { station, event } => match event {
                StationEvent::Field(StateChange::Machine { from, to, slot }) => {
                    info!("STATE | {} slot={:?} | {:?} -> {:?}", station, slot, from, to);
                }
                StationEvent::Field(change) => {
                    info!("FIELD | {} | {:?}", station, change);
                }
                StationEvent::Progress { progress, slot } => {
                    info!(
                        "PROGRESS | {} slot={:?} | {:.0}%",
                        station,
                        slot,
                        progress * 100.0
                    );
                }
                StationEvent::Completed { slot, quality } => match quality {
                    Some(q) => info!(
                        "DONE | {} slot={:?} | {:.1} scored {:.2} ({})",
                        station, slot, q.amount, q.score, q.level
                    ),
                    None => info!("DONE | {} slot={:?}", station, slot),
                },
                StationEvent::Upgraded { level, interaction } => {
                    info!("UPGRADE | {} | level={} {}", station, level, interaction);
                }
                StationEvent::Notice(text) => info!("NOTICE | {} | {}", station, text),
            },
        }
    }
}
