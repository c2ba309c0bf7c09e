//! Machine process core for a coffee bar.
//!
//! Three stations share one process driver: a grinder turning beans into
//! ground coffee, a doser filling portafilters, and a multi-slot espresso
//! machine.  The library is presentation-agnostic; a host owns a
//! [`CafeService`], calls `tick(dt)` from its loop and renders the events
//! it receives.  The library never installs a logger.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dosing;
pub mod error;
pub mod espresso;
pub mod events;
pub mod fsm;
pub mod grinder;
pub mod items;
pub mod process;
pub mod quality;

pub use app::commands::{AppCommand, CommandOutcome, StationKind};
pub use app::events::AppEvent;
pub use app::ports::{ConfigError, ConfigPort, EventSink};
pub use app::service::CafeService;
pub use config::{InteractionType, MachineConfig};
pub use error::{Error, Outcome, Rejection, Result};
pub use fsm::MachineState;
pub use items::{Cup, DropTarget, Espresso, GrindSize, GroundCoffee, Item, ItemKind, Portafilter};
pub use quality::{QualityLevel, QualityResult};
