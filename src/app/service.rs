//! Application service: the hexagonal core.
//!
//! [`CafeService`] owns the three stations and the shared configuration.
//! It exposes a presentation-agnostic API.  Every outbound notification
//! flows through an [`EventSink`] passed in at the call site, so the whole
//! bar is testable with a recording sink.
//!
//! ```text
//!  AppCommand ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          CafeService          │
//!  ConfigPort ──▶ │  Grinder · Doser · Espresso   │
//!                 └──────────────────────────────┘
//! ```

use std::sync::Arc;

use log::{info, warn};

use crate::config::MachineConfig;
use crate::dosing::DosingStation;
use crate::error::{Outcome, Rejection, Result};
use crate::espresso::EspressoMachine;
use crate::grinder::GrinderStation;
use crate::items::{DropTarget, Item, ItemKind};

use super::commands::{AppCommand, CommandOutcome, StationKind};
use super::events::AppEvent;
use super::ports::{ConfigError, ConfigPort, EventSink};

// ───────────────────────────────────────────────────────────────
// CafeService
// ───────────────────────────────────────────────────────────────

pub struct CafeService {
    config: Arc<MachineConfig>,
    dosing: DosingStation,
    grinder: GrinderStation,
    espresso: EspressoMachine,
    tick_count: u64,
}

impl CafeService {
    /// Build every station from a validated configuration.
    pub fn new(config: MachineConfig) -> Result<Self> {
        config.validate()?;
        let dosing = DosingStation::new(Arc::new(config.dosing.clone()))?;
        let grinder = GrinderStation::new(Arc::new(config.grinder.clone()))?;
        let espresso = EspressoMachine::new(Arc::new(config.espresso.clone()))?;
        Ok(Self {
            config: Arc::new(config),
            dosing,
            grinder,
            espresso,
            tick_count: 0,
        })
    }

    /// Load configuration through a port; nothing stored means defaults.
    pub fn from_port(port: &impl ConfigPort) -> Result<Self> {
        let config = match port.load() {
            Ok(config) => config,
            Err(ConfigError::NotFound) => {
                info!("CafeService: no stored config, using defaults");
                MachineConfig::default()
            }
            Err(e) => return Err(e.into()),
        };
        Self::new(config)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce start and publish any state the stations settled into.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!(
            "CafeService: started ({} espresso slots)",
            self.espresso.available_slot_count()
        );
        sink.emit(&AppEvent::Started);
        self.flush(sink);
    }

    /// Advance every station by `dt_secs`.
    pub fn tick(&mut self, dt_secs: f32, sink: &mut impl EventSink) {
        self.tick_count += 1;
        self.grinder.tick(dt_secs);
        self.dosing.tick(dt_secs);
        self.espresso.tick(dt_secs);
        self.flush(sink);
    }

    // ── Commands ──────────────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> CommandOutcome {
        let station = cmd.station();
        let outcome = self.dispatch(cmd);
        if let CommandOutcome::Rejected { reason, .. } = &outcome {
            match station {
                Some(s) => warn!("CafeService: {} rejected: {}", s, reason),
                None => warn!("CafeService: command rejected: {}", reason),
            }
            sink.emit(&AppEvent::Rejected {
                station,
                reason: *reason,
            });
        }
        self.flush(sink);
        outcome
    }

    fn dispatch(&mut self, cmd: AppCommand) -> CommandOutcome {
        match cmd {
            AppCommand::AddBeans { fills } => done(self.grinder.add_beans(fills)),
            AppCommand::Drop { target, slot, item } => {
                let received = match target {
                    StationKind::Dosing => self.dosing.receive(item, slot),
                    StationKind::Grinder => self.grinder.receive(item, slot),
                    StationKind::Espresso => self.espresso.receive(item, slot),
                };
                match received {
                    Ok(()) => CommandOutcome::Done,
                    Err(bounced) => CommandOutcome::Rejected {
                        reason: bounced.reason,
                        returned: Some(bounced.item),
                    },
                }
            }
            AppCommand::Take { target, slot, kind } => self.take(target, slot, kind),
            AppCommand::PullLever { station, slot } => done(match station {
                StationKind::Dosing => self.dosing.pull_lever(),
                StationKind::Grinder => self.grinder.pull_lever(),
                StationKind::Espresso => {
                    let index = self.control_slot(slot);
                    self.espresso.pull_lever(index)
                }
            }),
            AppCommand::PressButton { station, slot } => done(match station {
                StationKind::Dosing => self.dosing.press_button(),
                StationKind::Grinder => self.grinder.press_button(),
                StationKind::Espresso => {
                    let index = self.control_slot(slot);
                    self.espresso.press_button(index)
                }
            }),
            AppCommand::Transfer { grams } => done(self.dosing.transfer(grams)),
            AppCommand::Upgrade { station, level } => {
                match station {
                    StationKind::Dosing => self.dosing.set_level(level),
                    StationKind::Grinder => self.grinder.set_level(level),
                    StationKind::Espresso => self.espresso.set_level(level),
                }
                CommandOutcome::Done
            }
            AppCommand::Reset { station } => {
                for s in StationKind::ALL {
                    if station.is_none_or(|target| target == s) {
                        self.reset_station(s);
                    }
                }
                CommandOutcome::Done
            }
        }
    }

    fn take(&mut self, target: StationKind, slot: Option<usize>, kind: ItemKind) -> CommandOutcome {
        let taken = match (target, kind) {
            (StationKind::Dosing, ItemKind::Portafilter) => {
                self.dosing.take_portafilter().map(Item::Portafilter)
            }
            (StationKind::Grinder, ItemKind::GroundCoffee) => {
                self.grinder.take_output().map(Item::GroundCoffee)
            }
            (StationKind::Espresso, ItemKind::Portafilter) => {
                let index = self.holding_slot(slot, kind);
                self.espresso.take_portafilter(index).map(Item::Portafilter)
            }
            (StationKind::Espresso, ItemKind::Cup) => {
                let index = self.holding_slot(slot, kind);
                self.espresso.take_cup(index).map(Item::Cup)
            }
            _ => Err(Rejection::NothingToTake(kind)),
        };
        match taken {
            Ok(item) => CommandOutcome::Item(item),
            Err(reason) => CommandOutcome::Rejected {
                reason,
                returned: None,
            },
        }
    }

    fn reset_station(&mut self, station: StationKind) {
        info!("CafeService: resetting {}", station);
        match station {
            StationKind::Dosing => self.dosing.reset(),
            StationKind::Grinder => self.grinder.reset(),
            StationKind::Espresso => self.espresso.reset(),
        }
    }

    /// Named slot, or the first slot ready to brew, or slot 0.
    fn control_slot(&self, slot: Option<usize>) -> usize {
        slot.unwrap_or_else(|| {
            let available = self.espresso.available_slot_count();
            self.espresso
                .state()
                .slots()
                .iter()
                .take(available)
                .position(|s| s.is_ready_to_brew())
                .unwrap_or(0)
        })
    }

    /// Named slot, or the first slot holding `kind`, or slot 0.
    fn holding_slot(&self, slot: Option<usize>, kind: ItemKind) -> usize {
        slot.unwrap_or_else(|| {
            self.espresso
                .state()
                .slots()
                .iter()
                .position(|s| match kind {
                    ItemKind::Portafilter => s.filter_present(),
                    ItemKind::Cup => s.vessel_present(),
                    ItemKind::GroundCoffee | ItemKind::BeanBag => false,
                })
                .unwrap_or(0)
        })
    }

    /// Forward every queued station event to the sink.
    fn flush(&mut self, sink: &mut impl EventSink) {
        for event in self.grinder.drain_events() {
            sink.emit(&AppEvent::Station {
                station: StationKind::Grinder,
                event,
            });
        }
        for event in self.dosing.drain_events() {
            sink.emit(&AppEvent::Station {
                station: StationKind::Dosing,
                event,
            });
        }
        for event in self.espresso.drain_events() {
            sink.emit(&AppEvent::Station {
                station: StationKind::Espresso,
                event,
            });
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn dosing(&self) -> &DosingStation {
        &self.dosing
    }

    pub fn grinder(&self) -> &GrinderStation {
        &self.grinder
    }

    pub fn espresso(&self) -> &EspressoMachine {
        &self.espresso
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

fn done<T>(outcome: Outcome<T>) -> CommandOutcome {
    match outcome {
        Ok(_) => CommandOutcome::Done,
        Err(reason) => CommandOutcome::Rejected {
            reason,
            returned: None,
        },
    }
}
