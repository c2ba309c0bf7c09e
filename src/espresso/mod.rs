//! Multi-slot espresso machine.
//!
//! ```text
//!            ┌────────── EspressoMachine ──────────┐
//!            │ slot 0   slot 1   slot 2   slot 3   │
//!  process:  │ [FSM]    [FSM]    [FSM]    [FSM]    │
//!  level 0-1 │  ✓        ✓        ✗        ✗      │
//!  level 2   │  ✓        ✓        ✓        ✓      │
//!            └──── aggregate MachineState ─────────┘
//! ```
//!
//! Every slot runs its own processing cycle.  A slot is ready with a dosed
//! portafilter and an empty cup; a finished shot lands in the cup and
//! leaves a spent portafilter.
//!
//! Slot policies:
//! - taking the portafilter or the cup from a brewing slot aborts that
//!   shot (progress back to 0, no quality);
//! - an upgrade keeps running shots and opens new slots Idle;
//! - a level with fewer slots cancels shots in the slots it closes, but
//!   their items can still be taken.

pub mod logic;
pub mod slot;
pub mod state;

use std::sync::Arc;

use log::{info, warn};

use crate::config::{EspressoConfig, InteractionType, MAX_BREW_SLOTS};
use crate::error::{Outcome, Rejection, Result};
use crate::events::StationEvent;
use crate::fsm::MachineState;
use crate::items::{Bounced, Cup, DropTarget, Espresso, Item, ItemKind, Portafilter};
use crate::process::MachineProcess;

pub use logic::{BrewValidation, EspressoLogic, GUARANTEED_QUALITY, SlotStatus};
pub use slot::BrewingSlot;
pub use state::EspressoState;

const NAME: &str = "Espresso";

pub struct EspressoMachine {
    logic: EspressoLogic,
    state: EspressoState,
    processes: [MachineProcess; MAX_BREW_SLOTS],
    validation: BrewValidation,
}

impl EspressoMachine {
    pub fn new(config: Arc<EspressoConfig>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            logic: EspressoLogic::new(config),
            state: EspressoState::new(),
            processes: core::array::from_fn(|_| MachineProcess::new(NAME)),
            validation: BrewValidation::default(),
        })
    }

    pub fn logic(&self) -> &EspressoLogic {
        &self.logic
    }

    pub fn state(&self) -> &EspressoState {
        &self.state
    }

    pub fn slot(&self, index: usize) -> Option<&BrewingSlot> {
        self.state.slot(index)
    }

    pub fn machine_state(&self) -> MachineState {
        self.state.machine_state()
    }

    pub fn level(&self) -> u8 {
        self.state.level()
    }

    pub fn interaction(&self) -> InteractionType {
        self.logic.interaction(self.state.level())
    }

    pub fn available_slot_count(&self) -> usize {
        self.logic.available_slot_count(self.state.level())
    }

    pub fn progress(&self, index: usize) -> Option<f32> {
        self.processes.get(index).map(MachineProcess::progress)
    }

    /// Slot report from the last tick.
    pub fn validation(&self) -> &BrewValidation {
        &self.validation
    }

    // ── Items ────────────────────────────────────────────────────

    pub fn place_portafilter(&mut self, index: usize, portafilter: Portafilter) -> Outcome<()> {
        self.logic.validate_slot(self.state.level(), index)?;
        if self.state.slots()[index].filter_present() {
            return Err(Rejection::Occupied(ItemKind::Portafilter));
        }
        self.state.set_portafilter(index, Some(portafilter));
        self.sync_slot(index);
        Ok(())
    }

    pub fn take_portafilter(&mut self, index: usize) -> Outcome<Portafilter> {
        self.check_physical(index)?;
        let Some(portafilter) = self.state.slots()[index].portafilter().copied() else {
            return Err(Rejection::NothingToTake(ItemKind::Portafilter));
        };
        self.abort_slot(index, "portafilter removed");
        self.state.set_portafilter(index, None);
        self.sync_slot(index);
        Ok(portafilter)
    }

    pub fn place_cup(&mut self, index: usize, cup: Cup) -> Outcome<()> {
        self.logic.validate_slot(self.state.level(), index)?;
        if self.state.slots()[index].vessel_present() {
            return Err(Rejection::Occupied(ItemKind::Cup));
        }
        self.state.set_cup(index, Some(cup));
        self.sync_slot(index);
        Ok(())
    }

    pub fn take_cup(&mut self, index: usize) -> Outcome<Cup> {
        self.check_physical(index)?;
        let Some(cup) = self.state.slots()[index].cup().copied() else {
            return Err(Rejection::NothingToTake(ItemKind::Cup));
        };
        self.abort_slot(index, "cup removed");
        self.state.set_cup(index, None);
        self.sync_slot(index);
        Ok(cup)
    }

    fn check_physical(&self, index: usize) -> Outcome<()> {
        if index < MAX_BREW_SLOTS {
            Ok(())
        } else {
            Err(Rejection::InvalidSlot {
                index,
                available: self.available_slot_count(),
            })
        }
    }

    // ── Controls ─────────────────────────────────────────────────

    pub fn press_button(&mut self, index: usize) -> Outcome<()> {
        self.require_interaction(InteractionType::ButtonPress)?;
        self.start_brew(index)
    }

    pub fn pull_lever(&mut self, index: usize) -> Outcome<()> {
        self.require_interaction(InteractionType::ManualLever)?;
        self.start_brew(index)
    }

    fn require_interaction(&self, used: InteractionType) -> Outcome<()> {
        let expected = self.interaction();
        if expected == used {
            Ok(())
        } else {
            Err(Rejection::WrongInteraction { expected })
        }
    }

    fn start_brew(&mut self, index: usize) -> Outcome<()> {
        let level = self.state.level();
        self.logic.validate_slot(level, index)?;
        let slot = &self.state.slots()[index];
        if slot.is_active() {
            return Err(Rejection::AlreadyProcessing);
        }
        let Some(portafilter) = slot.portafilter().copied() else {
            return Err(Rejection::MissingInput(ItemKind::Portafilter));
        };
        if !portafilter.has_coffee() {
            return Err(Rejection::MissingInput(ItemKind::GroundCoffee));
        }
        match slot.cup() {
            None => return Err(Rejection::MissingInput(ItemKind::Cup)),
            Some(cup) if !cup.is_empty() => return Err(Rejection::NotReady),
            Some(_) => {}
        }

        self.processes[index].request_start(self.logic.brew_duration(level))?;
        self.state.set_input_quality(index, portafilter.quality);
        self.state.set_result(index, None);
        self.state.set_elapsed(index, 0.0);
        self.sync_slot(index);
        Ok(())
    }

    fn abort_slot(&mut self, index: usize, why: &str) {
        if self.processes[index].cancel() {
            warn!("{NAME}: slot {} shot aborted, {why}", index + 1);
            self.state.set_elapsed(index, 0.0);
            self.state.set_input_quality(index, 0.0);
            self.state.set_result(index, None);
            self.state.push_event(StationEvent::Progress {
                progress: 0.0,
                slot: Some(index),
            });
        }
    }

    // ── Time ─────────────────────────────────────────────────────

    pub fn tick(&mut self, dt_secs: f32) {
        let level = self.state.level();
        self.validation = self.validate();

        for index in self.validation.ready.clone() {
            let ready = self.state.slots()[index].is_ready_to_brew();
            if self.logic.should_auto_brew(level, ready) {
                if let Err(r) = self.start_brew(index) {
                    warn!("{NAME}: auto-brew in slot {} could not start: {r}", index + 1);
                }
            }
        }

        for index in 0..MAX_BREW_SLOTS {
            self.set_slot_inputs(index);
            let report = self.processes[index].tick(dt_secs);
            if report.state == MachineState::Processing || report.completed {
                let elapsed = report.progress * self.processes[index].cycle_duration();
                self.state.set_elapsed(index, elapsed);
                self.state.push_event(StationEvent::Progress {
                    progress: report.progress,
                    slot: Some(index),
                });
            }
            self.state.set_slot_state(index, report.state);
            if report.completed {
                self.complete_shot(index);
            }
        }
        self.sync_aggregate();
    }

    fn complete_shot(&mut self, index: usize) {
        let level = self.state.level();
        let slot = &self.state.slots()[index];
        let coffee_g = slot.portafilter().map_or(0.0, |p| p.coffee_g);
        let result = self
            .logic
            .shot_quality(level, slot.input_quality(), coffee_g);

        let cup = Cup {
            espresso: Some(Espresso {
                quality: result.score,
                level: result.level,
            }),
        };
        self.state.set_cup(index, Some(cup));
        self.state
            .set_portafilter(index, Some(Portafilter::empty()));
        self.state.set_result(index, Some(result));
        info!(
            "{NAME}: slot {} pulled a {} shot ({:.2})",
            index + 1,
            result.label(),
            result.score
        );
        self.state.push_event(StationEvent::Completed {
            slot: Some(index),
            quality: Some(result),
        });
        self.sync_slot(index);
    }

    /// Classify every slot for the current level.
    pub fn validate(&self) -> BrewValidation {
        let statuses = self.state.slots().iter().map(|s| SlotStatus {
            index: s.index(),
            state: s.machine_state(),
            occupied: s.is_occupied(),
        });
        self.logic.validate_brewing(self.state.level(), statuses)
    }

    // ── Upgrades ─────────────────────────────────────────────────

    pub fn set_level(&mut self, level: u8) {
        if level == self.state.level() {
            return;
        }
        self.state.set_level(level);
        let available = self.available_slot_count();
        for index in available..MAX_BREW_SLOTS {
            self.abort_slot(index, "slot closed by level change");
            self.sync_slot(index);
        }

        let interaction = self.interaction();
        info!(
            "{NAME}: level {level} ({interaction}, {available} slots, {:.2}s per shot)",
            self.logic.brew_duration(level)
        );
        self.state.push_event(StationEvent::Upgraded { level, interaction });
        self.state.notice(format!(
            "Espresso machine upgraded: {available} slots, {interaction}"
        ));

        self.validation = self.validate();
        if self.validation.has_errors() {
            let closed: Vec<String> = self
                .validation
                .invalid
                .iter()
                .map(|i| (i + 1).to_string())
                .collect();
            warn!("{NAME}: occupied slots {} now unavailable", closed.join(", "));
            self.state.notice(format!(
                "Slots {} are unavailable at this level, take their items back",
                closed.join(", ")
            ));
        }
        self.sync_aggregate();
    }

    pub fn reset(&mut self) {
        for process in &mut self.processes {
            process.reset();
        }
        self.state.reset();
        self.validation = BrewValidation::default();
    }

    pub fn drain_events(&mut self) -> Vec<StationEvent> {
        self.state.drain_events()
    }

    // ── Sync ─────────────────────────────────────────────────────

    fn set_slot_inputs(&mut self, index: usize) {
        let ready = index < self.available_slot_count()
            && self.state.slots()[index].is_ready_to_brew();
        self.processes[index].set_inputs_ready(ready);
    }

    fn sync_slot(&mut self, index: usize) {
        self.set_slot_inputs(index);
        let process = &mut self.processes[index];
        if !process.is_processing() {
            process.refresh();
        }
        let state = process.state();
        self.state.set_slot_state(index, state);
        self.sync_aggregate();
    }

    fn sync_aggregate(&mut self) {
        let aggregate = self
            .logic
            .aggregate_state(self.state.slots().iter().map(BrewingSlot::machine_state));
        self.state.set_machine_state(aggregate);
    }

    /// First usable slot for `kind` when the drop named none.
    fn pick_slot(&self, kind: ItemKind) -> Option<usize> {
        (0..self.available_slot_count()).find(|&i| {
            let slot = &self.state.slots()[i];
            match kind {
                ItemKind::Portafilter => !slot.filter_present(),
                ItemKind::Cup => !slot.vessel_present(),
                ItemKind::GroundCoffee | ItemKind::BeanBag => false,
            }
        })
    }
}

impl DropTarget for EspressoMachine {
    fn accepts(&self, kind: ItemKind, slot: Option<usize>) -> bool {
        match slot {
            None => self.pick_slot(kind).is_some(),
            Some(i) => {
                i < self.available_slot_count()
                    && match kind {
                        ItemKind::Portafilter => !self.state.slots()[i].filter_present(),
                        ItemKind::Cup => !self.state.slots()[i].vessel_present(),
                        ItemKind::GroundCoffee | ItemKind::BeanBag => false,
                    }
            }
        }
    }

    fn receive(&mut self, item: Item, slot: Option<usize>) -> core::result::Result<(), Bounced> {
        let kind = item.kind();
        let target = match slot.or_else(|| self.pick_slot(kind)) {
            Some(i) => i,
            None => {
                let reason = match kind {
                    ItemKind::Portafilter | ItemKind::Cup => Rejection::Occupied(kind),
                    _ => Rejection::WrongItem(kind),
                };
                return Err(Bounced::new(item, reason));
            }
        };
        let placed = match item {
            Item::Portafilter(p) => self.place_portafilter(target, p),
            Item::Cup(c) => self.place_cup(target, c),
            Item::GroundCoffee(_) | Item::BeanBag { .. } => Err(Rejection::WrongItem(kind)),
        };
        placed.map_err(|r| Bounced::new(item, r))
    }
}
