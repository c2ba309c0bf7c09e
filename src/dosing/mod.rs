//! Ground-coffee doser station.
//!
//! Storage is filled with ground coffee; a cycle moves a dose into the
//! portafilter.  At level 0 every lever pull dispenses one timed portion,
//! at level 1 a button press seeks the ideal dose, and at level 2 the
//! doser tops the portafilter up on its own.
//!
//! Removing the portafilter while a cycle runs aborts the cycle; nothing
//! is transferred.

pub mod logic;
pub mod state;

use std::sync::Arc;

use log::{info, warn};

use crate::config::{DosingConfig, InteractionType, level_index};
use crate::error::{Outcome, Rejection, Result};
use crate::events::StationEvent;
use crate::fsm::MachineState;
use crate::items::{Bounced, DropTarget, Item, ItemKind, Portafilter};
use crate::process::{MachineProcess, TickReport};

pub use logic::{AutoDose, DosingLogic};
pub use state::DosingState;

const NAME: &str = "Doser";

/// One doser instance.
pub struct DosingStation {
    logic: DosingLogic,
    state: DosingState,
    process: MachineProcess,
    /// Grams the running cycle moves on completion.
    dose_in_flight: Option<f32>,
}

impl DosingStation {
    /// Fails when the config section is invalid.
    pub fn new(config: Arc<DosingConfig>) -> Result<Self> {
        config.validate()?;
        let state = DosingState::new(config.capacity_g);
        Ok(Self {
            logic: DosingLogic::new(config),
            state,
            process: MachineProcess::new(NAME),
            dose_in_flight: None,
        })
    }

    pub fn logic(&self) -> &DosingLogic {
        &self.logic
    }

    pub fn state(&self) -> &DosingState {
        &self.state
    }

    pub fn machine_state(&self) -> MachineState {
        self.state.machine_state()
    }

    pub fn progress(&self) -> f32 {
        self.process.progress()
    }

    pub fn level(&self) -> u8 {
        self.state.level()
    }

    pub fn interaction(&self) -> InteractionType {
        self.logic.interaction(self.state.level())
    }

    // ── Storage ──────────────────────────────────────────────────

    /// Pour ground coffee into storage.  Returns the grams that fit.
    pub fn add_coffee(&mut self, grams: f32) -> Outcome<f32> {
        let added = self
            .logic
            .validate_add(self.state.stock(), grams)
            .inspect_err(|r| warn!("{NAME}: add {grams:.1} g rejected: {r}"))?;
        self.state.set_stock(self.state.stock() + added);
        self.sync_inputs();
        Ok(added)
    }

    // ── Portafilter ──────────────────────────────────────────────

    pub fn place_portafilter(&mut self, portafilter: Portafilter) -> Outcome<()> {
        if self.state.portafilter_present() {
            return Err(Rejection::Occupied(ItemKind::Portafilter));
        }
        self.state.set_portafilter_present(true);
        self.state.set_output(portafilter.coffee_g);
        self.rescore();
        self.sync_inputs();
        Ok(())
    }

    /// Hand the portafilter back with whatever dose it holds.
    pub fn take_portafilter(&mut self) -> Outcome<Portafilter> {
        if !self.state.portafilter_present() {
            return Err(Rejection::NothingToTake(ItemKind::Portafilter));
        }
        if self.process.cancel() {
            self.dose_in_flight = None;
            warn!("{NAME}: portafilter removed mid-cycle, dose aborted");
        }
        let coffee_g = self.state.output();
        let quality = self.state.quality().map_or(0.0, |q| q.score);
        self.state.set_portafilter_present(false);
        self.sync_inputs();
        Ok(Portafilter::with_dose(coffee_g, quality))
    }

    /// Move `grams` straight from storage into the portafilter.
    /// Returns the grams moved.
    pub fn transfer(&mut self, grams: f32) -> Outcome<f32> {
        if !self.state.portafilter_present() {
            return Err(Rejection::MissingInput(ItemKind::Portafilter));
        }
        if self.state.is_processing() {
            return Err(Rejection::AlreadyProcessing);
        }
        let moved = self
            .logic
            .validate_transfer(self.state.stock(), self.state.output(), grams)?;
        self.move_dose(moved);
        Ok(moved)
    }

    // ── Controls ─────────────────────────────────────────────────

    pub fn pull_lever(&mut self) -> Outcome<()> {
        self.require_interaction(InteractionType::ManualLever)?;
        self.start_cycle()
    }

    pub fn press_button(&mut self) -> Outcome<()> {
        self.require_interaction(InteractionType::ButtonPress)?;
        self.start_cycle()
    }

    fn require_interaction(&self, used: InteractionType) -> Outcome<()> {
        let expected = self.interaction();
        if expected == used {
            Ok(())
        } else {
            Err(Rejection::WrongInteraction { expected })
        }
    }

    fn start_cycle(&mut self) -> Outcome<()> {
        if !self.state.portafilter_present() {
            return Err(Rejection::MissingInput(ItemKind::Portafilter));
        }
        if self.state.is_processing() {
            return Err(Rejection::AlreadyProcessing);
        }
        let level = self.state.level();
        let amount = self
            .logic
            .plan_cycle(level, self.state.stock(), self.state.output())?;
        self.process
            .request_start(self.logic.process_duration(level))?;
        self.dose_in_flight = Some(amount);
        self.sync_machine_state();
        Ok(())
    }

    // ── Time ─────────────────────────────────────────────────────

    pub fn tick(&mut self, dt_secs: f32) {
        self.sync_inputs();
        if self.process.state() == MachineState::Ready
            && self.logic.should_auto_dose(
                self.state.level(),
                self.state.portafilter_present(),
                self.state.stock(),
                self.state.output(),
            )
        {
            if let Err(r) = self.start_cycle() {
                warn!("{NAME}: auto-dose could not start: {r}");
            }
        }

        let report = self.process.tick(dt_secs);
        self.after_step(report);
    }

    fn after_step(&mut self, report: TickReport) {
        if report.state == MachineState::Processing || report.completed {
            self.state.push_event(StationEvent::Progress {
                progress: report.progress,
                slot: None,
            });
        }
        self.sync_machine_state();
        if report.completed {
            self.complete_cycle();
        }
    }

    fn complete_cycle(&mut self) {
        let Some(planned) = self.dose_in_flight.take() else {
            return;
        };
        let amount = planned
            .min(self.state.stock())
            .min(self.logic.portafilter_room(self.state.output()));
        self.move_dose(amount);
        let quality = self.state.quality();
        info!(
            "{NAME}: dosed {amount:.1} g, portafilter at {:.1} g ({})",
            self.state.output(),
            quality.map_or("empty", |q| q.label())
        );
        self.state.push_event(StationEvent::Completed {
            slot: None,
            quality,
        });
        self.sync_inputs();
    }

    fn move_dose(&mut self, grams: f32) {
        self.state.set_stock(self.state.stock() - grams);
        self.state.set_output(self.state.output() + grams);
        self.rescore();
    }

    fn rescore(&mut self) {
        let quality = self.logic.quality_of(self.state.output());
        self.state.set_quality(quality);
    }

    // ── Upgrades ─────────────────────────────────────────────────

    /// Takes effect from the next cycle.
    pub fn set_level(&mut self, level: u8) {
        if level == self.state.level() {
            return;
        }
        self.state.set_level(level);
        let interaction = self.interaction();
        info!(
            "{NAME}: level {level} ({interaction}, {:.2}s cycle)",
            self.logic.process_duration(level)
        );
        self.state.push_event(StationEvent::Upgraded { level, interaction });
        self.state.notice(format!(
            "{NAME} upgraded to level {}: {} at {:.1} g/s",
            level_index(level),
            interaction,
            self.logic.dispense_rate(level)
        ));
    }

    pub fn reset(&mut self) {
        self.process.reset();
        self.dose_in_flight = None;
        self.state.reset();
    }

    pub fn drain_events(&mut self) -> Vec<StationEvent> {
        self.state.drain_events()
    }

    // ── Sync ─────────────────────────────────────────────────────

    fn sync_inputs(&mut self) {
        self.process.set_inputs_ready(self.state.should_be_ready());
        if !self.process.is_processing() {
            self.process.refresh();
        }
        self.sync_machine_state();
    }

    fn sync_machine_state(&mut self) {
        self.state.set_machine_state(self.process.state());
    }
}

impl DropTarget for DosingStation {
    fn accepts(&self, kind: ItemKind, _slot: Option<usize>) -> bool {
        match kind {
            ItemKind::Portafilter => !self.state.portafilter_present(),
            ItemKind::GroundCoffee => self.logic.can_add(self.state.stock(), 1.0),
            ItemKind::Cup | ItemKind::BeanBag => false,
        }
    }

    fn receive(&mut self, item: Item, _slot: Option<usize>) -> core::result::Result<(), Bounced> {
        match item {
            Item::Portafilter(p) => self
                .place_portafilter(p)
                .map_err(|r| Bounced::new(item, r)),
            // Ground coffee beyond capacity spills.
            Item::GroundCoffee(g) => self
                .add_coffee(g.grams)
                .map(|_| ())
                .map_err(|r| Bounced::new(item, r)),
            Item::Cup(_) | Item::BeanBag { .. } => {
                Err(Bounced::new(item, Rejection::WrongItem(item.kind())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StateChange;
    use crate::items::{GrindSize, GroundCoffee};

    fn station() -> DosingStation {
        DosingStation::new(Arc::new(DosingConfig::default())).unwrap()
    }

    fn run(s: &mut DosingStation, secs: f32) {
        let steps = (secs / 0.1).round() as usize + 1;
        for _ in 0..steps {
            s.tick(0.1);
        }
    }

    #[test]
    fn invalid_config_fails_fast() {
        let cfg = DosingConfig {
            capacity_g: 0.0,
            ..DosingConfig::default()
        };
        assert!(DosingStation::new(Arc::new(cfg)).is_err());
    }

    #[test]
    fn end_to_end_transfer_is_perfect() {
        let mut s = station();
        assert_eq!(s.add_coffee(50.0), Ok(50.0));
        s.place_portafilter(Portafilter::empty()).unwrap();
        assert_eq!(s.transfer(18.0), Ok(18.0));
        assert_eq!(s.state().stock(), 32.0);
        assert_eq!(s.state().output(), 18.0);
        let q = s.state().quality().unwrap();
        assert_eq!(q.score, 1.0);
        assert_eq!(q.label(), "Perfect");
    }

    #[test]
    fn storage_stops_at_capacity() {
        let mut s = station();
        assert_eq!(s.add_coffee(80.0), Ok(80.0));
        assert_eq!(s.add_coffee(80.0), Ok(20.0));
        assert_eq!(s.add_coffee(1.0), Err(Rejection::AtCapacity));
        assert_eq!(s.add_coffee(0.0), Err(Rejection::NonPositiveAmount));
        assert_eq!(s.state().stock(), 100.0);
    }

    #[test]
    fn becomes_ready_with_portafilter_and_stock() {
        let mut s = station();
        assert_eq!(s.machine_state(), MachineState::Idle);
        s.place_portafilter(Portafilter::empty()).unwrap();
        assert_eq!(s.machine_state(), MachineState::Idle);
        s.add_coffee(30.0).unwrap();
        assert_eq!(s.machine_state(), MachineState::Ready);
    }

    #[test]
    fn lever_pull_dispenses_one_portion() {
        let mut s = station();
        s.add_coffee(50.0).unwrap();
        s.place_portafilter(Portafilter::empty()).unwrap();
        s.pull_lever().unwrap();
        assert_eq!(s.machine_state(), MachineState::Processing);
        assert_eq!(s.pull_lever(), Err(Rejection::AlreadyProcessing));

        run(&mut s, 1.0);
        assert_eq!(s.state().output(), 6.0);
        assert_eq!(s.state().stock(), 44.0);
        assert!(s.drain_events().iter().any(|e| matches!(e, StationEvent::Completed { .. })));
    }

    #[test]
    fn button_is_wrong_at_lever_level() {
        let mut s = station();
        assert_eq!(
            s.press_button(),
            Err(Rejection::WrongInteraction {
                expected: InteractionType::ManualLever
            })
        );
    }

    #[test]
    fn button_level_doses_to_ideal() {
        let mut s = station();
        s.set_level(1);
        s.add_coffee(50.0).unwrap();
        s.place_portafilter(Portafilter::empty()).unwrap();
        s.press_button().unwrap();
        run(&mut s, 1.0);
        assert_eq!(s.state().output(), 18.0);
        assert_eq!(s.state().quality().unwrap().score, 1.0);
    }

    #[test]
    fn automatic_level_tops_up_without_input() {
        let mut s = station();
        s.set_level(2);
        s.add_coffee(50.0).unwrap();
        s.place_portafilter(Portafilter::with_dose(6.0, 0.0)).unwrap();
        run(&mut s, 2.0);
        assert_eq!(s.state().output(), 18.0);
        assert_eq!(s.state().stock(), 38.0);
        run(&mut s, 2.0);
        assert_eq!(s.state().output(), 18.0);
    }

    #[test]
    fn removal_mid_cycle_transfers_nothing() {
        let mut s = station();
        s.add_coffee(50.0).unwrap();
        s.place_portafilter(Portafilter::empty()).unwrap();
        s.pull_lever().unwrap();
        run(&mut s, 0.5);
        let pf = s.take_portafilter().unwrap();
        assert_eq!(pf.coffee_g, 0.0);
        assert_eq!(s.state().stock(), 50.0);
        assert_eq!(s.machine_state(), MachineState::Idle);
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn nan_transfer_moves_nothing() {
        let mut s = station();
        s.add_coffee(5.0).unwrap();
        s.place_portafilter(Portafilter::empty()).unwrap();
        assert_eq!(s.transfer(f32::NAN), Err(Rejection::NonPositiveAmount));
        assert_eq!(s.state().stock(), 5.0);
        assert_eq!(s.state().output(), 0.0);
    }

    #[test]
    fn upgrade_applies_from_the_next_cycle() {
        let mut s = station();
        s.add_coffee(50.0).unwrap();
        s.place_portafilter(Portafilter::empty()).unwrap();
        s.pull_lever().unwrap();
        for _ in 0..5 {
            s.tick(0.1);
        }
        s.set_level(1);
        assert_eq!(s.process.cycle_duration(), 1.0);
        assert_eq!(s.dose_in_flight, Some(6.0));

        // Past the level-1 duration, still inside the level-0 one.
        for _ in 0..3 {
            s.tick(0.1);
        }
        assert_eq!(s.machine_state(), MachineState::Processing);
        run(&mut s, 0.5);
        assert_eq!(s.machine_state(), MachineState::Ready);
        assert_eq!(s.state().output(), 6.0);
        assert_eq!(s.state().stock(), 44.0);

        s.press_button().unwrap();
        assert_eq!(s.process.cycle_duration(), 0.75);
        assert_eq!(s.dose_in_flight, Some(12.0));
        for _ in 0..7 {
            s.tick(0.1);
        }
        assert_eq!(s.machine_state(), MachineState::Processing);
        s.tick(0.1);
        assert_eq!(s.state().output(), 18.0);
    }

    #[test]
    fn upgrade_emits_notice() {
        let mut s = station();
        s.set_level(1);
        let events = s.drain_events();
        assert!(events.contains(&StationEvent::Field(StateChange::Level(1))));
        assert!(events.iter().any(|e| matches!(
            e,
            StationEvent::Upgraded {
                level: 1,
                interaction: InteractionType::ButtonPress
            }
        )));
        assert!(events.iter().any(|e| matches!(e, StationEvent::Notice(t) if t.contains("button press"))));
    }

    #[test]
    fn drop_routes_by_item_kind() {
        let mut s = station();
        let coffee = Item::GroundCoffee(GroundCoffee {
            size: GrindSize::Large,
            grams: 18.0,
            quality: 1.0,
        });
        assert!(s.accepts(ItemKind::GroundCoffee, None));
        s.receive(coffee, None).unwrap();
        assert_eq!(s.state().stock(), 18.0);

        let cup = Item::Cup(crate::items::Cup::empty());
        assert!(!s.accepts(ItemKind::Cup, None));
        let bounced = s.receive(cup, None).unwrap_err();
        assert_eq!(bounced.item, cup);
        assert_eq!(bounced.reason, Rejection::WrongItem(ItemKind::Cup));
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = station();
        s.add_coffee(50.0).unwrap();
        s.place_portafilter(Portafilter::empty()).unwrap();
        s.set_level(2);
        s.reset();
        assert_eq!(s.state().stock(), 0.0);
        assert_eq!(s.level(), 0);
        assert_eq!(s.machine_state(), MachineState::Idle);
    }
}
