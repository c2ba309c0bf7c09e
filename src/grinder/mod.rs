//! Bean grinder station.
//!
//! Each grind action consumes one bean-fill and grows the ground output by
//! one size.  Once the output is Large the machine stays in Complete until
//! the coffee is taken.
//!
//! Taking the output mid-grind does not stop the running action; it then
//! completes into a fresh Small portion.

pub mod logic;
pub mod state;

use std::sync::Arc;

use log::{info, warn};

use crate::config::{GrinderConfig, InteractionType};
use crate::error::{Outcome, Rejection, Result};
use crate::events::StationEvent;
use crate::fsm::MachineState;
use crate::items::{Bounced, DropTarget, GroundCoffee, Item, ItemKind};
use crate::process::{MachineProcess, TickReport};

pub use logic::GrinderLogic;
pub use state::GrinderState;

const NAME: &str = "Grinder";

pub struct GrinderStation {
    logic: GrinderLogic,
    state: GrinderState,
    process: MachineProcess,
}

impl GrinderStation {
    pub fn new(config: Arc<GrinderConfig>) -> Result<Self> {
        config.validate()?;
        let state = GrinderState::new(config.bean_capacity);
        Ok(Self {
            logic: GrinderLogic::new(config),
            state,
            process: MachineProcess::new(NAME),
        })
    }

    pub fn logic(&self) -> &GrinderLogic {
        &self.logic
    }

    pub fn state(&self) -> &GrinderState {
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

    /// Returns the fills that fit in the hopper.
    pub fn add_beans(&mut self, fills: u32) -> Outcome<u32> {
        let added = self
            .logic
            .validate_add_beans(self.state.bean_fills(), fills)
            .inspect_err(|r| warn!("{NAME}: add {fills} fills rejected: {r}"))?;
        self.state.set_bean_fills(self.state.bean_fills() + added);
        self.sync_inputs();
        Ok(added)
    }

    pub fn pull_lever(&mut self) -> Outcome<()> {
        self.require_interaction(InteractionType::ManualLever)?;
        self.start_grind()
    }

    pub fn press_button(&mut self) -> Outcome<()> {
        self.require_interaction(InteractionType::ButtonPress)?;
        self.start_grind()
    }

    fn require_interaction(&self, used: InteractionType) -> Outcome<()> {
        let expected = self.interaction();
        if expected == used {
            Ok(())
        } else {
            Err(Rejection::WrongInteraction { expected })
        }
    }

    fn start_grind(&mut self) -> Outcome<()> {
        if self.state.is_processing() {
            return Err(Rejection::AlreadyProcessing);
        }
        self.logic
            .validate_grind(self.state.bean_fills(), self.state.output_size())?;
        self.process
            .request_start(self.logic.process_duration(self.state.level()))?;
        self.sync_machine_state();
        Ok(())
    }

    /// Hand out the ground coffee.
    pub fn take_output(&mut self) -> Outcome<GroundCoffee> {
        let Some(size) = self.state.output_size() else {
            return Err(Rejection::NothingToTake(ItemKind::GroundCoffee));
        };
        let coffee = GroundCoffee {
            size,
            grams: self.state.output(),
            quality: self.state.quality().map_or(0.0, |q| q.score),
        };
        self.state.set_output(None);
        self.sync_inputs();
        Ok(coffee)
    }

    pub fn tick(&mut self, dt_secs: f32) {
        self.sync_inputs();
        if self.process.state() == MachineState::Ready
            && self.logic.should_auto_grind(
                self.state.level(),
                self.state.bean_fills(),
                self.state.output_size(),
            )
        {
            if let Err(r) = self.start_grind() {
                warn!("{NAME}: auto-grind could not start: {r}");
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
            self.complete_grind();
        }
    }

    fn complete_grind(&mut self) {
        let ground = match self.logic.grind(self.state.output_size()) {
            Ok(g) => g,
            Err(r) => {
                warn!("{NAME}: grind finished with nothing to do: {r}");
                self.sync_inputs();
                return;
            }
        };
        self.state
            .set_bean_fills(self.state.bean_fills().saturating_sub(1));
        self.state.set_output(Some((ground.size, ground.grams)));
        let quality = self.logic.evaluate_quality(ground.grams);
        self.state.set_quality(Some(quality));
        info!(
            "{NAME}: ground {:?} ({:.1} g, {}), {} fills left",
            ground.size,
            ground.grams,
            quality.label(),
            self.state.bean_fills()
        );
        self.state.push_event(StationEvent::Completed {
            slot: None,
            quality: Some(quality),
        });
        self.sync_inputs();
    }

    pub fn set_level(&mut self, level: u8) {
        if level == self.state.level() {
            return;
        }
        self.state.set_level(level);
        let interaction = self.interaction();
        info!(
            "{NAME}: level {level} ({interaction}, {:.2}s per grind)",
            self.logic.process_duration(level)
        );
        self.state.push_event(StationEvent::Upgraded { level, interaction });
        self.state.notice(format!(
            "{NAME} upgraded: {} now grinds in {:.1}s",
            interaction,
            self.logic.process_duration(level)
        ));
    }

    pub fn reset(&mut self) {
        self.process.reset();
        self.state.reset();
    }

    pub fn drain_events(&mut self) -> Vec<StationEvent> {
        self.state.drain_events()
    }

    fn sync_inputs(&mut self) {
        self.process.set_inputs_ready(self.state.should_be_ready());
        self.process.set_hold_complete(self.state.output_full());
        if !self.process.is_processing() {
            self.process.refresh();
        }
        self.sync_machine_state();
    }

    fn sync_machine_state(&mut self) {
        self.state.set_machine_state(self.process.state());
    }
}

impl DropTarget for GrinderStation {
    fn accepts(&self, kind: ItemKind, _slot: Option<usize>) -> bool {
        kind == ItemKind::BeanBag && self.logic.can_add_beans(self.state.bean_fills(), 1)
    }

    fn receive(&mut self, item: Item, _slot: Option<usize>) -> core::result::Result<(), Bounced> {
        match item {
            Item::BeanBag { fills } => self
                .add_beans(fills)
                .map(|_| ())
                .map_err(|r| Bounced::new(item, r)),
            _ => Err(Bounced::new(item, Rejection::WrongItem(item.kind()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::GrindSize;

    fn station() -> GrinderStation {
        GrinderStation::new(Arc::new(GrinderConfig::default())).unwrap()
    }

    fn run(s: &mut GrinderStation, secs: f32) {
        let steps = (secs / 0.1).round() as usize + 1;
        for _ in 0..steps {
            s.tick(0.1);
        }
    }

    fn grind_once(s: &mut GrinderStation) -> Outcome<()> {
        s.pull_lever()?;
        run(s, 2.0);
        Ok(())
    }

    #[test]
    fn one_grind_from_empty_yields_small() {
        let mut s = station();
        s.add_beans(1).unwrap();
        assert_eq!(s.machine_state(), MachineState::Ready);
        grind_once(&mut s).unwrap();
        assert_eq!(s.state().output_size(), Some(GrindSize::Small));
        assert_eq!(s.state().bean_fills(), 0);
        assert_eq!(s.state().output(), 6.0);
    }

    #[test]
    fn blocks_at_large_even_with_beans() {
        let mut s = station();
        s.add_beans(5).unwrap();
        for expected in [GrindSize::Small, GrindSize::Medium, GrindSize::Large] {
            grind_once(&mut s).unwrap();
            assert_eq!(s.state().output_size(), Some(expected));
        }
        assert_eq!(s.state().bean_fills(), 2);
        assert_eq!(s.pull_lever(), Err(Rejection::MaxGrindSize));
        run(&mut s, 1.0);
        assert_eq!(s.machine_state(), MachineState::Complete);

        let coffee = s.take_output().unwrap();
        assert_eq!(coffee.size, GrindSize::Large);
        assert_eq!(coffee.quality, 1.0);
        assert_eq!(s.machine_state(), MachineState::Ready);
        assert!(s.state().quality().is_none());
    }

    #[test]
    fn bean_is_consumed_at_completion() {
        let mut s = station();
        s.add_beans(2).unwrap();
        s.pull_lever().unwrap();
        run(&mut s, 1.0);
        assert_eq!(s.state().bean_fills(), 2);
        run(&mut s, 1.0);
        assert_eq!(s.state().bean_fills(), 1);
    }

    #[test]
    fn taking_output_mid_grind_restarts_at_small() {
        let mut s = station();
        s.add_beans(3).unwrap();
        grind_once(&mut s).unwrap();
        s.pull_lever().unwrap();
        run(&mut s, 0.5);
        let taken = s.take_output().unwrap();
        assert_eq!(taken.size, GrindSize::Small);
        assert_eq!(s.machine_state(), MachineState::Processing);
        run(&mut s, 2.0);
        assert_eq!(s.state().output_size(), Some(GrindSize::Small));
        assert_eq!(s.state().bean_fills(), 1);
    }

    #[test]
    fn no_beans_no_grind() {
        let mut s = station();
        assert!(matches!(
            s.pull_lever(),
            Err(Rejection::InsufficientStock { .. })
        ));
        assert_eq!(s.take_output(), Err(Rejection::NothingToTake(ItemKind::GroundCoffee)));
    }

    #[test]
    fn automatic_level_grinds_to_large() {
        let mut s = station();
        s.set_level(2);
        s.add_beans(5).unwrap();
        run(&mut s, 5.0);
        assert_eq!(s.state().output_size(), Some(GrindSize::Large));
        assert_eq!(s.state().bean_fills(), 2);
        assert_eq!(s.machine_state(), MachineState::Complete);
    }

    #[test]
    fn bean_bag_drop() {
        let mut s = station();
        assert!(s.accepts(ItemKind::BeanBag, None));
        s.receive(Item::BeanBag { fills: 4 }, None).unwrap();
        assert_eq!(s.state().bean_fills(), 4);
        let bounced = s.receive(Item::BeanBag { fills: 0 }, None).unwrap_err();
        assert_eq!(bounced.reason, Rejection::NonPositiveAmount);
        assert!(!s.accepts(ItemKind::Portafilter, None));
    }
}
