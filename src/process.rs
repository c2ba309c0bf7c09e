//! Generic processing-cycle driver.
//!
//! Wraps the FSM engine and its context behind the operations a station
//! needs: push input readiness, ask for a start, advance time, cancel.
//! Each call reports what happened so the station can run its own
//! completion logic and mirror the state into its change-tracked fields.

use log::info;

use crate::error::{Outcome, Rejection};
use crate::fsm::context::ProcessContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, MachineState};

/// What one `tick` / `refresh` did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub previous: MachineState,
    pub state: MachineState,
    pub progress: f32,
    /// A cycle reached 1.0 during this call.
    pub completed: bool,
}

impl TickReport {
    pub fn changed(&self) -> bool {
        self.previous != self.state
    }
}

/// One Idle → Ready → Processing → Complete cycle runner.
pub struct MachineProcess {
    label: &'static str,
    fsm: Fsm,
    ctx: ProcessContext,
}

impl MachineProcess {
    /// `label` prefixes every log line of this process.
    pub fn new(label: &'static str) -> Self {
        let mut fsm = Fsm::new(build_state_table(), MachineState::Idle);
        let mut ctx = ProcessContext::new();
        fsm.start(&mut ctx);
        Self { label, fsm, ctx }
    }

    pub fn state(&self) -> MachineState {
        self.fsm.current_state()
    }

    /// Progress of the running cycle in [0, 1].
    pub fn progress(&self) -> f32 {
        self.ctx.progress
    }

    pub fn is_processing(&self) -> bool {
        self.ctx.is_processing
    }

    /// Length locked in when the running cycle started (s).
    pub fn cycle_duration(&self) -> f32 {
        self.ctx.cycle_duration_secs
    }

    pub fn completed_cycles(&self) -> u32 {
        self.ctx.completed_cycles
    }

    pub fn inputs_ready(&self) -> bool {
        self.ctx.inputs_ready
    }

    /// Takes effect on the next `tick` or `refresh`.
    pub fn set_inputs_ready(&mut self, ready: bool) {
        self.ctx.inputs_ready = ready;
    }

    /// Keep the machine in Complete until released.
    pub fn set_hold_complete(&mut self, hold: bool) {
        self.ctx.hold_complete = hold;
    }

    /// Start a cycle of `duration_secs`.  Only legal from Ready.
    pub fn request_start(&mut self, duration_secs: f32) -> Outcome<()> {
        self.refresh();
        match self.state() {
            MachineState::Processing => Err(Rejection::AlreadyProcessing),
            MachineState::Ready => {
                self.ctx.pending_duration_secs = duration_secs;
                self.fsm
                    .force_transition(MachineState::Processing, &mut self.ctx);
                info!(
                    "{}: Ready -> Processing ({:.2}s cycle)",
                    self.label, self.ctx.cycle_duration_secs
                );
                Ok(())
            }
            MachineState::Idle | MachineState::Complete => Err(Rejection::NotReady),
        }
    }

    /// Abort the running cycle; progress drops back to zero.
    /// Returns whether a cycle was running.
    pub fn cancel(&mut self) -> bool {
        if self.state() != MachineState::Processing {
            return false;
        }
        self.ctx.abort_requested = true;
        let report = self.step(0.0, false);
        info!("{}: cycle cancelled -> {:?}", self.label, report.state);
        true
    }

    /// Re-evaluate guards after an input change without letting time pass.
    pub fn refresh(&mut self) -> TickReport {
        self.step(0.0, false)
    }

    /// Advance by `dt_secs`.
    pub fn tick(&mut self, dt_secs: f32) -> TickReport {
        self.step(dt_secs, true)
    }

    /// Back to a fresh Idle process.
    pub fn reset(&mut self) {
        *self = Self::new(self.label);
    }

    fn step(&mut self, dt_secs: f32, counted: bool) -> TickReport {
        let previous = self.state();
        self.ctx.dt_secs = dt_secs;
        if counted {
            self.fsm.tick(&mut self.ctx);
        } else {
            self.fsm.poll(&mut self.ctx);
        }
        self.ctx.dt_secs = 0.0;

        let completed = core::mem::take(&mut self.ctx.just_completed);
        let report = TickReport {
            previous,
            state: self.state(),
            progress: self.ctx.progress,
            completed,
        };
        if report.changed() {
            info!("{}: {:?} -> {:?}", self.label, previous, report.state);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_process() -> MachineProcess {
        let mut p = MachineProcess::new("test");
        p.set_inputs_ready(true);
        p.refresh();
        p
    }

    #[test]
    fn start_from_idle_is_rejected() {
        let mut p = MachineProcess::new("test");
        assert_eq!(p.request_start(1.0), Err(Rejection::NotReady));
        assert_eq!(p.state(), MachineState::Idle);
    }

    #[test]
    fn inputs_move_idle_to_ready_on_refresh() {
        let p = ready_process();
        assert_eq!(p.state(), MachineState::Ready);
        assert!(!p.is_processing());
    }

    #[test]
    fn start_then_run_to_completion() {
        let mut p = ready_process();
        p.request_start(1.0).unwrap();
        assert_eq!(p.state(), MachineState::Processing);
        assert!(p.is_processing());

        let r = p.tick(0.5);
        assert!(!r.completed);
        assert_eq!(r.progress, 0.5);

        let r = p.tick(0.6);
        assert!(r.completed);
        assert_eq!(r.state, MachineState::Complete);
        assert_eq!(r.progress, 1.0);
        assert_eq!(p.completed_cycles(), 1);

        let r = p.tick(0.1);
        assert!(!r.completed);
        assert_eq!(r.state, MachineState::Ready);
    }

    #[test]
    fn second_start_is_already_processing() {
        let mut p = ready_process();
        p.request_start(2.0).unwrap();
        assert_eq!(p.request_start(9.0), Err(Rejection::AlreadyProcessing));
        assert_eq!(p.cycle_duration(), 2.0);
    }

    #[test]
    fn cancel_resets_progress() {
        let mut p = ready_process();
        p.request_start(4.0).unwrap();
        p.tick(1.0);
        assert_eq!(p.progress(), 0.25);

        assert!(p.cancel());
        assert_eq!(p.state(), MachineState::Ready);
        assert_eq!(p.progress(), 0.0);
        assert!(!p.cancel());
    }

    #[test]
    fn hold_keeps_complete() {
        let mut p = ready_process();
        p.set_hold_complete(true);
        p.request_start(0.5).unwrap();
        assert!(p.tick(1.0).completed);
        for _ in 0..3 {
            assert_eq!(p.tick(1.0).state, MachineState::Complete);
        }
        assert_eq!(p.request_start(1.0), Err(Rejection::NotReady));
        p.set_hold_complete(false);
        assert_eq!(p.refresh().state, MachineState::Ready);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut p = ready_process();
        p.request_start(1.0).unwrap();
        p.reset();
        assert_eq!(p.state(), MachineState::Idle);
        assert!(!p.inputs_ready());
        assert_eq!(p.completed_cycles(), 0);
    }
}
