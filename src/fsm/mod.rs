//! Function-pointer finite state machine engine.
//!
//! One table drives every station's processing cycle:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌────────────┬───────────┬──────────┬───────────────────┐   │
//! │  │ MachineState│ on_enter  │ on_exit  │ on_update         │   │
//! │  ├────────────┼───────────┼──────────┼───────────────────┤   │
//! │  │ Idle        │ fn(ctx)   │    -     │ fn(ctx)->Option<> │   │
//! │  │ Ready       │ fn(ctx)   │    -     │ fn(ctx)->Option<> │   │
//! │  │ Processing  │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  │ Complete    │ fn(ctx)   │    -     │ fn(ctx)->Option<> │   │
//! │  └────────────┴───────────┴──────────┴───────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next)`, the engine runs `on_exit` for the current
//! state, then `on_enter` for the next.  All handlers receive
//! `&mut ProcessContext`, which carries the inputs the station pushed in
//! and the progress of the running cycle.

pub mod context;
pub mod states;

use context::ProcessContext;
use log::debug;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Shared machine state.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MachineState {
    Idle = 0,
    Ready = 1,
    Processing = 2,
    Complete = 3,
}

impl MachineState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a table index back to a state.  Out-of-range indices are a
    /// bug; release builds fall back to `Idle`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Ready,
            2 => Self::Processing,
            3 => Self::Complete,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut ProcessContext);

/// Per-tick update handler.  `Some(next)` triggers a transition.
pub type StateUpdateFn = fn(&mut ProcessContext) -> Option<MachineState>;

/// Static descriptor for a single state.
pub struct StateDescriptor {
    pub id: MachineState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `MachineState as usize`.
    table: [StateDescriptor; MachineState::COUNT],
    current: usize,
    tick_count: u64,
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; MachineState::COUNT], initial: MachineState) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter`.  Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut ProcessContext) {
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance by one tick of `ctx.dt_secs`.
    pub fn tick(&mut self, ctx: &mut ProcessContext) {
        self.tick_count += 1;
        self.poll(ctx);
    }

    /// Evaluate the current state's guards without counting a tick.
    ///
    /// Callers zero `ctx.dt_secs` first so no time passes.
    pub fn poll(&mut self, ctx: &mut ProcessContext) {
        let next = (self.table[self.current].on_update)(ctx);
        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Jump straight to `next`, running exit/enter actions.
    pub fn force_transition(&mut self, next: MachineState, ctx: &mut ProcessContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> MachineState {
        MachineState::from_index(self.current)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    fn transition(&mut self, next_id: MachineState, ctx: &mut ProcessContext) {
        let next_idx = next_id as usize;

        debug!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::context::ProcessContext;
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn progress_is_monotonic_and_bounded(
            duration in 0.1f32..10.0,
            steps in proptest::collection::vec(0.0f32..0.5, 1..200),
        ) {
            let mut fsm = Fsm::new(states::build_state_table(), MachineState::Idle);
            let mut ctx = ProcessContext::new();
            fsm.start(&mut ctx);
            ctx.inputs_ready = true;
            ctx.pending_duration_secs = duration;
            fsm.force_transition(MachineState::Processing, &mut ctx);

            let mut last = 0.0f32;
            for dt in steps {
                ctx.dt_secs = dt;
                fsm.tick(&mut ctx);
                prop_assert!((0.0..=1.0).contains(&ctx.progress));
                if fsm.current_state() == MachineState::Processing {
                    prop_assert!(ctx.progress >= last);
                    last = ctx.progress;
                } else {
                    break;
                }
            }
        }

        #[test]
        fn processing_flag_matches_state(
            events in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>(), 0.0f32..1.0), 1..100),
        ) {
            let mut fsm = Fsm::new(states::build_state_table(), MachineState::Idle);
            let mut ctx = ProcessContext::new();
            fsm.start(&mut ctx);
            ctx.pending_duration_secs = 1.0;

            for (ready, start, abort, dt) in events {
                ctx.inputs_ready = ready;
                ctx.start_requested = start;
                ctx.abort_requested = abort;
                ctx.dt_secs = dt;
                fsm.tick(&mut ctx);
                prop_assert_eq!(
                    ctx.is_processing,
                    fsm.current_state() == MachineState::Processing
                );
            }
        }
    }
}
