//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch.  Every station drives the same table; station-specific rules
//! enter only through the flags in [`ProcessContext`].
//!
//! ```text
//!  IDLE ──[inputs ready]──▶ READY ──[start]──▶ PROCESSING
//!    ▲                        │                    │
//!    └────[inputs removed]────┘            [progress = 1.0]
//!    ▲                                             ▼
//!    └───────────[released]────────────────── COMPLETE
//!                                           (held while flagged)
//!
//!  PROCESSING ──[abort]──▶ READY / IDLE   (progress reset to 0)
//! ```

use super::MachineState;
use super::StateDescriptor;
use super::context::ProcessContext;
use crate::quality::clamp01;
use log::debug;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per process instance.
pub fn build_state_table() -> [StateDescriptor; MachineState::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: MachineState::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Ready
        StateDescriptor {
            id: MachineState::Ready,
            name: "Ready",
            on_enter: None,
            on_exit: None,
            on_update: ready_update,
        },
        // Index 2: Processing
        StateDescriptor {
            id: MachineState::Processing,
            name: "Processing",
            on_enter: Some(processing_enter),
            on_exit: Some(processing_exit),
            on_update: processing_update,
        },
        // Index 3: Complete
        StateDescriptor {
            id: MachineState::Complete,
            name: "Complete",
            on_enter: Some(complete_enter),
            on_exit: Some(complete_exit),
            on_update: complete_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut ProcessContext) {
    ctx.clear_cycle();
}

fn idle_update(ctx: &mut ProcessContext) -> Option<MachineState> {
    // Start triggers are only honoured from Ready.
    ctx.start_requested = false;
    ctx.abort_requested = false;

    if ctx.inputs_ready {
        return Some(MachineState::Ready);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  READY state: eligible to begin
// ═══════════════════════════════════════════════════════════════════════════

fn ready_update(ctx: &mut ProcessContext) -> Option<MachineState> {
    ctx.abort_requested = false;

    if !ctx.inputs_ready {
        ctx.start_requested = false;
        return Some(MachineState::Idle);
    }
    if ctx.start_requested {
        ctx.start_requested = false;
        return Some(MachineState::Processing);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PROCESSING state: progress accumulates over the locked duration
// ═══════════════════════════════════════════════════════════════════════════

fn processing_enter(ctx: &mut ProcessContext) {
    ctx.cycle_duration_secs = ctx.pending_duration_secs.max(0.0);
    ctx.elapsed_secs = 0.0;
    ctx.progress = 0.0;
    ctx.is_processing = true;
    ctx.just_completed = false;
    debug!("PROCESSING: cycle locked at {:.2}s", ctx.cycle_duration_secs);
}

fn processing_exit(ctx: &mut ProcessContext) {
    ctx.is_processing = false;
}

fn processing_update(ctx: &mut ProcessContext) -> Option<MachineState> {
    if ctx.abort_requested {
        ctx.abort_requested = false;
        ctx.start_requested = false;
        ctx.clear_cycle();
        debug!("PROCESSING: cycle aborted, progress reset");
        return Some(if ctx.inputs_ready {
            MachineState::Ready
        } else {
            MachineState::Idle
        });
    }

    ctx.elapsed_secs += ctx.dt_secs.max(0.0);
    let progress = if ctx.cycle_duration_secs <= 0.0 {
        1.0
    } else {
        clamp01(ctx.elapsed_secs / ctx.cycle_duration_secs)
    };
    // Monotonic within a cycle.
    ctx.progress = ctx.progress.max(progress);

    if ctx.progress >= 1.0 {
        ctx.progress = 1.0;
        return Some(MachineState::Complete);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COMPLETE state: station consumes the result, then releases
// ═══════════════════════════════════════════════════════════════════════════

fn complete_enter(ctx: &mut ProcessContext) {
    ctx.completed_cycles = ctx.completed_cycles.wrapping_add(1);
    ctx.just_completed = true;
    ctx.start_requested = false;
}

fn complete_exit(ctx: &mut ProcessContext) {
    ctx.clear_cycle();
}

fn complete_update(ctx: &mut ProcessContext) -> Option<MachineState> {
    ctx.abort_requested = false;

    if ctx.hold_complete {
        return None;
    }
    Some(if ctx.inputs_ready {
        MachineState::Ready
    } else {
        MachineState::Idle
    })
}
