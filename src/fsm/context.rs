//! Shared mutable context threaded through every FSM handler.
//!
//! `ProcessContext` is the blackboard the state handlers read from and
//! write to.  The owning station pushes its input flags in before each
//! tick; the handlers write back progress and completion markers.

// ---------------------------------------------------------------------------
// ProcessContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
#[derive(Debug, Clone, Default)]
pub struct ProcessContext {
    // -- Timing --
    /// Seconds covered by the tick being processed.
    pub dt_secs: f32,

    // -- Inputs (written by the station) --
    /// Required inputs present and the source holds material.
    pub inputs_ready: bool,
    /// One-shot start trigger, consumed by the Ready handler.
    pub start_requested: bool,
    /// Keep the machine in Complete until cleared.
    pub hold_complete: bool,
    /// One-shot cancel of the running cycle.
    pub abort_requested: bool,
    /// Cycle length to lock in when the next cycle starts (s).
    pub pending_duration_secs: f32,

    // -- Cycle (written by the handlers) --
    /// Locked length of the running cycle (s).
    pub cycle_duration_secs: f32,
    pub elapsed_secs: f32,
    /// Clamped `elapsed / duration`.
    pub progress: f32,
    /// Mirror of `state == Processing`.
    pub is_processing: bool,
    pub completed_cycles: u32,
    /// Set when a cycle finished; the station clears it after consuming.
    pub just_completed: bool,
}

impl ProcessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the running cycle.
    pub fn clear_cycle(&mut self) {
        self.elapsed_secs = 0.0;
        self.progress = 0.0;
        self.cycle_duration_secs = 0.0;
    }
}
