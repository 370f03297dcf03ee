//! Focus session state machine.
//!
//! A countdown state machine cycling between work and break phases. It
//! does not use internal threads - the caller is responsible for calling
//! `tick()` once per second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Idle
//!                 Running --tick (00:00)--> Idle (other phase)
//! reset: any state -> Idle, Work phase
//! skip-break: Break phase -> Idle, Work phase
//! ```
//!
//! Completing a phase auto-stops: a finished work interval does not run
//! straight into its break.
//!
//! Phase and run state are explicit tagged enums rather than boolean
//! flags, so invalid combinations are unrepresentable.

mod controller;

use serde::{Deserialize, Serialize};

pub use controller::FocusController;

/// The current interval kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

/// Whether the countdown is ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
}

/// Emitted by `tick()` on the tick that reaches 00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCompletion {
    /// The phase that just finished.
    pub finished: Phase,
    /// The phase the session switched to (idle, not auto-started).
    pub next: Phase,
}

/// Serializable focus session state.
///
/// Persisted between CLI invocations through the kv store; the caller
/// drives it at 1 Hz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSession {
    /// The task this session logs time against.
    pub task_id: String,
    phase: Phase,
    run_state: RunState,
    remaining_secs: u32,
    work_minutes: u32,
    break_minutes: u32,
    sessions_completed: u32,
}

impl FocusSession {
    /// Create a new session in the work phase, idle, with the full work
    /// duration remaining.
    pub fn new(task_id: impl Into<String>, work_minutes: u32, break_minutes: u32) -> Self {
        Self {
            task_id: task_id.into(),
            phase: Phase::Work,
            run_state: RunState::Idle,
            remaining_secs: work_minutes * 60,
            work_minutes,
            break_minutes,
            sessions_completed: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Nominal work phase length in minutes.
    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    /// Completed work intervals within this session.
    pub fn sessions_completed(&self) -> u32 {
        self.sessions_completed
    }

    /// Nominal length of the current phase, in seconds.
    pub fn total_secs(&self) -> u32 {
        match self.phase {
            Phase::Work => self.work_minutes * 60,
            Phase::Break => self.break_minutes * 60,
        }
    }

    /// 0.0 .. 1.0 progress through the current phase, against the
    /// current phase's own nominal length.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / total as f64)
    }

    /// Remaining time rendered as MM:SS.
    pub fn remaining_display(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_secs / 60,
            self.remaining_secs % 60
        )
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idle -> Running. A no-op when already running.
    pub fn start(&mut self) {
        self.run_state = RunState::Running;
    }

    /// Running -> Idle, remaining time preserved exactly.
    pub fn pause(&mut self) {
        self.run_state = RunState::Idle;
    }

    /// Advance the countdown by one second. Only ticks while running.
    ///
    /// On the tick that reaches exactly 00:00 the session switches to
    /// the other phase with that phase's full duration and goes idle;
    /// the completion is reported to the caller.
    pub fn tick(&mut self) -> Option<PhaseCompletion> {
        if self.run_state != RunState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        let finished = self.phase;
        let next = match finished {
            Phase::Work => {
                self.sessions_completed += 1;
                Phase::Break
            }
            Phase::Break => Phase::Work,
        };
        self.phase = next;
        self.remaining_secs = self.total_secs();
        self.run_state = RunState::Idle;
        Some(PhaseCompletion { finished, next })
    }

    /// Force the session back to an idle work phase. Valid from any
    /// state.
    pub fn reset(&mut self) {
        self.phase = Phase::Work;
        self.remaining_secs = self.work_minutes * 60;
        self.run_state = RunState::Idle;
    }

    /// Abandon the break and line up a fresh work phase. Only valid
    /// while the phase is Break; returns whether it applied. Never logs
    /// time.
    pub fn skip_break(&mut self) -> bool {
        if self.phase != Phase::Break {
            return false;
        }
        self.phase = Phase::Work;
        self.remaining_secs = self.work_minutes * 60;
        self.run_state = RunState::Idle;
        true
    }
}
