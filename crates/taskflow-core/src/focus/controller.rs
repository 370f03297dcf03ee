//! Side effects around the focus session state machine.
//!
//! The session itself is pure; the controller applies the observable
//! effects of its transitions: logging finished work intervals to the
//! task store and firing best-effort notifications.

use tracing::debug;

use crate::clock::Clock;
use crate::error::Result;
use crate::events::Event;
use crate::notify::Notifier;
use crate::storage::Database;

use super::{FocusSession, Phase, RunState};

/// Drives a [`FocusSession`] against the task store and a notifier.
pub struct FocusController<'a> {
    session: FocusSession,
    db: &'a Database,
    clock: &'a dyn Clock,
    notifier: &'a dyn Notifier,
}

impl<'a> FocusController<'a> {
    pub fn new(
        session: FocusSession,
        db: &'a Database,
        clock: &'a dyn Clock,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            session,
            db,
            clock,
            notifier,
        }
    }

    pub fn session(&self) -> &FocusSession {
        &self.session
    }

    pub fn into_session(self) -> FocusSession {
        self.session
    }

    /// Start (or resume) the countdown. Best-effort requests
    /// notification permission first.
    pub fn start(&mut self) -> Event {
        if self.session.run_state() == RunState::Idle {
            self.notifier.request_permission();
        }
        self.session.start();
        Event::FocusStarted {
            task_id: self.session.task_id.clone(),
            phase: self.session.phase(),
            remaining_secs: self.session.remaining_secs(),
            at: self.clock.now(),
        }
    }

    /// Halt the countdown, preserving remaining time.
    pub fn pause(&mut self) -> Event {
        self.session.pause();
        Event::FocusPaused {
            task_id: self.session.task_id.clone(),
            remaining_secs: self.session.remaining_secs(),
            at: self.clock.now(),
        }
    }

    /// Advance the countdown by one second and apply the side effects of
    /// a phase completion, if one happened on this tick.
    ///
    /// A finished work interval logs the *nominal* work length against
    /// the task, regardless of how long the interval took across pauses.
    /// Notification failures are silently absorbed; a failed store write
    /// is an error.
    pub fn tick(&mut self) -> Result<Option<Event>> {
        let Some(completion) = self.session.tick() else {
            return Ok(None);
        };
        let now = self.clock.now();
        let task_id = self.session.task_id.clone();

        let logged_minutes = match completion.finished {
            Phase::Work => {
                let minutes = self.session.work_minutes();
                self.db.add_pomodoro_minutes(&task_id, minutes, now)?;
                debug!(task_id = %task_id, minutes, "work interval logged");
                let title = self.db.get_task(&task_id).map(|t| t.title).unwrap_or_default();
                self.notifier
                    .notify("Pomodoro complete!", &format!("Great work on: {title}"));
                minutes
            }
            Phase::Break => {
                self.notifier
                    .notify("Break time over!", "Time to get back to work!");
                0
            }
        };

        Ok(Some(Event::PhaseCompleted {
            task_id,
            finished: completion.finished,
            next: completion.next,
            logged_minutes,
            at: now,
        }))
    }

    /// Force the session back to an idle work phase.
    pub fn reset(&mut self) -> Event {
        self.session.reset();
        Event::FocusReset {
            task_id: self.session.task_id.clone(),
            at: self.clock.now(),
        }
    }

    /// Abandon the break. Returns `None` when the session is not in a
    /// break phase; no time is ever logged.
    pub fn skip_break(&mut self) -> Option<Event> {
        if !self.session.skip_break() {
            return None;
        }
        Some(Event::BreakSkipped {
            task_id: self.session.task_id.clone(),
            at: self.clock.now(),
        })
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::FocusSnapshot {
            task_id: self.session.task_id.clone(),
            phase: self.session.phase(),
            run_state: self.session.run_state(),
            remaining_secs: self.session.remaining_secs(),
            total_secs: self.session.total_secs(),
            progress: self.session.progress(),
            sessions_completed: self.session.sessions_completed(),
            at: self.clock.now(),
        }
    }
}
