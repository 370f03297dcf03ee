//! # TaskFlow Core Library
//!
//! This library provides the core business logic for TaskFlow, a gamified
//! personal task manager with a Pomodoro focus timer. It implements a
//! CLI-first philosophy where every operation is available via a standalone
//! CLI binary, with any GUI being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Progression Engine**: Converts task completions into XP, levels,
//!   streaks, and achievement unlocks
//! - **Focus Session**: A countdown state machine cycling between work and
//!   break phases; the caller drives it by invoking `tick()` once per second
//! - **Storage**: SQLite-based task/stats persistence and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`ProgressionEngine`]: XP, level, streak, and achievement policy
//! - [`FocusSession`] / [`FocusController`]: focus timer state machine and
//!   its side effects (time logging, notifications)
//! - [`Database`]: Task store, user stats, and achievement persistence
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod focus;
pub mod notify;
pub mod progression;
pub mod stats;
pub mod storage;
pub mod task;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use focus::{FocusController, FocusSession, Phase, PhaseCompletion, RunState};
pub use notify::{Notifier, NullNotifier};
pub use progression::{
    AchievementStatus, CompletionReward, ProgressionEngine, XpBreakdown,
};
pub use stats::UserStats;
pub use storage::{Config, Database};
pub use task::{NewTask, Priority, Task, TaskCounts, TaskFilter, TaskPatch, TaskStatus};
