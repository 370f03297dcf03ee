//! Gamified progression engine.
//!
//! Converts task completions into XP, levels, streaks, and achievement
//! unlocks. The policy itself lives in pure functions
//! ([`xp_for_completion`], [`apply_award`]); [`ProgressionEngine`] wires
//! them to the task store and an injectable clock.
//!
//! The streak rule is deliberately single-sourced here: reading stats
//! never mutates the streak, only awarding XP does.

pub mod achievements;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use achievements::AchievementStatus;

use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::stats::{level_for_xp, UserStats};
use crate::storage::Database;
use crate::task::{Priority, Task, TaskPatch};

/// XP awarded for any completion, before bonuses.
pub const BASE_XP: u32 = 10;
/// On-time bonus for completing on or before the due date.
pub const PUNCTUALITY_XP: u32 = 20;
/// Bonus for a description longer than this many characters.
pub const DETAIL_XP: u32 = 5;
const DETAIL_THRESHOLD_CHARS: usize = 50;

/// Itemized XP award for one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpBreakdown {
    pub base: u32,
    pub priority_bonus: u32,
    pub punctuality_bonus: u32,
    pub detail_bonus: u32,
}

impl XpBreakdown {
    pub fn total(&self) -> u32 {
        self.base + self.priority_bonus + self.punctuality_bonus + self.detail_bonus
    }
}

/// Everything one completion earned: the XP award, the stats after it
/// was applied, and any achievements it unlocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReward {
    pub xp: XpBreakdown,
    pub stats: UserStats,
    pub unlocked: Vec<AchievementStatus>,
}

/// XP for completing a task, as a pure function of the task at the
/// moment of completion.
pub fn xp_for_completion(task: &Task, completed_at: DateTime<Utc>) -> XpBreakdown {
    let priority_bonus = match task.priority {
        Priority::High => 15,
        Priority::Medium => 10,
        Priority::Low => 5,
    };

    // On-time check, not a "due date exists" check: a past-due
    // completion earns nothing extra.
    let punctuality_bonus = match task.due_date {
        Some(due) if completed_at <= due => PUNCTUALITY_XP,
        _ => 0,
    };

    let detail_bonus = task
        .description
        .as_deref()
        .filter(|d| d.chars().count() > DETAIL_THRESHOLD_CHARS)
        .map_or(0, |_| DETAIL_XP);

    XpBreakdown {
        base: BASE_XP,
        priority_bonus,
        punctuality_bonus,
        detail_bonus,
    }
}

/// Day number of an instant, using UTC day boundaries.
fn day_number(at: DateTime<Utc>) -> i64 {
    at.timestamp().div_euclid(86_400)
}

/// The streak transition rule.
///
/// - first activity ever: the streak starts at 1
/// - exactly one day since the last activity: the streak continues
/// - more than one day: the streak is broken, but today counts as a
///   fresh start (1, never 0)
/// - same day (or a clock that ran backwards): unchanged
pub fn next_streak(current: u32, last_active: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    let Some(last) = last_active else {
        return 1;
    };
    match day_number(now) - day_number(last) {
        1 => current + 1,
        d if d > 1 => 1,
        _ => current,
    }
}

/// Apply one XP award to the aggregate. Pure; the caller persists the
/// result as a single unit.
pub fn apply_award(stats: &UserStats, amount: u32, now: DateTime<Utc>) -> UserStats {
    let total_xp = stats.total_xp + amount;
    let current_streak = next_streak(stats.current_streak, stats.last_active_date, now);
    UserStats {
        total_xp,
        level: level_for_xp(total_xp),
        current_streak,
        longest_streak: stats.longest_streak.max(current_streak),
        last_active_date: Some(now),
        tasks_completed: stats.tasks_completed + 1,
        total_pomodoro_minutes: stats.total_pomodoro_minutes,
    }
}

/// Progression engine over a task store and a clock.
pub struct ProgressionEngine<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
}

impl<'a> ProgressionEngine<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Merge a partial update into a task, running the completion flow
    /// exactly when the update crosses the non-done -> done edge.
    ///
    /// A done -> done save, or any edit that never touches status, leaves
    /// the stats aggregate alone.
    pub fn update_task(
        &self,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<(Task, Option<CompletionReward>)> {
        let now = self.clock.now();
        let (task, completed_now) = self.db.update_task(id, patch, now)?;
        if completed_now {
            let reward = self.complete_task(&task)?;
            Ok((task, Some(reward)))
        } else {
            Ok((task, None))
        }
    }

    /// Run the completion flow for a task that just reached done.
    ///
    /// The caller is responsible for edge detection; this must not be
    /// invoked on a done -> done no-op save.
    pub fn complete_task(&self, task: &Task) -> Result<CompletionReward> {
        let completed_at = task.completed_at.unwrap_or_else(|| self.clock.now());
        let xp = xp_for_completion(task, completed_at);
        let (stats, unlocked) = self.award_xp(xp.total())?;
        debug!(
            task_id = %task.id,
            xp = xp.total(),
            level = stats.level,
            streak = stats.current_streak,
            "task completed"
        );
        Ok(CompletionReward {
            xp,
            stats,
            unlocked,
        })
    }

    /// Apply an XP amount to the stats aggregate, then re-evaluate
    /// achievements against the updated stats.
    ///
    /// The read-modify-write runs inside one store transaction, so two
    /// completions racing from separate handles cannot lose an award.
    pub fn award_xp(&self, amount: u32) -> Result<(UserStats, Vec<AchievementStatus>)> {
        let now = self.clock.now();
        let updated = self
            .db
            .record_award(|stats| apply_award(stats, amount, now))?;
        let unlocked = achievements::evaluate(self.db, &updated, now)?;
        Ok((updated, unlocked))
    }

    /// Log a finished work interval: the task's time totals and the
    /// aggregate's pomodoro minutes grow, but XP, streak, and
    /// achievements are untouched (only a full completion awards those).
    pub fn log_pomodoro_minutes(&self, task_id: &str, minutes: u32) -> Result<()> {
        if minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "minutes".into(),
                message: "must log at least one minute".into(),
            }
            .into());
        }
        self.db
            .add_pomodoro_minutes(task_id, minutes, self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::task::{NewTask, TaskStatus};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn sample_task(priority: Priority) -> Task {
        Task {
            id: "t1".into(),
            title: "Sample".into(),
            description: None,
            status: TaskStatus::Done,
            priority,
            category: None,
            estimated_minutes: None,
            actual_minutes: 0,
            pomodoro_count: 0,
            due_date: None,
            created_at: at(0),
            updated_at: at(0),
            completed_at: Some(at(0)),
        }
    }

    #[test]
    fn high_priority_short_description_no_due_date_is_25() {
        let task = sample_task(Priority::High);
        assert_eq!(xp_for_completion(&task, at(100)).total(), 25);
    }

    #[test]
    fn xp_bounds() {
        // Minimum: low priority, no due date, short description.
        let low = sample_task(Priority::Low);
        assert_eq!(xp_for_completion(&low, at(100)).total(), 15);

        // Maximum: high priority, on time, long description.
        let mut max = sample_task(Priority::High);
        max.due_date = Some(at(200));
        max.description = Some("x".repeat(51));
        assert_eq!(xp_for_completion(&max, at(100)).total(), 50);
    }

    #[test]
    fn punctuality_is_an_on_time_check() {
        let mut task = sample_task(Priority::Medium);
        task.due_date = Some(at(1_000));

        // On or before the due date earns the bonus; the boundary is
        // inclusive.
        assert_eq!(xp_for_completion(&task, at(999)).punctuality_bonus, 20);
        assert_eq!(xp_for_completion(&task, at(1_000)).punctuality_bonus, 20);
        // Past due earns nothing, even though a due date exists.
        assert_eq!(xp_for_completion(&task, at(1_001)).punctuality_bonus, 0);
    }

    #[test]
    fn detail_bonus_is_strictly_over_50_chars() {
        let mut task = sample_task(Priority::Low);
        task.description = Some("x".repeat(50));
        assert_eq!(xp_for_completion(&task, at(100)).detail_bonus, 0);
        task.description = Some("x".repeat(51));
        assert_eq!(xp_for_completion(&task, at(100)).detail_bonus, 5);
    }

    #[test]
    fn streak_transitions() {
        let day = 86_400;
        // First ever activity.
        assert_eq!(next_streak(0, None, at(10 * day)), 1);
        // Next day continues.
        assert_eq!(next_streak(3, Some(at(10 * day)), at(11 * day)), 4);
        // Same day is unchanged.
        assert_eq!(next_streak(3, Some(at(10 * day)), at(10 * day + 3_600)), 3);
        // A two-day gap resets to 1, not 0.
        assert_eq!(next_streak(5, Some(at(10 * day)), at(12 * day)), 1);
        // Clock running backwards leaves the streak alone.
        assert_eq!(next_streak(5, Some(at(10 * day)), at(9 * day)), 5);
    }

    #[test]
    fn day_boundary_is_utc_midnight() {
        let day = 86_400;
        // 23:59 and 00:01 across a UTC midnight are different days.
        assert_eq!(next_streak(2, Some(at(11 * day - 60)), at(11 * day + 60)), 3);
    }

    #[test]
    fn award_updates_all_fields_as_one_unit() {
        let stats = UserStats::default();
        let updated = apply_award(&stats, 95, at(1_000_000));
        assert_eq!(updated.total_xp, 95);
        assert_eq!(updated.level, 1);
        assert_eq!(updated.tasks_completed, 1);
        assert_eq!(updated.current_streak, 1);
        assert_eq!(updated.longest_streak, 1);
        assert_eq!(updated.last_active_date, Some(at(1_000_000)));

        let again = apply_award(&updated, 10, at(1_000_500));
        assert_eq!(again.total_xp, 105);
        assert_eq!(again.level, 2);
    }

    #[test]
    fn longest_streak_is_high_water_mark() {
        let day = 86_400;
        let mut stats = UserStats::default();
        for d in 0..4 {
            stats = apply_award(&stats, 10, at((10 + d) * day));
        }
        assert_eq!(stats.current_streak, 4);
        assert_eq!(stats.longest_streak, 4);

        // Break the streak; the high-water mark survives.
        stats = apply_award(&stats, 10, at(20 * day));
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 4);
    }

    #[test]
    fn log_pomodoro_rejects_zero_minutes() {
        let db = Database::open_memory().unwrap();
        let clock = FixedClock::at_timestamp(1_000_000);
        let engine = ProgressionEngine::new(&db, &clock);
        let task = db.create_task(&NewTask::new("Focus"), clock.now()).unwrap();
        assert!(engine.log_pomodoro_minutes(&task.id, 0).is_err());
        assert!(engine.log_pomodoro_minutes(&task.id, 25).is_ok());
    }

    #[test]
    fn log_pomodoro_does_not_touch_xp_or_streak() {
        let db = Database::open_memory().unwrap();
        let clock = FixedClock::at_timestamp(1_000_000);
        let engine = ProgressionEngine::new(&db, &clock);
        let task = db.create_task(&NewTask::new("Focus"), clock.now()).unwrap();
        engine.log_pomodoro_minutes(&task.id, 25).unwrap();

        let stats = db.user_stats().unwrap();
        assert_eq!(stats.total_pomodoro_minutes, 25);
        assert_eq!(stats.total_xp, 0);
        assert_eq!(stats.current_streak, 0);
        assert!(db.unlocked_achievements().unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn level_invariant_holds_after_any_award_sequence(
            amounts in proptest::collection::vec(0u32..500, 1..20)
        ) {
            let mut stats = UserStats::default();
            let mut t = 1_000_000i64;
            for amount in amounts {
                t += 40_000; // Somewhere between same-day and next-day steps.
                stats = apply_award(&stats, amount, at(t));
                prop_assert_eq!(stats.level, stats.total_xp / 100 + 1);
                prop_assert!(stats.longest_streak >= stats.current_streak);
            }
        }

        #[test]
        fn streak_is_never_zero_after_activity(
            gap_days in 0i64..30,
            start in 1i64..1_000
        ) {
            let day = 86_400;
            let first = apply_award(&UserStats::default(), 10, at(start * day));
            prop_assert_eq!(first.current_streak, 1);
            let second = apply_award(&first, 10, at((start + gap_days) * day));
            prop_assert!(second.current_streak >= 1);
        }
    }
}
