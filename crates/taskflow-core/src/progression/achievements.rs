//! Achievement registry and evaluation.
//!
//! A static declarative table of (key, predicate) pairs over the stats
//! aggregate, evaluated in registry order after every XP award. Rows are
//! created lazily the first time a predicate turns true and are never
//! re-locked, even when the stats later regress (a broken streak does
//! not take "On a Roll" away).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::stats::UserStats;
use crate::storage::Database;

/// One achievement definition.
pub struct AchievementDef {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub predicate: fn(&UserStats) -> bool,
}

/// The fixed registry. Policy, not configuration.
pub const REGISTRY: &[AchievementDef] = &[
    AchievementDef {
        key: "first_task",
        name: "Getting Started",
        description: "Complete your first task",
        predicate: |s| s.tasks_completed >= 1,
    },
    AchievementDef {
        key: "streak_3",
        name: "On a Roll",
        description: "Maintain a 3-day streak",
        predicate: |s| s.current_streak >= 3,
    },
    AchievementDef {
        key: "streak_7",
        name: "Dedicated",
        description: "Maintain a 7-day streak",
        predicate: |s| s.current_streak >= 7,
    },
    AchievementDef {
        key: "level_5",
        name: "Leveling Up",
        description: "Reach level 5",
        predicate: |s| s.level >= 5,
    },
    AchievementDef {
        key: "tasks_10",
        name: "Productive",
        description: "Complete 10 tasks",
        predicate: |s| s.tasks_completed >= 10,
    },
    AchievementDef {
        key: "pomodoro_10",
        name: "Focused Mind",
        description: "Complete 10 hours of Pomodoro",
        predicate: |s| s.total_pomodoro_minutes >= 600,
    },
];

/// Registry entry joined with its unlock state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub key: String,
    pub name: String,
    pub description: String,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Re-evaluate every predicate against the given stats, unlocking the
/// ones that newly hold. Returns only the newly unlocked entries.
pub fn evaluate(
    db: &Database,
    stats: &UserStats,
    now: DateTime<Utc>,
) -> Result<Vec<AchievementStatus>> {
    let mut unlocked = Vec::new();
    for def in REGISTRY {
        if (def.predicate)(stats) && db.unlock_achievement(def.key, now)? {
            info!(key = def.key, name = def.name, "achievement unlocked");
            unlocked.push(AchievementStatus {
                key: def.key.to_string(),
                name: def.name.to_string(),
                description: def.description.to_string(),
                unlocked: true,
                unlocked_at: Some(now),
            });
        }
    }
    Ok(unlocked)
}

/// The whole registry joined with unlock state, in registry order.
pub fn list(db: &Database) -> Result<Vec<AchievementStatus>> {
    let rows = db.unlocked_achievements()?;
    Ok(REGISTRY
        .iter()
        .map(|def| {
            let unlocked_at = rows
                .iter()
                .find(|(key, _)| key == def.key)
                .map(|(_, at)| *at);
            AchievementStatus {
                key: def.key.to_string(),
                name: def.name.to_string(),
                description: def.description.to_string(),
                unlocked: unlocked_at.is_some(),
                unlocked_at,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn registry_keys_are_unique() {
        for (i, def) in REGISTRY.iter().enumerate() {
            assert!(REGISTRY[i + 1..].iter().all(|other| other.key != def.key));
        }
    }

    #[test]
    fn fresh_stats_unlock_nothing() {
        let db = Database::open_memory().unwrap();
        let unlocked = evaluate(&db, &UserStats::default(), at(1_000)).unwrap();
        assert!(unlocked.is_empty());
    }

    #[test]
    fn first_task_unlocks_once() {
        let db = Database::open_memory().unwrap();
        let stats = UserStats {
            tasks_completed: 1,
            ..UserStats::default()
        };
        let first = evaluate(&db, &stats, at(1_000)).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].key, "first_task");

        // Second evaluation with the same stats reports nothing new.
        let second = evaluate(&db, &stats, at(2_000)).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn unlocks_survive_stat_regression() {
        let db = Database::open_memory().unwrap();
        let on_a_roll = UserStats {
            tasks_completed: 3,
            current_streak: 3,
            longest_streak: 3,
            ..UserStats::default()
        };
        evaluate(&db, &on_a_roll, at(1_000)).unwrap();

        // Streak broke; streak_3 stays unlocked.
        let broken = UserStats {
            current_streak: 1,
            ..on_a_roll
        };
        evaluate(&db, &broken, at(2_000)).unwrap();
        let statuses = list(&db).unwrap();
        let streak_3 = statuses.iter().find(|s| s.key == "streak_3").unwrap();
        assert!(streak_3.unlocked);
        assert_eq!(streak_3.unlocked_at, Some(at(1_000)));
    }

    #[test]
    fn list_keeps_registry_order() {
        let db = Database::open_memory().unwrap();
        let statuses = list(&db).unwrap();
        let keys: Vec<_> = statuses.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            ["first_task", "streak_3", "streak_7", "level_5", "tasks_10", "pomodoro_10"]
        );
        assert!(statuses.iter().all(|s| !s.unlocked));
    }

    #[test]
    fn pomodoro_10_needs_ten_hours() {
        let db = Database::open_memory().unwrap();
        let stats = UserStats {
            total_pomodoro_minutes: 599,
            ..UserStats::default()
        };
        assert!(evaluate(&db, &stats, at(1_000)).unwrap().is_empty());
        let stats = UserStats {
            total_pomodoro_minutes: 600,
            ..stats
        };
        let unlocked = evaluate(&db, &stats, at(2_000)).unwrap();
        assert_eq!(unlocked[0].key, "pomodoro_10");
    }
}
