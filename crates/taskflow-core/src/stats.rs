//! The user's progression aggregate.
//!
//! One row per installation (id = 1), created with zero defaults at first
//! open and mutated only by the progression engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// XP required to advance one level.
pub const XP_PER_LEVEL: u32 = 100;

/// Level derived from a total XP count: 100 XP per level, starting at 1.
pub fn level_for_xp(total_xp: u32) -> u32 {
    total_xp / XP_PER_LEVEL + 1
}

/// Singleton progression aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_xp: u32,
    /// Derived: `total_xp / 100 + 1`.
    pub level: u32,
    /// Consecutive UTC days with at least one task completion.
    pub current_streak: u32,
    /// High-water mark of `current_streak`.
    pub longest_streak: u32,
    pub last_active_date: Option<DateTime<Utc>>,
    pub tasks_completed: u32,
    pub total_pomodoro_minutes: u32,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            total_xp: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            last_active_date: None,
            tasks_completed: 0,
            total_pomodoro_minutes: 0,
        }
    }
}

impl UserStats {
    /// XP accumulated within the current level.
    pub fn xp_into_level(&self) -> u32 {
        self.total_xp % XP_PER_LEVEL
    }

    /// XP still needed to reach the next level.
    pub fn xp_to_next_level(&self) -> u32 {
        XP_PER_LEVEL - self.xp_into_level()
    }

    /// Display title for the current level.
    pub fn level_title(&self) -> &'static str {
        match self.level {
            0..=4 => "Beginner",
            5..=9 => "Intermediate",
            10..=14 => "Professional",
            15..=19 => "Expert",
            _ => "Master",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_derivation() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(450), 5);
    }

    #[test]
    fn xp_progress_within_level() {
        let stats = UserStats {
            total_xp: 250,
            level: level_for_xp(250),
            ..UserStats::default()
        };
        assert_eq!(stats.xp_into_level(), 50);
        assert_eq!(stats.xp_to_next_level(), 50);
    }

    #[test]
    fn level_titles() {
        let mut stats = UserStats::default();
        assert_eq!(stats.level_title(), "Beginner");
        stats.level = 5;
        assert_eq!(stats.level_title(), "Intermediate");
        stats.level = 12;
        assert_eq!(stats.level_title(), "Professional");
        stats.level = 19;
        assert_eq!(stats.level_title(), "Expert");
        stats.level = 20;
        assert_eq!(stats.level_title(), "Master");
    }
}
