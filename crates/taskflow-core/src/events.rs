use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::focus::{Phase, RunState};
use crate::progression::XpBreakdown;
use crate::stats::UserStats;

/// Every observable state change in the system produces an Event.
/// The CLI prints them as JSON; a GUI would poll for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    FocusStarted {
        task_id: String,
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    FocusPaused {
        task_id: String,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// A work or break interval reached 00:00. `logged_minutes` is the
    /// nominal work length for a finished work phase, 0 for a break.
    PhaseCompleted {
        task_id: String,
        finished: Phase,
        next: Phase,
        logged_minutes: u32,
        at: DateTime<Utc>,
    },
    FocusReset {
        task_id: String,
        at: DateTime<Utc>,
    },
    BreakSkipped {
        task_id: String,
        at: DateTime<Utc>,
    },
    FocusSnapshot {
        task_id: String,
        phase: Phase,
        run_state: RunState,
        remaining_secs: u32,
        total_secs: u32,
        progress: f64,
        sessions_completed: u32,
        at: DateTime<Utc>,
    },
    /// A task completion was rewarded.
    XpAwarded {
        task_id: String,
        breakdown: XpBreakdown,
        total: u32,
        stats: UserStats,
        at: DateTime<Utc>,
    },
    AchievementUnlocked {
        key: String,
        name: String,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn events_tag_by_type() {
        let event = Event::BreakSkipped {
            task_id: "t1".into(),
            at: Utc.timestamp_opt(1_000_000, 0).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "BreakSkipped");
        assert_eq!(json["task_id"], "t1");
    }
}
