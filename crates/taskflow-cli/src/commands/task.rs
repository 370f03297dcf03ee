use chrono::{DateTime, Utc};
use clap::Subcommand;
use taskflow_core::{
    Database, Event, NewTask, Priority, ProgressionEngine, SystemClock, TaskFilter, TaskPatch,
    TaskStatus,
};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
        /// Priority: low, medium, or high
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Category label
        #[arg(long)]
        category: Option<String>,
        /// Estimated minutes
        #[arg(long)]
        estimate: Option<u32>,
        /// Due date (RFC3339, e.g. 2026-09-01T17:00:00Z)
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks, newest first
    List {
        /// Filter by status: todo, in-progress, or done
        #[arg(long)]
        status: Option<String>,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Substring match against title or description
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a single task
    Get { id: String },
    /// Update task fields
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        /// New status: todo, in-progress, or done
        #[arg(long)]
        status: Option<String>,
        /// New priority: low, medium, or high
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Remove the category
        #[arg(long, conflicts_with = "category")]
        clear_category: bool,
        #[arg(long)]
        estimate: Option<u32>,
        /// Remove the estimate
        #[arg(long, conflicts_with = "estimate")]
        clear_estimate: bool,
        /// Due date (RFC3339)
        #[arg(long)]
        due: Option<String>,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
    },
    /// Mark a task done (awards XP on the first completion)
    Complete { id: String },
    /// Delete a task (awarded XP is kept)
    Delete { id: String },
    /// Todo/in-progress/done totals
    Counts,
    /// Categories in use
    Categories,
}

/// Turn a set-flag/clear-flag pair into a patch field: clearing wins,
/// a plain value sets, neither leaves the field untouched.
fn patched<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn parse_due(due: Option<String>) -> Result<Option<DateTime<Utc>>, Box<dyn std::error::Error>> {
    due.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("invalid due date '{s}': {e}").into())
    })
    .transpose()
}

/// Print the task, then the reward events when the update completed it.
fn print_outcome(
    task: &taskflow_core::Task,
    reward: Option<taskflow_core::CompletionReward>,
    at: DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(task)?);
    if let Some(reward) = reward {
        let awarded = Event::XpAwarded {
            task_id: task.id.clone(),
            breakdown: reward.xp,
            total: reward.xp.total(),
            stats: reward.stats,
            at,
        };
        println!("{}", serde_json::to_string_pretty(&awarded)?);
        for achievement in reward.unlocked {
            let unlocked = Event::AchievementUnlocked {
                key: achievement.key,
                name: achievement.name,
                at,
            };
            println!("{}", serde_json::to_string_pretty(&unlocked)?);
        }
    }
    Ok(())
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let clock = SystemClock;
    let engine = ProgressionEngine::new(&db, &clock);

    match action {
        TaskAction::Create {
            title,
            description,
            priority,
            category,
            estimate,
            due,
        } => {
            let new = NewTask {
                title,
                description,
                status: TaskStatus::Todo,
                priority: priority.parse::<Priority>()?,
                category,
                estimated_minutes: estimate,
                due_date: parse_due(due)?,
            };
            let task = db.create_task(&new, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List {
            status,
            category,
            search,
        } => {
            let filter = TaskFilter {
                status: status.map(|s| s.parse::<TaskStatus>()).transpose()?,
                category,
                search,
            };
            let tasks = db.list_tasks(&filter)?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TaskAction::Get { id } => {
            let task = db.get_task(&id)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Update {
            id,
            title,
            description,
            clear_description,
            status,
            priority,
            category,
            clear_category,
            estimate,
            clear_estimate,
            due,
            clear_due,
        } => {
            let patch = TaskPatch {
                title,
                description: patched(description, clear_description),
                status: status.map(|s| s.parse::<TaskStatus>()).transpose()?,
                priority: priority.map(|p| p.parse::<Priority>()).transpose()?,
                category: patched(category, clear_category),
                estimated_minutes: patched(estimate, clear_estimate),
                due_date: patched(parse_due(due)?, clear_due),
            };
            let (task, reward) = engine.update_task(&id, &patch)?;
            print_outcome(&task, reward, Utc::now())?;
        }
        TaskAction::Complete { id } => {
            let patch = TaskPatch {
                status: Some(TaskStatus::Done),
                ..TaskPatch::default()
            };
            let (task, reward) = engine.update_task(&id, &patch)?;
            print_outcome(&task, reward, Utc::now())?;
        }
        TaskAction::Delete { id } => {
            if db.delete_task(&id)? {
                eprintln!("deleted {id}");
            } else {
                eprintln!("no task with id {id}");
            }
        }
        TaskAction::Counts => {
            let counts = db.task_counts()?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
        TaskAction::Categories => {
            let categories = db.categories()?;
            println!("{}", serde_json::to_string_pretty(&categories)?);
        }
    }
    Ok(())
}
