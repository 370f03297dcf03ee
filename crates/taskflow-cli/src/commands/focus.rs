use std::time::Duration;

use clap::Subcommand;
use taskflow_core::{
    Config, Database, Event, FocusController, FocusSession, Notifier, SystemClock,
};

const SESSION_KEY: &str = "focus_session";

#[derive(Subcommand)]
pub enum FocusAction {
    /// Start a focus session on a task
    Start {
        /// Task ID to focus on
        #[arg(long)]
        task: String,
    },
    /// Pause the countdown, preserving remaining time
    Pause,
    /// Resume a paused session
    Resume,
    /// Print current session state as JSON
    Status,
    /// Advance the countdown manually
    Tick {
        /// Number of one-second ticks to apply
        #[arg(long, default_value = "1")]
        seconds: u32,
    },
    /// Run the countdown at 1 Hz until the phase completes
    Run,
    /// Reset to an idle work phase
    Reset,
    /// Skip the current break
    SkipBreak,
}

/// Prints notifications to stderr. Best-effort by construction: a
/// disabled channel silently swallows everything.
struct TerminalNotifier {
    enabled: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&self, title: &str, body: &str) {
        if self.enabled {
            eprintln!("{title} {body}");
        }
    }
}

fn load_session(db: &Database) -> Result<Option<FocusSession>, Box<dyn std::error::Error>> {
    match db.kv_get(SESSION_KEY)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn save_session(db: &Database, session: &FocusSession) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(session)?;
    db.kv_set(SESSION_KEY, &json)?;
    Ok(())
}

fn require_session(db: &Database) -> Result<FocusSession, Box<dyn std::error::Error>> {
    load_session(db)?.ok_or_else(|| "no focus session; run `focus start --task <id>` first".into())
}

pub fn run(action: FocusAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let clock = SystemClock;
    let notifier = TerminalNotifier {
        enabled: config.notifications.enabled,
    };

    match action {
        FocusAction::Start { task } => {
            // Fails before any state is written if the task is unknown.
            db.get_task(&task)?;
            let session = FocusSession::new(
                task,
                config.timer.work_minutes,
                config.timer.break_minutes,
            );
            let mut controller = FocusController::new(session, &db, &clock, &notifier);
            let event = controller.start();
            println!("{}", serde_json::to_string_pretty(&event)?);
            save_session(&db, controller.session())?;
        }
        FocusAction::Pause => {
            let session = require_session(&db)?;
            let mut controller = FocusController::new(session, &db, &clock, &notifier);
            let event = controller.pause();
            println!("{}", serde_json::to_string_pretty(&event)?);
            save_session(&db, controller.session())?;
        }
        FocusAction::Resume => {
            let session = require_session(&db)?;
            let mut controller = FocusController::new(session, &db, &clock, &notifier);
            let event = controller.start();
            println!("{}", serde_json::to_string_pretty(&event)?);
            save_session(&db, controller.session())?;
        }
        FocusAction::Status => {
            let session = require_session(&db)?;
            let controller = FocusController::new(session, &db, &clock, &notifier);
            println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
        }
        FocusAction::Tick { seconds } => {
            let session = require_session(&db)?;
            let mut controller = FocusController::new(session, &db, &clock, &notifier);
            for _ in 0..seconds {
                if let Some(event) = controller.tick()? {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
            }
            println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
            save_session(&db, controller.session())?;
        }
        FocusAction::Run => {
            let session = require_session(&db)?;
            let mut controller = FocusController::new(session, &db, &clock, &notifier);
            controller.start();
            save_session(&db, controller.session())?;

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            let completed: Result<Event, Box<dyn std::error::Error>> = rt.block_on(async {
                let mut interval = tokio::time::interval(Duration::from_secs(1));
                interval.tick().await; // First tick is immediate.
                loop {
                    interval.tick().await;
                    if let Some(event) = controller.tick()? {
                        return Ok(event);
                    }
                    tracing::debug!(
                        remaining = controller.session().remaining_secs(),
                        "tick"
                    );
                }
            });
            let event = completed?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            save_session(&db, controller.session())?;
        }
        FocusAction::Reset => {
            let session = require_session(&db)?;
            let mut controller = FocusController::new(session, &db, &clock, &notifier);
            let event = controller.reset();
            println!("{}", serde_json::to_string_pretty(&event)?);
            save_session(&db, controller.session())?;
        }
        FocusAction::SkipBreak => {
            let session = require_session(&db)?;
            let mut controller = FocusController::new(session, &db, &clock, &notifier);
            match controller.skip_break() {
                Some(event) => {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                    save_session(&db, controller.session())?;
                }
                None => return Err("not in a break phase".into()),
            }
        }
    }
    Ok(())
}
