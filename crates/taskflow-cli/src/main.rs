use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "taskflow", version, about = "TaskFlow CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Focus timer control
    Focus {
        #[command(subcommand)]
        action: commands::focus::FocusAction,
    },
    /// Progression statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Achievement listing
    Achievements {
        #[command(subcommand)]
        action: commands::achievements::AchievementsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TASKFLOW_LOG")
        .unwrap_or_else(|_| EnvFilter::new("taskflow=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Focus { action } => commands::focus::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Achievements { action } => commands::achievements::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_task_create_with_flags() {
        Cli::try_parse_from([
            "taskflow",
            "task",
            "create",
            "Write docs",
            "--priority",
            "high",
            "--due",
            "2026-09-01T17:00:00Z",
        ])
        .unwrap();
    }

    #[test]
    fn parses_task_update_clear_flags() {
        Cli::try_parse_from([
            "taskflow",
            "task",
            "update",
            "abc",
            "--clear-description",
            "--clear-due",
        ])
        .unwrap();
        // Setting and clearing the same field is contradictory.
        assert!(Cli::try_parse_from([
            "taskflow",
            "task",
            "update",
            "abc",
            "--description",
            "notes",
            "--clear-description",
        ])
        .is_err());
    }

    #[test]
    fn parses_focus_subcommands() {
        Cli::try_parse_from(["taskflow", "focus", "start", "--task", "abc"]).unwrap();
        Cli::try_parse_from(["taskflow", "focus", "tick", "--seconds", "60"]).unwrap();
        Cli::try_parse_from(["taskflow", "focus", "skip-break"]).unwrap();
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["taskflow", "pomodoro"]).is_err());
    }
}
