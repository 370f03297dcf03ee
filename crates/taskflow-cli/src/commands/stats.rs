use clap::Subcommand;
use serde::Serialize;
use taskflow_core::{Database, UserStats};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Print the progression aggregate as JSON
    Show,
}

/// UserStats plus the derived display fields the stats view renders.
#[derive(Serialize)]
struct StatsView {
    #[serde(flatten)]
    stats: UserStats,
    level_title: &'static str,
    xp_into_level: u32,
    xp_to_next_level: u32,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StatsAction::Show => {
            let stats = db.user_stats()?;
            let view = StatsView {
                level_title: stats.level_title(),
                xp_into_level: stats.xp_into_level(),
                xp_to_next_level: stats.xp_to_next_level(),
                stats,
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }
    Ok(())
}
