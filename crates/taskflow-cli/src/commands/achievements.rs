use clap::Subcommand;
use taskflow_core::progression::achievements;
use taskflow_core::Database;

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// List all achievements with their unlock state
    List,
}

pub fn run(action: AchievementsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        AchievementsAction::List => {
            let statuses = achievements::list(&db)?;
            println!("{}", serde_json::to_string_pretty(&statuses)?);
        }
    }
    Ok(())
}
