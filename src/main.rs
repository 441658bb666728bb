use dotenvy::dotenv;
use routine_grid::{
    config::{database, settings},
    entities::{Habit, HabitColumn, HabitEntry, User},
    errors::Result,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env file (before settings so DATABASE_URL and RUST_LOG apply)
    dotenv().ok(); // Make it non-fatal, env vars can be set externally

    // 2. Load settings from config.toml with environment overrides
    let settings = settings::load_default_settings()?;

    // 3. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();
    info!("Loaded settings, database at {}", settings.database_url);

    // 4. Connect and make sure the schema exists
    let db = database::create_connection(&settings.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Report what is stored
    let users = User::find().count(&db).await?;
    let active_habits = Habit::find()
        .filter(HabitColumn::ArchivedAt.is_null())
        .count(&db)
        .await?;
    let entries = HabitEntry::find().count(&db).await?;
    info!(users, active_habits, entries, "Routine Grid database ready");

    Ok(())
}
