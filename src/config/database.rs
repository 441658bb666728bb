//! Database configuration module for Routine Grid.
//!
//! This module handles the database connection and schema creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models.
//! The one thing entities cannot express, the composite uniqueness of
//! `(habit_id, entry_date)`, is added here as an explicit unique index.

use crate::entities::{Habit, HabitEntry, HabitEntryColumn, User};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Name of the unique index backing the one-entry-per-day rule.
pub const ENTRY_DAY_INDEX: &str = "idx_habit_entries_habit_date";

/// Opens a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables and indexes if they do not already exist.
///
/// Safe to run on every startup. Tables are created parent-first so foreign keys
/// resolve: users, habits, then habit entries.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Habit).await?;
    create_table(db, &schema, HabitEntry).await?;

    db.execute(builder.build(&entry_day_index())).await?;

    info!("Database schema is up to date");
    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement))
        .await?;
    Ok(())
}

fn entry_day_index() -> IndexCreateStatement {
    Index::create()
        .name(ENTRY_DAY_INDEX)
        .table(HabitEntry)
        .col(HabitEntryColumn::HabitId)
        .col(HabitEntryColumn::EntryDate)
        .unique()
        .if_not_exists()
        .to_owned()
}
