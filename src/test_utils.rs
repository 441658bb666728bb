//! Shared test utilities for Routine Grid.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        Caller,
        habit::{self, NewHabit},
        user,
    },
    entities::{self, HabitType},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a user and returns it as a caller.
pub async fn create_test_caller(db: &DatabaseConnection, username: &str) -> Result<Caller> {
    let user = user::create_user(db, username, &format!("{username}@example.com")).await?;
    Ok(Caller::new(user.id))
}

/// Creates a habit with only a name and type set.
pub async fn create_test_habit(
    db: &DatabaseConnection,
    caller: &Caller,
    name: &str,
    habit_type: HabitType,
) -> Result<entities::habit::Model> {
    habit::create_habit(db, caller, NewHabit::named(name).with_type(habit_type)).await
}

/// Sets up a database with a single user.
/// Returns (db, caller) for common test scenarios.
pub async fn setup_with_user(username: &str) -> Result<(DatabaseConnection, Caller)> {
    let db = setup_test_db().await?;
    let caller = create_test_caller(&db, username).await?;
    Ok((db, caller))
}

/// Two users with a few habits each.
pub struct TwoUsers {
    /// Database connection
    pub db: DatabaseConnection,
    /// `habituser1`, owns the first three habits
    pub owner: Caller,
    /// `habituser2`, owns `other_habit`
    pub other: Caller,
    /// Timed, active
    pub read_book: entities::habit::Model,
    /// Singular, active
    pub morning_run: entities::habit::Model,
    /// Singular, archived
    pub old_project: entities::habit::Model,
    /// Singular, active, owned by `other`
    pub other_habit: entities::habit::Model,
}

/// Sets up two users: one with "Read Book" (timed), "Morning Run" and the
/// archived "Old Project", and one with "User 2 Habit".
pub async fn setup_two_users() -> Result<TwoUsers> {
    let db = setup_test_db().await?;
    let owner = create_test_caller(&db, "habituser1").await?;
    let other = create_test_caller(&db, "habituser2").await?;

    let read_book = create_test_habit(&db, &owner, "Read Book", HabitType::Timed).await?;
    let morning_run = create_test_habit(&db, &owner, "Morning Run", HabitType::Singular).await?;
    let old_project = create_test_habit(&db, &owner, "Old Project", HabitType::Singular).await?;
    let old_project = habit::archive_habit(&db, &owner, old_project.id).await?;
    let other_habit = create_test_habit(&db, &other, "User 2 Habit", HabitType::Singular).await?;

    Ok(TwoUsers {
        db,
        owner,
        other,
        read_book,
        morning_run,
        old_project,
        other_habit,
    })
}
