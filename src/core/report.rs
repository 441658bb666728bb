//! Report data for a caller's account.
//!
//! Gathers everything a data export needs (profile, habits, entries and a small
//! summary) into one serializable structure. The requested [`ExportFormat`] is
//! checked here; rendering the snapshot as CSV or JSON is left to the outer
//! layer.

use crate::{
    core::{
        caller::Caller,
        entry::{EntryFilter, EntryRecord, list_entries},
        habit::{ArchivedFilter, list_habits},
        user::get_user,
    },
    entities::{HabitState, habit, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::instrument;

/// Output format of a data export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated entries
    Csv,
    /// Full snapshot as JSON
    Json,
}

impl ExportFormat {
    /// Parses the `format` query parameter.
    ///
    /// # Errors
    /// Returns [`Error::BadRequest`] unless the value is exactly `csv` or `json`.
    pub fn from_query(format: Option<&str>) -> Result<Self> {
        match format {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(Error::BadRequest {
                message: "Invalid format. Use 'csv' or 'json'.".to_string(),
            }),
        }
    }
}

/// Habit counts for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HabitSummary {
    /// All habits, archived or not
    pub total_habits: usize,
    /// Habits without `archived_at`
    pub active_habits: usize,
    /// Habits with `archived_at`
    pub archived_habits: usize,
}

impl HabitSummary {
    /// Counts active and archived habits in `habits`.
    #[must_use]
    pub fn from_habits(habits: &[habit::Model]) -> Self {
        let archived_habits = habits
            .iter()
            .filter(|h| matches!(h.state(), HabitState::Archived { .. }))
            .count();
        Self {
            total_habits: habits.len(),
            active_habits: habits.len() - archived_habits,
            archived_habits,
        }
    }
}

/// Everything stored for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDataSnapshot {
    /// When the snapshot was taken
    pub exported_at: DateTime<Utc>,
    /// The user's profile
    pub user: user::Model,
    /// All habits, by name
    pub habits: Vec<habit::Model>,
    /// All entries, newest day first
    pub entries: Vec<EntryRecord>,
    /// Habit counts
    pub summary: HabitSummary,
}

/// Computes habit counts for the caller.
pub async fn habit_summary(db: &DatabaseConnection, caller: &Caller) -> Result<HabitSummary> {
    let habits = list_habits(db, caller, ArchivedFilter::All).await?;
    Ok(HabitSummary::from_habits(&habits))
}

/// Collects the caller's profile, habits and entries.
///
/// # Errors
/// Returns [`crate::errors::Error::NotFound`] if the caller has no user row.
#[instrument(skip(db), fields(user_id = caller.user_id))]
pub async fn snapshot_user_data(
    db: &DatabaseConnection,
    caller: &Caller,
) -> Result<UserDataSnapshot> {
    let user = get_user(db, caller).await?;
    let habits = list_habits(db, caller, ArchivedFilter::All).await?;
    let entries = list_entries(db, caller, EntryFilter::default()).await?;
    let summary = HabitSummary::from_habits(&habits);

    tracing::debug!(
        habits = summary.total_habits,
        entries = entries.len(),
        "Collected user data snapshot"
    );

    Ok(UserDataSnapshot {
        exported_at: Utc::now(),
        user,
        habits,
        entries,
        summary,
    })
}
