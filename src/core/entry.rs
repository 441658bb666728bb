//! Habit entry business logic - Handles logging, editing and removing entries.
//!
//! Entries are scoped the same way habits are: [`visible_entries`] restricts the
//! table to the caller's rows, so another user's entry is reported as not found.
//!
//! Creating an entry checks, in order, that the referenced habit is the caller's,
//! that it is not archived, and that the value fits the habit type. The
//! one-entry-per-day rule is left to the unique index on `(habit_id, entry_date)`
//! so concurrent inserts race safely; the loser gets a validation error.

use crate::{
    core::{caller::Caller, habit::visible_habits},
    entities::{Habit, HabitEntry, HabitState, habit, habit_entry},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Select, Set, SqlErr, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input for logging a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Habit being logged
    pub habit_id: i64,
    /// Calendar day of the entry
    pub entry_date: NaiveDate,
    /// Amount; 1 when omitted
    pub value: Option<i32>,
    /// Optional notes
    pub notes: Option<String>,
}

impl NewEntry {
    /// An entry for `habit_id` on `entry_date` with the default value.
    #[must_use]
    pub const fn new(habit_id: i64, entry_date: NaiveDate) -> Self {
        Self {
            habit_id,
            entry_date,
            value: None,
            notes: None,
        }
    }

    /// Sets the value.
    #[must_use]
    pub const fn with_value(mut self, value: i32) -> Self {
        self.value = Some(value);
        self
    }
}

/// Partial update of an entry. The habit and date of an entry never change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryChanges {
    /// New value
    pub value: Option<i32>,
    /// New notes; `Some(None)` clears them
    pub notes: Option<Option<String>>,
}

/// An entry together with the name of its habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    /// The stored entry
    #[serde(flatten)]
    pub entry: habit_entry::Model,
    /// Name of the habit the entry belongs to
    pub habit_name: String,
}

impl EntryRecord {
    fn from_pair(entry: habit_entry::Model, habit: Option<habit::Model>) -> Self {
        Self {
            entry,
            habit_name: habit.map(|h| h.name).unwrap_or_default(),
        }
    }
}

/// Raw listing parameters as they arrive on a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryQuery<'a> {
    /// `habit_id` parameter
    pub habit_id: Option<&'a str>,
    /// `start_date` parameter, inclusive
    pub start_date: Option<&'a str>,
    /// `end_date` parameter, inclusive
    pub end_date: Option<&'a str>,
    /// `date` parameter, exact match
    pub date: Option<&'a str>,
}

/// Parsed listing filters. All filters combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Only entries of this habit
    pub habit_id: Option<i64>,
    /// Only entries on or after this day
    pub start_date: Option<NaiveDate>,
    /// Only entries on or before this day
    pub end_date: Option<NaiveDate>,
    /// Only entries on exactly this day
    pub date: Option<NaiveDate>,
}

impl EntryFilter {
    /// Parses raw query parameters. Empty values count as absent.
    ///
    /// # Errors
    /// Returns [`Error::BadRequest`] when a habit id is not an integer or a
    /// date is not `YYYY-MM-DD`.
    pub fn from_query(query: EntryQuery<'_>) -> Result<Self> {
        let habit_id = non_empty(query.habit_id)
            .map(|raw| {
                raw.parse::<i64>().map_err(|_| Error::BadRequest {
                    message: format!("habit_id must be an integer, got {raw:?}"),
                })
            })
            .transpose()?;

        Ok(Self {
            habit_id,
            start_date: parse_date("start_date", query.start_date)?,
            end_date: parse_date("end_date", query.end_date)?,
            date: parse_date("date", query.date)?,
        })
    }

    fn apply(self, mut query: Select<HabitEntry>) -> Select<HabitEntry> {
        if let Some(habit_id) = self.habit_id {
            query = query.filter(habit_entry::Column::HabitId.eq(habit_id));
        }
        if let Some(start) = self.start_date {
            query = query.filter(habit_entry::Column::EntryDate.gte(start));
        }
        if let Some(end) = self.end_date {
            query = query.filter(habit_entry::Column::EntryDate.lte(end));
        }
        if let Some(date) = self.date {
            query = query.filter(habit_entry::Column::EntryDate.eq(date));
        }
        query
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(param: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    non_empty(raw)
        .map(|value| {
            NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| Error::BadRequest {
                message: format!("{param} must be a date in YYYY-MM-DD format, got {value:?}"),
            })
        })
        .transpose()
}

/// All entries owned by the caller. Every entry lookup goes through this.
#[must_use]
pub fn visible_entries(caller: &Caller) -> Select<HabitEntry> {
    HabitEntry::find().filter(habit_entry::Column::UserId.eq(caller.user_id))
}

async fn find_owned_entry<C: ConnectionTrait>(
    db: &C,
    caller: &Caller,
    entry_id: i64,
) -> Result<(habit_entry::Model, habit::Model)> {
    let found = visible_entries(caller)
        .filter(habit_entry::Column::Id.eq(entry_id))
        .find_also_related(Habit)
        .one(db)
        .await?;

    match found {
        Some((entry, Some(habit))) => Ok((entry, habit)),
        _ => Err(Error::NotFound {
            resource: "entry",
            id: entry_id,
        }),
    }
}

fn check_value(habit: &habit::Model, value: i32) -> Result<()> {
    let rule = habit.habit_type.value_rule();
    if rule.allows(value) {
        Ok(())
    } else {
        Err(Error::invalid_field("value", rule.violation_message()))
    }
}

fn duplicate_day_error(err: DbErr) -> Error {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        Error::Invalid {
            message: "The fields habit, entry_date must make a unique set.".to_string(),
        }
    } else {
        err.into()
    }
}

/// Logs an entry for one of the caller's active habits.
///
/// # Errors
/// - [`Error::InvalidField`] on `habit` if the habit is missing, not the
///   caller's, or archived
/// - [`Error::InvalidField`] on `value` if the value breaks the habit type rule
/// - [`Error::Invalid`] if the habit already has an entry on that day
#[instrument(skip(db, input), fields(user_id = caller.user_id, habit_id = input.habit_id))]
pub async fn create_entry(
    db: &DatabaseConnection,
    caller: &Caller,
    input: NewEntry,
) -> Result<EntryRecord> {
    let value = input.value.unwrap_or(1);

    let txn = db.begin().await?;

    let habit = visible_habits(caller)
        .filter(habit::Column::Id.eq(input.habit_id))
        .one(&txn)
        .await?
        .ok_or_else(|| {
            Error::invalid_field(
                "habit",
                format!("Invalid pk \"{}\" - object does not exist.", input.habit_id),
            )
        })?;

    if let HabitState::Archived { .. } = habit.state() {
        return Err(Error::invalid_field(
            "habit",
            "Cannot log entries for an archived habit.",
        ));
    }

    check_value(&habit, value)?;

    let now = Utc::now();
    let entry = habit_entry::ActiveModel {
        habit_id: Set(habit.id),
        user_id: Set(caller.user_id),
        entry_date: Set(input.entry_date),
        value: Set(value),
        notes: Set(input.notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = entry.insert(&txn).await.map_err(|e| {
        let err = duplicate_day_error(e);
        if matches!(err, Error::Invalid { .. }) {
            warn!(entry_date = %input.entry_date, "Duplicate entry for habit and day");
        }
        err
    })?;

    txn.commit().await?;

    info!(entry_id = result.id, "Created habit entry");
    Ok(EntryRecord::from_pair(result, Some(habit)))
}

/// Lists the caller's entries matching `filter`, newest day first.
pub async fn list_entries(
    db: &DatabaseConnection,
    caller: &Caller,
    filter: EntryFilter,
) -> Result<Vec<EntryRecord>> {
    let rows = filter
        .apply(visible_entries(caller))
        .find_also_related(Habit)
        .order_by_desc(habit_entry::Column::EntryDate)
        .order_by_asc(habit::Column::Name)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(entry, habit)| EntryRecord::from_pair(entry, habit))
        .collect())
}

/// Retrieves one of the caller's entries.
///
/// # Errors
/// Returns [`Error::NotFound`] if the entry does not exist or belongs to another user.
pub async fn get_entry(
    db: &DatabaseConnection,
    caller: &Caller,
    entry_id: i64,
) -> Result<EntryRecord> {
    let (entry, habit) = find_owned_entry(db, caller, entry_id).await?;
    Ok(EntryRecord::from_pair(entry, Some(habit)))
}

/// Replaces the value and notes of an entry; omitted notes are cleared.
///
/// An omitted value keeps the stored one, as the value column has a default.
pub async fn update_entry(
    db: &DatabaseConnection,
    caller: &Caller,
    entry_id: i64,
    value: Option<i32>,
    notes: Option<String>,
) -> Result<EntryRecord> {
    let changes = EntryChanges {
        value,
        notes: Some(notes),
    };
    partial_update_entry(db, caller, entry_id, changes).await
}

/// Applies only the supplied fields to an entry.
///
/// The resulting value is checked against the parent habit's current type,
/// even when only the notes change.
///
/// # Errors
/// - [`Error::NotFound`] if the entry is not the caller's
/// - [`Error::InvalidField`] on `value` if the value breaks the habit type rule
#[instrument(skip(db, changes), fields(user_id = caller.user_id))]
pub async fn partial_update_entry(
    db: &DatabaseConnection,
    caller: &Caller,
    entry_id: i64,
    changes: EntryChanges,
) -> Result<EntryRecord> {
    let (entry, habit) = find_owned_entry(db, caller, entry_id).await?;

    let value = changes.value.unwrap_or(entry.value);
    check_value(&habit, value)?;

    let mut active: habit_entry::ActiveModel = entry.into();
    active.value = Set(value);
    if let Some(notes) = changes.notes {
        active.notes = Set(notes);
    }
    active.updated_at = Set(Utc::now());

    let result = active.update(db).await?;
    debug!(entry_id, "Updated habit entry");
    Ok(EntryRecord::from_pair(result, Some(habit)))
}

/// Permanently removes one of the caller's entries.
///
/// # Errors
/// Returns [`Error::NotFound`] if the entry does not exist or belongs to another user.
#[instrument(skip(db), fields(user_id = caller.user_id))]
pub async fn delete_entry(db: &DatabaseConnection, caller: &Caller, entry_id: i64) -> Result<()> {
    let result = HabitEntry::delete_many()
        .filter(habit_entry::Column::UserId.eq(caller.user_id))
        .filter(habit_entry::Column::Id.eq(entry_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            resource: "entry",
            id: entry_id,
        });
    }

    info!(entry_id, "Deleted habit entry");
    Ok(())
}
