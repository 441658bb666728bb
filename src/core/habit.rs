//! Habit business logic - Handles habit creation, editing and archival.
//!
//! Every query starts from [`visible_habits`], which restricts the table to the
//! caller's rows before any lookup happens. A habit owned by someone else is
//! therefore indistinguishable from one that does not exist: both surface as
//! [`Error::NotFound`].
//!
//! Habits are soft-deleted. [`delete_habit`] and [`archive_habit`] stamp
//! `archived_at`; [`unarchive_habit`] clears it. Both transitions are idempotent.

use crate::{
    core::caller::Caller,
    entities::{Habit, HabitState, HabitType, habit},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Select, Set, prelude::*};
use tracing::{debug, info, instrument};

const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 100;
const COLOR_MAX_CHARS: usize = 7;
const GOAL_UNIT_MAX_CHARS: usize = 10;

/// Input for creating a habit, or for replacing all editable fields of one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewHabit {
    /// Display name, at least 3 characters
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Habit type; singular when omitted
    pub habit_type: Option<HabitType>,
    /// Optional display color
    pub color: Option<String>,
    /// Optional non-negative daily goal
    pub goal_value: Option<i32>,
    /// Optional unit for the goal
    pub goal_unit: Option<String>,
}

impl NewHabit {
    /// A singular habit with only a name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the habit type.
    #[must_use]
    pub const fn with_type(mut self, habit_type: HabitType) -> Self {
        self.habit_type = Some(habit_type);
        self
    }
}

/// Partial update of a habit. `None` leaves a field untouched; for nullable
/// fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitChanges {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<Option<String>>,
    /// New habit type
    pub habit_type: Option<HabitType>,
    /// New color
    pub color: Option<Option<String>>,
    /// New goal value
    pub goal_value: Option<Option<i32>>,
    /// New goal unit
    pub goal_unit: Option<Option<String>>,
}

impl From<NewHabit> for HabitChanges {
    /// A full replacement: omitted optional fields are cleared and the type
    /// falls back to singular.
    fn from(input: NewHabit) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            habit_type: Some(input.habit_type.unwrap_or_default()),
            color: Some(input.color),
            goal_value: Some(input.goal_value),
            goal_unit: Some(input.goal_unit),
        }
    }
}

/// Which habits a listing includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchivedFilter {
    /// Only habits with no `archived_at`
    #[default]
    Active,
    /// Only archived habits
    Archived,
    /// Everything the caller owns
    All,
}

impl ArchivedFilter {
    /// Interprets the raw `archived` query parameter.
    ///
    /// `true`/`1` select archived habits, `false`/`0` or an absent parameter
    /// select active ones, anything else disables the filter.
    #[must_use]
    pub fn from_query(param: Option<&str>) -> Self {
        match param.map(str::to_ascii_lowercase).as_deref() {
            None | Some("false" | "0") => Self::Active,
            Some("true" | "1") => Self::Archived,
            Some(_) => Self::All,
        }
    }

    fn apply(self, query: Select<Habit>) -> Select<Habit> {
        match self {
            Self::Active => query.filter(habit::Column::ArchivedAt.is_null()),
            Self::Archived => query.filter(habit::Column::ArchivedAt.is_not_null()),
            Self::All => query,
        }
    }
}

/// All habits owned by the caller. Every habit lookup goes through this.
#[must_use]
pub fn visible_habits(caller: &Caller) -> Select<Habit> {
    Habit::find().filter(habit::Column::UserId.eq(caller.user_id))
}

/// Loads one of the caller's habits, archived or not.
async fn find_owned_habit<C: ConnectionTrait>(
    db: &C,
    caller: &Caller,
    habit_id: i64,
) -> Result<habit::Model> {
    visible_habits(caller)
        .filter(habit::Column::Id.eq(habit_id))
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            resource: "habit",
            id: habit_id,
        })
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_field("name", "Name is required."));
    }
    let length = name.chars().count();
    if length < NAME_MIN_CHARS {
        return Err(Error::invalid_field(
            "name",
            "Name must be at least 3 characters long.",
        ));
    }
    if length > NAME_MAX_CHARS {
        return Err(Error::invalid_field(
            "name",
            format!("Ensure this field has no more than {NAME_MAX_CHARS} characters."),
        ));
    }
    Ok(name.to_string())
}

fn validate_max_chars(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>> {
    match value {
        Some(v) if v.chars().count() > max => Err(Error::invalid_field(
            field,
            format!("Ensure this field has no more than {max} characters."),
        )),
        other => Ok(other),
    }
}

fn validate_goal_value(goal_value: Option<i32>) -> Result<Option<i32>> {
    match goal_value {
        Some(v) if v < 0 => Err(Error::invalid_field(
            "goal_value",
            "Ensure this value is greater than or equal to 0.",
        )),
        other => Ok(other),
    }
}

/// Validated form of [`HabitChanges`].
struct CheckedChanges(HabitChanges);

impl CheckedChanges {
    fn new(changes: HabitChanges) -> Result<Self> {
        Ok(Self(HabitChanges {
            name: changes.name.as_deref().map(validate_name).transpose()?,
            description: changes.description,
            habit_type: changes.habit_type,
            color: changes
                .color
                .map(|c| validate_max_chars("color", c, COLOR_MAX_CHARS))
                .transpose()?,
            goal_value: changes.goal_value.map(validate_goal_value).transpose()?,
            goal_unit: changes
                .goal_unit
                .map(|u| validate_max_chars("goal_unit", u, GOAL_UNIT_MAX_CHARS))
                .transpose()?,
        }))
    }

    fn apply_to(self, active: &mut habit::ActiveModel) {
        let changes = self.0;
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(habit_type) = changes.habit_type {
            active.habit_type = Set(habit_type);
        }
        if let Some(color) = changes.color {
            active.color = Set(color);
        }
        if let Some(goal_value) = changes.goal_value {
            active.goal_value = Set(goal_value);
        }
        if let Some(goal_unit) = changes.goal_unit {
            active.goal_unit = Set(goal_unit);
        }
    }
}

/// Creates an active habit owned by the caller.
///
/// # Errors
/// Returns [`Error::InvalidField`] if the name is blank, shorter than 3 or longer
/// than 100 characters, the color or goal unit is too long, or the goal value is
/// negative.
#[instrument(skip(db, input), fields(user_id = caller.user_id))]
pub async fn create_habit(
    db: &DatabaseConnection,
    caller: &Caller,
    input: NewHabit,
) -> Result<habit::Model> {
    let checked = CheckedChanges::new(input.into())?;

    let now = Utc::now();
    let mut habit = habit::ActiveModel {
        user_id: Set(caller.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        archived_at: Set(None),
        ..Default::default()
    };
    checked.apply_to(&mut habit);

    let result = habit.insert(db).await?;
    info!(habit_id = result.id, "Created habit");
    Ok(result)
}

/// Lists the caller's habits matching `filter`, ordered by name.
pub async fn list_habits(
    db: &DatabaseConnection,
    caller: &Caller,
    filter: ArchivedFilter,
) -> Result<Vec<habit::Model>> {
    filter
        .apply(visible_habits(caller))
        .order_by_asc(habit::Column::Name)
        .order_by_asc(habit::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one of the caller's habits, including archived ones.
///
/// # Errors
/// Returns [`Error::NotFound`] if the habit does not exist or belongs to another user.
pub async fn get_habit(
    db: &DatabaseConnection,
    caller: &Caller,
    habit_id: i64,
) -> Result<habit::Model> {
    find_owned_habit(db, caller, habit_id).await
}

/// Replaces every editable field of a habit.
///
/// Optional fields missing from `input` are cleared and the type resets to
/// singular when not given. Owner, timestamps and archival state are untouched.
pub async fn update_habit(
    db: &DatabaseConnection,
    caller: &Caller,
    habit_id: i64,
    input: NewHabit,
) -> Result<habit::Model> {
    partial_update_habit(db, caller, habit_id, input.into()).await
}

/// Applies only the supplied fields to a habit.
///
/// Validation runs before the habit is looked up, matching the order a
/// request handler would deserialize, then fetch.
#[instrument(skip(db, changes), fields(user_id = caller.user_id))]
pub async fn partial_update_habit(
    db: &DatabaseConnection,
    caller: &Caller,
    habit_id: i64,
    changes: HabitChanges,
) -> Result<habit::Model> {
    let checked = CheckedChanges::new(changes)?;
    let habit = find_owned_habit(db, caller, habit_id).await?;

    let mut active: habit::ActiveModel = habit.into();
    checked.apply_to(&mut active);
    active.updated_at = Set(Utc::now());

    let result = active.update(db).await?;
    debug!(habit_id, "Updated habit");
    Ok(result)
}

/// Soft-deletes a habit by archiving it. The row and its entries are kept.
pub async fn delete_habit(db: &DatabaseConnection, caller: &Caller, habit_id: i64) -> Result<()> {
    archive_habit(db, caller, habit_id).await.map(|_| ())
}

/// Archives a habit. Already-archived habits are returned unchanged.
#[instrument(skip(db), fields(user_id = caller.user_id))]
pub async fn archive_habit(
    db: &DatabaseConnection,
    caller: &Caller,
    habit_id: i64,
) -> Result<habit::Model> {
    let habit = find_owned_habit(db, caller, habit_id).await?;
    if let HabitState::Archived { at } = habit.state() {
        debug!(habit_id, archived_at = %at, "Habit already archived");
        return Ok(habit);
    }

    let now = Utc::now();
    let mut active: habit::ActiveModel = habit.into();
    active.archived_at = Set(HabitState::Archived { at: now }.archived_at());
    active.updated_at = Set(now);

    let result = active.update(db).await?;
    info!(habit_id, "Archived habit");
    Ok(result)
}

/// Restores an archived habit. Active habits are returned unchanged.
#[instrument(skip(db), fields(user_id = caller.user_id))]
pub async fn unarchive_habit(
    db: &DatabaseConnection,
    caller: &Caller,
    habit_id: i64,
) -> Result<habit::Model> {
    let habit = find_owned_habit(db, caller, habit_id).await?;
    if habit.state() == HabitState::Active {
        debug!(habit_id, "Habit already active");
        return Ok(habit);
    }

    let mut active: habit::ActiveModel = habit.into();
    active.archived_at = Set(HabitState::Active.archived_at());
    active.updated_at = Set(Utc::now());

    let result = active.update(db).await?;
    info!(habit_id, "Unarchived habit");
    Ok(result)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_archived_filter_from_query() {
        assert_eq!(ArchivedFilter::from_query(None), ArchivedFilter::Active);
        assert_eq!(ArchivedFilter::from_query(Some("false")), ArchivedFilter::Active);
        assert_eq!(ArchivedFilter::from_query(Some("0")), ArchivedFilter::Active);
        assert_eq!(ArchivedFilter::from_query(Some("TRUE")), ArchivedFilter::Archived);
        assert_eq!(ArchivedFilter::from_query(Some("1")), ArchivedFilter::Archived);
        assert_eq!(ArchivedFilter::from_query(Some("any")), ArchivedFilter::All);
    }

    #[test]
    fn test_full_replacement_clears_optionals() {
        let changes = HabitChanges::from(NewHabit::named("Walk"));
        assert_eq!(changes.name.as_deref(), Some("Walk"));
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.habit_type, Some(HabitType::Singular));
        assert_eq!(changes.goal_value, Some(None));
    }

    #[tokio::test]
    async fn test_create_habit_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let caller = Caller::new(1);

        for bad_name in ["", "   ", "A", "ab"] {
            let result = create_habit(&db, &caller, NewHabit::named(bad_name)).await;
            assert!(
                matches!(result, Err(Error::InvalidField { field: "name", .. })),
                "name {bad_name:?} should be rejected"
            );
        }

        let result = create_habit(&db, &caller, NewHabit::named("x".repeat(101))).await;
        assert!(matches!(result, Err(Error::InvalidField { field: "name", .. })));

        let mut input = NewHabit::named("Paint");
        input.color = Some("#12345678".to_string());
        let result = create_habit(&db, &caller, input).await;
        assert!(matches!(result, Err(Error::InvalidField { field: "color", .. })));

        let mut input = NewHabit::named("Swim");
        input.goal_value = Some(-1);
        let result = create_habit(&db, &caller, input).await;
        assert!(matches!(
            result,
            Err(Error::InvalidField {
                field: "goal_value",
                ..
            })
        ));

        let mut input = NewHabit::named("Swim");
        input.goal_unit = Some("kilometres!".to_string());
        let result = create_habit(&db, &caller, input).await;
        assert!(matches!(
            result,
            Err(Error::InvalidField {
                field: "goal_unit",
                ..
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_habit_integration() -> Result<()> {
        let (db, caller) = setup_with_user("habituser1").await?;

        let input = NewHabit {
            name: "  New Habit ".to_string(),
            description: Some("Desc".to_string()),
            habit_type: Some(HabitType::Timed),
            color: Some("#1abc9c".to_string()),
            goal_value: Some(30),
            goal_unit: Some("min".to_string()),
        };
        let habit = create_habit(&db, &caller, input).await?;

        assert_eq!(habit.user_id, caller.user_id);
        assert_eq!(habit.name, "New Habit");
        assert_eq!(habit.description.as_deref(), Some("Desc"));
        assert_eq!(habit.habit_type, HabitType::Timed);
        assert_eq!(habit.goal_value, Some(30));
        assert_eq!(habit.state(), HabitState::Active);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_habit_defaults_to_singular() -> Result<()> {
        let (db, caller) = setup_with_user("habituser1").await?;
        let habit = create_habit(&db, &caller, NewHabit::named("Morning Run")).await?;
        assert_eq!(habit.habit_type, HabitType::Singular);
        assert!(habit.description.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_habits_filters() -> Result<()> {
        let fx = setup_two_users().await?;

        let active = list_habits(&fx.db, &fx.owner, ArchivedFilter::Active).await?;
        let names: Vec<_> = active.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["Morning Run", "Read Book"]);

        let archived = list_habits(&fx.db, &fx.owner, ArchivedFilter::Archived).await?;
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].name, "Old Project");

        let all = list_habits(&fx.db, &fx.owner, ArchivedFilter::All).await?;
        let names: Vec<_> = all.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["Morning Run", "Old Project", "Read Book"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_habits_never_shows_other_users() -> Result<()> {
        let fx = setup_two_users().await?;

        let other = list_habits(&fx.db, &fx.other, ArchivedFilter::All).await?;
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].name, "User 2 Habit");
        assert!(other.iter().all(|h| h.user_id == fx.other.user_id));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_habit_hides_other_users() -> Result<()> {
        let fx = setup_two_users().await?;

        let own = get_habit(&fx.db, &fx.owner, fx.read_book.id).await?;
        assert_eq!(own.name, "Read Book");

        let err = get_habit(&fx.db, &fx.other, fx.read_book.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = get_habit(&fx.db, &fx.owner, 999).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_habit_includes_archived() -> Result<()> {
        let fx = setup_two_users().await?;
        let habit = get_habit(&fx.db, &fx.owner, fx.old_project.id).await?;
        assert!(matches!(habit.state(), HabitState::Archived { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_habit_replaces_fields() -> Result<()> {
        let fx = setup_two_users().await?;

        let mut input = NewHabit::named("Read Novel").with_type(HabitType::Timed);
        input.goal_value = Some(20);
        let updated = update_habit(&fx.db, &fx.owner, fx.read_book.id, input).await?;
        assert_eq!(updated.name, "Read Novel");
        assert_eq!(updated.goal_value, Some(20));
        assert_eq!(updated.user_id, fx.owner.user_id);
        assert_eq!(updated.created_at, fx.read_book.created_at);
        assert!(updated.updated_at >= fx.read_book.updated_at);

        let replaced =
            update_habit(&fx.db, &fx.owner, fx.read_book.id, NewHabit::named("Read")).await?;
        assert_eq!(replaced.habit_type, HabitType::Singular);
        assert_eq!(replaced.goal_value, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_partial_update_habit() -> Result<()> {
        let (db, caller) = setup_with_user("habituser1").await?;
        let mut input = NewHabit::named("Stretch");
        input.description = Some("Every morning".to_string());
        input.color = Some("#ff0000".to_string());
        let habit = create_habit(&db, &caller, input).await?;

        let changes = HabitChanges {
            description: Some(None),
            goal_unit: Some(Some("reps".to_string())),
            ..HabitChanges::default()
        };
        let updated = partial_update_habit(&db, &caller, habit.id, changes).await?;

        assert_eq!(updated.name, "Stretch");
        assert_eq!(updated.description, None);
        assert_eq!(updated.color.as_deref(), Some("#ff0000"));
        assert_eq!(updated.goal_unit.as_deref(), Some("reps"));

        Ok(())
    }

    #[tokio::test]
    async fn test_partial_update_rejects_short_name() -> Result<()> {
        let fx = setup_two_users().await?;
        let changes = HabitChanges {
            name: Some("ab".to_string()),
            ..HabitChanges::default()
        };
        let result = partial_update_habit(&fx.db, &fx.owner, fx.read_book.id, changes).await;
        assert!(matches!(result, Err(Error::InvalidField { field: "name", .. })));

        let unchanged = get_habit(&fx.db, &fx.owner, fx.read_book.id).await?;
        assert_eq!(unchanged.name, "Read Book");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_other_users_habit_is_not_found() -> Result<()> {
        let fx = setup_two_users().await?;
        let result =
            update_habit(&fx.db, &fx.other, fx.read_book.id, NewHabit::named("Stolen")).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let unchanged = get_habit(&fx.db, &fx.owner, fx.read_book.id).await?;
        assert_eq!(unchanged.name, "Read Book");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_habit_archives() -> Result<()> {
        let fx = setup_two_users().await?;

        delete_habit(&fx.db, &fx.owner, fx.morning_run.id).await?;

        let habit = get_habit(&fx.db, &fx.owner, fx.morning_run.id).await?;
        assert!(matches!(habit.state(), HabitState::Archived { .. }));

        let active = list_habits(&fx.db, &fx.owner, ArchivedFilter::Active).await?;
        assert!(active.iter().all(|h| h.id != fx.morning_run.id));

        let result = delete_habit(&fx.db, &fx.other, fx.read_book.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_archive_is_idempotent() -> Result<()> {
        let fx = setup_two_users().await?;

        archive_habit(&fx.db, &fx.owner, fx.read_book.id).await?;
        let first = get_habit(&fx.db, &fx.owner, fx.read_book.id).await?;
        assert!(matches!(first.state(), HabitState::Archived { .. }));

        let second = archive_habit(&fx.db, &fx.owner, fx.read_book.id).await?;
        assert_eq!(second.archived_at, first.archived_at);
        assert_eq!(second.updated_at, first.updated_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_unarchive_is_idempotent() -> Result<()> {
        let fx = setup_two_users().await?;

        let restored = unarchive_habit(&fx.db, &fx.owner, fx.old_project.id).await?;
        assert_eq!(restored.state(), HabitState::Active);

        let again = unarchive_habit(&fx.db, &fx.owner, fx.old_project.id).await?;
        assert_eq!(again.state(), HabitState::Active);

        let active = unarchive_habit(&fx.db, &fx.owner, fx.read_book.id).await?;
        assert_eq!(active, get_habit(&fx.db, &fx.owner, fx.read_book.id).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_archive_other_users_habit_is_not_found() -> Result<()> {
        let fx = setup_two_users().await?;
        let err = archive_habit(&fx.db, &fx.other, fx.read_book.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = unarchive_habit(&fx.db, &fx.other, fx.old_project.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }
}
