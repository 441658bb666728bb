//! Habit entity - A recurring activity a user tracks.
//!
//! A habit is either `singular` (done / not done on a given day) or `timed`
//! (a measured count or duration). The type decides which entry values are
//! acceptable, see [`HabitType::value_rule`].
//!
//! Habits are never removed by their owner. Deleting one stamps `archived_at`,
//! which hides it from default listings while keeping its entries intact.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of habit, stored as its lowercase name.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum HabitType {
    /// Yes/no occurrence; every entry carries exactly 1
    #[default]
    #[sea_orm(string_value = "singular")]
    Singular,
    /// Measured occurrence; entries carry any positive amount
    #[sea_orm(string_value = "timed")]
    Timed,
}

/// Constraint an entry value must satisfy for a given [`HabitType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueRule {
    /// Value must be exactly 1
    ExactlyOne,
    /// Value must be greater than 0, no upper bound
    Positive,
}

impl HabitType {
    /// Returns the value rule that entries of this habit type must satisfy.
    #[must_use]
    pub const fn value_rule(self) -> ValueRule {
        match self {
            Self::Singular => ValueRule::ExactlyOne,
            Self::Timed => ValueRule::Positive,
        }
    }
}

impl ValueRule {
    /// Whether `value` satisfies this rule.
    #[must_use]
    pub const fn allows(self, value: i32) -> bool {
        match self {
            Self::ExactlyOne => value == 1,
            Self::Positive => value > 0,
        }
    }

    /// Message reported when a value is rejected.
    #[must_use]
    pub const fn violation_message(self) -> &'static str {
        match self {
            Self::ExactlyOne => "Singular habits can only have a value of 1.",
            Self::Positive => "Timed habits must have a positive value.",
        }
    }
}

/// Archival state of a habit, derived from the nullable `archived_at` column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HabitState {
    /// Visible in default listings, accepts new entries
    Active,
    /// Soft-deleted at the given instant
    Archived {
        /// When the habit was archived
        at: DateTimeUtc,
    },
}

impl HabitState {
    /// The column value representing this state.
    #[must_use]
    pub const fn archived_at(self) -> Option<DateTimeUtc> {
        match self {
            Self::Active => None,
            Self::Archived { at } => Some(at),
        }
    }
}

/// Habit database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "habits")]
pub struct Model {
    /// Unique identifier for the habit
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the habit; fixed at creation
    #[serde(rename = "user")]
    pub user_id: i64,
    /// Display name, at least 3 characters
    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub name: String,
    /// Optional free-form description
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Singular or timed
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    /// When the habit was created
    pub created_at: DateTimeUtc,
    /// When the habit was last modified
    pub updated_at: DateTimeUtc,
    /// Set while the habit is archived, `None` while active
    pub archived_at: Option<DateTimeUtc>,
    /// Display color, typically a hex code like `#1abc9c`
    #[sea_orm(column_type = "String(StringLen::N(7))", nullable)]
    pub color: Option<String>,
    /// Target amount per day for timed habits
    pub goal_value: Option<i32>,
    /// Unit of `goal_value` (e.g. "min", "pages")
    #[sea_orm(column_type = "String(StringLen::N(10))", nullable)]
    pub goal_unit: Option<String>,
}

impl Model {
    /// Archival state of this habit.
    #[must_use]
    pub fn state(&self) -> HabitState {
        match self.archived_at {
            Some(at) => HabitState::Archived { at },
            None => HabitState::Active,
        }
    }
}

/// Defines relationships between Habit and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each habit belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// One habit has many entries
    #[sea_orm(has_many = "super::habit_entry::Entity")]
    Entries,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::habit_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_value_rule_table() {
        assert_eq!(HabitType::Singular.value_rule(), ValueRule::ExactlyOne);
        assert_eq!(HabitType::Timed.value_rule(), ValueRule::Positive);
    }

    #[test]
    fn test_exactly_one_rule() {
        let rule = ValueRule::ExactlyOne;
        assert!(rule.allows(1));
        assert!(!rule.allows(0));
        assert!(!rule.allows(2));
        assert!(!rule.allows(-1));
    }

    #[test]
    fn test_positive_rule() {
        let rule = ValueRule::Positive;
        assert!(rule.allows(1));
        assert!(rule.allows(45));
        assert!(rule.allows(i32::MAX));
        assert!(!rule.allows(0));
        assert!(!rule.allows(-5));
    }

    #[test]
    fn test_default_type_is_singular() {
        assert_eq!(HabitType::default(), HabitType::Singular);
    }

    #[test]
    fn test_state_round_trips_through_column() {
        let now = Utc::now();
        let archived = HabitState::Archived { at: now };
        assert_eq!(archived.archived_at(), Some(now));
        assert_eq!(HabitState::Active.archived_at(), None);
    }
}
