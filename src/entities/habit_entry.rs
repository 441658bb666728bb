//! Habit entry entity - One dated record of a habit being performed.
//!
//! At most one entry exists per habit per calendar day. The pair is guarded by
//! a unique index created alongside the table (see
//! [`crate::config::database::create_tables`]).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Habit entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "habit_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Habit this entry logs
    #[serde(rename = "habit")]
    pub habit_id: i64,
    /// Owner of the entry, equal to the habit owner at creation
    #[serde(rename = "user")]
    pub user_id: i64,
    /// Calendar day the habit was performed
    pub entry_date: Date,
    /// Amount logged; always 1 for singular habits
    pub value: i32,
    /// Optional free-form notes
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    /// When the entry was created
    pub created_at: DateTimeUtc,
    /// When the entry was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `HabitEntry` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one habit
    #[sea_orm(
        belongs_to = "super::habit::Entity",
        from = "Column::HabitId",
        to = "super::habit::Column::Id",
        on_delete = "Cascade"
    )]
    Habit,
    /// Each entry belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::habit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Habit.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
