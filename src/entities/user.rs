//! User entity - The owner of habits and entries.
//!
//! Credentials and sessions live with the external auth service; this table only
//! carries what ownership checks and data exports need.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across the system, at most 150 characters
    #[sea_orm(unique, column_type = "String(StringLen::N(150))")]
    pub username: String,
    /// Contact email address
    pub email: String,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many habits
    #[sea_orm(has_many = "super::habit::Entity")]
    Habits,
    /// One user owns many habit entries
    #[sea_orm(has_many = "super::habit_entry::Entity")]
    HabitEntries,
}

impl Related<super::habit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Habits.def()
    }
}

impl Related<super::habit_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HabitEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
