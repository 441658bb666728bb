//! Core business logic, independent of any transport or framework.
//!
//! Every operation takes the database handle and the authenticated [`caller::Caller`]
//! and only ever touches rows that caller owns.

/// Authenticated caller identity
pub mod caller;
/// Habit entry logging and editing
pub mod entry;
/// Habit creation, editing and archival
pub mod habit;
/// Account data collection and summaries
pub mod report;
/// Owner rows for habits and entries
pub mod user;

pub use caller::Caller;
