//! Diesel row models for marketplace persistence.

use super::schema::{opinions, performers, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Client who posted the task.
    pub client_id: uuid::Uuid,
    /// Assigned performer.
    pub performer_id: Option<uuid::Uuid>,
    /// Task category.
    pub category: String,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Optional deadline.
    pub expire_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency version.
    pub version: i64,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Client who posted the task.
    pub client_id: uuid::Uuid,
    /// Assigned performer.
    pub performer_id: Option<uuid::Uuid>,
    /// Task category.
    pub category: String,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Optional deadline.
    pub expire_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency version.
    pub version: i64,
}

/// Columns a transition may change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks, treat_none_as_null = true)]
pub struct TaskTransitionChangeset {
    /// Assigned performer.
    pub performer_id: Option<uuid::Uuid>,
    /// Lifecycle status.
    pub status: String,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// New version.
    pub version: i64,
}

/// Row model for opinions, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = opinions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OpinionRow {
    /// Opinion identifier.
    pub id: uuid::Uuid,
    /// Rated task.
    pub task_id: uuid::Uuid,
    /// Rated performer.
    pub performer_id: uuid::Uuid,
    /// Rate between 1 and 5.
    pub rate: i16,
    /// Free-text comment.
    pub comment: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for performers.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = performers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PerformerRow {
    /// Performer user identifier.
    pub id: uuid::Uuid,
    /// Number of refused tasks.
    pub fail_count: i32,
    /// Whether contacts are restricted.
    pub hide_contacts: bool,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
}

/// Insert model for performers; the sequence column is database-assigned.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = performers)]
pub struct NewPerformerRow {
    /// Performer user identifier.
    pub id: uuid::Uuid,
    /// Number of refused tasks.
    pub fail_count: i32,
    /// Whether contacts are restricted.
    pub hide_contacts: bool,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
}

/// Aggregated reputation inputs returned by the standings query.
#[derive(Debug, Clone, QueryableByName)]
pub struct StandingRow {
    /// Performer user identifier.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub performer_id: uuid::Uuid,
    /// Number of refused tasks.
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub fail_count: i32,
    /// Sum of opinion rates.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub rate_sum: i64,
    /// Number of opinions.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub opinion_count: i64,
}
