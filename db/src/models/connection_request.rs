use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

pub use super::follow_request::RequestStatus;

/// A faculty→faculty connection request. Unique per directed pair.
///
/// Acceptance grants both accounts a symmetric edge in `faculty_connections`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "connection_requests")]
pub struct Model {
    /// Primary key of the request.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The requesting faculty member.
    pub from_faculty_id: i64,
    /// The faculty member being asked to connect.
    pub to_faculty_id: i64,
    /// Current status.
    pub status: RequestStatus,
    /// Timestamp when the request was first created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status change.
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FromFacultyId",
        to = "super::user::Column::Id"
    )]
    From,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ToFacultyId",
        to = "super::user::Column::Id"
    )]
    To,
}

impl ActiveModelBehavior for ActiveModel {}
