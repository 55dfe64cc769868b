use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// One direction of a symmetric faculty↔faculty connection.
///
/// Accepting a connection request inserts a row for each direction in one
/// transaction, so "connections of X" is a single equality query.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "faculty_connections")]
pub struct Model {
    /// Primary key of the edge.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning side of this direction.
    pub faculty_id: i64,
    /// The connected peer.
    pub peer_id: i64,
    /// Timestamp when the edge was created.
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FacultyId",
        to = "super::user::Column::Id"
    )]
    Faculty,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::PeerId",
        to = "super::user::Column::Id"
    )]
    Peer,
}

impl ActiveModelBehavior for ActiveModel {}
