use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A student→faculty follow edge. Unique per pair (set semantics).
///
/// Gates notification fanout: publishing a test notifies exactly the students
/// holding an edge to the publishing faculty member.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_follows")]
pub struct Model {
    /// Primary key of the edge.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The following student.
    pub student_id: i64,
    /// The followed faculty member.
    pub faculty_id: i64,
    /// Timestamp when the edge was created.
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FacultyId",
        to = "super::user::Column::Id"
    )]
    Faculty,
}

impl ActiveModelBehavior for ActiveModel {}
