use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A per-test, per-student block on re-starting after a violation-limit breach.
///
/// Relational form of the test's disqualified-student set; the pair is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_disqualifications")]
pub struct Model {
    /// Primary key of the disqualification row.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The test the student is blocked from.
    pub test_id: i64,
    /// The blocked student.
    pub student_id: i64,
    /// Timestamp when the block was created.
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::test::Entity",
        from = "Column::TestId",
        to = "super::test::Column::Id"
    )]
    Test,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::test::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Test.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
