use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// JSON column holding the submitted answer per question position; `None`
/// marks an unanswered question.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct AnswerList(pub Vec<Option<String>>);

/// A completed proctored session. Created exactly once per finished session
/// and immutable thereafter; kept as student history even if the test is
/// later revoked (hence the title/name snapshots and no FK to `tests`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "test_attempts")]
pub struct Model {
    /// Primary key of the attempt.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The attempted test.
    pub test_id: i64,
    /// The student who took the test.
    pub student_id: i64,
    /// Title snapshot at submission time.
    pub test_title: String,
    /// Student display name snapshot at submission time.
    pub student_name: String,
    /// Count of correctly answered questions.
    pub score: i32,
    /// Number of questions on the test.
    pub total_questions: i32,
    /// Submitted answer per position.
    #[sea_orm(column_type = "Json")]
    pub answers: AnswerList,
    /// Focus-loss violations accumulated during the session.
    pub violation_count: i32,
    /// Timestamp when the session finished.
    pub submitted_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
