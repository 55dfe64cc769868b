use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a test invitation.
///
/// `New` until the student dismisses it (`Ignored`) or starts the test, which
/// deletes the row outright — a notification exists only until consumed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    sea_orm::strum::Display,
    sea_orm::strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "ignored")]
    Ignored,
}

/// A per-follower invitation created when a test is published.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Primary key of the notification.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The invited student.
    pub student_id: i64,
    /// The faculty member who published the test.
    pub faculty_id: i64,
    /// The referenced test.
    pub test_id: i64,
    /// Title snapshot, so feeds render without a join.
    pub test_title: String,
    /// Current status.
    pub status: NotificationStatus,
    /// Timestamp when the notification was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the student's dismiss action, if any.
    pub action_at: Option<DateTime<Utc>>,
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
