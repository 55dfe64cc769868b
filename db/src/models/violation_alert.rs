use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review status of a violation alert.
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
pub enum AlertStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "resolved")]
    Resolved,
}

/// Raised for the test owner when a student hits the violation limit.
///
/// Resolved when the faculty member grants a re-attempt.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "violation_alerts")]
pub struct Model {
    /// Primary key of the alert.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The disqualified student.
    pub student_id: i64,
    /// The test owner who reviews the alert.
    pub faculty_id: i64,
    /// The test the violations occurred on.
    pub test_id: i64,
    /// Title snapshot, so feeds render without a join.
    pub test_title: String,
    /// Current status.
    pub status: AlertStatus,
    /// Timestamp when the alert was raised.
    pub created_at: DateTime<Utc>,
    /// Timestamp when the re-attempt was granted, if any.
    pub resolved_at: Option<DateTime<Utc>>,
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

impl ActiveModelBehavior for ActiveModel {}
