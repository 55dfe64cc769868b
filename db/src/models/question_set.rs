use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// An unpublished draft batch of questions awaiting publication into a test.
///
/// Deleted when published (its questions are frozen into `test_questions`)
/// or kept as a draft indefinitely. Owned by exactly one faculty account.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "question_sets")]
pub struct Model {
    /// Primary key of the draft.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Faculty account that owns this draft.
    pub owner_id: i64,
    /// Timestamp when the draft was created.
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,

    #[sea_orm(has_many = "super::question::Entity")]
    Questions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
