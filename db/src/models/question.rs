use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// JSON column holding a question's four unique answer options, in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct OptionList(pub Vec<String>);

/// A multiple-choice question inside a draft question set.
///
/// Immutable once created: edits happen by replacing the row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    /// Primary key of the question.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Draft this question belongs to.
    pub question_set_id: i64,
    /// Zero-based position within the draft.
    pub position: i32,
    /// The question prompt.
    pub question_text: String,
    /// The four answer options.
    #[sea_orm(column_type = "Json")]
    pub options: OptionList,
    /// The correct option; always one of `options`.
    pub correct_option: String,
    /// Explanation shown when reviewing results.
    pub explanation: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::question_set::Entity",
        from = "Column::QuestionSetId",
        to = "super::question_set::Column::Id"
    )]
    QuestionSet,
}

impl Related<super::question_set::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestionSet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
