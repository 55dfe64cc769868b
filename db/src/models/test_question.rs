use sea_orm::entity::prelude::*;

pub use super::question::OptionList;

/// A question frozen into a published test.
///
/// Same shape as a draft question but keyed by test; deleting the draft after
/// publication never touches these rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_questions")]
pub struct Model {
    /// Primary key of the snapshot row.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Test this question belongs to.
    pub test_id: i64,
    /// Zero-based position within the test.
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
        belongs_to = "super::test::Entity",
        from = "Column::TestId",
        to = "super::test::Column::Id"
    )]
    Test,
}

impl Related<super::test::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Test.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
