//! Role-keyed sequence counter backing faculty handle allocation.
//!
//! The increment happens in a single `UPDATE ... value = value + 1` statement
//! so two concurrent registrations can never read the same value.

use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Statement};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "role_counters")]
pub struct Model {
    /// Role name this counter belongs to (e.g. `faculty`).
    #[sea_orm(primary_key, auto_increment = false)]
    pub role: String,
    /// Last allocated value.
    pub value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        panic!("No RelationDef implemented")
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Atomically advances the counter for `role` and returns the new value.
///
/// Call inside the transaction that consumes the value so allocation and use
/// commit together.
pub async fn next_value<C: ConnectionTrait>(db: &C, role: &str) -> Result<i64, DbErr> {
    let backend = db.get_database_backend();

    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO role_counters (role, value) VALUES (?, 0) ON CONFLICT(role) DO NOTHING",
        [role.into()],
    ))
    .await?;

    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE role_counters SET value = value + 1 WHERE role = ?",
        [role.into()],
    ))
    .await?;

    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT value FROM role_counters WHERE role = ?",
            [role.into()],
        ))
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("role counter '{role}' missing")))?;

    row.try_get("", "value")
}
