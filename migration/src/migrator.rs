use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202607010001_create_users::Migration),
            Box::new(migrations::m202607010002_create_question_sets::Migration),
            Box::new(migrations::m202607010003_create_tests::Migration),
            Box::new(migrations::m202607010004_create_notifications::Migration),
            Box::new(migrations::m202607010005_create_follow_graph::Migration),
            Box::new(migrations::m202607010006_create_connections::Migration),
            Box::new(migrations::m202607010007_create_violation_alerts::Migration),
            Box::new(migrations::m202607010008_create_test_attempts::Migration),
        ]
    }
}
