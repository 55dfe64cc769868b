//! Shared fixtures for crate and workspace tests.
//!
//! Everything runs against a fresh in-memory SQLite database with the full
//! migration set applied, so tests are hermetic and parallel-safe.

use chrono::Utc;
use migration::Migrator;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use crate::models::{question, question_set, user, user_follow};

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Inserts a student account.
pub async fn insert_student(db: &DatabaseConnection, name: &str, email: &str) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        name: Set(name.to_owned()),
        email: Set(email.to_owned()),
        role: Set(user::Role::Student),
        faculty_handle: Set(None),
        id_verified: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert student")
}

/// Inserts a verified faculty account with an explicit handle.
pub async fn insert_faculty(db: &DatabaseConnection, name: &str, email: &str, handle: &str) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        name: Set(name.to_owned()),
        email: Set(email.to_owned()),
        role: Set(user::Role::Faculty),
        faculty_handle: Set(Some(handle.to_owned())),
        id_verified: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert faculty")
}

/// Inserts a follow edge so fanout reaches `student_id`.
pub async fn follow(db: &DatabaseConnection, student_id: i64, faculty_id: i64) {
    user_follow::ActiveModel {
        student_id: Set(student_id),
        faculty_id: Set(faculty_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert follow edge");
}

/// Inserts a draft with `count` questions.
///
/// Question `i` is "Question {i+1}" with options A–D and "Option A" correct,
/// so tests can pick right/wrong answers without re-reading the rows.
pub async fn insert_draft_with_questions(
    db: &DatabaseConnection,
    owner_id: i64,
    count: usize,
) -> question_set::Model {
    let set = question_set::ActiveModel {
        owner_id: Set(owner_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert question set");

    for i in 0..count {
        question::ActiveModel {
            question_set_id: Set(set.id),
            position: Set(i as i32),
            question_text: Set(format!("Question {}", i + 1)),
            options: Set(question::OptionList(vec![
                "Option A".into(),
                "Option B".into(),
                "Option C".into(),
                "Option D".into(),
            ])),
            correct_option: Set("Option A".into()),
            explanation: Set(format!("Option A is correct for question {}", i + 1)),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert question");
    }

    set
}
