//! The student-facing notification feed.
//!
//! Creation happens in `test_service` (publish fanout) and `attempt_service`
//! (re-attempt invitation); consumption-by-starting happens in
//! `test_service::start_attempt`. This module covers the remaining reads and
//! the dismiss action.

use chrono::Utc;
use db::models::notification;
use db::models::notification::NotificationStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use util::live::{LiveHub, emit, topics};

use crate::error::ServiceError;

/// The student's feed: new invitations first, then dismissed ones, each group
/// newest first.
pub async fn list_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<notification::Model>, ServiceError> {
    // Status is stored as text; "new" sorts after "ignored", hence desc.
    Ok(notification::Entity::find()
        .filter(notification::Column::StudentId.eq(student_id))
        .order_by_desc(notification::Column::Status)
        .order_by_desc(notification::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Dismisses an invitation without taking the test.
///
/// The row is kept (status `Ignored`, `action_at` stamped) so the student can
/// still find the test later. Dismissing twice is harmless.
pub async fn dismiss(
    db: &DatabaseConnection,
    hub: &LiveHub,
    student_id: i64,
    notification_id: i64,
) -> Result<notification::Model, ServiceError> {
    let found = notification::Entity::find_by_id(notification_id)
        .filter(notification::Column::StudentId.eq(student_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("notification"))?;

    if found.status == NotificationStatus::Ignored {
        return Ok(found);
    }

    let mut active = found.into_active_model();
    active.status = Set(NotificationStatus::Ignored);
    active.action_at = Set(Some(Utc::now()));
    let updated = active.update(db).await?;

    emit(
        hub,
        &topics::student_notifications(student_id),
        "notification.dismissed",
        &updated,
    )
    .await;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::{insert_faculty, insert_student, setup_test_db};

    async fn invite(
        db: &DatabaseConnection,
        student_id: i64,
        faculty_id: i64,
        test_id: i64,
        title: &str,
    ) -> notification::Model {
        notification::ActiveModel {
            student_id: Set(student_id),
            faculty_id: Set(faculty_id),
            test_id: Set(test_id),
            test_title: Set(title.to_owned()),
            status: Set(NotificationStatus::New),
            created_at: Set(Utc::now()),
            action_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn fixture(db: &DatabaseConnection) -> (i64, i64, i64) {
        use db::models::test::{self, FormFieldsMode};

        let student = insert_student(db, "Ann", "ann@example.com").await;
        let faculty = insert_faculty(db, "Dr Kim", "kim@example.com", "drkim-faculty101").await;
        let test = test::ActiveModel {
            owner_id: Set(faculty.id),
            title: Set("Quiz".to_owned()),
            duration_minutes: Set(10),
            end_date: Set(None),
            form_fields_mode: Set(FormFieldsMode::Default),
            custom_fields: Set(test::FieldList(Vec::new())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        (student.id, faculty.id, test.id)
    }

    #[tokio::test]
    async fn new_invitations_sort_before_dismissed_ones() {
        let db = setup_test_db().await;
        let (student_id, faculty_id, test_id) = fixture(&db).await;

        let hub = LiveHub::new();
        let older = invite(&db, student_id, faculty_id, test_id, "First").await;
        let newer = invite(&db, student_id, faculty_id, test_id, "Second").await;
        dismiss(&db, &hub, student_id, newer.id).await.unwrap();

        let feed = list_for_student(&db, student_id).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, older.id);
        assert_eq!(feed[0].status, NotificationStatus::New);
        assert_eq!(feed[1].id, newer.id);
        assert_eq!(feed[1].status, NotificationStatus::Ignored);
    }

    #[tokio::test]
    async fn dismiss_is_idempotent_and_stamps_action_at() {
        let db = setup_test_db().await;
        let hub = LiveHub::new();
        let (student_id, faculty_id, test_id) = fixture(&db).await;
        let row = invite(&db, student_id, faculty_id, test_id, "Quiz").await;

        let mut rx = hub.subscribe(&topics::student_notifications(student_id)).await;

        let dismissed = dismiss(&db, &hub, student_id, row.id).await.unwrap();
        assert_eq!(dismissed.status, NotificationStatus::Ignored);
        let stamped = dismissed.action_at.expect("action_at set");

        let raw = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["event"], "notification.dismissed");

        let again = dismiss(&db, &hub, student_id, row.id).await.unwrap();
        assert_eq!(again.action_at, Some(stamped));
    }

    #[tokio::test]
    async fn dismissing_another_students_notification_is_not_found() {
        let db = setup_test_db().await;
        let (student_id, faculty_id, test_id) = fixture(&db).await;
        let hub = LiveHub::new();
        let other = insert_student(&db, "Ben", "ben@example.com").await;
        let row = invite(&db, student_id, faculty_id, test_id, "Quiz").await;

        let err = dismiss(&db, &hub, other.id, row.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
