//! Persisting finished sessions and handling the disqualification aftermath.

use chrono::Utc;
use db::models::{notification, test, test_attempt, test_disqualification, user, violation_alert};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use util::live::{LiveHub, emit, topics};

use crate::error::ServiceError;
use crate::proctor::SessionOutcome;

/// Records a finished session.
///
/// Exactly one attempt row is written per outcome, disqualified or not. When
/// the outcome is a disqualification, the block row and the pending alert for
/// the test owner are written in the same transaction, so a crash can never
/// leave a blocked student without an alert to resolve the block through.
pub async fn record_attempt_completion(
    db: &DatabaseConnection,
    hub: &LiveHub,
    outcome: &SessionOutcome,
) -> Result<test_attempt::Model, ServiceError> {
    let student = user::Entity::find_by_id(outcome.student_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;

    // Attempts carry no FK to tests, so a session that finishes after its
    // test was revoked still lands in the student's history.
    let found = test::Entity::find_by_id(outcome.test_id).one(db).await?;
    let title = found
        .as_ref()
        .map(|t| t.title.clone())
        .unwrap_or_else(|| "(revoked)".to_owned());

    let txn = db.begin().await?;

    let attempt = test_attempt::ActiveModel {
        test_id: Set(outcome.test_id),
        student_id: Set(outcome.student_id),
        test_title: Set(title.clone()),
        student_name: Set(student.name.clone()),
        score: Set(outcome.score as i32),
        total_questions: Set(outcome.total_questions as i32),
        answers: Set(test_attempt::AnswerList(outcome.answers.clone())),
        violation_count: Set(outcome.violations as i32),
        submitted_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut alert = None;
    if outcome.disqualified {
        if let Some(test) = &found {
            let blocked = test_disqualification::Entity::find()
                .filter(test_disqualification::Column::TestId.eq(test.id))
                .filter(test_disqualification::Column::StudentId.eq(outcome.student_id))
                .one(&txn)
                .await?;
            if blocked.is_none() {
                test_disqualification::ActiveModel {
                    test_id: Set(test.id),
                    student_id: Set(outcome.student_id),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }

            let created = violation_alert::ActiveModel {
                student_id: Set(outcome.student_id),
                faculty_id: Set(test.owner_id),
                test_id: Set(test.id),
                test_title: Set(title),
                status: Set(violation_alert::AlertStatus::Pending),
                created_at: Set(Utc::now()),
                resolved_at: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            alert = Some(created);
        } else {
            log::warn!(
                "test {} revoked before disqualification of student {} could be recorded",
                outcome.test_id,
                outcome.student_id
            );
        }
    }

    txn.commit().await?;

    if let Some(alert) = alert {
        emit(
            hub,
            &topics::faculty_alerts(alert.faculty_id),
            "alert.created",
            &alert,
        )
        .await;
    }

    Ok(attempt)
}

/// Resolves a pending violation alert by granting the student a re-attempt.
///
/// Unblocks the student, invites them again with a fresh `New` notification,
/// and marks the alert resolved — one transaction. Granting an already
/// resolved alert is a no-op.
pub async fn grant_reattempt(
    db: &DatabaseConnection,
    hub: &LiveHub,
    faculty_id: i64,
    alert_id: i64,
) -> Result<violation_alert::Model, ServiceError> {
    let alert = violation_alert::Entity::find_by_id(alert_id)
        .filter(violation_alert::Column::FacultyId.eq(faculty_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("violation alert"))?;

    if alert.status == violation_alert::AlertStatus::Resolved {
        return Ok(alert);
    }

    let test = test::Entity::find_by_id(alert.test_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("test"))?;

    let txn = db.begin().await?;

    test_disqualification::Entity::delete_many()
        .filter(test_disqualification::Column::TestId.eq(alert.test_id))
        .filter(test_disqualification::Column::StudentId.eq(alert.student_id))
        .exec(&txn)
        .await?;

    let invitation = notification::ActiveModel {
        student_id: Set(alert.student_id),
        faculty_id: Set(faculty_id),
        test_id: Set(test.id),
        test_title: Set(test.title.clone()),
        status: Set(notification::NotificationStatus::New),
        created_at: Set(Utc::now()),
        action_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let student_id = alert.student_id;
    let mut active = alert.into_active_model();
    active.status = Set(violation_alert::AlertStatus::Resolved);
    active.resolved_at = Set(Some(Utc::now()));
    let resolved = active.update(&txn).await?;

    txn.commit().await?;
    log::info!(
        "faculty {} granted student {} a re-attempt on test {}",
        faculty_id,
        student_id,
        test.id
    );

    emit(
        hub,
        &topics::student_notifications(student_id),
        "notification.created",
        &invitation,
    )
    .await;

    Ok(resolved)
}

/// Pending alerts awaiting this faculty member's review, newest first.
pub async fn pending_alerts(
    db: &DatabaseConnection,
    faculty_id: i64,
) -> Result<Vec<violation_alert::Model>, ServiceError> {
    Ok(violation_alert::Entity::find()
        .filter(violation_alert::Column::FacultyId.eq(faculty_id))
        .filter(violation_alert::Column::Status.eq(violation_alert::AlertStatus::Pending))
        .order_by_desc(violation_alert::Column::CreatedAt)
        .all(db)
        .await?)
}

/// A student's attempt history, newest first. Survives test revocation.
pub async fn student_history(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<test_attempt::Model>, ServiceError> {
    Ok(test_attempt::Entity::find()
        .filter(test_attempt::Column::StudentId.eq(student_id))
        .order_by_desc(test_attempt::Column::SubmittedAt)
        .all(db)
        .await?)
}
