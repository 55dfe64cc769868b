//! Test lifecycle: publish a draft to followers, revoke a published test, and
//! start a proctored attempt.

use chrono::{DateTime, Utc};
use db::models::test::FormFieldsMode;
use db::models::{
    notification, question, question_set, test, test_disqualification, test_question,
    test_attempt, violation_alert,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use validator::Validate;

use crate::error::ServiceError;
use crate::proctor::{ProctorSession, VIOLATION_LIMIT};
use crate::{follow_service, question_service, user_service};
use util::live::{LiveHub, emit, topics};

#[derive(Debug, Validate)]
pub struct PublishParams {
    pub question_set_id: i64,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(range(min = 1, max = 1440, message = "duration must be between 1 and 1440 minutes"))]
    pub duration_minutes: i32,
    /// Optional instant after which the test can no longer be started.
    pub end_date: Option<DateTime<Utc>>,
    pub form_fields_mode: FormFieldsMode,
    /// Labels for the custom registration form; required in custom mode.
    pub custom_fields: Vec<String>,
}

/// What `publish` accomplished: the created test plus the fanout tally.
#[derive(Debug)]
pub struct PublishReport {
    pub test: test::Model,
    /// Followers that received a notification.
    pub notified: usize,
    /// Followers whose notification insert failed.
    pub failed: usize,
}

/// Publishes a draft as a test.
///
/// The draft's questions are frozen into `test_questions` and the draft is
/// deleted, all in one transaction. Fanout happens after the commit, per
/// follower: one failed insert is logged and counted, never rolled back, so a
/// bad row cannot unpublish the test or starve the other followers.
pub async fn publish(
    db: &DatabaseConnection,
    hub: &LiveHub,
    faculty_id: i64,
    params: PublishParams,
) -> Result<PublishReport, ServiceError> {
    params.validate()?;
    let title = params.title.trim().to_owned();
    if title.is_empty() {
        return Err(ServiceError::validation("title is required"));
    }
    if params.form_fields_mode == FormFieldsMode::Custom && params.custom_fields.is_empty() {
        return Err(ServiceError::validation(
            "custom form mode requires at least one field",
        ));
    }

    user_service::require_verified_faculty(db, faculty_id).await?;
    let draft = question_service::owned_draft(db, faculty_id, params.question_set_id).await?;
    let questions = question_service::draft_questions(db, faculty_id, draft.id).await?;
    if questions.is_empty() {
        return Err(ServiceError::validation("the question set has no questions"));
    }

    let custom_fields = match params.form_fields_mode {
        FormFieldsMode::Custom => params.custom_fields,
        FormFieldsMode::Default => Vec::new(),
    };

    let txn = db.begin().await?;

    let created = test::ActiveModel {
        owner_id: Set(faculty_id),
        title: Set(title),
        duration_minutes: Set(params.duration_minutes),
        end_date: Set(params.end_date),
        form_fields_mode: Set(params.form_fields_mode),
        custom_fields: Set(test::FieldList(custom_fields)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for q in &questions {
        test_question::ActiveModel {
            test_id: Set(created.id),
            position: Set(q.position),
            question_text: Set(q.question_text.clone()),
            options: Set(q.options.clone()),
            correct_option: Set(q.correct_option.clone()),
            explanation: Set(q.explanation.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    question::Entity::delete_many()
        .filter(question::Column::QuestionSetId.eq(draft.id))
        .exec(&txn)
        .await?;
    question_set::Entity::delete_by_id(draft.id).exec(&txn).await?;

    txn.commit().await?;
    log::info!("faculty {} published test {}", faculty_id, created.id);

    let followers = follow_service::followers_of(db, faculty_id).await?;
    let mut notified = 0;
    let mut failed = 0;
    for student_id in followers {
        let result = notification::ActiveModel {
            student_id: Set(student_id),
            faculty_id: Set(faculty_id),
            test_id: Set(created.id),
            test_title: Set(created.title.clone()),
            status: Set(notification::NotificationStatus::New),
            created_at: Set(Utc::now()),
            action_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await;

        match result {
            Ok(row) => {
                notified += 1;
                emit(
                    hub,
                    &topics::student_notifications(student_id),
                    "notification.created",
                    &row,
                )
                .await;
            }
            Err(e) => {
                failed += 1;
                log::error!(
                    "notification fanout to student {} for test {} failed: {}",
                    student_id,
                    created.id,
                    e
                );
            }
        }
    }

    Ok(PublishReport {
        test: created,
        notified,
        failed,
    })
}

/// Revokes a published test, re-materializing its frozen questions as a new
/// draft so nothing is lost.
///
/// Deletes the test, its question snapshot, every outstanding notification,
/// every disqualification, and every violation alert for it — in one
/// transaction. Completed attempts are student history and survive.
pub async fn revoke(
    db: &DatabaseConnection,
    faculty_id: i64,
    test_id: i64,
) -> Result<question_set::Model, ServiceError> {
    let found = owned_test(db, faculty_id, test_id).await?;
    let questions = test_questions_ordered(db, test_id).await?;

    let txn = db.begin().await?;

    let draft = question_set::ActiveModel {
        owner_id: Set(faculty_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for q in &questions {
        question::ActiveModel {
            question_set_id: Set(draft.id),
            position: Set(q.position),
            question_text: Set(q.question_text.clone()),
            options: Set(q.options.clone()),
            correct_option: Set(q.correct_option.clone()),
            explanation: Set(q.explanation.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    notification::Entity::delete_many()
        .filter(notification::Column::TestId.eq(test_id))
        .exec(&txn)
        .await?;
    violation_alert::Entity::delete_many()
        .filter(violation_alert::Column::TestId.eq(test_id))
        .exec(&txn)
        .await?;
    test_disqualification::Entity::delete_many()
        .filter(test_disqualification::Column::TestId.eq(test_id))
        .exec(&txn)
        .await?;
    test_question::Entity::delete_many()
        .filter(test_question::Column::TestId.eq(test_id))
        .exec(&txn)
        .await?;
    test::Entity::delete_by_id(test_id).exec(&txn).await?;

    txn.commit().await?;
    log::info!(
        "faculty {} revoked test {} ('{}'), draft {} re-created",
        faculty_id,
        test_id,
        found.title,
        draft.id
    );
    Ok(draft)
}

/// Starts a proctored attempt for `student_id`.
///
/// Consumes any outstanding notification rows for this student and test —
/// consumption is idempotent, a missing row just means it was already
/// consumed. A disqualified student is blocked until the owner grants a
/// re-attempt.
pub async fn start_attempt(
    db: &DatabaseConnection,
    test_id: i64,
    student_id: i64,
) -> Result<ProctorSession, ServiceError> {
    let found = test::Entity::find_by_id(test_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("test"))?;

    if let Some(end) = found.end_date {
        if end < Utc::now() {
            return Err(ServiceError::invalid("the test is no longer startable"));
        }
    }

    let blocked = test_disqualification::Entity::find()
        .filter(test_disqualification::Column::TestId.eq(test_id))
        .filter(test_disqualification::Column::StudentId.eq(student_id))
        .one(db)
        .await?;
    if blocked.is_some() {
        let count = test_attempt::Entity::find()
            .filter(test_attempt::Column::TestId.eq(test_id))
            .filter(test_attempt::Column::StudentId.eq(student_id))
            .order_by_desc(test_attempt::Column::SubmittedAt)
            .one(db)
            .await?
            .map(|a| a.violation_count as u32)
            .unwrap_or(VIOLATION_LIMIT);
        return Err(ServiceError::Disqualified {
            count,
            limit: VIOLATION_LIMIT,
        });
    }

    let consumed = notification::Entity::delete_many()
        .filter(notification::Column::TestId.eq(test_id))
        .filter(notification::Column::StudentId.eq(student_id))
        .exec(db)
        .await?;
    if consumed.rows_affected == 0 {
        log::debug!(
            "no notification to consume for student {} on test {}",
            student_id,
            test_id
        );
    }

    let questions = test_questions_ordered(db, test_id).await?;
    Ok(ProctorSession::new(
        test_id,
        student_id,
        questions.into_iter().map(Into::into).collect(),
        found.duration_minutes as u32,
    ))
}

pub(crate) async fn owned_test(
    db: &DatabaseConnection,
    faculty_id: i64,
    test_id: i64,
) -> Result<test::Model, ServiceError> {
    test::Entity::find_by_id(test_id)
        .filter(test::Column::OwnerId.eq(faculty_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("test"))
}

pub(crate) async fn test_questions_ordered(
    db: &DatabaseConnection,
    test_id: i64,
) -> Result<Vec<test_question::Model>, ServiceError> {
    Ok(test_question::Entity::find()
        .filter(test_question::Column::TestId.eq(test_id))
        .order_by_asc(test_question::Column::Position)
        .all(db)
        .await?)
}
