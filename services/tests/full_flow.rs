//! End-to-end walk through the whole platform: registration, the follow
//! graph, publishing, two proctored sessions (one clean, one disqualified),
//! the re-attempt grant, and the resulting analytics.

use db::models::test::FormFieldsMode;
use db::models::user::Role;
use db::models::{notification, test_disqualification};
use db::test_utils::setup_test_db;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use util::live::LiveHub;

use services::error::ServiceError;
use services::proctor::{FocusSignal, NavDirection, SessionOutcome, spawn};
use services::question_service::McqInput;
use services::test_service::PublishParams;
use services::{
    analytics_service, attempt_service, follow_service, notification_service, question_service,
    test_service, user_service,
};

fn mcq(text: &str, correct: &str) -> McqInput {
    McqInput {
        question_text: text.to_owned(),
        options: vec![
            "Option A".to_owned(),
            "Option B".to_owned(),
            "Option C".to_owned(),
            "Option D".to_owned(),
        ],
        correct_option: correct.to_owned(),
        explanation: format!("{correct} is correct"),
    }
}

async fn register(db: &DatabaseConnection, name: &str, email: &str, role: Role) -> i64 {
    user_service::register(
        db,
        user_service::RegisterParams {
            name: name.to_owned(),
            email: email.to_owned(),
            role,
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn full_platform_flow() {
    let db = setup_test_db().await;
    let hub = LiveHub::new();

    // -- Accounts ---------------------------------------------------------
    let faculty_id = register(&db, "Dr Kim", "kim@example.com", Role::Faculty).await;
    let ann_id = register(&db, "Ann Lee", "ann@example.com", Role::Student).await;
    let ben_id = register(&db, "Ben Cho", "ben@example.com", Role::Student).await;

    let faculty = user_service::mark_id_verified(&db, faculty_id).await.unwrap();
    let handle = faculty.faculty_handle.clone().unwrap();
    assert_eq!(handle, "drkim-faculty101");

    // -- Follow graph -----------------------------------------------------
    for student_id in [ann_id, ben_id] {
        let request = follow_service::send_follow_request(&db, &hub, student_id, &handle)
            .await
            .unwrap();
        follow_service::respond_to_follow_request(&db, faculty_id, request.id, true)
            .await
            .unwrap();
    }
    assert_eq!(follow_service::followers_of(&db, faculty_id).await.unwrap().len(), 2);

    // -- Author and publish -----------------------------------------------
    let questions: Vec<McqInput> = (1..=5)
        .map(|i| mcq(&format!("Question {i}"), "Option A"))
        .collect();
    let draft = question_service::create_question_set(&db, faculty_id, questions)
        .await
        .unwrap();

    let report = test_service::publish(
        &db,
        &hub,
        faculty_id,
        PublishParams {
            question_set_id: draft.id,
            title: "Midterm".to_owned(),
            duration_minutes: 10,
            end_date: None,
            form_fields_mode: FormFieldsMode::Default,
            custom_fields: Vec::new(),
        },
    )
    .await
    .unwrap();
    let test_id = report.test.id;

    assert_eq!(report.notified, 2);
    assert_eq!(report.failed, 0);
    for student_id in [ann_id, ben_id] {
        let feed = notification_service::list_for_student(&db, student_id).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].test_title, "Midterm");
    }

    // -- Ann: one violation, then a clean 4/5 run -------------------------
    let session = test_service::start_attempt(&db, test_id, ann_id).await.unwrap();
    let (handle_a, done_a) = spawn(session);

    handle_a.enter_secure_mode().await.unwrap();
    handle_a.focus_lost(FocusSignal::VisibilityHidden).await.unwrap();
    // Progress was wiped; re-enter and answer on what is left of the clock.
    handle_a.enter_secure_mode().await.unwrap();
    for (index, option) in [(0, "Option A"), (1, "Option A"), (2, "Option A"), (3, "Option A")] {
        handle_a.select_answer(index, option).await.unwrap();
        handle_a.navigate(NavDirection::Next).await.unwrap();
    }
    handle_a.select_answer(4, "Option C").await.unwrap();
    handle_a.submit().await.unwrap();

    let outcome: SessionOutcome = done_a.await.unwrap();
    assert_eq!(outcome.score, 4);
    assert_eq!(outcome.violations, 1);
    assert!(!outcome.disqualified);

    let attempt = attempt_service::record_attempt_completion(&db, &hub, &outcome)
        .await
        .unwrap();
    assert_eq!(attempt.score, 4);
    assert_eq!(attempt.violation_count, 1);
    assert_eq!(attempt.student_name, "Ann Lee");
    assert!(attempt_service::pending_alerts(&db, faculty_id).await.unwrap().is_empty());

    // -- Ben: three violations, disqualified ------------------------------
    let session = test_service::start_attempt(&db, test_id, ben_id).await.unwrap();
    let (handle_b, done_b) = spawn(session);

    handle_b.enter_secure_mode().await.unwrap();
    for _ in 0..2 {
        handle_b.focus_lost(FocusSignal::FullscreenExited).await.unwrap();
        handle_b.enter_secure_mode().await.unwrap();
    }
    handle_b.select_answer(0, "Option A").await.unwrap();
    handle_b.focus_lost(FocusSignal::WindowBlurred).await.unwrap();

    let outcome = done_b.await.unwrap();
    assert!(outcome.disqualified);
    assert_eq!(outcome.violations, 3);
    // The final violation keeps whatever was answered at that moment.
    assert_eq!(outcome.answers[0].as_deref(), Some("Option A"));
    assert_eq!(outcome.score, 1);

    attempt_service::record_attempt_completion(&db, &hub, &outcome)
        .await
        .unwrap();

    assert_eq!(
        test_disqualification::Entity::find()
            .filter(test_disqualification::Column::StudentId.eq(ben_id))
            .all(&db)
            .await
            .unwrap()
            .len(),
        1
    );
    let alerts = attempt_service::pending_alerts(&db, faculty_id).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].student_id, ben_id);

    let err = test_service::start_attempt(&db, test_id, ben_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Disqualified { count: 3, limit: 3 }));

    // -- Grant the re-attempt ---------------------------------------------
    attempt_service::grant_reattempt(&db, &hub, faculty_id, alerts[0].id)
        .await
        .unwrap();

    let feed = notification_service::list_for_student(&db, ben_id).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].status, notification::NotificationStatus::New);

    test_service::start_attempt(&db, test_id, ben_id).await.unwrap();

    // -- Analytics over both recorded attempts ----------------------------
    let analytics = analytics_service::test_analytics(&db, faculty_id, test_id)
        .await
        .unwrap();
    assert_eq!(analytics.attempts, 2);
    assert_eq!(analytics.highest_score, 4);
    assert_eq!(analytics.lowest_score, 1);
    assert_eq!(analytics.disqualified_count, 1);
    assert_eq!(analytics.question_stats.len(), 5);
    assert_eq!(analytics.question_stats[0].correct, 2);
    assert_eq!(analytics.question_stats[4].answered, 1);
    assert_eq!(analytics.question_stats[4].correct, 0);
}
