//! Owner-facing analytics over a published test's recorded attempts.

use db::models::test_attempt;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::error::ServiceError;
use crate::proctor::VIOLATION_LIMIT;
use crate::test_service;

/// How one question performed across all attempts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStat {
    pub position: i32,
    pub question_text: String,
    /// Attempts that submitted any answer for this position.
    pub answered: usize,
    /// Attempts that submitted the correct option.
    pub correct: usize,
}

/// Aggregates computed from every recorded attempt of one test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestAnalytics {
    pub test_id: i64,
    pub attempts: usize,
    pub average_score: f64,
    pub highest_score: i32,
    pub lowest_score: i32,
    pub average_violations: f64,
    /// Attempts that ended in disqualification.
    pub disqualified_count: usize,
    pub question_stats: Vec<QuestionStat>,
}

/// Computes analytics for an owned, still-published test.
///
/// Questions come from the frozen snapshot, so the numbers stay meaningful
/// even if the owner has since re-drafted similar questions. Once the test is
/// revoked the snapshot is gone and this returns `NotFound`.
pub async fn test_analytics(
    db: &DatabaseConnection,
    faculty_id: i64,
    test_id: i64,
) -> Result<TestAnalytics, ServiceError> {
    test_service::owned_test(db, faculty_id, test_id).await?;
    let questions = test_service::test_questions_ordered(db, test_id).await?;

    let attempts = test_attempt::Entity::find()
        .filter(test_attempt::Column::TestId.eq(test_id))
        .all(db)
        .await?;

    let count = attempts.len();
    let (average_score, highest_score, lowest_score, average_violations) = if count == 0 {
        (0.0, 0, 0, 0.0)
    } else {
        let score_sum: i64 = attempts.iter().map(|a| a.score as i64).sum();
        let violation_sum: i64 = attempts.iter().map(|a| a.violation_count as i64).sum();
        (
            score_sum as f64 / count as f64,
            attempts.iter().map(|a| a.score).max().unwrap_or(0),
            attempts.iter().map(|a| a.score).min().unwrap_or(0),
            violation_sum as f64 / count as f64,
        )
    };

    let disqualified_count = attempts
        .iter()
        .filter(|a| a.violation_count >= VIOLATION_LIMIT as i32)
        .count();

    let question_stats = questions
        .into_iter()
        .map(|q| {
            let position = q.position as usize;
            let answers = attempts
                .iter()
                .filter_map(|a| a.answers.0.get(position))
                .filter_map(|answer| answer.as_deref());
            let mut answered = 0;
            let mut correct = 0;
            for answer in answers {
                answered += 1;
                if answer == q.correct_option {
                    correct += 1;
                }
            }
            QuestionStat {
                position: q.position,
                question_text: q.question_text,
                answered,
                correct,
            }
        })
        .collect();

    Ok(TestAnalytics {
        test_id,
        attempts: count,
        average_score,
        highest_score,
        lowest_score,
        average_violations,
        disqualified_count,
        question_stats,
    })
}
