//! Draft question sets: manual authoring, provider-backed generation, and the
//! MCQ shape rules both paths share.

use async_trait::async_trait;
use chrono::Utc;
use db::models::{question, question_set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashSet;
use thiserror::Error;

use crate::error::ServiceError;
use crate::user_service;

/// Number of options every question must carry.
pub const OPTION_COUNT: usize = 4;

/// One question as authored or generated, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McqInput {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option: String,
    pub explanation: String,
}

/// Checks the MCQ shape rules: non-empty prompt, exactly four unique
/// non-empty options, and a correct option that is one of them.
pub fn validate_mcq(input: &McqInput) -> Result<(), ServiceError> {
    if input.question_text.trim().is_empty() {
        return Err(ServiceError::validation("question text is required"));
    }
    if input.options.len() != OPTION_COUNT {
        return Err(ServiceError::validation(format!(
            "a question needs exactly {OPTION_COUNT} options, got {}",
            input.options.len()
        )));
    }
    if input.options.iter().any(|o| o.trim().is_empty()) {
        return Err(ServiceError::validation("options must be non-empty"));
    }
    let unique: HashSet<&str> = input.options.iter().map(String::as_str).collect();
    if unique.len() != OPTION_COUNT {
        return Err(ServiceError::validation("options must be unique"));
    }
    if !input.options.contains(&input.correct_option) {
        return Err(ServiceError::validation(
            "the correct option must be one of the four options",
        ));
    }
    Ok(())
}

/// Persists a new draft owned by `owner_id`, all rows in one transaction.
///
/// The caller must be a verified faculty account and the batch must be
/// non-empty with every question passing [`validate_mcq`].
pub async fn create_question_set(
    db: &DatabaseConnection,
    owner_id: i64,
    questions: Vec<McqInput>,
) -> Result<question_set::Model, ServiceError> {
    user_service::require_verified_faculty(db, owner_id).await?;

    if questions.is_empty() {
        return Err(ServiceError::validation("a question set needs at least one question"));
    }
    for input in &questions {
        validate_mcq(input)?;
    }

    let txn = db.begin().await?;

    let set = question_set::ActiveModel {
        owner_id: Set(owner_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for (position, input) in questions.into_iter().enumerate() {
        question::ActiveModel {
            question_set_id: Set(set.id),
            position: Set(position as i32),
            question_text: Set(input.question_text),
            options: Set(question::OptionList(input.options)),
            correct_option: Set(input.correct_option),
            explanation: Set(input.explanation),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    log::info!("faculty {} created question set {}", owner_id, set.id);
    Ok(set)
}

/// Lists the caller's drafts, newest first.
pub async fn list_drafts(
    db: &DatabaseConnection,
    owner_id: i64,
) -> Result<Vec<question_set::Model>, ServiceError> {
    Ok(question_set::Entity::find()
        .filter(question_set::Column::OwnerId.eq(owner_id))
        .order_by_desc(question_set::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Returns a draft's questions in position order. Owner-scoped.
pub async fn draft_questions(
    db: &DatabaseConnection,
    owner_id: i64,
    question_set_id: i64,
) -> Result<Vec<question::Model>, ServiceError> {
    let set = owned_draft(db, owner_id, question_set_id).await?;
    Ok(set
        .find_related(question::Entity)
        .order_by_asc(question::Column::Position)
        .all(db)
        .await?)
}

/// Deletes a draft and its questions. Owner-scoped.
pub async fn delete_draft(
    db: &DatabaseConnection,
    owner_id: i64,
    question_set_id: i64,
) -> Result<(), ServiceError> {
    owned_draft(db, owner_id, question_set_id).await?;

    let txn = db.begin().await?;
    question::Entity::delete_many()
        .filter(question::Column::QuestionSetId.eq(question_set_id))
        .exec(&txn)
        .await?;
    question_set::Entity::delete_by_id(question_set_id)
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(())
}

pub(crate) async fn owned_draft(
    db: &DatabaseConnection,
    owner_id: i64,
    question_set_id: i64,
) -> Result<question_set::Model, ServiceError> {
    question_set::Entity::find_by_id(question_set_id)
        .filter(question_set::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("question set"))
}

// ---------------------------------------------------------------------------
// Provider-backed generation
// ---------------------------------------------------------------------------

/// What the provider is asked to produce.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub difficulty: String,
    pub taxonomy_level: String,
    pub count: usize,
    /// Optional source material the questions should be grounded in.
    pub source_text: Option<String>,
}

/// Provider-side failure, opaque to this service.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GenerationFailure(pub String);

/// An external question source (an LLM gateway in production, a stub in
/// tests). Implementations do their own prompting and parsing; this service
/// only enforces the contract on what comes back.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
    -> Result<Vec<McqInput>, GenerationFailure>;
}

/// Generates a draft through `generator` and persists it.
///
/// The provider response is checked strictly: it must contain exactly
/// `request.count` questions and every one must pass [`validate_mcq`]. Any
/// deviation fails the whole request — no retry, no partial draft.
pub async fn generate_question_set(
    db: &DatabaseConnection,
    generator: &dyn QuestionGenerator,
    owner_id: i64,
    request: GenerationRequest,
) -> Result<question_set::Model, ServiceError> {
    user_service::require_verified_faculty(db, owner_id).await?;

    if request.count == 0 {
        return Err(ServiceError::validation("at least one question must be requested"));
    }

    let generated = generator
        .generate(&request)
        .await
        .map_err(|e| ServiceError::Generation(e.to_string()))?;

    if generated.len() != request.count {
        return Err(ServiceError::Generation(format!(
            "provider returned {} question(s), expected {}",
            generated.len(),
            request.count
        )));
    }
    for input in &generated {
        validate_mcq(input).map_err(|e| ServiceError::Generation(e.to_string()))?;
    }

    create_question_set(db, owner_id, generated).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::{insert_faculty, insert_student, setup_test_db};

    fn mcq(text: &str) -> McqInput {
        McqInput {
            question_text: text.to_owned(),
            options: vec![
                "Option A".to_owned(),
                "Option B".to_owned(),
                "Option C".to_owned(),
                "Option D".to_owned(),
            ],
            correct_option: "Option A".to_owned(),
            explanation: "Option A is correct".to_owned(),
        }
    }

    #[test]
    fn mcq_shape_rules() {
        assert!(validate_mcq(&mcq("What is 2 + 2?")).is_ok());

        let mut blank = mcq("  ");
        blank.question_text = "  ".to_owned();
        assert!(validate_mcq(&blank).is_err());

        let mut three = mcq("Q");
        three.options.pop();
        assert!(validate_mcq(&three).is_err());

        let mut dup = mcq("Q");
        dup.options[3] = "Option A".to_owned();
        assert!(validate_mcq(&dup).is_err());

        let mut stray = mcq("Q");
        stray.correct_option = "Option Z".to_owned();
        assert!(validate_mcq(&stray).is_err());
    }

    #[tokio::test]
    async fn create_and_read_back_a_draft() {
        let db = setup_test_db().await;
        let faculty = insert_faculty(&db, "Dr Kim", "kim@example.com", "drkim-faculty101").await;

        let set = create_question_set(&db, faculty.id, vec![mcq("Q1"), mcq("Q2")])
            .await
            .unwrap();

        let questions = draft_questions(&db, faculty.id, set.id).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].position, 0);
        assert_eq!(questions[0].question_text, "Q1");
        assert_eq!(questions[1].question_text, "Q2");

        let drafts = list_drafts(&db, faculty.id).await.unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[tokio::test]
    async fn students_cannot_author_drafts() {
        let db = setup_test_db().await;
        let student = insert_student(&db, "Ann", "ann@example.com").await;

        let err = create_question_set(&db, student.id, vec![mcq("Q1")])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn drafts_are_owner_scoped() {
        let db = setup_test_db().await;
        let owner = insert_faculty(&db, "Dr Kim", "kim@example.com", "drkim-faculty101").await;
        let other = insert_faculty(&db, "Dr Ray", "ray@example.com", "drray-faculty102").await;

        let set = create_question_set(&db, owner.id, vec![mcq("Q1")]).await.unwrap();

        assert!(matches!(
            draft_questions(&db, other.id, set.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            delete_draft(&db, other.id, set.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));

        delete_draft(&db, owner.id, set.id).await.unwrap();
        assert!(list_drafts(&db, owner.id).await.unwrap().is_empty());
    }

    struct FixedGenerator(Vec<McqInput>);

    #[async_trait]
    impl QuestionGenerator for FixedGenerator {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Vec<McqInput>, GenerationFailure> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl QuestionGenerator for FailingGenerator {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Vec<McqInput>, GenerationFailure> {
            Err(GenerationFailure("provider timed out".to_owned()))
        }
    }

    fn request(count: usize) -> GenerationRequest {
        GenerationRequest {
            topic: "Photosynthesis".to_owned(),
            difficulty: "medium".to_owned(),
            taxonomy_level: "apply".to_owned(),
            count,
            source_text: None,
        }
    }

    #[tokio::test]
    async fn generation_persists_a_full_draft() {
        let db = setup_test_db().await;
        let faculty = insert_faculty(&db, "Dr Kim", "kim@example.com", "drkim-faculty101").await;
        let generator = FixedGenerator(vec![mcq("G1"), mcq("G2")]);

        let set = generate_question_set(&db, &generator, faculty.id, request(2))
            .await
            .unwrap();

        let questions = draft_questions(&db, faculty.id, set.id).await.unwrap();
        assert_eq!(questions.len(), 2);
    }

    #[tokio::test]
    async fn wrong_count_or_bad_shape_fails_generation_with_no_draft() {
        let db = setup_test_db().await;
        let faculty = insert_faculty(&db, "Dr Kim", "kim@example.com", "drkim-faculty101").await;

        let short = FixedGenerator(vec![mcq("G1")]);
        let err = generate_question_set(&db, &short, faculty.id, request(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Generation(_)));

        let mut bad = mcq("G1");
        bad.options[1] = "Option A".to_owned();
        let malformed = FixedGenerator(vec![bad]);
        let err = generate_question_set(&db, &malformed, faculty.id, request(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Generation(_)));

        let err = generate_question_set(&db, &FailingGenerator, faculty.id, request(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Generation(_)));

        assert!(list_drafts(&db, faculty.id).await.unwrap().is_empty());
    }
}
