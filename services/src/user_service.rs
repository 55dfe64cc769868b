//! Account registration, faculty handle allocation, and identity verification.

use chrono::Utc;
use db::models::{role_counter, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use validator::Validate;

use crate::error::ServiceError;

#[derive(Debug, Validate)]
pub struct RegisterParams {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "a valid email address is required"))]
    pub email: String,
    pub role: user::Role,
}

/// Registers a new account.
///
/// Faculty accounts are allocated a unique handle of the form
/// `{slug}-faculty{n}`, where the slug is the lowercased name with spaces
/// removed and `n` starts at 101. Allocation and insert share a transaction,
/// so concurrent registrations cannot collide on a handle.
pub async fn register(
    db: &DatabaseConnection,
    params: RegisterParams,
) -> Result<user::Model, ServiceError> {
    params.validate()?;

    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(params.email.as_str()))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(ServiceError::validation("email already registered"));
    }

    let txn = db.begin().await?;

    let faculty_handle = match params.role {
        user::Role::Faculty => {
            let n = role_counter::next_value(&txn, "faculty").await?;
            Some(format!("{}-faculty{}", handle_slug(&params.name), 100 + n))
        }
        user::Role::Student => None,
    };

    let now = Utc::now();
    let created = user::ActiveModel {
        name: Set(params.name),
        email: Set(params.email),
        role: Set(params.role),
        faculty_handle: Set(faculty_handle),
        id_verified: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    log::info!("registered {} account {}", created.role, created.id);
    Ok(created)
}

fn handle_slug(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect()
}

/// Records a successful identity-provider verification callback.
pub async fn mark_id_verified(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<user::Model, ServiceError> {
    let found = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;

    let mut active = found.into_active_model();
    active.id_verified = Set(true);
    active.updated_at = Set(Utc::now());
    Ok(active.update(db).await?)
}

/// Looks up a faculty account by its public handle.
pub async fn find_by_handle(
    db: &DatabaseConnection,
    handle: &str,
) -> Result<user::Model, ServiceError> {
    user::Entity::find()
        .filter(user::Column::FacultyHandle.eq(handle))
        .filter(user::Column::Role.eq(user::Role::Faculty))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("faculty handle '{handle}'")))
}

/// Gate for content-producing operations: the account must exist, be a
/// faculty account, and have passed identity verification.
pub async fn require_verified_faculty(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<user::Model, ServiceError> {
    let found = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;

    if found.role != user::Role::Faculty {
        return Err(ServiceError::invalid("only faculty accounts may do this"));
    }
    if !found.id_verified {
        return Err(ServiceError::invalid(
            "identity verification is required before publishing content",
        ));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::setup_test_db;

    fn params(name: &str, email: &str, role: user::Role) -> RegisterParams {
        RegisterParams {
            name: name.to_owned(),
            email: email.to_owned(),
            role,
        }
    }

    #[tokio::test]
    async fn students_get_no_handle() {
        let db = setup_test_db().await;

        let student = register(&db, params("Ann Lee", "ann@example.com", user::Role::Student))
            .await
            .unwrap();

        assert_eq!(student.role, user::Role::Student);
        assert_eq!(student.faculty_handle, None);
        assert!(!student.id_verified);
    }

    #[tokio::test]
    async fn faculty_handles_are_sequential_from_101() {
        let db = setup_test_db().await;

        let first = register(&db, params("Alice Smith", "alice@example.com", user::Role::Faculty))
            .await
            .unwrap();
        let second = register(&db, params("Bob Jones", "bob@example.com", user::Role::Faculty))
            .await
            .unwrap();

        assert_eq!(first.faculty_handle.as_deref(), Some("alicesmith-faculty101"));
        assert_eq!(second.faculty_handle.as_deref(), Some("bobjones-faculty102"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = setup_test_db().await;

        register(&db, params("Ann Lee", "ann@example.com", user::Role::Student))
            .await
            .unwrap();
        let err = register(&db, params("Other Ann", "ann@example.com", user::Role::Student))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let db = setup_test_db().await;

        let err = register(&db, params("Ann Lee", "not-an-email", user::Role::Student))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn verification_gate_checks_role_and_flag() {
        let db = setup_test_db().await;

        let student = register(&db, params("Ann Lee", "ann@example.com", user::Role::Student))
            .await
            .unwrap();
        let faculty = register(&db, params("Dr Kim", "kim@example.com", user::Role::Faculty))
            .await
            .unwrap();

        assert!(matches!(
            require_verified_faculty(&db, student.id).await.unwrap_err(),
            ServiceError::InvalidOperation(_)
        ));
        assert!(matches!(
            require_verified_faculty(&db, faculty.id).await.unwrap_err(),
            ServiceError::InvalidOperation(_)
        ));

        mark_id_verified(&db, faculty.id).await.unwrap();
        let gated = require_verified_faculty(&db, faculty.id).await.unwrap();
        assert_eq!(gated.id, faculty.id);

        assert!(matches!(
            require_verified_faculty(&db, 9999).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn handle_lookup_matches_faculty_only() {
        let db = setup_test_db().await;

        let faculty = register(&db, params("Dr Kim", "kim@example.com", user::Role::Faculty))
            .await
            .unwrap();
        let handle = faculty.faculty_handle.clone().unwrap();

        assert_eq!(find_by_handle(&db, &handle).await.unwrap().id, faculty.id);
        assert!(matches!(
            find_by_handle(&db, "nobody-faculty999").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}
