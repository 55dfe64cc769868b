//! Student→faculty follow graph: requests, responses, and the follow edges
//! that gate notification fanout.

use chrono::Utc;
use db::models::{follow_request, user, user_follow};
use db::models::follow_request::RequestStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use util::live::{LiveHub, emit, topics};

use crate::error::ServiceError;
use crate::user_service;

/// A student asks to follow the faculty member behind `handle`.
///
/// At most one request row exists per pair: a pending one is a duplicate, a
/// rejected or accepted one is reset back to pending instead of duplicated.
pub async fn send_follow_request(
    db: &DatabaseConnection,
    hub: &LiveHub,
    student_id: i64,
    handle: &str,
) -> Result<follow_request::Model, ServiceError> {
    let faculty = user_service::find_by_handle(db, handle).await?;

    let existing = follow_request::Entity::find()
        .filter(follow_request::Column::StudentId.eq(student_id))
        .filter(follow_request::Column::FacultyId.eq(faculty.id))
        .one(db)
        .await?;

    let request = match existing {
        Some(found) if found.status == RequestStatus::Pending => {
            return Err(ServiceError::DuplicateRequest);
        }
        Some(found) => {
            let mut active = found.into_active_model();
            active.status = Set(RequestStatus::Pending);
            active.updated_at = Set(Utc::now());
            active.update(db).await?
        }
        None => {
            let now = Utc::now();
            follow_request::ActiveModel {
                student_id: Set(student_id),
                faculty_id: Set(faculty.id),
                status: Set(RequestStatus::Pending),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    emit(
        hub,
        &topics::faculty_requests(faculty.id),
        "follow_request.received",
        &request,
    )
    .await;
    Ok(request)
}

/// The faculty member accepts or rejects a pending request.
///
/// The status change and the follow edge commit together, so an `Accepted`
/// request always has its edge. Accepting twice is harmless because the edge
/// insert is guarded by an existence check.
pub async fn respond_to_follow_request(
    db: &DatabaseConnection,
    faculty_id: i64,
    request_id: i64,
    accept: bool,
) -> Result<follow_request::Model, ServiceError> {
    let request = follow_request::Entity::find_by_id(request_id)
        .filter(follow_request::Column::FacultyId.eq(faculty_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("follow request"))?;

    let status = if accept {
        RequestStatus::Accepted
    } else {
        RequestStatus::Rejected
    };

    let student_id = request.student_id;
    let txn = db.begin().await?;

    let mut active = request.into_active_model();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    if accept {
        ensure_edge(&txn, student_id, faculty_id).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

async fn ensure_edge<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
    faculty_id: i64,
) -> Result<(), ServiceError> {
    let exists = user_follow::Entity::find()
        .filter(user_follow::Column::StudentId.eq(student_id))
        .filter(user_follow::Column::FacultyId.eq(faculty_id))
        .one(db)
        .await?;
    if exists.is_none() {
        user_follow::ActiveModel {
            student_id: Set(student_id),
            faculty_id: Set(faculty_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Removes the follow edge. Silently succeeds if it never existed.
pub async fn unfollow(
    db: &DatabaseConnection,
    student_id: i64,
    faculty_id: i64,
) -> Result<(), ServiceError> {
    user_follow::Entity::delete_many()
        .filter(user_follow::Column::StudentId.eq(student_id))
        .filter(user_follow::Column::FacultyId.eq(faculty_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Students currently following `faculty_id`; the fanout audience.
pub async fn followers_of(
    db: &DatabaseConnection,
    faculty_id: i64,
) -> Result<Vec<i64>, ServiceError> {
    let edges = user_follow::Entity::find()
        .filter(user_follow::Column::FacultyId.eq(faculty_id))
        .all(db)
        .await?;
    Ok(edges.into_iter().map(|e| e.student_id).collect())
}

/// Faculty accounts the student follows.
pub async fn following(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<user::Model>, ServiceError> {
    let edges = user_follow::Entity::find()
        .filter(user_follow::Column::StudentId.eq(student_id))
        .all(db)
        .await?;
    let ids: Vec<i64> = edges.into_iter().map(|e| e.faculty_id).collect();
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?)
}

/// Pending requests awaiting this faculty member's decision.
pub async fn pending_requests(
    db: &DatabaseConnection,
    faculty_id: i64,
) -> Result<Vec<follow_request::Model>, ServiceError> {
    Ok(follow_request::Entity::find()
        .filter(follow_request::Column::FacultyId.eq(faculty_id))
        .filter(follow_request::Column::Status.eq(RequestStatus::Pending))
        .all(db)
        .await?)
}
