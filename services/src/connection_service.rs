//! Faculty↔faculty connection graph: the symmetric sibling of the follow
//! graph. Acceptance materializes one edge row per direction, in a single
//! transaction, so lookups never need to check both orientations.

use chrono::Utc;
use db::models::connection_request::RequestStatus;
use db::models::{connection_request, faculty_connection, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use util::live::{LiveHub, emit, topics};

use crate::error::ServiceError;
use crate::user_service;

/// A faculty member asks to connect with the peer behind `handle`.
pub async fn send_connection_request(
    db: &DatabaseConnection,
    hub: &LiveHub,
    from_faculty_id: i64,
    handle: &str,
) -> Result<connection_request::Model, ServiceError> {
    let from = user::Entity::find_by_id(from_faculty_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    if from.role != user::Role::Faculty {
        return Err(ServiceError::invalid("only faculty accounts can connect"));
    }

    let to = user_service::find_by_handle(db, handle).await?;
    if to.id == from_faculty_id {
        return Err(ServiceError::invalid("cannot connect an account to itself"));
    }

    let existing = connection_request::Entity::find()
        .filter(connection_request::Column::FromFacultyId.eq(from_faculty_id))
        .filter(connection_request::Column::ToFacultyId.eq(to.id))
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
            connection_request::ActiveModel {
                from_faculty_id: Set(from_faculty_id),
                to_faculty_id: Set(to.id),
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
        &topics::faculty_requests(to.id),
        "connection_request.received",
        &request,
    )
    .await;
    Ok(request)
}

/// The addressed faculty member accepts or rejects a pending request.
///
/// The status change and both direction edges commit in one transaction, so
/// an `Accepted` request always has its edges.
pub async fn respond_to_connection_request(
    db: &DatabaseConnection,
    faculty_id: i64,
    request_id: i64,
    accept: bool,
) -> Result<connection_request::Model, ServiceError> {
    let request = connection_request::Entity::find_by_id(request_id)
        .filter(connection_request::Column::ToFacultyId.eq(faculty_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("connection request"))?;

    let status = if accept {
        RequestStatus::Accepted
    } else {
        RequestStatus::Rejected
    };

    let from_id = request.from_faculty_id;
    let txn = db.begin().await?;

    let mut active = request.into_active_model();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    if accept {
        ensure_edge(&txn, from_id, faculty_id).await?;
        ensure_edge(&txn, faculty_id, from_id).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

async fn ensure_edge<C: ConnectionTrait>(
    db: &C,
    faculty_id: i64,
    peer_id: i64,
) -> Result<(), ServiceError> {
    let exists = faculty_connection::Entity::find()
        .filter(faculty_connection::Column::FacultyId.eq(faculty_id))
        .filter(faculty_connection::Column::PeerId.eq(peer_id))
        .one(db)
        .await?;
    if exists.is_none() {
        faculty_connection::ActiveModel {
            faculty_id: Set(faculty_id),
            peer_id: Set(peer_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Severs a connection in both directions. Silently succeeds if absent.
pub async fn disconnect(
    db: &DatabaseConnection,
    faculty_id: i64,
    peer_id: i64,
) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    faculty_connection::Entity::delete_many()
        .filter(faculty_connection::Column::FacultyId.eq(faculty_id))
        .filter(faculty_connection::Column::PeerId.eq(peer_id))
        .exec(&txn)
        .await?;
    faculty_connection::Entity::delete_many()
        .filter(faculty_connection::Column::FacultyId.eq(peer_id))
        .filter(faculty_connection::Column::PeerId.eq(faculty_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(())
}

/// Peers connected to `faculty_id`; single-direction query thanks to the
/// two-row representation.
pub async fn connections_of(
    db: &DatabaseConnection,
    faculty_id: i64,
) -> Result<Vec<user::Model>, ServiceError> {
    let edges = faculty_connection::Entity::find()
        .filter(faculty_connection::Column::FacultyId.eq(faculty_id))
        .all(db)
        .await?;
    let ids: Vec<i64> = edges.into_iter().map(|e| e.peer_id).collect();
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?)
}
