//! Income and expense endpoints.
//!
//! Both resources share one implementation parameterised by [`RecordKind`];
//! the per-kind functions at the bottom are what the router mounts.

use api_types::{
    Message,
    record::{RecordNew, RecordQuery, RecordView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use engine::{MoneyCents, Record, RecordFilter, RecordInput, RecordKind};
use uuid::Uuid;

use crate::{ServerError, auth::Identity, server::ServerState};

type JsonBody = WithRejection<Json<RecordNew>, ServerError>;
type RecordId = WithRejection<Path<Uuid>, ServerError>;
type Filters = WithRejection<Query<RecordQuery>, ServerError>;

fn map_record(record: Record) -> RecordView {
    RecordView {
        id: record.id,
        user_id: record.user_id,
        category_id: record.category_id,
        category_name: record.category_name,
        amount: record.amount.to_major(),
        description: record.description,
        date: record.date,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn to_input(payload: RecordNew) -> Result<RecordInput, ServerError> {
    Ok(RecordInput {
        category_id: payload.category_id,
        amount: MoneyCents::try_from_major(payload.amount)?,
        description: payload.description,
        date: payload.date,
    })
}

fn to_filter(query: RecordQuery) -> RecordFilter {
    RecordFilter {
        category_id: query.category_id,
        date: query.date,
        start_date: query.start_date,
        end_date: query.end_date,
    }
}

async fn list(
    kind: RecordKind,
    identity: Identity,
    state: ServerState,
    query: RecordQuery,
) -> Result<Json<Vec<RecordView>>, ServerError> {
    let records = state
        .engine
        .list_records(kind, identity.user_id, &to_filter(query))
        .await?;
    Ok(Json(records.into_iter().map(map_record).collect()))
}

async fn create(
    kind: RecordKind,
    identity: Identity,
    state: ServerState,
    payload: RecordNew,
) -> Result<(StatusCode, Json<RecordView>), ServerError> {
    let record = state
        .engine
        .create_record(kind, identity.user_id, to_input(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(map_record(record))))
}

async fn fetch(
    kind: RecordKind,
    identity: Identity,
    state: ServerState,
    record_id: Uuid,
) -> Result<Json<RecordView>, ServerError> {
    let record = state
        .engine
        .record(kind, identity.user_id, record_id)
        .await?;
    Ok(Json(map_record(record)))
}

async fn update(
    kind: RecordKind,
    identity: Identity,
    state: ServerState,
    record_id: Uuid,
    payload: RecordNew,
) -> Result<Json<RecordView>, ServerError> {
    let record = state
        .engine
        .update_record(kind, identity.user_id, record_id, to_input(payload)?)
        .await?;
    Ok(Json(map_record(record)))
}

async fn delete(
    kind: RecordKind,
    identity: Identity,
    state: ServerState,
    record_id: Uuid,
) -> Result<Json<Message>, ServerError> {
    state
        .engine
        .delete_record(kind, identity.user_id, record_id)
        .await?;
    Ok(Json(Message {
        message: format!("{} deleted successfully", kind.as_str()),
    }))
}

pub async fn list_income(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Query(query), _): Filters,
) -> Result<Json<Vec<RecordView>>, ServerError> {
    list(RecordKind::Income, identity, state, query).await
}

pub async fn create_income(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody,
) -> Result<(StatusCode, Json<RecordView>), ServerError> {
    create(RecordKind::Income, identity, state, payload).await
}

pub async fn get_income(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Path(id), _): RecordId,
) -> Result<Json<RecordView>, ServerError> {
    fetch(RecordKind::Income, identity, state, id).await
}

pub async fn update_income(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Path(id), _): RecordId,
    WithRejection(Json(payload), _): JsonBody,
) -> Result<Json<RecordView>, ServerError> {
    update(RecordKind::Income, identity, state, id, payload).await
}

pub async fn delete_income(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Path(id), _): RecordId,
) -> Result<Json<Message>, ServerError> {
    delete(RecordKind::Income, identity, state, id).await
}

pub async fn list_expense(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Query(query), _): Filters,
) -> Result<Json<Vec<RecordView>>, ServerError> {
    list(RecordKind::Expense, identity, state, query).await
}

pub async fn create_expense(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody,
) -> Result<(StatusCode, Json<RecordView>), ServerError> {
    create(RecordKind::Expense, identity, state, payload).await
}

pub async fn get_expense(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Path(id), _): RecordId,
) -> Result<Json<RecordView>, ServerError> {
    fetch(RecordKind::Expense, identity, state, id).await
}

pub async fn update_expense(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Path(id), _): RecordId,
    WithRejection(Json(payload), _): JsonBody,
) -> Result<Json<RecordView>, ServerError> {
    update(RecordKind::Expense, identity, state, id, payload).await
}

pub async fn delete_expense(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Path(id), _): RecordId,
) -> Result<Json<Message>, ServerError> {
    delete(RecordKind::Expense, identity, state, id).await
}
