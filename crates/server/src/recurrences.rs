//! Recurrence API endpoints.
//!
//! The listing endpoint runs the due sweep first, so reading the
//! recurrences is what materializes overdue ledger entries.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use api_types::recurrence::{
    GenerateResponse, RecurrenceListResponse, RecurrenceNew, RecurrenceUpdate, RecurrenceView,
    SweepResult,
};
use api_types::{Frequency as ApiFrequency, TransactionKind as ApiKind};
use engine::users;

use crate::{ServerError, server::ServerState};

pub(crate) fn map_kind(kind: ApiKind) -> engine::TransactionKind {
    match kind {
        ApiKind::Expense => engine::TransactionKind::Expense,
        ApiKind::Income => engine::TransactionKind::Income,
    }
}

pub(crate) fn view_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Expense => ApiKind::Expense,
        engine::TransactionKind::Income => ApiKind::Income,
    }
}

fn map_frequency(frequency: ApiFrequency) -> engine::Frequency {
    match frequency {
        ApiFrequency::Daily => engine::Frequency::Daily,
        ApiFrequency::Weekly => engine::Frequency::Weekly,
        ApiFrequency::Biweekly => engine::Frequency::Biweekly,
        ApiFrequency::Monthly => engine::Frequency::Monthly,
        ApiFrequency::Quarterly => engine::Frequency::Quarterly,
        ApiFrequency::Yearly => engine::Frequency::Yearly,
    }
}

fn view_frequency(frequency: engine::Frequency) -> ApiFrequency {
    match frequency {
        engine::Frequency::Daily => ApiFrequency::Daily,
        engine::Frequency::Weekly => ApiFrequency::Weekly,
        engine::Frequency::Biweekly => ApiFrequency::Biweekly,
        engine::Frequency::Monthly => ApiFrequency::Monthly,
        engine::Frequency::Quarterly => ApiFrequency::Quarterly,
        engine::Frequency::Yearly => ApiFrequency::Yearly,
    }
}

fn view(record: engine::Recurrence) -> RecurrenceView {
    RecurrenceView {
        id: record.id,
        category_id: record.category_id,
        amount_minor: record.amount_minor,
        kind: view_kind(record.kind),
        description: record.description,
        frequency: view_frequency(record.frequency),
        start_date: record.start_date,
        end_date: record.end_date,
        next_due_date: record.next_due_date,
        last_generated_date: record.last_generated_date,
        is_active: record.is_active,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<RecurrenceListResponse>, ServerError> {
    let today = Utc::now().date_naive();
    let sweep = state
        .engine
        .sweep_due(&user.username, today)
        .await?
        .into_iter()
        .map(|outcome| SweepResult {
            recurrence_id: outcome.recurrence_id,
            generated: outcome.generated,
            deactivated: outcome.deactivated,
        })
        .collect();

    let recurrences = state
        .engine
        .list_recurrences(&user.username)
        .await?
        .into_iter()
        .map(view)
        .collect();

    Ok(Json(RecurrenceListResponse { recurrences, sweep }))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<RecurrenceNew>,
) -> Result<(StatusCode, Json<RecurrenceView>), ServerError> {
    let mut cmd = engine::NewRecurrence::new(
        &user.username,
        payload.amount_minor,
        map_kind(payload.kind),
        map_frequency(payload.frequency),
        payload.start_date,
    );
    cmd.category_id = payload.category_id;
    cmd.description = payload.description;
    cmd.end_date = payload.end_date;
    cmd.is_active = payload.is_active;
    cmd.generate_first = payload.generate_first;

    let record = state.engine.create_recurrence(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(record))))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecurrenceUpdate>,
) -> Result<Json<RecurrenceView>, ServerError> {
    let patch = engine::RecurrencePatch {
        category_id: payload.category_id,
        amount_minor: payload.amount_minor,
        kind: payload.kind.map(map_kind),
        description: payload.description,
        frequency: payload.frequency.map(map_frequency),
        start_date: payload.start_date,
        end_date: payload.end_date,
        is_active: payload.is_active,
    };

    let record = state
        .engine
        .update_recurrence(&user.username, id, patch)
        .await?;
    Ok(Json(view(record)))
}

pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_recurrence(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn generate(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GenerateResponse>, ServerError> {
    let generated = state
        .engine
        .generate_now(&user.username, id, Utc::now().date_naive())
        .await?;
    Ok(Json(GenerateResponse { generated }))
}
