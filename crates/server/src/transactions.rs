//! Ledger API endpoints: one-off appends and the recent listing.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};

use api_types::transaction::{
    RecentQuery, TransactionNew, TransactionView, TransactionsResponse,
};
use engine::users;

use crate::{
    ServerError,
    recurrences::{map_kind, view_kind},
    server::ServerState,
};

fn view(entry: engine::Transaction) -> TransactionView {
    TransactionView {
        id: entry.id,
        category_id: entry.category_id,
        amount_minor: entry.amount_minor,
        kind: view_kind(entry.kind),
        description: entry.description,
        occurred_on: entry.occurred_on,
        created_at: entry.created_at,
    }
}

pub async fn recent(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<TransactionsResponse>, ServerError> {
    let transactions = state
        .engine
        .recent_transactions(&user.username, query.limit)
        .await?
        .into_iter()
        .map(view)
        .collect();

    Ok(Json(TransactionsResponse { transactions }))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd = engine::NewTransaction::new(
        &user.username,
        payload.amount_minor,
        map_kind(payload.kind),
        payload.occurred_on,
    );
    cmd.category_id = payload.category_id;
    cmd.description = payload.description;

    let entry = state.engine.append_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(entry))))
}
