use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use futures::future::try_join_all;
use tracing::{info, instrument};

use crate::{
    error::ApiError,
    histories::{dto::HistoryResponse, repo::History},
    response::{self, Envelope},
    state::AppState,
    storage::SIGNED_URL_TTL_SECS,
    users::handlers::require_user,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:id_user/histories",
            get(list_histories).delete(delete_all_histories),
        )
        .route(
            "/users/:id_user/histories/:id_history",
            get(get_history).delete(delete_history),
        )
}

async fn into_response(state: &AppState, record: History) -> Result<HistoryResponse, ApiError> {
    let image_url = match record.image_key.as_deref() {
        Some(key) => Some(state.storage.presign_get(key, SIGNED_URL_TTL_SECS).await?),
        None => None,
    };
    Ok(HistoryResponse::from_record(record, image_url))
}

#[instrument(skip(state))]
pub async fn list_histories(
    State(state): State<AppState>,
    Path(id_user): Path<String>,
) -> Result<(StatusCode, Json<Envelope<Vec<HistoryResponse>>>), ApiError> {
    let user = require_user(&state.db, &id_user).await?;
    let records = History::list_by_user(&state.db, user.id).await?;

    let mut items = Vec::with_capacity(records.len());
    for record in records {
        items.push(into_response(&state, record).await?);
    }
    Ok(response::success(items))
}

#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    Path((id_user, id_history)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Envelope<HistoryResponse>>), ApiError> {
    let user = require_user(&state.db, &id_user).await?;
    let record = History::find_by_opaque_id(&state.db, user.id, &id_history)
        .await?
        .ok_or_else(|| ApiError::not_found("History", &id_history))?;

    Ok(response::success(into_response(&state, record).await?))
}

#[instrument(skip(state))]
pub async fn delete_history(
    State(state): State<AppState>,
    Path((id_user, id_history)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let user = require_user(&state.db, &id_user).await?;
    let record = History::find_by_opaque_id(&state.db, user.id, &id_history)
        .await?
        .ok_or_else(|| ApiError::not_found("History", &id_history))?;

    History::delete(&state.db, user.id, record.id).await?;
    info!(user_id = %user.id, history_id = %record.id, "history deleted");
    Ok(response::success_message(
        "History data has been deleted successfully.",
    ))
}

/// Deleting everything a user has is all-or-nothing: the per-record deletes
/// run concurrently and any failure fails the whole request.
#[instrument(skip(state))]
pub async fn delete_all_histories(
    State(state): State<AppState>,
    Path(id_user): Path<String>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let user = require_user(&state.db, &id_user).await?;
    let ids = History::ids_by_user(&state.db, user.id).await?;
    if ids.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No history data found for user with ID {id_user}."
        )));
    }

    let deletes = ids.iter().map(|id| History::delete(&state.db, user.id, *id));
    try_join_all(deletes).await?;

    info!(user_id = %user.id, count = ids.len(), "all histories deleted");
    Ok(response::success_message(
        "All history data has been deleted successfully.",
    ))
}
