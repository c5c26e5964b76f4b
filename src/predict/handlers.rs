use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::ApiError,
    histories::{
        dto::HistoryResponse,
        repo::{History, NewHistory},
    },
    inference::adapter::classify_image,
    predict::services::enrich,
    response::{self, Envelope},
    state::AppState,
    storage::{self, SIGNED_URL_TTL_SECS},
    users::repo::User,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predict", post(post_predict))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

/// POST /predict (multipart)
/// Fields: `image` (file) and `idUser` (text). Classifies the image, enriches
/// the result with matching reference data, stores the image and the history
/// record, and returns the full document.
#[instrument(skip(state, multipart))]
pub async fn post_predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Envelope<HistoryResponse>>), ApiError> {
    let upload = read_upload(&mut multipart).await?;
    let Some(id_user) = upload.id_user else {
        return Err(ApiError::validation("Field idUser is required."));
    };
    let Some(image) = upload.image else {
        return Err(ApiError::validation("Field image is required."));
    };

    // The submitting account must exist; an unknown id is an auth failure
    // here, not a 404.
    let user = User::find_by_opaque_id(&state.db, &id_user)
        .await?
        .ok_or_else(|| ApiError::auth(format!("User with ID {id_user} not found.")))?;

    let prediction = classify_image(state.classifier.as_ref(), &image)?;
    let enrichment = enrich(&state.db, &prediction.label, user.city.as_deref()).await?;

    // The key embeds the history id, so pick the id before the row exists.
    let history_id = Uuid::new_v4();
    let key = storage::history_image_key(history_id, OffsetDateTime::now_utc());
    state.storage.put_object(&key, image, "image/jpeg").await?;
    let image_url = state.storage.presign_get(&key, SIGNED_URL_TTL_SECS).await?;

    let record = History::insert(
        &state.db,
        NewHistory {
            id: history_id,
            user_id: user.id,
            label: &prediction.label,
            confidence_score: prediction.confidence_score,
            image_key: Some(&key),
            explanation: &prediction.explanation,
            suggestion: &prediction.suggestion,
            clinic: enrichment.clinic,
            products: enrichment.products,
            articles: enrichment.articles,
        },
    )
    .await?;

    info!(
        user_id = %user.id,
        history_id = %record.id,
        label = %record.label,
        confidence = record.confidence_score,
        "prediction stored"
    );

    Ok(response::created(
        "Model is predicted successfully.",
        HistoryResponse::from_record(record, Some(image_url)),
    ))
}

#[derive(Default)]
struct PredictUpload {
    image: Option<bytes::Bytes>,
    id_user: Option<String>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<PredictUpload, ApiError> {
    let mut upload = PredictUpload::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("image") => upload.image = Some(field.bytes().await.map_err(bad_multipart)?),
            Some("idUser") => upload.id_user = Some(field.text().await.map_err(bad_multipart)?),
            _ => {}
        }
    }
    Ok(upload)
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::validation(format!("Malformed multipart payload: {err}"))
}
