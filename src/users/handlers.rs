use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::{
    auth::{password::hash_password, validate},
    error::ApiError,
    response::{self, Envelope},
    state::AppState,
    storage,
    users::{dto::PublicUser, repo::User},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/:id_user", get(get_profile).put(edit_profile))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB, profile image upload
}

/// Load the user a path addresses or produce the canonical 404.
pub(crate) async fn require_user(db: &PgPool, id_user: &str) -> Result<User, ApiError> {
    User::find_by_opaque_id(db, id_user)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id_user))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id_user): Path<String>,
) -> Result<(StatusCode, Json<Envelope<PublicUser>>), ApiError> {
    let user = require_user(&state.db, &id_user).await?;
    Ok(response::success(PublicUser::from(user)))
}

/// PUT /users/{idUser} (multipart)
/// Text fields username/email/password/city plus an optional image file. A
/// field that is missing or empty keeps the stored value.
#[instrument(skip(state, multipart))]
pub async fn edit_profile(
    State(state): State<AppState>,
    Path(id_user): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Envelope<PublicUser>>), ApiError> {
    let user = require_user(&state.db, &id_user).await?;
    let update = read_update(&mut multipart).await?;

    let email = merge(update.email, user.email.clone());
    if email != user.email {
        if !validate::is_valid_email(&email) {
            return Err(ApiError::validation(validate::EMAIL_RULE));
        }
        if User::find_by_email(&state.db, &email).await?.is_some() {
            return Err(ApiError::validation("Email is already registered."));
        }
    }

    let username = merge(update.username, user.username.clone());
    let city = match update.city {
        Some(value) if !value.is_empty() => Some(value),
        _ => user.city.clone(),
    };
    let password_hash = match update.password {
        Some(value) if !value.is_empty() => hash_password(&value)?,
        _ => user.password_hash.clone(),
    };

    let photo_url = match update.image {
        Some(bytes) if !bytes.is_empty() => {
            let key = storage::profile_image_key(user.id, OffsetDateTime::now_utc());
            state.storage.put_object(&key, bytes, "image/jpeg").await?;
            state.storage.public_url(&key)
        }
        _ => user.photo_url.clone(),
    };

    let updated = User::update_profile(
        &state.db,
        user.id,
        &email,
        &username,
        &password_hash,
        city.as_deref(),
        &photo_url,
    )
    .await?;

    info!(user_id = %updated.id, "profile updated");
    Ok(response::success_with(
        "User data has been updated successfully.",
        PublicUser::from(updated),
    ))
}

#[derive(Default)]
struct ProfileUpdate {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    city: Option<String>,
    image: Option<bytes::Bytes>,
}

async fn read_update(multipart: &mut Multipart) -> Result<ProfileUpdate, ApiError> {
    let mut update = ProfileUpdate::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("username") => update.username = Some(field.text().await.map_err(bad_multipart)?),
            Some("email") => update.email = Some(field.text().await.map_err(bad_multipart)?),
            Some("password") => update.password = Some(field.text().await.map_err(bad_multipart)?),
            Some("city") => update.city = Some(field.text().await.map_err(bad_multipart)?),
            Some("image") => update.image = Some(field.bytes().await.map_err(bad_multipart)?),
            _ => {}
        }
    }
    Ok(update)
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::validation(format!("Malformed multipart payload: {err}"))
}

/// Empty string and absent both mean "keep the stored value".
fn merge(incoming: Option<String>, prior: String) -> String {
    match incoming {
        Some(value) if !value.is_empty() => value,
        _ => prior,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_prior_when_missing_or_empty() {
        assert_eq!(merge(None, "prior".into()), "prior");
        assert_eq!(merge(Some(String::new()), "prior".into()), "prior");
        assert_eq!(merge(Some("next".into()), "prior".into()), "next");
    }

    #[tokio::test]
    async fn malformed_id_reads_as_not_found() {
        let state = AppState::fake();
        let err = require_user(&state.db, "not-a-uuid").await.unwrap_err();
        match err {
            ApiError::NotFound(message) => {
                assert_eq!(message, "User with ID not-a-uuid not found.")
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
