use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, SignupRequest},
        password::{hash_password, verify_password},
        session, validate,
    },
    error::ApiError,
    response::{self, Envelope},
    state::AppState,
    users::{dto::PublicUser, repo::User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session_check))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Envelope<PublicUser>>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if let Err(rule) =
        validate::validate_signup(&payload.email, &payload.username, &payload.password)
    {
        warn!(email = %payload.email, rule, "signup rejected");
        return Err(ApiError::validation(rule));
    }

    let hash = hash_password(&payload.password)?;
    let created = User::create(
        &state.db,
        &payload.email,
        &payload.username,
        &hash,
        payload.city.as_deref(),
    )
    .await?;

    let Some(user) = created else {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::validation("Email is already registered."));
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(response::created(
        "User registered successfully.",
        PublicUser::from(user),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Envelope<PublicUser>>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::auth("Email is not registered.")
        })?;

    let ok = verify_password(&payload.password, &user.password_hash)?;
    // Never trust a record that does not match the queried email.
    if !ok || user.email != payload.email {
        warn!(user_id = %user.id, "login invalid credentials");
        return Err(ApiError::auth("Invalid email or password."));
    }

    let headers = session::issue_headers(user.id)?;
    info!(user_id = %user.id, "user logged in");
    let (status, body) = response::success_with("Login successful.", PublicUser::from(user));
    Ok((status, headers, body))
}

#[instrument]
pub async fn logout() -> (StatusCode, HeaderMap, Json<Envelope>) {
    let headers = session::clear_headers();
    let (status, body) = response::success_message("Logout successful.");
    (status, headers, body)
}

#[instrument(skip(state, headers))]
pub async fn session_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Envelope<PublicUser>>), ApiError> {
    let user_id = session::user_id_from_headers(&headers)
        .ok_or_else(|| ApiError::auth("No active session."))?;

    let user = User::find_by_id(&state.db, user_id).await?.ok_or_else(|| {
        warn!(%user_id, "session user no longer exists");
        ApiError::auth("Session is no longer valid.")
    })?;

    Ok(response::success(PublicUser::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn signup_payload(email: &str, username: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            city: None,
        }
    }

    #[tokio::test]
    async fn signup_rejects_bad_email_before_anything_else() {
        let state = AppState::fake();
        let err = signup(
            State(state),
            Json(signup_payload("not-an-email", "ab", "short")),
        )
        .await
        .unwrap_err();
        match err {
            ApiError::Validation(message) => assert_eq!(message, "Email format is invalid."),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn signup_checks_username_after_email() {
        let state = AppState::fake();
        let err = signup(
            State(state),
            Json(signup_payload("user@example.com", "ab", "short")),
        )
        .await
        .unwrap_err();
        match err {
            ApiError::Validation(message) => {
                assert_eq!(message, "Username must be between 3 and 30 characters.")
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn signup_checks_password_last() {
        let state = AppState::fake();
        let err = signup(
            State(state),
            Json(signup_payload("user@example.com", "toothfairy", "lettersonly")),
        )
        .await
        .unwrap_err();
        match err {
            ApiError::Validation(message) => assert_eq!(
                message,
                "Password must be at least 8 characters and contain both letters and numbers."
            ),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn logout_expires_the_cookie_unconditionally() {
        let (status, headers, Json(body)) = logout().await;
        assert_eq!(status, StatusCode::OK);
        let cookie = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("set-cookie present");
        assert!(cookie.contains("Max-Age=0"));
        assert_eq!(body.message.as_deref(), Some("Logout successful."));
    }

    #[tokio::test]
    async fn session_check_without_cookie_is_unauthorized() {
        let state = AppState::fake();
        let err = session_check(State(state), HeaderMap::new())
            .await
            .unwrap_err();
        match err {
            ApiError::Auth(message) => assert_eq!(message, "No active session."),
            other => panic!("expected Auth, got {other:?}"),
        }
    }
}
