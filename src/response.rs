use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// The response shape every endpoint speaks: `{status, message?, data?, error?}`.
/// `status` is `success` for 2xx, `fail` for expected 4xx conditions and
/// `error` for internal failures.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize = ()> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn success_with(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn success_message(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail",
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    pub fn error(cause: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: Some("Internal server error.".to_string()),
            data: None,
            error: Some(cause.into()),
        }
    }
}

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::success(data)))
}

pub fn success_message(message: impl Into<String>) -> (StatusCode, Json<Envelope>) {
    (StatusCode::OK, Json(Envelope::success_message(message)))
}

pub fn success_with<T: Serialize>(
    message: impl Into<String>,
    data: T,
) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::success_with(message, data)))
}

pub fn created<T: Serialize>(
    message: impl Into<String>,
    data: T,
) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::success_with(message, data)))
}

pub fn fail(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Envelope>) {
    (status, Json(Envelope::fail(message)))
}

const REWRITE_BODY_LIMIT: usize = 64 * 1024;

/// Last line of defense: any error response the framework produced on its
/// own (extractor rejections, method mismatches, oversized bodies) leaves as
/// plain text. Rewrap it so clients only ever see the envelope. Responses
/// that already carry JSON are ours and pass through untouched.
pub async fn envelope_rewrite(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let already_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if already_json {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = match axum::body::to_bytes(body, REWRITE_BODY_LIMIT).await {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).into_owned(),
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };

    if status.is_server_error() {
        (parts.status, Json(Envelope::<()>::error(message))).into_response()
    } else {
        (parts.status, Json(Envelope::<()>::fail(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_carries_data_only() {
        let json = serde_json::to_value(Envelope::success(serde_json::json!({"id": 1}))).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("message").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn fail_envelope_carries_message_only() {
        let json = serde_json::to_value(Envelope::fail("User with ID abc not found.")).unwrap();
        assert_eq!(json["status"], "fail");
        assert_eq!(json["message"], "User with ID abc not found.");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn error_envelope_reports_fixed_message_and_cause() {
        let json = serde_json::to_value(Envelope::error("connection refused")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Internal server error.");
        assert_eq!(json["error"], "connection refused");
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), REWRITE_BODY_LIMIT)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn framework_text_errors_are_rewrapped_as_fail() {
        let raw = (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
        let rewritten = envelope_rewrite(raw).await;
        assert_eq!(rewritten.status(), StatusCode::METHOD_NOT_ALLOWED);

        let json = body_json(rewritten).await;
        assert_eq!(json["status"], "fail");
        assert_eq!(json["message"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn framework_server_errors_are_rewrapped_as_error() {
        let raw = (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        let json = body_json(envelope_rewrite(raw).await).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Internal server error.");
        assert_eq!(json["error"], "boom");
    }

    #[tokio::test]
    async fn domain_json_responses_pass_through() {
        let raw = fail(StatusCode::NOT_FOUND, "User with ID abc not found.").into_response();
        let json = body_json(envelope_rewrite(raw).await).await;
        assert_eq!(json["status"], "fail");
        assert_eq!(json["message"], "User with ID abc not found.");
    }

    #[tokio::test]
    async fn successes_are_untouched() {
        let raw = success(serde_json::json!({"ok": true})).into_response();
        let rewritten = envelope_rewrite(raw).await;
        assert_eq!(rewritten.status(), StatusCode::OK);
        let json = body_json(rewritten).await;
        assert_eq!(json["data"]["ok"], true);
    }
}
