use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::histories::repo::History;

/// One prediction record on the wire. `image_url` is presigned per request;
/// the stored object key never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub id: Uuid,
    pub id_user: Uuid,
    pub label: String,
    pub confidence_score: f64,
    pub suggestion: String,
    pub explanation: String,
    pub image_url: Option<String>,
    pub clinic: serde_json::Value,
    pub products: serde_json::Value,
    pub articles: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl HistoryResponse {
    pub fn from_record(record: History, image_url: Option<String>) -> Self {
        Self {
            id: record.id,
            id_user: record.user_id,
            label: record.label,
            confidence_score: record.confidence_score,
            suggestion: record.suggestion,
            explanation: record.explanation,
            image_url,
            clinic: record.clinic,
            products: record.products,
            articles: record.articles,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape_is_camel_case() {
        let record = History {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            label: "Caries".into(),
            confidence_score: 87.5,
            image_key: Some("predict-result/image/abc-123.jpg".into()),
            explanation: "Decayed areas of the tooth surface.".into(),
            suggestion: "Visit a dentist.".into(),
            clinic: json!({"name": "Klinik Sehat"}),
            products: json!([{"name": "Fluoride toothpaste"}]),
            articles: json!([{"title": "Understanding caries"}]),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        let value = serde_json::to_value(HistoryResponse::from_record(
            record,
            Some("https://signed.example/abc".into()),
        ))
        .unwrap();

        assert_eq!(value["confidenceScore"], 87.5);
        assert_eq!(value["imageUrl"], "https://signed.example/abc");
        assert!(value.get("idUser").is_some());
        assert!(value.get("image_key").is_none());
        assert_eq!(value["createdAt"], "1970-01-01T00:00:00Z");
    }
}
