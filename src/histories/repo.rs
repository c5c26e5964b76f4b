use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One past prediction, with the enrichment snapshots frozen at predict time.
#[derive(Debug, Clone, FromRow)]
pub struct History {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub confidence_score: f64,
    pub image_key: Option<String>,
    pub explanation: String,
    pub suggestion: String,
    pub clinic: serde_json::Value,
    pub products: serde_json::Value,
    pub articles: serde_json::Value,
    pub created_at: OffsetDateTime,
}

/// Insert payload. The id is chosen by the caller because the stored image
/// key embeds it before the row exists.
pub struct NewHistory<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: &'a str,
    pub confidence_score: f64,
    pub image_key: Option<&'a str>,
    pub explanation: &'a str,
    pub suggestion: &'a str,
    pub clinic: serde_json::Value,
    pub products: serde_json::Value,
    pub articles: serde_json::Value,
}

impl History {
    pub async fn insert(db: &PgPool, new: NewHistory<'_>) -> anyhow::Result<History> {
        let record = sqlx::query_as::<_, History>(
            r#"
            INSERT INTO histories
                (id, user_id, label, confidence_score, image_key,
                 explanation, suggestion, clinic, products, articles)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, user_id, label, confidence_score, image_key,
                      explanation, suggestion, clinic, products, articles, created_at
            "#,
        )
        .bind(new.id)
        .bind(new.user_id)
        .bind(new.label)
        .bind(new.confidence_score)
        .bind(new.image_key)
        .bind(new.explanation)
        .bind(new.suggestion)
        .bind(new.clinic)
        .bind(new.products)
        .bind(new.articles)
        .fetch_one(db)
        .await
        .context("insert history")?;
        Ok(record)
    }

    /// All records for one user, newest first.
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<History>> {
        let records = sqlx::query_as::<_, History>(
            r#"
            SELECT id, user_id, label, confidence_score, image_key,
                   explanation, suggestion, clinic, products, articles, created_at
              FROM histories
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list histories by user")?;
        Ok(records)
    }

    pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<History>> {
        let record = sqlx::query_as::<_, History>(
            r#"
            SELECT id, user_id, label, confidence_score, image_key,
                   explanation, suggestion, clinic, products, articles, created_at
              FROM histories
             WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(user_id)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find history")?;
        Ok(record)
    }

    /// Same lenient id treatment as the user lookup: a non-UUID id is absent.
    pub async fn find_by_opaque_id(
        db: &PgPool,
        user_id: Uuid,
        id: &str,
    ) -> anyhow::Result<Option<History>> {
        match Uuid::parse_str(id) {
            Ok(uuid) => Self::find(db, user_id, uuid).await,
            Err(_) => Ok(None),
        }
    }

    pub async fn ids_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as::<_, (Uuid,)>("SELECT id FROM histories WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(db)
                .await
                .context("list history ids by user")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Delete one record; `false` when nothing matched.
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM histories WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(db)
            .await
            .context("delete history")?;
        Ok(result.rows_affected() > 0)
    }
}
