use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Reference data rows. Read-only through the API; rows are seeded by an
/// out-of-band content pipeline, which is why the display fields are loose.
#[derive(Debug, Clone, FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub keys: Option<serde_json::Value>,
    pub disease: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub keys: Option<serde_json::Value>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub disease: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub created_at: OffsetDateTime,
}

impl Article {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, Article>(
            "SELECT id, title, description, image_url, keys, disease, created_at FROM articles",
        )
        .fetch_all(db)
        .await
        .context("list articles")?;
        Ok(rows)
    }

    pub async fn find_by_opaque_id(db: &PgPool, id: &str) -> anyhow::Result<Option<Article>> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, description, image_url, keys, disease, created_at
              FROM articles
             WHERE id = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(db)
        .await
        .context("find article")?;
        Ok(row)
    }

    pub async fn by_disease(db: &PgPool, disease: &str) -> anyhow::Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, description, image_url, keys, disease, created_at
              FROM articles
             WHERE disease = $1
            "#,
        )
        .bind(disease)
        .fetch_all(db)
        .await
        .context("list articles by disease")?;
        Ok(rows)
    }
}

impl Product {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, image_url, keys, price, rating, disease, created_at
              FROM products
            "#,
        )
        .fetch_all(db)
        .await
        .context("list products")?;
        Ok(rows)
    }

    pub async fn find_by_opaque_id(db: &PgPool, id: &str) -> anyhow::Result<Option<Product>> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, image_url, keys, price, rating, disease, created_at
              FROM products
             WHERE id = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(db)
        .await
        .context("find product")?;
        Ok(row)
    }

    pub async fn by_disease(db: &PgPool, disease: &str) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, image_url, keys, price, rating, disease, created_at
              FROM products
             WHERE disease = $1
            "#,
        )
        .bind(disease)
        .fetch_all(db)
        .await
        .context("list products by disease")?;
        Ok(rows)
    }
}

impl Clinic {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Clinic>> {
        let rows = sqlx::query_as::<_, Clinic>(
            "SELECT id, name, address, city, image_url, rating, created_at FROM clinics",
        )
        .fetch_all(db)
        .await
        .context("list clinics")?;
        Ok(rows)
    }

    pub async fn find_by_opaque_id(db: &PgPool, id: &str) -> anyhow::Result<Option<Clinic>> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, Clinic>(
            r#"
            SELECT id, name, address, city, image_url, rating, created_at
              FROM clinics
             WHERE id = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(db)
        .await
        .context("find clinic")?;
        Ok(row)
    }

    pub async fn by_city(db: &PgPool, city: &str) -> anyhow::Result<Vec<Clinic>> {
        let rows = sqlx::query_as::<_, Clinic>(
            r#"
            SELECT id, name, address, city, image_url, rating, created_at
              FROM clinics
             WHERE city = $1
            "#,
        )
        .bind(city)
        .fetch_all(db)
        .await
        .context("list clinics by city")?;
        Ok(rows)
    }
}
