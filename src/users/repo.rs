use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Profile image every fresh account starts with.
pub const DEFAULT_PROFILE_IMAGE: &str =
    "https://storage.dentascan.app/assets/default-profile.jpg";

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub city: Option<String>,
    pub photo_url: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Create a new user with hashed password. The insert is conditional on
    /// the unique email index, so two concurrent signups cannot both win;
    /// `None` means the email is already taken.
    pub async fn create(
        db: &PgPool,
        email: &str,
        username: &str,
        password_hash: &str,
        city: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash, city, photo_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, username, password_hash, city, photo_url, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(city)
        .bind(DEFAULT_PROFILE_IMAGE)
        .fetch_optional(db)
        .await
        .context("create user")?;
        Ok(user)
    }

    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, city, photo_url, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, city, photo_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Look a user up by the opaque id clients send. An id that does not
    /// parse as a UUID cannot exist, so it reads as absent rather than as a
    /// malformed request.
    pub async fn find_by_opaque_id(db: &PgPool, id: &str) -> anyhow::Result<Option<User>> {
        match Uuid::parse_str(id) {
            Ok(uuid) => Self::find_by_id(db, uuid).await,
            Err(_) => Ok(None),
        }
    }

    /// Overwrite the mutable profile fields and stamp `updated_at`. Callers
    /// pass the already merged values.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        email: &str,
        username: &str,
        password_hash: &str,
        city: Option<&str>,
        photo_url: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email = $2,
                   username = $3,
                   password_hash = $4,
                   city = $5,
                   photo_url = $6,
                   updated_at = now()
             WHERE id = $1
            RETURNING id, email, username, password_hash, city, photo_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(city)
        .bind(photo_url)
        .fetch_one(db)
        .await
        .context("update user profile")?;
        Ok(user)
    }
}
