use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::User;

/// Public part of the user returned to the client. The password hash never
/// leaves the repo layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub city: Option<String>,
    pub profile_image_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            city: user.city,
            profile_image_url: user.photo_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
