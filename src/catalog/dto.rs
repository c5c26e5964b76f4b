use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::normalize::{normalize_image, normalize_keys, normalize_rating};
use crate::catalog::repo::{Article, Clinic, Product};

/// Display shapes with the legacy fields already canonicalized: image always
/// present, rating always a number, keys always a list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCard {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub keys: Vec<String>,
    pub disease: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub keys: Vec<String>,
    pub price: Option<f64>,
    pub rating: f64,
    pub disease: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicCard {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub image_url: String,
    pub rating: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Article> for ArticleCard {
    fn from(row: Article) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            image_url: normalize_image(row.image_url),
            keys: normalize_keys(row.keys.as_ref()),
            disease: row.disease,
            created_at: row.created_at,
        }
    }
}

impl From<Product> for ProductCard {
    fn from(row: Product) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            image_url: normalize_image(row.image_url),
            keys: normalize_keys(row.keys.as_ref()),
            price: row.price,
            rating: normalize_rating(row.rating),
            disease: row.disease,
            created_at: row.created_at,
        }
    }
}

impl From<Clinic> for ClinicCard {
    fn from(row: Clinic) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            city: row.city,
            image_url: normalize_image(row.image_url),
            rating: normalize_rating(row.rating),
            created_at: row.created_at,
        }
    }
}
