use anyhow::Context;
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::catalog::{
    dto::{ArticleCard, ClinicCard, ProductCard},
    repo::{Article, Clinic, Product},
};

/// At most this many articles/products ride along with one prediction.
pub const MAX_MATCHES: usize = 3;

pub const CLINIC_FALLBACK: &str = "No partner clinic is available in your city yet.";
pub const PRODUCTS_FALLBACK: &str =
    "No product recommendations are available for this condition yet.";
pub const ARTICLES_FALLBACK: &str = "No related articles are available for this condition yet.";

/// JSONB snapshots stored on the history record and echoed in the predict
/// response. Every key is always present; misses carry a message payload
/// instead of disappearing.
pub struct Enrichment {
    pub clinic: Value,
    pub products: Value,
    pub articles: Value,
}

pub async fn enrich(db: &PgPool, label: &str, city: Option<&str>) -> anyhow::Result<Enrichment> {
    let (articles, products, clinics) = tokio::try_join!(
        Article::by_disease(db, label),
        Product::by_disease(db, label),
        clinics_for(db, city),
    )?;

    let article_cards: Vec<ArticleCard> = pick_up_to(&articles, MAX_MATCHES)
        .into_iter()
        .map(ArticleCard::from)
        .collect();
    let product_cards: Vec<ProductCard> = pick_up_to(&products, MAX_MATCHES)
        .into_iter()
        .map(ProductCard::from)
        .collect();
    let clinic_card = pick_one(&clinics).map(ClinicCard::from);

    Ok(Enrichment {
        clinic: clinic_snapshot(clinic_card)?,
        products: list_snapshot(product_cards, PRODUCTS_FALLBACK)?,
        articles: list_snapshot(article_cards, ARTICLES_FALLBACK)?,
    })
}

/// A user without a city cannot be matched to a clinic; that is a fallback,
/// not an error.
async fn clinics_for(db: &PgPool, city: Option<&str>) -> anyhow::Result<Vec<Clinic>> {
    match city {
        Some(city) => Clinic::by_city(db, city).await,
        None => Ok(Vec::new()),
    }
}

fn pick_up_to<T: Clone>(items: &[T], count: usize) -> Vec<T> {
    let mut rng = rand::thread_rng();
    items.choose_multiple(&mut rng, count).cloned().collect()
}

fn pick_one<T: Clone>(items: &[T]) -> Option<T> {
    let mut rng = rand::thread_rng();
    items.choose(&mut rng).cloned()
}

fn clinic_snapshot(clinic: Option<ClinicCard>) -> anyhow::Result<Value> {
    Ok(match clinic {
        Some(card) => serde_json::to_value(card).context("serialize clinic snapshot")?,
        None => json!({ "message": CLINIC_FALLBACK }),
    })
}

fn list_snapshot<T: Serialize>(items: Vec<T>, fallback: &str) -> anyhow::Result<Value> {
    Ok(if items.is_empty() {
        json!([{ "message": fallback }])
    } else {
        serde_json::to_value(items).context("serialize snapshot list")?
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn clinic(name: &str) -> Clinic {
        Clinic {
            id: Uuid::new_v4(),
            name: name.into(),
            address: "Jl. Merdeka 1".into(),
            city: "Bandung".into(),
            image_url: None,
            rating: Some(4.0),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn sampler_is_bounded_and_draws_from_the_source() {
        let items: Vec<i32> = (0..10).collect();
        let picked = pick_up_to(&items, MAX_MATCHES);
        assert_eq!(picked.len(), MAX_MATCHES);
        assert!(picked.iter().all(|v| items.contains(v)));

        assert_eq!(pick_up_to(&items[..2], MAX_MATCHES).len(), 2);
        assert!(pick_up_to::<i32>(&[], MAX_MATCHES).is_empty());
    }

    #[test]
    fn empty_lists_fall_back_to_a_message_entry() {
        let snapshot = list_snapshot(Vec::<ClinicCard>::new(), PRODUCTS_FALLBACK).unwrap();
        assert_eq!(snapshot, json!([{ "message": PRODUCTS_FALLBACK }]));
    }

    #[test]
    fn populated_lists_serialize_as_is() {
        let cards = vec![ClinicCard::from(clinic("Klinik A"))];
        let snapshot = list_snapshot(cards, CLINIC_FALLBACK).unwrap();
        let entries = snapshot.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["name"], "Klinik A");
    }

    #[test]
    fn missing_clinic_is_an_object_not_a_list() {
        let snapshot = clinic_snapshot(None).unwrap();
        assert!(snapshot.is_object());
        assert_eq!(snapshot["message"], CLINIC_FALLBACK);

        let snapshot = clinic_snapshot(Some(ClinicCard::from(clinic("Klinik B")))).unwrap();
        assert_eq!(snapshot["name"], "Klinik B");
    }
}
