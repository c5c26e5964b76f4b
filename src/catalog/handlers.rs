use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    catalog::{
        dto::{ArticleCard, ClinicCard, ProductCard},
        repo::{Article, Clinic, Product},
    },
    error::ApiError,
    response::{self, Envelope},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/:id_article", get(get_article))
        .route("/products", get(list_products))
        .route("/products/:id_product", get(get_product))
        .route("/clinics", get(list_clinics))
        .route("/clinics/:id_clinic", get(get_clinic))
}

#[instrument(skip(state))]
pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Envelope<Vec<ArticleCard>>>), ApiError> {
    let rows = Article::list(&state.db).await?;
    Ok(response::success(
        rows.into_iter().map(ArticleCard::from).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_article(
    State(state): State<AppState>,
    Path(id_article): Path<String>,
) -> Result<(StatusCode, Json<Envelope<ArticleCard>>), ApiError> {
    let row = Article::find_by_opaque_id(&state.db, &id_article)
        .await?
        .ok_or_else(|| ApiError::not_found("Article", &id_article))?;
    Ok(response::success(ArticleCard::from(row)))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Envelope<Vec<ProductCard>>>), ApiError> {
    let rows = Product::list(&state.db).await?;
    Ok(response::success(
        rows.into_iter().map(ProductCard::from).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id_product): Path<String>,
) -> Result<(StatusCode, Json<Envelope<ProductCard>>), ApiError> {
    let row = Product::find_by_opaque_id(&state.db, &id_product)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id_product))?;
    Ok(response::success(ProductCard::from(row)))
}

#[instrument(skip(state))]
pub async fn list_clinics(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Envelope<Vec<ClinicCard>>>), ApiError> {
    let rows = Clinic::list(&state.db).await?;
    Ok(response::success(
        rows.into_iter().map(ClinicCard::from).collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_clinic(
    State(state): State<AppState>,
    Path(id_clinic): Path<String>,
) -> Result<(StatusCode, Json<Envelope<ClinicCard>>), ApiError> {
    let row = Clinic::find_by_opaque_id(&state.db, &id_clinic)
        .await?
        .ok_or_else(|| ApiError::not_found("Clinic", &id_clinic))?;
    Ok(response::success(ClinicCard::from(row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn catalog_misses_name_id_and_resource_type() {
        let state = AppState::fake();

        let err = get_article(State(state.clone()), Path("bogus".into()))
            .await
            .unwrap_err();
        match err {
            ApiError::NotFound(message) => assert_eq!(message, "Article with ID bogus not found."),
            other => panic!("expected NotFound, got {other:?}"),
        }

        let err = get_clinic(State(state), Path("bogus".into()))
            .await
            .unwrap_err();
        match err {
            ApiError::NotFound(message) => assert_eq!(message, "Clinic with ID bogus not found."),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
