use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use stockroom_catalog::{Price, Product, ProductDraft, ProductId, ProductPatch};
use stockroom_core::service::DEFAULT_LIST_LIMIT;
use uuid::Uuid;

use crate::auth::PRODUCTS_READ;
use crate::{error::AppError, state::AppState};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

impl TryFrom<CreateProductRequest> for ProductDraft {
    type Error = AppError;

    fn try_from(req: CreateProductRequest) -> Result<Self, Self::Error> {
        Ok(ProductDraft {
            name: req.name,
            description: req.description,
            price: parse_price(req.price)?,
            stock: parse_stock(req.stock)?,
        })
    }
}

impl TryFrom<UpdateProductRequest> for ProductPatch {
    type Error = AppError;

    fn try_from(req: UpdateProductRequest) -> Result<Self, Self::Error> {
        Ok(ProductPatch {
            name: req.name,
            description: req.description,
            price: req.price.map(parse_price).transpose()?,
            stock: req.stock.map(parse_stock).transpose()?,
        })
    }
}

fn parse_price(amount: Decimal) -> Result<Price, AppError> {
    Price::new(amount).map_err(|e| AppError::ValidationError(e.to_string()))
}

fn parse_stock(stock: i64) -> Result<u32, AppError> {
    u32::try_from(stock).map_err(|_| AppError::ValidationError(format!("stock must be a non-negative integer, got {stock}")))
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

fn parse_limit(raw: Option<&str>) -> Result<u32, AppError> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_LIST_LIMIT);
    };
    let limit: i64 = raw
        .parse()
        .map_err(|e| AppError::ValidationError(format!("error parsing limit: limit must be an integer: {e}")))?;
    if limit <= 0 {
        return Err(AppError::ValidationError(
            "error parsing limit: limit must be a positive number".to_string(),
        ));
    }
    Ok(u32::try_from(limit).unwrap_or(u32::MAX))
}

fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    Uuid::parse_str(raw)
        .map(|_| ProductId::new(raw))
        .map_err(|_| AppError::ValidationError(format!("invalid product id: {raw}")))
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let products = state.products.list_products(limit).await?;
    let token = state.tokens.issue(PRODUCTS_READ)?;

    Ok(([(header::AUTHORIZATION, format!("Bearer {token}"))], Json(products)))
}

async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let Json(req) = body?;
    let product = state.products.create_product(req.try_into()?).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>, AppError> {
    let id = parse_product_id(&id)?;
    Ok(Json(state.products.get_product(&id).await?))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let id = parse_product_id(&id)?;
    let Json(req) = body?;
    let product = state.products.update_product(&id, req.try_into()?).await?;

    Ok(Json(product))
}

async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    let id = parse_product_id(&id)?;
    state.products.delete_product(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None).unwrap(), 10);
        assert_eq!(parse_limit(Some("")).unwrap(), 10);
        assert_eq!(parse_limit(Some("3")).unwrap(), 3);
        assert!(parse_limit(Some("0")).is_err());
        assert!(parse_limit(Some("-1")).is_err());
        assert!(parse_limit(Some("ten")).is_err());
    }

    #[test]
    fn test_product_id_must_be_uuid() {
        assert!(parse_product_id("076e76d6-fc3e-4f95-a024-1b4984e76060").is_ok());
        assert!(parse_product_id("product-123").is_err());
    }
}
