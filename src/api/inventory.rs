//! Product and stock API endpoints.
//!
//! All endpoints require JWT authentication.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, FieldErrors, ResultExt};
use crate::auth::Auth;
use crate::db::{Database, ProductFields};
use crate::impl_has_auth_state;
use crate::jwt::JwtConfig;

/// State for product and stock endpoints.
#[derive(Clone)]
pub struct InventoryState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_state!(InventoryState);

pub fn products_router(state: InventoryState) -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(state)
}

pub fn stock_router(state: InventoryState) -> Router {
    Router::new()
        .route("/", get(list_stock).post(create_stock))
        .route("/{id}", get(get_stock).put(update_stock).delete(delete_stock))
        .with_state(state)
}

// --- Products ---

#[derive(Deserialize)]
struct ProductPayload {
    name: String,
    category: Option<String>,
    unit_price: f64,
    card_rate: f64,
    replacement_rate: f64,
    weight: f64,
    description: String,
}

impl ProductPayload {
    fn validate(&self, errors: &mut FieldErrors) {
        if self.name.is_empty() {
            errors.add("name", "This field may not be blank");
        }
        if self.description.is_empty() {
            errors.add("description", "This field may not be blank");
        }
        for (field, value) in [
            ("unit_price", self.unit_price),
            ("card_rate", self.card_rate),
            ("replacement_rate", self.replacement_rate),
            ("weight", self.weight),
        ] {
            if !value.is_finite() {
                errors.add(field, "Enter a valid number");
            }
        }
    }

    fn into_fields(self) -> ProductFields {
        ProductFields {
            name: self.name,
            category: self.category,
            unit_price: self.unit_price,
            card_rate: self.card_rate,
            replacement_rate: self.replacement_rate,
            weight: self.weight,
            description: self.description,
        }
    }
}

async fn list_products(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .db
        .products()
        .list()
        .await
        .db_err("Failed to list products")?;
    Ok(Json(products))
}

async fn create_product(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();
    payload.validate(&mut errors);
    errors.into_result()?;

    let id = state
        .db
        .products()
        .create(&payload.into_fields())
        .await
        .db_err("Failed to create product")?;

    let product = state
        .db
        .products()
        .get_by_id(id)
        .await
        .db_err("Failed to get product")?
        .ok_or_else(|| ApiError::internal("Product disappeared after insert"))?;

    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await
        .db_err("Failed to get product")?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(product))
}

async fn update_product(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
    Path(id): Path<i64>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();
    payload.validate(&mut errors);
    errors.into_result()?;

    let updated = state
        .db
        .products()
        .update(id, &payload.into_fields())
        .await
        .db_err("Failed to update product")?;

    if !updated {
        return Err(ApiError::not_found("Product not found"));
    }

    let product = state
        .db
        .products()
        .get_by_id(id)
        .await
        .db_err("Failed to get product")?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(product))
}

async fn delete_product(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .products()
        .delete(id)
        .await
        .db_err("Failed to delete product")?;

    if !deleted {
        return Err(ApiError::not_found("Product not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// --- Product stock ---

#[derive(Deserialize)]
struct StockPayload {
    product_id: i64,
    location: String,
    quantity: i64,
}

impl StockPayload {
    /// Field checks plus a foreign-key pre-check so a bad product_id comes
    /// back as a field error rather than a database error.
    async fn validate(&self, db: &Database, errors: &mut FieldErrors) -> Result<(), ApiError> {
        if self.location.is_empty() {
            errors.add("location", "This field may not be blank");
        }
        if db
            .products()
            .get_by_id(self.product_id)
            .await
            .db_err("Failed to check product")?
            .is_none()
        {
            errors.add("product_id", "Product not found");
        }
        Ok(())
    }
}

async fn list_stock(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let stock = state
        .db
        .product_stock()
        .list()
        .await
        .db_err("Failed to list stock")?;
    Ok(Json(stock))
}

async fn create_stock(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
    Json(payload): Json<StockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();
    payload.validate(&state.db, &mut errors).await?;
    errors.into_result()?;

    let id = state
        .db
        .product_stock()
        .create(payload.product_id, &payload.location, payload.quantity)
        .await
        .db_err("Failed to create stock record")?;

    let stock = state
        .db
        .product_stock()
        .get_by_id(id)
        .await
        .db_err("Failed to get stock record")?
        .ok_or_else(|| ApiError::internal("Stock record disappeared after insert"))?;

    Ok((StatusCode::CREATED, Json(stock)))
}

async fn get_stock(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let stock = state
        .db
        .product_stock()
        .get_by_id(id)
        .await
        .db_err("Failed to get stock record")?
        .ok_or_else(|| ApiError::not_found("Stock record not found"))?;
    Ok(Json(stock))
}

async fn update_stock(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
    Path(id): Path<i64>,
    Json(payload): Json<StockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();
    payload.validate(&state.db, &mut errors).await?;
    errors.into_result()?;

    let updated = state
        .db
        .product_stock()
        .update(id, payload.product_id, &payload.location, payload.quantity)
        .await
        .db_err("Failed to update stock record")?;

    if !updated {
        return Err(ApiError::not_found("Stock record not found"));
    }

    let stock = state
        .db
        .product_stock()
        .get_by_id(id)
        .await
        .db_err("Failed to get stock record")?
        .ok_or_else(|| ApiError::not_found("Stock record not found"))?;

    Ok(Json(stock))
}

async fn delete_stock(
    State(state): State<InventoryState>,
    Auth(_auth): Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .product_stock()
        .delete(id)
        .await
        .db_err("Failed to delete stock record")?;

    if !deleted {
        return Err(ApiError::not_found("Stock record not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
