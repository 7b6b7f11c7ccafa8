mod auth;
mod customers;
mod error;
mod inventory;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;

pub use auth::AuthState;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    secure_cookies: bool,
    rotate_refresh_tokens: bool,
) -> Router {
    let auth_state = auth::AuthState {
        db: db.clone(),
        jwt: jwt.clone(),
        secure_cookies,
        rotate_refresh_tokens,
    };

    let customers_state = customers::CustomersState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let inventory_state = inventory::InventoryState { db, jwt };

    Router::new()
        .merge(auth::router(auth_state))
        .nest("/customers", customers::router(customers_state))
        .nest(
            "/products",
            inventory::products_router(inventory_state.clone()),
        )
        .nest("/product-stock", inventory::stock_router(inventory_state))
}
