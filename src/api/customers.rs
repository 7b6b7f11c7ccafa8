//! Customer API endpoints.
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

use super::error::{ApiError, FieldErrors, ResultExt, is_valid_email};
use crate::auth::Auth;
use crate::db::{CustomerFields, Database};
use crate::impl_has_auth_state;
use crate::jwt::JwtConfig;

const MAX_NAME_LENGTH: usize = 50;

/// State for customer endpoints.
#[derive(Clone)]
pub struct CustomersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_state!(CustomersState);

pub fn router(state: CustomersState) -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct CustomerPayload {
    first_name: String,
    last_name: String,
    email: String,
    phone_number: Option<String>,
    office_address: Option<String>,
    actual_address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    reference: Option<String>,
    gst_number: Option<String>,
}

impl CustomerPayload {
    fn validate(&self, errors: &mut FieldErrors) {
        if self.first_name.is_empty() {
            errors.add("first_name", "This field may not be blank");
        } else if self.first_name.len() > MAX_NAME_LENGTH {
            errors.add("first_name", "First name is too long");
        }
        if self.last_name.is_empty() {
            errors.add("last_name", "This field may not be blank");
        } else if self.last_name.len() > MAX_NAME_LENGTH {
            errors.add("last_name", "Last name is too long");
        }
        if !is_valid_email(&self.email) {
            errors.add("email", "Enter a valid email address");
        }
    }

    fn into_fields(self) -> CustomerFields {
        CustomerFields {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_number: self.phone_number,
            office_address: self.office_address,
            actual_address: self.actual_address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            reference: self.reference,
            gst_number: self.gst_number,
        }
    }
}

async fn list_customers(
    State(state): State<CustomersState>,
    Auth(_auth): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let customers = state
        .db
        .customers()
        .list()
        .await
        .db_err("Failed to list customers")?;
    Ok(Json(customers))
}

async fn create_customer(
    State(state): State<CustomersState>,
    Auth(_auth): Auth,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();
    payload.validate(&mut errors);

    if errors.is_empty()
        && state
            .db
            .customers()
            .email_taken(&payload.email, None)
            .await
            .db_err("Failed to check email")?
    {
        errors.add("email", "A customer with this email already exists");
    }

    errors.into_result()?;

    let id = state
        .db
        .customers()
        .create(&payload.into_fields())
        .await
        .db_err("Failed to create customer")?;

    let customer = state
        .db
        .customers()
        .get_by_id(id)
        .await
        .db_err("Failed to get customer")?
        .ok_or_else(|| ApiError::internal("Customer disappeared after insert"))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<CustomersState>,
    Auth(_auth): Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .db
        .customers()
        .get_by_id(id)
        .await
        .db_err("Failed to get customer")?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;
    Ok(Json(customer))
}

async fn update_customer(
    State(state): State<CustomersState>,
    Auth(_auth): Auth,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .customers()
        .get_by_id(id)
        .await
        .db_err("Failed to get customer")?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    let mut errors = FieldErrors::new();
    payload.validate(&mut errors);

    if errors.is_empty()
        && state
            .db
            .customers()
            .email_taken(&payload.email, Some(id))
            .await
            .db_err("Failed to check email")?
    {
        errors.add("email", "A customer with this email already exists");
    }

    errors.into_result()?;

    state
        .db
        .customers()
        .update(id, &payload.into_fields())
        .await
        .db_err("Failed to update customer")?;

    let customer = state
        .db
        .customers()
        .get_by_id(id)
        .await
        .db_err("Failed to get customer")?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<CustomersState>,
    Auth(_auth): Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .customers()
        .delete(id)
        .await
        .db_err("Failed to delete customer")?;

    if !deleted {
        return Err(ApiError::not_found("Customer not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
