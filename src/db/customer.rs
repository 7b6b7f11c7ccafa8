//! Customer record storage.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct CustomerStore {
    pool: SqlitePool,
}

/// A customer record.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub office_address: Option<String>,
    pub actual_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub reference: Option<String>,
    pub gst_number: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Mutable customer fields, used for both insert and update.
#[derive(Debug, Clone)]
pub struct CustomerFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub office_address: Option<String>,
    pub actual_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub reference: Option<String>,
    pub gst_number: Option<String>,
}

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, email, phone_number, office_address, \
     actual_address, city, state, zip_code, reference, gst_number, created_at, updated_at";

impl CustomerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new customer. Returns the customer ID.
    pub async fn create(&self, fields: &CustomerFields) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO customers (first_name, last_name, email, phone_number, office_address, \
             actual_address, city, state, zip_code, reference, gst_number) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(&fields.office_address)
        .bind(&fields.actual_address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .bind(&fields.reference)
        .bind(&fields.gst_number)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// List all customers ordered by id.
    pub async fn list(&self) -> Result<Vec<Customer>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM customers ORDER BY id",
            CUSTOMER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Get a customer by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Customer>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE id = ?",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Check whether an email is already taken, optionally ignoring one row.
    pub async fn email_taken(
        &self,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let count: (i32,) = match exclude_id {
            Some(id) => {
                sqlx::query_as("SELECT COUNT(*) FROM customers WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM customers WHERE email = ?")
                    .bind(email)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count.0 > 0)
    }

    /// Replace all mutable fields of a customer.
    pub async fn update(&self, id: i64, fields: &CustomerFields) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE customers SET first_name = ?, last_name = ?, email = ?, phone_number = ?, \
             office_address = ?, actual_address = ?, city = ?, state = ?, zip_code = ?, \
             reference = ?, gst_number = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(&fields.office_address)
        .bind(&fields.actual_address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .bind(&fields.reference)
        .bind(&fields.gst_number)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a customer by ID.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
