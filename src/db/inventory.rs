//! Product and per-location stock storage.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ProductStore {
    pool: SqlitePool,
}

/// A product record.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub unit_price: f64,
    pub card_rate: f64,
    pub replacement_rate: f64,
    pub weight: f64,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Mutable product fields, used for both insert and update.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub category: Option<String>,
    pub unit_price: f64,
    pub card_rate: f64,
    pub replacement_rate: f64,
    pub weight: f64,
    pub description: String,
}

const PRODUCT_COLUMNS: &str = "id, name, category, unit_price, card_rate, replacement_rate, \
     weight, description, created_at, updated_at";

impl ProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new product. Returns the product ID.
    pub async fn create(&self, fields: &ProductFields) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO products (name, category, unit_price, card_rate, replacement_rate, \
             weight, description) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(fields.unit_price)
        .bind(fields.card_rate)
        .bind(fields.replacement_rate)
        .bind(fields.weight)
        .bind(&fields.description)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// List all products ordered by id.
    pub async fn list(&self) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM products ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Get a product by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Replace all mutable fields of a product.
    pub async fn update(&self, id: i64, fields: &ProductFields) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE products SET name = ?, category = ?, unit_price = ?, card_rate = ?, \
             replacement_rate = ?, weight = ?, description = ?, updated_at = datetime('now') \
             WHERE id = ?",
        )
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(fields.unit_price)
        .bind(fields.card_rate)
        .bind(fields.replacement_rate)
        .bind(fields.weight)
        .bind(&fields.description)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a product by ID. Stock rows cascade.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct ProductStockStore {
    pool: SqlitePool,
}

/// A per-location stock record.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ProductStock {
    pub id: i64,
    pub product_id: i64,
    pub location: String,
    pub quantity: i64,
    pub last_updated: String,
}

impl ProductStockStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new stock record. Returns the stock ID.
    pub async fn create(
        &self,
        product_id: i64,
        location: &str,
        quantity: i64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO product_stock (product_id, location, quantity) VALUES (?, ?, ?)",
        )
        .bind(product_id)
        .bind(location)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// List all stock records ordered by id.
    pub async fn list(&self) -> Result<Vec<ProductStock>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, product_id, location, quantity, last_updated FROM product_stock \
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Get a stock record by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<ProductStock>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, product_id, location, quantity, last_updated FROM product_stock \
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Replace the mutable fields of a stock record.
    pub async fn update(
        &self,
        id: i64,
        product_id: i64,
        location: &str,
        quantity: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE product_stock SET product_id = ?, location = ?, quantity = ?, \
             last_updated = datetime('now') WHERE id = ?",
        )
        .bind(product_id)
        .bind(location)
        .bind(quantity)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a stock record by ID.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM product_stock WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
