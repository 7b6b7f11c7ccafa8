mod blacklist;
mod customer;
mod inventory;
mod user;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

pub use blacklist::BlacklistStore;
pub use customer::{Customer, CustomerFields, CustomerStore};
pub use inventory::{Product, ProductFields, ProductStock, ProductStockStore, ProductStore};
pub use user::{NewUser, Role, User, UserStore};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        let options = SqliteConnectOptions::from_str(&url)?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                // Users table
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    password_hash TEXT NOT NULL,
                    first_name TEXT NOT NULL DEFAULT '',
                    last_name TEXT NOT NULL DEFAULT '',
                    role TEXT NOT NULL DEFAULT 'employee',
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_users_username ON users(username)",
                "CREATE INDEX idx_users_email ON users(email)",
                // Revoked refresh token identifiers
                "CREATE TABLE blacklisted_tokens (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    jti TEXT UNIQUE NOT NULL,
                    expires_at TEXT NOT NULL,
                    blacklisted_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_blacklisted_tokens_jti ON blacklisted_tokens(jti)",
                "CREATE INDEX idx_blacklisted_tokens_expires_at ON blacklisted_tokens(expires_at)",
                // Customers table
                "CREATE TABLE customers (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    phone_number TEXT,
                    office_address TEXT,
                    actual_address TEXT,
                    city TEXT,
                    state TEXT,
                    zip_code TEXT,
                    reference TEXT,
                    gst_number TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_customers_email ON customers(email)",
                // Products table
                "CREATE TABLE products (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    category TEXT,
                    unit_price REAL NOT NULL,
                    card_rate REAL NOT NULL,
                    replacement_rate REAL NOT NULL,
                    weight REAL NOT NULL,
                    description TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_products_name ON products(name)",
                // Per-location stock levels
                "CREATE TABLE product_stock (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                    location TEXT NOT NULL,
                    quantity INTEGER NOT NULL,
                    last_updated TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_product_stock_product_id ON product_stock(product_id)",
            ],
        )
        .await
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the blacklist store.
    pub fn blacklist(&self) -> BlacklistStore {
        BlacklistStore::new(self.pool.clone())
    }

    /// Get the customer store.
    pub fn customers(&self) -> CustomerStore {
        CustomerStore::new(self.pool.clone())
    }

    /// Get the product store.
    pub fn products(&self) -> ProductStore {
        ProductStore::new(self.pool.clone())
    }

    /// Get the product stock store.
    pub fn product_stock(&self) -> ProductStockStore {
        ProductStockStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$fake-hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Employee,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db
            .users()
            .create(&test_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let user = db.users().get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::Employee);
        assert!(user.is_active);

        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_duplicate_username_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.users()
            .create(&test_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let result = db
            .users()
            .create(&test_user("alice", "other@example.com"))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.users()
            .create(&test_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let result = db
            .users()
            .create(&test_user("bob", "alice@example.com"))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_deleting_product_cascades_to_stock() {
        let db = Database::open(":memory:").await.unwrap();

        let product_id = db
            .products()
            .create(&ProductFields {
                name: "Widget".to_string(),
                category: None,
                unit_price: 10.0,
                card_rate: 12.0,
                replacement_rate: 11.0,
                weight: 0.5,
                description: "A widget".to_string(),
            })
            .await
            .unwrap();
        let stock_id = db
            .product_stock()
            .create(product_id, "Warehouse A", 100)
            .await
            .unwrap();

        db.products().delete(product_id).await.unwrap();
        assert!(db.product_stock().get_by_id(stock_id).await.unwrap().is_none());
    }
}
