use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    /// Lenient conversion used when reading database rows; unknown values
    /// fall back to the least privileged role.
    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            _ => Role::Employee,
        }
    }

    /// Strict parse used for client-supplied role fields.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }

    /// Permission codenames granted by this role, sorted.
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => &[
                "customer.add_customer",
                "customer.change_customer",
                "customer.delete_customer",
                "customer.view_customer",
                "inventory.add_product",
                "inventory.add_productstock",
                "inventory.change_product",
                "inventory.change_productstock",
                "inventory.delete_product",
                "inventory.delete_productstock",
                "inventory.view_product",
                "inventory.view_productstock",
            ],
            Role::Manager => &[
                "customer.add_customer",
                "customer.change_customer",
                "customer.view_customer",
                "inventory.add_product",
                "inventory.add_productstock",
                "inventory.change_product",
                "inventory.change_productstock",
                "inventory.view_product",
                "inventory.view_productstock",
            ],
            Role::Employee => &[
                "customer.view_customer",
                "inventory.view_product",
                "inventory.view_productstock",
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
}

/// Fields required to insert a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role: Role::from_str(&row.role),
            is_active: row.is_active,
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, first_name, last_name, role, is_active";

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user. Returns the user ID.
    pub async fn create(&self, user: &NewUser) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, first_name, last_name, role) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    /// Check whether a username is already taken.
    pub async fn username_taken(&self, username: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Check whether an email is already taken, optionally ignoring one user
    /// (for profile updates where keeping the current address is fine).
    pub async fn email_taken(
        &self,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let count: (i32,) = match exclude_id {
            Some(id) => {
                sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
                    .bind(email)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count.0 > 0)
    }

    /// Replace a user's password hash.
    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update profile fields (username is immutable through this store).
    pub async fn update_profile(
        &self,
        id: i64,
        email: &str,
        first_name: &str,
        last_name: &str,
        role: Role,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET email = ?, first_name = ?, last_name = ?, role = ? WHERE id = ?",
        )
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(role.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the active flag for a user.
    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
