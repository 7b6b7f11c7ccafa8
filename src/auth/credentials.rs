//! Username/password credential validation.

use crate::db::{Database, User};

use super::password::verify_password;

/// Errors from credential validation.
///
/// An unknown username, a disabled account, and a wrong password all produce
/// `InvalidCredentials` so responses cannot be used to enumerate usernames.
#[derive(Debug)]
pub enum CredentialError {
    InvalidCredentials,
    Database(sqlx::Error),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::InvalidCredentials => write!(f, "Invalid credentials"),
            CredentialError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Validate a username/password pair against the user store.
pub async fn validate_credentials(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<User, CredentialError> {
    let user = db
        .users()
        .get_by_username(username)
        .await
        .map_err(CredentialError::Database)?
        .ok_or(CredentialError::InvalidCredentials)?;

    if !user.is_active {
        return Err(CredentialError::InvalidCredentials);
    }

    if !verify_password(password, &user.password_hash) {
        return Err(CredentialError::InvalidCredentials);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::db::{NewUser, Role};

    async fn setup() -> Database {
        let db = Database::open(":memory:").await.unwrap();
        db.users()
            .create(&NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: hash_password("correct-password").unwrap(),
                first_name: String::new(),
                last_name: String::new(),
                role: Role::Employee,
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let db = setup().await;
        let user = validate_credentials(&db, "alice", "correct-password")
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let db = setup().await;
        let err = validate_credentials(&db, "alice", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_username_same_error() {
        let db = setup().await;
        let err = validate_credentials(&db, "nobody", "correct-password")
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_inactive_user_same_error() {
        let db = setup().await;
        let user = db.users().get_by_username("alice").await.unwrap().unwrap();
        db.users().set_active(user.id, false).await.unwrap();

        let err = validate_credentials(&db, "alice", "correct-password")
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentials));
    }
}
