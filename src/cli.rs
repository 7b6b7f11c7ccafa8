//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::hash_password;
use crate::db::{Database, NewUser, Role};
use clap::Parser;
use tracing::{error, info};
use uuid::Uuid;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "Stockdesk",
    about = "Business-data REST backend with JWT authentication"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "stockdesk.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Debug mode: drop the Secure flag from cookies so local HTTP works
    #[arg(long)]
    pub debug: bool,

    /// Rotate refresh tokens on every refresh, blacklisting the old one
    #[arg(long)]
    pub rotate_refresh_tokens: bool,

    /// Create an admin user on startup and print its one-time password
    #[arg(long)]
    pub create_admin: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Handle the --create-admin flag: create an admin user with a generated
/// one-time password, or report the existing one.
pub async fn handle_create_admin(db: &Database) {
    match db.users().get_by_username("admin").await {
        Ok(Some(_)) => {
            println!();
            println!("Admin user already exists: admin");
            println!();
        }
        Ok(None) => {
            let password = Uuid::new_v4().to_string();
            let password_hash = match hash_password(&password) {
                Ok(hash) => hash,
                Err(e) => {
                    error!(error = %e, "Failed to hash admin password");
                    std::process::exit(1);
                }
            };

            let result = db
                .users()
                .create(&NewUser {
                    username: "admin".to_string(),
                    email: "admin@localhost.localdomain".to_string(),
                    password_hash,
                    first_name: String::new(),
                    last_name: String::new(),
                    role: Role::Admin,
                })
                .await;

            match result {
                Ok(_) => {
                    println!();
                    println!("Admin user created: admin");
                    println!("One-time password: {}", password);
                    println!("Change it with PATCH /change-password after logging in.");
                    println!();
                }
                Err(e) => {
                    error!(error = %e, "Failed to create admin user");
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to check for existing admin");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    debug: bool,
    rotate_refresh_tokens: bool,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        secure_cookies: !debug,
        rotate_refresh_tokens,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
