//! Blacklist storage for revoked refresh token identifiers.
//!
//! Only refresh tokens carry a JTI; access tokens are stateless and
//! short-lived (1 hour). A blacklisted JTI must never validate again, even
//! while its signature and expiry are otherwise fine.

use sqlx::sqlite::SqlitePool;

/// Store for revoked refresh token identifiers.
pub struct BlacklistStore {
    pool: SqlitePool,
}

impl BlacklistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Mark a refresh token identifier as revoked.
    /// Idempotent: revoking an already-revoked JTI is a no-op.
    pub async fn revoke(&self, jti: &str, expires_at: u64) -> Result<(), sqlx::Error> {
        let expires_at_str = timestamp_to_datetime(expires_at);

        sqlx::query("INSERT OR IGNORE INTO blacklisted_tokens (jti, expires_at) VALUES (?, ?)")
            .bind(jti)
            .bind(&expires_at_str)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Check whether a refresh token identifier has been revoked.
    pub async fn is_revoked(&self, jti: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM blacklisted_tokens WHERE jti = ?")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 > 0)
    }

    /// Delete entries whose token has passed its natural expiry.
    /// An expired token fails signature/expiry validation anyway, so the
    /// entry no longer carries any information.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at < datetime('now')")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

/// Convert a Unix timestamp to an ISO 8601 datetime string for SQLite.
fn timestamp_to_datetime(timestamp: u64) -> String {
    let days_since_epoch = timestamp / 86400;
    let time_of_day = timestamp % 86400;
    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    // Calculate year, month, day from days since epoch (1970-01-01)
    let (year, month, day) = days_to_ymd(days_since_epoch as i64);

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, month, day, hours, minutes, seconds
    )
}

/// Convert days since Unix epoch to year, month, day.
fn days_to_ymd(days: i64) -> (i32, u32, u32) {
    // Algorithm from http://howardhinnant.github.io/date_algorithms.html
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}
