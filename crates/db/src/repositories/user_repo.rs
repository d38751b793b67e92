//! Repository for the `users` table.

use sqlx::PgPool;

/// Read access to user accounts for recipient resolution.
pub struct UserRepo;

impl UserRepo {
    /// Email addresses of verified admin/manager users, in a stable order.
    ///
    /// These roles form the distribution list for short-horizon expiry
    /// alerts; suppliers are never on it.
    pub async fn list_reminder_recipients(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT email FROM users \
             WHERE is_verified = TRUE AND role IN ('admin', 'manager') \
             ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }
}
