//! Repository for the `material_control` table.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::document::DocumentRecord;

/// Join projection shared by all expiring-record queries.
const SELECT_JOINED: &str = "SELECT mc.id, mc.material_name, mc.report_date, mc.expire_date, \
     mc.is_active, mc.user_id AS owner_user_id, u.email AS owner_email, \
     s.name AS supplier_name, pn.name AS part_name, pnum.name AS part_number_name, \
     dt.name AS document_type_name \
     FROM material_control mc \
     LEFT JOIN users u ON u.id = mc.user_id \
     LEFT JOIN suppliers s ON s.id = mc.supplier_id \
     LEFT JOIN part_names pn ON pn.id = mc.part_name_id \
     LEFT JOIN part_numbers pnum ON pnum.id = mc.part_number_id \
     LEFT JOIN document_types dt ON dt.id = mc.document_type_id";

/// Read access to mill sheet records plus the reminder-scan audit stamp.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Active records whose expiry date falls inside `[start, end]`
    /// (inclusive), with lookup names resolved.
    pub async fn list_expiring_between(
        pool: &PgPool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DocumentRecord>, sqlx::Error> {
        let query = format!(
            "{SELECT_JOINED} \
             WHERE mc.is_active = TRUE AND mc.expire_date BETWEEN $1 AND $2 \
             ORDER BY mc.expire_date, mc.id"
        );
        sqlx::query_as::<_, DocumentRecord>(&query)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Count of active records expiring inside `[start, end]`.
    pub async fn count_expiring_between(
        pool: &PgPool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM material_control \
             WHERE is_active = TRUE AND expire_date BETWEEN $1 AND $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Stamp every active record in the scanned window with the time of the
    /// reminder pass. Returns the number of rows touched.
    pub async fn touch_reminder_checked(
        pool: &PgPool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE material_control \
             SET reminder_checked_at = NOW() \
             WHERE is_active = TRUE AND expire_date BETWEEN $1 AND $2",
        )
        .bind(start)
        .bind(end)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
