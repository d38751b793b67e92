//! Mill sheet document models.

use chrono::NaiveDate;
use dokuportal_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A `material_control` row joined with its lookup display names and the
/// owning user's email.
///
/// Read-only to the reminder service: rows are created and edited by the
/// portal's CRUD screens. Lookup names and the owner reference are all
/// nullable; the composer substitutes a placeholder for missing names and
/// the recipient resolver drops records with no owner email.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentRecord {
    pub id: DbId,
    pub material_name: String,
    /// Basis for milestone bucketing; `None` means no bucket applies.
    pub report_date: Option<NaiveDate>,
    pub expire_date: NaiveDate,
    pub is_active: bool,
    pub owner_user_id: Option<DbId>,
    pub owner_email: Option<String>,
    pub supplier_name: Option<String>,
    pub part_name: Option<String>,
    pub part_number_name: Option<String>,
    pub document_type_name: Option<String>,
}
