//! Notification composer: deterministic subject/HTML rendering.
//!
//! Pure string templating, no I/O and no failure path: every nullable
//! lookup falls back to the "Tidak ditentukan" placeholder and dates render
//! as `DD-MM-YYYY`. The milestone badge uses the same calendar-month bucket
//! that selected the record, so label and bucket can never disagree.

use chrono::NaiveDate;

use dokuportal_core::expiry::days_until;
use dokuportal_db::models::DocumentRecord;

use crate::recipients::RecipientGroup;

/// Placeholder shown for missing lookup names.
pub const NOT_SPECIFIED: &str = "Tidak ditentukan";

/// A rendered message, ready to be addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedEmail {
    pub subject: String,
    pub html_body: String,
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%d-%m-%Y").to_string(),
        None => NOT_SPECIFIED.to_string(),
    }
}

fn fmt_lookup(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_SPECIFIED)
}

/// Detail table shared by both templates.
fn record_table(record: &DocumentRecord) -> String {
    format!(
        "<table border=\"0\" cellpadding=\"6\" cellspacing=\"0\" \
           style=\"border-collapse:collapse;background:#f8f9fa;width:100%\">\
         <tr><td><strong>Material</strong></td><td>{material}</td></tr>\
         <tr><td><strong>Supplier</strong></td><td>{supplier}</td></tr>\
         <tr><td><strong>Nomor Part</strong></td><td>{part_number}</td></tr>\
         <tr><td><strong>Nama Part</strong></td><td>{part_name}</td></tr>\
         <tr><td><strong>Tipe Dokumen</strong></td><td>{doc_type}</td></tr>\
         <tr><td><strong>Tanggal Laporan</strong></td><td>{report}</td></tr>\
         <tr><td><strong>Tanggal Kedaluwarsa</strong></td><td style=\"color:#c0392b\">\
           <strong>{expire}</strong></td></tr>\
         </table>",
        material = record.material_name,
        supplier = fmt_lookup(record.supplier_name.as_deref()),
        part_number = fmt_lookup(record.part_number_name.as_deref()),
        part_name = fmt_lookup(record.part_name.as_deref()),
        doc_type = fmt_lookup(record.document_type_name.as_deref()),
        report = fmt_date(record.report_date),
        expire = fmt_date(Some(record.expire_date)),
    )
}

/// Footer shared by both templates, with a link back to the portal.
fn footer(portal_url: &str) -> String {
    format!(
        "<p style=\"color:#7f8c8d;font-size:12px\">Email ini dikirim otomatis oleh \
         <a href=\"{portal_url}\" style=\"color:#7f8c8d\">Portal Dokumen</a>.</p>"
    )
}

/// Render the short-horizon alert for a single record.
///
/// The subject carries the material name and the whole-day count until
/// expiry; the body is a single detail table.
pub fn compose_short_horizon(
    record: &DocumentRecord,
    today: NaiveDate,
    portal_url: &str,
) -> ComposedEmail {
    let days = days_until(today, record.expire_date);

    let subject = format!(
        "[Portal Dokumen] Mill sheet {} kedaluwarsa dalam {} hari",
        record.material_name, days
    );

    let html_body = format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#2c3e50\">\
         <h2 style=\"color:#c0392b\">Dokumen Segera Kedaluwarsa</h2>\
         <p>Mill sheet berikut akan kedaluwarsa dalam <strong>{days} hari</strong>. \
         Mohon segera perbarui dokumen terkait.</p>\
         {table}\
         {footer}\
         </body></html>",
        days = days,
        table = record_table(record),
        footer = footer(portal_url),
    );

    ComposedEmail { subject, html_body }
}

/// Render the monthly milestone digest for one recipient.
///
/// The subject carries the recipient's total record count; each record is
/// listed with a badge naming the milestone ("N bulan dari laporan").
pub fn compose_milestone_digest(group: &RecipientGroup, portal_url: &str) -> ComposedEmail {
    let count = group.entries.len();

    let subject = format!(
        "[Portal Dokumen] {count} mill sheet Anda mendekati kedaluwarsa"
    );

    let mut sections = String::new();
    for entry in &group.entries {
        let badge = match entry.bucket.months() {
            Some(n) => format!("{n} bulan dari laporan"),
            None => NOT_SPECIFIED.to_string(),
        };
        sections.push_str(&format!(
            "<div style=\"margin-bottom:20px\">\
             <span style=\"display:inline-block;background:#e67e22;color:#fff;\
               padding:2px 10px;border-radius:10px;font-size:12px\">{badge}</span>\
             {table}\
             </div>",
            badge = badge,
            table = record_table(&entry.record),
        ));
    }

    let html_body = format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#2c3e50\">\
         <h2 style=\"color:#e67e22\">Pengingat Kedaluwarsa Dokumen</h2>\
         <p>Terdapat <strong>{count} dokumen</strong> milik Anda yang mendekati tanggal \
         kedaluwarsa. Mohon tinjau daftar berikut.</p>\
         {sections}\
         {footer}\
         </body></html>",
        count = count,
        sections = sections,
        footer = footer(portal_url),
    );

    ComposedEmail { subject, html_body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dokuportal_core::expiry::MilestoneBucket;

    use crate::recipients::BucketedRecord;

    const PORTAL: &str = "https://portal.example.com";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record() -> DocumentRecord {
        DocumentRecord {
            id: 1,
            material_name: "SPHC-270C".to_string(),
            report_date: Some(d(2024, 1, 1)),
            expire_date: d(2024, 1, 17),
            is_active: true,
            owner_user_id: Some(10),
            owner_email: Some("owner@example.com".to_string()),
            supplier_name: Some("PT Baja Utama".to_string()),
            part_name: None,
            part_number_name: Some("PN-4411".to_string()),
            document_type_name: None,
        }
    }

    #[test]
    fn short_horizon_subject_has_material_and_days() {
        let email = compose_short_horizon(&record(), d(2024, 1, 15), PORTAL);
        assert_eq!(
            email.subject,
            "[Portal Dokumen] Mill sheet SPHC-270C kedaluwarsa dalam 2 hari"
        );
    }

    #[test]
    fn missing_lookups_render_placeholder() {
        let email = compose_short_horizon(&record(), d(2024, 1, 15), PORTAL);
        // part_name and document_type_name are null in the fixture.
        assert_eq!(email.html_body.matches(NOT_SPECIFIED).count(), 2);
        assert!(email.html_body.contains("PT Baja Utama"));
        assert!(email.html_body.contains("PN-4411"));
    }

    #[test]
    fn footer_links_back_to_portal() {
        let email = compose_short_horizon(&record(), d(2024, 1, 15), PORTAL);
        assert!(email.html_body.contains("href=\"https://portal.example.com\""));
    }

    #[test]
    fn dates_render_day_month_year() {
        let email = compose_short_horizon(&record(), d(2024, 1, 15), PORTAL);
        assert!(email.html_body.contains("01-01-2024"));
        assert!(email.html_body.contains("17-01-2024"));
    }

    #[test]
    fn null_report_date_renders_placeholder_not_panic() {
        let mut rec = record();
        rec.report_date = None;
        rec.supplier_name = None;
        let email = compose_short_horizon(&rec, d(2024, 1, 15), PORTAL);
        assert!(email.html_body.contains(NOT_SPECIFIED));
    }

    #[test]
    fn digest_subject_has_record_count() {
        let group = RecipientGroup {
            user_id: 10,
            email: "owner@example.com".to_string(),
            entries: vec![
                BucketedRecord { record: record(), bucket: MilestoneBucket::ThreeMonths },
                BucketedRecord { record: record(), bucket: MilestoneBucket::OneMonth },
            ],
        };
        let email = compose_milestone_digest(&group, PORTAL);
        assert!(email.subject.contains("2 mill sheet"));
    }

    #[test]
    fn digest_badge_matches_bucket() {
        let group = RecipientGroup {
            user_id: 10,
            email: "owner@example.com".to_string(),
            entries: vec![
                BucketedRecord { record: record(), bucket: MilestoneBucket::ThreeMonths },
            ],
        };
        let email = compose_milestone_digest(&group, PORTAL);
        assert!(email.html_body.contains("3 bulan dari laporan"));
        assert!(!email.html_body.contains("2 bulan dari laporan"));
    }
}
