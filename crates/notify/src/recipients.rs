//! Recipient resolution for both reminder jobs.
//!
//! Resolution never fails the run: the monthly job silently drops records
//! whose owner has no email relation, and the short-horizon distribution
//! list degrades to the configured fallback (and finally a built-in
//! monitoring address) when the role query errors or comes back empty.

use indexmap::{IndexMap, IndexSet};

use dokuportal_core::expiry::MilestoneBucket;
use dokuportal_core::types::DbId;
use dokuportal_db::models::DocumentRecord;

use crate::store::ReminderStore;

/// Last-resort recipient when both the role query and the configured
/// fallback list are empty.
pub const MONITORING_ADDRESS: &str = "dokumen-monitoring@dokuportal.local";

/// A document together with the milestone bucket that selected it.
#[derive(Debug, Clone)]
pub struct BucketedRecord {
    pub record: DocumentRecord,
    pub bucket: MilestoneBucket,
}

/// One recipient and the documents they are responsible for, in query order.
#[derive(Debug, Clone)]
pub struct RecipientGroup {
    pub user_id: DbId,
    pub email: String,
    pub entries: Vec<BucketedRecord>,
}

/// Group milestone-matched records by their owning user.
///
/// Keyed on the owner's user id; insertion order (and therefore send order)
/// follows the order records arrive in. Records with no owner or no joined
/// email are dropped, not errored.
pub fn group_by_owner(entries: Vec<BucketedRecord>) -> Vec<RecipientGroup> {
    let mut groups: IndexMap<DbId, RecipientGroup> = IndexMap::new();

    for entry in entries {
        let (Some(user_id), Some(email)) = (
            entry.record.owner_user_id,
            entry.record.owner_email.clone(),
        ) else {
            tracing::debug!(
                record_id = entry.record.id,
                material = %entry.record.material_name,
                "Skipping record with no owner email"
            );
            continue;
        };

        groups
            .entry(user_id)
            .or_insert_with(|| RecipientGroup { user_id, email, entries: Vec::new() })
            .entries
            .push(entry);
    }

    groups.into_values().collect()
}

/// Resolve the short-horizon distribution list.
///
/// Verified admin/manager emails unioned with the configured fallback list,
/// deduplicated preserving order. A query failure degrades to the fallback
/// list alone; an empty union degrades to [`MONITORING_ADDRESS`].
pub async fn resolve_distribution_list(
    store: &dyn ReminderStore,
    fallback: &[String],
) -> Vec<String> {
    let from_roles = match store.list_reminder_recipients().await {
        Ok(emails) => emails,
        Err(e) => {
            tracing::warn!(error = %e, "Recipient role query failed, using fallback list");
            Vec::new()
        }
    };

    let mut list: IndexSet<String> = IndexSet::new();
    list.extend(from_roles);
    list.extend(fallback.iter().cloned());

    if list.is_empty() {
        tracing::warn!("Distribution list empty, falling back to monitoring address");
        return vec![MONITORING_ADDRESS.to_string()];
    }

    list.into_iter().collect()
}
