//! Turn a spreadsheet row into a record id and a partial update

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::caption::{ColumnPlan, FieldTag};
use super::lookup::LookupTable;
use crate::config::FieldMapping;

/// What to do with a key-column value that is not in the lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// Treat the value as a record id and use it unchanged
    #[default]
    Lenient,
    /// Reject the row
    Strict,
}

/// Target record and the fields to set on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledUpdate {
    pub target_id: String,
    pub fields: BTreeMap<FieldTag, String>,
}

impl ReconciledUpdate {
    /// JSON body for the update call, keyed by remote field name
    pub fn payload(&self, mapping: &FieldMapping) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(tag, value)| {
                (
                    mapping.api_name(*tag).to_string(),
                    Value::String(value.clone()),
                )
            })
            .collect()
    }
}

/// Why a row could not be reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The key column is empty
    MissingKey,
    /// Strict policy only: the key is not a known secondary key
    UnknownKey { key: String },
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::MissingKey => write!(f, "key column is empty"),
            ReconcileError::UnknownKey { key } => {
                write!(f, "key '{}' matches no record created around the tour date", key)
            }
        }
    }
}

impl std::error::Error for ReconcileError {}

/// Reconcile one data row against the classified captions
///
/// Rows shorter than the caption row are read as if padded with empty
/// cells. Empty values are never part of the update. When two columns carry
/// the same tag the rightmost non-empty one wins.
pub fn reconcile(
    row: &[String],
    plan: &ColumnPlan,
    table: &LookupTable,
    policy: KeyPolicy,
) -> Result<ReconciledUpdate, ReconcileError> {
    let key = row.first().map(String::as_str).unwrap_or_default();
    if key.trim().is_empty() {
        return Err(ReconcileError::MissingKey);
    }

    let target_id = match (table.resolve(key), policy) {
        (Some(id), _) => id.to_string(),
        (None, KeyPolicy::Lenient) => key.to_string(),
        (None, KeyPolicy::Strict) => {
            return Err(ReconcileError::UnknownKey {
                key: key.to_string(),
            });
        }
    };

    let fields = plan
        .tagged()
        .filter_map(|(column, tag)| {
            let value = row.get(column)?;
            if value.is_empty() {
                None
            } else {
                Some((tag, value.clone()))
            }
        })
        .collect();

    Ok(ReconciledUpdate { target_id, fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn issue_plan() -> ColumnPlan {
        ColumnPlan::from_captions(&strings(&["Key", "AD Issue", "BT Issue", "SW Issue"]))
    }

    #[test]
    fn test_known_key_resolves_to_record_id() {
        let table: LookupTable = [("X1".to_string(), "REC123".to_string())].into_iter().collect();
        let row = strings(&["X1", "missing stock", "", "shelf broken"]);

        let update = reconcile(&row, &issue_plan(), &table, KeyPolicy::Lenient).unwrap();

        assert_eq!(update.target_id, "REC123");
        assert_eq!(update.fields.len(), 2);
        assert_eq!(update.fields[&FieldTag::Ad], "missing stock");
        assert_eq!(update.fields[&FieldTag::Sw], "shelf broken");
        assert!(!update.fields.contains_key(&FieldTag::Bt));
    }

    #[test]
    fn test_unknown_key_passes_through() {
        let row = strings(&["X1", "missing stock", "", "shelf broken"]);
        let update = reconcile(&row, &issue_plan(), &LookupTable::new(), KeyPolicy::Lenient).unwrap();
        assert_eq!(update.target_id, "X1");
    }

    #[test]
    fn test_unknown_key_rejected_when_strict() {
        let row = strings(&["X1", "missing stock", "", ""]);
        let err = reconcile(&row, &issue_plan(), &LookupTable::new(), KeyPolicy::Strict).unwrap_err();
        assert_eq!(err, ReconcileError::UnknownKey { key: "X1".into() });
    }

    #[test]
    fn test_strict_still_resolves_known_keys() {
        let table: LookupTable = [("X1".to_string(), "REC123".to_string())].into_iter().collect();
        let row = strings(&["X1", "", "", ""]);
        let update = reconcile(&row, &issue_plan(), &table, KeyPolicy::Strict).unwrap();
        assert_eq!(update.target_id, "REC123");
        assert!(update.fields.is_empty());
    }

    #[test]
    fn test_empty_key_is_an_error() {
        let row = strings(&["  ", "missing stock", "", ""]);
        let err = reconcile(&row, &issue_plan(), &LookupTable::new(), KeyPolicy::Lenient).unwrap_err();
        assert_eq!(err, ReconcileError::MissingKey);
    }

    #[test]
    fn test_date_column_only_when_present() {
        let plan = ColumnPlan::from_captions(&strings(&["Key", "Date", "Status"]));

        let without = reconcile(&strings(&["a1", "", "done"]), &plan, &LookupTable::new(), KeyPolicy::Lenient)
            .unwrap();
        assert!(!without.fields.contains_key(&FieldTag::Date));
        assert_eq!(without.fields[&FieldTag::Status], "done");

        let with = reconcile(&strings(&["a1", "16.02.2018", ""]), &plan, &LookupTable::new(), KeyPolicy::Lenient)
            .unwrap();
        assert_eq!(with.fields[&FieldTag::Date], "16.02.2018");
        assert!(!with.fields.contains_key(&FieldTag::Status));
    }

    #[test]
    fn test_unclassified_columns_ignored() {
        let plan = ColumnPlan::from_captions(&strings(&["Key", "Notes", "AD"]));
        let update = reconcile(&strings(&["a1", "ignore me", "x"]), &plan, &LookupTable::new(), KeyPolicy::Lenient)
            .unwrap();
        assert_eq!(update.fields.len(), 1);
        assert_eq!(update.fields[&FieldTag::Ad], "x");
    }

    #[test]
    fn test_short_row_is_padded() {
        let update = reconcile(&strings(&["a1", "x"]), &issue_plan(), &LookupTable::new(), KeyPolicy::Lenient)
            .unwrap();
        assert_eq!(update.fields.len(), 1);
    }

    #[test]
    fn test_payload_uses_remote_field_names() {
        let table: LookupTable = [("X1".to_string(), "REC123".to_string())].into_iter().collect();
        let row = strings(&["X1", "missing stock", "", "shelf broken"]);
        let update = reconcile(&row, &issue_plan(), &table, KeyPolicy::Lenient).unwrap();

        let payload = update.payload(&FieldMapping::default());
        assert_eq!(payload.len(), 2);
        assert_eq!(payload["AD_Issue__c"], "missing stock");
        assert_eq!(payload["SW_Issue__c"], "shelf broken");
    }
}
