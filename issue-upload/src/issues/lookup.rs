//! Secondary key -> record id lookup table
//!
//! Built once per run from the records created around the tour date, so
//! rows keyed by contract reference can be matched to the inspection record
//! that has to be updated.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::HashMap;

use crate::api::{ApiError, Filter, Query, Record, RecordStore};
use crate::config::TargetConfig;

/// Primary key field of every sObject
pub const PRIMARY_KEY_FIELD: &str = "Id";

/// Mapping from secondary key to primary key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupTable {
    entries: HashMap<String, String>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping, returning the id it replaced
    pub fn insert(&mut self, secondary: impl Into<String>, primary: impl Into<String>) -> Option<String> {
        self.entries.insert(secondary.into(), primary.into())
    }

    /// Primary id for a secondary key
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the table from query results
    ///
    /// When several records share a secondary key the one processed last
    /// wins. Records without a secondary key or id are skipped.
    pub fn from_records(records: &[Record], secondary_field: &str) -> Self {
        let mut table = Self::new();

        for record in records {
            let (Some(secondary), Some(primary)) = (
                field_text(record, secondary_field),
                field_text(record, PRIMARY_KEY_FIELD),
            ) else {
                log::debug!("skipping record without {}: {:?}", secondary_field, record);
                continue;
            };

            if let Some(previous) = table.insert(secondary.clone(), primary.clone()) {
                log::debug!(
                    "{} '{}' maps to several records, {} replaces {}",
                    secondary_field,
                    secondary,
                    primary,
                    previous
                );
            }
        }

        table
    }
}

impl FromIterator<(String, String)> for LookupTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Open interval of creation timestamps searched for a tour date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl LookupWindow {
    /// One day either side of midnight of `date`
    pub fn around(date: NaiveDate) -> Self {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        Self {
            from: midnight - Duration::days(1),
            to: midnight + Duration::days(1),
        }
    }
}

/// Query for every record of the target object created inside the window
pub fn lookup_query(target: &TargetConfig, window: &LookupWindow) -> Query {
    Query::new(&target.object)
        .select([target.secondary_key.as_str(), PRIMARY_KEY_FIELD])
        .filter(Filter::gt(&target.created_field, window.from))
        .filter(Filter::lt(&target.created_field, window.to))
}

/// Fetch the records created around `reference_date` and index them
pub async fn build_lookup_table(
    store: &dyn RecordStore,
    target: &TargetConfig,
    reference_date: NaiveDate,
) -> Result<LookupTable, ApiError> {
    let window = LookupWindow::around(reference_date);
    let query = lookup_query(target, &window);

    log::info!(
        "looking up {} records created between {} and {}",
        target.object,
        window.from,
        window.to
    );

    let records = store.query_all(&query).await?;
    let table = LookupTable::from_records(&records, &target.secondary_key);

    if table.is_empty() {
        log::warn!(
            "no {} records created around {}",
            target.object,
            reference_date
        );
    } else {
        log::info!(
            "lookup table holds {} keys from {} records",
            table.len(),
            records.len()
        );
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::store::mock::MockStore;
    use serde_json::json;

    fn record(contract: Value, id: &str) -> Record {
        let mut r = Record::new();
        r.insert("attributes".into(), json!({"type": "Shopper_Inspection__c"}));
        r.insert("Shopper_Contract__c".into(), contract);
        r.insert("Id".into(), json!(id));
        r
    }

    #[test]
    fn test_window_bounds() {
        let window = LookupWindow::around(NaiveDate::from_ymd_opt(2018, 2, 16).unwrap());
        assert_eq!(window.from.to_string(), "2018-02-15 00:00:00");
        assert_eq!(window.to.to_string(), "2018-02-17 00:00:00");
    }

    #[test]
    fn test_window_crosses_month_and_year() {
        let window = LookupWindow::around(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(window.from.to_string(), "2017-12-31 00:00:00");
        assert_eq!(window.to.to_string(), "2018-01-02 00:00:00");
    }

    #[test]
    fn test_lookup_query_soql() {
        let window = LookupWindow::around(NaiveDate::from_ymd_opt(2018, 2, 16).unwrap());
        let query = lookup_query(&TargetConfig::default(), &window);
        assert_eq!(
            query.to_soql(),
            "SELECT Shopper_Contract__c, Id FROM Shopper_Inspection__c \
             WHERE CreatedDate > 2018-02-15T00:00:00Z AND CreatedDate < 2018-02-17T00:00:00Z"
        );
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let records = vec![
            record(json!("C1"), "REC1"),
            record(json!("C2"), "REC2"),
            record(json!("C1"), "REC3"),
        ];
        let table = LookupTable::from_records(&records, "Shopper_Contract__c");

        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("C1"), Some("REC3"));
        assert_eq!(table.resolve("C2"), Some("REC2"));
    }

    #[test]
    fn test_records_without_key_are_skipped() {
        let records = vec![record(Value::Null, "REC1"), record(json!(""), "REC2")];
        let table = LookupTable::from_records(&records, "Shopper_Contract__c");
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_build_lookup_table_issues_one_query() {
        let store = MockStore::new().with_records(vec![
            record(json!("C1"), "REC1"),
            record(json!("C2"), "REC2"),
        ]);

        let table = build_lookup_table(
            &store,
            &TargetConfig::default(),
            NaiveDate::from_ymd_opt(2018, 2, 16).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(table.resolve("C2"), Some("REC2"));
        let queries = store.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("CreatedDate > 2018-02-15T00:00:00Z"));
    }
}
