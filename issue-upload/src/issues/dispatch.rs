//! Apply reconciled updates to the record store, row by row
//!
//! Rows are processed strictly in sheet order, one update call at a time.
//! A missing record only skips its row; any other remote error stops the
//! run. Updates committed before the failing row stay committed.

use colored::*;
use serde_json::Value;

use super::caption::ColumnPlan;
use super::lookup::LookupTable;
use super::reconcile::{KeyPolicy, reconcile};
use crate::api::{ApiError, RecordStore};
use crate::config::{FieldMapping, TargetConfig};
use crate::progress::Progress;
use crate::sheet::{DataRow, IssueSheet};

/// Final state of a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Committed,
    /// The update was rejected because the record does not exist
    NotFound,
    /// No target record could be determined for the row
    Unresolved,
    Blank,
}

/// Counts of row outcomes for a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub committed: usize,
    pub not_found: usize,
    pub unresolved: usize,
    pub blank: usize,
}

impl DispatchSummary {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Committed => self.committed += 1,
            RowOutcome::NotFound => self.not_found += 1,
            RowOutcome::Unresolved => self.unresolved += 1,
            RowOutcome::Blank => self.blank += 1,
        }
    }

    /// Rows that were skipped for any reason other than being blank
    pub fn skipped(&self) -> usize {
        self.not_found + self.unresolved
    }

    pub fn total(&self) -> usize {
        self.committed + self.not_found + self.unresolved + self.blank
    }
}

/// A fatal update failure
#[derive(Debug)]
pub enum DispatchError {
    Aborted {
        /// Spreadsheet row number of the failing row
        row: usize,
        target_id: String,
        payload: Value,
        /// Rows committed before the failure
        committed: usize,
        source: ApiError,
    },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Aborted {
                row,
                target_id,
                payload,
                committed,
                source,
            } => write!(
                f,
                "Update of record '{}' from row {} failed, run aborted after {} committed rows: {}\nPayload: {}",
                target_id, row, committed, source, payload
            ),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Aborted { source, .. } => Some(source),
        }
    }
}

/// Sequential update dispatcher for one target object
pub struct Dispatcher<'a> {
    store: &'a dyn RecordStore,
    target: &'a TargetConfig,
    fields: &'a FieldMapping,
    policy: KeyPolicy,
    progress: Progress,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        target: &'a TargetConfig,
        fields: &'a FieldMapping,
    ) -> Self {
        Self {
            store,
            target,
            fields,
            policy: KeyPolicy::default(),
            progress: Progress::hidden(),
        }
    }

    pub fn with_policy(mut self, policy: KeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Update the record of every data row of `sheet`
    pub async fn dispatch(
        &self,
        sheet: &IssueSheet,
        table: &LookupTable,
    ) -> Result<DispatchSummary, DispatchError> {
        let plan = ColumnPlan::from_captions(&sheet.captions);
        let total = sheet.rows.len();
        let mut summary = DispatchSummary::default();

        log::info!(
            "dispatching {} rows to {} (key column '{}')",
            total,
            self.target.object,
            plan.key_caption().unwrap_or_default()
        );

        for (idx, row) in sheet.rows.iter().enumerate() {
            let outcome = match self.dispatch_row(row, &plan, table).await {
                Ok(outcome) => outcome,
                Err(mut err) => {
                    self.progress.finish();
                    let DispatchError::Aborted { committed, .. } = &mut err;
                    *committed = summary.committed;
                    return Err(err);
                }
            };
            summary.record(outcome);
            self.progress.update(idx + 1, total);
        }

        log::info!("dispatch finished: {:?}", summary);
        Ok(summary)
    }

    async fn dispatch_row(
        &self,
        row: &DataRow,
        plan: &ColumnPlan,
        table: &LookupTable,
    ) -> Result<RowOutcome, DispatchError> {
        if row.is_blank() {
            log::debug!("row {} is blank", row.number);
            return Ok(RowOutcome::Blank);
        }

        let update = match reconcile(&row.cells, plan, table, self.policy) {
            Ok(update) => update,
            Err(err) => {
                log::warn!("row {} skipped: {}", row.number, err);
                self.progress
                    .message(&format!("{} row {}: {}", "skipped".yellow(), row.number, err));
                return Ok(RowOutcome::Unresolved);
            }
        };

        let payload = update.payload(self.fields);
        log::debug!(
            "row {} -> {} {}",
            row.number,
            update.target_id,
            Value::Object(payload.clone())
        );

        match self
            .store
            .update(&self.target.object, &update.target_id, &payload)
            .await
        {
            Ok(()) => {
                log::info!("row {}: updated {}", row.number, update.target_id);
                Ok(RowOutcome::Committed)
            }
            Err(err) if err.is_not_found() => {
                log::warn!(
                    "row {}: record {} not found, skipped: {}",
                    row.number,
                    update.target_id,
                    err
                );
                self.progress.message(&format!(
                    "{} row {}: record {} not found",
                    "skipped".yellow(),
                    row.number,
                    update.target_id
                ));
                Ok(RowOutcome::NotFound)
            }
            Err(err) => {
                let payload = Value::Object(payload);
                log::error!(
                    "row {}: update of {} failed with payload {}: {}",
                    row.number,
                    update.target_id,
                    payload,
                    err
                );
                Err(DispatchError::Aborted {
                    row: row.number,
                    target_id: update.target_id,
                    payload,
                    committed: 0,
                    source: err,
                })
            }
        }
    }
}
