//! The narrow record store interface the upload pipeline depends on

use async_trait::async_trait;
use colored::*;
use serde_json::{Map, Value};

use super::error::ApiError;
use super::query::Query;
use crate::progress::Progress;

/// A record as returned by a query: field API name -> value
pub type Record = Map<String, Value>;

/// Remote record store operations used by the lookup and dispatch steps
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a query and return every matching record, following pagination
    async fn query_all(&self, query: &Query) -> Result<Vec<Record>, ApiError>;

    /// Apply a partial update to the record `id` of `object`
    async fn update(&self, object: &str, id: &str, fields: &Map<String, Value>)
    -> Result<(), ApiError>;
}

/// Store decorator that lets queries through but only reports updates
pub struct DryRunStore {
    inner: Box<dyn RecordStore>,
    progress: Progress,
}

impl DryRunStore {
    pub fn new(inner: Box<dyn RecordStore>, progress: Progress) -> Self {
        Self { inner, progress }
    }
}

#[async_trait]
impl RecordStore for DryRunStore {
    async fn query_all(&self, query: &Query) -> Result<Vec<Record>, ApiError> {
        self.inner.query_all(query).await
    }

    async fn update(
        &self,
        object: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), ApiError> {
        let payload = Value::Object(fields.clone());
        log::info!("dry run: skipping update of {}({}): {}", object, id, payload);
        self.progress
            .message(&format!("{} {}({}) {}", "dry run".yellow(), object, id, payload));
        Ok(())
    }
}
