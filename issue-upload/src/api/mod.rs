//! Salesforce API Module
//!
//! Session login, SOQL query building and the REST calls the upload needs.
//! Everything above this module talks to the remote side only through the
//! [`RecordStore`] trait.

pub mod auth;
pub mod client;
pub mod error;
pub mod query;
pub mod store;

pub use auth::LoginCredentials;
pub use client::SalesforceClient;
pub use error::ApiError;
pub use query::{Filter, Query};
pub use store::{DryRunStore, Record, RecordStore};
