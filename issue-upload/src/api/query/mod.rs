//! SOQL Query Builder Module
//!
//! Provides a small fluent API for building SOQL statements. Queries are
//! plain values so they can be inspected in tests before being sent.

pub mod filters;
pub mod query;

pub use filters::Filter;
pub use query::Query;
