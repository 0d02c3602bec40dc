//! Issue upload pipeline
//!
//! caption -> lookup -> reconcile -> dispatch. Only `run` touches the
//! application context; the steps themselves take plain values so they can
//! be tested against an in-memory store.

pub mod caption;
pub mod dispatch;
pub mod lookup;
pub mod reconcile;

pub use caption::FieldTag;
pub use dispatch::{DispatchSummary, Dispatcher};
pub use lookup::build_lookup_table;
pub use reconcile::KeyPolicy;

use anyhow::{Context, Result};

use crate::context::AppContext;
use crate::sheet::IssueSheet;

/// Build the lookup table and push every row of `sheet`
pub async fn run(ctx: &AppContext, sheet: &IssueSheet) -> Result<DispatchSummary> {
    let salesforce = &ctx.config.salesforce;

    let table = build_lookup_table(ctx.store.as_ref(), &salesforce.target, ctx.options.date)
        .await
        .context("Failed to look up inspections")?;

    let summary = Dispatcher::new(ctx.store.as_ref(), &salesforce.target, &salesforce.fields)
        .with_policy(ctx.key_policy())
        .with_progress(ctx.progress("Upload"))
        .dispatch(sheet, &table)
        .await?;

    Ok(summary)
}
