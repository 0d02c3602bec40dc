//! Application context
//!
//! Everything a run needs (configuration, command-line options and the
//! remote session) is built once in `main` and handed down by reference.

use anyhow::{Context, Result};

use crate::api::{DryRunStore, RecordStore, SalesforceClient};
use crate::cli::Cli;
use crate::config::Config;
use crate::issues::KeyPolicy;
use crate::progress::Progress;

pub struct AppContext {
    pub config: Config,
    pub options: Cli,
    pub store: Box<dyn RecordStore>,
}

impl AppContext {
    /// Log in to Salesforce and assemble the context
    pub async fn connect(config: Config, options: Cli) -> Result<Self> {
        let credentials = config.salesforce.credentials()?;

        let client = match SalesforceClient::connect(&credentials).await {
            Ok(client) => client,
            Err(err) => {
                log::error!("login to salesforce failed: {}", err);
                return Err(err).context("Login to Salesforce failed");
            }
        };
        log::debug!("session established on {}", client.session().instance);

        let store: Box<dyn RecordStore> = if options.dry_run {
            Box::new(DryRunStore::new(
                Box::new(client),
                progress_for(&options, "Upload"),
            ))
        } else {
            Box::new(client)
        };

        Ok(Self::new(config, options, store))
    }

    /// Assemble a context around an existing store
    pub fn new(config: Config, options: Cli, store: Box<dyn RecordStore>) -> Self {
        Self {
            config,
            options,
            store,
        }
    }

    /// Progress bar for a run step, hidden with `--quiet`
    pub fn progress(&self, prefix: &str) -> Progress {
        progress_for(&self.options, prefix)
    }

    pub fn key_policy(&self) -> KeyPolicy {
        if self.options.strict {
            KeyPolicy::Strict
        } else {
            KeyPolicy::Lenient
        }
    }
}

fn progress_for(options: &Cli, prefix: &str) -> Progress {
    if options.quiet {
        Progress::hidden()
    } else {
        Progress::new(prefix)
    }
}
