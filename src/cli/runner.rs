//! CLI runner - executes commands

use crate::auth::AuthConfig;
use crate::cli::commands::{Cli, Commands};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::connect::{ConnectClient, LookupParams};
use crate::pagination::{PageOptions, PagedItem};
use crate::query::Query;
use crate::response::ResponseBody;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::Write;
use tracing::debug;

/// Fields printed by the lookup commands
const LOOKUP_FIELDS: [&str; 3] = ["entity", "risk", "timestamps"];

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::IpLookup { ip } => {
                let client = self.connect_client()?;
                let body = client.lookup_ip(ip, &lookup_params()).await?;
                print_json(&body, true)
            }
            Commands::DomainNameLookup { domain } => {
                let client = self.connect_client()?;
                let body = client.lookup_domain(domain, &lookup_params()).await?;
                print_json(&body, true)
            }
            Commands::Query {
                json,
                limit,
                field,
                batch_size,
                unique,
            } => {
                let mut options = PageOptions::new()
                    .batch_size(*batch_size)
                    .unique(*unique);
                if let Some(limit) = limit {
                    options = options.limit(*limit);
                }
                if let Some(field) = field {
                    options = options.field(field);
                }
                self.query(json, options).await
            }
            Commands::Status { statistics } => {
                let client = self.api_client()?;
                let status = client.get_status(*statistics).await?;
                print_json(&status, true)
            }
        }
    }

    fn client_config(&self) -> Result<ClientConfig> {
        match &self.cli.config {
            Some(path) => {
                debug!("Loading client config from {}", path.display());
                ClientConfig::from_yaml_file(path)
                    .with_context(|| format!("Could not load client config {}", path.display()))
            }
            None => Ok(ClientConfig::default()),
        }
    }

    fn auth(&self) -> AuthConfig {
        AuthConfig::from_token(self.cli.token.as_deref())
    }

    fn api_client(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(self.auth(), self.client_config()?)?)
    }

    fn connect_client(&self) -> Result<ConnectClient> {
        Ok(ConnectClient::new(self.auth(), self.client_config()?)?)
    }

    async fn query(&self, json: &str, options: PageOptions) -> Result<()> {
        let value: Value = serde_json::from_str(json).context("Invalid query JSON")?;
        let query = Query::from_value(value)?;

        let client = self.api_client()?;
        let mut pager = client.paged_query(&query, options)?;
        while let Some(item) = pager.next().await {
            print_json(&item_to_json(item?), false)?;
        }
        debug!(
            "Query done: {} pages, {} items",
            pager.state().pages,
            pager.state().yielded
        );
        Ok(())
    }
}

fn lookup_params() -> LookupParams {
    LookupParams::new().fields(LOOKUP_FIELDS)
}

/// JSON rendering of a paged item
fn item_to_json(item: PagedItem) -> Value {
    match item {
        PagedItem::Value(value) => value,
        PagedItem::Entry(key, value) => json!({ key: value }),
        PagedItem::CsvHeader(columns) => json!(columns),
        PagedItem::CsvRow(row) => json!(row),
        PagedItem::Response(response) => match response.into_result() {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => Value::String(text),
        },
    }
}

fn print_json(value: &Value, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{out}")?;
    Ok(())
}
