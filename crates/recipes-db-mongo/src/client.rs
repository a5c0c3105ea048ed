//! Client construction for the MongoDB storage backend.

use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::{debug, info, instrument};

use crate::config::MongoConfig;
use crate::error::Result;

/// Builds a client for the configured deployment and returns the target database.
///
/// The driver connects lazily; call [`ping`] to fail fast on a bad deployment.
#[instrument(skip(config), fields(uri = %mask_password(&config.uri), database = %config.database))]
pub(crate) async fn connect(config: &MongoConfig) -> Result<Database> {
    info!(
        connect_timeout_ms = config.connect_timeout_ms,
        "Creating MongoDB client"
    );

    let mut options = ClientOptions::parse(&config.uri).await?;
    let timeout = Duration::from_millis(config.connect_timeout_ms);
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);
    options.app_name = config.app_name.clone();

    let client = Client::with_options(options)?;
    Ok(client.database(&config.database))
}

/// Round-trips a `ping` command.
#[instrument(skip(database), fields(database = %database.name()))]
pub(crate) async fn ping(database: &Database) -> Result<()> {
    database.run_command(doc! { "ping": 1 }).await?;
    debug!("MongoDB ping successful");
    Ok(())
}

/// Masks the password in a connection string for logging.
pub(crate) fn mask_password(uri: &str) -> String {
    if let Some(at_pos) = uri.find('@')
        && let Some(colon_pos) = uri[..at_pos].rfind(':')
    {
        let scheme_end = uri.find("://").map(|p| p + 3).unwrap_or(0);
        if colon_pos > scheme_end {
            return format!("{}:****{}", &uri[..colon_pos], &uri[at_pos..]);
        }
    }
    uri.to_string()
}
