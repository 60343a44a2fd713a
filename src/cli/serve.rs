//! Serve command implementation.

use crate::error::Result;
use crate::storage::ResolvedConfig;

/// Execute the serve command.
pub async fn execute(config: &ResolvedConfig) -> Result<()> {
    tracing::debug!(
        bind = %config.bind,
        bind_source = %config.sources.bind,
        storage = %config.storage,
        db_path = %config.db_path.display(),
        config_path = %config.config_path.display(),
        "Starting server"
    );
    crate::server::serve(config).await
}
