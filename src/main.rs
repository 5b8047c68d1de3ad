//! CostChef
//!
//! An MCP server for warehouse pricing and dish cost calculation.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use costchef::build_info;
use costchef::config::Config;
use costchef::db;
use costchef::mcp::CostChefService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    // Log to stderr so stdout stays free for MCP framing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .with_writer(std::io::stderr)
        .init();

    build_info::log_startup_banner();
    tracing::info!(path = %config.database_path.display(), "Opening database");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = db::Database::new(&config.database_path)?;

    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        tracing::info!(version, "Database schema ready");
        Ok(())
    })?;

    let service = CostChefService::new(config.database_path.clone(), database);

    tracing::info!("Starting MCP server on stdio");
    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}
