//! NovaShop CLI - session store migrations and backend checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table in the storefront database
//! ns-cli migrate
//!
//! # List the catalog through the storefront's API client
//! ns-cli products
//! ns-cli products --query "wireless mouse"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ns-cli")]
#[command(author, version, about = "NovaShop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the session store table
    Migrate,
    /// List products from the backend API
    Products {
        /// Search text; omit to list everything
        #[arg(short, long, default_value = "")]
        query: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::Products { query } => commands::products::list(&query).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_products_query_defaults_to_empty() {
        let cli = Cli::try_parse_from(["ns-cli", "products"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Products { query }) if query.is_empty()
        ));
    }
}
