//! ocsync CLI - operator commands for the catalog gateway.
//!
//! # Usage
//!
//! ```bash
//! # Add the extension columns to the storefront schema
//! ocsync schema
//!
//! # Finalize a batch outside the HTTP API
//! ocsync batch finalize 2026-10-19-full
//!
//! # Remove image files no product references
//! ocsync images gc
//!
//! # Print a product as the gateway sees it
//! ocsync product show SKU-0001
//! ```
//!
//! The CLI reads the same environment as the gateway (`OCSYNC_*`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ocsync")]
#[command(author, version, about = "ocsync catalog gateway tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add missing extension columns to the storefront schema
    Schema,
    /// Batch lifecycle
    Batch {
        #[command(subcommand)]
        action: BatchAction,
    },
    /// Image files
    Images {
        #[command(subcommand)]
        action: ImagesAction,
    },
    /// Product lookups
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum BatchAction {
    /// Deactivate products outside the batch and remove orphan images
    Finalize {
        /// Batch UID every current product was tagged with
        batch_uid: String,
    },
}

#[derive(Subcommand)]
enum ImagesAction {
    /// Delete image files that no product references
    Gc,
}

#[derive(Subcommand)]
enum ProductAction {
    /// Print a product by UID as JSON
    Show {
        /// Product UID
        uid: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocsync_gateway=info,ocsync=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Schema => commands::schema::ensure().await?,
        Commands::Batch { action } => match action {
            BatchAction::Finalize { batch_uid } => commands::batch::finalize(&batch_uid).await?,
        },
        Commands::Images { action } => match action {
            ImagesAction::Gc => commands::images::collect_garbage().await?,
        },
        Commands::Product { action } => match action {
            ProductAction::Show { uid } => commands::product::show(&uid).await?,
        },
    }
    Ok(())
}
