use clap::{Parser, Subcommand};

/// Catalog API backend for the parts shop
#[derive(Parser)]
#[command(name = "shopd", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind (overrides SHOP_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage registered services and their tokens
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },
}

#[derive(Subcommand)]
pub enum ServiceCommands {
    /// Register a service and issue its bearer token
    Create {
        #[arg(long)]
        name: String,
        /// Administrator label recorded in the audit columns
        #[arg(long)]
        actor: Option<String>,
    },
    /// Rotate a service's token; the old token stops working immediately
    Rotate {
        service_id: String,
        #[arg(long)]
        actor: Option<String>,
    },
    /// List registered services
    List,
    /// Delete a service (hard delete)
    Delete { service_id: String },
}
