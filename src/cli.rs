//! CLI for operating pixgate: running the server, bootstrapping config and
//! accounts, and exercising the cash-in provider API directly.

use clap::{Parser, Subcommand};

/// Pixgate - PIX payment gateway backend
#[derive(Parser)]
#[command(name = "pixgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server
    #[command(alias = "-d", alias = "--daemon")]
    Serve,

    /// Create default config file
    Init,

    /// Create a user account
    CreateUser {
        email: String,

        name: String,

        password: String,

        /// USER, SELLER, ADMIN, SUPER_ADMIN or OWNER
        #[arg(long, default_value = "USER")]
        role: String,

        /// Create the account already approved instead of pending
        #[arg(long)]
        approved: bool,
    },

    /// Exercise the cash-in provider API
    Provider {
        #[command(subcommand)]
        command: ProviderCommands,
    },
}

#[derive(Subcommand)]
pub enum ProviderCommands {
    /// Fetch the provider-side account balance
    Balance,

    /// Create a PIX QR-code cash-in charge
    Cashin {
        /// Charge amount in integer BRL cents
        amount_cents: i64,

        payer_name: String,

        payer_document: String,
    },
}
