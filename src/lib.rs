pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;
pub mod state;

use clap::{CommandFactory, Parser};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use clients::provider::{CashinProviderClient, CashinRequest, ProviderConfig};
pub use config::Config;
use db::Store;
use domain::{Role, UserStatus};

pub async fn run() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = cli::Cli::parse();

    match cli.command {
        Some(cli::Commands::Serve) => {
            config.validate()?;
            run_server(config).await
        }

        Some(cli::Commands::Init) => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists.");
            }
            Ok(())
        }

        Some(cli::Commands::CreateUser {
            email,
            name,
            password,
            role,
            approved,
        }) => cmd_create_user(&config, &email, &name, &password, &role, approved).await,

        Some(cli::Commands::Provider { command }) => match command {
            cli::ProviderCommands::Balance => cmd_provider_balance(&config).await,
            cli::ProviderCommands::Cashin {
                amount_cents,
                payer_name,
                payer_document,
            } => cmd_provider_cashin(&config, amount_cents, &payer_name, &payer_document).await,
        },

        None => {
            cli::Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!(
        "Pixgate v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let state = state::create_app_state(config).await?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("🌐 API server running at http://0.0.0.0:{port}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    info!("Server running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}

async fn cmd_create_user(
    config: &Config,
    email: &str,
    name: &str,
    password: &str,
    role: &str,
    approved: bool,
) -> anyhow::Result<()> {
    let Some(role) = Role::parse(&role.to_ascii_uppercase()) else {
        println!("Unknown role: {role}");
        println!("Use one of: USER, SELLER, ADMIN, SUPER_ADMIN, OWNER");
        return Ok(());
    };

    let store = Store::new(&config.general.database_path).await?;

    if store.get_user_by_email(email).await?.is_some() {
        println!("A user with email {email} already exists.");
        return Ok(());
    }

    let status = if approved {
        UserStatus::Approved
    } else {
        UserStatus::Pending
    };

    let user = store
        .create_user(email, name, password, role, status, &config.security)
        .await?;

    println!("✓ Created user: {} (ID: {})", user.email, user.id);
    println!("  Role:   {}", user.role);
    println!("  Status: {}", user.status);
    if status == UserStatus::Pending {
        println!();
        println!("The account needs admin approval before it can log in.");
    }

    Ok(())
}

async fn cmd_provider_balance(config: &Config) -> anyhow::Result<()> {
    let client = provider_client(config)?;

    println!("Fetching provider balance from {}...", config.provider.base_url);

    let balance = client.get_balance().await?;

    println!();
    println!("Provider Balance");
    println!("{:-<40}", "");
    println!("Available: {} cents", balance.available);
    println!("Blocked:   {} cents", balance.blocked);

    Ok(())
}

async fn cmd_provider_cashin(
    config: &Config,
    amount_cents: i64,
    payer_name: &str,
    payer_document: &str,
) -> anyhow::Result<()> {
    if amount_cents <= 0 {
        println!("Amount must be a positive number of cents.");
        return Ok(());
    }

    let client = provider_client(config)?;
    let external_id = uuid::Uuid::new_v4().to_string();

    println!("Creating cash-in charge ({amount_cents} cents) for {payer_name}...");

    let charge = client
        .create_cashin(&CashinRequest {
            external_id: external_id.clone(),
            value: amount_cents,
            payer_name: payer_name.to_string(),
            payer_document: payer_document.to_string(),
        })
        .await?;

    println!();
    println!("✓ Charge created");
    println!("  External ID:    {external_id}");
    println!("  Transaction ID: {}", charge.transaction_id);
    println!("  QR Code:        {}", charge.qr_code);
    if let Some(copy_paste) = charge.copy_paste {
        println!("  Copy & paste:   {copy_paste}");
    }

    Ok(())
}

fn provider_client(config: &Config) -> anyhow::Result<CashinProviderClient> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(
            config.provider.request_timeout_seconds,
        ))
        .user_agent("Pixgate/1.0")
        .build()?;

    Ok(CashinProviderClient::with_shared_client(
        ProviderConfig {
            base_url: config.provider.base_url.clone(),
            bearer_token: config.provider.bearer_token.clone(),
        },
        client,
    ))
}
