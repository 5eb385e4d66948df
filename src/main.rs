use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use altura_client::client::ApiClient;
use altura_client::config::{CliArgs, Config};
use altura_client::realm::Realm;
use altura_client::session::NoopNavigator;
use altura_client::store::{CredentialStore, SqliteStore};

/// Altura investment platform API client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the issued token pair
    Login {
        /// Account email
        email: String,

        /// Account password
        password: String,

        /// Use the administrative console realm
        #[arg(long)]
        admin: bool,
    },

    /// Clear the realm's stored credentials
    Logout {
        /// Use the administrative console realm
        #[arg(long)]
        admin: bool,
    },

    /// Perform a GET request through the authenticated pipeline
    Get {
        /// Request path, e.g. /api/profile
        path: String,
    },

    /// Show which realms currently hold credentials
    Status,
}

fn realm_for(admin: bool) -> Realm {
    if admin {
        Realm::Admin
    } else {
        Realm::User
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_args(&cli.args)?;
    config.validate()?;

    // Initialize logging with the configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    tracing::debug!("Using backend at {}", config.api_url);

    let store = Arc::new(SqliteStore::open(&config.credentials_file)?);
    let client = ApiClient::new(
        config.api_url.clone(),
        store.clone(),
        Arc::new(NoopNavigator),
        config.http_max_connections,
        config.http_connect_timeout,
        config.http_request_timeout,
        config.refresh_timeout,
    )?;

    match cli.command {
        Command::Login {
            email,
            password,
            admin,
        } => {
            let realm = realm_for(admin);
            client.login(realm, &email, &password).await?;
            println!("Logged in to {:?} realm", realm);
        }

        Command::Logout { admin } => {
            let realm = realm_for(admin);
            client.logout(realm)?;
            println!("Logged out of {:?} realm", realm);
        }

        Command::Get { path } => {
            let response = client.get(&path).await?;
            let body = response.text().await?;
            match serde_json::from_str::<serde_json::Value>(&body) {
                Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                Err(_) => println!("{}", body),
            }
        }

        Command::Status => {
            for realm in Realm::ALL {
                match store.load(realm)? {
                    Some(pair) => {
                        let updated = pair
                            .updated_at
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| "unknown".to_string());
                        println!("{:?}: logged in (tokens updated {})", realm, updated);
                    }
                    None => println!("{:?}: no credentials", realm),
                }
            }
        }
    }

    Ok(())
}
