//! Stash administration - manage users and the server secret offline

use anyhow::Context;
use clap::{Parser, Subcommand};
use stash_gateway::config::DEFAULT_CONFIG_FILE;
use stash_gateway::{CredentialStore, TomlConfigStore};
use std::path::PathBuf;
use std::sync::Arc;
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[command(name = "stash-admin")]
#[command(about = "Manage Stash gateway credentials")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "STASH_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user or replace their password
    SetUser {
        #[arg(short, long)]
        username: String,

        /// Password (at least 8 characters)
        #[arg(short, long, env = "STASH_PASSWORD", hide_env_values = true)]
        password: String,

        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },
    /// List configured users
    ListUsers,
    /// Generate a new server secret, invalidating every issued token
    RotateSecret,
    /// Print the server secret used for stateless login
    ShowSecret,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stash_gateway=warn".into()),
        )
        .init();

    let store = Arc::new(TomlConfigStore::new(&args.config));
    let credentials = CredentialStore::load(store)
        .await
        .with_context(|| format!("loading {}", args.config.display()))?;

    match args.command {
        Command::SetUser {
            username,
            password,
            admin,
        } => {
            let password = Zeroizing::new(password);
            let credential = credentials
                .set_credential(&username, &password, admin)
                .await
                .with_context(|| format!("storing credential for {username}"))?;
            println!(
                "✅ Stored user '{}'{}",
                credential.username,
                if credential.is_admin { " (admin)" } else { "" }
            );
        }
        Command::ListUsers => {
            let users = credentials.list_users();
            if users.is_empty() {
                println!("No users configured");
            }
            for user in users {
                let role = if user.is_admin { "admin" } else { "user" };
                println!("{:<32} {}", user.username, role);
            }
        }
        Command::RotateSecret => {
            credentials.rotate_secret().await.context("rotating server secret")?;
            println!("🔑 Server secret rotated; outstanding tokens are no longer valid");
        }
        Command::ShowSecret => {
            let secret = Zeroizing::new(credentials.secret().to_hex());
            println!("{}", secret.as_str());
        }
    }

    Ok(())
}
