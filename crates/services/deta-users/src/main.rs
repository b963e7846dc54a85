//! deta-users - inspect and manage users stored in Deta Base.

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use common::{AppResult, OAuthSyncPolicy};
use deta_users_lib::commands::{self, NewUser};
use deta_users_lib::{config, DetaUserDatabase};

#[derive(Parser)]
#[command(name = "deta-users")]
#[command(about = "Manage users stored in Deta Base")]
struct Cli {
    /// Deta project key (overrides DETA_PROJECT_KEY from the environment)
    #[arg(long, global = true, hide_env_values = true, env = "DETA_PROJECT_KEY")]
    project_key: Option<String>,

    /// Base holding user documents
    #[arg(long, global = true, env = "DETA_USER_BASE")]
    user_base: Option<String>,

    /// Base holding OAuth account documents
    #[arg(long, global = true, env = "DETA_OAUTH_ACCOUNT_BASE")]
    oauth_account_base: Option<String>,

    /// What syncing OAuth accounts does with accounts no longer linked
    #[arg(long, global = true, value_enum)]
    sync_policy: Option<SyncPolicyArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SyncPolicyArg {
    Preserve,
    Reconcile,
}

impl From<SyncPolicyArg> for OAuthSyncPolicy {
    fn from(arg: SyncPolicyArg) -> Self {
        match arg {
            SyncPolicyArg::Preserve => OAuthSyncPolicy::Preserve,
            SyncPolicyArg::Reconcile => OAuthSyncPolicy::Reconcile,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show a user by id
    Get { id: Uuid },
    /// Show a user by email
    FindEmail { email: String },
    /// Show the user linked to an OAuth account
    FindOauth {
        #[arg(long)]
        oauth_name: String,
        #[arg(long)]
        account_id: String,
    },
    /// Create a user from an already hashed password
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        hashed_password: String,
        #[arg(long)]
        superuser: bool,
        #[arg(long)]
        verified: bool,
    },
    /// Delete a user and its OAuth accounts
    Delete { id: Uuid },
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> AppResult<()> {
    let mut config = config::from_env();
    if let Some(project_key) = cli.project_key {
        config.project_key = project_key;
    }
    if let Some(user_base) = cli.user_base {
        config.user_base = user_base;
    }
    if let Some(oauth_account_base) = cli.oauth_account_base {
        config.oauth_account_base = oauth_account_base;
    }
    if let Some(policy) = cli.sync_policy {
        config.oauth_sync_policy = policy.into();
    }
    tracing::debug!("Configuration loaded: {:?}", config);

    let db = DetaUserDatabase::from_config(&config)?;

    let response = match cli.command {
        Commands::Get { id } => commands::get_user(&db, id).await?,
        Commands::FindEmail { email } => commands::find_by_email(&db, &email).await?,
        Commands::FindOauth {
            oauth_name,
            account_id,
        } => commands::find_by_oauth_account(&db, &oauth_name, &account_id).await?,
        Commands::Create {
            email,
            hashed_password,
            superuser,
            verified,
        } => {
            commands::create_user(
                &db,
                NewUser {
                    email,
                    hashed_password,
                    is_superuser: superuser,
                    is_verified: verified,
                },
            )
            .await?
        }
        Commands::Delete { id } => commands::delete_user(&db, id).await?,
    };

    print_json(&response)
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error [{}]: {}", err.code(), err.user_message());
        std::process::exit(1);
    }
}
