//! Basket CLI - Inspect and edit user data in a local document store.
//!
//! # Usage
//!
//! ```bash
//! # Load users from a YAML file
//! basket seed users.yaml
//!
//! # Look a user up
//! basket user show --id u-1
//! basket user show --mobile 9876543210
//! basket user login --mobile 9876543210 --password hunter22
//!
//! # Edit addresses and cart lines (JSON payloads)
//! basket address add --user u-1 --json '{"addressId":"home","city":"Pune"}'
//! basket cart remove --user u-1 --id line-1
//!
//! # Show the global email/mobile index
//! basket index show
//! ```
//!
//! # Environment Variables
//!
//! - `BASKET_DATA_PATH` - Snapshot file (overridden by `--data`)
//! - `BASKET_USERS_COLLECTION`, `BASKET_INDEX_DOCUMENT` - see `basket_data::config`
//! - `RUST_LOG` - Log filter (default: `basket_data=info,basket_cli=info`)
//! - `BASKET_LOG_FORMAT` - `json` for JSON log lines on stderr

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CommandError, Context};

#[derive(Parser)]
#[command(name = "basket")]
#[command(author, version, about = "Basket user data tools")]
struct Cli {
    /// Snapshot file to load and save (defaults to `BASKET_DATA_PATH`)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add users from a YAML file
    Seed {
        /// Path to the YAML file
        file: PathBuf,
    },
    /// Look users up
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage a user's saved addresses
    Address {
        #[command(subcommand)]
        action: ArrayAction,
    },
    /// Manage a user's cart
    Cart {
        #[command(subcommand)]
        action: ArrayAction,
    },
    /// Inspect or extend the global email/mobile index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Show one user by ID or mobile number
    Show {
        /// User ID
        #[arg(long, conflicts_with = "mobile", required_unless_present = "mobile")]
        id: Option<String>,

        /// Mobile number
        #[arg(long)]
        mobile: Option<String>,
    },
    /// Check a mobile/password pair
    Login {
        #[arg(long)]
        mobile: String,

        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum ArrayAction {
    /// List entries
    List {
        /// Owning user ID
        #[arg(long)]
        user: String,
    },
    /// Append an entry given as JSON
    Add {
        #[arg(long)]
        user: String,

        #[arg(long)]
        json: String,
    },
    /// Replace the entry with the same ID, given as JSON
    Update {
        #[arg(long)]
        user: String,

        #[arg(long)]
        json: String,
    },
    /// Remove the entry with this ID
    Remove {
        #[arg(long)]
        user: String,

        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Print the index
    Show,
    /// Record an email and mobile number
    Add {
        #[arg(long)]
        email: String,

        #[arg(long)]
        mobile: String,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "basket_data=info,basket_cli=info".into());

    // JSON lines when BASKET_LOG_FORMAT=json, text otherwise
    let is_json = std::env::var("BASKET_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let ctx = Context::open(cli.data).await?;

    match cli.command {
        Commands::Seed { file } => {
            commands::seed::from_file(&ctx, &file).await?;
            ctx.save().await?;
        }
        Commands::User { action } => match action {
            UserAction::Show { id, mobile } => {
                commands::users::show(&ctx, id.as_deref(), mobile.as_deref()).await?;
            }
            UserAction::Login { mobile, password } => {
                commands::users::login(&ctx, &mobile, &password).await?;
            }
        },
        Commands::Address { action } => {
            run_array::<commands::arrays::Addresses>(&ctx, action).await?;
        }
        Commands::Cart { action } => {
            run_array::<commands::arrays::Cart>(&ctx, action).await?;
        }
        Commands::Index { action } => match action {
            IndexAction::Show => commands::index::show(&ctx).await?,
            IndexAction::Add { email, mobile } => {
                commands::index::add(&ctx, &email, &mobile).await?;
                ctx.save().await?;
            }
        },
    }
    Ok(())
}

async fn run_array<A: commands::arrays::ArrayCommands>(
    ctx: &Context,
    action: ArrayAction,
) -> Result<(), CommandError> {
    match action {
        ArrayAction::List { user } => A::list(ctx, &user).await,
        ArrayAction::Add { user, json } => {
            A::add(ctx, &user, &json).await?;
            ctx.save().await
        }
        ArrayAction::Update { user, json } => {
            A::update(ctx, &user, &json).await?;
            ctx.save().await
        }
        ArrayAction::Remove { user, id } => {
            A::remove(ctx, &user, &id).await?;
            ctx.save().await
        }
    }
}
