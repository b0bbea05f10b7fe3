//! NeuPool CLI - Pool service logging, inventory and account management.
//!
//! # Usage
//!
//! ```bash
//! # Create the snapshot with the demo accounts and pools
//! neupool state init
//!
//! # Log a visit, asking the advisor for dosing first
//! neupool -u tech -p password measure pool-1 --ph 7.9 --fc 1.5 --drained-half
//!
//! # Log a visit without the advisor, with a manual addition
//! neupool -u tech -p password measure pool-2 --skip-advisor --manual "Soda Ash:1.5:lbs"
//!
//! # Show the history of a pool
//! neupool -u admin -p password history pool-1
//! ```
//!
//! # Commands
//!
//! - `state` - Initialise, print or import the snapshot
//! - `register` - Create a technician account from `--user`/`--password`
//! - `user` - List, delete, grant or revoke pool access (admin)
//! - `pool` - List, add, update or delete pools
//! - `inventory` - List stock; add, adjust or delete items (admin)
//! - `measure` - Record a service visit
//! - `history` - Show a pool's log entries

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use neupool_app::{AppConfig, LogFormat};
use neupool_core::{Category, SanitizerType, Surface};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CommandError, Credentials};

#[derive(Parser)]
#[command(name = "neupool")]
#[command(author, version, about = "NeuPool service log and chemistry assistant")]
struct Cli {
    /// Acting username
    #[arg(short, long, global = true, env = "NEUPOOL_USER")]
    user: Option<String>,

    /// Password of the acting user
    #[arg(short, long, global = true, env = "NEUPOOL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialise, print or import the state snapshot
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Register a technician account using --user and --password
    Register,
    /// Manage user accounts (admin)
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage pools
    Pool {
        #[command(subcommand)]
        action: PoolAction,
    },
    /// Manage chemical inventory
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },
    /// Record a service visit
    Measure(MeasureArgs),
    /// Show a pool's service history, oldest first
    History {
        /// Pool ID (works for deleted pools)
        pool: String,

        /// Only show the newest N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// Write the demo seed state
    Init {
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },
    /// Print the snapshot as JSON
    Show,
    /// Replace the snapshot with a YAML document
    Import {
        /// Path to the YAML file
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List accounts and their pool assignments
    List,
    /// Delete an account (log entries are kept)
    Delete {
        /// Username
        username: String,
    },
    /// Give a user access to a pool
    Grant {
        /// Username
        username: String,
        /// Pool ID
        pool: String,
    },
    /// Remove a user's access to a pool
    Revoke {
        /// Username
        username: String,
        /// Pool ID
        pool: String,
    },
}

#[derive(Args)]
struct PoolArgs {
    /// Display name
    #[arg(long)]
    name: String,

    /// Volume in gallons
    #[arg(long)]
    volume: u32,

    /// Sanitizer system (chlorine, salt)
    #[arg(long, default_value = "chlorine")]
    sanitizer: SanitizerType,

    /// Interior surface (plaster, vinyl, fiberglass)
    #[arg(long, default_value = "plaster")]
    surface: Surface,

    /// Pool or spa
    #[arg(long, default_value = "pool")]
    category: Category,

    /// Free-text notes
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args)]
struct PoolUpdateArgs {
    /// New display name
    #[arg(long)]
    name: Option<String>,

    /// New volume in gallons
    #[arg(long)]
    volume: Option<u32>,

    /// New sanitizer system
    #[arg(long)]
    sanitizer: Option<SanitizerType>,

    /// New interior surface
    #[arg(long)]
    surface: Option<Surface>,

    /// New category
    #[arg(long)]
    category: Option<Category>,

    /// New notes (empty string clears them)
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum PoolAction {
    /// List pools visible to the acting user
    List,
    /// Add a pool (admin)
    Add(PoolArgs),
    /// Update a pool's configuration
    Update {
        /// Pool ID
        id: String,
        #[command(flatten)]
        changes: PoolUpdateArgs,
    },
    /// Delete a pool (admin); its history is kept
    Delete {
        /// Pool ID
        id: String,
    },
}

#[derive(Subcommand)]
enum InventoryAction {
    /// List stock
    List {
        /// Only items at or below their reorder threshold
        #[arg(long)]
        low: bool,
    },
    /// Add a stock item (admin)
    Add {
        /// Product name
        #[arg(long)]
        name: String,

        /// Initial stock
        #[arg(long, default_value = "0")]
        quantity: Decimal,

        /// Unit of measure (default lbs)
        #[arg(long)]
        unit: Option<String>,

        /// Supplier name
        #[arg(long)]
        vendor: Option<String>,

        /// Supplier product page
        #[arg(long)]
        vendor_url: Option<String>,

        /// Reorder threshold
        #[arg(long)]
        min: Option<Decimal>,
    },
    /// Change stock by a signed amount, clamped at zero (admin)
    Adjust {
        /// Item ID
        id: String,

        /// Amount to add; negative to remove
        #[arg(allow_hyphen_values = true)]
        delta: Decimal,
    },
    /// Delete a stock item (admin)
    Delete {
        /// Item ID
        id: String,
    },
}

#[derive(Args)]
struct MeasureArgs {
    /// Pool ID
    pool: String,

    /// pH
    #[arg(long, value_parser = parse_reading)]
    ph: Option<f64>,

    /// Free chlorine, ppm
    #[arg(long = "fc", value_parser = parse_reading)]
    free_chlorine: Option<f64>,

    /// Total alkalinity, ppm
    #[arg(long = "ta", value_parser = parse_reading)]
    total_alkalinity: Option<f64>,

    /// Cyanuric acid, ppm
    #[arg(long = "cya", value_parser = parse_reading)]
    cyanuric_acid: Option<f64>,

    /// Calcium hardness, ppm
    #[arg(long = "calcium", value_parser = parse_reading)]
    calcium_hardness: Option<f64>,

    /// Salt level, ppm (salt systems only)
    #[arg(long = "salt", value_parser = parse_reading)]
    salt_level: Option<f64>,

    /// Water temperature, Fahrenheit
    #[arg(long = "temp", value_parser = parse_reading)]
    temperature: Option<f64>,

    /// Fresh water was added
    #[arg(long)]
    water_added: bool,

    /// Water was drained
    #[arg(long)]
    drained: bool,

    /// More than half of the water was drained and refilled
    #[arg(long)]
    drained_half: bool,

    /// Manual addition as NAME:AMOUNT:UNIT (repeatable)
    #[arg(long = "manual", value_name = "NAME:AMOUNT:UNIT")]
    manual: Vec<String>,

    /// Visit notes
    #[arg(long)]
    notes: Option<String>,

    /// Log the visit without asking the advisor
    #[arg(long)]
    skip_advisor: bool,

    /// Show the recommendation without saving anything
    #[arg(long, conflicts_with = "skip_advisor")]
    dry_run: bool,
}

fn init_tracing(format: LogFormat) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "neupool=info".into());

    let json_layer = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (format == LogFormat::Text)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = AppConfig::from_env();
    init_tracing(
        config
            .as_ref()
            .map_or(LogFormat::Text, |c| c.log_format),
    );

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(CommandError::from(neupool_app::AppError::from(e))),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), CommandError> {
    let credentials = Credentials::new(cli.user, cli.password);

    match cli.command {
        Commands::State { action } => match action {
            StateAction::Init { force } => commands::state::init(&config, force).await?,
            StateAction::Show => commands::state::show(config).await?,
            StateAction::Import { path } => commands::state::import(&config, &path).await?,
        },
        Commands::Register => commands::users::register(config, &credentials).await?,
        Commands::User { action } => {
            let mut ctx = neupool_app::AppContext::load(config).await?;
            match action {
                UserAction::List => commands::users::list(&ctx, &credentials)?,
                UserAction::Delete { username } => {
                    commands::users::delete(&mut ctx, &credentials, &username).await?;
                }
                UserAction::Grant { username, pool } => {
                    commands::users::set_access(&mut ctx, &credentials, &username, &pool, true)
                        .await?;
                }
                UserAction::Revoke { username, pool } => {
                    commands::users::set_access(&mut ctx, &credentials, &username, &pool, false)
                        .await?;
                }
            }
        }
        Commands::Pool { action } => {
            let mut ctx = neupool_app::AppContext::load(config).await?;
            match action {
                PoolAction::List => commands::pools::list(&ctx, &credentials)?,
                PoolAction::Add(args) => {
                    commands::pools::add(&mut ctx, &credentials, args.into()).await?;
                }
                PoolAction::Update { id, changes } => {
                    commands::pools::update(&mut ctx, &credentials, &id, changes.into()).await?;
                }
                PoolAction::Delete { id } => {
                    commands::pools::delete(&mut ctx, &credentials, &id).await?;
                }
            }
        }
        Commands::Inventory { action } => {
            let mut ctx = neupool_app::AppContext::load(config).await?;
            match action {
                InventoryAction::List { low } => {
                    commands::inventory::list(&ctx, &credentials, low)?;
                }
                InventoryAction::Add {
                    name,
                    quantity,
                    unit,
                    vendor,
                    vendor_url,
                    min,
                } => {
                    let item = commands::inventory::NewItemArgs {
                        name,
                        quantity,
                        unit,
                        vendor,
                        vendor_url,
                        min,
                    };
                    commands::inventory::add(&mut ctx, &credentials, item).await?;
                }
                InventoryAction::Adjust { id, delta } => {
                    commands::inventory::adjust(&mut ctx, &credentials, &id, delta).await?;
                }
                InventoryAction::Delete { id } => {
                    commands::inventory::delete(&mut ctx, &credentials, &id).await?;
                }
            }
        }
        Commands::Measure(args) => {
            let mut ctx = neupool_app::AppContext::load(config).await?;
            commands::measure::run(&mut ctx, &credentials, args.into()).await?;
        }
        Commands::History { pool, limit } => {
            let ctx = neupool_app::AppContext::load(config).await?;
            commands::history::show(&ctx, &credentials, &pool, limit)?;
        }
    }
    Ok(())
}

impl From<PoolArgs> for commands::pools::NewPool {
    fn from(args: PoolArgs) -> Self {
        Self {
            config: neupool_core::PoolConfig {
                name: args.name,
                volume_gallons: args.volume,
                sanitizer: args.sanitizer,
                surface: args.surface,
                category: args.category,
            },
            notes: args.notes,
        }
    }
}

impl From<PoolUpdateArgs> for commands::pools::PoolChanges {
    fn from(args: PoolUpdateArgs) -> Self {
        Self {
            name: args.name,
            volume_gallons: args.volume,
            sanitizer: args.sanitizer,
            surface: args.surface,
            category: args.category,
            notes: args.notes,
        }
    }
}

/// Parse a test reading, rejecting NaN, infinity and negative values.
fn parse_reading(value: &str) -> Result<f64, String> {
    let reading: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("{value:?} is not a number: {e}"))?;
    if !reading.is_finite() || reading < 0.0 {
        return Err(format!("{value:?} must be a finite, non-negative number"));
    }
    Ok(reading)
}

impl From<MeasureArgs> for commands::measure::Visit {
    fn from(args: MeasureArgs) -> Self {
        Self {
            pool: args.pool,
            readings: commands::measure::ReadingOverrides {
                ph: args.ph,
                free_chlorine: args.free_chlorine,
                total_alkalinity: args.total_alkalinity,
                cyanuric_acid: args.cyanuric_acid,
                calcium_hardness: args.calcium_hardness,
                salt_level: args.salt_level,
                temperature: args.temperature,
            },
            water_events: neupool_core::WaterEvents::new(
                args.water_added,
                args.drained,
                args.drained_half,
            ),
            manual: args.manual,
            notes: args.notes,
            skip_advisor: args.skip_advisor,
            dry_run: args.dry_run,
        }
    }
}
