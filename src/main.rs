use anyhow::{Context, Result};
use armstore::arm::groups::list_group_names;
use armstore::arm::http::format_arm_error;
use armstore::arm::{ArmError, Credentials};
use armstore::resource::validate::parse_tag;
use armstore::resource::{KeyName, ResourceRecord, SnapshotParams, StorageAccountParams};
use armstore::{ClientConfig, Config, ResourceClient};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Azure storage accounts and snapshots from the command line
#[derive(Parser, Debug)]
#[command(name = "armstore", version, about, long_about = None)]
struct Args {
    /// Subscription to use
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Default resource group for commands that need one
    #[arg(short, long, global = true)]
    group: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Storage account operations
    #[command(subcommand)]
    Accounts(AccountCommand),
    /// Snapshot operations
    #[command(subcommand)]
    Snapshots(SnapshotCommand),
    /// List resource group names
    Groups,
    /// Remember subscription/group as defaults
    SetDefaults,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// List accounts in one group, or in every group when no group is set
    List {
        /// Query every resource group even if a default group is configured
        #[arg(long)]
        all_groups: bool,
    },
    /// List accounts with one subscription-wide request
    ListAll,
    /// Show one account
    Show {
        name: String,
        /// Include access keys in the output
        #[arg(long)]
        keys: bool,
    },
    /// Create an account
    Create(AccountSpec),
    /// Update an account (same request as create)
    Update(AccountSpec),
    /// Delete an account
    Delete { name: String },
    /// Show access keys
    Keys { name: String },
    /// Regenerate one access key
    RegenerateKey {
        name: String,
        #[arg(long, value_enum, default_value = "key1")]
        key: KeyArg,
    },
}

#[derive(ClapArgs, Debug)]
struct AccountSpec {
    name: String,
    #[arg(short, long)]
    location: String,
    /// Standard_LRS, Standard_ZRS, Standard_GRS or Standard_RAGRS
    #[arg(long, default_value = "Standard_LRS")]
    sku: String,
    /// Tag as key=value, repeatable
    #[arg(long = "tag")]
    tags: Vec<String>,
}

impl AccountSpec {
    fn into_params(self) -> Result<StorageAccountParams> {
        Ok(StorageAccountParams {
            tags: parse_tags(&self.tags)?,
            name: self.name,
            location: self.location,
            account_type: self.sku,
        })
    }
}

#[derive(Subcommand, Debug)]
enum SnapshotCommand {
    /// List snapshots in one group, or in every group when no group is set
    List {
        #[arg(long)]
        all_groups: bool,
    },
    /// List snapshots with one subscription-wide request
    ListAll,
    /// Show one snapshot
    Show { name: String },
    /// Create or update a snapshot
    Create {
        name: String,
        #[arg(short, long)]
        location: String,
        /// JSON object sent as `properties`
        #[arg(long, default_value = "{}")]
        properties: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a snapshot
    Delete { name: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KeyArg {
    Key1,
    Key2,
}

impl From<KeyArg> for KeyName {
    fn from(arg: KeyArg) -> Self {
        match arg {
            KeyArg::Key1 => KeyName::Key1,
            KeyArg::Key2 => KeyName::Key2,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("armstore started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("armstore").join("armstore.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".armstore").join("armstore.log");
    }
    PathBuf::from("armstore.log")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_tags(args: &[String]) -> Result<BTreeMap<String, String>> {
    args.iter()
        .map(|arg| parse_tag(arg).map_err(anyhow::Error::from))
        .collect()
}

/// Subscription-wide listings carry no group tag; recover it from each `id`
fn groups_from_ids(records: Vec<ResourceRecord>) -> Vec<ResourceRecord> {
    records
        .into_iter()
        .map(ResourceRecord::with_group_from_id)
        .collect()
}

/// 2 for arguments rejected before any request, 1 otherwise
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ArmError>() {
        Some(arm) if arm.is_validation() => 2,
        _ => 1,
    }
}

/// `--all-groups` forces the fan-out; otherwise the default group, if any, is used
fn listing_group(config: &ClientConfig, all_groups: bool) -> Option<String> {
    if all_groups {
        None
    } else {
        config.default_resource_group.clone()
    }
}

async fn run_accounts(client: &ResourceClient, config: &ClientConfig, cmd: AccountCommand) -> Result<()> {
    let storage = &client.storage;
    match cmd {
        AccountCommand::List { all_groups } => {
            let group = listing_group(config, all_groups);
            print_json(&storage.list(group.as_deref()).await?)
        }
        AccountCommand::ListAll => {
            print_json(&groups_from_ids(storage.list_all_for_subscription().await?))
        }
        AccountCommand::Show { name, keys } => {
            let group = config.resolve_group(None)?;
            print_json(&storage.get(&name, &group, keys).await?)
        }
        AccountCommand::Create(spec) => {
            let group = config.resolve_group(None)?;
            print_json(&storage.create(&spec.into_params()?, &group).await?)
        }
        AccountCommand::Update(spec) => {
            let group = config.resolve_group(None)?;
            print_json(&storage.update(&spec.into_params()?, &group).await?)
        }
        AccountCommand::Delete { name } => {
            let group = config.resolve_group(None)?;
            print_json(&storage.delete(&name, &group).await?)
        }
        AccountCommand::Keys { name } => {
            let group = config.resolve_group(None)?;
            print_json(&storage.list_account_keys(&name, &group).await?)
        }
        AccountCommand::RegenerateKey { name, key } => {
            let group = config.resolve_group(None)?;
            print_json(&storage.regenerate_key(&name, &group, key.into()).await?)
        }
    }
}

async fn run_snapshots(client: &ResourceClient, config: &ClientConfig, cmd: SnapshotCommand) -> Result<()> {
    let snapshots = &client.snapshots;
    match cmd {
        SnapshotCommand::List { all_groups } => {
            let group = listing_group(config, all_groups);
            print_json(&snapshots.list(group.as_deref()).await?)
        }
        SnapshotCommand::ListAll => {
            print_json(&groups_from_ids(snapshots.list_all_for_subscription().await?))
        }
        SnapshotCommand::Show { name } => {
            let group = config.resolve_group(None)?;
            print_json(&snapshots.get(&name, &group).await?)
        }
        SnapshotCommand::Create {
            name,
            location,
            properties,
            tags,
        } => {
            let group = config.resolve_group(None)?;
            let properties = serde_json::from_str(&properties)
                .context("--properties must be a JSON object")?;
            let mut params = SnapshotParams::new(&name, &location).with_properties(properties);
            params.tags = parse_tags(&tags)?;
            print_json(&snapshots.create(&params, &group).await?)
        }
        SnapshotCommand::Delete { name } => {
            let group = config.resolve_group(None)?;
            print_json(&snapshots.delete(&name, &group).await?)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut file_config = Config::load();

    if let Command::SetDefaults = args.command {
        if let Some(sub) = args.subscription {
            file_config.subscription_id = Some(sub);
        }
        if let Some(group) = args.group {
            file_config.resource_group = Some(group);
        }
        file_config.save()?;
        println!("Saved to {:?}", Config::config_path().unwrap_or_default());
        return Ok(());
    }

    let config = file_config.client_config(args.subscription.as_deref(), args.group.as_deref())?;
    tracing::info!("Using subscription {}", config.subscription_id);

    let client = ResourceClient::new(&config, Credentials::from_env(&config.endpoint))?;

    match args.command {
        Command::Accounts(cmd) => run_accounts(&client, &config, cmd).await,
        Command::Snapshots(cmd) => run_snapshots(&client, &config, cmd).await,
        Command::Groups => print_json(&list_group_names(client.groups.as_ref()).await?),
        Command::SetDefaults => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(e) = run(args).await {
        let message = match e.downcast_ref::<ArmError>() {
            Some(ArmError::GroupsFailed { failures, records }) => {
                // still print what the healthy groups returned
                if let Err(print_err) = print_json(records) {
                    tracing::error!("Failed to print partial results: {}", print_err);
                }
                let groups: Vec<_> = failures.iter().map(|f| f.group.as_str()).collect();
                format!("{} resource group(s) failed: {}", groups.len(), groups.join(", "))
            }
            Some(arm) => format_arm_error(arm),
            None => format!("{:#}", e),
        };
        tracing::error!("{:#}", e);
        eprintln!("Error: {}", message);
        std::process::exit(exit_code(&e));
    }
}
