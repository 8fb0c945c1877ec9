use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use version_gate::config::{self, GateConfig};
use version_gate::gate::{MemoryCache, RequestScope, UPGRADE_REQUIRED_STATUS, UpgradeGateway};
use version_gate::platform::Platform;
use version_gate::policy::{PolicyEntry, SqlitePolicyStore};
use version_gate::version::AppVersion;

#[derive(Parser)]
#[command(name = "version-gate")]
#[command(version, about = "Version policy gate for mobile clients")]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the policy database (overrides the configuration file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a client user agent against the current policy
    Check {
        /// Client user agent string
        #[arg(long)]
        user_agent: String,

        /// Evaluate as of this RFC 3339 time instead of now
        #[arg(long)]
        at: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage policy rows
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// Add or update the row for a (platform, version) pair
    Add {
        /// Platform name (iOS or Android)
        #[arg(long)]
        platform: String,

        /// App version, `X.Y.Z` with an optional trailing tag
        #[arg(long)]
        version: String,

        /// Expiry for clients at or below this version, RFC 3339
        #[arg(long)]
        expire_at: Option<String>,

        /// Keep the row but hide it from the gate
        #[arg(long)]
        disabled: bool,
    },

    /// List all rows, newest version first per platform
    List,

    /// Remove the row for a (platform, version) pair
    Remove {
        /// Platform name (iOS or Android)
        #[arg(long)]
        platform: String,

        /// App version as stored
        #[arg(long)]
        version: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let db_path = cli
        .db
        .or(config.database.path.clone())
        .unwrap_or_else(config::db_path);
    let store = SqlitePolicyStore::open(&db_path)
        .with_context(|| format!("opening policy database at {}", db_path.display()))?;

    match cli.command {
        Command::Check {
            user_agent,
            at,
            json,
        } => check(store, &config, &user_agent, at.as_deref(), json),
        Command::Policy { action } => policy(store, action),
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<GateConfig> {
    let Some(path) = path else {
        return Ok(GateConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading configuration at {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing configuration at {}", path.display()))
}

fn parse_platform(raw: &str) -> anyhow::Result<Platform> {
    raw.parse()
        .map_err(|()| anyhow::anyhow!("unknown platform {raw:?} (expected iOS or Android)"))
}

fn parse_time(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid RFC 3339 timestamp {raw:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn check(
    store: SqlitePolicyStore,
    config: &GateConfig,
    user_agent: &str,
    at: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let now = match at {
        Some(raw) => parse_time(raw)?,
        None => Utc::now(),
    };
    let gateway = UpgradeGateway::new(
        store,
        MemoryCache::new(),
        Duration::from_secs(config.cache.ttl_secs),
    )?;

    let mut scope = RequestScope::new();
    let outcome = gateway.evaluate(Some(user_agent), now, &mut scope)?;

    if json {
        let body = match &outcome {
            None => serde_json::json!({ "mobile": false }),
            Some(outcome) => serde_json::json!({
                "mobile": true,
                "platform": outcome.platform.as_str(),
                "clientVersion": outcome.client_version.to_string(),
                "block": outcome.decision.block,
                "upgradeDeadline": outcome.decision.upgrade_deadline.map(|at| at.to_rfc3339()),
                "latestVersion": outcome.decision.latest_version.as_ref().map(AppVersion::to_string),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match outcome {
        None => println!("not a recognized mobile client"),
        Some(outcome) => {
            println!("platform: {}", outcome.platform.as_str());
            println!("client version: {}", outcome.client_version);
            if outcome.blocked() {
                println!("blocked: yes (HTTP {UPGRADE_REQUIRED_STATUS})");
            } else {
                println!("blocked: no");
            }
            for (name, value) in outcome.response_headers() {
                println!("{name}: {value}");
            }
        }
    }

    Ok(())
}

fn policy(store: SqlitePolicyStore, action: PolicyAction) -> anyhow::Result<()> {
    match action {
        PolicyAction::Add {
            platform,
            version,
            expire_at,
            disabled,
        } => {
            let entry = PolicyEntry {
                platform: parse_platform(&platform)?,
                version: version
                    .parse::<AppVersion>()
                    .with_context(|| format!("invalid version {version:?}"))?,
                enabled: !disabled,
                expire_at: expire_at.as_deref().map(parse_time).transpose()?,
            };
            store.upsert(&entry)?;
            println!("saved {} {}", entry.platform.as_str(), entry.version);
        }
        PolicyAction::List => {
            for entry in store.list()? {
                let state = if entry.enabled { "enabled" } else { "disabled" };
                let expiry = entry
                    .expire_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<8} {:<16} {:<9} {}",
                    entry.platform.as_str(),
                    entry.version.to_string(),
                    state,
                    expiry
                );
            }
        }
        PolicyAction::Remove { platform, version } => {
            let removed = store.remove(
                parse_platform(&platform)?,
                &version
                    .parse::<AppVersion>()
                    .with_context(|| format!("invalid version {version:?}"))?,
            )?;
            if removed {
                println!("removed");
            } else {
                println!("no matching row");
            }
        }
    }

    Ok(())
}
