//! MarketSentry command-line driver.
//!
//! Thin presentation layer over the engine: group and symbol CRUD, strategy
//! registry queries, one-shot analysis and the alert scheduler loop.
//!
//! Exit codes: 0 success, 2 invalid configuration, 3 data error, 4 internal
//! error.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::info;

use marketsentry::alerts::{self, AlertScheduler, LogNotifier, SchedulerConfig};
use marketsentry::analysis::{Orchestrator, SyntheticProvider};
use marketsentry::data::{AssetClass, Interval, Period};
use marketsentry::model::{templates, GroupStore, ResolvedConfig, SymbolConfig};
use marketsentry::strategy::{ParamKind, StrategyRegistry};
use marketsentry::EngineError;

#[derive(Parser)]
#[command(name = "marketsentry", version, about = "Market analysis and alerting engine")]
struct Cli {
    /// Storage directory (defaults to $MARKETSENTRY_DATA or ./marketsentry_data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage symbol groups
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },
    /// Manage symbols within a group
    Symbol {
        #[command(subcommand)]
        action: SymbolAction,
    },
    /// Query the strategy registry
    Strategy {
        #[command(subcommand)]
        action: StrategyAction,
    },
    /// Run a one-shot analysis for a symbol
    Analyze {
        symbol: String,
        #[arg(long, default_value = "forex")]
        class: String,
        #[arg(long, default_value = "1h")]
        interval: String,
        #[arg(long, default_value = "7d")]
        period: String,
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Attach all alert-enabled monitors and run the scheduler until Ctrl-C
    Watch,
    /// Query the emitted-alert history
    Alerts {
        #[command(subcommand)]
        action: AlertsAction,
    },
}

#[derive(Subcommand)]
enum AlertsAction {
    /// Per-day counts by symbol, condition and severity
    Summary {
        /// Day to summarize (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
enum GroupAction {
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
    Get {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    Delete {
        id: String,
    },
    /// Create the predefined portfolio groups
    InitTemplates,
}

#[derive(Subcommand)]
enum SymbolAction {
    Add {
        group: String,
        key: String,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long, default_value = "forex")]
        class: String,
        #[arg(long, default_value = "1h")]
        interval: String,
        #[arg(long, default_value = "7d")]
        period: String,
    },
    Remove {
        group: String,
        key: String,
    },
    Enable {
        group: String,
        key: String,
    },
    Disable {
        group: String,
        key: String,
    },
}

#[derive(Subcommand)]
enum StrategyAction {
    List,
    /// Print a strategy's parameter template
    GetTemplate {
        name: String,
    },
}

fn data_dir(cli: &Cli) -> PathBuf {
    cli.data_dir.clone().unwrap_or_else(|| {
        std::env::var("MARKETSENTRY_DATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./marketsentry_data"))
    })
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {e:#}");
            let code = e
                .downcast_ref::<EngineError>()
                .map(EngineError::exit_code)
                .unwrap_or(4);
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let root = data_dir(&cli);

    match cli.command {
        Command::Group { action } => group_command(&root, action),
        Command::Symbol { action } => symbol_command(&root, action),
        Command::Strategy { action } => strategy_command(action),
        Command::Analyze { symbol, class, interval, period, strategy } => {
            analyze_command(symbol, class, interval, period, strategy).await
        }
        Command::Watch => watch_command(&root).await,
        Command::Alerts { action } => alerts_command(&root, action),
    }
}

fn alerts_command(root: &PathBuf, action: AlertsAction) -> Result<()> {
    let store = GroupStore::open(root)?;
    match action {
        AlertsAction::Summary { date } => {
            let day = match date {
                Some(s) => chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d")?,
                None => chrono::Utc::now().date_naive(),
            };
            let events = alerts::load_day(&store, day)?;
            let summary = alerts::summarize(&events);
            println!("{day}: {} events", summary.total);
            for (symbol, count) in &summary.by_symbol {
                println!("  symbol    {symbol:<12} {count}");
            }
            for (condition, count) in &summary.by_condition {
                println!("  condition {condition:<16} {count}");
            }
            for (severity, count) in &summary.by_severity {
                println!("  severity  {severity:<8} {count}");
            }
        }
    }
    Ok(())
}

fn group_command(root: &PathBuf, action: GroupAction) -> Result<()> {
    let mut store = GroupStore::open(root)?;
    match action {
        GroupAction::Create { name, description } => {
            let group = store.create_group(&name, &description)?;
            println!("created group {} ({})", group.id, group.name);
        }
        GroupAction::List => {
            for group in store.list() {
                let status = if group.enabled { "enabled" } else { "disabled" };
                println!(
                    "{:<12} {:<28} {:>3} symbols  {}",
                    group.id,
                    group.name,
                    group.members.len(),
                    status
                );
            }
        }
        GroupAction::Get { id } => {
            let group = store.get(&id)?;
            println!("{}", serde_json::to_string_pretty(group)?);
        }
        GroupAction::Update { id, name, description, enabled } => {
            store.update_group(&id, |group| {
                if let Some(name) = name {
                    group.name = name;
                }
                if let Some(description) = description {
                    group.description = description;
                }
                if let Some(enabled) = enabled {
                    group.enabled = enabled;
                }
            })?;
            println!("updated group {id}");
        }
        GroupAction::Delete { id } => {
            store.delete_group(&id)?;
            println!("deleted group {id}");
        }
        GroupAction::InitTemplates => {
            let created = templates::create_predefined_groups(&mut store)?;
            println!("created {} predefined groups", created.len());
        }
    }
    Ok(())
}

fn symbol_command(root: &PathBuf, action: SymbolAction) -> Result<()> {
    let mut store = GroupStore::open(root)?;
    match action {
        SymbolAction::Add { group, key, symbol, class, interval, period } => {
            let config = SymbolConfig::new(
                symbol.unwrap_or_else(|| key.clone()),
                AssetClass::from_str(&class)?,
                Interval::from_str(&interval)?,
                Period::from_str(&period)?,
            );
            store.add_symbol(&group, &key, config)?;
            println!("added {key} to {group}");
        }
        SymbolAction::Remove { group, key } => {
            store.remove_symbol(&group, &key)?;
            println!("removed {key} from {group}");
        }
        SymbolAction::Enable { group, key } => {
            store.set_symbol_enabled(&group, &key, true)?;
            println!("enabled {key}");
        }
        SymbolAction::Disable { group, key } => {
            store.set_symbol_enabled(&group, &key, false)?;
            println!("disabled {key}");
        }
    }
    Ok(())
}

fn strategy_command(action: StrategyAction) -> Result<()> {
    let registry = StrategyRegistry::new();
    match action {
        StrategyAction::List => {
            for name in registry.available() {
                println!("{name}");
            }
            for (alias, target) in registry.alias_table() {
                println!("{alias} -> {target}");
            }
        }
        StrategyAction::GetTemplate { name } => {
            let template = registry.template(&name)?;
            if template.is_empty() {
                println!("(no configurable parameters)");
            }
            for spec in template.specs() {
                match &spec.kind {
                    ParamKind::Int { default, min, max } => {
                        println!("{:<28} int    default {default}  range [{min}, {max}]  {}", spec.name, spec.description)
                    }
                    ParamKind::Float { default, min, max } => {
                        println!("{:<28} float  default {default}  range [{min}, {max}]  {}", spec.name, spec.description)
                    }
                    ParamKind::Bool { default } => {
                        println!("{:<28} bool   default {default}  {}", spec.name, spec.description)
                    }
                    ParamKind::Enum { default, choices } => {
                        println!("{:<28} enum   default {default}  choices {choices:?}  {}", spec.name, spec.description)
                    }
                }
            }
        }
    }
    Ok(())
}

async fn analyze_command(
    symbol: String,
    class: String,
    interval: String,
    period: String,
    strategy: Option<String>,
) -> Result<()> {
    let mut cfg = ResolvedConfig::standalone(
        &symbol,
        AssetClass::from_str(&class)?,
        Interval::from_str(&interval)?,
        Period::from_str(&period)?,
    );
    if let Some(strategy) = strategy {
        cfg.strategy_name = strategy;
    }

    let orchestrator = Orchestrator::new(
        Arc::new(SyntheticProvider::default()),
        Arc::new(StrategyRegistry::new()),
    );
    let verdict = orchestrator.analyze(&cfg).await?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

async fn watch_command(root: &PathBuf) -> Result<()> {
    let store = Arc::new(RwLock::new(GroupStore::open(root)?));
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(SyntheticProvider::default()),
        Arc::new(StrategyRegistry::new()),
    ));
    let scheduler = Arc::new(AlertScheduler::new(
        store,
        orchestrator,
        Arc::new(LogNotifier),
        SchedulerConfig::default(),
    ));

    let attached = scheduler.attach_all().await?;
    info!(attached, "watching");

    let runner = scheduler.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    scheduler.stop();
    handle.await?;
    Ok(())
}
