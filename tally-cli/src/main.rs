use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use rust_decimal::Decimal;
use tally_finance::{Categorizer, ImportOptions, InsertOutcome, MemoryStore, StoredTransaction, import_statement};
use tally_ingest::{parse_amount, parse_date};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

mod auth;
mod config;
mod state;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "tally", version = VERSION, about = "Bank statement import and categorization")]
struct Cli {
    /// Debug logging (overrides TALLY_LOG / RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse, fingerprint and categorize a delimited statement export
    Import {
        /// Statement file (comma, semicolon or tab separated)
        file: PathBuf,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Skip the remote classifier and use keyword rules only
        #[arg(long)]
        no_remote: bool,

        /// Categorizations in flight (default from config)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Categorize a single transaction
    Categorize {
        #[arg(long)]
        merchant: String,

        /// Defaults to the merchant
        #[arg(long)]
        description: Option<String>,

        /// Signed amount, e.g. -87.50 or (87.50)
        #[arg(long, allow_hyphen_values = true)]
        amount: String,

        #[arg(long)]
        json: bool,

        #[arg(long)]
        no_remote: bool,
    },

    /// Print the dedup key for a transaction
    Hash {
        #[arg(long)]
        date: String,

        #[arg(long, allow_hyphen_values = true)]
        amount: String,

        #[arg(long)]
        merchant: String,

        /// Defaults to the merchant
        #[arg(long)]
        description: Option<String>,
    },

    /// Manage ~/.tally/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Manage remote classifier API keys
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,

    /// Print the effective configuration
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Store an Anthropic API key
    SetAnthropicKey,

    /// Store an OpenAI API key
    SetOpenaiKey,

    /// Show which keys are available (file or environment)
    Status,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("TALLY_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Import {
            file,
            json,
            no_remote,
            concurrency,
        } => {
            let cfg = config::load_config()?;
            let categorizer = build_categorizer(&cfg, !no_remote)?;
            let options = ImportOptions {
                concurrency: concurrency.unwrap_or(cfg.import.concurrency),
            };
            run_import(&file, &categorizer, options, json).await?;
        }

        Command::Categorize {
            merchant,
            description,
            amount,
            json,
            no_remote,
        } => {
            let amount = parse_amount(&amount).with_context(|| format!("invalid amount '{amount}'"))?;
            let description = description.unwrap_or_else(|| merchant.clone());
            let cfg = config::load_config()?;
            let categorizer = build_categorizer(&cfg, !no_remote)?;

            let result = categorizer.categorize(&merchant, &description, amount).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{}{} (confidence {:.2}, {:?})\n{}",
                    result.category,
                    result.subcategory.as_deref().map(|s| format!(" / {s}")).unwrap_or_default(),
                    result.confidence,
                    result.source,
                    result.explanation
                );
            }
        }

        Command::Hash {
            date,
            amount,
            merchant,
            description,
        } => {
            let Some(d) = parse_date(&date) else {
                bail!("invalid date '{date}'");
            };
            let a = parse_amount(&amount).with_context(|| format!("invalid amount '{amount}'"))?;
            let merchant = merchant.trim();
            let description = description.as_deref().map(str::trim).unwrap_or(merchant);
            println!("{}", tally_core::dedup_key(d, a, merchant, description));
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Auth { command } => match command {
            AuthCommand::SetAnthropicKey => auth::set_anthropic_key()?,
            AuthCommand::SetOpenaiKey => auth::set_openai_key()?,
            AuthCommand::Status => auth::print_status()?,
        },
    }

    Ok(())
}

fn build_categorizer(cfg: &config::Config, allow_remote: bool) -> Result<Categorizer> {
    let creds = auth::load_auth()?.with_env();
    let cat_cfg = cfg.categorizer_config(&creds, allow_remote)?;
    match &cat_cfg.remote {
        Some(remote) => debug!(provider = %remote.provider, model = %remote.model, "remote classifier enabled"),
        None => debug!("remote classifier disabled; keyword rules only"),
    }
    Categorizer::new(&cat_cfg).context("build categorizer")
}

async fn run_import(file: &Path, categorizer: &Categorizer, options: ImportOptions, json: bool) -> Result<()> {
    if !file.exists() {
        bail!("statement not found: {}", file.display());
    }
    let content = std::fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;

    let store = MemoryStore::new();
    let summary = import_statement(&content, categorizer, &store, options)
        .await
        .with_context(|| format!("importing {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for row in &summary.rows {
        let txn = &row.transaction;
        let category = row
            .categorization
            .as_ref()
            .map(|c| match &c.subcategory {
                Some(sub) => format!("{} / {} ({:.2})", c.category, sub, c.confidence),
                None => format!("{} ({:.2})", c.category, c.confidence),
            })
            .unwrap_or_else(|| "-".to_string());
        let marker = match row.outcome {
            InsertOutcome::Inserted => "",
            InsertOutcome::Duplicate => " [duplicate]",
        };
        println!(
            "{:>5}  {}  {:>12}  {:<32}  {}{}",
            row.line,
            txn.date,
            txn.amount,
            truncate(&txn.merchant, 32),
            category,
            marker
        );
    }

    if !summary.errors.is_empty() {
        println!("\nErrors:");
        for e in &summary.errors {
            println!("  {e}");
        }
    }
    println!("\n{}", summary.headline());

    let totals = Totals::of(&store.records().await);
    println!(
        "spent {}, received {}, {} uncategorized{}",
        totals.spent,
        totals.received,
        totals.uncategorized,
        if categorizer.has_remote() { "" } else { " (keyword rules only)" }
    );
    Ok(())
}

/// Money in/out and review backlog across stored records.
#[derive(Debug, Default, PartialEq)]
struct Totals {
    spent: Decimal,
    received: Decimal,
    uncategorized: usize,
}

impl Totals {
    fn of(records: &[StoredTransaction]) -> Self {
        let mut t = Totals::default();
        for r in records {
            if r.transaction.is_outflow() {
                t.spent += -r.transaction.amount;
            } else if r.transaction.is_inflow() {
                t.received += r.transaction.amount;
            }
            if r.categorization.is_uncategorized() {
                t.uncategorized += 1;
            }
        }
        t
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
