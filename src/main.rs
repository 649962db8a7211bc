mod gateway;

use clap::{Parser, Subcommand};
use gateway::Gateway;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use streak_channels::telegram::TelegramChannel;
use streak_core::{
    config,
    shellexpand,
    traits::{Channel, SyncGateway},
};
use streak_ledger::plan::PlanDocument;
use streak_sync::DriveGateway;
use tracing::info;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Parser)]
#[command(name = "streak", version, about = "Streak — personal study tracker bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Check config, plan document, and sync health.
    Status,
    /// Print a text report for a date range.
    Report {
        /// Range start, YYYY-MM-DD.
        from: String,
        /// Range end, YYYY-MM-DD.
        to: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            // Log to stdout and a daily-rolling file under the data dir.
            let log_dir = Path::new(&shellexpand(&cfg.streak.data_dir)).join("logs");
            let file_appender = tracing_appender::rolling::daily(log_dir, "streak.log");
            let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new(cfg.streak.log_level.clone())
                    }),
                )
                .with_writer(file_writer.and(std::io::stdout))
                .with_ansi(false)
                .init();

            // Fail fast on anything the day loop depends on.
            let start_date = cfg.tracking.start()?;
            cfg.tracking.offset()?;
            cfg.tracking.evening()?;
            cfg.tracking.night()?;
            cfg.report.weekly()?;

            let tg = match cfg.channel.telegram {
                Some(ref tg) if tg.enabled => tg.clone(),
                _ => anyhow::bail!("Telegram is not enabled. Enable it in config.toml."),
            };
            if tg.bot_token.is_empty() {
                anyhow::bail!(
                    "Telegram is enabled but bot_token is empty. Set it in config.toml."
                );
            }
            if tg.chat_id == 0 {
                anyhow::bail!("channel.telegram.chat_id is not set.");
            }

            let plan_path = PathBuf::from(shellexpand(&cfg.tracking.plan_path));
            bootstrap_plan(&plan_path, cfg.tracking.seed_path.as_deref())?;

            // A structurally broken plan document refuses to run; a missing
            // row mid-operation only skips that day.
            let doc = PlanDocument::open(&plan_path).map_err(|e| {
                anyhow::anyhow!("cannot open plan document {}: {e}", plan_path.display())
            })?;
            doc.validate()
                .map_err(|e| anyhow::anyhow!("plan document is not usable: {e}"))?;
            info!(
                "plan document: {} tables, tracking since {start_date}",
                doc.table_count()
            );

            let channel: Arc<dyn Channel> = Arc::new(TelegramChannel::new(tg));
            let sync: Option<Arc<dyn SyncGateway>> = if cfg.sync.enabled {
                Some(Arc::new(DriveGateway::new(&cfg.sync)))
            } else {
                None
            };

            println!("Streak — starting bot...");
            Gateway::new(channel, sync, cfg)?.run().await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("Streak — Status Check\n");
            println!("Config: {}", cli.config);

            match cfg.tracking.start() {
                Ok(start) => println!("Tracking since: {start}"),
                Err(e) => println!("Tracking: NOT configured ({e})"),
            }
            println!(
                "Check-ins: evening {} / night {} ({})",
                cfg.tracking.evening_time, cfg.tracking.night_time, cfg.tracking.utc_offset
            );
            println!();

            if let Some(ref tg) = cfg.channel.telegram {
                println!(
                    "  telegram: {}",
                    if tg.enabled && !tg.bot_token.is_empty() {
                        "configured"
                    } else if tg.enabled {
                        "enabled but missing bot_token"
                    } else {
                        "disabled"
                    }
                );
            } else {
                println!("  telegram: not configured");
            }

            let plan_path = PathBuf::from(shellexpand(&cfg.tracking.plan_path));
            match PlanDocument::open(&plan_path) {
                Ok(doc) => match doc.validate() {
                    Ok(()) => println!("  plan: {} tables, columns ok", doc.table_count()),
                    Err(e) => println!("  plan: INVALID ({e})"),
                },
                Err(e) => println!("  plan: unreadable ({e})"),
            }

            if cfg.sync.enabled {
                println!(
                    "  sync: drive ({})",
                    if cfg.sync.file_id.is_empty() {
                        "file id discovered on first upload"
                    } else {
                        "file id pinned"
                    }
                );
            } else {
                println!("  sync: disabled");
            }
        }
        Commands::Report { from, to } => {
            let cfg = config::load(&cli.config)?;
            let from = chrono::NaiveDate::parse_from_str(&from, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("invalid from date '{from}': {e}"))?;
            let to = chrono::NaiveDate::parse_from_str(&to, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("invalid to date '{to}': {e}"))?;

            let plan_path = PathBuf::from(shellexpand(&cfg.tracking.plan_path));
            let doc = PlanDocument::open(&plan_path).map_err(|e| {
                anyhow::anyhow!("cannot open plan document {}: {e}", plan_path.display())
            })?;
            println!("{}", gateway::reports::range_report(&doc.entries(), from, to));
        }
    }

    Ok(())
}

/// Copy the seed document into place on first run.
fn bootstrap_plan(plan_path: &Path, seed_path: Option<&str>) -> anyhow::Result<()> {
    if plan_path.exists() {
        return Ok(());
    }
    let Some(seed) = seed_path else {
        anyhow::bail!(
            "plan document {} does not exist and tracking.seed_path is not set",
            plan_path.display()
        );
    };
    let seed = shellexpand(seed);
    if let Some(parent) = plan_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&seed, plan_path)
        .map_err(|e| anyhow::anyhow!("failed to seed plan document from {seed}: {e}"))?;
    println!("Plan document seeded from {seed}");
    Ok(())
}
