use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use senryu::monitor::{reply_text, DETECTED_REACTION};
use senryu::store::{format_channel_list, format_recent_list, format_stats, RECENT_LIMIT, TOP_AUTHORS_LIMIT};
use senryu::{ChatMessage, MessageOutcome, MonitorConfig, SenryuDetector, SenryuMonitor, SenryuStore};

#[derive(Parser, Debug)]
#[command(name = "senryu")]
#[command(about = "Detects 5-7-5 senryu in chat messages")]
#[command(version)]
struct Cli {
    /// JSON store holding monitored channels and detected senryu
    #[arg(long, global = true, default_value = "senryu_store.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect a senryu in TEXT (or stdin)
    Detect {
        text: Option<String>,
        /// Print the match as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count morae in TEXT (or stdin)
    Count { text: Option<String> },
    /// Run a JSON-lines message log through the channel monitor
    Scan(ScanArgs),
    /// Manage monitored channels
    Channel {
        #[command(subcommand)]
        action: ChannelAction,
    },
    /// Show the latest senryu of a guild, or a JSON report across all guilds
    List {
        #[arg(long)]
        guild: Option<String>,
        /// Print the guild's record history as JSON instead of the reply text
        #[arg(long)]
        json: bool,
    },
    /// Show detection statistics for a guild, or JSON totals across all guilds
    Stats {
        #[arg(long)]
        guild: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ChannelAction {
    /// Enable detection for a channel
    Set {
        #[arg(long)]
        guild: String,
        #[arg(long)]
        channel: String,
    },
    /// Disable detection for a channel
    Unset {
        #[arg(long)]
        guild: String,
        #[arg(long)]
        channel: String,
    },
    /// List monitored channels of a guild, or every channel as JSON when no guild is given
    List {
        #[arg(long)]
        guild: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// File with one chat message JSON object per line
    messages: PathBuf,

    /// Messages processed concurrently (defaults to CPU count)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Skip messages longer than this many characters
    #[arg(long)]
    max_chars: Option<usize>,

    /// Abandon a detection after this many milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Abort on the first malformed message line
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bar
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,
}

/// Summary of a scan run written to --stats-out
#[derive(Serialize, Debug, Default)]
struct ScanStats {
    messages_total: u64,
    malformed_lines: u64,
    detected: u64,
    no_match: u64,
    ignored_bot: u64,
    not_monitored: u64,
    empty: u64,
    too_long: u64,
    timed_out: u64,
    processing_time_ms: u64,
    messages_per_sec: f64,
}

impl ScanStats {
    fn record(&mut self, outcome: &MessageOutcome) {
        match outcome {
            MessageOutcome::Detected(_) => self.detected += 1,
            MessageOutcome::NoMatch => self.no_match += 1,
            MessageOutcome::IgnoredBot => self.ignored_bot += 1,
            MessageOutcome::NotMonitored => self.not_monitored += 1,
            MessageOutcome::Empty => self.empty += 1,
            MessageOutcome::TooLong { .. } => self.too_long += 1,
            MessageOutcome::TimedOut => self.timed_out += 1,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries results; structured logs go to stderr
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    info!(?cli, "Parsed CLI arguments");

    match cli.command {
        Command::Detect { text, json } => run_detect(text, json).await,
        Command::Count { text } => run_count(text).await,
        Command::Scan(args) => run_scan(args, cli.store).await,
        Command::Channel { action } => run_channel(action, cli.store).await,
        Command::List { guild, json } => {
            let store = SenryuStore::load(&cli.store).await?;
            match guild {
                Some(guild) if !json => println!("{}", format_recent_list(&store.recent(&guild, RECENT_LIMIT))),
                guild => println!("{}", serde_json::to_string_pretty(&store.record_report(guild.as_deref()))?),
            }
            Ok(())
        }
        Command::Stats { guild } => {
            let store = SenryuStore::load(&cli.store).await?;
            match guild {
                Some(guild) => {
                    let ranking = store.top_authors(&guild, TOP_AUTHORS_LIMIT);
                    println!("{}", format_stats(store.count(&guild), &ranking));
                }
                None => println!("{}", serde_json::to_string_pretty(&store.overall_stats())?),
            }
            Ok(())
        }
    }
}

async fn text_or_stdin(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read text from stdin")?;
            Ok(buffer)
        }
    }
}

async fn ready_detector() -> Result<SenryuDetector> {
    let detector = SenryuDetector::new()?;
    // Fail loudly here; inside detection an unavailable annotator only looks like "no senryu"
    detector
        .counter()
        .warm_up()
        .await
        .context("Phonetic annotator failed to initialize")?;
    Ok(detector)
}

async fn run_detect(text: Option<String>, json: bool) -> Result<()> {
    let text = text_or_stdin(text).await?;
    let detector = ready_detector().await?;

    match detector.detect(&text).await {
        Some(found) if json => println!("{}", serde_json::to_string(&found)?),
        Some(found) => println!("{found}"),
        None if json => println!("null"),
        None => println!("no senryu found"),
    }
    Ok(())
}

async fn run_count(text: Option<String>) -> Result<()> {
    let text = text_or_stdin(text).await?;
    let detector = ready_detector().await?;
    println!("{}", detector.counter().count_morae(&text).await);
    Ok(())
}

async fn run_channel(action: ChannelAction, store_path: PathBuf) -> Result<()> {
    let mut store = SenryuStore::load(&store_path).await?;

    match action {
        ChannelAction::Set { guild, channel } => {
            store.set_channel(&guild, &channel);
            store.save().await?;
            println!("<#{channel}> を川柳検出の対象に設定しました。");
        }
        ChannelAction::Unset { guild, channel } => {
            store.unset_channel(&guild, &channel);
            store.save().await?;
            println!("<#{channel}> を川柳検出の対象から除外しました。");
        }
        ChannelAction::List { guild: Some(guild) } => {
            println!("{}", format_channel_list(&store.channels_in_guild(&guild)));
        }
        ChannelAction::List { guild: None } => {
            println!("{}", serde_json::to_string_pretty(&store.channel_report())?);
        }
    }
    Ok(())
}

async fn run_scan(args: ScanArgs, store_path: PathBuf) -> Result<()> {
    if !args.messages.is_file() {
        anyhow::bail!("Message log does not exist: {}", args.messages.display());
    }

    let start_time = std::time::Instant::now();
    let mut stats = ScanStats::default();
    let mut store = SenryuStore::load(&store_path).await?;

    let content = tokio::fs::read_to_string(&args.messages)
        .await
        .with_context(|| format!("Failed to read message log {}", args.messages.display()))?;

    let mut messages = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ChatMessage>(line) {
            Ok(message) => messages.push(message),
            Err(err) if args.fail_fast => {
                return Err(err).with_context(|| format!("Malformed message on line {}", line_no + 1));
            }
            Err(err) => {
                warn!("Skipping malformed message on line {}: {}", line_no + 1, err);
                stats.malformed_lines += 1;
            }
        }
    }
    stats.messages_total = messages.len() as u64;
    info!("Loaded {} messages from {}", messages.len(), args.messages.display());

    let detector = Arc::new(ready_detector().await?);
    let config = MonitorConfig {
        max_chars: args.max_chars,
        timeout: Duration::from_millis(args.timeout_ms),
    };
    let monitor = SenryuMonitor::new(detector, config);
    let concurrency = args.concurrency.unwrap_or_else(num_cpus::get).max(1);

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(messages.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} messages ({per_sec})")
                .context("Invalid progress bar template")?,
        );
        bar
    };

    // buffered keeps outcomes in message order while detections overlap
    let outcomes: Vec<MessageOutcome> = {
        let monitor = &monitor;
        let registry = &store;
        let progress = &progress;
        stream::iter(messages.iter())
            .map(|message| async move {
                let outcome = monitor.handle(message, registry).await;
                progress.inc(1);
                outcome
            })
            .buffered(concurrency)
            .collect()
            .await
    };
    progress.finish_and_clear();

    for outcome in outcomes {
        stats.record(&outcome);
        if let MessageOutcome::Detected(record) = outcome {
            println!("[{}] {} {}", record.message_id, DETECTED_REACTION, reply_text(&record.senryu()));
            store.add_record(record);
        }
    }
    store.save().await?;

    let elapsed = start_time.elapsed();
    stats.processing_time_ms = elapsed.as_millis() as u64;
    stats.messages_per_sec = if elapsed.as_secs_f64() > 0.0 {
        stats.messages_total as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    let stats_json = serde_json::to_string_pretty(&stats)?;
    tokio::fs::write(&args.stats_out, stats_json)
        .await
        .with_context(|| format!("Failed to write stats to {}", args.stats_out.display()))?;

    println!("Scan complete:");
    println!("  Messages processed: {}", stats.messages_total);
    println!("  Senryu detected: {}", stats.detected);
    if stats.timed_out > 0 {
        println!("  Timed out: {}", stats.timed_out);
    }
    if stats.malformed_lines > 0 {
        println!("  Malformed lines skipped: {}", stats.malformed_lines);
    }
    info!(?stats, "Scan finished");
    Ok(())
}
