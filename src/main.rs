#![forbid(unsafe_code)]

//! `sqlscope` — console client for the AI SQL check service.
//!
//! Streams single-statement checks to stdout, submits batch jobs and
//! follows their progress, and administers the service's provider /
//! model / ERP-database configuration and check history.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use sqlscope::api::client::{ApiClient, ExportFormat};
use sqlscope::check::poller::{BatchPoller, PollEvent, PollSlot};
use sqlscope::check::runner;
use sqlscope::check::session::{CheckResult, CheckStatus};
use sqlscope::config::ConsoleConfig;
use sqlscope::models::progress::{validate_progress, BatchProgress};
use sqlscope::models::request::{BatchCheckRequest, BatchSqlItem, CheckAllRequest, CheckRequest};
use sqlscope::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum ReportFormat {
    Excel,
    Pdf,
}

impl From<ReportFormat> for ExportFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Excel => Self::Excel,
            ReportFormat::Pdf => Self::Pdf,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "sqlscope", about = "Console client for the AI SQL check service", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the service base URL from the config file.
    #[arg(long)]
    server: Option<String>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check one SQL statement, streaming the analysis to stdout.
    Check {
        /// Statement to check; mutually exclusive with --sql-file.
        #[arg(long, conflicts_with = "sql_file")]
        sql: Option<String>,
        /// File containing the statement to check.
        #[arg(long)]
        sql_file: Option<PathBuf>,
        /// Model to analyse with; falls back to the configured default.
        #[arg(long)]
        model_id: Option<i64>,
        /// ERP configuration for automatic EXPLAIN.
        #[arg(long)]
        erp_config_id: Option<i64>,
    },
    /// Submit a batch of statements (one per `;`) and follow progress.
    Batch {
        /// File of `;`-separated statements.
        #[arg(long)]
        sql_file: PathBuf,
        /// Model to analyse with; falls back to the configured default.
        #[arg(long)]
        model_id: Option<i64>,
        /// ERP configuration for automatic EXPLAIN.
        #[arg(long)]
        erp_config_id: Option<i64>,
    },
    /// Check every statement of an ERP database and follow progress.
    CheckAll {
        /// ERP configuration to enumerate statements from.
        #[arg(long)]
        erp_config_id: Option<i64>,
        /// Model to analyse with; falls back to the configured default.
        #[arg(long)]
        model_id: Option<i64>,
        /// Skip the automatic EXPLAIN pass.
        #[arg(long)]
        no_auto_explain: bool,
    },
    /// Query the progress of a batch job once.
    Progress {
        /// Batch identifier returned on submission.
        #[arg(long)]
        batch_id: String,
    },
    /// List configured AI providers.
    Providers,
    /// List configured AI models.
    Models,
    /// List configured ERP databases.
    Databases,
    /// Test connectivity of an ERP database configuration.
    TestConnection {
        /// ERP configuration to test.
        #[arg(long)]
        config_id: i64,
    },
    /// List check history records.
    History {
        /// Restrict to one batch.
        #[arg(long)]
        batch_id: Option<String>,
        /// Maximum number of records.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one history record in full.
    Record {
        /// Record identifier.
        #[arg(long)]
        id: i64,
    },
    /// Download a batch report.
    Export {
        /// Batch identifier.
        #[arg(long)]
        batch_id: String,
        /// Report format.
        #[arg(long, value_enum, default_value_t = ReportFormat::Excel)]
        format: ReportFormat,
        /// Output path; defaults to `sql_check_<batch>.<ext>`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let mut config = ConsoleConfig::load(args.config.as_deref())?;
    if let Some(server) = args.server {
        config.server_url = server;
    }

    let client = ApiClient::new(&config.server_url, config.request_timeout())?;

    match args.command {
        Command::Check {
            sql,
            sql_file,
            model_id,
            erp_config_id,
        } => {
            let statement = read_statement(sql, sql_file)?;
            let request = CheckRequest {
                sql_statement: statement,
                model_id: require_model(model_id, &config)?,
                explain_result: None,
                erp_config_id: erp_config_id.or(config.default_erp_config_id),
            };
            run_streaming_check(&client, &request).await
        }

        Command::Batch {
            sql_file,
            model_id,
            erp_config_id,
        } => {
            let text = std::fs::read_to_string(&sql_file).map_err(|err| {
                AppError::Io(format!("cannot read {}: {err}", sql_file.display()))
            })?;
            let statements = split_statements(&text);
            if statements.is_empty() {
                return Err(AppError::Config("no statements found in input".into()));
            }

            let request = BatchCheckRequest {
                sql_statements: statements,
                model_id: require_model(model_id, &config)?,
                erp_config_id: erp_config_id.or(config.default_erp_config_id),
            };
            let submission = client.submit_batch(&request).await?;
            println!(
                "submitted batch {} ({} statements)",
                submission.batch_id, submission.total_count
            );
            follow_progress(&client, &submission.batch_id, config.poll_interval()).await
        }

        Command::CheckAll {
            erp_config_id,
            model_id,
            no_auto_explain,
        } => {
            let erp_config_id = erp_config_id.or(config.default_erp_config_id).ok_or_else(|| {
                AppError::Config("no ERP configuration given and no default configured".into())
            })?;
            let request = CheckAllRequest {
                erp_config_id,
                model_id: require_model(model_id, &config)?,
                auto_explain: !no_auto_explain,
            };
            let submission = client.check_all(&request).await?;
            println!(
                "submitted full-database check {} ({} statements)",
                submission.batch_id, submission.total_count
            );
            follow_progress(&client, &submission.batch_id, config.poll_interval()).await
        }

        Command::Progress { batch_id } => {
            let progress = client.batch_progress(&batch_id).await?;
            if let Err(err) = validate_progress(&progress) {
                warn!(error = %err, "service returned an inconsistent snapshot");
            }
            println!("{}", render_progress(&progress));
            Ok(())
        }

        Command::Providers => {
            for provider in client.providers().await? {
                println!(
                    "{:>4}  {}  {}  active={}",
                    provider.id.unwrap_or_default(),
                    provider.provider_name,
                    provider.api_endpoint,
                    provider.is_active
                );
            }
            Ok(())
        }

        Command::Models => {
            for model in client.models().await? {
                println!(
                    "{:>4}  {}  provider={}  active={}",
                    model.id.unwrap_or_default(),
                    model.model_display_name,
                    model.provider_id,
                    model.is_active
                );
            }
            Ok(())
        }

        Command::Databases => {
            for database in client.databases().await? {
                println!(
                    "{:>4}  {}  {}:{}/{}  active={}",
                    database.id.unwrap_or_default(),
                    database.config_name,
                    database.host,
                    database.port,
                    database.database_name,
                    database.is_active
                );
            }
            Ok(())
        }

        Command::TestConnection { config_id } => {
            let outcome = client.test_connection(config_id).await?;
            println!("{}: {}", outcome.status, outcome.message);
            Ok(())
        }

        Command::History { batch_id, limit } => {
            let records = match batch_id {
                Some(batch_id) => client.batch_records(&batch_id).await?,
                None => client.records(limit).await?,
            };
            for record in records {
                println!(
                    "{:>6}  {}  {}  {}ms  {}",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.check_status,
                    record.check_duration.unwrap_or_default(),
                    truncate(&record.original_sql, 80)
                );
            }
            Ok(())
        }

        Command::Record { id } => {
            let record = client.record(id).await?;
            let rendered = serde_json::to_string_pretty(&record)
                .map_err(|err| AppError::Api(format!("cannot render record: {err}")))?;
            println!("{rendered}");
            Ok(())
        }

        Command::Export {
            batch_id,
            format,
            out,
        } => {
            let format = ExportFormat::from(format);
            let bytes = client.export_report(&batch_id, format).await?;
            let path = out.unwrap_or_else(|| {
                PathBuf::from(format!("sql_check_{batch_id}.{}", format.extension()))
            });
            std::fs::write(&path, bytes)
                .map_err(|err| AppError::Io(format!("cannot write {}: {err}", path.display())))?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}

// ── Streaming check ───────────────────────────────────────────────────────────

/// Run one streaming check, printing analysis text as it arrives.
async fn run_streaming_check(client: &ApiClient, request: &CheckRequest) -> Result<()> {
    let result = match client.stream_check(request).await {
        Ok(body) => {
            let (snapshot_tx, mut snapshot_rx) = watch::channel(CheckResult::default());
            let cancel = CancellationToken::new();

            let reader_cancel = cancel.clone();
            let reader = tokio::spawn(async move {
                runner::run_check(body, &snapshot_tx, &reader_cancel).await
            });

            // Print each new fragment of accumulated text; the sender
            // side closes when the read loop finishes.
            let mut printed = 0usize;
            loop {
                tokio::select! {
                    changed = snapshot_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let text_len = {
                            let snapshot = snapshot_rx.borrow_and_update();
                            let fragment = &snapshot.accumulated_text[printed..];
                            if !fragment.is_empty() {
                                print!("{fragment}");
                                let _ = std::io::stdout().flush();
                            }
                            snapshot.accumulated_text.len()
                        };
                        printed = text_len;
                    }

                    _ = tokio::signal::ctrl_c() => {
                        eprintln!("\ninterrupted, abandoning check");
                        cancel.cancel();
                    }
                }
            }

            reader
                .await
                .map_err(|err| AppError::Stream(format!("read loop panicked: {err}")))?
        }
        Err(err) => runner::transport_failure(format!("request failed: {err}")),
    };

    println!();
    match result.status {
        CheckStatus::Success => {
            println!(
                "check succeeded (record {}, {} ms)",
                result.record_id.unwrap_or_default(),
                result.duration_ms.unwrap_or_default()
            );
            if result.explain_text.is_some() {
                println!("EXPLAIN output captured; see the history record for details");
            }
            Ok(())
        }
        CheckStatus::Failed => {
            let message = result
                .error_message
                .unwrap_or_else(|| "check failed".into());
            Err(AppError::Api(message))
        }
        // Abandoned mid-stream via Ctrl-C.
        CheckStatus::Pending | CheckStatus::Streaming => Ok(()),
    }
}

// ── Batch progress ────────────────────────────────────────────────────────────

/// Poll a batch job until completion, printing every snapshot.
///
/// Ctrl-C retires the poller; the job keeps running server-side.
async fn follow_progress(client: &ApiClient, batch_id: &str, interval: Duration) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::channel(16);
    let poller = BatchPoller::new(
        batch_id.to_owned(),
        interval,
        Arc::new(client.clone()),
        event_tx,
    );

    let mut slot = PollSlot::new();
    slot.install(poller.spawn());

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(PollEvent::Snapshot(progress)) => {
                    if let Err(err) = validate_progress(&progress) {
                        warn!(error = %err, "service returned an inconsistent snapshot");
                    }
                    println!("{}", render_progress(&progress));
                }
                Some(PollEvent::Completed) => {
                    println!("batch {batch_id} completed");
                    break;
                }
                None => break,
            },

            _ = tokio::signal::ctrl_c() => {
                eprintln!("stopping progress polling; the job keeps running server-side");
                slot.clear();
            }
        }
    }

    Ok(())
}

fn render_progress(progress: &BatchProgress) -> String {
    let remaining = progress
        .remaining_time
        .map_or_else(String::new, |secs| format!(", ~{secs}s left"));
    format!(
        "{:>3}%  {}/{} checked ({} ok, {} failed{remaining})",
        progress.progress,
        progress.completed_count,
        progress.total_count,
        progress.success_count,
        progress.failed_count
    )
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}

fn read_statement(sql: Option<String>, sql_file: Option<PathBuf>) -> Result<String> {
    match (sql, sql_file) {
        (Some(sql), None) => Ok(sql),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|err| AppError::Io(format!("cannot read {}: {err}", path.display()))),
        _ => Err(AppError::Config(
            "exactly one of --sql and --sql-file is required".into(),
        )),
    }
}

/// Split `;`-separated input into batch items: empty segments are
/// dropped and the terminator is restored on each statement.
fn split_statements(text: &str) -> Vec<BatchSqlItem> {
    text.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| BatchSqlItem {
            sql: format!("{s};"),
            explain_result: None,
        })
        .collect()
}

fn require_model(model_id: Option<i64>, config: &ConsoleConfig) -> Result<i64> {
    model_id.or(config.default_model_id).ok_or_else(|| {
        AppError::Config("no model given via --model-id and no default configured".into())
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flattened: String = text
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .take(max_chars)
        .collect();
    if text.chars().count() > max_chars {
        format!("{flattened}…")
    } else {
        flattened
    }
}
