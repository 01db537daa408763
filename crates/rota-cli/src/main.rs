use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tokio::time::{Duration, sleep};
use tracing_subscriber::EnvFilter;

use rota_core::app::DynDrawEngine;
use rota_core::{DrawOutcome, EngineBuilder, RotaConfig, StorageKind, StoreError};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "rota",
    about = "Draw who goes next from a fixed roster, without repeats until everyone had a turn"
)]
struct Cli {
    /// JSON config file ({storageKind, connectionTarget, roster})
    #[arg(long, short, env = "ROTA_CONFIG", default_value = "rota.json")]
    config: PathBuf,

    /// Override storageKind from the config file
    #[arg(long, env = "ROTA_STORAGE_KIND")]
    storage_kind: Option<StorageKind>,

    /// Override connectionTarget from the config file
    #[arg(long, env = "ROTA_CONNECTION_TARGET")]
    connection_target: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the draw table/file if it does not exist
    Init,
    /// Draw the next name
    Draw {
        /// Seconds of countdown before the name is revealed
        #[arg(long, default_value_t = 0)]
        countdown: u64,
    },
    /// Clear the whole draw history
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// List past draws, most recent first
    History {
        #[arg(long)]
        json: bool,
    },
    /// Show who has been drawn and who is left in this cycle
    Status {
        #[arg(long)]
        json: bool,
    },
}

/// Failures after the engine is built. Configuration errors exit earlier.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not read the confirmation answer: {0}")]
    Prompt(#[source] io::Error),

    #[error("could not encode output as JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    /// Message shown on stderr before exiting.
    fn user_message(&self) -> String {
        match self {
            CliError::Store(e) => format!("{e}. Please try again."),
            other => other.to_string(),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<RotaConfig, rota_core::ConfigError> {
    let mut config = RotaConfig::from_path(&cli.config)?;
    if let Some(kind) = cli.storage_kind {
        config.storage_kind = kind;
    }
    if let Some(target) = &cli.connection_target {
        config.connection_target = target.clone();
    }
    Ok(config)
}

/// 確認プロンプト（reset の前に presentation 側で行う）
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
}

async fn run(engine: &DynDrawEngine, command: Command) -> Result<(), CliError> {
    match command {
        Command::Init => {
            println!("Draw store is ready.");
        }
        Command::Draw { countdown } => match engine.draw().await {
            DrawOutcome::Selected { name, .. } => {
                // サスペンスは表示側だけの演出（draw 自体は遅延しない）
                for i in (1..=countdown).rev() {
                    println!("Revealing in {i}...");
                    sleep(Duration::from_secs(1)).await;
                }
                println!("{name} is up next!");
            }
            DrawOutcome::ExhaustedAndReset => {
                println!("Everyone has had a turn. History cleared; starting over.");
                println!("Run `rota draw` again to pick the first name of the new cycle.");
            }
            DrawOutcome::Failed(e) => return Err(e.into()),
        },
        Command::Reset { yes } => {
            let confirmed =
                yes || confirm("Clear the whole draw history?").map_err(CliError::Prompt)?;
            if !confirmed {
                println!("Nothing cleared.");
                return Ok(());
            }
            engine.reset_all().await?;
            println!("History cleared; starting over.");
        }
        Command::History { json } => {
            let records = engine.history().await?;
            if json {
                let out = serde_json::to_string_pretty(&records)?;
                println!("{out}");
            } else if records.is_empty() {
                println!("No draws yet.");
            } else {
                for record in records {
                    println!(
                        "{:>6}  {}  {}",
                        record.id,
                        record.drawn_at.format("%Y-%m-%d %H:%M:%S"),
                        record.name
                    );
                }
            }
        }
        Command::Status { json } => {
            let status = engine.status().await?;
            if json {
                let out = serde_json::to_string_pretty(&status)?;
                println!("{out}");
            } else {
                let join = |names: &[rota_core::Name]| {
                    names.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", ")
                };
                println!("drawn {}/{}: {}", status.drawn.len(), status.total, join(&status.drawn[..]));
                println!("left: {}", join(&status.available[..]));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    // (A) 設定を読み込んで検証（不正なら draw は一度も実行しない）
    let engine = match load_config(&cli).and_then(|config| EngineBuilder::new(config).build()) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    // (B) 保存先を用意してからコマンドを実行
    let result = match engine.initialize().await {
        Ok(()) => run(&engine, cli.command).await,
        Err(e) => Err(e.into()),
    };

    // (C) 後片付け（プールを閉じる）
    engine.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_keep_the_retry_hint() {
        let err = CliError::from(StoreError::unavailable("io: disk full"));
        assert_eq!(
            err.user_message(),
            "storage unavailable: io: disk full. Please try again."
        );
    }

    #[test]
    fn prompt_failures_are_not_reported_as_storage() {
        let err = CliError::Prompt(io::Error::new(io::ErrorKind::UnexpectedEof, "closed"));
        let message = err.user_message();
        assert!(message.contains("confirmation"));
        assert!(!message.contains("storage unavailable"));
    }

    #[test]
    fn encoding_failures_are_not_reported_as_storage() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let message = CliError::from(json).user_message();
        assert!(message.contains("JSON"));
        assert!(!message.contains("storage unavailable"));
    }
}
