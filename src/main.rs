use std::path::Path;
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command, SourceArgs};
use tokenbridge::config::Settings;
use tokenbridge::{PretrainedOptions, Tokenizer};

/// Entry point for the tokenbridge command line tool
///
/// Loads settings, installs file logging and runs one subcommand:
/// - Encode / Decode / VocabSize: load a tokenizer from a file or a pretrained id
/// - Fetch: populate the cache for a pretrained id
///
/// # Errors
/// Returns an error if settings are invalid, the tokenizer cannot be loaded
/// or the requested operation fails
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new().context("Failed to load settings")?;

    let log_dir = settings.logging.file.as_deref().unwrap_or_else(|| Path::new("logs"));
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::RollingFileAppender::new(
        tracing_appender::rolling::Rotation::DAILY,
        log_dir,
        "tokenbridge",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.to_lowercase()));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        // Plain text for log files
        .with_ansi(false)
        .with_line_number(true)
        .with_file(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    info!("tokenbridge starting up");

    match cli.command {
        Command::Encode { source, text, no_special_tokens, json } => {
            let tokenizer = load(&source, &settings).await?;
            let encoding = tokenizer.encode(&text, !no_special_tokens, &[tokenbridge::EncodeOption::ReturnAllAttributes])?;
            if json {
                println!("{}", serde_json::to_string_pretty(&encoding)?);
            } else {
                println!("{}", cli::display::encoding_table(&encoding));
                println!("{} {}", "Tokens:".cyan(), encoding.len());
            }
            tokenizer.close();
        }
        Command::Decode { source, ids, keep_special_tokens } => {
            let tokenizer = load(&source, &settings).await?;
            println!("{}", tokenizer.decode(&ids, !keep_special_tokens)?);
            tokenizer.close();
        }
        Command::VocabSize { source } => {
            let tokenizer = load(&source, &settings).await?;
            println!("{}", tokenizer.vocab_size());
            tokenizer.close();
        }
        Command::Fetch { model_id, cache_dir } => {
            let mut options = settings.pretrained_options();
            if let Some(dir) = cache_dir {
                options = options.with_cache_dir(dir);
            }
            let target = options
                .cache_dir
                .as_ref()
                .map(|dir| dir.join(model_id.trim()).display().to_string());

            match Tokenizer::from_pretrained(&model_id, options).await {
                Ok(tokenizer) => {
                    println!("{} {} (vocab size {})", "Fetched".green().bold(), model_id.trim(), tokenizer.vocab_size());
                    match target {
                        Some(dir) => println!("{} {}", "Cache:".cyan(), dir),
                        None => println!("{}", "No cache directory configured, files were discarded".yellow()),
                    }
                    tokenizer.close();
                }
                Err(e) => {
                    println!("{} {}", "Fetch failed:".red().bold(), e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

async fn load(source: &SourceArgs, settings: &Settings) -> Result<Tokenizer> {
    if let Some(path) = &source.file {
        return Tokenizer::from_file(path)
            .with_context(|| format!("Failed to load tokenizer from {}", path.display()));
    }
    let model_id = source.pretrained.as_deref().unwrap_or_default();
    let options: PretrainedOptions = settings.pretrained_options();
    Tokenizer::from_pretrained(model_id, options)
        .await
        .with_context(|| format!("Failed to load pretrained tokenizer {}", model_id))
}
