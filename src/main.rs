// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cli;
pub mod config;
mod datafusion_integration;
mod openshift;
mod output;
pub mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;

use cli::repl::{Statement, local_result};
use cli::{Args, Command};
use config::Config;
use datafusion_integration::OcSessionContext;

/// Initialize logging with file output and optional stderr
fn init_logging(verbose: bool, to_stderr: bool) {
    use tracing_rolling_file::{RollingConditionBase, RollingFileAppenderBase};
    use tracing_subscriber::fmt::format::FmtSpan;

    let log_dir = config::base_dir()
        .map(|p| p.join("log"))
        .unwrap_or_else(|_| std::path::PathBuf::from("."));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        return;
    }

    // Rotate daily or at 10MB, keeping 5 files
    let log_path = log_dir.join("ocsql.log");
    let condition = RollingConditionBase::new()
        .daily()
        .max_size(10 * 1024 * 1024);

    let file_appender = match RollingFileAppenderBase::new(log_path, condition, 5) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {}", e);
            return;
        }
    };

    let (non_blocking, guard) = file_appender.get_non_blocking_appender();
    // The background writer lives for the whole process
    std::mem::forget(guard);

    let filter = if verbose { "ocsql=debug" } else { "ocsql=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE);

    if to_stderr {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::NONE);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stderr_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    }
}

/// Stored configuration with command-line overrides applied
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load()?;
    config.connection = config
        .connection
        .with_overrides(args.kubeconfig.as_deref(), args.context.as_deref());
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (aws-lc-rs)
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let args = Args::parse();

    // Always log to ~/.ocsql/log/ocsql.log; batch mode with -v also logs to stderr
    init_logging(args.verbose, args.is_batch() && args.verbose);

    if matches!(args.command, Some(Command::Interactive)) || !args.is_batch() {
        return run_interactive(&args).await;
    }

    if let Err(e) = run_batch(&args).await {
        eprintln!("Error executing query: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Split a query file into statements: blank lines and `--` comments are skipped
fn file_queries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("--"))
        .map(String::from)
        .collect()
}

async fn run_batch(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let session = OcSessionContext::new(config, progress::create_progress_handle())?;

    let queries = if let Some(query) = &args.query {
        vec![query.clone()]
    } else if let Some(file) = &args.file {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read query file: {}", file))?;
        file_queries(&content)
    } else {
        return Ok(());
    };

    for query in queries {
        let stmt = Statement::parse(&query);
        let result = match &stmt {
            Statement::Sql(sql) => session.execute_sql_to_strings(sql).await?,
            other => match local_result(&session, other) {
                Some(result) => result?,
                None => continue,
            },
        };
        println!("{}", result.format(&args.output, args.no_headers));
    }

    Ok(())
}

async fn run_interactive(args: &Args) -> Result<()> {
    // Write a default config on first run so it can be edited
    if let Ok(path) = Config::config_path()
        && !path.exists()
        && let Err(e) = Config::default().save()
    {
        tracing::warn!(error = %e, "Could not write default config");
    }

    let config = load_config(args)?;
    let progress = progress::create_progress_handle();
    let session = OcSessionContext::new(config, std::sync::Arc::clone(&progress))?;
    let history_path = config::base_dir().ok().map(|p| p.join("history"));

    cli::repl::run_repl(session, progress, history_path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_queries_skip_comments() {
        let content = "-- routes\nSELECT name FROM openshift_route;\n\n  SHOW TABLES\n";
        assert_eq!(
            file_queries(content),
            vec!["SELECT name FROM openshift_route;", "SHOW TABLES"]
        );
    }
}
