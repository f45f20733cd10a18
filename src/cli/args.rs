// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "ocsql")]
#[command(author, version, about = "Query OpenShift resources using SQL")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Execute a SQL query directly
    #[arg(short, long)]
    pub query: Option<String>,

    /// Execute queries from a file
    #[arg(short, long)]
    pub file: Option<String>,

    /// Path to the kubeconfig file (overrides KUBE_CONFIG and ~/.kube/config)
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<String>,

    /// Context to use instead of the kubeconfig's current-context
    #[arg(short, long, value_name = "CONTEXT")]
    pub context: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Omit column headers in output
    #[arg(long)]
    pub no_headers: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn is_batch(&self) -> bool {
        self.query.is_some() || self.file.is_some()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start interactive REPL mode
    Interactive,
}

#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
    Yaml,
}
