// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use anyhow::Result;
use console::{Style, style};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Editor, Helper};
use regex::{Captures, Regex, RegexBuilder};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Instant;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::OutputFormat;
use crate::datafusion_integration::OcSessionContext;
use crate::output::{self, QueryResult};
use crate::progress::{ProgressHandle, create_spinner};

const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "ORDER", "BY", "GROUP", "HAVING", "LIMIT", "AND", "OR", "SHOW",
    "TABLES", "DESCRIBE", "ASC", "DESC", "IN", "LIKE", "ILIKE", "NOT", "NULL", "IS", "TRUE",
    "FALSE", "JOIN", "LEFT", "ON", "AS", "COUNT", "DISTINCT", "EXPLAIN",
];

/// One line of input, classified
#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    Empty,
    Quit,
    Help,
    Clear,
    ShowTables,
    Describe(String),
    Sql(String),
}

impl Statement {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim().trim_end_matches(';').trim();
        if trimmed.is_empty() {
            return Statement::Empty;
        }

        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "quit" | "exit" | "\\q" => return Statement::Quit,
            "help" | "\\?" => return Statement::Help,
            "clear" | "\\c" => return Statement::Clear,
            "show tables" | "\\dt" => return Statement::ShowTables,
            _ => {}
        }

        let mut words = trimmed.split_whitespace();
        let first = words.next().map(str::to_lowercase);
        if let Some(cmd) = first.as_deref()
            && matches!(cmd, "describe" | "desc" | "\\d")
            && let Some(table) = words.next()
            && words.next().is_none()
        {
            return Statement::Describe(table.to_string());
        }

        Statement::Sql(trimmed.to_string())
    }
}

/// Answer one statement without touching the cluster, if possible
pub fn local_result(session: &OcSessionContext, stmt: &Statement) -> Option<Result<QueryResult>> {
    match stmt {
        Statement::ShowTables => Some(Ok(output::show_tables_result(&session.list_tables()))),
        Statement::Describe(name) => Some(
            session
                .describe_table(name)
                .map(|t| output::describe_table_result(&t))
                .ok_or_else(|| anyhow::anyhow!("Unknown table: {}", name)),
        ),
        _ => None,
    }
}

struct SqlHelper {
    /// Table and column names, sorted
    words: Vec<String>,
}

impl Helper for SqlHelper {}

impl Hinter for SqlHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Validator for SqlHelper {
    fn validate(&self, _ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

impl SqlHelper {
    fn candidates(&self, prefix: &str) -> Vec<Pair> {
        let prefix_lower = prefix.to_lowercase();
        let prefix_upper = prefix.to_uppercase();

        let keywords = KEYWORDS
            .iter()
            .filter(|kw| kw.starts_with(&prefix_upper))
            .map(|kw| kw.to_string());
        let names = self
            .words
            .iter()
            .filter(|w| w.starts_with(&prefix_lower))
            .cloned();

        keywords
            .chain(names)
            .map(|w| Pair {
                display: w.clone(),
                replacement: w,
            })
            .collect()
    }
}

impl Completer for SqlHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];

        // Find the start of the current word
        let word_start = line_to_cursor
            .rfind(|c: char| c.is_whitespace() || c == ',' || c == '(' || c == '=')
            .map(|i| i + 1)
            .unwrap_or(0);

        let prefix = &line_to_cursor[word_start..];
        if prefix.is_empty() {
            return Ok((pos, vec![]));
        }

        Ok((word_start, self.candidates(prefix)))
    }
}

/// Case-insensitive alternation of all keywords, matched on word boundaries
static KEYWORD_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let alternation = KEYWORDS
        .iter()
        .map(|kw| regex::escape(kw))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
        .case_insensitive(true)
        .build()
        .ok()
});

/// Color SQL keywords, keeping the case they were typed in
fn highlight_keywords(line: &str) -> Cow<'_, str> {
    match KEYWORD_RE.as_ref() {
        Some(re) => re.replace_all(line, |caps: &Captures| {
            format!("\x1b[1;34m{}\x1b[0m", &caps[0])
        }),
        None => Cow::Borrowed(line),
    }
}

impl Highlighter for SqlHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        highlight_keywords(line)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Owned(format!("\x1b[1;32m{}\x1b[0m", prompt))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "{} {} - Query OpenShift with SQL",
        style("ocsql").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!("{}", style("Type 'help' for commands, Ctrl+D to exit").dim());
    println!();
}

fn print_help() {
    let help_style = Style::new().cyan();
    let cmd_style = Style::new().yellow();

    println!("{}", help_style.apply_to("Commands:"));
    println!(
        "  {}  - List available tables (OpenShift kinds)",
        cmd_style.apply_to("SHOW TABLES")
    );
    println!(
        "  {}  - Show table columns",
        cmd_style.apply_to("DESCRIBE <table>")
    );
    println!();
    println!("{}", help_style.apply_to("Examples:"));
    println!(
        "  {} - Routes in one project",
        cmd_style.apply_to("SELECT name, host FROM openshift_route WHERE namespace = 'shop'")
    );
    println!(
        "  {} - Single object lookup",
        cmd_style.apply_to("SELECT * FROM openshift_project WHERE name = 'shop'")
    );
    println!(
        "  {} - JSON columns",
        cmd_style.apply_to("SELECT name, spec_to->>'name' FROM openshift_route")
    );
    println!();
    println!("{}", help_style.apply_to("Shortcuts:"));
    println!("  {} - SHOW TABLES", cmd_style.apply_to("\\dt"));
    println!("  {} - DESCRIBE <table>", cmd_style.apply_to("\\d <table>"));
    println!("  {} - Quit", cmd_style.apply_to("\\q"));
    println!();
    println!(
        "{}",
        style("Ctrl+C while a query runs stops paging and shows the rows fetched so far").dim()
    );
    println!();
}

/// Run a query, driving a spinner from progress updates
///
/// Ctrl+C cancels the listing; the query still completes with the rows
/// already fetched.
async fn run_query(
    session: &OcSessionContext,
    progress: &ProgressHandle,
    sql: &str,
) -> Result<QueryResult> {
    let spinner = create_spinner("Executing query...");
    let mut progress_rx = progress.subscribe();
    let mut cancelled = false;

    let query = session.execute_sql_to_strings(sql);
    tokio::pin!(query);

    let result = loop {
        tokio::select! {
            biased;
            result = &mut query => break result,
            _ = tokio::signal::ctrl_c(), if !cancelled => {
                cancelled = true;
                session.cancel_running();
                spinner.set_message("Cancelling...");
            }
            update = progress_rx.recv() => match update {
                Ok(update) if !cancelled => spinner.set_message(update.message()),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break (&mut query).await,
            },
        }
    };

    spinner.finish_and_clear();
    if cancelled {
        let (pages, rows) = progress.progress();
        println!(
            "{}",
            style(format!(
                "Query cancelled after {} pages ({} rows fetched)",
                pages, rows
            ))
            .yellow()
        );
    }
    result
}

pub async fn run_repl(
    session: OcSessionContext,
    progress: ProgressHandle,
    history_path: Option<PathBuf>,
) -> Result<()> {
    let helper = SqlHelper {
        words: session.completion_words(),
    };
    let config = rustyline::Config::builder()
        .auto_add_history(true)
        .max_history_size(1000)?
        .build();

    let mut rl: Editor<SqlHelper, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(helper));

    if let Some(path) = &history_path {
        let _ = rl.load_history(path);
    }

    print_welcome();

    loop {
        let prompt = format!("{}> ", style("ocsql").green().bold());

        match rl.readline(&prompt) {
            Ok(line) => {
                let stmt = Statement::parse(&line);
                let start = Instant::now();

                let result = match &stmt {
                    Statement::Empty => continue,
                    Statement::Quit => {
                        println!("{}", style("Goodbye!").dim());
                        break;
                    }
                    Statement::Help => {
                        print_help();
                        continue;
                    }
                    Statement::Clear => {
                        print!("\x1B[2J\x1B[1;1H");
                        continue;
                    }
                    Statement::Sql(sql) => run_query(&session, &progress, sql).await,
                    other => match local_result(&session, other) {
                        Some(result) => result,
                        None => continue,
                    },
                };

                match result {
                    Ok(result) => {
                        println!("{}", result.format(&OutputFormat::Table, false));
                        println!(
                            "{}",
                            style(format!("({:.2}s)", start.elapsed().as_secs_f64())).dim()
                        );
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Query failed");
                        println!("{} {}", style("Error:").red().bold(), style(e).red());
                    }
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", style("^C").dim());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", style("Goodbye!").dim());
                break;
            }
            Err(err) => {
                println!("{} {:?}", style("Error:").red().bold(), err);
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Statement::parse("  "), Statement::Empty);
        assert_eq!(Statement::parse("\\q"), Statement::Quit);
        assert_eq!(Statement::parse("EXIT"), Statement::Quit);
        assert_eq!(Statement::parse("show tables;"), Statement::ShowTables);
        assert_eq!(Statement::parse("\\dt"), Statement::ShowTables);
        assert_eq!(
            Statement::parse("DESCRIBE openshift_route;"),
            Statement::Describe("openshift_route".to_string())
        );
        assert_eq!(
            Statement::parse("\\d openshift_user"),
            Statement::Describe("openshift_user".to_string())
        );
    }

    #[test]
    fn test_parse_sql() {
        assert_eq!(
            Statement::parse("SELECT name FROM openshift_route;"),
            Statement::Sql("SELECT name FROM openshift_route".to_string())
        );
        // Extra words after the table name keep it as SQL
        assert!(matches!(
            Statement::parse("desc openshift_route extra"),
            Statement::Sql(_)
        ));
    }

    #[test]
    fn test_completion_candidates() {
        let helper = SqlHelper {
            words: vec!["openshift_route".to_string(), "owner_references".to_string()],
        };

        let names: Vec<String> = helper
            .candidates("opens")
            .into_iter()
            .map(|p| p.replacement)
            .collect();
        assert_eq!(names, vec!["openshift_route"]);

        let names: Vec<String> = helper
            .candidates("sel")
            .into_iter()
            .map(|p| p.replacement)
            .collect();
        assert_eq!(names, vec!["SELECT"]);
    }

    #[test]
    fn test_highlight_keywords() {
        let out = highlight_keywords("select name from t");
        assert!(out.starts_with("\x1b[1;34mselect\x1b[0m name "));
        assert!(out.contains("\x1b[1;34mfrom\x1b[0m"));
        assert!(out.ends_with(" t"));
    }

    #[test]
    fn test_highlight_respects_word_boundaries() {
        // keywords inside identifiers stay plain
        let out = highlight_keywords("SELECT selected, order_id FROM openshift_route");
        assert_eq!(
            out,
            "\x1b[1;34mSELECT\x1b[0m selected, order_id \x1b[1;34mFROM\x1b[0m openshift_route"
        );
        assert!(matches!(highlight_keywords("name, host"), Cow::Borrowed(_)));
    }
}
