// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod csv;
mod json;
mod table;
mod yaml;

pub use csv::CsvFormatter;
pub use json::JsonFormatter;
pub use table::TableFormatter;
pub use yaml::YamlFormatter;

use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::openshift::resources::TableInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    pub fn format(&self, format: &OutputFormat, no_headers: bool) -> String {
        match format {
            OutputFormat::Table => TableFormatter::format(self, no_headers),
            OutputFormat::Json => JsonFormatter::format(self),
            OutputFormat::Csv => CsvFormatter::format(self, no_headers),
            OutputFormat::Yaml => YamlFormatter::format(self),
        }
    }

    /// Rows as JSON objects keyed by column name
    ///
    /// Values holding a JSON object or array are embedded as structured values;
    /// everything else stays a string. Empty cells become null.
    pub fn to_json_rows(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(col, val)| (col.clone(), cell_to_json(val)))
                    .collect()
            })
            .collect()
    }
}

fn cell_to_json(val: &str) -> Value {
    if val.is_empty() {
        return Value::Null;
    }
    if (val.starts_with('{') || val.starts_with('['))
        && let Ok(parsed) = serde_json::from_str::<Value>(val)
    {
        return parsed;
    }
    Value::String(val.to_string())
}

/// Result for SHOW TABLES
pub fn show_tables_result(tables: &[TableInfo]) -> QueryResult {
    QueryResult {
        columns: vec![
            "table_name".to_string(),
            "api_version".to_string(),
            "kind".to_string(),
            "scope".to_string(),
            "description".to_string(),
        ],
        rows: tables
            .iter()
            .map(|t| {
                vec![
                    t.name.to_string(),
                    t.api_version.clone(),
                    t.kind.clone(),
                    t.scope().to_string(),
                    t.description.to_string(),
                ]
            })
            .collect(),
    }
}

/// Result for DESCRIBE <table>
pub fn describe_table_result(table: &TableInfo) -> QueryResult {
    QueryResult {
        columns: vec![
            "column_name".to_string(),
            "data_type".to_string(),
            "description".to_string(),
        ],
        rows: table
            .columns
            .iter()
            .map(|c| {
                vec![
                    c.name.to_string(),
                    c.column_type.as_str().to_string(),
                    c.description.to_string(),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openshift::resources::all_tables;

    #[test]
    fn test_json_rows_embed_structured_values() {
        let result = QueryResult {
            columns: vec!["name".into(), "labels".into(), "host".into()],
            rows: vec![vec!["web".into(), r#"{"app":"web"}"#.into(), String::new()]],
        };

        let rows = result.to_json_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "web");
        assert_eq!(rows[0]["labels"]["app"], "web");
        assert!(rows[0]["host"].is_null());
    }

    #[test]
    fn test_unparsable_brace_stays_string() {
        assert_eq!(cell_to_json("{oops"), Value::String("{oops".into()));
    }

    #[test]
    fn test_show_tables_result() {
        let result = show_tables_result(&all_tables());
        assert_eq!(result.rows.len(), 8);
        let project = result
            .rows
            .iter()
            .find(|r| r[0] == "openshift_project")
            .unwrap();
        assert_eq!(project[1], "project.openshift.io/v1");
        assert_eq!(project[3], "Cluster");
    }

    #[test]
    fn test_describe_table_result() {
        let route = all_tables()
            .into_iter()
            .find(|t| t.name == "openshift_route")
            .unwrap();
        let result = describe_table_result(&route);
        assert_eq!(result.rows[0][0], "name");
        assert_eq!(result.rows[0][1], "text");
        assert!(result.rows.iter().any(|r| r[0] == "host"));
    }
}
