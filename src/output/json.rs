// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use super::QueryResult;

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format(result: &QueryResult) -> String {
        let rows = result.to_json_rows();
        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_output_is_array_of_objects() {
        let result = QueryResult {
            columns: vec!["name".into(), "status_replicas".into()],
            rows: vec![vec!["web".into(), "3".into()]],
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&JsonFormatter::format(&result)).unwrap();
        assert_eq!(parsed[0]["name"], "web");
        assert_eq!(parsed[0]["status_replicas"], "3");
    }

    #[test]
    fn test_empty_result() {
        let result = QueryResult {
            columns: vec!["name".into()],
            rows: vec![],
        };
        assert_eq!(JsonFormatter::format(&result), "[]");
    }
}
