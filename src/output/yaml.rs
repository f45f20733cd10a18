// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use super::QueryResult;

pub struct YamlFormatter;

impl YamlFormatter {
    pub fn format(result: &QueryResult) -> String {
        let rows = result.to_json_rows();
        serde_yaml::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_nests_json_columns() {
        let result = QueryResult {
            columns: vec!["name".into(), "spec_to".into()],
            rows: vec![vec!["web".into(), r#"{"kind":"Service","name":"web"}"#.into()]],
        };
        let out = YamlFormatter::format(&result);
        let parsed: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed[0]["spec_to"]["kind"].as_str(), Some("Service"));
    }
}
