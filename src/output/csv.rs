// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use super::QueryResult;

pub struct CsvFormatter;

impl CsvFormatter {
    pub fn format(result: &QueryResult, no_headers: bool) -> String {
        let mut lines = Vec::new();

        if !no_headers {
            lines.push(
                result
                    .columns
                    .iter()
                    .map(|c| escape(c))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }

        for row in &result.rows {
            let escaped: Vec<String> = row.iter().map(|val| escape(val)).collect();
            lines.push(escaped.join(","));
        }

        lines.join("\n")
    }
}

fn escape(val: &str) -> String {
    if val.contains(',') || val.contains('"') || val.contains('\n') {
        format!("\"{}\"", val.replace('"', "\"\""))
    } else {
        val.to_string()
    }
}
