// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Field selector construction from key qualifiers
//!
//! Equality filters on the `name` and `namespace` columns are sent to the API
//! server as a field selector, e.g. `metadata.name=foo,metadata.namespace=bar`.
//!
//! Every resource supports `metadata.name` and `metadata.namespace`, so only
//! those two columns are ever translated. Values are escaped the way the API
//! server's selector parser expects, so `,` and `=` never start a new clause.

/// One `path=value` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    /// Field path in Kubernetes notation (e.g., "metadata.name")
    pub path: &'static str,
    pub value: String,
}

impl FieldSelector {
    pub fn equals(path: &'static str, value: &str) -> Self {
        Self {
            path,
            value: value.to_string(),
        }
    }

    /// Convert to Kubernetes field selector string format
    pub fn to_k8s_string(&self) -> String {
        format!("{}={}", self.path, escape_value(&self.value))
    }
}

/// Escape a selector value so `\`, `,` and `=` stay part of the value
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ',' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Key column that can be pushed down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumn {
    Name,
    Namespace,
}

impl KeyColumn {
    pub fn field_path(self) -> &'static str {
        match self {
            KeyColumn::Name => "metadata.name",
            KeyColumn::Namespace => "metadata.namespace",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        match name {
            "name" => Some(KeyColumn::Name),
            "namespace" => Some(KeyColumn::Namespace),
            _ => None,
        }
    }
}

/// Equality qualifiers bound by a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyQuals {
    pub name: Option<String>,
    pub namespace: Option<String>,
}

impl KeyQuals {
    pub fn get(&self, key: KeyColumn) -> Option<&str> {
        match key {
            KeyColumn::Name => self.name.as_deref(),
            KeyColumn::Namespace => self.namespace.as_deref(),
        }
    }

    /// Build field selector clauses for the keys in `allowed`, name first
    pub fn selectors(&self, allowed: &[KeyColumn]) -> Vec<FieldSelector> {
        [KeyColumn::Name, KeyColumn::Namespace]
            .into_iter()
            .filter(|key| allowed.contains(key))
            .filter_map(|key| {
                self.get(key)
                    .map(|value| FieldSelector::equals(key.field_path(), value))
            })
            .collect()
    }

    /// Comma-joined selector string, `None` when nothing is bound
    pub fn field_selector(&self, allowed: &[KeyColumn]) -> Option<String> {
        let clauses: Vec<String> = self
            .selectors(allowed)
            .iter()
            .map(FieldSelector::to_k8s_string)
            .collect();
        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: &[KeyColumn] = &[KeyColumn::Name, KeyColumn::Namespace];

    #[test]
    fn test_field_selector_to_k8s_string() {
        assert_eq!(
            FieldSelector::equals("metadata.name", "foo").to_k8s_string(),
            "metadata.name=foo"
        );
        assert_eq!(
            FieldSelector::equals(KeyColumn::Namespace.field_path(), "shop").to_k8s_string(),
            "metadata.namespace=shop"
        );
    }

    #[test]
    fn test_value_is_escaped() {
        assert_eq!(
            FieldSelector::equals("metadata.name", "foo,metadata.namespace=shop").to_k8s_string(),
            r"metadata.name=foo\,metadata.namespace\=shop"
        );
        assert_eq!(escape_value(r"a\b"), r"a\\b");
        assert_eq!(escape_value("plain-name"), "plain-name");
    }

    #[test]
    fn test_injected_clause_stays_in_one_value() {
        let quals = KeyQuals {
            name: Some("foo,metadata.namespace=shop".to_string()),
            namespace: Some("dev".to_string()),
        };
        assert_eq!(
            quals.field_selector(BOTH).as_deref(),
            Some(r"metadata.name=foo\,metadata.namespace\=shop,metadata.namespace=dev")
        );
    }

    #[test]
    fn test_name_and_namespace_in_order() {
        let quals = KeyQuals {
            name: Some("foo".to_string()),
            namespace: Some("bar".to_string()),
        };
        assert_eq!(
            quals.field_selector(BOTH).as_deref(),
            Some("metadata.name=foo,metadata.namespace=bar")
        );
        // order does not depend on the allow-list order
        assert_eq!(
            quals
                .field_selector(&[KeyColumn::Namespace, KeyColumn::Name])
                .as_deref(),
            Some("metadata.name=foo,metadata.namespace=bar")
        );
    }

    #[test]
    fn test_namespace_only() {
        let quals = KeyQuals {
            namespace: Some("openshift-monitoring".to_string()),
            ..Default::default()
        };
        assert_eq!(
            quals.field_selector(BOTH).as_deref(),
            Some("metadata.namespace=openshift-monitoring")
        );
    }

    #[test]
    fn test_unbound_gives_none() {
        assert_eq!(KeyQuals::default().field_selector(BOTH), None);
    }

    #[test]
    fn test_disallowed_keys_are_dropped() {
        let quals = KeyQuals {
            name: Some("foo".to_string()),
            namespace: Some("bar".to_string()),
        };
        assert_eq!(quals.field_selector(&[]), None);
        assert_eq!(
            quals.field_selector(&[KeyColumn::Name]).as_deref(),
            Some("metadata.name=foo")
        );
    }

    #[test]
    fn test_key_column_lookup() {
        assert_eq!(KeyColumn::from_column("name"), Some(KeyColumn::Name));
        assert_eq!(KeyColumn::from_column("namespace"), Some(KeyColumn::Namespace));
        assert_eq!(KeyColumn::from_column("uid"), None);
    }
}
