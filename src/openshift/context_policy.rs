// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Context allow-list policy
//!
//! Decides whether a kubeconfig's current context may be used without an
//! explicit `--context` override. Patterns are exact names or globs:
//! - Exact names: "openshift-prod"
//! - Glob patterns: "*openshift*", "ocp-??"

/// Default pattern applied when no allow-list is configured
pub const DEFAULT_ALLOWED_CONTEXT: &str = "*openshift*";

/// Matches context names against an allow-list of glob patterns
pub struct ContextPolicy<'a> {
    patterns: &'a [String],
}

impl<'a> ContextPolicy<'a> {
    pub fn new(patterns: &'a [String]) -> Self {
        Self { patterns }
    }

    /// True when `context` matches any pattern. An empty allow-list matches nothing.
    pub fn allows(&self, context: &str) -> bool {
        self.patterns
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .any(|p| glob_match(p, context))
    }
}

/// Simple glob pattern matching (supports * and ?)
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0; // pattern index
    let mut ti = 0; // text index
    let mut star_pi = None; // position of last '*' in pattern
    let mut star_ti = 0; // text position when that '*' was seen

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(sp) = star_pi {
            // let the last '*' swallow one more character
            pi = sp + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }

    pi == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_pattern_matches_openshift_contexts() {
        let allow = patterns(&[DEFAULT_ALLOWED_CONTEXT]);
        let policy = ContextPolicy::new(&allow);
        assert!(policy.allows("openshift-prod"));
        assert!(policy.allows("default/api-openshift-example-com:6443/admin"));
        assert!(!policy.allows("minikube"));
        assert!(!policy.allows("kind-dev"));
    }

    #[test]
    fn test_exact_pattern() {
        let allow = patterns(&["ocp-prod"]);
        let policy = ContextPolicy::new(&allow);
        assert!(policy.allows("ocp-prod"));
        assert!(!policy.allows("ocp-prod-2"));
    }

    #[test]
    fn test_multiple_patterns() {
        let allow = patterns(&["ocp-*", " crc "]);
        let policy = ContextPolicy::new(&allow);
        assert!(policy.allows("ocp-staging"));
        assert!(policy.allows("crc"));
        assert!(!policy.allows("eks-prod"));
    }

    #[test]
    fn test_empty_allow_list_matches_nothing() {
        let allow: Vec<String> = vec![];
        assert!(!ContextPolicy::new(&allow).allows("openshift-prod"));

        let blank = patterns(&["", "  "]);
        assert!(!ContextPolicy::new(&blank).allows("openshift-prod"));
    }

    #[test]
    fn test_glob_match_question() {
        assert!(glob_match("ocp-0?", "ocp-01"));
        assert!(!glob_match("ocp-0?", "ocp-011"));
        assert!(!glob_match("ocp-0?", "ocp-0"));
    }

    #[test]
    fn test_glob_match_multiple_wildcards() {
        assert!(glob_match("*-*", "prod-01"));
        assert!(!glob_match("*-*", "dev"));
        assert!(glob_match("*shift*", "openshift"));
    }
}
