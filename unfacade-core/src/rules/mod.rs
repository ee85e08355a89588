//! Rewrite rules for deprecated facade helpers.
//!
//! Each rule implements [`Rule`]: it is handed every call expression of a file
//! and returns a [`RewriteFailure`] for calls it recognises. Rules are
//! registered once in a [`RuleRegistry`] and looked up by name.

pub mod predicate;
pub mod string_map;

use std::path::Path;

use serde::Serialize;
use tree_sitter::Node;
use unfacade_graphs::{SemanticModel, SourceFile};

use crate::error::RuleError;
use crate::report::RewriteFailure;

pub use predicate::{Coercion, PredicateRule};
pub use string_map::{MapMember, StringMapRule};

/// Rule category, as shown by `unfacade rules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Maintainability,
}

/// Static metadata for a rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleMeta {
    /// Rule name, e.g. "is-blank".
    pub name: &'static str,
    pub description: &'static str,
    pub rule_type: RuleType,
    /// Whether the rule needs resolved symbols and types.
    pub requires_type_info: bool,
    /// Whether the rule can produce fixes.
    pub fixable: bool,
}

/// What a rule sees while checking one file.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub model: &'a dyn SemanticModel,
    pub file: &'a SourceFile,
}

impl std::fmt::Debug for RuleContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleContext")
            .field("file", &self.file.path)
            .finish_non_exhaustive()
    }
}

impl<'a> RuleContext<'a> {
    pub fn new(model: &'a dyn SemanticModel, file: &'a SourceFile) -> Self {
        Self { model, file }
    }

    pub fn path(&self) -> &'a Path {
        &self.file.path
    }

    pub fn source(&self) -> &'a str {
        &self.file.source
    }

    /// Source text of a node, verbatim.
    pub fn text(&self, node: Node<'_>) -> &'a str {
        &self.file.source[node.byte_range()]
    }

    /// Source text of a byte range, verbatim.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.file.source[start..end]
    }
}

/// A rewrite rule over call expressions.
pub trait Rule: Send + Sync + std::fmt::Debug {
    fn meta(&self) -> &RuleMeta;

    /// Inspect one call expression. `Ok(None)` means the rule does not apply.
    fn check_call(
        &self,
        ctx: &RuleContext<'_>,
        call: Node<'_>,
    ) -> Result<Option<RewriteFailure>, RuleError>;
}

/// All built-in rules, in registration order.
#[derive(Debug)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(PredicateRule::is_blank()),
                Box::new(PredicateRule::is_present()),
                Box::new(StringMapRule::new()),
            ],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.meta().name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.meta().name == name)
            .map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    /// Rules whose names appear in `enabled`, in registration order.
    pub fn select<'r>(&'r self, enabled: &[String]) -> Vec<&'r dyn Rule> {
        self.iter()
            .filter(|r| enabled.iter().any(|name| name == r.meta().name))
            .collect()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_builtin_rules() {
        let registry = RuleRegistry::new();
        assert_eq!(registry.names(), vec!["is-blank", "is-present", "string-map-wrapper"]);
        for rule in registry.iter() {
            assert!(rule.meta().requires_type_info);
            assert_eq!(rule.meta().rule_type, RuleType::Maintainability);
        }
    }

    #[test]
    fn select_keeps_registration_order() {
        let registry = RuleRegistry::new();
        let enabled = vec!["string-map-wrapper".to_string(), "is-blank".to_string()];
        let names: Vec<_> = registry.select(&enabled).iter().map(|r| r.meta().name).collect();
        assert_eq!(names, vec!["is-blank", "string-map-wrapper"]);
        assert!(registry.get("no-such-rule").is_none());
    }
}
