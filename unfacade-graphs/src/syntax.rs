// Expression classification over tree-sitter nodes.
//
// Tree-sitter exposes node kinds as strings; rewrite code asks questions about
// expression shape through `ExprKind` instead of comparing kind strings.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

pub use crate::languages::helpers::node_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    String,
    Template,
    Number,
    Boolean,
    Null,
    Undefined,
    Regex,
}

/// Tagged classification of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprKind {
    Identifier,
    Member,
    Call,
    Literal(LiteralKind),
    Binary,
    Unary,
    Conditional,
    Assignment,
    Sequence,
    /// `x as T`, `x satisfies T`, `<T>x`
    TypeAssertion,
    Parenthesized,
    Function,
    Object,
    Array,
    New,
    Other,
}

impl ExprKind {
    pub fn of(node: Node<'_>) -> Self {
        match node.kind() {
            "identifier" | "this" | "super" => Self::Identifier,
            "member_expression" | "subscript_expression" => Self::Member,
            "call_expression" => Self::Call,
            "string" => Self::Literal(LiteralKind::String),
            "template_string" => Self::Literal(LiteralKind::Template),
            "number" => Self::Literal(LiteralKind::Number),
            "true" | "false" => Self::Literal(LiteralKind::Boolean),
            "null" => Self::Literal(LiteralKind::Null),
            "undefined" => Self::Literal(LiteralKind::Undefined),
            "regex" => Self::Literal(LiteralKind::Regex),
            "binary_expression" => Self::Binary,
            "unary_expression" | "update_expression" | "await_expression"
            | "non_null_expression" => Self::Unary,
            "ternary_expression" => Self::Conditional,
            "assignment_expression" | "augmented_assignment_expression" => Self::Assignment,
            "sequence_expression" => Self::Sequence,
            "as_expression" | "satisfies_expression" | "type_assertion" => Self::TypeAssertion,
            "parenthesized_expression" => Self::Parenthesized,
            "arrow_function" | "function_expression" | "function" | "generator_function" => {
                Self::Function
            }
            "object" => Self::Object,
            "array" => Self::Array,
            "new_expression" => Self::New,
            _ => Self::Other,
        }
    }

    /// Whether a prefix operator applied to this expression must be separated
    /// from it by parentheses.
    pub fn needs_parens(self) -> bool {
        matches!(
            self,
            Self::Binary
                | Self::Conditional
                | Self::Assignment
                | Self::Sequence
                | Self::TypeAssertion
                | Self::Function
        )
    }

    /// Whether this expression must be parenthesized before `.name` or
    /// `[key]` is appended to it.
    pub fn needs_parens_as_object(self) -> bool {
        self.needs_parens()
            || matches!(
                self,
                Self::Unary | Self::New | Self::Object | Self::Literal(LiteralKind::Number)
            )
    }
}

/// Whether the node is a comment (comments are named extras in tree-sitter).
pub fn is_comment(node: Node<'_>) -> bool {
    node.kind() == "comment"
}

/// First named, non-comment child.
pub fn first_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).find(|c| !is_comment(*c))
}

/// Named, non-comment children in source order.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !is_comment(*c))
        .collect()
}

/// Strip any number of wrapping `( ... )`.
pub fn strip_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match first_named_child(node) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// The parenthesized argument list of a call and its arguments.
///
/// `None` for calls without one, such as tagged templates.
pub fn call_arguments(call: Node<'_>) -> Option<(Node<'_>, Vec<Node<'_>>)> {
    let list = call.child_by_field_name("arguments")?;
    if list.kind() != "arguments" {
        return None;
    }
    Some((list, named_children(list)))
}
