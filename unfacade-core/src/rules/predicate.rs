// Inline `isBlank(x)` / `isPresent(x)` as boolean coercions of `x`.
//
// Only object-typed arguments are rewritten: for an object, blank means
// falsy and present means truthy. Primitive arguments (`''`, `0`, `false`)
// behave differently under plain coercion and are left alone.

use tree_sitter::Node;
use unfacade_graphs::ExprKind;

use super::{Rule, RuleContext, RuleMeta, RuleType};
use crate::edit::EditBuffer;
use crate::error::RuleError;
use crate::matcher::{FacadeTarget, LANG_FRAGMENT, ResolvedCall, match_function_call};
use crate::report::{RewriteFailure, report};

/// How the inlined argument is turned into a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// `isPresent(x)` → `!!x`, or bare `x` where only truthiness is tested.
    Truthiness,
    /// `isBlank(x)` → `!x`, everywhere.
    Negation,
}

#[derive(Debug)]
pub struct PredicateRule {
    meta: RuleMeta,
    target: FacadeTarget,
    coercion: Coercion,
    message: &'static str,
}

impl PredicateRule {
    pub fn is_blank() -> Self {
        Self {
            meta: RuleMeta {
                name: "is-blank",
                description: "isBlank helper is being removed; inline usages",
                rule_type: RuleType::Maintainability,
                requires_type_info: true,
                fixable: true,
            },
            target: FacadeTarget::new("isBlank", LANG_FRAGMENT),
            coercion: Coercion::Negation,
            message: "inline usages of isBlank",
        }
    }

    pub fn is_present() -> Self {
        Self {
            meta: RuleMeta {
                name: "is-present",
                description: "isPresent helper is being removed; inline usages",
                rule_type: RuleType::Maintainability,
                requires_type_info: true,
                fixable: true,
            },
            target: FacadeTarget::new("isPresent", LANG_FRAGMENT),
            coercion: Coercion::Truthiness,
            message: "inline usages of isPresent",
        }
    }

    fn coercion_text(&self, call: &ResolvedCall<'_>) -> &'static str {
        match self.coercion {
            Coercion::Negation => "!",
            Coercion::Truthiness if in_conditional_test(call.call) => "",
            Coercion::Truthiness => "!!",
        }
    }

    fn fix(&self, call: &ResolvedCall<'_>, arg: Node<'_>) -> EditBuffer {
        let coercion = self.coercion_text(call);
        let mut fix = EditBuffer::new();

        if ExprKind::of(arg).needs_parens() {
            // Keep the call's own parentheses around the argument; drop the
            // callee and anything between the argument and `)`.
            let close = call.argument_list.end_byte() - 1;
            fix.delete_range(call.start(), call.argument_list.start_byte())
                .delete_range(arg.end_byte(), close);
        } else {
            fix.delete_range(call.start(), arg.start_byte())
                .delete_range(arg.end_byte(), call.end());
        }

        if !coercion.is_empty() && binds_tighter_than_prefix(call.call) {
            fix.insert(call.start(), format!("({coercion}"))
                .insert(call.end(), ")");
        } else {
            fix.insert(call.start(), coercion);
        }
        fix
    }
}

impl Rule for PredicateRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn check_call(
        &self,
        ctx: &RuleContext<'_>,
        call: Node<'_>,
    ) -> Result<Option<RewriteFailure>, RuleError> {
        let Some(resolved) = match_function_call(ctx.model, ctx.path(), call, &self.target) else {
            return Ok(None);
        };
        let &[arg] = resolved.arguments.as_slice() else {
            return Ok(None);
        };
        if !ctx.model.static_type_of(ctx.path(), arg).is_object_like() {
            return Ok(None);
        }

        let fix = self.fix(&resolved, arg);
        report(
            self.meta.name,
            ctx.path(),
            ctx.source(),
            resolved.start(),
            resolved.width(),
            self.message.to_string(),
            Some(fix),
        )
        .map(Some)
    }
}

/// Whether the call is the test of an `if`, loop, or ternary, where only
/// truthiness matters.
fn in_conditional_test(call: Node<'_>) -> bool {
    let mut node = call;
    while let Some(parent) = node.parent() {
        match parent.kind() {
            "parenthesized_expression" | "expression_statement" => node = parent,
            "if_statement" | "while_statement" | "do_statement" | "for_statement"
            | "ternary_expression" => {
                return parent.child_by_field_name("condition") == Some(node);
            }
            _ => return false,
        }
    }
    false
}

/// Whether the call sits where a prefix `!` would bind to less than the
/// whole replacement (`isPresent(x).toString()`).
fn binds_tighter_than_prefix(call: Node<'_>) -> bool {
    let Some(parent) = call.parent() else {
        return false;
    };
    let field = match parent.kind() {
        "member_expression" | "subscript_expression" => "object",
        "call_expression" => "function",
        "new_expression" => "constructor",
        _ => return false,
    };
    parent.child_by_field_name(field) == Some(call)
}
