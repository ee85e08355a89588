// Translate `StringMapWrapper.<member>(...)` calls into plain object code.
//
// Every replacement is assembled from verbatim slices of the original call's
// arguments. A member with no entry in `MapMember` is an error, never a skip.

use tree_sitter::Node;
use unfacade_graphs::ExprKind;
use unfacade_graphs::syntax::{is_comment, named_children, strip_parens};

use super::{Rule, RuleContext, RuleMeta, RuleType};
use crate::edit::EditBuffer;
use crate::error::RuleError;
use crate::matcher::{COLLECTION_FRAGMENT, FacadeTarget, ResolvedCall, match_member_call};
use crate::report::{RewriteFailure, report};

/// Members of `StringMapWrapper` this rule knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapMember {
    Create,
    Contains,
    Keys,
    Values,
    IsEmpty,
    Merge,
    Equals,
    ForEach,
}

impl MapMember {
    pub const ALL: [Self; 8] = [
        Self::Create,
        Self::Contains,
        Self::Keys,
        Self::Values,
        Self::IsEmpty,
        Self::Merge,
        Self::Equals,
        Self::ForEach,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Contains => "contains",
            Self::Keys => "keys",
            Self::Values => "values",
            Self::IsEmpty => "isEmpty",
            Self::Merge => "merge",
            Self::Equals => "equals",
            Self::ForEach => "forEach",
        }
    }

    /// Arguments the replacement reads.
    pub fn arity(self) -> usize {
        match self {
            Self::Create => 0,
            Self::Keys | Self::Values | Self::IsEmpty => 1,
            Self::Contains | Self::Merge | Self::Equals | Self::ForEach => 2,
        }
    }
}

#[derive(Debug)]
pub struct StringMapRule {
    meta: RuleMeta,
    target: FacadeTarget,
}

impl StringMapRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta {
                name: "string-map-wrapper",
                description: "StringMapWrapper helper is being removed; inline usages",
                rule_type: RuleType::Maintainability,
                requires_type_info: true,
                fixable: true,
            },
            target: FacadeTarget::new("StringMapWrapper", COLLECTION_FRAGMENT),
        }
    }

    /// Replacement text for the whole call, or `None` when there is none.
    fn replacement(
        ctx: &RuleContext<'_>,
        call: &ResolvedCall<'_>,
        member: MapMember,
    ) -> Option<String> {
        if call.arguments.len() < member.arity() {
            return None;
        }
        let arg = |i: usize| call.argument(i).map_or("", |n| ctx.text(n));
        // The map as the object of `.name` or `[key]`.
        let object = |i: usize| call.argument(i).map_or_else(String::new, |n| object_text(ctx, n));

        let text = match member {
            MapMember::Create if opens_block_position(call.call) => "({})".to_string(),
            MapMember::Create => "{}".to_string(),
            MapMember::Contains => format!("{}.hasOwnProperty({})", object(0), arg(1)),
            MapMember::Keys => format!("Object.keys({})", arg(0)),
            MapMember::Values => {
                let key = fresh_key(&[arg(0)]);
                format!("Object.keys({}).map({key} => {}[{key}])", arg(0), object(0))
            }
            MapMember::IsEmpty => {
                let test = format!("Object.keys({}).length === 0", arg(0));
                if accepts_bare_comparison(call.call, ctx.source()) {
                    test
                } else {
                    format!("({test})")
                }
            }
            MapMember::Merge | MapMember::Equals => return None,
            MapMember::ForEach => {
                let callback = strip_parens(call.argument(1)?);
                inline_for_each(ctx, arg(0), &object(0), callback)
                    .unwrap_or_else(|| for_each_placeholder(ctx.text(call.call)))
            }
        };
        Some(text)
    }
}

impl Default for StringMapRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for StringMapRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn check_call(
        &self,
        ctx: &RuleContext<'_>,
        call: Node<'_>,
    ) -> Result<Option<RewriteFailure>, RuleError> {
        let Some(resolved) =
            match_member_call(ctx.model, ctx.path(), ctx.source(), call, &self.target)
        else {
            return Ok(None);
        };
        let name = resolved.member.as_deref().unwrap_or_default();
        let member = MapMember::from_name(name).ok_or_else(|| RuleError::UnsupportedMember {
            file: ctx.path().display().to_string(),
            member: name.to_string(),
            call_text: ctx.text(call).to_string(),
        })?;

        let fix = Self::replacement(ctx, &resolved, member).map(|text| {
            let mut fix = EditBuffer::new();
            fix.replace(resolved.start(), resolved.end(), text);
            fix
        });

        report(
            self.meta.name,
            ctx.path(),
            ctx.source(),
            resolved.start(),
            resolved.width(),
            "inline usages of StringMapWrapper".to_string(),
            fix,
        )
        .map(Some)
    }
}

/// `forEach(m, (v, k) => body)` as a loop over `Object.keys(m)`.
///
/// `None` unless the callback is a function literal. Generators are not.
fn inline_for_each(
    ctx: &RuleContext<'_>,
    map: &str,
    map_object: &str,
    callback: Node<'_>,
) -> Option<String> {
    if !matches!(
        callback.kind(),
        "arrow_function" | "function_expression" | "function"
    ) {
        return None;
    }

    let params = parameter_names(ctx, callback);
    let body = callback_body(ctx, callback.child_by_field_name("body")?);
    let key = match params.get(1) {
        Some(name) => (*name).to_string(),
        None => fresh_key(&[map, body, params.first().copied().unwrap_or_default()]),
    };

    let mut statements = Vec::new();
    if let Some(value) = params.first() {
        statements.push(format!("const {value} = {map_object}[{key}];"));
    }
    if !body.is_empty() {
        statements.push(body.to_string());
    }
    let block = if statements.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", statements.join(" "))
    };
    let modifier = if is_async(callback) { "async " } else { "" };
    Some(format!("Object.keys({map}).forEach({modifier}{key} => {block})"))
}

fn is_async(callback: Node<'_>) -> bool {
    let mut cursor = callback.walk();
    callback.children(&mut cursor).any(|n| n.kind() == "async")
}

/// Argument text, parenthesized when `.name` or `[key]` would otherwise bind
/// to part of it.
fn object_text(ctx: &RuleContext<'_>, argument: Node<'_>) -> String {
    let text = ctx.text(argument);
    if ExprKind::of(argument).needs_parens_as_object() {
        format!("({text})")
    } else {
        text.to_string()
    }
}

/// First of `k`, `key`, `k1`, `k2`, ... that none of `texts` mentions.
fn fresh_key(texts: &[&str]) -> String {
    let taken = |name: &str| {
        texts.iter().any(|text| {
            text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                .any(|word| word == name)
        })
    };
    for name in ["k", "key"] {
        if !taken(name) {
            return name.to_string();
        }
    }
    let mut i = 1;
    loop {
        let name = format!("k{i}");
        if !taken(&name) {
            return name;
        }
        i += 1;
    }
}

/// Whether text replacing the call would start an expression statement or a
/// concise arrow body, where a leading `{` opens a block.
fn opens_block_position(call: Node<'_>) -> bool {
    let mut node = call;
    while let Some(parent) = node.parent() {
        match parent.kind() {
            "expression_statement" => return true,
            "arrow_function" => return parent.child_by_field_name("body") == Some(node),
            _ if parent.start_byte() == node.start_byte()
                && ExprKind::of(parent) != ExprKind::Other =>
            {
                node = parent;
            }
            _ => return false,
        }
    }
    false
}

/// Whether an unparenthesized `a === b` keeps its meaning in the call's place.
fn accepts_bare_comparison(call: Node<'_>, source: &str) -> bool {
    let Some(parent) = call.parent() else {
        return true;
    };
    match parent.kind() {
        "arguments" | "parenthesized_expression" | "variable_declarator" | "return_statement"
        | "expression_statement" | "array" | "pair" | "template_substitution"
        | "arrow_function" | "ternary_expression" | "assignment_expression"
        | "augmented_assignment_expression" | "public_field_definition" => true,
        "binary_expression" => parent
            .child_by_field_name("operator")
            .is_some_and(|op| matches!(&source[op.byte_range()], "&&" | "||" | "??")),
        _ => false,
    }
}

/// Binding text of each parameter, without type annotations or defaults.
fn parameter_names<'a>(ctx: &RuleContext<'a>, callback: Node<'_>) -> Vec<&'a str> {
    // `v => ...` has a single bare parameter.
    if let Some(single) = callback.child_by_field_name("parameter") {
        return vec![ctx.text(single)];
    }
    let Some(params) = callback.child_by_field_name("parameters") else {
        return Vec::new();
    };
    named_children(params)
        .into_iter()
        .filter_map(|p| match p.kind() {
            "required_parameter" | "optional_parameter" => {
                p.child_by_field_name("pattern").map(|n| ctx.text(n))
            }
            "identifier" => Some(ctx.text(p)),
            _ => None,
        })
        .collect()
}

/// Statements of a block body from the first to the last, or an expression
/// body as written.
fn callback_body<'a>(ctx: &RuleContext<'a>, body: Node<'_>) -> &'a str {
    if body.kind() != "statement_block" {
        return ctx.text(body);
    }
    let mut cursor = body.walk();
    let statements: Vec<Node<'_>> = body
        .named_children(&mut cursor)
        .filter(|n| !is_comment(*n))
        .collect();
    match (statements.first(), statements.last()) {
        (Some(first), Some(last)) => ctx.slice(first.start_byte(), last.end_byte()),
        _ => "",
    }
}

fn for_each_placeholder(call_text: &str) -> String {
    format!(
        "/* FIXME(unfacade): inline StringMapWrapper.forEach\n{}\n*/",
        call_text.replace("*/", "* /")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{fixed, run};

    const IMPORT: &str = "import { StringMapWrapper } from './facade/src/collection';\n";

    fn rewrite(body: &str) -> String {
        fixed(&StringMapRule::new(), &format!("{IMPORT}{body}"))
            .trim_start_matches(IMPORT)
            .to_string()
    }

    #[test]
    fn member_names_round_trip() {
        for member in MapMember::ALL {
            assert_eq!(MapMember::from_name(member.name()), Some(member));
        }
        assert_eq!(MapMember::from_name("clear"), None);
    }

    #[test]
    fn simple_members() {
        assert_eq!(rewrite("const m = StringMapWrapper.create();"), "const m = {};");
        assert_eq!(
            rewrite("StringMapWrapper.contains(m, 'a');"),
            "m.hasOwnProperty('a');"
        );
        assert_eq!(rewrite("f(StringMapWrapper.keys(m));"), "f(Object.keys(m));");
        assert_eq!(
            rewrite("f(StringMapWrapper.values(this.map));"),
            "f(Object.keys(this.map).map(k => this.map[k]));"
        );
        assert_eq!(
            rewrite("if (StringMapWrapper.isEmpty(m)) {}"),
            "if (Object.keys(m).length === 0) {}"
        );
    }

    #[test]
    fn operands_are_parenthesized_where_precedence_requires() {
        assert_eq!(
            rewrite("if (!StringMapWrapper.isEmpty(m)) {}"),
            "if (!(Object.keys(m).length === 0)) {}"
        );
        assert_eq!(
            rewrite("f(StringMapWrapper.values(a || b));"),
            "f(Object.keys(a || b).map(k => (a || b)[k]));"
        );
        assert_eq!(
            rewrite("f(StringMapWrapper.contains(a || b, 'k'));"),
            "f((a || b).hasOwnProperty('k'));"
        );
        assert_eq!(
            rewrite("StringMapWrapper.create().toString();"),
            "({}).toString();"
        );
        assert_eq!(rewrite("const f = () => StringMapWrapper.create();"), "const f = () => ({});");
    }

    #[test]
    fn bare_results_stay_unparenthesized() {
        assert_eq!(
            rewrite("const e = StringMapWrapper.isEmpty(m);"),
            "const e = Object.keys(m).length === 0;"
        );
        assert_eq!(
            rewrite("ok = ready && StringMapWrapper.isEmpty(m);"),
            "ok = ready && Object.keys(m).length === 0;"
        );
        assert_eq!(rewrite("use(StringMapWrapper.create());"), "use({});");
        assert_eq!(
            rewrite("f(StringMapWrapper.contains(a.b, 'x'));"),
            "f(a.b.hasOwnProperty('x'));"
        );
    }

    #[test]
    fn generated_key_avoids_names_in_scope() {
        assert_eq!(
            rewrite("f(StringMapWrapper.values(k));"),
            "f(Object.keys(k).map(key => k[key]));"
        );
        assert_eq!(
            rewrite("StringMapWrapper.forEach(m, v => log(v, k));"),
            "Object.keys(m).forEach(key => { const v = m[key]; log(v, k) });"
        );
    }

    #[test]
    fn async_callback_stays_async() {
        assert_eq!(
            rewrite("StringMapWrapper.forEach(m, async (v) => { await save(v); });"),
            "Object.keys(m).forEach(async k => { const v = m[k]; await save(v); });"
        );
        assert_eq!(
            rewrite("StringMapWrapper.forEach(m, async function(v) { await save(v); });"),
            "Object.keys(m).forEach(async k => { const v = m[k]; await save(v); });"
        );
    }

    #[test]
    fn generator_callback_leaves_a_placeholder() {
        let out = rewrite("StringMapWrapper.forEach(m, function*(v) { yield v; });");
        assert!(out.starts_with("/* FIXME(unfacade): inline StringMapWrapper.forEach"), "{out}");
    }

    #[test]
    fn for_each_binds_key_and_value() {
        assert_eq!(
            rewrite("StringMapWrapper.forEach(m, (v, key) => { use(v); use(key); });"),
            "Object.keys(m).forEach(key => { const v = m[key]; use(v); use(key); });"
        );
    }

    #[test]
    fn for_each_defaults_key_name() {
        assert_eq!(
            rewrite("StringMapWrapper.forEach(m, (value: number) => total += value);"),
            "Object.keys(m).forEach(k => { const value = m[k]; total += value });"
        );
        assert_eq!(
            rewrite("StringMapWrapper.forEach(m, function(v) {\n  log(v);\n});"),
            "Object.keys(m).forEach(k => { const v = m[k]; log(v); });"
        );
        assert_eq!(
            rewrite("StringMapWrapper.forEach(m, v => log(v));"),
            "Object.keys(m).forEach(k => { const v = m[k]; log(v) });"
        );
    }

    #[test]
    fn for_each_without_parameters_omits_binding() {
        assert_eq!(
            rewrite("StringMapWrapper.forEach(m, () => { tick(); });"),
            "Object.keys(m).forEach(k => { tick(); });"
        );
    }

    #[test]
    fn for_each_with_named_callback_leaves_a_placeholder() {
        assert_eq!(
            rewrite("StringMapWrapper.forEach(m, /* cb */ handler);"),
            "/* FIXME(unfacade): inline StringMapWrapper.forEach\nStringMapWrapper.forEach(m, /* cb * / handler)\n*/;"
        );
    }

    #[test]
    fn merge_and_equals_are_reported_without_fix() {
        let rule = StringMapRule::new();
        let failures = run(
            &rule,
            &format!("{IMPORT}StringMapWrapper.merge(a, b);\nStringMapWrapper.equals(a, b);\n"),
        )
        .unwrap();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|f| f.fix.is_none()));
    }

    #[test]
    fn missing_arguments_are_reported_without_fix() {
        let rule = StringMapRule::new();
        let failures = run(&rule, &format!("{IMPORT}StringMapWrapper.contains(m);\n")).unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].fix.is_none());
    }

    #[test]
    fn unknown_member_is_an_error() {
        let rule = StringMapRule::new();
        let err = run(&rule, &format!("{IMPORT}StringMapWrapper.clearValues(m);\n")).unwrap_err();
        assert_eq!(
            err,
            RuleError::UnsupportedMember {
                file: "main.ts".into(),
                member: "clearValues".into(),
                call_text: "StringMapWrapper.clearValues(m)".into(),
            }
        );
    }

    #[test]
    fn every_known_member_is_handled() {
        let rule = StringMapRule::new();
        for member in MapMember::ALL {
            let args = ["m", "(v, k) => use(v)"][..member.arity().min(2)].join(", ");
            let main = format!("{IMPORT}StringMapWrapper.{}({args});\n", member.name());
            let failures = run(&rule, &main).unwrap();
            assert_eq!(failures.len(), 1, "{}", member.name());
        }
    }

    #[test]
    fn namespace_and_renamed_imports_match() {
        let rule = StringMapRule::new();
        let main = "import * as collection from './facade/src/collection';\n\
                    import { StringMapWrapper as SMW } from './facade/src/collection';\n\
                    collection.StringMapWrapper.keys(a);\nSMW.keys(b);\n";
        let failures = run(&rule, main).unwrap();
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn unrelated_wrappers_are_ignored() {
        let rule = StringMapRule::new();
        let main = "class StringMapWrapper { static keys(m: any) { return []; } }\nStringMapWrapper.keys(m);\n";
        assert!(run(&rule, main).unwrap().is_empty());
    }
}
