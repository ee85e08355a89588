// ES module scope graph construction for TypeScript sources.
//
// Handles the ECMAScript patterns symbol resolution depends on:
// - function_declaration, class_declaration, method bodies, ambient signatures
// - arrow functions and function expressions with their parameter lists
// - let/const/var declarations at every level, plus block scopes
// - import_statement (named, renamed, namespace, default imports)
// - export_statement (declarations, export clauses, re-exports, default exports)
// - identifiers in expression position, which become references
// - TypeScript-specific: interface_declaration, type_alias_declaration, enum_declaration

use crate::SymbolKind;
use crate::scope_graph::ScopeNodeId;

use super::helpers::{
    ScopeGraphBuilder, child_by_field, find_child_by_kind, node_range, node_text,
    string_literal_value,
};

/// Walk children of a node, dispatching to the appropriate scope handler.
pub fn walk_scope(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        dispatch_node(child, source, scope, builder, module_defs, is_module_level);
    }
}

fn dispatch_node(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            scope_function_decl(node, source, scope, builder, module_defs, is_module_level);
        }
        "class_declaration" | "abstract_class_declaration" => {
            scope_class_decl(node, source, scope, builder, module_defs, is_module_level);
        }
        "method_definition" | "arrow_function" | "function_expression" | "function"
        | "generator_function" => {
            scope_callable(node, source, scope, builder);
        }
        "interface_declaration" | "type_alias_declaration" | "enum_declaration" => {
            scope_type_decl(node, source, scope, builder, module_defs, is_module_level);
        }
        "import_statement" => {
            scope_import(node, source, scope, builder, module_defs, is_module_level);
        }
        "export_statement" => {
            scope_export(node, source, scope, builder, module_defs, is_module_level);
        }
        "lexical_declaration" | "variable_declaration" => {
            scope_var_decl(node, source, scope, builder, module_defs, is_module_level);
        }
        "statement_block" => {
            let block = builder.add_scope(scope, Some(node_range(node)));
            walk_scope(node, source, block, builder, module_defs, false);
        }
        "identifier" | "shorthand_property_identifier" => {
            builder.add_reference(scope, node_text(node, source), Some(node_range(node)), None);
        }
        _ => {
            walk_scope(node, source, scope, builder, module_defs, is_module_level);
        }
    }
}

fn scope_function_decl(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    if let Some(name_node) = child_by_field(node, "name") {
        let name = node_text(name_node, source);
        let def_id = builder.add_definition(
            scope,
            name,
            Some(node_range(name_node)),
            Some(SymbolKind::Function),
        );
        if is_module_level {
            module_defs.push(def_id);
        }
    }
    scope_callable(node, source, scope, builder);
}

/// Parameters and body of anything callable get their own scope.
fn scope_callable(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
) {
    let func_scope = builder.add_scope(scope, Some(node_range(node)));
    if let Some(params) = child_by_field(node, "parameters") {
        scope_params(params, source, func_scope, builder);
    }
    // Arrow functions with a single bare parameter: `x => ...`
    if let Some(param) = child_by_field(node, "parameter") {
        if param.kind() == "identifier" {
            builder.add_definition(
                func_scope,
                node_text(param, source),
                Some(node_range(param)),
                Some(SymbolKind::Variable),
            );
        }
    }
    if let Some(body) = child_by_field(node, "body") {
        // Nested definitions never contribute to module_defs
        let mut ignored = Vec::new();
        if body.kind() == "statement_block" {
            walk_scope(body, source, func_scope, builder, &mut ignored, false);
        } else {
            dispatch_node(body, source, func_scope, builder, &mut ignored, false);
        }
    }
}

fn scope_class_decl(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    if let Some(name_node) = child_by_field(node, "name") {
        let name = node_text(name_node, source);
        let def_id = builder.add_definition(
            scope,
            name,
            Some(node_range(name_node)),
            Some(SymbolKind::Type),
        );
        if is_module_level {
            module_defs.push(def_id);
        }
    }

    // Heritage clauses reference values from the enclosing scope.
    if let Some(heritage) = find_child_by_kind(node, "class_heritage") {
        let mut ignored = Vec::new();
        walk_scope(heritage, source, scope, builder, &mut ignored, false);
    }

    let class_scope = builder.add_scope(scope, Some(node_range(node)));
    if let Some(body) = child_by_field(node, "body") {
        let mut ignored = Vec::new();
        walk_scope(body, source, class_scope, builder, &mut ignored, false);
    }
}

fn scope_type_decl(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    let Some(name_node) = child_by_field(node, "name") else {
        return;
    };
    let name = node_text(name_node, source);
    let def_id =
        builder.add_definition(scope, name, Some(node_range(name_node)), Some(SymbolKind::Type));
    if is_module_level {
        module_defs.push(def_id);
    }
}

fn scope_import(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    let module = child_by_field(node, "source").map_or("", |s| string_literal_value(s, source));
    let import_scope = builder.add_import_scope(module);

    let Some(clause) = find_child_by_kind(node, "import_clause") else {
        return; // Side-effect import: import './module'
    };

    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                // Default import: import foo from '...'
                let local_name = node_text(child, source);
                let forward = builder.add_forward(import_scope, "default", Some(node_range(child)));
                let def_id = builder.add_definition(scope, local_name, Some(node_range(child)), None);
                builder.add_alias(def_id, forward);
                if is_module_level {
                    module_defs.push(def_id);
                }
            }
            "named_imports" => {
                scope_named_imports(
                    child, source, scope, import_scope, builder, module_defs, is_module_level,
                );
            }
            "namespace_import" => {
                let Some(ns_node) = find_child_by_kind(child, "identifier") else {
                    continue;
                };
                let def_id = builder.add_definition(
                    scope,
                    node_text(ns_node, source),
                    Some(node_range(ns_node)),
                    Some(SymbolKind::Module),
                );
                builder.add_alias(def_id, import_scope);
                if is_module_level {
                    module_defs.push(def_id);
                }
            }
            _ => {}
        }
    }
}

fn scope_named_imports(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    import_scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "import_specifier" {
            continue;
        }
        let Some(name_node) = child_by_field(child, "name") else {
            continue;
        };
        let local_node = child_by_field(child, "alias").unwrap_or(name_node);
        let forward = builder.add_forward(
            import_scope,
            node_text(name_node, source),
            Some(node_range(name_node)),
        );
        let def_id = builder.add_definition(
            scope,
            node_text(local_node, source),
            Some(node_range(local_node)),
            None,
        );
        builder.add_alias(def_id, forward);
        if is_module_level {
            module_defs.push(def_id);
        }
    }
}

fn scope_export(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    let before_len = module_defs.len();
    let is_default = find_child_by_kind(node, "default").is_some();

    // Case 1: export <declaration> / export default <declaration>
    if let Some(decl) = child_by_field(node, "declaration") {
        if is_default {
            let mut local = Vec::new();
            dispatch_node(decl, source, scope, builder, &mut local, is_module_level);
            scope_export_default(decl, source, scope, builder, module_defs);
        } else {
            dispatch_node(decl, source, scope, builder, module_defs, is_module_level);
        }
    }

    // Case 2: export default <value>
    if let Some(value) = child_by_field(node, "value") {
        let mut ignored = Vec::new();
        dispatch_node(value, source, scope, builder, &mut ignored, false);
        scope_export_default(value, source, scope, builder, module_defs);
    }

    // Case 3: export { foo, bar } [from '...']
    if let Some(clause) = find_child_by_kind(node, "export_clause") {
        let module = child_by_field(node, "source").map(|s| string_literal_value(s, source));
        scope_export_clause(clause, source, scope, module, builder, module_defs);
    }

    // Mark all new defs from this export as exported
    for def_id in &module_defs[before_len..] {
        builder.mark_exported(*def_id);
    }
}

/// Add the `default` export. Named declarations and bare identifiers become
/// aliases of the local binding; any other value is its own declaration.
fn scope_export_default(
    target: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
) {
    // Detached scope: `default` is not a name local code can reference.
    let export_scope = builder.add_scope(scope, None);
    let local = match target.kind() {
        "identifier" => Some(target),
        _ => child_by_field(target, "name"),
    };
    let def_id = match local {
        Some(name_node) => {
            let forward =
                builder.add_forward(scope, node_text(name_node, source), Some(node_range(name_node)));
            let def_id =
                builder.add_definition(export_scope, "default", Some(node_range(name_node)), None);
            builder.add_alias(def_id, forward);
            def_id
        }
        None => builder.add_definition(export_scope, "default", Some(node_range(target)), None),
    };
    module_defs.push(def_id);
}

fn scope_export_clause(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    module: Option<&str>,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
) {
    let export_scope = builder.add_scope(scope, None);
    // Re-exports look names up in the source module, plain clauses locally.
    let lookup = match module {
        Some(m) => builder.add_import_scope(m),
        None => scope,
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "export_specifier" {
            continue;
        }
        let Some(name_node) = child_by_field(child, "name") else {
            continue;
        };
        let exported_node = child_by_field(child, "alias").unwrap_or(name_node);
        let forward =
            builder.add_forward(lookup, node_text(name_node, source), Some(node_range(name_node)));
        let def_id = builder.add_definition(
            export_scope,
            node_text(exported_node, source),
            Some(node_range(exported_node)),
            None,
        );
        builder.add_alias(def_id, forward);
        module_defs.push(def_id);
    }
}

fn scope_var_decl(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    let is_const = find_child_by_kind(node, "const").is_some();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "variable_declarator" {
            scope_single_var(child, source, scope, is_const, builder, module_defs, is_module_level);
        }
    }
}

fn scope_single_var(
    node: tree_sitter::Node<'_>,
    source: &str,
    scope: ScopeNodeId,
    is_const: bool,
    builder: &mut ScopeGraphBuilder,
    module_defs: &mut Vec<ScopeNodeId>,
    is_module_level: bool,
) {
    let value = child_by_field(node, "value");
    if let Some(name_node) = child_by_field(node, "name") {
        let is_arrow = value.is_some_and(|v| v.kind() == "arrow_function");
        let kind = if is_arrow {
            SymbolKind::Function
        } else if is_const {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        for binding in pattern_bindings(name_node) {
            let def_id = builder.add_definition(
                scope,
                node_text(binding, source),
                Some(node_range(binding)),
                Some(kind),
            );
            if is_module_level {
                module_defs.push(def_id);
            }
        }
    }

    if let Some(value) = value {
        let mut ignored = Vec::new();
        dispatch_node(value, source, scope, builder, &mut ignored, false);
    }
}

fn scope_params(
    params_node: tree_sitter::Node<'_>,
    source: &str,
    func_scope: ScopeNodeId,
    builder: &mut ScopeGraphBuilder,
) {
    let mut cursor = params_node.walk();
    for child in params_node.children(&mut cursor) {
        let pattern = match child.kind() {
            "identifier" => Some(child),
            "required_parameter" | "optional_parameter" => child_by_field(child, "pattern"),
            "rest_pattern" | "rest_parameter" => Some(child),
            // assignment_pattern: param with default value (e.g., x = 5)
            "assignment_pattern" => child_by_field(child, "left"),
            _ => None,
        };
        if let Some(pattern) = pattern {
            for binding in pattern_bindings(pattern) {
                builder.add_definition(
                    func_scope,
                    node_text(binding, source),
                    Some(node_range(binding)),
                    Some(SymbolKind::Variable),
                );
            }
        }
        let default = child_by_field(child, "value").or_else(|| child_by_field(child, "right"));
        if let Some(default) = default {
            let mut ignored = Vec::new();
            dispatch_node(default, source, func_scope, builder, &mut ignored, false);
        }
    }
}

/// Identifiers bound by a declaration pattern: a plain name, or every name
/// inside an object/array destructuring pattern.
fn pattern_bindings(pattern: tree_sitter::Node<'_>) -> Vec<tree_sitter::Node<'_>> {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => vec![pattern],
        "object_pattern" | "array_pattern" | "rest_pattern" | "pair_pattern"
        | "object_assignment_pattern" | "assignment_pattern" => {
            let mut out = Vec::new();
            let mut cursor = pattern.walk();
            for child in pattern.named_children(&mut cursor) {
                // Keys of `{ key: binding }` and default values bind nothing.
                let is_key = pattern.kind() == "pair_pattern"
                    && child_by_field(pattern, "key").is_some_and(|k| k.id() == child.id());
                let is_default =
                    matches!(pattern.kind(), "object_assignment_pattern" | "assignment_pattern")
                        && child_by_field(pattern, "right").is_some_and(|r| r.id() == child.id());
                if !is_key && !is_default {
                    out.extend(pattern_bindings(child));
                }
            }
            out
        }
        _ => vec![],
    }
}
