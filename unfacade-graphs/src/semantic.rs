// Semantic model: symbol resolution and coarse static types over a project.
//
// `SemanticModel` is the read-only interface rewrite rules consume.
// `ProjectModel` implements it on top of the merged scope graph of every
// file in a `Project`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tree_sitter::Node;

use crate::project::{Project, SourceFile};
use crate::scope_graph::{FileScopeGraph, ScopeGraph, ScopeNodeId, ScopeNodeKind};
use crate::syntax::{first_named_child, named_children, node_text};
use crate::{SymbolKind, TextRange};

/// Maximum number of declarations followed when inferring a type through
/// initializers (`const a = b; const b = c; ...`).
const MAX_TYPE_DEPTH: usize = 16;

// ── Symbols ────────────────────────────────────────────────────────

/// Where a symbol is declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclarationSite {
    pub file: PathBuf,
    /// Range of the declared name.
    pub span: TextRange,
}

impl DeclarationSite {
    /// Declaration path with `/` separators, for fragment matching.
    pub fn path_string(&self) -> String {
        self.file
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// A resolved binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub declaration: DeclarationSite,
    pub kind: Option<SymbolKind>,
    /// An import or re-export binding standing in for another declaration.
    pub is_alias: bool,
    node: ScopeNodeId,
}

// ── Types ──────────────────────────────────────────────────────────

/// Coarse static type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDescriptor {
    /// Records, class instances, arrays, functions.
    Object,
    String,
    Number,
    Boolean,
    /// `null`, `undefined`, `void`.
    Nullish,
    /// `any`, `unknown`, or nothing could be inferred.
    Unknown,
}

impl TypeDescriptor {
    pub fn is_object_like(self) -> bool {
        self == Self::Object
    }
}

// ── Interface ──────────────────────────────────────────────────────

/// Read-only symbol and type queries, keyed by the file a node belongs to.
pub trait SemanticModel: Send + Sync {
    /// The symbol bound to an identifier or member-access expression.
    /// `None` means unresolved, never an error.
    fn resolve_symbol(&self, file: &Path, node: Node<'_>) -> Option<Symbol>;

    /// Follow import aliases to the underlying declaration. Identity on
    /// non-alias symbols.
    fn resolve_alias(&self, symbol: Symbol) -> Symbol;

    /// Coarse static type of an expression.
    fn static_type_of(&self, file: &Path, node: Node<'_>) -> TypeDescriptor;
}

// ── Scope-graph backed model ───────────────────────────────────────

/// Semantic model over every file in a project.
#[derive(Debug)]
pub struct ProjectModel {
    project: Project,
    graph: ScopeGraph,
}

impl ProjectModel {
    /// Build scope graphs for every file (in parallel) and merge them.
    pub fn new(project: Project) -> Self {
        let file_graphs: Vec<FileScopeGraph> = project
            .files()
            .par_iter()
            .map(|f| f.language.build_scope_graph(&f.tree, &f.source, &f.path))
            .collect();

        let mut graph = ScopeGraph::new();
        for fg in &file_graphs {
            graph.add_file_graph(fg);
        }

        info!(
            files = project.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Semantic model built"
        );
        Self { project, graph }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn graph(&self) -> &ScopeGraph {
        &self.graph
    }

    fn symbol_for(&self, definition: ScopeNodeId) -> Option<Symbol> {
        let node = self.graph.get_node(definition)?;
        let ScopeNodeKind::PopSymbol { ref symbol } = node.kind else {
            return None;
        };
        Some(Symbol {
            name: symbol.clone(),
            declaration: DeclarationSite {
                file: node.file_path.clone(),
                span: node.span?,
            },
            kind: node.symbol_kind,
            is_alias: self.graph.alias_target(definition).is_some(),
            node: definition,
        })
    }

    /// Namespace imports alias an import scope rather than a name.
    fn namespace_scope(&self, symbol: &Symbol) -> Option<ScopeNodeId> {
        let target = self.graph.alias_target(symbol.node)?;
        let node = self.graph.get_node(target)?;
        matches!(node.kind, ScopeNodeKind::ImportScope { .. }).then_some(target)
    }

    /// The syntax node naming a declaration.
    fn declaration_node(&self, symbol: &Symbol) -> Option<(&SourceFile, Node<'_>)> {
        let file = self.project.file(&symbol.declaration.file)?;
        let span = symbol.declaration.span;
        let node = file
            .tree
            .root_node()
            .named_descendant_for_byte_range(span.start_byte, span.end_byte)?;
        Some((file, node))
    }

    fn type_of(&self, file: &Path, node: Node<'_>, depth: usize) -> TypeDescriptor {
        if depth > MAX_TYPE_DEPTH {
            return TypeDescriptor::Unknown;
        }
        let Some(source_file) = self.project.file(file) else {
            return TypeDescriptor::Unknown;
        };
        let source = source_file.source.as_str();

        match node.kind() {
            "string" | "template_string" => TypeDescriptor::String,
            "number" => TypeDescriptor::Number,
            "true" | "false" => TypeDescriptor::Boolean,
            "null" | "undefined" => TypeDescriptor::Nullish,
            "object" | "array" | "new_expression" | "arrow_function" | "function_expression"
            | "function" | "class" | "regex" | "this" => TypeDescriptor::Object,
            "parenthesized_expression" | "non_null_expression" => first_named_child(node)
                .map_or(TypeDescriptor::Unknown, |inner| self.type_of(file, inner, depth)),
            "as_expression" | "satisfies_expression" => named_children(node)
                .last()
                .map_or(TypeDescriptor::Unknown, |t| classify_type(*t, source)),
            // `<T>x`: the type sits inside the leading type arguments.
            "type_assertion" => first_named_child(node)
                .and_then(first_named_child)
                .map_or(TypeDescriptor::Unknown, |t| classify_type(t, source)),
            "ternary_expression" => {
                let branch = |field: &str| {
                    node.child_by_field_name(field)
                        .map_or(TypeDescriptor::Unknown, |n| self.type_of(file, n, depth + 1))
                };
                same_or_unknown(branch("consequence"), branch("alternative"))
            }
            "assignment_expression" => node
                .child_by_field_name("right")
                .map_or(TypeDescriptor::Unknown, |n| self.type_of(file, n, depth + 1)),
            "sequence_expression" => named_children(node)
                .last()
                .map_or(TypeDescriptor::Unknown, |n| self.type_of(file, *n, depth + 1)),
            "unary_expression" => unary_type(node, source),
            "binary_expression" => self.binary_type(file, node, depth),
            "identifier" => self
                .resolve_symbol(file, node)
                .map(|s| self.resolve_alias(s))
                .map_or(TypeDescriptor::Unknown, |s| self.declared_type(&s, depth + 1)),
            "call_expression" => self.call_type(file, node, depth),
            _ => TypeDescriptor::Unknown,
        }
    }

    fn binary_type(&self, file: &Path, node: Node<'_>, depth: usize) -> TypeDescriptor {
        let Some(source_file) = self.project.file(file) else {
            return TypeDescriptor::Unknown;
        };
        let op = node
            .child_by_field_name("operator")
            .map_or("", |o| node_text(o, &source_file.source));
        let side = |field: &str| {
            node.child_by_field_name(field)
                .map_or(TypeDescriptor::Unknown, |n| self.type_of(file, n, depth + 1))
        };
        match op {
            "||" | "&&" | "??" => same_or_unknown(side("left"), side("right")),
            "==" | "!=" | "===" | "!==" | "<" | "<=" | ">" | ">=" | "instanceof" | "in" => {
                TypeDescriptor::Boolean
            }
            "-" | "*" | "/" | "%" | "**" | "<<" | ">>" | ">>>" | "&" | "|" | "^" => {
                TypeDescriptor::Number
            }
            "+" => {
                match (side("left"), side("right")) {
                    (TypeDescriptor::String, _) | (_, TypeDescriptor::String) => {
                        TypeDescriptor::String
                    }
                    (TypeDescriptor::Number, TypeDescriptor::Number) => TypeDescriptor::Number,
                    _ => TypeDescriptor::Unknown,
                }
            }
            _ => TypeDescriptor::Unknown,
        }
    }

    /// Calls have the declared return type of the function they resolve to.
    fn call_type(&self, file: &Path, node: Node<'_>, depth: usize) -> TypeDescriptor {
        let Some(symbol) = node
            .child_by_field_name("function")
            .and_then(|callee| self.resolve_symbol(file, callee))
            .map(|s| self.resolve_alias(s))
        else {
            return TypeDescriptor::Unknown;
        };
        let Some((decl_file, name_node)) = self.declaration_node(&symbol) else {
            return TypeDescriptor::Unknown;
        };
        let Some(function) = name_node.parent() else {
            return TypeDescriptor::Unknown;
        };
        if depth > MAX_TYPE_DEPTH {
            return TypeDescriptor::Unknown;
        }
        match function.kind() {
            "function_declaration" | "function_signature" | "generator_function_declaration" => {
                function
                    .child_by_field_name("return_type")
                    .map_or(TypeDescriptor::Unknown, |t| classify_type(t, &decl_file.source))
            }
            _ => TypeDescriptor::Unknown,
        }
    }

    /// Type of a declaration: its annotation if present, else its initializer.
    fn declared_type(&self, symbol: &Symbol, depth: usize) -> TypeDescriptor {
        let Some((decl_file, name_node)) = self.declaration_node(symbol) else {
            return TypeDescriptor::Unknown;
        };
        let Some(decl) = name_node.parent() else {
            return TypeDescriptor::Unknown;
        };
        match decl.kind() {
            "variable_declarator" | "required_parameter" | "optional_parameter" => {
                if let Some(annotation) = decl.child_by_field_name("type") {
                    return classify_type(annotation, &decl_file.source);
                }
                if decl.kind() != "variable_declarator" {
                    return TypeDescriptor::Unknown;
                }
                decl.child_by_field_name("value")
                    .map_or(TypeDescriptor::Unknown, |v| {
                        self.type_of(&decl_file.path, v, depth)
                    })
            }
            "function_declaration" | "generator_function_declaration" | "function_signature"
            | "class_declaration" | "abstract_class_declaration" | "enum_declaration" => {
                TypeDescriptor::Object
            }
            _ => TypeDescriptor::Unknown,
        }
    }
}

impl SemanticModel for ProjectModel {
    fn resolve_symbol(&self, file: &Path, node: Node<'_>) -> Option<Symbol> {
        match node.kind() {
            "identifier" => {
                let reference = self
                    .graph
                    .reference_at(file, node.start_byte(), node.end_byte())?;
                let resolved = self.graph.resolve_nearest(reference)?;
                self.symbol_for(resolved.definition_node)
            }
            "member_expression" => {
                // Only `ns.name` through a namespace import names a declaration.
                let object = node.child_by_field_name("object")?;
                let property = node.child_by_field_name("property")?;
                let source = &self.project.file(file)?.source;
                let namespace = self.resolve_alias(self.resolve_symbol(file, object)?);
                let import_scope = self.namespace_scope(&namespace)?;
                let export = self
                    .graph
                    .exports_in_module(import_scope, node_text(property, source))
                    .into_iter()
                    .next()?;
                self.symbol_for(export)
            }
            _ => None,
        }
    }

    fn resolve_alias(&self, symbol: Symbol) -> Symbol {
        let mut current = symbol;
        let mut seen = HashSet::from([current.node]);
        while let Some(target) = self.graph.alias_target(current.node) {
            let Some(target_node) = self.graph.get_node(target) else {
                break;
            };
            if !matches!(target_node.kind, ScopeNodeKind::PushSymbol { .. }) {
                break; // namespace import: the module itself is the target
            }
            let Some(next) = self
                .graph
                .resolve_nearest(target)
                .and_then(|r| self.symbol_for(r.definition_node))
            else {
                break; // imported from outside the project
            };
            if !seen.insert(next.node) {
                debug!(symbol = %next.name, "Alias cycle; stopping resolution");
                break;
            }
            current = next;
        }
        current
    }

    fn static_type_of(&self, file: &Path, node: Node<'_>) -> TypeDescriptor {
        self.type_of(file, node, 0)
    }
}

fn same_or_unknown(a: TypeDescriptor, b: TypeDescriptor) -> TypeDescriptor {
    if a == b { a } else { TypeDescriptor::Unknown }
}

fn unary_type(node: Node<'_>, source: &str) -> TypeDescriptor {
    let op = node
        .child_by_field_name("operator")
        .map_or("", |o| node_text(o, source));
    match op {
        "!" | "delete" => TypeDescriptor::Boolean,
        "typeof" => TypeDescriptor::String,
        "-" | "+" | "~" => TypeDescriptor::Number,
        "void" => TypeDescriptor::Nullish,
        _ => TypeDescriptor::Unknown,
    }
}

/// Classify a type annotation or type node.
fn classify_type(node: Node<'_>, source: &str) -> TypeDescriptor {
    match node.kind() {
        "type_annotation" | "parenthesized_type" => first_named_child(node)
            .map_or(TypeDescriptor::Unknown, |inner| classify_type(inner, source)),
        "predefined_type" => match node_text(node, source) {
            "string" => TypeDescriptor::String,
            "number" | "bigint" => TypeDescriptor::Number,
            "boolean" => TypeDescriptor::Boolean,
            "void" | "undefined" | "null" => TypeDescriptor::Nullish,
            "object" => TypeDescriptor::Object,
            _ => TypeDescriptor::Unknown,
        },
        "literal_type" => match first_named_child(node).map(|n| n.kind()) {
            Some("string") => TypeDescriptor::String,
            Some("number" | "unary_expression") => TypeDescriptor::Number,
            Some("true" | "false") => TypeDescriptor::Boolean,
            Some("null" | "undefined") => TypeDescriptor::Nullish,
            _ => TypeDescriptor::Unknown,
        },
        "type_identifier" | "generic_type" | "nested_type_identifier" | "object_type"
        | "array_type" | "tuple_type" | "function_type" | "constructor_type"
        | "readonly_type" => TypeDescriptor::Object,
        "union_type" | "intersection_type" => {
            let members = named_children(node);
            if !members.is_empty()
                && members
                    .iter()
                    .all(|m| classify_type(*m, source).is_object_like())
            {
                TypeDescriptor::Object
            } else {
                TypeDescriptor::Unknown
            }
        }
        _ => TypeDescriptor::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::LanguageRegistry;

    fn model(files: &[(&str, &str)]) -> ProjectModel {
        let registry = LanguageRegistry::new();
        let sources = files
            .iter()
            .map(|(p, s)| (PathBuf::from(p), (*s).to_string()))
            .collect();
        ProjectModel::new(Project::parse_all(&registry, sources).unwrap())
    }

    /// The first node of `kind` whose text is `text`.
    fn find<'t>(file: &'t SourceFile, kind: &str, text: &str) -> Node<'t> {
        let mut stack = vec![file.tree.root_node()];
        while let Some(node) = stack.pop() {
            if node.kind() == kind && file.text(node) == text {
                return node;
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        panic!("no {kind} `{text}` in {}", file.path.display());
    }

    const LANG: &str = "export function isBlank(obj: any): boolean { return obj == null; }\n";

    #[test]
    fn resolves_named_import_through_alias() {
        let m = model(&[
            ("facade/src/lang.ts", LANG),
            ("app/main.ts", "import { isBlank as blank } from '../facade/src/lang';\nblank(x);\n"),
        ]);
        let main = m.project().file(Path::new("app/main.ts")).unwrap();
        let call = find(main, "call_expression", "blank(x)");
        let callee = call.child_by_field_name("function").unwrap();

        let sym = m.resolve_symbol(&main.path, callee).unwrap();
        assert!(sym.is_alias);
        assert_eq!(sym.name, "blank");
        assert_eq!(sym.declaration.file, PathBuf::from("app/main.ts"));

        let target = m.resolve_alias(sym);
        assert!(!target.is_alias);
        assert_eq!(target.name, "isBlank");
        assert_eq!(target.declaration.path_string(), "facade/src/lang.ts");
        assert_eq!(target.kind, Some(SymbolKind::Function));

        // Idempotent on the resolved declaration
        assert_eq!(m.resolve_alias(target.clone()), target);
    }

    #[test]
    fn resolves_namespace_member() {
        let m = model(&[
            ("facade/src/lang.ts", LANG),
            ("main.ts", "import * as lang from './facade/src/lang';\nlang.isBlank(x);\n"),
        ]);
        let main = m.project().file(Path::new("main.ts")).unwrap();
        let member = find(main, "member_expression", "lang.isBlank");
        let sym = m.resolve_symbol(&main.path, member).unwrap();
        assert_eq!(sym.name, "isBlank");
        assert_eq!(sym.declaration.file, PathBuf::from("facade/src/lang.ts"));
    }

    #[test]
    fn follows_re_export_chain() {
        let m = model(&[
            ("facade/src/lang.ts", LANG),
            ("facade/index.ts", "export { isBlank } from './src/lang';\n"),
            ("main.ts", "import { isBlank } from './facade';\nisBlank(x);\n"),
        ]);
        let main = m.project().file(Path::new("main.ts")).unwrap();
        let call = find(main, "call_expression", "isBlank(x)");
        let callee = call.child_by_field_name("function").unwrap();
        let sym = m.resolve_alias(m.resolve_symbol(&main.path, callee).unwrap());
        assert_eq!(sym.declaration.file, PathBuf::from("facade/src/lang.ts"));
    }

    #[test]
    fn unresolved_import_stays_at_the_import() {
        let m = model(&[(
            "main.ts",
            "import { isBlank } from '@angular/facade/src/lang';\nisBlank(x);\n",
        )]);
        let main = m.project().file(Path::new("main.ts")).unwrap();
        let call = find(main, "call_expression", "isBlank(x)");
        let callee = call.child_by_field_name("function").unwrap();
        let sym = m.resolve_alias(m.resolve_symbol(&main.path, callee).unwrap());
        assert_eq!(sym.declaration.file, PathBuf::from("main.ts"));
    }

    #[test]
    fn dynamic_expressions_do_not_resolve() {
        let m = model(&[("main.ts", "getFn()(x);\nobj.method(x);\n")]);
        let main = m.project().file(Path::new("main.ts")).unwrap();
        let call = find(main, "call_expression", "getFn()(x)");
        let callee = call.child_by_field_name("function").unwrap();
        assert!(m.resolve_symbol(&main.path, callee).is_none());
        let member = find(main, "member_expression", "obj.method");
        assert!(m.resolve_symbol(&main.path, member).is_none());
    }

    #[test]
    fn static_types_of_arguments() {
        let source = "\
class Foo {}
function make(): Foo { return new Foo(); }
function f(a: Foo, s: string, n?: number, u: any, m: Map<string, number>, o: Foo | null) {
  const lit = {};
  const copy = lit;
  const made = make();
  use(a, s, n, u, m, o, lit, copy, made, 'x', 1 + 1, null, [1]);
}
";
        let m = model(&[("t.ts", source)]);
        let file = m.project().file(Path::new("t.ts")).unwrap();
        let call = find(file, "call_expression", "use(a, s, n, u, m, o, lit, copy, made, 'x', 1 + 1, null, [1])");
        let args = named_children(call.child_by_field_name("arguments").unwrap());
        let types: Vec<_> = args.iter().map(|a| m.static_type_of(&file.path, *a)).collect();
        assert_eq!(
            types,
            vec![
                TypeDescriptor::Object,
                TypeDescriptor::String,
                TypeDescriptor::Number,
                TypeDescriptor::Unknown,
                TypeDescriptor::Object,
                TypeDescriptor::Unknown,
                TypeDescriptor::Object,
                TypeDescriptor::Object,
                TypeDescriptor::Object,
                TypeDescriptor::String,
                TypeDescriptor::Number,
                TypeDescriptor::Nullish,
                TypeDescriptor::Object,
            ]
        );
    }
}
