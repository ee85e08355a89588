use std::path::Path;

use crate::scope_graph::FileScopeGraph;

use super::LanguageSupport;
use super::ecma_scope::walk_scope;
use super::helpers::ScopeGraphBuilder;

#[derive(Debug)]
pub struct TypeScriptSupport;

impl LanguageSupport for TypeScriptSupport {
    fn id(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "mts", "cts"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn build_scope_graph(
        &self,
        tree: &tree_sitter::Tree,
        source: &str,
        path: &Path,
    ) -> FileScopeGraph {
        build_module_graph(tree, source, path)
    }
}

/// TypeScript with JSX.
#[derive(Debug)]
pub struct TsxSupport;

impl LanguageSupport for TsxSupport {
    fn id(&self) -> &'static str {
        "tsx"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tsx"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }

    fn build_scope_graph(
        &self,
        tree: &tree_sitter::Tree,
        source: &str,
        path: &Path,
    ) -> FileScopeGraph {
        build_module_graph(tree, source, path)
    }
}

/// Only definitions named in an `export` statement are exported.
fn build_module_graph(tree: &tree_sitter::Tree, source: &str, path: &Path) -> FileScopeGraph {
    let mut builder = ScopeGraphBuilder::new(path);
    let root = builder.root();
    let mut module_defs = Vec::new();

    walk_scope(
        tree.root_node(),
        source,
        root,
        &mut builder,
        &mut module_defs,
        true,
    );

    builder.build()
}
