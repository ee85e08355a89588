use std::path::{Path, PathBuf};

use tree_sitter::Node;

use crate::scope_graph::{
    FileScopeGraph, ScopeEdge, ScopeEdgeId, ScopeNode, ScopeNodeId, ScopeNodeKind,
};
use crate::{SymbolKind, TextRange};

/// Extract the source text for a tree-sitter node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Find the first child with a specific kind.
pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|child| child.kind() == kind)
}

/// Find a child by field name.
pub fn child_by_field<'a>(node: Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

/// Convert a tree-sitter node to a `TextRange`.
pub fn node_range(node: Node<'_>) -> TextRange {
    node.range().into()
}

/// Text of a string literal without its quotes.
pub fn string_literal_value<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    node_text(node, source).trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

// ── Scope Graph Builder ──────────────────────────────────────────────

/// Builder for constructing `FileScopeGraph` instances from tree-sitter ASTs.
///
/// Manages node/edge ID allocation and provides helpers for common scope graph
/// patterns (definitions, references, imports, aliases, exports).
pub struct ScopeGraphBuilder {
    file_path: PathBuf,
    nodes: Vec<ScopeNode>,
    edges: Vec<ScopeEdge>,
    export_node_ids: Vec<ScopeNodeId>,
    import_node_ids: Vec<ScopeNodeId>,
    reference_sites: Vec<ScopeNodeId>,
    root_scope: ScopeNodeId,
    next_node_id: u32,
    next_edge_id: u32,
}

impl ScopeGraphBuilder {
    /// Create a new builder with a root scope for the given file.
    pub fn new(file_path: &Path) -> Self {
        let root_id = ScopeNodeId(0);
        let root = ScopeNode {
            id: root_id,
            kind: ScopeNodeKind::Root,
            file_path: file_path.to_path_buf(),
            span: None,
            symbol_kind: None,
        };
        Self {
            file_path: file_path.to_path_buf(),
            nodes: vec![root],
            edges: vec![],
            export_node_ids: vec![],
            import_node_ids: vec![],
            reference_sites: vec![],
            root_scope: root_id,
            next_node_id: 1,
            next_edge_id: 0,
        }
    }

    pub fn root(&self) -> ScopeNodeId {
        self.root_scope
    }

    /// Add a child scope linked to its parent (for lexical lookup chains).
    pub fn add_scope(&mut self, parent: ScopeNodeId, span: Option<TextRange>) -> ScopeNodeId {
        let id = self.alloc_id();
        self.push_node(id, ScopeNodeKind::Scope, span, None);
        self.add_edge(id, parent, 1); // child → parent for name lookup
        id
    }

    /// Add a definition (`PopSymbol`) reachable from the given scope.
    pub fn add_definition(
        &mut self,
        scope: ScopeNodeId,
        symbol: &str,
        span: Option<TextRange>,
        kind: Option<SymbolKind>,
    ) -> ScopeNodeId {
        let id = self.alloc_id();
        self.push_node(id, ScopeNodeKind::PopSymbol { symbol: symbol.to_string() }, span, kind);
        self.add_edge(scope, id, 0); // scope → definition
        id
    }

    /// Add a reference (`PushSymbol`) for an identifier in expression position.
    pub fn add_reference(
        &mut self,
        scope: ScopeNodeId,
        symbol: &str,
        span: Option<TextRange>,
        kind: Option<SymbolKind>,
    ) -> ScopeNodeId {
        let id = self.alloc_id();
        self.push_node(id, ScopeNodeKind::PushSymbol { symbol: symbol.to_string() }, span, kind);
        self.add_edge(id, scope, 0); // reference → scope (lookup direction)
        self.reference_sites.push(id);
        id
    }

    /// Add an import scope boundary for one module specifier.
    pub fn add_import_scope(&mut self, module: &str) -> ScopeNodeId {
        let id = self.alloc_id();
        self.push_node(
            id,
            ScopeNodeKind::ImportScope { module: module.to_string() },
            None,
            None,
        );
        self.import_node_ids.push(id);
        id
    }

    /// Add a `PushSymbol` that looks `symbol` up starting at `target`, without
    /// registering it as an expression reference. Used for the far side of
    /// imports and re-exports.
    pub fn add_forward(
        &mut self,
        target: ScopeNodeId,
        symbol: &str,
        span: Option<TextRange>,
    ) -> ScopeNodeId {
        let id = self.alloc_id();
        self.push_node(
            id,
            ScopeNodeKind::PushSymbol { symbol: symbol.to_string() },
            span,
            None,
        );
        self.add_edge(id, target, 0);
        id
    }

    /// Turn `definition` into an alias of whatever `target` resolves to.
    pub fn add_alias(&mut self, definition: ScopeNodeId, target: ScopeNodeId) {
        self.add_edge(definition, target, 0);
    }

    /// Mark a `PopSymbol` node as exported (available for cross-file resolution).
    pub fn mark_exported(&mut self, node_id: ScopeNodeId) {
        self.export_node_ids.push(node_id);
    }

    /// Add a raw edge between two nodes.
    pub fn add_edge(&mut self, source: ScopeNodeId, target: ScopeNodeId, precedence: u8) {
        let id = ScopeEdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        self.edges.push(ScopeEdge {
            id,
            source,
            target,
            precedence,
        });
    }

    /// Consume the builder and produce a `FileScopeGraph`.
    pub fn build(self) -> FileScopeGraph {
        FileScopeGraph {
            file_path: self.file_path,
            nodes: self.nodes,
            edges: self.edges,
            root_scope: self.root_scope,
            export_nodes: self.export_node_ids,
            import_nodes: self.import_node_ids,
            reference_sites: self.reference_sites,
        }
    }

    fn alloc_id(&mut self) -> ScopeNodeId {
        let id = ScopeNodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    fn push_node(
        &mut self,
        id: ScopeNodeId,
        kind: ScopeNodeKind,
        span: Option<TextRange>,
        symbol_kind: Option<SymbolKind>,
    ) {
        self.nodes.push(ScopeNode {
            id,
            kind,
            file_path: self.file_path.clone(),
            span,
            symbol_kind,
        });
    }
}
