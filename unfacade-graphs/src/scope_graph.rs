// Scope graph data structures and path-stitching resolution.
//
// A scope graph encodes a program's name binding structure:
// - Push symbol nodes represent references (uses of a name)
// - Pop symbol nodes represent definitions (declarations of a name)
// - Scope nodes define visibility boundaries (blocks, function bodies, modules)
// - Import scope nodes hand a pushed symbol over to the exports of another module
// - Edges connect scopes, creating paths from references to definitions
//
// Name resolution = finding a valid path from a push node to a pop node
// where the pushed/popped symbols match. A definition that carries an outgoing
// edge is an alias: following that edge continues resolution towards the
// declaration it stands for.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{SymbolKind, TextRange};

// ── Node IDs ──────────────────────────────────────────────────────────

/// Opaque ID for a scope graph node. Unique within a single `ScopeGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeNodeId(pub u32);

/// Opaque ID for a scope graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeEdgeId(pub u32);

// ── Node kinds ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeNodeKind {
    /// Root scope of a file.
    Root,
    /// An interior scope (block, function body, class body).
    Scope,
    /// A reference: pushes a symbol onto the matching stack.
    PushSymbol { symbol: String },
    /// A definition: pops a symbol from the matching stack.
    PopSymbol { symbol: String },
    /// Import boundary for one `import ... from "<module>"` clause.
    ImportScope { module: String },
}

// ── Nodes and edges ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeNode {
    pub id: ScopeNodeId,
    pub kind: ScopeNodeKind,
    /// The file this node belongs to.
    pub file_path: PathBuf,
    /// Optional source span (definitions and references have spans).
    pub span: Option<TextRange>,
    /// Symbol kind (for definitions/references with known kinds).
    pub symbol_kind: Option<SymbolKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeEdge {
    pub id: ScopeEdgeId,
    pub source: ScopeNodeId,
    pub target: ScopeNodeId,
    /// Edge precedence (lower = preferred during resolution).
    pub precedence: u8,
}

// ── File subgraph ─────────────────────────────────────────────────────

/// A file's contribution to the scope graph. Each file produces an isolated
/// subgraph that connects to others through export/import nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileScopeGraph {
    pub file_path: PathBuf,
    pub nodes: Vec<ScopeNode>,
    pub edges: Vec<ScopeEdge>,
    /// Which node is this file's root scope.
    pub root_scope: ScopeNodeId,
    /// Definitions visible to importing modules.
    pub export_nodes: Vec<ScopeNodeId>,
    /// Import scopes that consume definitions from other modules.
    pub import_nodes: Vec<ScopeNodeId>,
    /// Push nodes created for identifiers in expression position.
    pub reference_sites: Vec<ScopeNodeId>,
}

// ── Resolved reference ────────────────────────────────────────────────

/// A reference that has been resolved to a definition through path-stitching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedReference {
    /// The push-symbol node (reference site).
    pub reference_node: ScopeNodeId,
    /// The pop-symbol node (definition site).
    pub definition_node: ScopeNodeId,
    /// The symbol name that was resolved.
    pub symbol: String,
    /// Symbol kind at the definition site.
    pub kind: Option<SymbolKind>,
    /// File containing the reference.
    pub reference_file: PathBuf,
    /// File containing the definition.
    pub definition_file: PathBuf,
}

// ── Partial path (for path-stitching) ─────────────────────────────────

/// A partial path during resolution. Tracks the symbol stack and visited nodes.
#[derive(Debug, Clone)]
struct PartialPath {
    /// Stack of symbols pushed but not yet popped.
    symbol_stack: Vec<String>,
    /// Current node in the traversal.
    current_node: ScopeNodeId,
    /// Nodes visited so far (cycle detection).
    visited: HashSet<ScopeNodeId>,
}

// ── Scope Graph ───────────────────────────────────────────────────────

/// The combined scope graph for every file of one analysis run.
#[derive(Debug, Default)]
pub struct ScopeGraph {
    nodes: HashMap<ScopeNodeId, ScopeNode>,
    /// Adjacency list: node → outgoing edges.
    edges_from: HashMap<ScopeNodeId, Vec<ScopeEdge>>,
    /// Exported definitions keyed by symbol name.
    exports: HashMap<String, Vec<ScopeNodeId>>,
    /// Expression references keyed by (file, start byte, end byte).
    reference_index: HashMap<(PathBuf, usize, usize), ScopeNodeId>,
    /// Next node ID to allocate.
    next_id: u32,
}

impl ScopeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges_from.values().map(Vec::len).sum()
    }

    /// Add a file's subgraph to the combined graph.
    ///
    /// Node IDs in the file subgraph are remapped to globally unique IDs.
    /// Returns the mapping from old IDs to new IDs.
    pub fn add_file_graph(
        &mut self,
        file_graph: &FileScopeGraph,
    ) -> HashMap<ScopeNodeId, ScopeNodeId> {
        let mut id_map: HashMap<ScopeNodeId, ScopeNodeId> = HashMap::new();

        for node in &file_graph.nodes {
            let new_id = ScopeNodeId(self.next_id);
            self.next_id += 1;

            id_map.insert(node.id, new_id);

            let remapped = ScopeNode {
                id: new_id,
                kind: node.kind.clone(),
                file_path: file_graph.file_path.clone(),
                span: node.span,
                symbol_kind: node.symbol_kind,
            };

            if let ScopeNodeKind::PopSymbol { ref symbol } = node.kind {
                if file_graph.export_nodes.contains(&node.id) {
                    self.exports.entry(symbol.clone()).or_default().push(new_id);
                }
            }

            self.nodes.insert(new_id, remapped);
        }

        for edge in &file_graph.edges {
            if let (Some(&new_src), Some(&new_tgt)) =
                (id_map.get(&edge.source), id_map.get(&edge.target))
            {
                let new_edge = ScopeEdge {
                    id: ScopeEdgeId(self.next_id),
                    source: new_src,
                    target: new_tgt,
                    precedence: edge.precedence,
                };
                self.next_id += 1;
                self.edges_from.entry(new_src).or_default().push(new_edge);
            }
        }

        for site in &file_graph.reference_sites {
            let Some(&new_id) = id_map.get(site) else {
                continue;
            };
            if let Some(span) = self.nodes.get(&new_id).and_then(|n| n.span) {
                self.reference_index.insert(
                    (file_graph.file_path.clone(), span.start_byte, span.end_byte),
                    new_id,
                );
            }
        }

        id_map
    }

    /// Get a node by its ID.
    pub fn get_node(&self, id: ScopeNodeId) -> Option<&ScopeNode> {
        self.nodes.get(&id)
    }

    /// Get all outgoing edges from a node.
    pub fn edges_from(&self, id: ScopeNodeId) -> &[ScopeEdge] {
        self.edges_from.get(&id).map_or(&[], Vec::as_slice)
    }

    /// The push node created for the identifier spanning `start..end` in `file`.
    pub fn reference_at(&self, file: &Path, start: usize, end: usize) -> Option<ScopeNodeId> {
        self.reference_index
            .get(&(file.to_path_buf(), start, end))
            .copied()
    }

    /// The node an alias definition forwards to: a push node for named and
    /// default imports or re-exports, an import scope for namespace imports.
    /// `None` for ordinary definitions.
    pub fn alias_target(&self, definition: ScopeNodeId) -> Option<ScopeNodeId> {
        let node = self.nodes.get(&definition)?;
        if !matches!(node.kind, ScopeNodeKind::PopSymbol { .. }) {
            return None;
        }
        self.edges_from(definition).first().map(|e| e.target)
    }

    /// Exported definitions named `symbol` in the module an import scope points at.
    pub fn exports_in_module(&self, import_scope: ScopeNodeId, symbol: &str) -> Vec<ScopeNodeId> {
        let Some(scope) = self.nodes.get(&import_scope) else {
            return vec![];
        };
        let ScopeNodeKind::ImportScope { ref module } = scope.kind else {
            return vec![];
        };
        self.exports_matching(&scope.file_path, module, symbol)
    }

    /// Resolve a push node to the definition reached by the shortest path,
    /// via BFS path-stitching.
    ///
    /// Shorter paths correspond to inner scopes, so shadowed outer
    /// definitions lose to the nearest one.
    pub fn resolve_nearest(&self, reference: ScopeNodeId) -> Option<ResolvedReference> {
        let push_node = self.nodes.get(&reference)?;
        let ScopeNodeKind::PushSymbol { symbol } = &push_node.kind else {
            return None;
        };

        let mut queue = VecDeque::new();
        queue.push_back(PartialPath {
            symbol_stack: vec![symbol.clone()],
            current_node: push_node.id,
            visited: HashSet::from([push_node.id]),
        });

        let max_depth = 100;
        let mut iterations = 0;

        while let Some(path) = queue.pop_front() {
            iterations += 1;
            if iterations > max_depth * self.node_count().max(1) {
                break; // Safety limit
            }

            let Some(current) = self.nodes.get(&path.current_node) else {
                continue;
            };

            // Empty stack at a pop-symbol node: a resolution.
            if path.symbol_stack.is_empty() {
                if let ScopeNodeKind::PopSymbol { .. } = &current.kind {
                    return Some(ResolvedReference {
                        reference_node: push_node.id,
                        definition_node: current.id,
                        symbol: symbol.clone(),
                        kind: current.symbol_kind,
                        reference_file: push_node.file_path.clone(),
                        definition_file: current.file_path.clone(),
                    });
                }
            }

            for edge in self.edges_from(path.current_node) {
                if path.visited.contains(&edge.target) {
                    continue;
                }

                let Some(target) = self.nodes.get(&edge.target) else {
                    continue;
                };

                let new_stack = match &target.kind {
                    ScopeNodeKind::PushSymbol { symbol: s } => {
                        let mut stack = path.symbol_stack.clone();
                        stack.push(s.clone());
                        stack
                    }
                    ScopeNodeKind::PopSymbol { symbol: s } => {
                        if path.symbol_stack.last().is_some_and(|top| top == s) {
                            let mut stack = path.symbol_stack.clone();
                            stack.pop();
                            stack
                        } else {
                            continue; // symbol mismatch, dead path
                        }
                    }
                    ScopeNodeKind::Scope | ScopeNodeKind::Root | ScopeNodeKind::ImportScope { .. } => {
                        path.symbol_stack.clone()
                    }
                };

                let mut visited = path.visited.clone();
                visited.insert(edge.target);

                queue.push_back(PartialPath {
                    symbol_stack: new_stack,
                    current_node: edge.target,
                    visited,
                });
            }

            // Cross-file resolution: an import scope hands the top symbol to the
            // exports of the module its specifier names.
            if let ScopeNodeKind::ImportScope { ref module } = current.kind {
                if let Some(top_symbol) = path.symbol_stack.last() {
                    for export_id in self.exports_matching(&current.file_path, module, top_symbol) {
                        if path.visited.contains(&export_id) {
                            continue;
                        }
                        let mut new_stack = path.symbol_stack.clone();
                        new_stack.pop();

                        let mut visited = path.visited.clone();
                        visited.insert(export_id);

                        queue.push_back(PartialPath {
                            symbol_stack: new_stack,
                            current_node: export_id,
                            visited,
                        });
                    }
                }
            }
        }

        None
    }

    fn exports_matching(&self, importer: &Path, module: &str, symbol: &str) -> Vec<ScopeNodeId> {
        let Some(candidates) = self.exports.get(symbol) else {
            return vec![];
        };
        candidates
            .iter()
            .copied()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| module_matches(importer, module, &n.file_path))
            })
            .collect()
    }
}

// ── Module specifiers ─────────────────────────────────────────────────

const MODULE_EXTENSIONS: &[&str] = &[".d.ts", ".tsx", ".ts"];

/// Whether an import of `specifier` from `importer` can refer to `target`.
///
/// Relative specifiers are joined onto the importer's directory and compared
/// exactly; bare specifiers match any file whose extension-less path ends with
/// the specifier's components. `dir/index.ts` also answers to `dir`.
pub fn module_matches(importer: &Path, specifier: &str, target: &Path) -> bool {
    let stems = module_stems(target);
    if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." {
        let base = importer.parent().unwrap_or_else(|| Path::new(""));
        let wanted = normalize_path(&base.join(specifier));
        stems.iter().any(|stem| *stem == wanted)
    } else {
        let wanted = normalize_path(Path::new(specifier));
        stems.iter().any(|stem| stem.ends_with(&wanted))
    }
}

/// The extension-less module paths a file answers to.
fn module_stems(target: &Path) -> Vec<PathBuf> {
    let normalized = normalize_path(target);
    let Some(file_name) = normalized.file_name().and_then(|f| f.to_str()) else {
        return vec![];
    };
    let Some(stem) = MODULE_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
    else {
        return vec![];
    };

    let stem_path = normalized.with_file_name(stem);
    let mut stems = vec![stem_path.clone()];
    if stem == "index" {
        if let Some(dir) = stem_path.parent() {
            stems.push(dir.to_path_buf());
        }
    }
    stems
}

/// Lexically normalize a path: drop `.` components and fold `..` into its parent.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────
