// Call-site matching: find call expressions whose callee resolves to a facade
// declaration.
//
// Identity is by declaration site. A user function that happens to be named
// `isBlank` is never matched; only the one declared under the facade path is.

use std::path::Path;

use tracing::debug;
use tree_sitter::Node;
use unfacade_graphs::syntax::call_arguments;
use unfacade_graphs::{SemanticModel, Symbol};

/// Path fragment of the facade module declaring `isBlank` and `isPresent`.
pub const LANG_FRAGMENT: &str = "facade/src/lang";

/// Path fragment of the facade module declaring `StringMapWrapper`.
pub const COLLECTION_FRAGMENT: &str = "facade/src/collection";

/// A deprecated helper, identified by name and declaring module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacadeTarget {
    pub name: &'static str,
    pub path_fragment: &'static str,
}

impl FacadeTarget {
    pub const fn new(name: &'static str, path_fragment: &'static str) -> Self {
        Self {
            name,
            path_fragment,
        }
    }

    /// Whether an alias-resolved symbol is this helper.
    pub fn matches(&self, symbol: &Symbol) -> bool {
        symbol.name == self.name && symbol.declaration.path_string().contains(self.path_fragment)
    }
}

/// A call whose callee resolved to a facade symbol.
#[derive(Debug, Clone)]
pub struct ResolvedCall<'t> {
    pub call: Node<'t>,
    /// The facade declaration, after alias resolution.
    pub callee_symbol: Symbol,
    /// Accessed member for wrapper calls (`StringMapWrapper.keys` → `keys`).
    pub member: Option<String>,
    /// The `( ... )` node.
    pub argument_list: Node<'t>,
    pub arguments: Vec<Node<'t>>,
    pub parent: Option<Node<'t>>,
}

impl<'t> ResolvedCall<'t> {
    pub fn start(&self) -> usize {
        self.call.start_byte()
    }

    pub fn end(&self) -> usize {
        self.call.end_byte()
    }

    pub fn width(&self) -> usize {
        self.end() - self.start()
    }

    pub fn argument(&self, index: usize) -> Option<Node<'t>> {
        self.arguments.get(index).copied()
    }
}

/// Visit every call expression under `root` in pre-order.
///
/// Descendants are visited whatever `visit` decides about their ancestors.
/// The first error stops the walk.
pub fn walk_calls<'t, E>(
    root: Node<'t>,
    mut visit: impl FnMut(Node<'t>) -> Result<(), E>,
) -> Result<(), E> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.kind() == "call_expression" {
            visit(node)?;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return Ok(());
            }
        }
    }
}

/// Match `target(...)`, `alias(...)`, or `ns.target(...)`.
pub fn match_function_call<'t>(
    model: &dyn SemanticModel,
    file: &Path,
    call: Node<'t>,
    target: &FacadeTarget,
) -> Option<ResolvedCall<'t>> {
    let callee = call.child_by_field_name("function")?;
    let symbol = model.resolve_alias(model.resolve_symbol(file, callee)?);
    if !target.matches(&symbol) {
        return None;
    }
    resolved(call, symbol, None)
}

/// Match `Wrapper.member(...)`, resolving `Wrapper` (the object) rather than
/// the member.
pub fn match_member_call<'t>(
    model: &dyn SemanticModel,
    file: &Path,
    source: &str,
    call: Node<'t>,
    target: &FacadeTarget,
) -> Option<ResolvedCall<'t>> {
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != "member_expression" {
        return None;
    }
    let object = callee.child_by_field_name("object")?;
    let property = callee.child_by_field_name("property")?;
    let symbol = model.resolve_alias(model.resolve_symbol(file, object)?);
    if !target.matches(&symbol) {
        return None;
    }
    let member = source.get(property.byte_range())?.to_string();
    resolved(call, symbol, Some(member))
}

fn resolved<'t>(call: Node<'t>, symbol: Symbol, member: Option<String>) -> Option<ResolvedCall<'t>> {
    let (argument_list, arguments) = call_arguments(call)?;
    debug!(
        symbol = %symbol.name,
        member = member.as_deref().unwrap_or(""),
        start = call.start_byte(),
        "Matched facade call"
    );
    Some(ResolvedCall {
        call,
        callee_symbol: symbol,
        member,
        argument_list,
        arguments,
        parent: call.parent(),
    })
}
