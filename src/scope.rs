//! Scope chain and declaration references
//!
//! Scopes form a persistent cons list owned by the driver. Each record is
//! one of:
//! - a `Block` record, opened by an `Enter` effect and carrying the block
//!   node so the matching `Leave` can re-balance the chain,
//! - a `Function` record, a barrier past which name lookup does not
//!   escape into the caller's locals,
//! - a `Variable` record binding one declared name.
//!
//! Lookup walks the chain toward the root, stops at the first function
//! barrier, and then falls back to the flat global map.

use crate::ast::Node;
use crate::memory::value::{PointerValue, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// What name lookup resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum DeclRef {
    /// Addressable storage: the variable's typed address
    Storage(PointerValue),
    /// A non-addressable binding carrying its value directly
    /// (function designators, builtins)
    Direct(Value),
}

/// A bound name
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub reference: DeclRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Block,
    Function,
    Variable,
}

/// One record of the scope chain
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub kind: ScopeKind,
    pub node: Option<Rc<Node>>,
    pub decl: Option<Binding>,
    pub parent: Option<Rc<Scope>>,
}

impl Scope {
    /// The root of every chain: a function barrier so top-level lookups
    /// go straight to the global map
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope {
            kind: ScopeKind::Function,
            node: None,
            decl: None,
            parent: None,
        })
    }

    pub fn block(parent: Rc<Scope>, node: Rc<Node>) -> Rc<Scope> {
        Rc::new(Scope {
            kind: ScopeKind::Block,
            node: Some(node),
            decl: None,
            parent: Some(parent),
        })
    }

    pub fn function(parent: Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            kind: ScopeKind::Function,
            node: None,
            decl: None,
            parent: Some(parent),
        })
    }

    pub fn binding(parent: Rc<Scope>, name: &str, reference: DeclRef) -> Rc<Scope> {
        Rc::new(Scope {
            kind: ScopeKind::Variable,
            node: None,
            decl: Some(Binding {
                name: name.to_string(),
                reference,
            }),
            parent: Some(parent),
        })
    }
}

/// Resolve `name` against the scope chain, then the global map.
///
/// The walk stops at the first `Function` record so a callee cannot see
/// its caller's locals.
pub fn find_declaration(
    scope: &Rc<Scope>,
    globals: &FxHashMap<String, DeclRef>,
    name: &str,
) -> Option<DeclRef> {
    let mut current = Some(scope);
    while let Some(record) = current {
        if let Some(binding) = &record.decl {
            if binding.name == name {
                return Some(binding.reference.clone());
            }
        }
        if record.kind == ScopeKind::Function {
            break;
        }
        current = record.parent.as_ref();
    }
    globals.get(name).cloned()
}
