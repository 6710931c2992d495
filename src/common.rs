//! Common definitions shared between the front end and the evaluator.

pub use std::collections::{BTreeMap as Map, BTreeSet as Set};

/// Identifiers, interned so that equality is a pointer comparison and clones
/// are free.
pub type Id = internment::Intern<String>;

/// Stable identity for an AST node (declaration or expression), assigned once
/// at parse time.
///
/// The original interpreter this crate is modeled on keys its frame maps on
/// raw `Decl*`/`Stmt*` pointers; Rust's ownership rules make storing pointers
/// into a tree that's simultaneously being walked by `&`-references fragile,
/// so every node gets a small integer identity instead.
pub type NodeId = u32;

/// Hands out increasing, never-repeating [`NodeId`]s during parsing.
#[derive(Debug, Default)]
pub struct NodeIdGen(NodeId);

impl NodeIdGen {
    pub fn new() -> Self {
        NodeIdGen(0)
    }

    pub fn next(&mut self) -> NodeId {
        let id = self.0;
        self.0 += 1;
        id
    }
}
