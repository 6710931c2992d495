//! `microc`: a tree-walking interpreter for a small, statically-typed
//! C-like language.
//!
//! [`front`] lexes and parses source text into a fully resolved, fully
//! typed AST; [`eval`] walks that AST to run the program.

pub mod common;
pub mod eval;
pub mod front;
