//! The abstract syntax tree produced by [`crate::front::parse`].
//!
//! Every declaration and expression node carries a [`NodeId`]: the evaluator
//! keys its frame maps on these rather than on node identity, since Rust
//! gives us no cheap equivalent of the original interpreter's raw `Decl*` /
//! `Stmt*` pointers.

use crate::common::{Id, NodeId};

/// The three types this language knows about. No `void`, no structs, no
/// floats — the value model only ever holds a 32-bit integer, a heap
/// address, or an array handle, so the type system only needs to describe
/// those three shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    Int,
    Pointer(Box<Ty>),
    Array(Box<Ty>, usize),
}

impl Ty {
    pub fn is_pointer(&self) -> bool {
        matches!(self, Ty::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Ty::Array(..))
    }

    /// `true` for `Int` and `Pointer`: the shapes an expression may actually
    /// produce a value of. Arrays never appear as the type of a *value*;
    /// an array-typed declaration only ever shows up as a subscript base.
    pub fn is_scalar(&self) -> bool {
        !self.is_array()
    }
}

impl std::fmt::Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Int => write!(f, "int"),
            Ty::Pointer(inner) => write!(f, "{inner}*"),
            Ty::Array(elem, size) => write!(f, "{elem}[{size}]"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub id: NodeId,
    pub name: Id,
    pub ty: Ty,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub id: NodeId,
    pub name: Id,
    pub ty: Ty,
    /// Absent for arrays (which are always zero-filled) and for scalars
    /// declared without an initializer (which default to 0). Global
    /// variables further restrict this to an integer-literal expression —
    /// see [`crate::eval::env::Environment::decl_global`].
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub name: Id,
    pub ret_ty: Ty,
    pub params: Vec<ParamDecl>,
    /// `None` for a declaration with no body: the four builtins, or any
    /// other forward declaration the source happens to contain.
    pub body: Option<std::rc::Rc<Block>>,
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone)]
pub enum TopDecl {
    Function(FunctionDecl),
    Var(VarDecl),
}

#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub decls: Vec<TopDecl>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Decl(Vec<VarDecl>),
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    While {
        cond: Expr,
        body: Block,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Expr,
        step: Option<Expr>,
        body: Block,
    },
    Return(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Minus,
    Not,
    LNot,
    Deref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    /// Inserted by the parser at a typed boundary (initializer, assignment,
    /// argument, return) whose static type differs from the source
    /// expression's.
    Implicit,
    /// `(T) expr` written explicitly in the source.
    Explicit,
    /// `(expr)`: grouping parentheses. Evaluates identically to its child;
    /// kept as its own node kind rather than elided during parsing so the
    /// AST shape matches what the original's Clang-based front end would
    /// have handed the evaluator.
    Paren,
}

/// A single expression node. `ty` is the expression's static type, computed
/// once during parsing (the "already type-annotated" part of the contract
/// this evaluator expects from its AST).
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub ty: Ty,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i32),
    DeclRef {
        name: Id,
        target: NodeId,
    },
    Cast {
        kind: CastKind,
        inner: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Subscript {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    SizeOf(Ty),
    Call {
        callee_name: Id,
        callee: NodeId,
        args: Vec<Expr>,
    },
}
