//! Evaluation-time errors.
//!
//! Derives `Display` with `derive_more`, matching the teacher's own
//! `front::parse::ParseError` (`examples/parishoffman-smol/src/front/parse.rs`);
//! `Debug` is still hand-written to defer to the same message, since this
//! crate has no separate user-facing vs. developer-facing rendering to keep
//! apart.

use derive_more::Display;

use crate::common::{Id, NodeId};

#[derive(Display)]
pub enum EvalError {
    #[display("unsupported construct: {what}")]
    UnsupportedConstruct { what: String },
    #[display("out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: i32, available: i32 },
    #[display("unaligned heap address {_0}")]
    UnalignedAddress(i32),
    #[display("heap address {_0} out of range")]
    AddressOutOfRange(i32),
    #[display("array index {index} out of range for array of length {len}")]
    ArrayIndexOutOfRange { index: i32, len: usize },
    #[display("undefined array handle {_0}")]
    UndefinedArrayHandle(usize),
    #[display("left-hand side of assignment is not an lvalue")]
    BadAssignmentTarget,
    #[display("sizeof is not supported for this type")]
    UnsupportedSizeofType,
    #[display("division or remainder by zero")]
    DivisionByZero,
    #[display("GET: no more input available")]
    InputExhausted,
    #[display("GET: could not parse an integer from {_0:?}")]
    MalformedInput(String),
    #[display("'{callee}' expects {expected} argument(s), got {got}")]
    ArgumentCountMismatch { callee: Id, expected: usize, got: usize },
    #[display("no 'main' function declared")]
    NoSuchEntryPoint,
    #[display("read of declaration {_0} before it was bound (implementation bug)")]
    UnboundDecl(NodeId),
}

impl std::fmt::Debug for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for EvalError {}
