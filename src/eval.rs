//! The evaluation engine: value model, heap, array pool, frame stack,
//! environment, and the tree-walking evaluator itself.

pub mod array;
pub mod env;
pub mod error;
pub mod frame;
pub mod heap;
pub mod host;
pub mod interp;

pub use error::EvalError;
pub use host::{BufferHost, Host, StdHost};
pub use interp::{Flow, Interpreter};
