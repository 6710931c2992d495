//! The `Environment`: owns the heap, array pool, and frame stack, and knows
//! how to resolve a declaration, perform a cast/unary/binary operation, and
//! dispatch a call.

use std::rc::Rc;

use crate::common::{Id, Map, NodeId};
use crate::eval::array::{ArrayHandle, ArrayPool};
use crate::eval::error::EvalError;
use crate::eval::frame::{FrameStack, StackFrame};
use crate::eval::heap::Heap;
use crate::front::ast::{BinOp, Block, FunctionDecl, TopDecl, TranslationUnit, Ty, UnOp};

#[derive(Clone, Copy)]
enum Builtin {
    Get,
    Print,
    Malloc,
    Free,
}

/// What dispatching a call expression resolves to. `Get`/`Print` are left
/// for [`crate::eval::interp::Interpreter`] to finish, since only it holds
/// the [`crate::eval::host::Host`]; `Malloc`/`Free` are pure heap
/// operations `Environment` can perform directly.
pub enum CallOutcome {
    Get,
    Print(i32),
    Value(Option<i32>),
    UserCall(Rc<Block>),
}

pub struct Environment {
    heap: Heap,
    arrays: ArrayPool,
    frames: FrameStack,
    functions: Map<NodeId, Rc<FunctionDecl>>,
    builtins: Map<NodeId, Builtin>,
    entry: NodeId,
}

impl Environment {
    /// Walks the translation unit's top-level declarations once: resolves
    /// the four builtins and the entry point by name, and materializes
    /// every global variable in the global frame.
    pub fn init(tu: &TranslationUnit) -> Result<Environment, EvalError> {
        let mut functions = Map::new();
        let mut builtins = Map::new();
        let mut entry = None;

        for decl in &tu.decls {
            if let TopDecl::Function(f) = decl {
                if let Some(b) = builtin_by_name(&f.name) {
                    builtins.insert(f.id, b);
                }
                if f.name.as_str() == "main" {
                    entry = Some(f.id);
                }
                functions.insert(f.id, Rc::new(f.clone()));
            }
        }
        let entry = entry.ok_or(EvalError::NoSuchEntryPoint)?;

        let mut env = Environment {
            heap: Heap::new(),
            arrays: ArrayPool::new(),
            frames: FrameStack::new(),
            functions,
            builtins,
            entry,
        };

        for decl in &tu.decls {
            if let TopDecl::Var(v) = decl {
                env.decl_global(v)?;
            }
        }
        Ok(env)
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn entry_body(&self) -> Result<Rc<Block>, EvalError> {
        self.functions
            .get(&self.entry)
            .and_then(|f| f.body.clone())
            .ok_or(EvalError::NoSuchEntryPoint)
    }

    fn decl_global(&mut self, var: &crate::front::ast::VarDecl) -> Result<(), EvalError> {
        match &var.ty {
            Ty::Array(_, size) => {
                let handle = self.arrays.alloc(*size, 0);
                self.frames.global_mut().bind_decl(var.id, handle as i32);
            }
            _ => {
                let value = match &var.init {
                    Some(e) => const_eval(e),
                    None => 0,
                };
                self.frames.global_mut().bind_decl(var.id, value);
            }
        }
        Ok(())
    }

    // ---- declarations & scope rule -----------------------------------

    /// Introduces a fresh binding in the *current* frame — used for a
    /// local variable declaration, which by definition is never a lookup.
    pub fn declare(&mut self, id: NodeId, value: i32) {
        self.frames.top_mut().bind_decl(id, value);
    }

    /// Two-level scope lookup: current frame, then global.
    pub fn get_decl(&self, id: NodeId) -> Result<i32, EvalError> {
        if let Some(v) = self.frames.top().get_decl(id) {
            return Ok(v);
        }
        if let Some(v) = self.frames.global().get_decl(id) {
            return Ok(v);
        }
        Err(EvalError::UnboundDecl(id))
    }

    /// Two-level scope rule for a write through assignment: writes to the
    /// current frame if it already holds a binding for `id`, else to the
    /// global frame.
    pub fn bind_decl(&mut self, id: NodeId, value: i32) {
        if self.frames.top().has_decl(id) {
            self.frames.top_mut().bind_decl(id, value);
        } else {
            self.frames.global_mut().bind_decl(id, value);
        }
    }

    pub fn bind_expr(&mut self, id: NodeId, value: i32) {
        self.frames.top_mut().bind_stmt(id, value);
    }

    pub fn expr_value(&self, id: NodeId) -> i32 {
        self.frames.top().get_stmt(id)
    }

    pub fn set_pc(&mut self, id: NodeId) {
        self.frames.top_mut().set_pc(id);
    }

    pub fn depth(&self) -> usize {
        self.frames.depth()
    }

    // ---- arrays --------------------------------------------------------

    pub fn alloc_array(&mut self, size: usize) -> ArrayHandle {
        self.arrays.alloc(size, self.frames.depth())
    }

    pub fn array_get(&self, handle: ArrayHandle, index: i32) -> Result<i32, EvalError> {
        self.arrays.get(handle, index)
    }

    pub fn array_set(&mut self, handle: ArrayHandle, index: i32, value: i32) -> Result<(), EvalError> {
        self.arrays.set(handle, index, value)
    }

    // ---- heap ----------------------------------------------------------

    pub fn heap_load(&self, addr: i32) -> Result<i32, EvalError> {
        self.heap.load(addr)
    }

    pub fn heap_store(&mut self, addr: i32, value: i32) -> Result<(), EvalError> {
        self.heap.store(addr, value)
    }

    // ---- operators -------------------------------------------------

    pub fn uop(&self, op: UnOp, v: i32) -> i32 {
        match op {
            UnOp::Plus => v,
            UnOp::Minus => v.wrapping_neg(),
            UnOp::Not => !v,
            UnOp::LNot => i32::from(v == 0),
            UnOp::Deref => unreachable!("dereference is handled by the evaluator, not Environment::uop"),
        }
    }

    pub fn binop(&self, op: BinOp, lval: i32, rval: i32, lty: &Ty, rty: &Ty) -> Result<i32, EvalError> {
        match op {
            BinOp::Add => match (lty.is_pointer(), rty.is_pointer()) {
                (false, false) => Ok(lval.wrapping_add(rval)),
                (true, false) => Ok(lval.wrapping_add(Heap::scale(rval))),
                (false, true) => Ok(rval.wrapping_add(Heap::scale(lval))),
                (true, true) => Err(EvalError::UnsupportedConstruct {
                    what: "pointer + pointer".to_string(),
                }),
            },
            BinOp::Sub => match (lty.is_pointer(), rty.is_pointer()) {
                (false, false) => Ok(lval.wrapping_sub(rval)),
                (true, false) => Ok(lval.wrapping_sub(Heap::scale(rval))),
                (true, true) => Ok(lval.wrapping_sub(rval) / Heap::ptr_size()),
                (false, true) => Err(EvalError::UnsupportedConstruct {
                    what: "int - pointer".to_string(),
                }),
            },
            BinOp::Mul => Ok(lval.wrapping_mul(rval)),
            BinOp::Div => {
                if rval == 0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(lval.wrapping_div(rval))
                }
            }
            BinOp::Rem => {
                if rval == 0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(lval.wrapping_rem(rval))
                }
            }
            BinOp::Lt => Ok(i32::from(lval < rval)),
            BinOp::Gt => Ok(i32::from(lval > rval)),
            BinOp::Le => Ok(i32::from(lval <= rval)),
            BinOp::Ge => Ok(i32::from(lval >= rval)),
            BinOp::Eq => Ok(i32::from(lval == rval)),
            BinOp::Ne => Ok(i32::from(lval != rval)),
        }
    }

    pub fn sizeof(&self, ty: &Ty) -> Result<i32, EvalError> {
        match ty {
            Ty::Int => Ok(4),
            Ty::Pointer(_) => Ok(Heap::ptr_size()),
            Ty::Array(..) => Err(EvalError::UnsupportedSizeofType),
        }
    }

    // ---- calls -----------------------------------------------------

    pub fn call(&mut self, callee: NodeId, args: &[i32]) -> Result<CallOutcome, EvalError> {
        if let Some(builtin) = self.builtins.get(&callee).copied() {
            return self.call_builtin(builtin, args);
        }

        let decl = self
            .functions
            .get(&callee)
            .cloned()
            .ok_or(EvalError::UnboundDecl(callee))?;
        if args.len() != decl.params.len() {
            return Err(EvalError::ArgumentCountMismatch {
                callee: decl.name,
                expected: decl.params.len(),
                got: args.len(),
            });
        }
        let body = decl.body.clone().ok_or_else(|| EvalError::UnsupportedConstruct {
            what: format!("call to '{}', which has no body", decl.name),
        })?;

        let mut frame = StackFrame::new();
        for (param, value) in decl.params.iter().zip(args) {
            frame.bind_decl(param.id, *value);
        }
        self.frames.push(frame);

        Ok(CallOutcome::UserCall(body))
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    fn call_builtin(&mut self, builtin: Builtin, args: &[i32]) -> Result<CallOutcome, EvalError> {
        match builtin {
            Builtin::Get => Ok(CallOutcome::Get),
            Builtin::Print => Ok(CallOutcome::Print(args[0])),
            Builtin::Malloc => {
                let addr = self.heap.malloc(args[0])?;
                Ok(CallOutcome::Value(Some(addr)))
            }
            Builtin::Free => {
                self.heap.free(args[0]);
                Ok(CallOutcome::Value(None))
            }
        }
    }
}

fn builtin_by_name(name: &Id) -> Option<Builtin> {
    match name.as_str() {
        "GET" => Some(Builtin::Get),
        "PRINT" => Some(Builtin::Print),
        "MALLOC" => Some(Builtin::Malloc),
        "FREE" => Some(Builtin::Free),
        _ => None,
    }
}

/// Global initializers are parser-enforced to be an integer literal,
/// possibly wrapped in an implicit cast (e.g. `int *g = 0;`). Peels through
/// any such casts down to the literal.
fn const_eval(expr: &crate::front::ast::Expr) -> i32 {
    match &expr.kind {
        crate::front::ast::ExprKind::IntLiteral(v) => *v,
        crate::front::ast::ExprKind::Cast { inner, .. } => const_eval(inner),
        _ => unreachable!("the parser only allows literal (possibly cast) global initializers"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front::parse;

    #[test]
    fn init_fails_without_main() {
        let tu = parse("int f() { return 0; }").unwrap();
        assert!(Environment::init(&tu).is_err());
    }

    #[test]
    fn global_is_seeded_from_literal() {
        let tu = parse("int g = 2; int main() { return g; }").unwrap();
        let env = Environment::init(&tu).unwrap();
        // The only VarDecl's id is 0 (assigned before the function below it).
        assert_eq!(env.get_decl(0).unwrap(), 2);
    }

    /// Calling a forward-declared-but-never-defined function must not leave
    /// a frame pushed behind when it fails: depth at call-exit has to equal
    /// depth at call-entry even on this error path, same as a normal return.
    #[test]
    fn calling_a_bodyless_function_does_not_leak_a_frame() {
        let tu = parse("int helper(int x); int main() { return helper(1); }").unwrap();
        let mut env = Environment::init(&tu).unwrap();
        let helper_id = match &tu.decls[0] {
            crate::front::ast::TopDecl::Function(f) => f.id,
            _ => panic!("expected 'helper' to be the first declaration"),
        };
        let depth_before = env.depth();
        assert!(env.call(helper_id, &[1]).is_err());
        assert_eq!(env.depth(), depth_before);
    }
}
