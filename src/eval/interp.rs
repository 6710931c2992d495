//! The tree-walking evaluator.
//!
//! Visits every expression node bottom-up (children first, then the node's
//! own action), binding each node's value into the current frame as it
//! goes. Non-local `return` is modeled as [`Flow::Return`], threaded
//! through `Result<Flow, EvalError>` rather than a panic or a thrown
//! exception — every call boundary catches it exactly once.

use crate::common::NodeId;
use crate::eval::env::{CallOutcome, Environment};
use crate::eval::error::EvalError;
use crate::eval::host::Host;
use crate::front::ast::{Block, Expr, ExprKind, Stmt, TranslationUnit, Ty, UnOp, VarDecl};

/// Non-local control flow produced by executing a statement.
pub enum Flow {
    Normal,
    Return(i32),
}

pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new(tu: &TranslationUnit) -> Result<Self, EvalError> {
        Ok(Interpreter {
            env: Environment::init(tu)?,
        })
    }

    /// Runs `main`'s body in the global frame (no new frame is pushed for
    /// `main` itself) and returns its exit status — 0 if it falls off the
    /// end without a `return`.
    pub fn run(&mut self, host: &mut dyn Host) -> Result<i32, EvalError> {
        let body = self.env.entry_body()?;
        match self.exec_block(&body, host)? {
            Flow::Return(status) => Ok(status),
            Flow::Normal => Ok(0),
        }
    }

    fn exec_block(&mut self, block: &Block, host: &mut dyn Host) -> Result<Flow, EvalError> {
        for stmt in block {
            match self.exec_stmt(stmt, host)? {
                Flow::Normal => {}
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, host: &mut dyn Host) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Decl(vars) => {
                for v in vars {
                    self.exec_var_decl(v, host)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Expr(e) => {
                self.eval_expr(e, host)?;
                Ok(Flow::Normal)
            }
            Stmt::If { cond, then_branch, else_branch } => {
                if self.eval_expr(cond, host)? != 0 {
                    self.exec_block(then_branch, host)
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch, host)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.eval_expr(cond, host)? != 0 {
                    match self.exec_block(body, host)? {
                        Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For { init, cond, step, body } => {
                if let Some(init) = init {
                    match self.exec_stmt(init, host)? {
                        Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                while self.eval_expr(cond, host)? != 0 {
                    match self.exec_block(body, host)? {
                        Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                    if let Some(step) = step {
                        self.eval_expr(step, host)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(e) => {
                let v = self.eval_expr(e, host)?;
                Ok(Flow::Return(v))
            }
        }
    }

    fn exec_var_decl(&mut self, var: &VarDecl, host: &mut dyn Host) -> Result<(), EvalError> {
        match &var.ty {
            Ty::Array(_, size) => {
                let handle = self.env.alloc_array(*size);
                self.env.declare(var.id, handle as i32);
            }
            _ => {
                let value = match &var.init {
                    Some(e) => self.eval_expr(e, host)?,
                    None => 0,
                };
                self.env.declare(var.id, value);
            }
        }
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr, host: &mut dyn Host) -> Result<i32, EvalError> {
        let value = match &expr.kind {
            ExprKind::IntLiteral(v) => *v,

            ExprKind::DeclRef { target, .. } => {
                self.env.set_pc(expr.id);
                self.env.get_decl(*target)?
            }

            ExprKind::Cast { inner, .. } => {
                let v = self.eval_expr(inner, host)?;
                self.env.set_pc(expr.id);
                v
            }

            ExprKind::Unary { op, operand } => {
                let v = self.eval_expr(operand, host)?;
                if *op == UnOp::Deref {
                    self.env.heap_load(v)?
                } else {
                    self.env.uop(*op, v)
                }
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let lval = self.eval_expr(lhs, host)?;
                let rval = self.eval_expr(rhs, host)?;
                self.env.binop(*op, lval, rval, &lhs.ty, &rhs.ty)?
            }

            ExprKind::Assign { lhs, rhs } => {
                // Visit the LHS once, fully: a subscript binds its base and
                // index, a dereference binds its address sub-expression.
                // The write step below reuses those bindings instead of
                // re-evaluating the LHS, so a side-effecting index or
                // address expression runs exactly once.
                self.eval_expr(lhs, host)?;
                let rval = self.eval_expr(rhs, host)?;
                self.write_lvalue(lhs, rval)?;
                self.env.bind_expr(lhs.id, rval);
                rval
            }

            ExprKind::Subscript { base, index } => {
                let handle = self.eval_expr(base, host)?;
                let idx = self.eval_expr(index, host)?;
                self.env.array_get(handle as usize, idx)?
            }

            ExprKind::SizeOf(ty) => self.env.sizeof(ty)?,

            ExprKind::Call { callee, args, .. } => {
                let mut arg_values = Vec::with_capacity(args.len());
                for a in args {
                    arg_values.push(self.eval_expr(a, host)?);
                }
                self.env.set_pc(expr.id);
                // The call's own binding (if any) is handled inside
                // `eval_call`, which knows whether the callee actually
                // produced a value.
                return self.eval_call(expr.id, *callee, &arg_values, host);
            }
        };
        self.env.bind_expr(expr.id, value);
        Ok(value)
    }

    /// Writes `rval` through an lvalue-shaped expression, reusing whatever
    /// that expression's own sub-nodes were already bound to while it was
    /// visited as the assignment's LHS.
    fn write_lvalue(&mut self, lhs: &Expr, rval: i32) -> Result<(), EvalError> {
        match &lhs.kind {
            ExprKind::DeclRef { target, .. } => {
                self.env.bind_decl(*target, rval);
                Ok(())
            }
            ExprKind::Subscript { base, index } => {
                let handle = self.env.expr_value(base.id) as usize;
                let idx = self.env.expr_value(index.id);
                self.env.array_set(handle, idx, rval)
            }
            ExprKind::Unary { op: UnOp::Deref, operand } => {
                let addr = self.env.expr_value(operand.id);
                self.env.heap_store(addr, rval)
            }
            _ => Err(EvalError::BadAssignmentTarget),
        }
    }

    fn eval_call(
        &mut self,
        node: NodeId,
        callee: NodeId,
        args: &[i32],
        host: &mut dyn Host,
    ) -> Result<i32, EvalError> {
        match self.env.call(callee, args)? {
            CallOutcome::Get => {
                let v = host.read_int()?;
                self.env.bind_expr(node, v);
                Ok(v)
            }
            CallOutcome::Print(v) => {
                host.print_int(v);
                // No useful value: a `PRINT(...)` call only ever appears as
                // a standalone expression statement in well-formed
                // programs, so the node is left unbound and nothing reads
                // this return value.
                Ok(0)
            }
            CallOutcome::Value(Some(v)) => {
                self.env.bind_expr(node, v);
                Ok(v)
            }
            CallOutcome::Value(None) => Ok(0),
            CallOutcome::UserCall(body) => {
                let flow = self.exec_block(&body, host);
                self.env.pop_frame();
                match flow? {
                    Flow::Return(v) => {
                        self.env.bind_expr(node, v);
                        Ok(v)
                    }
                    Flow::Normal => Ok(0),
                }
            }
        }
    }
}
