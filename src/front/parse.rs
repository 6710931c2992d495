//! Recursive-descent parser and single-pass name resolver.
//!
//! The language has no separate semantic-analysis pass: declare-before-use
//! name resolution, static typing, and implicit-cast insertion all happen
//! right here, fused into the same descent that builds the tree. Every
//! declaration and expression is stamped with a [`NodeId`] as it's built, and
//! identifiers are resolved against a flat, two-level symbol table (current
//! function's locals, then globals) that mirrors the two-level dynamic scope
//! the evaluator itself uses at run time.

use std::rc::Rc;

use derive_more::Display;

use crate::common::{Id, Map, NodeId, NodeIdGen};
use crate::front::ast::*;
use crate::front::lex::{Lexer, Token, TokenKind};

/// A parse error: a malformed program, an undeclared identifier, a type
/// mismatch caught statically, or anything else that keeps the source from
/// having a well-typed AST.
#[derive(Display)]
#[display("Parse error: {}", self.0)]
pub struct ParseError(pub String);

impl std::fmt::Debug for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

fn err<T>(msg: impl Into<String>) -> Result<T, ParseError> {
    Err(ParseError(msg.into()))
}

#[derive(Debug, Clone)]
struct FunctionSig {
    id: NodeId,
    param_tys: Vec<Ty>,
    ret_ty: Ty,
}

pub fn parse(src: &str) -> Result<TranslationUnit, ParseError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next().map_err(|e| ParseError(e.to_string()))? {
        tokens.push(tok);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        ids: NodeIdGen::new(),
        globals: Map::new(),
        functions: Map::new(),
        locals: None,
        current_ret_ty: None,
    };
    parser.parse_translation_unit()
}

struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    ids: NodeIdGen,
    globals: Map<Id, (NodeId, Ty)>,
    functions: Map<Id, FunctionSig>,
    /// `Some` only while parsing the body (and parameter list) of a
    /// function. No nested block scoping: every local of a function lives
    /// in this single flat table for the whole function, matching the
    /// evaluator's per-call-frame scope.
    locals: Option<Map<Id, (NodeId, Ty)>>,
    current_ret_ty: Option<Ty>,
}

impl<'src> Parser<'src> {
    // ---- token-stream plumbing ----------------------------------------

    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<Token<'src>> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        match self.peek_kind() {
            Some(k) if k == kind => Ok(self.advance().unwrap()),
            Some(k) => err(format!("expected {kind}, found {k}")),
            None => err(format!("expected {kind}, found end of input")),
        }
    }

    fn expect_id(&mut self) -> Result<Id, ParseError> {
        let tok = self.expect(TokenKind::Id)?;
        Ok(internment::Intern::new(tok.text.to_string()))
    }

    fn expect_num(&mut self) -> Result<i32, ParseError> {
        let tok = self.expect(TokenKind::Num)?;
        tok.text
            .parse::<i32>()
            .map_err(|_| ParseError(format!("integer literal out of range: {}", tok.text)))
    }

    // ---- types -----------------------------------------------------------

    /// `'*'*`, applied to a base type from the inside out: `int **p` is a
    /// pointer to a pointer to `int`.
    fn parse_stars(&mut self, mut ty: Ty) -> Ty {
        while self.eat(TokenKind::Star) {
            ty = Ty::Pointer(Box::new(ty));
        }
        ty
    }

    // ---- symbol table ------------------------------------------------

    fn declare_local(&mut self, name: Id, id: NodeId, ty: Ty) -> Result<(), ParseError> {
        let locals = self.locals.as_mut().expect("declare_local outside a function body");
        if locals.contains_key(&name) {
            return err(format!("redeclaration of '{name}' in this function"));
        }
        locals.insert(name, (id, ty));
        Ok(())
    }

    fn declare_global(&mut self, name: Id, id: NodeId, ty: Ty) -> Result<(), ParseError> {
        if self.globals.contains_key(&name) {
            return err(format!("redeclaration of global '{name}'"));
        }
        self.globals.insert(name, (id, ty));
        Ok(())
    }

    /// Two-level lookup: current function's locals first, then globals —
    /// the same order the evaluator resolves a [`crate::front::ast::ExprKind::DeclRef`] in.
    fn resolve_var(&self, name: Id) -> Result<(NodeId, Ty), ParseError> {
        if let Some(locals) = &self.locals {
            if let Some((id, ty)) = locals.get(&name) {
                return Ok((*id, ty.clone()));
            }
        }
        if let Some((id, ty)) = self.globals.get(&name) {
            return Ok((*id, ty.clone()));
        }
        err(format!("use of undeclared identifier '{name}'"))
    }

    fn resolve_fn(&self, name: Id) -> Result<FunctionSig, ParseError> {
        self.functions
            .get(&name)
            .cloned()
            .ok_or_else(|| ParseError(format!("call to undeclared function '{name}'")))
    }

    // ---- implicit casts ------------------------------------------------

    /// Wraps `expr` in an implicit cast if its static type doesn't already
    /// match `expected`. Only ever applied at a typed boundary: a variable
    /// initializer, an assignment's right-hand side, a call argument, or a
    /// return expression.
    fn coerce(&mut self, expr: Expr, expected: &Ty) -> Expr {
        if &expr.ty == expected {
            return expr;
        }
        let id = self.ids.next();
        Expr {
            id,
            ty: expected.clone(),
            kind: ExprKind::Cast {
                kind: CastKind::Implicit,
                inner: Box::new(expr),
            },
        }
    }

    // ---- top level ------------------------------------------------------

    fn parse_translation_unit(&mut self) -> Result<TranslationUnit, ParseError> {
        let mut decls = Vec::new();
        while !self.at_eof() {
            decls.push(self.parse_top_decl()?);
        }
        Ok(TranslationUnit { decls })
    }

    fn parse_top_decl(&mut self) -> Result<TopDecl, ParseError> {
        self.expect(TokenKind::KwInt)?;
        let base_ty = self.parse_stars(Ty::Int);
        let name = self.expect_id()?;

        if self.eat(TokenKind::LParen) {
            self.parse_function(name, base_ty)
        } else {
            // Unlike locals, one declaration per top-level statement: a
            // `TopDecl::Var` holds exactly one declarator.
            let mut vars = Vec::new();
            self.parse_global_declarator(name, base_ty, &mut vars)?;
            self.expect(TokenKind::Semi)?;
            Ok(TopDecl::Var(vars.into_iter().next().unwrap()))
        }
    }

    /// A single global declarator: `name` (`[size]`)? (`= literal`)?.
    /// Global initializers are restricted to integer literals — the
    /// evaluator sets up every global before a single statement runs, so
    /// there's no call stack yet for a richer initializer to run against.
    fn parse_global_declarator(&mut self, name: Id, base_ty: Ty, out: &mut Vec<VarDecl>) -> Result<(), ParseError> {
        let id = self.ids.next();
        let ty = if self.eat(TokenKind::LBracket) {
            let size = self.expect_num()? as usize;
            self.expect(TokenKind::RBracket)?;
            Ty::Array(Box::new(base_ty), size)
        } else {
            base_ty
        };

        let init = if self.eat(TokenKind::Assign) {
            if ty.is_array() {
                return err("array globals cannot have an initializer; they start zero-filled");
            }
            let lit_tok = self.expect(TokenKind::Num)?;
            let value: i32 = lit_tok
                .text
                .parse()
                .map_err(|_| ParseError(format!("integer literal out of range: {}", lit_tok.text)))?;
            let lit = Expr {
                id: self.ids.next(),
                ty: Ty::Int,
                kind: ExprKind::IntLiteral(value),
            };
            Some(self.coerce(lit, &ty))
        } else {
            None
        };

        self.declare_global(name, id, ty.clone())?;
        out.push(VarDecl { id, name, ty, init });
        Ok(())
    }

    fn parse_param_list(&mut self) -> Result<Vec<ParamDecl>, ParseError> {
        let mut params = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            self.expect(TokenKind::KwInt)?;
            let ty = self.parse_stars(Ty::Int);
            let name = self.expect_id()?;
            let id = self.ids.next();
            params.push(ParamDecl { id, name, ty });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_function(&mut self, name: Id, ret_ty: Ty) -> Result<TopDecl, ParseError> {
        let params = self.parse_param_list()?;
        self.expect(TokenKind::RParen)?;

        let id = self.ids.next();
        let sig = FunctionSig {
            id,
            param_tys: params.iter().map(|p| p.ty.clone()).collect(),
            ret_ty: ret_ty.clone(),
        };
        if self.functions.contains_key(&name) {
            return err(format!("redeclaration of function '{name}'"));
        }
        // Registered before the body is parsed: recursive calls to `name`
        // inside its own body must resolve.
        self.functions.insert(name, sig);

        let body = if self.eat(TokenKind::Semi) {
            None
        } else {
            let mut locals = Map::new();
            for p in &params {
                if locals.contains_key(&p.name) {
                    return err(format!("duplicate parameter name '{}'", p.name));
                }
                locals.insert(p.name, (p.id, p.ty.clone()));
            }
            self.locals = Some(locals);
            self.current_ret_ty = Some(ret_ty.clone());

            let block = self.parse_block()?;

            self.locals = None;
            self.current_ret_ty = None;
            Some(Rc::new(block))
        };

        Ok(TopDecl::Function(FunctionDecl {
            id,
            name,
            ret_ty,
            params,
            body,
        }))
    }

    // ---- statements -------------------------------------------------

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    /// A single statement, used as the (brace-less) body of an `if`,
    /// `while`, or `for` whose controlled statement isn't itself a `{ }`
    /// block.
    fn parse_body(&mut self) -> Result<Block, ParseError> {
        if self.check(TokenKind::LBrace) {
            self.parse_block()
        } else {
            Ok(vec![self.parse_stmt()?])
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::KwInt) => {
                let vars = self.parse_local_var_decl(true)?;
                Ok(Stmt::Decl(vars))
            }
            Some(TokenKind::KwIf) => self.parse_if(),
            Some(TokenKind::KwWhile) => self.parse_while(),
            Some(TokenKind::KwFor) => self.parse_for(),
            Some(TokenKind::KwReturn) => self.parse_return(),
            Some(TokenKind::LBrace) => Ok(Stmt::Expr(self.parse_block_as_expr_error()?)),
            _ => {
                let e = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Expr(e))
            }
        }
    }

    /// Bare `{ ... }` blocks nested inside a statement sequence aren't part
    /// of this language (there's no block scoping to introduce), so a
    /// stray `{` where a statement is expected is a parse error rather than
    /// silently accepted.
    fn parse_block_as_expr_error(&mut self) -> Result<Expr, ParseError> {
        err("nested '{ }' blocks are not supported; every statement belongs directly to its enclosing function or control-flow body")
    }

    /// `'int' declarator (',' declarator)* ';'?` — the trailing `;` is
    /// skipped for a `for`-loop's init clause, whose semicolon is the
    /// loop's own separator rather than part of the declaration.
    fn parse_local_var_decl(&mut self, consume_semi: bool) -> Result<Vec<VarDecl>, ParseError> {
        self.expect(TokenKind::KwInt)?;
        let mut vars = Vec::new();
        loop {
            let ty = self.parse_stars(Ty::Int);
            let name = self.expect_id()?;
            self.parse_local_declarator(name, ty, &mut vars)?;
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if consume_semi {
            self.expect(TokenKind::Semi)?;
        }
        Ok(vars)
    }

    fn parse_local_declarator(&mut self, name: Id, base_ty: Ty, out: &mut Vec<VarDecl>) -> Result<(), ParseError> {
        let id = self.ids.next();
        let ty = if self.eat(TokenKind::LBracket) {
            let size = self.expect_num()? as usize;
            self.expect(TokenKind::RBracket)?;
            Ty::Array(Box::new(base_ty), size)
        } else {
            base_ty
        };

        let init = if self.eat(TokenKind::Assign) {
            if ty.is_array() {
                return err("array locals cannot have an initializer; they start zero-filled");
            }
            let e = self.parse_assignment()?;
            Some(self.coerce(e, &ty))
        } else {
            None
        };

        self.declare_local(name, id, ty.clone())?;
        out.push(VarDecl { id, name, ty, init });
        Ok(())
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::KwIf)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = self.parse_body()?;
        let else_branch = if self.eat(TokenKind::KwElse) {
            Some(self.parse_body()?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::KwWhile)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_body()?;
        Ok(Stmt::While { cond, body })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::KwFor)?;
        self.expect(TokenKind::LParen)?;

        let init = if self.check(TokenKind::Semi) {
            None
        } else if self.check(TokenKind::KwInt) {
            let vars = self.parse_local_var_decl(false)?;
            Some(Box::new(Stmt::Decl(vars)))
        } else {
            let e = self.parse_expr()?;
            Some(Box::new(Stmt::Expr(e)))
        };
        self.expect(TokenKind::Semi)?;

        let cond = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;

        let step = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RParen)?;

        let body = self.parse_body()?;
        Ok(Stmt::For { init, cond, step, body })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::KwReturn)?;
        let e = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;
        let ret_ty = self
            .current_ret_ty
            .clone()
            .expect("parse_return only runs inside a function body");
        let e = self.coerce(e, &ret_ty);
        Ok(Stmt::Return(e))
    }

    // ---- expressions: precedence climbing --------------------------

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn is_lvalue(kind: &ExprKind) -> bool {
        match kind {
            ExprKind::DeclRef { .. } | ExprKind::Subscript { .. } => true,
            ExprKind::Unary { op: UnOp::Deref, .. } => true,
            _ => false,
        }
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_equality()?;
        if self.eat(TokenKind::Assign) {
            if !Self::is_lvalue(&lhs.kind) {
                return err("left-hand side of assignment is not assignable");
            }
            let rhs = self.parse_assignment()?;
            let rhs = self.coerce(rhs, &lhs.ty);
            let id = self.ids.next();
            let ty = lhs.ty.clone();
            Ok(Expr {
                id,
                ty,
                kind: ExprKind::Assign {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            })
        } else {
            Ok(lhs)
        }
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::EqEq) => BinOp::Eq,
                Some(TokenKind::Ne) => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = self.mk_binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Lt) => BinOp::Lt,
                Some(TokenKind::Gt) => BinOp::Gt,
                Some(TokenKind::Le) => BinOp::Le,
                Some(TokenKind::Ge) => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = self.mk_binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = self.mk_binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                Some(TokenKind::Percent) => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.mk_binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    /// Builds a [`ExprKind::Binary`] node, computing its static type from
    /// the teacher-provided-by-the-spec pointer arithmetic rules: `int op
    /// int` stays `int`; `ptr +/- int` and `int + ptr` stay that pointer
    /// type; `ptr - ptr` is `int`; every comparison is `int`. Any other
    /// combination (`ptr * ptr`, `int - ptr`, anything touching an array)
    /// is rejected here rather than deferred to the evaluator.
    fn mk_binary(&mut self, op: BinOp, lhs: Expr, rhs: Expr) -> Result<Expr, ParseError> {
        if lhs.ty.is_array() || rhs.ty.is_array() {
            return err("arrays cannot be used directly in an expression; subscript them first");
        }
        let ty = match op {
            BinOp::Add => match (&lhs.ty, &rhs.ty) {
                (Ty::Int, Ty::Int) => Ty::Int,
                (p @ Ty::Pointer(_), Ty::Int) => p.clone(),
                (Ty::Int, p @ Ty::Pointer(_)) => p.clone(),
                _ => return err("invalid operand types for '+'"),
            },
            BinOp::Sub => match (&lhs.ty, &rhs.ty) {
                (Ty::Int, Ty::Int) => Ty::Int,
                (p @ Ty::Pointer(_), Ty::Int) => p.clone(),
                (Ty::Pointer(a), Ty::Pointer(b)) if a == b => Ty::Int,
                _ => return err("invalid operand types for '-'"),
            },
            BinOp::Mul | BinOp::Div | BinOp::Rem => {
                if lhs.ty.is_pointer() || rhs.ty.is_pointer() {
                    return err(format!("invalid operand types for '{op:?}': pointers only support + and -"));
                }
                Ty::Int
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne => Ty::Int,
        };
        let id = self.ids.next();
        Ok(Expr {
            id,
            ty,
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Plus) => Some(UnOp::Plus),
            Some(TokenKind::Minus) => Some(UnOp::Minus),
            Some(TokenKind::Bang) => Some(UnOp::LNot),
            Some(TokenKind::Tilde) => Some(UnOp::Not),
            Some(TokenKind::Star) => Some(UnOp::Deref),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        self.advance();
        let operand = self.parse_unary()?;
        let ty = if op == UnOp::Deref {
            match &operand.ty {
                Ty::Pointer(inner) => (**inner).clone(),
                _ => return err("cannot dereference a non-pointer expression"),
            }
        } else {
            if operand.ty.is_array() {
                return err("arrays cannot be used directly in an expression; subscript them first");
            }
            Ty::Int
        };
        let id = self.ids.next();
        Ok(Expr {
            id,
            ty,
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut e = self.parse_primary()?;
        while self.eat(TokenKind::LBracket) {
            let index = self.parse_expr()?;
            self.expect(TokenKind::RBracket)?;
            let elem_ty = match &e.ty {
                Ty::Array(elem, _) => (**elem).clone(),
                _ => return err("subscript applied to a non-array expression"),
            };
            let id = self.ids.next();
            e = Expr {
                id,
                ty: elem_ty,
                kind: ExprKind::Subscript {
                    base: Box::new(e),
                    index: Box::new(index),
                },
            };
        }
        Ok(e)
    }

    /// Disambiguates `(` as either a parenthesized/cast expression or a
    /// plain grouping, by peeking one token past it: `(int` can only start
    /// a type, anything else is a grouped expression.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Num) => {
                let value = self.expect_num()?;
                let id = self.ids.next();
                Ok(Expr {
                    id,
                    ty: Ty::Int,
                    kind: ExprKind::IntLiteral(value),
                })
            }
            Some(TokenKind::KwSizeof) => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                self.expect(TokenKind::KwInt)?;
                let ty = self.parse_stars(Ty::Int);
                self.expect(TokenKind::RParen)?;
                let id = self.ids.next();
                Ok(Expr {
                    id,
                    ty: Ty::Int,
                    kind: ExprKind::SizeOf(ty),
                })
            }
            Some(TokenKind::Id) => {
                let name = self.expect_id()?;
                if self.eat(TokenKind::LParen) {
                    self.parse_call(name)
                } else {
                    let (target, ty) = self.resolve_var(name)?;
                    let id = self.ids.next();
                    Ok(Expr {
                        id,
                        ty,
                        kind: ExprKind::DeclRef { name, target },
                    })
                }
            }
            Some(TokenKind::LParen) => {
                self.advance();
                if self.check(TokenKind::KwInt) {
                    self.expect(TokenKind::KwInt)?;
                    let ty = self.parse_stars(Ty::Int);
                    self.expect(TokenKind::RParen)?;
                    let inner = self.parse_unary()?;
                    let id = self.ids.next();
                    Ok(Expr {
                        id,
                        ty,
                        kind: ExprKind::Cast {
                            kind: CastKind::Explicit,
                            inner: Box::new(inner),
                        },
                    })
                } else {
                    let inner = self.parse_expr()?;
                    self.expect(TokenKind::RParen)?;
                    let id = self.ids.next();
                    let ty = inner.ty.clone();
                    Ok(Expr {
                        id,
                        ty,
                        kind: ExprKind::Cast {
                            kind: CastKind::Paren,
                            inner: Box::new(inner),
                        },
                    })
                }
            }
            Some(k) => err(format!("unexpected token {k} where an expression was expected")),
            None => err("unexpected end of input where an expression was expected"),
        }
    }

    fn parse_call(&mut self, name: Id) -> Result<Expr, ParseError> {
        let sig = self.resolve_fn(name)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_assignment()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        if args.len() != sig.param_tys.len() {
            return err(format!(
                "'{name}' expects {} argument(s), found {}",
                sig.param_tys.len(),
                args.len()
            ));
        }
        let args: Vec<Expr> = args
            .into_iter()
            .zip(sig.param_tys.iter())
            .map(|(a, want)| self.coerce(a, want))
            .collect();

        let id = self.ids.next();
        Ok(Expr {
            id,
            ty: sig.ret_ty.clone(),
            kind: ExprKind::Call {
                callee_name: name,
                callee: sig.id,
                args,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> TranslationUnit {
        parse(src).unwrap_or_else(|e| panic!("expected {src:?} to parse, got {e}"))
    }

    fn parse_err(src: &str) {
        assert!(parse(src).is_err(), "expected {src:?} to fail to parse");
    }

    #[test]
    fn minimal_program() {
        let tu = parse_ok("int main() { return 0; }");
        assert_eq!(tu.decls.len(), 1);
    }

    #[test]
    fn recursive_call_resolves_against_its_own_prototype() {
        parse_ok(
            "int fact(int n) { if (n <= 1) return 1; return n * fact(n - 1); }",
        );
    }

    #[test]
    fn undeclared_identifier_is_an_error() {
        parse_err("int main() { return x; }");
    }

    #[test]
    fn undeclared_function_is_an_error() {
        parse_err("int main() { return nope(); }");
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        parse_err("int f(int a, int b) { return a + b; } int main() { return f(1); }");
    }

    #[test]
    fn assignment_to_non_lvalue_is_an_error() {
        parse_err("int main() { 1 = 2; return 0; }");
    }

    #[test]
    fn pointer_plus_int_keeps_pointer_type() {
        let tu = parse_ok("int main() { int *p; int n; n = 0; p = p + 1; return 0; }");
        assert_eq!(tu.decls.len(), 1);
    }

    #[test]
    fn int_minus_pointer_is_rejected() {
        parse_err("int main() { int *p; int x; x = 1 - p; return 0; }");
    }

    #[test]
    fn cast_vs_parenthesized_expression() {
        // `(int)x` is a cast; `(x)` is a grouping. Both must parse.
        parse_ok("int f(int x) { return (int)x; } int main() { return f((1 + 2)); }");
    }

    #[test]
    fn global_initializer_must_be_a_literal() {
        parse_err("int g = 1 + 1; int main() { return g; }");
    }

    #[test]
    fn array_subscript() {
        parse_ok("int a[10]; int main() { int i; i = 0; a[i] = 5; return a[i]; }");
    }

    #[test]
    fn pointer_deref_round_trip() {
        parse_ok(
            "int MALLOC(int n); int main() { int *p; p = MALLOC(4); *p = 7; return *p; }",
        );
    }

    /// `*` binds tighter than `+`: `1 + 2 * 3` must build `Add(1, Mul(2, 3))`,
    /// never `Mul(Add(1, 2), 3)`.
    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let tu = parse_ok("int main() { return 1 + 2 * 3; }");
        let TopDecl::Function(f) = &tu.decls[0] else { panic!("expected a function") };
        let body = f.body.as_ref().unwrap();
        let Stmt::Return(e) = &body[0] else { panic!("expected a return statement") };
        match &e.kind {
            ExprKind::Binary { op: BinOp::Add, lhs, rhs } => {
                assert!(matches!(lhs.kind, ExprKind::IntLiteral(1)));
                match &rhs.kind {
                    ExprKind::Binary { op: BinOp::Mul, lhs, rhs } => {
                        assert!(matches!(lhs.kind, ExprKind::IntLiteral(2)));
                        assert!(matches!(rhs.kind, ExprKind::IntLiteral(3)));
                    }
                    other => panic!("expected Mul(2, 3) on the right of Add, found {other:?}"),
                }
            }
            other => panic!("expected Add(1, Mul(2, 3)) at the top, found {other:?}"),
        }
    }

    /// Assignment is right-associative: `a = b = 1` is `Assign(a, Assign(b,
    /// 1))`, not `Assign(Assign(a, b), 1)` (which wouldn't even parse, since
    /// `Assign(a, b)` isn't an lvalue).
    #[test]
    fn chained_assignment_is_right_associative() {
        let tu = parse_ok("int main() { int a; int b; a = b = 1; return a; }");
        let TopDecl::Function(f) = &tu.decls[0] else { panic!("expected a function") };
        let body = f.body.as_ref().unwrap();
        // decls for a, b are stmts 0 and 1; the assignment is stmt 2.
        let Stmt::Expr(e) = &body[2] else { panic!("expected an expression statement") };
        match &e.kind {
            ExprKind::Assign { lhs, rhs } => {
                assert!(matches!(lhs.kind, ExprKind::DeclRef { .. }), "outer lhs should be 'a'");
                match &rhs.kind {
                    ExprKind::Assign { lhs: inner_lhs, rhs: inner_rhs } => {
                        assert!(matches!(inner_lhs.kind, ExprKind::DeclRef { .. }), "inner lhs should be 'b'");
                        assert!(matches!(inner_rhs.kind, ExprKind::IntLiteral(1)));
                    }
                    other => panic!("expected the rhs of the outer assign to itself be an assign, found {other:?}"),
                }
            }
            other => panic!("expected an Assign at the top, found {other:?}"),
        }
    }
}
