use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::{Span, Spanned};

use super::env::{assignable, ClassTable, Scopes};

/// Per-method type checking state. Errors accumulate; an ill-typed
/// expression yields `TypeDenoter::Unsupported` so it is reported only once.
pub(super) struct Checker<'a> {
    pub(super) table: &'a ClassTable,
    pub(super) locals: Scopes<TypeDenoter>,
    pub(super) class: String,
    return_type: TypeDenoter,
    saw_return: bool,
    pub(super) errors: Vec<CompileError>,
}

impl<'a> Checker<'a> {
    pub(super) fn new(table: &'a ClassTable) -> Self {
        Self {
            table,
            locals: Scopes::new(),
            class: String::new(),
            return_type: TypeDenoter::Void,
            saw_return: false,
            errors: Vec::new(),
        }
    }

    pub(super) fn error(&mut self, msg: impl Into<String>, span: Span) {
        self.errors.push(CompileError::type_err(msg, span));
    }

    pub(super) fn check_program(&mut self, program: &Program) {
        for class in &program.classes {
            self.class = class.node.name.node.clone();
            for method in &class.node.methods {
                self.check_method(&method.node);
            }
        }
    }

    fn check_method(&mut self, method: &MethodDecl) {
        self.return_type = method.return_type.node.clone();
        self.saw_return = false;
        self.locals.push_scope();
        for param in &method.params {
            self.locals.define(&param.node.name.node, param.node.ty.node.clone());
        }
        for stmt in &method.body {
            self.check_stmt(stmt);
        }
        self.locals.pop_scope();

        if self.return_type != TypeDenoter::Void && !self.saw_return {
            self.error(format!("missing return statement in method {}", method.name.node), method.name.span);
        }
    }

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::Block(stmts) => {
                self.locals.push_scope();
                for s in stmts {
                    self.check_stmt(s);
                }
                self.locals.pop_scope();
            }
            Stmt::VarDecl { decl, init } => {
                let actual = self.infer_expr(init);
                if !assignable(&decl.ty.node, &actual) {
                    self.error(
                        format!(
                            "types do not match for declaration of {}: expected {}, found {actual}",
                            decl.name.node, decl.ty.node
                        ),
                        init.span,
                    );
                }
                self.locals.define(&decl.name.node, decl.ty.node.clone());
            }
            Stmt::Assign { target, value } => {
                let expected = self.value_type(target);
                let actual = self.infer_expr(value);
                if !assignable(&expected, &actual) {
                    self.error(
                        format!("types do not match for assignment to {}: expected {expected}, found {actual}", target.node),
                        value.span,
                    );
                }
            }
            Stmt::IndexAssign { target, index, value } => {
                let elem = self.index_type(target, index);
                let actual = self.infer_expr(value);
                if !assignable(&elem, &actual) {
                    self.error(
                        format!("types do not match for element of {}: expected {elem}, found {actual}", target.node),
                        value.span,
                    );
                }
            }
            Stmt::Call { method, args } => {
                self.check_call(method, args);
            }
            Stmt::Return(value) => self.check_return(value.as_ref(), stmt.span),
            Stmt::If { cond, then_branch, else_branch } => {
                self.check_condition(cond, "if");
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            Stmt::While { cond, body } => {
                self.check_condition(cond, "while");
                self.check_stmt(body);
            }
        }
    }

    fn check_return(&mut self, value: Option<&Spanned<Expr>>, span: Span) {
        self.saw_return = true;
        match (value, self.return_type.clone()) {
            (Some(expr), TypeDenoter::Void) => {
                self.infer_expr(expr);
                self.error("return expression not allowed in a void method", expr.span);
            }
            (Some(expr), expected) => {
                let actual = self.infer_expr(expr);
                if !assignable(&expected, &actual) {
                    self.error(format!("return type mismatch: expected {expected}, found {actual}"), expr.span);
                }
            }
            (None, TypeDenoter::Void) => {}
            (None, expected) => self.error(format!("missing return value of type {expected}"), span),
        }
    }

    fn check_condition(&mut self, cond: &Spanned<Expr>, keyword: &str) {
        let ty = self.infer_expr(cond);
        if !assignable(&TypeDenoter::Boolean, &ty) {
            self.error(format!("{keyword} condition must be of type boolean, found {ty}"), cond.span);
        }
    }

    /// Element type of `target[index]`, reporting a non-array target or a
    /// non-int index.
    pub(super) fn index_type(&mut self, target: &Spanned<Reference>, index: &Spanned<Expr>) -> TypeDenoter {
        let target_ty = self.value_type(target);
        let index_ty = self.infer_expr(index);
        if !assignable(&TypeDenoter::Int, &index_ty) {
            self.error(format!("index expression must be of type int, found {index_ty}"), index.span);
        }
        match target_ty {
            TypeDenoter::Array(elem) => *elem,
            TypeDenoter::Unsupported => TypeDenoter::Unsupported,
            other => {
                self.error(format!("{} has type {other} and cannot be indexed", target.node), target.span);
                TypeDenoter::Unsupported
            }
        }
    }
}
