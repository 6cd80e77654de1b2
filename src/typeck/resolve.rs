//! Identification: binds every name in the program to a declaration and
//! enforces the scoping rules. The first violation aborts the pass.
//!
//! Scope levels: the class table is level 0, members of the current class
//! level 1, parameters level 2 (method-top statements share it), and one
//! more level per nested block.

use tracing::debug;

use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::{Span, Spanned};

use super::env::{ClassTable, Scopes};

type RResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone)]
struct Local {
    ty: TypeDenoter,
    initializing: bool,
}

/// What a reference denotes once resolved.
#[derive(Debug, Clone)]
enum Denotation {
    This,
    Variable(TypeDenoter),
    Field(TypeDenoter),
    Method,
    Class(String),
}

struct Resolver<'a> {
    table: &'a ClassTable,
    locals: Scopes<Local>,
    class: String,
    in_static: bool,
}

/// Run identification over the whole program.
pub fn identify(program: &Program) -> Result<ClassTable, CompileError> {
    let table = ClassTable::build(program)?;
    let mut resolver = Resolver { table: &table, locals: Scopes::new(), class: String::new(), in_static: false };
    for class in &program.classes {
        resolver.class_decl(&class.node)?;
    }
    debug!(classes = program.classes.len(), "identification complete");
    Ok(table)
}

impl Resolver<'_> {
    fn class_decl(&mut self, class: &ClassDecl) -> RResult<()> {
        self.class = class.name.node.clone();
        for field in &class.fields {
            self.check_type(&field.node.ty)?;
        }
        for method in &class.methods {
            self.method_decl(&method.node)?;
        }
        Ok(())
    }

    fn method_decl(&mut self, method: &MethodDecl) -> RResult<()> {
        self.check_type(&method.return_type)?;
        self.in_static = method.is_static;
        self.locals.push_scope();
        for param in &method.params {
            self.check_type(&param.node.ty)?;
            self.declare(&param.node.name, param.node.ty.node.clone(), false)?;
        }
        for stmt in &method.body {
            self.stmt(stmt)?;
        }
        self.locals.pop_scope();
        Ok(())
    }

    /// A class type must name a class in the global table.
    fn check_type(&self, ty: &Spanned<TypeDenoter>) -> RResult<()> {
        let mut inner = &ty.node;
        while let TypeDenoter::Array(elem) = inner {
            inner = elem;
        }
        match inner {
            TypeDenoter::Class(name) if !self.table.contains(name) => {
                Err(CompileError::ident(format!("undeclared class: {name}"), ty.span))
            }
            _ => Ok(()),
        }
    }

    fn declare(&mut self, name: &Spanned<String>, ty: TypeDenoter, initializing: bool) -> RResult<()> {
        if self.locals.define(&name.node, Local { ty, initializing }) {
            Ok(())
        } else {
            Err(CompileError::ident(format!("{} already exists in this scope", name.node), name.span))
        }
    }

    fn block(&mut self, stmts: &[Spanned<Stmt>]) -> RResult<()> {
        self.locals.push_scope();
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        self.locals.pop_scope();
        Ok(())
    }

    /// Body of an `if`/`else`/`while`. A bare declaration is rejected.
    fn branch(&mut self, stmt: &Spanned<Stmt>) -> RResult<()> {
        if matches!(stmt.node, Stmt::VarDecl { .. }) {
            return Err(CompileError::ident(
                "solitary variable declaration statement not permitted here",
                stmt.span,
            ));
        }
        self.stmt(stmt)
    }

    fn stmt(&mut self, stmt: &Spanned<Stmt>) -> RResult<()> {
        match &stmt.node {
            Stmt::Block(stmts) => self.block(stmts),
            Stmt::VarDecl { decl, init } => {
                self.check_type(&decl.ty)?;
                self.declare(&decl.name, decl.ty.node.clone(), true)?;
                self.expr(init)?;
                if let Some(local) = self.locals.lookup_mut(&decl.name.node) {
                    local.initializing = false;
                }
                Ok(())
            }
            Stmt::Assign { target, value } => {
                self.assign_target(target)?;
                self.expr(value)
            }
            Stmt::IndexAssign { target, index, value } => {
                self.value_ref(target)?;
                self.expr(index)?;
                self.expr(value)
            }
            Stmt::Call { method, args } => self.call(method, args),
            Stmt::Return(value) => match value {
                Some(e) => self.expr(e),
                None => Ok(()),
            },
            Stmt::If { cond, then_branch, else_branch } => {
                self.expr(cond)?;
                self.branch(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.branch(else_branch)?;
                }
                Ok(())
            }
            Stmt::While { cond, body } => {
                self.expr(cond)?;
                self.branch(body)
            }
        }
    }

    fn expr(&mut self, expr: &Spanned<Expr>) -> RResult<()> {
        match &expr.node {
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.expr(lhs)?;
                self.expr(rhs)
            }
            Expr::Ref(reference) => {
                self.value_ref(&Spanned::new(reference.clone(), expr.span))?;
                Ok(())
            }
            Expr::Index { target, index } => {
                self.value_ref(target)?;
                self.expr(index)
            }
            Expr::Call { method, args } => self.call(method, args),
            Expr::Literal(_) => Ok(()),
            Expr::NewObject(class) => self.check_type(&Spanned::new(TypeDenoter::Class(class.node.clone()), class.span)),
            Expr::NewArray { elem, size } => {
                self.check_type(elem)?;
                self.expr(size)
            }
        }
    }

    fn call(&mut self, method: &Spanned<Reference>, args: &[Spanned<Expr>]) -> RResult<()> {
        match self.resolve(method)? {
            Denotation::Method => {}
            Denotation::This => {
                return Err(CompileError::ident("this is not allowed as a method call", method.span));
            }
            _ => return Err(CompileError::ident(format!("{} is not a method", method.node), method.span)),
        }
        for arg in args {
            self.expr(arg)?;
        }
        Ok(())
    }

    fn assign_target(&mut self, target: &Spanned<Reference>) -> RResult<()> {
        match self.resolve(target)? {
            Denotation::Variable(_) | Denotation::Field(_) => Ok(()),
            Denotation::This => Err(CompileError::ident("cannot assign to this", target.span)),
            other => Err(not_a_value(&target.node, &other, target.span)),
        }
    }

    /// A reference read as a value: `this`, a variable, or a field.
    fn value_ref(&mut self, reference: &Spanned<Reference>) -> RResult<()> {
        match self.resolve(reference)? {
            Denotation::This | Denotation::Variable(_) | Denotation::Field(_) => Ok(()),
            other => Err(not_a_value(&reference.node, &other, reference.span)),
        }
    }

    fn resolve(&mut self, reference: &Spanned<Reference>) -> RResult<Denotation> {
        match &reference.node {
            Reference::This => {
                if self.in_static {
                    return Err(CompileError::ident("this cannot be used in a static method", reference.span));
                }
                Ok(Denotation::This)
            }
            Reference::Id(name) => self.resolve_id(name, reference.span),
            Reference::Qual { base, member } => {
                let (context, through_class) = match self.resolve(base)? {
                    Denotation::This => (self.class.clone(), false),
                    Denotation::Variable(ty) | Denotation::Field(ty) => match ty {
                        TypeDenoter::Class(name) => (name, false),
                        other => {
                            return Err(CompileError::ident(
                                format!("{} has type {other}, which has no member {}", base.node, member.node),
                                member.span,
                            ));
                        }
                    },
                    Denotation::Class(name) => (name, true),
                    Denotation::Method => {
                        return Err(CompileError::ident(
                            format!("method {} cannot be used as a value", base.node),
                            base.span,
                        ));
                    }
                };
                self.resolve_member(&context, member, through_class)
            }
        }
    }

    fn resolve_id(&self, name: &str, span: Span) -> RResult<Denotation> {
        if let Some(local) = self.locals.lookup(name) {
            if local.initializing {
                return Err(CompileError::ident(
                    format!("variable {name} cannot be used in its own initializer"),
                    span,
                ));
            }
            return Ok(Denotation::Variable(local.ty.clone()));
        }
        if let Some(field) = self.table.field(&self.class, name) {
            if self.in_static && !field.is_static {
                return Err(CompileError::ident(
                    format!("non-static field {name} cannot be referenced from a static context"),
                    span,
                ));
            }
            return Ok(Denotation::Field(field.ty.clone()));
        }
        if let Some(method) = self.table.method(&self.class, name) {
            if self.in_static && !method.is_static {
                return Err(CompileError::ident(
                    format!("non-static method {name} cannot be referenced from a static context"),
                    span,
                ));
            }
            return Ok(Denotation::Method);
        }
        if self.table.contains(name) {
            return Ok(Denotation::Class(name.to_string()));
        }
        Err(CompileError::ident(format!("declaration not found: {name}"), span))
    }

    fn resolve_member(&self, context: &str, member: &Spanned<String>, through_class: bool) -> RResult<Denotation> {
        let name = &member.node;
        let (owner, is_private, is_static, denotation) =
            if let Some(field) = self.table.field(context, name) {
                (&field.owner, field.is_private, field.is_static, Denotation::Field(field.ty.clone()))
            } else if let Some(method) = self.table.method(context, name) {
                (&method.owner, method.is_private, method.is_static, Denotation::Method)
            } else {
                return Err(CompileError::ident(
                    format!("declaration not found: {name} in class {context}"),
                    member.span,
                ));
            };

        if is_private && *owner != self.class {
            return Err(CompileError::ident(format!("{name} is private in class {context}"), member.span));
        }
        if through_class && !is_static {
            return Err(CompileError::ident(
                format!("non-static member {name} cannot be accessed through class {context}"),
                member.span,
            ));
        }
        Ok(denotation)
    }
}

fn not_a_value(reference: &Reference, denotation: &Denotation, span: Span) -> CompileError {
    let what = match denotation {
        Denotation::Class(_) => "class",
        Denotation::Method => "method",
        _ => "reference",
    };
    CompileError::ident(format!("{what} {reference} cannot be used as a value"), span)
}
