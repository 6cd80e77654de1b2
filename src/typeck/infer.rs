use crate::parser::ast::*;
use crate::span::Spanned;

use super::check::Checker;
use super::env::{assignable, comparable, MethodSig};

/// What a reference names, as seen by the type checker.
enum Target {
    Value(TypeDenoter),
    Class(String),
    Method(MethodSig),
}

impl Checker<'_> {
    pub(super) fn infer_expr(&mut self, expr: &Spanned<Expr>) -> TypeDenoter {
        match &expr.node {
            Expr::Literal(Literal::Int(_)) => TypeDenoter::Int,
            Expr::Literal(Literal::Bool(_)) => TypeDenoter::Boolean,
            Expr::Literal(Literal::Null) => TypeDenoter::Null,
            Expr::Unary { op, operand } => {
                let ty = self.infer_expr(operand);
                let expected = match op {
                    UnaryOp::Not => TypeDenoter::Boolean,
                    UnaryOp::Neg => TypeDenoter::Int,
                };
                if assignable(&expected, &ty) && ty != TypeDenoter::Null {
                    expected
                } else {
                    self.error(format!("operator {op} requires {expected}, found {ty}"), expr.span);
                    TypeDenoter::Unsupported
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let l = self.infer_expr(lhs);
                let r = self.infer_expr(rhs);
                self.binary(*op, &l, &r, expr)
            }
            Expr::Ref(reference) => self.value_type(&Spanned::new(reference.clone(), expr.span)),
            Expr::Index { target, index } => self.index_type(target, index),
            Expr::Call { method, args } => self.check_call(method, args),
            Expr::NewObject(class) => TypeDenoter::Class(class.node.clone()),
            Expr::NewArray { elem, size } => {
                let size_ty = self.infer_expr(size);
                if !assignable(&TypeDenoter::Int, &size_ty) {
                    self.error(format!("array size must be of type int, found {size_ty}"), size.span);
                }
                match &elem.node {
                    TypeDenoter::Int | TypeDenoter::Class(_) => TypeDenoter::array_of(elem.node.clone()),
                    other => {
                        self.error(format!("array element type must be int or a class, found {other}"), elem.span);
                        TypeDenoter::Unsupported
                    }
                }
            }
        }
    }

    fn binary(&mut self, op: BinOp, l: &TypeDenoter, r: &TypeDenoter, expr: &Spanned<Expr>) -> TypeDenoter {
        let is = |ty: &TypeDenoter, want: TypeDenoter| assignable(&want, ty) && *ty != TypeDenoter::Null;
        let (ok, result, rule) = match op {
            BinOp::And | BinOp::Or => (
                is(l, TypeDenoter::Boolean) && is(r, TypeDenoter::Boolean),
                TypeDenoter::Boolean,
                "both sides must be of type boolean",
            ),
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => (
                is(l, TypeDenoter::Int) && is(r, TypeDenoter::Int),
                TypeDenoter::Boolean,
                "both sides must be of type int",
            ),
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => (
                is(l, TypeDenoter::Int) && is(r, TypeDenoter::Int),
                TypeDenoter::Int,
                "both sides must be of type int",
            ),
            BinOp::Eq | BinOp::Neq => (comparable(l, r), TypeDenoter::Boolean, "both sides must have the same type"),
        };
        if ok {
            result
        } else {
            self.error(format!("for {op}, {rule} (found {l} and {r})"), expr.span);
            TypeDenoter::Unsupported
        }
    }

    /// Type of a reference read or written as a value.
    pub(super) fn value_type(&mut self, reference: &Spanned<Reference>) -> TypeDenoter {
        match self.target(&reference.node) {
            Some(Target::Value(ty)) => ty,
            _ => TypeDenoter::Unsupported,
        }
    }

    /// Check a call's arity and argument types; returns the callee's return type.
    pub(super) fn check_call(&mut self, method: &Spanned<Reference>, args: &[Spanned<Expr>]) -> TypeDenoter {
        let arg_types: Vec<TypeDenoter> = args.iter().map(|a| self.infer_expr(a)).collect();
        let Some(Target::Method(sig)) = self.target(&method.node) else {
            return TypeDenoter::Unsupported;
        };

        if sig.params.len() != arg_types.len() {
            self.error(
                format!(
                    "method {} expects {} argument(s), found {}",
                    method.node,
                    sig.params.len(),
                    arg_types.len()
                ),
                method.span,
            );
            return sig.return_type;
        }
        for (i, ((param, actual), arg)) in sig.params.iter().zip(&arg_types).zip(args).enumerate() {
            if !assignable(param, actual) {
                self.error(
                    format!("argument {} of {}: expected {param}, found {actual}", i + 1, method.node),
                    arg.span,
                );
            }
        }
        sig.return_type
    }

    /// Names are looked up in locals and parameters, then the current class,
    /// then the class table. Qualified members use the class of the
    /// previous segment's type.
    fn target(&self, reference: &Reference) -> Option<Target> {
        match reference {
            Reference::This => Some(Target::Value(TypeDenoter::Class(self.class.clone()))),
            Reference::Id(name) => {
                if let Some(ty) = self.locals.lookup(name) {
                    return Some(Target::Value(ty.clone()));
                }
                self.member(&self.class, name).or_else(|| {
                    self.table.contains(name).then(|| Target::Class(name.clone()))
                })
            }
            Reference::Qual { base, member } => {
                let context = match self.target(&base.node)? {
                    Target::Value(TypeDenoter::Class(name)) | Target::Class(name) => name,
                    _ => return None,
                };
                self.member(&context, &member.node)
            }
        }
    }

    fn member(&self, class: &str, name: &str) -> Option<Target> {
        if let Some(field) = self.table.field(class, name) {
            return Some(Target::Value(field.ty.clone()));
        }
        self.table.method(class, name).map(|sig| Target::Method(sig.clone()))
    }
}
