use std::fmt;

use crate::span::Spanned;

#[derive(Debug, Clone)]
pub struct Program {
    pub classes: Vec<Spanned<ClassDecl>>,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Spanned<String>,
    pub fields: Vec<Spanned<FieldDecl>>,
    pub methods: Vec<Spanned<MethodDecl>>,
}

impl ClassDecl {
    pub fn field(&self, name: &str) -> Option<&Spanned<FieldDecl>> {
        self.fields.iter().find(|f| f.node.name.node == name)
    }

    pub fn method(&self, name: &str) -> Option<&Spanned<MethodDecl>> {
        self.methods.iter().find(|m| m.node.name.node == name)
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub is_private: bool,
    pub is_static: bool,
    pub ty: Spanned<TypeDenoter>,
    pub name: Spanned<String>,
    /// Name of the declaring class.
    pub owner: String,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub is_private: bool,
    pub is_static: bool,
    pub return_type: Spanned<TypeDenoter>,
    pub name: Spanned<String>,
    pub owner: String,
    pub params: Vec<Spanned<ParamDecl>>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub ty: Spanned<TypeDenoter>,
    pub name: Spanned<String>,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub ty: Spanned<TypeDenoter>,
    pub name: Spanned<String>,
}

/// Structural type. `PartialEq` is the structural equality the checker uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDenoter {
    Int,
    Boolean,
    Void,
    Null,
    /// Result of an ill-typed expression; compatible with everything.
    Unsupported,
    Class(String),
    Array(Box<TypeDenoter>),
}

impl TypeDenoter {
    pub fn array_of(elem: TypeDenoter) -> Self {
        TypeDenoter::Array(Box::new(elem))
    }
}

impl fmt::Display for TypeDenoter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDenoter::Int => write!(f, "int"),
            TypeDenoter::Boolean => write!(f, "boolean"),
            TypeDenoter::Void => write!(f, "void"),
            TypeDenoter::Null => write!(f, "null"),
            TypeDenoter::Unsupported => write!(f, "<error>"),
            TypeDenoter::Class(name) => write!(f, "{name}"),
            TypeDenoter::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<Spanned<Stmt>>),
    VarDecl {
        decl: VarDecl,
        init: Spanned<Expr>,
    },
    Assign {
        target: Spanned<Reference>,
        value: Spanned<Expr>,
    },
    IndexAssign {
        target: Spanned<Reference>,
        index: Spanned<Expr>,
        value: Spanned<Expr>,
    },
    Call {
        method: Spanned<Reference>,
        args: Vec<Spanned<Expr>>,
    },
    Return(Option<Spanned<Expr>>),
    If {
        cond: Spanned<Expr>,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Option<Box<Spanned<Stmt>>>,
    },
    While {
        cond: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
}

#[derive(Debug, Clone)]
pub enum Expr {
    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Ref(Reference),
    Index {
        target: Spanned<Reference>,
        index: Box<Spanned<Expr>>,
    },
    Call {
        method: Spanned<Reference>,
        args: Vec<Spanned<Expr>>,
    },
    Literal(Literal),
    NewObject(Spanned<String>),
    NewArray {
        elem: Spanned<TypeDenoter>,
        size: Box<Spanned<Expr>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    This,
    Id(String),
    Qual {
        base: Box<Spanned<Reference>>,
        member: Spanned<String>,
    },
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::This => write!(f, "this"),
            Reference::Id(name) => write!(f, "{name}"),
            Reference::Qual { base, member } => write!(f, "{}.{}", base.node, member.node),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Int(i32),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}
