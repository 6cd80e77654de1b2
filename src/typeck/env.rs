use std::collections::{HashMap, HashSet};

use crate::diagnostics::CompileError;
use crate::parser::ast::{ClassDecl, Program, TypeDenoter};
use crate::span::{Span, Spanned};

pub const STRING_CLASS: &str = "String";
pub const PRINT_STREAM_CLASS: &str = "_PrintStream";
pub const SYSTEM_CLASS: &str = "System";

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub ty: TypeDenoter,
    pub is_private: bool,
    pub is_static: bool,
    pub owner: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MethodSig {
    pub params: Vec<TypeDenoter>,
    pub return_type: TypeDenoter,
    pub is_private: bool,
    pub is_static: bool,
    pub owner: String,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    /// Declaration order; instance field offsets follow it.
    pub fields: Vec<(String, FieldInfo)>,
    pub methods: HashMap<String, MethodSig>,
}

impl ClassInfo {
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Byte size of an instance: one 8-byte slot per non-static field.
    pub fn instance_size(&self) -> usize {
        8 * self.fields.iter().filter(|(_, f)| !f.is_static).count()
    }

    /// Byte offset of a non-static field inside an instance.
    pub fn field_offset(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .filter(|(_, f)| !f.is_static)
            .position(|(n, _)| n == name)
            .map(|slot| slot * 8)
    }
}

/// The global scope: built-in classes plus every user class with its members.
#[derive(Debug, Clone)]
pub struct ClassTable {
    classes: HashMap<String, ClassInfo>,
}

impl ClassTable {
    /// Build the table. Duplicate class names and duplicate member names
    /// within one class are identification errors.
    pub fn build(program: &Program) -> Result<Self, CompileError> {
        let mut table = Self { classes: builtin_classes() };
        for class in &program.classes {
            let name = &class.node.name;
            if table.classes.contains_key(&name.node) {
                return Err(CompileError::ident(
                    format!("{} already exists in this scope", name.node),
                    name.span,
                ));
            }
            let info = class_info(&class.node)?;
            table.classes.insert(name.node.clone(), info);
        }
        Ok(table)
    }

    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn field(&self, class: &str, name: &str) -> Option<&FieldInfo> {
        self.classes.get(class)?.field(name)
    }

    pub fn method(&self, class: &str, name: &str) -> Option<&MethodSig> {
        self.classes.get(class)?.methods.get(name)
    }
}

fn class_info(class: &ClassDecl) -> Result<ClassInfo, CompileError> {
    let mut info = ClassInfo::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut claim = |name: &Spanned<String>| -> Result<(), CompileError> {
        if !seen.insert(name.node.clone()) {
            return Err(CompileError::ident(
                format!("{} already exists in this scope", name.node),
                name.span,
            ));
        }
        Ok(())
    };

    for field in &class.fields {
        let f = &field.node;
        claim(&f.name)?;
        info.fields.push((
            f.name.node.clone(),
            FieldInfo {
                ty: f.ty.node.clone(),
                is_private: f.is_private,
                is_static: f.is_static,
                owner: f.owner.clone(),
                span: f.name.span,
            },
        ));
    }
    for method in &class.methods {
        let m = &method.node;
        claim(&m.name)?;
        info.methods.insert(
            m.name.node.clone(),
            MethodSig {
                params: m.params.iter().map(|p| p.node.ty.node.clone()).collect(),
                return_type: m.return_type.node.clone(),
                is_private: m.is_private,
                is_static: m.is_static,
                owner: m.owner.clone(),
                span: m.name.span,
            },
        );
    }
    Ok(info)
}

fn builtin_classes() -> HashMap<String, ClassInfo> {
    let mut classes = HashMap::new();

    classes.insert(STRING_CLASS.to_string(), ClassInfo::default());

    let mut print_stream = ClassInfo::default();
    print_stream.methods.insert(
        "println".to_string(),
        MethodSig {
            params: vec![TypeDenoter::Int],
            return_type: TypeDenoter::Void,
            is_private: false,
            is_static: false,
            owner: PRINT_STREAM_CLASS.to_string(),
            span: Span::dummy(),
        },
    );
    classes.insert(PRINT_STREAM_CLASS.to_string(), print_stream);

    let mut system = ClassInfo::default();
    system.fields.push((
        "out".to_string(),
        FieldInfo {
            ty: TypeDenoter::Class(PRINT_STREAM_CLASS.to_string()),
            is_private: false,
            is_static: true,
            owner: SYSTEM_CLASS.to_string(),
            span: Span::dummy(),
        },
    ));
    classes.insert(SYSTEM_CLASS.to_string(), system);

    classes
}

/// Stack of nested name scopes, innermost last.
#[derive(Debug, Clone)]
pub struct Scopes<T> {
    scopes: Vec<HashMap<String, T>>,
}

impl<T> Default for Scopes<T> {
    fn default() -> Self {
        Self { scopes: Vec::new() }
    }
}

impl<T> Scopes<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) -> Option<HashMap<String, T>> {
        self.scopes.pop()
    }

    /// Define `name` in the innermost scope. Returns false if the innermost
    /// scope already has it.
    pub fn define(&mut self, name: &str, value: T) -> bool {
        let Some(scope) = self.scopes.last_mut() else {
            return false;
        };
        if scope.contains_key(name) {
            return false;
        }
        scope.insert(name.to_string(), value);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut T> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(name))
    }
}

/// Assignment compatibility: structural equality, `null` into any class or
/// array, and the error type accepted everywhere.
pub fn assignable(target: &TypeDenoter, value: &TypeDenoter) -> bool {
    match (target, value) {
        (TypeDenoter::Unsupported, _) | (_, TypeDenoter::Unsupported) => true,
        (TypeDenoter::Class(_) | TypeDenoter::Array(_), TypeDenoter::Null) => true,
        (TypeDenoter::Array(a), TypeDenoter::Array(b)) => assignable(a, b),
        _ => target == value,
    }
}

/// Operand compatibility for `==` and `!=`. `void` has no value to compare.
pub fn comparable(a: &TypeDenoter, b: &TypeDenoter) -> bool {
    if *a == TypeDenoter::Void || *b == TypeDenoter::Void {
        return false;
    }
    assignable(a, b) || assignable(b, a)
}
