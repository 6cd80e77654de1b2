use std::collections::HashMap;

use tracing::debug;

use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::Spanned;
use crate::typeck::env::{ClassTable, Scopes, PRINT_STREAM_CLASS, SYSTEM_CLASS};

use super::runtime::{emit_exit, emit_mmap, RuntimeRegistry, POINTER_SIZE};
use super::x64::{AluOp, Assembler, Cond, Instr, Mem, Reg, UNPATCHED};

type LResult<T> = Result<T, CompileError>;

/// What a lowered reference left on top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackTop {
    /// The address of a variable, field or static slot.
    Address,
    /// The value itself.
    Value,
}

#[derive(Debug, Clone)]
struct Slot {
    /// Displacement from rbp.
    offset: i32,
    ty: TypeDenoter,
}

/// Who receives an instance call.
enum Receiver<'r> {
    CurrentThis,
    Base(&'r Spanned<Reference>),
}

struct LowerContext<'a> {
    asm: Assembler,
    table: &'a ClassTable,
    /// (class, field) → displacement from r15 of the static slot.
    statics: HashMap<(String, String), i32>,
    /// (class, method) → entry instruction index.
    method_entries: HashMap<(String, String), usize>,
    pending_calls: Vec<(usize, (String, String))>,
    println_calls: Vec<usize>,

    // Per-method state.
    class: String,
    frame: Scopes<Slot>,
    locals: i32,
    this_offset: Option<i32>,
}

/// Lower the whole program to machine code. The entry stub is the first
/// instruction: it lays out the static area, calls `main`, and exits.
pub fn lower_program(program: &Program, table: &ClassTable, main: &(String, String)) -> LResult<Vec<u8>> {
    let mut ctx = LowerContext {
        asm: Assembler::new(),
        table,
        statics: HashMap::new(),
        method_entries: HashMap::new(),
        pending_calls: Vec::new(),
        println_calls: Vec::new(),
        class: String::new(),
        frame: Scopes::new(),
        locals: 0,
        this_offset: None,
    };

    ctx.layout_statics(program);
    ctx.emit_entry(main);
    for class in &program.classes {
        ctx.class = class.node.name.node.clone();
        for method in &class.node.methods {
            ctx.lower_method(&method.node)?;
        }
    }
    let runtime = RuntimeRegistry::emit(&mut ctx.asm);
    ctx.resolve_calls(runtime)?;

    debug!(instructions = ctx.asm.len(), "lowered program");
    ctx.asm.assemble()
}

impl LowerContext<'_> {
    fn emit(&mut self, instr: Instr) -> usize {
        self.asm.emit(instr)
    }

    fn push_rax(&mut self) {
        self.emit(Instr::PushReg(Reg::Rax));
    }

    fn pop(&mut self, reg: Reg) {
        self.emit(Instr::PopReg(reg));
    }

    fn drop_words(&mut self, words: usize) {
        if words > 0 {
            self.emit(Instr::AluImm { op: AluOp::Add, dst: Reg::Rsp, imm: POINTER_SIZE * words as i32 });
        }
    }

    fn epilogue(&mut self) {
        self.emit(Instr::MovRegReg { dst: Reg::Rsp, src: Reg::Rbp });
        self.emit(Instr::PopReg(Reg::Rbp));
        self.emit(Instr::Ret);
    }

    /// One slot per static field, System.out first, then user classes in
    /// declaration order. Slot i lives at [r15 - 8(i+1)].
    fn layout_statics(&mut self, program: &Program) {
        let mut keys = vec![(SYSTEM_CLASS.to_string(), "out".to_string())];
        for class in &program.classes {
            for field in class.node.fields.iter().filter(|f| f.node.is_static) {
                keys.push((class.node.name.node.clone(), field.node.name.node.clone()));
            }
        }
        for (i, key) in keys.into_iter().enumerate() {
            self.statics.insert(key, -POINTER_SIZE * (i as i32 + 1));
        }
    }

    fn emit_entry(&mut self, main: &(String, String)) {
        self.emit(Instr::MovRegReg { dst: Reg::R15, src: Reg::Rsp });
        for _ in 0..self.statics.len() {
            self.emit(Instr::PushImm(0));
        }
        // args
        self.emit(Instr::PushImm(0));
        let call = self.emit(Instr::Call(UNPATCHED));
        self.pending_calls.push((call, main.clone()));
        emit_exit(&mut self.asm);
    }

    fn resolve_calls(&mut self, runtime: RuntimeRegistry) -> LResult<()> {
        for (at, key) in std::mem::take(&mut self.pending_calls) {
            let target = self.method_entries.get(&key).copied().ok_or_else(|| {
                CompileError::codegen(format!("no code generated for method {}.{}", key.0, key.1))
            })?;
            self.asm.patch(at, target);
        }
        for at in std::mem::take(&mut self.println_calls) {
            self.asm.patch(at, runtime.println);
        }
        Ok(())
    }

    // ── methods and statements ────────────────────────────────────

    fn lower_method(&mut self, method: &MethodDecl) -> LResult<()> {
        let entry = self.asm.here();
        self.method_entries.insert((self.class.clone(), method.name.node.clone()), entry);

        let n = method.params.len() as i32;
        self.this_offset = (!method.is_static).then_some(2 * POINTER_SIZE + POINTER_SIZE * n);
        self.frame = Scopes::new();
        self.frame.push_scope();
        for (i, param) in method.params.iter().enumerate() {
            let offset = 2 * POINTER_SIZE + POINTER_SIZE * (n - 1 - i as i32);
            self.frame.define(&param.node.name.node, Slot { offset, ty: param.node.ty.node.clone() });
        }
        self.locals = 0;

        self.emit(Instr::PushReg(Reg::Rbp));
        self.emit(Instr::MovRegReg { dst: Reg::Rbp, src: Reg::Rsp });
        for stmt in &method.body {
            self.lower_stmt(stmt)?;
        }
        self.epilogue();

        debug!(class = %self.class, method = %method.name.node, entry, "lowered method");
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Spanned<Stmt>) -> LResult<()> {
        match &stmt.node {
            Stmt::Block(stmts) => {
                self.frame.push_scope();
                for s in stmts {
                    self.lower_stmt(s)?;
                }
                let declared = self.frame.pop_scope().map_or(0, |scope| scope.len());
                self.drop_words(declared);
                self.locals -= declared as i32;
            }
            Stmt::VarDecl { decl, init } => {
                // The initializer's value becomes the local's slot.
                self.lower_expr(init)?;
                self.locals += 1;
                let offset = -POINTER_SIZE * self.locals;
                self.frame.define(&decl.name.node, Slot { offset, ty: decl.ty.node.clone() });
            }
            Stmt::Assign { target, value } => {
                if self.lower_ref(target)? != StackTop::Address {
                    return Err(CompileError::codegen_at(format!("cannot assign to {}", target.node), target.span));
                }
                self.lower_expr(value)?;
                self.pop(Reg::Rcx);
                self.pop(Reg::Rax);
                self.emit(Instr::MovMemReg { dst: Mem::new(Reg::Rax, 0), src: Reg::Rcx });
            }
            Stmt::IndexAssign { target, index, value } => {
                self.lower_value_ref(target)?;
                self.lower_expr(index)?;
                self.lower_expr(value)?;
                self.pop(Reg::Rdx);
                self.pop(Reg::Rcx);
                self.pop(Reg::Rax);
                self.element_address();
                self.emit(Instr::MovMemReg { dst: Mem::new(Reg::Rax, POINTER_SIZE), src: Reg::Rdx });
            }
            Stmt::Call { method, args } => self.lower_call(method, args)?,
            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.lower_expr(value)?;
                    self.pop(Reg::Rax);
                }
                self.epilogue();
            }
            Stmt::If { cond, then_branch, else_branch } => {
                self.lower_condition(cond)?;
                let to_else = self.emit(Instr::Jcc(Cond::E, UNPATCHED));
                self.lower_stmt(then_branch)?;
                match else_branch {
                    Some(else_branch) => {
                        let to_end = self.emit(Instr::Jmp(UNPATCHED));
                        let else_start = self.asm.here();
                        self.asm.patch(to_else, else_start);
                        self.lower_stmt(else_branch)?;
                        let end = self.asm.here();
                        self.asm.patch(to_end, end);
                    }
                    None => {
                        let end = self.asm.here();
                        self.asm.patch(to_else, end);
                    }
                }
            }
            Stmt::While { cond, body } => {
                let top = self.asm.here();
                self.lower_condition(cond)?;
                let to_end = self.emit(Instr::Jcc(Cond::E, UNPATCHED));
                self.lower_stmt(body)?;
                self.emit(Instr::Jmp(top));
                let end = self.asm.here();
                self.asm.patch(to_end, end);
            }
        }
        Ok(())
    }

    /// Evaluate a condition and compare it with zero; `je` skips the body.
    fn lower_condition(&mut self, cond: &Spanned<Expr>) -> LResult<()> {
        self.lower_expr(cond)?;
        self.pop(Reg::Rax);
        self.emit(Instr::AluImm { op: AluOp::Cmp, dst: Reg::Rax, imm: 0 });
        Ok(())
    }

    /// rax = array base, rcx = index → rax = address of the element minus the length slot.
    fn element_address(&mut self) {
        self.emit(Instr::ShlImm { dst: Reg::Rcx, imm: 3 });
        self.emit(Instr::Alu { op: AluOp::Add, dst: Reg::Rax, src: Reg::Rcx });
    }

    // ── expressions ───────────────────────────────────────────────

    /// Evaluate an expression, leaving exactly one word on the stack.
    fn lower_expr(&mut self, expr: &Spanned<Expr>) -> LResult<()> {
        match &expr.node {
            Expr::Literal(lit) => {
                let value = match lit {
                    Literal::Int(n) => *n,
                    Literal::Bool(b) => i32::from(*b),
                    Literal::Null => 0,
                };
                self.emit(Instr::PushImm(value));
            }
            Expr::Unary { op, operand } => {
                self.lower_expr(operand)?;
                self.pop(Reg::Rax);
                match op {
                    UnaryOp::Neg => self.emit(Instr::Neg(Reg::Rax)),
                    UnaryOp::Not => self.emit(Instr::AluImm { op: AluOp::Xor, dst: Reg::Rax, imm: 1 }),
                };
                self.push_rax();
            }
            Expr::Binary { op, lhs, rhs } => {
                self.lower_expr(lhs)?;
                self.lower_expr(rhs)?;
                self.pop(Reg::Rcx);
                self.pop(Reg::Rax);
                self.lower_binop(*op);
                self.push_rax();
            }
            Expr::Ref(reference) => self.lower_value_ref(&Spanned::new(reference.clone(), expr.span))?,
            Expr::Index { target, index } => {
                self.lower_value_ref(target)?;
                self.lower_expr(index)?;
                self.pop(Reg::Rcx);
                self.pop(Reg::Rax);
                self.element_address();
                self.emit(Instr::MovRegMem { dst: Reg::Rax, src: Mem::new(Reg::Rax, POINTER_SIZE) });
                self.push_rax();
            }
            Expr::Call { method, args } => {
                self.lower_call(method, args)?;
                self.push_rax();
            }
            Expr::NewObject(class) => {
                let size = self
                    .table
                    .class(&class.node)
                    .map_or(0, |info| info.instance_size())
                    .max(POINTER_SIZE as usize);
                self.emit(Instr::MovRegImm { dst: Reg::Rsi, imm: size as i64 });
                emit_mmap(&mut self.asm);
                self.push_rax();
            }
            Expr::NewArray { size, .. } => {
                // (n + 1) words: the length, then the elements
                self.lower_expr(size)?;
                self.emit(Instr::MovRegMem { dst: Reg::Rax, src: Mem::new(Reg::Rsp, 0) });
                self.emit(Instr::AluImm { op: AluOp::Add, dst: Reg::Rax, imm: 1 });
                self.emit(Instr::ShlImm { dst: Reg::Rax, imm: 3 });
                self.emit(Instr::MovRegReg { dst: Reg::Rsi, src: Reg::Rax });
                emit_mmap(&mut self.asm);
                self.pop(Reg::Rcx);
                self.emit(Instr::MovMemReg { dst: Mem::new(Reg::Rax, 0), src: Reg::Rcx });
                self.push_rax();
            }
        }
        Ok(())
    }

    /// rax = rax op rcx
    fn lower_binop(&mut self, op: BinOp) {
        let cond = match op {
            BinOp::Add => return self.alu(AluOp::Add),
            BinOp::Sub => return self.alu(AluOp::Sub),
            BinOp::And => return self.alu(AluOp::And),
            BinOp::Or => return self.alu(AluOp::Or),
            BinOp::Mul => {
                self.emit(Instr::Imul { dst: Reg::Rax, src: Reg::Rcx });
                return;
            }
            BinOp::Div => {
                self.emit(Instr::Cqo);
                self.emit(Instr::Idiv(Reg::Rcx));
                return;
            }
            BinOp::Eq => Cond::E,
            BinOp::Neq => Cond::Ne,
            BinOp::Lt => Cond::L,
            BinOp::LtEq => Cond::Le,
            BinOp::Gt => Cond::G,
            BinOp::GtEq => Cond::Ge,
        };
        self.emit(Instr::Alu { op: AluOp::Cmp, dst: Reg::Rax, src: Reg::Rcx });
        self.emit(Instr::Setcc { cond, dst: Reg::Rax });
        self.emit(Instr::MovzxByte { dst: Reg::Rax, src: Reg::Rax });
    }

    fn alu(&mut self, op: AluOp) {
        self.emit(Instr::Alu { op, dst: Reg::Rax, src: Reg::Rcx });
    }

    /// Call a method, leaving its result in rax. The receiver of an
    /// instance call is pushed first, then the arguments left to right.
    fn lower_call(&mut self, method: &Spanned<Reference>, args: &[Spanned<Expr>]) -> LResult<()> {
        let (class, name, receiver) = match &method.node {
            Reference::Id(name) => (self.class.clone(), name.as_str(), Receiver::CurrentThis),
            Reference::Qual { base, member } => {
                (self.static_class_of(base)?, member.node.as_str(), Receiver::Base(&**base))
            }
            Reference::This => {
                return Err(CompileError::codegen_at("this is not a method", method.span));
            }
        };
        let sig = self
            .table
            .method(&class, name)
            .cloned()
            .ok_or_else(|| CompileError::codegen_at(format!("unknown method {}", method.node), method.span))?;

        if sig.owner == PRINT_STREAM_CLASS && name == "println" {
            for arg in args {
                self.lower_expr(arg)?;
            }
            let call = self.emit(Instr::Call(UNPATCHED));
            self.println_calls.push(call);
            self.drop_words(args.len());
            return Ok(());
        }

        let mut words = args.len();
        if !sig.is_static {
            match receiver {
                Receiver::CurrentThis => self.push_this(method)?,
                Receiver::Base(base) => self.lower_value_ref(base)?,
            }
            words += 1;
        }
        for arg in args {
            self.lower_expr(arg)?;
        }
        let call = self.emit(Instr::Call(UNPATCHED));
        self.pending_calls.push((call, (sig.owner.clone(), name.to_string())));
        self.drop_words(words);
        Ok(())
    }

    fn push_this(&mut self, at: &Spanned<Reference>) -> LResult<()> {
        let offset = self
            .this_offset
            .ok_or_else(|| CompileError::codegen_at("this used in a static method", at.span))?;
        self.emit(Instr::PushMem(Mem::new(Reg::Rbp, offset)));
        Ok(())
    }

    fn lower_value_ref(&mut self, reference: &Spanned<Reference>) -> LResult<()> {
        if self.lower_ref(reference)? == StackTop::Address {
            self.pop(Reg::Rax);
            self.emit(Instr::MovRegMem { dst: Reg::Rax, src: Mem::new(Reg::Rax, 0) });
            self.push_rax();
        }
        Ok(())
    }

    /// Push the address of a variable or field, or the value of `this`.
    fn lower_ref(&mut self, reference: &Spanned<Reference>) -> LResult<StackTop> {
        match &reference.node {
            Reference::This => {
                self.push_this(reference)?;
                Ok(StackTop::Value)
            }
            Reference::Id(name) => {
                if let Some(slot) = self.frame.lookup(name) {
                    let offset = slot.offset;
                    self.emit(Instr::Lea { dst: Reg::Rax, src: Mem::new(Reg::Rbp, offset) });
                    self.push_rax();
                    return Ok(StackTop::Address);
                }
                let class = self.class.clone();
                self.field_address(&class, name, None, reference)
            }
            Reference::Qual { base, member } => {
                let class = self.static_class_of(base)?;
                self.field_address(&class, &member.node, Some(&**base), reference)
            }
        }
    }

    /// Address of field `name` of `class`. Instance fields are reached through
    /// `base` (or the current `this` when `base` is None).
    fn field_address(
        &mut self,
        class: &str,
        name: &str,
        base: Option<&Spanned<Reference>>,
        at: &Spanned<Reference>,
    ) -> LResult<StackTop> {
        let table = self.table;
        let field = table
            .field(class, name)
            .ok_or_else(|| CompileError::codegen_at(format!("{} is not a field", at.node), at.span))?;

        if field.is_static {
            let key = (class.to_string(), name.to_string());
            let disp = self.statics.get(&key).copied().ok_or_else(|| {
                CompileError::codegen_at(format!("no static slot for {class}.{name}"), at.span)
            })?;
            self.emit(Instr::Lea { dst: Reg::Rax, src: Mem::new(Reg::R15, disp) });
            self.push_rax();
            return Ok(StackTop::Address);
        }

        let offset = table
            .class(class)
            .and_then(|info| info.field_offset(name))
            .ok_or_else(|| CompileError::codegen_at(format!("no layout for {class}.{name}"), at.span))?;
        match base {
            Some(base) => self.lower_value_ref(base)?,
            None => self.push_this(at)?,
        }
        self.pop(Reg::Rax);
        self.emit(Instr::Lea { dst: Reg::Rax, src: Mem::new(Reg::Rax, offset as i32) });
        self.push_rax();
        Ok(StackTop::Address)
    }

    /// The class a reference navigates into: the class of its declared type,
    /// or the class itself when the reference is a class name.
    fn static_class_of(&self, reference: &Spanned<Reference>) -> LResult<String> {
        let ty = match &reference.node {
            Reference::This => return Ok(self.class.clone()),
            Reference::Id(name) => {
                if let Some(slot) = self.frame.lookup(name) {
                    slot.ty.clone()
                } else if let Some(field) = self.table.field(&self.class, name) {
                    field.ty.clone()
                } else if self.table.contains(name) {
                    return Ok(name.clone());
                } else {
                    TypeDenoter::Unsupported
                }
            }
            Reference::Qual { base, member } => {
                let class = self.static_class_of(base)?;
                self.table
                    .field(&class, &member.node)
                    .map_or(TypeDenoter::Unsupported, |f| f.ty.clone())
            }
        };
        match ty {
            TypeDenoter::Class(name) => Ok(name),
            _ => Err(CompileError::codegen_at(
                format!("{} does not refer to an object", reference.node),
                reference.span,
            )),
        }
    }
}
