//! x86-64 instruction records and their machine encoding.
//!
//! Branch and call targets are instruction indices. A branch emitted before
//! its target is known carries `UNPATCHED` until [`Assembler::patch`] fills it
//! in; byte displacements are only computed in [`Assembler::assemble`].

use crate::diagnostics::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Rax = 0,
    Rcx,
    Rdx,
    Rbx,
    Rsp,
    Rbp,
    Rsi,
    Rdi,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
}

impl Reg {
    fn low(self) -> u8 {
        self as u8 & 7
    }

    fn ext(self) -> u8 {
        (self as u8 >> 3) & 1
    }
}

/// `[base + disp]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mem {
    pub base: Reg,
    pub disp: i32,
}

impl Mem {
    pub fn new(base: Reg, disp: i32) -> Self {
        Self { base, disp }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    E = 0x4,
    Ne = 0x5,
    L = 0xC,
    Ge = 0xD,
    Le = 0xE,
    G = 0xF,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Or,
    And,
    Sub,
    Xor,
    Cmp,
}

impl AluOp {
    /// Opcode of the `r/m64, r64` form.
    fn rm_r(self) -> u8 {
        match self {
            AluOp::Add => 0x01,
            AluOp::Or => 0x09,
            AluOp::And => 0x21,
            AluOp::Sub => 0x29,
            AluOp::Xor => 0x31,
            AluOp::Cmp => 0x39,
        }
    }

    /// ModRM reg digit of the `81 /digit` immediate form.
    fn digit(self) -> u8 {
        match self {
            AluOp::Add => 0,
            AluOp::Or => 1,
            AluOp::And => 4,
            AluOp::Sub => 5,
            AluOp::Xor => 6,
            AluOp::Cmp => 7,
        }
    }
}

pub const UNPATCHED: usize = usize::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    PushReg(Reg),
    PushImm(i32),
    PushMem(Mem),
    PopReg(Reg),
    MovRegReg { dst: Reg, src: Reg },
    MovRegMem { dst: Reg, src: Mem },
    MovMemReg { dst: Mem, src: Reg },
    MovRegImm { dst: Reg, imm: i64 },
    MovByteMemImm { dst: Mem, imm: u8 },
    MovByteMemReg { dst: Mem, src: Reg },
    Lea { dst: Reg, src: Mem },
    Alu { op: AluOp, dst: Reg, src: Reg },
    AluImm { op: AluOp, dst: Reg, imm: i32 },
    Imul { dst: Reg, src: Reg },
    Idiv(Reg),
    Div(Reg),
    Neg(Reg),
    ShlImm { dst: Reg, imm: u8 },
    Cqo,
    Setcc { cond: Cond, dst: Reg },
    MovzxByte { dst: Reg, src: Reg },
    Jmp(usize),
    Jcc(Cond, usize),
    Call(usize),
    Ret,
    Syscall,
}

fn rex(w: bool, r: Reg, b: Reg) -> u8 {
    0x40 | (u8::from(w) << 3) | (r.ext() << 2) | b.ext()
}

fn modrm_reg(reg: u8, rm: Reg) -> u8 {
    0xC0 | (reg << 3) | rm.low()
}

fn modrm_mem(out: &mut Vec<u8>, reg: u8, mem: Mem) {
    let base = mem.base.low();
    let mode = if mem.disp == 0 && base != 5 {
        0
    } else if i8::try_from(mem.disp).is_ok() {
        1
    } else {
        2
    };
    out.push((mode << 6) | (reg << 3) | base);
    if base == 4 {
        // rsp/r12 as base needs a SIB byte with no index
        out.push(0x24);
    }
    match mode {
        1 => out.push(mem.disp as i8 as u8),
        2 => out.extend_from_slice(&mem.disp.to_le_bytes()),
        _ => {}
    }
}

impl Instr {
    /// Encode one instruction. `rel` maps a target index to the rel32
    /// displacement from the end of this instruction.
    fn encode(&self, out: &mut Vec<u8>, rel: impl Fn(usize, usize) -> i32) {
        match *self {
            Instr::PushReg(r) => {
                if r.ext() == 1 {
                    out.push(0x41);
                }
                out.push(0x50 + r.low());
            }
            Instr::PushImm(imm) => {
                out.push(0x68);
                out.extend_from_slice(&imm.to_le_bytes());
            }
            Instr::PushMem(mem) => {
                if mem.base.ext() == 1 {
                    out.push(0x41);
                }
                out.push(0xFF);
                modrm_mem(out, 6, mem);
            }
            Instr::PopReg(r) => {
                if r.ext() == 1 {
                    out.push(0x41);
                }
                out.push(0x58 + r.low());
            }
            Instr::MovRegReg { dst, src } => {
                out.extend_from_slice(&[rex(true, src, dst), 0x89, modrm_reg(src.low(), dst)]);
            }
            Instr::MovRegMem { dst, src } => {
                out.extend_from_slice(&[rex(true, dst, src.base), 0x8B]);
                modrm_mem(out, dst.low(), src);
            }
            Instr::MovMemReg { dst, src } => {
                out.extend_from_slice(&[rex(true, src, dst.base), 0x89]);
                modrm_mem(out, src.low(), dst);
            }
            Instr::MovRegImm { dst, imm } => match i32::try_from(imm) {
                Ok(imm32) => {
                    out.extend_from_slice(&[rex(true, Reg::Rax, dst), 0xC7, modrm_reg(0, dst)]);
                    out.extend_from_slice(&imm32.to_le_bytes());
                }
                Err(_) => {
                    out.extend_from_slice(&[rex(true, Reg::Rax, dst), 0xB8 + dst.low()]);
                    out.extend_from_slice(&imm.to_le_bytes());
                }
            },
            Instr::MovByteMemImm { dst, imm } => {
                if dst.base.ext() == 1 {
                    out.push(0x41);
                }
                out.push(0xC6);
                modrm_mem(out, 0, dst);
                out.push(imm);
            }
            Instr::MovByteMemReg { dst, src } => {
                if src.low() >= 4 || src.ext() == 1 || dst.base.ext() == 1 {
                    out.push(rex(false, src, dst.base));
                }
                out.push(0x88);
                modrm_mem(out, src.low(), dst);
            }
            Instr::Lea { dst, src } => {
                out.extend_from_slice(&[rex(true, dst, src.base), 0x8D]);
                modrm_mem(out, dst.low(), src);
            }
            Instr::Alu { op, dst, src } => {
                out.extend_from_slice(&[rex(true, src, dst), op.rm_r(), modrm_reg(src.low(), dst)]);
            }
            Instr::AluImm { op, dst, imm } => {
                out.extend_from_slice(&[rex(true, Reg::Rax, dst), 0x81, modrm_reg(op.digit(), dst)]);
                out.extend_from_slice(&imm.to_le_bytes());
            }
            Instr::Imul { dst, src } => {
                out.extend_from_slice(&[rex(true, dst, src), 0x0F, 0xAF, modrm_reg(dst.low(), src)]);
            }
            Instr::Idiv(r) => out.extend_from_slice(&[rex(true, Reg::Rax, r), 0xF7, modrm_reg(7, r)]),
            Instr::Div(r) => out.extend_from_slice(&[rex(true, Reg::Rax, r), 0xF7, modrm_reg(6, r)]),
            Instr::Neg(r) => out.extend_from_slice(&[rex(true, Reg::Rax, r), 0xF7, modrm_reg(3, r)]),
            Instr::ShlImm { dst, imm } => {
                out.extend_from_slice(&[rex(true, Reg::Rax, dst), 0xC1, modrm_reg(4, dst), imm]);
            }
            Instr::Cqo => out.extend_from_slice(&[0x48, 0x99]),
            Instr::Setcc { cond, dst } => {
                if dst.low() >= 4 || dst.ext() == 1 {
                    out.push(rex(false, Reg::Rax, dst));
                }
                out.extend_from_slice(&[0x0F, 0x90 + cond as u8, modrm_reg(0, dst)]);
            }
            Instr::MovzxByte { dst, src } => {
                out.extend_from_slice(&[rex(true, dst, src), 0x0F, 0xB6, modrm_reg(dst.low(), src)]);
            }
            Instr::Jmp(target) => {
                out.push(0xE9);
                out.extend_from_slice(&rel(target, 5).to_le_bytes());
            }
            Instr::Jcc(cond, target) => {
                out.extend_from_slice(&[0x0F, 0x80 + cond as u8]);
                out.extend_from_slice(&rel(target, 6).to_le_bytes());
            }
            Instr::Call(target) => {
                out.push(0xE8);
                out.extend_from_slice(&rel(target, 5).to_le_bytes());
            }
            Instr::Ret => out.push(0xC3),
            Instr::Syscall => out.extend_from_slice(&[0x0F, 0x05]),
        }
    }

    fn target(&self) -> Option<usize> {
        match *self {
            Instr::Jmp(t) | Instr::Jcc(_, t) | Instr::Call(t) => Some(t),
            _ => None,
        }
    }

    fn encoded_len(&self) -> usize {
        let mut scratch = Vec::with_capacity(16);
        self.encode(&mut scratch, |_, _| 0);
        scratch.len()
    }
}

/// Linear instruction list with index-addressed branch patching.
#[derive(Debug, Default)]
pub struct Assembler {
    instrs: Vec<Instr>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction and return its index.
    pub fn emit(&mut self, instr: Instr) -> usize {
        self.instrs.push(instr);
        self.instrs.len() - 1
    }

    /// Index the next emitted instruction will get.
    pub fn here(&self) -> usize {
        self.instrs.len()
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Point the branch or call at `at` to instruction index `target`.
    pub fn patch(&mut self, at: usize, target: usize) {
        match self.instrs.get_mut(at) {
            Some(Instr::Jmp(t) | Instr::Jcc(_, t) | Instr::Call(t)) => *t = target,
            other => debug_assert!(false, "patching non-branch instruction {other:?}"),
        }
    }

    /// Encode every instruction. Fails if a branch was never patched.
    pub fn assemble(&self) -> Result<Vec<u8>, CompileError> {
        // offsets[i] is the byte offset of instruction i; offsets[len] is the end.
        let mut offsets = Vec::with_capacity(self.instrs.len() + 1);
        let mut pos = 0;
        for instr in &self.instrs {
            offsets.push(pos);
            pos += instr.encoded_len();
        }
        offsets.push(pos);

        let mut out = Vec::with_capacity(pos);
        for (i, instr) in self.instrs.iter().enumerate() {
            if instr.target().is_some_and(|target| target >= offsets.len()) {
                return Err(CompileError::codegen(format!("unresolved branch at instruction {i}")));
            }
            let at = offsets[i];
            instr.encode(&mut out, |target, len| (offsets[target] as i64 - (at + len) as i64) as i32);
        }
        Ok(out)
    }
}
