//! The runtime: a few fixed instruction sequences built on raw Linux
//! syscalls. There is no libc; output is `write`, heap memory is `mmap`.

use super::x64::{AluOp, Assembler, Cond, Instr, Mem, Reg, UNPATCHED};

/// Size of a pointer in bytes. Every value, field and array element uses one slot.
pub const POINTER_SIZE: i32 = 8;

const SYS_WRITE: i64 = 1;
const SYS_MMAP: i64 = 9;
const SYS_EXIT: i64 = 60;
const STDOUT: i64 = 1;
const PROT_READ_WRITE: i64 = 0x3;
const MAP_PRIVATE_ANONYMOUS: i64 = 0x22;

/// Instruction indices of the runtime subroutines emitted into a program.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeRegistry {
    pub println: usize,
}

impl RuntimeRegistry {
    pub fn emit(asm: &mut Assembler) -> Self {
        Self { println: emit_println(asm) }
    }
}

/// `mmap(NULL, rsi, PROT_READ|PROT_WRITE, MAP_PRIVATE|MAP_ANONYMOUS, -1, 0)`.
/// The length must already be in `rsi`; the mapping comes back in `rax`.
/// Clobbers `rcx`, `rdx`, `rdi`, `r8`-`r11`.
pub fn emit_mmap(asm: &mut Assembler) {
    asm.emit(Instr::MovRegImm { dst: Reg::Rax, imm: SYS_MMAP });
    asm.emit(Instr::Alu { op: AluOp::Xor, dst: Reg::Rdi, src: Reg::Rdi });
    asm.emit(Instr::MovRegImm { dst: Reg::Rdx, imm: PROT_READ_WRITE });
    asm.emit(Instr::MovRegImm { dst: Reg::R10, imm: MAP_PRIVATE_ANONYMOUS });
    asm.emit(Instr::MovRegImm { dst: Reg::R8, imm: -1 });
    asm.emit(Instr::Alu { op: AluOp::Xor, dst: Reg::R9, src: Reg::R9 });
    asm.emit(Instr::Syscall);
}

/// `exit(0)`
pub fn emit_exit(asm: &mut Assembler) {
    asm.emit(Instr::MovRegImm { dst: Reg::Rax, imm: SYS_EXIT });
    asm.emit(Instr::Alu { op: AluOp::Xor, dst: Reg::Rdi, src: Reg::Rdi });
    asm.emit(Instr::Syscall);
}

/// Subroutine printing its single stack argument as signed decimal plus a
/// newline. Digits are built backwards in a buffer below `rbp`.
fn emit_println(asm: &mut Assembler) -> usize {
    let entry = asm.emit(Instr::PushReg(Reg::Rbp));
    asm.emit(Instr::MovRegReg { dst: Reg::Rbp, src: Reg::Rsp });
    asm.emit(Instr::AluImm { op: AluOp::Sub, dst: Reg::Rsp, imm: 32 });
    asm.emit(Instr::MovRegMem { dst: Reg::Rax, src: Mem::new(Reg::Rbp, 16) });
    asm.emit(Instr::Lea { dst: Reg::Rsi, src: Mem::new(Reg::Rbp, -1) });
    asm.emit(Instr::MovByteMemImm { dst: Mem::new(Reg::Rsi, 0), imm: b'\n' });

    // r8 = 1 if negative; magnitude in rax
    asm.emit(Instr::Alu { op: AluOp::Xor, dst: Reg::R8, src: Reg::R8 });
    asm.emit(Instr::AluImm { op: AluOp::Cmp, dst: Reg::Rax, imm: 0 });
    let skip_neg = asm.emit(Instr::Jcc(Cond::Ge, UNPATCHED));
    asm.emit(Instr::Neg(Reg::Rax));
    asm.emit(Instr::MovRegImm { dst: Reg::R8, imm: 1 });
    let digits = asm.emit(Instr::MovRegImm { dst: Reg::Rcx, imm: 10 });
    asm.patch(skip_neg, digits);

    let next_digit = asm.emit(Instr::Alu { op: AluOp::Xor, dst: Reg::Rdx, src: Reg::Rdx });
    asm.emit(Instr::Div(Reg::Rcx));
    asm.emit(Instr::AluImm { op: AluOp::Add, dst: Reg::Rdx, imm: i32::from(b'0') });
    asm.emit(Instr::AluImm { op: AluOp::Sub, dst: Reg::Rsi, imm: 1 });
    asm.emit(Instr::MovByteMemReg { dst: Mem::new(Reg::Rsi, 0), src: Reg::Rdx });
    asm.emit(Instr::AluImm { op: AluOp::Cmp, dst: Reg::Rax, imm: 0 });
    asm.emit(Instr::Jcc(Cond::Ne, next_digit));

    asm.emit(Instr::AluImm { op: AluOp::Cmp, dst: Reg::R8, imm: 0 });
    let skip_sign = asm.emit(Instr::Jcc(Cond::E, UNPATCHED));
    asm.emit(Instr::AluImm { op: AluOp::Sub, dst: Reg::Rsi, imm: 1 });
    asm.emit(Instr::MovByteMemImm { dst: Mem::new(Reg::Rsi, 0), imm: b'-' });

    // write(1, rsi, rbp - rsi)
    let write = asm.emit(Instr::MovRegReg { dst: Reg::Rdx, src: Reg::Rbp });
    asm.patch(skip_sign, write);
    asm.emit(Instr::Alu { op: AluOp::Sub, dst: Reg::Rdx, src: Reg::Rsi });
    asm.emit(Instr::MovRegImm { dst: Reg::Rax, imm: SYS_WRITE });
    asm.emit(Instr::MovRegImm { dst: Reg::Rdi, imm: STDOUT });
    asm.emit(Instr::Syscall);

    asm.emit(Instr::MovRegReg { dst: Reg::Rsp, src: Reg::Rbp });
    asm.emit(Instr::PopReg(Reg::Rbp));
    asm.emit(Instr::Ret);
    entry
}
