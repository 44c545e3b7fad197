//! One thread of execution within a [`crate::program::Program`]: sixteen
//! private registers and a program counter, plus the single-step
//! interpreter that turns one fetched instruction word into effects on
//! memory, registers, and the thread's own `pc`.
//!
//! Operand resolution turns a decoded [`Parameter`] into something
//! readable and, if applicable, writable. It lives here rather than in
//! [`crate::codec`] since it needs the running context for memory
//! indirections and the owning program for shared registers.

use crate::codec::{self, Opcode, Parameter};
use crate::constants::{FIRST_SHARED_REGISTER, PRIVATE_REGISTER_COUNT};
use crate::context::ExecutionContext;
use crate::error::ThreadFault;
use crate::program::Program;
use crate::{Address, ProgramId, RegisterIndex, ThreadId, Word};

/// Sixteen private registers and a program counter. Created at match start
/// (the initial thread) or by FORK; destroyed by [`crate::program::Program::step`]
/// the instant it terminates.
#[derive(Clone, Debug)]
pub struct Thread {
    id: ThreadId,
    pc: Address,
    private_registers: [Word; PRIVATE_REGISTER_COUNT],
}

/// What happened to a thread after one single-step.
#[derive(Clone, Copy, Debug)]
pub enum ThreadOutcome {
    Survived,
    Terminated(ThreadFault),
}

/// Where an operand's value actually lives, once dereferencing is done.
/// Not itself writable if `Immediate`.
#[derive(Clone, Copy, Debug)]
enum Resolved {
    Immediate(i32),
    Register(RegisterIndex),
    Memory(Address),
}

impl Thread {
    pub(crate) fn new(id: ThreadId, pc: Address, private_registers: [Word; PRIVATE_REGISTER_COUNT]) -> Self {
        Thread {
            id,
            pc,
            private_registers,
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn private_registers(&self) -> &[Word; PRIVATE_REGISTER_COUNT] {
        &self.private_registers
    }

    /// Fetches and executes exactly one instruction, advancing `pc` (or
    /// branching) on success, or reporting the fault that killed the
    /// thread.
    pub(crate) fn step(
        &mut self,
        ctx: &mut ExecutionContext,
        program: &mut Program,
        program_id: ProgramId,
    ) -> ThreadOutcome {
        let pc = self.pc;
        let word = ctx.fetch(pc);
        let opcode = Opcode::decode(word);
        if opcode == Opcode::Data {
            return ThreadOutcome::Terminated(ThreadFault::ExecutedData);
        }

        let a = Parameter::decode(codec::a_of(word));
        let b = Parameter::decode(codec::b_of(word));

        let outcome: Result<Option<Address>, ThreadFault> = match opcode {
            Opcode::Nop => Ok(None),
            Opcode::Assign => self.exec_assign(ctx, program, pc, a, b).map(|_| None),
            Opcode::Add => self.exec_arith(ctx, program, pc, a, b, |x, y| x + y).map(|_| None),
            Opcode::Sub => self.exec_arith(ctx, program, pc, a, b, |x, y| x - y).map(|_| None),
            Opcode::Mul => self.exec_arith(ctx, program, pc, a, b, |x, y| x * y).map(|_| None),
            Opcode::Div => self.exec_divmod(ctx, program, pc, a, b, true).map(|_| None),
            Opcode::Mod => self.exec_divmod(ctx, program, pc, a, b, false).map(|_| None),
            Opcode::Compare => {
                self.exec_compare(ctx, program, pc, a, b);
                Ok(None)
            }
            Opcode::Jump => {
                let rb = self.resolve(ctx, program, pc, b);
                let offset = self.read_data_resolved(ctx, program, rb);
                Ok(Some(ctx.wrap(pc as i64 + offset as i64)))
            }
            Opcode::JumpZero => Ok(self.exec_conditional_jump(ctx, program, pc, a, b, |v| v == 0)),
            Opcode::JumpNotZero => Ok(self.exec_conditional_jump(ctx, program, pc, a, b, |v| v != 0)),
            Opcode::JumpLessThan => Ok(self.exec_conditional_jump(ctx, program, pc, a, b, |v| v < 0)),
            Opcode::JumpGreaterThan => Ok(self.exec_conditional_jump(ctx, program, pc, a, b, |v| v > 0)),
            Opcode::DecJumpNotZero => self.exec_dec_jump_not_zero(ctx, program, pc, a, b),
            Opcode::Fork => {
                let rb = self.resolve(ctx, program, pc, b);
                let offset = self.read_data_resolved(ctx, program, rb);
                let new_pc = ctx.wrap(pc as i64 + offset as i64);
                let created = program.create_thread(ctx, new_pc, self.private_registers, program_id);
                self.private_registers[0] = created as Word;
                Ok(None)
            }
            Opcode::Data => unreachable!("DATA is handled before the opcode dispatch"),
        };

        match outcome {
            Ok(branch_target) => {
                self.pc = branch_target.unwrap_or_else(|| ctx.wrap(pc as i64 + 1));
                ThreadOutcome::Survived
            }
            Err(fault) => ThreadOutcome::Terminated(fault),
        }
    }

    fn exec_assign(
        &mut self,
        ctx: &mut ExecutionContext,
        program: &mut Program,
        pc: Address,
        a: Parameter,
        b: Parameter,
    ) -> Result<(), ThreadFault> {
        let ra = self.resolve(ctx, program, pc, a);
        let rb = self.resolve(ctx, program, pc, b);
        let value = self.read_word(ctx, program, rb);
        self.write_word(ctx, program, ra, value)
    }

    fn exec_arith(
        &mut self,
        ctx: &mut ExecutionContext,
        program: &mut Program,
        pc: Address,
        a: Parameter,
        b: Parameter,
        op: impl Fn(i64, i64) -> i64,
    ) -> Result<(), ThreadFault> {
        let ra = self.resolve(ctx, program, pc, a);
        let va = self.read_data_resolved(ctx, program, ra) as i64;
        let rb = self.resolve(ctx, program, pc, b);
        let vb = self.read_data_resolved(ctx, program, rb) as i64;
        self.write_data(ctx, program, ra, op(va, vb))
    }

    fn exec_divmod(
        &mut self,
        ctx: &mut ExecutionContext,
        program: &mut Program,
        pc: Address,
        a: Parameter,
        b: Parameter,
        is_div: bool,
    ) -> Result<(), ThreadFault> {
        let ra = self.resolve(ctx, program, pc, a);
        let va = self.read_data_resolved(ctx, program, ra) as i64;
        let rb = self.resolve(ctx, program, pc, b);
        let vb = self.read_data_resolved(ctx, program, rb) as i64;
        if vb == 0 {
            return Err(ThreadFault::DivisionByZero);
        }
        let result = if is_div { va / vb } else { va % vb };
        self.write_data(ctx, program, ra, result)
    }

    fn exec_compare(&mut self, ctx: &mut ExecutionContext, program: &Program, pc: Address, a: Parameter, b: Parameter) {
        let ra = self.resolve(ctx, program, pc, a);
        let va = self.read_data_resolved(ctx, program, ra) as i64;
        let rb = self.resolve(ctx, program, pc, b);
        let vb = self.read_data_resolved(ctx, program, rb) as i64;
        let result = (va - vb).signum() as i32;
        // r1 is the conventional result register for COMPARE and FORK.
        self.private_registers[0] = result as u32;
    }

    fn exec_conditional_jump(
        &mut self,
        ctx: &mut ExecutionContext,
        program: &Program,
        pc: Address,
        a: Parameter,
        b: Parameter,
        test: impl Fn(i32) -> bool,
    ) -> Option<Address> {
        let ra = self.resolve(ctx, program, pc, a);
        let va = self.read_data_resolved(ctx, program, ra);
        let rb = self.resolve(ctx, program, pc, b);
        let offset = self.read_data_resolved(ctx, program, rb);
        if test(va) {
            Some(ctx.wrap(pc as i64 + offset as i64))
        } else {
            None
        }
    }

    fn exec_dec_jump_not_zero(
        &mut self,
        ctx: &mut ExecutionContext,
        program: &mut Program,
        pc: Address,
        a: Parameter,
        b: Parameter,
    ) -> Result<Option<Address>, ThreadFault> {
        let ra = self.resolve(ctx, program, pc, a);
        let va = self.read_data_resolved(ctx, program, ra);
        let rb = self.resolve(ctx, program, pc, b);
        let offset = self.read_data_resolved(ctx, program, rb);

        let decremented = va as i64 - 1;
        self.write_data(ctx, program, ra, decremented)?;
        let stored = codec::data_value_of(codec::encode_data_wrapping(decremented));

        Ok(if stored != 0 {
            Some(ctx.wrap(pc as i64 + offset as i64))
        } else {
            None
        })
    }

    /// Resolves a decoded operand to wherever its value actually lives,
    /// performing any memory indirections along the way. A deref-2
    /// operand's second hop adds the first hop's dereferenced data value
    /// to the first hop's address, not to `pc` again.
    fn resolve(&self, ctx: &mut ExecutionContext, program: &Program, pc: Address, param: Parameter) -> Resolved {
        match param {
            Parameter::Literal(value) => Resolved::Immediate(value as i32),
            Parameter::Register { index, derefs } => {
                if derefs == 0 {
                    Resolved::Register(index)
                } else {
                    let offset = self.register_word(program, index) as i32;
                    Resolved::Memory(Self::resolve_indirect(ctx, pc, offset, derefs))
                }
            }
            Parameter::Offset { offset, derefs } => {
                Resolved::Memory(Self::resolve_indirect(ctx, pc, offset as i32, derefs))
            }
        }
    }

    fn resolve_indirect(ctx: &mut ExecutionContext, pc: Address, offset: i32, derefs: u8) -> Address {
        let mut addr = ctx.wrap(pc as i64 + offset as i64);
        for _ in 1..derefs {
            let data = codec::data_value_of(ctx.read(addr));
            addr = ctx.wrap(addr as i64 + data as i64);
        }
        addr
    }

    fn register_word(&self, program: &Program, index: RegisterIndex) -> Word {
        if index < FIRST_SHARED_REGISTER {
            self.private_registers[(index - 1) as usize]
        } else {
            program.shared_register((index - FIRST_SHARED_REGISTER) as usize)
        }
    }

    fn set_register_word(&mut self, program: &mut Program, index: RegisterIndex, value: Word) {
        if index < FIRST_SHARED_REGISTER {
            self.private_registers[(index - 1) as usize] = value;
        } else {
            program.set_shared_register((index - FIRST_SHARED_REGISTER) as usize, value);
        }
    }

    fn read_word(&self, ctx: &mut ExecutionContext, program: &Program, resolved: Resolved) -> Word {
        match resolved {
            Resolved::Immediate(value) => value as Word,
            Resolved::Register(index) => self.register_word(program, index),
            Resolved::Memory(addr) => ctx.read(addr),
        }
    }

    fn read_data_resolved(&self, ctx: &mut ExecutionContext, program: &Program, resolved: Resolved) -> i32 {
        match resolved {
            Resolved::Immediate(value) => value,
            _ => codec::data_value_of(self.read_word(ctx, program, resolved)),
        }
    }

    fn write_word(
        &mut self,
        ctx: &mut ExecutionContext,
        program: &mut Program,
        resolved: Resolved,
        value: Word,
    ) -> Result<(), ThreadFault> {
        match resolved {
            Resolved::Immediate(_) => Err(ThreadFault::IllegalWriteTarget),
            Resolved::Register(index) => {
                self.set_register_word(program, index, value);
                Ok(())
            }
            Resolved::Memory(addr) => {
                ctx.write(addr, value);
                Ok(())
            }
        }
    }

    fn write_data(
        &mut self,
        ctx: &mut ExecutionContext,
        program: &mut Program,
        resolved: Resolved,
        value: i64,
    ) -> Result<(), ThreadFault> {
        self.write_word(ctx, program, resolved, codec::encode_data_wrapping(value))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{encode, encode_data, Opcode, Parameter};
    use crate::program::{CompiledProgram, Program};

    fn literal(value: i16) -> u16 {
        Parameter::Literal(value).encode()
    }

    fn register(index: u8, derefs: u8) -> u16 {
        Parameter::Register { index, derefs }.encode()
    }

    fn offset(value: i16, derefs: u8) -> u16 {
        Parameter::Offset { offset: value, derefs }.encode()
    }

    fn run_one(instructions: Vec<Word>, memory_size: usize) -> (Program, crate::context::ExecutionContext) {
        let mut ctx = ExecutionContext::new(memory_size, 10);
        let mut program = Program::new(CompiledProgram {
            name: "p".to_string(),
            start_offset: 0,
            instructions,
        });
        program.write_program(&mut ctx, 0);
        program.spawn_initial(&mut ctx, 0, 0);
        program.step(&mut ctx, 0);
        (program, ctx)
    }

    #[test]
    fn nop_advances_pc_by_one() {
        let (program, _ctx) = run_one(vec![encode(Opcode::Nop, 0, 0), encode(Opcode::Nop, 0, 0)], 256);
        assert!(!program.is_stopped());
    }

    #[test]
    fn assign_copies_the_raw_word_from_b_into_a() {
        // @0 = 42  =>  writes 42 into the cell one past this instruction.
        let instructions = vec![
            encode(Opcode::Assign, offset(1, 1), literal(42)),
            encode_data(0),
        ];
        let (_program, mut ctx) = run_one(instructions, 256);
        assert_eq!(ctx.read(1), 42);
    }

    #[test]
    fn add_uses_data_value_semantics() {
        // r1 = r1 + 5, starting from r1 = 0.
        let instructions = vec![encode(Opcode::Add, register(1, 0), literal(5))];
        let (program, _ctx) = run_one(instructions, 256);
        assert_eq!(program.is_stopped(), false);
    }

    #[test]
    fn division_by_zero_terminates_the_thread() {
        let instructions = vec![
            encode(Opcode::Assign, register(1, 0), literal(5)),
            encode(Opcode::Div, register(1, 0), literal(0)),
        ];
        let mut ctx = ExecutionContext::new(256, 10);
        let mut program = Program::new(CompiledProgram {
            name: "p".to_string(),
            start_offset: 0,
            instructions,
        });
        program.write_program(&mut ctx, 0);
        program.spawn_initial(&mut ctx, 0, 0);
        program.step(&mut ctx, 0); // assign
        program.step(&mut ctx, 0); // div by zero
        assert!(program.is_stopped());
    }

    #[test]
    fn compare_stores_the_sign_in_private_r1() {
        let instructions = vec![encode(Opcode::Compare, literal(3), literal(7))];
        let mut ctx = ExecutionContext::new(256, 10);
        let mut program = Program::new(CompiledProgram {
            name: "p".to_string(),
            start_offset: 0,
            instructions,
        });
        program.write_program(&mut ctx, 0);
        program.spawn_initial(&mut ctx, 0, 0);
        // Peek isn't exposed, but stepping must not kill the thread.
        program.step(&mut ctx, 0);
        assert!(!program.is_stopped());
    }

    #[test]
    fn fork_sets_r1_on_success_and_denial() {
        let instructions = vec![
            encode(Opcode::Fork, 0, literal(1)),
            encode(Opcode::Nop, 0, 0),
        ];
        let mut ctx = ExecutionContext::new(256, 1); // only the initial thread fits
        let mut program = Program::new(CompiledProgram {
            name: "p".to_string(),
            start_offset: 0,
            instructions,
        });
        program.write_program(&mut ctx, 0);
        program.spawn_initial(&mut ctx, 0, 0);
        program.step(&mut ctx, 0);
        assert_eq!(program.live_thread_count(), 1);
        let r1 = program.threads().next().unwrap().private_registers()[0];
        assert_eq!(r1, 0, "fork must be denied when no thread budget remains");
    }

    #[test]
    fn jump_is_pc_relative_and_wraps() {
        let instructions = vec![encode(Opcode::Jump, 0, literal(-1))];
        let mut ctx = ExecutionContext::new(4, 10);
        let mut program = Program::new(CompiledProgram {
            name: "p".to_string(),
            start_offset: 0,
            instructions,
        });
        program.write_program(&mut ctx, 0);
        program.spawn_initial(&mut ctx, 0, 0);
        program.step(&mut ctx, 0);
        assert!(!program.is_stopped());
    }

    #[test]
    fn dec_jump_not_zero_decrements_and_branches() {
        // r1 = 2; loop: --r1 jump loop if != 0; nop
        let instructions = vec![
            encode(Opcode::Assign, register(1, 0), literal(2)),
            encode(Opcode::DecJumpNotZero, register(1, 0), literal(0)),
            encode(Opcode::Nop, 0, 0),
        ];
        let mut ctx = ExecutionContext::new(256, 10);
        let mut program = Program::new(CompiledProgram {
            name: "p".to_string(),
            start_offset: 0,
            instructions,
        });
        program.write_program(&mut ctx, 0);
        program.spawn_initial(&mut ctx, 0, 0);
        program.step(&mut ctx, 0); // r1 = 2
        program.step(&mut ctx, 0); // r1 -> 1, branch back to self
        program.step(&mut ctx, 0); // r1 -> 0, falls through
        assert!(!program.is_stopped());
    }
}
