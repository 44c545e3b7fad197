//! Renders a single instruction word back into the source form that
//! would reassemble to it. The inverse of [`crate::statement::compile_line`]
//! for every opcode but with no label context: branch targets render as
//! signed offsets, never as the label that originally produced them.

use corewar::codec::{a_of, b_of, data_value_of};
use corewar::constants::FIRST_SHARED_REGISTER;
use corewar::{Opcode, Parameter, RegisterIndex, Word};

fn register_name(index: RegisterIndex) -> String {
    if index < FIRST_SHARED_REGISTER {
        format!("r{}", index)
    } else {
        format!("s{}", index - FIRST_SHARED_REGISTER + 1)
    }
}

fn format_operand(param: Parameter) -> String {
    let prefix = "@".repeat(param.dereference_count() as usize);
    match param {
        Parameter::Literal(value) => format!("{}{}", prefix, value),
        Parameter::Register { index, .. } => format!("{}{}", prefix, register_name(index)),
        Parameter::Offset { offset, .. } => format!("{}{}", prefix, offset),
    }
}

/// Disassembles one instruction word into its canonical source line.
pub fn disassemble(word: Word) -> String {
    let opcode = Opcode::decode(word);
    if opcode == Opcode::Data {
        return format!("data {}", data_value_of(word));
    }

    let a = Parameter::decode(a_of(word));
    let b = Parameter::decode(b_of(word));

    match opcode {
        Opcode::Nop => "nop".to_string(),
        Opcode::Assign | Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
            format!("{} {} {}", format_operand(a), opcode.mnemonic(), format_operand(b))
        }
        Opcode::Compare => format!("{} <=> {}", format_operand(a), format_operand(b)),
        Opcode::Jump => format!("jump {}", format_operand(b)),
        Opcode::JumpZero | Opcode::JumpNotZero | Opcode::JumpLessThan | Opcode::JumpGreaterThan => {
            format!("jump {} if {} {} 0", format_operand(b), format_operand(a), opcode.mnemonic())
        }
        Opcode::DecJumpNotZero => format!("jump {} if --{} != 0", format_operand(b), format_operand(a)),
        Opcode::Fork => format!("fork {}", format_operand(b)),
        Opcode::Data => unreachable!("handled above"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assembler::assemble;
    use corewar::codec::encode;
    use quickcheck_macros::quickcheck;

    #[test]
    fn disassembles_nop_and_data() {
        assert_eq!(disassemble(encode(Opcode::Nop, 0, 0)), "nop");
        assert_eq!(disassemble(corewar::codec::encode_data(7)), "data 7");
    }

    #[test]
    fn disassemble_assemble_round_trips_on_every_instruction_in_a_small_program() {
        let source = "loop: r1 = 0\nr1 += 1\njump loop if r1 == 10\nfork loop\ndata 3\n";
        let (program, report) = assemble(source, "p");
        assert!(!report.has_errors());

        for &word in &program.instructions {
            let rendered = disassemble(word);
            let recompiled = assemble(&rendered, "rendered").0;
            assert_eq!(recompiled.instructions[0], word, "mismatch rendering {:?}", rendered);
        }
    }

    /// Builds an arbitrary valid operand from quickcheck-supplied bits,
    /// restricted to register/offset forms when `allow_literal` is false
    /// (a write-position operand can never be a literal immediate).
    fn arbitrary_parameter(selector: u8, value: i16, reg_index: u8, derefs: u8, allow_literal: bool) -> Parameter {
        let value = value.clamp(-2047, 2047);
        let derefs = derefs % 3;
        let reg_index = 1 + (reg_index % 32);
        let kinds: u8 = if allow_literal { 3 } else { 2 };
        match selector % kinds {
            0 => Parameter::Register { index: reg_index, derefs },
            1 => Parameter::Offset { offset: value, derefs: derefs.max(1) },
            _ => Parameter::Literal(value),
        }
    }

    /// Property 4 from the testable-properties table: reassembling the
    /// disassembly of any instruction word built from valid operands
    /// reproduces that exact word, for every opcode the grammar has a
    /// dedicated statement form for.
    #[quickcheck]
    fn disassemble_reassemble_round_trips_over_arbitrary_operands(
        opcode_selector: u8,
        a_selector: u8,
        a_value: i16,
        a_reg: u8,
        a_derefs: u8,
        b_selector: u8,
        b_value: i16,
        b_reg: u8,
        b_derefs: u8,
    ) -> bool {
        // Opcodes whose statement form reads both `a` and `b` meaningfully.
        const BOTH_MATTER: [Opcode; 5] = [
            Opcode::Compare,
            Opcode::JumpZero,
            Opcode::JumpNotZero,
            Opcode::JumpLessThan,
            Opcode::JumpGreaterThan,
        ];
        // `jump`/`fork` only have a statement form for `b`; their `a` field
        // is always re-encoded as a literal zero on reassembly, so `a`
        // cannot be arbitrary here without breaking the round trip.
        const B_ONLY: [Opcode; 2] = [Opcode::Jump, Opcode::Fork];
        const WRITES_A: [Opcode; 7] = [
            Opcode::Assign,
            Opcode::Add,
            Opcode::Sub,
            Opcode::Mul,
            Opcode::Div,
            Opcode::Mod,
            Opcode::DecJumpNotZero,
        ];

        let group = opcode_selector % 3;
        let opcode = match group {
            0 => BOTH_MATTER[(opcode_selector as usize / 3) % BOTH_MATTER.len()],
            1 => B_ONLY[(opcode_selector as usize / 3) % B_ONLY.len()],
            _ => WRITES_A[(opcode_selector as usize / 3) % WRITES_A.len()],
        };

        let a = match group {
            0 => arbitrary_parameter(a_selector, a_value, a_reg, a_derefs, true),
            1 => Parameter::Literal(0),
            _ => arbitrary_parameter(a_selector, a_value, a_reg, a_derefs, false),
        };
        let b = arbitrary_parameter(b_selector, b_value, b_reg, b_derefs, true);
        let word = encode(opcode, a.encode(), b.encode());

        let rendered = disassemble(word);
        let recompiled = assemble(&rendered, "rendered").0;
        recompiled.instructions[0] == word
    }
}
