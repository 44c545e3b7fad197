//! Matches one preprocessed source line against the statement-form table,
//! first match wins, and emits the instruction word it compiles to.

use crate::expr::{self, LabelMap};
use crate::operand::{parse_operand, Position};
use crate::symbols::PredefinedSymbols;
use corewar::codec::{encode, encode_data};
use corewar::constants::{DATA_VALUE_MAX, DATA_VALUE_MIN};
use corewar::{Opcode, Word};
use lazy_static::lazy_static;
use regex::Regex;
use std::convert::TryInto;

lazy_static! {
    static ref NOP: Regex = Regex::new(r"^nop$").unwrap();
    static ref DEC_JUMP: Regex =
        Regex::new(r"^jump\s+(?P<addr>\S+)\s+if\s+--(?P<ref>\S+)\s*!=\s*0$").unwrap();
    static ref COND_JUMP: Regex =
        Regex::new(r"^jump\s+(?P<addr>\S+)\s+if\s+(?P<val>\S+)\s*(?P<op>==|!=|<|>)\s*0$").unwrap();
    static ref BAD_COND_JUMP: Regex = Regex::new(r"^jump\s+\S+\s+if\s+").unwrap();
    static ref JUMP: Regex = Regex::new(r"^jump\s+(?P<addr>\S+)$").unwrap();
    static ref FORK: Regex = Regex::new(r"^fork\s+(?P<addr>\S+)$").unwrap();
    static ref COMPARE: Regex = Regex::new(r"^(?P<a>\S+)\s*<=>\s*(?P<b>\S+)$").unwrap();
    static ref ASSIGN: Regex =
        Regex::new(r"^(?P<ref>\S+)\s*(?P<op>=|\+=|-=|\*=|/=|%=)\s*(?P<val>\S+)$").unwrap();
    static ref DATA: Regex = Regex::new(r"^data\s+(?P<expr>\S+)$").unwrap();
}

/// A compiled line's instruction word, produced by [`compile_line`].
pub fn compile_line(
    statement: &str,
    current_address: usize,
    labels: &LabelMap,
    symbols: &PredefinedSymbols,
) -> Result<Word, String> {
    if NOP.is_match(statement) {
        return Ok(encode(Opcode::Nop, 0, 0));
    }

    if let Some(c) = DEC_JUMP.captures(statement) {
        let a = parse_operand(&c["ref"], Position::Write, current_address, labels, symbols)?;
        let b = parse_operand(&c["addr"], Position::Read, current_address, labels, symbols)?;
        return Ok(encode(Opcode::DecJumpNotZero, a.encode(), b.encode()));
    }

    if let Some(c) = COND_JUMP.captures(statement) {
        let opcode = match &c["op"] {
            "==" => Opcode::JumpZero,
            "!=" => Opcode::JumpNotZero,
            "<" => Opcode::JumpLessThan,
            ">" => Opcode::JumpGreaterThan,
            other => unreachable!("regex only matches ==, !=, <, >, got {:?}", other),
        };
        let a = parse_operand(&c["val"], Position::Read, current_address, labels, symbols)?;
        let b = parse_operand(&c["addr"], Position::Read, current_address, labels, symbols)?;
        return Ok(encode(opcode, a.encode(), b.encode()));
    }

    if BAD_COND_JUMP.is_match(statement) {
        return Err(format!(
            "unsupported jump condition in {:?}; expected --ref != 0 or val OP 0 with OP in {{==, !=, <, >}}",
            statement
        ));
    }

    if let Some(c) = JUMP.captures(statement) {
        let b = parse_operand(&c["addr"], Position::Read, current_address, labels, symbols)?;
        return Ok(encode(Opcode::Jump, 0, b.encode()));
    }

    if let Some(c) = FORK.captures(statement) {
        let b = parse_operand(&c["addr"], Position::Read, current_address, labels, symbols)?;
        return Ok(encode(Opcode::Fork, 0, b.encode()));
    }

    if let Some(c) = COMPARE.captures(statement) {
        let a = parse_operand(&c["a"], Position::Read, current_address, labels, symbols)?;
        let b = parse_operand(&c["b"], Position::Read, current_address, labels, symbols)?;
        return Ok(encode(Opcode::Compare, a.encode(), b.encode()));
    }

    if let Some(c) = ASSIGN.captures(statement) {
        let opcode = match &c["op"] {
            "=" => Opcode::Assign,
            "+=" => Opcode::Add,
            "-=" => Opcode::Sub,
            "*=" => Opcode::Mul,
            "/=" => Opcode::Div,
            "%=" => Opcode::Mod,
            other => unreachable!("regex only matches the six assignment operators, got {:?}", other),
        };
        let a = parse_operand(&c["ref"], Position::Write, current_address, labels, symbols)?;
        let b = parse_operand(&c["val"], Position::Read, current_address, labels, symbols)?;
        return Ok(encode(opcode, a.encode(), b.encode()));
    }

    if let Some(c) = DATA.captures(statement) {
        let value = expr::resolve(&c["expr"], current_address, labels, symbols)?;
        let value: i32 = value
            .try_into()
            .map_err(|_| format!("data value {} out of range", value))?;
        if !(DATA_VALUE_MIN..=DATA_VALUE_MAX).contains(&value) {
            return Err(format!(
                "data value {} out of range [{}, {}]",
                value, DATA_VALUE_MIN, DATA_VALUE_MAX
            ));
        }
        return Ok(encode_data(value));
    }

    Err(format!("no statement form matches {:?}", statement))
}

#[cfg(test)]
mod test {
    use super::*;
    use corewar::codec::{data_value_of, Parameter};

    fn labels() -> LabelMap {
        LabelMap::new()
    }

    #[test]
    fn compiles_nop() {
        let word = compile_line("nop", 0, &labels(), &PredefinedSymbols::default()).unwrap();
        assert_eq!(corewar::codec::Opcode::decode(word), Opcode::Nop);
    }

    #[test]
    fn compiles_an_assign() {
        let word = compile_line("r1 = 5", 0, &labels(), &PredefinedSymbols::default()).unwrap();
        assert_eq!(corewar::codec::Opcode::decode(word), Opcode::Assign);
    }

    #[test]
    fn compiles_a_jump_to_a_label() {
        let mut labels = LabelMap::new();
        labels.insert("target".to_string(), 10);
        let word = compile_line("jump target", 4, &labels, &PredefinedSymbols::default()).unwrap();
        assert_eq!(corewar::codec::Opcode::decode(word), Opcode::Jump);
        let b = Parameter::decode(corewar::codec::b_of(word));
        assert_eq!(data_value_of_param(b), 6);
    }

    #[test]
    fn compiles_dec_jump_not_zero() {
        let word = compile_line("jump -1 if --r1 != 0", 0, &labels(), &PredefinedSymbols::default()).unwrap();
        assert_eq!(corewar::codec::Opcode::decode(word), Opcode::DecJumpNotZero);
    }

    #[test]
    fn compiles_a_conditional_jump() {
        let word = compile_line("jump 3 if r2 == 0", 0, &labels(), &PredefinedSymbols::default()).unwrap();
        assert_eq!(corewar::codec::Opcode::decode(word), Opcode::JumpZero);
    }

    #[test]
    fn rejects_an_unsupported_jump_condition() {
        assert!(compile_line("jump 3 if r2 >= 0", 0, &labels(), &PredefinedSymbols::default()).is_err());
    }

    #[test]
    fn compiles_fork_and_compare_and_data() {
        let defaults = PredefinedSymbols::default();
        assert!(compile_line("fork -5", 0, &labels(), &defaults).is_ok());
        assert!(compile_line("r1 <=> r2", 0, &labels(), &defaults).is_ok());
        let word = compile_line("data 7", 0, &labels(), &defaults).unwrap();
        assert_eq!(data_value_of(word), 7);
    }

    fn data_value_of_param(p: Parameter) -> i32 {
        match p {
            Parameter::Literal(v) => v as i32,
            Parameter::Offset { offset, .. } => offset as i32,
            Parameter::Register { .. } => panic!("expected a literal/offset parameter"),
        }
    }
}
