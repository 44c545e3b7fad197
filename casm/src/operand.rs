//! Turns one operand token into a [`corewar::Parameter`]: a register
//! reference (`r1`..`r16`, `s1`..`s16`), or a number/label/symbol
//! expression. A leading run of 0–2 `@` characters counts as the
//! dereference depth in both cases. The register-operand regex
//! (`@{0,2}(r|s)\d{1,2}`) is the register-shaped instance of that same
//! general rule.

use crate::expr::{self, LabelMap};
use crate::symbols::PredefinedSymbols;
use corewar::constants::{FIRST_SHARED_REGISTER, PRIVATE_REGISTER_COUNT};
use corewar::Parameter;
use lazy_static::lazy_static;
use regex::Regex;
use std::convert::TryInto;

lazy_static! {
    static ref DEREF_PREFIX: Regex = Regex::new(r"^(@{0,2})(.+)$").unwrap();
    static ref REGISTER: Regex = Regex::new(r"^(?P<bank>[rs])(?P<index>\d{1,2})$").unwrap();
}

/// Whether an operand is being parsed in a position the VM can write to
/// (`a` of `ASSIGN`, `a` of `--ref`) or a read-only position (everything
/// else). Only affects what error a literal-immediate operand produces.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Position {
    Read,
    Write,
}

pub fn parse_operand(
    token: &str,
    position: Position,
    current_address: usize,
    labels: &LabelMap,
    symbols: &PredefinedSymbols,
) -> Result<Parameter, String> {
    let captures = DEREF_PREFIX
        .captures(token)
        .ok_or_else(|| "empty operand".to_string())?;
    let derefs = captures[1].len() as u8;
    let body = &captures[2];

    if let Some(register) = REGISTER.captures(body) {
        let index: u8 = register["index"]
            .parse()
            .map_err(|e| format!("invalid register index in {:?}: {}", token, e))?;
        if !(1..=PRIVATE_REGISTER_COUNT as u8).contains(&index) {
            return Err(format!("register index out of range 1..=16: {:?}", token));
        }
        let index = if &register["bank"] == "s" {
            index + FIRST_SHARED_REGISTER - 1
        } else {
            index
        };
        return Ok(Parameter::Register { index, derefs });
    }

    if !expr::looks_like_expression(body) {
        return Err(format!("not a register, number or label: {:?}", token));
    }
    let value = expr::resolve(body, current_address, labels, symbols)?;

    if derefs == 0 {
        if position == Position::Write {
            return Err(format!(
                "{:?} is a literal immediate, which cannot be written to",
                token
            ));
        }
        let literal: i16 = value
            .try_into()
            .map_err(|_| format!("literal {} out of range [-2048, 2047]", value))?;
        return Ok(Parameter::Literal(literal));
    }

    let offset: i16 = value
        .try_into()
        .map_err(|_| format!("offset {} out of range [-2048, 2047]", value))?;
    Ok(Parameter::Offset { offset, derefs })
}

#[cfg(test)]
mod test {
    use super::*;

    fn labels() -> LabelMap {
        LabelMap::new()
    }

    #[test]
    fn parses_a_bare_private_register() {
        let p = parse_operand("r3", Position::Read, 0, &labels(), &PredefinedSymbols::default()).unwrap();
        assert_eq!(p, Parameter::Register { index: 3, derefs: 0 });
    }

    #[test]
    fn parses_a_shared_register_with_one_dereference() {
        let p = parse_operand("@s2", Position::Write, 0, &labels(), &PredefinedSymbols::default()).unwrap();
        assert_eq!(
            p,
            Parameter::Register {
                index: 2 + FIRST_SHARED_REGISTER - 1,
                derefs: 1
            }
        );
    }

    #[test]
    fn parses_a_literal_immediate() {
        let p = parse_operand("42", Position::Read, 0, &labels(), &PredefinedSymbols::default()).unwrap();
        assert_eq!(p, Parameter::Literal(42));
    }

    #[test]
    fn rejects_a_literal_immediate_in_write_position() {
        assert!(parse_operand("42", Position::Write, 0, &labels(), &PredefinedSymbols::default()).is_err());
    }

    #[test]
    fn parses_a_double_dereferenced_offset() {
        let p = parse_operand("@@5", Position::Read, 0, &labels(), &PredefinedSymbols::default()).unwrap();
        assert_eq!(p, Parameter::Offset { offset: 5, derefs: 2 });
    }

    #[test]
    fn rejects_a_register_index_out_of_range() {
        assert!(parse_operand("r17", Position::Read, 0, &labels(), &PredefinedSymbols::default()).is_err());
    }
}
