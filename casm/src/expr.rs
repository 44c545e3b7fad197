//! Resolves the single-term numeric expressions a register-free operand
//! token can spell: a signed decimal, a signed `0x` hex literal, or an
//! identifier: either the implicit `OFFSET` symbol, one of
//! [`crate::symbols::PredefinedSymbols`], or a label declared elsewhere in
//! the same source file.
//!
//! Label references are PC-relative: resolving `foo` from line address
//! `here` yields `address(foo) - here`, since every statement form that
//! takes a bare address operand (`jump`, `fork`, the decrement-and-branch
//! form) uses it directly as the signed offset `JUMP` et al. add to `pc`.

use crate::symbols::PredefinedSymbols;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref HEX: Regex = Regex::new(r"^-?0[xX][0-9A-Fa-f]+$").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z_0-9]*$").unwrap();
}

pub type LabelMap = HashMap<String, usize>;

/// `true` for any token this module knows how to parse as a bare
/// expression term. Used by the operand matcher to tell a number/label
/// operand apart from a register operand before attempting to resolve it.
pub fn looks_like_expression(token: &str) -> bool {
    DECIMAL.is_match(token) || HEX.is_match(token) || IDENTIFIER.is_match(token)
}

/// Resolves `token` to a signed value at `current_address`. Unknown
/// identifiers are reported as `Err(message)`, left for the caller to wrap
/// into a [`crate::error::CompileError`] with source-file and line context.
pub fn resolve(
    token: &str,
    current_address: usize,
    labels: &LabelMap,
    symbols: &PredefinedSymbols,
) -> Result<i64, String> {
    if let Some(captured) = DECIMAL.find(token) {
        return captured
            .as_str()
            .parse::<i64>()
            .map_err(|e| format!("invalid decimal literal {:?}: {}", token, e));
    }
    if HEX.is_match(token) {
        let (sign, digits) = match token.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, token),
        };
        let digits = &digits[2..];
        return i64::from_str_radix(digits, 16)
            .map(|v| sign * v)
            .map_err(|e| format!("invalid hex literal {:?}: {}", token, e));
    }
    if IDENTIFIER.is_match(token) {
        if token == "OFFSET" {
            return Ok(current_address as i64);
        }
        if let Some(value) = symbols.lookup(token) {
            return Ok(value);
        }
        if let Some(&address) = labels.get(token) {
            return Ok(address as i64 - current_address as i64);
        }
        return Err(format!("undefined label or symbol {:?}", token));
    }
    Err(format!("not a number, label or predefined symbol: {:?}", token))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolves_decimal_and_hex_literals() {
        let labels = LabelMap::new();
        let symbols = PredefinedSymbols::default();
        assert_eq!(resolve("42", 0, &labels, &symbols), Ok(42));
        assert_eq!(resolve("-7", 0, &labels, &symbols), Ok(-7));
        assert_eq!(resolve("0x2A", 0, &labels, &symbols), Ok(42));
        assert_eq!(resolve("-0x2A", 0, &labels, &symbols), Ok(-42));
    }

    #[test]
    fn resolves_offset_to_the_current_address() {
        let labels = LabelMap::new();
        let symbols = PredefinedSymbols::default();
        assert_eq!(resolve("OFFSET", 17, &labels, &symbols), Ok(17));
    }

    #[test]
    fn resolves_predefined_symbols() {
        let labels = LabelMap::new();
        let symbols = PredefinedSymbols::default();
        assert_eq!(
            resolve("MEM_SIZE", 0, &labels, &symbols),
            Ok(symbols.mem_size)
        );
    }

    #[test]
    fn resolves_labels_as_pc_relative_offsets() {
        let mut labels = LabelMap::new();
        labels.insert("loop".to_string(), 10);
        let symbols = PredefinedSymbols::default();
        assert_eq!(resolve("loop", 12, &labels, &symbols), Ok(-2));
    }

    #[test]
    fn rejects_unknown_identifiers() {
        let labels = LabelMap::new();
        let symbols = PredefinedSymbols::default();
        assert!(resolve("nonsense_label", 0, &labels, &symbols).is_err());
    }
}
