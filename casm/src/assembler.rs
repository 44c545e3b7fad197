//! Two-pass assembly: collect labels against line addresses, then compile
//! each line in isolation against the finished label map. Lines that fail
//! to compile become a `NOP` so every later line keeps the address the
//! first pass already committed it to.

use crate::error::{CompileError, CompileReport};
use crate::expr::LabelMap;
use crate::statement::compile_line;
use crate::symbols::{PredefinedSymbols, RESERVED_WORDS};
use corewar::codec::{encode, Opcode};
use corewar::{CompiledProgram, Word};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref LABEL_LINE: Regex = Regex::new(r"^(?P<label>[A-Za-z_][A-Za-z_0-9]*)\s*:\s*(?P<rest>.*)$").unwrap();
    static ref LABEL_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z_0-9]*$").unwrap();
}

/// One non-blank source line after comments are stripped and its label,
/// if any, is peeled off: the line number it came from (1-based, for
/// diagnostics), the address it will be compiled to, and the remaining
/// statement text.
struct PreprocessedLine {
    line_number: usize,
    address: usize,
    statement: String,
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Pass 1: strips comments, peels off `label:` prefixes into `labels`,
/// and assigns each remaining non-blank line the address it will occupy.
/// Blank lines (after comment stripping) keep their line number out of
/// the instruction stream entirely. They never advance the address.
fn preprocess(
    source: &str,
    source_name: &str,
    labels: &mut LabelMap,
    report: &mut CompileReport,
) -> Vec<PreprocessedLine> {
    let mut lines = Vec::new();
    let mut address = 0usize;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_number = idx + 1;
        let stripped = strip_comment(raw_line).trim();
        if stripped.is_empty() {
            continue;
        }

        let statement = if let Some(captures) = LABEL_LINE.captures(stripped) {
            let label = captures["label"].to_string();
            if RESERVED_WORDS.contains(&label.as_str())
                || PredefinedSymbols::is_defined(&label)
                || is_register_name(&label)
            {
                report.errors.push(CompileError::new(
                    source_name,
                    line_number,
                    format!("label {:?} collides with a keyword or predefined symbol", label),
                ));
            } else if labels.insert(label.clone(), address).is_some() {
                report.errors.push(CompileError::new(
                    source_name,
                    line_number,
                    format!("label {:?} declared more than once", label),
                ));
            }
            captures["rest"].trim().to_string()
        } else {
            stripped.to_string()
        };

        if !statement.is_empty() {
            lines.push(PreprocessedLine {
                line_number,
                address,
                statement,
            });
            address += 1;
        }
    }

    lines
}

fn is_register_name(token: &str) -> bool {
    let bytes = token.as_bytes();
    matches!(bytes.first(), Some(b'r') | Some(b's')) && bytes[1..].iter().all(u8::is_ascii_digit) && bytes.len() > 1
}

/// Pass 2: compiles each preprocessed line against the finished label
/// map, substituting a `NOP` for any line that fails so the returned
/// instruction vector always has exactly one word per non-blank source
/// line.
fn compile(
    lines: &[PreprocessedLine],
    source_name: &str,
    labels: &LabelMap,
    symbols: &PredefinedSymbols,
    report: &mut CompileReport,
) -> Vec<Word> {
    lines
        .iter()
        .map(|line| match compile_line(&line.statement, line.address, labels, symbols) {
            Ok(word) => word,
            Err(message) => {
                report
                    .errors
                    .push(CompileError::new(source_name, line.line_number, message));
                encode(Opcode::Nop, 0, 0)
            }
        })
        .collect()
}

/// Assembles a whole source file against the default predefined symbol
/// table. See [`assemble_with_symbols`] to compile against a non-default
/// match/tournament configuration.
pub fn assemble(source: &str, name: &str) -> (CompiledProgram, CompileReport) {
    assemble_with_symbols(source, name, &PredefinedSymbols::default())
}

pub fn assemble_with_symbols(
    source: &str,
    name: &str,
    symbols: &PredefinedSymbols,
) -> (CompiledProgram, CompileReport) {
    let mut report = CompileReport::default();
    let mut labels = LabelMap::new();

    let lines = preprocess(source, name, &mut labels, &mut report);
    let instructions = compile(&lines, name, &labels, symbols, &mut report);
    let start_offset = labels.get("start").copied().unwrap_or(0);

    let program = CompiledProgram {
        name: name.to_string(),
        start_offset,
        instructions,
    };

    debug!(
        source = name,
        lines = program.instructions.len(),
        errors = report.error_count(),
        warnings = report.warning_count(),
        "assembled"
    );

    (program, report)
}
