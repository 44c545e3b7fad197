//! Assembly diagnostics. A source line that fails to parse never aborts
//! the whole assembly: it accumulates a [`CompileError`] and is
//! substituted with a NOP so every later line keeps its original line
//! number, collecting errors rather than short-circuiting on the first one.

use thiserror::Error;

/// One diagnostic against a specific source line.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("{source_name}:{line}: {message}")]
pub struct CompileError {
    pub message: String,
    pub source_name: String,
    pub line: usize,
}

impl CompileError {
    pub fn new(source_name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        CompileError {
            message: message.into(),
            source_name: source_name.into(),
            line,
        }
    }
}

/// The result of assembling a whole source file: every error and warning
/// raised, in source order. Callers check [`CompileReport::has_errors`]
/// before trusting the accompanying [`crate::CompiledProgram`].
#[derive(Clone, Debug, Default)]
pub struct CompileReport {
    pub errors: Vec<CompileError>,
    pub warnings: Vec<CompileError>,
}

impl CompileReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}
