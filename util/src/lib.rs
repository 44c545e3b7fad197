//! Small shared bits used by both the VM and the assembler: a typed error
//! for `from_str`-style enum parsing, derived via `util-derive`.

use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("failed to parse \"{value}\" as {enum_name}")]
pub struct ParseEnumError {
    pub value: String,
    pub enum_name: &'static str,
}

pub trait EnumFromStr: Sized {
    fn from_str(s: &str) -> Result<Self, ParseEnumError>;
}
