//! Prompt variables
//!
//! Four kinds of variables feed one substitution namespace:
//!
//! - **standard**: `input_text_file`, `destination_path`
//! - **file path**: `schema_file`
//! - **stdin**: the single `input_text` slot
//! - **user**: `uv-<name>` on the command line, substituted as `<name>`
//!
//! Keys are unique across all kinds.

mod builder;
mod error;

pub use builder::{
    FILE_PATH_VARIABLES, STANDARD_VARIABLES, STDIN_VARIABLE, USER_PREFIX, Variable, VariableKind, VariableSet,
    VariableSource, VariablesBuilder,
};
pub use error::VariableError;
