//! Template and schema path resolution
//!
//! Every path is composed as
//! `{cwd}/{working_dir}/{base_dir}/{directive}/{layer}/{filename}`. The
//! working directory and base directory always come from configuration and
//! are always combined; nothing resolves relative to `base_dir` alone.

mod error;
mod resolver;

pub use error::PathError;
pub use resolver::{FileNaming, PathRequest, PathResolver, ResolvedPath};
