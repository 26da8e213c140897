//! Validated directive and layer tokens
//!
//! `DirectiveType` and `LayerType` can only be obtained from a [`TypeFactory`],
//! so holding one means the raw token satisfied the profile pattern that was
//! active when it was built.

mod error;
mod factory;

pub use error::{TokenKind, TypeError};
pub use factory::{DirectiveType, LayerType, TwoParams, TypeFactory};
