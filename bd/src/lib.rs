//! Breakdown - configuration-driven prompt resolution
//!
//! Turns a two-token invocation such as `breakdown to project` into a resolved
//! prompt template plus the variables to render it with.
//!
//! # Pipeline
//!
//! ```text
//! profile config ──► PatternProvider ──► TypeFactory ──► DirectiveType / LayerType
//!                                                              │
//! working-dir + base-dir ─────────────────────────────► PathResolver ──► ResolvedPath
//!                                                              │
//! CLI options + stdin ────────────────────────────► VariablesBuilder ──► VariableSet
//!                                                              │
//!                                                         PromptPlan ──► Renderer
//! ```
//!
//! Accepted directive and layer values are never hardcoded: they are whatever
//! the active profile's patterns accept.
//!
//! # Example
//!
//! ```ignore
//! use breakdown::{Config, ConfigPatternProvider, ParsedArgs, Pipeline};
//!
//! let config = Config::load("default", &cwd, None)?;
//! let provider = ConfigPatternProvider::new("default", &config);
//! let plan = Pipeline::new(&config, &provider, &cwd).run(&args, "")?;
//! println!("{}", plan.template_path.absolute_path.display());
//! ```

pub mod cli;
pub mod config;
pub mod path;
pub mod patterns;
pub mod pipeline;
pub mod render;
pub mod stdin;
pub mod types;
pub mod variables;

pub use config::Config;
pub use path::{PathError, PathRequest, PathResolver, ResolvedPath};
pub use patterns::{ConfigPatternProvider, Pattern, PatternProvider, PatternSet};
pub use pipeline::{ParsedArgs, Pipeline, PipelineError, PromptOptions, PromptPlan};
pub use render::{HandlebarsRenderer, RenderError, Renderer};
pub use types::{DirectiveType, LayerType, TokenKind, TwoParams, TypeError, TypeFactory};
pub use variables::{Variable, VariableError, VariableKind, VariableSet, VariableSource, VariablesBuilder};
