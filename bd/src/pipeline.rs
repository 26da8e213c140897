//! Prompt pipeline
//!
//! Sequences token validation, template/schema resolution and variable
//! collection for one invocation. The result is a [`PromptPlan`] ready for a
//! [`Renderer`](crate::render::Renderer).

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::path::{PathError, PathRequest, PathResolver, ResolvedPath};
use crate::patterns::PatternProvider;
use crate::types::{TwoParams, TypeError, TypeFactory};
use crate::variables::{VariableError, VariableSet, VariablesBuilder};

/// Options that shape a prompt lookup, from the command line
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// Input file, exposed as `input_text_file`
    pub from_file: Option<PathBuf>,
    /// Output location, exposed as `destination_path`
    pub destination: Option<PathBuf>,
    /// Layer that names the template file, validated against the layer pattern
    pub from_layer: Option<String>,
    /// Template variant suffix
    pub adaptation: Option<String>,
    /// `(uv-name, value)` pairs
    pub user_variables: Vec<(String, String)>,
    /// Never fall back from an adaptation template to the base template
    pub strict_adaptation: bool,
    /// Let later user variables replace earlier ones
    pub allow_duplicate_variables: bool,
}

/// Raw tokens and options of a two-token invocation
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    pub directive: String,
    pub layer: String,
    pub options: PromptOptions,
}

/// Everything the renderer needs
#[derive(Debug, Clone, Serialize)]
pub struct PromptPlan {
    pub params: TwoParams,
    pub template_path: ResolvedPath,
    pub schema_path: Option<ResolvedPath>,
    pub variables: VariableSet,
}

impl PromptPlan {
    /// The template was not found; validation still succeeded
    pub fn is_degraded(&self) -> bool {
        !self.template_path.existed
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Invalid variables: {}", join_errors(.0))]
    Variables(Vec<VariableError>),
}

fn join_errors(errors: &[VariableError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

/// Runs the prompt pipeline for one profile
///
/// All profile state is passed in; nothing is read from the environment.
pub struct Pipeline<'a> {
    config: &'a Config,
    provider: &'a dyn PatternProvider,
    cwd: &'a Path,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, provider: &'a dyn PatternProvider, cwd: &'a Path) -> Self {
        Self { config, provider, cwd }
    }

    pub fn run(&self, args: &ParsedArgs, stdin: &str) -> Result<PromptPlan, PipelineError> {
        debug!(
            directive = %args.directive,
            layer = %args.layer,
            profile = %self.provider.profile(),
            "Pipeline::run: called"
        );
        let options = &args.options;

        let factory = TypeFactory::new(self.provider);
        let params = factory.create_both_types(&args.directive, &args.layer)?;
        let from_layer = options
            .from_layer
            .as_deref()
            .map(|raw| factory.create_layer_type(raw))
            .transpose()?;

        let request = PathRequest::new(&params)
            .with_from_layer(from_layer.as_ref())
            .with_adaptation(options.adaptation.as_deref());

        let fallback = self.config.resolver.adaptation_fallback && !options.strict_adaptation;
        let template_resolver =
            PathResolver::new(self.cwd, &self.config.working_dir, &self.config.app_prompt.base_dir)?
                .with_adaptation_fallback(fallback);
        let template_path = match template_resolver.resolve(&request) {
            Ok(resolved) => resolved,
            Err(PathError::TemplateNotFound { attempted }) => {
                warn!(
                    "No template for '{} {}' under {}",
                    params.directive,
                    params.layer,
                    template_resolver.base().display()
                );
                ResolvedPath::missing(attempted)
            }
            Err(e) => return Err(e.into()),
        };

        let schema_resolver = PathResolver::for_schema(
            self.cwd,
            &self.config.working_dir,
            &self.config.app_schema.base_dir,
            self.config.app_schema.filename.clone(),
        )?;
        let schema_path = match schema_resolver.resolve(&request) {
            Ok(resolved) => Some(resolved),
            Err(PathError::TemplateNotFound { .. }) => {
                debug!("Pipeline::run: no schema file");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let allow_duplicates =
            self.config.variables.allow_duplicate_user_variables || options.allow_duplicate_variables;
        let mut builder = VariablesBuilder::new().with_duplicate_user_variables(allow_duplicates);
        if let Some(from_file) = &options.from_file {
            builder.add_standard("input_text_file", from_file.display().to_string());
        }
        if let Some(destination) = &options.destination {
            builder.add_standard("destination_path", destination.display().to_string());
        }
        if let Some(schema) = &schema_path {
            builder.add_file_path("schema_file", schema.absolute_path.display().to_string());
        }
        builder.add_stdin(stdin);
        builder.add_user_assignments(&options.user_variables);
        let variables = builder.build().map_err(PipelineError::Variables)?;

        info!(
            "Planned '{} {}' -> {} ({} variables)",
            params.directive,
            params.layer,
            template_path.absolute_path.display(),
            variables.len()
        );

        Ok(PromptPlan {
            params,
            template_path,
            schema_path,
            variables,
        })
    }
}
