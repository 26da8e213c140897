//! Rendering a prompt plan
//!
//! Substitution itself belongs to Handlebars; this module only loads the
//! resolved template and hands it the plan's variables.

use std::fs;
use std::path::PathBuf;

use handlebars::Handlebars;
use thiserror::Error;
use tracing::{debug, info};

use crate::pipeline::PromptPlan;
use crate::variables::VariableSource;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template {path} does not exist")]
    Missing { path: PathBuf },

    #[error("Failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: handlebars::RenderError,
    },
}

/// Turns a plan into prompt text
pub trait Renderer {
    fn render(&self, plan: &PromptPlan) -> Result<String, RenderError>;
}

/// Renders templates with Handlebars (`{{input_text}}`, `{{schema_file}}`, ...)
///
/// Output is not HTML-escaped and unknown placeholders render as empty.
pub struct HandlebarsRenderer {
    hbs: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HandlebarsRenderer {
    fn render(&self, plan: &PromptPlan) -> Result<String, RenderError> {
        let path = &plan.template_path.absolute_path;
        debug!(?path, "HandlebarsRenderer::render: called");
        if plan.is_degraded() {
            return Err(RenderError::Missing { path: path.clone() });
        }

        let template = fs::read_to_string(path).map_err(|source| RenderError::Read {
            path: path.clone(),
            source,
        })?;

        let record = plan.variables.to_record();
        info!("Rendering {} with {} variables", path.display(), record.len());
        self.hbs
            .render_template(&template, &record)
            .map_err(|source| RenderError::Template {
                path: path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::patterns::ConfigPatternProvider;
    use crate::pipeline::{ParsedArgs, Pipeline};
    use std::path::Path;
    use tempfile::tempdir;

    fn plan_for(cwd: &Path, template: Option<&str>, args: ParsedArgs, stdin: &str) -> PromptPlan {
        if let Some(content) = template {
            let path = cwd.join(".agent/breakdown/prompts/to/project/f_project.md");
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let config = Config::bootstrap();
        let provider = ConfigPatternProvider::new("default", &config);
        Pipeline::new(&config, &provider, cwd).run(&args, stdin).unwrap()
    }

    fn to_project() -> ParsedArgs {
        ParsedArgs {
            directive: "to".to_string(),
            layer: "project".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_substitutes_variables() {
        let temp = tempdir().unwrap();
        let mut args = to_project();
        args.options.user_variables = vec![("uv-team".to_string(), "core".to_string())];
        let plan = plan_for(
            temp.path(),
            Some("Team: {{team}}\n\n{{input_text}}\n"),
            args,
            "Ship <the> & thing",
        );

        let output = HandlebarsRenderer::new().render(&plan).unwrap();
        assert_eq!(output, "Team: core\n\nShip <the> & thing\n");
    }

    #[test]
    fn test_unknown_placeholder_renders_empty() {
        let temp = tempdir().unwrap();
        let plan = plan_for(temp.path(), Some("[{{destination_path}}]"), to_project(), "");

        let output = HandlebarsRenderer::new().render(&plan).unwrap();
        assert_eq!(output, "[]");
    }

    #[test]
    fn test_degraded_plan_is_not_rendered() {
        let temp = tempdir().unwrap();
        let plan = plan_for(temp.path(), None, to_project(), "");

        let err = HandlebarsRenderer::new().render(&plan).unwrap_err();
        assert!(matches!(err, RenderError::Missing { .. }));
    }

    #[test]
    fn test_broken_template_reports_path() {
        let temp = tempdir().unwrap();
        let plan = plan_for(temp.path(), Some("{{#if}}unclosed"), to_project(), "");

        let err = HandlebarsRenderer::new().render(&plan).unwrap_err();
        assert!(matches!(err, RenderError::Template { .. }));
        assert!(err.to_string().contains("f_project.md"));
    }
}
