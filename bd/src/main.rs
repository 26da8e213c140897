//! Breakdown - prompt template resolution
//!
//! CLI entry point: `breakdown <directive> <layer> [options]` or `breakdown init`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use breakdown::cli::{Cli, Invocation, OutputFormat, normalize_args};
use breakdown::config::{self, Config, PROJECT_CONFIG_DIR};
use breakdown::patterns::ConfigPatternProvider;
use breakdown::pipeline::{Pipeline, PromptPlan};
use breakdown::render::{HandlebarsRenderer, Renderer};
use breakdown::stdin;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (WARN)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    // stdout carries the rendered prompt, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args()));
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(&cli.profile, &cwd, cli.config_file.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let invocation = cli.invocation().map_err(|e| eyre!(e))?;
    debug!(?invocation, "main: dispatching");
    match invocation {
        Invocation::Init => cmd_init(&cli, &cwd),
        Invocation::Prompt { directive, layer } => {
            let config = Config::load(&cli.profile, &cwd, cli.config_file.as_ref())
                .context(format!("Failed to load configuration for profile '{}'", cli.profile))?;
            cmd_prompt(&cli, &config, &cwd, directive, layer)
        }
    }
}

/// Resolve, then render or describe, the prompt for `<directive> <layer>`
fn cmd_prompt(cli: &Cli, config: &Config, cwd: &Path, directive: &str, layer: &str) -> Result<()> {
    let provider = ConfigPatternProvider::new(cli.profile.as_str(), config);
    let stdin_content = stdin::read_stdin(Duration::from_millis(config.stdin.timeout_ms))?;

    let args = cli.parsed_args(directive, layer);
    let plan = Pipeline::new(config, &provider, cwd).run(&args, &stdin_content)?;

    if cli.dry_run {
        return print_plan(&plan, &cli.format);
    }

    if plan.is_degraded() {
        eprintln!(
            "{} no template for '{} {}' (profile '{}'); tried:",
            "warning:".yellow().bold(),
            plan.params.directive,
            plan.params.layer,
            cli.profile
        );
        for candidate in &plan.template_path.attempted_candidates {
            eprintln!("  {}", candidate.display());
        }
        return Ok(());
    }

    let rendered = HandlebarsRenderer::new().render(&plan)?;
    print!("{}", rendered);
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn print_plan(plan: &PromptPlan, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(plan)?);
        }
        OutputFormat::Text => {
            let status = if plan.template_path.existed {
                "found".green()
            } else {
                "missing".yellow()
            };
            println!("Directive: {}", plan.params.directive.as_str().cyan());
            println!("Layer:     {}", plan.params.layer.as_str().cyan());
            println!("Template:  {} ({})", plan.template_path.absolute_path.display(), status);
            match &plan.schema_path {
                Some(schema) => println!("Schema:    {}", schema.absolute_path.display()),
                None => println!("Schema:    {}", "none".dimmed()),
            }
            println!("Variables:");
            for variable in plan.variables.iter() {
                println!("  {} = {:?} ({})", variable.key, variable.value, variable.kind.to_string().dimmed());
            }
        }
    }
    Ok(())
}

/// Write the bootstrap config for the profile and create the base directories
fn cmd_init(cli: &Cli, cwd: &Path) -> Result<()> {
    config::validate_profile_name(&cli.profile)?;
    let config = Config::bootstrap();
    let config_path = cwd.join(PROJECT_CONFIG_DIR).join(Config::app_file_name(&cli.profile));

    if config_path.exists() && !cli.force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            "•".yellow(),
            config_path.display()
        );
    } else {
        config.save(&config_path)?;
        info!("Wrote {}", config_path.display());
        println!("{} Wrote {}", "✓".green(), config_path.display());
    }

    for base_dir in [&config.app_prompt.base_dir, &config.app_schema.base_dir] {
        let dir = cwd.join(&config.working_dir).join(base_dir);
        fs::create_dir_all(&dir).context(format!("Failed to create {}", dir.display()))?;
        println!("{} Ready {}", "✓".green(), dir.display());
    }

    Ok(())
}
