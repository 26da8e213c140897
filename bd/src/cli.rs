//! CLI argument parsing for breakdown

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_PROFILE;
use crate::pipeline::{ParsedArgs, PromptOptions};

/// Breakdown - resolve a prompt template from `<directive> <layer>`
#[derive(Parser, Debug)]
#[command(name = "breakdown")]
#[command(
    version,
    about = "Resolve and render prompt templates from a directive and a layer",
    after_help = "User variables: --uv-NAME=VALUE (or --var uv-NAME=VALUE) is available as {{NAME}}"
)]
pub struct Cli {
    /// `<directive> <layer>` (e.g. `to project`), or a single command (`init`)
    #[arg(value_name = "PARAMS", num_args = 1..=2, required = true)]
    pub params: Vec<String>,

    /// Configuration profile
    #[arg(short = 'c', long = "config", value_name = "PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Load this config file instead of searching for the profile
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Input file, available as {{input_text_file}}
    #[arg(short = 'f', long = "from", value_name = "FILE")]
    pub from: Option<PathBuf>,

    /// Output destination, available as {{destination_path}}
    #[arg(short = 'o', long, value_name = "PATH")]
    pub destination: Option<PathBuf>,

    /// Layer whose template file is used instead of the destination layer's
    #[arg(short = 'i', long = "input", value_name = "LAYER")]
    pub input: Option<String>,

    /// Template variant, selects f_<layer>_<ADAPTATION>.md
    #[arg(short = 'a', long, value_name = "NAME")]
    pub adaptation: Option<String>,

    /// User variable
    #[arg(long = "var", value_name = "uv-NAME=VALUE", value_parser = parse_assignment)]
    pub vars: Vec<(String, String)>,

    /// Fail instead of falling back when the adaptation template is missing
    #[arg(long)]
    pub strict_adaptation: bool,

    /// Let a later user variable replace an earlier one with the same name
    #[arg(long)]
    pub allow_duplicate_vars: bool,

    /// Print the resolved plan instead of rendering
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for --dry-run
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Overwrite existing files (init)
    #[arg(long)]
    pub force: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// What the positional tokens ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation<'a> {
    /// Create the config and directory layout for the profile
    Init,
    /// Resolve and render a prompt
    Prompt { directive: &'a str, layer: &'a str },
}

impl Cli {
    /// Classify positional tokens by count
    pub fn invocation(&self) -> Result<Invocation<'_>, String> {
        match self.params.as_slice() {
            [command] if command == "init" => Ok(Invocation::Init),
            [command] => Err(format!(
                "Unknown command '{}': expected `<directive> <layer>` or `init`",
                command
            )),
            [directive, layer] => Ok(Invocation::Prompt { directive, layer }),
            _ => Err(format!("Expected 1 or 2 arguments, got {}", self.params.len())),
        }
    }

    /// Raw tokens and options for the prompt pipeline
    pub fn parsed_args(&self, directive: &str, layer: &str) -> ParsedArgs {
        ParsedArgs {
            directive: directive.to_string(),
            layer: layer.to_string(),
            options: PromptOptions {
                from_file: self.from.clone(),
                destination: self.destination.clone(),
                from_layer: self.input.clone(),
                adaptation: self.adaptation.clone(),
                user_variables: self.vars.clone(),
                strict_adaptation: self.strict_adaptation,
                allow_duplicate_variables: self.allow_duplicate_vars,
            },
        }
    }
}

/// Rewrite `--uv-NAME=VALUE` into `--var uv-NAME=VALUE` so clap can parse it
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for arg in args {
        if passthrough {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
        } else if let Some(assignment) = arg.strip_prefix("--").filter(|rest| rest.starts_with("uv-")) {
            out.push("--var".to_string());
            out.push(assignment.to_string());
        } else {
            out.push(arg);
        }
    }
    out
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) => Ok((name.to_string(), value.to_string())),
        None => Err(format!("expected uv-NAME=VALUE, got '{}'", s)),
    }
}

/// Output format for --dry-run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(normalize_args(args.iter().map(|s| s.to_string())))
    }

    #[test]
    fn test_cli_parse_two_params() {
        let cli = parse(&["breakdown", "to", "project"]);
        assert_eq!(
            cli.invocation(),
            Ok(Invocation::Prompt {
                directive: "to",
                layer: "project"
            })
        );
        assert_eq!(cli.profile, "default");
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = parse(&["breakdown", "init", "--force"]);
        assert_eq!(cli.invocation(), Ok(Invocation::Init));
        assert!(cli.force);
    }

    #[test]
    fn test_cli_unknown_single_token() {
        let cli = parse(&["breakdown", "to"]);
        assert!(cli.invocation().unwrap_err().contains("'to'"));
    }

    #[test]
    fn test_cli_rejects_three_params() {
        let result = Cli::try_parse_from(["breakdown", "to", "project", "extra"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_options() {
        let cli = parse(&[
            "breakdown",
            "summary",
            "issue",
            "-c",
            "search",
            "-f",
            "input.md",
            "-o",
            "out.md",
            "-i",
            "task",
            "-a",
            "strict",
            "--strict-adaptation",
            "--allow-duplicate-vars",
            "--dry-run",
            "--format",
            "json",
        ]);

        assert_eq!(cli.profile, "search");
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.dry_run);

        let args = cli.parsed_args("summary", "issue");
        assert_eq!(args.directive, "summary");
        assert_eq!(args.options.from_file, Some(PathBuf::from("input.md")));
        assert_eq!(args.options.destination, Some(PathBuf::from("out.md")));
        assert_eq!(args.options.from_layer.as_deref(), Some("task"));
        assert_eq!(args.options.adaptation.as_deref(), Some("strict"));
        assert!(args.options.strict_adaptation);
        assert!(args.options.allow_duplicate_variables);
    }

    #[test]
    fn test_cli_user_variables() {
        let cli = parse(&[
            "breakdown",
            "to",
            "task",
            "--uv-author=alice",
            "--var",
            "uv-note=a=b",
            "--uv-empty=",
        ]);

        assert_eq!(
            cli.vars,
            vec![
                ("uv-author".to_string(), "alice".to_string()),
                ("uv-note".to_string(), "a=b".to_string()),
                ("uv-empty".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_cli_var_without_value_is_rejected() {
        let result = Cli::try_parse_from(normalize_args(
            ["breakdown", "to", "task", "--uv-author"].iter().map(|s| s.to_string()),
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_args_stops_at_separator() {
        let args = normalize_args(["breakdown", "--uv-a=1", "--", "--uv-b=2"].iter().map(|s| s.to_string()));
        assert_eq!(args, vec!["breakdown", "--var", "uv-a=1", "--", "--uv-b=2"]);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("table".parse::<OutputFormat>().is_err());
    }
}
