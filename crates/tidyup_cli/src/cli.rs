//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tidyup_core::{ReportConfig, ReportRegistry};

/// tidyup - Runs several analysis tools on a project and aggregates the results
#[derive(Parser)]
#[command(name = "tidyup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute the tools upon the project files
    Check(CheckArgs),

    /// Output a listing of all known issue codes that tools may report
    ListCodes {
        /// Only list the codes of this tool (repeatable)
        #[arg(short, long = "tool", value_name = "TOOL")]
        tools: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::Toml)]
        format: ListFormat,
    },

    /// Output a default configuration to bootstrap your own
    DefaultConfig,

    /// Output a listing of the available tools and reports
    Extensions {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::Toml)]
        format: ListFormat,
    },
}

#[derive(Args)]
pub struct CheckArgs {
    /// Base directory of the project to examine
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Regular expression of paths to exclude (repeatable, overrides the configuration)
    #[arg(short = 'x', long = "exclude", value_name = "REGEX")]
    pub excludes: Vec<String>,

    /// Tool to use (repeatable, overrides the configuration)
    #[arg(short, long = "tool", value_name = "TOOL")]
    pub tools: Vec<String>,

    /// Report to produce, optionally written to a file (repeatable)
    #[arg(short, long = "report", value_name = "TYPE[:FILE]", value_parser = parse_report)]
    pub reports: Vec<ReportConfig>,

    /// Configuration file to use instead of the discovered one
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of tools to run concurrently
    #[arg(long, value_name = "NUM", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Do not merge equivalent issues reported by different tools
    #[arg(long)]
    pub disable_merge: bool,

    /// Do not display the progress bar
    #[arg(long)]
    pub disable_progress: bool,

    /// Ignore "# noqa" comments
    #[arg(long)]
    pub disable_noqa: bool,
}

/// Output format of `list-codes` and `extensions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Toml,
    Yaml,
    Json,
    Csv,
}

/// Parses `TYPE[:FILE]`.
pub fn parse_report(value: &str) -> Result<ReportConfig, String> {
    let (kind, file) = match value.split_once(':') {
        Some((kind, file)) => (kind, Some(file)),
        None => (value, None),
    };

    let registry = ReportRegistry::builtin();
    if registry.get(kind).is_none() {
        let choices: Vec<&str> = registry.names().collect();
        return Err(format!(
            "invalid choice: {}. (choose from {})",
            value,
            choices.join(",")
        ));
    }

    let report = ReportConfig::new(kind);
    Ok(match file {
        Some(file) if !file.is_empty() => report.with_file(file),
        _ => report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_report() {
        let report = parse_report("json").unwrap();
        assert_eq!(report.kind, "json");
        assert_eq!(report.file, None);

        let report = parse_report("csv:out/issues.csv").unwrap();
        assert_eq!(report.kind, "csv");
        assert_eq!(report.file, Some(PathBuf::from("out/issues.csv")));
    }

    #[test]
    fn test_parse_report_rejects_unknown() {
        let err = parse_report("html:x.html").unwrap_err();
        assert!(err.starts_with("invalid choice: html:x.html"));
        assert!(err.contains("console"));
    }

    #[test]
    fn test_check_defaults() {
        let cli = Cli::try_parse_from(["tidyup", "check"]).unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.path, PathBuf::from("."));
        assert!(args.reports.is_empty());
        assert_eq!(args.workers, None);
    }

    #[test]
    fn test_listing_formats() {
        let cli = Cli::try_parse_from(["tidyup", "list-codes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::ListCodes { format: ListFormat::Toml, .. }
        ));

        let cli = Cli::try_parse_from(["tidyup", "extensions", "--format", "yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Extensions { format: ListFormat::Yaml }
        ));

        assert!(Cli::try_parse_from(["tidyup", "list-codes", "--format", "text"]).is_err());
    }

    #[test]
    fn test_workers_must_be_positive() {
        assert!(Cli::try_parse_from(["tidyup", "check", "--workers", "0"]).is_err());
        assert!(Cli::try_parse_from(["tidyup", "check", "--workers", "2"]).is_ok());
    }
}
