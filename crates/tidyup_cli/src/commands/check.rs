//! Check command implementation

use miette::{IntoDiagnostic, Result, miette};
use tidyup_core::{
    CancellationToken, Config, Progress, QuietProgress, ReportRegistry, Scheduler,
    ToolRegistry, execute_reports,
};
use tidyup_tools::builtin_registry;
use tracing::{debug, info, warn};

use crate::cli::CheckArgs;
use crate::logging::original_stderr;
use crate::progress::ConsoleProgress;
use crate::utils::{create_tokio_runtime, use_colors};

/// Runs the tools and the reports. Returns whether any issue was found.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
    if !args.path.is_dir() {
        return Err(miette!(
            "Project path is not a directory: {}",
            args.path.display()
        ));
    }
    let path = args.path.canonicalize().into_diagnostic()?;

    let registry = builtin_registry();
    check_tool_names(&registry, &args.tools)?;

    let mut config = match &args.config {
        Some(file) => Config::from_file(file, &registry).into_diagnostic()?,
        None => find_config(&path, &registry)?,
    };
    apply_overrides(&mut config, args);
    config.check().into_diagnostic()?;

    let token = CancellationToken::new();
    let runtime = create_tokio_runtime()?;
    runtime.spawn(watch_interrupt(token.clone()));

    let scheduler = Scheduler::new(&registry).with_cancellation(token);
    let progress: Box<dyn Progress> = if args.disable_progress {
        Box::new(QuietProgress::new())
    } else {
        let total = scheduler.enabled_tools(&config).len() as u64;
        Box::new(ConsoleProgress::new(total, original_stderr()))
    };

    let collector = scheduler
        .run(&config, &path, progress.as_ref())
        .into_diagnostic()?;

    execute_reports(
        &config,
        &ReportRegistry::builtin(),
        &path,
        &collector,
        use_colors(),
        |report| debug!("Finished {} report", report.kind),
    )
    .into_diagnostic()?;

    Ok(collector.issue_count(false) > 0 || collector.is_failed())
}

pub fn find_config(path: &std::path::Path, registry: &ToolRegistry) -> Result<Config> {
    if let Some(file) = Config::discover(path) {
        info!("Using config: {}", file.display());
        return Config::from_file(&file, registry).into_diagnostic();
    }

    debug!("No config file found, using defaults");
    Ok(Config::defaults(registry))
}

fn check_tool_names(registry: &ToolRegistry, tools: &[String]) -> Result<()> {
    for tool in tools {
        let usable = registry.get(tool).is_some_and(|t| t.can_be_used());
        if !usable {
            let choices: Vec<&str> = registry.names().collect();
            return Err(miette!(
                "Unknown tool: {} (choose from {})",
                tool,
                choices.join(", ")
            ));
        }
    }
    Ok(())
}

/// Applies command line options over the loaded configuration.
fn apply_overrides(config: &mut Config, args: &CheckArgs) {
    if !args.excludes.is_empty() {
        config.exclude = args.excludes.clone();
    }
    if args.disable_merge {
        config.merge_issues = false;
    }
    if args.disable_noqa {
        config.noqa = false;
    }
    if let Some(workers) = args.workers {
        config.workers = usize::from(workers);
    }
    if !args.tools.is_empty() {
        for (name, tool) in config.tools.iter_mut() {
            tool.enabled = args.tools.contains(name);
        }
    }
    if !args.reports.is_empty() {
        config.reports = args.reports.clone();
    }
}

async fn watch_interrupt(token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    warn!("Interrupted, waiting for running tools to finish");
    token.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        std::process::exit(130);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn check_args(argv: &[&str]) -> CheckArgs {
        let mut full = vec!["tidyup", "check"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Check(args) => args,
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_overrides() {
        let registry = builtin_registry();
        let mut config = Config::defaults(&registry);
        let args = check_args(&[
            "-x",
            r"^build/",
            "-t",
            "todo",
            "-r",
            "json:out.json",
            "--workers",
            "2",
            "--disable-merge",
            "--disable-noqa",
        ]);
        apply_overrides(&mut config, &args);

        assert_eq!(config.exclude, vec![r"^build/"]);
        assert!(!config.merge_issues);
        assert!(!config.noqa);
        assert_eq!(config.workers, 2);
        assert!(config.tool("todo").unwrap().enabled);
        assert!(!config.tool("whitespace").unwrap().enabled);
        assert_eq!(config.reports.len(), 1);
        assert_eq!(config.reports[0].kind, "json");
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let registry = builtin_registry();
        let mut config = Config::defaults(&registry);
        let expected = config.clone();
        apply_overrides(&mut config, &check_args(&[]));
        assert_eq!(config, expected);
    }

    #[test]
    fn test_unknown_tool() {
        let registry = builtin_registry();
        assert!(check_tool_names(&registry, &["todo".to_string()]).is_ok());
        let err = check_tool_names(&registry, &["pylint".to_string()]).unwrap_err();
        assert!(err.to_string().starts_with("Unknown tool: pylint"));
    }
}
