//! Integration tests for parallel tool execution.
//!
//! These tests verify failure isolation, progress bookkeeping and output
//! capture when several tools run on a worker pool.

use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tidyup_core::{
    AGGREGATOR_TOOL, CodeInfo, Config, Finder, Issue, Progress, QuietProgress, Result, RunState,
    Scheduler, SeverityClass, TidyError, Tool, ToolConfig, ToolRegistry,
};

enum Behavior {
    PerFile,
    Fail,
    Panic,
    Print,
    PrintBoth,
}

struct FakeTool {
    name: &'static str,
    behavior: Behavior,
}

impl FakeTool {
    fn new(name: &'static str, behavior: Behavior) -> Self {
        Self { name, behavior }
    }
}

impl Tool for FakeTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "test tool"
    }

    fn can_be_used(&self) -> bool {
        true
    }

    fn default_config(&self) -> ToolConfig {
        ToolConfig::with_filters([r"\.txt$"])
    }

    fn all_codes(&self) -> Vec<CodeInfo> {
        vec![CodeInfo::new("found", "Found something")]
    }

    fn execute(&self, finder: &Finder, config: &ToolConfig) -> Result<Vec<Issue>> {
        match self.behavior {
            Behavior::PerFile => {
                let mut issues: Vec<Issue> = finder
                    .files(&config.filters)?
                    .into_iter()
                    .map(|path| Issue::new(self.name, "found", "Found something", path))
                    .collect();
                config.retain_enabled(&mut issues);
                Ok(issues)
            }
            Behavior::Fail => Err(TidyError::tool("could not start")),
            Behavior::Panic => panic!("tool exploded"),
            Behavior::Print => {
                let mut stdout = std::io::stdout();
                write!(stdout, "chatty tool").unwrap();
                stdout.flush().unwrap();
                Ok(Vec::new())
            }
            Behavior::PrintBoth => {
                let mut stdout = std::io::stdout();
                write!(stdout, "noisy on stdout").unwrap();
                stdout.flush().unwrap();
                let mut stderr = std::io::stderr();
                write!(stderr, "noisy on stderr").unwrap();
                stderr.flush().unwrap();
                Ok(Vec::new())
            }
        }
    }
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("one.txt"), "1\n").unwrap();
    fs::write(dir.path().join("two.txt"), "2\n").unwrap();
    fs::write(dir.path().join("skip.md"), "3\n").unwrap();
    dir
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl Progress for RecordingProgress {
    fn on_start(&self) {
        self.events.lock().push("start".to_string());
    }

    fn on_tool_start(&self, tool: &str) {
        self.events.lock().push(format!("tool_start:{}", tool));
    }

    fn on_tool_finish(&self, tool: &str) {
        self.events.lock().push(format!("tool_finish:{}", tool));
    }

    fn on_finish(&self) {
        self.events.lock().push("finish".to_string());
    }
}

#[test]
fn test_zero_tools_emits_start_then_finish() {
    let dir = project();
    let registry = ToolRegistry::new();
    let progress = RecordingProgress::default();

    let scheduler = Scheduler::new(&registry);
    let collector = scheduler
        .run(&Config::defaults(&registry), dir.path(), &progress)
        .unwrap();

    assert_eq!(collector.issue_count(false), 0);
    assert_eq!(*progress.events.lock(), vec!["start", "finish"]);
    assert_eq!(scheduler.state(), RunState::Completed);
}

#[test]
fn test_all_tools_disabled_is_like_zero_tools() {
    let dir = project();
    let mut registry = ToolRegistry::new();
    registry.register(FakeTool::new("alpha", Behavior::PerFile));
    let mut config = Config::defaults(&registry);
    config.tools.get_mut("alpha").unwrap().enabled = false;

    let progress = RecordingProgress::default();
    let collector = Scheduler::new(&registry)
        .run(&config, dir.path(), &progress)
        .unwrap();

    assert_eq!(collector.issue_count(true), 0);
    assert_eq!(*progress.events.lock(), vec!["start", "finish"]);
}

#[test]
fn test_crashing_tools_are_isolated() {
    let dir = project();
    let mut registry = ToolRegistry::new();
    registry
        .register(FakeTool::new("alpha", Behavior::PerFile))
        .register(FakeTool::new("beta", Behavior::PerFile))
        .register(FakeTool::new("broken", Behavior::Fail))
        .register(FakeTool::new("exploding", Behavior::Panic));
    let mut config = Config::defaults(&registry);
    config.workers = 3;

    let progress = QuietProgress::new();
    let scheduler = Scheduler::new(&registry).capture_output(false);
    let collector = scheduler.run(&config, dir.path(), &progress).unwrap();

    assert_eq!(scheduler.state(), RunState::Completed);
    assert!(!collector.is_failed());

    let issues = collector.get_issues(None);
    let by_tool = |tool: &str| issues.iter().filter(|i| i.tool == tool).count();
    assert_eq!(by_tool("alpha"), 2);
    assert_eq!(by_tool("beta"), 2);

    let failures: Vec<&Issue> = issues
        .iter()
        .filter(|i| i.tool == AGGREGATOR_TOOL)
        .collect();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|i| i.severity == SeverityClass::Fatal));
    assert!(failures.iter().all(|i| i.code_str() == "tool"));
    assert!(
        failures
            .iter()
            .any(|i| i.message.starts_with("broken failed horribly:\n"))
    );
    assert!(
        failures
            .iter()
            .any(|i| i.message.starts_with("exploding failed horribly:\n")
                && i.message.contains("tool exploded"))
    );

    let mut completed = progress.completed_tools();
    completed.sort();
    assert_eq!(completed, vec!["alpha", "beta", "broken", "exploding"]);
    assert!(progress.current_tools().is_empty());
}

#[test]
fn test_progress_events_are_consistent_per_tool() {
    let dir = project();
    let mut registry = ToolRegistry::new();
    for name in ["a", "b", "c", "d", "e", "f"] {
        registry.register(FakeTool::new(name, Behavior::PerFile));
    }
    let mut config = Config::defaults(&registry);
    config.workers = 4;

    let progress = RecordingProgress::default();
    Scheduler::new(&registry)
        .capture_output(false)
        .run(&config, dir.path(), &progress)
        .unwrap();

    let events = progress.events.lock();
    assert_eq!(events.first().map(String::as_str), Some("start"));
    assert_eq!(events.last().map(String::as_str), Some("finish"));
    for name in ["a", "b", "c", "d", "e", "f"] {
        let start = events
            .iter()
            .position(|e| *e == format!("tool_start:{}", name))
            .unwrap();
        let finish = events
            .iter()
            .position(|e| *e == format!("tool_finish:{}", name))
            .unwrap();
        assert!(start < finish);
    }
}

#[test]
fn test_results_do_not_depend_on_worker_count() {
    let dir = project();
    let mut registry = ToolRegistry::new();
    for name in ["a", "b", "c", "d"] {
        registry.register(FakeTool::new(name, Behavior::PerFile));
    }

    let run = |workers: usize| {
        let mut config = Config::defaults(&registry);
        config.workers = workers;
        Scheduler::new(&registry)
            .capture_output(false)
            .run(&config, dir.path(), &QuietProgress::new())
            .unwrap()
            .get_issues(None)
    };

    assert_eq!(run(1), run(4));
}

#[test]
fn test_per_tool_disabled_codes_are_applied_by_the_tool() {
    let dir = project();
    let mut registry = ToolRegistry::new();
    registry.register(FakeTool::new("alpha", Behavior::PerFile));
    let mut config = Config::defaults(&registry);
    config.tools.get_mut("alpha").unwrap().disabled = vec!["found".to_string()];

    let collector = Scheduler::new(&registry)
        .capture_output(false)
        .run(&config, dir.path(), &QuietProgress::new())
        .unwrap();
    assert_eq!(collector.issue_count(true), 0);
}

#[cfg(unix)]
#[test]
fn test_tool_output_becomes_an_issue() {
    let dir = project();
    let mut registry = ToolRegistry::new();
    registry.register(FakeTool::new("chatty", Behavior::Print));

    let collector = Scheduler::new(&registry)
        .run(&Config::defaults(&registry), dir.path(), &QuietProgress::new())
        .unwrap();

    let issues = collector.get_issues(None);
    let stdout = issues
        .iter()
        .find(|i| i.message.starts_with("Tool(s) wrote to stdout:\n"))
        .unwrap();
    assert_eq!(stdout.tool, AGGREGATOR_TOOL);
    assert!(stdout.message.contains("chatty tool"));
    assert_eq!(stdout.severity, SeverityClass::Error);
}

#[cfg(unix)]
#[test]
fn test_every_tool_report_survives_merging() {
    let dir = project();
    let mut registry = ToolRegistry::new();
    registry
        .register(FakeTool::new("broken", Behavior::Fail))
        .register(FakeTool::new("exploding", Behavior::Panic))
        .register(FakeTool::new("noisy", Behavior::PrintBoth));
    let config = Config::defaults(&registry);
    assert!(config.merge_issues);

    let collector = Scheduler::new(&registry)
        .run(&config, dir.path(), &QuietProgress::new())
        .unwrap();

    let issues = collector.get_issues(None);
    let reports: Vec<&Issue> = issues.iter().filter(|i| i.is_tool_report()).collect();
    let crashes = reports
        .iter()
        .filter(|i| i.severity == SeverityClass::Fatal)
        .count();
    assert_eq!(crashes, 2);
    assert!(reports.iter().any(|i| i.message.starts_with("broken failed horribly")));
    assert!(reports.iter().any(|i| i.message.starts_with("exploding failed horribly")));
    assert!(reports.iter().any(|i| {
        i.message.starts_with("Tool(s) wrote to stdout") && i.message.contains("noisy on stdout")
    }));
    assert!(reports.iter().any(|i| {
        i.message.starts_with("Tool(s) wrote to stderr") && i.message.contains("noisy on stderr")
    }));
}

#[test]
fn test_failed_run_still_finishes_progress() {
    let mut registry = ToolRegistry::new();
    registry.register(FakeTool::new("alpha", Behavior::PerFile));
    let progress = RecordingProgress::default();

    let scheduler = Scheduler::new(&registry).capture_output(false);
    let result = scheduler.run(
        &Config::defaults(&registry),
        std::path::Path::new("/definitely/not/a/project"),
        &progress,
    );

    assert!(result.is_err());
    assert_eq!(scheduler.state(), RunState::Failed);
    assert_eq!(*progress.events.lock(), vec!["start", "finish"]);
}

#[test]
fn test_interrupt_skips_pending_tools() {
    struct Interrupting {
        calls: Arc<AtomicUsize>,
        token: tidyup_core::CancellationToken,
    }

    impl Tool for Interrupting {
        fn name(&self) -> &str {
            "interrupting"
        }

        fn description(&self) -> &str {
            "cancels the run while executing"
        }

        fn can_be_used(&self) -> bool {
            true
        }

        fn default_config(&self) -> ToolConfig {
            ToolConfig::default()
        }

        fn all_codes(&self) -> Vec<CodeInfo> {
            Vec::new()
        }

        fn execute(&self, _finder: &Finder, _config: &ToolConfig) -> Result<Vec<Issue>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.token.cancel();
            Ok(Vec::new())
        }
    }

    let dir = project();
    let token = tidyup_core::CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut registry = ToolRegistry::new();
    registry.register(Interrupting {
        calls: Arc::clone(&calls),
        token: token.clone(),
    });
    for name in ["x1", "x2", "x3"] {
        registry.register(FakeTool::new(name, Behavior::PerFile));
    }
    let mut config = Config::defaults(&registry);
    config.workers = 1;

    let scheduler = Scheduler::new(&registry)
        .capture_output(false)
        .with_cancellation(token);
    let collector = scheduler
        .run(&config, dir.path(), &QuietProgress::new())
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.state(), RunState::Interrupted);
    assert!(collector.is_failed());
    assert_eq!(collector.issue_count(true), 0);
}
