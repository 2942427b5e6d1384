//! Parallel tool execution.
//!
//! Every enabled tool is one unit of work. Units are pushed onto a queue
//! that a fixed number of worker threads drain, so slow tools do not hold
//! up the rest. Tool errors and panics become issues; they never abort the
//! run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::capture::{CapturedOutput, OutputCapture};
use crate::collector::Collector;
use crate::config::{Config, ToolConfig};
use crate::error::{Result, TidyError};
use crate::finder::Finder;
use crate::issue::Issue;
use crate::progress::Progress;
use crate::tool::{Tool, ToolRegistry};

/// Shared flag used to interrupt a run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that no further tools are started.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Interrupted,
    /// The run could not be carried out.
    Failed,
}

struct Unit {
    tool: Arc<dyn Tool>,
    config: ToolConfig,
}

/// Runs the enabled tools of a registry and collects their issues.
pub struct Scheduler<'a> {
    registry: &'a ToolRegistry,
    capture_output: bool,
    cancellation: CancellationToken,
    state: Mutex<RunState>,
}

impl<'a> Scheduler<'a> {
    pub fn new(registry: &'a ToolRegistry) -> Self {
        Self {
            registry,
            capture_output: true,
            cancellation: CancellationToken::new(),
            state: Mutex::new(RunState::NotStarted),
        }
    }

    /// Whether stdout and stderr are captured while tools run. On by default.
    pub fn capture_output(mut self, yes: bool) -> Self {
        self.capture_output = yes;
        self
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock() = state;
    }

    /// Tools that are enabled in `config` and usable here, with the
    /// configuration each one will receive.
    pub fn enabled_tools(&self, config: &Config) -> Vec<(Arc<dyn Tool>, ToolConfig)> {
        self.registry
            .iter()
            .filter_map(|tool| {
                let tool_config = config
                    .tool(tool.name())
                    .cloned()
                    .unwrap_or_else(|| tool.default_config());
                if !tool_config.enabled {
                    return None;
                }
                if !tool.can_be_used() {
                    debug!("Tool {} cannot be used in this environment", tool.name());
                    return None;
                }
                Some((Arc::clone(tool), tool_config))
            })
            .collect()
    }

    /// Runs every enabled tool against `project_path`.
    ///
    /// Only failures that prevent the run from happening at all, such as an
    /// unreadable project directory or a worker thread that cannot be
    /// spawned, are returned as errors.
    pub fn run(
        &self,
        config: &Config,
        project_path: &Path,
        progress: &dyn Progress,
    ) -> Result<Collector> {
        self.set_state(RunState::Running);
        progress.on_start();

        let collector = Collector::new(config);
        let units: Vec<Unit> = self
            .enabled_tools(config)
            .into_iter()
            .map(|(tool, config)| Unit { tool, config })
            .collect();

        if units.is_empty() {
            info!("No tools enabled");
            progress.on_finish();
            self.set_state(RunState::Completed);
            return Ok(collector);
        }

        let finder = Finder::new(project_path, config).map_err(|e| self.abort(progress, e))?;
        let workers = config.workers.max(1).min(units.len());
        info!("Running {} tools on {} workers", units.len(), workers);

        let capture = if self.capture_output {
            let capture = OutputCapture::start().map_err(|e| self.abort(progress, e.into()))?;
            Some(capture)
        } else {
            None
        };
        let failures = self
            .execute_units(units, workers, &finder, &collector, progress)
            .map_err(|e| self.abort(progress, e))?;
        let output = capture.and_then(|capture| match capture.finish() {
            Ok(output) => Some(output),
            Err(e) => {
                warn!("Could not read captured tool output: {}", e);
                None
            }
        });

        for (tool, reason) in &failures {
            warn!("Tool {} failed: {}", tool, reason);
        }
        if let Some(output) = output {
            collector.add_issues(output_issues(output, finder.project_path()));
        }

        if self.cancellation.is_cancelled() {
            warn!("Run interrupted");
            collector.mark_failed();
            self.set_state(RunState::Interrupted);
        } else {
            self.set_state(RunState::Completed);
        }
        progress.on_finish();

        Ok(collector)
    }

    /// Ends a run that could not be carried out.
    fn abort(&self, progress: &dyn Progress, error: TidyError) -> TidyError {
        debug!("Run failed: {}", error);
        self.set_state(RunState::Failed);
        progress.on_finish();
        error
    }

    fn execute_units(
        &self,
        units: Vec<Unit>,
        workers: usize,
        finder: &Finder,
        collector: &Collector,
        progress: &dyn Progress,
    ) -> Result<Vec<(String, String)>> {
        let (tx, rx) = crossbeam_channel::unbounded::<Unit>();
        for unit in units {
            // The receiver is alive, so sending cannot fail.
            let _ = tx.send(unit);
        }
        drop(tx);

        let failures = Mutex::new(Vec::new());

        thread::scope(|scope| -> Result<()> {
            let mut handles = Vec::with_capacity(workers);
            for index in 0..workers {
                let rx = rx.clone();
                let failures = &failures;
                let handle = thread::Builder::new()
                    .name(format!("tidyup-worker-{}", index))
                    .spawn_scoped(scope, move || {
                        while let Ok(unit) = rx.recv() {
                            if self.cancellation.is_cancelled() {
                                debug!("Skipping {} after interrupt", unit.tool.name());
                                continue;
                            }
                            if let Some(failure) =
                                execute_unit(&unit, finder, collector, progress)
                            {
                                failures.lock().push(failure);
                            }
                        }
                    })?;
                handles.push(handle);
            }

            for handle in handles {
                handle
                    .join()
                    .map_err(|_| TidyError::tool("worker thread panicked"))?;
            }
            Ok(())
        })?;

        Ok(failures.into_inner())
    }
}

/// Runs one tool and feeds its issues to the collector.
///
/// Returns the tool name and failure description if the tool failed.
fn execute_unit(
    unit: &Unit,
    finder: &Finder,
    collector: &Collector,
    progress: &dyn Progress,
) -> Option<(String, String)> {
    let name = unit.tool.name().to_string();
    debug!("Starting {}", name);
    progress.on_tool_start(&name);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        unit.tool.execute(finder, &unit.config)
    }));
    let (issues, failure) = match outcome {
        Ok(Ok(issues)) => (issues, None),
        Ok(Err(e)) => (Vec::new(), Some(e.to_string())),
        Err(payload) => (Vec::new(), Some(panic_message(payload.as_ref()))),
    };

    progress.on_tool_finish(&name);
    debug!("Finished {} with {} issues", name, issues.len());

    match failure {
        None => {
            collector.add_issues(issues);
            None
        }
        Some(reason) => {
            collector.add_issue(Issue::tool_failure(
                format!("{} failed horribly", name),
                finder.project_path(),
                Some(&reason),
                true,
            ));
            Some((name, reason))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

fn output_issues(output: CapturedOutput, project_path: &Path) -> Vec<Issue> {
    [
        ("Tool(s) wrote to stdout", output.stdout),
        ("Tool(s) wrote to stderr", output.stderr),
    ]
    .into_iter()
    .filter(|(_, text)| !text.is_empty())
    .map(|(message, text)| Issue::tool_failure(message, project_path, Some(&text), false))
    .collect()
}
