//! Run progress notifications.

use parking_lot::Mutex;
use tracing::info;

/// Observer of a run. Methods may be called from several worker threads.
pub trait Progress: Send + Sync {
    /// The run is starting.
    fn on_start(&self) {}

    /// `tool` started executing.
    fn on_tool_start(&self, tool: &str);

    /// `tool` finished executing, successfully or not.
    fn on_tool_finish(&self, tool: &str);

    /// The run is over.
    fn on_finish(&self) {}

    /// A free-form status message.
    fn notify(&self, message: &str) {
        info!("{}", message);
    }
}

#[derive(Debug, Default)]
struct Tracked {
    current: Vec<String>,
    completed: Vec<String>,
}

/// Keeps track of executing and completed tools.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    inner: Mutex<Tracked>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `tool` started.
    pub fn tool_started(&self, tool: &str) {
        self.inner.lock().current.push(tool.to_string());
    }

    /// Records that `tool` finished. Returns `false` if it was never started.
    pub fn tool_finished(&self, tool: &str) -> bool {
        let mut inner = self.inner.lock();
        let Some(pos) = inner.current.iter().position(|t| t == tool) else {
            return false;
        };
        let name = inner.current.remove(pos);
        inner.completed.push(name);
        true
    }

    /// Tools currently executing, in start order.
    pub fn current_tools(&self) -> Vec<String> {
        self.inner.lock().current.clone()
    }

    /// Tools that have finished, in finish order.
    pub fn completed_tools(&self) -> Vec<String> {
        self.inner.lock().completed.clone()
    }
}

/// Progress that renders nothing but still tracks tool state.
#[derive(Debug, Default)]
pub struct QuietProgress {
    tracker: ProgressTracker,
}

impl QuietProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn current_tools(&self) -> Vec<String> {
        self.tracker.current_tools()
    }

    pub fn completed_tools(&self) -> Vec<String> {
        self.tracker.completed_tools()
    }
}

impl Progress for QuietProgress {
    fn on_tool_start(&self, tool: &str) {
        self.tracker.tool_started(tool);
    }

    fn on_tool_finish(&self, tool: &str) {
        self.tracker.tool_finished(tool);
    }
}
