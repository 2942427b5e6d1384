//! Tool capability interface and the explicit tool registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ToolConfig;
use crate::error::Result;
use crate::finder::Finder;
use crate::issue::Issue;

/// A code a tool can report, with its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeInfo {
    pub code: String,
    pub description: String,
}

impl CodeInfo {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// An analysis tool the scheduler can run.
///
/// Implementations must filter out the codes listed in the `disabled` field
/// of the config they are given. Returning `Err` or panicking from
/// [`Tool::execute`] is reported as a single fatal issue.
pub trait Tool: Send + Sync {
    /// Unique name, also the key of the tool's configuration block.
    fn name(&self) -> &str;

    /// One line description.
    fn description(&self) -> &str;

    /// Whether the tool can run in the current environment.
    fn can_be_used(&self) -> bool;

    /// Configuration block used when the user provides none.
    fn default_config(&self) -> ToolConfig;

    /// Every code the tool may report.
    fn all_codes(&self) -> Vec<CodeInfo>;

    /// Analyzes the files selected from `finder`.
    fn execute(&self, finder: &Finder, config: &ToolConfig) -> Result<Vec<Issue>>;
}

/// Set of tools known to a run, keyed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool, replacing any tool registered under the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) -> &mut Self {
        self.register_arc(Arc::new(tool))
    }

    /// Adds a shared tool.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Iterates over the tools in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
