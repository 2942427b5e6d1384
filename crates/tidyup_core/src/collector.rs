//! Thread-safe issue accumulator.
//!
//! Workers append raw issues concurrently. Readers get a cleaned view:
//! disabled self-reported codes and `# noqa` suppressed issues are dropped,
//! then duplicates on the same line are collapsed. The cleaned view is
//! computed lazily and cached until the next append.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::issue::{DEFAULT_SORT, Issue, IssueField, sort_issues};
use crate::noqa::SuppressionIndex;

/// Settings that control how raw issues are cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanSettings {
    /// Codes of self-reported issues to drop.
    pub disabled: HashSet<String>,
    /// Whether duplicate issues on the same line are collapsed.
    pub merge_issues: bool,
    /// Whether `# noqa` directives are honored.
    pub noqa: bool,
    /// Extensions of files scanned for directives.
    pub noqa_extensions: HashSet<String>,
}

impl Default for CleanSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for CleanSettings {
    fn from(config: &Config) -> Self {
        Self {
            disabled: config.disabled.iter().cloned().collect(),
            merge_issues: config.merge_issues,
            noqa: config.noqa,
            noqa_extensions: config
                .noqa_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    raw: Vec<Issue>,
    cleaned: Option<Arc<Vec<Issue>>>,
    generation: u64,
}

/// Accumulates the issues of one run.
#[derive(Debug, Default)]
pub struct Collector {
    settings: CleanSettings,
    state: Mutex<State>,
    suppressions: Mutex<HashMap<PathBuf, Arc<SuppressionIndex>>>,
    failed: AtomicBool,
}

impl Collector {
    /// Creates an empty collector using the cleaning settings of `config`.
    pub fn new(config: &Config) -> Self {
        Self::with_settings(CleanSettings::from(config))
    }

    pub fn with_settings(settings: CleanSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(State::default()),
            suppressions: Mutex::new(HashMap::new()),
            failed: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &CleanSettings {
        &self.settings
    }

    /// Appends a single issue.
    pub fn add_issue(&self, issue: Issue) {
        self.add_issues(std::iter::once(issue));
    }

    /// Appends issues and invalidates the cleaned view.
    pub fn add_issues<I>(&self, issues: I)
    where
        I: IntoIterator<Item = Issue>,
    {
        let mut state = self.state.lock();
        state.raw.extend(issues);
        state.cleaned = None;
        state.generation += 1;
    }

    /// Marks the run as not having completed normally.
    pub fn mark_failed(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    /// Whether the run was interrupted.
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Number of issues, either cleaned or raw.
    pub fn issue_count(&self, include_unclean: bool) -> usize {
        if include_unclean {
            self.state.lock().raw.len()
        } else {
            self.cleaned().len()
        }
    }

    /// Cleaned issues sorted by `sortby`, [`DEFAULT_SORT`] when `None`.
    pub fn get_issues(&self, sortby: Option<&[IssueField]>) -> Vec<Issue> {
        let mut issues = self.cleaned().as_ref().clone();
        sort_issues(&mut issues, sortby.unwrap_or(DEFAULT_SORT));
        issues
    }

    /// Cleaned issues grouped by `keyfunc`, in ascending key order.
    ///
    /// Each group is sorted by `sortby`, [`DEFAULT_SORT`] when `None`.
    pub fn get_grouped_issues<K, F>(
        &self,
        keyfunc: F,
        sortby: Option<&[IssueField]>,
    ) -> BTreeMap<K, Vec<Issue>>
    where
        K: Ord,
        F: Fn(&Issue) -> K,
    {
        let mut groups: BTreeMap<K, Vec<Issue>> = BTreeMap::new();
        for issue in self.cleaned().iter() {
            groups.entry(keyfunc(issue)).or_default().push(issue.clone());
        }
        let sortby = sortby.unwrap_or(DEFAULT_SORT);
        for group in groups.values_mut() {
            sort_issues(group, sortby);
        }
        groups
    }

    /// Cleaned issues grouped by filename.
    pub fn get_issues_by_file(&self, sortby: Option<&[IssueField]>) -> BTreeMap<PathBuf, Vec<Issue>> {
        self.get_grouped_issues(|issue| issue.filename.clone(), sortby)
    }

    /// Returns the cleaned view, computing it if an append invalidated it.
    ///
    /// Cleaning runs outside the lock. The result is only cached when no
    /// append happened meanwhile.
    fn cleaned(&self) -> Arc<Vec<Issue>> {
        let (raw, generation) = {
            let state = self.state.lock();
            if let Some(cleaned) = &state.cleaned {
                return Arc::clone(cleaned);
            }
            (state.raw.clone(), state.generation)
        };

        let cleaned = Arc::new(self.clean(raw));

        let mut state = self.state.lock();
        if state.generation == generation {
            state.cleaned = Some(Arc::clone(&cleaned));
        }
        cleaned
    }

    fn clean(&self, raw: Vec<Issue>) -> Vec<Issue> {
        let total = raw.len();
        let issues: Vec<Issue> = raw
            .into_iter()
            .filter(|issue| !self.is_disabled(issue))
            .filter(|issue| !self.settings.noqa || !self.is_suppressed(issue))
            .collect();

        let cleaned = if self.settings.merge_issues {
            merge_issues(issues)
        } else {
            issues
        };
        debug!("Cleaned {} raw issues down to {}", total, cleaned.len());
        cleaned
    }

    fn is_disabled(&self, issue: &Issue) -> bool {
        issue.is_self_reported()
            && issue
                .code
                .as_ref()
                .is_some_and(|code| self.settings.disabled.contains(code))
    }

    fn is_suppressed(&self, issue: &Issue) -> bool {
        self.suppression_index(&issue.filename).is_suppressed(issue)
    }

    fn suppression_index(&self, filename: &Path) -> Arc<SuppressionIndex> {
        if let Some(index) = self.suppressions.lock().get(filename) {
            return Arc::clone(index);
        }

        let scannable = filename
            .extension()
            .is_some_and(|ext| self.settings.noqa_extensions.contains(&*ext.to_string_lossy()));
        let index = Arc::new(if scannable {
            SuppressionIndex::load(filename)
        } else {
            SuppressionIndex::default()
        });

        self.suppressions
            .lock()
            .entry(filename.to_path_buf())
            .or_insert(index)
            .clone()
    }
}

/// Collapses consecutive issues with the same tool and code on one line.
///
/// Issues are grouped by file and line, each group is ordered by tool, code
/// and column, and only the first of each run of equal (tool, code) pairs
/// is kept.
pub fn merge_issues(issues: Vec<Issue>) -> Vec<Issue> {
    let mut groups: BTreeMap<(PathBuf, u32), Vec<Issue>> = BTreeMap::new();
    for issue in issues {
        groups
            .entry((issue.filename.clone(), issue.line))
            .or_default()
            .push(issue);
    }

    let mut merged = Vec::new();
    for mut group in groups.into_values() {
        sort_issues(
            &mut group,
            &[IssueField::Tool, IssueField::Code, IssueField::Character],
        );
        merged.extend(collapse_runs(group));
    }
    merged
}

/// Keeps the first issue of every run of consecutive issues sharing the
/// same tool and code. Equal pairs that are not adjacent are both kept.
///
/// Tool run reports are never collapsed, each one stands for a different
/// tool.
pub fn collapse_runs(mut issues: Vec<Issue>) -> Vec<Issue> {
    issues.dedup_by(|next, kept| {
        !kept.is_tool_report() && next.tool == kept.tool && next.code == kept.code
    });
    issues
}
