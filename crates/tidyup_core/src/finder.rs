//! Project file discovery.
//!
//! The project tree is walked once when a [`Finder`] is created. Tools then
//! select files from that snapshot with regular expression filters, so every
//! tool in a run sees the same file set.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::{DirEntry, WalkBuilder};
use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::issue::relative_path;

/// Directory names that are never walked into.
pub const ALWAYS_EXCLUDED_DIRS: &[&str] = &[
    ".hg",
    ".git",
    ".svn",
    "CVS",
    ".bzr",
    "__pycache__",
    ".tox",
];

const EXCLUDED_DIR_SUFFIX: &str = ".egg-info";

/// Compiles a list of regular expressions.
pub fn compile_masks(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).map_err(Into::into))
        .collect()
}

fn matches_any(masks: &[Regex], text: &str) -> bool {
    masks.is_empty() || masks.iter().any(|mask| mask.is_match(text))
}

fn is_always_excluded(name: &str) -> bool {
    ALWAYS_EXCLUDED_DIRS.contains(&name) || name.ends_with(EXCLUDED_DIR_SUFFIX)
}

/// Snapshot of the files in a project.
#[derive(Debug)]
pub struct Finder {
    project_path: PathBuf,
    found: BTreeMap<PathBuf, Vec<PathBuf>>,
    contents: Mutex<HashMap<PathBuf, Arc<str>>>,
}

impl Finder {
    /// Walks `project_path`, honoring the exclusion settings in `config`.
    pub fn new(project_path: &Path, config: &Config) -> Result<Self> {
        let project_path = fs::canonicalize(project_path)?;
        let excludes = Arc::new(compile_masks(&config.exclude)?);

        let mut builder = WalkBuilder::new(&project_path);
        builder
            .hidden(false)
            .ignore(false)
            .parents(config.respect_gitignore)
            .git_ignore(config.respect_gitignore)
            .git_global(config.respect_gitignore)
            .git_exclude(config.respect_gitignore)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        let root = project_path.clone();
        builder.filter_entry(move |entry: &DirEntry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if is_dir && is_always_excluded(&entry.file_name().to_string_lossy()) {
                return false;
            }
            let relative = relative_path(entry.path(), &root);
            !excludes.iter().any(|mask| mask.is_match(&relative))
        });

        let mut found: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        found.insert(project_path.clone(), Vec::new());

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.into_path();
            if file_type.is_dir() {
                found.entry(path).or_default();
            } else if file_type.is_file()
                && let Some(parent) = path.parent()
            {
                found.entry(parent.to_path_buf()).or_default().push(path);
            }
        }

        let finder = Self {
            project_path,
            found,
            contents: Mutex::new(HashMap::new()),
        };
        info!(
            "Found {} files in {} directories",
            finder.file_count(),
            finder.found.len()
        );
        Ok(finder)
    }

    /// Canonical path of the project root.
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Path of `path` relative to the project root, with `/` separators.
    pub fn relative_to_project(&self, path: &Path) -> String {
        relative_path(path, &self.project_path)
    }

    /// Total number of files found.
    pub fn file_count(&self) -> usize {
        self.found.values().map(Vec::len).sum()
    }

    /// Files whose project-relative path matches any of `filters`.
    ///
    /// An empty filter list selects every file.
    pub fn files(&self, filters: &[String]) -> Result<Vec<PathBuf>> {
        let masks = compile_masks(filters)?;
        Ok(self
            .found
            .values()
            .flatten()
            .filter(|path| matches_any(&masks, &self.relative_to_project(path)))
            .cloned()
            .collect())
    }

    /// Directories whose project-relative path matches any of `filters`.
    ///
    /// When `containing` is not empty, only directories holding at least one
    /// file whose name matches one of those expressions are returned.
    pub fn directories(&self, filters: &[String], containing: &[String]) -> Result<Vec<PathBuf>> {
        let masks = compile_masks(filters)?;
        let contents = compile_masks(containing)?;
        Ok(self
            .found
            .iter()
            .filter(|(dir, _)| matches_any(&masks, &self.relative_to_project(dir)))
            .filter(|(_, files)| {
                containing.is_empty()
                    || files.iter().any(|file| {
                        file.file_name()
                            .is_some_and(|name| matches_any(&contents, &name.to_string_lossy()))
                    })
            })
            .map(|(dir, _)| dir.clone())
            .collect())
    }

    /// Reads a file as text, caching the result for later readers.
    ///
    /// Invalid UTF-8 sequences are replaced.
    pub fn read_file(&self, path: &Path) -> io::Result<Arc<str>> {
        if let Some(content) = self.contents.lock().get(path) {
            return Ok(Arc::clone(content));
        }

        let bytes = fs::read(path)?;
        let content: Arc<str> = Arc::from(String::from_utf8_lossy(&bytes).into_owned());
        self.contents
            .lock()
            .insert(path.to_path_buf(), Arc::clone(&content));
        Ok(content)
    }
}
