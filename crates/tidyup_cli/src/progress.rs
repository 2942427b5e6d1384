//! Console progress bar.
//!
//! The bar is drawn on a duplicate of the original standard error stream
//! because the real stream is captured while the tools run.

use std::fs::File;
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tidyup_core::{Progress, ProgressTracker};

const TEMPLATE: &str = "Analyzing |{bar:40}| {percent:>3}% [{elapsed}] {msg}";
const REFRESH_RATE: u8 = 20;

/// Wraps `out` in a terminal, if it is one.
fn terminal(out: File) -> Option<Term> {
    let input = out.try_clone().ok()?;
    let term = Term::read_write_pair(input, out);
    term.is_term().then_some(term)
}

/// Progress bar counting finished tools, with the running ones as message.
pub struct ConsoleProgress {
    bar: ProgressBar,
    tracker: ProgressTracker,
}

impl ConsoleProgress {
    /// Creates a bar for `total` tools drawn on `out`.
    ///
    /// The bar is hidden when `out` is missing or not a terminal.
    pub fn new(total: u64, out: Option<File>) -> Self {
        let bar = match out.and_then(terminal) {
            Some(term) => {
                let target = ProgressDrawTarget::term(term, REFRESH_RATE);
                let bar = ProgressBar::with_draw_target(Some(total), target);
                bar.set_style(
                    ProgressStyle::with_template(TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar
            }
            None => ProgressBar::hidden(),
        };
        Self {
            bar,
            tracker: ProgressTracker::new(),
        }
    }

    fn refresh_message(&self) {
        self.bar.set_message(self.tracker.current_tools().join(","));
    }
}

impl Progress for ConsoleProgress {
    fn on_start(&self) {
        self.bar.enable_steady_tick(Duration::from_secs(1));
    }

    fn on_tool_start(&self, tool: &str) {
        self.tracker.tool_started(tool);
        self.refresh_message();
    }

    fn on_tool_finish(&self, tool: &str) {
        if self.tracker.tool_finished(tool) {
            self.refresh_message();
            self.bar.inc(1);
        }
    }

    fn on_finish(&self) {
        self.bar.finish_and_clear();
    }

    fn notify(&self, message: &str) {
        self.bar.suspend(|| tracing::info!("{}", message));
    }
}
