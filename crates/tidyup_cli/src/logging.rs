//! Logging setup.
//!
//! Log lines and panic reports go to a duplicate of the original standard
//! error stream, so they stay visible while tool output is captured.

use std::fs::File;
use std::io;
use std::sync::Mutex;

use tidyup_core::capture::duplicate_stderr;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let writer = match duplicate_stderr() {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(_) => BoxMakeWriter::new(io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer)
        .init();
}

/// Opens another handle on the original standard error stream.
pub fn original_stderr() -> Option<File> {
    duplicate_stderr().ok()
}

/// Routes panic messages through the logger.
///
/// Panics on worker threads are already reported as tool failures and are
/// only logged at debug level.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        let message = panic_payload(info.payload());
        if name == "main" {
            error!("thread '{}' panicked at {}: {}", name, location, message);
        } else {
            debug!("thread '{}' panicked at {}: {}", name, location, message);
        }
    }));
}

fn panic_payload(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "Box<dyn Any>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_payload(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_payload(payload.as_ref()), "bang");

        let payload: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_payload(payload.as_ref()), "Box<dyn Any>");
    }
}
