//! Scoped capture of the process-wide standard output and error streams.
//!
//! Third-party analyzers sometimes print directly to the terminal. While an
//! [`OutputCapture`] is alive, file descriptors 1 and 2 point at temporary
//! files; the original streams are restored when it is finished or dropped.
//! Only one capture can be active at a time.

use std::fs::File;
use std::io;

use parking_lot::{Mutex, MutexGuard, const_mutex};

static CAPTURE_LOCK: Mutex<()> = const_mutex(());

/// Text written to the captured streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Guard redirecting stdout and stderr until finished or dropped.
pub struct OutputCapture {
    stdout: imp::Redirect,
    stderr: imp::Redirect,
    _lock: MutexGuard<'static, ()>,
}

impl OutputCapture {
    /// Starts capturing. Blocks while another capture is active.
    pub fn start() -> io::Result<Self> {
        let lock = CAPTURE_LOCK.lock();
        let stdout = imp::Redirect::new(imp::STDOUT)?;
        let stderr = imp::Redirect::new(imp::STDERR)?;
        Ok(Self {
            stdout,
            stderr,
            _lock: lock,
        })
    }

    /// Restores the original streams and returns what was written.
    pub fn finish(self) -> io::Result<CapturedOutput> {
        let Self {
            stdout,
            stderr,
            _lock,
        } = self;
        let stderr = stderr.finish()?;
        let stdout = stdout.finish()?;
        Ok(CapturedOutput { stdout, stderr })
    }
}

/// Opens an independent handle on the current standard error stream.
///
/// Writes through the handle reach the terminal even while a capture is
/// active.
pub fn duplicate_stderr() -> io::Result<File> {
    imp::duplicate(imp::STDERR)
}

#[cfg(unix)]
mod imp {
    use std::fs::File;
    use std::io::{self, Read, Seek, SeekFrom, Write};
    use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};

    pub const STDOUT: RawFd = libc::STDOUT_FILENO;
    pub const STDERR: RawFd = libc::STDERR_FILENO;

    pub fn duplicate(fd: RawFd) -> io::Result<File> {
        // SAFETY: dup returns a fresh descriptor owned by the new File.
        let copy = unsafe { libc::dup(fd) };
        if copy < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(unsafe { File::from_raw_fd(copy) })
    }

    fn flush(fd: RawFd) {
        if fd == STDOUT {
            let _ = io::stdout().flush();
        } else {
            let _ = io::stderr().flush();
        }
    }

    pub struct Redirect {
        fd: RawFd,
        saved: Option<File>,
        buffer: File,
    }

    impl Redirect {
        pub fn new(fd: RawFd) -> io::Result<Self> {
            let buffer = tempfile::tempfile()?;
            flush(fd);
            let saved = duplicate(fd)?;
            // SAFETY: both descriptors are open for the duration of the call.
            if unsafe { libc::dup2(buffer.as_raw_fd(), fd) } < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self {
                fd,
                saved: Some(saved),
                buffer,
            })
        }

        fn restore(&mut self) -> io::Result<()> {
            let Some(saved) = self.saved.take() else {
                return Ok(());
            };
            flush(self.fd);
            // SAFETY: `saved` is an open descriptor and is closed on drop.
            if unsafe { libc::dup2(saved.as_raw_fd(), self.fd) } < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }

        pub fn finish(mut self) -> io::Result<String> {
            self.restore()?;
            let mut bytes = Vec::new();
            self.buffer.seek(SeekFrom::Start(0))?;
            self.buffer.read_to_end(&mut bytes)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    impl Drop for Redirect {
        fn drop(&mut self) {
            let _ = self.restore();
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use std::fs::File;
    use std::io;

    pub const STDOUT: i32 = 1;
    pub const STDERR: i32 = 2;

    pub fn duplicate(_fd: i32) -> io::Result<File> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stream duplication is not supported on this platform",
        ))
    }

    pub struct Redirect;

    impl Redirect {
        pub fn new(_fd: i32) -> io::Result<Self> {
            Ok(Self)
        }

        pub fn finish(self) -> io::Result<String> {
            Ok(String::new())
        }
    }
}
