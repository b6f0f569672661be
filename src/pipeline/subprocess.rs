//! # Pipeline Subprocess
//!
//! Runs one revision of the pipeline command in the user's shell. The
//! child's stdin is fed from a blocking cursor over the upstream capture
//! buffer; stdout and stderr are merged through a single anonymous pipe
//! into a fresh capture buffer owned by this subprocess. Spawn and wait
//! failures are rendered as trailing `up: <error>` text in that buffer
//! rather than surfaced to the caller.

use std::io::{self, Cursor, Write};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::pipeline::buffer::CaptureBuf;
use crate::pipeline::Notify;

/// A running (or failed-to-run) pipeline command and its output buffer.
pub struct Subprocess {
    out: Arc<CaptureBuf>,
    pid: Option<i32>,
    finished: Arc<AtomicBool>,
}

impl Subprocess {
    /// Launch `shell + [command]` with stdin wired to `stdin_buf` and
    /// merged stdout+stderr captured into a new buffer of equal capacity.
    ///
    /// Always returns a usable handle: if the spawn fails, the output
    /// buffer contains the error text and is already closed.
    pub fn start(
        shell: &[String],
        command: &str,
        stdin_buf: &Arc<CaptureBuf>,
        notify: Notify,
    ) -> Subprocess {
        let out = CaptureBuf::new(stdin_buf.capacity());

        let (reader, writer) = match io::pipe() {
            Ok(pair) => pair,
            Err(err) => return Self::failed(out, &err, notify),
        };
        let err_writer = match writer.try_clone() {
            Ok(clone) => clone,
            Err(err) => return Self::failed(out, &err, notify),
        };
        let merged_stdout = match writer.try_clone() {
            Ok(clone) => clone,
            Err(err) => return Self::failed(out, &err, notify),
        };
        out.start_capture(reader, notify);

        let mut cmd = Command::new(&shell[0]);
        cmd.args(&shell[1..])
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(merged_stdout))
            .stderr(Stdio::from(writer));

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::debug!(%err, "pipeline spawn failed");
                let mut err_writer = err_writer;
                let _ = write!(err_writer, "up: {err}");
                // Dropping cmd and err_writer closes our pipe ends, so the
                // capture thread sees the error text followed by EOF.
                return Subprocess {
                    out,
                    pid: None,
                    finished: Arc::new(AtomicBool::new(true)),
                };
            }
        };
        tracing::debug!(shell = %shell[0], %command, pid = child.id(), "pipeline spawned");
        drop(cmd);

        let pid = child.id() as i32;
        let finished = Arc::new(AtomicBool::new(false));
        Self::feed_stdin(&mut child, stdin_buf);
        Self::reap(child, err_writer, Arc::clone(&finished));

        Subprocess {
            out,
            pid: Some(pid),
            finished,
        }
    }

    /// Output buffer this subprocess writes into.
    pub fn out(&self) -> &Arc<CaptureBuf> {
        &self.out
    }

    /// Kill the child, unblocking its stdin feed and closing the output
    /// pipe. Idempotent; a no-op once the child has been reaped.
    pub fn kill(&self) {
        let Some(pid) = self.pid else { return };
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        tracing::debug!(pid, "killing pipeline subprocess");
        // SAFETY: plain kill(2) on the child's pid; the wait thread still
        // holds the Child, so the pid has not been reused.
        unsafe {
            libc::kill(pid, libc::SIGKILL);
        }
    }

    /// Handle for a subprocess that never started: the output buffer
    /// captures just the error text and closes.
    fn failed(out: Arc<CaptureBuf>, err: &io::Error, notify: Notify) -> Subprocess {
        let text = format!("up: {err}");
        out.start_capture(Cursor::new(text.into_bytes()), notify);
        Subprocess {
            out,
            pid: None,
            finished: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Pump the upstream buffer into the child's stdin until EOF (or until
    /// the pipe breaks because the child exited or was killed).
    fn feed_stdin(child: &mut Child, stdin_buf: &Arc<CaptureBuf>) {
        let Some(mut sink) = child.stdin.take() else {
            return;
        };
        let mut upstream = stdin_buf.open_reader(true);
        thread::spawn(move || {
            if let Err(err) = io::copy(&mut upstream, &mut sink) {
                tracing::debug!(%err, "stdin feed ended early");
            }
        });
    }

    /// Wait for the child; append `up: <status>` when it did not succeed,
    /// then close the last write end of the output pipe.
    fn reap(mut child: Child, mut err_writer: io::PipeWriter, finished: Arc<AtomicBool>) {
        thread::spawn(move || {
            match child.wait() {
                Ok(status) if !status.success() => {
                    tracing::debug!(%status, "pipeline exited with failure");
                    let _ = write!(err_writer, "up: {status}");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(%err, "waiting for pipeline failed");
                    let _ = write!(err_writer, "up: {err}");
                }
            }
            finished.store(true, Ordering::SeqCst);
        });
    }
}
