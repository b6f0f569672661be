//! # Capture Buffer
//!
//! A bounded, append-only byte log with a single writer (the capture
//! thread) and any number of independent reader cursors. Readers come in
//! two flavors: blocking cursors that tail the buffer while it is still
//! growing, and snapshot cursors that report end-of-file the moment they
//! catch up. Capture can be paused, which parks the writer and makes
//! blocking readers observe a fake EOF until resumed.

use std::io::Read;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

use crate::pipeline::Notify;

/// The capture thread reads from its source in chunks of this size and
/// appends each chunk under the buffer lock.
const CHUNK_SIZE: usize = 32 * 1024;

/// Lifecycle of a capture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufStatus {
    /// The capture thread is still consuming its source.
    Reading,
    /// The source is exhausted; contents are final.
    Eof,
    /// Capture is parked; blocking readers observe EOF until resumed.
    Paused,
}

struct BufState {
    bytes: Vec<u8>,
    status: BufStatus,
}

/// Bounded append-only byte log shared between one writer and many readers.
///
/// Contents at `[0, n)` are immutable once written; `n` only grows, up to
/// the fixed capacity. Reaching capacity ends capture even if the source
/// has more to give.
pub struct CaptureBuf {
    capacity: usize,
    state: Mutex<BufState>,
    cond: Condvar,
}

impl CaptureBuf {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            state: Mutex::new(BufState {
                bytes: Vec::with_capacity(capacity.min(CHUNK_SIZE)),
                status: BufStatus::Reading,
            }),
            cond: Condvar::new(),
        })
    }

    /// Buffer pre-filled with `contents`, still in the `Reading` state.
    #[cfg(test)]
    pub(crate) fn preloaded(capacity: usize, contents: &[u8]) -> Arc<Self> {
        let buf = Self::new(capacity);
        buf.lock().bytes.extend_from_slice(&contents[..contents.len().min(capacity)]);
        buf
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, BufState> {
        self.state.lock().expect("capture buffer lock poisoned")
    }

    /// Spawn the capture thread consuming `source` into this buffer.
    /// Called once per buffer; `notify` fires after every append so the
    /// UI can wake up and redraw.
    pub fn start_capture(self: &Arc<Self>, source: impl Read + Send + 'static, notify: Notify) {
        let buf = Arc::clone(self);
        thread::spawn(move || buf.capture(source, notify));
    }

    fn capture(self: Arc<Self>, mut source: impl Read, notify: Notify) {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let read = source.read(&mut chunk);

            let mut state = self.lock();
            while state.status == BufStatus::Paused {
                state = self
                    .cond
                    .wait(state)
                    .expect("capture buffer lock poisoned");
            }
            match read {
                Ok(0) => {
                    state.status = BufStatus::Eof;
                    let n = state.bytes.len();
                    self.cond.notify_all();
                    drop(state);
                    notify();
                    tracing::debug!(bytes = n, "capture reached EOF");
                    return;
                }
                Ok(n) => {
                    let room = self.capacity - state.bytes.len();
                    state.bytes.extend_from_slice(&chunk[..n.min(room)]);
                    let full = state.bytes.len() == self.capacity;
                    self.cond.notify_all();
                    drop(state);
                    notify();
                    if full {
                        tracing::debug!(capacity = self.capacity, "capture buffer full");
                        return;
                    }
                }
                Err(err) => {
                    // Any read error other than EOF ends capture; readers
                    // simply observe EOF.
                    state.status = BufStatus::Eof;
                    self.cond.notify_all();
                    drop(state);
                    notify();
                    tracing::warn!(%err, "capture read failed");
                    return;
                }
            }
        }
    }

    /// Toggle the paused state. EOF is terminal: pausing or resuming a
    /// finished buffer has no effect.
    pub fn pause(&self, pause: bool) {
        let mut state = self.lock();
        if pause {
            if state.status == BufStatus::Reading {
                state.status = BufStatus::Paused;
                // Trigger blocking readers to emit a fake EOF.
                self.cond.notify_all();
            }
        } else if state.status == BufStatus::Paused {
            state.status = BufStatus::Reading;
            // Wake the parked capture thread.
            self.cond.notify_all();
        }
    }

    /// Single-glyph status shown in the top-left corner of the screen:
    /// `'~'` still reading, `' '` EOF, `'#'` paused, `'+'` capacity reached.
    pub fn status_indicator(&self) -> char {
        let state = self.lock();
        match state.status {
            BufStatus::Paused => '#',
            BufStatus::Eof => ' ',
            BufStatus::Reading if state.bytes.len() == self.capacity => '+',
            BufStatus::Reading => '~',
        }
    }

    /// Number of logical lines captured so far (newline count plus one).
    pub fn line_count(&self) -> usize {
        let state = self.lock();
        state.bytes.iter().filter(|&&b| b == b'\n').count() + 1
    }

    /// Open a cursor over the buffer, starting at offset zero. A blocking
    /// cursor waits for more data while the buffer is still reading; a
    /// snapshot cursor reports EOF as soon as it catches up.
    pub fn open_reader(self: &Arc<Self>, blocking: bool) -> BufCursor {
        BufCursor {
            buf: Arc::clone(self),
            pos: 0,
            blocking,
        }
    }
}

/// A reader cursor into a [`CaptureBuf`]. Advances monotonically from
/// offset zero; multiple cursors over one buffer are independent.
pub struct BufCursor {
    buf: Arc<CaptureBuf>,
    pos: usize,
    blocking: bool,
}

impl Read for BufCursor {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let mut state = self.buf.lock();
        let mut end = state.bytes.len();
        while self.blocking
            && end == self.pos
            && state.status == BufStatus::Reading
            && end < self.buf.capacity
        {
            state = self
                .buf
                .cond
                .wait(state)
                .expect("capture buffer lock poisoned");
            end = state.bytes.len();
        }

        let n = out.len().min(end - self.pos);
        out[..n].copy_from_slice(&state.bytes[self.pos..self.pos + n]);
        drop(state);
        self.pos += n;
        if n == 0 && self.blocking {
            tracing::debug!(pos = self.pos, "blocking reader emitting EOF");
        }
        Ok(n)
    }
}
