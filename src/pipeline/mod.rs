//! # Pipeline Data Flow
//!
//! Everything between standard input and the screen: the bounded capture
//! buffers the producer and subprocess write into, the shell subprocess
//! wired between them, and the script sink used on exit.

pub mod buffer;
pub mod script;
pub mod subprocess;

use std::sync::Arc;

/// Callback fired whenever new data lands in a capture buffer, used to
/// wake the UI event loop. Fired outside the buffer lock.
pub type Notify = Arc<dyn Fn() + Send + Sync>;
