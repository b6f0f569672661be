//! # up - Ultimate Plumber
//!
//! An interactive tool for building shell pipelines with instant live
//! preview. Text piped into `up` is captured into a bounded buffer; a
//! full-screen terminal UI offers an editable command line on top and a
//! scrollable output panel below. Every run feeds the captured input
//! through `$SHELL -c <command>` and shows the result as it streams in.
//!
//! ## Architecture
//!
//! ```text
//! stdin ──▶ CaptureBuf ──▶ Subprocess ──▶ CaptureBuf ──▶ BufView ──▶ TerminalSurface
//!               ▲                                            ▲
//!               │              Controller ───────────────────┘
//!               └── pause/resume   │
//!                                  └── Editor (command line)
//! ```
//!
//! The `pipeline` module owns the data flow (capture buffers, the shell
//! subprocess, the on-exit script sink); the `tui` module owns rendering
//! and input (terminal surface abstraction, viewport, line editor, main
//! loop). Terminal-specific code is isolated behind the `TerminalSurface`
//! trait so the rendering engine can be tested against an in-memory grid.

pub mod cmd_args;
pub mod config;
pub mod pipeline;
pub mod tui;
