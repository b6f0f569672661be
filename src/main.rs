//! # up - Entry Point
//!
//! Parses arguments, wires the stdin capture into the terminal UI, runs
//! the controller, and performs the chosen exit action once the terminal
//! is back to normal.

use std::io::{self, IsTerminal, Read};
use std::process;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use up::cmd_args::CommandLineArgs;
use up::config::Config;
use up::pipeline::buffer::CaptureBuf;
use up::pipeline::script;
use up::tui::controller::{Controller, ExitAction};
use up::tui::io::{CrosstermSurface, TerminalSurface};

fn main() {
    let args = CommandLineArgs::parse();
    if let Err(err) = run(args) {
        die(&format!("{err:#}"));
    }
}

/// Single-line startup diagnostic, non-zero exit.
fn die(message: &str) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn run(args: CommandLineArgs) -> Result<()> {
    if args.debug() {
        init_debug_logging();
    }

    let config = Config::from_args(&args)?;
    tracing::debug!(shell = ?config.shell, "found shell");

    let source: Box<dyn Read + Send> = if args.noinput() {
        Box::new(io::empty())
    } else if io::stdin().is_terminal() {
        bail!("up requires some data piped on standard input, for example try: `echo hello world | up`");
    } else {
        Box::new(io::stdin())
    };

    let surface = CrosstermSurface::new().context("initializing terminal UI")?;

    // Capture stdin into the internal buffer; every chunk of new data
    // wakes the main loop through an interrupt so the screen refreshes.
    let stdin_buf = CaptureBuf::new(config.capacity);
    stdin_buf.start_capture(source, surface.interrupter());

    let shell = config.shell.clone();
    let mut controller = Controller::new(surface, config, stdin_buf, args.pipeline());
    let action = controller.run()?;

    // The terminal is restored; ordinary stderr output is safe again.
    match action {
        ExitAction::EmitPipeline(command) => {
            emit_banner();
            eprintln!("up: | {command}");
        }
        ExitAction::WriteScript(command) => {
            emit_banner();
            script::write_script(&shell, &command, args.output_script());
        }
    }
    Ok(())
}

fn emit_banner() {
    eprintln!("up: Ultimate Plumber v{}", env!("CARGO_PKG_VERSION"));
}

/// Log to `./up.debug` when `--debug` is given; without it no subscriber
/// is installed and the tracing macros are no-ops.
fn init_debug_logging() {
    let appender = tracing_appender::rolling::never(".", "up.debug");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("UP_LOG").unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    // Leak the guard so buffered log lines are flushed at process exit.
    Box::leak(Box::new(guard));
}
