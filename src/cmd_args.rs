//! # Command Line Arguments
//!
//! Clap-based argument parsing for the `up` binary. The derive struct is
//! kept private; `CommandLineArgs` is the public face with accessor
//! methods and a `parse_from` entry point for tests.

use std::ffi::OsString;

pub use clap::Parser;

const ABOUT: &str = "\
up is the Ultimate Plumber, a tool for writing Linux pipes in a terminal-based
UI interactively, with instant live preview of command results.

To start using up, redirect any text-emitting command (or pipeline) into it -
for example:

    $ lshw |& up";

const KEYS_HELP: &str = "\
KEYS:
  alphanumeric & symbol keys, Left, Right, Ctrl-A/E/B/F/K/Y/W
            navigate and edit the pipeline command
  Enter     execute the pipeline command, updating the output panel
  Up, Dn, PgUp, PgDn, Ctrl-Left, Ctrl-Right
            navigate (scroll) the pipeline output panel
  Ctrl-X    exit and write the pipeline to up1.sh (or up2.sh, ... up999.sh)
  Ctrl-C    quit without saving and emit the pipeline on standard error
  Ctrl-S    temporarily freeze reading the input, injecting a fake EOF
            (shows '#' indicator in the top-left corner)
  Ctrl-Q    unfreeze back after Ctrl-S and re-run the pipeline";

#[derive(Parser, Debug)]
#[command(name = "up", version, about = ABOUT, after_help = KEYS_HELP)]
struct ClapArgs {
    /// Execute the pipeline after any change, without waiting for Enter
    #[arg(long = "unsafe-full-throttle")]
    unsafe_full_throttle: bool,

    /// Save the command to the specified file if Ctrl-X is pressed (default: up<N>.sh)
    #[arg(short = 'o', long = "output-script", value_name = "FILE")]
    output_script: Option<String>,

    /// Log debug output to ./up.debug
    #[arg(long)]
    debug: bool,

    /// Disable interface colors
    #[arg(long = "no-colors")]
    no_colors: bool,

    /// Command to run the pipeline with; repeat to pass a multi-word command
    /// (defaults to '-e=$SHELL -e=-c')
    #[arg(short = 'e', long = "exec", value_name = "COMMAND")]
    exec: Vec<String>,

    /// Initial command to use as the pipeline (default empty)
    #[arg(short = 'c', long = "pipeline", value_name = "COMMANDS", default_value = "")]
    pipeline: String,

    /// Input & pipeline buffer sizes in megabytes (MiB)
    #[arg(long = "buf", value_name = "MEGABYTES", default_value_t = 40)]
    buf: usize,

    /// Start with an empty buffer regardless of whether input was piped
    #[arg(long)]
    noinput: bool,
}

/// Parsed command line options for `up`.
#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    unsafe_full_throttle: bool,
    output_script: Option<String>,
    debug: bool,
    no_colors: bool,
    exec: Vec<String>,
    pipeline: String,
    buf: usize,
    noinput: bool,
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        Self::from_clap(ClapArgs::parse())
    }

    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_clap(ClapArgs::parse_from(itr))
    }

    #[cfg(test)]
    pub(crate) fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        ClapArgs::try_parse_from(itr).map(Self::from_clap)
    }

    fn from_clap(args: ClapArgs) -> Self {
        Self {
            unsafe_full_throttle: args.unsafe_full_throttle,
            output_script: args.output_script,
            debug: args.debug,
            no_colors: args.no_colors,
            exec: args.exec,
            pipeline: args.pipeline,
            buf: args.buf,
            noinput: args.noinput,
        }
    }

    pub fn unsafe_full_throttle(&self) -> bool {
        self.unsafe_full_throttle
    }

    pub fn output_script(&self) -> Option<&str> {
        self.output_script.as_deref()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn no_colors(&self) -> bool {
        self.no_colors
    }

    pub fn exec(&self) -> &[String] {
        &self.exec
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Buffer capacity in MiB.
    pub fn buf_mib(&self) -> usize {
        self.buf
    }

    pub fn noinput(&self) -> bool {
        self.noinput
    }
}
