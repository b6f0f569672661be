//! # Runtime Configuration
//!
//! Resolves command line arguments and the environment into the settings
//! the controller needs: the shell argv used to execute pipelines, the
//! capture buffer capacity, and the interface switches.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::cmd_args::CommandLineArgs;

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shell argv the pipeline command is appended to, e.g. `["/bin/bash", "-c"]`.
    pub shell: Vec<String>,
    /// Capture buffer capacity in bytes (stdin and each pipeline run).
    pub capacity: usize,
    /// Re-run the pipeline on every edit instead of waiting for Enter.
    pub unsafe_mode: bool,
    /// Force the default terminal style everywhere.
    pub no_colors: bool,
}

impl Config {
    pub fn from_args(args: &CommandLineArgs) -> Result<Self> {
        Ok(Self {
            shell: discover_shell(args.exec())?,
            capacity: args.buf_mib() * 1024 * 1024,
            unsafe_mode: args.unsafe_full_throttle(),
            no_colors: args.no_colors(),
        })
    }
}

/// Find the user's preferred shell. An explicit `-e` argv wins; otherwise
/// `$SHELL`, then `bash` or `sh` from `$PATH`, each invoked with `-c`.
pub fn discover_shell(explicit: &[String]) -> Result<Vec<String>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }

    tracing::debug!("checking $SHELL...");
    if let Some(sh) = env::var_os("SHELL").filter(|sh| !sh.is_empty()) {
        return Ok(vec![sh.to_string_lossy().into_owned(), "-c".into()]);
    }

    for candidate in ["bash", "sh"] {
        tracing::debug!("checking {candidate}...");
        if let Some(path) = look_path(candidate) {
            return Ok(vec![path.to_string_lossy().into_owned(), "-c".into()]);
        }
    }

    bail!("cannot find shell: no -e flag, $SHELL is empty, neither bash nor sh are in $PATH");
}

/// Search `$PATH` for an executable file named `name`.
fn look_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_shell_wins() {
        let shell = discover_shell(&["zsh".to_string(), "-c".to_string()]).unwrap();
        assert_eq!(shell, ["zsh", "-c"]);
    }

    #[test]
    fn test_look_path_finds_sh() {
        // Any Unix test environment has `sh` somewhere on $PATH.
        let path = look_path("sh").expect("sh not found on $PATH");
        assert!(path.ends_with("sh"));
    }

    #[test]
    fn test_look_path_misses_unknown_binary() {
        assert_eq!(look_path("up-test-no-such-binary-654321"), None);
    }

    #[test]
    fn test_capacity_converted_to_bytes() {
        let args = CommandLineArgs::try_parse_from(["up", "--buf", "2", "-e", "sh", "-e", "-c"])
            .expect("failed to parse repeated -e flags");
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.capacity, 2 * 1024 * 1024);
        assert_eq!(config.shell, ["sh", "-c"]);
    }
}
