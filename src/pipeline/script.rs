//! # Script Sink
//!
//! Persists the constructed pipeline as an executable shell script when
//! the user exits with Ctrl-X. Target selection cascades: an explicit
//! `-o FILE`, else the first free of `up1.sh` … `up999.sh` in the current
//! directory, else a temp file, else a plain print to stderr. Progress and
//! failures are reported on stderr as the chain advances.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Highest numbered `up<N>.sh` name probed before giving up.
const MAX_NUMBERED: u32 = 999;

/// Script file layout: shebang from the first shell argv element, then the
/// pipeline command. The shebang always names `shell[0]` alone; extra shell
/// arguments are not representable in a shebang line.
fn script_body(shell: &[String], command: &str) -> String {
    format!("#!{}\n{}\n", shell[0], command)
}

/// Write the pipeline script, cascading through fallback targets. All
/// failures are reported on stderr; the pipeline itself is printed as a
/// last resort so it is never lost. Returns the path written, if any.
pub fn write_script(shell: &[String], command: &str, target: Option<&str>) -> Option<PathBuf> {
    write_script_in(Path::new("."), shell, command, target)
}

/// Same as [`write_script`] with the numbered-script directory made
/// explicit (the tests point this at a scratch directory).
pub fn write_script_in(
    dir: &Path,
    shell: &[String],
    command: &str,
    target: Option<&str>,
) -> Option<PathBuf> {
    let body = script_body(shell, command);

    if let Some(target) = target {
        eprint!("up: writing {target}");
        match write_file(Path::new(target), &body, false) {
            Ok(()) => {
                eprintln!(" - OK");
                return Some(PathBuf::from(target));
            }
            Err(err) => eprintln!(" - error: {err:#}"),
        }
        return write_fallback_tmp(&body, command);
    }

    eprint!("up: writing: .");
    for i in 1..=MAX_NUMBERED {
        let path = dir.join(format!("up{i}.sh"));
        match write_file(&path, &body, true) {
            Ok(()) => {
                eprintln!("/up{i}.sh - OK");
                return Some(path);
            }
            Err(err) if exists_error(&err) => continue,
            Err(err) => {
                eprintln!(" - error: {err:#}");
                return write_fallback_tmp(&body, command);
            }
        }
    }
    eprintln!(" - error: up1.sh-up{MAX_NUMBERED}.sh already exist");
    write_fallback_tmp(&body, command)
}

/// Create the script at `path` with mode 0755. With `exclusive`, an
/// already-existing file is an error (used for the numbered scan).
fn write_file(path: &Path, body: &str, exclusive: bool) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if exclusive {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o755);
    }

    let mut file = options.open(path)?;
    file.write_all(body.as_bytes())?;
    // An explicit `-o` target may pre-exist with narrower permissions;
    // OpenOptions::mode only applies to newly created files.
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(Permissions::from_mode(0o755))?;
    }
    Ok(())
}

fn exists_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::AlreadyExists)
}

/// Second-to-last resort: a kept temp file named `up-*.sh`.
fn write_fallback_tmp(body: &str, command: &str) -> Option<PathBuf> {
    match write_tmp(body) {
        Ok(path) => {
            eprintln!("up: writing: {} - OK", path.display());
            Some(path)
        }
        Err(err) => {
            eprintln!("up: writing: TMP - error: {err:#}");
            eprintln!("up: | {command}");
            None
        }
    }
}

fn write_tmp(body: &str) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("up-")
        .suffix(".sh")
        .tempfile()
        .context("creating temp script")?;
    file.write_all(body.as_bytes())
        .context("writing temp script")?;
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(Permissions::from_mode(0o755))
            .context("marking temp script executable")?;
    }
    let (_, path) = file.keep().context("keeping temp script")?;
    Ok(path)
}
