//! Invocation of external programs.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};

use tracing::debug;

use crate::error::ToolError;

/// Run `program` with `args` and capture both output streams.
///
/// The exit status is not checked; callers decide what a failure means
/// for the tool they are driving.
pub(crate) fn run<I, S>(program: &str, args: I) -> Result<Output, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    debug!("Running {:?}", command);

    command.output().map_err(|source| ToolError::Spawn {
        program: program.to_string(),
        source,
    })
}

/// Fail with [`ToolError::NonZeroExit`] unless the program succeeded.
pub(crate) fn check_status(program: &str, path: &Path, output: &Output) -> Result<(), ToolError> {
    if output.status.success() {
        return Ok(());
    }

    Err(ToolError::NonZeroExit {
        program: program.to_string(),
        path: path.to_path_buf(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Whether `program` can be started at all.
pub fn command_available(program: &str) -> bool {
    Command::new(program).arg("-v").output().is_ok()
}
