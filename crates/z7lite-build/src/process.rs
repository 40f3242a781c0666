//! External tool invocation.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use crate::error::{BuildError, Result};

/// Run `program` with `args` in `cwd`, failing on a non-zero status.
///
/// The call blocks until the tool exits. There is no retry and no timeout.
pub fn run_tool<I, S>(program: &Path, args: I, cwd: &Path) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = program.display().to_string();
    tracing::info!(%tool, cwd = %cwd.display(), "running");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|source| BuildError::Spawn {
            tool: tool.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(BuildError::ExternalTool {
            tool,
            code: output.status.code(),
            stderr,
        });
    }

    tracing::debug!(%tool, "finished");
    Ok(())
}
