//! The filesystem/subprocess collaborator. The core never touches `std::fs`
//! or `std::process` directly; it only ever sees the outside world through
//! this trait. This mirrors how `buildsys::builder` isolates its one
//! blocking call (`duct::cmd(...).run()`) behind a method rather than
//! scattering subprocess plumbing through the resolver.

pub mod error;

use std::path::{Path, PathBuf};

pub use error::{Error, Result};

/// Combined stdout+stderr from a finished subprocess, and whether it
/// succeeded. The core classifies diagnostics out of `combined_output`
/// regardless of `success` — a toolchain can print an `error` line and
/// still exit 0, or vice versa.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub combined_output: String,
}

/// Everything the core needs from the outside world. Threaded through the
/// parser, resolver, and compiler adapters as an explicit `&dyn Platform`
/// rather than reached for as global state.
pub trait Platform {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;
    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn run_command(&self, command_line: &str) -> Result<CommandOutput>;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
    fn current_dir(&self) -> Result<PathBuf>;
}

/// The production implementation: real files, a real shell.
#[derive(Debug, Default)]
pub struct RealPlatform;

impl Platform for RealPlatform {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes).map_err(|_| error::NotUtf8Snafu { path }.build())
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        use snafu::ResultExt;
        std::fs::read(path).context(error::ReadSnafu { path })
    }

    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()> {
        use snafu::ResultExt;
        std::fs::write(path, contents).context(error::WriteSnafu { path })
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        use snafu::ResultExt;
        std::fs::create_dir_all(path).context(error::CreateDirSnafu { path })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn run_command(&self, command_line: &str) -> Result<CommandOutput> {
        use snafu::ResultExt;
        // A full command line, including its own quoting, arrives as one
        // string (compiler adapters build these, not argv vectors), so it
        // is handed to a shell rather than split and exec'd directly --
        // grounded in `buildsys::builder` shelling out via `duct::cmd`.
        let output = duct::cmd!("sh", "-c", command_line)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .context(error::CommandStartSnafu {
                command: command_line.to_string(),
            })?;
        Ok(CommandOutput {
            success: output.status.success(),
            combined_output: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        use snafu::ResultExt;
        std::fs::canonicalize(path).context(error::CanonicalizeSnafu { path })
    }

    fn current_dir(&self) -> Result<PathBuf> {
        use snafu::ResultExt;
        std::env::current_dir().context(error::CurrentDirSnafu)
    }
}
