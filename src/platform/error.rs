use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum Error {
    #[snafu(display("Failed to read '{}': {}", path.display(), source))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("File '{}' is not valid UTF-8", path.display()))]
    NotUtf8 { path: PathBuf },

    #[snafu(display("Failed to create directory '{}': {}", path.display(), source))]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to write '{}': {}", path.display(), source))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to start command '{}': {}", command, source))]
    CommandStart {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to determine the current directory: {}", source))]
    CurrentDir { source: std::io::Error },

    #[snafu(display("Failed to canonicalize '{}': {}", path.display(), source))]
    Canonicalize {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
