use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum Error {
    #[snafu(display("Failed to read brickyard file '{}': {}", path.display(), source))]
    Read {
        path: PathBuf,
        source: crate::platform::error::Error,
    },

    #[snafu(display("Brickyard file '{}' has an unrecognized record tag {:#04x}", path.display(), tag))]
    UnknownTag { path: PathBuf, tag: u8 },

    #[snafu(display("Brickyard file '{}' is truncated", path.display()))]
    Truncated { path: PathBuf },

    #[snafu(display("Failed to write brickyard file '{}': {}", path.display(), source))]
    Write {
        path: PathBuf,
        source: crate::platform::error::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
