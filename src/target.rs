//! The closed table of target-platform info queried at startup. Unlike the
//! `Platform` trait (filesystem/subprocess collaborator), this is pure data:
//! the file-extension conventions a toolchain uses for each artifact kind on
//! a given OS.

pub mod error;

pub use error::{Error, Result};

/// Per-entity-kind file extensions for one target platform.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TargetPlatformInfo {
    pub exe: &'static str,
    pub static_lib: &'static str,
    pub shared_lib: &'static str,
}

/// Look up a platform by name. An unknown platform is a fatal startup error:
/// there is no sensible default extension set to fall back to.
pub fn lookup(name: &str) -> Result<TargetPlatformInfo> {
    use snafu::OptionExt;

    match name {
        "win32" | "msvc" => Some(TargetPlatformInfo {
            exe: "exe",
            static_lib: "lib",
            shared_lib: "dll",
        }),
        _ => None,
    }
    .context(error::UnknownPlatformSnafu { name })
}
