/*!

The CLI surface for the `brick` binary. Kept as a thin, binary-private
layer (only ever `mod`-ed from `main.rs`, never re-exported from the
library) so the library crate stays free of `clap` -- mirroring how
`buildsys::args` is a binary-only concern in the teacher crate.

!*/

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// A build orchestrator for native software.
#[derive(Debug, Parser)]
#[command(name = "brick", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Command>,

    #[command(flatten)]
    pub(crate) build: BuildArgs,

    /// Overrides the default `info` log level; also settable via `RUST_LOG`.
    #[arg(long, global = true)]
    pub(crate) log_level: Option<LevelFilter>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Add the current directory to the brickyard.
    Register(RegisterArgs),
}

/// Build the project rooted at `./blueprint`. This is the implicit
/// behavior when no subcommand is given.
#[derive(Debug, Parser)]
pub(crate) struct BuildArgs {
    /// Selects which predicate-gated fields apply, e.g. `sources(debug): ...`.
    #[arg(long, default_value = "")]
    pub(crate) build_type: String,

    /// Builds only executables tagged with this group (default: untagged executables).
    #[arg(long, default_value = "")]
    pub(crate) group: String,

    /// Overrides the target platform used to pick file extensions and `#platform` predicates.
    #[arg(long, default_value = "win32")]
    pub(crate) platform: String,

    /// Prints every command line before executing it.
    #[arg(long)]
    pub(crate) verbose: bool,
}

#[derive(Debug, Parser)]
pub(crate) struct RegisterArgs {
    /// Defaults to the last path segment of the current directory.
    pub(crate) name: Option<String>,
}
