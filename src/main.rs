/*!
`brick` -- the command-line entry point for the build orchestrator. Parses
arguments, resolves the brickyard registry path, and dispatches to either
`register` or a full build. All of the actual work lives in the `brickyard`
library crate; this binary only owns process exit codes, logging setup, and
printing the run's diagnostics.
*/

mod args;

use std::path::{Path, PathBuf};
use std::process;

use args::{Cli, Command};
use brickyard::brickyard::Brickyard;
use brickyard::driver::{self, RunContext};
use brickyard::platform::{Platform, RealPlatform};
use clap::Parser;
use log::LevelFilter;
use snafu::{OptionExt, ResultExt};

mod error {
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub(super)))]
    pub(super) enum Error {
        #[snafu(display("{source}"))]
        Brickyard { source: brickyard::brickyard::Error },

        #[snafu(display("Could not determine a config directory for the brickyard registry"))]
        NoConfigDir,

        #[snafu(display("'{}' is already registered in the brickyard", name))]
        AlreadyRegistered { name: String },

        #[snafu(display("Could not determine the current directory: {}", source))]
        CurrentDir { source: brickyard::platform::Error },
    }

    pub(super) type Result<T> = std::result::Result<T, Error>;
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.unwrap_or(LevelFilter::Info))
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(has_errors) => process::exit(if has_errors { 1 } else { 0 }),
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

/// Returns whether the run failed (never an `Err` for build failures --
/// those are reported through the return value and printed diagnostics,
/// matching spec §7's "process exits non-zero if the global error flag is
/// set" without treating a failed *build* as a Rust-level error).
fn run(cli: Cli) -> error::Result<bool> {
    let platform = RealPlatform;
    let brickyard_path = brickyard_path()?;

    match cli.command {
        Some(Command::Register(args)) => {
            register(&platform, &brickyard_path, args.name)?;
            Ok(false)
        }
        None => build(&platform, &brickyard_path, cli.build),
    }
}

fn brickyard_path() -> error::Result<PathBuf> {
    let config_dir = dirs::config_dir().context(error::NoConfigDirSnafu)?;
    Ok(config_dir.join("bricks").join("brick.yard"))
}

/// `register [<name>]`: add the current directory to the brickyard under
/// `<name>` (defaulting to the last path segment of the current
/// directory). Fails if that name is already registered.
fn register(platform: &dyn Platform, brickyard_path: &Path, name: Option<String>) -> error::Result<()> {
    let mut yard = Brickyard::load(platform, brickyard_path).unwrap_or_default();

    let cwd = platform.current_dir().context(error::CurrentDirSnafu)?;
    let name = name.unwrap_or_else(|| {
        cwd.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    if yard.find(&name, "").is_some() {
        return error::AlreadyRegisteredSnafu { name }.fail();
    }

    yard.add(name, "", cwd.to_string_lossy().into_owned());
    yard.save(platform, brickyard_path, false)
        .context(error::BrickyardSnafu)?;
    Ok(())
}

/// Parses and builds `./blueprint`, printing every collected diagnostic in
/// recorded order followed by the closing "Build finished."/"Build
/// aborted." message (spec §7's user-visible behavior).
fn build(platform: &dyn Platform, brickyard_path: &Path, args: args::BuildArgs) -> error::Result<bool> {
    let yard = Brickyard::load(platform, brickyard_path).unwrap_or_default();

    let ctx = RunContext {
        platform,
        brickyard: &yard,
        build_type: args.build_type,
        target_platform: args.platform,
        group: args.group,
        verbose: args.verbose,
    };

    let report = driver::run(&ctx, Path::new("blueprint"));

    for message in &report.diagnostics {
        println!("{message}");
    }

    if report.has_errors {
        println!("Build aborted.");
    } else {
        println!("Build finished.");
    }

    Ok(report.has_errors)
}
