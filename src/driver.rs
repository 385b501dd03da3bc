//! Top-level orchestration: parse the root blueprint (imports are parsed
//! transitively as part of that single call, see [`crate::parser`]),
//! iterate its executables in declared order, build each one that matches
//! the active group, and aggregate a final report.
//!
//! This module never touches stdio. It hands back a [`BuildReport`]
//! carrying the fully-resolved blueprint tree, the ordered list of
//! diagnostic lines a caller should print, and whether the run failed --
//! printing those lines and the closing "Build finished."/"Build aborted."
//! message is `main`'s job (see `src/main.rs`), matching how logging and
//! error `Display` are kept separate from the library in the rest of this
//! crate.

use std::path::Path;

use crate::brickyard::Brickyard;
use crate::model::{Blueprint, BlueprintStatus, EntityKind};
use crate::parser::{parse_blueprint_file, ParseContext};
use crate::platform::Platform;
use crate::resolver::{self, BuildContext};
use crate::target;

/// Everything a full build run needs: how to reach the outside world, the
/// registry for cross-project imports, and the CLI-selected build
/// configuration.
pub struct RunContext<'a> {
    pub platform: &'a dyn Platform,
    pub brickyard: &'a Brickyard,
    pub build_type: String,
    pub target_platform: String,
    pub group: String,
    pub verbose: bool,
}

#[derive(Debug)]
pub struct BuildReport {
    pub blueprint: Blueprint,
    pub diagnostics: Vec<String>,
    pub has_errors: bool,
}

/// Parse and build `root_file`. Always returns a report; `has_errors`
/// reflects the process-level failure flag described in spec §7 (any
/// `Error` diagnostic anywhere in the run).
pub fn run(ctx: &RunContext, root_file: &Path) -> BuildReport {
    let parse_ctx = ParseContext {
        platform: ctx.platform,
        brickyard: ctx.brickyard,
        build_type: ctx.build_type.clone(),
        target_platform: ctx.target_platform.clone(),
    };
    let mut blueprint = parse_blueprint_file(&parse_ctx, root_file);

    if blueprint.status != BlueprintStatus::Error {
        match target::lookup(&ctx.target_platform) {
            Ok(info) => {
                let build_ctx = BuildContext {
                    platform: ctx.platform,
                    target: info,
                    verbose: ctx.verbose,
                };

                let names: Vec<String> = blueprint
                    .entities
                    .iter()
                    .filter(|e| e.kind == EntityKind::Executable && e.matches_group(&ctx.group))
                    .map(|e| e.name.clone())
                    .collect();

                log::debug!("building {} executable(s) in group '{}'", names.len(), ctx.group);
                for name in &names {
                    resolver::build_entity(&build_ctx, &mut blueprint, name);
                }
            }
            Err(e) => {
                blueprint.diagnostics.error(e.to_string());
            }
        }
    }

    let mut diagnostics = Vec::new();
    collect_diagnostics(&blueprint, &mut diagnostics);
    let has_errors = any_errors(&blueprint);

    BuildReport {
        blueprint,
        diagnostics,
        has_errors,
    }
}

fn any_errors(blueprint: &Blueprint) -> bool {
    blueprint.diagnostics.has_errors()
        || blueprint.entities.iter().any(|e| e.has_errors())
        || blueprint.imports.iter().any(any_errors)
}

/// Pre-order walk of the blueprint tree: this blueprint's own (parse-time)
/// diagnostics first, then each entity's diagnostics in declared order,
/// then each import recursively in declared order. This is the order a
/// single-threaded parse-then-build run actually produces them in, since
/// parsing completes in full before any entity is built.
fn collect_diagnostics(blueprint: &Blueprint, out: &mut Vec<String>) {
    for d in blueprint.diagnostics.messages() {
        out.push(d.to_string());
    }
    for entity in &blueprint.entities {
        for d in entity.diagnostics.messages() {
            out.push(format!("{}: {}", entity.name, d));
        }
    }
    for import in &blueprint.imports {
        collect_diagnostics(import, out);
    }
}
