//! The dependency resolver and per-entity build driver. Walks an entity's
//! declared dependencies, inlines brick contributions, recursively builds
//! dependent libraries, generates and runs compiler-adapter commands, and
//! leaves the entity in `Ready` or `Error`.
//!
//! Every failure here is a diagnostic attached to the entity that owns it,
//! never a propagated `Err` -- matching the rest of the core's diagnostic
//! model (see [`crate::parser`]). A `resolver::error` module would have
//! nothing to hold: there is no case where this module needs to signal
//! failure to a caller other than through the entity it was handed.

use std::mem;
use std::path::{Path, PathBuf};

use crate::compiler;
use crate::model::{append_unique, extend_unique, Blueprint, Entity, EntityKind, EntityStatus, LibraryKind};
use crate::paths::{combine_entity_path, combine_intermediate_path};
use crate::platform::Platform;
use crate::target::TargetPlatformInfo;

/// Everything the resolver needs to build one entity: how to reach the
/// outside world, and the active target platform's file-extension table.
pub struct BuildContext<'a> {
    pub platform: &'a dyn Platform,
    pub target: TargetPlatformInfo,
    pub verbose: bool,
}

fn fail(entity: &mut Entity, message: impl Into<String>) {
    entity.diagnostics.error(message);
    entity.status = EntityStatus::Error;
}

fn blueprint_identity(blueprint: &Blueprint) -> String {
    if blueprint.name.is_empty() {
        blueprint.file.display().to_string()
    } else {
        format!("{} ({})", blueprint.name, blueprint.file.display())
    }
}

/// Build `entity_name` inside `blueprint` if it has not already been built.
/// Re-entrant: a second call once the entity is `Ready`/`Error` returns
/// immediately, matching the "at most once per process" invariant.
pub fn build_entity(ctx: &BuildContext, blueprint: &mut Blueprint, entity_name: &str) {
    let Some(idx) = blueprint.entities.iter().position(|e| e.name == entity_name) else {
        return;
    };

    if matches!(blueprint.entities[idx].status, EntityStatus::Ready | EntityStatus::Error) {
        return;
    }

    // Entities are looked up by name, never held as references (see
    // spec §9's "dependency-by-name" note), so resolving this entity's own
    // dependencies needs `&mut blueprint` free for recursive lookups. Take
    // the entity out of its slot for the duration of the build and put it
    // back when done, rather than holding a borrow of `blueprint.entities`
    // across the whole call.
    let placeholder = Entity::new(String::new(), EntityKind::Brick, String::new(), String::new());
    let mut entity = mem::replace(&mut blueprint.entities[idx], placeholder);
    entity.status = EntityStatus::Building;

    resolve_and_build(ctx, blueprint, &mut entity);

    blueprint.entities[idx] = entity;
}

fn resolve_and_build(ctx: &BuildContext, blueprint: &mut Blueprint, entity: &mut Entity) {
    if entity.kind == EntityKind::Brick {
        fail(entity, format!("Cannot build brick '{}' directly; bricks are only inlined into other entities", entity.name));
        return;
    }

    let Some(adapter) = compiler::lookup(&entity.compiler) else {
        fail(entity, format!("Unknown compiler '{}' for entity '{}'", entity.compiler, entity.name));
        return;
    };

    let dependencies = entity.dependencies.clone();
    for dep in &dependencies {
        log::debug!("resolving dependency '{}{}{}' for entity '{}'", dep.module_name, if dep.is_local() { "" } else { "." }, dep.entity_name, entity.name);

        let sub = if dep.is_local() {
            Some(&mut *blueprint)
        } else {
            blueprint.find_import_mut(&dep.module_name)
        };
        let Some(sub) = sub else {
            fail(
                entity,
                format!(
                    "No module '{}' (needed for '{}') imported by blueprint '{}'",
                    dep.module_name,
                    dep.entity_name,
                    blueprint_identity(blueprint)
                ),
            );
            return;
        };

        let Some(dep_kind) = sub.find_entity(&dep.entity_name).map(|e| e.kind) else {
            fail(entity, format!("No entity '{}' in blueprint '{}'", dep.entity_name, blueprint_identity(sub)));
            return;
        };

        match dep_kind {
            EntityKind::Brick => {
                let brick = sub.find_entity(&dep.entity_name).expect("looked up above");
                entity.merge_brick(brick);
            }
            EntityKind::Library => {
                build_entity(ctx, sub, &dep.entity_name);
                let lib = sub.find_entity(&dep.entity_name).expect("looked up above");
                if lib.status == EntityStatus::Ready {
                    append_unique(&mut entity.libraries, lib.file_path.to_string_lossy().into_owned());
                    extend_unique(&mut entity.libraries, &lib.libraries);
                } else {
                    fail(entity, format!("Dependency '{}' failed to build", dep.entity_name));
                    return;
                }
            }
            EntityKind::Executable => {
                // Only libraries and bricks are valid dependency kinds today;
                // a future revision may allow executables (see spec §9).
                fail(entity, format!("Entity '{}' cannot depend on executable '{}'", entity.name, dep.entity_name));
                return;
            }
        }
    }

    let extension = match (entity.kind, entity.lib_kind) {
        (EntityKind::Executable, _) => ctx.target.exe,
        (EntityKind::Library, LibraryKind::Shared) => ctx.target.shared_lib,
        (EntityKind::Library, _) => ctx.target.static_lib,
        (EntityKind::Brick, _) => unreachable!("handled above"),
    };

    let bp_path = blueprint.path.to_string_lossy().into_owned();
    entity.intermediate_folder = PathBuf::from(combine_intermediate_path(&bp_path, &entity.name, extension));

    let defaults_into_intermediate =
        entity.kind == EntityKind::Library && entity.lib_kind == LibraryKind::Static && entity.build_folder.is_empty();
    entity.file_path = if defaults_into_intermediate {
        entity.intermediate_folder.clone()
    } else {
        PathBuf::from(combine_entity_path(&bp_path, &entity.build_folder, &entity.name, extension))
    };

    if let Err(e) = ctx.platform.create_dir_all(&entity.intermediate_folder) {
        fail(entity, format!("Could not create intermediate folder: {e}"));
        return;
    }
    if let Some(parent) = entity.file_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = ctx.platform.create_dir_all(parent) {
                fail(entity, format!("Could not create output folder: {e}"));
                return;
            }
        }
    }

    if let Err(e) = adapter.generate_commands(blueprint, entity) {
        fail(entity, e.to_string());
        return;
    }
    log::debug!("generated {} command(s) for entity '{}'", entity.build_commands.len(), entity.name);

    let commands = entity.build_commands.clone();
    for command_line in &commands {
        if ctx.verbose {
            log::info!("{command_line}");
        }
        match ctx.platform.run_command(command_line) {
            Ok(output) => adapter.process_diagnostics(entity, &output.combined_output),
            Err(e) => {
                fail(entity, format!("Failed to execute build command: {e}"));
                return;
            }
        }
    }

    if entity.status != EntityStatus::Error {
        entity.status = EntityStatus::Ready;
    }
}

/// True if `path` exists according to `platform` -- used by tests to check
/// the `Ready => file_path exists` invariant without reaching into
/// `std::fs` directly.
pub fn artifact_exists(platform: &dyn Platform, path: &Path) -> bool {
    platform.exists(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Dependency, EntityKind, LibraryKind};
    use crate::platform::fake::FakePlatform;
    use crate::target;

    fn ctx(platform: &FakePlatform) -> BuildContext<'_> {
        BuildContext {
            platform,
            target: target::lookup("win32").unwrap(),
            verbose: false,
        }
    }

    fn blueprint(path: &str) -> Blueprint {
        let mut bp = Blueprint::new_root();
        bp.path = PathBuf::from(path);
        bp.file = PathBuf::from(format!("{path}/blueprint"));
        bp.compiler = "msvc".into();
        bp.linker = "msvc".into();
        bp
    }

    #[test]
    fn minimal_executable_builds_to_ready() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");
        let mut e = Entity::new("hello", EntityKind::Executable, "msvc".into(), "msvc".into());
        e.sources.push("/proj/hello.c".into());
        bp.entities.push(e);

        build_entity(&c, &mut bp, "hello");
        let hello = bp.find_entity("hello").unwrap();
        assert_eq!(hello.status, EntityStatus::Ready);
        assert_eq!(hello.build_commands.len(), 1);
        assert!(hello.build_commands[0].starts_with("cl /nologo"));
        assert!(platform.exists(&hello.file_path));
    }

    #[test]
    fn missing_dependency_is_an_error_and_spawns_nothing() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");
        let mut e = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        e.sources.push("/proj/m.c".into());
        e.dependencies.push(Dependency::local("nope"));
        bp.entities.push(e);

        build_entity(&c, &mut bp, "app");
        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.status, EntityStatus::Error);
        assert!(app.diagnostics.messages()[0].message.contains("No entity 'nope'"));
        assert!(platform.commands().is_empty());
    }

    #[test]
    fn dependency_on_unknown_module_names_both_module_and_entity() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");
        let mut app = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        app.sources.push("/proj/m.c".into());
        app.dependencies.push(Dependency::qualified("nomod", "parser"));
        bp.entities.push(app);

        build_entity(&c, &mut bp, "app");
        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.status, EntityStatus::Error);
        let message = &app.diagnostics.messages()[0].message;
        assert!(message.contains("No module 'nomod'"), "message was: {message}");
        assert!(message.contains("'parser'"), "message was: {message}");
        assert!(platform.commands().is_empty());
    }

    #[test]
    fn brick_contribution_merges_into_dependent_without_building() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");

        let mut brick = Entity::new("core", EntityKind::Brick, "msvc".into(), "msvc".into());
        brick.sources.push("/proj/a.c".into());
        brick.symbols.push("X".into());
        bp.entities.push(brick);

        let mut app = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        app.sources.push("/proj/main.c".into());
        app.dependencies.push(Dependency::local("core"));
        bp.entities.push(app);

        build_entity(&c, &mut bp, "app");
        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.status, EntityStatus::Ready);
        assert!(app.build_commands[0].contains("/D\"X\""));
        assert!(app.build_commands[0].contains("\"a.c\""));
        assert!(app.build_commands[0].contains("\"main.c\""));

        // The brick itself is never built -- no commands are generated for it.
        let core = bp.find_entity("core").unwrap();
        assert_eq!(core.status, EntityStatus::Unbuilt);
    }

    #[test]
    fn static_library_dependency_builds_then_links() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");

        let mut lib = Entity::new("lib", EntityKind::Library, "msvc".into(), "msvc".into());
        lib.lib_kind = LibraryKind::Static;
        lib.sources.push("/proj/l.c".into());
        bp.entities.push(lib);

        let mut app = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        app.sources.push("/proj/m.c".into());
        app.dependencies.push(Dependency::local("lib"));
        bp.entities.push(app);

        build_entity(&c, &mut bp, "app");

        let lib = bp.find_entity("lib").unwrap();
        assert_eq!(lib.status, EntityStatus::Ready);
        assert_eq!(lib.build_commands.len(), 2);

        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.status, EntityStatus::Ready);
        let lib_path = lib.file_path.to_string_lossy().into_owned();
        assert!(app.build_commands[0].contains(&format!("\"{lib_path}\"")));
    }

    #[test]
    fn static_library_with_no_build_folder_defaults_into_intermediate() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");
        let mut lib = Entity::new("lib", EntityKind::Library, "msvc".into(), "msvc".into());
        lib.lib_kind = LibraryKind::Static;
        lib.sources.push("/proj/l.c".into());
        bp.entities.push(lib);

        build_entity(&c, &mut bp, "lib");
        let lib = bp.find_entity("lib").unwrap();
        assert_eq!(lib.file_path, lib.intermediate_folder);
    }

    #[test]
    fn executable_dependency_is_unsupported() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");
        let mut other = Entity::new("tool", EntityKind::Executable, "msvc".into(), "msvc".into());
        other.sources.push("/proj/tool.c".into());
        bp.entities.push(other);

        let mut app = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        app.sources.push("/proj/m.c".into());
        app.dependencies.push(Dependency::local("tool"));
        bp.entities.push(app);

        build_entity(&c, &mut bp, "app");
        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.status, EntityStatus::Error);
        assert!(app.diagnostics.messages()[0].message.contains("cannot depend on executable"));
    }

    #[test]
    fn unknown_compiler_spawns_no_subprocess() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");
        let mut app = Entity::new("app", EntityKind::Executable, "gcc".into(), "gcc".into());
        app.sources.push("/proj/m.c".into());
        bp.entities.push(app);

        build_entity(&c, &mut bp, "app");
        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.status, EntityStatus::Error);
        assert!(platform.commands().is_empty());
    }

    #[test]
    fn rebuilding_a_ready_entity_is_a_noop() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");
        let mut app = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        app.sources.push("/proj/m.c".into());
        bp.entities.push(app);

        build_entity(&c, &mut bp, "app");
        build_entity(&c, &mut bp, "app");
        assert_eq!(platform.commands().len(), 1);
    }

    #[test]
    fn toolchain_error_output_marks_entity_failed() {
        use crate::platform::CommandOutput;

        let platform = FakePlatform::new();
        platform.queue_output(CommandOutput {
            success: false,
            combined_output: "main.c(4): error C2065: undeclared identifier".to_string(),
        });
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");
        let mut app = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        app.sources.push("/proj/m.c".into());
        bp.entities.push(app);

        build_entity(&c, &mut bp, "app");
        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.status, EntityStatus::Error);
    }

    #[test]
    fn qualified_dependency_resolves_through_import() {
        let platform = FakePlatform::new();
        let c = ctx(&platform);
        let mut bp = blueprint("/proj");

        let mut imported = blueprint("/other/mymod");
        imported.name = "mm".to_string();
        let mut parser_entity = Entity::new("parser", EntityKind::Library, "msvc".into(), "msvc".into());
        parser_entity.lib_kind = LibraryKind::Static;
        parser_entity.sources.push("/other/mymod/p.c".into());
        imported.entities.push(parser_entity);
        bp.imports.push(imported);

        let mut app = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        app.sources.push("/proj/m.c".into());
        app.dependencies.push(Dependency::qualified("mm", "parser"));
        bp.entities.push(app);

        build_entity(&c, &mut bp, "app");
        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.status, EntityStatus::Ready);
        let mm = bp.find_import("mm").unwrap();
        let parser = mm.find_entity("parser").unwrap();
        assert_eq!(parser.status, EntityStatus::Ready);
    }
}
