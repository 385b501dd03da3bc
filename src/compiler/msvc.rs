//! The only compiler adapter implemented in source. Targets the MSVC
//! `cl`/`LIB` command-line toolchain; shared libraries are not implemented.

use super::error::{self, Result};
use super::CompilerAdapter;
use crate::model::{Blueprint, Entity, EntityKind, LibraryKind};
use std::path::Path;

pub struct MsvcAdapter;

impl CompilerAdapter for MsvcAdapter {
    fn name(&self) -> &str {
        "msvc"
    }

    fn generate_commands(&self, blueprint: &Blueprint, entity: &mut Entity) -> Result<()> {
        entity.build_commands.clear();
        match entity.kind {
            EntityKind::Executable => generate_executable(blueprint, entity),
            EntityKind::Library => match entity.lib_kind {
                LibraryKind::Static => generate_static_library(blueprint, entity),
                LibraryKind::Shared => error::SharedLibraryUnsupportedSnafu { compiler: "msvc" }.fail(),
                LibraryKind::None => error::UnsupportedEntityKindSnafu { name: entity.name.clone() }.fail(),
            },
            EntityKind::Brick => error::UnsupportedEntityKindSnafu { name: entity.name.clone() }.fail(),
        }
    }
}

fn generate_executable(blueprint: &Blueprint, entity: &mut Entity) -> Result<()> {
    if entity.sources.is_empty() {
        return error::NoSourcesSnafu { name: entity.name.clone() }.fail();
    }

    let debug = blueprint.build_type == "debug";
    let mut cmd = String::from("cl /nologo /permissive- /W2");
    if debug {
        cmd.push_str(" /Zi");
    }
    for symbol in &entity.symbols {
        cmd.push_str(&format!(" /D\"{symbol}\""));
    }
    for dir in &entity.include_folders {
        cmd.push_str(&format!(" /I\"{dir}\""));
    }

    let file_path = entity.file_path.to_string_lossy().into_owned();
    let intermediate = entity.intermediate_folder.to_string_lossy().into_owned();
    cmd.push_str(&format!(" /Fe\"{file_path}\""));
    cmd.push_str(&format!(" /Fo\"{intermediate}/\""));

    if debug {
        if let Some(parent) = entity.file_path.parent() {
            let parent = parent.to_string_lossy();
            if !parent.is_empty() {
                cmd.push_str(&format!(" /Fd\"{parent}/\""));
            }
        }
    }

    for source in &entity.sources {
        cmd.push_str(&format!(" \"{source}\""));
    }

    cmd.push_str(" /link /SUBSYSTEM:CONSOLE /INCREMENTAL:NO");
    for lib in &entity.libraries {
        cmd.push_str(&format!(" \"{lib}\""));
    }

    entity.build_commands.push(cmd);
    Ok(())
}

fn generate_static_library(blueprint: &Blueprint, entity: &mut Entity) -> Result<()> {
    if entity.sources.is_empty() {
        return error::NoSourcesSnafu { name: entity.name.clone() }.fail();
    }

    let debug = blueprint.build_type == "debug";
    let intermediate = entity.intermediate_folder.to_string_lossy().into_owned();

    let mut compile = String::from("cl /nologo /permissive- /W2 /c");
    if debug {
        compile.push_str(" /Zi");
    }
    for symbol in &entity.symbols {
        compile.push_str(&format!(" /D\"{symbol}\""));
    }
    for dir in &entity.include_folders {
        compile.push_str(&format!(" /I\"{dir}\""));
    }
    compile.push_str(&format!(" /Fo\"{intermediate}/\""));
    if debug {
        compile.push_str(&format!(" /Fd\"{intermediate}/\""));
    }

    let mut object_files = Vec::with_capacity(entity.sources.len());
    for source in &entity.sources {
        compile.push_str(&format!(" \"{source}\""));
        let stem = Path::new(source)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.clone());
        object_files.push(format!("{intermediate}/{stem}.obj"));
    }

    entity.build_commands.push(compile);

    let file_path = entity.file_path.to_string_lossy().into_owned();
    let mut archive = format!("LIB /NOLOGO /OUT:\"{file_path}\"");
    for object in &object_files {
        archive.push_str(&format!(" \"{object}\""));
    }
    entity.build_commands.push(archive);

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Entity, EntityKind};
    use std::path::PathBuf;

    fn blueprint(build_type: &str) -> Blueprint {
        let mut bp = Blueprint::new_root();
        bp.build_type = build_type.to_string();
        bp
    }

    #[test]
    fn minimal_executable_command() {
        let bp = blueprint("release");
        let mut e = Entity::new("hello", EntityKind::Executable, "msvc".into(), "msvc".into());
        e.sources.push("hello.c".into());
        e.file_path = PathBuf::from("/proj/bin/hello.exe");
        e.intermediate_folder = PathBuf::from("/proj/.bricks/hello.exe");

        MsvcAdapter.generate_commands(&bp, &mut e).unwrap();
        assert_eq!(e.build_commands.len(), 1);
        let cmd = &e.build_commands[0];
        assert!(cmd.starts_with("cl /nologo /permissive- /W2"));
        assert!(cmd.ends_with("\"hello.c\" /link /SUBSYSTEM:CONSOLE /INCREMENTAL:NO"));
        assert!(!cmd.contains("/D"));
        assert!(!cmd.contains("/I"));
        assert!(!cmd.contains("/Zi"));
    }

    #[test]
    fn brick_contribution_adds_symbol_and_source() {
        let bp = blueprint("release");
        let mut e = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        e.symbols.push("X".into());
        e.sources.push("a.c".into());
        e.sources.push("main.c".into());
        e.file_path = PathBuf::from("/proj/bin/app.exe");
        e.intermediate_folder = PathBuf::from("/proj/.bricks/app.exe");

        MsvcAdapter.generate_commands(&bp, &mut e).unwrap();
        let cmd = &e.build_commands[0];
        assert!(cmd.contains("/D\"X\""));
        assert!(cmd.contains("\"a.c\""));
        assert!(cmd.contains("\"main.c\""));
    }

    #[test]
    fn static_library_produces_compile_then_archive() {
        let bp = blueprint("release");
        let mut e = Entity::new("lib", EntityKind::Library, "msvc".into(), "msvc".into());
        e.lib_kind = LibraryKind::Static;
        e.sources.push("l.c".into());
        e.file_path = PathBuf::from("/proj/.bricks/lib.lib");
        e.intermediate_folder = PathBuf::from("/proj/.bricks/lib.lib");

        MsvcAdapter.generate_commands(&bp, &mut e).unwrap();
        assert_eq!(e.build_commands.len(), 2);
        assert!(e.build_commands[0].starts_with("cl /nologo /permissive- /W2 /c"));
        assert!(e.build_commands[0].contains("\"l.c\""));
        assert!(e.build_commands[1].starts_with("LIB /NOLOGO /OUT:\"/proj/.bricks/lib.lib\""));
        assert!(e.build_commands[1].contains("l.obj"));
    }

    #[test]
    fn debug_build_type_adds_zi_and_fd() {
        let bp = blueprint("debug");
        let mut e = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        e.sources.push("main.c".into());
        e.file_path = PathBuf::from("/proj/bin/app.exe");
        e.intermediate_folder = PathBuf::from("/proj/.bricks/app.exe");

        MsvcAdapter.generate_commands(&bp, &mut e).unwrap();
        let cmd = &e.build_commands[0];
        assert!(cmd.contains("/Zi"));
        assert!(cmd.contains("/Fd\"/proj/bin/\""));
    }

    #[test]
    fn empty_sources_is_an_error() {
        let bp = blueprint("release");
        let mut e = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        assert!(MsvcAdapter.generate_commands(&bp, &mut e).is_err());
        assert!(e.build_commands.is_empty());
    }

    #[test]
    fn shared_library_is_unsupported() {
        let bp = blueprint("release");
        let mut e = Entity::new("lib", EntityKind::Library, "msvc".into(), "msvc".into());
        e.lib_kind = LibraryKind::Shared;
        e.sources.push("l.c".into());
        assert!(MsvcAdapter.generate_commands(&bp, &mut e).is_err());
    }
}
