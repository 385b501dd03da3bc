//! The in-memory representation of blueprints, their entities, and the
//! dependency edges between them. Nothing in this module talks to the
//! filesystem or a subprocess; it is pure data plus the small amount of
//! bookkeeping (duplicate suppression, status transitions) that the
//! resolver and compiler adapters rely on.

use std::path::PathBuf;

use crate::diagnostics::DiagnosticSink;

/// A reference to another entity, either in the same blueprint
/// (`module` empty) or in a named import.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Dependency {
    pub module_name: String,
    pub entity_name: String,
}

impl Dependency {
    pub fn local(entity_name: impl Into<String>) -> Self {
        Self {
            module_name: String::new(),
            entity_name: entity_name.into(),
        }
    }

    pub fn qualified(module_name: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            entity_name: entity_name.into(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.module_name.is_empty()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntityKind {
    Brick,
    Executable,
    Library,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LibraryKind {
    None,
    Static,
    Shared,
}

impl Default for LibraryKind {
    fn default() -> Self {
        LibraryKind::None
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntityStatus {
    Unbuilt,
    Building,
    Ready,
    Error,
}

/// Append `value` to `values` unless it is already present. All
/// order-sensitive sequences in the model (include folders, symbols,
/// sources, libraries) are merged this way so that link order survives
/// brick inlining without duplicate entries.
pub fn append_unique(values: &mut Vec<String>, value: impl Into<String>) {
    let value = value.into();
    if !values.contains(&value) {
        values.push(value);
    }
}

pub fn extend_unique(values: &mut Vec<String>, additional: &[String]) {
    for value in additional {
        append_unique(values, value.clone());
    }
}

/// A single named build unit inside a blueprint.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub lib_kind: LibraryKind,
    pub status: EntityStatus,

    pub compiler: String,
    pub linker: String,

    /// Output directory, possibly empty (meaning: use the default for this
    /// entity kind).
    pub build_folder: String,
    /// `.bricks/<entity>.<ext>` scratch directory for object files.
    pub intermediate_folder: PathBuf,
    /// Final artifact path; only meaningful once `status == Ready`.
    pub file_path: PathBuf,

    pub include_folders: Vec<String>,
    pub symbols: Vec<String>,
    pub sources: Vec<String>,
    pub libraries: Vec<String>,
    /// Group tags used to filter executables via `--group`.
    pub groups: Vec<String>,

    pub dependencies: Vec<Dependency>,

    pub build_commands: Vec<String>,
    pub diagnostics: DiagnosticSink,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind, compiler: String, linker: String) -> Self {
        Self {
            name: name.into(),
            kind,
            lib_kind: LibraryKind::None,
            status: EntityStatus::Unbuilt,
            compiler,
            linker,
            build_folder: String::new(),
            intermediate_folder: PathBuf::new(),
            file_path: PathBuf::new(),
            include_folders: Vec::new(),
            symbols: Vec::new(),
            sources: Vec::new(),
            libraries: Vec::new(),
            groups: Vec::new(),
            dependencies: Vec::new(),
            build_commands: Vec::new(),
            diagnostics: DiagnosticSink::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Pull another entity's brick contribution into this one, suppressing
    /// duplicates and preserving declared order.
    pub fn merge_brick(&mut self, brick: &Entity) {
        extend_unique(&mut self.include_folders, &brick.include_folders);
        extend_unique(&mut self.sources, &brick.sources);
        extend_unique(&mut self.libraries, &brick.libraries);
        extend_unique(&mut self.symbols, &brick.symbols);
    }

    /// True if this executable should be built for the active `--group`.
    /// An executable with no group tags matches only the empty group; an
    /// executable with tags matches if `active_group` is one of them.
    pub fn matches_group(&self, active_group: &str) -> bool {
        if self.groups.is_empty() {
            active_group.is_empty()
        } else {
            self.groups.iter().any(|g| g == active_group)
        }
    }
}

/// The lifecycle of a parsed blueprint.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlueprintStatus {
    Init,
    Parsing,
    Building,
    Ready,
    Error,
}

/// A parsed blueprint file: the root project, or one of its imports.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub status: BlueprintStatus,
    /// Empty for the root blueprint; set to the alias or import name for
    /// imports.
    pub name: String,

    pub file: PathBuf,
    pub path: PathBuf,

    pub compiler: String,
    pub linker: String,
    pub build_folder: String,
    pub build_type: String,

    pub entities: Vec<Entity>,
    pub imports: Vec<Blueprint>,

    /// Parse-time diagnostics. Parse errors attach to the blueprint being
    /// parsed, not to any one entity inside it.
    pub diagnostics: DiagnosticSink,
}

impl Blueprint {
    pub fn new_root() -> Self {
        Self {
            status: BlueprintStatus::Init,
            name: String::new(),
            file: PathBuf::new(),
            path: PathBuf::new(),
            compiler: String::new(),
            linker: String::new(),
            build_folder: String::new(),
            build_type: String::new(),
            entities: Vec::new(),
            imports: Vec::new(),
            diagnostics: DiagnosticSink::new(),
        }
    }

    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn find_entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name == name)
    }

    pub fn find_import(&self, name: &str) -> Option<&Blueprint> {
        self.imports.iter().find(|b| b.name == name)
    }

    pub fn find_import_mut(&mut self, name: &str) -> Option<&mut Blueprint> {
        self.imports.iter_mut().find(|b| b.name == name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn brick(includes: &[&str]) -> Entity {
        let mut e = Entity::new("core", EntityKind::Brick, "msvc".into(), "msvc".into());
        for i in includes {
            e.include_folders.push((*i).to_string());
        }
        e
    }

    #[test]
    fn merging_the_same_brick_twice_has_no_duplicates() {
        let mut app = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        let core = brick(&["include"]);
        app.merge_brick(&core);
        app.merge_brick(&core);
        assert_eq!(app.include_folders, vec!["include".to_string()]);
    }

    #[test]
    fn group_matching_is_or_across_tags() {
        let mut e = Entity::new("app", EntityKind::Executable, "msvc".into(), "msvc".into());
        assert!(e.matches_group(""));
        assert!(!e.matches_group("tools"));

        e.groups.push("tools".to_string());
        e.groups.push("release".to_string());
        assert!(!e.matches_group(""));
        assert!(e.matches_group("tools"));
        assert!(e.matches_group("release"));
        assert!(!e.matches_group("debug"));
    }
}
