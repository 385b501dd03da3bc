//! Recursive-descent parser for the blueprint DSL. Consumes the token
//! stream from [`crate::lexer`] and populates a [`Blueprint`] tree.
//!
//! Parse failures are never `Err` values: every failure is a diagnostic
//! attached to the blueprint being parsed, which flips its `status` to
//! `Error` and stops that blueprint's statement loop. A malformed import
//! only poisons the imported child, not the importer — the importer's
//! statement loop continues with the next statement.

use crate::brickyard::Brickyard;
use crate::diagnostics::DiagnosticSink;
use crate::lexer::{Lexer, SourceLocation, Token, TokenKind};
use crate::model::{append_unique, Blueprint, BlueprintStatus, Dependency, Entity, EntityKind};
use crate::paths::{combine_include_path, combine_source_path};
use crate::platform::Platform;
use std::path::{Path, PathBuf};

/// Everything a parse run needs beyond the token stream: which build type
/// and platform gate predicate fields, and how to read files and resolve
/// imports.
pub struct ParseContext<'a> {
    pub platform: &'a dyn Platform,
    pub brickyard: &'a Brickyard,
    pub build_type: String,
    pub target_platform: String,
}

/// Parse `file` (and, transitively, everything it imports) into a
/// [`Blueprint`] tree. Always returns a blueprint; check `status` for
/// success.
pub fn parse_blueprint_file(ctx: &ParseContext, file: &Path) -> Blueprint {
    let mut stack = Vec::new();
    parse_inner(ctx, file, &mut stack)
}

fn parse_inner(ctx: &ParseContext, file: &Path, stack: &mut Vec<PathBuf>) -> Blueprint {
    let mut blueprint = Blueprint::new_root();
    blueprint.file = file.to_path_buf();
    blueprint.path = file.parent().map(Path::to_path_buf).unwrap_or_default();
    blueprint.build_type = ctx.build_type.clone();
    blueprint.status = BlueprintStatus::Parsing;

    let canonical = ctx.platform.canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    if stack.contains(&canonical) {
        blueprint.diagnostics.error(format!("Cyclic import of '{}'", file.display()));
        blueprint.status = BlueprintStatus::Error;
        return blueprint;
    }

    let source = match ctx.platform.read_to_string(file) {
        Ok(source) => source,
        Err(source_err) => {
            blueprint
                .diagnostics
                .error(format!("Could not read blueprint file '{}': {}", file.display(), source_err));
            blueprint.status = BlueprintStatus::Error;
            return blueprint;
        }
    };

    if source.trim().is_empty() {
        blueprint.diagnostics.error("file empty");
        blueprint.status = BlueprintStatus::Error;
        return blueprint;
    }

    stack.push(canonical);

    let bp_path = blueprint.path.to_string_lossy().into_owned();
    let file_display = file.to_string_lossy().into_owned();
    let mut parser = Parser {
        lexer: Lexer::new(&source),
        ctx,
        bp_path,
        file_display,
        source: &source,
    };
    parser.run(&mut blueprint, stack);

    stack.pop();

    if blueprint.status != BlueprintStatus::Error {
        blueprint.status = BlueprintStatus::Ready;
    }
    blueprint
}

struct Parser<'ctx, 'src> {
    lexer: Lexer<'src>,
    ctx: &'ctx ParseContext<'ctx>,
    /// `blueprint.path` rendered as a `/`-joined string, reused by every
    /// field that composes a path.
    bp_path: String,
    file_display: String,
    source: &'src str,
}

impl<'ctx, 'src> Parser<'ctx, 'src> {
    fn run(&mut self, blueprint: &mut Blueprint, stack: &mut Vec<PathBuf>) {
        loop {
            let tok = self.lexer.peek();
            let ok = match tok.kind {
                TokenKind::Eof => break,
                TokenKind::KwImport => {
                    self.lexer.advance();
                    self.parse_import(blueprint, stack)
                }
                TokenKind::KwExecutable | TokenKind::KwBrick | TokenKind::KwLibrary => {
                    self.lexer.advance();
                    self.parse_entity_decl(blueprint, tok)
                }
                TokenKind::Identifier => {
                    self.lexer.advance();
                    self.parse_field_decl(blueprint, tok)
                }
                _ => {
                    self.error(&mut blueprint.diagnostics, tok.location, format!("Unexpected token '{}'", tok.text));
                    None
                }
            };
            if ok.is_none() {
                blueprint.status = BlueprintStatus::Error;
                break;
            }
        }
    }

    fn error(&self, sink: &mut DiagnosticSink, location: SourceLocation, message: impl Into<String>) {
        let message = message.into();
        let line_index = location.line.saturating_sub(1) as usize;
        let raw_line = self.source.lines().nth(line_index).unwrap_or("");
        let trimmed = raw_line.trim_start();
        let trimmed_offset = raw_line.len() - trimmed.len();
        let caret_column = (location.column as usize).saturating_sub(trimmed_offset);
        let caret = format!("{}^", " ".repeat(caret_column.saturating_sub(1)));
        sink.error(format!(
            "{}:{}:{}: {}\n{}\n{}",
            self.file_display, location.line, location.column, message, trimmed, caret
        ));
    }

    fn expect(&mut self, blueprint: &mut Blueprint, kind: TokenKind) -> Option<()> {
        let tok = self.lexer.peek();
        if tok.kind == kind {
            self.lexer.advance();
            Some(())
        } else {
            self.error(&mut blueprint.diagnostics, tok.location, format!("Expected {} but found {}", kind, tok.kind));
            None
        }
    }

    fn expect_identifier(&mut self, blueprint: &mut Blueprint) -> Option<Token> {
        let tok = self.lexer.peek();
        if tok.kind == TokenKind::Identifier {
            self.lexer.advance();
            Some(tok)
        } else {
            self.error(&mut blueprint.diagnostics, tok.location, format!("Expected an identifier but found {}", tok.kind));
            None
        }
    }

    fn expect_string(&mut self, blueprint: &mut Blueprint) -> Option<String> {
        let tok = self.lexer.peek();
        match tok.kind {
            TokenKind::String => {
                self.lexer.advance();
                Some(tok.text)
            }
            TokenKind::MissingQuote => {
                self.error(&mut blueprint.diagnostics, tok.location, "Missing closing '\"' in string literal");
                None
            }
            _ => {
                self.error(&mut blueprint.diagnostics, tok.location, format!("Expected a string but found {}", tok.kind));
                None
            }
        }
    }

    fn parse_field_decl(&mut self, blueprint: &mut Blueprint, name_tok: Token) -> Option<()> {
        self.expect(blueprint, TokenKind::Colon)?;
        let value = self.expect_string(blueprint)?;
        self.expect(blueprint, TokenKind::Semicolon)?;
        match name_tok.text.as_str() {
            "compiler" => blueprint.compiler = value,
            "linker" => blueprint.linker = value,
            "build_folder" => blueprint.build_folder = value,
            other => {
                self.error(&mut blueprint.diagnostics, name_tok.location, format!("Unknown field '{other}'"));
                return None;
            }
        }
        Some(())
    }

    fn parse_import(&mut self, blueprint: &mut Blueprint, stack: &mut Vec<PathBuf>) -> Option<()> {
        let name_tok = self.lexer.peek();
        let raw_name = match name_tok.kind {
            TokenKind::Identifier | TokenKind::String => {
                self.lexer.advance();
                name_tok.text.clone()
            }
            _ => {
                self.error(&mut blueprint.diagnostics, name_tok.location, "Expected an import name");
                return None;
            }
        };

        let mut version = String::new();
        if self.lexer.peek().kind == TokenKind::Colon {
            self.lexer.advance();
            let version_tok = self.lexer.peek();
            match version_tok.kind {
                TokenKind::Identifier | TokenKind::String => {
                    self.lexer.advance();
                    version = version_tok.text;
                }
                _ => {
                    self.error(&mut blueprint.diagnostics, version_tok.location, "Expected a version after ':'");
                    return None;
                }
            }
        }

        let mut alias = raw_name.clone();
        if self.lexer.peek().kind == TokenKind::KwAs {
            self.lexer.advance();
            alias = self.expect_identifier(blueprint)?.text;
        }

        self.expect(blueprint, TokenKind::Semicolon)?;

        let child_file = self.resolve_import_path(blueprint, &raw_name, &version, name_tok.location)?;
        log::debug!("resolved import '{raw_name}' to '{}'", child_file.display());
        let mut child = parse_inner(self.ctx, &child_file, stack);
        child.name = alias;
        blueprint.imports.push(child);
        Some(())
    }

    /// Probe `<name>/blueprint` under the current working directory first;
    /// fall back to the brickyard's registered path for `name`.
    fn resolve_import_path(&mut self, blueprint: &mut Blueprint, name: &str, version: &str, location: SourceLocation) -> Option<PathBuf> {
        let cwd = match self.ctx.platform.current_dir() {
            Ok(cwd) => cwd,
            Err(e) => {
                self.error(&mut blueprint.diagnostics, location, format!("Could not determine current directory: {e}"));
                return None;
            }
        };

        let local_candidate = cwd.join(name).join("blueprint");
        if self.ctx.platform.exists(&local_candidate) {
            return Some(local_candidate);
        }

        if let Some(registered) = self.ctx.brickyard.find(name, version) {
            return Some(Path::new(registered).join("blueprint"));
        }

        self.error(&mut blueprint.diagnostics, location, format!("Could not resolve import '{name}'"));
        None
    }

    fn parse_entity_decl(&mut self, blueprint: &mut Blueprint, kind_tok: Token) -> Option<()> {
        let kind = match kind_tok.kind {
            TokenKind::KwExecutable => EntityKind::Executable,
            TokenKind::KwBrick => EntityKind::Brick,
            TokenKind::KwLibrary => EntityKind::Library,
            _ => unreachable!("run() only dispatches here for entity keywords"),
        };
        self.expect(blueprint, TokenKind::Colon)?;
        let name_tok = self.expect_identifier(blueprint)?;
        self.expect(blueprint, TokenKind::LBrace)?;

        let mut entity = Entity::new(name_tok.text, kind, blueprint.compiler.clone(), blueprint.linker.clone());
        if kind == EntityKind::Library {
            // The grammar has no syntax to select a library kind, and Shared
            // is not implemented by any adapter, so every declared library
            // is static.
            entity.lib_kind = crate::model::LibraryKind::Static;
        } else {
            entity.build_folder = blueprint.build_folder.clone();
        }

        loop {
            match self.lexer.peek().kind {
                TokenKind::RBrace => {
                    self.lexer.advance();
                    break;
                }
                TokenKind::Eof => {
                    let loc = self.lexer.peek().location;
                    self.error(&mut blueprint.diagnostics, loc, "Unexpected end of file inside entity block");
                    return None;
                }
                _ => self.parse_entity_field(blueprint, &mut entity)?,
            }
        }

        blueprint.entities.push(entity);
        Some(())
    }

    fn parse_entity_field(&mut self, blueprint: &mut Blueprint, entity: &mut Entity) -> Option<()> {
        let name_tok = self.expect_identifier(blueprint)?;
        let apply = if self.lexer.peek().kind == TokenKind::LParen {
            self.parse_predicate_list(blueprint)?
        } else {
            true
        };
        self.expect(blueprint, TokenKind::Colon)?;

        match name_tok.text.as_str() {
            "sources" => self.parse_sources_field(blueprint, entity, apply),
            "include" => self.parse_include_field(blueprint, entity, apply),
            "symbols" => self.parse_symbols_field(blueprint, entity, apply),
            "dependencies" => self.parse_dependencies_field(blueprint, entity, apply),
            "folder" => self.parse_folder_field(blueprint, entity, apply),
            "group" => self.parse_group_field(blueprint, entity, apply),
            other => {
                self.error(&mut blueprint.diagnostics, name_tok.location, format!("Unknown field '{other}'"));
                None
            }
        }
    }

    /// `'(' predicate_list ')'`. Returns whether the field this gates
    /// should be applied: true if the list is non-empty and at least one
    /// predicate matches the active build type or target platform.
    fn parse_predicate_list(&mut self, blueprint: &mut Blueprint) -> Option<bool> {
        self.expect(blueprint, TokenKind::LParen)?;
        let mut matched = false;
        let mut any = false;
        if self.lexer.peek().kind != TokenKind::RParen {
            loop {
                any = true;
                let tok = self.lexer.peek();
                match tok.kind {
                    TokenKind::Hash => {
                        self.lexer.advance();
                        let ident = self.expect_identifier(blueprint)?;
                        if ident.text == self.ctx.target_platform {
                            matched = true;
                        }
                    }
                    TokenKind::Identifier => {
                        self.lexer.advance();
                        if tok.text == self.ctx.build_type {
                            matched = true;
                        }
                    }
                    _ => {
                        self.error(&mut blueprint.diagnostics, tok.location, "Expected an identifier or '#identifier' in predicate list");
                        return None;
                    }
                }
                if self.lexer.peek().kind == TokenKind::Comma {
                    self.lexer.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(blueprint, TokenKind::RParen)?;
        Some(any && matched)
    }

    fn collect_strings(&mut self, blueprint: &mut Blueprint) -> Option<Vec<String>> {
        let mut values = Vec::new();
        loop {
            values.push(self.expect_string(blueprint)?);
            if self.lexer.peek().kind == TokenKind::Comma {
                self.lexer.advance();
                continue;
            }
            break;
        }
        self.expect(blueprint, TokenKind::Semicolon)?;
        Some(values)
    }

    /// `[ '/' subfolder_string ','? ]* source_string (',' …)*`. A subfolder
    /// set by `/ "sub"` applies to every following source string until a
    /// later `/` overrides it.
    fn parse_sources_field(&mut self, blueprint: &mut Blueprint, entity: &mut Entity, apply: bool) -> Option<()> {
        let mut subfolder = String::new();
        loop {
            if self.lexer.peek().kind == TokenKind::Slash {
                self.lexer.advance();
                subfolder = self.expect_string(blueprint)?;
                continue;
            }
            let name = self.expect_string(blueprint)?;
            if apply {
                append_unique(&mut entity.sources, combine_source_path(&self.bp_path, &subfolder, &name));
            }
            if self.lexer.peek().kind == TokenKind::Comma {
                self.lexer.advance();
                continue;
            }
            break;
        }
        self.expect(blueprint, TokenKind::Semicolon)?;
        Some(())
    }

    fn parse_include_field(&mut self, blueprint: &mut Blueprint, entity: &mut Entity, apply: bool) -> Option<()> {
        let values = self.collect_strings(blueprint)?;
        if apply {
            for value in values {
                append_unique(&mut entity.include_folders, combine_include_path(&self.bp_path, &value));
            }
        }
        Some(())
    }

    fn parse_symbols_field(&mut self, blueprint: &mut Blueprint, entity: &mut Entity, apply: bool) -> Option<()> {
        let values = self.collect_strings(blueprint)?;
        if apply {
            for value in values {
                append_unique(&mut entity.symbols, value);
            }
        }
        Some(())
    }

    /// Comma list of either `identifier ['.' identifier]` (a [`Dependency`])
    /// or a bare string (a direct linker input appended to `libraries`).
    fn parse_dependencies_field(&mut self, blueprint: &mut Blueprint, entity: &mut Entity, apply: bool) -> Option<()> {
        loop {
            let tok = self.lexer.peek();
            match tok.kind {
                TokenKind::String => {
                    self.lexer.advance();
                    if apply {
                        append_unique(&mut entity.libraries, tok.text);
                    }
                }
                TokenKind::Identifier => {
                    self.lexer.advance();
                    let first = tok.text;
                    if self.lexer.peek().kind == TokenKind::Dot {
                        self.lexer.advance();
                        let second = self.expect_identifier(blueprint)?;
                        if apply {
                            entity.dependencies.push(Dependency::qualified(first, second.text));
                        }
                    } else if apply {
                        entity.dependencies.push(Dependency::local(first));
                    }
                }
                _ => {
                    self.error(&mut blueprint.diagnostics, tok.location, "Expected a dependency name or a library string");
                    return None;
                }
            }
            if self.lexer.peek().kind == TokenKind::Comma {
                self.lexer.advance();
                continue;
            }
            break;
        }
        self.expect(blueprint, TokenKind::Semicolon)?;
        Some(())
    }

    fn parse_folder_field(&mut self, blueprint: &mut Blueprint, entity: &mut Entity, apply: bool) -> Option<()> {
        let value = self.expect_string(blueprint)?;
        if apply {
            entity.build_folder = value;
        }
        self.expect(blueprint, TokenKind::Semicolon)?;
        Some(())
    }

    /// Comma list of group tags, used by `--group` to select which
    /// executables a build run targets. Not named in the distilled field
    /// table but required by the group-matching behavior the resolver
    /// implements; parsed the same way as `symbols`.
    fn parse_group_field(&mut self, blueprint: &mut Blueprint, entity: &mut Entity, apply: bool) -> Option<()> {
        let values = self.collect_strings(blueprint)?;
        if apply {
            for value in values {
                append_unique(&mut entity.groups, value);
            }
        }
        Some(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::platform::fake::FakePlatform;

    fn ctx<'a>(platform: &'a FakePlatform, brickyard: &'a Brickyard, build_type: &str, target_platform: &str) -> ParseContext<'a> {
        ParseContext {
            platform,
            brickyard,
            build_type: build_type.to_string(),
            target_platform: target_platform.to_string(),
        }
    }

    #[test]
    fn parses_minimal_executable() {
        let platform = FakePlatform::new().with_file(
            "/proj/blueprint",
            r#"compiler: "msvc"; executable:hello{ sources:"hello.c"; }"#,
        );
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        assert_eq!(bp.status, BlueprintStatus::Ready);
        assert_eq!(bp.compiler, "msvc");
        let hello = bp.find_entity("hello").unwrap();
        assert_eq!(hello.sources, vec!["/proj/hello.c".to_string()]);
    }

    #[test]
    fn predicate_skips_field_when_no_match() {
        let platform = FakePlatform::new().with_file(
            "/proj/blueprint",
            r#"executable:app{ sources(release):"only_release.c"; sources:"base.c"; }"#,
        );
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "debug", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.sources, vec!["/proj/base.c".to_string()]);
    }

    #[test]
    fn dependencies_field_splits_identifiers_and_strings() {
        let platform = FakePlatform::new().with_file(
            "/proj/blueprint",
            r#"executable:app{ sources:"m.c"; dependencies: utils, mm.parser, "ws2_32.lib"; }"#,
        );
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        let app = bp.find_entity("app").unwrap();
        assert_eq!(
            app.dependencies,
            vec![Dependency::local("utils"), Dependency::qualified("mm", "parser")]
        );
        assert_eq!(app.libraries, vec!["ws2_32.lib".to_string()]);
    }

    #[test]
    fn group_field_collects_tags() {
        let platform = FakePlatform::new().with_file(
            "/proj/blueprint",
            r#"executable:app{ sources:"m.c"; group: "tools", "release"; }"#,
        );
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        let app = bp.find_entity("app").unwrap();
        assert_eq!(app.groups, vec!["tools".to_string(), "release".to_string()]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let platform = FakePlatform::new().with_file("/proj/blueprint", "");
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        assert_eq!(bp.status, BlueprintStatus::Error);
        assert!(bp.diagnostics.messages()[0].message.contains("file empty"));
    }

    #[test]
    fn missing_quote_reports_caret_at_opening_quote() {
        let platform = FakePlatform::new().with_file("/proj/blueprint", r#"compiler: "msvc"#);
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        assert_eq!(bp.status, BlueprintStatus::Error);
        let message = &bp.diagnostics.messages()[0].message;
        assert!(message.contains("Missing closing"));
        // The opening '"' is the 11th byte of `compiler: "msvc` -- the caret
        // line must land directly under it, not one column later at 'm'.
        assert!(message.contains(":1:11: Missing closing"), "message was: {message}");
        let caret_line = message.lines().last().unwrap();
        assert_eq!(caret_line, "          ^");
    }

    #[test]
    fn unknown_blueprint_field_is_an_error() {
        let platform = FakePlatform::new().with_file("/proj/blueprint", r#"bogus: "x";"#);
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        assert_eq!(bp.status, BlueprintStatus::Error);
    }

    #[test]
    fn import_resolves_via_local_probe() {
        let platform = FakePlatform::new()
            .with_cwd("/proj")
            .with_file("/proj/blueprint", "import foolib;")
            .with_file("/proj/foolib/blueprint", r#"compiler: "msvc";"#);
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        assert_eq!(bp.status, BlueprintStatus::Ready);
        let imported = bp.find_import("foolib").unwrap();
        assert_eq!(imported.compiler, "msvc");
    }

    #[test]
    fn import_resolves_via_brickyard_when_local_missing() {
        let platform = FakePlatform::new()
            .with_cwd("/proj")
            .with_file("/proj/blueprint", "import foolib;")
            .with_file("/other/foolib/blueprint", r#"compiler: "msvc";"#);
        let mut brickyard = Brickyard::new();
        brickyard.add("foolib", "", "/other/foolib");
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        assert_eq!(bp.status, BlueprintStatus::Ready);
        assert!(bp.find_import("foolib").is_some());
    }

    #[test]
    fn import_alias_renames_child_blueprint() {
        let platform = FakePlatform::new()
            .with_cwd("/proj")
            .with_file("/proj/blueprint", "import mymod as mm;")
            .with_file("/proj/mymod/blueprint", r#"compiler: "msvc";"#);
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        assert!(bp.find_import("mm").is_some());
        assert!(bp.find_import("mymod").is_none());
    }

    #[test]
    fn unresolved_import_is_an_error() {
        let platform = FakePlatform::new().with_cwd("/proj").with_file("/proj/blueprint", "import nope;");
        let brickyard = Brickyard::new();
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        assert_eq!(bp.status, BlueprintStatus::Error);
    }

    #[test]
    fn self_import_via_brickyard_is_a_cycle() {
        let platform = FakePlatform::new().with_cwd("/proj").with_file("/proj/blueprint", "import loop;");
        let mut brickyard = Brickyard::new();
        brickyard.add("loop", "", "/proj");
        let c = ctx(&platform, &brickyard, "release", "win32");

        let bp = parse_blueprint_file(&c, Path::new("/proj/blueprint"));
        let imported = bp.find_import("loop").unwrap();
        assert_eq!(imported.status, BlueprintStatus::Error);
    }
}
