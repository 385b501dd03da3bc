//! The compiler adapter interface: a named strategy that turns a
//! `(blueprint, entity)` pair into command lines, and classifies a
//! toolchain's combined output into diagnostics. Only MSVC is implemented;
//! `lookup` is the seam a future adapter (clang, gcc) would register
//! itself through.

pub mod error;
pub mod msvc;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::model::{Blueprint, Entity, EntityStatus};

pub use error::{Error, Result};

/// Never executes anything itself -- the resolver drives execution through
/// the `Platform` collaborator and hands the captured output back here for
/// classification.
pub trait CompilerAdapter {
    fn name(&self) -> &str;

    /// Compute `entity.build_commands`. On failure (no sources, an
    /// unimplemented library kind, ...) nothing is appended; the caller is
    /// expected to record the error on the entity and stop.
    fn generate_commands(&self, blueprint: &Blueprint, entity: &mut Entity) -> Result<()>;

    /// Split `output` into lines (CR, LF, and CRLF all accepted) and append
    /// a diagnostic for each recognized pattern. Any `Error` diagnostic
    /// flips `entity.status` to `Error`; classification of the remaining
    /// lines still continues.
    fn process_diagnostics(&self, entity: &mut Entity, output: &str) {
        for line in split_lines(output) {
            let kind = if line.contains(": error ") || line.contains(": fatal error ") || line.contains(" Command line error ") {
                Some(DiagnosticKind::Error)
            } else if line.contains(": warning") {
                Some(DiagnosticKind::Warning)
            } else if line.contains(": note: ") {
                Some(DiagnosticKind::Note)
            } else {
                None
            };

            if let Some(kind) = kind {
                if kind == DiagnosticKind::Error {
                    entity.status = EntityStatus::Error;
                }
                entity.diagnostics.push(Diagnostic::new(kind, line.to_string()));
            }
        }
    }
}

fn split_lines(output: &str) -> impl Iterator<Item = &str> {
    output.split(['\n', '\r']).filter(|line| !line.is_empty())
}

/// Look up a compiler adapter by the name an entity or blueprint declares.
pub fn lookup(name: &str) -> Option<&'static dyn CompilerAdapter> {
    static MSVC: msvc::MsvcAdapter = msvc::MsvcAdapter;
    match name {
        "msvc" => Some(&MSVC),
        _ => None,
    }
}
