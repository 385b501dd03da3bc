/*!
A build orchestrator for native software.

Given a declarative project description (a "blueprint") that names source
files, include paths, preprocessor symbols, library dependencies, and
cross-blueprint imports, this crate resolves the dependency graph, composes
per-target compiler/linker invocations, executes them, parses toolchain
diagnostics, and reports a coherent build result. A user-scoped registry
(the "brickyard") maps logical blueprint names to filesystem locations so
projects can depend on each other without hard-coded paths.

The core never touches `std::fs` or `std::process` directly; every effect
crosses the [`platform::Platform`] trait, so the parser, resolver, and
compiler adapters can all be driven against an in-memory fixture in tests
without a real toolchain installed.
*/

pub mod brickyard;
pub mod compiler;
pub mod diagnostics;
pub mod driver;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod paths;
pub mod platform;
pub mod resolver;
pub mod target;
