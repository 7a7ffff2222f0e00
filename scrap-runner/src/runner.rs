// The snippet runner: compile -> load -> resolve -> execute.
//
// Every run is independent: the compiler, loader, and interpreter are
// all constructed here and dropped before this function returns, on
// success and failure paths alike.

use crate::entry::{self, Entry, ResolveError};
use crate::loader::LoadedModule;
use scrap_compiler::diagnostics::{render_all, Diagnostic};
use scrap_compiler::options::CompileOptions;
use scrap_compiler::trace::trace;
use std::io::Write;

/// The fixed dummy argument the entry point receives.
pub const ENTRY_ARG: &str = " Param ";

#[derive(Debug)]
pub enum RunError {
    MissingInput,
    CompilationFailed(Vec<Diagnostic>),
    EntryPointNotFound,
    AmbiguousEntryPoint(Vec<String>),
    ExecutionFailed(String),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::MissingInput => write!(f, "no snippet source supplied"),
            RunError::CompilationFailed(diags) => {
                write!(f, "compilation failed:\n{}", render_all(diags))
            }
            RunError::EntryPointNotFound => {
                write!(f, "no routine named `{}` was found", entry::ENTRY_ROUTINE)
            }
            RunError::AmbiguousEntryPoint(candidates) => write!(
                f,
                "multiple routines named `{}`: {}",
                entry::ENTRY_ROUTINE,
                candidates.join(", ")
            ),
            RunError::ExecutionFailed(message) => {
                write!(f, "snippet execution failed: {}", message)
            }
        }
    }
}

pub fn run<W: Write>(source: &str, options: &CompileOptions, out: &mut W) -> Result<(), RunError> {
    run_with_file(source, "<snippet>", options, out)
}

pub fn run_with_file<W: Write>(
    source: &str,
    file: &str,
    options: &CompileOptions,
    out: &mut W,
) -> Result<(), RunError> {
    if source.trim().is_empty() {
        return Err(RunError::MissingInput);
    }

    let compiled = scrap_compiler::compile_with_file(source, file, options)
        .map_err(RunError::CompilationFailed)?;
    for warning in compiled.warnings() {
        eprintln!("{}", warning);
    }

    let module =
        LoadedModule::from_image(compiled.image()).map_err(RunError::ExecutionFailed)?;

    trace("scrap-runner: resolving entry point");
    let resolved = entry::resolve(module.program()).map_err(|e| match e {
        ResolveError::NotFound => RunError::EntryPointNotFound,
        ResolveError::Ambiguous(candidates) => RunError::AmbiguousEntryPoint(candidates),
    })?;

    trace(&format!("scrap-runner: executing {}", resolved.describe()));
    let mut bound = entry::bind(resolved, out);
    bound
        .invoke(&[ENTRY_ARG.to_string()])
        .map_err(|e| RunError::ExecutionFailed(e.message))?;

    Ok(())
}

pub fn read_snippet_file(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e))
}
