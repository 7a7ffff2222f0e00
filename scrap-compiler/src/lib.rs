// Library interface for the Scrap snippet compiler.
//
// The compile pipeline is parse -> check -> lower -> encode. The caller
// receives either a loadable module image plus warning diagnostics, or a
// non-empty diagnostic list containing at least one error.

pub mod checker;
pub mod diagnostics;
pub mod image;
pub mod lower;
pub mod options;
pub mod parser;
pub mod registry;
pub mod trace;

use diagnostics::{has_errors, Diagnostic};
use options::CompileOptions;
use registry::BuiltinRegistry;
use trace::trace;

/// A successfully compiled snippet: the module image plus any
/// warning-severity diagnostics. Zero error-severity diagnostics is what
/// makes the image loadable; the two never coexist.
#[derive(Debug)]
pub struct CompiledModule {
    image: Vec<u8>,
    warnings: Vec<Diagnostic>,
}

impl CompiledModule {
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}

pub fn compile(source: &str, options: &CompileOptions) -> Result<CompiledModule, Vec<Diagnostic>> {
    compile_with_file(source, "<snippet>", options)
}

pub fn compile_with_file(
    source: &str,
    file: &str,
    options: &CompileOptions,
) -> Result<CompiledModule, Vec<Diagnostic>> {
    trace("scrap-compiler: parsing");
    let module = match parser::parse_module_with_file(source, file) {
        Ok(m) => m,
        Err(e) => return Err(vec![Diagnostic::error("E_PARSE", e.to_string())]),
    };

    trace("scrap-compiler: checking");
    let registry = BuiltinRegistry::standard();
    let diags = checker::check(&module, &registry, options);
    if has_errors(&diags) {
        return Err(diags);
    }

    trace("scrap-compiler: lowering and encoding");
    let program = lower::lower_module(&module, options);
    let image = image::encode_module(&program);

    Ok(CompiledModule {
        image,
        warnings: diags,
    })
}
