// Compile options recognized by the snippet compiler.

use regex::Regex;
use std::collections::BTreeSet;

/// The only emission mode the compiler supports: an in-memory library
/// image with no executable wrapper of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Library,
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub allow_unsafe_constructs: bool,
    pub implicit_imports: BTreeSet<String>,
    pub output_kind: OutputKind,
}

impl Default for CompileOptions {
    fn default() -> Self {
        let mut implicit_imports = BTreeSet::new();
        implicit_imports.insert("System".to_string());
        implicit_imports.insert("System.Linq".to_string());
        CompileOptions {
            allow_unsafe_constructs: true,
            implicit_imports,
            output_kind: OutputKind::Library,
        }
    }
}

// Namespace names are dotted identifier paths: "System", "System.IO".
pub fn is_valid_namespace(name: &str) -> bool {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
    re.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_imports_open_system() {
        let opts = CompileOptions::default();
        assert!(opts.implicit_imports.contains("System"));
        assert!(opts.implicit_imports.contains("System.Linq"));
        assert!(opts.allow_unsafe_constructs);
    }

    #[test]
    fn test_namespace_syntax() {
        assert!(is_valid_namespace("System"));
        assert!(is_valid_namespace("System.IO"));
        assert!(is_valid_namespace("a_1.b_2"));
        assert!(!is_valid_namespace(""));
        assert!(!is_valid_namespace("System."));
        assert!(!is_valid_namespace(".System"));
        assert!(!is_valid_namespace("Sys tem"));
        assert!(!is_valid_namespace("1System"));
    }
}
