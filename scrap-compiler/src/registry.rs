// Builtin routine registry.
//
// This is the snippet compiler's rendition of reference selection: the
// fixed table of library routines a snippet may call, grouped by the
// namespace that must be opened for the call to resolve.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy)]
pub struct BuiltinDef {
    pub name: &'static str,
    pub namespace: &'static str,
    pub arity: usize,
}

#[derive(Debug, Clone)]
pub struct BuiltinRegistry {
    entries: Vec<BuiltinDef>,
}

impl BuiltinRegistry {
    /// The standard builtin set. Builtin names are unique across
    /// namespaces, so lookup is by bare name.
    pub fn standard() -> Self {
        BuiltinRegistry {
            entries: vec![
                BuiltinDef { name: "print", namespace: "System", arity: 1 },
                BuiltinDef { name: "len", namespace: "System", arity: 1 },
                BuiltinDef { name: "str", namespace: "System", arity: 1 },
                BuiltinDef { name: "parseInt", namespace: "System", arity: 1 },
                BuiltinDef { name: "join", namespace: "System.Linq", arity: 2 },
                BuiltinDef { name: "readFile", namespace: "System.IO", arity: 1 },
                BuiltinDef { name: "writeFile", namespace: "System.IO", arity: 2 },
            ],
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&BuiltinDef> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// A builtin is callable only when its namespace has been opened,
    /// either by an implicit import or a `using` directive.
    pub fn resolve(&self, name: &str, opened: &BTreeSet<String>) -> Resolution {
        match self.lookup(name) {
            None => Resolution::Unknown,
            Some(def) if opened.contains(def.namespace) => Resolution::Callable(*def),
            Some(def) => Resolution::NotImported(*def),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Resolution {
    Callable(BuiltinDef),
    NotImported(BuiltinDef),
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup_finds_standard_entries() {
        let reg = BuiltinRegistry::standard();
        assert_eq!(reg.lookup("print").unwrap().arity, 1);
        assert_eq!(reg.lookup("writeFile").unwrap().namespace, "System.IO");
        assert!(reg.lookup("launchMissiles").is_none());
    }

    #[test]
    fn test_resolution_respects_opened_namespaces() {
        let reg = BuiltinRegistry::standard();
        match reg.resolve("print", &opened(&["System"])) {
            Resolution::Callable(def) => assert_eq!(def.name, "print"),
            other => panic!("expected Callable, got {:?}", other),
        }
        match reg.resolve("readFile", &opened(&["System"])) {
            Resolution::NotImported(def) => assert_eq!(def.namespace, "System.IO"),
            other => panic!("expected NotImported, got {:?}", other),
        }
        match reg.resolve("nope", &opened(&["System"])) {
            Resolution::Unknown => {}
            other => panic!("expected Unknown, got {:?}", other),
        }
    }
}
