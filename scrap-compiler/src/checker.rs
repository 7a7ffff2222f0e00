// Semantic validation producing the full diagnostic list in one pass.
//
// Invariants checked:
// C1: every name referenced in a body is a local, parameter, or field
// C2: every call resolves to a sibling method or an opened builtin, with
//     matching arity
// C3: declared types are drawn from the value-type set (plus void returns)

use crate::diagnostics::Diagnostic;
use crate::options::{is_valid_namespace, CompileOptions};
use crate::parser::{ClassDecl, Expr, Module, Param, Stmt};
use crate::registry::{BuiltinRegistry, Resolution};
use std::collections::{BTreeSet, HashMap};

const VALUE_TYPES: [&str; 4] = ["int", "bool", "string", "string[]"];

pub fn check(
    module: &Module,
    registry: &BuiltinRegistry,
    options: &CompileOptions,
) -> Vec<Diagnostic> {
    let mut checker = Checker {
        registry,
        opened: BTreeSet::new(),
        allow_unsafe: options.allow_unsafe_constructs,
        diags: Vec::new(),
    };
    checker.check_module(module, options);
    checker.diags
}

struct Checker<'a> {
    registry: &'a BuiltinRegistry,
    opened: BTreeSet<String>,
    allow_unsafe: bool,
    diags: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn check_module(&mut self, module: &Module, options: &CompileOptions) {
        for import in &options.implicit_imports {
            if is_valid_namespace(import) {
                self.opened.insert(import.clone());
            } else {
                self.diags.push(Diagnostic::error(
                    "E_BAD_USING",
                    format!("configured implicit import `{}` is not a valid namespace", import),
                ));
            }
        }

        // Parsed using directives are always well-formed dotted paths;
        // only configured imports arrive as arbitrary strings.
        for using in &module.usings {
            self.opened.insert(using.name.clone());
        }

        let mut seen_classes: HashMap<String, usize> = HashMap::new();
        for class in &module.classes {
            let qualified = class.qualified_name();
            if let Some(first_line) = seen_classes.get(&qualified) {
                self.diags.push(Diagnostic::error(
                    "E_DUP_CLASS",
                    format!(
                        "class `{}` is declared twice (lines {} and {})",
                        qualified, first_line, class.line
                    ),
                ));
            } else {
                seen_classes.insert(qualified, class.line);
            }
        }

        for class in &module.classes {
            self.check_class(class);
        }
    }

    fn check_class(&mut self, class: &ClassDecl) {
        if class.fields.is_empty() && class.ctors.is_empty() && class.methods.is_empty() {
            self.diags.push(Diagnostic::warning(
                "W_EMPTY_CLASS",
                format!("class `{}` has no members (line {})", class.qualified_name(), class.line),
            ));
        }

        let mut seen_methods: HashMap<&str, usize> = HashMap::new();
        for method in &class.methods {
            if let Some(first_line) = seen_methods.get(method.name.as_str()) {
                self.diags.push(Diagnostic::error(
                    "E_DUP_METHOD",
                    format!(
                        "method `{}` is declared twice in class `{}` (lines {} and {})",
                        method.name,
                        class.qualified_name(),
                        first_line,
                        method.line
                    ),
                ));
            } else {
                seen_methods.insert(&method.name, method.line);
            }
        }

        for field in &class.fields {
            self.check_value_type(&field.ty, field.line);
            if let Some(init) = &field.init {
                // Initializers see sibling fields (defaults are in place
                // before any initializer runs) and builtins, but no locals.
                let mut scope = ScopeStack::new();
                scope.push();
                self.check_expr(class, &mut scope, init);
                scope.pop();
            }
        }

        for ctor in &class.ctors {
            for param in &ctor.params {
                self.check_value_type(&param.ty, ctor.line);
            }
            self.check_routine(class, &ctor.params, &ctor.body);
        }

        for method in &class.methods {
            for param in &method.params {
                self.check_value_type(&param.ty, method.line);
            }
            if method.ret != "void" {
                self.check_value_type(&method.ret, method.line);
            }
            self.check_routine(class, &method.params, &method.body);
        }
    }

    fn check_value_type(&mut self, ty: &str, line: usize) {
        if !VALUE_TYPES.contains(&ty) {
            self.diags.push(Diagnostic::error(
                "E_UNKNOWN_TYPE",
                format!("unknown type `{}` (line {})", ty, line),
            ));
        }
    }

    fn check_routine(&mut self, class: &ClassDecl, params: &[Param], body: &[Stmt]) {
        let mut scope = ScopeStack::new();
        scope.push();
        for param in params {
            scope.declare(&param.name, 0, true);
        }
        self.check_block(class, &mut scope, body);
        scope.pop();
    }

    fn check_block(&mut self, class: &ClassDecl, scope: &mut ScopeStack, stmts: &[Stmt]) {
        scope.push();
        for stmt in stmts {
            self.check_stmt(class, scope, stmt);
        }
        let frame = scope.pop();
        for (name, info) in frame {
            if !info.is_param && !info.used {
                self.diags.push(Diagnostic::warning(
                    "W_UNUSED_LOCAL",
                    format!("local `{}` is never used (line {})", name, info.line),
                ));
            }
        }
    }

    fn check_stmt(&mut self, class: &ClassDecl, scope: &mut ScopeStack, stmt: &Stmt) {
        match stmt {
            Stmt::Local(name, ty, init, line) => {
                self.check_expr(class, scope, init);
                if let Some(ty) = ty {
                    self.check_value_type(ty, *line);
                }
                scope.declare(name, *line, false);
            }
            Stmt::Assign(name, value, line) => {
                self.check_expr(class, scope, value);
                // Writes count as uses for the unused-local warning.
                if !scope.mark_used(name) && !field_exists(class, name) {
                    self.diags.push(Diagnostic::error(
                        "E_UNBOUND_VAR",
                        format!("unknown name `{}` (line {})", name, line),
                    ));
                }
            }
            Stmt::Expr(expr) => self.check_expr(class, scope, expr),
            Stmt::Return(value, _) => {
                if let Some(expr) = value {
                    self.check_expr(class, scope, expr);
                }
            }
            Stmt::If(cond, then_body, else_body) => {
                self.check_expr(class, scope, cond);
                self.check_block(class, scope, then_body);
                self.check_block(class, scope, else_body);
            }
            Stmt::While(cond, body) => {
                self.check_expr(class, scope, cond);
                self.check_block(class, scope, body);
            }
            Stmt::Unsafe(body, line) => {
                if !self.allow_unsafe {
                    self.diags.push(Diagnostic::error(
                        "E_UNSAFE_DISABLED",
                        format!("unsafe blocks are not allowed by the current options (line {})", line),
                    ));
                }
                self.check_block(class, scope, body);
            }
        }
    }

    fn check_expr(&mut self, class: &ClassDecl, scope: &mut ScopeStack, expr: &Expr) {
        match expr {
            Expr::Int(_) | Expr::Bool(_) | Expr::Str(_) => {}
            Expr::Ident(name, line) => {
                if !scope.mark_used(name) && !field_exists(class, name) {
                    self.diags.push(Diagnostic::error(
                        "E_UNBOUND_VAR",
                        format!("unknown name `{}` (line {})", name, line),
                    ));
                }
            }
            Expr::Index(target, index) => {
                self.check_expr(class, scope, target);
                self.check_expr(class, scope, index);
            }
            Expr::Call(name, args, line) => {
                for arg in args {
                    self.check_expr(class, scope, arg);
                }
                self.check_call(class, name, args.len(), *line);
            }
            Expr::Unary(_, inner) => self.check_expr(class, scope, inner),
            Expr::Binary(_, lhs, rhs) => {
                self.check_expr(class, scope, lhs);
                self.check_expr(class, scope, rhs);
            }
        }
    }

    // C2: sibling methods shadow builtins of the same name.
    fn check_call(&mut self, class: &ClassDecl, name: &str, arity: usize, line: usize) {
        if let Some(method) = class.methods.iter().find(|m| m.name == name) {
            if method.params.len() != arity {
                self.diags.push(Diagnostic::error(
                    "E_CALL_ARITY",
                    format!(
                        "method `{}` takes {} argument(s) but {} were supplied (line {})",
                        name,
                        method.params.len(),
                        arity,
                        line
                    ),
                ));
            }
            return;
        }

        match self.registry.resolve(name, &self.opened) {
            Resolution::Callable(def) => {
                if def.arity != arity {
                    self.diags.push(Diagnostic::error(
                        "E_CALL_ARITY",
                        format!(
                            "builtin `{}` takes {} argument(s) but {} were supplied (line {})",
                            name, def.arity, arity, line
                        ),
                    ));
                }
            }
            Resolution::NotImported(def) => {
                self.diags.push(Diagnostic::error(
                    "E_NAMESPACE_NOT_IMPORTED",
                    format!(
                        "call to `{}` requires `using {};` (line {})",
                        name, def.namespace, line
                    ),
                ));
            }
            Resolution::Unknown => {
                self.diags.push(Diagnostic::error(
                    "E_UNKNOWN_CALL",
                    format!("no method or builtin named `{}` (line {})", name, line),
                ));
            }
        }
    }
}

fn field_exists(class: &ClassDecl, name: &str) -> bool {
    class.fields.iter().any(|f| f.name == name)
}

// ---------------------------------------------------------------------------
// Lexical scope bookkeeping
// ---------------------------------------------------------------------------

struct LocalInfo {
    used: bool,
    line: usize,
    is_param: bool,
}

struct ScopeStack {
    frames: Vec<HashMap<String, LocalInfo>>,
}

impl ScopeStack {
    fn new() -> Self {
        ScopeStack { frames: Vec::new() }
    }

    fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    fn pop(&mut self) -> HashMap<String, LocalInfo> {
        self.frames.pop().unwrap_or_default()
    }

    fn declare(&mut self, name: &str, line: usize, is_param: bool) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(
                name.to_string(),
                LocalInfo {
                    used: false,
                    line,
                    is_param,
                },
            );
        }
    }

    fn mark_used(&mut self, name: &str) -> bool {
        for frame in self.frames.iter_mut().rev() {
            if let Some(info) = frame.get_mut(name) {
                info.used = true;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    fn check_source(source: &str) -> Vec<Diagnostic> {
        let module = parse_module(source).unwrap();
        check(&module, &BuiltinRegistry::standard(), &CompileOptions::default())
    }

    fn codes(diags: &[Diagnostic]) -> Vec<&'static str> {
        diags.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_clean_snippet_has_no_diagnostics() {
        let diags = check_source(
            r#"public class W { public static void Main(string[] m) { print("hi " + m[0]); } }"#,
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    #[test]
    fn test_unbound_name() {
        let diags = check_source(
            r#"public class W { public void Go() { print(missing); } }"#,
        );
        assert_eq!(codes(&diags), vec!["E_UNBOUND_VAR"]);
    }

    #[test]
    fn test_unknown_call_and_arity() {
        let diags = check_source(
            r#"public class W { public void Go() { nope(1); print("a", "b"); } }"#,
        );
        assert_eq!(codes(&diags), vec!["E_UNKNOWN_CALL", "E_CALL_ARITY"]);
    }

    #[test]
    fn test_sibling_method_call_resolves_and_checks_arity() {
        let diags = check_source(
            r#"
            public class W {
                public int Twice(int x) { return x * 2; }
                public void Go() { print(str(Twice(3))); Twice(1, 2); }
            }
            "#,
        );
        assert_eq!(codes(&diags), vec!["E_CALL_ARITY"]);
    }

    #[test]
    fn test_builtin_namespace_gating() {
        let gated = check_source(
            r#"public class W { public void Go() { print(readFile("x.txt")); } }"#,
        );
        assert_eq!(codes(&gated), vec!["E_NAMESPACE_NOT_IMPORTED"]);

        let opened = check_source(
            r#"
            using System.IO;
            public class W { public void Go() { print(readFile("x.txt")); } }
            "#,
        );
        assert!(opened.is_empty(), "unexpected diagnostics: {:?}", opened);
    }

    #[test]
    fn test_unsafe_gated_by_options() {
        let source = r#"public class W { public void Go() { unsafe { print("x"); } } }"#;
        let module = parse_module(source).unwrap();

        let mut options = CompileOptions::default();
        let allowed = check(&module, &BuiltinRegistry::standard(), &options);
        assert!(allowed.is_empty());

        options.allow_unsafe_constructs = false;
        let denied = check(&module, &BuiltinRegistry::standard(), &options);
        assert_eq!(codes(&denied), vec!["E_UNSAFE_DISABLED"]);
    }

    #[test]
    fn test_duplicate_class_and_method() {
        let diags = check_source(
            r#"
            public class W { public void Go() { print("a"); } public void Go() { print("b"); } }
            public class W { }
            "#,
        );
        assert!(codes(&diags).contains(&"E_DUP_CLASS"));
        assert!(codes(&diags).contains(&"E_DUP_METHOD"));
    }

    #[test]
    fn test_unknown_type() {
        let diags = check_source(
            r#"public class W { public void Go(Widget w) { print("x"); } }"#,
        );
        assert_eq!(codes(&diags), vec!["E_UNKNOWN_TYPE"]);
    }

    #[test]
    fn test_warnings_for_empty_class_and_unused_local() {
        let diags = check_source(
            r#"
            public class Empty { }
            public class W {
                public void Go() { var unused = 1; print("x"); }
            }
            "#,
        );
        let codes = codes(&diags);
        assert!(codes.contains(&"W_EMPTY_CLASS"));
        assert!(codes.contains(&"W_UNUSED_LOCAL"));
        assert!(!crate::diagnostics::has_errors(&diags));
    }

    #[test]
    fn test_bad_configured_import() {
        let source = r#"public class W { public void Go() { print("x"); } }"#;
        let module = parse_module(source).unwrap();
        let mut options = CompileOptions::default();
        options.implicit_imports.insert("Not A Namespace".to_string());
        let diags = check(&module, &BuiltinRegistry::standard(), &options);
        assert_eq!(codes(&diags), vec!["E_BAD_USING"]);
    }

    #[test]
    fn test_field_initializer_sees_siblings_and_builtins() {
        let diags = check_source(
            r#"
            public class W {
                int a = 1;
                int b = a + len("xy");
                public void Go() { print(str(b)); }
            }
            "#,
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }
}
