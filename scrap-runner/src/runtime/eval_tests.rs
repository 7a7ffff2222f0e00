//! Unit tests for the snippet runtime.
//!
//! Snippets are compiled through the real pipeline, then individual
//! classes are instantiated and invoked directly.

use crate::runtime::{Interpreter, Value};
use scrap_compiler::image::{decode_module, Program};
use scrap_compiler::options::CompileOptions;

fn program_for(source: &str) -> Program {
    let compiled = scrap_compiler::compile(source, &CompileOptions::default()).unwrap();
    decode_module(compiled.image()).unwrap()
}

fn invoke_routine(source: &str, routine: &str, args: Vec<Value>) -> (Result<Value, String>, String) {
    let program = program_for(source);
    let class = &program.classes[0];
    let mut out = Vec::new();
    let result = {
        let mut interp = Interpreter::new(&mut out);
        match interp.instantiate(class) {
            Ok(mut instance) => {
                let routine = class.find_routine(routine).unwrap();
                interp
                    .invoke(class, routine, &mut instance, args)
                    .map_err(|e| e.message)
            }
            Err(e) => Err(e.message),
        }
    };
    (result, String::from_utf8(out).unwrap())
}

// ============================================================================
// Instantiation
// ============================================================================

#[test]
fn test_field_defaults_and_initializers() {
    let source = r#"
        public class C {
            int a;
            int b = 41;
            string s;
            public int Sum() { return a + b + 1; }
        }
    "#;
    let (result, _) = invoke_routine(source, "Sum", vec![]);
    assert_eq!(result.unwrap(), Value::Int(42));
}

#[test]
fn test_zero_param_ctor_runs() {
    let source = r#"
        public class C {
            int n = 1;
            public C() { n = n + 10; }
            public int Get() { return n; }
        }
    "#;
    let (result, _) = invoke_routine(source, "Get", vec![]);
    assert_eq!(result.unwrap(), Value::Int(11));
}

#[test]
fn test_only_parameterized_ctor_fails_instantiation() {
    let source = r#"
        public class C {
            int n = 0;
            public C(int start) { n = start; }
            public int Get() { return n; }
        }
    "#;
    let (result, _) = invoke_routine(source, "Get", vec![]);
    let err = result.unwrap_err();
    assert!(err.contains("zero-parameter constructor"), "got: {}", err);
}

// ============================================================================
// Statements and control flow
// ============================================================================

#[test]
fn test_while_loop_and_assignment() {
    let source = r#"
        public class C {
            public int Count() {
                var n = 0;
                while (n < 5) { n = n + 1; }
                return n;
            }
        }
    "#;
    let (result, _) = invoke_routine(source, "Count", vec![]);
    assert_eq!(result.unwrap(), Value::Int(5));
}

#[test]
fn test_return_inside_branch_unwinds() {
    let source = r#"
        public class C {
            public int Pick(int x) {
                if (x > 0) { return 1; } else if (x < 0) { return -1; }
                return 0;
            }
        }
    "#;
    let (pos, _) = invoke_routine(source, "Pick", vec![Value::Int(7)]);
    assert_eq!(pos.unwrap(), Value::Int(1));
    let (neg, _) = invoke_routine(source, "Pick", vec![Value::Int(-7)]);
    assert_eq!(neg.unwrap(), Value::Int(-1));
    let (zero, _) = invoke_routine(source, "Pick", vec![Value::Int(0)]);
    assert_eq!(zero.unwrap(), Value::Int(0));
}

#[test]
fn test_void_routine_yields_unit() {
    let source = r#"
        public class C {
            public void Noop() { var x = 1; print(str(x)); }
        }
    "#;
    let (result, out) = invoke_routine(source, "Noop", vec![]);
    assert_eq!(result.unwrap(), Value::Unit);
    assert_eq!(out, "1\n");
}

#[test]
fn test_sibling_routine_call() {
    let source = r#"
        public class C {
            public int Twice(int x) { return x * 2; }
            public int Quad(int x) { return Twice(Twice(x)); }
        }
    "#;
    let (result, _) = invoke_routine(source, "Quad", vec![Value::Int(3)]);
    assert_eq!(result.unwrap(), Value::Int(12));
}

#[test]
fn test_invocation_arity_mismatch() {
    let source = r#"
        public class C {
            public int Id(int x) { return x; }
        }
    "#;
    let (result, _) = invoke_routine(source, "Id", vec![]);
    let err = result.unwrap_err();
    assert!(err.contains("expects 1 argument"), "got: {}", err);
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_string_concat_mixes_types() {
    let source = r#"
        public class C {
            public string Fmt(int n) { return "n=" + n + "!"; }
        }
    "#;
    let (result, _) = invoke_routine(source, "Fmt", vec![Value::Int(9)]);
    assert_eq!(result.unwrap(), Value::Str("n=9!".to_string()));
}

#[test]
fn test_list_indexing() {
    let source = r#"
        public class C {
            public string First(string[] xs) { return xs[0]; }
        }
    "#;
    let args = vec![Value::StrList(vec![" Param ".to_string()])];
    let (result, _) = invoke_routine(source, "First", args);
    assert_eq!(result.unwrap(), Value::Str(" Param ".to_string()));

    let (oob, _) = invoke_routine(source, "First", vec![Value::StrList(vec![])]);
    let err = oob.unwrap_err();
    assert!(err.contains("out of bounds"), "got: {}", err);
}

#[test]
fn test_division_by_zero() {
    let source = r#"
        public class C {
            public int Div(int a, int b) { return a / b; }
        }
    "#;
    let (result, _) = invoke_routine(source, "Div", vec![Value::Int(1), Value::Int(0)]);
    assert_eq!(result.unwrap_err(), "division by zero");
}

#[test]
fn test_short_circuit_skips_rhs() {
    // The rhs would divide by zero if evaluated.
    let source = r#"
        public class C {
            public bool Safe(int n) { return n == 0 || 10 / n > 1; }
        }
    "#;
    let (result, _) = invoke_routine(source, "Safe", vec![Value::Int(0)]);
    assert_eq!(result.unwrap(), Value::Bool(true));
}

#[test]
fn test_comparison_and_logic() {
    let source = r#"
        public class C {
            public bool InRange(int n) { return n >= 1 && n <= 10 && !(n == 5); }
        }
    "#;
    let (yes, _) = invoke_routine(source, "InRange", vec![Value::Int(3)]);
    assert_eq!(yes.unwrap(), Value::Bool(true));
    let (no, _) = invoke_routine(source, "InRange", vec![Value::Int(5)]);
    assert_eq!(no.unwrap(), Value::Bool(false));
}

// ============================================================================
// Builtins
// ============================================================================

#[test]
fn test_len_str_parse_join() {
    let source = r#"
        public class C {
            public void Go(string[] xs) {
                print(str(len(xs)));
                print(str(len("abc")));
                print(str(parseInt(" 42 ") + 1));
                print(join(xs, "|"));
            }
        }
    "#;
    let args = vec![Value::StrList(vec!["a".to_string(), "b".to_string()])];
    let (result, out) = invoke_routine(source, "Go", args);
    result.unwrap();
    assert_eq!(out, "2\n3\n43\na|b\n");
}

#[test]
fn test_parse_int_failure_is_an_exec_error() {
    let source = r#"
        public class C {
            public int Bad() { return parseInt("not a number"); }
        }
    "#;
    let (result, _) = invoke_routine(source, "Bad", vec![]);
    let err = result.unwrap_err();
    assert!(err.contains("cannot parse"), "got: {}", err);
}
