// Builtin routine implementations.
//
// Arity is validated at compile time; the checks here guard against a
// hand-built image. Host-access builtins (readFile/writeFile) run with
// the full privileges of the process.

use super::value::{expect_str, ExecError, Value};
use std::io::Write;

pub fn dispatch<W: Write>(name: &str, args: Vec<Value>, out: &mut W) -> Result<Value, ExecError> {
    match name {
        "print" => {
            let value = one_arg(name, args)?;
            writeln!(out, "{}", value.display())
                .map_err(|e| ExecError::new(format!("print failed: {}", e)))?;
            out.flush()
                .map_err(|e| ExecError::new(format!("print failed: {}", e)))?;
            Ok(Value::Unit)
        }
        "len" => {
            let value = one_arg(name, args)?;
            match value {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::StrList(items) => Ok(Value::Int(items.len() as i64)),
                other => Err(ExecError::new(format!(
                    "len expects a string or string[], got {}",
                    other.type_name()
                ))),
            }
        }
        "str" => {
            let value = one_arg(name, args)?;
            match value {
                Value::Int(_) | Value::Bool(_) | Value::Str(_) => Ok(Value::Str(value.display())),
                other => Err(ExecError::new(format!(
                    "str cannot format {}",
                    other.type_name()
                ))),
            }
        }
        "parseInt" => {
            let text = expect_str(one_arg(name, args)?, "parseInt argument")?;
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ExecError::new(format!("cannot parse {:?} as int", text)))
        }
        "join" => {
            let (list, sep) = two_args(name, args)?;
            let items = match list {
                Value::StrList(items) => items,
                other => {
                    return Err(ExecError::new(format!(
                        "join expects a string[], got {}",
                        other.type_name()
                    )))
                }
            };
            let sep = expect_str(sep, "join separator")?;
            Ok(Value::Str(items.join(&sep)))
        }
        "readFile" => {
            let path = expect_str(one_arg(name, args)?, "readFile path")?;
            std::fs::read_to_string(&path)
                .map(Value::Str)
                .map_err(|e| ExecError::new(format!("readFile {:?} failed: {}", path, e)))
        }
        "writeFile" => {
            let (path, content) = two_args(name, args)?;
            let path = expect_str(path, "writeFile path")?;
            let content = expect_str(content, "writeFile content")?;
            std::fs::write(&path, content)
                .map(|_| Value::Unit)
                .map_err(|e| ExecError::new(format!("writeFile {:?} failed: {}", path, e)))
        }
        _ => Err(ExecError::new(format!("unknown builtin `{}`", name))),
    }
}

fn one_arg(name: &str, args: Vec<Value>) -> Result<Value, ExecError> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(ExecError::new(format!("builtin `{}` takes 1 argument", name))),
    }
}

fn two_args(name: &str, args: Vec<Value>) -> Result<(Value, Value), ExecError> {
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(first), Some(second), None) => Ok((first, second)),
        _ => Err(ExecError::new(format!("builtin `{}` takes 2 arguments", name))),
    }
}
