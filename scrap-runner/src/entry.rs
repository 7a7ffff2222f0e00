// Entry-point resolution and the entry capability.
//
// Resolution scans routine declarations in declaration order for the
// fixed entry name and must find exactly one match: zero is NotFound,
// more than one is Ambiguous. The winner is bound to the Entry
// capability, which is the only way the runner invokes snippet code.

use crate::runtime::{ExecError, Interpreter, Value};
use scrap_compiler::image::{ClassDef, Program, RoutineDef};
use std::io::Write;

pub const ENTRY_ROUTINE: &str = "Main";

#[derive(Debug)]
pub enum ResolveError {
    NotFound,
    Ambiguous(Vec<String>),
}

pub struct ResolvedEntry<'p> {
    pub class: &'p ClassDef,
    pub routine: &'p RoutineDef,
}

impl<'p> ResolvedEntry<'p> {
    pub fn describe(&self) -> String {
        format!("{}::{}", self.class.name, self.routine.name)
    }
}

pub fn resolve(program: &Program) -> Result<ResolvedEntry<'_>, ResolveError> {
    let mut matches = Vec::new();
    for class in &program.classes {
        for routine in &class.routines {
            if routine.name == ENTRY_ROUTINE {
                matches.push(ResolvedEntry { class, routine });
            }
        }
    }

    if matches.is_empty() {
        return Err(ResolveError::NotFound);
    }
    if matches.len() > 1 {
        return Err(ResolveError::Ambiguous(
            matches.iter().map(|m| m.describe()).collect(),
        ));
    }
    Ok(matches.remove(0))
}

/// The capability a compiled module exposes to its host: one invokable
/// routine taking a string list.
pub trait Entry {
    fn invoke(&mut self, args: &[String]) -> Result<(), ExecError>;
}

pub struct BoundEntry<'p, W: Write> {
    class: &'p ClassDef,
    routine: &'p RoutineDef,
    out: &'p mut W,
}

pub fn bind<'p, W: Write>(entry: ResolvedEntry<'p>, out: &'p mut W) -> BoundEntry<'p, W> {
    BoundEntry {
        class: entry.class,
        routine: entry.routine,
        out,
    }
}

impl<'p, W: Write> Entry for BoundEntry<'p, W> {
    fn invoke(&mut self, args: &[String]) -> Result<(), ExecError> {
        let mut interp = Interpreter::new(&mut *self.out);
        let mut instance = interp.instantiate(self.class)?;
        let arg_list = Value::StrList(args.to_vec());
        // The routine's return value is discarded.
        interp.invoke(self.class, self.routine, &mut instance, vec![arg_list])?;
        Ok(())
    }
}
