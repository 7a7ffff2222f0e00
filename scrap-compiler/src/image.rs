// Module IR and the image codec.
//
// The image is the loadable artifact the compiler hands to an execution
// environment: the lowered program serialized to bytes, tagged with a
// format version that the loader verifies.

use serde::{Deserialize, Serialize};

pub const FORMAT_TAG: &str = "scrap-module/0.1";
pub const KIND_LIBRARY: &str = "library";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub format: String,
    pub kind: String,
    pub classes: Vec<ClassDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    /// Namespace-qualified name, e.g. "Demo.W".
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub ctors: Vec<RoutineDef>,
    pub routines: Vec<RoutineDef>,
}

impl ClassDef {
    pub fn find_routine(&self, name: &str) -> Option<&RoutineDef> {
        self.routines.iter().find(|r| r.name == name)
    }

    pub fn zero_param_ctor(&self) -> Option<&RoutineDef> {
        self.ctors.iter().find(|c| c.params.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: String,
    pub init: Option<Term>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineDef {
    pub name: String,
    pub params: Vec<ParamDef>,
    pub ret: String,
    pub body: Vec<Op>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub ty: String,
}

/// Statement-level IR. `unsafe` blocks are erased during lowering, so
/// nothing here is gated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Op {
    Local(String, Term),
    Store(String, Term),
    Eval(Term),
    Ret(Option<Term>),
    Branch(Term, Vec<Op>, Vec<Op>),
    Loop(Term, Vec<Op>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Term {
    Int(i64),
    Bool(bool),
    Str(String),
    Load(String),
    Index(Box<Term>, Box<Term>),
    CallBuiltin(String, Vec<Term>),
    CallRoutine(String, Vec<Term>),
    Unary(UnaryOp, Box<Term>),
    Binary(BinaryOp, Box<Term>, Box<Term>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Serialize a lowered program into image bytes.
pub fn encode_module(program: &Program) -> Vec<u8> {
    serde_json::to_vec(program).unwrap()
}

/// Decode image bytes, verifying the format tag and module kind.
pub fn decode_module(bytes: &[u8]) -> Result<Program, String> {
    let program: Program = serde_json::from_slice(bytes)
        .map_err(|e| format!("failed to decode module image: {}", e))?;
    if program.format != FORMAT_TAG {
        return Err(format!("unsupported module format: {:?}", program.format));
    }
    if program.kind != KIND_LIBRARY {
        return Err(format!("unsupported module kind: {:?}", program.kind));
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_program() -> Program {
        Program {
            format: FORMAT_TAG.to_string(),
            kind: KIND_LIBRARY.to_string(),
            classes: vec![ClassDef {
                name: "W".to_string(),
                fields: vec![],
                ctors: vec![],
                routines: vec![RoutineDef {
                    name: "Main".to_string(),
                    params: vec![ParamDef {
                        name: "m".to_string(),
                        ty: "string[]".to_string(),
                    }],
                    ret: "void".to_string(),
                    body: vec![Op::Eval(Term::CallBuiltin(
                        "print".to_string(),
                        vec![Term::Index(
                            Box::new(Term::Load("m".to_string())),
                            Box::new(Term::Int(0)),
                        )],
                    ))],
                }],
            }],
        }
    }

    #[test]
    fn test_encode_decode_preserves_structure() {
        let bytes = encode_module(&tiny_program());
        let decoded = decode_module(&bytes).unwrap();
        assert_eq!(decoded.classes.len(), 1);
        let class = &decoded.classes[0];
        assert_eq!(class.name, "W");
        assert!(class.find_routine("Main").is_some());
        assert!(class.find_routine("Other").is_none());
        assert!(class.zero_param_ctor().is_none());
    }

    #[test]
    fn test_decode_rejects_wrong_format_tag() {
        let mut program = tiny_program();
        program.format = "scrap-module/9.9".to_string();
        let bytes = serde_json::to_vec(&program).unwrap();
        let err = decode_module(&bytes).unwrap_err();
        assert!(err.contains("unsupported module format"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_module(b"not an image").unwrap_err();
        assert!(err.contains("failed to decode"));
    }
}
