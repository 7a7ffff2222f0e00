// Runtime values and execution errors.

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    StrList(Vec<String>),
    Unit,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::StrList(_) => "string[]",
            Value::Unit => "void",
        }
    }

    /// Text form used by `print` and string concatenation.
    pub fn display(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Str(s) => s.clone(),
            Value::StrList(items) => format!("[{}]", items.join(", ")),
            Value::Unit => "()".to_string(),
        }
    }
}

/// The default a field holds before its initializer (if any) runs.
pub fn default_for_type(ty: &str) -> Value {
    match ty {
        "int" => Value::Int(0),
        "bool" => Value::Bool(false),
        "string" => Value::Str(String::new()),
        "string[]" => Value::StrList(Vec::new()),
        _ => Value::Unit,
    }
}

#[derive(Debug, Clone)]
pub struct ExecError {
    pub message: String,
}

impl ExecError {
    pub fn new(message: impl Into<String>) -> Self {
        ExecError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ExecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub fn expect_int(value: Value, what: &str) -> Result<i64, ExecError> {
    match value {
        Value::Int(n) => Ok(n),
        other => Err(ExecError::new(format!(
            "{} must be an int, got {}",
            what,
            other.type_name()
        ))),
    }
}

pub fn expect_bool(value: Value, what: &str) -> Result<bool, ExecError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(ExecError::new(format!(
            "{} must be a bool, got {}",
            what,
            other.type_name()
        ))),
    }
}

pub fn expect_str(value: Value, what: &str) -> Result<String, ExecError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(ExecError::new(format!(
            "{} must be a string, got {}",
            what,
            other.type_name()
        ))),
    }
}
