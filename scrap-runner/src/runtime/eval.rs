// Tree-walking evaluator over the loaded module IR.
//
// One Interpreter serves one run: instances, scopes, and the output sink
// all live and die with the invocation. Nothing is shared across runs.

use super::builtins;
use super::value::{default_for_type, expect_bool, expect_int, ExecError, Value};
use scrap_compiler::image::{BinaryOp, ClassDef, Op, RoutineDef, Term, UnaryOp};
use std::collections::HashMap;
use std::io::Write;

/// A constructed object: the field map for one class instance.
#[derive(Debug)]
pub struct Instance {
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<'a, W: Write> {
    out: &'a mut W,
}

impl<'a, W: Write> Interpreter<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Interpreter { out }
    }

    /// Default-construct a class: field defaults, then initializers in
    /// declaration order, then the zero-parameter constructor if any
    /// constructor is declared at all.
    pub fn instantiate(&mut self, class: &ClassDef) -> Result<Instance, ExecError> {
        let mut instance = Instance {
            fields: class
                .fields
                .iter()
                .map(|f| (f.name.clone(), default_for_type(&f.ty)))
                .collect(),
        };

        for field in &class.fields {
            if let Some(init) = &field.init {
                let mut scope = Scope::new();
                let value = self.eval(init, class, &mut scope, &mut instance)?;
                instance.set(&field.name, value);
            }
        }

        if !class.ctors.is_empty() {
            let ctor = class.zero_param_ctor().ok_or_else(|| {
                ExecError::new(format!(
                    "class `{}` has no zero-parameter constructor",
                    class.name
                ))
            })?;
            let mut scope = Scope::new();
            match self.exec_block(&ctor.body, class, &mut scope, &mut instance)? {
                Flow::Normal | Flow::Return(_) => {}
            }
        }

        Ok(instance)
    }

    pub fn invoke(
        &mut self,
        class: &ClassDef,
        routine: &RoutineDef,
        instance: &mut Instance,
        args: Vec<Value>,
    ) -> Result<Value, ExecError> {
        if routine.params.len() != args.len() {
            return Err(ExecError::new(format!(
                "routine `{}` expects {} argument(s) but was invoked with {}",
                routine.name,
                routine.params.len(),
                args.len()
            )));
        }

        let mut scope = Scope::new();
        scope.push_frame();
        for (param, arg) in routine.params.iter().zip(args) {
            scope.declare(&param.name, arg);
        }

        match self.exec_block(&routine.body, class, &mut scope, instance)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Unit),
        }
    }

    fn exec_block(
        &mut self,
        ops: &[Op],
        class: &ClassDef,
        scope: &mut Scope,
        instance: &mut Instance,
    ) -> Result<Flow, ExecError> {
        scope.push_frame();
        let flow = self.exec_ops(ops, class, scope, instance);
        scope.pop_frame();
        flow
    }

    fn exec_ops(
        &mut self,
        ops: &[Op],
        class: &ClassDef,
        scope: &mut Scope,
        instance: &mut Instance,
    ) -> Result<Flow, ExecError> {
        for op in ops {
            match op {
                Op::Local(name, term) => {
                    let value = self.eval(term, class, scope, instance)?;
                    scope.declare(name, value);
                }
                Op::Store(name, term) => {
                    let value = self.eval(term, class, scope, instance)?;
                    if scope.contains(name) {
                        scope.assign(name, value);
                    } else if instance.has(name) {
                        instance.set(name, value);
                    } else {
                        return Err(ExecError::new(format!("unknown name `{}`", name)));
                    }
                }
                Op::Eval(term) => {
                    self.eval(term, class, scope, instance)?;
                }
                Op::Ret(value) => {
                    let value = match value {
                        Some(term) => self.eval(term, class, scope, instance)?,
                        None => Value::Unit,
                    };
                    return Ok(Flow::Return(value));
                }
                Op::Branch(cond, then_ops, else_ops) => {
                    let cond = expect_bool(
                        self.eval(cond, class, scope, instance)?,
                        "if condition",
                    )?;
                    let body = if cond { then_ops } else { else_ops };
                    if let Flow::Return(value) = self.exec_block(body, class, scope, instance)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Op::Loop(cond, body) => loop {
                    let keep_going = expect_bool(
                        self.eval(cond, class, scope, instance)?,
                        "while condition",
                    )?;
                    if !keep_going {
                        break;
                    }
                    if let Flow::Return(value) = self.exec_block(body, class, scope, instance)? {
                        return Ok(Flow::Return(value));
                    }
                },
            }
        }
        Ok(Flow::Normal)
    }

    fn eval(
        &mut self,
        term: &Term,
        class: &ClassDef,
        scope: &mut Scope,
        instance: &mut Instance,
    ) -> Result<Value, ExecError> {
        match term {
            Term::Int(n) => Ok(Value::Int(*n)),
            Term::Bool(b) => Ok(Value::Bool(*b)),
            Term::Str(s) => Ok(Value::Str(s.clone())),
            Term::Load(name) => {
                if let Some(value) = scope.get(name) {
                    Ok(value.clone())
                } else if let Some(value) = instance.field(name) {
                    Ok(value.clone())
                } else {
                    Err(ExecError::new(format!("unknown name `{}`", name)))
                }
            }
            Term::Index(target, index) => {
                let target = self.eval(target, class, scope, instance)?;
                let idx = expect_int(self.eval(index, class, scope, instance)?, "index")?;
                index_value(target, idx)
            }
            Term::CallBuiltin(name, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, class, scope, instance)?);
                }
                builtins::dispatch(name, values, &mut *self.out)
            }
            Term::CallRoutine(name, args) => {
                let routine = class.find_routine(name).ok_or_else(|| {
                    ExecError::new(format!(
                        "class `{}` has no routine named `{}`",
                        class.name, name
                    ))
                })?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, class, scope, instance)?);
                }
                self.invoke(class, routine, instance, values)
            }
            Term::Unary(UnaryOp::Not, inner) => {
                let value = expect_bool(
                    self.eval(inner, class, scope, instance)?,
                    "operand of `!`",
                )?;
                Ok(Value::Bool(!value))
            }
            Term::Unary(UnaryOp::Neg, inner) => {
                let value = expect_int(
                    self.eval(inner, class, scope, instance)?,
                    "operand of unary `-`",
                )?;
                value
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| ExecError::new("integer overflow in unary `-`"))
            }
            Term::Binary(BinaryOp::And, lhs, rhs) => {
                let lhs = expect_bool(
                    self.eval(lhs, class, scope, instance)?,
                    "left operand of `&&`",
                )?;
                if !lhs {
                    return Ok(Value::Bool(false));
                }
                let rhs = expect_bool(
                    self.eval(rhs, class, scope, instance)?,
                    "right operand of `&&`",
                )?;
                Ok(Value::Bool(rhs))
            }
            Term::Binary(BinaryOp::Or, lhs, rhs) => {
                let lhs = expect_bool(
                    self.eval(lhs, class, scope, instance)?,
                    "left operand of `||`",
                )?;
                if lhs {
                    return Ok(Value::Bool(true));
                }
                let rhs = expect_bool(
                    self.eval(rhs, class, scope, instance)?,
                    "right operand of `||`",
                )?;
                Ok(Value::Bool(rhs))
            }
            Term::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, class, scope, instance)?;
                let rhs = self.eval(rhs, class, scope, instance)?;
                binary_op(*op, lhs, rhs)
            }
        }
    }
}

fn index_value(target: Value, idx: i64) -> Result<Value, ExecError> {
    match target {
        Value::StrList(items) => {
            if idx < 0 || idx as usize >= items.len() {
                return Err(ExecError::new(format!(
                    "index {} out of bounds for list of length {}",
                    idx,
                    items.len()
                )));
            }
            Ok(Value::Str(items[idx as usize].clone()))
        }
        Value::Str(s) => {
            if idx < 0 {
                return Err(ExecError::new(format!("index {} out of bounds", idx)));
            }
            s.chars()
                .nth(idx as usize)
                .map(|c| Value::Str(c.to_string()))
                .ok_or_else(|| {
                    ExecError::new(format!(
                        "index {} out of bounds for string of length {}",
                        idx,
                        s.chars().count()
                    ))
                })
        }
        other => Err(ExecError::new(format!(
            "cannot index into {}",
            other.type_name()
        ))),
    }
}

fn binary_op(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ExecError> {
    match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(b)
                .map(Value::Int)
                .ok_or_else(|| ExecError::new("integer overflow in `+`")),
            (Value::Str(a), b) => Ok(Value::Str(format!("{}{}", a, b.display()))),
            (a, Value::Str(b)) => Ok(Value::Str(format!("{}{}", a.display(), b))),
            (a, b) => Err(bad_operands("+", &a, &b)),
        },
        BinaryOp::Sub => int_op("-", lhs, rhs, |a, b| a.checked_sub(b)),
        BinaryOp::Mul => int_op("*", lhs, rhs, |a, b| a.checked_mul(b)),
        BinaryOp::Div => match (&lhs, &rhs) {
            (Value::Int(_), Value::Int(0)) => Err(ExecError::new("division by zero")),
            _ => int_op("/", lhs, rhs, |a, b| a.checked_div(b)),
        },
        BinaryOp::Rem => match (&lhs, &rhs) {
            (Value::Int(_), Value::Int(0)) => Err(ExecError::new("division by zero")),
            _ => int_op("%", lhs, rhs, |a, b| a.checked_rem(b)),
        },
        BinaryOp::Eq => Ok(Value::Bool(values_equal("==", &lhs, &rhs)?)),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal("!=", &lhs, &rhs)?)),
        BinaryOp::Lt => int_cmp("<", lhs, rhs, |a, b| a < b),
        BinaryOp::Le => int_cmp("<=", lhs, rhs, |a, b| a <= b),
        BinaryOp::Gt => int_cmp(">", lhs, rhs, |a, b| a > b),
        BinaryOp::Ge => int_cmp(">=", lhs, rhs, |a, b| a >= b),
        // Short-circuit forms are handled during evaluation.
        BinaryOp::And => match (lhs, rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a && b)),
            (a, b) => Err(bad_operands("&&", &a, &b)),
        },
        BinaryOp::Or => match (lhs, rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a || b)),
            (a, b) => Err(bad_operands("||", &a, &b)),
        },
    }
}

fn int_op(
    symbol: &str,
    lhs: Value,
    rhs: Value,
    apply: impl Fn(i64, i64) -> Option<i64>,
) -> Result<Value, ExecError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => apply(a, b)
            .map(Value::Int)
            .ok_or_else(|| ExecError::new(format!("integer overflow in `{}`", symbol))),
        (a, b) => Err(bad_operands(symbol, &a, &b)),
    }
}

fn int_cmp(
    symbol: &str,
    lhs: Value,
    rhs: Value,
    apply: impl Fn(i64, i64) -> bool,
) -> Result<Value, ExecError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(apply(a, b))),
        (a, b) => Err(bad_operands(symbol, &a, &b)),
    }
}

fn values_equal(symbol: &str, lhs: &Value, rhs: &Value) -> Result<bool, ExecError> {
    match (lhs, rhs) {
        (Value::Int(_), Value::Int(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Str(_), Value::Str(_))
        | (Value::StrList(_), Value::StrList(_))
        | (Value::Unit, Value::Unit) => Ok(lhs == rhs),
        _ => Err(bad_operands(symbol, lhs, rhs)),
    }
}

fn bad_operands(symbol: &str, lhs: &Value, rhs: &Value) -> ExecError {
    ExecError::new(format!(
        "`{}` cannot combine {} and {}",
        symbol,
        lhs.type_name(),
        rhs.type_name()
    ))
}

// ---------------------------------------------------------------------------
// Lexical scope for one routine activation
// ---------------------------------------------------------------------------

struct Scope {
    frames: Vec<HashMap<String, Value>>,
}

impl Scope {
    fn new() -> Self {
        Scope { frames: Vec::new() }
    }

    fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    fn pop_frame(&mut self) {
        self.frames.pop();
    }

    fn declare(&mut self, name: &str, value: Value) {
        if self.frames.is_empty() {
            self.frames.push(HashMap::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn assign(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if frame.contains_key(name) {
                frame.insert(name.to_string(), value);
                return;
            }
        }
    }
}
