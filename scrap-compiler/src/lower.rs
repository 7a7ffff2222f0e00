// Lower the surface AST to module IR.
//
// Lowering qualifies class names with their namespace, resolves each call
// site to a sibling routine or a builtin, and erases surface-only
// constructs (using directives, modifiers, unsafe blocks). Declaration
// order of classes and routines is preserved; entry-point resolution
// depends on it.

use crate::image::{
    BinaryOp, ClassDef, FieldDef, Op, ParamDef, Program, RoutineDef, Term, UnaryOp, FORMAT_TAG,
    KIND_LIBRARY,
};
use crate::options::{CompileOptions, OutputKind};
use crate::parser::{BinOp, ClassDecl, Expr, Module, Param, Stmt, UnOp};
use std::collections::BTreeSet;

pub fn lower_module(module: &Module, options: &CompileOptions) -> Program {
    let kind = match options.output_kind {
        OutputKind::Library => KIND_LIBRARY,
    };
    Program {
        format: FORMAT_TAG.to_string(),
        kind: kind.to_string(),
        classes: module.classes.iter().map(lower_class).collect(),
    }
}

fn lower_class(class: &ClassDecl) -> ClassDef {
    let siblings: BTreeSet<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();

    ClassDef {
        name: class.qualified_name(),
        fields: class
            .fields
            .iter()
            .map(|f| FieldDef {
                name: f.name.clone(),
                ty: f.ty.clone(),
                init: f.init.as_ref().map(|e| lower_expr(e, &siblings)),
            })
            .collect(),
        ctors: class
            .ctors
            .iter()
            .map(|c| RoutineDef {
                name: "<ctor>".to_string(),
                params: lower_params(&c.params),
                ret: "void".to_string(),
                body: lower_block(&c.body, &siblings),
            })
            .collect(),
        routines: class
            .methods
            .iter()
            .map(|m| RoutineDef {
                name: m.name.clone(),
                params: lower_params(&m.params),
                ret: m.ret.clone(),
                body: lower_block(&m.body, &siblings),
            })
            .collect(),
    }
}

fn lower_params(params: &[Param]) -> Vec<ParamDef> {
    params
        .iter()
        .map(|p| ParamDef {
            name: p.name.clone(),
            ty: p.ty.clone(),
        })
        .collect()
}

fn lower_block(stmts: &[Stmt], siblings: &BTreeSet<&str>) -> Vec<Op> {
    let mut ops = Vec::new();
    for stmt in stmts {
        match stmt {
            Stmt::Local(name, _ty, init, _) => {
                ops.push(Op::Local(name.clone(), lower_expr(init, siblings)));
            }
            Stmt::Assign(name, value, _) => {
                ops.push(Op::Store(name.clone(), lower_expr(value, siblings)));
            }
            Stmt::Expr(expr) => ops.push(Op::Eval(lower_expr(expr, siblings))),
            Stmt::Return(value, _) => {
                ops.push(Op::Ret(value.as_ref().map(|e| lower_expr(e, siblings))));
            }
            Stmt::If(cond, then_body, else_body) => {
                ops.push(Op::Branch(
                    lower_expr(cond, siblings),
                    lower_block(then_body, siblings),
                    lower_block(else_body, siblings),
                ));
            }
            Stmt::While(cond, body) => {
                ops.push(Op::Loop(
                    lower_expr(cond, siblings),
                    lower_block(body, siblings),
                ));
            }
            // Checked upstream; at this level the block is just its body.
            Stmt::Unsafe(body, _) => ops.extend(lower_block(body, siblings)),
        }
    }
    ops
}

fn lower_expr(expr: &Expr, siblings: &BTreeSet<&str>) -> Term {
    match expr {
        Expr::Int(n) => Term::Int(*n),
        Expr::Bool(b) => Term::Bool(*b),
        Expr::Str(s) => Term::Str(s.clone()),
        Expr::Ident(name, _) => Term::Load(name.clone()),
        Expr::Index(target, index) => Term::Index(
            Box::new(lower_expr(target, siblings)),
            Box::new(lower_expr(index, siblings)),
        ),
        Expr::Call(name, args, _) => {
            let lowered = args.iter().map(|a| lower_expr(a, siblings)).collect();
            if siblings.contains(name.as_str()) {
                Term::CallRoutine(name.clone(), lowered)
            } else {
                Term::CallBuiltin(name.clone(), lowered)
            }
        }
        Expr::Unary(op, inner) => Term::Unary(lower_unop(*op), Box::new(lower_expr(inner, siblings))),
        Expr::Binary(op, lhs, rhs) => Term::Binary(
            lower_binop(*op),
            Box::new(lower_expr(lhs, siblings)),
            Box::new(lower_expr(rhs, siblings)),
        ),
    }
}

fn lower_unop(op: UnOp) -> UnaryOp {
    match op {
        UnOp::Not => UnaryOp::Not,
        UnOp::Neg => UnaryOp::Neg,
    }
}

fn lower_binop(op: BinOp) -> BinaryOp {
    match op {
        BinOp::Add => BinaryOp::Add,
        BinOp::Sub => BinaryOp::Sub,
        BinOp::Mul => BinaryOp::Mul,
        BinOp::Div => BinaryOp::Div,
        BinOp::Rem => BinaryOp::Rem,
        BinOp::Eq => BinaryOp::Eq,
        BinOp::Ne => BinaryOp::Ne,
        BinOp::Lt => BinaryOp::Lt,
        BinOp::Le => BinaryOp::Le,
        BinOp::Gt => BinaryOp::Gt,
        BinOp::Ge => BinaryOp::Ge,
        BinOp::And => BinaryOp::And,
        BinOp::Or => BinaryOp::Or,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;

    fn lower_source(source: &str) -> Program {
        let module = parse_module(source).unwrap();
        lower_module(&module, &CompileOptions::default())
    }

    #[test]
    fn test_namespace_qualifies_lowered_class_names() {
        let program = lower_source(
            r#"
            namespace Demo {
                public class W { public static void Main(string[] m) { print(m[0]); } }
            }
            "#,
        );
        assert_eq!(program.format, FORMAT_TAG);
        assert_eq!(program.kind, KIND_LIBRARY);
        assert_eq!(program.classes[0].name, "Demo.W");
    }

    #[test]
    fn test_call_sites_resolve_to_sibling_or_builtin() {
        let program = lower_source(
            r#"
            public class W {
                public int Twice(int x) { return x * 2; }
                public void Go() { print(str(Twice(3))); }
            }
            "#,
        );
        let go = program.classes[0].find_routine("Go").unwrap();
        match &go.body[0] {
            Op::Eval(Term::CallBuiltin(print_name, args)) => {
                assert_eq!(print_name, "print");
                match &args[0] {
                    Term::CallBuiltin(str_name, inner) => {
                        assert_eq!(str_name, "str");
                        assert!(matches!(&inner[0], Term::CallRoutine(n, _) if n == "Twice"));
                    }
                    other => panic!("unexpected term: {:?}", other),
                }
            }
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[test]
    fn test_unsafe_blocks_are_erased() {
        let program = lower_source(
            r#"
            public class W {
                public void Go() { unsafe { print("a"); } print("b"); }
            }
            "#,
        );
        let go = program.classes[0].find_routine("Go").unwrap();
        assert_eq!(go.body.len(), 2);
        assert!(matches!(&go.body[0], Op::Eval(Term::CallBuiltin(n, _)) if n == "print"));
    }

    #[test]
    fn test_ctor_lowering() {
        let program = lower_source(
            r#"
            public class C {
                int n = 0;
                public C(int start) { n = start; }
            }
            "#,
        );
        let class = &program.classes[0];
        assert_eq!(class.ctors.len(), 1);
        assert_eq!(class.ctors[0].params.len(), 1);
        assert!(class.zero_param_ctor().is_none());
        assert!(matches!(&class.fields[0].init, Some(Term::Int(0))));
    }
}
