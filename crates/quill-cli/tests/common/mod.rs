//! Builders for program trees used across the integration tests.

#![allow(dead_code)]

use quill_ast::ast::*;
use quill_ast::span::Span;
use quill_ast::{ArrayMode, FunctionSignature, Param, TypeSpecifier};
use quill_cli::builtins::{self, Output};
use quill_cli::eval::{Interpreter, Limits, ProgramContext};
use quill_types::{Checked, ErrorList};
use std::rc::Rc;

pub fn sp(line: u32, column: u32) -> Span {
    Span::new(line, column)
}

pub fn id(text: &str) -> Ident {
    Ident::new(text, Span::default())
}

pub fn id_at(text: &str, span: Span) -> Ident {
    Ident::new(text, span)
}

pub fn program(statements: Vec<Stmt>) -> Program {
    Program {
        statements,
        span: Span::default(),
    }
}

// Types

pub fn named(name: &str) -> TypeSpecifier {
    TypeSpecifier::named(name)
}

pub fn generic(name: &str, args: Vec<TypeSpecifier>) -> TypeSpecifier {
    TypeSpecifier::Named(quill_ast::NamedType::new(name, Span::default()).with_args(args))
}

pub fn list(element: TypeSpecifier) -> TypeSpecifier {
    TypeSpecifier::array(element, ArrayMode::Dynamic)
}

pub fn fn_type(params: Vec<TypeSpecifier>, ret: TypeSpecifier) -> TypeSpecifier {
    let params = params
        .into_iter()
        .enumerate()
        .map(|(i, ty)| Param {
            name: id(&format!("p{}", i)),
            ty,
        })
        .collect();
    TypeSpecifier::function(FunctionSignature::new(params, ret))
}

// Expressions

pub fn int(value: i64) -> Expr {
    Expr::Lit(Lit::Int(value), Span::default())
}

pub fn double(value: f64) -> Expr {
    Expr::Lit(Lit::Double(value), Span::default())
}

pub fn string(value: &str) -> Expr {
    Expr::Lit(Lit::Str(value.to_string()), Span::default())
}

pub fn nil() -> Expr {
    Expr::Lit(Lit::Nil, Span::default())
}

pub fn var(name: &str) -> Expr {
    Expr::Var(id(name))
}

pub fn member(object: Expr, name: &str) -> Expr {
    Expr::Member {
        object: Box::new(object),
        member: id(name),
        span: Span::default(),
    }
}

pub fn index(array: Expr, position: Expr) -> Expr {
    Expr::Index {
        array: Box::new(array),
        index: Box::new(position),
        span: Span::default(),
    }
}

pub fn array(elements: Vec<Expr>) -> Expr {
    Expr::Array {
        element: None,
        mode: ArrayMode::Dynamic,
        elements,
        span: Span::default(),
    }
}

pub fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span: Span::default(),
    }
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(var(name)),
        type_args: Vec::new(),
        args,
        span: Span::default(),
    }
}

pub fn generic_call(name: &str, type_args: Vec<TypeSpecifier>, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(var(name)),
        type_args,
        args,
        span: Span::default(),
    }
}

// Statements

pub fn declare(ty: TypeSpecifier, name: &str) -> Stmt {
    Stmt::Declare(Declaration {
        ty: Some(ty),
        name: id(name),
        init: None,
        span: Span::default(),
    })
}

pub fn declare_init(ty: TypeSpecifier, name: &str, init: Expr) -> Stmt {
    Stmt::Declare(Declaration {
        ty: Some(ty),
        name: id(name),
        init: Some(init),
        span: Span::default(),
    })
}

pub fn infer(name: &str, init: Expr) -> Stmt {
    Stmt::Declare(Declaration {
        ty: None,
        name: id(name),
        init: Some(init),
        span: Span::default(),
    })
}

pub fn assign(name: &str, value: Expr) -> Stmt {
    Stmt::Assign {
        target: AssignTarget::Variable(id(name)),
        value,
        span: Span::default(),
    }
}

pub fn assign_member(name: &str, field: &str, value: Expr) -> Stmt {
    Stmt::Assign {
        target: AssignTarget::Member {
            object: Box::new(AssignTarget::Variable(id(name))),
            member: id(field),
            span: Span::default(),
        },
        value,
        span: Span::default(),
    }
}

pub fn assign_index(name: &str, position: Expr, value: Expr) -> Stmt {
    Stmt::Assign {
        target: AssignTarget::Index {
            array: Box::new(AssignTarget::Variable(id(name))),
            index: position,
            span: Span::default(),
        },
        value,
        span: Span::default(),
    }
}

pub fn expr(expr: Expr) -> Stmt {
    Stmt::Expr {
        expr,
        span: Span::default(),
    }
}

pub fn print(value: Expr) -> Stmt {
    expr(call("print", vec![value]))
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::Return {
        value: Some(value),
        span: Span::default(),
    }
}

pub fn block(statements: Vec<Stmt>) -> Stmt {
    Stmt::Block(Block::new(statements))
}

pub fn if_(cond: Expr, then_: Vec<Stmt>) -> Stmt {
    Stmt::If {
        cond,
        then_: Box::new(block(then_)),
        else_: None,
        span: Span::default(),
    }
}

pub fn while_(cond: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::While {
        cond,
        body: Box::new(block(body)),
        span: Span::default(),
    }
}

pub fn do_while(body: Vec<Stmt>, cond: Expr) -> Stmt {
    Stmt::DoWhile {
        body: Box::new(block(body)),
        cond,
        span: Span::default(),
    }
}

pub fn function(
    name: &str,
    params: Vec<(&str, TypeSpecifier)>,
    ret: TypeSpecifier,
    body: Vec<Stmt>,
) -> Stmt {
    generic_function(name, &[], params, ret, body)
}

pub fn generic_function(
    name: &str,
    type_params: &[&str],
    params: Vec<(&str, TypeSpecifier)>,
    ret: TypeSpecifier,
    body: Vec<Stmt>,
) -> Stmt {
    let params = params
        .into_iter()
        .map(|(name, ty)| Param { name: id(name), ty })
        .collect();
    let signature = FunctionSignature::new(params, ret)
        .generic(type_params.iter().map(|p| id(p)).collect());
    Stmt::Function(FunctionDecl {
        name: id(name),
        function: Rc::new(FunctionLiteral {
            signature,
            body: Block::new(body),
            span: Span::default(),
        }),
    })
}

pub fn field(ty: TypeSpecifier, name: &str) -> FieldDecl {
    FieldDecl {
        ty,
        name: id(name),
        default: None,
    }
}

pub fn field_default(ty: TypeSpecifier, name: &str, default: Expr) -> FieldDecl {
    FieldDecl {
        ty,
        name: id(name),
        default: Some(default),
    }
}

pub fn record(name: &str, fields: Vec<FieldDecl>) -> Stmt {
    Stmt::Record(RecordDecl {
        name: id(name),
        type_params: Vec::new(),
        modifier: Modifier::Mutable,
        fields,
        span: Span::default(),
    })
}

pub fn generic_record(name: &str, type_params: &[&str], fields: Vec<FieldDecl>) -> Stmt {
    Stmt::Record(RecordDecl {
        name: id(name),
        type_params: type_params.iter().map(|p| id(p)).collect(),
        modifier: Modifier::Mutable,
        fields,
        span: Span::default(),
    })
}

pub fn readonly_record(name: &str, fields: Vec<FieldDecl>) -> Stmt {
    Stmt::Record(RecordDecl {
        name: id(name),
        type_params: Vec::new(),
        modifier: Modifier::Readonly,
        fields,
        span: Span::default(),
    })
}

pub fn variant(name: &str, ty: TypeSpecifier) -> VariantDecl {
    VariantDecl {
        name: id(name),
        shape: VariantShape::Type(ty),
    }
}

pub fn variant_record(name: &str, fields: Vec<FieldDecl>) -> VariantDecl {
    VariantDecl {
        name: id(name),
        shape: VariantShape::Record(fields),
    }
}

pub fn sum(name: &str, variants: Vec<VariantDecl>) -> Stmt {
    Stmt::Sum(SumDecl {
        name: id(name),
        type_params: Vec::new(),
        variants,
        span: Span::default(),
    })
}

pub fn alias(name: &str, target: TypeSpecifier, default: Option<Expr>) -> Stmt {
    Stmt::Alias(AliasDecl {
        name: id(name),
        type_params: Vec::new(),
        target,
        default,
        span: Span::default(),
    })
}

pub fn arm(variant: &str, binding: Option<&str>, body: Vec<Stmt>) -> MatchArm {
    MatchArm {
        variant: id(variant),
        binding: binding.map(id),
        body: Block::new(body),
        span: Span::default(),
    }
}

pub fn match_(subject: Expr, arms: Vec<MatchArm>, else_: Option<Vec<Stmt>>) -> Stmt {
    Stmt::Match {
        subject,
        arms,
        else_: else_.map(Block::new),
        span: Span::default(),
    }
}

// Running

/// Call depth used by the tests; deep enough for the programs below and
/// shallow enough to stay inside a test thread's stack.
pub const TEST_CALL_DEPTH: u32 = 32;

pub fn interpreter() -> (Interpreter, Rc<std::cell::RefCell<String>>) {
    let interpreter = Interpreter::with_limits(Limits {
        max_call_depth: TEST_CALL_DEPTH,
    });
    let (output, buffer) = Output::capture();
    builtins::install(&interpreter, output).expect("install builtins");
    (interpreter, buffer)
}

/// Run `statements` and return the outcome with everything printed.
pub fn run(statements: Vec<Stmt>) -> (Checked<ProgramContext>, String) {
    let (interpreter, buffer) = interpreter();
    let outcome = interpreter.run(&program(statements));
    let printed = buffer.borrow().clone();
    (outcome, printed)
}

/// Run a program expected to succeed and return its output.
pub fn run_ok(statements: Vec<Stmt>) -> String {
    let (outcome, printed) = run(statements);
    if let Err(errors) = outcome {
        panic!("program failed:\n{}", errors);
    }
    printed
}

pub fn check(statements: Vec<Stmt>) -> ErrorList {
    let (interpreter, _) = interpreter();
    interpreter.check(&program(statements))
}
