//! Host functions installed into every program's global scope.

use crate::eval::Interpreter;
use quill_ast::ast::Ident;
use quill_ast::span::Span;
use quill_ast::{ArrayMode, FunctionSignature, Param, TypeSpecifier};
use quill_types::prelude::*;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use tracing::debug;

/// Where `print` writes its lines.
#[derive(Clone, Debug, Default)]
pub enum Output {
    #[default]
    Stdout,
    Capture(Rc<RefCell<String>>),
}

impl Output {
    /// An in-memory sink and a handle to read it back.
    pub fn capture() -> (Output, Rc<RefCell<String>>) {
        let buffer = Rc::new(RefCell::new(String::new()));
        (Output::Capture(buffer.clone()), buffer)
    }

    fn write_line(&self, line: &str) -> Result<(), String> {
        match self {
            Output::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", line).map_err(|e| e.to_string())
            }
            Output::Capture(buffer) => {
                let mut buffer = buffer.borrow_mut();
                buffer.push_str(line);
                buffer.push('\n');
                Ok(())
            }
        }
    }
}

/// `<T>(value: param) -> ret`
fn generic_signature(param: TypeSpecifier, ret: TypeSpecifier) -> FunctionSignature {
    FunctionSignature::new(
        vec![Param {
            name: Ident::new("value", Span::default()),
            ty: param,
        }],
        ret,
    )
    .generic(vec![Ident::new("T", Span::default())])
}

/// Define `print`, `to_string` and `length`.
pub fn install(interpreter: &Interpreter, output: Output) -> Result<(), ErrorKind> {
    let t = TypeSpecifier::named("T");

    interpreter.define_native(
        "print",
        generic_signature(t.clone(), TypeSpecifier::nil()),
        Rc::new(move |args: &[Value]| -> Result<Value, String> {
            let line = args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            output.write_line(&line)?;
            Ok(Value::Nil)
        }),
    )?;

    interpreter.define_native(
        "to_string",
        generic_signature(t.clone(), TypeSpecifier::string()),
        Rc::new(|args: &[Value]| -> Result<Value, String> {
            Ok(Value::Str(args.iter().map(ToString::to_string).collect()))
        }),
    )?;

    interpreter.define_native(
        "length",
        generic_signature(TypeSpecifier::array(t, ArrayMode::Dynamic), TypeSpecifier::int()),
        Rc::new(|args: &[Value]| -> Result<Value, String> {
            match args {
                [Value::Array(array)] => i64::try_from(array.items.len())
                    .map(Value::Int)
                    .map_err(|e| e.to_string()),
                _ => Err("expected a single array argument".to_string()),
            }
        }),
    )?;

    debug!(functions = 3, "builtins installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installing_twice_is_rejected() {
        let interpreter = Interpreter::new();
        install(&interpreter, Output::Stdout).unwrap();
        let err = install(&interpreter, Output::Stdout).unwrap_err();
        assert_eq!(err.code(), "PREVIOUS_DECLARATION");
    }

    #[test]
    fn capture_collects_lines() {
        let (output, buffer) = Output::capture();
        output.write_line("a").unwrap();
        output.write_line("b").unwrap();
        assert_eq!(&*buffer.borrow(), "a\nb\n");
    }
}
