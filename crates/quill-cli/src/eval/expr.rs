//! Expressions: static types and evaluation.

use super::{settle, Interpreter};
use quill_ast::ast::{BinOp, Expr, FieldInit, Ident, Lit, UnOp};
use quill_ast::span::Span;
use quill_ast::{ArrayMode, PrimitiveKind, TypeSpecifier};
use quill_types::prelude::*;
use quill_types::specifier::{analyze, coerce, Comparison};
use std::cmp::Ordering;
use std::rc::Rc;

/// Check that a value of type `found` may be stored where `expected` is
/// required. `mismatch` builds the error from the (expected, found) names.
pub(super) fn expect_fits(
    found: &TypeSpecifier,
    found_table: &Rc<TypeTable>,
    expected: &TypeSpecifier,
    expected_table: &Rc<TypeTable>,
    span: Span,
    mismatch: impl FnOnce(String, String) -> ErrorKind,
) -> Checked<()> {
    match analyze(found, found_table, expected, expected_table, Comparison::Widening)? {
        AnalysisResult::Equivalent | AnalysisResult::Unambiguous => Ok(()),
        AnalysisResult::Ambiguous => Err(ErrorKind::AmbiguousSumConversion {
            ty: expected.to_string(),
            found: found.to_string(),
        }
        .at(span)
        .into()),
        AnalysisResult::Incompatible => {
            Err(mismatch(expected.to_string(), found.to_string()).at(span).into())
        }
    }
}

impl Interpreter {
    /// Static type of `expr` as seen from `ctx`. The result is canonical, so
    /// it reads the same from any scope nested in `ctx`.
    pub(super) fn check_expr(
        &self,
        expr: &Expr,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<TypeSpecifier> {
        let types = ctx.types();
        match expr {
            Expr::Lit(lit, span) => Ok(literal_type(lit).at(*span)),
            Expr::Var(id) => ctx
                .get_symbol(&id.text)
                .map(|symbol| symbol.ty().clone())
                .ok_or_else(|| undeclared(id, ctx)),
            Expr::Member { object, member, .. } => {
                let object_ty = self.check_expr(object, ctx)?;
                self.member_type(&object_ty, member, types)
            }
            Expr::Index { array, index, span } => {
                let element = self
                    .check_expr(array, ctx)
                    .and_then(|ty| self.element_type(&ty, types, *span));
                let (errors, element) = ErrorList::new().absorb(element);
                let (errors, _) = errors.absorb(self.expect_index(index, ctx));
                settle(errors, element)
            }
            Expr::Array {
                element,
                mode,
                elements,
                span,
            } => self.check_array(element.as_ref(), *mode, elements, *span, ctx),
            Expr::Record { ty, fields, span } => self.check_record(ty, fields, *span, ctx),
            Expr::Default { ty, .. } => {
                let ty = ty.canonical(types)?;
                ty.default_value(types)?;
                Ok(ty)
            }
            Expr::Unary {
                op,
                expr: operand,
                span,
            } => {
                let found = self.check_expr(operand, ctx)?;
                match (op, primitive_of(&found, types)?) {
                    (UnOp::Not, Some(PrimitiveKind::Boolean)) => {
                        Ok(TypeSpecifier::boolean().at(*span))
                    }
                    (UnOp::Neg, Some(kind)) if kind.is_numeric() => {
                        Ok(TypeSpecifier::primitive(kind).at(*span))
                    }
                    _ => Err(ErrorKind::OperatorTypeError {
                        op: unary_symbol(*op).to_string(),
                        operands: found.to_string(),
                    }
                    .at(*span)
                    .into()),
                }
            }
            Expr::Binary { op, lhs, rhs, span } => {
                let (errors, l) = ErrorList::new().absorb(self.check_expr(lhs, ctx));
                let (errors, r) = errors.absorb(self.check_expr(rhs, ctx));
                let (l, r) = settle(errors, l.zip(r))?;
                binary_type(*op, &l, &r, types, *span)
            }
            Expr::Call {
                callee,
                type_args,
                args,
                span,
            } => self.check_call(callee, type_args, args, *span, ctx),
            Expr::Function(lit) => self.check_function_literal(lit, ctx),
        }
    }

    fn check_array(
        &self,
        element: Option<&TypeSpecifier>,
        mode: ArrayMode,
        elements: &[Expr],
        span: Span,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<TypeSpecifier> {
        let types = ctx.types();
        let mut errors = ErrorList::new();
        let mut found = Vec::with_capacity(elements.len());
        for e in elements {
            let (next, ty) = errors.absorb(self.check_expr(e, ctx));
            errors = next;
            found.push(ty);
        }
        let element_ty = match element {
            Some(ty) => match ty.canonical(types) {
                Ok(ty) => ty,
                Err(e) => return Err(errors.concat(e)),
            },
            // Without an explicit type the first element decides.
            None => match found.first() {
                Some(Some(ty)) => ty.clone(),
                Some(None) => return Err(errors),
                None => return Err(ErrorKind::UntypedArrayLiteral.at(span).into()),
            },
        };
        for (e, ty) in elements.iter().zip(&found) {
            if let Some(ty) = ty {
                let fits = expect_fits(ty, types, &element_ty, types, e.span(), |expected, found| {
                    ErrorKind::InvalidArrayElement { expected, found }
                });
                errors = errors.absorb(fits).0;
            }
        }
        errors.into_result(TypeSpecifier::Array {
            element: Box::new(element_ty),
            mode,
            span,
        })
    }

    fn check_record(
        &self,
        ty: &TypeSpecifier,
        fields: &[FieldInit],
        span: Span,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<TypeSpecifier> {
        let types = ctx.types();
        let resolved = ty.resolve(types, AliasResolution::Resolve)?;
        let record = match &*resolved.definition {
            TypeDefinition::Record(record) => record,
            TypeDefinition::Placeholder(p) if p.kind == PlaceholderKind::Declaration => {
                return Err(ErrorKind::PartiallyDeclaredType {
                    name: p.name.clone(),
                }
                .at(ty.span())
                .into());
            }
            _ => {
                return Err(ErrorKind::NotARecord {
                    found: ty.to_string(),
                }
                .at(ty.span())
                .into());
            }
        };

        let mut errors = ErrorList::new();
        let mut seen: Vec<&str> = Vec::new();
        for init in fields {
            let name = init.name.text.as_str();
            if seen.contains(&name) {
                errors = errors.with(
                    ErrorKind::PreviousDeclaration {
                        name: name.to_string(),
                    }
                    .at(init.name.span),
                );
                continue;
            }
            seen.push(name);
            let (next, found) = errors.absorb(self.check_expr(&init.value, ctx));
            errors = next;
            let Some(field) = record.fields.get(name) else {
                errors = errors.with(
                    ErrorKind::UnknownMember {
                        ty: resolved.specifier.to_string(),
                        member: name.to_string(),
                    }
                    .at(init.name.span),
                );
                continue;
            };
            if let Some(found) = found {
                let fits = expect_fits(
                    &found,
                    types,
                    &field.ty,
                    &resolved.table,
                    init.value.span(),
                    |expected, found| ErrorKind::AssignmentTypeError {
                        target: format!("{}.{}", resolved.specifier, name),
                        expected,
                        found,
                    },
                );
                errors = errors.absorb(fits).0;
            }
        }
        errors.into_result(resolved.specifier.clone().at(span))
    }

    pub(super) fn member_type(
        &self,
        object_ty: &TypeSpecifier,
        member: &Ident,
        types: &Rc<TypeTable>,
    ) -> Checked<TypeSpecifier> {
        let resolved = object_ty.resolve(types, AliasResolution::Resolve)?;
        match resolved.as_record().and_then(|r| r.fields.get(&member.text)) {
            Some(field) => field.ty.canonical(&resolved.table),
            None => Err(ErrorKind::UnknownMember {
                ty: object_ty.to_string(),
                member: member.text.clone(),
            }
            .at(member.span)
            .into()),
        }
    }

    pub(super) fn element_type(
        &self,
        array_ty: &TypeSpecifier,
        types: &Rc<TypeTable>,
        span: Span,
    ) -> Checked<TypeSpecifier> {
        let resolved = array_ty.resolve(types, AliasResolution::Resolve)?;
        match resolved.as_array() {
            Some(array) => array.element.canonical(&resolved.table),
            None => Err(ErrorKind::NotAnArray {
                found: array_ty.to_string(),
            }
            .at(span)
            .into()),
        }
    }

    pub(super) fn expect_index(&self, index: &Expr, ctx: &Rc<ExecutionContext>) -> Checked<()> {
        let found = self.check_expr(index, ctx)?;
        let types = ctx.types();
        expect_fits(&found, types, &TypeSpecifier::int(), types, index.span(), |_, found| {
            ErrorKind::InvalidIndexType { found }
        })
    }

    pub(super) fn evaluate(&self, expr: &Expr, ctx: &Rc<ExecutionContext>) -> Checked<Value> {
        match expr {
            Expr::Lit(lit, _) => Ok(literal_value(lit)),
            Expr::Var(id) => ctx
                .get_symbol(&id.text)
                .map(Symbol::into_value)
                .ok_or_else(|| undeclared(id, ctx)),
            Expr::Member { object, member, .. } => {
                let object = self.evaluate(object, ctx)?;
                self.member_value(object, member)
            }
            Expr::Index { array, index, span } => {
                let array = self.evaluate(array, ctx)?;
                let position = self.index_value(index, ctx)?;
                element_at(array, position, *span)
            }
            Expr::Array {
                element,
                mode,
                elements,
                span,
            } => {
                let types = ctx.types();
                let element_ty = match (element, elements.first()) {
                    (Some(ty), _) => ty.canonical(types)?,
                    (None, Some(first)) => self.check_expr(first, ctx)?,
                    (None, None) => return Err(ErrorKind::UntypedArrayLiteral.at(*span).into()),
                };
                let mut items = Vec::with_capacity(elements.len());
                for e in elements {
                    items.push(coerce(self.evaluate(e, ctx)?, &element_ty, types)?);
                }
                Ok(Value::Array(ArrayValue {
                    element: element_ty,
                    mode: *mode,
                    items,
                }))
            }
            Expr::Record { ty, fields, span } => {
                let resolved = ty.resolve(ctx.types(), AliasResolution::Resolve)?;
                let Some(record) = resolved.as_record() else {
                    return Err(ErrorKind::InvariantViolation(format!(
                        "{} constructed as a record",
                        ty
                    ))
                    .at(*span)
                    .into());
                };
                let mut value = resolved.default_value()?;
                if let Value::Record(instance) = &mut value {
                    for init in fields {
                        let Some(field) = record.fields.get(&init.name.text) else {
                            continue;
                        };
                        let v = self.evaluate(&init.value, ctx)?;
                        let v = coerce(v, &field.ty, &resolved.table)?;
                        instance.fields.update(&init.name.text, v);
                    }
                }
                Ok(value)
            }
            Expr::Default { ty, .. } => {
                let types = ctx.types();
                ty.canonical(types)?.default_value(types)
            }
            Expr::Unary {
                op,
                expr: operand,
                span,
            } => match (op, self.evaluate(operand, ctx)?) {
                (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (UnOp::Neg, Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
                (UnOp::Neg, Value::Double(d)) => Ok(Value::Double(-d)),
                (_, other) => Err(ErrorKind::InvariantViolation(format!(
                    "operator '{}' applied to {}",
                    unary_symbol(*op),
                    other
                ))
                .at(*span)
                .into()),
            },
            Expr::Binary { op, lhs, rhs, span } => {
                let l = self.evaluate(lhs, ctx)?;
                match (op, &l) {
                    (BinOp::And, Value::Bool(false)) => return Ok(Value::Bool(false)),
                    (BinOp::Or, Value::Bool(true)) => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let r = self.evaluate(rhs, ctx)?;
                binary(*op, l, r, *span)
            }
            Expr::Call {
                callee,
                type_args,
                args,
                span,
            } => self.evaluate_call(callee, type_args, args, *span, ctx),
            Expr::Function(lit) => {
                let ty = TypeSpecifier::function(lit.signature.clone()).canonical(ctx.types())?;
                let TypeSpecifier::Function(signature) = ty else {
                    return Err(ErrorKind::InvariantViolation(
                        "function literal has a non-function type".into(),
                    )
                    .at(lit.span)
                    .into());
                };
                Ok(Value::Function(Rc::new(FunctionValue {
                    signature: *signature,
                    body: FunctionBody::Literal(lit.clone()),
                    closure: Some(ctx.capture()),
                })))
            }
        }
    }

    pub(super) fn member_value(&self, object: Value, member: &Ident) -> Checked<Value> {
        match object {
            Value::Record(record) => match record.fields.get(&member.text) {
                Some(symbol) => Ok(symbol.value().clone()),
                None => Err(ErrorKind::InvariantViolation(format!(
                    "record {} has no member '{}'",
                    record.ty, member.text
                ))
                .at(member.span)
                .into()),
            },
            other => Err(ErrorKind::InvariantViolation(format!(
                "member '{}' read from {}",
                member.text, other
            ))
            .at(member.span)
            .into()),
        }
    }

    pub(super) fn index_value(&self, index: &Expr, ctx: &Rc<ExecutionContext>) -> Checked<i64> {
        match self.evaluate(index, ctx)? {
            Value::Int(i) => Ok(i),
            Value::Bool(b) => Ok(i64::from(b)),
            other => Err(ErrorKind::InvariantViolation(format!("array index {}", other))
                .at(index.span())
                .into()),
        }
    }
}

pub(super) fn element_at(array: Value, position: i64, span: Span) -> Checked<Value> {
    match array {
        Value::Array(mut array) => {
            let length = array.items.len();
            match usize::try_from(position) {
                Ok(i) if i < length => Ok(array.items.swap_remove(i)),
                _ => Err(ErrorKind::ArrayIndexOutOfBounds {
                    index: position,
                    length,
                }
                .at(span)
                .into()),
            }
        }
        other => Err(ErrorKind::InvariantViolation(format!("indexing into {}", other))
            .at(span)
            .into()),
    }
}

/// Unknown name. A name whose declaration already failed is reported there,
/// so reads of it add nothing.
pub(super) fn undeclared(id: &Ident, ctx: &ExecutionContext) -> ErrorList {
    if ctx.declaration_failed(&id.text) {
        return ErrorList::new();
    }
    ErrorKind::UndeclaredVariable {
        name: id.text.clone(),
    }
    .at(id.span)
    .into()
}

fn literal_type(lit: &Lit) -> TypeSpecifier {
    match lit {
        Lit::Bool(_) => TypeSpecifier::boolean(),
        Lit::Int(_) => TypeSpecifier::int(),
        Lit::Double(_) => TypeSpecifier::double(),
        Lit::Str(_) => TypeSpecifier::string(),
        Lit::Nil => TypeSpecifier::nil(),
    }
}

fn literal_value(lit: &Lit) -> Value {
    match lit {
        Lit::Bool(b) => Value::Bool(*b),
        Lit::Int(i) => Value::Int(*i),
        Lit::Double(d) => Value::Double(*d),
        Lit::Str(s) => Value::Str(s.clone()),
        Lit::Nil => Value::Nil,
    }
}

fn unary_symbol(op: UnOp) -> &'static str {
    match op {
        UnOp::Not => "!",
        UnOp::Neg => "-",
    }
}

fn primitive_of(ty: &TypeSpecifier, types: &Rc<TypeTable>) -> Checked<Option<PrimitiveKind>> {
    Ok(ty.resolve(types, AliasResolution::Resolve)?.as_primitive())
}

fn wider(a: PrimitiveKind, b: PrimitiveKind) -> PrimitiveKind {
    if a.rank() >= b.rank() {
        a
    } else {
        b
    }
}

fn binary_type(
    op: BinOp,
    l: &TypeSpecifier,
    r: &TypeSpecifier,
    types: &Rc<TypeTable>,
    span: Span,
) -> Checked<TypeSpecifier> {
    let lk = primitive_of(l, types)?;
    let rk = primitive_of(r, types)?;
    let numeric = |k: Option<PrimitiveKind>| k.is_some_and(PrimitiveKind::is_numeric);
    let result = match op {
        BinOp::And | BinOp::Or => {
            (lk == Some(PrimitiveKind::Boolean) && rk == Some(PrimitiveKind::Boolean)).then(TypeSpecifier::boolean)
        }
        BinOp::Eq | BinOp::Ne => {
            let comparable = l.is_assignable_to(r, types)?.is_assignable()
                || r.is_assignable_to(l, types)?.is_assignable();
            comparable.then(TypeSpecifier::boolean)
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordered = (numeric(lk) && numeric(rk)) || (lk == Some(PrimitiveKind::String) && rk == Some(PrimitiveKind::String));
            ordered.then(TypeSpecifier::boolean)
        }
        // Any primitive concatenates onto a string.
        BinOp::Add if lk == Some(PrimitiveKind::String) || rk == Some(PrimitiveKind::String) => {
            (lk.is_some() && rk.is_some()).then(TypeSpecifier::string)
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => match (lk, rk) {
            (Some(a), Some(b)) if a.is_numeric() && b.is_numeric() => {
                Some(TypeSpecifier::primitive(wider(a, b)))
            }
            _ => None,
        },
        BinOp::Mod => (lk == Some(PrimitiveKind::Int) && rk == Some(PrimitiveKind::Int)).then(TypeSpecifier::int),
    };
    result.map(|ty| ty.at(span)).ok_or_else(|| {
        ErrorKind::OperatorTypeError {
            op: op.symbol().to_string(),
            operands: format!("{} and {}", l, r),
        }
        .at(span)
        .into()
    })
}

/// Equality that looks through a sum holding a plain value; an empty Maybe
/// equals `nil`.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Sum(s), Value::Nil) | (Value::Nil, Value::Sum(s)) => s.is_empty(),
        (Value::Sum(s), other) | (other, Value::Sum(s)) if !matches!(other, Value::Sum(_)) => s
            .value
            .as_deref()
            .is_some_and(|inner| loosely_equal(inner, other)),
        _ => a == b,
    }
}

fn binary(op: BinOp, l: Value, r: Value, span: Span) -> Checked<Value> {
    let value = match op {
        // The left operand did not short-circuit, so the right one decides.
        BinOp::And | BinOp::Or => match r {
            Value::Bool(b) => Value::Bool(b),
            other => return Err(mismatch(op, &l, &other, span)),
        },
        BinOp::Eq => Value::Bool(loosely_equal(&l, &r)),
        BinOp::Ne => Value::Bool(!loosely_equal(&l, &r)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = match (&l, &r) {
                (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
                (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
                _ => match (l.as_double(), r.as_double()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => return Err(mismatch(op, &l, &r, span)),
                },
            };
            Value::Bool(match op {
                BinOp::Lt => ordering == Some(Ordering::Less),
                BinOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                BinOp::Gt => ordering == Some(Ordering::Greater),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            })
        }
        BinOp::Add if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) => {
            Value::Str(format!("{}{}", l, r))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            arithmetic(op, &l, &r, span)?
        }
    };
    Ok(value)
}

fn arithmetic(op: BinOp, l: &Value, r: &Value, span: Span) -> Checked<Value> {
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        let (a, b) = (*a, *b);
        let v = match op {
            BinOp::Add => a.wrapping_add(b),
            BinOp::Sub => a.wrapping_sub(b),
            BinOp::Mul => a.wrapping_mul(b),
            BinOp::Div | BinOp::Mod if b == 0 => {
                return Err(ErrorKind::DivisionByZero.at(span).into())
            }
            BinOp::Div => a.wrapping_div(b),
            BinOp::Mod => a.wrapping_rem(b),
            _ => return Err(mismatch(op, l, r, span)),
        };
        return Ok(Value::Int(v));
    }
    let is_bool = |v: &Value| matches!(v, Value::Bool(_));
    match (l.as_double(), r.as_double()) {
        (Some(a), Some(b)) if !is_bool(l) && !is_bool(r) => {
            let v = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div if b == 0.0 => return Err(ErrorKind::DivisionByZero.at(span).into()),
                BinOp::Div => a / b,
                _ => return Err(mismatch(op, l, r, span)),
            };
            Ok(Value::Double(v))
        }
        _ => Err(mismatch(op, l, r, span)),
    }
}

/// Operand kinds the static check should have rejected.
fn mismatch(op: BinOp, l: &Value, r: &Value, span: Span) -> ErrorList {
    ErrorKind::InvariantViolation(format!(
        "operator '{}' applied to {} and {}",
        op.symbol(),
        l,
        r
    ))
    .at(span)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_maybe_equals_nil() {
        let ty = TypeSpecifier::maybe(TypeSpecifier::int());
        let empty = Value::Sum(SumValue::empty(ty.clone()));
        assert!(loosely_equal(&empty, &Value::Nil));
        let full = Value::some(ty, TypeSpecifier::int(), Value::Int(4));
        assert!(!loosely_equal(&full, &Value::Nil));
        assert!(loosely_equal(&full, &Value::Int(4)));
        assert!(loosely_equal(&Value::Int(4), &full));
    }

    #[test]
    fn integer_arithmetic_wraps_and_checks_zero() {
        let span = Span::new(1, 1);
        let v = binary(BinOp::Add, Value::Int(i64::MAX), Value::Int(1), span).unwrap();
        assert_eq!(v, Value::Int(i64::MIN));
        let err = binary(BinOp::Mod, Value::Int(3), Value::Int(0), span).unwrap_err();
        assert_eq!(err.codes(), vec!["DIVISION_BY_ZERO"]);
        let err = binary(BinOp::Div, Value::Double(3.0), Value::Int(0), span).unwrap_err();
        assert_eq!(err.codes(), vec!["DIVISION_BY_ZERO"]);
    }

    #[test]
    fn mixed_numbers_widen() {
        let span = Span::new(1, 1);
        let v = binary(BinOp::Mul, Value::Int(2), Value::Double(1.5), span).unwrap();
        assert_eq!(v, Value::Double(3.0));
        let v = binary(BinOp::Le, Value::Int(2), Value::Double(2.0), span).unwrap();
        assert_eq!(v, Value::Bool(true));
    }

    #[test]
    fn string_concatenation_formats_the_other_side() {
        let span = Span::new(1, 1);
        let v = binary(BinOp::Add, Value::Str("n=".into()), Value::Int(3), span).unwrap();
        assert_eq!(v, Value::Str("n=3".into()));
    }

    #[test]
    fn operator_typing() {
        let types = TypeTable::root();
        let span = Span::new(1, 1);
        let ty = binary_type(BinOp::Add, &TypeSpecifier::int(), &TypeSpecifier::double(), &types, span)
            .unwrap();
        assert_eq!(ty, TypeSpecifier::double());
        let err = binary_type(BinOp::Mod, &TypeSpecifier::int(), &TypeSpecifier::double(), &types, span)
            .unwrap_err();
        assert_eq!(err.codes(), vec!["OPERATOR_TYPE_ERROR"]);
        let ty = binary_type(BinOp::Eq, &TypeSpecifier::int(), &TypeSpecifier::double(), &types, span)
            .unwrap();
        assert_eq!(ty, TypeSpecifier::boolean());
        let err = binary_type(BinOp::And, &TypeSpecifier::int(), &TypeSpecifier::boolean(), &types, span)
            .unwrap_err();
        assert_eq!(err.codes(), vec!["OPERATOR_TYPE_ERROR"]);
    }
}
