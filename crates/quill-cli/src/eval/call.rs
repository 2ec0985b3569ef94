//! Calls: signature checks, generic inference and invocation.

use super::expr::expect_fits;
use super::stmt::Coverage;
use super::{settle, Interpreter};
use quill_ast::ast::{Expr, FunctionLiteral, Ident};
use quill_ast::span::Span;
use quill_ast::{FunctionSignature, TypeSpecifier};
use quill_types::prelude::*;
use quill_types::specifier::coerce;
use quill_types::table::{bind_type_arguments, declare_type_parameters};
use std::rc::Rc;
use tracing::debug;

impl Interpreter {
    pub(super) fn check_call(
        &self,
        callee: &Expr,
        type_args: &[TypeSpecifier],
        args: &[Expr],
        span: Span,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<TypeSpecifier> {
        let types = ctx.types();
        let signature = self
            .check_expr(callee, ctx)
            .and_then(|ty| function_signature(&ty, types, callee.span()));
        let (mut errors, signature) = ErrorList::new().absorb(signature);
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            let (next, ty) = errors.absorb(self.check_expr(arg, ctx));
            errors = next;
            arg_types.push(ty);
        }
        let Some(signature) = signature else {
            return Err(errors);
        };
        if args.len() != signature.params.len() {
            return Err(errors.with(
                ErrorKind::FunctionArgumentCount {
                    expected: signature.params.len(),
                    found: args.len(),
                }
                .at(span),
            ));
        }

        let bound = if type_args.is_empty() && signature.is_generic() {
            let Some(actual) = arg_types.iter().cloned().collect::<Option<Vec<_>>>() else {
                return Err(errors);
            };
            infer_type_arguments(&signature, &actual, span)
        } else {
            type_args
                .iter()
                .map(|arg| arg.canonical(types))
                .collect::<Checked<Vec<_>>>()
        };
        let (errors, bound) = errors.absorb(bound);
        let Some(bound) = bound else {
            return Err(errors);
        };
        let scope =
            match bind_type_arguments(&signature.type_param_names(), &bound, types, types, span) {
                Ok(scope) => scope,
                Err(e) => return Err(errors.concat(e)),
            };

        let mut errors = errors;
        for (index, (param, found)) in signature.params.iter().zip(&arg_types).enumerate() {
            let Some(found) = found else { continue };
            let (next, expected) = errors.absorb(param.ty.canonical(&scope));
            errors = next;
            let Some(expected) = expected else { continue };
            let fits = expect_fits(found, types, &expected, types, args[index].span(), |expected, found| {
                ErrorKind::FunctionArgumentType {
                    index: index + 1,
                    expected,
                    found,
                }
            });
            errors = errors.absorb(fits).0;
        }
        let (errors, ret) = errors.absorb(signature.ret.canonical(&scope));
        settle(errors, ret.map(|ret| ret.at(span)))
    }

    /// Check a function body against its signature in a probe scope linked to
    /// `ctx`, and return the function's canonical type.
    pub(super) fn check_function_literal(
        &self,
        lit: &FunctionLiteral,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<TypeSpecifier> {
        let types = ctx.types();
        let ty = TypeSpecifier::function(lit.signature.clone())
            .at(lit.span)
            .canonical(types)?;
        let TypeSpecifier::Function(signature) = &ty else {
            return Err(ErrorKind::InvariantViolation(format!(
                "function literal canonicalized to {}",
                ty
            ))
            .at(lit.span)
            .into());
        };
        let scope = declare_type_parameters(&signature.type_params, types)?;
        let probe = ExecutionContext::detached(TypeTable::child(&scope), LifeTime::Persistent);
        let mut errors = ErrorList::new();
        for param in &signature.params {
            let value = param.ty.default_value(&scope).unwrap_or(Value::Nil);
            let symbol = Symbol::new(param.ty.clone(), value);
            if probe.insert_symbol(&param.name.text, symbol) == InsertResult::SymbolExists {
                errors = errors.with(
                    ErrorKind::PreviousDeclaration {
                        name: param.name.text.clone(),
                    }
                    .at(param.name.span),
                );
            }
        }
        if let Err(kind) = probe.link_to_parent(ContextLink::Strong(ctx.clone())) {
            return Err(errors.with(kind.at(lit.span)));
        }

        let body = self.prepare_in(&lit.body.statements, &probe, Some(&signature.ret));
        let (mut errors, body) = errors.absorb(body);
        probe.clear();
        if let Some((_, coverage)) = body {
            let returns_nil = signature
                .ret
                .resolve(probe.types(), AliasResolution::Resolve)
                .is_ok_and(|r| matches!(*r.definition, TypeDefinition::Nil));
            if coverage != Coverage::Full && !returns_nil {
                errors = errors.with(
                    ErrorKind::FunctionReturnMismatch {
                        expected: signature.ret.to_string(),
                    }
                    .at(lit.span),
                );
            }
        }
        errors.into_result(ty)
    }

    pub(super) fn evaluate_call(
        &self,
        callee: &Expr,
        type_args: &[TypeSpecifier],
        args: &[Expr],
        span: Span,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<Value> {
        let function = match self.evaluate(callee, ctx)? {
            Value::Function(function) => function,
            other => {
                return Err(ErrorKind::InvariantViolation(format!("call of {}", other))
                    .at(callee.span())
                    .into());
            }
        };
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg, ctx)?);
        }
        let types = ctx.types();
        // Runtime inference reads the arguments' dynamic types.
        let type_args = if type_args.is_empty() && function.signature.is_generic() {
            let actual: Vec<TypeSpecifier> = values.iter().map(Value::type_specifier).collect();
            infer_type_arguments(&function.signature, &actual, span)?
        } else {
            type_args
                .iter()
                .map(|arg| arg.canonical(types))
                .collect::<Checked<Vec<_>>>()?
        };
        self.invoke(&function, &type_args, values, types, span)
    }

    /// Call `function`. `type_args` are written in `caller_types`.
    pub fn invoke(
        &self,
        function: &FunctionValue,
        type_args: &[TypeSpecifier],
        args: Vec<Value>,
        caller_types: &Rc<TypeTable>,
        span: Span,
    ) -> Checked<Value> {
        let _guard = self.enter_call(span)?;
        let signature = &function.signature;
        if args.len() != signature.params.len() {
            return Err(ErrorKind::FunctionArgumentCount {
                expected: signature.params.len(),
                found: args.len(),
            }
            .at(span)
            .into());
        }
        match &function.body {
            FunctionBody::Native { name, func } => (**func)(&args).map_err(|message| {
                ErrorKind::NativeFunction {
                    name: name.clone(),
                    message,
                }
                .at(span)
                .into()
            }),
            FunctionBody::Default { ret, table } => {
                let table = table
                    .upgrade()
                    .ok_or_else(|| ErrorList::from(ErrorKind::ClosureScopeReleased.at(span)))?;
                let scope = bind_type_arguments(
                    &signature.type_param_names(),
                    type_args,
                    caller_types,
                    &table,
                    span,
                )?;
                ret.default_value(&scope)
            }
            FunctionBody::Literal(lit) => {
                self.invoke_literal(function, lit, type_args, args, caller_types, span)
            }
        }
    }

    /// The body is prepared again on every call, against the type arguments
    /// of this call, then run in a fresh frame.
    fn invoke_literal(
        &self,
        function: &FunctionValue,
        lit: &FunctionLiteral,
        type_args: &[TypeSpecifier],
        args: Vec<Value>,
        caller_types: &Rc<TypeTable>,
        span: Span,
    ) -> Checked<Value> {
        let closure = function
            .closure
            .as_ref()
            .and_then(ContextLink::upgrade)
            .ok_or_else(|| ErrorList::from(ErrorKind::ClosureScopeReleased.at(span)))?;
        let signature = &function.signature;
        let bindings = bind_type_arguments(
            &signature.type_param_names(),
            type_args,
            caller_types,
            closure.types(),
            span,
        )?;
        let scope = TypeTable::child(&bindings);

        let mut params = Vec::with_capacity(args.len());
        for (param, value) in signature.params.iter().zip(args) {
            let ty = param.ty.canonical(&scope)?;
            let value = coerce(value, &ty, &scope)?;
            params.push((&param.name, ty, value));
        }
        let ret = signature.ret.canonical(&scope)?;

        let probe = call_frame(&scope, &closure, &params, span)?;
        let prepared = self.prepare_in(&lit.body.statements, &probe, Some(&ret));
        probe.clear();
        let (statements, _) = prepared?;

        let frame = call_frame(&scope, &closure, &params, span)?;
        self.execute_in(&statements, &frame)?;
        let value = frame.take_return_value().unwrap_or(Value::Nil);
        let value = coerce(value, &ret, &scope)?;
        debug!(depth = self.depth.get(), returns = %ret, "function returned");
        Ok(value)
    }
}

/// Scope of one invocation: the parameters, linked to the closure's scope.
fn call_frame(
    types: &Rc<TypeTable>,
    closure: &Rc<ExecutionContext>,
    params: &[(&Ident, TypeSpecifier, Value)],
    span: Span,
) -> Checked<Rc<ExecutionContext>> {
    let frame = ExecutionContext::detached(types.clone(), LifeTime::Persistent);
    for (name, ty, value) in params {
        let symbol = Symbol::new(ty.clone(), value.clone());
        if frame.insert_symbol(&name.text, symbol) == InsertResult::SymbolExists {
            return Err(ErrorKind::PreviousDeclaration {
                name: name.text.clone(),
            }
            .at(name.span)
            .into());
        }
    }
    frame
        .link_to_parent(ContextLink::Strong(closure.clone()))
        .map_err(|kind| ErrorList::from(kind.at(span)))?;
    Ok(frame)
}

fn function_signature(
    callee_ty: &TypeSpecifier,
    types: &Rc<TypeTable>,
    span: Span,
) -> Checked<FunctionSignature> {
    let resolved = callee_ty.resolve(types, AliasResolution::Resolve)?;
    match resolved.specifier {
        TypeSpecifier::Function(signature) => Ok(*signature),
        _ => Err(ErrorKind::NotAFunction {
            found: callee_ty.to_string(),
        }
        .at(span)
        .into()),
    }
}

/// Bind each type parameter of `signature` to the first argument type found
/// in its position. Parameters that appear in no argument are reported.
fn infer_type_arguments(
    signature: &FunctionSignature,
    actual: &[TypeSpecifier],
    span: Span,
) -> Checked<Vec<TypeSpecifier>> {
    let names = signature.type_param_names();
    let mut bound: Vec<Option<TypeSpecifier>> = vec![None; names.len()];
    for (param, actual) in signature.params.iter().zip(actual) {
        unify(&param.ty, actual, &names, &mut bound);
    }
    names
        .iter()
        .zip(bound)
        .map(|(name, ty)| {
            ty.ok_or_else(|| {
                ErrorKind::TooFewArguments {
                    parameter: name.clone(),
                }
                .at(span)
                .into()
            })
        })
        .collect()
}

fn unify(
    pattern: &TypeSpecifier,
    actual: &TypeSpecifier,
    names: &[String],
    bound: &mut [Option<TypeSpecifier>],
) {
    if let Some(i) = names.iter().position(|name| pattern.is_bare_name(name)) {
        if bound[i].is_none() {
            bound[i] = Some(actual.clone());
        }
        return;
    }
    match (pattern, actual) {
        (
            TypeSpecifier::Array { element: p, .. },
            TypeSpecifier::Array { element: a, .. },
        ) => unify(p, a, names, bound),
        (TypeSpecifier::Maybe { base: p, .. }, TypeSpecifier::Maybe { base: a, .. }) => {
            unify(p, a, names, bound)
        }
        // A plain value passed for `T?` binds `T`; `nil` says nothing.
        (TypeSpecifier::Maybe { base: p, .. }, a) if !a.is_nil() => unify(p, a, names, bound),
        (TypeSpecifier::Function(p), TypeSpecifier::Function(a)) => {
            for (pp, ap) in p.params.iter().zip(&a.params) {
                unify(&pp.ty, &ap.ty, names, bound);
            }
            unify(&p.ret, &a.ret, names, bound);
        }
        _ => {
            if let (Some(p), Some(a)) = (pattern.as_named(), actual.as_named()) {
                if p.name == a.name && p.type_args.len() == a.type_args.len() {
                    for (pa, aa) in p.type_args.iter().zip(&a.type_args) {
                        unify(pa, aa, names, bound);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_ast::{ArrayMode, NamedType, Param};

    fn ident(text: &str) -> Ident {
        Ident::new(text, Span::default())
    }

    fn param(name: &str, ty: TypeSpecifier) -> Param {
        Param {
            name: ident(name),
            ty,
        }
    }

    #[test]
    fn infers_through_arrays_and_maybes() {
        let signature = FunctionSignature::new(
            vec![
                param("xs", TypeSpecifier::array(TypeSpecifier::named("T"), ArrayMode::Dynamic)),
                param("fallback", TypeSpecifier::maybe(TypeSpecifier::named("U"))),
            ],
            TypeSpecifier::named("T"),
        )
        .generic(vec![ident("T"), ident("U")]);
        let actual = vec![
            TypeSpecifier::array(TypeSpecifier::string(), ArrayMode::Dynamic),
            TypeSpecifier::int(),
        ];
        let bound = infer_type_arguments(&signature, &actual, Span::default()).unwrap();
        assert_eq!(bound, vec![TypeSpecifier::string(), TypeSpecifier::int()]);
    }

    #[test]
    fn infers_from_named_type_arguments() {
        let boxed = |arg| {
            TypeSpecifier::Named(NamedType::new("Box", Span::default()).with_args(vec![arg]))
        };
        let signature = FunctionSignature::new(
            vec![param("b", boxed(TypeSpecifier::named("T")))],
            TypeSpecifier::named("T"),
        )
        .generic(vec![ident("T")]);
        let bound =
            infer_type_arguments(&signature, &[boxed(TypeSpecifier::double())], Span::default())
                .unwrap();
        assert_eq!(bound, vec![TypeSpecifier::double()]);
    }

    #[test]
    fn unused_type_parameter_is_reported() {
        let signature = FunctionSignature::new(
            vec![param("m", TypeSpecifier::maybe(TypeSpecifier::named("T")))],
            TypeSpecifier::nil(),
        )
        .generic(vec![ident("T")]);
        let err = infer_type_arguments(&signature, &[TypeSpecifier::nil()], Span::default())
            .unwrap_err();
        assert_eq!(err.codes(), vec!["TOO_FEW_ARGUMENTS"]);
    }
}
