//! Statements: preparation (declarations, checks, return coverage) and
//! execution of prepared blocks.

use super::declare::{declared_type_name, register_type_declarations};
use super::expr::{expect_fits, undeclared};
use super::{settle, Interpreter};
use quill_ast::ast::{
    AssignTarget, Declaration, Expr, FunctionDecl, Ident, MatchArm, Stmt,
};
use quill_ast::span::Span;
use quill_ast::{ArrayMode, FunctionSignature, TypeSpecifier};
use quill_types::prelude::*;
use quill_types::specifier::coerce;
use std::rc::Rc;

/// Whether every control path through a statement executes a `return`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coverage {
    None,
    Partial,
    Full,
}

impl Coverage {
    /// Coverage of `self` followed by `next` in one block. Statements after
    /// a full return are unreachable but not an error.
    pub fn then(self, next: Coverage) -> Coverage {
        match (self, next) {
            (Coverage::Full, _) | (_, Coverage::Full) => Coverage::Full,
            (Coverage::Partial, _) | (_, Coverage::Partial) => Coverage::Partial,
            _ => Coverage::None,
        }
    }

    /// Coverage of a branch that takes exactly one of two paths.
    pub fn either(self, other: Coverage) -> Coverage {
        match (self, other) {
            (Coverage::Full, Coverage::Full) => Coverage::Full,
            (Coverage::None, Coverage::None) => Coverage::None,
            _ => Coverage::Partial,
        }
    }
}

/// A block that passed preparation, ready to execute any number of times.
#[derive(Debug)]
pub struct PreparedBlock<'a> {
    /// Types declared by the block; shared by each runtime scope of it.
    pub types: Rc<TypeTable>,
    pub statements: Vec<Prepared<'a>>,
    pub coverage: Coverage,
}

#[derive(Debug)]
pub enum Prepared<'a> {
    Declare {
        decl: &'a Declaration,
        ty: TypeSpecifier,
    },
    Assign {
        target: &'a AssignTarget,
        value: &'a Expr,
        ty: TypeSpecifier,
    },
    Expr(&'a Expr),
    Return {
        value: Option<&'a Expr>,
        ty: TypeSpecifier,
    },
    If {
        cond: &'a Expr,
        then_: PreparedBlock<'a>,
        else_: Option<PreparedBlock<'a>>,
    },
    While {
        cond: &'a Expr,
        body: PreparedBlock<'a>,
    },
    DoWhile {
        body: PreparedBlock<'a>,
        cond: &'a Expr,
    },
    For {
        types: Rc<TypeTable>,
        init: Option<Box<Prepared<'a>>>,
        cond: Option<&'a Expr>,
        update: Option<Box<Prepared<'a>>>,
        body: PreparedBlock<'a>,
    },
    Block(PreparedBlock<'a>),
    Match {
        subject: &'a Expr,
        arms: Vec<PreparedArm<'a>>,
        else_: Option<PreparedBlock<'a>>,
    },
    Function {
        decl: &'a FunctionDecl,
        signature: FunctionSignature,
    },
    /// Record, sum and alias declarations; they take effect while preparing.
    TypeDecl,
}

#[derive(Debug)]
pub struct PreparedArm<'a> {
    pub tag: String,
    pub binding: Option<(&'a Ident, TypeSpecifier)>,
    pub body: PreparedBlock<'a>,
}

impl Interpreter {
    /// Prepare `statements` directly in `ctx`.
    ///
    /// Type declarations of the whole sequence are registered first, so any
    /// statement may name a type declared after it. Errors of one statement
    /// do not stop its siblings from being prepared, except for defects.
    pub(crate) fn prepare_in<'a>(
        &self,
        statements: &'a [Stmt],
        ctx: &Rc<ExecutionContext>,
        ret: Option<&TypeSpecifier>,
    ) -> Checked<(Vec<Prepared<'a>>, Coverage)> {
        let (mut errors, fresh) = register_type_declarations(statements, ctx.types());
        let mut prepared = Vec::with_capacity(statements.len());
        let mut coverage = Coverage::None;
        for (stmt, fresh) in statements.iter().zip(fresh) {
            if !fresh {
                continue;
            }
            match self.prepare_stmt(stmt, ctx, ret) {
                Ok((statement, c)) => {
                    coverage = coverage.then(c);
                    prepared.push(statement);
                }
                Err(e) => {
                    let defect = e.has_defect();
                    errors = errors.concat(e);
                    if defect {
                        break;
                    }
                }
            }
        }
        errors.into_result((prepared, coverage))
    }

    /// Prepare `statements` in a fresh scope nested in `parent`.
    pub(crate) fn prepare_block<'a>(
        &self,
        statements: &'a [Stmt],
        parent: &Rc<ExecutionContext>,
        ret: Option<&TypeSpecifier>,
    ) -> Checked<PreparedBlock<'a>> {
        let probe = ExecutionContext::child_with_types(
            parent,
            TypeTable::child(parent.types()),
            LifeTime::Temporary,
        );
        let (statements, coverage) = self.prepare_in(statements, &probe, ret)?;
        Ok(PreparedBlock {
            types: probe.types().clone(),
            statements,
            coverage,
        })
    }

    /// Bodies of `if` and loops get their own scope even when they are a
    /// single statement.
    fn prepare_body<'a>(
        &self,
        body: &'a Stmt,
        parent: &Rc<ExecutionContext>,
        ret: Option<&TypeSpecifier>,
    ) -> Checked<PreparedBlock<'a>> {
        match body {
            Stmt::Block(block) => self.prepare_block(&block.statements, parent, ret),
            other => self.prepare_block(std::slice::from_ref(other), parent, ret),
        }
    }

    fn prepare_stmt<'a>(
        &self,
        stmt: &'a Stmt,
        ctx: &Rc<ExecutionContext>,
        ret: Option<&TypeSpecifier>,
    ) -> Checked<(Prepared<'a>, Coverage)> {
        match stmt {
            Stmt::Declare(decl) => {
                let ty = self.prepare_declaration(decl, ctx)?;
                Ok((Prepared::Declare { decl, ty }, Coverage::None))
            }
            Stmt::Assign { target, value, .. } => {
                let (errors, ty) = ErrorList::new().absorb(self.target_type(target, ctx));
                let (mut errors, found) = errors.absorb(self.check_expr(value, ctx));
                if let (Some(ty), Some(found)) = (&ty, &found) {
                    let types = ctx.types();
                    let fits = expect_fits(found, types, ty, types, value.span(), |expected, found| {
                        ErrorKind::AssignmentTypeError {
                            target: target_path(target),
                            expected,
                            found,
                        }
                    });
                    errors = errors.absorb(fits).0;
                }
                let ty = settle(errors, ty)?;
                Ok((Prepared::Assign { target, value, ty }, Coverage::None))
            }
            Stmt::Expr { expr, .. } => {
                self.check_expr(expr, ctx)?;
                Ok((Prepared::Expr(expr), Coverage::None))
            }
            Stmt::Return { value, span } => {
                let Some(ret) = ret else {
                    return Err(ErrorKind::ReturnOutsideFunction.at(*span).into());
                };
                let found = match value {
                    Some(value) => self.check_expr(value, ctx)?,
                    None => TypeSpecifier::nil().at(*span),
                };
                let types = ctx.types();
                expect_fits(&found, types, ret, types, *span, |expected, found| {
                    ErrorKind::ReturnTypeMismatch { expected, found }
                })?;
                let statement = Prepared::Return {
                    value: value.as_ref(),
                    ty: ret.clone(),
                };
                Ok((statement, Coverage::Full))
            }
            Stmt::If {
                cond, then_, else_, ..
            } => {
                let (errors, _) = ErrorList::new().absorb(self.expect_condition(cond, ctx));
                let (errors, then_) = errors.absorb(self.prepare_body(then_, ctx, ret));
                let else_ = else_
                    .as_deref()
                    .map(|body| self.prepare_body(body, ctx, ret))
                    .transpose();
                let (errors, else_) = errors.absorb(else_);
                let (then_, else_) = settle(errors, then_.zip(else_))?;
                let coverage = then_
                    .coverage
                    .either(else_.as_ref().map_or(Coverage::None, |b| b.coverage));
                Ok((Prepared::If { cond, then_, else_ }, coverage))
            }
            Stmt::While { cond, body, .. } => {
                let (errors, _) = ErrorList::new().absorb(self.expect_condition(cond, ctx));
                let (errors, body) = errors.absorb(self.prepare_body(body, ctx, ret));
                let body = settle(errors, body)?;
                Ok((Prepared::While { cond, body }, Coverage::None))
            }
            Stmt::DoWhile { body, cond, .. } => {
                let (errors, body) = ErrorList::new().absorb(self.prepare_body(body, ctx, ret));
                let (errors, _) = errors.absorb(self.expect_condition(cond, ctx));
                let body = settle(errors, body)?;
                let coverage = body.coverage;
                Ok((Prepared::DoWhile { body, cond }, coverage))
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
                span,
            } => {
                let scope = ExecutionContext::child_with_types(
                    ctx,
                    TypeTable::child(ctx.types()),
                    LifeTime::Temporary,
                );
                let mut errors = ErrorList::new();
                let mut prepared_init = None;
                if let Some(init) = init {
                    if declared_type_name(init).is_some() {
                        errors = errors.with(
                            ErrorKind::Syntax {
                                message: "a type cannot be declared in a for-loop initializer"
                                    .into(),
                            }
                            .at(*span),
                        );
                    } else {
                        let (next, init) = errors.absorb(self.prepare_stmt(init, &scope, ret));
                        errors = next;
                        prepared_init = init.map(|(p, _)| Box::new(p));
                    }
                }
                if let Some(cond) = cond {
                    errors = errors.absorb(self.expect_condition(cond, &scope)).0;
                }
                let (errors, body) = errors.absorb(self.prepare_body(body, &scope, ret));
                let update = update
                    .as_deref()
                    .map(|u| self.prepare_stmt(u, &scope, ret).map(|(p, _)| Box::new(p)))
                    .transpose();
                let (errors, update) = errors.absorb(update);
                let (body, update) = settle(errors, body.zip(update))?;
                let statement = Prepared::For {
                    types: scope.types().clone(),
                    init: prepared_init,
                    cond: cond.as_ref(),
                    update,
                    body,
                };
                Ok((statement, Coverage::None))
            }
            Stmt::Block(block) => {
                let block = self.prepare_block(&block.statements, ctx, ret)?;
                let coverage = block.coverage;
                Ok((Prepared::Block(block), coverage))
            }
            Stmt::Match {
                subject,
                arms,
                else_,
                span,
            } => self.prepare_match(subject, arms, else_.as_ref(), *span, ctx, ret),
            Stmt::Record(decl) => {
                self.declare_record(decl, ctx)?;
                Ok((Prepared::TypeDecl, Coverage::None))
            }
            Stmt::Sum(decl) => {
                self.declare_sum(decl, ctx)?;
                Ok((Prepared::TypeDecl, Coverage::None))
            }
            Stmt::Alias(decl) => {
                self.declare_alias(decl, ctx)?;
                Ok((Prepared::TypeDecl, Coverage::None))
            }
            Stmt::Function(decl) => {
                let signature = self.prepare_function_decl(decl, ctx)?;
                Ok((Prepared::Function { decl, signature }, Coverage::None))
            }
        }
    }

    /// Resolve the declared or inferred type, check the initializer against
    /// it and declare the name with its default value.
    fn prepare_declaration(
        &self,
        decl: &Declaration,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<TypeSpecifier> {
        let name = &decl.name;
        if ctx.has_local_declaration(&name.text) {
            return Err(ErrorKind::PreviousDeclaration {
                name: name.text.clone(),
            }
            .at(name.span)
            .into());
        }
        let types = ctx.types();
        let mut errors = ErrorList::new();
        let ty = match (&decl.ty, &decl.init) {
            (Some(ty), init) => {
                let (next, declared) = errors.absorb(ty.canonical(types));
                errors = next;
                if let Some(init) = init {
                    let (next, found) = errors.absorb(self.check_expr(init, ctx));
                    errors = next;
                    if let (Some(declared), Some(found)) = (&declared, &found) {
                        let fits =
                            expect_fits(found, types, declared, types, init.span(), |expected, found| {
                                ErrorKind::InvalidInitializerType {
                                    name: name.text.clone(),
                                    expected,
                                    found,
                                }
                            });
                        errors = errors.absorb(fits).0;
                    }
                }
                declared
            }
            (None, Some(init)) => {
                let (next, found) = errors.absorb(self.check_expr(init, ctx));
                errors = next;
                found
            }
            (None, None) => {
                errors = errors.with(
                    ErrorKind::Syntax {
                        message: format!(
                            "declaration of '{}' has neither a type nor an initializer",
                            name.text
                        ),
                    }
                    .at(decl.span),
                );
                None
            }
        };
        let Some(ty) = ty else {
            ctx.mark_failed_declaration(&name.text);
            return Err(errors);
        };
        // Later statements see the name even when its initializer is wrong.
        let (errors, value) = errors.absorb(ty.default_value(types));
        ctx.insert_symbol(&name.text, Symbol::new(ty.clone(), value.unwrap_or(Value::Nil)));
        errors.into_result(ty)
    }

    fn prepare_match<'a>(
        &self,
        subject: &'a Expr,
        arms: &'a [MatchArm],
        else_: Option<&'a quill_ast::ast::Block>,
        span: Span,
        ctx: &Rc<ExecutionContext>,
        ret: Option<&TypeSpecifier>,
    ) -> Checked<(Prepared<'a>, Coverage)> {
        let subject_ty = self.check_expr(subject, ctx)?;
        let resolved = subject_ty.resolve(ctx.types(), AliasResolution::Resolve)?;
        let Some(variants) = resolved.variants() else {
            return Err(ErrorKind::InvalidMatchSubject {
                found: subject_ty.to_string(),
            }
            .at(subject.span())
            .into());
        };

        let mut errors = ErrorList::new();
        let mut handled: Vec<&str> = Vec::new();
        let mut prepared_arms = Vec::with_capacity(arms.len());
        let mut coverage: Option<Coverage> = None;
        for arm in arms {
            let Some((tag, variant_ty)) = variants.iter().find(|(name, _)| *name == arm.variant.text)
            else {
                errors = errors.with(
                    ErrorKind::UnknownVariant {
                        ty: resolved.specifier.to_string(),
                        variant: arm.variant.text.clone(),
                    }
                    .at(arm.variant.span),
                );
                continue;
            };
            if handled.contains(&tag.as_str()) {
                errors = errors.with(
                    ErrorKind::PreviousDeclaration { name: tag.clone() }.at(arm.variant.span),
                );
                continue;
            }
            handled.push(tag);

            let scope = ExecutionContext::child_with_types(
                ctx,
                TypeTable::child(ctx.types()),
                LifeTime::Temporary,
            );
            let mut binding = None;
            if let Some(id) = &arm.binding {
                let (next, ty) = errors.absorb(variant_ty.canonical(&resolved.table));
                errors = next;
                let Some(ty) = ty else { continue };
                let value = ty.default_value(scope.types()).unwrap_or(Value::Nil);
                scope.insert_symbol(&id.text, Symbol::new(ty.clone(), value));
                binding = Some((id, ty));
            }
            let (next, body) = errors.absorb(self.prepare_in(&arm.body.statements, &scope, ret));
            errors = next;
            if let Some((statements, c)) = body {
                coverage = Some(coverage.map_or(c, |acc| acc.either(c)));
                prepared_arms.push(PreparedArm {
                    tag: tag.clone(),
                    binding,
                    body: PreparedBlock {
                        types: scope.types().clone(),
                        statements,
                        coverage: c,
                    },
                });
            }
        }

        let missing: Vec<&str> = variants
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| !handled.contains(name))
            .collect();
        let mut prepared_else = None;
        match else_ {
            Some(block) => {
                let (next, block) = errors.absorb(self.prepare_block(&block.statements, ctx, ret));
                errors = next;
                if let Some(block) = block {
                    // An `else` after every variant is handled never runs.
                    if !missing.is_empty() {
                        coverage = Some(coverage.map_or(block.coverage, |acc| acc.either(block.coverage)));
                    }
                    prepared_else = Some(block);
                }
            }
            None if !missing.is_empty() => {
                errors = errors.with(
                    ErrorKind::NonExhaustiveMatch {
                        ty: resolved.specifier.to_string(),
                        missing: missing.join(", "),
                    }
                    .at(span),
                );
            }
            None => {}
        }

        let statement = Prepared::Match {
            subject,
            arms: prepared_arms,
            else_: prepared_else,
        };
        errors.into_result((statement, coverage.unwrap_or(Coverage::None)))
    }

    /// Static type of an assignment target. Members of readonly records are
    /// not assignable.
    fn target_type(
        &self,
        target: &AssignTarget,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<TypeSpecifier> {
        match target {
            AssignTarget::Variable(id) => ctx
                .get_symbol(&id.text)
                .map(|symbol| symbol.ty().clone())
                .ok_or_else(|| undeclared(id, ctx)),
            AssignTarget::Member {
                object,
                member,
                span,
            } => {
                let object_ty = self.target_type(object, ctx)?;
                let resolved = object_ty.resolve(ctx.types(), AliasResolution::Resolve)?;
                if let Some(record) = resolved.as_record() {
                    if record.fields.contains_key(&member.text)
                        && record.modifier == quill_ast::ast::Modifier::Readonly
                    {
                        return Err(ErrorKind::ReadOnlyAssignment {
                            record: resolved.specifier.to_string(),
                            member: member.text.clone(),
                        }
                        .at(*span)
                        .into());
                    }
                }
                self.member_type(&object_ty, member, ctx.types())
            }
            AssignTarget::Index { array, index, span } => {
                let (errors, element) = ErrorList::new().absorb(
                    self.target_type(array, ctx)
                        .and_then(|ty| self.element_type(&ty, ctx.types(), *span)),
                );
                let (errors, _) = errors.absorb(self.expect_index(index, ctx));
                settle(errors, element)
            }
        }
    }

    fn expect_condition(&self, cond: &Expr, ctx: &Rc<ExecutionContext>) -> Checked<()> {
        let found = self.check_expr(cond, ctx)?;
        let types = ctx.types();
        expect_fits(&found, types, &TypeSpecifier::boolean(), types, cond.span(), |_, found| {
            ErrorKind::InvalidConditionalExpressionType { found }
        })
    }

    pub(crate) fn execute_in(
        &self,
        statements: &[Prepared<'_>],
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<()> {
        for statement in statements {
            self.execute_stmt(statement, ctx)?;
            if ctx.has_return() {
                break;
            }
        }
        Ok(())
    }

    /// Run `block` in a new scope under `parent`; a `return` inside it is
    /// handed to `parent`.
    pub(crate) fn execute_block(
        &self,
        block: &PreparedBlock<'_>,
        parent: &Rc<ExecutionContext>,
    ) -> Checked<()> {
        let scope =
            ExecutionContext::child_with_types(parent, block.types.clone(), LifeTime::Temporary);
        self.execute_in(&block.statements, &scope)?;
        if let Some(value) = scope.take_return_value() {
            parent.set_return_value(value);
        }
        Ok(())
    }

    fn execute_stmt(&self, statement: &Prepared<'_>, ctx: &Rc<ExecutionContext>) -> Checked<()> {
        match statement {
            Prepared::Declare { decl, ty } => {
                let value = match &decl.init {
                    Some(init) => coerce(self.evaluate(init, ctx)?, ty, ctx.types())?,
                    None => ty.default_value(ctx.types())?,
                };
                bind(ctx, &decl.name, Symbol::new(ty.clone(), value))
            }
            Prepared::Assign { target, value, ty } => {
                let value = coerce(self.evaluate(value, ctx)?, ty, ctx.types())?;
                self.store(target, value, ctx)
            }
            Prepared::Expr(expr) => {
                self.evaluate(expr, ctx)?;
                Ok(())
            }
            Prepared::Return { value, ty } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, ctx)?,
                    None => Value::Nil,
                };
                ctx.set_return_value(coerce(value, ty, ctx.types())?);
                Ok(())
            }
            Prepared::If { cond, then_, else_ } => {
                if self.condition(cond, ctx)? {
                    self.execute_block(then_, ctx)
                } else if let Some(else_) = else_ {
                    self.execute_block(else_, ctx)
                } else {
                    Ok(())
                }
            }
            Prepared::While { cond, body } => {
                while self.condition(cond, ctx)? {
                    self.execute_block(body, ctx)?;
                    if ctx.has_return() {
                        break;
                    }
                }
                Ok(())
            }
            Prepared::DoWhile { body, cond } => {
                loop {
                    self.execute_block(body, ctx)?;
                    if ctx.has_return() || !self.condition(cond, ctx)? {
                        break;
                    }
                }
                Ok(())
            }
            Prepared::For {
                types,
                init,
                cond,
                update,
                body,
            } => {
                let scope =
                    ExecutionContext::child_with_types(ctx, types.clone(), LifeTime::Temporary);
                if let Some(init) = init {
                    self.execute_stmt(init, &scope)?;
                }
                loop {
                    if let Some(cond) = cond {
                        if !self.condition(cond, &scope)? {
                            break;
                        }
                    }
                    self.execute_block(body, &scope)?;
                    if scope.has_return() {
                        break;
                    }
                    if let Some(update) = update {
                        self.execute_stmt(update, &scope)?;
                    }
                }
                if let Some(value) = scope.take_return_value() {
                    ctx.set_return_value(value);
                }
                Ok(())
            }
            Prepared::Block(block) => self.execute_block(block, ctx),
            Prepared::Match {
                subject,
                arms,
                else_,
            } => {
                let sum = match self.evaluate(subject, ctx)? {
                    Value::Sum(sum) => sum,
                    other => {
                        return Err(ErrorKind::InvariantViolation(format!(
                            "match subject evaluated to {}",
                            other
                        ))
                        .at(subject.span())
                        .into());
                    }
                };
                let Some(arm) = arms.iter().find(|arm| arm.tag == sum.tag) else {
                    return match else_ {
                        Some(block) => self.execute_block(block, ctx),
                        None => Ok(()),
                    };
                };
                let scope = ExecutionContext::child_with_types(
                    ctx,
                    arm.body.types.clone(),
                    LifeTime::Temporary,
                );
                if let Some((id, ty)) = &arm.binding {
                    let payload = sum.value.map(|v| *v).unwrap_or(Value::Nil);
                    bind(&scope, id, Symbol::new(ty.clone(), payload))?;
                }
                self.execute_in(&arm.body.statements, &scope)?;
                if let Some(value) = scope.take_return_value() {
                    ctx.set_return_value(value);
                }
                Ok(())
            }
            Prepared::Function { decl, signature } => {
                let function = FunctionValue {
                    signature: signature.clone(),
                    body: FunctionBody::Literal(decl.function.clone()),
                    closure: Some(ctx.capture()),
                };
                let symbol = Symbol::new(
                    TypeSpecifier::function(signature.clone()),
                    Value::Function(Rc::new(function)),
                );
                bind(ctx, &decl.name, symbol)
            }
            Prepared::TypeDecl => Ok(()),
        }
    }

    fn condition(&self, cond: &Expr, ctx: &Rc<ExecutionContext>) -> Checked<bool> {
        match self.evaluate(cond, ctx)? {
            Value::Bool(b) => Ok(b),
            other => Err(ErrorKind::InvariantViolation(format!(
                "condition evaluated to {}",
                other
            ))
            .at(cond.span())
            .into()),
        }
    }

    /// Write `value` through `target`. Records and arrays are values, so
    /// the enclosing aggregate is rebuilt and written back to its variable.
    fn store(&self, target: &AssignTarget, value: Value, ctx: &Rc<ExecutionContext>) -> Checked<()> {
        match target {
            AssignTarget::Variable(id) => {
                if ctx.set_symbol(&id.text, value) {
                    Ok(())
                } else {
                    Err(ErrorKind::UndeclaredVariable {
                        name: id.text.clone(),
                    }
                    .at(id.span)
                    .into())
                }
            }
            AssignTarget::Member {
                object,
                member,
                span,
            } => {
                let mut current = self.load(object, ctx)?;
                let updated = match &mut current {
                    Value::Record(record) => record.fields.update(&member.text, value),
                    _ => false,
                };
                if !updated {
                    return Err(ErrorKind::InvariantViolation(format!(
                        "no member '{}' on {}",
                        member.text, current
                    ))
                    .at(*span)
                    .into());
                }
                self.store(object, current, ctx)
            }
            AssignTarget::Index { array, index, span } => {
                let position = self.index_value(index, ctx)?;
                let mut current = self.load(array, ctx)?;
                let Value::Array(items) = &mut current else {
                    return Err(ErrorKind::InvariantViolation(format!(
                        "indexed assignment into {}",
                        current
                    ))
                    .at(*span)
                    .into());
                };
                let length = items.items.len();
                match usize::try_from(position) {
                    Ok(i) if i < length => items.items[i] = value,
                    // Dynamic arrays grow by assigning one past the end.
                    Ok(i) if i == length && items.mode == ArrayMode::Dynamic => {
                        items.items.push(value)
                    }
                    _ => {
                        return Err(ErrorKind::ArrayIndexOutOfBounds {
                            index: position,
                            length,
                        }
                        .at(*span)
                        .into());
                    }
                }
                self.store(array, current, ctx)
            }
        }
    }

    fn load(&self, target: &AssignTarget, ctx: &Rc<ExecutionContext>) -> Checked<Value> {
        match target {
            AssignTarget::Variable(id) => ctx
                .get_symbol(&id.text)
                .map(Symbol::into_value)
                .ok_or_else(|| {
                    ErrorKind::UndeclaredVariable {
                        name: id.text.clone(),
                    }
                    .at(id.span)
                    .into()
                }),
            AssignTarget::Member { object, member, .. } => {
                let object = self.load(object, ctx)?;
                self.member_value(object, member)
            }
            AssignTarget::Index { array, index, span } => {
                let position = self.index_value(index, ctx)?;
                let array = self.load(array, ctx)?;
                super::expr::element_at(array, position, *span)
            }
        }
    }
}

fn bind(ctx: &ExecutionContext, name: &Ident, symbol: Symbol) -> Checked<()> {
    match ctx.insert_symbol(&name.text, symbol) {
        InsertResult::Success => Ok(()),
        InsertResult::SymbolExists => Err(ErrorKind::InvariantViolation(format!(
            "'{}' bound twice in one scope",
            name.text
        ))
        .at(name.span)
        .into()),
    }
}

/// `a.b[]` style rendering of an assignment target for diagnostics.
fn target_path(target: &AssignTarget) -> String {
    match target {
        AssignTarget::Variable(id) => id.text.clone(),
        AssignTarget::Member { object, member, .. } => {
            format!("{}.{}", target_path(object), member.text)
        }
        AssignTarget::Index { array, .. } => format!("{}[]", target_path(array)),
    }
}

#[cfg(test)]
mod tests {
    use super::Coverage;

    #[test]
    fn sequence_is_full_once_any_statement_is() {
        assert_eq!(Coverage::None.then(Coverage::Full), Coverage::Full);
        assert_eq!(Coverage::Full.then(Coverage::None), Coverage::Full);
        assert_eq!(Coverage::Partial.then(Coverage::None), Coverage::Partial);
        assert_eq!(Coverage::None.then(Coverage::None), Coverage::None);
    }

    #[test]
    fn branches_are_full_only_together() {
        assert_eq!(Coverage::Full.either(Coverage::Full), Coverage::Full);
        assert_eq!(Coverage::Full.either(Coverage::None), Coverage::Partial);
        assert_eq!(Coverage::None.either(Coverage::None), Coverage::None);
        assert_eq!(Coverage::Partial.either(Coverage::Full), Coverage::Partial);
    }
}
