//! Declarations of records, sums, aliases and named functions.
//!
//! Type declarations are two-step: every name declared by a block is first
//! registered as a placeholder, then each statement replaces its own
//! placeholder with the finished definition. References between types of the
//! same block therefore work in either order.

use super::expr::expect_fits;
use super::Interpreter;
use indexmap::IndexMap;
use quill_ast::ast::{
    AliasDecl, Expr, FieldDecl, FunctionDecl, Ident, Modifier, RecordDecl, Stmt, SumDecl,
    VariantDecl, VariantShape,
};
use quill_ast::{FunctionSignature, NamedType, TypeSpecifier};
use quill_types::definition::FieldDef;
use quill_types::prelude::*;
use quill_types::specifier::coerce;
use quill_types::table::declare_type_parameters;
use std::rc::Rc;
use tracing::debug;

/// Name a statement declares in the type table, if any.
pub(super) fn declared_type_name(stmt: &Stmt) -> Option<&Ident> {
    match stmt {
        Stmt::Record(decl) => Some(&decl.name),
        Stmt::Sum(decl) => Some(&decl.name),
        Stmt::Alias(decl) => Some(&decl.name),
        _ => None,
    }
}

/// Register a placeholder for every type `statements` declare. The flags say
/// which statements got their own slot; a duplicate name is reported once
/// and its statement is skipped.
pub(super) fn register_type_declarations(
    statements: &[Stmt],
    types: &Rc<TypeTable>,
) -> (ErrorList, Vec<bool>) {
    let mut errors = ErrorList::new();
    let mut fresh = Vec::with_capacity(statements.len());
    for stmt in statements {
        let registered = match declared_type_name(stmt) {
            Some(name) => {
                let placeholder =
                    TypeDefinition::Placeholder(PlaceholderType::declaration(&name.text));
                match types.add_type(&name.text, placeholder) {
                    Ok(_) => true,
                    Err(kind) => {
                        errors = errors.with(kind.at(name.span));
                        false
                    }
                }
            }
            None => true,
        };
        fresh.push(registered);
    }
    (errors, fresh)
}

impl Interpreter {
    pub(super) fn declare_record(
        &self,
        decl: &RecordDecl,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<()> {
        self.define_record(
            &decl.name,
            &decl.type_params,
            decl.modifier,
            &decl.fields,
            Vec::new(),
            ctx.types(),
            ctx,
        )
    }

    /// Complete the placeholder `name` in `declaring`. Inline sum variants
    /// come through here with the sum as their container.
    #[allow(clippy::too_many_arguments)]
    fn define_record(
        &self,
        name: &Ident,
        type_params: &[Ident],
        modifier: Modifier,
        fields: &[FieldDecl],
        container: Vec<String>,
        declaring: &Rc<TypeTable>,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<()> {
        let own = declaring
            .lookup(&name.text, Depth::Shallow)
            .ok_or_else(|| missing_placeholder(name))?;
        let table = TypeTable::nested(declaring);
        let mut errors = declare_parameters_in(type_params, &table);

        let mut defs: IndexMap<String, FieldDef> = IndexMap::new();
        for field in fields {
            if defs.contains_key(&field.name.text) {
                errors = errors.with(
                    ErrorKind::PreviousDeclaration {
                        name: field.name.text.clone(),
                    }
                    .at(field.name.span),
                );
                continue;
            }
            let (next, resolved) =
                errors.absorb(field.ty.resolve(&table, AliasResolution::Resolve));
            errors = next;
            let Some(resolved) = resolved else { continue };
            // Direct containment can never be completed; `T?` and `T[]` can.
            if Rc::ptr_eq(&resolved.definition, &own.definition) {
                errors = errors.with(
                    ErrorKind::PartiallyDeclaredType {
                        name: name.text.clone(),
                    }
                    .at(field.ty.span()),
                );
                continue;
            }
            let default = match &field.default {
                Some(expr) => {
                    let value = self.field_default(&field.name.text, expr, &field.ty, &table, ctx);
                    let (next, value) = errors.absorb(value);
                    errors = next;
                    value
                }
                None => None,
            };
            defs.insert(
                field.name.text.clone(),
                FieldDef {
                    ty: field.ty.clone(),
                    default,
                },
            );
        }

        let definition = TypeDefinition::Record(RecordType {
            specifier: NamedType::new(&name.text, name.span).within(container),
            type_params: type_params.iter().map(|p| p.text.clone()).collect(),
            modifier,
            fields: defs,
            table,
        });
        if let Err(kind) = declaring.replace_placeholder(&name.text, definition) {
            errors = errors.with(kind.at(name.span));
        }
        debug!(name = %name.text, fields = fields.len(), "record declared");
        errors.into_result(())
    }

    pub(super) fn declare_sum(&self, decl: &SumDecl, ctx: &Rc<ExecutionContext>) -> Checked<()> {
        let name = &decl.name;
        if decl.variants.len() < 2 {
            return Err(ErrorKind::SumTooFewVariants {
                name: name.text.clone(),
                count: decl.variants.len(),
            }
            .at(name.span)
            .into());
        }
        let declaring = ctx.types();
        let own = declaring
            .lookup(&name.text, Depth::Shallow)
            .ok_or_else(|| missing_placeholder(name))?;
        let table = TypeTable::nested(declaring);
        let mut errors = declare_parameters_in(&decl.type_params, &table);
        // An inline variant record is generic over the sum's own parameters.
        let param_args: Vec<TypeSpecifier> = decl
            .type_params
            .iter()
            .map(|p| TypeSpecifier::Named(NamedType::new(&p.text, p.span)))
            .collect();

        let mut variants: IndexMap<String, TypeSpecifier> = IndexMap::new();
        let mut inline: Vec<(&VariantDecl, &[FieldDecl])> = Vec::new();
        for variant in &decl.variants {
            let vname = &variant.name;
            if variants.contains_key(&vname.text) {
                errors = errors.with(
                    ErrorKind::PreviousDeclaration {
                        name: vname.text.clone(),
                    }
                    .at(vname.span),
                );
                continue;
            }
            let spec = match &variant.shape {
                VariantShape::Type(ty) => {
                    let (next, resolved) =
                        errors.absorb(ty.resolve(&table, AliasResolution::Resolve));
                    errors = next;
                    let Some(resolved) = resolved else { continue };
                    if Rc::ptr_eq(&resolved.definition, &own.definition) {
                        errors = errors.with(
                            ErrorKind::PartiallyDeclaredType {
                                name: name.text.clone(),
                            }
                            .at(ty.span()),
                        );
                        continue;
                    }
                    ty.clone()
                }
                VariantShape::Record(fields) => {
                    let placeholder =
                        TypeDefinition::Placeholder(PlaceholderType::declaration(&vname.text));
                    if let Err(kind) = table.add_type(&vname.text, placeholder) {
                        errors = errors.with(kind.at(vname.span));
                        continue;
                    }
                    inline.push((variant, fields.as_slice()));
                    TypeSpecifier::Named(
                        NamedType::new(&vname.text, vname.span).with_args(param_args.clone()),
                    )
                }
            };
            variants.insert(vname.text.clone(), spec);
        }

        for (variant, fields) in inline {
            let defined = self.define_record(
                &variant.name,
                &decl.type_params,
                Modifier::Mutable,
                fields,
                vec![name.text.clone()],
                &table,
                ctx,
            );
            errors = errors.absorb(defined).0;
        }

        let count = variants.len();
        let definition = TypeDefinition::Sum(SumType {
            specifier: NamedType::new(&name.text, name.span),
            type_params: decl.type_params.iter().map(|p| p.text.clone()).collect(),
            variants,
            table,
        });
        if let Err(kind) = declaring.replace_placeholder(&name.text, definition) {
            errors = errors.with(kind.at(name.span));
        }
        debug!(name = %name.text, variants = count, "sum declared");
        errors.into_result(())
    }

    pub(super) fn declare_alias(
        &self,
        decl: &AliasDecl,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<()> {
        let name = &decl.name;
        let declaring = ctx.types();
        let own = declaring
            .lookup(&name.text, Depth::Shallow)
            .ok_or_else(|| missing_placeholder(name))?;
        let scope = declare_type_parameters(&decl.type_params, declaring)?;
        let circular = || -> ErrorList {
            ErrorKind::CircularAlias {
                name: name.text.clone(),
            }
            .at(name.span)
            .into()
        };
        if mentions(&decl.target, &name.text) {
            return Err(circular());
        }
        let target = decl.target.resolve(&scope, AliasResolution::Resolve)?;
        if Rc::ptr_eq(&target.definition, &own.definition) {
            return Err(circular());
        }

        let mut alias = AliasDefinition::direct(&name.text, decl.target.clone());
        alias.type_params = decl.type_params.iter().map(|p| p.text.clone()).collect();
        let mut errors = ErrorList::new();
        if let Some(expr) = &decl.default {
            let value = self.field_default(&name.text, expr, &decl.target, &scope, ctx);
            let (next, value) = errors.absorb(value);
            errors = next;
            alias.default = value;
        }
        if let Err(kind) = declaring.replace_placeholder(&name.text, TypeDefinition::Alias(alias)) {
            errors = errors.with(kind.at(name.span));
        }
        debug!(name = %name.text, target = %decl.target, "alias declared");
        errors.into_result(())
    }

    /// Declare a named function: its symbol holds a synthesized default
    /// while the body is checked, so the body may call itself.
    pub(super) fn prepare_function_decl(
        &self,
        decl: &FunctionDecl,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<FunctionSignature> {
        let name = &decl.name;
        if ctx.has_local_symbol(&name.text) {
            return Err(ErrorKind::PreviousDeclaration {
                name: name.text.clone(),
            }
            .at(name.span)
            .into());
        }
        let types = ctx.types();
        let ty = TypeSpecifier::function(decl.function.signature.clone()).canonical(types)?;
        let value = ty.default_value(types)?;
        ctx.insert_symbol(&name.text, Symbol::new(ty.clone(), value));
        self.check_function_literal(&decl.function, ctx)?;
        match ty {
            TypeSpecifier::Function(signature) => Ok(*signature),
            other => Err(ErrorKind::InvariantViolation(format!(
                "function '{}' has type {}",
                name.text, other
            ))
            .at(name.span)
            .into()),
        }
    }

    /// Check and evaluate a field or alias initializer. It runs while the
    /// program is being prepared, so calls see the synthesized defaults of
    /// functions rather than their bodies.
    fn field_default(
        &self,
        name: &str,
        expr: &Expr,
        ty: &TypeSpecifier,
        table: &Rc<TypeTable>,
        ctx: &Rc<ExecutionContext>,
    ) -> Checked<Value> {
        let scope = ExecutionContext::child_with_types(ctx, table.clone(), LifeTime::Temporary);
        let found = self.check_expr(expr, &scope)?;
        expect_fits(&found, table, ty, table, expr.span(), |expected, found| {
            ErrorKind::InvalidInitializerType {
                name: name.to_string(),
                expected,
                found,
            }
        })?;
        let value = self.evaluate(expr, &scope)?;
        coerce(value, ty, table)
    }
}

/// Unbound placeholders for the parameters of a record or sum, in the
/// declaration's own table.
fn declare_parameters_in(params: &[Ident], table: &TypeTable) -> ErrorList {
    let mut errors = ErrorList::new();
    for param in params {
        let placeholder = TypeDefinition::Placeholder(PlaceholderType::type_parameter(&param.text));
        if let Err(kind) = table.add_type(&param.text, placeholder) {
            errors = errors.with(kind.at(param.span));
        }
    }
    errors
}

fn missing_placeholder(name: &Ident) -> ErrorList {
    ErrorKind::InvariantViolation(format!("no placeholder registered for '{}'", name.text))
        .at(name.span)
        .into()
}

/// Whether `spec` names `name` anywhere, type arguments included.
fn mentions(spec: &TypeSpecifier, name: &str) -> bool {
    match spec {
        TypeSpecifier::Primitive { .. } | TypeSpecifier::Nil(_) => false,
        TypeSpecifier::Array { element, .. } => mentions(element, name),
        TypeSpecifier::Maybe { base, .. } => mentions(base, name),
        TypeSpecifier::Nested { parent, .. } => mentions(parent, name),
        TypeSpecifier::Function(signature) => {
            signature.params.iter().any(|p| mentions(&p.ty, name)) || mentions(&signature.ret, name)
        }
        TypeSpecifier::Record(named) | TypeSpecifier::Sum(named) | TypeSpecifier::Named(named) => {
            named.container.first().map_or(named.name == name, |first| first == name)
                || named.type_args.iter().any(|arg| mentions(arg, name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_ast::ArrayMode;

    #[test]
    fn mentions_looks_through_wrappers() {
        let spec = TypeSpecifier::maybe(TypeSpecifier::array(
            TypeSpecifier::named("Node"),
            ArrayMode::Dynamic,
        ));
        assert!(mentions(&spec, "Node"));
        assert!(!mentions(&spec, "List"));
        let qualified = TypeSpecifier::Named(
            NamedType::new("Circle", Default::default()).within(vec!["Shape".into()]),
        );
        assert!(mentions(&qualified, "Shape"));
        assert!(!mentions(&qualified, "Circle"));
    }
}
