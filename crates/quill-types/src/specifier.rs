//! Operations on type specifiers: resolution, assignability, default values
//! and the value conversions assignability permits.

use crate::definition::{TypeDefinition, MAYBE_VALUE};
use crate::diagnostics::{Checked, ErrorKind, ErrorList};
use crate::table::{declare_type_parameters, AliasResolution, Depth, Resolved, TypeTable};
use crate::value::{ArrayValue, SumValue, Value};
use quill_ast::{FunctionSignature, Param, TypeSpecifier};
use std::rc::Rc;

/// How well a source type fits a target type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnalysisResult {
    Incompatible,
    /// Fits more than one variant of a sum; no single conversion exists.
    Ambiguous,
    /// Fits through widening or wrapping.
    Unambiguous,
    Equivalent,
}

impl AnalysisResult {
    pub fn is_assignable(self) -> bool {
        matches!(self, AnalysisResult::Unambiguous | AnalysisResult::Equivalent)
    }
}

/// Whether primitive widening is allowed while comparing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Widening,
    Strict,
}

/// Sums nested inside sums are searched this deep for a fitting variant.
const MAX_VARIANT_NESTING: usize = 32;

pub trait SpecifierExt {
    fn resolve(&self, table: &Rc<TypeTable>, mode: AliasResolution) -> Checked<Resolved>;

    fn is_assignable_to(
        &self,
        other: &TypeSpecifier,
        table: &Rc<TypeTable>,
    ) -> Checked<AnalysisResult>;

    /// Default value, honoring an alias's own default (RETURN resolution).
    fn default_value(&self, table: &Rc<TypeTable>) -> Checked<Value>;

    /// Rewrite into a specifier that means the same thing from any table
    /// that can see the referenced declarations: type-parameter bindings are
    /// expanded and nested declarations are qualified by their container.
    fn canonical(&self, table: &Rc<TypeTable>) -> Checked<TypeSpecifier>;
}

impl SpecifierExt for TypeSpecifier {
    fn resolve(&self, table: &Rc<TypeTable>, mode: AliasResolution) -> Checked<Resolved> {
        table.resolve_from(self, mode, Depth::Full)
    }

    fn is_assignable_to(
        &self,
        other: &TypeSpecifier,
        table: &Rc<TypeTable>,
    ) -> Checked<AnalysisResult> {
        analyze(self, table, other, table, Comparison::Widening)
    }

    fn default_value(&self, table: &Rc<TypeTable>) -> Checked<Value> {
        self.resolve(table, AliasResolution::Return)?.default_value()
    }

    fn canonical(&self, table: &Rc<TypeTable>) -> Checked<TypeSpecifier> {
        match self {
            TypeSpecifier::Primitive { .. } | TypeSpecifier::Nil(_) => Ok(self.clone()),
            TypeSpecifier::Array {
                element,
                mode,
                span,
            } => Ok(TypeSpecifier::Array {
                element: Box::new(element.canonical(table)?),
                mode: *mode,
                span: *span,
            }),
            TypeSpecifier::Maybe { base, span } => Ok(TypeSpecifier::Maybe {
                base: Box::new(base.canonical(table)?),
                span: *span,
            }),
            TypeSpecifier::Nested {
                parent,
                member,
                span,
            } => Ok(TypeSpecifier::Nested {
                parent: Box::new(parent.canonical(table)?),
                member: member.clone(),
                span: *span,
            }),
            TypeSpecifier::Function(signature) => {
                // A generic signature's own parameters shadow outer names.
                let scope = if signature.is_generic() {
                    declare_type_parameters(&signature.type_params, table)?
                } else {
                    table.clone()
                };
                let mut errors = ErrorList::new();
                let mut params = Vec::with_capacity(signature.params.len());
                for param in &signature.params {
                    let (next, ty) = errors.absorb(param.ty.canonical(&scope));
                    errors = next;
                    if let Some(ty) = ty {
                        params.push(Param {
                            name: param.name.clone(),
                            ty,
                        });
                    }
                }
                let (errors, ret) = errors.absorb(signature.ret.canonical(&scope));
                let ret = match ret {
                    Some(ret) if errors.is_empty() => ret,
                    _ => return Err(errors),
                };
                Ok(TypeSpecifier::Function(Box::new(FunctionSignature {
                    type_params: signature.type_params.clone(),
                    params,
                    ret,
                    span: signature.span,
                })))
            }
            TypeSpecifier::Record(named)
            | TypeSpecifier::Sum(named)
            | TypeSpecifier::Named(named) => {
                let found = table.lookup_named(named, Depth::Full).ok_or_else(|| {
                    ErrorList::from(
                        ErrorKind::UndeclaredType {
                            name: named.qualified_name(),
                        }
                        .at(named.span),
                    )
                })?;
                let args = named
                    .type_args
                    .iter()
                    .map(|a| a.canonical(table))
                    .collect::<Checked<Vec<_>>>()?;
                let spec = match &*found.definition {
                    TypeDefinition::Alias(alias) => match &alias.kind {
                        crate::definition::AliasKind::Recursive { table: origin } => {
                            if let Some(extra) = args.first() {
                                return Err(ErrorKind::TooManyArguments {
                                    argument: extra.to_string(),
                                }
                                .at(extra.span())
                                .into());
                            }
                            return Ok(alias.origin.canonical(origin)?.at(named.span));
                        }
                        crate::definition::AliasKind::Direct => {
                            TypeSpecifier::Named(named.clone().with_args(args))
                        }
                    },
                    TypeDefinition::Record(record) => {
                        let mut qualified = record.specifier.clone().with_args(args);
                        qualified.span = named.span;
                        TypeSpecifier::Record(qualified)
                    }
                    TypeDefinition::Sum(sum) => {
                        let mut qualified = sum.specifier.clone().with_args(args);
                        qualified.span = named.span;
                        TypeSpecifier::Sum(qualified)
                    }
                    _ => TypeSpecifier::Named(named.clone().with_args(args)),
                };
                Ok(spec)
            }
        }
    }
}

/// Compare `src` (written in `src_table`) against `dst` (written in
/// `dst_table`).
pub fn analyze(
    src: &TypeSpecifier,
    src_table: &Rc<TypeTable>,
    dst: &TypeSpecifier,
    dst_table: &Rc<TypeTable>,
    cmp: Comparison,
) -> Checked<AnalysisResult> {
    let s = src.resolve(src_table, AliasResolution::Resolve)?;
    let d = dst.resolve(dst_table, AliasResolution::Resolve)?;
    analyze_resolved(&s, &d, cmp, 0)
}

fn analyze_resolved(
    s: &Resolved,
    d: &Resolved,
    cmp: Comparison,
    nesting: usize,
) -> Checked<AnalysisResult> {
    use AnalysisResult::*;
    use TypeDefinition as Def;

    let result = match (&*s.definition, &*d.definition) {
        (Def::Absent, _) | (_, Def::Absent) => Incompatible,
        (Def::Placeholder(_), _) | (_, Def::Placeholder(_)) => {
            let same = Rc::ptr_eq(&s.definition, &d.definition)
                || (s.definition.is_placeholder()
                    && d.definition.is_placeholder()
                    && s.specifier == d.specifier);
            if same {
                Equivalent
            } else {
                Incompatible
            }
        }
        (Def::Nil, Def::Nil) => Equivalent,
        (Def::Maybe(sm), Def::Maybe(dm)) => {
            let sb = sm.base.resolve(&s.table, AliasResolution::Resolve)?;
            let db = dm.base.resolve(&d.table, AliasResolution::Resolve)?;
            match analyze_resolved(&sb, &db, Comparison::Strict, nesting)? {
                Equivalent => Equivalent,
                _ => Incompatible,
            }
        }
        (Def::Nil, Def::Maybe(_)) => Unambiguous,
        (_, Def::Maybe(dm)) => {
            let db = dm.base.resolve(&d.table, AliasResolution::Resolve)?;
            match analyze_resolved(s, &db, cmp, nesting)? {
                Equivalent | Unambiguous => Unambiguous,
                other => other,
            }
        }
        (Def::Primitive(a), Def::Primitive(b)) => {
            if a == b {
                Equivalent
            } else {
                match (a.rank(), b.rank()) {
                    (Some(ra), Some(rb)) if ra <= rb && cmp == Comparison::Widening => {
                        Unambiguous
                    }
                    _ => Incompatible,
                }
            }
        }
        (Def::Array(a), Def::Array(b)) => {
            if a.mode != b.mode {
                Incompatible
            } else {
                let se = a.element.resolve(&s.table, AliasResolution::Resolve)?;
                let de = b.element.resolve(&d.table, AliasResolution::Resolve)?;
                analyze_resolved(&se, &de, cmp, nesting)?
            }
        }
        (Def::Record(_), Def::Record(_)) | (Def::Function(_), Def::Function(_)) => {
            if s.specifier == d.specifier {
                Equivalent
            } else {
                Incompatible
            }
        }
        (Def::Sum(_), Def::Sum(_)) if s.specifier == d.specifier => Equivalent,
        (_, Def::Sum(_)) => match_variant(s, d, cmp, nesting)?.0,
        _ => Incompatible,
    };
    Ok(result)
}

/// Find the variant of sum `d` that a value of type `s` converts to.
///
/// One equivalent variant wins outright; otherwise exactly one accepting
/// variant is required. Sum sources are compared strictly.
fn match_variant(
    s: &Resolved,
    d: &Resolved,
    cmp: Comparison,
    nesting: usize,
) -> Checked<(AnalysisResult, Option<(String, TypeSpecifier)>)> {
    if nesting >= MAX_VARIANT_NESTING {
        return Ok((AnalysisResult::Incompatible, None));
    }
    let Some(variants) = d.variants() else {
        return Ok((AnalysisResult::Incompatible, None));
    };
    let variant_cmp = if s.as_sum().is_some() {
        Comparison::Strict
    } else {
        cmp
    };

    let mut equivalent = Vec::new();
    let mut accepting = Vec::new();
    let mut ambiguous = false;
    for (name, ty) in variants {
        let variant = ty.resolve(&d.table, AliasResolution::Resolve)?;
        match analyze_resolved(s, &variant, variant_cmp, nesting + 1)? {
            AnalysisResult::Equivalent => equivalent.push((name, variant.specifier)),
            AnalysisResult::Unambiguous => accepting.push((name, variant.specifier)),
            AnalysisResult::Ambiguous => ambiguous = true,
            AnalysisResult::Incompatible => {}
        }
    }

    let outcome = match (equivalent.len(), accepting.len()) {
        (1, _) => (AnalysisResult::Unambiguous, equivalent.pop()),
        (0, 1) if !ambiguous => (AnalysisResult::Unambiguous, accepting.pop()),
        (0, 0) if !ambiguous => (AnalysisResult::Incompatible, None),
        _ => (AnalysisResult::Ambiguous, None),
    };
    Ok(outcome)
}

/// Convert `value` to the representation `target` expects: primitives are
/// widened, array elements converted, and values wrapped into the sum or
/// Maybe variant they fit.
pub fn coerce(value: Value, target: &TypeSpecifier, table: &Rc<TypeTable>) -> Checked<Value> {
    let resolved = target.resolve(table, AliasResolution::Resolve)?;
    coerce_resolved(value, &resolved, table, target)
}

fn coerce_resolved(
    value: Value,
    d: &Resolved,
    table: &Rc<TypeTable>,
    target: &TypeSpecifier,
) -> Checked<Value> {
    use quill_ast::PrimitiveKind as P;

    match &*d.definition {
        TypeDefinition::Primitive(kind) => Ok(match (value, kind) {
            (Value::Bool(b), P::Int) => Value::Int(i64::from(b)),
            (Value::Bool(b), P::Double) => Value::Double(if b { 1.0 } else { 0.0 }),
            (Value::Int(i), P::Double) => Value::Double(i as f64),
            (other, _) => other,
        }),
        TypeDefinition::Array(array) => match value {
            Value::Array(source) => {
                let element = array.element.canonical(&d.table)?;
                let items = source
                    .items
                    .into_iter()
                    .map(|item| coerce(item, &array.element, &d.table))
                    .collect::<Checked<Vec<_>>>()?;
                Ok(Value::Array(ArrayValue {
                    element,
                    mode: array.mode,
                    items,
                }))
            }
            other => Ok(other),
        },
        TypeDefinition::Maybe(maybe) => match value {
            Value::Nil => Ok(Value::Sum(SumValue::empty(d.specifier.clone()))),
            Value::Sum(sum) if sum.ty == d.specifier => Ok(Value::Sum(sum)),
            other => {
                let inner = coerce(other, &maybe.base, &d.table)?;
                Ok(Value::Sum(SumValue::new(
                    d.specifier.clone(),
                    MAYBE_VALUE,
                    maybe.base.canonical(&d.table)?,
                    inner,
                )))
            }
        },
        TypeDefinition::Sum(_) => match value {
            Value::Sum(sum) if sum.ty == d.specifier => Ok(Value::Sum(sum)),
            other => {
                let source = other
                    .type_specifier()
                    .resolve(table, AliasResolution::Resolve)?;
                match match_variant(&source, d, Comparison::Widening, 0)? {
                    (_, Some((tag, tag_type))) => {
                        let inner = coerce(other, &tag_type, table)?;
                        Ok(Value::Sum(SumValue::new(
                            d.specifier.clone(),
                            tag,
                            tag_type,
                            inner,
                        )))
                    }
                    (AnalysisResult::Ambiguous, None) => Err(ErrorKind::AmbiguousSumConversion {
                        ty: d.specifier.to_string(),
                        found: source.specifier.to_string(),
                    }
                    .at(target.span())
                    .into()),
                    _ => Err(ErrorKind::InvariantViolation(format!(
                        "a value of type {} reached a slot of type {}",
                        source.specifier, d.specifier
                    ))
                    .at(target.span())
                    .into()),
                }
            }
        },
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AliasDefinition;
    use quill_ast::{ArrayMode, PrimitiveKind};

    fn prim(kind: PrimitiveKind) -> TypeSpecifier {
        TypeSpecifier::primitive(kind)
    }

    #[test]
    fn primitive_widening() {
        let table = TypeTable::root();
        let check = |a: PrimitiveKind, b: PrimitiveKind| {
            prim(a).is_assignable_to(&prim(b), &table).unwrap()
        };
        assert_eq!(check(PrimitiveKind::Int, PrimitiveKind::Int), AnalysisResult::Equivalent);
        assert_eq!(check(PrimitiveKind::Int, PrimitiveKind::Double), AnalysisResult::Unambiguous);
        assert_eq!(check(PrimitiveKind::Double, PrimitiveKind::Int), AnalysisResult::Incompatible);
        assert_eq!(check(PrimitiveKind::String, PrimitiveKind::Double), AnalysisResult::Incompatible);
    }

    #[test]
    fn arrays_need_matching_mode() {
        let table = TypeTable::root();
        let fixed = TypeSpecifier::array(TypeSpecifier::int(), ArrayMode::Fixed);
        let dynamic = TypeSpecifier::array(TypeSpecifier::double(), ArrayMode::Dynamic);
        let dynamic_int = TypeSpecifier::array(TypeSpecifier::int(), ArrayMode::Dynamic);
        assert!(!fixed.is_assignable_to(&dynamic, &table).unwrap().is_assignable());
        assert!(dynamic_int.is_assignable_to(&dynamic, &table).unwrap().is_assignable());
    }

    #[test]
    fn maybe_accepts_nil_and_base() {
        let table = TypeTable::root();
        let maybe = TypeSpecifier::maybe(TypeSpecifier::int());
        assert!(TypeSpecifier::nil().is_assignable_to(&maybe, &table).unwrap().is_assignable());
        assert!(TypeSpecifier::int().is_assignable_to(&maybe, &table).unwrap().is_assignable());
        assert!(!TypeSpecifier::string().is_assignable_to(&maybe, &table).unwrap().is_assignable());
        assert!(!TypeSpecifier::nil()
            .is_assignable_to(&TypeSpecifier::int(), &table)
            .unwrap()
            .is_assignable());
    }

    #[test]
    fn coerce_wraps_into_maybe() {
        let table = TypeTable::root();
        let maybe = TypeSpecifier::maybe(TypeSpecifier::double());
        match coerce(Value::Int(3), &maybe, &table).unwrap() {
            Value::Sum(sum) => {
                assert_eq!(sum.tag, "value");
                assert_eq!(sum.value.as_deref(), Some(&Value::Double(3.0)));
            }
            other => panic!("expected a sum value, got {:?}", other),
        }
        match coerce(Value::Nil, &maybe, &table).unwrap() {
            Value::Sum(sum) => assert_eq!(sum.tag, "empty"),
            other => panic!("expected a sum value, got {:?}", other),
        }
    }

    #[test]
    fn canonical_expands_type_parameter_bindings() {
        let root = TypeTable::root();
        root.add_type(
            "Id",
            TypeDefinition::Alias(AliasDefinition::direct("Id", TypeSpecifier::int())),
        )
        .unwrap();
        let scope = crate::table::bind_type_arguments(
            &["T".to_string()],
            &[TypeSpecifier::named("Id")],
            &root,
            &root,
            quill_ast::span::Span::default(),
        )
        .unwrap();
        let spec = TypeSpecifier::array(TypeSpecifier::named("T"), ArrayMode::Dynamic);
        // Bindings are expanded; declared aliases are kept by name.
        assert_eq!(
            spec.canonical(&scope).unwrap(),
            TypeSpecifier::array(TypeSpecifier::named("Id"), ArrayMode::Dynamic)
        );
    }
}
