//! Default values of resolved types.

use crate::definition::{AliasKind, TypeDefinition};
use crate::diagnostics::{Checked, ErrorKind};
use crate::specifier::SpecifierExt;
use crate::symbol::{Symbol, SymbolContext};
use crate::table::{AliasResolution, Resolved, MAX_ALIAS_STEPS};
use crate::value::{ArrayValue, FunctionBody, FunctionValue, RecordValue, SumValue, Value};
use quill_ast::{PrimitiveKind, TypeSpecifier};
use std::collections::HashSet;
use std::rc::Rc;

/// Nested record/sum defaults deeper than this are treated as unbounded.
const MAX_DEFAULT_NESTING: usize = 256;

impl Resolved {
    /// The value a declaration of this type holds before any assignment.
    ///
    /// An alias returned by RETURN resolution yields its own default when it
    /// has one, so this can differ from the default of the aliased type.
    pub fn default_value(&self) -> Checked<Value> {
        default_of(self, &mut Vec::new())
    }
}

fn default_of(resolved: &Resolved, in_progress: &mut Vec<String>) -> Checked<Value> {
    let current = skip_aliases(resolved)?;
    let current = match current {
        Step::Value(v) => return Ok(v),
        Step::Type(r) => r,
    };
    let span = current.specifier.span();

    match &*current.definition {
        TypeDefinition::Primitive(kind) => Ok(match kind {
            PrimitiveKind::Boolean => Value::Bool(false),
            PrimitiveKind::Int => Value::Int(0),
            PrimitiveKind::Double => Value::Double(0.0),
            PrimitiveKind::String => Value::Str(String::new()),
        }),
        TypeDefinition::Nil => Ok(Value::Nil),
        TypeDefinition::Array(array) => Ok(Value::Array(ArrayValue {
            element: array.element.canonical(&current.table)?,
            mode: array.mode,
            items: Vec::new(),
        })),
        TypeDefinition::Record(record) => {
            let key = enter(&current, &record.specifier.qualified_name(), in_progress)?;
            let mut fields = SymbolContext::new(record.modifier);
            let mut result = Ok(());
            for (name, field) in &record.fields {
                let value = match &field.default {
                    Some(value) => Ok(value.clone()),
                    None => field
                        .ty
                        .resolve(&current.table, AliasResolution::Return)
                        .and_then(|r| default_of(&r, in_progress)),
                };
                match (value, field.ty.canonical(&current.table)) {
                    (Ok(value), Ok(ty)) => {
                        fields.insert(name.clone(), Symbol::new(ty, value));
                    }
                    (Err(e), _) | (_, Err(e)) => {
                        result = Err(e);
                        break;
                    }
                }
            }
            leave(in_progress, key);
            result?;
            Ok(Value::Record(RecordValue {
                ty: current.specifier.clone(),
                fields,
            }))
        }
        TypeDefinition::Sum(sum) => {
            let Some((tag, variant)) = sum.first_variant().filter(|_| sum.variants.len() >= 2)
            else {
                return Err(ErrorKind::InvalidSumType {
                    name: sum.specifier.qualified_name(),
                }
                .at(span)
                .into());
            };
            let key = enter(&current, &sum.specifier.qualified_name(), in_progress)?;
            let value = variant
                .resolve(&current.table, AliasResolution::Return)
                .and_then(|r| default_of(&r, in_progress));
            leave(in_progress, key);
            Ok(Value::Sum(SumValue::new(
                current.specifier.clone(),
                tag.clone(),
                variant.canonical(&current.table)?,
                value?,
            )))
        }
        TypeDefinition::Maybe(_) => Ok(Value::Sum(SumValue::empty(current.specifier.clone()))),
        TypeDefinition::Function(_) => {
            let TypeSpecifier::Function(signature) = &current.specifier else {
                return Err(ErrorKind::InvariantViolation(format!(
                    "function definition resolved from {}",
                    current.specifier
                ))
                .at(span)
                .into());
            };
            Ok(Value::Function(Rc::new(FunctionValue {
                signature: (**signature).clone(),
                body: FunctionBody::Default {
                    ret: signature.ret.clone(),
                    table: Rc::downgrade(&current.table),
                },
                closure: None,
            })))
        }
        TypeDefinition::Placeholder(p) => match p.kind {
            crate::definition::PlaceholderKind::Declaration => {
                Err(ErrorKind::PartiallyDeclaredType {
                    name: p.name.clone(),
                }
                .at(span)
                .into())
            }
            crate::definition::PlaceholderKind::TypeParameter => Ok(Value::Nil),
        },
        TypeDefinition::Absent => Err(ErrorKind::UndeclaredType {
            name: current.specifier.to_string(),
        }
        .at(span)
        .into()),
        TypeDefinition::Alias(alias) => Err(ErrorKind::InvariantViolation(format!(
            "alias '{}' survived default resolution",
            alias.name
        ))
        .at(span)
        .into()),
    }
}

enum Step {
    Value(Value),
    Type(Resolved),
}

/// Follow aliases without their own default until a value or a non-alias
/// definition is reached.
fn skip_aliases(resolved: &Resolved) -> Checked<Step> {
    let mut current = resolved.clone();
    let mut seen: HashSet<*const TypeDefinition> = HashSet::new();
    for _ in 0..MAX_ALIAS_STEPS {
        let TypeDefinition::Alias(alias) = &*current.definition else {
            return Ok(Step::Type(current));
        };
        if let Some(value) = &alias.default {
            return Ok(Step::Value(value.clone()));
        }
        if !seen.insert(Rc::as_ptr(&current.definition)) {
            return Err(ErrorKind::CircularAlias {
                name: alias.name.clone(),
            }
            .at(current.specifier.span())
            .into());
        }
        let origin_table = match &alias.kind {
            AliasKind::Direct => current.table.clone(),
            AliasKind::Recursive { table } => table.clone(),
        };
        current = alias.origin.resolve(&origin_table, AliasResolution::Return)?;
    }
    Err(ErrorKind::AliasResolutionLimit {
        name: resolved.specifier.to_string(),
        limit: MAX_ALIAS_STEPS,
    }
    .at(resolved.specifier.span())
    .into())
}

fn enter(current: &Resolved, name: &str, in_progress: &mut Vec<String>) -> Checked<String> {
    let key = current.specifier.to_string();
    if in_progress.contains(&key) || in_progress.len() >= MAX_DEFAULT_NESTING {
        return Err(ErrorKind::PartiallyDeclaredType {
            name: name.to_string(),
        }
        .at(current.specifier.span())
        .into());
    }
    in_progress.push(key.clone());
    Ok(key)
}

fn leave(in_progress: &mut Vec<String>, key: String) {
    if let Some(pos) = in_progress.iter().rposition(|k| *k == key) {
        in_progress.remove(pos);
    }
}
