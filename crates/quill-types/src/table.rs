//! The type table: a chained namespace from type names to definitions.
//!
//! Each table owns an arena of definitions and a name index into it. Names
//! map to arena slots, never to pre-resolved pointers, so completing a
//! forward declaration only swaps the slot's contents and every later lookup
//! sees the finished definition.

use crate::definition::{
    AliasDefinition, AliasKind, ArrayType, FunctionType, MaybeType, PlaceholderType,
    TypeDefinition,
};
use crate::diagnostics::{Checked, ErrorKind, ErrorList};
use crate::specifier::SpecifierExt;
use indexmap::IndexMap;
use quill_ast::span::Span;
use quill_ast::{NamedType, TypeSpecifier};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Upper bound on alias hops while resolving one specifier. Generic aliases
/// that expand themselves (`L<T> = L<T[]>`) bind a fresh table on every hop,
/// so the visited set alone does not stop them.
pub const MAX_ALIAS_STEPS: usize = 1024;

/// Whether a lookup may continue into parent tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    Shallow,
    Full,
}

/// Whether a declared alias is followed to its origin or handed back as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AliasResolution {
    Resolve,
    Return,
}

/// Slot of a definition inside its table's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

#[derive(Clone)]
enum TableRef {
    /// Blocks and generic instantiations keep their parent alive.
    Strong(Rc<TypeTable>),
    /// Tables owned by a record or sum definition point back at the table
    /// that holds the definition.
    Weak(Weak<TypeTable>),
}

impl TableRef {
    fn upgrade(&self) -> Option<Rc<TypeTable>> {
        match self {
            TableRef::Strong(rc) => Some(rc.clone()),
            TableRef::Weak(weak) => weak.upgrade(),
        }
    }
}

pub struct TypeTable {
    parent: Option<TableRef>,
    names: RefCell<IndexMap<String, TypeId>>,
    arena: RefCell<Vec<Rc<TypeDefinition>>>,
}

/// A definition together with the table it was found in.
#[derive(Clone, Debug)]
pub struct Found {
    pub definition: Rc<TypeDefinition>,
    pub table: Rc<TypeTable>,
}

/// Outcome of resolving a specifier.
#[derive(Clone, Debug)]
pub struct Resolved {
    pub definition: Rc<TypeDefinition>,
    /// Table in which the definition's own member specifiers are read; for a
    /// generic type this is the instantiation table binding its parameters.
    pub table: Rc<TypeTable>,
    /// A specifier for the resolved type that reads the same from any table
    /// that can see the declaration.
    pub specifier: TypeSpecifier,
}

impl TypeTable {
    /// The process-wide table at the root of every chain.
    pub fn root() -> Rc<Self> {
        Rc::new(TypeTable {
            parent: None,
            names: RefCell::new(IndexMap::new()),
            arena: RefCell::new(Vec::new()),
        })
    }

    /// Table for a block scope or a generic instantiation.
    pub fn child(parent: &Rc<TypeTable>) -> Rc<Self> {
        Rc::new(TypeTable {
            parent: Some(TableRef::Strong(parent.clone())),
            names: RefCell::new(IndexMap::new()),
            arena: RefCell::new(Vec::new()),
        })
    }

    /// Table owned by a definition stored in `parent`.
    pub fn nested(parent: &Rc<TypeTable>) -> Rc<Self> {
        Rc::new(TypeTable {
            parent: Some(TableRef::Weak(Rc::downgrade(parent))),
            names: RefCell::new(IndexMap::new()),
            arena: RefCell::new(Vec::new()),
        })
    }

    pub fn parent(&self) -> Option<Rc<TypeTable>> {
        self.parent.as_ref().and_then(TableRef::upgrade)
    }

    /// Names declared directly in this table, in declaration order.
    pub fn local_names(&self) -> Vec<String> {
        self.names.borrow().keys().cloned().collect()
    }

    pub fn add_type(&self, name: &str, definition: TypeDefinition) -> Result<TypeId, ErrorKind> {
        let mut names = self.names.borrow_mut();
        if names.contains_key(name) {
            return Err(ErrorKind::PreviousDeclaration {
                name: name.to_string(),
            });
        }
        let mut arena = self.arena.borrow_mut();
        let id = TypeId(arena.len());
        arena.push(Rc::new(definition));
        names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Complete a forward declaration. The slot must currently hold a
    /// placeholder.
    pub fn replace_placeholder(&self, name: &str, definition: TypeDefinition) -> Result<(), ErrorKind> {
        let id = self.names.borrow().get(name).copied().ok_or_else(|| {
            ErrorKind::InvariantViolation(format!("no placeholder registered for '{}'", name))
        })?;
        let mut arena = self.arena.borrow_mut();
        let slot = &mut arena[id.0];
        if !slot.is_placeholder() {
            return Err(ErrorKind::InvariantViolation(format!(
                "'{}' is already a complete {} type",
                name,
                slot.kind_name()
            )));
        }
        trace!(name, kind = definition.kind_name(), "placeholder replaced");
        *slot = Rc::new(definition);
        Ok(())
    }

    fn local(&self, name: &str) -> Option<Rc<TypeDefinition>> {
        let id = *self.names.borrow().get(name)?;
        self.arena.borrow().get(id.0).cloned()
    }

    /// Raw lookup without alias handling.
    pub fn lookup(self: &Rc<Self>, name: &str, depth: Depth) -> Option<Found> {
        let mut current = self.clone();
        loop {
            if let Some(definition) = current.local(name) {
                return Some(Found {
                    definition,
                    table: current,
                });
            }
            if depth == Depth::Shallow {
                return None;
            }
            current = current.parent()?;
        }
    }

    /// Lookup of a possibly container-qualified name. `Shape.Circle` finds
    /// `Shape` along the chain, then `Circle` directly inside the table
    /// `Shape`'s definition owns.
    pub fn lookup_named(self: &Rc<Self>, named: &NamedType, depth: Depth) -> Option<Found> {
        let Some((first, rest)) = named.container.split_first() else {
            return self.lookup(&named.name, depth);
        };
        let mut scope = container_table(&self.lookup(first, depth)?)?;
        for segment in rest {
            scope = container_table(&scope.lookup(segment, Depth::Shallow)?)?;
        }
        scope.lookup(&named.name, Depth::Shallow)
    }

    /// Look up `name` and resolve it. `Ok(None)` when the name is unknown.
    pub fn get_type(
        self: &Rc<Self>,
        name: &str,
        depth: Depth,
        mode: AliasResolution,
    ) -> Checked<Option<Resolved>> {
        if self.lookup(name, depth).is_none() {
            return Ok(None);
        }
        let spec = TypeSpecifier::named(name);
        self.resolve_from(&spec, mode, depth).map(Some)
    }

    /// Whether every name `spec` mentions is visible from this table.
    pub fn contains_type(self: &Rc<Self>, spec: &TypeSpecifier) -> bool {
        self.resolve_from(spec, AliasResolution::Return, Depth::Full)
            .is_ok()
    }

    /// Walk `spec` to a definition. Alias hops are iterative, guarded by a
    /// visited set and by [`MAX_ALIAS_STEPS`].
    pub(crate) fn resolve_from(
        self: &Rc<Self>,
        spec: &TypeSpecifier,
        mode: AliasResolution,
        depth: Depth,
    ) -> Checked<Resolved> {
        let mut current = spec.clone();
        let mut table = self.clone();
        let mut depth = depth;
        let mut visited: HashSet<(usize, String, usize)> = HashSet::new();

        for _ in 0..MAX_ALIAS_STEPS {
            let (next, next_table) = match &current {
                TypeSpecifier::Primitive { kind, .. } => {
                    return Ok(Resolved {
                        definition: Rc::new(TypeDefinition::Primitive(*kind)),
                        table,
                        specifier: current.clone(),
                    });
                }
                TypeSpecifier::Nil(_) => {
                    return Ok(Resolved {
                        definition: Rc::new(TypeDefinition::Nil),
                        table,
                        specifier: current.clone(),
                    });
                }
                TypeSpecifier::Array { element, mode: array_mode, span } => {
                    let specifier = TypeSpecifier::Array {
                        element: Box::new(element.canonical(&table)?),
                        mode: *array_mode,
                        span: *span,
                    };
                    return Ok(Resolved {
                        definition: Rc::new(TypeDefinition::Array(ArrayType {
                            element: (**element).clone(),
                            mode: *array_mode,
                        })),
                        table,
                        specifier,
                    });
                }
                TypeSpecifier::Maybe { base, span } => {
                    let specifier = TypeSpecifier::Maybe {
                        base: Box::new(base.canonical(&table)?),
                        span: *span,
                    };
                    return Ok(Resolved {
                        definition: Rc::new(TypeDefinition::Maybe(MaybeType {
                            base: (**base).clone(),
                        })),
                        table,
                        specifier,
                    });
                }
                TypeSpecifier::Function(signature) => {
                    let specifier = current.canonical(&table)?;
                    return Ok(Resolved {
                        definition: Rc::new(TypeDefinition::Function(FunctionType {
                            signature: (**signature).clone(),
                        })),
                        table,
                        specifier,
                    });
                }
                TypeSpecifier::Nested { parent, member, .. } => {
                    let owner = table.resolve_from(parent, AliasResolution::Resolve, Depth::Full)?;
                    match member_type(&owner, member) {
                        Some(spec) => (spec, owner.table.clone()),
                        None => {
                            return Ok(Resolved {
                                definition: Rc::new(TypeDefinition::Absent),
                                table,
                                specifier: current.clone(),
                            });
                        }
                    }
                }
                TypeSpecifier::Record(named)
                | TypeSpecifier::Sum(named)
                | TypeSpecifier::Named(named) => {
                    let found = table.lookup_named(named, depth).ok_or_else(|| {
                        ErrorList::from(
                            ErrorKind::UndeclaredType {
                                name: named.qualified_name(),
                            }
                            .at(named.span),
                        )
                    })?;
                    let key = (
                        Rc::as_ptr(&found.table) as usize,
                        named.to_string(),
                        Rc::as_ptr(&table) as usize,
                    );
                    if !visited.insert(key) {
                        return Err(ErrorKind::CircularAlias {
                            name: named.qualified_name(),
                        }
                        .at(named.span)
                        .into());
                    }
                    match step_named(named, &found, &table, mode)? {
                        Step::Done(resolved) => return Ok(resolved),
                        Step::Follow(spec, next_table) => (spec, next_table),
                    }
                }
            };
            current = next;
            table = next_table;
            depth = Depth::Full;
        }

        Err(ErrorKind::AliasResolutionLimit {
            name: spec.to_string(),
            limit: MAX_ALIAS_STEPS,
        }
        .at(spec.span())
        .into())
    }
}

enum Step {
    Done(Resolved),
    Follow(TypeSpecifier, Rc<TypeTable>),
}

/// One hop of the walk for a name found in `found.table`; `table` is where
/// the name (and its type arguments) were written.
fn step_named(
    named: &NamedType,
    found: &Found,
    table: &Rc<TypeTable>,
    mode: AliasResolution,
) -> Checked<Step> {
    match &*found.definition {
        TypeDefinition::Alias(alias) => match &alias.kind {
            AliasKind::Recursive { table: origin_table } => {
                if let Some(extra) = named.type_args.first() {
                    return Err(ErrorKind::TooManyArguments {
                        argument: extra.to_string(),
                    }
                    .at(extra.span())
                    .into());
                }
                Ok(Step::Follow(alias.origin.clone(), origin_table.clone()))
            }
            AliasKind::Direct => {
                let scope = bind_type_arguments(
                    &alias.type_params,
                    &named.type_args,
                    table,
                    &found.table,
                    named.span,
                )?;
                if mode == AliasResolution::Return {
                    let specifier = TypeSpecifier::Named(
                        named.clone().with_args(canonical_args(&named.type_args, table)?),
                    );
                    return Ok(Step::Done(Resolved {
                        definition: found.definition.clone(),
                        table: scope,
                        specifier,
                    }));
                }
                Ok(Step::Follow(alias.origin.clone(), scope))
            }
        },
        TypeDefinition::Record(record) => {
            let scope = bind_type_arguments(
                &record.type_params,
                &named.type_args,
                table,
                &record.table,
                named.span,
            )?;
            let specifier = TypeSpecifier::Record(
                record
                    .specifier
                    .clone()
                    .with_args(canonical_args(&named.type_args, table)?),
            );
            Ok(Step::Done(Resolved {
                definition: found.definition.clone(),
                table: scope,
                specifier,
            }))
        }
        TypeDefinition::Sum(sum) => {
            let scope = bind_type_arguments(
                &sum.type_params,
                &named.type_args,
                table,
                &sum.table,
                named.span,
            )?;
            let specifier = TypeSpecifier::Sum(
                sum.specifier
                    .clone()
                    .with_args(canonical_args(&named.type_args, table)?),
            );
            Ok(Step::Done(Resolved {
                definition: found.definition.clone(),
                table: scope,
                specifier,
            }))
        }
        _ => {
            let specifier = TypeSpecifier::Named(
                named.clone().with_args(canonical_args(&named.type_args, table)?),
            );
            Ok(Step::Done(Resolved {
                definition: found.definition.clone(),
                table: found.table.clone(),
                specifier,
            }))
        }
    }
}

fn canonical_args(args: &[TypeSpecifier], table: &Rc<TypeTable>) -> Checked<Vec<TypeSpecifier>> {
    args.iter().map(|a| a.canonical(table)).collect()
}

fn container_table(found: &Found) -> Option<Rc<TypeTable>> {
    match &*found.definition {
        TypeDefinition::Record(r) => Some(r.table.clone()),
        TypeDefinition::Sum(s) => Some(s.table.clone()),
        _ => None,
    }
}

/// Type of a sum variant, record field or Maybe variant, as written inside
/// the owner's table.
fn member_type(owner: &Resolved, member: &str) -> Option<TypeSpecifier> {
    match &*owner.definition {
        TypeDefinition::Sum(sum) => sum.variants.get(member).cloned(),
        TypeDefinition::Record(record) => record.fields.get(member).map(|f| f.ty.clone()),
        TypeDefinition::Maybe(maybe) => maybe.variant(member),
        _ => None,
    }
}

/// Pair type parameters with type arguments positionally, producing a child
/// of `parent` whose entries forward each parameter to its argument as
/// written in `arg_table`.
///
/// More arguments than parameters reports one `TOO_MANY_ARGUMENTS` at the
/// first surplus argument; fewer reports one `TOO_FEW_ARGUMENTS` naming the
/// first unbound parameter.
pub fn bind_type_arguments(
    params: &[String],
    args: &[TypeSpecifier],
    arg_table: &Rc<TypeTable>,
    parent: &Rc<TypeTable>,
    span: Span,
) -> Checked<Rc<TypeTable>> {
    if params.is_empty() && args.is_empty() {
        return Ok(parent.clone());
    }
    if let Some(extra) = args.get(params.len()) {
        return Err(ErrorKind::TooManyArguments {
            argument: extra.to_string(),
        }
        .at(extra.span())
        .into());
    }
    if let Some(missing) = params.get(args.len()) {
        return Err(ErrorKind::TooFewArguments {
            parameter: missing.clone(),
        }
        .at(span)
        .into());
    }
    let scope = TypeTable::child(parent);
    let mut errors = ErrorList::new();
    for (param, arg) in params.iter().zip(args) {
        let binding = AliasDefinition::binding(param.clone(), arg.clone(), arg_table.clone());
        if let Err(kind) = scope.add_type(param, TypeDefinition::Alias(binding)) {
            errors = errors.with(kind.at(arg.span()));
        }
    }
    debug!(params = ?params, args = %display_list(args), "type arguments bound");
    errors.into_result(scope)
}

/// Child of `parent` holding an unbound placeholder per type parameter; the
/// scope a generic declaration is checked in.
pub fn declare_type_parameters(
    params: &[quill_ast::ast::Ident],
    parent: &Rc<TypeTable>,
) -> Checked<Rc<TypeTable>> {
    let scope = TypeTable::child(parent);
    let mut errors = ErrorList::new();
    for param in params {
        let placeholder = TypeDefinition::Placeholder(PlaceholderType::type_parameter(&param.text));
        if let Err(kind) = scope.add_type(&param.text, placeholder) {
            errors = errors.with(kind.at(param.span));
        }
    }
    errors.into_result(scope)
}

fn display_list(specs: &[TypeSpecifier]) -> String {
    specs
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Resolved {
    pub fn as_record(&self) -> Option<&crate::definition::RecordType> {
        match &*self.definition {
            TypeDefinition::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_sum(&self) -> Option<&crate::definition::SumType> {
        match &*self.definition {
            TypeDefinition::Sum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_maybe(&self) -> Option<&MaybeType> {
        match &*self.definition {
            TypeDefinition::Maybe(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match &*self.definition {
            TypeDefinition::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match &*self.definition {
            TypeDefinition::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&AliasDefinition> {
        match &*self.definition {
            TypeDefinition::Alias(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<quill_ast::PrimitiveKind> {
        match &*self.definition {
            TypeDefinition::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Variants of a sum or Maybe, as (name, specifier read in `self.table`).
    pub fn variants(&self) -> Option<Vec<(String, TypeSpecifier)>> {
        match &*self.definition {
            TypeDefinition::Sum(s) => Some(
                s.variants
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.clone()))
                    .collect(),
            ),
            TypeDefinition::Maybe(m) => Some(
                m.variants()
                    .into_iter()
                    .map(|(name, ty)| (name.to_string(), ty))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTable")
            .field("names", &self.local_names())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{PlaceholderKind, RecordType};
    use quill_ast::ast::Modifier;

    fn record(name: &str, parent: &Rc<TypeTable>) -> TypeDefinition {
        TypeDefinition::Record(RecordType {
            specifier: NamedType::new(name, Span::default()),
            type_params: Vec::new(),
            modifier: Modifier::Mutable,
            fields: IndexMap::new(),
            table: TypeTable::nested(parent),
        })
    }

    #[test]
    fn add_type_rejects_duplicates_at_same_level() {
        let root = TypeTable::root();
        root.add_type("Point", record("Point", &root)).unwrap();
        let err = root.add_type("Point", record("Point", &root)).unwrap_err();
        assert_eq!(err.code(), "PREVIOUS_DECLARATION");

        // Shadowing in a child table is fine.
        let child = TypeTable::child(&root);
        assert!(child.add_type("Point", record("Point", &child)).is_ok());
    }

    #[test]
    fn shallow_lookup_stays_local() {
        let root = TypeTable::root();
        root.add_type("Point", record("Point", &root)).unwrap();
        let child = TypeTable::child(&root);
        assert!(child.lookup("Point", Depth::Shallow).is_none());
        assert!(child.lookup("Point", Depth::Full).is_some());
    }

    #[test]
    fn placeholder_replacement_is_seen_by_later_lookups() {
        let root = TypeTable::root();
        root.add_type(
            "Node",
            TypeDefinition::Placeholder(PlaceholderType::declaration("Node")),
        )
        .unwrap();
        let before = root.lookup("Node", Depth::Full).unwrap();
        assert!(matches!(
            &*before.definition,
            TypeDefinition::Placeholder(p) if p.kind == PlaceholderKind::Declaration
        ));

        root.replace_placeholder("Node", record("Node", &root)).unwrap();
        let after = root.lookup("Node", Depth::Full).unwrap();
        assert_eq!(after.definition.kind_name(), "record");

        // Only placeholders may be replaced.
        let err = root.replace_placeholder("Node", record("Node", &root)).unwrap_err();
        assert_eq!(err.code(), "INVARIANT_VIOLATION");
    }

    #[test]
    fn return_mode_stops_at_alias_resolve_mode_follows() {
        let root = TypeTable::root();
        root.add_type(
            "Meters",
            TypeDefinition::Alias(AliasDefinition::direct("Meters", TypeSpecifier::double())),
        )
        .unwrap();

        let returned = root
            .get_type("Meters", Depth::Full, AliasResolution::Return)
            .unwrap()
            .unwrap();
        assert!(returned.as_alias().is_some());

        let resolved = root
            .get_type("Meters", Depth::Full, AliasResolution::Resolve)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.as_primitive(), Some(quill_ast::PrimitiveKind::Double));
        assert_eq!(resolved.specifier, TypeSpecifier::double());
    }

    #[test]
    fn unknown_name_is_none() {
        let root = TypeTable::root();
        assert!(root
            .get_type("Missing", Depth::Full, AliasResolution::Resolve)
            .unwrap()
            .is_none());
        assert!(!root.contains_type(&TypeSpecifier::named("Missing")));
        assert!(root.contains_type(&TypeSpecifier::int()));
    }

    #[test]
    fn alias_cycle_reports_circular_alias() {
        let root = TypeTable::root();
        root.add_type(
            "A",
            TypeDefinition::Alias(AliasDefinition::direct("A", TypeSpecifier::named("B"))),
        )
        .unwrap();
        root.add_type(
            "B",
            TypeDefinition::Alias(AliasDefinition::direct("B", TypeSpecifier::named("A"))),
        )
        .unwrap();
        let err = root
            .resolve_from(&TypeSpecifier::named("A"), AliasResolution::Resolve, Depth::Full)
            .unwrap_err();
        assert_eq!(err.codes(), vec!["CIRCULAR_ALIAS"]);
    }

    #[test]
    fn three_arguments_for_two_parameters() {
        let root = TypeTable::root();
        let params = vec!["K".to_string(), "V".to_string()];
        let third = Span::new(3, 17);
        let args = vec![
            TypeSpecifier::int(),
            TypeSpecifier::string(),
            TypeSpecifier::double().at(third),
        ];
        let err = bind_type_arguments(&params, &args, &root, &root, Span::new(3, 1)).unwrap_err();
        assert_eq!(err.len(), 1);
        let d = err.first().unwrap();
        assert_eq!(d.code(), "TOO_MANY_ARGUMENTS");
        assert_eq!(d.span, third);
    }

    #[test]
    fn too_few_arguments_names_first_missing_parameter() {
        let root = TypeTable::root();
        let params = vec!["K".to_string(), "V".to_string()];
        let err = bind_type_arguments(&params, &[TypeSpecifier::int()], &root, &root, Span::new(1, 1))
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(
            err.first().unwrap().kind,
            ErrorKind::TooFewArguments {
                parameter: "V".into()
            }
        );
    }

    #[test]
    fn bound_parameters_resolve_to_arguments() {
        let root = TypeTable::root();
        let params = vec!["T".to_string()];
        let scope = bind_type_arguments(&params, &[TypeSpecifier::int()], &root, &root, Span::default())
            .unwrap();
        let resolved = scope
            .resolve_from(&TypeSpecifier::named("T"), AliasResolution::Return, Depth::Full)
            .unwrap();
        assert_eq!(resolved.as_primitive(), Some(quill_ast::PrimitiveKind::Int));
    }

    #[test]
    fn nested_member_of_non_container_is_absent() {
        let root = TypeTable::root();
        let spec = TypeSpecifier::nested(TypeSpecifier::int(), "x");
        let resolved = root
            .resolve_from(&spec, AliasResolution::Resolve, Depth::Full)
            .unwrap();
        assert!(matches!(&*resolved.definition, TypeDefinition::Absent));
    }
}
