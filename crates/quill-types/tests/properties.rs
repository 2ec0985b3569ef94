use proptest::prelude::*;
use quill_ast::{PrimitiveKind, TypeSpecifier};
use quill_types::definition::AliasDefinition;
use quill_types::prelude::*;

fn primitive_kind() -> impl Strategy<Value = PrimitiveKind> {
    prop_oneof![
        Just(PrimitiveKind::Boolean),
        Just(PrimitiveKind::Int),
        Just(PrimitiveKind::Double),
        Just(PrimitiveKind::String),
    ]
}

/// `A0 = A1 = ... = A(n-1) = int`, with a default on the first alias only.
fn alias_chain(n: usize, first_default: Option<i64>) -> std::rc::Rc<TypeTable> {
    let table = TypeTable::root();
    for i in 0..n {
        let origin = if i + 1 == n {
            TypeSpecifier::int()
        } else {
            TypeSpecifier::named(format!("A{}", i + 1))
        };
        let mut alias = AliasDefinition::direct(format!("A{}", i), origin);
        if i == 0 {
            alias.default = first_default.map(Value::Int);
        }
        table
            .add_type(&format!("A{}", i), TypeDefinition::Alias(alias))
            .expect("fresh name");
    }
    table
}

proptest! {
    #[test]
    fn primitive_assignability_follows_rank(a in primitive_kind(), b in primitive_kind()) {
        let table = TypeTable::root();
        let result = TypeSpecifier::primitive(a)
            .is_assignable_to(&TypeSpecifier::primitive(b), &table)
            .unwrap();
        let expected = match (a.rank(), b.rank()) {
            (Some(ra), Some(rb)) => ra <= rb,
            (None, None) => true,
            _ => false,
        };
        prop_assert_eq!(result.is_assignable(), expected);
        prop_assert_eq!(result == AnalysisResult::Equivalent, a == b);
    }

    #[test]
    fn alias_chains_resolve_without_recursion(n in 1usize..400) {
        let table = alias_chain(n, None);
        let resolved = TypeSpecifier::named("A0")
            .resolve(&table, AliasResolution::Resolve)
            .unwrap();
        prop_assert_eq!(resolved.as_primitive(), Some(PrimitiveKind::Int));
        prop_assert_eq!(resolved.default_value().unwrap(), Value::Int(0));
    }

    #[test]
    fn alias_default_only_seen_through_return(n in 1usize..50, default in -1000i64..1000) {
        prop_assume!(default != 0);
        let table = alias_chain(n, Some(default));
        let returned = TypeSpecifier::named("A0")
            .resolve(&table, AliasResolution::Return)
            .unwrap();
        let resolved = TypeSpecifier::named("A0")
            .resolve(&table, AliasResolution::Resolve)
            .unwrap();
        prop_assert_eq!(returned.default_value().unwrap(), Value::Int(default));
        prop_assert_eq!(resolved.default_value().unwrap(), Value::Int(0));
    }
}

#[test]
fn overlong_alias_chain_is_an_ordinary_error() {
    let table = alias_chain(quill_types::table::MAX_ALIAS_STEPS + 10, None);
    let err = TypeSpecifier::named("A0")
        .resolve(&table, AliasResolution::Resolve)
        .unwrap_err();
    assert!(!err.has_defect());
    assert_eq!(err.codes(), vec!["ALIAS_RESOLUTION_LIMIT"]);
}
