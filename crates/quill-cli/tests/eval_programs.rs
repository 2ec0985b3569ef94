//! End-to-end programs: preparation diagnostics and execution results.

mod common;

use common::*;
use quill_ast::ast::{BinOp, Stmt};
use quill_ast::TypeSpecifier;

fn shape() -> Stmt {
    sum(
        "Shape",
        vec![
            variant_record("Circle", vec![field_default(TypeSpecifier::double(), "radius", double(1.0))]),
            variant("Square", TypeSpecifier::int()),
        ],
    )
}

fn point() -> Stmt {
    record(
        "Point",
        vec![field(TypeSpecifier::int(), "x"), field(TypeSpecifier::int(), "y")],
    )
}

#[test]
fn record_defaults_and_member_assignment() {
    let printed = run_ok(vec![
        point(),
        declare(named("Point"), "p"),
        assign_member("p", "x", int(3)),
        print(var("p")),
        print(member(var("p"), "y")),
    ]);
    assert_eq!(printed, "Point { x: 3, y: 0 }\n0\n");
}

#[test]
fn sum_default_is_first_variant() {
    let printed = run_ok(vec![shape(), declare(named("Shape"), "s"), print(var("s"))]);
    assert!(printed.starts_with("Circle("), "unexpected output: {}", printed);
    assert!(printed.contains("radius: 1.0"), "unexpected output: {}", printed);
}

#[test]
fn match_binds_the_active_variant() {
    let describe = function(
        "describe",
        vec![("s", named("Shape"))],
        TypeSpecifier::string(),
        vec![match_(
            var("s"),
            vec![
                arm(
                    "Circle",
                    Some("c"),
                    vec![ret(bin(BinOp::Add, string("circle "), member(var("c"), "radius")))],
                ),
                arm(
                    "Square",
                    Some("side"),
                    vec![ret(bin(BinOp::Add, string("square "), var("side")))],
                ),
            ],
            None,
        )],
    );
    let printed = run_ok(vec![
        shape(),
        describe,
        declare(named("Shape"), "s"),
        print(call("describe", vec![var("s")])),
        assign("s", int(4)),
        print(call("describe", vec![var("s")])),
    ]);
    assert_eq!(printed, "circle 1.0\nsquare 4\n");
}

#[test]
fn match_without_every_variant_needs_else() {
    let errors = check(vec![
        shape(),
        declare(named("Shape"), "s"),
        match_(var("s"), vec![arm("Circle", None, vec![])], None),
    ]);
    assert_eq!(errors.codes(), vec!["NON_EXHAUSTIVE_MATCH"]);

    let errors = check(vec![
        shape(),
        declare(named("Shape"), "s"),
        match_(var("s"), vec![arm("Circle", None, vec![])], Some(vec![])),
    ]);
    assert!(errors.is_empty(), "unexpected errors:\n{}", errors);
}

#[test]
fn match_rejects_unknown_variant() {
    let errors = check(vec![
        shape(),
        declare(named("Shape"), "s"),
        match_(var("s"), vec![arm("Triangle", None, vec![])], Some(vec![])),
    ]);
    assert_eq!(errors.codes(), vec!["UNKNOWN_VARIANT"]);
}

#[test]
fn maybe_starts_empty_and_takes_values() {
    let printed = run_ok(vec![
        declare(TypeSpecifier::maybe(TypeSpecifier::int()), "m"),
        print(var("m")),
        print(bin(BinOp::Eq, var("m"), nil())),
        assign("m", int(5)),
        print(var("m")),
        print(bin(BinOp::Eq, var("m"), nil())),
    ]);
    assert_eq!(printed, "empty\ntrue\n5\nfalse\n");
}

#[test]
fn duplicate_declaration_is_reported_once() {
    let mut second = declare_init(TypeSpecifier::int(), "x", int(2));
    if let Stmt::Declare(decl) = &mut second {
        decl.name = id_at("x", sp(2, 5));
    }
    let errors = check(vec![declare_init(TypeSpecifier::int(), "x", int(1)), second]);
    assert_eq!(errors.codes(), vec!["PREVIOUS_DECLARATION"]);
    assert_eq!(errors.first().map(|d| d.span), Some(sp(2, 5)));
}

#[test]
fn shadowing_in_a_nested_block_is_allowed() {
    let printed = run_ok(vec![
        declare_init(TypeSpecifier::int(), "x", int(1)),
        block(vec![declare_init(TypeSpecifier::int(), "x", int(2)), print(var("x"))]),
        print(var("x")),
    ]);
    assert_eq!(printed, "2\n1\n");
}

#[test]
fn loops_do_not_guarantee_a_return() {
    let errors = check(vec![function(
        "f",
        vec![("n", TypeSpecifier::int())],
        TypeSpecifier::int(),
        vec![while_(
            bin(BinOp::Gt, var("n"), int(0)),
            vec![ret(var("n"))],
        )],
    )]);
    assert_eq!(errors.codes(), vec!["FUNCTION_RETURN_MISMATCH"]);

    let errors = check(vec![function(
        "g",
        vec![("n", TypeSpecifier::int())],
        TypeSpecifier::int(),
        vec![if_(bin(BinOp::Gt, var("n"), int(0)), vec![ret(var("n"))])],
    )]);
    assert_eq!(errors.codes(), vec!["FUNCTION_RETURN_MISMATCH"]);
}

#[test]
fn do_while_body_always_runs() {
    let errors = check(vec![function(
        "f",
        vec![("n", TypeSpecifier::int())],
        TypeSpecifier::int(),
        vec![do_while(vec![ret(var("n"))], bin(BinOp::Gt, var("n"), int(0)))],
    )]);
    assert!(errors.is_empty(), "unexpected errors:\n{}", errors);
}

#[test]
fn recursion_and_call_depth() {
    let fact = function(
        "fact",
        vec![("n", TypeSpecifier::int())],
        TypeSpecifier::int(),
        vec![
            if_(bin(BinOp::Le, var("n"), int(1)), vec![ret(int(1))]),
            ret(bin(
                BinOp::Mul,
                var("n"),
                call("fact", vec![bin(BinOp::Sub, var("n"), int(1))]),
            )),
        ],
    );
    let printed = run_ok(vec![fact, print(call("fact", vec![int(10)]))]);
    assert_eq!(printed, "3628800\n");

    let forever = function(
        "forever",
        vec![("n", TypeSpecifier::int())],
        TypeSpecifier::int(),
        vec![ret(call("forever", vec![bin(BinOp::Add, var("n"), int(1))]))],
    );
    let (outcome, _) = run(vec![forever, print(call("forever", vec![int(0)]))]);
    let errors = outcome.expect_err("unbounded recursion must fail");
    assert_eq!(errors.codes(), vec!["CALL_DEPTH_EXCEEDED"]);
    assert!(!errors.has_defect());
}

#[test]
fn unknown_declared_type_is_reported_once() {
    let errors = check(vec![
        declare(named("Nope"), "x"),
        print(var("x")),
        assign("x", int(1)),
        declare_init(TypeSpecifier::int(), "y", var("x")),
        print(var("y")),
    ]);
    assert_eq!(errors.codes(), vec!["UNDECLARED_TYPE"]);
}

#[test]
fn failed_inferred_declaration_does_not_cascade() {
    let errors = check(vec![
        infer("y", var("missing")),
        print(var("y")),
        block(vec![print(bin(BinOp::Add, var("y"), int(1)))]),
    ]);
    assert_eq!(errors.codes(), vec!["UNDECLARED_VARIABLE"]);
}

#[test]
fn failed_declaration_still_occupies_its_name() {
    let errors = check(vec![
        declare(named("Nope"), "x"),
        declare_init(TypeSpecifier::int(), "x", int(1)),
    ]);
    assert_eq!(errors.codes(), vec!["UNDECLARED_TYPE", "PREVIOUS_DECLARATION"]);
}

#[test]
fn argument_count_is_checked() {
    let errors = check(vec![
        function(
            "id",
            vec![("n", TypeSpecifier::int())],
            TypeSpecifier::int(),
            vec![ret(var("n"))],
        ),
        expr(call("id", vec![int(1), int(2)])),
    ]);
    assert_eq!(errors.codes(), vec!["FUNCTION_ARGUMENT_COUNT"]);
}

#[test]
fn escaped_closure_reports_released_scope() {
    let (outcome, printed) = run(vec![
        declare(fn_type(vec![], TypeSpecifier::int()), "f"),
        block(vec![
            declare_init(TypeSpecifier::int(), "local", int(7)),
            function("g", vec![], TypeSpecifier::int(), vec![ret(var("local"))]),
            assign("f", var("g")),
            print(call("f", vec![])),
        ]),
        print(call("f", vec![])),
    ]);
    assert_eq!(printed, "7\n");
    let errors = outcome.expect_err("calling an escaped closure must fail");
    assert_eq!(errors.codes(), vec!["CLOSURE_SCOPE_RELEASED"]);
    assert!(errors.has_defect());
}

#[test]
fn unassigned_function_returns_default() {
    let printed = run_ok(vec![
        declare(fn_type(vec![TypeSpecifier::int()], TypeSpecifier::string()), "f"),
        print(bin(BinOp::Eq, call("f", vec![int(1)]), string(""))),
    ]);
    assert_eq!(printed, "true\n");
}

#[test]
fn surplus_type_argument_is_reported_at_its_position() {
    let extra = TypeSpecifier::int().at(sp(3, 19));
    let errors = check(vec![
        generic_record(
            "Pair",
            &["A", "B"],
            vec![field(named("A"), "first"), field(named("B"), "second")],
        ),
        declare(
            generic("Pair", vec![TypeSpecifier::int(), TypeSpecifier::int(), extra]),
            "p",
        ),
    ]);
    assert_eq!(errors.codes(), vec!["TOO_MANY_ARGUMENTS"]);
    assert_eq!(errors.first().map(|d| d.span), Some(sp(3, 19)));
}

#[test]
fn surplus_type_argument_at_call_site() {
    let pick = generic_function(
        "pick",
        &["A", "B"],
        vec![("a", named("A")), ("b", named("B"))],
        named("A"),
        vec![ret(var("a"))],
    );
    let extra = TypeSpecifier::double().at(sp(4, 22));
    let errors = check(vec![
        pick,
        expr(generic_call(
            "pick",
            vec![TypeSpecifier::int(), TypeSpecifier::string(), extra],
            vec![int(1), string("x")],
        )),
    ]);
    assert_eq!(errors.codes(), vec!["TOO_MANY_ARGUMENTS"]);
    assert_eq!(errors.first().map(|d| d.span), Some(sp(4, 22)));
}

#[test]
fn explicit_type_arguments_at_call_site() {
    let pick = generic_function(
        "pick",
        &["A", "B"],
        vec![("a", named("A")), ("b", named("B"))],
        named("A"),
        vec![ret(var("a"))],
    );
    let printed = run_ok(vec![
        pick,
        print(generic_call(
            "pick",
            vec![TypeSpecifier::double(), TypeSpecifier::string()],
            vec![int(2), string("x")],
        )),
    ]);
    assert_eq!(printed, "2.0\n");
}

#[test]
fn generic_record_instantiation() {
    let printed = run_ok(vec![
        generic_record(
            "Pair",
            &["A", "B"],
            vec![field(named("A"), "first"), field(named("B"), "second")],
        ),
        declare(
            generic("Pair", vec![TypeSpecifier::int(), TypeSpecifier::string()]),
            "p",
        ),
        assign_member("p", "second", string("s")),
        print(var("p")),
    ]);
    assert_eq!(printed, "Pair<int, string> { first: 0, second: \"s\" }\n");
}

#[test]
fn generic_function_infers_from_arguments() {
    let first = generic_function(
        "first",
        &["T"],
        vec![("xs", list(named("T")))],
        named("T"),
        vec![ret(index(var("xs"), int(0)))],
    );
    let printed = run_ok(vec![
        first,
        print(call("first", vec![array(vec![int(3), int(4)])])),
        print(call("first", vec![array(vec![string("a"), string("b")])])),
    ]);
    assert_eq!(printed, "3\na\n");
}

#[test]
fn alias_default_applies_only_through_the_alias() {
    let printed = run_ok(vec![
        alias("Port", TypeSpecifier::int(), Some(int(8080))),
        declare(named("Port"), "p"),
        declare(TypeSpecifier::int(), "q"),
        print(var("p")),
        print(var("q")),
        print(bin(BinOp::Add, var("p"), int(1))),
    ]);
    assert_eq!(printed, "8080\n0\n8081\n");
}

#[test]
fn readonly_record_members_cannot_be_assigned() {
    let config = readonly_record(
        "Config",
        vec![field_default(TypeSpecifier::int(), "port", int(80))],
    );
    let errors = check(vec![
        config.clone(),
        declare(named("Config"), "c"),
        assign_member("c", "port", int(1)),
    ]);
    assert_eq!(errors.codes(), vec!["READ_ONLY_ASSIGNMENT"]);

    let printed = run_ok(vec![
        config,
        declare(named("Config"), "c"),
        print(member(var("c"), "port")),
    ]);
    assert_eq!(printed, "80\n");
}

#[test]
fn types_may_be_used_before_their_declaration() {
    let printed = run_ok(vec![
        record(
            "Line",
            vec![field(named("Point"), "from"), field(named("Point"), "to")],
        ),
        point(),
        declare(named("Line"), "l"),
        print(member(member(var("l"), "to"), "x")),
    ]);
    assert_eq!(printed, "0\n");
}

#[test]
fn record_cannot_contain_itself_directly() {
    let errors = check(vec![record(
        "Node",
        vec![field(TypeSpecifier::int(), "value"), field(named("Node"), "next")],
    )]);
    assert_eq!(errors.codes(), vec!["PARTIALLY_DECLARED_TYPE"]);

    let printed = run_ok(vec![
        record(
            "List",
            vec![
                field(TypeSpecifier::int(), "value"),
                field(TypeSpecifier::maybe(named("List")), "next"),
            ],
        ),
        declare(named("List"), "l"),
        print(member(var("l"), "next")),
    ]);
    assert_eq!(printed, "empty\n");
}

#[test]
fn circular_aliases_are_rejected() {
    let errors = check(vec![alias("A", list(named("A")), None)]);
    assert_eq!(errors.codes(), vec!["CIRCULAR_ALIAS"]);

    let errors = check(vec![
        alias("A", named("B"), None),
        alias("B", named("A"), None),
    ]);
    assert!(
        errors.codes().contains(&"CIRCULAR_ALIAS"),
        "unexpected errors:\n{}",
        errors
    );
}

#[test]
fn sum_needs_two_variants() {
    let errors = check(vec![sum("Only", vec![variant("One", TypeSpecifier::int())])]);
    assert_eq!(errors.codes(), vec!["SUM_TOO_FEW_VARIANTS"]);
}

#[test]
fn condition_must_be_boolean() {
    let errors = check(vec![if_(int(1), vec![])]);
    assert_eq!(errors.codes(), vec!["INVALID_CONDITIONAL_EXPRESSION_TYPE"]);
}

#[test]
fn return_outside_function_is_rejected() {
    let errors = check(vec![ret(int(1))]);
    assert_eq!(errors.codes(), vec!["RETURN_OUTSIDE_FUNCTION"]);
}

#[test]
fn errors_accumulate_across_statements() {
    let errors = check(vec![
        declare_init(TypeSpecifier::int(), "a", string("x")),
        print(var("undefined")),
        declare_init(TypeSpecifier::string(), "s", double(1.5)),
    ]);
    assert_eq!(
        errors.codes(),
        vec![
            "INVALID_INITIALIZER_TYPE",
            "UNDECLARED_VARIABLE",
            "INVALID_INITIALIZER_TYPE"
        ]
    );
}

#[test]
fn nothing_runs_when_preparation_fails() {
    let (outcome, printed) = run(vec![
        print(int(1)),
        declare_init(TypeSpecifier::int(), "a", string("x")),
    ]);
    assert!(outcome.is_err());
    assert_eq!(printed, "");
}

#[test]
fn division_by_zero_stops_execution() {
    let (outcome, printed) = run(vec![
        declare_init(TypeSpecifier::int(), "z", int(0)),
        print(string("before")),
        print(bin(BinOp::Div, int(10), var("z"))),
        print(string("after")),
    ]);
    assert_eq!(printed, "before\n");
    let errors = outcome.expect_err("division by zero must fail");
    assert_eq!(errors.codes(), vec!["DIVISION_BY_ZERO"]);
}

#[test]
fn dynamic_arrays_grow_at_their_end() {
    let (outcome, printed) = run(vec![
        declare_init(list(TypeSpecifier::int()), "xs", array(vec![int(1), int(2)])),
        assign_index("xs", int(2), int(3)),
        print(var("xs")),
        print(call("length", vec![var("xs")])),
        print(index(var("xs"), int(5))),
    ]);
    assert_eq!(printed, "[1, 2, 3]\n3\n");
    let errors = outcome.expect_err("out-of-bounds read must fail");
    assert_eq!(errors.codes(), vec!["ARRAY_INDEX_OUT_OF_BOUNDS"]);
}

#[test]
fn for_loop_scope_and_accumulation() {
    let for_loop = Stmt::For {
        init: Some(Box::new(declare_init(TypeSpecifier::int(), "i", int(0)))),
        cond: Some(bin(BinOp::Lt, var("i"), int(5))),
        update: Some(Box::new(assign("i", bin(BinOp::Add, var("i"), int(1))))),
        body: Box::new(block(vec![assign(
            "total",
            bin(BinOp::Add, var("total"), var("i")),
        )])),
        span: Default::default(),
    };
    let printed = run_ok(vec![
        declare_init(TypeSpecifier::int(), "total", int(0)),
        for_loop,
        print(var("total")),
    ]);
    assert_eq!(printed, "10\n");
}

#[test]
fn inferred_declaration_takes_initializer_type() {
    let errors = check(vec![
        infer("n", int(1)),
        assign("n", string("text")),
    ]);
    assert_eq!(errors.codes(), vec!["ASSIGNMENT_TYPE_ERROR"]);
}

#[test]
fn program_scope_is_readable_after_run() {
    let (outcome, _) = run(vec![declare_init(TypeSpecifier::int(), "answer", int(42))]);
    let context = outcome.expect("program runs");
    assert_eq!(context.get("answer"), Some(quill_types::Value::Int(42)));
}
