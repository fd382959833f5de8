//! Resolution of whole query trees

use indexmap::IndexSet;
use pretty_assertions::assert_eq;
use rstest::rstest;
use sqlweave_ast::{
    AliasedRelation, AliasedStar, BinaryOp, Field, Function, JoinConfig, JoinCriteria, JoinType,
    QueryClauses, Relation, RelationKind, SampleType, SelectQuery, SetOperation, SetQuantifier,
    SetQuery, Star, Table, TableQuery, Unnest, Value, ValuesQuery,
};
use sqlweave_semantic::{
    Resolve, ResolutionError, ResolveOptions, Resolver, Schema, SchemaField, Source,
    resolve_fields,
};
use sqlweave_types::DataType;
use sqlweave_types::builder::{array, bigint, boolean, double, integer, row, unknown, varchar};

fn int(value: i64) -> Value {
    Value::literal(value).unwrap()
}

fn select(values: Vec<Value>) -> SelectQuery {
    SelectQuery::new(values).unwrap()
}

fn catalog() -> Schema {
    Schema::table("a", [("k", bigint()), ("x", varchar(None)), ("xs", array(bigint()))])
        .merge(&Schema::table("b", [("k", integer()), ("v", double())]))
}

fn resolve(relation: impl Into<Relation>) -> Result<(Relation, Schema), ResolutionError> {
    let resolved = Resolver::default()
        .with_catalog(catalog())
        .resolve_relation(&relation.into())?;
    Ok((resolved.node, resolved.schema))
}

fn names(schema: &Schema) -> Vec<Option<&str>> {
    schema.fields.iter().map(|field| field.name.as_deref()).collect()
}

fn a_join_b() -> Relation {
    let on = Value::binary(
        BinaryOp::Equal,
        Value::qualified("a", "k"),
        Value::qualified("b", "k"),
    )
    .unwrap();
    Relation::join(
        Relation::table("a"),
        Relation::table("b"),
        JoinConfig::on(JoinType::Inner, on).unwrap(),
    )
}

/// `CONCAT(3 + x, 2 - a.y) + b.z / c.w`
fn concat_expression(x: Value, y: Value, z: Value, w: Value) -> Value {
    let concat = Value::call(
        Function::Concat,
        vec![
            Value::binary(BinaryOp::Add, int(3), x).unwrap(),
            Value::binary(BinaryOp::Minus, int(2), y).unwrap(),
        ],
    )
    .unwrap();
    let quotient = Value::binary(BinaryOp::Divide, z, w).unwrap();
    Value::binary(BinaryOp::Add, concat, quotient).unwrap()
}

#[test]
fn fields_resolve_inside_nested_expressions() {
    let schema = Schema::new(
        vec![
            SchemaField::new(Some("x".into()), Source::Anonymous(RelationKind::Select), bigint()),
            SchemaField::named("y", "a", bigint()),
            SchemaField::named("z", "b", bigint()),
        ],
        IndexSet::from(["a".to_string(), "b".to_string()]),
    );
    let expression = concat_expression(
        Value::field("x"),
        Value::qualified("a", "y"),
        Value::qualified("b", "z"),
        Value::qualified("c", "w"),
    );

    let resolved = resolve_fields(&expression, &schema).unwrap();

    let typed = |field: Field| Value::Field(field.with_type(bigint()));
    let expected = concat_expression(
        typed(Field::new("x")),
        typed(Field::qualified("a", "y")),
        typed(Field::qualified("b", "z")),
        Value::qualified("c", "w"),
    );
    assert_eq!(resolved, expected);
    assert!(resolved.data_type().is_unknown());
    assert!(expression.data_type().is_unknown());
}

#[rstest]
#[case(Value::qualified("a", "k"), Ok(bigint()))]
#[case(Value::qualified("b", "k"), Ok(integer()))]
#[case(Value::field("v"), Ok(double()))]
#[case(Value::field("k"), Err("SQW0200"))]
#[case(Value::qualified("b", "x"), Err("SQW0201"))]
#[case(Value::qualified("c", "k"), Ok(unknown()))]
#[case(Value::field("missing"), Ok(unknown()))]
fn join_scoping(#[case] reference: Value, #[case] expected: Result<DataType, &str>) {
    let query = select(vec![reference]).from_relation(a_join_b());
    match (resolve(query), expected) {
        (Ok((node, _)), Ok(dtype)) => assert_eq!(node.data_type(), dtype),
        (Err(err), Err(code)) => assert_eq!(err.code().to_string(), code),
        (got, want) => panic!("got {got:?}, expected {want:?}"),
    }
}

#[test]
fn join_returns_both_sides_and_types_the_constraint() {
    let query = select(vec![Value::qualified("a", "k"), Value::qualified("b", "v")])
        .from_relation(a_join_b());
    let (node, schema) = resolve(query).unwrap();

    assert_eq!(node.data_type(), row(vec![bigint(), double()]));
    assert_eq!(names(&schema), vec![Some("k"), Some("v")]);
    assert!(schema.relation_ids.is_empty());

    let Relation::Select(select) = &node else {
        panic!("expected a select");
    };
    let Some(Relation::Join(join)) = &select.from else {
        panic!("expected a join");
    };
    let Some(JoinCriteria::On(Value::Binary(eq))) = &join.config.criteria else {
        panic!("expected an ON constraint");
    };
    assert_eq!(eq.left.data_type(), bigint());
    assert_eq!(eq.right.data_type(), integer());
}

#[test]
fn subqueries_do_not_see_the_enclosing_scope() {
    // SELECT s FROM (SELECT k AS s FROM a) q
    let inner = select(vec![Value::field("k").alias("s").unwrap()]).from_relation(Relation::table("a"));
    let query = select(vec![Value::field("s")]).from_relation(Relation::from(inner).alias("q"));
    let query = Relation::from(query);

    let scoped = Schema::table("a", [("k", bigint())]);
    let resolved = query.resolve(&scoped).unwrap();
    assert!(resolved.node.data_type().is_unknown());

    // A catalog table is visible at any depth
    let resolved = Resolver::default()
        .with_catalog(scoped)
        .resolve_relation(&query)
        .unwrap();
    assert_eq!(resolved.node.data_type(), bigint());
}

#[test]
fn lateral_sees_the_left_side() {
    // SELECT n FROM a CROSS JOIN [LATERAL] (SELECT n FROM UNNEST(a.xs) u (n))
    let unnested = AliasedRelation::new(
        Unnest::new(vec![Value::qualified("a", "xs")], false).into(),
        "u",
    )
    .with_columns(["n"]);
    let subquery: Relation = select(vec![Value::field("n")]).from_relation(unnested).into();

    let query = |right: Relation| {
        select(vec![Value::field("n")]).from_relation(Relation::join(
            Relation::table("a"),
            right,
            JoinConfig::cross(),
        ))
    };

    let (node, _) = resolve(query(Relation::lateral(subquery.clone()).unwrap())).unwrap();
    assert_eq!(node.data_type(), bigint());

    let (node, _) = resolve(query(subquery.alias("t"))).unwrap();
    assert!(node.data_type().is_unknown());
}

fn correlated_b() -> SelectQuery {
    // SELECT v FROM b WHERE b.k = a.k
    let on_outer = Value::binary(
        BinaryOp::Equal,
        Value::qualified("b", "k"),
        Value::qualified("a", "k"),
    )
    .unwrap();
    select(vec![Value::field("v")])
        .from_relation(Relation::table("b"))
        .filter(on_outer)
}

#[test]
fn correlated_lateral_keeps_outer_references() {
    // SELECT v FROM a CROSS JOIN LATERAL (SELECT v FROM b WHERE b.k = a.k)
    let lateral = Relation::lateral(correlated_b().into()).unwrap();
    let query = select(vec![Value::field("v")]).from_relation(Relation::join(
        Relation::table("a"),
        lateral,
        JoinConfig::cross(),
    ));

    let (node, schema) = resolve(query).unwrap();
    assert_eq!(node.data_type(), double());
    assert_eq!(names(&schema), vec![Some("v")]);
}

#[test]
fn correlated_scalar_subquery_resolves() {
    // SELECT (SELECT v FROM b WHERE b.k = a.k) FROM a
    let query = select(vec![Value::subquery(correlated_b().into())]).from_relation(Relation::table("a"));
    let (node, _) = resolve(query).unwrap();
    assert_eq!(node.data_type(), double());

    let Relation::Select(outer) = node else {
        panic!("expected a select");
    };
    let Value::Subquery(inner) = &outer.select[0] else {
        panic!("expected a subquery");
    };
    let Relation::Select(inner) = inner.as_ref() else {
        panic!("expected a select");
    };
    let Some(condition @ Value::Binary(eq)) = &inner.where_ else {
        panic!("expected a comparison");
    };
    assert_eq!(condition.data_type(), boolean());
    assert_eq!(eq.left.data_type(), integer());
    assert!(eq.right.data_type().is_unknown());
}

#[test]
fn tablesample_keeps_the_ambient_schema() {
    // SELECT n FROM a CROSS JOIN (SELECT n FROM UNNEST(a.xs) u (n)) TABLESAMPLE BERNOULLI (50)
    let unnested = AliasedRelation::new(
        Unnest::new(vec![Value::qualified("a", "xs")], false).into(),
        "u",
    )
    .with_columns(["n"]);
    let subquery: Relation = select(vec![Value::field("n")]).from_relation(unnested).into();
    let sampled = Relation::sample(subquery, SampleType::Bernoulli, int(50));

    let query = select(vec![Value::field("n")]).from_relation(Relation::join(
        Relation::table("a"),
        sampled,
        JoinConfig::cross(),
    ));
    let (node, schema) = resolve(query).unwrap();
    assert_eq!(node.data_type(), bigint());
    assert_eq!(names(&schema), vec![Some("n")]);
}

#[test]
fn values_yield_one_unnamed_field_per_row() {
    // VALUES (1), (2.5)
    let values = ValuesQuery::new(vec![int(1), Value::literal(2.5).unwrap()]).unwrap();

    let (node, schema) = resolve(values).unwrap();
    assert_eq!(node.data_type(), double());
    let source = Source::Anonymous(RelationKind::Values);
    assert_eq!(
        schema.fields,
        vec![
            SchemaField::unnamed(source.clone(), integer()),
            SchemaField::unnamed(source, double()),
        ]
    );
    assert!(schema.relation_ids.is_empty());
}

#[test]
fn unnest_columns_follow_the_arrays() {
    // SELECT * FROM a CROSS JOIN UNNEST(a.xs) WITH ORDINALITY
    let unnest = Unnest::new(vec![Value::qualified("a", "xs")], true);
    let query = select(vec![Value::star()]).from_relation(Relation::join(
        Relation::table("a"),
        unnest.into(),
        JoinConfig::cross(),
    ));

    let (node, schema) = resolve(query).unwrap();
    assert_eq!(
        node.data_type(),
        row(vec![bigint(), varchar(None), array(bigint()), bigint(), bigint()])
    );
    assert_eq!(names(&schema), vec![Some("k"), Some("x"), Some("xs"), None, None]);
}

fn cte(name: &str, column: &str, query: SelectQuery) -> AliasedRelation {
    AliasedRelation::new(query.into(), name).with_columns([column])
}

fn with(ctes: Vec<AliasedRelation>) -> QueryClauses {
    QueryClauses {
        with_: ctes,
        ..QueryClauses::default()
    }
}

#[test]
fn ctes_see_earlier_ctes_only() {
    // WITH a (foo) AS (SELECT 1), b (bar) AS (SELECT a.foo + 1 FROM a) SELECT bar FROM b
    let first = cte("a", "foo", select(vec![int(1)]));
    let second = cte(
        "b",
        "bar",
        select(vec![
            Value::binary(BinaryOp::Add, Value::qualified("a", "foo"), int(1)).unwrap(),
        ])
        .from_relation(Relation::table("a")),
    );
    let outer = || select(vec![Value::field("bar")]).from_relation(Relation::table("b"));

    let (node, _) = resolve(outer().with_clauses(with(vec![first.clone(), second.clone()]))).unwrap();
    assert_eq!(node.data_type(), integer());

    let (node, _) = resolve(outer().with_clauses(with(vec![second, first]))).unwrap();
    assert!(node.data_type().is_unknown());
}

#[test]
fn ctes_shadow_catalog_tables() {
    // WITH a (k) AS (SELECT 'x') SELECT k FROM a
    let shadow = cte("a", "k", select(vec![Value::literal("x").unwrap()]));
    let query = select(vec![Value::field("k")])
        .from_relation(Relation::table("a"))
        .with_clauses(with(vec![shadow]));
    let (node, _) = resolve(query).unwrap();
    assert_eq!(node.data_type(), varchar(Some(1)));
}

#[test]
fn table_query_is_typed_by_its_cte() {
    // WITH t AS (SELECT 1 AS one) TABLE t
    let t = AliasedRelation::new(select(vec![int(1).alias("one").unwrap()]).into(), "t");
    let query = TableQuery::new(Table::new("t")).with_clauses(with(vec![t]));

    let (node, schema) = resolve(query).unwrap();
    assert_eq!(node.data_type(), integer());
    assert_eq!(names(&schema), vec![Some("one")]);
}

#[test]
fn set_query_takes_names_from_the_left() {
    // SELECT k AS id FROM a UNION ALL SELECT v FROM b
    let left = select(vec![Value::field("k").alias("id").unwrap()]).from_relation(Relation::table("a"));
    let right = select(vec![Value::field("v")]).from_relation(Relation::table("b"));
    let union = SetQuery::new(
        SetOperation::Union,
        SetQuantifier::All,
        left.into(),
        right.into(),
    )
    .unwrap();
    assert!(Relation::from(union.clone()).data_type().is_unknown());

    let (node, schema) = resolve(union).unwrap();
    assert_eq!(node.data_type(), double());
    assert_eq!(
        schema.fields,
        vec![SchemaField::new(
            Some("id".into()),
            Source::Anonymous(RelationKind::SetQuery),
            bigint()
        )]
    );
}

#[test]
fn aliased_star_renames_columns() {
    // SELECT b.* AS (p, q) FROM b
    let star = AliasedStar::new(Star::new(Some("b".into())), vec!["p".into(), "q".into()]);
    let query = select(vec![Value::AliasedStar(star)]).from_relation(Relation::table("b"));

    let (node, schema) = resolve(query).unwrap();
    assert_eq!(node.data_type(), row(vec![integer(), double()]));
    assert_eq!(names(&schema), vec![Some("p"), Some("q")]);
}

#[test]
fn where_and_order_by_see_the_from_schema() {
    let query = select(vec![Value::field("x")])
        .from_relation(Relation::table("a"))
        .filter(Value::binary(BinaryOp::Greater, Value::field("k"), int(1)).unwrap())
        .with_clauses(QueryClauses {
            order_by: vec![sqlweave_ast::OrderTerm::new(Value::field("k")).desc()],
            limit: Some(10),
            ..QueryClauses::default()
        });

    let (node, _) = resolve(query).unwrap();
    let Relation::Select(select) = node else {
        panic!("expected a select");
    };
    let Some(Value::Binary(greater)) = &select.where_ else {
        panic!("expected a comparison");
    };
    assert_eq!(greater.left.data_type(), bigint());
    assert_eq!(select.clauses.order_by[0].value.data_type(), bigint());
    assert_eq!(select.clauses.limit, Some(10));
}

#[test]
fn scalar_subqueries_resolve_on_their_own() {
    // SELECT (SELECT v FROM b) FROM a
    let scalar = Value::subquery(select(vec![Value::field("v")]).from_relation(Relation::table("b")).into());
    let query = select(vec![scalar]).from_relation(Relation::table("a"));
    let (node, _) = resolve(query).unwrap();
    assert_eq!(node.data_type(), double());
}

#[test]
fn base_tables_are_recorded() {
    let mut resolver = Resolver::default().with_catalog(catalog());
    let query = select(vec![Value::star()]).from_relation(a_join_b());
    resolver.resolve_relation(&query.into()).unwrap();

    assert_eq!(
        resolver.table_schema("b"),
        Some(&Schema::table("b", [("k", integer()), ("v", double())]))
    );
    let recorded: Vec<&str> = resolver.tables().map(|(name, _)| name).collect();
    assert_eq!(recorded, vec!["a", "b"]);
}

#[test]
fn recorded_tables_belong_to_the_last_run() {
    let mut resolver = Resolver::default().with_catalog(catalog());
    resolver.resolve_relation(&Relation::table("a")).unwrap();
    resolver.resolve_relation(&Relation::table("b")).unwrap();

    let recorded: Vec<&str> = resolver.tables().map(|(name, _)| name).collect();
    assert_eq!(recorded, vec!["b"]);
    assert_eq!(resolver.table_schema("a"), None);
}

#[test]
fn unknown_tables_still_bind_their_name() {
    let (_, schema) = resolve(Relation::table("nowhere")).unwrap();
    assert!(schema.fields.is_empty());
    assert!(schema.binds("nowhere"));
}

#[test]
fn deny_unresolved_lists_every_reference() {
    let query = select(vec![Value::field("nope"), Value::qualified("zz", "q"), Value::field("v")])
        .from_relation(Relation::table("b"));
    let mut resolver = Resolver::new(ResolveOptions {
        deny_unresolved: true,
        ..ResolveOptions::default()
    })
    .with_catalog(catalog());

    let err = resolver.resolve_relation(&query.into()).unwrap_err();
    assert_eq!(
        err,
        ResolutionError::Unresolved {
            names: vec!["nope".into(), "zz.q".into()]
        }
    );
    assert_eq!(err.code().to_string(), "SQW0202");
}

#[test]
fn nesting_is_bounded() {
    let mut relation = Relation::table("t");
    for depth in 0..10 {
        relation = relation.alias(format!("t{depth}"));
    }

    let mut shallow = Resolver::new(ResolveOptions {
        max_depth: 5,
        ..ResolveOptions::default()
    });
    assert_eq!(
        shallow.resolve_relation(&relation).unwrap_err(),
        ResolutionError::DepthExceeded { max_depth: 5 }
    );

    let (_, schema) = resolve(relation).unwrap();
    assert!(schema.binds("t9"));
}

#[test]
fn column_alias_count_is_checked() {
    let query = AliasedRelation::new(Relation::table("b"), "q").with_columns(["only"]);
    let err = resolve(query).unwrap_err();
    assert_eq!(err.code().to_string(), "SQW0204");
}
