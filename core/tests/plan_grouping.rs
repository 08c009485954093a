//! Plan expansion and grouping tests
//!
//! Exercise the diff → rewrite → group path over realistic migrations and
//! assert the execution-group shape the applier relies on.

use pgschema_core::diff::diff_irs;
use pgschema_core::fingerprint::Fingerprint;
use pgschema_core::ir::{
    Column, Constraint, ConstraintKind, Index, IndexColumn, IndexKind, Ir, Schema, Table,
};
use pgschema_core::plan::{Plan, SqlFormat};

fn column(name: &str, position: i32, data_type: &str) -> Column {
    Column {
        name: name.to_string(),
        position,
        data_type: data_type.to_string(),
        not_null: false,
        default: None,
        identity: None,
        generated: None,
        comment: None,
    }
}

fn table(name: &str, columns: Vec<Column>) -> Table {
    Table {
        schema: "public".to_string(),
        name: name.to_string(),
        columns,
        ..Default::default()
    }
}

fn index(table_name: &str, name: &str, columns: Vec<&str>) -> Index {
    Index {
        schema: "public".to_string(),
        table: table_name.to_string(),
        name: name.to_string(),
        method: "btree".to_string(),
        columns: columns
            .into_iter()
            .map(|c| IndexColumn {
                value: c.to_string(),
                is_expression: false,
                asc: true,
                opclass: None,
            })
            .collect(),
        kind: IndexKind::Regular,
        predicate: None,
        comment: None,
    }
}

fn ir_of(tables: Vec<Table>) -> Ir {
    let mut schema = Schema::new("public");
    for t in tables {
        schema.tables.insert(t.name.clone(), t);
    }
    let mut ir = Ir::default();
    ir.schemas.insert("public".to_string(), schema);
    ir
}

fn plan_between(current: &Ir, desired: &Ir) -> Plan {
    let diffs = diff_irs(current, desired, "public").unwrap();
    let fingerprint = Fingerprint::compute(current, "public").unwrap();
    Plan::new(&diffs, Some(fingerprint))
}

#[test]
fn mixed_ddl_splits_into_transactional_and_concurrent_groups() {
    let current = ir_of(vec![table("events", vec![column("id", 1, "bigint")])]);

    let mut desired_table = table(
        "events",
        vec![
            column("id", 1, "bigint"),
            column("kind", 2, "text"),
            column("payload", 3, "jsonb"),
        ],
    );
    desired_table.indexes.insert(
        "events_kind_idx".to_string(),
        index("events", "events_kind_idx", vec!["kind"]),
    );
    desired_table.indexes.insert(
        "events_payload_idx".to_string(),
        index("events", "events_payload_idx", vec!["payload"]),
    );
    let desired = ir_of(vec![desired_table]);

    let plan = plan_between(&current, &desired);

    // One transactional group for the column additions, one
    // non-transactional group with (create concurrently + wait) per index.
    assert_eq!(plan.groups.len(), 2);

    let columns_group = &plan.groups[0];
    assert!(columns_group.transactional());
    assert_eq!(columns_group.steps.len(), 2);
    assert!(columns_group.steps[0].sql.contains("ADD COLUMN \"kind\""));
    assert!(columns_group.steps[1].sql.contains("ADD COLUMN \"payload\""));

    let index_group = &plan.groups[1];
    assert!(!index_group.transactional());
    assert_eq!(index_group.steps.len(), 4);
    assert!(index_group.steps[0]
        .sql
        .contains("CREATE INDEX CONCURRENTLY IF NOT EXISTS \"events_kind_idx\""));
    assert!(index_group.steps[1].directive.is_some());
    assert!(index_group.steps[2]
        .sql
        .contains("CREATE INDEX CONCURRENTLY IF NOT EXISTS \"events_payload_idx\""));
    assert!(index_group.steps[3].directive.is_some());
}

#[test]
fn new_foreign_key_is_added_not_valid_then_validated() {
    let users = table("users", vec![column("id", 1, "integer")]);
    let orders = table(
        "orders",
        vec![column("id", 1, "integer"), column("user_id", 2, "integer")],
    );
    let current = ir_of(vec![users.clone(), orders.clone()]);

    let mut orders_with_fk = orders;
    orders_with_fk.constraints.insert(
        "orders_user_id_fkey".to_string(),
        Constraint {
            schema: "public".to_string(),
            table: "orders".to_string(),
            name: "orders_user_id_fkey".to_string(),
            kind: ConstraintKind::ForeignKey,
            columns: vec!["user_id".to_string()],
            referenced_schema: Some("public".to_string()),
            referenced_table: Some("users".to_string()),
            referenced_columns: vec!["id".to_string()],
            on_update: None,
            on_delete: Some("CASCADE".to_string()),
            deferrable: true,
            initially_deferred: false,
            expression: None,
            validated: true,
        },
    );
    let desired = ir_of(vec![users, orders_with_fk]);

    let plan = plan_between(&current, &desired);
    assert_eq!(plan.groups.len(), 1);
    let steps = &plan.groups[0].steps;
    assert_eq!(steps.len(), 2);
    assert!(steps[0].sql.contains("ADD CONSTRAINT \"orders_user_id_fkey\""));
    assert!(steps[0].sql.contains("ON DELETE CASCADE"));
    assert!(steps[0].sql.contains("DEFERRABLE"));
    assert!(steps[0].sql.ends_with("NOT VALID"));
    assert_eq!(
        steps[1].sql,
        "ALTER TABLE \"orders\" VALIDATE CONSTRAINT \"orders_user_id_fkey\""
    );
}

#[test]
fn not_null_transition_expands_to_four_steps() {
    let current = ir_of(vec![table(
        "users",
        vec![column("id", 1, "integer"), column("email", 2, "text")],
    )]);
    let mut email_not_null = column("email", 2, "text");
    email_not_null.not_null = true;
    let desired = ir_of(vec![table(
        "users",
        vec![column("id", 1, "integer"), email_not_null],
    )]);

    let plan = plan_between(&current, &desired);
    assert_eq!(plan.groups.len(), 1);
    let sqls: Vec<&str> = plan.groups[0]
        .steps
        .iter()
        .map(|s| s.sql.as_str())
        .collect();
    assert_eq!(
        sqls,
        vec![
            "ALTER TABLE \"users\" ADD CONSTRAINT \"email_not_null\" CHECK (\"email\" IS NOT NULL) NOT VALID",
            "ALTER TABLE \"users\" VALIDATE CONSTRAINT \"email_not_null\"",
            "ALTER TABLE \"users\" ALTER COLUMN \"email\" SET NOT NULL",
            "ALTER TABLE \"users\" DROP CONSTRAINT \"email_not_null\"",
        ]
    );
}

#[test]
fn plan_json_roundtrip_preserves_structure() {
    let current = ir_of(vec![table("users", vec![column("id", 1, "integer")])]);
    let mut desired_table = table(
        "users",
        vec![column("id", 1, "integer"), column("email", 2, "text")],
    );
    desired_table.indexes.insert(
        "users_email_idx".to_string(),
        index("users", "users_email_idx", vec!["email"]),
    );
    let desired = ir_of(vec![desired_table]);

    let plan = plan_between(&current, &desired);
    assert!(plan.has_any_changes());
    assert!(plan.source_fingerprint.is_some());

    let restored = Plan::from_json(&plan.to_json().unwrap()).unwrap();
    assert_eq!(plan, restored);
    assert!(restored.check_compatibility().is_ok());
}

#[test]
fn raw_sql_contains_every_mutation_in_order() {
    let current = ir_of(vec![]);
    let mut desired_table = table("users", vec![column("id", 1, "integer")]);
    desired_table.indexes.insert(
        "users_id_idx".to_string(),
        index("users", "users_id_idx", vec!["id"]),
    );
    let desired = ir_of(vec![desired_table]);

    let plan = plan_between(&current, &desired);
    let sql = plan.to_sql(SqlFormat::Raw);

    let create_table_pos = sql.find("CREATE TABLE \"users\"").unwrap();
    let create_index_pos = sql.find("CREATE INDEX").unwrap();
    assert!(create_table_pos < create_index_pos);
    // Wait queries never leak into the SQL stream
    assert!(!sql.contains("pg_stat_progress_create_index"));

    let annotated = plan.to_sql(SqlFormat::Annotated);
    assert!(annotated.contains("-- Group 1 (transactional)"));
}

#[test]
fn every_group_is_uniformly_transactional_or_not() {
    let current = ir_of(vec![table("events", vec![column("id", 1, "bigint")])]);
    let mut desired_table = table(
        "events",
        vec![column("id", 1, "bigint"), column("kind", 2, "text")],
    );
    desired_table.indexes.insert(
        "events_kind_idx".to_string(),
        index("events", "events_kind_idx", vec!["kind"]),
    );
    let desired = ir_of(vec![desired_table]);

    let plan = plan_between(&current, &desired);
    for group in &plan.groups {
        if group.transactional() {
            assert!(group.steps.iter().all(|s| s.can_run_in_transaction));
            assert!(!group.has_directive());
        } else {
            assert!(group.steps.iter().any(|s| !s.can_run_in_transaction));
        }
    }
}
