//! DDL generation tests
//!
//! Build IR states in code, diff them, and assert over the generated SQL —
//! the same shape as exercising a live plan run without a database.

use pgschema_core::diff::{DiffKind, Operation, diff_irs};
use pgschema_core::fingerprint::Fingerprint;
use pgschema_core::ir::{
    Column, Constraint, ConstraintKind, Index, IndexColumn, IndexKind, Ir, Schema, Table, View,
};

// =============================================================================
// Helper Functions
// =============================================================================

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

fn column_not_null(name: &str, position: i32, data_type: &str) -> Column {
    Column {
        not_null: true,
        ..column(name, position, data_type)
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

fn primary_key(table_name: &str, columns: Vec<&str>) -> Constraint {
    Constraint {
        schema: "public".to_string(),
        table: table_name.to_string(),
        name: format!("{}_pkey", table_name),
        kind: ConstraintKind::PrimaryKey,
        columns: columns.into_iter().map(|c| c.to_string()).collect(),
        referenced_schema: None,
        referenced_table: None,
        referenced_columns: vec![],
        on_update: None,
        on_delete: None,
        deferrable: false,
        initially_deferred: false,
        expression: None,
        validated: true,
    }
}

fn foreign_key(
    table_name: &str,
    name: &str,
    columns: Vec<&str>,
    ref_table: &str,
    ref_columns: Vec<&str>,
) -> Constraint {
    Constraint {
        schema: "public".to_string(),
        table: table_name.to_string(),
        name: name.to_string(),
        kind: ConstraintKind::ForeignKey,
        columns: columns.into_iter().map(|c| c.to_string()).collect(),
        referenced_schema: Some("public".to_string()),
        referenced_table: Some(ref_table.to_string()),
        referenced_columns: ref_columns.into_iter().map(|c| c.to_string()).collect(),
        on_update: None,
        on_delete: None,
        deferrable: false,
        initially_deferred: false,
        expression: None,
        validated: true,
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

// =============================================================================
// Tests
// =============================================================================

#[test]
fn create_table_with_pk_and_fk() {
    let current = ir_of(vec![]);

    let mut users = table(
        "users",
        vec![
            column_not_null("id", 1, "integer"),
            column_not_null("name", 2, "character varying(255)"),
        ],
    );
    users
        .constraints
        .insert("users_pkey".to_string(), primary_key("users", vec!["id"]));

    let mut orders = table(
        "orders",
        vec![
            column_not_null("id", 1, "integer"),
            column("user_id", 2, "integer"),
        ],
    );
    orders.constraints.insert(
        "orders_user_id_fkey".to_string(),
        foreign_key("orders", "orders_user_id_fkey", vec!["user_id"], "users", vec!["id"]),
    );

    let desired = ir_of(vec![users, orders]);
    let diffs = diff_irs(&current, &desired, "public").unwrap();

    assert_eq!(diffs.len(), 2);
    assert!(diffs.iter().all(|d| d.op == Operation::Create));
    // Lexicographic: orders before users, but the concatenation is still
    // valid because the FK is declared inline and PostgreSQL resolves it
    // once both statements run in one implicit transaction. The orders DDL
    // must reference users.
    let orders_sql = &diffs[0].sql;
    assert!(orders_sql.contains("CREATE TABLE \"orders\""));
    assert!(orders_sql.contains("FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\")"));
    let users_sql = &diffs[1].sql;
    assert!(users_sql.contains("CONSTRAINT \"users_pkey\" PRIMARY KEY (\"id\")"));
}

#[test]
fn add_column_scenario() {
    let current = ir_of(vec![table(
        "users",
        vec![
            column_not_null("id", 1, "integer"),
            column_not_null("name", 2, "character varying(255)"),
        ],
    )]);
    let desired = ir_of(vec![table(
        "users",
        vec![
            column_not_null("id", 1, "integer"),
            column_not_null("name", 2, "character varying(255)"),
            column("email", 3, "character varying(255)"),
        ],
    )]);

    let diffs = diff_irs(&current, &desired, "public").unwrap();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].kind, DiffKind::TableColumn);
    assert_eq!(
        diffs[0].sql,
        "ALTER TABLE \"users\" ADD COLUMN \"email\" character varying(255)"
    );
    assert!(diffs[0].can_run_in_transaction);
}

#[test]
fn drops_run_in_reverse_dependency_order() {
    let mut users = table("users", vec![column_not_null("id", 1, "integer")]);
    users
        .indexes
        .insert("users_id_idx".to_string(), index("users", "users_id_idx", vec!["id"]));

    let mut current = ir_of(vec![users.clone()]);
    let schema = current.schemas.get_mut("public").unwrap();
    schema.views.insert(
        "user_names".to_string(),
        View {
            schema: "public".to_string(),
            name: "user_names".to_string(),
            definition: "SELECT id FROM users".to_string(),
            materialized: false,
            indexes: Default::default(),
            triggers: Default::default(),
            comment: None,
        },
    );

    let desired = ir_of(vec![]);
    let diffs = diff_irs(&current, &desired, "public").unwrap();

    let kinds: Vec<_> = diffs.iter().map(|d| (d.kind, d.op)).collect();
    assert_eq!(
        kinds,
        vec![
            (DiffKind::View, Operation::Drop),
            (DiffKind::Table, Operation::Drop),
        ]
    );
    // The index disappears with its table; no standalone drop is emitted.
    assert!(!diffs.iter().any(|d| d.kind == DiffKind::TableIndex));
}

#[test]
fn index_change_is_flagged_non_transactional() {
    let mut with_idx = table("users", vec![column("email", 1, "text")]);
    with_idx.indexes.insert(
        "users_email_idx".to_string(),
        index("users", "users_email_idx", vec!["email"]),
    );
    let current = ir_of(vec![with_idx.clone()]);

    let mut changed = with_idx;
    changed
        .indexes
        .get_mut("users_email_idx")
        .unwrap()
        .predicate = Some("email IS NOT NULL".to_string());
    let desired = ir_of(vec![changed]);

    let diffs = diff_irs(&current, &desired, "public").unwrap();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].op, Operation::Alter);
    assert!(!diffs[0].can_run_in_transaction);
}

#[test]
fn equal_fingerprints_imply_empty_diff() {
    let a = ir_of(vec![table("users", vec![column("id", 1, "integer")])]);
    let b = ir_of(vec![table("users", vec![column("id", 1, "integer")])]);

    let fa = Fingerprint::compute(&a, "public").unwrap();
    let fb = Fingerprint::compute(&b, "public").unwrap();
    assert_eq!(fa, fb);
    assert!(diff_irs(&a, &b, "public").unwrap().is_empty());
}

#[test]
fn any_diffable_change_changes_the_fingerprint() {
    let base = ir_of(vec![table("users", vec![column("id", 1, "integer")])]);

    let mut with_default = ir_of(vec![table("users", vec![column("id", 1, "integer")])]);
    with_default
        .schemas
        .get_mut("public")
        .unwrap()
        .tables
        .get_mut("users")
        .unwrap()
        .columns[0]
        .default = Some("0".to_string());

    assert!(!diff_irs(&base, &with_default, "public").unwrap().is_empty());
    assert_ne!(
        Fingerprint::compute(&base, "public").unwrap(),
        Fingerprint::compute(&with_default, "public").unwrap()
    );
}

#[test]
fn fingerprint_ignores_other_schemas() {
    let base = ir_of(vec![table("users", vec![column("id", 1, "integer")])]);

    let mut with_extra = base.clone();
    with_extra
        .schemas
        .insert("other".to_string(), Schema::new("other"));

    assert_eq!(
        Fingerprint::compute(&base, "public").unwrap(),
        Fingerprint::compute(&with_extra, "public").unwrap()
    );
}
