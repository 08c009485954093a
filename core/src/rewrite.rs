//! Diff rewriting
//!
//! Expands unsafe single-step diffs into multi-step sequences that keep the
//! same end state while staying online: concurrent index builds with wait
//! monitoring, two-phase constraint validation, and NOT NULL via a helper
//! CHECK constraint. Diffs without a matching rule pass through as a single
//! step with their intrinsic SQL.

use crate::diff::{Diff, DiffKind, IrObject, Operation};
use crate::ir::{Column, Constraint, ConstraintKind, Index};
use crate::plan::Step;
use crate::sqlgen;

const TEMP_INDEX_SUFFIX: &str = "_pgschema_new";

/// Expand one diff into its execution steps
pub fn rewrite(diff: &Diff) -> Vec<Step> {
    match (diff.kind, diff.op) {
        (DiffKind::TableIndex | DiffKind::MaterializedViewIndex, Operation::Create) => {
            if let Some(IrObject::Index(index)) = &diff.new {
                return create_index_steps(index);
            }
            passthrough(diff)
        }
        (DiffKind::TableIndex | DiffKind::MaterializedViewIndex, Operation::Alter) => {
            if let (Some(IrObject::Index(old)), Some(IrObject::Index(new))) =
                (&diff.old, &diff.new)
            {
                return alter_index_steps(old, new);
            }
            passthrough(diff)
        }
        (DiffKind::TableConstraint, Operation::Create) => {
            if let Some(IrObject::Constraint(constraint)) = &diff.new {
                if matches!(
                    constraint.kind,
                    ConstraintKind::Check | ConstraintKind::ForeignKey
                ) {
                    return add_constraint_steps(constraint);
                }
            }
            passthrough(diff)
        }
        (DiffKind::TableColumn, Operation::Alter) => {
            if let (
                Some(IrObject::Column {
                    column: old_column, ..
                }),
                Some(IrObject::Column {
                    schema,
                    table,
                    column,
                }),
            ) = (&diff.old, &diff.new)
            {
                if !old_column.not_null && column.not_null {
                    return set_not_null_steps(schema, table, old_column, column);
                }
            }
            passthrough(diff)
        }
        _ => passthrough(diff),
    }
}

fn passthrough(diff: &Diff) -> Vec<Step> {
    vec![Step::statement(
        diff.sql.clone(),
        diff.can_run_in_transaction,
    )]
}

/// Build a concurrent index plus a wait step monitoring its validity and
/// build progress
fn create_index_steps(index: &Index) -> Vec<Step> {
    vec![
        Step::statement(sqlgen::create_index_named(index, &index.name, true), false),
        Step::wait(
            index_wait_query(&index.schema, &index.name),
            format!("Creating index \"{}\"", index.name),
        ),
    ]
}

/// Rebuild a changed index without blocking readers: build the new
/// definition concurrently under a temporary name, then swap.
fn alter_index_steps(old: &Index, new: &Index) -> Vec<Step> {
    let temp_name = format!("{}{}", new.name, TEMP_INDEX_SUFFIX);
    vec![
        Step::statement(sqlgen::create_index_named(new, &temp_name, true), false),
        Step::wait(
            index_wait_query(&new.schema, &temp_name),
            format!("Creating index \"{}\"", temp_name),
        ),
        Step::statement(sqlgen::drop_index(old), true),
        Step::statement(
            sqlgen::rename_index(&new.schema, &temp_name, &new.name),
            true,
        ),
    ]
}

/// Two-phase constraint addition: NOT VALID takes only a brief lock,
/// VALIDATE scans without blocking writes
fn add_constraint_steps(constraint: &Constraint) -> Vec<Step> {
    vec![
        Step::statement(
            format!("{} NOT VALID", sqlgen::add_constraint(constraint)),
            true,
        ),
        Step::statement(
            sqlgen::validate_constraint(
                &constraint.schema,
                &constraint.table,
                &constraint.name,
            ),
            true,
        ),
    ]
}

/// NOT NULL without a full-table lock: validate via a helper CHECK
/// constraint, set the flag (which reuses the validation proof), then drop
/// the helper.
fn set_not_null_steps(
    schema: &str,
    table: &str,
    old_column: &Column,
    column: &Column,
) -> Vec<Step> {
    let mut steps = Vec::new();

    // Any other attribute changes keep their intrinsic form
    let mut softened = column.clone();
    softened.not_null = false;
    let other = sqlgen::alter_column(schema, table, old_column, &softened);
    if !other.is_empty() {
        steps.push(Step::statement(other.join(";\n"), true));
    }

    let helper = format!("{}_not_null", column.name);
    let target = sqlgen::qualify(schema, table);
    steps.push(Step::statement(
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} CHECK ({} IS NOT NULL) NOT VALID",
            target,
            sqlgen::quote_ident(&helper),
            sqlgen::quote_ident(&column.name)
        ),
        true,
    ));
    steps.push(Step::statement(
        sqlgen::validate_constraint(schema, table, &helper),
        true,
    ));
    steps.push(Step::statement(
        sqlgen::set_not_null(schema, table, &column.name),
        true,
    ));
    steps.push(Step::statement(
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            target,
            sqlgen::quote_ident(&helper)
        ),
        true,
    ));
    steps
}

/// Single-row monitoring query for a concurrent index build.
///
/// Joins the catalog's validity flag with the progress view; `done` flips
/// when the index is valid, `progress` tracks `blocks_done / blocks_total`.
fn index_wait_query(schema: &str, index: &str) -> String {
    format!(
        "SELECT COALESCE(i.indisvalid, false) AS done, \
         CASE WHEN p.blocks_total > 0 \
              THEN (p.blocks_done * 100 / p.blocks_total)::int \
         END AS progress \
         FROM pg_class c \
         JOIN pg_namespace n ON n.oid = c.relnamespace \
         LEFT JOIN pg_index i ON i.indexrelid = c.oid \
         LEFT JOIN pg_stat_progress_create_index p ON p.index_relid = c.oid \
         WHERE n.nspname = {} AND c.relname = {}",
        sqlgen::quote_literal(schema),
        sqlgen::quote_literal(index)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IndexColumn, IndexKind};

    fn sample_index(name: &str) -> Index {
        Index {
            schema: "public".to_string(),
            table: "users".to_string(),
            name: name.to_string(),
            method: "btree".to_string(),
            columns: vec![IndexColumn {
                value: "email".to_string(),
                is_expression: false,
                asc: true,
                opclass: None,
            }],
            kind: IndexKind::Regular,
            predicate: None,
            comment: None,
        }
    }

    fn index_create_diff(name: &str) -> Diff {
        let index = sample_index(name);
        Diff {
            kind: DiffKind::TableIndex,
            op: Operation::Create,
            path: format!("public.users.{}", name),
            old: None,
            new: Some(IrObject::Index(index.clone())),
            sql: sqlgen::create_index(&index),
            can_run_in_transaction: false,
        }
    }

    #[test]
    fn test_create_index_becomes_concurrent_with_wait() {
        let steps = rewrite(&index_create_diff("users_email_idx"));
        assert_eq!(steps.len(), 2);
        assert!(steps[0].sql.contains("CREATE INDEX CONCURRENTLY IF NOT EXISTS"));
        assert!(!steps[0].can_run_in_transaction);
        let wait = steps[1].directive.as_ref().unwrap();
        assert_eq!(wait.message, "Creating index \"users_email_idx\"");
        assert!(steps[1].sql.contains("pg_stat_progress_create_index"));
        assert!(steps[1].sql.contains("'users_email_idx'"));
    }

    #[test]
    fn test_alter_index_swaps_through_temp_name() {
        let old = sample_index("users_email_idx");
        let mut new = sample_index("users_email_idx");
        new.predicate = Some("email IS NOT NULL".to_string());
        let diff = Diff {
            kind: DiffKind::TableIndex,
            op: Operation::Alter,
            path: "public.users.users_email_idx".to_string(),
            old: Some(IrObject::Index(old)),
            new: Some(IrObject::Index(new)),
            sql: String::new(),
            can_run_in_transaction: false,
        };
        let steps = rewrite(&diff);
        assert_eq!(steps.len(), 4);
        assert!(steps[0].sql.contains("\"users_email_idx_pgschema_new\""));
        assert!(steps[1].directive.is_some());
        assert_eq!(steps[2].sql, "DROP INDEX \"users_email_idx\"");
        assert_eq!(
            steps[3].sql,
            "ALTER INDEX \"users_email_idx_pgschema_new\" RENAME TO \"users_email_idx\""
        );
    }

    #[test]
    fn test_check_constraint_is_two_phase() {
        let constraint = Constraint {
            schema: "public".to_string(),
            table: "users".to_string(),
            name: "users_age_check".to_string(),
            kind: ConstraintKind::Check,
            columns: vec![],
            referenced_schema: None,
            referenced_table: None,
            referenced_columns: vec![],
            on_update: None,
            on_delete: None,
            deferrable: false,
            initially_deferred: false,
            expression: Some("age >= 0".to_string()),
            validated: true,
        };
        let diff = Diff {
            kind: DiffKind::TableConstraint,
            op: Operation::Create,
            path: "public.users.users_age_check".to_string(),
            old: None,
            new: Some(IrObject::Constraint(constraint)),
            sql: String::new(),
            can_run_in_transaction: true,
        };
        let steps = rewrite(&diff);
        assert_eq!(steps.len(), 2);
        assert!(steps[0].sql.ends_with("NOT VALID"));
        assert!(steps[1].sql.contains("VALIDATE CONSTRAINT \"users_age_check\""));
    }

    #[test]
    fn test_set_not_null_uses_helper_constraint() {
        let old = Column {
            name: "email".to_string(),
            position: 2,
            data_type: "text".to_string(),
            not_null: false,
            default: None,
            identity: None,
            generated: None,
            comment: None,
        };
        let mut new = old.clone();
        new.not_null = true;
        let diff = Diff {
            kind: DiffKind::TableColumn,
            op: Operation::Alter,
            path: "public.users.email".to_string(),
            old: Some(IrObject::Column {
                schema: "public".to_string(),
                table: "users".to_string(),
                column: old,
            }),
            new: Some(IrObject::Column {
                schema: "public".to_string(),
                table: "users".to_string(),
                column: new,
            }),
            sql: String::new(),
            can_run_in_transaction: true,
        };
        let steps = rewrite(&diff);
        let sqls: Vec<&str> = steps.iter().map(|s| s.sql.as_str()).collect();
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
    fn test_plain_diff_passes_through() {
        let diff = Diff {
            kind: DiffKind::TableColumn,
            op: Operation::Create,
            path: "public.users.email".to_string(),
            old: None,
            new: None,
            sql: "ALTER TABLE \"users\" ADD COLUMN \"email\" text".to_string(),
            can_run_in_transaction: true,
        };
        let steps = rewrite(&diff);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].sql, diff.sql);
        assert!(steps[0].directive.is_none());
    }
}
