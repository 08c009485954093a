//! Table-level diffing: columns, constraints, indexes, triggers, policies,
//! RLS and comments

use super::{Diff, DiffKind, IrObject, Operation};
use crate::ir::{Column, Constraint, Index, Table};
use crate::sqlgen;

/// Changes for one table that survives on both sides.
///
/// Additions, alterations and comment changes execute in create order;
/// drops are kept per kind so the orchestrator can emit them level by
/// level across all tables.
#[derive(Debug, Default)]
pub struct TableDelta {
    pub changes: Vec<Diff>,
    pub trigger_drops: Vec<Diff>,
    pub policy_drops: Vec<Diff>,
    pub index_drops: Vec<Diff>,
    pub constraint_drops: Vec<Diff>,
    pub column_drops: Vec<Diff>,
}

fn path(table: &Table, leaf: &str) -> String {
    format!("{}.{}.{}", table.schema, table.name, leaf)
}

/// Whether two indexes differ in definition (comments diff separately)
fn index_changed(old: &Index, new: &Index) -> bool {
    old.method != new.method
        || old.columns != new.columns
        || old.kind != new.kind
        || old.predicate != new.predicate
}

/// Whether two constraints differ in definition (validation diffs separately)
fn constraint_changed(old: &Constraint, new: &Constraint) -> bool {
    old.kind != new.kind
        || old.columns != new.columns
        || old.referenced_schema != new.referenced_schema
        || old.referenced_table != new.referenced_table
        || old.referenced_columns != new.referenced_columns
        || old.on_update != new.on_update
        || old.on_delete != new.on_delete
        || old.deferrable != new.deferrable
        || old.initially_deferred != new.initially_deferred
        || old.expression != new.expression
}

fn column_changed(old: &Column, new: &Column) -> bool {
    old.data_type != new.data_type
        || old.not_null != new.not_null
        || old.default != new.default
        || old.identity != new.identity
        || old.generated != new.generated
}

fn column_object(table: &Table, column: &Column) -> IrObject {
    IrObject::Column {
        schema: table.schema.clone(),
        table: table.name.clone(),
        column: column.clone(),
    }
}

/// Diff one table's sub-objects
pub fn diff_table(old: &Table, new: &Table) -> TableDelta {
    let mut delta = TableDelta::default();

    // Columns: additions and alterations in desired order, drops last
    for column in &new.columns {
        match old.column(&column.name) {
            None => delta.changes.push(Diff {
                kind: DiffKind::TableColumn,
                op: Operation::Create,
                path: path(new, &column.name),
                old: None,
                new: Some(column_object(new, column)),
                sql: sqlgen::add_column(&new.schema, &new.name, column),
                can_run_in_transaction: true,
            }),
            Some(old_column) => {
                if column_changed(old_column, column) {
                    let stmts =
                        sqlgen::alter_column(&new.schema, &new.name, old_column, column);
                    delta.changes.push(Diff {
                        kind: DiffKind::TableColumn,
                        op: Operation::Alter,
                        path: path(new, &column.name),
                        old: Some(column_object(old, old_column)),
                        new: Some(column_object(new, column)),
                        sql: stmts.join(";\n"),
                        can_run_in_transaction: true,
                    });
                }
                if old_column.comment != column.comment {
                    delta.changes.push(Diff {
                        kind: DiffKind::TableColumn,
                        op: Operation::Comment,
                        path: path(new, &column.name),
                        old: Some(column_object(old, old_column)),
                        new: Some(column_object(new, column)),
                        sql: sqlgen::comment_on_column(
                            &new.schema,
                            &new.name,
                            &column.name,
                            column.comment.as_deref(),
                        ),
                        can_run_in_transaction: true,
                    });
                }
            }
        }
    }
    for old_column in &old.columns {
        if new.column(&old_column.name).is_none() {
            delta.column_drops.push(Diff {
                kind: DiffKind::TableColumn,
                op: Operation::Drop,
                path: path(old, &old_column.name),
                old: Some(column_object(old, old_column)),
                new: None,
                sql: sqlgen::drop_column(&old.schema, &old.name, &old_column.name),
                can_run_in_transaction: true,
            });
        }
    }

    // Constraints
    for (name, constraint) in &new.constraints {
        match old.constraints.get(name) {
            None => delta.changes.push(Diff {
                kind: DiffKind::TableConstraint,
                op: Operation::Create,
                path: path(new, name),
                old: None,
                new: Some(IrObject::Constraint(constraint.clone())),
                sql: sqlgen::add_constraint(constraint),
                can_run_in_transaction: true,
            }),
            Some(old_constraint) => {
                if constraint_changed(old_constraint, constraint) {
                    delta.changes.push(Diff {
                        kind: DiffKind::TableConstraint,
                        op: Operation::Alter,
                        path: path(new, name),
                        old: Some(IrObject::Constraint(old_constraint.clone())),
                        new: Some(IrObject::Constraint(constraint.clone())),
                        sql: format!(
                            "{};\n{}",
                            sqlgen::drop_constraint(old_constraint),
                            sqlgen::add_constraint(constraint)
                        ),
                        can_run_in_transaction: true,
                    });
                } else if !old_constraint.validated && constraint.validated {
                    delta.changes.push(Diff {
                        kind: DiffKind::TableConstraint,
                        op: Operation::Alter,
                        path: path(new, name),
                        old: Some(IrObject::Constraint(old_constraint.clone())),
                        new: Some(IrObject::Constraint(constraint.clone())),
                        sql: sqlgen::validate_constraint(
                            &constraint.schema,
                            &constraint.table,
                            &constraint.name,
                        ),
                        can_run_in_transaction: true,
                    });
                }
            }
        }
    }
    for (name, old_constraint) in &old.constraints {
        if !new.constraints.contains_key(name) {
            delta.constraint_drops.push(Diff {
                kind: DiffKind::TableConstraint,
                op: Operation::Drop,
                path: path(old, name),
                old: Some(IrObject::Constraint(old_constraint.clone())),
                new: None,
                sql: sqlgen::drop_constraint(old_constraint),
                can_run_in_transaction: true,
            });
        }
    }

    // Indexes. Creations and definition changes are rewritten to concurrent
    // builds later, so they are flagged non-transactional already.
    for (name, index) in &new.indexes {
        match old.indexes.get(name) {
            None => delta.changes.push(Diff {
                kind: DiffKind::TableIndex,
                op: Operation::Create,
                path: path(new, name),
                old: None,
                new: Some(IrObject::Index(index.clone())),
                sql: sqlgen::create_index(index),
                can_run_in_transaction: false,
            }),
            Some(old_index) => {
                if index_changed(old_index, index) {
                    delta.changes.push(Diff {
                        kind: DiffKind::TableIndex,
                        op: Operation::Alter,
                        path: path(new, name),
                        old: Some(IrObject::Index(old_index.clone())),
                        new: Some(IrObject::Index(index.clone())),
                        sql: format!(
                            "{};\n{}",
                            sqlgen::drop_index(old_index),
                            sqlgen::create_index(index)
                        ),
                        can_run_in_transaction: false,
                    });
                }
                if old_index.comment != index.comment {
                    delta.changes.push(Diff {
                        kind: DiffKind::TableIndex,
                        op: Operation::Comment,
                        path: path(new, name),
                        old: Some(IrObject::Index(old_index.clone())),
                        new: Some(IrObject::Index(index.clone())),
                        sql: sqlgen::comment_on(
                            "INDEX",
                            &sqlgen::qualify(&index.schema, &index.name),
                            index.comment.as_deref(),
                        ),
                        can_run_in_transaction: true,
                    });
                }
            }
        }
    }
    for (name, old_index) in &old.indexes {
        if !new.indexes.contains_key(name) {
            delta.index_drops.push(Diff {
                kind: DiffKind::TableIndex,
                op: Operation::Drop,
                path: path(old, name),
                old: Some(IrObject::Index(old_index.clone())),
                new: None,
                sql: sqlgen::drop_index(old_index),
                can_run_in_transaction: true,
            });
        }
    }

    // Triggers: identity is schema.table.name; definition changes replace
    for (name, trigger) in &new.triggers {
        match old.triggers.get(name) {
            None => delta.changes.push(Diff {
                kind: DiffKind::TableTrigger,
                op: Operation::Create,
                path: path(new, name),
                old: None,
                new: Some(IrObject::Trigger(trigger.clone())),
                sql: sqlgen::create_trigger(trigger),
                can_run_in_transaction: true,
            }),
            Some(old_trigger) if old_trigger.definition != trigger.definition => {
                delta.changes.push(Diff {
                    kind: DiffKind::TableTrigger,
                    op: Operation::Alter,
                    path: path(new, name),
                    old: Some(IrObject::Trigger(old_trigger.clone())),
                    new: Some(IrObject::Trigger(trigger.clone())),
                    sql: sqlgen::replace_trigger(trigger),
                    can_run_in_transaction: true,
                });
            }
            _ => {}
        }
    }
    for (name, old_trigger) in &old.triggers {
        if !new.triggers.contains_key(name) {
            delta.trigger_drops.push(Diff {
                kind: DiffKind::TableTrigger,
                op: Operation::Drop,
                path: path(old, name),
                old: Some(IrObject::Trigger(old_trigger.clone())),
                new: None,
                sql: sqlgen::drop_trigger(old_trigger),
                can_run_in_transaction: true,
            });
        }
    }

    // Policies: USING / WITH CHECK edits are replaces
    for (name, policy) in &new.policies {
        match old.policies.get(name) {
            None => delta.changes.push(Diff {
                kind: DiffKind::TablePolicy,
                op: Operation::Create,
                path: path(new, name),
                old: None,
                new: Some(IrObject::Policy(policy.clone())),
                sql: sqlgen::create_policy(policy),
                can_run_in_transaction: true,
            }),
            Some(old_policy) if old_policy != policy => {
                delta.changes.push(Diff {
                    kind: DiffKind::TablePolicy,
                    op: Operation::Alter,
                    path: path(new, name),
                    old: Some(IrObject::Policy(old_policy.clone())),
                    new: Some(IrObject::Policy(policy.clone())),
                    sql: format!(
                        "{};\n{}",
                        sqlgen::drop_policy(old_policy),
                        sqlgen::create_policy(policy)
                    ),
                    can_run_in_transaction: true,
                });
            }
            _ => {}
        }
    }
    for (name, old_policy) in &old.policies {
        if !new.policies.contains_key(name) {
            delta.policy_drops.push(Diff {
                kind: DiffKind::TablePolicy,
                op: Operation::Drop,
                path: path(old, name),
                old: Some(IrObject::Policy(old_policy.clone())),
                new: None,
                sql: sqlgen::drop_policy(old_policy),
                can_run_in_transaction: true,
            });
        }
    }

    // RLS flag
    if old.rls_enabled != new.rls_enabled {
        delta.changes.push(Diff {
            kind: DiffKind::TableRls,
            op: Operation::Alter,
            path: format!("{}.{}", new.schema, new.name),
            old: Some(IrObject::Table(old.clone())),
            new: Some(IrObject::Table(new.clone())),
            sql: sqlgen::set_rls(new, new.rls_enabled),
            can_run_in_transaction: true,
        });
    }

    // Table comment
    if old.comment != new.comment {
        delta.changes.push(Diff {
            kind: DiffKind::Table,
            op: Operation::Comment,
            path: format!("{}.{}", new.schema, new.name),
            old: Some(IrObject::Table(old.clone())),
            new: Some(IrObject::Table(new.clone())),
            sql: sqlgen::comment_on(
                "TABLE",
                &sqlgen::qualify(&new.schema, &new.name),
                new.comment.as_deref(),
            ),
            can_run_in_transaction: true,
        });
    }

    delta
}

/// Full creation SQL for a new table: the CREATE TABLE itself plus
/// indexes, triggers, policies, the RLS flag, and comments.
pub fn create_table_statements(table: &Table) -> Vec<String> {
    let mut stmts = vec![sqlgen::create_table(table)];
    for index in table.indexes.values() {
        stmts.push(sqlgen::create_index(index));
    }
    for trigger in table.triggers.values() {
        stmts.push(sqlgen::create_trigger(trigger));
    }
    for policy in table.policies.values() {
        stmts.push(sqlgen::create_policy(policy));
    }
    if table.rls_enabled {
        stmts.push(sqlgen::set_rls(table, true));
    }
    if let Some(ref comment) = table.comment {
        stmts.push(sqlgen::comment_on(
            "TABLE",
            &sqlgen::qualify(&table.schema, &table.name),
            Some(comment),
        ));
    }
    for column in &table.columns {
        if let Some(ref comment) = column.comment {
            stmts.push(sqlgen::comment_on_column(
                &table.schema,
                &table.name,
                &column.name,
                Some(comment),
            ));
        }
    }
    stmts
}
