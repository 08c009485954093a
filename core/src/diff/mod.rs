//! Schema differencing
//!
//! Produces typed, path-addressed changes between two IRs in dependency
//! order: the concatenation of every diff's SQL is executable as-is against
//! the current database. Creations come before anything that may reference
//! them; drops run in reverse. Within one level, `BTreeMap` iteration gives
//! lexicographic order by qualified name.

pub mod table;
pub mod topo;

use crate::error::Result;
use crate::ir::{
    Aggregate, Column, Constraint, Domain, Extension, Function, Index, Ir, Policy, Procedure,
    Schema, Sequence, Table, Trigger, TypeDef, TypeKind, View,
};
use crate::sqlgen;
use std::collections::{BTreeMap, BTreeSet};

/// What a diff does to its object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Create,
    Alter,
    Drop,
    Comment,
}

/// Closed set of object kinds a diff can address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffKind {
    Schema,
    Extension,
    Type,
    Domain,
    Sequence,
    Function,
    Procedure,
    Aggregate,
    Table,
    TableColumn,
    TableConstraint,
    TableIndex,
    TableTrigger,
    TablePolicy,
    TableRls,
    View,
    ViewTrigger,
    MaterializedView,
    MaterializedViewIndex,
}

/// The IR object a diff is about
#[derive(Clone, Debug)]
pub enum IrObject {
    Schema(String),
    Extension(Extension),
    Type(TypeDef),
    Domain(Domain),
    Sequence(Sequence),
    Function(Function),
    Procedure(Procedure),
    Aggregate(Aggregate),
    Table(Table),
    Column {
        schema: String,
        table: String,
        column: Column,
    },
    Constraint(Constraint),
    Index(Index),
    Trigger(Trigger),
    Policy(Policy),
    View(View),
}

/// One semantic change between two IRs
#[derive(Clone, Debug)]
pub struct Diff {
    pub kind: DiffKind,
    pub op: Operation,
    /// Dotted address, e.g. `public.users.email`
    pub path: String,
    pub old: Option<IrObject>,
    pub new: Option<IrObject>,
    /// The simple, offline form of the change
    pub sql: String,
    pub can_run_in_transaction: bool,
}

impl Diff {
    fn create(kind: DiffKind, path: String, new: IrObject, sql: String) -> Self {
        Self {
            kind,
            op: Operation::Create,
            path,
            old: None,
            new: Some(new),
            sql,
            can_run_in_transaction: true,
        }
    }

    fn alter(kind: DiffKind, path: String, old: IrObject, new: IrObject, sql: String) -> Self {
        Self {
            kind,
            op: Operation::Alter,
            path,
            old: Some(old),
            new: Some(new),
            sql,
            can_run_in_transaction: true,
        }
    }

    fn drop(kind: DiffKind, path: String, old: IrObject, sql: String) -> Self {
        Self {
            kind,
            op: Operation::Drop,
            path,
            old: Some(old),
            new: None,
            sql,
            can_run_in_transaction: true,
        }
    }

    fn comment(kind: DiffKind, path: String, new: IrObject, sql: String) -> Self {
        Self {
            kind,
            op: Operation::Comment,
            path,
            old: None,
            new: Some(new),
            sql,
            can_run_in_transaction: true,
        }
    }
}

/// Compute the ordered diff between two IRs for one schema
pub fn diff_irs(current: &Ir, desired: &Ir, target_schema: &str) -> Result<Vec<Diff>> {
    let empty_current = Schema::new(target_schema);
    let empty_desired = Schema::new(target_schema);
    let cur = current.schema(target_schema).unwrap_or(&empty_current);
    let des = desired.schema(target_schema).unwrap_or(&empty_desired);

    let mut diffs = Vec::new();

    // 1. Schema
    if current.schema(target_schema).is_none() && desired.schema(target_schema).is_some() {
        diffs.push(Diff::create(
            DiffKind::Schema,
            target_schema.to_string(),
            IrObject::Schema(target_schema.to_string()),
            sqlgen::create_schema(target_schema),
        ));
    }

    // 2. Extensions
    for (name, ext) in &des.extensions {
        if !cur.extensions.contains_key(name) {
            diffs.push(Diff::create(
                DiffKind::Extension,
                format!("{}.{}", target_schema, name),
                IrObject::Extension(ext.clone()),
                sqlgen::create_extension(ext),
            ));
        }
    }

    // 3. Types (enums, composites) and domains
    diff_types(cur, des, target_schema, &mut diffs);
    diff_domains(cur, des, target_schema, &mut diffs);

    // 4. Sequences
    for (name, seq) in &des.sequences {
        match cur.sequences.get(name) {
            None => diffs.push(Diff::create(
                DiffKind::Sequence,
                format!("{}.{}", target_schema, name),
                IrObject::Sequence(seq.clone()),
                sqlgen::create_sequence(seq),
            )),
            Some(old) if sequence_changed(old, seq) => diffs.push(Diff::alter(
                DiffKind::Sequence,
                format!("{}.{}", target_schema, name),
                IrObject::Sequence(old.clone()),
                IrObject::Sequence(seq.clone()),
                sqlgen::alter_sequence(old, seq),
            )),
            _ => {}
        }
    }

    // 5. Functions, topologically ordered by call graph
    diff_functions(cur, des, target_schema, &mut diffs)?;

    // 6. Procedures
    diff_procedures(cur, des, target_schema, &mut diffs);

    // 7. Aggregates
    for (name, agg) in &des.aggregates {
        match cur.aggregates.get(name) {
            None => diffs.push(Diff::create(
                DiffKind::Aggregate,
                format!("{}.{}", target_schema, name),
                IrObject::Aggregate(agg.clone()),
                sqlgen::create_aggregate(agg),
            )),
            Some(old) if aggregate_changed(old, agg) => {
                diffs.push(Diff::drop(
                    DiffKind::Aggregate,
                    format!("{}.{}", target_schema, name),
                    IrObject::Aggregate(old.clone()),
                    sqlgen::drop_aggregate(old),
                ));
                diffs.push(Diff::create(
                    DiffKind::Aggregate,
                    format!("{}.{}", target_schema, name),
                    IrObject::Aggregate(agg.clone()),
                    sqlgen::create_aggregate(agg),
                ));
            }
            _ => {}
        }
    }

    // 8. Tables (full create with sub-objects)
    for (name, tbl) in &des.tables {
        if tbl.is_partition {
            continue;
        }
        if !cur.tables.contains_key(name) {
            diffs.push(Diff::create(
                DiffKind::Table,
                format!("{}.{}", target_schema, name),
                IrObject::Table(tbl.clone()),
                table::create_table_statements(tbl).join(";\n"),
            ));
        }
    }

    // 9 + 10. Views (topologically ordered) and materialized views
    let view_order = view_topo_order(des)?;
    for name in &view_order {
        let view = &des.views[name];
        diff_one_view(cur.views.get(name), view, target_schema, &mut diffs);
    }

    // 11. Table sub-object alters; drops are collected for the reverse phase
    let mut trigger_drops = Vec::new();
    let mut policy_drops = Vec::new();
    let mut index_drops = Vec::new();
    let mut constraint_drops = Vec::new();
    let mut column_drops = Vec::new();
    for (name, tbl) in &des.tables {
        if tbl.is_partition {
            continue;
        }
        if let Some(old_tbl) = cur.tables.get(name) {
            let delta = table::diff_table(old_tbl, tbl);
            diffs.extend(delta.changes);
            trigger_drops.extend(delta.trigger_drops);
            policy_drops.extend(delta.policy_drops);
            index_drops.extend(delta.index_drops);
            constraint_drops.extend(delta.constraint_drops);
            column_drops.extend(delta.column_drops);
        }
    }

    // 12. Drops, in reverse dependency order
    diffs.extend(trigger_drops);
    diffs.extend(policy_drops);
    diffs.extend(index_drops);
    diffs.extend(constraint_drops);
    diffs.extend(column_drops);

    // Views drop in reverse creation order
    let current_view_order = view_topo_order(cur)?;
    for name in current_view_order.iter().rev() {
        let view = &cur.views[name];
        if !des.views.contains_key(name) {
            let kind = if view.materialized {
                DiffKind::MaterializedView
            } else {
                DiffKind::View
            };
            diffs.push(Diff::drop(
                kind,
                format!("{}.{}", target_schema, name),
                IrObject::View(view.clone()),
                sqlgen::drop_view(view),
            ));
        }
    }

    // Dropped tables shed their foreign keys first so that drop order
    // between mutually-referencing tables cannot matter.
    for (name, tbl) in &cur.tables {
        if tbl.is_partition || des.tables.contains_key(name) {
            continue;
        }
        for constraint in tbl.constraints.values() {
            if constraint.kind == crate::ir::ConstraintKind::ForeignKey {
                diffs.push(Diff::drop(
                    DiffKind::TableConstraint,
                    format!("{}.{}.{}", target_schema, name, constraint.name),
                    IrObject::Constraint(constraint.clone()),
                    sqlgen::drop_constraint(constraint),
                ));
            }
        }
    }

    for (name, tbl) in &cur.tables {
        if tbl.is_partition {
            continue;
        }
        if !des.tables.contains_key(name) {
            diffs.push(Diff::drop(
                DiffKind::Table,
                format!("{}.{}", target_schema, name),
                IrObject::Table(tbl.clone()),
                sqlgen::drop_table(tbl),
            ));
        }
    }

    for (name, proc) in &cur.procedures {
        if !des.procedures.contains_key(name) {
            diffs.push(Diff::drop(
                DiffKind::Procedure,
                format!("{}.{}", target_schema, name),
                IrObject::Procedure(proc.clone()),
                sqlgen::drop_procedure(proc),
            ));
        }
    }

    for (name, func) in &cur.functions {
        if !des.functions.contains_key(name) {
            diffs.push(Diff::drop(
                DiffKind::Function,
                format!("{}.{}", target_schema, name),
                IrObject::Function(func.clone()),
                sqlgen::drop_function(func),
            ));
        }
    }

    for (name, agg) in &cur.aggregates {
        if !des.aggregates.contains_key(name) {
            diffs.push(Diff::drop(
                DiffKind::Aggregate,
                format!("{}.{}", target_schema, name),
                IrObject::Aggregate(agg.clone()),
                sqlgen::drop_aggregate(agg),
            ));
        }
    }

    for (name, seq) in &cur.sequences {
        if !des.sequences.contains_key(name) {
            diffs.push(Diff::drop(
                DiffKind::Sequence,
                format!("{}.{}", target_schema, name),
                IrObject::Sequence(seq.clone()),
                sqlgen::drop_sequence(seq),
            ));
        }
    }

    for (name, dom) in &cur.domains {
        if !des.domains.contains_key(name) {
            diffs.push(Diff::drop(
                DiffKind::Domain,
                format!("{}.{}", target_schema, name),
                IrObject::Domain(dom.clone()),
                sqlgen::drop_domain(dom),
            ));
        }
    }

    for (name, t) in &cur.types {
        if !des.types.contains_key(name) {
            diffs.push(Diff::drop(
                DiffKind::Type,
                format!("{}.{}", target_schema, name),
                IrObject::Type(t.clone()),
                sqlgen::drop_type(t),
            ));
        }
    }

    for (name, ext) in &cur.extensions {
        if !des.extensions.contains_key(name) {
            diffs.push(Diff::drop(
                DiffKind::Extension,
                format!("{}.{}", target_schema, name),
                IrObject::Extension(ext.clone()),
                sqlgen::drop_extension(ext),
            ));
        }
    }

    // The target schema itself is never dropped: the tool manages the
    // schema's contents, not its existence.

    Ok(diffs)
}

// =============================================================================
// Per-kind helpers
// =============================================================================

fn diff_types(cur: &Schema, des: &Schema, target_schema: &str, diffs: &mut Vec<Diff>) {
    for (name, t) in &des.types {
        let path = format!("{}.{}", target_schema, name);
        match cur.types.get(name) {
            None => diffs.push(Diff::create(
                DiffKind::Type,
                path,
                IrObject::Type(t.clone()),
                sqlgen::create_type(t),
            )),
            Some(old) => {
                if old.kind == t.kind {
                    if old.comment != t.comment {
                        diffs.push(Diff::comment(
                            DiffKind::Type,
                            path,
                            IrObject::Type(t.clone()),
                            sqlgen::comment_on(
                                "TYPE",
                                &sqlgen::qualify(&t.schema, &t.name),
                                t.comment.as_deref(),
                            ),
                        ));
                    }
                    continue;
                }
                // Enum extensions can be expressed in place; anything else
                // is a drop+create.
                if let (TypeKind::Enum { values: old_values }, TypeKind::Enum { values }) =
                    (&old.kind, &t.kind)
                {
                    let removed = old_values.iter().any(|v| !values.contains(v));
                    if !removed {
                        let stmts = sqlgen::alter_enum_add_values(old_values, t);
                        diffs.push(Diff::alter(
                            DiffKind::Type,
                            path,
                            IrObject::Type(old.clone()),
                            IrObject::Type(t.clone()),
                            stmts.join(";\n"),
                        ));
                        continue;
                    }
                }
                diffs.push(Diff::drop(
                    DiffKind::Type,
                    path.clone(),
                    IrObject::Type(old.clone()),
                    sqlgen::drop_type(old),
                ));
                diffs.push(Diff::create(
                    DiffKind::Type,
                    path,
                    IrObject::Type(t.clone()),
                    sqlgen::create_type(t),
                ));
            }
        }
    }
}

fn diff_domains(cur: &Schema, des: &Schema, target_schema: &str, diffs: &mut Vec<Diff>) {
    for (name, d) in &des.domains {
        let path = format!("{}.{}", target_schema, name);
        match cur.domains.get(name) {
            None => diffs.push(Diff::create(
                DiffKind::Domain,
                path,
                IrObject::Domain(d.clone()),
                sqlgen::create_domain(d),
            )),
            Some(old) if domain_changed(old, d) => {
                diffs.push(Diff::drop(
                    DiffKind::Domain,
                    path.clone(),
                    IrObject::Domain(old.clone()),
                    sqlgen::drop_domain(old),
                ));
                diffs.push(Diff::create(
                    DiffKind::Domain,
                    path,
                    IrObject::Domain(d.clone()),
                    sqlgen::create_domain(d),
                ));
            }
            _ => {}
        }
    }
}

fn diff_functions(
    cur: &Schema,
    des: &Schema,
    target_schema: &str,
    diffs: &mut Vec<Diff>,
) -> Result<()> {
    let deps: BTreeMap<String, BTreeSet<String>> = des
        .functions
        .iter()
        .map(|(name, f)| {
            let referenced = des
                .functions
                .keys()
                .filter(|other| *other != name && topo::references(&f.body, other))
                .cloned()
                .collect();
            (name.clone(), referenced)
        })
        .collect();
    let order = topo::sort(&deps)?;

    for name in &order {
        let func = &des.functions[name];
        let path = format!("{}.{}", target_schema, name);
        match cur.functions.get(name) {
            None => diffs.push(Diff::create(
                DiffKind::Function,
                path,
                IrObject::Function(func.clone()),
                sqlgen::create_function(func),
            )),
            Some(old) => {
                // CREATE OR REPLACE cannot change the signature
                if old.arguments != func.arguments || old.returns != func.returns {
                    diffs.push(Diff::drop(
                        DiffKind::Function,
                        path.clone(),
                        IrObject::Function(old.clone()),
                        sqlgen::drop_function(old),
                    ));
                    diffs.push(Diff::create(
                        DiffKind::Function,
                        path,
                        IrObject::Function(func.clone()),
                        sqlgen::create_function(func),
                    ));
                } else if function_changed(old, func) {
                    diffs.push(Diff::alter(
                        DiffKind::Function,
                        path,
                        IrObject::Function(old.clone()),
                        IrObject::Function(func.clone()),
                        sqlgen::create_function(func),
                    ));
                } else if old.comment != func.comment {
                    diffs.push(Diff::comment(
                        DiffKind::Function,
                        path,
                        IrObject::Function(func.clone()),
                        sqlgen::comment_on(
                            "FUNCTION",
                            &format!(
                                "{}({})",
                                sqlgen::qualify(&func.schema, &func.name),
                                func.arguments
                            ),
                            func.comment.as_deref(),
                        ),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn diff_procedures(cur: &Schema, des: &Schema, target_schema: &str, diffs: &mut Vec<Diff>) {
    for (name, proc) in &des.procedures {
        let path = format!("{}.{}", target_schema, name);
        match cur.procedures.get(name) {
            None => diffs.push(Diff::create(
                DiffKind::Procedure,
                path,
                IrObject::Procedure(proc.clone()),
                sqlgen::create_procedure(proc),
            )),
            Some(old) => {
                if old.arguments != proc.arguments {
                    diffs.push(Diff::drop(
                        DiffKind::Procedure,
                        path.clone(),
                        IrObject::Procedure(old.clone()),
                        sqlgen::drop_procedure(old),
                    ));
                    diffs.push(Diff::create(
                        DiffKind::Procedure,
                        path,
                        IrObject::Procedure(proc.clone()),
                        sqlgen::create_procedure(proc),
                    ));
                } else if procedure_changed(old, proc) {
                    diffs.push(Diff::alter(
                        DiffKind::Procedure,
                        path,
                        IrObject::Procedure(old.clone()),
                        IrObject::Procedure(proc.clone()),
                        sqlgen::create_procedure(proc),
                    ));
                }
            }
        }
    }
}

fn diff_one_view(old: Option<&View>, view: &View, target_schema: &str, diffs: &mut Vec<Diff>) {
    let path = format!("{}.{}", target_schema, view.name);
    let kind = if view.materialized {
        DiffKind::MaterializedView
    } else {
        DiffKind::View
    };
    match old {
        None => {
            let mut stmts = vec![sqlgen::create_view(view)];
            for index in view.indexes.values() {
                stmts.push(sqlgen::create_index(index));
            }
            for trigger in view.triggers.values() {
                stmts.push(sqlgen::create_trigger(trigger));
            }
            if let Some(ref comment) = view.comment {
                let target_kind = if view.materialized {
                    "MATERIALIZED VIEW"
                } else {
                    "VIEW"
                };
                stmts.push(sqlgen::comment_on(
                    target_kind,
                    &sqlgen::qualify(&view.schema, &view.name),
                    Some(comment),
                ));
            }
            diffs.push(Diff::create(
                kind,
                path,
                IrObject::View(view.clone()),
                stmts.join(";\n"),
            ));
        }
        Some(old_view) => {
            if old_view.definition != view.definition || old_view.materialized != view.materialized
            {
                if view.materialized || old_view.materialized != view.materialized {
                    // No OR REPLACE for materialized views
                    diffs.push(Diff::drop(
                        kind,
                        path.clone(),
                        IrObject::View(old_view.clone()),
                        sqlgen::drop_view(old_view),
                    ));
                    let mut stmts = vec![sqlgen::create_view(view)];
                    for index in view.indexes.values() {
                        stmts.push(sqlgen::create_index(index));
                    }
                    diffs.push(Diff::create(
                        kind,
                        path,
                        IrObject::View(view.clone()),
                        stmts.join(";\n"),
                    ));
                    return;
                }
                diffs.push(Diff::alter(
                    kind,
                    path.clone(),
                    IrObject::View(old_view.clone()),
                    IrObject::View(view.clone()),
                    sqlgen::create_view(view),
                ));
            }

            // Materialized view indexes
            if view.materialized {
                for (name, index) in &view.indexes {
                    match old_view.indexes.get(name) {
                        None => {
                            let mut diff = Diff::create(
                                DiffKind::MaterializedViewIndex,
                                format!("{}.{}", path, name),
                                IrObject::Index(index.clone()),
                                sqlgen::create_index(index),
                            );
                            diff.can_run_in_transaction = false;
                            diffs.push(diff);
                        }
                        Some(old_index) if old_index != index => {
                            let mut diff = Diff::alter(
                                DiffKind::MaterializedViewIndex,
                                format!("{}.{}", path, name),
                                IrObject::Index(old_index.clone()),
                                IrObject::Index(index.clone()),
                                format!(
                                    "{};\n{}",
                                    sqlgen::drop_index(old_index),
                                    sqlgen::create_index(index)
                                ),
                            );
                            diff.can_run_in_transaction = false;
                            diffs.push(diff);
                        }
                        _ => {}
                    }
                }
                for (name, old_index) in &old_view.indexes {
                    if !view.indexes.contains_key(name) {
                        diffs.push(Diff::drop(
                            DiffKind::MaterializedViewIndex,
                            format!("{}.{}", path, name),
                            IrObject::Index(old_index.clone()),
                            sqlgen::drop_index(old_index),
                        ));
                    }
                }
            }

            // INSTEAD OF triggers on plain views
            for (name, trigger) in &view.triggers {
                match old_view.triggers.get(name) {
                    None => diffs.push(Diff::create(
                        DiffKind::ViewTrigger,
                        format!("{}.{}", path, name),
                        IrObject::Trigger(trigger.clone()),
                        sqlgen::create_trigger(trigger),
                    )),
                    Some(old_trigger) if old_trigger.definition != trigger.definition => {
                        diffs.push(Diff::alter(
                            DiffKind::ViewTrigger,
                            format!("{}.{}", path, name),
                            IrObject::Trigger(old_trigger.clone()),
                            IrObject::Trigger(trigger.clone()),
                            sqlgen::replace_trigger(trigger),
                        ));
                    }
                    _ => {}
                }
            }
            for (name, old_trigger) in &old_view.triggers {
                if !view.triggers.contains_key(name) {
                    diffs.push(Diff::drop(
                        DiffKind::ViewTrigger,
                        format!("{}.{}", path, name),
                        IrObject::Trigger(old_trigger.clone()),
                        sqlgen::drop_trigger(old_trigger),
                    ));
                }
            }

            if old_view.comment != view.comment {
                let target_kind = if view.materialized {
                    "MATERIALIZED VIEW"
                } else {
                    "VIEW"
                };
                diffs.push(Diff::comment(
                    kind,
                    path,
                    IrObject::View(view.clone()),
                    sqlgen::comment_on(
                        target_kind,
                        &sqlgen::qualify(&view.schema, &view.name),
                        view.comment.as_deref(),
                    ),
                ));
            }
        }
    }
}

/// Topological order of a schema's views by definition references
fn view_topo_order(schema: &Schema) -> Result<Vec<String>> {
    let deps: BTreeMap<String, BTreeSet<String>> = schema
        .views
        .iter()
        .map(|(name, v)| {
            let referenced = schema
                .views
                .keys()
                .filter(|other| *other != name && topo::references(&v.definition, other))
                .cloned()
                .collect();
            (name.clone(), referenced)
        })
        .collect();
    topo::sort(&deps)
}

fn sequence_changed(old: &Sequence, new: &Sequence) -> bool {
    old.data_type != new.data_type
        || old.start_value != new.start_value
        || old.increment != new.increment
        || old.min_value != new.min_value
        || old.max_value != new.max_value
        || old.cache_size != new.cache_size
        || old.cycle != new.cycle
}

fn function_changed(old: &Function, new: &Function) -> bool {
    old.body != new.body
        || old.language != new.language
        || old.volatility != new.volatility
        || old.security_definer != new.security_definer
        || old.strict != new.strict
        || old.search_path != new.search_path
}

fn procedure_changed(old: &Procedure, new: &Procedure) -> bool {
    old.body != new.body
        || old.language != new.language
        || old.security_definer != new.security_definer
        || old.search_path != new.search_path
}

fn aggregate_changed(old: &Aggregate, new: &Aggregate) -> bool {
    old.arguments != new.arguments
        || old.state_function != new.state_function
        || old.state_type != new.state_type
        || old.initial_condition != new.initial_condition
        || old.final_function != new.final_function
}

fn domain_changed(old: &Domain, new: &Domain) -> bool {
    old.data_type != new.data_type
        || old.not_null != new.not_null
        || old.default != new.default
        || old.constraints != new.constraints
}
