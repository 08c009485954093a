//! DDL text generation
//!
//! Every function renders the plain, offline form of one change. The
//! rewriter builds its safer multi-step variants on top of these.
//!
//! Identifiers are always double-quoted. Names are schema-qualified unless
//! the object lives in `public`, matching what the applier's search_path
//! setup expects.

use crate::ir::{
    Aggregate, Column, Constraint, ConstraintKind, Domain, Extension, Function, IdentityGeneration,
    Index, IndexKind, Policy, Procedure, Sequence, Table, Trigger, TypeDef, TypeKind, View,
};

/// Double-quote an identifier, escaping embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal, escaping embedded quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Qualified object name; the `public` prefix is omitted
pub fn qualify(schema: &str, name: &str) -> String {
    if schema == "public" {
        quote_ident(name)
    } else {
        format!("{}.{}", quote_ident(schema), quote_ident(name))
    }
}

// =============================================================================
// Schemas, extensions, types, domains, sequences
// =============================================================================

pub fn create_schema(name: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(name))
}

pub fn create_extension(ext: &Extension) -> String {
    format!(
        "CREATE EXTENSION IF NOT EXISTS {} WITH SCHEMA {}",
        quote_ident(&ext.name),
        quote_ident(&ext.schema)
    )
}

pub fn drop_extension(ext: &Extension) -> String {
    format!("DROP EXTENSION {}", quote_ident(&ext.name))
}

pub fn create_type(t: &TypeDef) -> String {
    match &t.kind {
        TypeKind::Enum { values } => {
            let list = values
                .iter()
                .map(|v| quote_literal(v))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "CREATE TYPE {} AS ENUM ({})",
                qualify(&t.schema, &t.name),
                list
            )
        }
        TypeKind::Composite { attributes } => {
            let list = attributes
                .iter()
                .map(|a| format!("{} {}", quote_ident(&a.name), a.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "CREATE TYPE {} AS ({})",
                qualify(&t.schema, &t.name),
                list
            )
        }
    }
}

/// `ALTER TYPE … ADD VALUE` statements for enum values present only in `new`
pub fn alter_enum_add_values(old_values: &[String], new: &TypeDef) -> Vec<String> {
    let TypeKind::Enum { values } = &new.kind else {
        return Vec::new();
    };
    values
        .iter()
        .filter(|v| !old_values.contains(v))
        .map(|v| {
            format!(
                "ALTER TYPE {} ADD VALUE IF NOT EXISTS {}",
                qualify(&new.schema, &new.name),
                quote_literal(v)
            )
        })
        .collect()
}

pub fn drop_type(t: &TypeDef) -> String {
    format!("DROP TYPE {}", qualify(&t.schema, &t.name))
}

pub fn create_domain(d: &Domain) -> String {
    let mut sql = format!(
        "CREATE DOMAIN {} AS {}",
        qualify(&d.schema, &d.name),
        d.data_type
    );
    if let Some(ref default) = d.default {
        sql.push_str(&format!(" DEFAULT {}", default));
    }
    if d.not_null {
        sql.push_str(" NOT NULL");
    }
    for c in &d.constraints {
        sql.push_str(&format!(
            " CONSTRAINT {} CHECK ({})",
            quote_ident(&c.name),
            c.expression
        ));
    }
    sql
}

pub fn drop_domain(d: &Domain) -> String {
    format!("DROP DOMAIN {}", qualify(&d.schema, &d.name))
}

pub fn create_sequence(s: &Sequence) -> String {
    let mut sql = format!("CREATE SEQUENCE {}", qualify(&s.schema, &s.name));
    if s.data_type != "bigint" {
        sql.push_str(&format!(" AS {}", s.data_type));
    }
    sql.push_str(&format!(" INCREMENT BY {}", s.increment));
    sql.push_str(&format!(" MINVALUE {}", s.min_value));
    sql.push_str(&format!(" MAXVALUE {}", s.max_value));
    sql.push_str(&format!(" START WITH {}", s.start_value));
    sql.push_str(&format!(" CACHE {}", s.cache_size));
    if s.cycle {
        sql.push_str(" CYCLE");
    }
    sql
}

/// `ALTER SEQUENCE` covering every changed attribute in one statement
pub fn alter_sequence(old: &Sequence, new: &Sequence) -> String {
    let mut clauses = Vec::new();
    if old.data_type != new.data_type {
        clauses.push(format!("AS {}", new.data_type));
    }
    if old.increment != new.increment {
        clauses.push(format!("INCREMENT BY {}", new.increment));
    }
    if old.min_value != new.min_value {
        clauses.push(format!("MINVALUE {}", new.min_value));
    }
    if old.max_value != new.max_value {
        clauses.push(format!("MAXVALUE {}", new.max_value));
    }
    if old.start_value != new.start_value {
        clauses.push(format!("START WITH {}", new.start_value));
    }
    if old.cache_size != new.cache_size {
        clauses.push(format!("CACHE {}", new.cache_size));
    }
    if old.cycle != new.cycle {
        clauses.push(if new.cycle { "CYCLE" } else { "NO CYCLE" }.to_string());
    }
    format!(
        "ALTER SEQUENCE {} {}",
        qualify(&new.schema, &new.name),
        clauses.join(" ")
    )
}

pub fn drop_sequence(s: &Sequence) -> String {
    format!("DROP SEQUENCE {}", qualify(&s.schema, &s.name))
}

// =============================================================================
// Routines
// =============================================================================

/// Whether a body uses SQL-standard syntax and embeds without dollar quoting
fn is_sql_standard_body(body: &str) -> bool {
    let upper = body.trim_start().to_uppercase();
    upper.starts_with("BEGIN ATOMIC") || upper.starts_with("RETURN ")
}

pub fn create_function(f: &Function) -> String {
    let mut sql = format!(
        "CREATE OR REPLACE FUNCTION {}({})",
        qualify(&f.schema, &f.name),
        f.arguments
    );
    if let Some(ref returns) = f.returns {
        sql.push_str(&format!(" RETURNS {}", returns));
    }
    sql.push_str(&format!("\nLANGUAGE {}", f.language));
    if f.volatility != "VOLATILE" {
        sql.push_str(&format!("\n{}", f.volatility));
    }
    if f.strict {
        sql.push_str("\nSTRICT");
    }
    if f.security_definer {
        sql.push_str("\nSECURITY DEFINER");
    }
    if let Some(ref path) = f.search_path {
        sql.push_str(&format!("\nSET search_path = {}", path));
    }
    if is_sql_standard_body(&f.body) {
        sql.push_str(&format!("\n{}", f.body.trim_end()));
    } else {
        sql.push_str(&format!("\nAS $function$\n{}$function$", f.body));
    }
    sql
}

pub fn drop_function(f: &Function) -> String {
    format!(
        "DROP FUNCTION {}({})",
        qualify(&f.schema, &f.name),
        f.arguments
    )
}

pub fn create_procedure(p: &Procedure) -> String {
    let mut sql = format!(
        "CREATE OR REPLACE PROCEDURE {}({})",
        qualify(&p.schema, &p.name),
        p.arguments
    );
    sql.push_str(&format!("\nLANGUAGE {}", p.language));
    if p.security_definer {
        sql.push_str("\nSECURITY DEFINER");
    }
    if let Some(ref path) = p.search_path {
        sql.push_str(&format!("\nSET search_path = {}", path));
    }
    if is_sql_standard_body(&p.body) {
        sql.push_str(&format!("\n{}", p.body.trim_end()));
    } else {
        sql.push_str(&format!("\nAS $procedure$\n{}$procedure$", p.body));
    }
    sql
}

pub fn drop_procedure(p: &Procedure) -> String {
    format!(
        "DROP PROCEDURE {}({})",
        qualify(&p.schema, &p.name),
        p.arguments
    )
}

pub fn create_aggregate(a: &Aggregate) -> String {
    let mut parts = vec![
        format!("SFUNC = {}", a.state_function),
        format!("STYPE = {}", a.state_type),
    ];
    if let Some(ref final_fn) = a.final_function {
        parts.push(format!("FINALFUNC = {}", final_fn));
    }
    if let Some(ref init) = a.initial_condition {
        parts.push(format!("INITCOND = {}", quote_literal(init)));
    }
    format!(
        "CREATE AGGREGATE {}({}) ({})",
        qualify(&a.schema, &a.name),
        a.arguments,
        parts.join(", ")
    )
}

pub fn drop_aggregate(a: &Aggregate) -> String {
    format!(
        "DROP AGGREGATE {}({})",
        qualify(&a.schema, &a.name),
        a.arguments
    )
}

// =============================================================================
// Tables and sub-objects
// =============================================================================

/// Column definition fragment for CREATE TABLE / ADD COLUMN
pub fn column_def(col: &Column) -> String {
    let mut def = format!("{} {}", quote_ident(&col.name), col.data_type);
    if let Some(ref expr) = col.generated {
        def.push_str(&format!(" GENERATED ALWAYS AS ({}) STORED", expr));
    }
    if let Some(identity) = col.identity {
        let mode = match identity {
            IdentityGeneration::Always => "ALWAYS",
            IdentityGeneration::ByDefault => "BY DEFAULT",
        };
        def.push_str(&format!(" GENERATED {} AS IDENTITY", mode));
    }
    if let Some(ref default) = col.default {
        def.push_str(&format!(" DEFAULT {}", default));
    }
    if col.not_null {
        def.push_str(" NOT NULL");
    }
    def
}

/// Constraint definition fragment for CREATE TABLE / ADD CONSTRAINT
pub fn constraint_def(con: &Constraint) -> String {
    let cols = |names: &[String]| {
        names
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut def = format!("CONSTRAINT {} ", quote_ident(&con.name));
    match con.kind {
        ConstraintKind::PrimaryKey => {
            def.push_str(&format!("PRIMARY KEY ({})", cols(&con.columns)));
        }
        ConstraintKind::Unique => {
            def.push_str(&format!("UNIQUE ({})", cols(&con.columns)));
        }
        ConstraintKind::Check => {
            def.push_str(&format!(
                "CHECK ({})",
                con.expression.as_deref().unwrap_or_default()
            ));
        }
        ConstraintKind::Exclude => {
            // pg_get_constraintdef already renders the full EXCLUDE clause
            def.push_str(con.expression.as_deref().unwrap_or_default());
        }
        ConstraintKind::ForeignKey => {
            def.push_str(&format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                cols(&con.columns),
                qualify(
                    con.referenced_schema.as_deref().unwrap_or("public"),
                    con.referenced_table.as_deref().unwrap_or_default()
                ),
                cols(&con.referenced_columns)
            ));
            if let Some(ref action) = con.on_update {
                if action != "NO ACTION" {
                    def.push_str(&format!(" ON UPDATE {}", action));
                }
            }
            if let Some(ref action) = con.on_delete {
                if action != "NO ACTION" {
                    def.push_str(&format!(" ON DELETE {}", action));
                }
            }
        }
    }
    if con.deferrable {
        def.push_str(" DEFERRABLE");
        if con.initially_deferred {
            def.push_str(" INITIALLY DEFERRED");
        }
    }
    def
}

/// CREATE TABLE with inline constraints. Indexes, triggers, policies, RLS
/// and comments are appended as separate statements by the caller.
pub fn create_table(table: &Table) -> String {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("    {}", column_def(c)))
        .collect();
    for con in table.constraints.values() {
        lines.push(format!("    {}", constraint_def(con)));
    }
    let mut sql = format!(
        "CREATE TABLE {} (\n{}\n)",
        qualify(&table.schema, &table.name),
        lines.join(",\n")
    );
    if let Some(ref partition_by) = table.partition_by {
        sql.push_str(&format!(" PARTITION BY {}", partition_by));
    }
    sql
}

pub fn drop_table(table: &Table) -> String {
    format!("DROP TABLE {}", qualify(&table.schema, &table.name))
}

pub fn add_column(schema: &str, table: &str, col: &Column) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        qualify(schema, table),
        column_def(col)
    )
}

pub fn drop_column(schema: &str, table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {}",
        qualify(schema, table),
        quote_ident(column)
    )
}

/// One ALTER statement per changed column attribute.
///
/// A generated-expression change cannot be altered in place and falls back
/// to drop+add of the column.
pub fn alter_column(schema: &str, table: &str, old: &Column, new: &Column) -> Vec<String> {
    let target = qualify(schema, table);
    let col = quote_ident(&new.name);

    if old.generated != new.generated {
        return vec![
            drop_column(schema, table, &old.name),
            add_column(schema, table, new),
        ];
    }

    let mut stmts = Vec::new();
    if old.data_type != new.data_type {
        stmts.push(format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{}",
            target, col, new.data_type, col, new.data_type
        ));
    }
    if old.default != new.default {
        match &new.default {
            Some(default) => stmts.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                target, col, default
            )),
            None => stmts.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                target, col
            )),
        }
    }
    if old.identity != new.identity {
        match new.identity {
            Some(identity) => {
                let mode = match identity {
                    IdentityGeneration::Always => "ALWAYS",
                    IdentityGeneration::ByDefault => "BY DEFAULT",
                };
                if old.identity.is_some() {
                    stmts.push(format!(
                        "ALTER TABLE {} ALTER COLUMN {} SET GENERATED {}",
                        target, col, mode
                    ));
                } else {
                    stmts.push(format!(
                        "ALTER TABLE {} ALTER COLUMN {} ADD GENERATED {} AS IDENTITY",
                        target, col, mode
                    ));
                }
            }
            None => stmts.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP IDENTITY",
                target, col
            )),
        }
    }
    if old.not_null != new.not_null {
        if new.not_null {
            stmts.push(set_not_null(schema, table, &new.name));
        } else {
            stmts.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL",
                target, col
            ));
        }
    }
    stmts
}

pub fn set_not_null(schema: &str, table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
        qualify(schema, table),
        quote_ident(column)
    )
}

pub fn add_constraint(con: &Constraint) -> String {
    format!(
        "ALTER TABLE {} ADD {}",
        qualify(&con.schema, &con.table),
        constraint_def(con)
    )
}

pub fn validate_constraint(schema: &str, table: &str, name: &str) -> String {
    format!(
        "ALTER TABLE {} VALIDATE CONSTRAINT {}",
        qualify(schema, table),
        quote_ident(name)
    )
}

pub fn drop_constraint(con: &Constraint) -> String {
    format!(
        "ALTER TABLE {} DROP CONSTRAINT {}",
        qualify(&con.schema, &con.table),
        quote_ident(&con.name)
    )
}

/// CREATE INDEX in its offline form; the rewriter swaps in the concurrent
/// variant.
pub fn create_index(ix: &Index) -> String {
    create_index_named(ix, &ix.name, false)
}

/// CREATE INDEX with an explicit name and optional CONCURRENTLY
pub fn create_index_named(ix: &Index, name: &str, concurrently: bool) -> String {
    let unique = match ix.kind {
        IndexKind::Unique | IndexKind::Primary => "UNIQUE ",
        IndexKind::Regular => "",
    };
    let concurrent = if concurrently {
        "CONCURRENTLY IF NOT EXISTS "
    } else {
        ""
    };
    let cols = ix
        .columns
        .iter()
        .map(|c| {
            let value = if c.is_expression {
                format!("({})", c.value)
            } else {
                quote_ident(&c.value)
            };
            let mut part = value;
            if let Some(ref opclass) = c.opclass {
                part.push_str(&format!(" {}", opclass));
            }
            if !c.asc {
                part.push_str(" DESC");
            }
            part
        })
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "CREATE {}INDEX {}{} ON {} USING {} ({})",
        unique,
        concurrent,
        quote_ident(name),
        qualify(&ix.schema, &ix.table),
        ix.method,
        cols
    );
    if let Some(ref predicate) = ix.predicate {
        sql.push_str(&format!(" WHERE {}", predicate));
    }
    sql
}

pub fn drop_index(ix: &Index) -> String {
    format!("DROP INDEX {}", qualify(&ix.schema, &ix.name))
}

pub fn rename_index(schema: &str, from: &str, to: &str) -> String {
    format!(
        "ALTER INDEX {} RENAME TO {}",
        qualify(schema, from),
        quote_ident(to)
    )
}

pub fn create_trigger(tr: &Trigger) -> String {
    tr.definition.clone()
}

/// Replace variant used when a trigger's definition changed
pub fn replace_trigger(tr: &Trigger) -> String {
    if tr.definition.to_uppercase().starts_with("CREATE TRIGGER") {
        format!("CREATE OR REPLACE{}", &tr.definition["CREATE".len()..])
    } else {
        tr.definition.clone()
    }
}

pub fn drop_trigger(tr: &Trigger) -> String {
    format!(
        "DROP TRIGGER {} ON {}",
        quote_ident(&tr.name),
        qualify(&tr.schema, &tr.table)
    )
}

pub fn create_policy(p: &Policy) -> String {
    let mut sql = format!(
        "CREATE POLICY {} ON {}",
        quote_ident(&p.name),
        qualify(&p.schema, &p.table)
    );
    if !p.permissive {
        sql.push_str(" AS RESTRICTIVE");
    }
    sql.push_str(&format!(" FOR {}", p.command.as_sql()));
    if !p.roles.is_empty() {
        let roles = p
            .roles
            .iter()
            .map(|r| {
                if r == "public" {
                    r.clone()
                } else {
                    quote_ident(r)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(&format!(" TO {}", roles));
    }
    if let Some(ref using) = p.using {
        sql.push_str(&format!(" USING ({})", using));
    }
    if let Some(ref with_check) = p.with_check {
        sql.push_str(&format!(" WITH CHECK ({})", with_check));
    }
    sql
}

pub fn drop_policy(p: &Policy) -> String {
    format!(
        "DROP POLICY {} ON {}",
        quote_ident(&p.name),
        qualify(&p.schema, &p.table)
    )
}

pub fn set_rls(table: &Table, enabled: bool) -> String {
    let verb = if enabled { "ENABLE" } else { "DISABLE" };
    format!(
        "ALTER TABLE {} {} ROW LEVEL SECURITY",
        qualify(&table.schema, &table.name),
        verb
    )
}

// =============================================================================
// Views
// =============================================================================

pub fn create_view(v: &View) -> String {
    if v.materialized {
        format!(
            "CREATE MATERIALIZED VIEW {} AS\n{}",
            qualify(&v.schema, &v.name),
            v.definition
        )
    } else {
        format!(
            "CREATE OR REPLACE VIEW {} AS\n{}",
            qualify(&v.schema, &v.name),
            v.definition
        )
    }
}

pub fn drop_view(v: &View) -> String {
    let materialized = if v.materialized { "MATERIALIZED " } else { "" };
    format!(
        "DROP {}VIEW {}",
        materialized,
        qualify(&v.schema, &v.name)
    )
}

// =============================================================================
// Comments
// =============================================================================

/// `COMMENT ON <kind> <target> IS …`; a `None` comment clears it
pub fn comment_on(kind: &str, target: &str, comment: Option<&str>) -> String {
    let value = match comment {
        Some(text) => quote_literal(text),
        None => "NULL".to_string(),
    };
    format!("COMMENT ON {} {} IS {}", kind, target, value)
}

pub fn comment_on_column(schema: &str, table: &str, column: &str, comment: Option<&str>) -> String {
    comment_on(
        "COLUMN",
        &format!("{}.{}", qualify(schema, table), quote_ident(column)),
        comment,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IndexColumn;

    fn sample_column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            position: 1,
            data_type: "integer".to_string(),
            not_null: false,
            default: None,
            identity: None,
            generated: None,
            comment: None,
        }
    }

    fn sample_table(name: &str) -> Table {
        Table {
            schema: "public".to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_qualify_omits_public() {
        assert_eq!(qualify("public", "users"), "\"users\"");
        assert_eq!(qualify("tenant", "users"), "\"tenant\".\"users\"");
    }

    #[test]
    fn test_column_def_orders_clauses() {
        let mut col = sample_column("id");
        col.not_null = true;
        col.default = Some("0".to_string());
        assert_eq!(column_def(&col), "\"id\" integer DEFAULT 0 NOT NULL");
    }

    #[test]
    fn test_create_table_inlines_constraints() {
        let mut table = sample_table("users");
        table.columns.push(sample_column("id"));
        table.constraints.insert(
            "users_pkey".to_string(),
            Constraint {
                schema: "public".to_string(),
                table: "users".to_string(),
                name: "users_pkey".to_string(),
                kind: ConstraintKind::PrimaryKey,
                columns: vec!["id".to_string()],
                referenced_schema: None,
                referenced_table: None,
                referenced_columns: vec![],
                on_update: None,
                on_delete: None,
                deferrable: false,
                initially_deferred: false,
                expression: None,
                validated: true,
            },
        );
        let sql = create_table(&table);
        assert!(sql.starts_with("CREATE TABLE \"users\" ("));
        assert!(sql.contains("CONSTRAINT \"users_pkey\" PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn test_fk_constraint_def_carries_actions() {
        let con = Constraint {
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
        };
        let def = constraint_def(&con);
        assert!(def.contains("FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\")"));
        assert!(def.contains("ON DELETE CASCADE"));
        assert!(def.ends_with("DEFERRABLE"));
    }

    #[test]
    fn test_create_index_concurrent_variant() {
        let ix = Index {
            schema: "public".to_string(),
            table: "users".to_string(),
            name: "users_email_idx".to_string(),
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
        };
        assert_eq!(
            create_index(&ix),
            "CREATE INDEX \"users_email_idx\" ON \"users\" USING btree (\"email\")"
        );
        let concurrent = create_index_named(&ix, &ix.name, true);
        assert!(concurrent.contains("CONCURRENTLY IF NOT EXISTS"));
    }

    #[test]
    fn test_alter_column_type_uses_cast() {
        let old = sample_column("age");
        let mut new = sample_column("age");
        new.data_type = "bigint".to_string();
        let stmts = alter_column("public", "users", &old, &new);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].contains("TYPE bigint USING \"age\"::bigint"));
    }

    #[test]
    fn test_comment_clears_with_null() {
        assert_eq!(
            comment_on("TABLE", "\"users\"", None),
            "COMMENT ON TABLE \"users\" IS NULL"
        );
        assert_eq!(
            comment_on("TABLE", "\"users\"", Some("it's users")),
            "COMMENT ON TABLE \"users\" IS 'it''s users'"
        );
    }

    #[test]
    fn test_replace_trigger_injects_or_replace() {
        let tr = Trigger {
            schema: "public".to_string(),
            table: "users".to_string(),
            name: "audit".to_string(),
            definition: "CREATE TRIGGER audit AFTER INSERT ON users FOR EACH ROW EXECUTE FUNCTION log()".to_string(),
            comment: None,
        };
        assert!(replace_trigger(&tr).starts_with("CREATE OR REPLACE TRIGGER audit"));
    }
}
