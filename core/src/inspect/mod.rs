//! Database introspection
//!
//! The inspector runs a fixed catalog of read-only queries against one
//! schema and assembles the rows into an [`Ir`]. Row shapes live in
//! `Raw*` structs so the assembly logic stays pure and testable without a
//! live database.

pub mod queries;

use crate::connect::ConnectConfig;
use crate::error::{Error, Result};
use crate::ignore::IgnoreConfig;
use crate::ir::{
    Aggregate, Column, CompositeAttribute, Constraint, ConstraintKind, Domain, DomainConstraint,
    Extension, Function, IdentityGeneration, Index, IndexColumn, IndexKind, Ir, Policy,
    PolicyCommand, Procedure, Schema, Sequence, Table, Trigger, TypeDef, TypeKind, View,
};
use std::collections::BTreeMap;
use tokio_postgres::Client;

// =============================================================================
// Raw Query Result Types
// =============================================================================

#[derive(Debug, Clone)]
pub struct RawTableInfo {
    pub schema: String,
    pub name: String,
    pub rls_enabled: bool,
    pub is_partition: bool,
    pub partition_by: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawColumnInfo {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub position: i32,
    pub data_type: String,
    pub not_null: bool,
    /// `a` = always, `d` = by default, empty = not identity
    pub identity: String,
    /// `s` = stored generated column, empty otherwise
    pub generated: String,
    pub default_expr: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawConstraintInfo {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// `p`, `f`, `u`, `c`, `x`
    pub kind: String,
    pub columns: Vec<String>,
    pub referenced_schema: Option<String>,
    pub referenced_table: Option<String>,
    pub referenced_columns: Vec<String>,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
    pub deferrable: bool,
    pub initially_deferred: bool,
    pub validated: bool,
    pub expression: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawIndexInfo {
    pub schema: String,
    pub table: String,
    /// `r`/`p` for tables, `m` for materialized views
    pub owner_kind: String,
    pub name: String,
    pub method: String,
    pub is_unique: bool,
    pub is_primary: bool,
    /// Per-column output of `pg_get_indexdef`
    pub columns: Vec<String>,
    pub predicate: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawViewInfo {
    pub schema: String,
    pub name: String,
    pub materialized: bool,
    pub definition: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawRoutineInfo {
    pub schema: String,
    pub name: String,
    /// `f` = function, `p` = procedure, `a` = aggregate
    pub kind: String,
    pub arguments: String,
    pub returns: Option<String>,
    pub body: String,
    pub language: String,
    /// `i`, `s`, `v`
    pub volatility: String,
    pub security_definer: bool,
    pub strict: bool,
    pub search_path: Option<String>,
    pub agg_state_function: Option<String>,
    pub agg_state_type: Option<String>,
    pub agg_initial_condition: Option<String>,
    pub agg_final_function: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawEnumInfo {
    pub schema: String,
    pub name: String,
    pub values: Vec<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawCompositeInfo {
    pub schema: String,
    pub name: String,
    pub attribute_names: Vec<String>,
    pub attribute_types: Vec<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawDomainInfo {
    pub schema: String,
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default_expr: Option<String>,
    pub constraint_names: Vec<String>,
    pub constraint_exprs: Vec<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawSequenceInfo {
    pub schema: String,
    pub name: String,
    pub data_type: String,
    pub start_value: i64,
    pub increment: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub cache_size: i64,
    pub cycle: bool,
    /// Set when a serial column owns the sequence; such sequences are
    /// auto-managed and excluded from the IR
    pub owned_by_table: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawTriggerInfo {
    pub schema: String,
    pub table: String,
    /// `r`/`p` for tables, `v` for views
    pub owner_kind: String,
    pub name: String,
    pub definition: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawPolicyInfo {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// `r`, `a`, `w`, `d`, `*`
    pub command: String,
    pub permissive: bool,
    pub roles: Vec<String>,
    pub using: Option<String>,
    pub with_check: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawExtensionInfo {
    pub name: String,
    pub schema: String,
    pub version: String,
    pub comment: Option<String>,
}

/// Everything fetched from the catalogs for one schema
#[derive(Debug, Clone, Default)]
pub struct RawSchema {
    pub tables: Vec<RawTableInfo>,
    pub columns: Vec<RawColumnInfo>,
    pub constraints: Vec<RawConstraintInfo>,
    pub indexes: Vec<RawIndexInfo>,
    pub views: Vec<RawViewInfo>,
    pub routines: Vec<RawRoutineInfo>,
    pub enums: Vec<RawEnumInfo>,
    pub composites: Vec<RawCompositeInfo>,
    pub domains: Vec<RawDomainInfo>,
    pub sequences: Vec<RawSequenceInfo>,
    pub triggers: Vec<RawTriggerInfo>,
    pub policies: Vec<RawPolicyInfo>,
    pub extensions: Vec<RawExtensionInfo>,
}

// =============================================================================
// Assembly
// =============================================================================

/// Convert PostgreSQL foreign key action codes to SQL keywords
fn fk_action(code: &str) -> Option<String> {
    let action = match code {
        "a" => "NO ACTION",
        "r" => "RESTRICT",
        "c" => "CASCADE",
        "n" => "SET NULL",
        "d" => "SET DEFAULT",
        _ => return None,
    };
    Some(action.to_string())
}

/// Parse one `pg_get_indexdef` column into an [`IndexColumn`].
///
/// Each element is a single key like `"email"`, `lower(email)`,
/// `name DESC`, or `name text_pattern_ops`.
pub fn parse_index_column(def: &str) -> IndexColumn {
    let trimmed = def.trim();
    let upper = trimmed.to_uppercase();
    let asc = !upper.contains(" DESC");

    let mut core = trimmed.to_string();
    for token in [" ASC", " DESC", " NULLS FIRST", " NULLS LAST"] {
        if let Some(pos) = core.to_uppercase().find(token) {
            core.truncate(pos);
            break;
        }
    }
    let core = core.trim().to_string();

    let is_expression =
        core.contains('(') || core.contains(')') || core.contains("::");

    let mut opclass = None;
    let mut value = core.clone();
    if !is_expression {
        let parts: Vec<&str> = core.split_whitespace().collect();
        if parts.len() >= 2 {
            value = parts[0].to_string();
            opclass = Some(parts[1].to_string());
        }
    }

    IndexColumn {
        value,
        is_expression,
        asc,
        opclass,
    }
}

fn process_index(raw: &RawIndexInfo) -> Index {
    let kind = if raw.is_primary {
        IndexKind::Primary
    } else if raw.is_unique {
        IndexKind::Unique
    } else {
        IndexKind::Regular
    };
    Index {
        schema: raw.schema.clone(),
        table: raw.table.clone(),
        name: raw.name.clone(),
        method: raw.method.clone(),
        columns: raw.columns.iter().map(|c| parse_index_column(c)).collect(),
        kind,
        predicate: raw.predicate.clone(),
        comment: raw.comment.clone(),
    }
}

fn process_constraint(raw: &RawConstraintInfo) -> Option<Constraint> {
    let kind = match raw.kind.as_str() {
        "p" => ConstraintKind::PrimaryKey,
        "f" => ConstraintKind::ForeignKey,
        "u" => ConstraintKind::Unique,
        "c" => ConstraintKind::Check,
        "x" => ConstraintKind::Exclude,
        _ => return None,
    };
    let is_fk = kind == ConstraintKind::ForeignKey;
    Some(Constraint {
        schema: raw.schema.clone(),
        table: raw.table.clone(),
        name: raw.name.clone(),
        kind,
        columns: raw.columns.clone(),
        referenced_schema: is_fk.then(|| raw.referenced_schema.clone()).flatten(),
        referenced_table: is_fk.then(|| raw.referenced_table.clone()).flatten(),
        referenced_columns: if is_fk {
            raw.referenced_columns.clone()
        } else {
            Vec::new()
        },
        on_update: if is_fk {
            raw.on_update.as_deref().and_then(fk_action)
        } else {
            None
        },
        on_delete: if is_fk {
            raw.on_delete.as_deref().and_then(fk_action)
        } else {
            None
        },
        deferrable: raw.deferrable,
        initially_deferred: raw.initially_deferred,
        expression: raw.expression.clone(),
        validated: raw.validated,
    })
}

fn process_column(raw: &RawColumnInfo) -> Column {
    let identity = match raw.identity.as_str() {
        "a" => Some(IdentityGeneration::Always),
        "d" => Some(IdentityGeneration::ByDefault),
        _ => None,
    };
    // For stored generated columns pg_attrdef holds the generation
    // expression, not a default.
    let (default, generated) = if raw.generated == "s" {
        (None, raw.default_expr.clone())
    } else {
        (raw.default_expr.clone(), None)
    };
    Column {
        name: raw.name.clone(),
        position: raw.position,
        data_type: raw.data_type.clone(),
        not_null: raw.not_null,
        default,
        identity,
        generated,
        comment: raw.comment.clone(),
    }
}

fn process_policy(raw: &RawPolicyInfo) -> Option<Policy> {
    let command = match raw.command.as_str() {
        "*" => PolicyCommand::All,
        "r" => PolicyCommand::Select,
        "a" => PolicyCommand::Insert,
        "w" => PolicyCommand::Update,
        "d" => PolicyCommand::Delete,
        _ => return None,
    };
    Some(Policy {
        schema: raw.schema.clone(),
        table: raw.table.clone(),
        name: raw.name.clone(),
        command,
        permissive: raw.permissive,
        roles: raw.roles.clone(),
        using: raw.using.clone(),
        with_check: raw.with_check.clone(),
    })
}

/// Ensure routine bodies end with exactly one trailing newline
fn normalize_body(body: &str) -> String {
    let trimmed = body.trim_end_matches('\n');
    format!("{}\n", trimmed)
}

/// Assemble the raw catalog rows into an [`Ir`] for one schema.
///
/// Ignore rules are applied last so sub-objects of ignored tables never
/// leak through.
pub fn assemble(target_schema: &str, raw: RawSchema, ignore: &IgnoreConfig) -> Ir {
    let mut schema = Schema::new(target_schema);

    for e in &raw.extensions {
        schema.extensions.insert(
            e.name.clone(),
            Extension {
                name: e.name.clone(),
                schema: e.schema.clone(),
                version: e.version.clone(),
                comment: e.comment.clone(),
            },
        );
    }

    for raw_enum in &raw.enums {
        schema.types.insert(
            raw_enum.name.clone(),
            TypeDef {
                schema: raw_enum.schema.clone(),
                name: raw_enum.name.clone(),
                kind: TypeKind::Enum {
                    values: raw_enum.values.clone(),
                },
                comment: raw_enum.comment.clone(),
            },
        );
    }

    for raw_comp in &raw.composites {
        let attributes = raw_comp
            .attribute_names
            .iter()
            .zip(raw_comp.attribute_types.iter())
            .map(|(name, data_type)| CompositeAttribute {
                name: name.clone(),
                data_type: data_type.clone(),
            })
            .collect();
        schema.types.insert(
            raw_comp.name.clone(),
            TypeDef {
                schema: raw_comp.schema.clone(),
                name: raw_comp.name.clone(),
                kind: TypeKind::Composite { attributes },
                comment: raw_comp.comment.clone(),
            },
        );
    }

    for d in &raw.domains {
        let constraints = d
            .constraint_names
            .iter()
            .zip(d.constraint_exprs.iter())
            .map(|(name, expression)| DomainConstraint {
                name: name.clone(),
                expression: expression.clone(),
            })
            .collect();
        schema.domains.insert(
            d.name.clone(),
            Domain {
                schema: d.schema.clone(),
                name: d.name.clone(),
                data_type: d.data_type.clone(),
                not_null: d.not_null,
                default: d.default_expr.clone(),
                constraints,
                comment: d.comment.clone(),
            },
        );
    }

    for s in &raw.sequences {
        // Sequences owned by serial columns are auto-managed; diffing them
        // would emit drops that break the owning column.
        if s.owned_by_table.is_some() {
            continue;
        }
        schema.sequences.insert(
            s.name.clone(),
            Sequence {
                schema: s.schema.clone(),
                name: s.name.clone(),
                data_type: s.data_type.clone(),
                start_value: s.start_value,
                increment: s.increment,
                min_value: s.min_value,
                max_value: s.max_value,
                cache_size: s.cache_size,
                cycle: s.cycle,
                comment: s.comment.clone(),
            },
        );
    }

    for r in &raw.routines {
        match r.kind.as_str() {
            "f" => {
                let volatility = match r.volatility.as_str() {
                    "i" => "IMMUTABLE",
                    "s" => "STABLE",
                    _ => "VOLATILE",
                };
                schema.functions.insert(
                    r.name.clone(),
                    Function {
                        schema: r.schema.clone(),
                        name: r.name.clone(),
                        arguments: r.arguments.clone(),
                        returns: r.returns.clone(),
                        body: normalize_body(&r.body),
                        language: r.language.clone(),
                        volatility: volatility.to_string(),
                        security_definer: r.security_definer,
                        strict: r.strict,
                        search_path: r.search_path.clone(),
                        comment: r.comment.clone(),
                    },
                );
            }
            "p" => {
                schema.procedures.insert(
                    r.name.clone(),
                    Procedure {
                        schema: r.schema.clone(),
                        name: r.name.clone(),
                        arguments: r.arguments.clone(),
                        body: normalize_body(&r.body),
                        language: r.language.clone(),
                        security_definer: r.security_definer,
                        search_path: r.search_path.clone(),
                        comment: r.comment.clone(),
                    },
                );
            }
            "a" => {
                schema.aggregates.insert(
                    r.name.clone(),
                    Aggregate {
                        schema: r.schema.clone(),
                        name: r.name.clone(),
                        arguments: r.arguments.clone(),
                        state_function: r.agg_state_function.clone().unwrap_or_default(),
                        state_type: r.agg_state_type.clone().unwrap_or_default(),
                        initial_condition: r.agg_initial_condition.clone(),
                        final_function: r.agg_final_function.clone(),
                        comment: r.comment.clone(),
                    },
                );
            }
            _ => {}
        }
    }

    for t in &raw.tables {
        schema.tables.insert(
            t.name.clone(),
            Table {
                schema: t.schema.clone(),
                name: t.name.clone(),
                columns: Vec::new(),
                constraints: BTreeMap::new(),
                indexes: BTreeMap::new(),
                triggers: BTreeMap::new(),
                policies: BTreeMap::new(),
                rls_enabled: t.rls_enabled,
                partition_by: t.partition_by.clone(),
                is_partition: t.is_partition,
                comment: t.comment.clone(),
            },
        );
    }

    for c in &raw.columns {
        if let Some(table) = schema.tables.get_mut(&c.table) {
            table.columns.push(process_column(c));
        }
    }
    for table in schema.tables.values_mut() {
        table.columns.sort_by_key(|c| c.position);
    }

    for c in &raw.constraints {
        if let (Some(table), Some(constraint)) =
            (schema.tables.get_mut(&c.table), process_constraint(c))
        {
            table.constraints.insert(c.name.clone(), constraint);
        }
    }

    for v in &raw.views {
        schema.views.insert(
            v.name.clone(),
            View {
                schema: v.schema.clone(),
                name: v.name.clone(),
                definition: v.definition.trim_end().to_string(),
                materialized: v.materialized,
                indexes: BTreeMap::new(),
                triggers: BTreeMap::new(),
                comment: v.comment.clone(),
            },
        );
    }

    for i in &raw.indexes {
        let index = process_index(i);
        match i.owner_kind.as_str() {
            "m" => {
                if let Some(view) = schema.views.get_mut(&i.table) {
                    view.indexes.insert(i.name.clone(), index);
                }
            }
            _ => {
                if let Some(table) = schema.tables.get_mut(&i.table) {
                    table.indexes.insert(i.name.clone(), index);
                }
            }
        }
    }

    for t in &raw.triggers {
        let trigger = Trigger {
            schema: t.schema.clone(),
            table: t.table.clone(),
            name: t.name.clone(),
            definition: t.definition.clone(),
            comment: t.comment.clone(),
        };
        match t.owner_kind.as_str() {
            "v" => {
                if let Some(view) = schema.views.get_mut(&t.table) {
                    view.triggers.insert(t.name.clone(), trigger);
                }
            }
            _ => {
                if let Some(table) = schema.tables.get_mut(&t.table) {
                    table.triggers.insert(t.name.clone(), trigger);
                }
            }
        }
    }

    for p in &raw.policies {
        if let (Some(table), Some(policy)) =
            (schema.tables.get_mut(&p.table), process_policy(p))
        {
            table.policies.insert(p.name.clone(), policy);
        }
    }

    let mut ir = Ir::default();
    ir.schemas.insert(target_schema.to_string(), schema);
    ignore.filter_ir(&mut ir);
    ir
}

// =============================================================================
// Inspector
// =============================================================================

/// Introspects one schema of a live database into an [`Ir`]
pub struct Inspector<'a> {
    client: &'a Client,
}

impl<'a> Inspector<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Connect with `config` and introspect `target_schema`
    pub async fn inspect(
        config: &ConnectConfig,
        target_schema: &str,
        ignore: &IgnoreConfig,
    ) -> Result<Ir> {
        let client = config.connect().await?;
        Inspector::new(&client).build_ir(target_schema, ignore).await
    }

    /// Run the full query catalog and assemble the IR.
    ///
    /// A missing schema yields an IR without the schema entry, which the
    /// differ turns into a leading `CREATE SCHEMA`.
    pub async fn build_ir(&self, target_schema: &str, ignore: &IgnoreConfig) -> Result<Ir> {
        let exists_row = self
            .client
            .query_one(queries::SCHEMA_EXISTS_QUERY, &[&target_schema])
            .await?;
        if !exists_row.get::<_, bool>(0) {
            return Ok(Ir::default());
        }

        let raw = self.fetch_raw(target_schema).await?;
        Ok(assemble(target_schema, raw, ignore))
    }

    async fn fetch_raw(&self, target_schema: &str) -> Result<RawSchema> {
        let mut raw = RawSchema::default();
        let schema_param: &(dyn tokio_postgres::types::ToSql + Sync) = &target_schema;

        for row in self
            .client
            .query(queries::TABLES_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("tables", e))?
        {
            raw.tables.push(RawTableInfo {
                schema: row.get(0),
                name: row.get(1),
                rls_enabled: row.get(2),
                is_partition: row.get(3),
                partition_by: row.get(4),
                comment: row.get(5),
            });
        }

        for row in self
            .client
            .query(queries::COLUMNS_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("columns", e))?
        {
            raw.columns.push(RawColumnInfo {
                schema: row.get(0),
                table: row.get(1),
                name: row.get(2),
                position: row.get(3),
                data_type: row.get(4),
                not_null: row.get(5),
                identity: row.get(6),
                generated: row.get(7),
                default_expr: row.get(8),
                comment: row.get(9),
            });
        }

        for row in self
            .client
            .query(queries::CONSTRAINTS_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("constraints", e))?
        {
            raw.constraints.push(RawConstraintInfo {
                schema: row.get(0),
                table: row.get(1),
                name: row.get(2),
                kind: row.get(3),
                columns: row.get(4),
                referenced_schema: row.get(5),
                referenced_table: row.get(6),
                referenced_columns: row.get(7),
                on_update: row.get(8),
                on_delete: row.get(9),
                deferrable: row.get(10),
                initially_deferred: row.get(11),
                validated: row.get(12),
                expression: row.get(13),
            });
        }

        for row in self
            .client
            .query(queries::INDEXES_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("indexes", e))?
        {
            raw.indexes.push(RawIndexInfo {
                schema: row.get(0),
                table: row.get(1),
                owner_kind: row.get(2),
                name: row.get(3),
                method: row.get(4),
                is_unique: row.get(5),
                is_primary: row.get(6),
                columns: row.get(7),
                predicate: row.get(8),
                comment: row.get(9),
            });
        }

        for row in self
            .client
            .query(queries::VIEWS_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("views", e))?
        {
            raw.views.push(RawViewInfo {
                schema: row.get(0),
                name: row.get(1),
                materialized: row.get(2),
                definition: row.get(3),
                comment: row.get(4),
            });
        }

        for row in self
            .client
            .query(queries::ROUTINES_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("routines", e))?
        {
            raw.routines.push(RawRoutineInfo {
                schema: row.get(0),
                name: row.get(1),
                kind: row.get(2),
                arguments: row.get(3),
                returns: row.get(4),
                body: row.get(5),
                language: row.get(6),
                volatility: row.get(7),
                security_definer: row.get(8),
                strict: row.get(9),
                search_path: row.get(10),
                agg_state_function: row.get(11),
                agg_state_type: row.get(12),
                agg_initial_condition: row.get(13),
                agg_final_function: row.get(14),
                comment: row.get(15),
            });
        }

        for row in self
            .client
            .query(queries::ENUMS_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("enums", e))?
        {
            raw.enums.push(RawEnumInfo {
                schema: row.get(0),
                name: row.get(1),
                values: row.get(2),
                comment: row.get(3),
            });
        }

        for row in self
            .client
            .query(queries::COMPOSITE_TYPES_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("composite types", e))?
        {
            raw.composites.push(RawCompositeInfo {
                schema: row.get(0),
                name: row.get(1),
                attribute_names: row.get(2),
                attribute_types: row.get(3),
                comment: row.get(4),
            });
        }

        for row in self
            .client
            .query(queries::DOMAINS_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("domains", e))?
        {
            raw.domains.push(RawDomainInfo {
                schema: row.get(0),
                name: row.get(1),
                data_type: row.get(2),
                not_null: row.get(3),
                default_expr: row.get(4),
                constraint_names: row.get(5),
                constraint_exprs: row.get(6),
                comment: row.get(7),
            });
        }

        for row in self
            .client
            .query(queries::SEQUENCES_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("sequences", e))?
        {
            raw.sequences.push(RawSequenceInfo {
                schema: row.get(0),
                name: row.get(1),
                data_type: row.get(2),
                start_value: row.get(3),
                increment: row.get(4),
                min_value: row.get(5),
                max_value: row.get(6),
                cache_size: row.get(7),
                cycle: row.get(8),
                owned_by_table: row.get(9),
                comment: row.get(10),
            });
        }

        for row in self
            .client
            .query(queries::TRIGGERS_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("triggers", e))?
        {
            raw.triggers.push(RawTriggerInfo {
                schema: row.get(0),
                table: row.get(1),
                owner_kind: row.get(2),
                name: row.get(3),
                definition: row.get(4),
                comment: row.get(5),
            });
        }

        for row in self
            .client
            .query(queries::POLICIES_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("policies", e))?
        {
            raw.policies.push(RawPolicyInfo {
                schema: row.get(0),
                table: row.get(1),
                name: row.get(2),
                command: row.get(3),
                permissive: row.get(4),
                roles: row.get(5),
                using: row.get(6),
                with_check: row.get(7),
            });
        }

        for row in self
            .client
            .query(queries::EXTENSIONS_QUERY, &[schema_param])
            .await
            .map_err(|e| inspect_err("extensions", e))?
        {
            raw.extensions.push(RawExtensionInfo {
                name: row.get(0),
                schema: row.get(1),
                version: row.get(2),
                comment: row.get(3),
            });
        }

        Ok(raw)
    }
}

fn inspect_err(object: &str, e: tokio_postgres::Error) -> Error {
    Error::Inspect {
        object: object.to_string(),
        message: e.to_string(),
    }
}
