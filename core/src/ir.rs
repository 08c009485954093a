//! Intermediate representation of a PostgreSQL schema
//!
//! An `Ir` is built once per inspection and treated as immutable afterwards.
//! Containers are `BTreeMap`s keyed by object name so that canonical
//! serialization (fingerprinting) and lexicographic ordering (diff
//! tie-breaking) fall directly out of the data structure.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of the schema representation
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ir {
    pub schemas: BTreeMap<String, Schema>,
}

/// One namespace and everything it contains
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables: BTreeMap<String, Table>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub views: BTreeMap<String, View>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub functions: BTreeMap<String, Function>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub procedures: BTreeMap<String, Procedure>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregates: BTreeMap<String, Aggregate>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, TypeDef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub domains: BTreeMap<String, Domain>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sequences: BTreeMap<String, Sequence>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Extension>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Table entity
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub schema: String,
    pub name: String,
    /// Columns in ordinal order
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, Constraint>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub indexes: BTreeMap<String, Index>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub triggers: BTreeMap<String, Trigger>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub policies: BTreeMap<String, Policy>,
    #[serde(default)]
    pub rls_enabled: bool,
    /// `PARTITION BY` clause, e.g. `RANGE (created_at)`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_by: Option<String>,
    /// Attached partition children are not diffed as standalone tables
    #[serde(default)]
    pub is_partition: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Table {
    /// Find a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Identity column generation mode
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityGeneration {
    #[serde(rename = "ALWAYS")]
    Always,
    #[serde(rename = "BY DEFAULT")]
    ByDefault,
}

/// Column entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub position: i32,
    /// Resolved type name, schema-qualified for out-of-schema types
    pub data_type: String,
    pub not_null: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityGeneration>,
    /// Expression of a generated (STORED) column; `default` is empty then
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Constraint kind discriminator
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Exclude,
}

/// Constraint entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub kind: ConstraintKind,
    /// Constrained columns in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_table: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub deferrable: bool,
    #[serde(default)]
    pub initially_deferred: bool,
    /// CHECK expression or EXCLUDE element list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// False while a NOT VALID constraint awaits validation
    #[serde(default = "default_true")]
    pub validated: bool,
}

fn default_true() -> bool {
    true
}

/// Index kind discriminator
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Regular,
    Unique,
    Primary,
}

/// One key column (or expression) of an index
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    pub value: String,
    #[serde(default)]
    pub is_expression: bool,
    #[serde(default = "default_true")]
    pub asc: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opclass: Option<String>,
}

/// Index entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub schema: String,
    /// Owning table or materialized view
    pub table: String,
    pub name: String,
    pub method: String,
    pub columns: Vec<IndexColumn>,
    pub kind: IndexKind,
    /// Partial index predicate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Trigger entity
///
/// The full `CREATE TRIGGER` statement from the catalog is carried verbatim:
/// it is both the identity for diffing and directly executable DDL.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// RLS policy command discriminator
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyCommand {
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl PolicyCommand {
    pub fn as_sql(&self) -> &'static str {
        match self {
            PolicyCommand::All => "ALL",
            PolicyCommand::Select => "SELECT",
            PolicyCommand::Insert => "INSERT",
            PolicyCommand::Update => "UPDATE",
            PolicyCommand::Delete => "DELETE",
        }
    }
}

/// RLS policy entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub command: PolicyCommand,
    pub permissive: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub using: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_check: Option<String>,
}

/// View entity (plain or materialized)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub schema: String,
    pub name: String,
    /// Normalized query text from the catalog
    pub definition: String,
    pub materialized: bool,
    /// Only materialized views own indexes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub indexes: BTreeMap<String, Index>,
    /// INSTEAD OF triggers on plain views
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub triggers: BTreeMap<String, Trigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Function entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub schema: String,
    pub name: String,
    /// Argument signature as rendered by the catalog, e.g. `a integer, b text`
    pub arguments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    /// Body with a trailing newline guaranteed
    pub body: String,
    pub language: String,
    /// IMMUTABLE | STABLE | VOLATILE
    pub volatility: String,
    #[serde(default)]
    pub security_definer: bool,
    #[serde(default)]
    pub strict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Procedure entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub schema: String,
    pub name: String,
    pub arguments: String,
    pub body: String,
    pub language: String,
    #[serde(default)]
    pub security_definer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Aggregate entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub schema: String,
    pub name: String,
    pub arguments: String,
    pub state_function: String,
    pub state_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Enum or composite type
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeKind {
    #[serde(rename_all = "camelCase")]
    Enum { values: Vec<String> },
    #[serde(rename_all = "camelCase")]
    Composite { attributes: Vec<CompositeAttribute> },
}

/// One attribute of a composite type
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeAttribute {
    pub name: String,
    pub data_type: String,
}

/// Type entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    pub schema: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: TypeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Domain entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub schema: String,
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub not_null: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<DomainConstraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// CHECK constraint on a domain
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainConstraint {
    pub name: String,
    pub expression: String,
}

/// Sequence entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub schema: String,
    pub name: String,
    pub data_type: String,
    pub start_value: i64,
    pub increment: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub cache_size: i64,
    pub cycle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Extension entity
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub name: String,
    pub schema: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Ir {
    /// Look up a schema by name
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Rename a schema and every nested object's schema field.
    ///
    /// Used after inspecting an external plan database, where the desired
    /// state lives under a temporary schema but the differ needs it keyed
    /// under the target schema name.
    pub fn rename_schema(&mut self, from: &str, to: &str) {
        let Some(mut schema) = self.schemas.remove(from) else {
            return;
        };
        schema.name = to.to_string();
        for table in schema.tables.values_mut() {
            table.schema = to.to_string();
            for c in table.constraints.values_mut() {
                c.schema = to.to_string();
                if c.referenced_schema.as_deref() == Some(from) {
                    c.referenced_schema = Some(to.to_string());
                }
            }
            for i in table.indexes.values_mut() {
                i.schema = to.to_string();
            }
            for t in table.triggers.values_mut() {
                t.schema = to.to_string();
                t.definition = t.definition.replace(
                    &format!("\"{}\".", from),
                    &format!("\"{}\".", to),
                );
                t.definition = t
                    .definition
                    .replace(&format!(" {}.", from), &format!(" {}.", to));
            }
            for p in table.policies.values_mut() {
                p.schema = to.to_string();
            }
        }
        for view in schema.views.values_mut() {
            view.schema = to.to_string();
            view.definition = view
                .definition
                .replace(&format!("{}.", from), &format!("{}.", to));
            for i in view.indexes.values_mut() {
                i.schema = to.to_string();
            }
            for t in view.triggers.values_mut() {
                t.schema = to.to_string();
            }
        }
        for f in schema.functions.values_mut() {
            f.schema = to.to_string();
        }
        for p in schema.procedures.values_mut() {
            p.schema = to.to_string();
        }
        for a in schema.aggregates.values_mut() {
            a.schema = to.to_string();
        }
        for t in schema.types.values_mut() {
            t.schema = to.to_string();
        }
        for d in schema.domains.values_mut() {
            d.schema = to.to_string();
        }
        for s in schema.sequences.values_mut() {
            s.schema = to.to_string();
        }
        for e in schema.extensions.values_mut() {
            e.schema = to.to_string();
        }
        self.schemas.insert(to.to_string(), schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_schema_rewrites_nested_fields() {
        let mut ir = Ir::default();
        let mut schema = Schema::new("pgschema_tmp_123");
        schema.tables.insert(
            "users".to_string(),
            Table {
                schema: "pgschema_tmp_123".to_string(),
                name: "users".to_string(),
                ..Default::default()
            },
        );
        ir.schemas.insert("pgschema_tmp_123".to_string(), schema);

        ir.rename_schema("pgschema_tmp_123", "public");

        let public = ir.schema("public").unwrap();
        assert_eq!(public.name, "public");
        assert_eq!(public.tables["users"].schema, "public");
        assert!(ir.schema("pgschema_tmp_123").is_none());
    }

    #[test]
    fn test_column_lookup() {
        let table = Table {
            schema: "public".to_string(),
            name: "users".to_string(),
            columns: vec![Column {
                name: "id".to_string(),
                position: 1,
                data_type: "integer".to_string(),
                not_null: true,
                default: None,
                identity: None,
                generated: None,
                comment: None,
            }],
            ..Default::default()
        };
        assert!(table.column("id").is_some());
        assert!(table.column("missing").is_none());
    }
}
