//! Catalog queries for schema introspection
//!
//! Every query is scoped to a single schema via `$1`. Queries that render
//! expression text (`pg_get_expr` and friends) route the call through a
//! lateral subquery whose first column pins `search_path` for the statement;
//! the formatter then emits fully-qualified identifiers for anything outside
//! the target schema regardless of the session's ambient search path.
//!
//! Objects owned by extensions are excluded via `pg_depend` (`deptype 'e'`),
//! mirroring what pg_dump does.

/// Tables in the target schema, with RLS flag, partition metadata and comment
pub const TABLES_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    c.relname AS name,
    c.relrowsecurity AS rls_enabled,
    c.relispartition AS is_partition,
    CASE WHEN c.relkind = 'p' THEN pg_get_partkeydef(c.oid) END AS partition_by,
    obj_description(c.oid, 'pg_class') AS comment
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind IN ('r', 'p')
  AND n.nspname = $1
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.objid = c.oid AND d.deptype = 'e'
  )
ORDER BY c.relname
"#;

/// Columns of every table in the target schema.
///
/// Defaults and generation expressions are rendered under a pinned
/// search path so out-of-schema references come back qualified.
pub const COLUMNS_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    c.relname AS table,
    a.attname AS name,
    a.attnum::int AS position,
    format_type(a.atttypid, a.atttypmod) AS data_type,
    a.attnotnull AS not_null,
    a.attidentity::text AS identity,
    a.attgenerated::text AS generated,
    def.expr AS default_expr,
    col_description(c.oid, a.attnum) AS comment
FROM pg_attribute a
JOIN pg_class c ON c.oid = a.attrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_attrdef ad ON ad.adrelid = c.oid AND ad.adnum = a.attnum
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           pg_get_expr(ad.adbin, ad.adrelid) AS expr
) def ON true
WHERE c.relkind IN ('r', 'p')
  AND n.nspname = $1
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY c.relname, a.attnum
"#;

/// Constraints (PK, FK, UNIQUE, CHECK, EXCLUDE) on tables in the target schema
pub const CONSTRAINTS_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    c.relname AS table,
    con.conname AS name,
    con.contype::text AS kind,
    ARRAY(
        SELECT a.attname
        FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
        ORDER BY k.ord
    ) AS columns,
    fn.nspname AS referenced_schema,
    fc.relname AS referenced_table,
    ARRAY(
        SELECT a.attname
        FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_attribute a ON a.attrelid = con.confrelid AND a.attnum = k.attnum
        ORDER BY k.ord
    ) AS referenced_columns,
    con.confupdtype::text AS on_update,
    con.confdeltype::text AS on_delete,
    con.condeferrable AS deferrable,
    con.condeferred AS initially_deferred,
    con.convalidated AS validated,
    expr.text AS expression
FROM pg_constraint con
JOIN pg_class c ON c.oid = con.conrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_class fc ON fc.oid = con.confrelid
LEFT JOIN pg_namespace fn ON fn.oid = fc.relnamespace
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           CASE
               WHEN con.contype = 'c' THEN pg_get_expr(con.conbin, con.conrelid)
               WHEN con.contype = 'x' THEN pg_get_constraintdef(con.oid, true)
           END AS text
) expr ON true
WHERE con.contype IN ('p', 'f', 'u', 'c', 'x')
  AND n.nspname = $1
ORDER BY c.relname, con.conname
"#;

/// Indexes on tables and materialized views in the target schema.
///
/// Indexes that back a constraint (primary key, unique constraint,
/// exclusion) are modeled through the constraint and skipped here.
pub const INDEXES_QUERY: &str = r#"
SELECT
    ns.nspname AS schema,
    tbl.relname AS table,
    tbl.relkind::text AS owner_kind,
    idx.relname AS name,
    am.amname AS method,
    ix.indisunique AS is_unique,
    ix.indisprimary AS is_primary,
    cols.defs AS columns,
    pred.text AS predicate,
    obj_description(idx.oid, 'pg_class') AS comment
FROM pg_index ix
JOIN pg_class idx ON idx.oid = ix.indexrelid
JOIN pg_class tbl ON tbl.oid = ix.indrelid
JOIN pg_namespace ns ON ns.oid = tbl.relnamespace
JOIN pg_am am ON am.oid = idx.relam
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           array_agg(pg_get_indexdef(ix.indexrelid, s.n, true) ORDER BY s.n) AS defs
    FROM generate_series(1, ix.indnkeyatts) AS s(n)
) cols ON true
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           pg_get_expr(ix.indpred, ix.indrelid) AS text
) pred ON true
WHERE tbl.relkind IN ('r', 'p', 'm')
  AND ns.nspname = $1
  AND NOT EXISTS (
      SELECT 1 FROM pg_constraint con WHERE con.conindid = ix.indexrelid
  )
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.objid = idx.oid AND d.deptype = 'e'
  )
ORDER BY tbl.relname, idx.relname
"#;

/// Views and materialized views in the target schema.
///
/// Definitions are rendered under a pinned search path so references to
/// relations outside the target schema come back qualified.
pub const VIEWS_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    c.relname AS name,
    c.relkind = 'm' AS materialized,
    def.text AS definition,
    obj_description(c.oid, 'pg_class') AS comment
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           pg_get_viewdef(c.oid, true) AS text
) def ON true
WHERE c.relkind IN ('v', 'm')
  AND n.nspname = $1
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.objid = c.oid AND d.deptype = 'e'
  )
ORDER BY c.relname
"#;

/// Functions, procedures and aggregates in the target schema.
///
/// The parsed body accessor (`pg_get_function_sqlbody`) is preferred when
/// the function has a standard-syntax body; `prosrc` is the fallback.
pub const ROUTINES_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    p.proname AS name,
    p.prokind::text AS kind,
    pg_get_function_arguments(p.oid) AS arguments,
    pg_get_function_result(p.oid) AS returns,
    COALESCE(body.text, p.prosrc) AS body,
    l.lanname AS language,
    p.provolatile::text AS volatility,
    p.prosecdef AS security_definer,
    p.proisstrict AS strict,
    (
        SELECT split_part(cfg, '=', 2)
        FROM unnest(p.proconfig) AS cfg
        WHERE cfg LIKE 'search_path=%'
    ) AS search_path,
    agg.aggtransfn::regproc::text AS agg_state_function,
    format_type(agg.aggtranstype, NULL) AS agg_state_type,
    agg.agginitval AS agg_initial_condition,
    CASE WHEN agg.aggfinalfn <> 0 THEN agg.aggfinalfn::regproc::text END AS agg_final_function,
    obj_description(p.oid, 'pg_proc') AS comment
FROM pg_proc p
JOIN pg_namespace n ON n.oid = p.pronamespace
JOIN pg_language l ON l.oid = p.prolang
LEFT JOIN pg_aggregate agg ON agg.aggfnoid = p.oid
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           pg_get_function_sqlbody(p.oid) AS text
) body ON true
WHERE p.prokind IN ('f', 'p', 'a')
  AND n.nspname = $1
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.objid = p.oid AND d.deptype = 'e'
  )
ORDER BY p.proname
"#;

/// Enum types in the target schema
pub const ENUMS_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    t.typname AS name,
    array_agg(e.enumlabel ORDER BY e.enumsortorder) AS values,
    obj_description(t.oid, 'pg_type') AS comment
FROM pg_type t
JOIN pg_enum e ON e.enumtypid = t.oid
JOIN pg_namespace n ON n.oid = t.typnamespace
WHERE n.nspname = $1
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.objid = t.oid AND d.deptype = 'e'
  )
GROUP BY n.nspname, t.typname, t.oid
ORDER BY t.typname
"#;

/// Composite types in the target schema.
///
/// Row types implicitly created for tables and views are excluded by
/// requiring the backing relation to be a plain composite (`relkind 'c'`).
pub const COMPOSITE_TYPES_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    t.typname AS name,
    array_agg(a.attname ORDER BY a.attnum) AS attribute_names,
    array_agg(format_type(a.atttypid, a.atttypmod) ORDER BY a.attnum) AS attribute_types,
    obj_description(t.oid, 'pg_type') AS comment
FROM pg_type t
JOIN pg_class c ON c.oid = t.typrelid AND c.relkind = 'c'
JOIN pg_namespace n ON n.oid = t.typnamespace
JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum > 0 AND NOT a.attisdropped
WHERE t.typtype = 'c'
  AND n.nspname = $1
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.objid = t.oid AND d.deptype = 'e'
  )
GROUP BY n.nspname, t.typname, t.oid
ORDER BY t.typname
"#;

/// Domains in the target schema, with their CHECK constraints aggregated
pub const DOMAINS_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    t.typname AS name,
    format_type(t.typbasetype, t.typtypmod) AS data_type,
    t.typnotnull AS not_null,
    def.text AS default_expr,
    COALESCE(checks.names, '{}') AS constraint_names,
    COALESCE(checks.exprs, '{}') AS constraint_exprs,
    obj_description(t.oid, 'pg_type') AS comment
FROM pg_type t
JOIN pg_namespace n ON n.oid = t.typnamespace
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           pg_get_expr(t.typdefaultbin, 0) AS text
) def ON true
LEFT JOIN LATERAL (
    SELECT array_agg(con.conname ORDER BY con.conname) AS names,
           array_agg(pg_get_expr(con.conbin, 0) ORDER BY con.conname) AS exprs
    FROM pg_constraint con
    WHERE con.contypid = t.oid AND con.contype = 'c'
) checks ON true
WHERE t.typtype = 'd'
  AND n.nspname = $1
ORDER BY t.typname
"#;

/// Sequences in the target schema, with serial ownership resolved
pub const SEQUENCES_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    c.relname AS name,
    format_type(s.seqtypid, NULL) AS data_type,
    s.seqstart AS start_value,
    s.seqincrement AS increment,
    s.seqmin AS min_value,
    s.seqmax AS max_value,
    s.seqcache AS cache_size,
    s.seqcycle AS cycle,
    owner_tbl.relname AS owned_by_table,
    obj_description(c.oid, 'pg_class') AS comment
FROM pg_sequence s
JOIN pg_class c ON c.oid = s.seqrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_depend dep
    ON dep.objid = c.oid AND dep.deptype = 'a' AND dep.refobjsubid > 0
LEFT JOIN pg_class owner_tbl ON owner_tbl.oid = dep.refobjid
WHERE n.nspname = $1
  AND NOT EXISTS (
      SELECT 1 FROM pg_depend d
      WHERE d.objid = c.oid AND d.deptype IN ('e', 'i')
  )
ORDER BY c.relname
"#;

/// Triggers on tables and views in the target schema.
///
/// `pg_get_triggerdef` is rendered under a pinned search path so the
/// function reference is qualified when it lives elsewhere.
pub const TRIGGERS_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    c.relname AS table,
    c.relkind::text AS owner_kind,
    t.tgname AS name,
    def.text AS definition,
    obj_description(t.oid, 'pg_trigger') AS comment
FROM pg_trigger t
JOIN pg_class c ON c.oid = t.tgrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           pg_get_triggerdef(t.oid, true) AS text
) def ON true
WHERE NOT t.tgisinternal
  AND c.relkind IN ('r', 'p', 'v')
  AND n.nspname = $1
ORDER BY c.relname, t.tgname
"#;

/// Row-level security policies on tables in the target schema
pub const POLICIES_QUERY: &str = r#"
SELECT
    n.nspname AS schema,
    c.relname AS table,
    pol.polname AS name,
    pol.polcmd::text AS command,
    pol.polpermissive AS permissive,
    CASE
        WHEN pol.polroles = '{0}' THEN ARRAY['public']::text[]
        ELSE ARRAY(
            SELECT r.rolname::text FROM pg_roles r
            WHERE r.oid = ANY(pol.polroles)
            ORDER BY r.rolname
        )
    END AS roles,
    qual.text AS using_expr,
    wc.text AS with_check_expr
FROM pg_policy pol
JOIN pg_class c ON c.oid = pol.polrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           pg_get_expr(pol.polqual, pol.polrelid) AS text
) qual ON true
LEFT JOIN LATERAL (
    SELECT set_config('search_path', $1, true) AS sp,
           pg_get_expr(pol.polwithcheck, pol.polrelid) AS text
) wc ON true
WHERE n.nspname = $1
ORDER BY c.relname, pol.polname
"#;

/// Extensions whose objects live in the target schema
pub const EXTENSIONS_QUERY: &str = r#"
SELECT
    e.extname AS name,
    n.nspname AS schema,
    e.extversion AS version,
    obj_description(e.oid, 'pg_extension') AS comment
FROM pg_extension e
JOIN pg_namespace n ON n.oid = e.extnamespace
WHERE n.nspname = $1
ORDER BY e.extname
"#;

/// Whether the target schema exists at all
pub const SCHEMA_EXISTS_QUERY: &str = r#"
SELECT EXISTS (SELECT 1 FROM pg_namespace WHERE nspname = $1)
"#;
