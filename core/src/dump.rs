//! Dump-file headers
//!
//! Schema dumps produced by pgschema start with a fixed comment block. The
//! planner reads the `Dumped from schema:` line back to auto-detect the
//! target schema when the user did not name one.

use crate::version::PGSCHEMA_VERSION;

const SCHEMA_LINE_PREFIX: &str = "-- Dumped from schema: ";

/// Render the header comment block for a schema dump
pub fn render_header(database_version: &str, schema: &str) -> String {
    format!(
        "--\n\
         -- pgschema database dump\n\
         --\n\
         -- Dumped from database version {}\n\
         -- Dumped by pgschema version {}\n\
         -- Dumped from schema: {}\n\
         --\n",
        database_version, PGSCHEMA_VERSION, schema
    )
}

/// Extract the schema name from a dump header, if present.
///
/// Only leading comment lines are scanned; the first DDL statement ends the
/// search.
pub fn detect_schema(dump: &str) -> Option<String> {
    for line in dump.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            if let Some(name) = trimmed.strip_prefix(SCHEMA_LINE_PREFIX) {
                let name = name.trim();
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
            continue;
        }
        break;
    }
    None
}
