//! Ignore configuration (`.pgschemaignore`)
//!
//! A TOML file with one section per object kind, each holding an ordered
//! list of glob patterns. Patterns prefixed with `!` re-include; the last
//! matching pattern wins. Matched objects are dropped from the IR before it
//! is returned, and the same rules apply during drift validation so ignored
//! objects never contribute to the fingerprint.

use crate::error::{Error, Result};
use crate::ir::Ir;
use glob::Pattern;
use serde::Deserialize;
use std::path::Path;

/// Object kinds an ignore section can address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    View,
    Function,
    Procedure,
    Type,
    Sequence,
}

/// One section's compiled patterns
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<(Pattern, bool)>,
}

impl PatternList {
    fn compile(raw: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(raw.len());
        for entry in raw {
            let (text, negated) = match entry.strip_prefix('!') {
                Some(rest) => (rest, true),
                None => (entry.as_str(), false),
            };
            let pattern = Pattern::new(text)
                .map_err(|e| Error::IgnoreFile(format!("bad pattern '{}': {}", entry, e)))?;
            patterns.push((pattern, negated));
        }
        Ok(Self { patterns })
    }

    /// Whether `name` is ignored under last-match-wins semantics
    pub fn is_ignored(&self, name: &str) -> bool {
        let mut ignored = false;
        for (pattern, negated) in &self.patterns {
            if pattern.matches(name) {
                ignored = !negated;
            }
        }
        ignored
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawSection {
    #[serde(default)]
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawIgnoreFile {
    #[serde(default)]
    tables: RawSection,
    #[serde(default)]
    views: RawSection,
    #[serde(default)]
    functions: RawSection,
    #[serde(default)]
    procedures: RawSection,
    #[serde(default)]
    types: RawSection,
    #[serde(default)]
    sequences: RawSection,
}

/// Compiled ignore rules for every object kind
#[derive(Debug, Clone, Default)]
pub struct IgnoreConfig {
    tables: PatternList,
    views: PatternList,
    functions: PatternList,
    procedures: PatternList,
    types: PatternList,
    sequences: PatternList,
}

impl IgnoreConfig {
    /// Parse from TOML text. Unknown sections are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawIgnoreFile =
            toml::from_str(text).map_err(|e| Error::IgnoreFile(e.to_string()))?;
        Ok(Self {
            tables: PatternList::compile(&raw.tables.patterns)?,
            views: PatternList::compile(&raw.views.patterns)?,
            functions: PatternList::compile(&raw.functions.patterns)?,
            procedures: PatternList::compile(&raw.procedures.patterns)?,
            types: PatternList::compile(&raw.types.patterns)?,
            sequences: PatternList::compile(&raw.sequences.patterns)?,
        })
    }

    /// Load from a file path; a missing file is equivalent to empty rules
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Whether the named object of the given kind is ignored
    pub fn is_ignored(&self, kind: ObjectKind, name: &str) -> bool {
        match kind {
            ObjectKind::Table => self.tables.is_ignored(name),
            ObjectKind::View => self.views.is_ignored(name),
            ObjectKind::Function => self.functions.is_ignored(name),
            ObjectKind::Procedure => self.procedures.is_ignored(name),
            ObjectKind::Type => self.types.is_ignored(name),
            ObjectKind::Sequence => self.sequences.is_ignored(name),
        }
    }

    /// Drop every ignored object from the IR
    pub fn filter_ir(&self, ir: &mut Ir) {
        for schema in ir.schemas.values_mut() {
            schema
                .tables
                .retain(|name, _| !self.is_ignored(ObjectKind::Table, name));
            schema
                .views
                .retain(|name, _| !self.is_ignored(ObjectKind::View, name));
            schema
                .functions
                .retain(|name, _| !self.is_ignored(ObjectKind::Function, name));
            schema
                .procedures
                .retain(|name, _| !self.is_ignored(ObjectKind::Procedure, name));
            schema
                .types
                .retain(|name, _| !self.is_ignored(ObjectKind::Type, name));
            schema
                .sequences
                .retain(|name, _| !self.is_ignored(ObjectKind::Sequence, name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Schema, Table};

    #[test]
    fn test_last_match_wins() {
        let config = IgnoreConfig::parse(
            r#"
[tables]
patterns = ["temp_*", "!temp_keep"]
"#,
        )
        .unwrap();

        assert!(config.is_ignored(ObjectKind::Table, "temp_scratch"));
        assert!(!config.is_ignored(ObjectKind::Table, "temp_keep"));
        assert!(!config.is_ignored(ObjectKind::Table, "users"));
    }

    #[test]
    fn test_unknown_sections_ignored() {
        let config = IgnoreConfig::parse(
            r#"
[tables]
patterns = ["scratch"]

[something_else]
patterns = ["x"]
"#,
        );
        assert!(config.is_ok());
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let config = IgnoreConfig::parse(
            r#"
[views]
patterns = ["[unclosed"]
"#,
        );
        assert!(config.is_err());
    }

    #[test]
    fn test_filter_ir_drops_matches() {
        let config = IgnoreConfig::parse(
            r#"
[tables]
patterns = ["temp_*"]
"#,
        )
        .unwrap();

        let mut ir = Ir::default();
        let mut schema = Schema::new("public");
        for name in ["users", "temp_import"] {
            schema.tables.insert(
                name.to_string(),
                Table {
                    schema: "public".to_string(),
                    name: name.to_string(),
                    ..Default::default()
                },
            );
        }
        ir.schemas.insert("public".to_string(), schema);

        config.filter_ir(&mut ir);
        let public = ir.schema("public").unwrap();
        assert!(public.tables.contains_key("users"));
        assert!(!public.tables.contains_key("temp_import"));
    }
}
