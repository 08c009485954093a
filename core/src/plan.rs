//! Execution plans
//!
//! A plan is the serializable product of the pipeline: rewritten steps
//! partitioned into execution groups, stamped with the source fingerprint
//! and version metadata. The JSON form round-trips so a plan can be
//! produced in CI and applied later by the same pgschema version.

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::version::{
    PGSCHEMA_VERSION, PLAN_FORMAT_VERSION, is_same_pgschema_version, is_supported_plan_format,
};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Non-mutating monitoring attached to a step
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Directive {
    #[serde(rename = "type")]
    pub kind: DirectiveKind,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Wait,
}

/// The atomic unit of execution
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Step {
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<Directive>,
    pub can_run_in_transaction: bool,
}

impl Step {
    /// A plain SQL step
    pub fn statement(sql: impl Into<String>, can_run_in_transaction: bool) -> Self {
        Self {
            sql: sql.into(),
            directive: None,
            can_run_in_transaction,
        }
    }

    /// A wait step polling `query` until it reports completion
    pub fn wait(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sql: query.into(),
            directive: Some(Directive {
                kind: DirectiveKind::Wait,
                message: message.into(),
            }),
            can_run_in_transaction: false,
        }
    }
}

/// A contiguous batch of steps executed as one unit
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ExecutionGroup {
    pub steps: Vec<Step>,
}

impl ExecutionGroup {
    /// A group is transactional when every step can run in a transaction.
    /// The applier concatenates such groups into one implicit-transaction
    /// batch; all other groups execute step by step.
    pub fn transactional(&self) -> bool {
        self.steps.iter().all(|s| s.can_run_in_transaction)
    }

    pub fn has_directive(&self) -> bool {
        self.steps.iter().any(|s| s.directive.is_some())
    }
}

/// SQL rendering style
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlFormat {
    /// Concatenated statements only
    Raw,
    /// Group headers as SQL comments
    Annotated,
}

/// The full plan document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Plan {
    /// SemVer of the binary that produced the plan
    pub version: String,
    pub pgschema_version: String,
    pub plan_format_version: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_fingerprint: Option<Fingerprint>,
    pub groups: Vec<ExecutionGroup>,
}

impl Plan {
    /// Expand diffs through the rewriter and group the resulting steps
    pub fn new(diffs: &[crate::diff::Diff], source_fingerprint: Option<Fingerprint>) -> Self {
        let steps = diffs.iter().flat_map(crate::rewrite::rewrite).collect();
        Self::from_steps(steps, source_fingerprint)
    }

    /// Partition pre-expanded steps into execution groups.
    ///
    /// A new group starts on every transition between transactional and
    /// non-transactional steps. Directive steps are non-transactional by
    /// construction, so a wait lands in the same group as the statement it
    /// monitors.
    pub fn from_steps(steps: Vec<Step>, source_fingerprint: Option<Fingerprint>) -> Self {
        let mut groups: Vec<ExecutionGroup> = Vec::new();
        for step in steps {
            if step.sql.trim().is_empty() && step.directive.is_none() {
                continue;
            }
            let extends_last = groups
                .last()
                .is_some_and(|g| g.transactional() == step.can_run_in_transaction);
            if extends_last {
                if let Some(group) = groups.last_mut() {
                    group.steps.push(step);
                }
            } else {
                groups.push(ExecutionGroup { steps: vec![step] });
            }
        }
        Self {
            version: PGSCHEMA_VERSION.to_string(),
            pgschema_version: PGSCHEMA_VERSION.to_string(),
            plan_format_version: PLAN_FORMAT_VERSION.to_string(),
            created_at: Utc::now(),
            source_fingerprint,
            groups,
        }
    }

    pub fn has_any_changes(&self) -> bool {
        self.groups
            .iter()
            .any(|g| g.steps.iter().any(|s| !s.sql.trim().is_empty()))
    }

    // =========================================================================
    // JSON
    // =========================================================================

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject plans from a different binary or an unsupported format.
    ///
    /// The two cases carry distinct errors so the operator knows whether to
    /// regenerate the plan or upgrade the binary.
    pub fn check_compatibility(&self) -> Result<()> {
        if !is_same_pgschema_version(&self.pgschema_version) {
            return Err(Error::PlanVersionMismatch {
                plan_version: self.pgschema_version.clone(),
                binary_version: PGSCHEMA_VERSION.to_string(),
            });
        }
        if !is_supported_plan_format(&self.plan_format_version) {
            return Err(Error::PlanFormatMismatch(self.plan_format_version.clone()));
        }
        Ok(())
    }

    // =========================================================================
    // SQL
    // =========================================================================

    pub fn to_sql(&self, format: SqlFormat) -> String {
        let mut out = String::new();
        for (i, group) in self.groups.iter().enumerate() {
            if format == SqlFormat::Annotated {
                let mode = if group.transactional() {
                    "transactional"
                } else {
                    "non-transactional"
                };
                out.push_str(&format!("-- Group {} ({})\n", i + 1, mode));
            }
            for step in &group.steps {
                if step.directive.is_some() {
                    // Monitoring queries are not part of the DDL stream
                    continue;
                }
                out.push_str(&step.sql);
                out.push_str(";\n");
            }
            if format == SqlFormat::Annotated && i + 1 < self.groups.len() {
                out.push('\n');
            }
        }
        out
    }

    // =========================================================================
    // Human
    // =========================================================================

    /// Grouped line-per-step summary with +/~/- markers
    pub fn render_human(&self, color: bool) -> String {
        if !self.has_any_changes() {
            return "No changes detected.\n".to_string();
        }
        let mut out = String::new();
        for (i, group) in self.groups.iter().enumerate() {
            let mode = if group.transactional() {
                "transactional"
            } else {
                "non-transactional"
            };
            let header = format!("Group {} ({}):", i + 1, mode);
            if color {
                out.push_str(&format!("{}\n", header.bold()));
            } else {
                out.push_str(&format!("{}\n", header));
            }
            for step in &group.steps {
                if let Some(ref directive) = step.directive {
                    let line = format!("  ⧗ {}", directive.message);
                    if color {
                        out.push_str(&format!("{}\n", line.cyan()));
                    } else {
                        out.push_str(&format!("{}\n", line));
                    }
                    continue;
                }
                let summary = collapse_sql(&step.sql);
                let marker = marker_for(&summary);
                let line = format!("  {} {}", marker, summary);
                if color {
                    let colored_line = match marker {
                        '+' => line.green().to_string(),
                        '-' => line.red().to_string(),
                        _ => line.yellow().to_string(),
                    };
                    out.push_str(&format!("{}\n", colored_line));
                } else {
                    out.push_str(&format!("{}\n", line));
                }
            }
            if i + 1 < self.groups.len() {
                out.push('\n');
            }
        }
        out
    }
}

/// Collapse a (possibly multi-line, multi-statement) SQL string into one
/// whitespace-normalized display line
fn collapse_sql(sql: &str) -> String {
    let first_statement = sql.split(";\n").next().unwrap_or(sql);
    let collapsed: Vec<&str> = first_statement.split_whitespace().collect();
    let mut line = collapsed.join(" ");
    const MAX: usize = 100;
    if line.chars().count() > MAX {
        line = format!("{}...", line.chars().take(MAX - 3).collect::<String>());
    }
    line
}

fn marker_for(sql: &str) -> char {
    let upper = sql.trim_start().to_uppercase();
    if upper.starts_with("CREATE") {
        '+'
    } else if upper.starts_with("DROP") {
        '-'
    } else {
        '~'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_step(sql: &str) -> Step {
        Step::statement(sql, true)
    }

    fn concurrent_step(sql: &str) -> Step {
        Step::statement(sql, false)
    }

    #[test]
    fn test_grouping_splits_on_transactionality() {
        let plan = Plan::from_steps(
            vec![
                tx_step("ALTER TABLE t ADD COLUMN a int"),
                tx_step("ALTER TABLE t ADD COLUMN b int"),
                concurrent_step("CREATE INDEX CONCURRENTLY IF NOT EXISTS i ON t (a)"),
                Step::wait("SELECT true AS done", "Creating index \"i\""),
                tx_step("COMMENT ON TABLE t IS 'x'"),
            ],
            None,
        );
        assert_eq!(plan.groups.len(), 3);
        assert!(plan.groups[0].transactional());
        assert!(!plan.groups[1].transactional());
        assert!(plan.groups[1].has_directive());
        assert!(plan.groups[2].transactional());
    }

    #[test]
    fn test_directive_shares_group_with_monitored_statement() {
        let plan = Plan::from_steps(
            vec![
                concurrent_step("CREATE INDEX CONCURRENTLY IF NOT EXISTS i ON t (a)"),
                Step::wait("SELECT true AS done", "Creating index \"i\""),
            ],
            None,
        );
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].steps.len(), 2);
    }

    #[test]
    fn test_json_roundtrip() {
        let plan = Plan::from_steps(
            vec![
                tx_step("CREATE TABLE t (id int)"),
                concurrent_step("CREATE INDEX CONCURRENTLY IF NOT EXISTS i ON t (id)"),
            ],
            Some(Fingerprint {
                algorithm: "sha256".to_string(),
                hash: "ab".repeat(32),
            }),
        );
        let json = plan.to_json().unwrap();
        let restored = Plan::from_json(&json).unwrap();
        assert_eq!(plan, restored);
    }

    #[test]
    fn test_json_shape() {
        let plan = Plan::from_steps(vec![tx_step("CREATE TABLE t (id int)")], None);
        let value: serde_json::Value =
            serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        assert!(value["pgschema_version"].is_string());
        assert_eq!(value["plan_format_version"], PLAN_FORMAT_VERSION);
        assert!(value["created_at"].is_string());
        assert_eq!(value["groups"][0]["steps"][0]["sql"], "CREATE TABLE t (id int)");
        assert_eq!(
            value["groups"][0]["steps"][0]["can_run_in_transaction"],
            true
        );
    }

    #[test]
    fn test_incompatible_plan_versions_are_rejected() {
        let mut plan = Plan::from_steps(vec![tx_step("SELECT 1")], None);
        plan.pgschema_version = "0.0.1".to_string();
        assert!(matches!(
            plan.check_compatibility(),
            Err(Error::PlanVersionMismatch { .. })
        ));

        let mut plan = Plan::from_steps(vec![tx_step("SELECT 1")], None);
        plan.plan_format_version = "9.9".to_string();
        assert!(matches!(
            plan.check_compatibility(),
            Err(Error::PlanFormatMismatch(_))
        ));
    }

    #[test]
    fn test_to_sql_skips_wait_queries() {
        let plan = Plan::from_steps(
            vec![
                concurrent_step("CREATE INDEX CONCURRENTLY IF NOT EXISTS i ON t (a)"),
                Step::wait("SELECT true AS done", "Creating index \"i\""),
            ],
            None,
        );
        let sql = plan.to_sql(SqlFormat::Raw);
        assert!(sql.contains("CREATE INDEX CONCURRENTLY"));
        assert!(!sql.contains("AS done"));
    }

    #[test]
    fn test_human_markers() {
        let plan = Plan::from_steps(
            vec![
                tx_step("CREATE TABLE t (id int)"),
                tx_step("ALTER TABLE t ADD COLUMN a int"),
                tx_step("DROP TABLE old"),
            ],
            None,
        );
        let human = plan.render_human(false);
        assert!(human.contains("+ CREATE TABLE t (id int)"));
        assert!(human.contains("~ ALTER TABLE t ADD COLUMN a int"));
        assert!(human.contains("- DROP TABLE old"));
    }

    #[test]
    fn test_no_changes_rendering() {
        let plan = Plan::from_steps(vec![], None);
        assert!(!plan.has_any_changes());
        assert_eq!(plan.render_human(false), "No changes detected.\n");
    }
}
