//! Plan application
//!
//! Applies a plan to the target database: drift check, approval, session
//! setup, then group-by-group execution. Transactional groups go to the
//! server as one concatenated batch and rely on the implicit multi-statement
//! transaction; groups with non-transactional steps execute step by step
//! with wait directives handled in between. No explicit BEGIN/COMMIT is
//! ever issued.

use crate::connect::ConnectConfig;
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::ignore::IgnoreConfig;
use crate::inspect::Inspector;
use crate::plan::Plan;
use crate::sqlgen;
use crate::wait;

/// Knobs for one apply invocation
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub auto_approve: bool,
    /// PostgreSQL duration string, e.g. `30s`
    pub lock_timeout: Option<String>,
    pub application_name: String,
    pub no_color: bool,
    pub quiet: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            auto_approve: false,
            lock_timeout: None,
            application_name: "pgschema".to_string(),
            no_color: false,
            quiet: false,
        }
    }
}

/// Apply `plan` against the target database.
///
/// The fingerprint check re-inspects the live schema under the same ignore
/// rules; a plan is only ever applied to the database state it was computed
/// against. Already-committed groups stay applied when a later group fails.
pub async fn apply(
    target: &ConnectConfig,
    target_schema: &str,
    ignore: &IgnoreConfig,
    plan: &Plan,
    options: &ApplyOptions,
) -> Result<()> {
    // 1. Drift check
    if let Some(ref expected) = plan.source_fingerprint {
        let client = target.connect().await?;
        let ir = Inspector::new(&client)
            .build_ir(target_schema, ignore)
            .await?;
        let actual = Fingerprint::compute(&ir, target_schema)?;
        Fingerprint::compare(expected, &actual)?;
    }

    // 2. No-op short circuit
    if !plan.has_any_changes() {
        if !options.quiet {
            println!("No changes to apply.");
        }
        return Ok(());
    }

    // 3. Display and approval
    if !options.quiet {
        print!("{}", plan.render_human(!options.no_color));
        println!();
    }
    if !options.auto_approve && !confirm().await? {
        return Err(Error::Rejected);
    }

    // 4. Connection, visible in pg_stat_activity under application_name
    let config = target
        .clone()
        .with_application_name(options.application_name.clone());
    let client = config.connect().await?;

    // 5. Session setup
    if let Some(ref lock_timeout) = options.lock_timeout {
        client
            .batch_execute(&format!(
                "SET lock_timeout = {}",
                sqlgen::quote_literal(lock_timeout)
            ))
            .await?;
    }
    if target_schema != "public" {
        client
            .batch_execute(&format!(
                "SET search_path = {}, public",
                sqlgen::quote_ident(target_schema)
            ))
            .await?;
    }

    // 6. Group execution
    for (group_index, group) in plan.groups.iter().enumerate() {
        if group.transactional() {
            let mut batch = group
                .steps
                .iter()
                .map(|s| s.sql.as_str())
                .collect::<Vec<_>>()
                .join(";\n");
            batch.push(';');
            client
                .batch_execute(&batch)
                .await
                .map_err(|e| Error::step_failed(group_index, 0, &batch, e))?;
            tracing::debug!(group = group_index, "group committed");
            continue;
        }

        for (step_index, step) in group.steps.iter().enumerate() {
            match &step.directive {
                Some(directive) => {
                    wait::run(&client, &step.sql, &directive.message, None, options.quiet)
                        .await?
                }
                None => {
                    client
                        .batch_execute(&step.sql)
                        .await
                        .map_err(|e| {
                            Error::step_failed(group_index, step_index, &step.sql, e)
                        })?;
                }
            }
            tracing::debug!(group = group_index, step = step_index, "step finished");
        }
    }

    // 7. Report
    if !options.quiet {
        println!("Apply complete.");
    }
    Ok(())
}

/// Read one line from stdin; only `yes` / `y` proceeds
async fn confirm() -> Result<bool> {
    print!("Do you want to apply these changes? Only 'yes' will be accepted: ");
    use std::io::Write;
    std::io::stdout().flush()?;

    let line = tokio::task::spawn_blocking(|| {
        let mut buf = String::new();
        std::io::stdin().read_line(&mut buf).map(|_| buf)
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(e)))??;

    let answer = line.trim().to_lowercase();
    Ok(answer == "yes" || answer == "y")
}
