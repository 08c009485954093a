//! The `plan` command

use crate::config::{PlanDatabaseArgs, TargetArgs};
use crate::error::CliError;
use crate::output::OutputSpec;
use pgschema_core::{IgnoreConfig, Plan, PlanRequest, build_plan, dump};
use std::path::Path;

/// Compute and emit a plan. Returns the plan so `apply` can reuse this
/// path when invoked with a DDL file.
pub async fn compute(
    target: &TargetArgs,
    plan_db: &PlanDatabaseArgs,
    file: &Path,
) -> Result<(Plan, String), CliError> {
    let ddl = std::fs::read_to_string(file).map_err(|source| CliError::ReadFile {
        path: file.display().to_string(),
        source,
    })?;

    let schema = target
        .schema
        .clone()
        .or_else(|| dump::detect_schema(&ddl))
        .unwrap_or_else(|| "public".to_string());

    let ignore = IgnoreConfig::load(&target.ignore_file)?;
    let connect = target.connect_config();

    tracing::info!(schema = %schema, db = %target.db, "computing plan");
    let plan = build_plan(PlanRequest {
        target: &connect,
        target_schema: &schema,
        desired_ddl: &ddl,
        ignore: &ignore,
        plan_database: plan_db.connect_config(target),
    })
    .await?;

    Ok((plan, schema))
}

pub async fn run(
    target: &TargetArgs,
    plan_db: &PlanDatabaseArgs,
    file: &Path,
    outputs: &OutputSpec,
    color: bool,
) -> Result<(), CliError> {
    outputs.validate()?;
    let (plan, _) = compute(target, plan_db, file).await?;
    outputs.emit(&plan, color)
}
