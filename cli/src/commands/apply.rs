//! The `apply` command

use crate::config::{PlanDatabaseArgs, TargetArgs};
use crate::error::CliError;
use pgschema_core::{ApplyOptions, IgnoreConfig, Plan, apply};
use std::path::Path;

/// Source of the plan to apply: a DDL file (plan first) or a pre-computed
/// JSON plan
pub enum PlanSource<'a> {
    DdlFile(&'a Path),
    PlanFile(&'a Path),
}

pub async fn run(
    target: &TargetArgs,
    plan_db: &PlanDatabaseArgs,
    source: PlanSource<'_>,
    options: ApplyOptions,
) -> Result<(), CliError> {
    let (plan, schema) = match source {
        PlanSource::DdlFile(file) => super::plan::compute(target, plan_db, file).await?,
        PlanSource::PlanFile(file) => {
            let json = std::fs::read_to_string(file).map_err(|source| CliError::ReadFile {
                path: file.display().to_string(),
                source,
            })?;
            let plan = Plan::from_json(&json)?;
            plan.check_compatibility()?;
            let schema = target
                .schema
                .clone()
                .unwrap_or_else(|| "public".to_string());
            (plan, schema)
        }
    };

    let ignore = IgnoreConfig::load(&target.ignore_file)?;
    let connect = target.connect_config();

    tracing::info!(schema = %schema, db = %target.db, "applying plan");
    apply(&connect, &schema, &ignore, &plan, &options).await?;
    Ok(())
}
