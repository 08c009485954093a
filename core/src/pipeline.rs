//! The plan pipeline
//!
//! Wires the components end to end: introspect the target, realize the
//! desired DDL in a disposable database, re-introspect, fingerprint, diff,
//! rewrite, group. The provider is always stopped, also on failure.

use crate::connect::{ConnectConfig, server_major_version};
use crate::diff::diff_irs;
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::ignore::IgnoreConfig;
use crate::inspect::Inspector;
use crate::plan::Plan;
use crate::provider::{EphemeralPostgres, ExternalSchema, Provider};

/// Inputs for one plan computation
pub struct PlanRequest<'a> {
    pub target: &'a ConnectConfig,
    pub target_schema: &'a str,
    pub desired_ddl: &'a str,
    pub ignore: &'a IgnoreConfig,
    /// When set, use an external shared database instead of an ephemeral
    /// instance for desired-state realization
    pub plan_database: Option<ConnectConfig>,
}

/// Compute the plan that moves the target schema to the desired state
pub async fn build_plan(request: PlanRequest<'_>) -> Result<Plan> {
    let client = request.target.connect().await?;
    let target_major = server_major_version(&client).await?;

    let current = Inspector::new(&client)
        .build_ir(request.target_schema, request.ignore)
        .await?;
    let fingerprint = Fingerprint::compute(&current, request.target_schema)?;

    let mut provider = match &request.plan_database {
        Some(config) => {
            Provider::External(ExternalSchema::connect(config.clone(), target_major).await?)
        }
        None => Provider::Ephemeral(EphemeralPostgres::start(target_major).await?),
    };

    let plan = realize_and_diff(&mut provider, &request, &current, fingerprint).await;
    provider.stop().await;
    plan
}

async fn realize_and_diff(
    provider: &mut Provider,
    request: &PlanRequest<'_>,
    current: &crate::ir::Ir,
    fingerprint: Fingerprint,
) -> Result<Plan> {
    provider
        .apply(request.target_schema, request.desired_ddl)
        .await?;

    // Ephemeral providers apply under the target schema itself; external
    // providers hand back the temporary schema they used.
    let provider_schema = provider.schema_name().to_string();
    let inspect_schema = if provider_schema.is_empty() {
        request.target_schema
    } else {
        &provider_schema
    };

    let provider_client = provider.connect_config().connect().await?;
    let mut desired = Inspector::new(&provider_client)
        .build_ir(inspect_schema, request.ignore)
        .await?;
    if !provider_schema.is_empty() {
        desired.rename_schema(&provider_schema, request.target_schema);
    }

    let diffs = diff_irs(current, &desired, request.target_schema)?;
    Ok(Plan::new(&diffs, Some(fingerprint)))
}
