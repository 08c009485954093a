//! Error types for the plan pipeline

/// Errors that can occur while planning or applying schema changes
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(#[from] tokio_postgres::Error),

    #[error("introspection failed for '{object}': {message}")]
    Inspect { object: String, message: String },

    #[error(
        "plan database major version {plan} does not match target major version {target}; \
         point --plan-host at a PostgreSQL {target} instance"
    )]
    VersionMismatch { target: u32, plan: u32 },

    #[error("failed to apply desired state: {0}")]
    DesiredState(String),

    #[error("failed to start embedded PostgreSQL: {0}")]
    Embedded(String),

    #[error(
        "schema fingerprint mismatch: the database schema has changed since the plan was \
         created (expected {expected}, got {actual}); re-run plan against the current database"
    )]
    FingerprintMismatch { expected: String, actual: String },

    #[error(
        "plan was created by pgschema {plan_version} but this binary is {binary_version}; \
         regenerate the plan with the matching version"
    )]
    PlanVersionMismatch {
        plan_version: String,
        binary_version: String,
    },

    #[error("unsupported plan format version {0}")]
    PlanFormatMismatch(String),

    #[error("group {group} step {step} failed ({sql_preview}): {source}")]
    StepFailed {
        group: usize,
        step: usize,
        sql_preview: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("wait query returned no rows")]
    WaitNoRows,

    #[error("wait query is missing a boolean 'done' column")]
    WaitBadShape,

    #[error("timed out after {0:?} waiting for operation to finish")]
    WaitTimeout(std::time::Duration),

    #[error("dependency cycle among views: {0}")]
    ViewCycle(String),

    #[error("invalid ignore file: {0}")]
    IgnoreFile(String),

    #[error("plan was rejected")]
    Rejected,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a step failure with a truncated SQL preview for context
    pub fn step_failed(
        group: usize,
        step: usize,
        sql: &str,
        source: tokio_postgres::Error,
    ) -> Self {
        let first_line = sql.lines().next().unwrap_or("");
        let sql_preview = if first_line.len() > 80 {
            format!("{}...", &first_line[..77])
        } else {
            first_line.to_string()
        };
        Error::StepFailed {
            group,
            step,
            sql_preview,
            source,
        }
    }
}
