//! Connection and session flags

use clap::Args;
use pgschema_core::ConnectConfig;
use std::path::PathBuf;

/// Target database connection flags
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Database server host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Database server port
    #[arg(long, default_value_t = 5432)]
    pub port: u16,

    /// Database name
    #[arg(long)]
    pub db: String,

    /// Database user
    #[arg(long, default_value = "postgres")]
    pub user: String,

    /// Database password
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Schema to operate on (defaults to the dump header's schema, then
    /// `public`)
    #[arg(long)]
    pub schema: Option<String>,

    /// application_name reported to the server
    #[arg(long, default_value = "pgschema")]
    pub application_name: String,

    /// Ignore-file path
    #[arg(long, default_value = ".pgschemaignore")]
    pub ignore_file: PathBuf,
}

impl TargetArgs {
    pub fn connect_config(&self) -> ConnectConfig {
        ConnectConfig::new(self.host.clone(), self.port, self.db.clone(), self.user.clone())
            .with_password(self.password.clone())
    }
}

/// Optional external plan-database flags; when `--plan-host` is given the
/// desired state is realized there instead of in an ephemeral instance
#[derive(Args, Debug, Clone, Default)]
pub struct PlanDatabaseArgs {
    /// Plan database host (selects the external provider)
    #[arg(long)]
    pub plan_host: Option<String>,

    /// Plan database port
    #[arg(long, default_value_t = 5432)]
    pub plan_port: u16,

    /// Plan database name (defaults to the target's)
    #[arg(long)]
    pub plan_db: Option<String>,

    /// Plan database user (defaults to the target's)
    #[arg(long)]
    pub plan_user: Option<String>,

    /// Plan database password
    #[arg(long, env = "PGSCHEMA_PLAN_PASSWORD", hide_env_values = true)]
    pub plan_password: Option<String>,
}

impl PlanDatabaseArgs {
    /// Build the external provider's connection config, if requested
    pub fn connect_config(&self, target: &TargetArgs) -> Option<ConnectConfig> {
        let host = self.plan_host.as_ref()?;
        let db = self.plan_db.clone().unwrap_or_else(|| target.db.clone());
        let user = self.plan_user.clone().unwrap_or_else(|| target.user.clone());
        let password = self
            .plan_password
            .clone()
            .or_else(|| target.password.clone());
        Some(
            ConnectConfig::new(host.clone(), self.plan_port, db, user)
                .with_password(password),
        )
    }
}

/// Validate a PostgreSQL duration string like `500ms`, `30s`, `5m`, `1h`
pub fn validate_lock_timeout(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(digits_end);
    if number.is_empty() {
        return Err(format!("invalid duration '{}'", value));
    }
    match unit.trim() {
        "" | "ms" | "s" | "min" | "m" | "h" => Ok(trimmed.to_string()),
        other => Err(format!("unknown duration unit '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_lock_timeout() {
        assert!(validate_lock_timeout("30s").is_ok());
        assert!(validate_lock_timeout("500ms").is_ok());
        assert!(validate_lock_timeout("5m").is_ok());
        assert!(validate_lock_timeout("10").is_ok());
        assert!(validate_lock_timeout("s").is_err());
        assert!(validate_lock_timeout("30y").is_err());
    }
}
