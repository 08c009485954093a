//! Desired-state providers
//!
//! The plan pipeline needs a disposable database in which the user's desired
//! DDL can be applied and re-introspected. Two variants exist:
//!
//! - [`Provider::Ephemeral`]: a fresh `postgres` process on a locally
//!   allocated port, data directory in a temp dir, torn down on stop. Its
//!   major version must match the target's.
//! - [`Provider::External`]: an existing database supplied by the user; the
//!   DDL is applied inside a timestamped temporary schema which is dropped
//!   (best effort) on stop.

use crate::connect::{ConnectConfig, server_major_version};
use crate::error::{Error, Result};
use crate::sqlgen::quote_ident;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio_postgres::Client;

const EPHEMERAL_USER: &str = "pgschema";
const EPHEMERAL_DB: &str = "postgres";
const READY_ATTEMPTS: u32 = 50;
const READY_DELAY: Duration = Duration::from_millis(100);

/// A disposable database holding the desired state
pub enum Provider {
    Ephemeral(EphemeralPostgres),
    External(ExternalSchema),
}

impl Provider {
    /// Apply the desired DDL under `target_schema` as one batch
    pub async fn apply(&mut self, target_schema: &str, ddl: &str) -> Result<()> {
        match self {
            Provider::Ephemeral(p) => p.apply(target_schema, ddl).await,
            Provider::External(p) => p.apply(ddl).await,
        }
    }

    /// Connection details for re-introspection
    pub fn connect_config(&self) -> ConnectConfig {
        match self {
            Provider::Ephemeral(p) => p.connect_config(),
            Provider::External(p) => p.config.clone(),
        }
    }

    /// Temporary schema holding the desired state, or empty when the DDL
    /// was applied under the target schema itself
    pub fn schema_name(&self) -> &str {
        match self {
            Provider::Ephemeral(_) => "",
            Provider::External(p) => &p.schema,
        }
    }

    /// Tear down the disposable state
    pub async fn stop(&mut self) {
        match self {
            Provider::Ephemeral(p) => p.stop().await,
            Provider::External(p) => p.stop().await,
        }
    }
}

// =============================================================================
// Ephemeral instance
// =============================================================================

/// A short-lived PostgreSQL server owned by this process
pub struct EphemeralPostgres {
    port: u16,
    child: tokio::process::Child,
    // Held for its Drop; the data directory lives here
    _data_dir: TempDir,
}

impl EphemeralPostgres {
    /// Initialize a data directory and start a server.
    ///
    /// Binaries are resolved from `PGSCHEMA_BINDIR` when set, otherwise
    /// from PATH. The started server's major version must equal
    /// `target_major`.
    pub async fn start(target_major: u32) -> Result<Self> {
        let data_dir = TempDir::with_prefix("pgschema-")?;
        let initdb = binary_path("initdb");
        let postgres = binary_path("postgres");

        let output = tokio::process::Command::new(&initdb)
            .arg("-D")
            .arg(data_dir.path())
            .arg("-U")
            .arg(EPHEMERAL_USER)
            .arg("-A")
            .arg("trust")
            .arg("--no-sync")
            .output()
            .await
            .map_err(|e| Error::Embedded(format!("failed to run {}: {}", initdb.display(), e)))?;
        if !output.status.success() {
            return Err(Error::Embedded(format!(
                "initdb failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let port = free_port()?;
        let child = tokio::process::Command::new(&postgres)
            .arg("-D")
            .arg(data_dir.path())
            .arg("-p")
            .arg(port.to_string())
            .arg("-c")
            .arg("listen_addresses=127.0.0.1")
            .arg("-k")
            .arg(data_dir.path())
            .arg("-F")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| Error::Embedded(format!("failed to start postgres: {}", e)))?;

        let mut instance = Self {
            port,
            child,
            _data_dir: data_dir,
        };

        match instance.startup_check(target_major).await {
            Ok(()) => Ok(instance),
            Err(e) => {
                instance.stop().await;
                Err(e)
            }
        }
    }

    async fn startup_check(&self, target_major: u32) -> Result<()> {
        let client = self.wait_ready().await?;
        let major = server_major_version(&client).await?;
        if major != target_major {
            return Err(Error::VersionMismatch {
                target: target_major,
                plan: major,
            });
        }
        Ok(())
    }

    async fn wait_ready(&self) -> Result<Client> {
        let config = self.connect_config();
        let mut last_err = None;
        for _ in 0..READY_ATTEMPTS {
            match config.connect().await {
                Ok(client) => return Ok(client),
                Err(e) => last_err = Some(e),
            }
            tokio::time::sleep(READY_DELAY).await;
        }
        Err(Error::Embedded(format!(
            "server did not become ready: {}",
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    pub fn connect_config(&self) -> ConnectConfig {
        ConnectConfig::new("127.0.0.1", self.port, EPHEMERAL_DB, EPHEMERAL_USER)
    }

    async fn apply(&mut self, target_schema: &str, ddl: &str) -> Result<()> {
        let client = self.connect_config().connect().await?;
        let setup = format!(
            "CREATE SCHEMA IF NOT EXISTS {}; SET search_path TO {};",
            quote_ident(target_schema),
            quote_ident(target_schema)
        );
        client.batch_execute(&setup).await?;
        client
            .batch_execute(ddl)
            .await
            .map_err(|e| Error::DesiredState(e.to_string()))?;
        Ok(())
    }

    async fn stop(&mut self) {
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

// =============================================================================
// External instance
// =============================================================================

/// A temporary schema inside a user-supplied database
pub struct ExternalSchema {
    config: ConnectConfig,
    schema: String,
}

impl ExternalSchema {
    /// Connect to the external plan database and verify its major version
    /// matches the target's.
    pub async fn connect(config: ConnectConfig, target_major: u32) -> Result<Self> {
        let client = config.connect().await?;
        let major = server_major_version(&client).await?;
        if major != target_major {
            return Err(Error::VersionMismatch {
                target: target_major,
                plan: major,
            });
        }
        let schema = format!(
            "pgschema_tmp_{}",
            chrono::Utc::now().format("%Y%m%d%H%M%S")
        );
        Ok(Self { config, schema })
    }

    async fn apply(&mut self, ddl: &str) -> Result<()> {
        let client = self.config.connect().await?;
        let setup = format!(
            "CREATE SCHEMA IF NOT EXISTS {}; SET search_path TO {};",
            quote_ident(&self.schema),
            quote_ident(&self.schema)
        );
        client.batch_execute(&setup).await?;
        client
            .batch_execute(ddl)
            .await
            .map_err(|e| Error::DesiredState(e.to_string()))?;
        Ok(())
    }

    async fn stop(&mut self) {
        // Best effort; a leaked pgschema_tmp_* schema is harmless and
        // recognizable.
        if let Ok(client) = self.config.connect().await {
            let drop = format!("DROP SCHEMA IF EXISTS {} CASCADE", quote_ident(&self.schema));
            if let Err(e) = client.batch_execute(&drop).await {
                tracing::warn!(schema = %self.schema, error = %e, "failed to drop temporary schema");
            }
        }
    }
}

fn binary_path(name: &str) -> PathBuf {
    match std::env::var_os("PGSCHEMA_BINDIR") {
        Some(dir) => PathBuf::from(dir).join(name),
        None => PathBuf::from(name),
    }
}

fn free_port() -> Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_port_is_nonzero() {
        assert_ne!(free_port().unwrap(), 0);
    }
}
