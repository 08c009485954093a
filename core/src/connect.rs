//! Database connection handling

use crate::error::Result;
use tokio_postgres::{Client, NoTls};

/// Connection parameters for one PostgreSQL endpoint
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub application_name: Option<String>,
}

impl ConnectConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: None,
            application_name: None,
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Open a connection and spawn its I/O task.
    ///
    /// The returned client is usable until the task observes EOF. Connection
    /// errors after establishment surface on the next query.
    pub async fn connect(&self) -> Result<Client> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user);
        if let Some(ref password) = self.password {
            config.password(password);
        }
        if let Some(ref name) = self.application_name {
            config.application_name(name);
        }

        let (client, connection) = config.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "connection task ended");
            }
        });
        Ok(client)
    }
}

/// Query the server's major version (e.g. 17 for 17.2)
pub async fn server_major_version(client: &Client) -> Result<u32> {
    let row = client.query_one("SHOW server_version_num", &[]).await?;
    let num: String = row.get(0);
    // server_version_num is e.g. "170002"
    let major = num
        .parse::<u32>()
        .map(|n| n / 10_000)
        .unwrap_or_default();
    Ok(major)
}
