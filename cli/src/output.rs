//! Plan output routing
//!
//! `plan` can emit the human, JSON and SQL renderings, each to stdout
//! (`-`) or to a file. At most one rendering may claim stdout.

use crate::error::CliError;
use pgschema_core::{Plan, SqlFormat};
use std::path::PathBuf;

/// Where the three renderings go
#[derive(Debug, Clone, Default)]
pub struct OutputSpec {
    pub human: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub sql: Option<PathBuf>,
}

fn is_stdout(path: &PathBuf) -> bool {
    path.as_os_str() == "-"
}

impl OutputSpec {
    /// Reject specs where more than one rendering targets stdout
    pub fn validate(&self) -> Result<(), CliError> {
        let stdout_count = [&self.human, &self.json, &self.sql]
            .into_iter()
            .flatten()
            .filter(|p| is_stdout(p))
            .count();
        if stdout_count > 1 {
            return Err(CliError::Usage(
                "at most one of --output-human, --output-json, --output-sql may target stdout"
                    .to_string(),
            ));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.human.is_none() && self.json.is_none() && self.sql.is_none()
    }

    /// Write the requested renderings. With no outputs configured, the
    /// human rendering goes to stdout.
    pub fn emit(&self, plan: &Plan, color: bool) -> Result<(), CliError> {
        if self.is_empty() {
            print!("{}", plan.render_human(color));
            return Ok(());
        }
        if let Some(ref path) = self.human {
            // File output never carries ANSI escapes
            let text = plan.render_human(color && is_stdout(path));
            write_to(path, &text)?;
        }
        if let Some(ref path) = self.json {
            let json = plan.to_json().map_err(CliError::Core)?;
            write_to(path, &format!("{}\n", json))?;
        }
        if let Some(ref path) = self.sql {
            write_to(path, &plan.to_sql(SqlFormat::Annotated))?;
        }
        Ok(())
    }
}

fn write_to(path: &PathBuf, content: &str) -> Result<(), CliError> {
    if is_stdout(path) {
        print!("{}", content);
        return Ok(());
    }
    std::fs::write(path, content).map_err(|source| CliError::WriteFile {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_stdout_targets_rejected() {
        let spec = OutputSpec {
            human: Some(PathBuf::from("-")),
            json: Some(PathBuf::from("-")),
            sql: None,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_one_stdout_and_files_ok() {
        let spec = OutputSpec {
            human: Some(PathBuf::from("-")),
            json: Some(PathBuf::from("plan.json")),
            sql: Some(PathBuf::from("plan.sql")),
        };
        assert!(spec.validate().is_ok());
    }
}
