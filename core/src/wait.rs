//! Wait directive engine
//!
//! A single cooperative waiter: issue the monitoring query, sleep, repeat.
//! The polling interval backs off as the operation ages so short builds get
//! snappy feedback and long builds do not hammer the server.
//!
//! Query contract: exactly one row with a boolean `done` column and an
//! optional integer `progress` column (0–100); extra columns are ignored.

use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;
use tokio_postgres::Client;

/// Poll cadence by elapsed time since the wait started
fn interval_for(elapsed: Duration) -> Duration {
    if elapsed < Duration::from_secs(10) {
        Duration::from_secs(1)
    } else if elapsed < Duration::from_secs(30) {
        Duration::from_secs(5)
    } else {
        Duration::from_secs(10)
    }
}

/// One poll result
struct Poll {
    done: bool,
    progress: Option<i32>,
}

async fn poll(client: &Client, query: &str) -> Result<Poll> {
    let rows = client.query(query, &[]).await?;
    let row = rows.first().ok_or(Error::WaitNoRows)?;
    let done: bool = row.try_get("done").map_err(|_| Error::WaitBadShape)?;
    let progress: Option<i32> = row.try_get("progress").unwrap_or(None);
    Ok(Poll { done, progress })
}

/// Run a wait directive to completion.
///
/// Progress lines are printed only when the reported value changes. An
/// optional overall timeout bounds the wait; `None` waits indefinitely
/// (the caller's cancellation is the interrupt path).
pub async fn run(
    client: &Client,
    query: &str,
    message: &str,
    timeout: Option<Duration>,
    quiet: bool,
) -> Result<()> {
    let started = Instant::now();
    let mut last_progress: Option<i32> = None;

    loop {
        let status = poll(client, query).await?;
        if status.done {
            if !quiet {
                println!("{}: done", message);
            }
            return Ok(());
        }
        if !quiet {
            if let Some(progress) = status.progress {
                if last_progress != Some(progress) {
                    println!("{}: {}%", message, progress);
                    last_progress = Some(progress);
                }
            }
        }

        let elapsed = started.elapsed();
        if let Some(limit) = timeout {
            if elapsed >= limit {
                return Err(Error::WaitTimeout(limit));
            }
        }
        tokio::time::sleep(interval_for(elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_schedule() {
        assert_eq!(interval_for(Duration::from_secs(0)), Duration::from_secs(1));
        assert_eq!(interval_for(Duration::from_secs(9)), Duration::from_secs(1));
        assert_eq!(interval_for(Duration::from_secs(10)), Duration::from_secs(5));
        assert_eq!(interval_for(Duration::from_secs(29)), Duration::from_secs(5));
        assert_eq!(
            interval_for(Duration::from_secs(30)),
            Duration::from_secs(10)
        );
        assert_eq!(
            interval_for(Duration::from_secs(300)),
            Duration::from_secs(10)
        );
    }
}
