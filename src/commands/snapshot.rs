//! One-shot snapshot of the fleet table, for scripts and non-interactive use.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;

use super::options::{resolve_config, start_session};
use crate::core::fleet::DashboardSnapshot;
use crate::error::MdashError;
use crate::ui::{plain::render_snapshot, warn};

/// Execute the snapshot command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let json_output = matches.get_flag("json");
    let timeout = Duration::from_millis(
        matches.get_one::<u64>("timeout-ms").copied().unwrap_or(5000),
    );

    let config = resolve_config(matches)?;
    let session = start_session(&config)?;

    let mut snapshot_rx = session.runtime.snapshot_rx.clone();
    let (snapshot, settled) = session.runtime.handle().block_on(async move {
        let waited = tokio::time::timeout(timeout, snapshot_rx.wait_for(|s| s.is_settled()))
            .await
            .map(|result| result.map(|snapshot| snapshot.clone()));

        match waited {
            Ok(Ok(snapshot)) => Ok((snapshot, true)),
            Ok(Err(_)) => Err(MdashError::channel("dashboard runtime stopped")),
            Err(_) => Ok((snapshot_rx.borrow().clone(), false)),
        }
    })?;

    session.runtime.shutdown();

    if !settled {
        warn(&format!(
            "Not every device reported within {} ms; showing what arrived",
            timeout.as_millis()
        ));
    }

    print_snapshot(&snapshot, json_output)
}

fn print_snapshot(snapshot: &DashboardSnapshot, json_output: bool) -> Result<()> {
    if json_output {
        let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
        println!("{}", json);
    } else {
        println!("{}", render_snapshot(snapshot, chrono::Utc::now()));
    }
    Ok(())
}
