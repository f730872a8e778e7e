//! Interactive dashboard command.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::ArgMatches;

use super::options::{resolve_config, start_session};
use crate::error::MdashError;
use crate::ui::dashboard_tui::run_dashboard_app;

/// Execute the watch command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        return Err(MdashError::tui("watch needs an interactive terminal, try `mdash snapshot`").into());
    }

    let config = resolve_config(matches)?;
    let mut session = start_session(&config)?;

    let result = run_dashboard_app(&mut session.runtime, &session.agent_id)
        .context("Failed to run dashboard");

    session.runtime.shutdown();
    result
}
