//! Config resolution and runtime startup shared by `watch` and `snapshot`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::channels::{parse_feed_url, replay_file, run_bridge, ChannelHub};
use crate::core::config::{DashboardConfig, FeedSource};
use crate::core::fleet::{DashboardRuntime, RuntimeSettings};

/// A running dashboard and the hub feeding it.
pub struct Session {
    pub runtime: DashboardRuntime,
    pub hub: Arc<ChannelHub>,
    pub agent_id: String,
}

/// Config file named by `--config`, else the default location.
pub fn config_path(matches: &ArgMatches) -> Result<PathBuf> {
    match matches.get_one::<String>("config") {
        Some(path) => Ok(PathBuf::from(path)),
        None => DashboardConfig::get_config_path(),
    }
}

/// Load the config file and lay the command-line options over it.
pub fn resolve_config(matches: &ArgMatches) -> Result<DashboardConfig> {
    let path = config_path(matches)?;
    let mut config = DashboardConfig::load_from(&path)?;
    apply_overrides(&mut config, matches);
    Ok(config)
}

pub fn apply_overrides(config: &mut DashboardConfig, matches: &ArgMatches) {
    if let Some(agent_id) = matches.get_one::<String>("agent-id") {
        config.agent_id = Some(agent_id.clone());
    }
    if let Some(app_key) = matches.get_one::<String>("app-key") {
        config.widget.app_key = app_key.clone();
    }
    if let Some(key) = matches.get_one::<String>("manager-app-key") {
        config.widget.manager_app_key = key.clone();
    }
    if let Some(secs) = matches.get_one::<u64>("refresh-secs") {
        config.refresh_secs = *secs;
    }
    if let Some(path) = matches.get_one::<String>("feed-file") {
        config.feed = Some(FeedSource::File {
            path: path.clone(),
            pace_ms: matches.get_one::<u64>("pace-ms").copied().unwrap_or(0),
        });
    } else if let Some(url) = matches.get_one::<String>("ws") {
        config.feed = Some(FeedSource::WebSocket { url: url.clone() });
    }
}

/// Runtime settings for a validated config.
pub fn runtime_settings(config: &DashboardConfig) -> Result<RuntimeSettings> {
    config.validate()?;
    let agent_id = config.agent_id.clone().unwrap_or_default();
    let mut settings = RuntimeSettings::new(
        agent_id,
        &config.widget.app_key,
        &config.widget.manager_app_key,
    );
    settings.refresh_period = config.refresh_period();
    Ok(settings)
}

/// Start the runtime and attach the configured feed to its hub.
pub fn start_session(config: &DashboardConfig) -> Result<Session> {
    let settings = runtime_settings(config)?;
    let agent_id = settings.agent_id.clone();
    let hub = Arc::new(ChannelHub::new());

    let runtime = DashboardRuntime::new(settings, hub.clone(), hub.clone())
        .context("Failed to start dashboard runtime")?;

    spawn_feed(&runtime, &hub, config.feed.as_ref())?;

    Ok(Session {
        runtime,
        hub,
        agent_id,
    })
}

fn spawn_feed(runtime: &DashboardRuntime, hub: &Arc<ChannelHub>, feed: Option<&FeedSource>) -> Result<()> {
    let handle = runtime.handle();
    match feed {
        Some(FeedSource::File { path, pace_ms }) => {
            let hub = hub.clone();
            let path = PathBuf::from(path);
            let pace = Duration::from_millis(*pace_ms);
            handle.spawn(async move {
                match replay_file(&hub, &path, pace).await {
                    Ok(count) => log::info!("replayed {} feed messages from {:?}", count, path),
                    Err(e) => log::error!("feed replay from {:?} failed: {}", path, e),
                }
            });
        }
        Some(FeedSource::WebSocket { url }) => {
            let url = parse_feed_url(url)?;
            let hub = hub.clone();
            handle.spawn(async move {
                if let Err(e) = run_bridge(url, hub).await {
                    log::error!("feed connection failed: {}", e);
                }
            });
        }
        None => log::warn!("no feed configured; devices will stay loading"),
    }
    Ok(())
}
