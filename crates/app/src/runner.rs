//! Notifier runtime - wires the change feed, event bus and IRC client
//!
//! The feed is polled on an interval; each journaled change is replayed on
//! the bus, where the document notifier announces it and the configuration
//! watcher reloads exclusion patterns when the bot configuration page moves.

use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use tokio::time::MissedTickBehavior;
use wikirc_core::constants::{CONFIGURATION_PAGE, SPACE};
use wikirc_core::feed;
use wikirc_core::{
    ChangeFeed, ChangeKind, ConfigRepository, Database, EventListener, EventSource, ExclusionFilter,
    Execution, MessageComposer, NotificationDispatcher, ObservationManager, Result, Settings,
    SharedExclusionFilter,
};
use wikirc_net::{IrcClient, IrcEvent};

use crate::state::{lock_db, AppState};

/// Settings patterns followed by the ones stored in the wiki
pub fn load_exclusion_filter(db: &Database, settings: &Settings, execution: &Execution) -> Result<ExclusionFilter> {
    let wiki_patterns = ConfigRepository::new(db).load_exclusion_patterns(execution)?;
    let filter = ExclusionFilter::compile(
        settings
            .notifications
            .exclusion_patterns
            .iter()
            .chain(wiki_patterns.iter()),
    )?;
    tracing::info!(patterns = filter.len(), "Loaded exclusion patterns");
    Ok(filter)
}

/// Reloads the exclusion filter when the configuration page changes
pub struct ConfigurationWatcher {
    db: Arc<Mutex<Database>>,
    settings: Settings,
    filter: Arc<SharedExclusionFilter>,
}

impl ConfigurationWatcher {
    pub fn new(db: Arc<Mutex<Database>>, settings: Settings, filter: Arc<SharedExclusionFilter>) -> Self {
        Self { db, settings, filter }
    }

    fn reload(&self, execution: &Execution) -> Result<()> {
        let filter = {
            let db = lock_db(&self.db);
            load_exclusion_filter(&db, &self.settings, execution)?
        };
        self.filter.replace(filter);
        Ok(())
    }
}

impl EventListener for ConfigurationWatcher {
    fn name(&self) -> &str {
        "ircconfigurationwatcher"
    }

    fn events(&self) -> &[ChangeKind] {
        &ChangeKind::ALL
    }

    fn on_event(&self, _kind: ChangeKind, source: &EventSource, execution: &Execution) {
        let Some(document) = source.as_document() else {
            return;
        };
        let Ok(context) = execution.context() else {
            return;
        };
        let reference = &document.reference;
        if reference.wiki != context.wiki || reference.space != SPACE || reference.name != CONFIGURATION_PAGE {
            return;
        }

        // A broken pattern keeps the previous snapshot in place
        if let Err(e) = self.reload(execution) {
            tracing::error!(error = %e, "Failed to reload exclusion patterns");
        }
    }
}

/// Poll the feed once and deliver what it returned
pub fn pump(db: &Mutex<Database>, feed: &mut ChangeFeed, bus: &ObservationManager, execution: &Execution) -> Result<usize> {
    let entries = {
        let db = lock_db(db);
        feed.poll(&db)?
    };
    feed::publish(bus, entries, execution)
}

/// Connect and announce changes until interrupted or disconnected
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let execution = state.execution();
    let bot = state
        .with_repository(|repository| repository.load_bot_data(&execution))
        .context("Failed to load IRC bot configuration")?;

    if !bot.auto_connect {
        tracing::info!(bot = %bot.name, "IRC bot is marked inactive, not connecting");
        return Ok(());
    }

    let filter = {
        let db = state.lock_db();
        Arc::new(SharedExclusionFilter::new(load_exclusion_filter(&db, &state.settings, &execution)?))
    };

    let mut client = IrcClient::connect(&bot)
        .await
        .with_context(|| format!("Failed to connect to IRC server {}", bot.server))?;
    let mut events = client
        .take_events()
        .context("IRC event stream unavailable")?;
    let client = Arc::new(client);

    let bus = ObservationManager::new();
    bus.add_listener(Arc::new(NotificationDispatcher::new(
        filter.clone(),
        MessageComposer::new(),
        client.clone(),
    )));
    bus.add_listener(Arc::new(ConfigurationWatcher::new(
        state.db.clone(),
        state.settings.clone(),
        filter,
    )));

    let mut feed = {
        let db = state.lock_db();
        ChangeFeed::tail(&db, state.settings.feed.batch_size)?
    };
    tracing::info!(
        cursor = feed.cursor(),
        listeners = ?bus.listener_names(),
        "Tailing change feed"
    );

    let mut interval = tokio::time::interval(state.settings.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = pump(&state.db, &mut feed, &bus, &execution) {
                    tracing::warn!(error = %e, "Failed to read change feed");
                }
            }

            event = events.recv() => {
                match event {
                    Some(IrcEvent::Disconnected) | None => {
                        anyhow::bail!("Lost connection to IRC server {}", bot.server);
                    }
                    Some(IrcEvent::Message { from, target, text }) => {
                        tracing::debug!(from = %from, target = %target, text = %text, "IRC message");
                    }
                    Some(other) => {
                        tracing::debug!(event = ?other, "IRC event");
                    }
                }
            }

            _ = &mut shutdown => {
                tracing::info!("Interrupted, leaving IRC");
                client.disconnect().await;
                break;
            }
        }
    }

    Ok(())
}
