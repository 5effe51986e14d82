//! # Local Records Plugin
//!
//! Keeps every player's personal best per map. Finish times are submitted to
//! a [`RecordStore`]; only improvements replace the stored time and only
//! improvements are announced to the player. `/toprecs` lists the best times
//! of the current map and the store is flushed when the host unloads.

use paddock_event_system::{
    format_race_time, CommandContext, CommandError, EventError, FinishEvent, Plugin, PluginError,
    Registrar, RemoteClient, UnloadEvent,
};
use std::sync::Arc;
use tracing::{debug, error, info};

pub mod store;

pub use store::{InMemoryRecordStore, Record, RecordError, RecordStore, Submission};

/// Number of records listed by `/toprecs`.
pub const TOP_LIMIT: usize = 10;

pub struct LocalRecordsPlugin {
    name: String,
    store: Arc<dyn RecordStore>,
}

impl LocalRecordsPlugin {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            name: "local_records".to_string(),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRecordStore::new()))
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.store)
    }
}

/// Message sent to a player whose finish was stored.
pub fn improvement_message(map_name: &str, time: i32, submission: Submission) -> Option<String> {
    match submission {
        Submission::New => Some(format!(
            "New personal best on {}: {}",
            map_name,
            format_race_time(time)
        )),
        Submission::Improved { previous } => Some(format!(
            "New personal best on {}: {} (-{})",
            map_name,
            format_race_time(time),
            format_race_time(previous - time)
        )),
        Submission::NotImproved { .. } => None,
    }
}

async fn handle_finish(
    event: &FinishEvent,
    client: &dyn RemoteClient,
    store: &dyn RecordStore,
) -> Result<bool, EventError> {
    if event.race_time <= 0 {
        return Ok(false);
    }

    let map = client.get_current_map_info().await?;
    let submission = store
        .submit(&map, &event.login, event.race_time)
        .await
        .map_err(|e| EventError::HandlerExecution(e.to_string()))?;

    debug!(
        "🏁 {} finished {} in {}: {:?}",
        event.login,
        map.uid,
        format_race_time(event.race_time),
        submission
    );

    if let Some(message) = improvement_message(&map.name, event.race_time, submission) {
        client
            .chat_send_server_message_to_login(&message, &event.login)
            .await?;
    }
    Ok(true)
}

async fn top_records(ctx: CommandContext, store: &dyn RecordStore) -> Result<(), CommandError> {
    let map = ctx.client.get_current_map_info().await?;
    let records = store.top(&map.uid, TOP_LIMIT).await;

    if records.is_empty() {
        return ctx.reply(&format!("No records on {} yet", map.name)).await;
    }

    ctx.reply(&format!("Top {} on {}:", records.len(), map.name))
        .await?;
    for (rank, record) in records.iter().enumerate() {
        ctx.reply(&format!(
            "{}. {} - {}",
            rank + 1,
            record.login,
            format_race_time(record.time)
        ))
        .await?;
    }
    Ok(())
}

impl Plugin for LocalRecordsPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> Result<(), PluginError> {
        let client = registrar.context().client();

        let store = self.store();
        registrar.on(move |event: Arc<FinishEvent>| {
            let (client, store) = (client.clone(), store.clone());
            async move { handle_finish(&event, client.as_ref(), store.as_ref()).await }
        });

        let store = self.store();
        registrar.on(move |_event: Arc<UnloadEvent>| {
            let store = store.clone();
            async move {
                match store.flush().await {
                    Ok(()) => Ok(true),
                    Err(e) => {
                        error!("❌ Failed to save local records: {}", e);
                        Err(EventError::HandlerExecution(e.to_string()))
                    }
                }
            }
        });

        let store = self.store();
        registrar.command("toprecs", &["recs"], move |ctx: CommandContext| {
            let store = store.clone();
            async move { top_records(ctx, store.as_ref()).await }
        })?;

        info!("🏁 LocalRecordsPlugin: ✅ Tracking personal bests");
        Ok(())
    }
}
