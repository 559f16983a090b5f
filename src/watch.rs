//! Polling catalog watcher: re-derives the model and schema when the
//! database structure changes.
//!
//! Change detection compares catalog snapshots on an interval, so a change
//! becomes visible within one interval rather than immediately.

use crate::gql::generate_schema;
use crate::introspect::{load_catalog, resolve, Catalog};
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub fn spawn_watcher(state: AppState, initial: Catalog, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let schema_name = initial.schema.clone();
        let mut last = initial;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let next = match load_catalog(&state.pool, &schema_name).await {
                Ok(catalog) => catalog,
                Err(err) => {
                    tracing::warn!(error = %err, "catalog poll failed; keeping current schema");
                    continue;
                }
            };
            if next == last {
                continue;
            }
            let model = match resolve(&next) {
                Ok(model) => Arc::new(model),
                Err(err) => {
                    tracing::warn!(error = %err, "catalog changed but did not resolve; keeping current schema");
                    last = next;
                    continue;
                }
            };
            let schema = match generate_schema(&model, &state.pool) {
                Ok(schema) => schema,
                Err(err) => {
                    tracing::warn!(error = %err, "schema regeneration failed; keeping current schema");
                    last = next;
                    continue;
                }
            };
            state.install(model, schema);
            tracing::info!(schema = %schema_name, "database structure changed; derived schema reloaded");
            last = next;
        }
    })
}
