//! Shared application state for all routes. Model and schema are swapped by
//! the catalog watcher so structural changes appear without a restart.

use crate::introspect::ResolvedModel;
use async_graphql::dynamic::Schema;
use sqlx::PgPool;
use std::sync::{Arc, RwLock};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub model: Arc<RwLock<Arc<ResolvedModel>>>,
    pub schema: Arc<RwLock<Schema>>,
}

impl AppState {
    pub fn new(pool: PgPool, model: Arc<ResolvedModel>, schema: Schema) -> Self {
        AppState {
            pool,
            model: Arc::new(RwLock::new(model)),
            schema: Arc::new(RwLock::new(schema)),
        }
    }

    /// Current executable schema. Schema handles are cheap to clone.
    pub fn schema(&self) -> Schema {
        match self.schema.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Current resolved model.
    pub fn model(&self) -> Arc<ResolvedModel> {
        match self.model.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn install(&self, model: Arc<ResolvedModel>, schema: Schema) {
        match self.model.write() {
            Ok(mut guard) => *guard = model,
            Err(poisoned) => *poisoned.into_inner() = model,
        }
        match self.schema.write() {
            Ok(mut guard) => *guard = schema,
            Err(poisoned) => *poisoned.into_inner() = schema,
        }
    }
}
