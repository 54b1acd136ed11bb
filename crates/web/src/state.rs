use std::sync::Arc;

use chrono::{Local, NaiveDate};
use storage::ScoringStore;

use crate::middleware::auth::ApiKeys;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ScoringStore>,
    pub api_keys: ApiKeys,
}

impl AppState {
    pub fn new(store: Arc<dyn ScoringStore>, api_keys: ApiKeys) -> Self {
        Self { store, api_keys }
    }

    pub fn store(&self) -> &dyn ScoringStore {
        self.store.as_ref()
    }
}

/// Date used for competition locking.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
