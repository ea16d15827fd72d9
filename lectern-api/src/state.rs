//! Shared handler state

use std::sync::Arc;

use lectern_core::signature::CallbackSecret;
use lectern_storage::ArtifactStore;

use crate::repository::Ledger;
use crate::service::dispatch::Dispatcher;

/// Everything a handler needs; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn Ledger>,
    pub store: Arc<dyn ArtifactStore>,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub callback_secret: CallbackSecret,
}
