//! Test doubles shared by the service tests

use async_trait::async_trait;
use lectern_core::dto::job::DispatchJob;
use tokio::sync::Mutex;

use crate::service::dispatch::{DispatchError, Dispatcher};

/// Dispatcher that records every order and optionally refuses them
pub(crate) struct RecordingDispatcher {
    sent: Mutex<Vec<DispatchJob>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub(crate) fn accepting() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) async fn sent(&self) -> Vec<DispatchJob> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, job: &DispatchJob) -> Result<(), DispatchError> {
        self.sent.lock().await.push(job.clone());
        if self.fail {
            return Err(DispatchError("worker unreachable".to_string()));
        }
        Ok(())
    }
}
