//! Recording publisher for reconciler tests

use super::{ImagePublisher, PublishError};
use crate::credentials::RegistryCredential;
use async_trait::async_trait;
use crds::FalconApi;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Arguments of one `publish` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCall {
    pub client_id: String,
    pub credential: RegistryCredential,
    pub repository: String,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<PublishCall>,
    failure: Option<String>,
}

/// Publisher that records its calls and optionally fails them
#[derive(Debug, Clone, Default)]
pub struct MockImagePublisher {
    state: Arc<Mutex<State>>,
}

impl MockImagePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every subsequent call with `PublishError::Failed(message)`
    pub fn fail_with(&self, message: &str) {
        self.state().failure = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<PublishCall> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl ImagePublisher for MockImagePublisher {
    async fn publish(
        &self,
        api: &FalconApi,
        credential: &RegistryCredential,
        repository: &str,
    ) -> Result<(), PublishError> {
        let mut state = self.state();
        state.calls.push(PublishCall {
            client_id: api.client_id.clone(),
            credential: credential.clone(),
            repository: repository.to_string(),
        });
        match &state.failure {
            Some(message) => Err(PublishError::Failed(message.clone())),
            None => Ok(()),
        }
    }
}
