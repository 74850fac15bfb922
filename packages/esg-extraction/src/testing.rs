//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction engine
//! without making real model calls.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{ModelError, ModelResult};
use crate::traits::model::{LanguageModel, ModelRequest};

/// A scripted language model for testing.
///
/// Replies are returned in the order they were added. Once the script runs
/// out, the default reply is used; without one, calls fail with
/// [`ModelError::EmptyResponse`]. Calls naming a failing model id fail
/// without consuming the script.
///
/// Clones share the script and the call log, so a test can hand one clone
/// to a strategy and inspect the other.
#[derive(Clone, Default)]
pub struct MockModel {
    /// Scripted replies (`Err` entries become transport failures)
    script: Arc<RwLock<VecDeque<Result<String, String>>>>,

    /// Reply once the script is exhausted
    default_reply: Arc<RwLock<Option<String>>>,

    /// Model ids that always fail
    failing_models: Arc<RwLock<HashSet<String>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<ModelRequest>>>,
}

impl MockModel {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reply to the script.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.script.write().unwrap().push_back(Ok(reply.into()));
        self
    }

    /// Append several replies to the script.
    pub fn with_replies(self, replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        {
            let mut script = self.script.write().unwrap();
            script.extend(replies.into_iter().map(|r| Ok(r.into())));
        }
        self
    }

    /// Append a transport failure to the script.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.script.write().unwrap().push_back(Err(message.into()));
        self
    }

    /// Reply used once the script is exhausted.
    pub fn with_default_reply(self, reply: impl Into<String>) -> Self {
        *self.default_reply.write().unwrap() = Some(reply.into());
        self
    }

    /// Make every call naming `model` fail.
    pub fn with_failing_model(self, model: impl Into<String>) -> Self {
        self.failing_models.write().unwrap().insert(model.into());
        self
    }

    /// Get all requests made to this mock.
    pub fn calls(&self) -> Vec<ModelRequest> {
        self.calls.read().unwrap().clone()
    }

    /// Number of requests made.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Model ids of all requests, in call order.
    pub fn models_called(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .map(|r| r.model.clone())
            .collect()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, request: &ModelRequest) -> ModelResult<String> {
        self.calls.write().unwrap().push(request.clone());

        if self.failing_models.read().unwrap().contains(&request.model) {
            return Err(ModelError::Api(format!("model {} unavailable", request.model)));
        }

        let next = self.script.write().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(ModelError::Transport(message)),
            None => self
                .default_reply
                .read()
                .unwrap()
                .clone()
                .ok_or_else(|| ModelError::EmptyResponse {
                    model: request.model.clone(),
                }),
        }
    }
}
