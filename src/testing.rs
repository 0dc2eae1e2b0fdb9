//! Testing utilities.
//!
//! [`ScriptedBackend`] stands in for the HTTP backend so the real
//! [`GenerationClient`](crate::generation::GenerationClient) state machine can
//! be driven without network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::generation::{BackendError, GenerationBackend, GenerationRequest, RequestKind};

/// A backend that replays scripted replies in order.
///
/// Once the script runs out every call returns the default reply. Each call's
/// start time and request kind are recorded.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, BackendError>>>,
    default_reply: String,
    calls: Mutex<Vec<(Instant, RequestKind)>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, BackendError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default_reply: "The shelves are silent.".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Backend that answers every call with `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        Self::new(Vec::new()).with_default_reply(reply)
    }

    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// Start times of every call, in order.
    pub fn call_starts(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|(at, _)| *at).collect())
            .unwrap_or_default()
    }

    /// Request kinds of every call, in order.
    pub fn call_kinds(&self) -> Vec<RequestKind> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|(_, kind)| *kind).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((Instant::now(), request.kind()));
        }
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        next.unwrap_or_else(|| Ok(self.default_reply.clone()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
