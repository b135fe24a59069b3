//! Command service: resolve engine output and hand it to the backend.

use std::time::Duration;

use voicehub_domain::command::{Command, DispatchRequest, resolve};
use voicehub_domain::error::{ExternalError, IntegrityError, VoiceHubError};

use crate::grammar_worker::GrammarHandle;
use crate::ports::Dispatcher;

/// Application service for the inference-engine side of the pipeline.
pub struct CommandService<D> {
    grammar: GrammarHandle,
    dispatcher: D,
    timeout: Duration,
}

impl<D: Dispatcher> CommandService<D> {
    /// Create a service resolving against `grammar` and dispatching through
    /// `dispatcher`, giving up on a dispatch after `timeout`.
    pub fn new(grammar: GrammarHandle, dispatcher: D, timeout: Duration) -> Self {
        Self {
            grammar,
            dispatcher,
            timeout,
        }
    }

    /// Resolve raw engine output against the active grammar.
    ///
    /// Synchronous and IO free. Integrity failures are logged at `error`.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::NoActiveGrammar`] before the first
    /// successful generation, otherwise whatever parsing or resolution fails
    /// with.
    pub fn resolve(&self, raw: &str) -> Result<DispatchRequest, VoiceHubError> {
        let result = match self.grammar.current() {
            Some(artifact) => Command::parse(raw).and_then(|command| resolve(&command, &artifact)),
            None => Err(IntegrityError::NoActiveGrammar.into()),
        };
        match &result {
            Ok(request) => tracing::debug!(
                device_id = %request.device_id,
                service = %request.service_name,
                "command resolved"
            ),
            Err(VoiceHubError::Integrity(err)) => {
                tracing::error!(error = %err, output = raw, "engine output failed integrity check");
            }
            Err(err) => tracing::debug!(error = %err, "command rejected"),
        }
        result
    }

    /// Resolve then dispatch, bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Everything [`Self::resolve`] returns, plus
    /// [`ExternalError::Timeout`] when the backend does not answer in time and
    /// the dispatcher's own errors. Nothing is retried.
    #[tracing::instrument(skip(self, raw))]
    pub async fn execute(&self, raw: &str) -> Result<DispatchRequest, VoiceHubError> {
        let request = self.resolve(raw)?;
        let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        match tokio::time::timeout(self.timeout, self.dispatcher.dispatch(request.clone())).await {
            Ok(Ok(())) => {
                tracing::info!(
                    device_id = %request.device_id,
                    service = %request.service_name,
                    "command dispatched"
                );
                Ok(request)
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "dispatch failed");
                Err(err)
            }
            Err(_) => {
                tracing::warn!(after_ms, "dispatch timed out");
                Err(ExternalError::Timeout {
                    operation: "dispatch",
                    after_ms,
                }
                .into())
            }
        }
    }
}
