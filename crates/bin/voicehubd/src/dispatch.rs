//! Dispatcher used when no home-automation backend is wired in.

use voicehub_app::ports::Dispatcher;
use voicehub_domain::command::DispatchRequest;
use voicehub_domain::error::VoiceHubError;

/// Records every resolved command in the log and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl Dispatcher for LogDispatcher {
    async fn dispatch(&self, request: DispatchRequest) -> Result<(), VoiceHubError> {
        tracing::info!(
            device_id = %request.device_id,
            service = %request.service_name,
            value = ?request.converted_value,
            "dispatching command"
        );
        Ok(())
    }
}
