//! Dispatch port: hands resolved commands to the home-automation backend.

use std::future::Future;

use voicehub_domain::command::DispatchRequest;
use voicehub_domain::error::VoiceHubError;

/// Backend that executes a resolved command.
///
/// Implementations report backend failures as
/// [`voicehub_domain::error::ExternalError`]. The caller bounds every call
/// with a timeout, so implementations don't need their own.
pub trait Dispatcher: Send + Sync {
    fn dispatch(
        &self,
        request: DispatchRequest,
    ) -> impl Future<Output = Result<(), VoiceHubError>> + Send;
}
