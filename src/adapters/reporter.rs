use crate::domain::models::resolver_models::{ResolutionOutcome, ResolveError};
use crate::domain::traits::message_traits::MessageReceiver;
use std::path::PathBuf;

pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while resolving the path.";

/// Hands a successful path back to the caller, or tells the receiver what went wrong.
///
/// User-facing failures are shown as-is. Internal failures are logged with their cause and
/// the receiver only gets a generic message.
pub fn report_outcome(
    outcome: &ResolutionOutcome,
    receiver: &dyn MessageReceiver,
    path: &str,
) -> Option<PathBuf> {
    match outcome {
        Ok(resolved) => Some(resolved.clone()),
        Err(err) => {
            report_failure(err, receiver, path);
            None
        }
    }
}

pub fn report_failure(err: &ResolveError, receiver: &dyn MessageReceiver, path: &str) {
    if err.kind.is_user_facing() {
        if let Some(cause) = &err.cause {
            tracing::debug!("resolving {} failed ({}): {}", path, err.kind, cause);
        }
        receiver.send_message(&err.message);
        return;
    }

    match &err.cause {
        Some(cause) => tracing::error!(
            "an error occurred while resolving the path {}: {}: {:?}",
            path,
            err.message,
            cause
        ),
        None => tracing::error!(
            "an error occurred while resolving the path {}: {}",
            path,
            err.message
        ),
    }
    receiver.send_message(GENERIC_FAILURE_MESSAGE);
}
