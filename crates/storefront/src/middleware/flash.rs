//! One-shot toast messages carried across a redirect.

use tower_sessions::Session;

use crate::models::{Toast, session_keys};

/// Queue a toast for the next rendered page.
///
/// Session failures are logged; a lost toast never fails the request.
pub async fn push_toast(session: &Session, toast: Toast) {
    let mut toasts: Vec<Toast> = session
        .get(session_keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    toasts.push(toast);
    if let Err(e) = session.insert(session_keys::TOASTS, toasts).await {
        tracing::warn!("Failed to queue toast: {e}");
    }
}

/// Take every pending toast, leaving none behind.
pub async fn take_toasts(session: &Session) -> Vec<Toast> {
    session
        .remove::<Vec<Toast>>(session_keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
