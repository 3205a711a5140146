//! Notification inbox and watcher.

use std::time::Duration;

use bazaar_core::models::notification::{latest_first, newly_arrived, unread_count};
use bazaar_core::{Notification, NotificationId};
use bazaar_storefront::api::ApiError;
use tokio::time::{MissedTickBehavior, interval};

use super::Context;
use crate::error::CliError;
use crate::output::{emit, notification_line};

/// Print every notification.
pub async fn list(ctx: &mut Context) -> Result<(), CliError> {
    let token = ctx.token()?;
    let result = ctx.api().notifications(&token).await;
    let notifications = ctx.check(result)?;

    let mut lines = vec![format!("{} unread", unread_count(&notifications))];
    lines.extend(notifications.iter().map(notification_line));
    emit(&lines);
    Ok(())
}

/// Mark everything read.
pub async fn read_all(ctx: &mut Context) -> Result<(), CliError> {
    let token = ctx.token()?;
    let result = ctx.api().mark_all_notifications_read(&token).await;
    ctx.check(result)?;
    emit(&["All notifications marked read".to_string()]);
    Ok(())
}

/// Record a poll: returns the notifications not seen before and remembers
/// every ID in `current`.
fn take_new(seen: &mut Vec<NotificationId>, current: &[Notification]) -> Vec<Notification> {
    let fresh: Vec<Notification> = newly_arrived(seen, current).into_iter().cloned().collect();
    seen.extend(fresh.iter().map(|n| n.id.clone()));
    fresh
}

/// Poll every `interval_secs` and print new notifications until Ctrl+C.
///
/// Transient backend failures are logged and the next tick retries; a
/// rejected token ends the watch.
pub async fn watch(ctx: &mut Context, interval_secs: u64) -> Result<(), CliError> {
    let token = ctx.token()?;
    let result = ctx.api().notifications(&token).await;
    let initial = ctx.check(result)?;
    let mut seen: Vec<NotificationId> = initial.iter().map(|n| n.id.clone()).collect();
    tracing::info!(
        unread = unread_count(&initial),
        interval_secs,
        "Watching notifications, Ctrl+C to stop"
    );

    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Stopped watching");
                return Ok(());
            }
            _ = ticker.tick() => {
                let polled = ctx.api().notifications(&token).await;
                match polled {
                    Ok(current) => {
                        let fresh = latest_first(take_new(&mut seen, &current));
                        for notification in &fresh {
                            tracing::info!(id = %notification.id, "New notification");
                        }
                        emit(&fresh.iter().map(notification_line).collect::<Vec<_>>());
                    }
                    Err(e @ ApiError::Unauthorized) => return ctx.check(Err(e)),
                    Err(e) => tracing::warn!("Notification poll failed: {e}"),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn notifications(ids: &[&str]) -> Vec<Notification> {
        ids.iter()
            .map(|id| serde_json::from_value(serde_json::json!({"_id": id, "message": id})).unwrap())
            .collect()
    }

    #[test]
    fn test_take_new_reports_each_notification_once() {
        let mut seen = vec![NotificationId::new("n1")];

        let fresh = take_new(&mut seen, &notifications(&["n1", "n2"]));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, NotificationId::new("n2"));

        let fresh = take_new(&mut seen, &notifications(&["n1", "n2", "n3"]));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, NotificationId::new("n3"));

        assert!(take_new(&mut seen, &notifications(&["n2", "n3"])).is_empty());
    }
}
