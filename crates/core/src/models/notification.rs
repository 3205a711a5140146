//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{NotificationId, NotificationKind, OrderId};

/// A notification shown in the account inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", alias = "id")]
    pub id: NotificationId,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: NotificationKind,
    #[serde(default, alias = "text", alias = "title")]
    pub message: String,
    #[serde(default, alias = "isRead")]
    pub read: bool,
    #[serde(default, alias = "orderId", skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Number of notifications not yet read.
#[must_use]
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

/// Sort newest first; undated notifications sink to the bottom.
#[must_use]
pub fn latest_first(mut notifications: Vec<Notification>) -> Vec<Notification> {
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    notifications
}

/// Notifications in `current` whose IDs are not in `seen`.
#[must_use]
pub fn newly_arrived<'a>(
    seen: &[NotificationId],
    current: &'a [Notification],
) -> Vec<&'a Notification> {
    current.iter().filter(|n| !seen.contains(&n.id)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Vec<Notification> {
        serde_json::from_str(
            r#"[
                {"_id":"n1","type":"orderStatus","message":"Shipped","isRead":true,"createdAt":"2024-03-01T10:00:00Z"},
                {"_id":"n2","type":"promotion","message":"Sale","createdAt":"2024-03-02T10:00:00Z"},
                {"_id":"n3","message":"Hello"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_unread_count() {
        assert_eq!(unread_count(&sample()), 2);
    }

    #[test]
    fn test_latest_first() {
        let ids: Vec<String> = latest_first(sample())
            .into_iter()
            .map(|n| n.id.into_inner())
            .collect();
        assert_eq!(ids, vec!["n2", "n1", "n3"]);
    }

    #[test]
    fn test_newly_arrived() {
        let all = sample();
        let seen = vec![NotificationId::new("n1"), NotificationId::new("n3")];
        let fresh = newly_arrived(&seen, &all);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].kind, NotificationKind::Promotion);
    }
}
