//! Client-facing decoration of stored notifications. All type normalization
//! and action-label rules live here; nothing else in the crate maps
//! notification kinds to UI strings.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::repo::{kinds, Notification};

#[derive(Debug, Serialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub created_at: OffsetDateTime,
    pub send_at: Option<OffsetDateTime>,
    pub notif_label: Option<String>,
    pub is_read: bool,
    pub show_action: bool,
    pub action_label: Option<&'static str>,
    pub action_link: Option<&'static str>,
}

/// Normalized display type: timed and planned meal notifications both surface
/// as "meal"; expiry-themed titles override to "inventory".
fn display_kind(kind: &str, title_lower: &str) -> String {
    let mut display = if kind == kinds::MEAL_REMINDER {
        "meal".to_string()
    } else {
        kind.to_string()
    };
    if title_lower.contains("expiring") || title_lower.contains("expired") {
        display = kinds::INVENTORY.to_string();
    }
    display
}

pub fn decorate(notification: Notification) -> NotificationView {
    let title_lower = notification.title.to_lowercase();
    let kind = display_kind(&notification.kind, &title_lower);

    let mut show_action = true;
    if title_lower.contains("deleted") || title_lower.contains("removed") {
        show_action = false;
    }
    // Upcoming-meal announcements are informational; no button.
    if kind == "meal" && title_lower.contains("upcoming") {
        show_action = false;
    }

    let (action_label, action_link): (Option<&'static str>, Option<&'static str>) =
        match kind.as_str() {
            kinds::INVENTORY
                if ["added", "updated", "expiring", "expired"]
                    .iter()
                    .any(|k| title_lower.contains(k)) =>
            {
                (Some("View Item"), Some("/inventory?action=view"))
            }
            kinds::INVENTORY => (None, None),
            kinds::DONATION if title_lower.contains("donated") => {
                (Some("View Donation"), Some("/inventory?action=donations"))
            }
            kinds::DONATION => (None, None),
            "meal" => (None, None),
            _ => (Some("Learn More"), None),
        };

    if action_label.is_none() {
        show_action = false;
    }

    NotificationView {
        id: notification.id,
        user_id: notification.user_id,
        kind,
        title: notification.title,
        message: notification.message,
        created_at: notification.created_at,
        send_at: notification.send_at,
        notif_label: notification.notif_label,
        is_read: notification.is_read,
        show_action,
        action_label,
        action_link,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn notification(kind: &str, title: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: Some("me".to_string()),
            kind: kind.to_string(),
            title: title.to_string(),
            message: String::new(),
            created_at: datetime!(2025-06-01 00:00 UTC),
            send_at: None,
            meal_entry_id: None,
            notif_label: None,
            is_read: false,
            show_action: false,
        }
    }

    #[test]
    fn meal_reminders_surface_as_meal_without_action() {
        let view = decorate(notification(kinds::MEAL_REMINDER, "Upcoming meal: Stew"));
        assert_eq!(view.kind, "meal");
        assert!(!view.show_action);
        assert!(view.action_label.is_none());
    }

    #[test]
    fn expiry_titles_override_to_inventory_with_action() {
        let view = decorate(notification(kinds::SYSTEM, "Milk is expiring soon"));
        assert_eq!(view.kind, "inventory");
        assert!(view.show_action);
        assert_eq!(view.action_label, Some("View Item"));
        assert_eq!(view.action_link, Some("/inventory?action=view"));
    }

    #[test]
    fn donation_notifications_link_to_the_donation_list() {
        let view = decorate(notification(kinds::DONATION, "Item donated: Rice"));
        assert_eq!(view.action_label, Some("View Donation"));
        assert!(view.show_action);
    }

    #[test]
    fn deletions_never_show_an_action() {
        let view = decorate(notification(kinds::INVENTORY, "Item removed: expired Milk"));
        assert!(!view.show_action);
    }

    #[test]
    fn system_notifications_offer_learn_more() {
        let view = decorate(notification(kinds::SYSTEM, "Welcome to EcoEats"));
        assert_eq!(view.kind, "system");
        assert_eq!(view.action_label, Some("Learn More"));
        assert!(view.action_link.is_none());
        assert!(view.show_action);
    }
}
