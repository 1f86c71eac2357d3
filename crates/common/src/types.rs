// Core presence types shared between the presence server and clients.

use serde::{Deserialize, Serialize};

/// Verified identity attached to a connection after the handshake.
///
/// Produced by the external identity service; the server never invents
/// these fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
}

/// A user's latest broadcastable state within a room.
///
/// Replaced wholesale on every update from that user: the latest
/// arrival wins and no fields are merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    /// Current navigation location, e.g. `/docs/1`.
    pub current_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl PresenceEntry {
    /// Entry for a user who has joined but not yet reported a location.
    pub fn initial(identity: &UserIdentity) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            user_name: identity.user_name.clone(),
            user_image: identity.user_image.clone(),
            current_path: "/".to_string(),
            resource_type: None,
            resource_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> UserIdentity {
        UserIdentity {
            user_id: "user-1".into(),
            user_name: "Ada".into(),
            user_image: Some("https://cdn.tessera.dev/avatars/ada.png".into()),
        }
    }

    #[test]
    fn initial_entry_carries_identity_and_root_path() {
        let entry = PresenceEntry::initial(&identity());
        assert_eq!(entry.user_id, "user-1");
        assert_eq!(entry.user_name, "Ada");
        assert_eq!(entry.current_path, "/");
        assert!(entry.resource_type.is_none());
        assert!(entry.resource_id.is_none());
    }

    #[test]
    fn entry_serializes_with_camel_case_keys() {
        let entry = PresenceEntry::initial(&identity());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["userId"], "user-1");
        assert_eq!(value["userName"], "Ada");
        assert_eq!(value["currentPath"], "/");
    }

    #[test]
    fn absent_optional_fields_are_omitted() {
        let entry = PresenceEntry {
            user_id: "user-2".into(),
            user_name: "Grace".into(),
            user_image: None,
            current_path: "/boards/7".into(),
            resource_type: None,
            resource_id: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert!(!keys.contains(&"userImage"));
        assert!(!keys.contains(&"resourceType"));
        assert!(!keys.contains(&"resourceId"));
    }
}
