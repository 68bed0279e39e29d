/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde::{Deserialize, Serialize};

pub const ACTIVITYSTREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

/// Matches any activity or object type in a route key.
pub const ANY: &str = "*";

pub mod activity {
    pub const ACCEPT: &str = "Accept";
    pub const ANNOUNCE: &str = "Announce";
    pub const CREATE: &str = "Create";
    pub const DELETE: &str = "Delete";
    pub const DISLIKE: &str = "Dislike";
    pub const FOLLOW: &str = "Follow";
    pub const LIKE: &str = "Like";
    pub const REJECT: &str = "Reject";
    pub const UNDO: &str = "Undo";
    pub const UPDATE: &str = "Update";
}

/// Actor types. An `Update` of one of these is a profile change, not content.
pub mod actor {
    pub const APPLICATION: &str = "Application";
    pub const GROUP: &str = "Group";
    pub const ORGANIZATION: &str = "Organization";
    pub const PERSON: &str = "Person";
    pub const SERVICE: &str = "Service";
}

/// Object types the pipeline refers to by name.
pub mod object {
    pub const EVENT: &str = "Event";
    pub const PLACE: &str = "Place";
    pub const PROFILE: &str = "Profile";
    pub const RELATIONSHIP: &str = "Relationship";
    pub const TOMBSTONE: &str = "Tombstone";
}

/// Object types that never become inbox content. Create, Update and Delete
/// skip them without raising an error.
pub const IGNORED_OBJECT_TYPES: &[&str] = &[
    object::RELATIONSHIP,
    object::PROFILE,
    object::PLACE,
    object::EVENT,
    object::TOMBSTONE,
    actor::APPLICATION,
    actor::GROUP,
    actor::ORGANIZATION,
    actor::PERSON,
    actor::SERVICE,
];

pub fn is_ignored_object_type(ty: &str) -> bool {
    IGNORED_OBJECT_TYPES.contains(&ty)
}

/// Outbound `Accept` answering a remote `Follow`. The original activity is
/// embedded so the remote side can match it without dereferencing.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AcceptActivity {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor: String,
    pub object: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
}

impl AcceptActivity {
    pub fn new(id: String, actor: String, object: serde_json::Value, to: Vec<String>) -> Self {
        Self {
            context: ACTIVITYSTREAMS_CONTEXT.to_string(),
            id,
            kind: activity::ACCEPT.to_string(),
            actor,
            object,
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_types_cover_non_content() {
        assert!(is_ignored_object_type("Tombstone"));
        assert!(is_ignored_object_type("Relationship"));
        for ty in ["Person", "Service", "Group", "Organization", "Application"] {
            assert!(is_ignored_object_type(ty), "{ty}");
        }
        assert!(!is_ignored_object_type("Note"));
        assert!(!is_ignored_object_type("Article"));
        assert!(!is_ignored_object_type(""));
    }

    #[test]
    fn accept_serializes_activitystreams_shape() {
        let follow = serde_json::json!({
            "id": "https://remote.example/follows/1",
            "type": "Follow",
            "actor": "https://remote.example/users/alice",
            "object": "https://local.example/@bob"
        });
        let accept = AcceptActivity::new(
            "https://local.example/@bob/pub/activities/1".to_string(),
            "https://local.example/@bob".to_string(),
            follow.clone(),
            vec!["https://remote.example/users/alice".to_string()],
        );
        let v = serde_json::to_value(&accept).unwrap();
        assert_eq!(v["@context"], ACTIVITYSTREAMS_CONTEXT);
        assert_eq!(v["type"], "Accept");
        assert_eq!(v["object"], follow);
        assert_eq!(v["to"][0], "https://remote.example/users/alice");
    }
}
