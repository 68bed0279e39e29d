/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub icon_url: String,
}

/// How a local user is presented to remote servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalActor {
    pub id: String,
    pub inbox: String,
    pub name: String,
    pub preferred_username: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowMethod {
    Generic,
    ActivityPub,
    WebSub,
    Email,
}

impl FollowMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            FollowMethod::Generic => "generic",
            FollowMethod::ActivityPub => "activitypub",
            FollowMethod::WebSub => "websub",
            FollowMethod::Email => "email",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "generic" => Some(Self::Generic),
            "activitypub" => Some(Self::ActivityPub),
            "websub" => Some(Self::WebSub),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowingState {
    Pending = 0,
    Success = 1,
    Failure = 2,
}

impl FollowingState {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Pending),
            1 => Some(Self::Success),
            2 => Some(Self::Failure),
            _ => None,
        }
    }
}

/// A local user's subscription to a remote actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Following {
    pub following_id: String,
    pub user_id: String,
    pub profile_url: String,
    pub label: String,
    pub image_url: String,
    pub method: FollowMethod,
    /// Folder that content from this subscription is filed under.
    pub folder_id: String,
    /// WebSub only.
    pub secret: String,
    pub poll_duration_secs: u64,
    pub state: FollowingState,
    pub status_note: String,
}

impl Following {
    pub fn new(
        user_id: impl Into<String>,
        following_id: impl Into<String>,
        profile_url: impl Into<String>,
    ) -> Self {
        Self {
            following_id: following_id.into(),
            user_id: user_id.into(),
            profile_url: profile_url.into(),
            label: String::new(),
            image_url: String::new(),
            method: FollowMethod::ActivityPub,
            folder_id: String::new(),
            secret: String::new(),
            poll_duration_secs: 0,
            state: FollowingState::Pending,
            status_note: String::new(),
        }
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowerState {
    Pending = 0,
    Active = 1,
}

impl FollowerState {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Pending),
            1 => Some(Self::Active),
            _ => None,
        }
    }
}

/// Remote identity as far as this server knows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonLink {
    pub profile_url: String,
    pub name: String,
    pub image_url: String,
    pub email: String,
}

/// A remote actor's subscription to a local user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follower {
    pub follower_id: String,
    /// Local user being followed.
    pub parent_id: String,
    pub actor: PersonLink,
    pub method: FollowMethod,
    pub state: FollowerState,
    pub format: String,
}

/// Where a message came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginLink {
    pub following_id: String,
    pub url: String,
    pub label: String,
    pub image_url: String,
    pub method: String,
}

/// One ancestor of a reply, as much as could be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySummary {
    pub url: String,
    pub label: String,
    pub summary: String,
    pub author: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCounts {
    pub like_count: u64,
    pub dislike_count: u64,
}

/// Remote content filed in a local user's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub user_id: String,
    /// Canonical id of the remote object.
    pub url: String,
    pub origin: OriginLink,
    pub social_role: String,
    pub label: String,
    pub summary: String,
    pub image_url: String,
    pub attributed_to: Vec<PersonLink>,
    pub content_html: String,
    pub in_reply_to: Vec<ReplySummary>,
    pub folder_id: String,
    pub publish_date_ms: i64,
    pub responses: ResponseCounts,
}

impl Message {
    pub fn new(user_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            message_id: String::new(),
            user_id: user_id.into(),
            url: url.into(),
            origin: OriginLink::default(),
            social_role: String::new(),
            label: String::new(),
            summary: String::new(),
            image_url: String::new(),
            attributed_to: Vec::new(),
            content_html: String::new(),
            in_reply_to: Vec::new(),
            folder_id: String::new(),
            publish_date_ms: 0,
            responses: ResponseCounts::default(),
        }
    }

    /// Not yet persisted.
    pub fn is_new(&self) -> bool {
        self.message_id.is_empty()
    }
}

/// A reaction (Like, Dislike, Announce) of `actor` to `object`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub response_id: String,
    pub user_id: String,
    pub actor: String,
    pub object: String,
    #[serde(rename = "type")]
    pub kind: String,
}

pub fn new_record_id() -> String {
    use rand::{rngs::OsRng, RngCore};
    let mut b = [0u8; 12];
    OsRng.fill_bytes(&mut b);
    b.iter().map(|v| format!("{v:02x}")).collect()
}

pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// First non-empty, trimmed candidate.
pub fn first_non_empty<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

/// Actor ids compare without trailing slashes.
pub fn same_actor(a: &str, b: &str) -> bool {
    let a = a.trim().trim_end_matches('/');
    let b = b.trim().trim_end_matches('/');
    !a.is_empty() && a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_empty_prefers_earlier_values() {
        assert_eq!(first_non_empty(&["", "  ", "Alice", "Bob"]), "Alice");
        assert_eq!(first_non_empty(&["", ""]), "");
    }

    #[test]
    fn same_actor_ignores_trailing_slash() {
        assert!(same_actor("https://a.example/u/1/", "https://a.example/u/1"));
        assert!(!same_actor("https://a.example/u/1", "https://a.example/u/2"));
        assert!(!same_actor("", ""));
    }

    #[test]
    fn state_codes_round_trip() {
        for s in [FollowingState::Pending, FollowingState::Success, FollowingState::Failure] {
            assert_eq!(FollowingState::from_u32(s as u32), Some(s));
        }
        assert_eq!(FollowerState::from_u32(1), Some(FollowerState::Active));
        assert_eq!(FollowMethod::parse("ActivityPub"), Some(FollowMethod::ActivityPub));
        assert_eq!(FollowMethod::parse("rss"), None);
    }
}
