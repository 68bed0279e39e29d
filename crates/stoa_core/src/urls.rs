/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use rand::{rngs::OsRng, RngCore};
use urlencoding::{decode, encode};

/// URL layout for local users:
///
/// - profile: `{base}/@{user_id}`
/// - inbox: `{base}/@{user_id}/pub/inbox`
/// - outbound follow: `{base}/@{user_id}/pub/following/{following_id}`
#[derive(Clone, Debug)]
pub struct LocalUrls {
    base: String,
}

impl LocalUrls {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            base: public_base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn profile_url(&self, user_id: &str) -> String {
        format!("{}/@{}", self.base, encode(user_id))
    }

    pub fn inbox_url(&self, user_id: &str) -> String {
        format!("{}/pub/inbox", self.profile_url(user_id))
    }

    pub fn following_url(&self, user_id: &str, following_id: &str) -> String {
        format!(
            "{}/pub/following/{}",
            self.profile_url(user_id),
            encode(following_id)
        )
    }

    pub fn parse_profile_url(&self, url: &str) -> Option<String> {
        let segments = self.local_segments(url)?;
        match segments.as_slice() {
            [user] => Some(user.clone()),
            _ => None,
        }
    }

    pub fn parse_following_url(&self, url: &str) -> Option<(String, String)> {
        let segments = self.local_segments(url)?;
        match segments.as_slice() {
            [user, pub_, following, id] if pub_ == "pub" && following == "following" => {
                Some((user.clone(), id.clone()))
            }
            _ => None,
        }
    }

    /// `{base}/pub/activities/<random>` under the given local actor.
    pub fn new_activity_id(&self, actor_url: &str) -> String {
        let mut b = [0u8; 16];
        OsRng.fill_bytes(&mut b);
        let suffix: String = b.iter().map(|v| format!("{v:02x}")).collect();
        format!("{}/pub/activities/{suffix}", actor_url.trim_end_matches('/'))
    }

    /// Path segments after the base, with the leading `@` of the user segment
    /// stripped and everything percent-decoded.
    fn local_segments(&self, url: &str) -> Option<Vec<String>> {
        let rest = url.trim().strip_prefix(self.base.as_str())?;
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let rest = rest.strip_prefix("/@")?.trim_end_matches('/');
        let mut out = Vec::new();
        for seg in rest.split('/') {
            if seg.is_empty() {
                return None;
            }
            out.push(decode(seg).ok()?.into_owned());
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_round_trip() {
        let urls = LocalUrls::new("https://local.example/");
        let url = urls.profile_url("bob");
        assert_eq!(url, "https://local.example/@bob");
        assert_eq!(urls.parse_profile_url(&url).as_deref(), Some("bob"));
        assert_eq!(urls.parse_profile_url("https://local.example/@bob/").as_deref(), Some("bob"));
    }

    #[test]
    fn foreign_and_nested_urls_are_not_profiles() {
        let urls = LocalUrls::new("https://local.example");
        assert_eq!(urls.parse_profile_url("https://remote.example/@bob"), None);
        assert_eq!(urls.parse_profile_url("https://local.example/@bob/pub/inbox"), None);
        assert_eq!(urls.parse_profile_url("https://local.example/users/bob"), None);
        assert_eq!(urls.parse_profile_url("https://local.example/@"), None);
    }

    #[test]
    fn following_url_parses_both_ids() {
        let urls = LocalUrls::new("https://local.example");
        let url = urls.following_url("bob", "f 1");
        assert_eq!(url, "https://local.example/@bob/pub/following/f%201");
        assert_eq!(
            urls.parse_following_url(&url),
            Some(("bob".to_string(), "f 1".to_string()))
        );
        assert_eq!(urls.parse_following_url("https://local.example/@bob/pub/followers/1"), None);
    }

    #[test]
    fn activity_ids_are_unique_under_actor() {
        let urls = LocalUrls::new("https://local.example");
        let actor = urls.profile_url("bob");
        let a = urls.new_activity_id(&actor);
        let b = urls.new_activity_id(&actor);
        assert!(a.starts_with("https://local.example/@bob/pub/activities/"));
        assert_ne!(a, b);
    }
}
