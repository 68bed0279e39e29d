/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::config::InboxConfig;
use crate::model::{same_actor, User};
use http::Uri;

/// Decides whether a remote actor may follow a local user.
pub trait FollowPolicy: Send + Sync {
    fn allow_follow(&self, user: &User, actor_url: &str) -> anyhow::Result<bool>;
}

/// Refuses blocked actors and blocked domains, allows everything else.
#[derive(Clone, Debug, Default)]
pub struct BlockList {
    blocked_actors: Vec<String>,
    blocked_domains: Vec<String>,
}

impl BlockList {
    pub fn new(blocked_actors: Vec<String>, blocked_domains: Vec<String>) -> Self {
        Self {
            blocked_actors,
            blocked_domains,
        }
    }

    pub fn from_config(cfg: &InboxConfig) -> Self {
        Self::new(cfg.blocked_actors.clone(), cfg.blocked_domains.clone())
    }

    pub fn is_blocked(&self, actor_url: &str) -> bool {
        if self.blocked_actors.iter().any(|a| same_actor(a, actor_url)) {
            return true;
        }
        let Some(host) = host_from_url(actor_url) else { return false };
        self.blocked_domains.iter().any(|p| domain_matches(&host, p))
    }
}

impl FollowPolicy for BlockList {
    fn allow_follow(&self, _user: &User, actor_url: &str) -> anyhow::Result<bool> {
        Ok(!self.is_blocked(actor_url))
    }
}

fn host_from_url(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    uri.host().map(|h| h.to_ascii_lowercase())
}

fn domain_matches(host: &str, pattern: &str) -> bool {
    let host = host.trim().to_ascii_lowercase();
    let p = pattern.trim().trim_end_matches('.').to_ascii_lowercase();
    if p.is_empty() {
        return false;
    }
    if let Some(suffix) = p.strip_prefix("*.") {
        return host == suffix || host.ends_with(&format!(".{suffix}"));
    }
    if let Some(suffix) = p.strip_prefix('.') {
        return host == suffix || host.ends_with(&format!(".{suffix}"));
    }
    host == p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_patterns() {
        assert!(domain_matches("spam.example", "spam.example"));
        assert!(domain_matches("a.spam.example", "*.spam.example"));
        assert!(domain_matches("spam.example", ".spam.example"));
        assert!(!domain_matches("notspam.example", "*.spam.example"));
        assert!(!domain_matches("spam.example", ""));
    }

    #[test]
    fn block_list_checks_actor_then_domain() {
        let list = BlockList::new(
            vec!["https://remote.example/users/mallory".to_string()],
            vec!["*.spam.example".to_string()],
        );
        assert!(list.is_blocked("https://remote.example/users/mallory/"));
        assert!(list.is_blocked("https://bots.spam.example/users/x"));
        assert!(!list.is_blocked("https://remote.example/users/alice"));
        assert!(!list.is_blocked("not a url"));
    }
}
