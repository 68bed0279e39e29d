/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::config::InboxConfig;
use crate::error::{InboxError, StepExt};
use crate::model::{LocalActor, User};
use crate::policy::{BlockList, FollowPolicy};
use crate::queue::TaskQueue;
use crate::store::{FollowerStore, FollowingStore, InboxStore, ResponseStore, UserDirectory};
use crate::urls::LocalUrls;
use std::sync::Arc;

/// Collaborators every handler runs against.
#[derive(Clone)]
pub struct InboxState {
    pub cfg: InboxConfig,
    pub urls: LocalUrls,
    pub users: Arc<dyn UserDirectory>,
    pub following: Arc<dyn FollowingStore>,
    pub followers: Arc<dyn FollowerStore>,
    pub inbox: Arc<dyn InboxStore>,
    pub responses: Arc<dyn ResponseStore>,
    pub policy: Arc<dyn FollowPolicy>,
    pub queue: Arc<dyn TaskQueue>,
}

impl InboxState {
    /// Wires one backend that implements every store contract. The follow
    /// policy is the block list from `cfg`.
    pub fn with_store<S>(cfg: InboxConfig, store: Arc<S>, queue: Arc<dyn TaskQueue>) -> Self
    where
        S: UserDirectory + FollowingStore + FollowerStore + InboxStore + ResponseStore + 'static,
    {
        let urls = LocalUrls::new(&cfg.public_base_url);
        let policy = Arc::new(BlockList::from_config(&cfg));
        Self {
            cfg,
            urls,
            users: store.clone(),
            following: store.clone(),
            followers: store.clone(),
            inbox: store.clone(),
            responses: store,
            policy,
            queue,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn FollowPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Local user owning `profile_url`, if it is one of ours.
    pub fn user_by_profile_url(&self, profile_url: &str) -> Result<Option<User>, InboxError> {
        let Some(user_id) = self.urls.parse_profile_url(profile_url) else {
            return Ok(None);
        };
        self.users
            .load_user(&user_id)
            .step(|| format!("load user {user_id}"))
    }

    pub fn activitypub_actor(&self, user_id: &str) -> Result<LocalActor, InboxError> {
        let user = self
            .users
            .load_user(user_id)
            .step(|| format!("load user {user_id}"))?
            .ok_or_else(|| InboxError::NotFound(format!("user {user_id}")))?;
        Ok(LocalActor {
            id: self.urls.profile_url(&user.user_id),
            inbox: self.urls.inbox_url(&user.user_id),
            name: user.display_name,
            preferred_username: user.username,
            icon_url: user.icon_url,
        })
    }
}
