/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Persistence contracts the inbox pipeline needs.
//!
//! Loads return `Ok(None)` for a missing record; `Err` is reserved for the
//! backend failing. Saves assign an id to records that do not have one yet.
//! Backends give at least last-writer-wins semantics per natural key; the
//! pipeline itself takes no locks.

use crate::model::{
    new_record_id, FollowMethod, Follower, FollowerState, Following, FollowingState, Message,
    PersonLink, Response, User,
};
use anyhow::Result;

pub trait UserDirectory: Send + Sync {
    fn load_user(&self, user_id: &str) -> Result<Option<User>>;
}

pub trait FollowingStore: Send + Sync {
    fn load_following_by_id(&self, user_id: &str, following_id: &str) -> Result<Option<Following>>;

    fn load_following_by_url(&self, user_id: &str, profile_url: &str) -> Result<Option<Following>>;

    fn save_following(&self, following: &mut Following) -> Result<()>;

    fn delete_following(&self, following: &Following) -> Result<()>;

    fn set_following_status(
        &self,
        following: &mut Following,
        state: FollowingState,
        note: &str,
    ) -> Result<()> {
        following.state = state;
        following.status_note = note.to_string();
        self.save_following(following)
    }
}

pub trait FollowerStore: Send + Sync {
    fn load_follower_by_id(&self, user_id: &str, follower_id: &str) -> Result<Option<Follower>>;

    fn load_activitypub_follower(&self, user_id: &str, actor_url: &str) -> Result<Option<Follower>>;

    fn save_follower(&self, follower: &mut Follower) -> Result<()>;

    fn delete_follower(&self, follower: &Follower) -> Result<()>;

    /// Creates the follower, or refreshes the existing one for the same actor.
    fn new_activitypub_follower(&self, user: &User, actor: PersonLink) -> Result<Follower> {
        let mut follower = match self.load_activitypub_follower(&user.user_id, &actor.profile_url)? {
            Some(existing) => existing,
            None => Follower {
                follower_id: String::new(),
                parent_id: user.user_id.clone(),
                actor: PersonLink::default(),
                method: FollowMethod::ActivityPub,
                state: FollowerState::Active,
                format: "activitypub".to_string(),
            },
        };
        follower.actor = actor;
        follower.method = FollowMethod::ActivityPub;
        follower.state = FollowerState::Active;
        self.save_follower(&mut follower)?;
        Ok(follower)
    }
}

pub trait InboxStore: Send + Sync {
    fn load_message_by_url(&self, user_id: &str, url: &str) -> Result<Option<Message>>;

    fn save_message(&self, message: &mut Message) -> Result<()>;

    fn delete_message(&self, message: &Message) -> Result<()>;

    /// The stored message for `(user_id, url)`, or an unsaved blank one.
    fn load_or_create_message(&self, user_id: &str, url: &str) -> Result<Message> {
        Ok(self
            .load_message_by_url(user_id, url)?
            .unwrap_or_else(|| Message::new(user_id, url)))
    }
}

pub trait ResponseStore: Send + Sync {
    /// Every reaction `actor` left on `object`, one per reaction type.
    fn load_responses_by_actor_and_object(&self, actor: &str, object: &str) -> Result<Vec<Response>>;

    fn save_response(&self, response: &mut Response) -> Result<()>;

    fn delete_response(&self, response: &Response) -> Result<()>;
}

pub(crate) fn ensure_id(id: &mut String) {
    if id.is_empty() {
        *id = new_record_id();
    }
}
