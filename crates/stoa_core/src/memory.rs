/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::model::{same_actor, Follower, Following, Message, Response, User};
use crate::store::{
    ensure_id, FollowerStore, FollowingStore, InboxStore, ResponseStore, UserDirectory,
};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    followings: HashMap<String, Following>,
    followers: HashMap<String, Follower>,
    messages: HashMap<String, Message>,
    responses: HashMap<String, Response>,
}

/// Every store contract over in-process maps.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| anyhow!("memory store lock poisoned"))
    }

    pub fn insert_user(&self, user: User) -> Result<()> {
        self.lock()?.users.insert(user.user_id.clone(), user);
        Ok(())
    }

    pub fn followers_of(&self, user_id: &str) -> Result<Vec<Follower>> {
        Ok(self
            .lock()?
            .followers
            .values()
            .filter(|f| f.parent_id == user_id)
            .cloned()
            .collect())
    }

    pub fn messages_of(&self, user_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .lock()?
            .messages
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl UserDirectory for MemoryStore {
    fn load_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }
}

impl FollowingStore for MemoryStore {
    fn load_following_by_id(&self, user_id: &str, following_id: &str) -> Result<Option<Following>> {
        Ok(self
            .lock()?
            .followings
            .get(following_id)
            .filter(|f| f.user_id == user_id)
            .cloned())
    }

    fn load_following_by_url(&self, user_id: &str, profile_url: &str) -> Result<Option<Following>> {
        Ok(self
            .lock()?
            .followings
            .values()
            .find(|f| f.user_id == user_id && same_actor(&f.profile_url, profile_url))
            .cloned())
    }

    fn save_following(&self, following: &mut Following) -> Result<()> {
        let mut tables = self.lock()?;
        if following.following_id.is_empty() {
            // Keep (user_id, profile_url) unique.
            if let Some(existing) = tables.followings.values().find(|f| {
                f.user_id == following.user_id && same_actor(&f.profile_url, &following.profile_url)
            }) {
                following.following_id = existing.following_id.clone();
            }
        }
        ensure_id(&mut following.following_id);
        tables
            .followings
            .insert(following.following_id.clone(), following.clone());
        Ok(())
    }

    fn delete_following(&self, following: &Following) -> Result<()> {
        self.lock()?.followings.remove(&following.following_id);
        Ok(())
    }
}

impl FollowerStore for MemoryStore {
    fn load_follower_by_id(&self, user_id: &str, follower_id: &str) -> Result<Option<Follower>> {
        Ok(self
            .lock()?
            .followers
            .get(follower_id)
            .filter(|f| f.parent_id == user_id)
            .cloned())
    }

    fn load_activitypub_follower(&self, user_id: &str, actor_url: &str) -> Result<Option<Follower>> {
        Ok(self
            .lock()?
            .followers
            .values()
            .find(|f| f.parent_id == user_id && same_actor(&f.actor.profile_url, actor_url))
            .cloned())
    }

    fn save_follower(&self, follower: &mut Follower) -> Result<()> {
        let mut tables = self.lock()?;
        if follower.follower_id.is_empty() {
            if let Some(existing) = tables.followers.values().find(|f| {
                f.parent_id == follower.parent_id
                    && same_actor(&f.actor.profile_url, &follower.actor.profile_url)
            }) {
                follower.follower_id = existing.follower_id.clone();
            }
        }
        ensure_id(&mut follower.follower_id);
        tables
            .followers
            .insert(follower.follower_id.clone(), follower.clone());
        Ok(())
    }

    fn delete_follower(&self, follower: &Follower) -> Result<()> {
        self.lock()?.followers.remove(&follower.follower_id);
        Ok(())
    }
}

impl InboxStore for MemoryStore {
    fn load_message_by_url(&self, user_id: &str, url: &str) -> Result<Option<Message>> {
        Ok(self
            .lock()?
            .messages
            .values()
            .find(|m| m.user_id == user_id && m.url == url)
            .cloned())
    }

    fn save_message(&self, message: &mut Message) -> Result<()> {
        let mut tables = self.lock()?;
        if message.message_id.is_empty() {
            if let Some(existing) = tables
                .messages
                .values()
                .find(|m| m.user_id == message.user_id && m.url == message.url)
            {
                message.message_id = existing.message_id.clone();
            }
        }
        ensure_id(&mut message.message_id);
        tables
            .messages
            .insert(message.message_id.clone(), message.clone());
        Ok(())
    }

    fn delete_message(&self, message: &Message) -> Result<()> {
        self.lock()?.messages.remove(&message.message_id);
        Ok(())
    }
}

impl ResponseStore for MemoryStore {
    fn load_responses_by_actor_and_object(&self, actor: &str, object: &str) -> Result<Vec<Response>> {
        Ok(self
            .lock()?
            .responses
            .values()
            .filter(|r| same_actor(&r.actor, actor) && r.object == object)
            .cloned()
            .collect())
    }

    fn save_response(&self, response: &mut Response) -> Result<()> {
        let mut tables = self.lock()?;
        if response.response_id.is_empty() {
            if let Some(existing) = tables.responses.values().find(|r| {
                same_actor(&r.actor, &response.actor)
                    && r.object == response.object
                    && r.kind == response.kind
            }) {
                response.response_id = existing.response_id.clone();
            }
        }
        ensure_id(&mut response.response_id);
        tables
            .responses
            .insert(response.response_id.clone(), response.clone());
        Ok(())
    }

    fn delete_response(&self, response: &Response) -> Result<()> {
        self.lock()?.responses.remove(&response.response_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FollowingState, PersonLink};

    fn user() -> User {
        User {
            user_id: "bob".to_string(),
            username: "bob".to_string(),
            display_name: "Bob".to_string(),
            icon_url: String::new(),
        }
    }

    #[test]
    fn following_natural_key_is_unique() {
        let store = MemoryStore::new();
        let mut a = Following::new("bob", "", "https://remote.example/users/alice");
        store.save_following(&mut a).unwrap();
        let mut b = Following::new("bob", "", "https://remote.example/users/alice/");
        store.save_following(&mut b).unwrap();
        assert_eq!(a.following_id, b.following_id);

        let mut loaded = store
            .load_following_by_url("bob", "https://remote.example/users/alice")
            .unwrap()
            .unwrap();
        store
            .set_following_status(&mut loaded, FollowingState::Success, "ok")
            .unwrap();
        let again = store.load_following_by_id("bob", &a.following_id).unwrap().unwrap();
        assert_eq!(again.state, FollowingState::Success);
        assert!(store.load_following_by_id("carol", &a.following_id).unwrap().is_none());
    }

    #[test]
    fn new_activitypub_follower_reuses_record() {
        let store = MemoryStore::new();
        let actor = PersonLink {
            profile_url: "https://remote.example/users/alice".to_string(),
            name: "Alice".to_string(),
            ..PersonLink::default()
        };
        let first = store.new_activitypub_follower(&user(), actor.clone()).unwrap();
        let renamed = PersonLink {
            name: "Alice A.".to_string(),
            ..actor
        };
        let second = store.new_activitypub_follower(&user(), renamed).unwrap();
        assert_eq!(first.follower_id, second.follower_id);
        let all = store.followers_of("bob").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].actor.name, "Alice A.");
    }

    #[test]
    fn load_or_create_message_does_not_persist() {
        let store = MemoryStore::new();
        let mut msg = store.load_or_create_message("bob", "https://remote.example/notes/1").unwrap();
        assert!(msg.is_new());
        assert!(store.messages_of("bob").unwrap().is_empty());
        store.save_message(&mut msg).unwrap();
        let again = store.load_or_create_message("bob", "https://remote.example/notes/1").unwrap();
        assert_eq!(again.message_id, msg.message_id);
    }
}
